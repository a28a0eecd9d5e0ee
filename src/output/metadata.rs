//! Code for writing metadata about a run to file
use crate::parameters::{Objective, StorageArchetype};
use crate::results::Solution;
use anyhow::{Context, Result};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata,
    platform: PlatformMetadata,
}

/// Information about the run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the scenario which was run
    scenario_path: &'a Path,
    /// The date and time at which the results were written
    datetime: String,
    /// The storage technology
    storage_type: StorageArchetype,
    /// The objective of the run
    objective: Objective,
    /// The number of hours in the horizon
    hours: usize,
    /// The solver which was used
    solver: String,
    /// The raw status reported by the solver
    solver_status: &'a str,
}

/// Information about the program build
#[derive(Serialize)]
struct ProgramMetadata {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    is_debug: bool,
    rustc_version: &'static str,
    build_time_utc: &'static str,
    git_commit_hash: String,
}

impl Default for ProgramMetadata {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform on which the program is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("Unable to determine platform info")?;
        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata to the specified output path in TOML format
///
/// # Arguments
///
/// * `output_path` - The output directory
/// * `scenario_path` - The scenario directory
/// * `storage_type` - The storage technology of the scenario
/// * `objective` - The objective of the run
/// * `solution` - The solution of the run
pub fn write_metadata(
    output_path: &Path,
    scenario_path: &Path,
    storage_type: StorageArchetype,
    objective: Objective,
    solution: &Solution,
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata {
            scenario_path,
            datetime: Local::now().to_rfc2822(),
            storage_type,
            objective,
            hours: solution.hourly.len(),
            solver: solution.backend.to_string(),
            solver_status: &solution.status,
        },
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(())
}
