//! The module responsible for writing output data to disk.
use crate::results::{HourlyTable, Summary};
use anyhow::{Context, Result, ensure};
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "ocaes_results";

/// The output file name for per-hour results
const HOURLY_RESULTS_FILE_NAME: &str = "hourly_results.csv";

/// The output file name for scalar results
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// Get the default output directory for the scenario in the specified directory
pub fn get_output_dir(scenario_dir: &Path) -> Result<PathBuf> {
    // The results folder is named after the last component of the scenario path
    let scenario_dir = scenario_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to scenario")?;

    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create a new output directory, replacing an existing one only if allowed.
///
/// An existing empty directory is always reused.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Write the per-hour results table, with hours numbered from 1
pub fn write_hourly_results(output_path: &Path, table: &HourlyTable) -> Result<()> {
    let file_path = output_path.join(HOURLY_RESULTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;

    writer.write_record(iter::once("hour").chain(table.names()))?;
    for (hour, values) in table.iter_rows() {
        writer.write_record(
            iter::once(hour.to_string()).chain(values.iter().map(ToString::to_string)),
        )?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the scalar summary as `name,value` rows
pub fn write_summary(output_path: &Path, summary: &Summary) -> Result<()> {
    let file_path = output_path.join(SUMMARY_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;

    writer.write_record(["name", "value"])?;
    for (name, value) in summary.iter() {
        writer.write_record([name, value.to_string().as_str()])?;
    }
    writer.flush()?;

    Ok(())
}
