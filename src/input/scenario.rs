//! Code for loading a scenario: a directory with a `scenario.toml` file and a time series.
use super::time_series::read_time_series;
use super::{input_err_msg, read_toml};
use crate::parameters::{Objective, ParameterSet, Parameters, StorageArchetype};
use crate::time_series::TimeSeries;
use anyhow::{Context, Result, bail};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The scenario file name
pub const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// Parameter names which may be overridden even though they are absent from the defaults
const OPTIONAL_PARAMETERS: [&str; 1] = ["ramp_rate"];

fn default_time_series_file() -> String {
    "time_series.csv".into()
}

/// The contents of a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    /// The storage technology, which determines the default parameters
    #[serde(default)]
    storage_type: StorageArchetype,
    /// Name of the time series file, relative to the scenario directory
    #[serde(default = "default_time_series_file")]
    time_series: String,
    /// Overrides for the default parameters
    #[serde(default)]
    parameters: toml::Table,
}

/// A loaded and validated scenario, ready to run
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Path to the scenario directory
    pub dir: PathBuf,
    /// The storage technology
    pub storage_type: StorageArchetype,
    /// The validated parameters
    pub params: ParameterSet,
    /// The hourly input data
    pub series: TimeSeries,
}

/// Load a scenario from the specified directory.
///
/// # Arguments
///
/// * `scenario_dir` - Folder containing the scenario configuration files
pub fn load_scenario(scenario_dir: &Path) -> Result<Scenario> {
    let file_path = scenario_dir.join(SCENARIO_FILE_NAME);
    let file: ScenarioFile = read_toml(&file_path)?;

    let params = build_parameters(file.storage_type, file.parameters)
        .with_context(|| input_err_msg(&file_path))?;
    let params = ParameterSet::new(params).with_context(|| input_err_msg(&file_path))?;

    let series_path = scenario_dir.join(&file.time_series);
    let series = read_time_series(&series_path, &params.params().power_curve())?;
    info!(
        "Loaded {} hours of data from {}",
        series.len(),
        series_path.display()
    );

    Ok(Scenario {
        dir: scenario_dir.to_path_buf(),
        storage_type: file.storage_type,
        params,
        series,
    })
}

/// Apply overrides to the default parameters of a storage technology.
///
/// The objective is parsed on its own so that an unrecognised name is reported as such, rather
/// than as a generic deserialisation error.
fn build_parameters(archetype: StorageArchetype, mut overrides: toml::Table) -> Result<Parameters> {
    let objective = match overrides.remove("objective") {
        Some(value) => {
            let Some(name) = value.as_str() else {
                bail!("objective must be a string");
            };
            Objective::parse(name)?
        }
        None => Objective::default(),
    };

    let defaults = Parameters::for_archetype(archetype);
    let toml::Value::Table(mut table) = toml::Value::try_from(&defaults)? else {
        bail!("Parameters must serialise to a table");
    };

    for (name, value) in overrides {
        if !table.contains_key(&name) && !OPTIONAL_PARAMETERS.contains(&name.as_str()) {
            bail!("Unknown parameter: {name}");
        }
        table.insert(name, value);
    }
    table.insert("objective".into(), objective.to_string().into());

    Ok(toml::Value::Table(table).try_into()?)
}
