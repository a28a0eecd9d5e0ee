//! Code for loading program settings.
use crate::get_ocaes_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::solver::SolverOptions;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for ocaes
# Uncomment a setting to change it from its default value.
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Default order in which to try solvers
fn default_solvers() -> Vec<String> {
    SolverOptions::default()
        .preferred
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_ocaes_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Solvers to try, in order of preference
    #[serde(default = "default_solvers")]
    pub solvers: Vec<String>,
    /// Wall-clock limit for each solve, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            solvers: default_solvers(),
            time_limit: None,
        }
    }
}

impl Settings {
    /// Read the contents of the settings file.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, returning defaults if the file does not exist
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// Options for the solver, as given by these settings
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions::from_names(&self.solvers, self.time_limit)
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Settings object with default values set by serde
        let settings = Settings::default();

        // Convert to TOML
        let settings_raw = toml::to_string(&settings).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                // Add documentation from doc comments
                let field = line[..last].trim();

                // Use doc comment to document parameter. All fields should have doc comments.
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverBackend;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"\nsolvers = [\"cbc\", \"highs\"]").unwrap();
        }

        let settings = Settings::load_from_path(&file_path).unwrap();
        assert_eq!(
            settings,
            Settings {
                log_level: "warn".to_string(),
                overwrite: false,
                solvers: vec!["cbc".into(), "highs".into()],
                time_limit: None,
            }
        );
        assert_eq!(
            settings.solver_options().preferred,
            [SolverBackend::Cbc, SolverBackend::Highs]
        );
    }

    #[test]
    fn test_default_solvers() {
        assert_eq!(
            Settings::default().solvers,
            ["gurobi", "cplex", "highs", "glpk", "cbc"]
        );
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("# log_level = \"info\""));
        assert!(contents.contains("# # Solvers to try, in order of preference"));
    }
}
