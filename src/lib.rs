//! Techno-economic dispatch and sizing of wind farms coupled with compressed-air energy storage.
//!
//! A run takes hourly wind, price and emissions data and a set of technical and economic
//! parameters, builds a linear program for the requested objective and solves it with HiGHS.
#![warn(missing_docs)]
use std::env;
use std::path::PathBuf;

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod finance;
pub mod input;
pub mod log;
pub mod metrics;
pub mod output;
pub mod parameters;
pub mod results;
pub mod settings;
pub mod simulation;
pub mod solver;
pub mod time_series;

#[cfg(test)]
mod fixture;

/// The environment variable which overrides the location of the config directory
const CONFIG_DIR_ENV_VAR: &str = "OCAES_CONFIG_DIR";

/// Get the directory from which program settings are read.
///
/// This is `$OCAES_CONFIG_DIR` if set, otherwise an `ocaes` folder in the platform's user config
/// directory (falling back to the current directory if that is unknown).
pub fn get_ocaes_config_dir() -> PathBuf {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV_VAR) {
        return dir.into();
    }

    let mut dir = dirs::config_dir().unwrap_or_default();
    dir.push("ocaes");
    dir
}
