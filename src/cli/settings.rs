//! The `settings` subcommands, for managing the program settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path from which settings are read
    Path,
    /// Print a commented-out settings file with the default values
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => handle_edit_command(&get_settings_file_path()),
            Self::Path => {
                println!("{}", get_settings_file_path().display());
                Ok(())
            }
            Self::DumpDefault => {
                print!("{}", Settings::default_file_contents());
                Ok(())
            }
        }
    }
}

/// Write a placeholder settings file, unless one already exists.
///
/// Returns whether a new file was written.
fn ensure_settings_file_exists(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents())
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(true)
}

/// Handle the `settings edit` command
fn handle_edit_command(file_path: &Path) -> Result<()> {
    if ensure_settings_file_exists(file_path)? {
        println!("Created settings file: {}", file_path.display());
    }

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(file_path)
        .with_context(|| format!("Failed to open editor for {}", file_path.display()))?;

    Ok(())
}
