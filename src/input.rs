//! Common routines for handling input data.
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod scenario;
pub use scenario::{Scenario, load_scenario};
pub mod time_series;

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a series of type `T`s from a CSV file.
///
/// Fails if the file contains no records.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::Reader::from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(
        !vec.is_empty(),
        "{}: CSV file cannot be empty",
        input_err_msg(file_path)
    );

    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: f64,
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\nhello,1\nworld,2.5").unwrap();
        }

        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            [
                Record {
                    id: "hello".into(),
                    value: 1.0
                },
                Record {
                    id: "world".into(),
                    value: 2.5
                }
            ]
        );
    }

    #[test]
    fn test_read_csv_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value").unwrap();
        }

        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1.0").unwrap();
        }

        let record: Record = read_toml(&file_path).unwrap();
        assert_eq!(
            record,
            Record {
                id: "hello".into(),
                value: 1.0
            }
        );

        // Missing file
        assert!(read_toml::<Record>(&dir.path().join("missing.toml")).is_err());
    }
}
