//! Code for reading the hourly time series CSV file.
use super::{input_err_msg, read_csv};
use crate::error::ModelError;
use crate::time_series::{PowerCurve, TimeSeries};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Column holding the grid price ($/MWh)
const PRICE_COLUMN: &str = "price_dollarsPerMWh";

/// Column holding the grid emissions intensity (t CO2/MWh)
const EMISSIONS_COLUMN: &str = "emissions_tonCO2PerMWh";

/// The possible columns for the wind resource, of which exactly one must be present
const WIND_COLUMNS: [&str; 3] = ["windspeed_ms", "wind_fraction", "wind_MW"];

/// A row of the time series file
#[derive(Debug, PartialEq, Deserialize)]
struct TimeSeriesRaw {
    #[serde(rename = "price_dollarsPerMWh")]
    price: f64,
    #[serde(rename = "emissions_tonCO2PerMWh")]
    emissions: f64,
    #[serde(rename = "windspeed_ms")]
    wind_speed: Option<f64>,
    wind_fraction: Option<f64>,
    #[serde(rename = "wind_MW")]
    wind_power: Option<f64>,
}

/// The wind column found in the file
#[derive(Debug, Clone, Copy, PartialEq)]
enum WindColumn {
    Speed,
    Fraction,
    Power,
}

impl WindColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Speed => WIND_COLUMNS[0],
            Self::Fraction => WIND_COLUMNS[1],
            Self::Power => WIND_COLUMNS[2],
        }
    }

    fn value(self, row: &TimeSeriesRaw) -> Option<f64> {
        match self {
            Self::Speed => row.wind_speed,
            Self::Fraction => row.wind_fraction,
            Self::Power => row.wind_power,
        }
    }
}

/// Identify the wind column from the header of the file
fn find_wind_column(headers: &csv::StringRecord) -> Result<WindColumn, ModelError> {
    for required in [PRICE_COLUMN, EMISSIONS_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(ModelError::DataShape(format!(
                "missing column {required}"
            )));
        }
    }

    let present: Vec<_> = [WindColumn::Speed, WindColumn::Fraction, WindColumn::Power]
        .into_iter()
        .filter(|col| headers.iter().any(|h| h == col.name()))
        .collect();
    match present.as_slice() {
        [column] => Ok(*column),
        [] => Err(ModelError::DataShape(format!(
            "no wind column (expected one of {})",
            WIND_COLUMNS.join(", ")
        ))),
        _ => Err(ModelError::DataShape(format!(
            "more than one wind column (expected one of {})",
            WIND_COLUMNS.join(", ")
        ))),
    }
}

/// Read the hourly time series from a CSV file.
///
/// Wind speeds are converted to a fraction of rated power with the given power curve.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `curve` - The turbine power curve
pub fn read_time_series(file_path: &Path, curve: &PowerCurve) -> Result<TimeSeries> {
    let headers = csv::Reader::from_path(file_path)
        .and_then(|mut reader| reader.headers().cloned())
        .with_context(|| input_err_msg(file_path))?;
    let column = find_wind_column(&headers).with_context(|| input_err_msg(file_path))?;

    let rows: Vec<TimeSeriesRaw> = read_csv(file_path)?;
    let series = time_series_from_raw(&rows, column, curve)
        .with_context(|| input_err_msg(file_path))?;

    Ok(series)
}

fn time_series_from_raw(
    rows: &[TimeSeriesRaw],
    column: WindColumn,
    curve: &PowerCurve,
) -> Result<TimeSeries, ModelError> {
    let wind = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            column.value(row).ok_or_else(|| {
                ModelError::DataShape(format!(
                    "missing {} value at hour {}",
                    column.name(),
                    index + 1
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let price = rows.iter().map(|row| row.price).collect();
    let emissions = rows.iter().map(|row| row.emissions).collect();

    match column {
        WindColumn::Speed => TimeSeries::from_wind_speed(&wind, curve, price, emissions),
        WindColumn::Fraction => TimeSeries::from_wind_fraction(wind, price, emissions),
        WindColumn::Power => TimeSeries::from_wind_power(wind, price, emissions),
    }
}
