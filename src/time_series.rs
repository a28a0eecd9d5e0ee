//! Hourly input data for the dispatch model: wind resource, grid price and grid emissions.
use crate::error::ModelError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A wind turbine power curve of the form `A·v³ + B·v² + C·v + D`.
///
/// The output is a fraction of the rated power of the wind farm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    /// Cut-in wind speed (m/s)
    pub cut_in: f64,
    /// Rated wind speed (m/s)
    pub rated: f64,
    /// Cut-out wind speed (m/s)
    pub cut_out: f64,
    /// Cubic coefficient
    pub a: f64,
    /// Quadratic coefficient
    pub b: f64,
    /// Linear coefficient
    pub c: f64,
    /// Constant term
    pub d: f64,
}

impl PowerCurve {
    /// Power output as a fraction of rated power for the given wind speed.
    ///
    /// Output is zero below cut-in and at or above cut-out, and one between rated and cut-out
    /// speeds. The polynomial is clamped to `[0, 1]` so that a curve whose fit overshoots slightly
    /// near the rated speed still yields a valid fraction.
    pub fn fraction(&self, wind_speed: f64) -> f64 {
        if wind_speed < self.cut_in || wind_speed >= self.cut_out {
            0.0
        } else if wind_speed >= self.rated {
            1.0
        } else {
            let v = wind_speed;
            // Fitted curves can overshoot just below the rated speed (the default curve gives
            // about 1.003 at 11.4 m/s), so keep the output a valid fraction
            (self.a * v.powi(3) + self.b * v.powi(2) + self.c * v + self.d).clamp(0.0, 1.0)
        }
    }
}

/// How the wind resource is expressed
#[derive(Debug, Clone, PartialEq)]
pub enum WindResource {
    /// Fraction (0 to 1) of the rated capacity of the wind farm
    Fraction(Vec<f64>),
    /// Absolute power delivered by the wind farm (MW)
    Power(Vec<f64>),
}

impl WindResource {
    fn values(&self) -> &[f64] {
        match self {
            Self::Fraction(values) | Self::Power(values) => values,
        }
    }
}

/// An immutable, validated hourly time series.
///
/// All series have the same length, which defines the model horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    wind: WindResource,
    price: Vec<f64>,
    emissions: Vec<f64>,
}

impl TimeSeries {
    /// Create a time series from the wind resource, price ($/MWh) and emissions (t CO2/MWh).
    pub fn new(
        wind: WindResource,
        price: Vec<f64>,
        emissions: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let lengths = [wind.values().len(), price.len(), emissions.len()];
        if !lengths.iter().all_equal() {
            return Err(ModelError::DataShape(format!(
                "series lengths differ (wind: {}, price: {}, emissions: {})",
                lengths[0], lengths[1], lengths[2]
            )));
        }
        if price.is_empty() {
            return Err(ModelError::DataShape(
                "time series must contain at least one hour".into(),
            ));
        }

        match &wind {
            WindResource::Fraction(values) => check_values(values, "wind fraction", |x| {
                (0.0..=1.0).contains(&x)
            })?,
            WindResource::Power(values) => check_values(values, "wind power", |x| x >= 0.0)?,
        }
        check_values(&price, "price", f64::is_finite)?;
        check_values(&emissions, "emissions", f64::is_finite)?;

        Ok(Self {
            wind,
            price,
            emissions,
        })
    }

    /// Create a time series with wind given as a fraction of rated capacity
    pub fn from_wind_fraction(
        wind_fraction: Vec<f64>,
        price: Vec<f64>,
        emissions: Vec<f64>,
    ) -> Result<Self, ModelError> {
        Self::new(WindResource::Fraction(wind_fraction), price, emissions)
    }

    /// Create a time series with wind given as absolute power (MW)
    pub fn from_wind_power(
        wind_power: Vec<f64>,
        price: Vec<f64>,
        emissions: Vec<f64>,
    ) -> Result<Self, ModelError> {
        Self::new(WindResource::Power(wind_power), price, emissions)
    }

    /// Create a time series from raw wind speeds (m/s), converted with a turbine power curve
    pub fn from_wind_speed(
        wind_speed: &[f64],
        curve: &PowerCurve,
        price: Vec<f64>,
        emissions: Vec<f64>,
    ) -> Result<Self, ModelError> {
        check_values(wind_speed, "wind speed", |x| x.is_finite() && x >= 0.0)?;
        let fraction = wind_speed.iter().map(|&v| curve.fraction(v)).collect();
        Self::from_wind_fraction(fraction, price, emissions)
    }

    /// The number of hours in the series
    pub fn len(&self) -> usize {
        self.price.len()
    }

    /// Always false: a validated series has at least one hour
    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }

    /// The wind resource
    pub fn wind(&self) -> &WindResource {
        &self.wind
    }

    /// Hourly grid price ($/MWh)
    pub fn price(&self) -> &[f64] {
        &self.price
    }

    /// Hourly grid emissions intensity (t CO2/MWh)
    pub fn emissions(&self) -> &[f64] {
        &self.emissions
    }

    /// Mean grid price over the horizon
    pub fn price_average(&self) -> f64 {
        self.price.iter().sum::<f64>() / self.len() as f64
    }

    /// Price of each hour relative to the period average, used to weight delivered energy.
    ///
    /// If the average price is zero the weighting is undefined, so every hour gets a weight of one.
    pub fn relative_price(&self) -> Vec<f64> {
        let average = self.price_average();
        if average.abs() < f64::EPSILON {
            return vec![1.0; self.len()];
        }

        self.price.iter().map(|price| price / average).collect()
    }
}

/// Check that every value in a series satisfies `is_valid`
fn check_values<F>(values: &[f64], name: &str, is_valid: F) -> Result<(), ModelError>
where
    F: Fn(f64) -> bool,
{
    match values.iter().position(|&x| !is_valid(x)) {
        Some(index) => Err(ModelError::DataShape(format!(
            "invalid {name} value {} at hour {}",
            values[index],
            index + 1
        ))),
        None => Ok(()),
    }
}
