//! Fixtures for tests

use crate::parameters::{ParameterSet, Parameters, StorageArchetype};
use crate::solver::SolverOptions;
use crate::time_series::TimeSeries;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Number of hours in the fixture time series
pub const FIXTURE_HOURS: usize = 24;

/// A day of data with a six-hour wind cycle and a price peak in the evening
#[fixture]
pub fn time_series() -> TimeSeries {
    let wind = (0..FIXTURE_HOURS)
        .map(|t| 0.2 + 0.6 * ((t % 6) as f64 / 6.0))
        .collect();
    let price = (0..FIXTURE_HOURS)
        .map(|t| if (17..21).contains(&t) { 60.0 } else { 25.0 })
        .collect();
    let emissions = vec![0.5; FIXTURE_HOURS];
    TimeSeries::from_wind_fraction(wind, price, emissions).unwrap()
}

/// The default OCAES parameters, with the revenue objective
#[fixture]
pub fn parameters() -> Parameters {
    Parameters::default()
}

/// Validated default OCAES parameters
#[fixture]
pub fn parameter_set(parameters: Parameters) -> ParameterSet {
    ParameterSet::new(parameters).unwrap()
}

/// Validated parameters for a wind farm without storage
#[fixture]
pub fn wind_only_parameter_set() -> ParameterSet {
    ParameterSet::new(Parameters::for_archetype(StorageArchetype::WindOnly)).unwrap()
}

/// Default solver preferences, which fall back to HiGHS
#[fixture]
pub fn solver_options() -> SolverOptions {
    SolverOptions::default()
}
