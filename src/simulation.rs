//! Functionality for running a dispatch and sizing optimisation.
use crate::dispatch::DispatchModel;
use crate::error::ModelError;
use crate::metrics::Metrics;
use crate::parameters::ParameterSet;
use crate::results::Solution;
use crate::solver::SolverOptions;
use crate::time_series::TimeSeries;
use log::info;

/// Run the model: build it, solve it and post-process the results.
///
/// The derived metrics are appended to the scalar summary of the returned solution.
///
/// # Arguments
///
/// * `params` - The validated parameters
/// * `series` - The hourly input data
/// * `options` - Solver selection and time limit
pub fn run(
    params: &ParameterSet,
    series: &TimeSeries,
    options: &SolverOptions,
) -> Result<Solution, ModelError> {
    let model = DispatchModel::build(params, series);
    let mut solution = model.solve(options)?;
    info!(
        "Solved with {} (status: {})",
        solution.backend, solution.status
    );

    let metrics = Metrics::from_summary(&solution.summary)?;
    info!(
        "LCOE: {:.2} $/MWh, COVE: {:.2} $/MWh, ROI: {:.3}",
        metrics.lcoe, metrics.cove, metrics.roi
    );
    for (name, value) in metrics.iter() {
        solution.summary.insert(name, value);
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{solver_options, time_series, wind_only_parameter_set};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_run_wind_only(
        wind_only_parameter_set: ParameterSet,
        time_series: TimeSeries,
        solver_options: SolverOptions,
    ) {
        let solution = run(&wind_only_parameter_set, &time_series, &solver_options).unwrap();
        let summary = &solution.summary;

        // All wind is sold: 500 MW at a mean fraction of 10.8 / 24, annualised over 365 days
        let expected = 365.0 * 500.0 * 10.8;
        assert_approx_eq!(
            f64,
            summary.get("yearly_electricity").unwrap(),
            expected,
            epsilon = 1.0
        );
        assert_approx_eq!(
            f64,
            summary.get("yearly_curtailment").unwrap(),
            0.0,
            epsilon = 1e-6
        );

        let lcoe = summary.get("LCOE").unwrap();
        assert_approx_eq!(
            f64,
            lcoe,
            summary.get("yearly_costs").unwrap() / expected,
            epsilon = 1e-4
        );
        assert!(summary.get("ROI").is_some());
    }
}
