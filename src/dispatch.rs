//! The hourly dispatch and sizing model.
//!
//! The model is a linear program over an hourly horizon. Per-hour power flows and storage levels
//! are decision variables, as are the plant capacities which the selected objective sizes. Every
//! other capacity is a column fixed at its parameter value, so the same formulation serves both
//! fixed-capacity dispatch and capacity sizing.
//!
//! Which constraints are added is decided up front by [`constraint_set`], so the constraint set of
//! a run is an explicit value which can be inspected before solving.
use crate::error::ModelError;
use crate::parameters::ParameterSet;
use crate::results::{self, Solution};
use crate::solver::{self, SolverOptions};
use crate::time_series::TimeSeries;
use highs::{RowProblem as Problem, Sense};
use log::{debug, info};

pub mod constraints;
pub use constraints::{ConstraintKind, constraint_set};
pub mod variables;
use variables::Variables;

/// The number of hours in a year, used to annualise results
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Immutable inputs shared by every constraint generator
pub struct ModelContext<'a> {
    /// The validated parameters
    pub params: &'a ParameterSet,
    /// The hourly input data
    pub series: &'a TimeSeries,
    /// Factor which scales a sum over the horizon to an annual figure
    pub annual_scale: f64,
    /// Hourly price relative to the period average
    pub relative_price: Vec<f64>,
}

impl<'a> ModelContext<'a> {
    /// Create the context for a model run
    pub fn new(params: &'a ParameterSet, series: &'a TimeSeries) -> Self {
        let hours = series.len() as f64;
        Self {
            params,
            series,
            annual_scale: HOURS_PER_YEAR / (hours * params.params().delta_t),
            relative_price: series.relative_price(),
        }
    }

    /// The number of hours in the horizon
    pub fn hours(&self) -> usize {
        self.series.len()
    }

    /// Length of a time step (hours)
    pub fn delta_t(&self) -> f64 {
        self.params.params().delta_t
    }
}

/// An assembled dispatch model, ready to be solved
pub struct DispatchModel<'a> {
    problem: Problem,
    variables: Variables,
    constraints: Vec<ConstraintKind>,
    context: ModelContext<'a>,
}

impl<'a> DispatchModel<'a> {
    /// Build the variables, constraints and objective for the given parameters and time series.
    pub fn build(params: &'a ParameterSet, series: &'a TimeSeries) -> Self {
        let context = ModelContext::new(params, series);
        let mut problem = Problem::default();
        let variables = Variables::add_to_problem(&mut problem, &context);

        let constraints = constraint_set(params.params());
        for kind in &constraints {
            let rows_before = problem.num_rows();
            kind.add_to_problem(&mut problem, &variables, &context);
            debug!(
                "Added {} rows for {kind} constraints",
                problem.num_rows() - rows_before
            );
        }

        info!(
            "Built dispatch model for objective {} with {} hours, {} columns and {} rows",
            params.objective(),
            context.hours(),
            problem.num_cols(),
            problem.num_rows()
        );

        Self {
            problem,
            variables,
            constraints,
            context,
        }
    }

    /// The constraint generators active in this model, in the order they were applied
    pub fn constraints(&self) -> &[ConstraintKind] {
        &self.constraints
    }

    /// The number of columns (decision variables)
    pub fn num_columns(&self) -> usize {
        self.problem.num_cols()
    }

    /// The number of rows (constraints)
    pub fn num_rows(&self) -> usize {
        self.problem.num_rows()
    }

    /// Whether the objective is maximised or minimised
    pub fn sense(&self) -> Sense {
        if self.context.params.objective().target().is_maximised() {
            Sense::Maximise
        } else {
            Sense::Minimise
        }
    }

    /// Solve the model and extract the results.
    ///
    /// The model is consumed: it is solved exactly once. Unless the solver reports an optimal
    /// solution, an error is returned and no values are exposed.
    pub fn solve(self, options: &SolverOptions) -> Result<Solution, ModelError> {
        let sense = self.sense();
        let outcome = solver::solve(self.problem, sense, options)?;
        Ok(results::extract(outcome, &self.variables, &self.context))
    }
}
