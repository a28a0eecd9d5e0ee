//! Error types for building, solving and post-processing the dispatch model.
use thiserror::Error;

/// An error which aborts a single model run.
///
/// Variants which originate from the solver carry the raw status string reported by HiGHS so that
/// the failure can be diagnosed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The time series is malformed (length mismatch, missing column, invalid value)
    #[error("Invalid time series: {0}")]
    DataShape(String),
    /// The objective selector is not one of the known operating modes
    #[error("Unknown objective: {0}")]
    UnknownObjective(String),
    /// A parameter is unusable even after clamping
    #[error("Invalid parameter: {0}")]
    DegenerateParameter(String),
    /// None of the requested solver backends can be used
    #[error("No solver available (tried: {tried})")]
    NoSolverAvailable {
        /// The backends which were requested, in order
        tried: String,
    },
    /// The solver hit its wall-clock limit before reaching an optimum
    #[error("Solver reached time limit of {seconds}s (status: {status})")]
    SolverTimeout {
        /// The time limit passed to the solver
        seconds: f64,
        /// Raw solver status
        status: String,
    },
    /// The model has no feasible solution
    #[error("Model is infeasible (status: {status})")]
    InfeasibleModel {
        /// Raw solver status
        status: String,
    },
    /// The objective can be improved without limit
    #[error("Model is unbounded (status: {status})")]
    UnboundedModel {
        /// Raw solver status
        status: String,
    },
    /// The solver stopped for any other reason
    #[error("Solver failed (status: {status})")]
    SolverFailed {
        /// Raw solver status
        status: String,
    },
    /// A derived metric would divide by a (near-)zero quantity
    #[error("Cannot compute {metric}: {denominator} is zero")]
    DegenerateResult {
        /// The metric being computed
        metric: &'static str,
        /// The summary quantity used as the denominator
        denominator: &'static str,
    },
}
