//! Selection of a solver backend and invocation of the solver.
use crate::error::ModelError;
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use itertools::Itertools;
use log::{Level, debug, info, log_enabled, warn};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// A linear programming solver which may be requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SolverBackend {
    /// Gurobi (commercial)
    Gurobi,
    /// CPLEX (commercial)
    Cplex,
    /// HiGHS (open source)
    Highs,
    /// GLPK (open source)
    Glpk,
    /// CBC (open source)
    Cbc,
}

impl SolverBackend {
    /// Whether this backend is linked into the program
    pub fn is_available(self) -> bool {
        matches!(self, Self::Highs)
    }
}

/// Options controlling how the model is solved
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Backends to try, in order of preference
    pub preferred: Vec<SolverBackend>,
    /// Wall-clock limit for the solve (seconds)
    pub time_limit: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            preferred: vec![
                SolverBackend::Gurobi,
                SolverBackend::Cplex,
                SolverBackend::Highs,
                SolverBackend::Glpk,
                SolverBackend::Cbc,
            ],
            time_limit: None,
        }
    }
}

impl SolverOptions {
    /// Create options from backend names, as given in the program settings.
    ///
    /// Unrecognised names are skipped with a warning.
    pub fn from_names<S: AsRef<str>>(names: &[S], time_limit: Option<f64>) -> Self {
        let preferred = names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                SolverBackend::from_str(name)
                    .inspect_err(|_| warn!("Ignoring unknown solver '{name}'"))
                    .ok()
            })
            .collect();

        Self {
            preferred,
            time_limit,
        }
    }
}

/// Pick the first available backend in order of preference
pub fn select_backend(options: &SolverOptions) -> Result<SolverBackend, ModelError> {
    for backend in &options.preferred {
        if backend.is_available() {
            return Ok(*backend);
        }
        debug!("Solver {backend} is not available");
    }

    Err(ModelError::NoSolverAvailable {
        tried: options.preferred.iter().join(", "),
    })
}

/// The result of a successful solve
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// The backend which solved the model
    pub backend: SolverBackend,
    /// Raw solver status
    pub status: String,
    /// Values of the columns, in the order they were added
    pub columns: Vec<f64>,
}

/// Solve the problem, returning column values only if an optimal solution was found
pub fn solve(
    problem: Problem,
    sense: Sense,
    options: &SolverOptions,
) -> Result<SolverOutcome, ModelError> {
    let backend = select_backend(options)?;
    info!("Solving with {backend}");

    let mut model = problem
        .try_optimise(sense)
        .map_err(|status| ModelError::SolverFailed {
            status: format!("{status:?}"),
        })?;

    // HiGHS writes straight to the console, bypassing our logger
    model.set_option("output_flag", log_enabled!(Level::Debug));
    if let Some(seconds) = options.time_limit {
        model.set_option("time_limit", seconds);
    }

    let solved = model.try_solve().map_err(|status| ModelError::SolverFailed {
        status: format!("{status:?}"),
    })?;

    check_status(solved.status(), options.time_limit)?;
    let status = format!("{:?}", solved.status());
    debug!("Solver status: {status}");

    Ok(SolverOutcome {
        backend,
        status,
        columns: solved.get_solution().columns().to_vec(),
    })
}

/// Map a solver status onto an error, unless it is optimal
fn check_status(status: HighsModelStatus, time_limit: Option<f64>) -> Result<(), ModelError> {
    let raw = format!("{status:?}");
    match status {
        HighsModelStatus::Optimal => Ok(()),
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            Err(ModelError::InfeasibleModel { status: raw })
        }
        HighsModelStatus::Unbounded => Err(ModelError::UnboundedModel { status: raw }),
        HighsModelStatus::ReachedTimeLimit => Err(ModelError::SolverTimeout {
            seconds: time_limit.unwrap_or(f64::INFINITY),
            status: raw,
        }),
        _ => Err(ModelError::SolverFailed { status: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case("highs", SolverBackend::Highs)]
    #[case("HiGHS", SolverBackend::Highs)]
    #[case("GUROBI", SolverBackend::Gurobi)]
    #[case("cbc", SolverBackend::Cbc)]
    fn test_parse_backend(#[case] name: &str, #[case] expected: SolverBackend) {
        assert_eq!(SolverBackend::from_str(name).unwrap(), expected);
    }

    #[test]
    fn test_from_names_skips_unknown() {
        let options = SolverOptions::from_names(&["mosek", "glpk", "highs"], Some(10.0));
        assert_eq!(
            options.preferred,
            [SolverBackend::Glpk, SolverBackend::Highs]
        );
        assert_eq!(options.time_limit, Some(10.0));
    }

    #[test]
    fn test_select_backend_falls_back() {
        assert_eq!(
            select_backend(&SolverOptions::default()).unwrap(),
            SolverBackend::Highs
        );
    }

    #[test]
    fn test_select_backend_none_available() {
        let options = SolverOptions::from_names(&["gurobi", "cplex"], None);
        assert_eq!(
            select_backend(&options),
            Err(ModelError::NoSolverAvailable {
                tried: "gurobi, cplex".into()
            })
        );
    }

    #[rstest]
    #[case(HighsModelStatus::Infeasible, "Infeasible")]
    #[case(HighsModelStatus::UnboundedOrInfeasible, "UnboundedOrInfeasible")]
    fn test_check_status_infeasible(#[case] status: HighsModelStatus, #[case] raw: &str) {
        assert_eq!(
            check_status(status, None),
            Err(ModelError::InfeasibleModel { status: raw.into() })
        );
    }

    #[test]
    fn test_check_status_timeout() {
        assert_eq!(
            check_status(HighsModelStatus::ReachedTimeLimit, Some(5.0)),
            Err(ModelError::SolverTimeout {
                seconds: 5.0,
                status: "ReachedTimeLimit".into()
            })
        );
    }

    #[test]
    fn test_solve_small_problem() {
        // max x + y subject to x + 2y <= 4, x <= 2
        let mut problem = Problem::default();
        let x = problem.add_column(1.0, 0.0..=2.0);
        let y = problem.add_column(1.0, 0.0..=f64::INFINITY);
        problem.add_row(..=4.0, [(x, 1.0), (y, 2.0)]);

        let outcome = solve(problem, Sense::Maximise, &SolverOptions::default()).unwrap();
        assert_eq!(outcome.backend, SolverBackend::Highs);
        assert_approx_eq!(f64, outcome.columns[0], 2.0, epsilon = 1e-9);
        assert_approx_eq!(f64, outcome.columns[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solve_infeasible_problem() {
        let mut problem = Problem::default();
        let x = problem.add_column(1.0, 0.0..=1.0);
        problem.add_row(2.0.., [(x, 1.0)]);

        let result = solve(problem, Sense::Maximise, &SolverOptions::default());
        assert!(matches!(result, Err(ModelError::InfeasibleModel { .. })));
    }
}
