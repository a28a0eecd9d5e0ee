//! Extraction of results from a solved dispatch model.
use crate::dispatch::ModelContext;
use crate::dispatch::variables::{Variable, Variables};
use crate::solver::{SolverBackend, SolverOutcome};
use crate::time_series::WindResource;
use indexmap::IndexMap;

/// Per-hour results, with one column per variable or input series.
///
/// Every column has one value per hour, with hours numbered from 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyTable {
    columns: IndexMap<&'static str, Vec<f64>>,
}

impl HourlyTable {
    /// The number of hours (rows)
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values of a column, if present
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names, in output order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.keys().copied()
    }

    /// Iterate over the rows of the table, each with its hour number
    pub fn iter_rows(&self) -> impl Iterator<Item = (usize, Vec<f64>)> + '_ {
        (0..self.len()).map(|t| (t + 1, self.columns.values().map(|col| col[t]).collect()))
    }

    fn insert(&mut self, name: &'static str, values: Vec<f64>) {
        self.columns.insert(name, values);
    }
}

/// Scalar results: capacities, annual quantities, parameters and derived metrics
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary(IndexMap<String, f64>);

impl Summary {
    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Add or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Iterate over (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// The results of a successfully solved model
#[derive(Debug, Clone)]
pub struct Solution {
    /// The backend which solved the model
    pub backend: SolverBackend,
    /// Raw solver status
    pub status: String,
    /// Per-hour results
    pub hourly: HourlyTable,
    /// Scalar results
    pub summary: Summary,
}

/// Organise the solver's column values into an hourly table and a summary
pub fn extract(outcome: SolverOutcome, variables: &Variables, ctx: &ModelContext) -> Solution {
    let columns = &outcome.columns;
    let value_of =
        |vars: &[Variable]| -> Vec<f64> { vars.iter().map(|var| var.value(columns)).collect() };

    let mut hourly = HourlyTable::default();
    for (name, vars) in variables.iter_hourly() {
        hourly.insert(name, value_of(vars));
    }
    match ctx.series.wind() {
        WindResource::Fraction(fractions) => hourly.insert("P_wind_fr", fractions.clone()),
        WindResource::Power(power) => hourly.insert("P_wind_MW", power.clone()),
    }
    hourly.insert("price_grid", ctx.series.price().to_vec());
    hourly.insert("emissions_grid", ctx.series.emissions().to_vec());
    hourly.insert("R", ctx.relative_price.clone());

    let mut summary = Summary::default();
    for (name, var) in variables.iter_scalar() {
        summary.insert(name, var.value(columns));
    }

    let duration = ctx.params.params().storage_duration;
    let energy_capacity = variables.capacity.well.value(columns) * duration;
    let init = variables.scalar.e_well_init.value(columns);
    summary.insert(
        "E_well_init_fr",
        if energy_capacity > 0.0 {
            init / energy_capacity
        } else {
            0.0
        },
    );

    for (name, value) in ctx.params.iter_summary() {
        summary.insert(name, value);
    }
    summary.insert("price_grid_average", ctx.series.price_average());
    summary.insert("T", ctx.hours() as f64);

    Solution {
        backend: outcome.backend,
        status: outcome.status,
        hourly,
        summary,
    }
}
