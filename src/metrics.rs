//! Economic and environmental metrics derived from a solved model.
use crate::error::ModelError;
use crate::results::Summary;
use float_cmp::approx_eq;

/// Metrics calculated from the scalar summary of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Levelised cost of electricity ($/MWh)
    pub lcoe: f64,
    /// Cost of valued energy ($/MWh)
    pub cove: f64,
    /// Total revenue per unit of delivered energy ($/kWh)
    pub revenue_per_kwh: f64,
    /// Avoided emissions per unit of delivered energy (t CO2/MWh)
    pub avoided_emissions_rate: f64,
    /// Return on investment: total revenue over costs
    pub roi: f64,
}

impl Metrics {
    /// Calculate the metrics from a summary.
    ///
    /// A summary value which is missing is treated as zero.
    pub fn from_summary(summary: &Summary) -> Result<Self, ModelError> {
        let get = |name| summary.get(name).unwrap_or(0.0);
        let costs = get("yearly_costs");
        let total_revenue = get("yearly_total_revenue");

        Ok(Self {
            lcoe: ratio("LCOE", costs, "yearly_electricity", summary)?,
            cove: ratio("COVE", costs, "yearly_electricity_value", summary)?,
            revenue_per_kwh: ratio("revenue_per_kWh", total_revenue, "yearly_electricity", summary)?
                * 1e-3,
            avoided_emissions_rate: ratio(
                "avoided_emissions_rate",
                get("avoided_emissions"),
                "yearly_electricity",
                summary,
            )?,
            roi: ratio("ROI", total_revenue, "yearly_costs", summary)?,
        })
    }

    /// Iterate over the metrics by summary name
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("LCOE", self.lcoe),
            ("COVE", self.cove),
            ("revenue_per_kWh", self.revenue_per_kwh),
            ("avoided_emissions_rate", self.avoided_emissions_rate),
            ("ROI", self.roi),
        ]
        .into_iter()
    }
}

/// Divide by a summary value, failing if it is (close to) zero
fn ratio(
    metric: &'static str,
    numerator: f64,
    denominator: &'static str,
    summary: &Summary,
) -> Result<f64, ModelError> {
    let value = summary.get(denominator).unwrap_or(0.0);
    if approx_eq!(f64, value, 0.0, epsilon = 1e-9) {
        return Err(ModelError::DegenerateResult {
            metric,
            denominator,
        });
    }

    Ok(numerator / value)
}
