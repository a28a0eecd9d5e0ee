//! General functions related to finance.

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualise capital costs over the financed lifetime of a subsystem. It is
/// computed as `i + i / ((1 + i)^L - 1)`, which is the annuity factor `i(1+i)^L / ((1+i)^L - 1)`.
/// For a zero discount rate the limit `1 / L` is returned.
pub fn capital_recovery_factor(lifetime: f64, discount_rate: f64) -> f64 {
    if discount_rate.abs() < f64::EPSILON {
        return 1.0 / lifetime;
    }

    let factor = (1.0 + discount_rate).powf(lifetime);
    discount_rate + discount_rate / (factor - 1.0)
}

/// The real discount rate, given nominal interest and inflation
pub fn real_discount_rate(interest: f64, inflation: f64) -> f64 {
    interest - inflation
}

/// Calculates the annual capital cost for a subsystem per unit of capacity
pub fn annual_capital_cost(capital_cost: f64, lifetime: f64, discount_rate: f64) -> f64 {
    capital_cost * capital_recovery_factor(lifetime, discount_rate)
}
