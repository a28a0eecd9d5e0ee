//! The technical and economic parameters of a model run.
//!
//! A [`Parameters`] value is a plain, serialisable table of inputs. Before it can be used to build
//! a model it is turned into a [`ParameterSet`], which validates the values, clamps those which
//! can be repaired and derives quantities such as capital recovery factors.
use crate::error::ModelError;
use crate::finance::{annual_capital_cost, capital_recovery_factor, real_discount_rate};
use crate::time_series::PowerCurve;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::{Display, EnumIter, IntoEnumIterator};

pub mod objective;
pub use objective::{Objective, ObjectiveTarget, SizedCapacities};

/// The lowest round-trip efficiency used in the storage balance
pub const MIN_ROUND_TRIP_EFFICIENCY: f64 = 0.01;

/// The shortest loan lifetime (years) used when annualising capital costs
pub const MIN_LIFETIME: f64 = 1.0;

/// A predefined storage technology, which adjusts the default parameters
#[derive(
    Debug, Clone, Copy, PartialEq, Default, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum StorageArchetype {
    /// Offshore compressed-air energy storage
    #[default]
    #[string = "ocaes"]
    Ocaes,
    /// Battery storage: all storage costs are carried by the expander (power conversion)
    #[string = "battery"]
    Battery,
    /// A wind farm without storage
    #[string = "wind_only"]
    WindOnly,
}

/// The subsystems of the plant which have a capacity and costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Subsystem {
    /// The wind farm
    #[strum(serialize = "wind")]
    Wind,
    /// The storage reservoir
    #[strum(serialize = "well")]
    Well,
    /// The compressor (charging)
    #[strum(serialize = "cmp")]
    Compressor,
    /// The expander (discharging)
    #[strum(serialize = "exp")]
    Expander,
}

/// The named inputs of a model run.
///
/// Power capacities are in MW, capital costs in $/MW, fixed costs in $/MW-year and variable costs
/// in $/MWh.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// The objective of the run
    pub objective: Objective,
    /// Length of a time step (hours)
    pub delta_t: f64,

    /// Wind farm capacity
    pub x_wind: f64,
    /// Well (reservoir) power rating
    pub x_well: f64,
    /// Compressor capacity
    pub x_cmp: f64,
    /// Expander capacity
    pub x_exp: f64,
    /// Constant dispatch level (output to the grid)
    pub x_dispatch: f64,

    /// Storage duration: energy capacity per unit of well power rating (hours)
    pub storage_duration: f64,
    /// Round-trip efficiency of storage
    pub eta_storage: f64,
    /// Minimum storage level as a fraction of capacity
    pub min_storage_fr: f64,
    /// Maximum storage level as a fraction of capacity
    pub max_storage_fr: f64,

    pub c_wind: f64,
    pub c_well: f64,
    pub c_cmp: f64,
    pub c_exp: f64,

    pub v_wind: f64,
    /// Variable cost per MWh injected into the well
    pub v_well: f64,
    pub v_cmp: f64,
    pub v_exp: f64,

    pub f_wind: f64,
    pub f_well: f64,
    pub f_cmp: f64,
    pub f_exp: f64,

    /// Nominal interest rate
    pub interest: f64,
    /// Inflation rate
    pub inflation: f64,

    /// Loan lifetimes (years)
    pub l_wind: f64,
    pub l_well: f64,
    pub l_cmp: f64,
    pub l_exp: f64,

    /// Value of capacity credits ($/MW-day)
    pub cc_value: f64,
    /// Fraction of wind capacity eligible for capacity credits
    pub cc_wind: f64,
    /// Fraction of expander capacity eligible for capacity credits
    pub cc_exp: f64,

    /// Optional limit on the change in grid output between hours (MW per hour)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_rate: Option<f64>,
    /// Require compressor and expander flows in the first hour to be energy neutral
    #[serde(default)]
    pub neutral_first_hour: bool,

    /// Turbine cut-in wind speed (m/s)
    pub wt_cutin: f64,
    /// Turbine rated wind speed (m/s)
    pub wt_rated: f64,
    /// Turbine cut-out wind speed (m/s)
    pub wt_cutout: f64,
    pub wt_a: f64,
    pub wt_b: f64,
    pub wt_c: f64,
    pub wt_d: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            objective: Objective::Revenue,
            delta_t: 1.0,
            x_wind: 500.0,
            x_well: 500.0,
            x_cmp: 500.0,
            x_exp: 500.0,
            x_dispatch: 200.0,
            storage_duration: 10.0,
            eta_storage: 0.75,
            min_storage_fr: 0.0,
            max_storage_fr: 1.0,
            c_wind: 4444.0 * 1000.0,
            c_well: 144.986 * 1000.0,
            c_cmp: 0.0,
            c_exp: 930.438 * 1000.0,
            v_wind: 0.0,
            v_well: 0.0,
            v_cmp: 0.0,
            v_exp: 4.62,
            f_wind: 129.0 * 1000.0,
            f_well: 0.0,
            f_cmp: 0.0,
            f_exp: 0.0,
            interest: 0.05,
            inflation: 0.025,
            l_wind: 25.0,
            l_well: 25.0,
            l_cmp: 25.0,
            l_exp: 25.0,
            cc_value: 140.0,
            cc_wind: 0.2,
            cc_exp: 1.0,
            ramp_rate: None,
            neutral_first_hour: false,
            // NREL 5MW reference turbine
            wt_cutin: 3.16,
            wt_rated: 11.42,
            wt_cutout: 25.0,
            wt_a: 0.000_365_986_2,
            wt_b: 0.006_094_302,
            wt_c: -0.033_752_3,
            wt_d: 0.053_170_15,
        }
    }
}

impl Parameters {
    /// The default parameters for the given storage technology
    pub fn for_archetype(archetype: StorageArchetype) -> Self {
        let mut params = Self::default();
        match archetype {
            StorageArchetype::Ocaes => {}
            StorageArchetype::Battery => {
                // All costs are placed on the expander
                params.c_exp = 5038.0 * 1000.0;
                params.f_exp = 10.0 * 1000.0;
                params.v_exp = 0.03 / 100.0 * 1000.0;

                params.c_cmp = 0.0;
                params.f_cmp = 0.0;
                params.v_cmp = 0.0;
                params.c_well = 0.0;
                params.f_well = 0.0;
                params.v_well = 0.0;

                params.l_well = 10.0;
                params.l_exp = 10.0;
                params.l_cmp = 10.0;

                params.storage_duration = 10.0;
                params.eta_storage = 0.86;
            }
            StorageArchetype::WindOnly => {
                params.x_well = 0.0;
                params.x_cmp = 0.0;
                params.x_exp = 0.0;
            }
        }

        params
    }

    /// The turbine power curve
    pub fn power_curve(&self) -> PowerCurve {
        PowerCurve {
            cut_in: self.wt_cutin,
            rated: self.wt_rated,
            cut_out: self.wt_cutout,
            a: self.wt_a,
            b: self.wt_b,
            c: self.wt_c,
            d: self.wt_d,
        }
    }

    /// Power capacity of a subsystem (MW)
    pub fn capacity(&self, subsystem: Subsystem) -> f64 {
        match subsystem {
            Subsystem::Wind => self.x_wind,
            Subsystem::Well => self.x_well,
            Subsystem::Compressor => self.x_cmp,
            Subsystem::Expander => self.x_exp,
        }
    }

    /// Capital cost of a subsystem ($/MW)
    pub fn capital_cost(&self, subsystem: Subsystem) -> f64 {
        match subsystem {
            Subsystem::Wind => self.c_wind,
            Subsystem::Well => self.c_well,
            Subsystem::Compressor => self.c_cmp,
            Subsystem::Expander => self.c_exp,
        }
    }

    /// Fixed operating cost of a subsystem ($/MW-year)
    pub fn fixed_cost(&self, subsystem: Subsystem) -> f64 {
        match subsystem {
            Subsystem::Wind => self.f_wind,
            Subsystem::Well => self.f_well,
            Subsystem::Compressor => self.f_cmp,
            Subsystem::Expander => self.f_exp,
        }
    }

    /// Variable operating cost of a subsystem ($/MWh)
    pub fn variable_cost(&self, subsystem: Subsystem) -> f64 {
        match subsystem {
            Subsystem::Wind => self.v_wind,
            Subsystem::Well => self.v_well,
            Subsystem::Compressor => self.v_cmp,
            Subsystem::Expander => self.v_exp,
        }
    }

    /// Loan lifetime of a subsystem (years)
    pub fn lifetime(&self, subsystem: Subsystem) -> f64 {
        match subsystem {
            Subsystem::Wind => self.l_wind,
            Subsystem::Well => self.l_well,
            Subsystem::Compressor => self.l_cmp,
            Subsystem::Expander => self.l_exp,
        }
    }

    fn lifetime_mut(&mut self, subsystem: Subsystem) -> &mut f64 {
        match subsystem {
            Subsystem::Wind => &mut self.l_wind,
            Subsystem::Well => &mut self.l_well,
            Subsystem::Compressor => &mut self.l_cmp,
            Subsystem::Expander => &mut self.l_exp,
        }
    }

    /// Every numeric parameter, by name
    fn iter_numeric(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("delta_t", self.delta_t),
            ("x_wind", self.x_wind),
            ("x_well", self.x_well),
            ("x_cmp", self.x_cmp),
            ("x_exp", self.x_exp),
            ("x_dispatch", self.x_dispatch),
            ("storage_duration", self.storage_duration),
            ("eta_storage", self.eta_storage),
            ("min_storage_fr", self.min_storage_fr),
            ("max_storage_fr", self.max_storage_fr),
            ("c_wind", self.c_wind),
            ("c_well", self.c_well),
            ("c_cmp", self.c_cmp),
            ("c_exp", self.c_exp),
            ("v_wind", self.v_wind),
            ("v_well", self.v_well),
            ("v_cmp", self.v_cmp),
            ("v_exp", self.v_exp),
            ("f_wind", self.f_wind),
            ("f_well", self.f_well),
            ("f_cmp", self.f_cmp),
            ("f_exp", self.f_exp),
            ("interest", self.interest),
            ("inflation", self.inflation),
            ("l_wind", self.l_wind),
            ("l_well", self.l_well),
            ("l_cmp", self.l_cmp),
            ("l_exp", self.l_exp),
            ("cc_value", self.cc_value),
            ("cc_wind", self.cc_wind),
            ("cc_exp", self.cc_exp),
            ("wt_cutin", self.wt_cutin),
            ("wt_rated", self.wt_rated),
            ("wt_cutout", self.wt_cutout),
            ("wt_a", self.wt_a),
            ("wt_b", self.wt_b),
            ("wt_c", self.wt_c),
            ("wt_d", self.wt_d),
        ]
        .into_iter()
        .chain(self.ramp_rate.map(|rate| ("ramp_rate", rate)))
    }
}

/// A validated parameter set with derived quantities.
///
/// This is the only form in which parameters reach the model builder, so a malformed scenario is
/// rejected before any model is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    params: Parameters,
    discount_rate: f64,
    eta_single: f64,
}

impl ParameterSet {
    /// Validate the parameters, clamping degenerate lifetimes and efficiencies.
    ///
    /// Lifetimes below one year are raised to one year and a round-trip efficiency of zero or less
    /// is replaced by [`MIN_ROUND_TRIP_EFFICIENCY`], because the single-trip efficiency appears as a
    /// divisor in the storage balance. Other invalid values are an error.
    pub fn new(mut params: Parameters) -> Result<Self, ModelError> {
        if let Some((name, value)) = params.iter_numeric().find(|(_, value)| !value.is_finite()) {
            return Err(ModelError::DegenerateParameter(format!(
                "{name} must be finite (got {value})"
            )));
        }

        for subsystem in Subsystem::iter() {
            let lifetime = params.lifetime_mut(subsystem);
            if *lifetime < MIN_LIFETIME {
                warn!("Lifetime of {subsystem} ({lifetime} years) raised to {MIN_LIFETIME} year");
                *lifetime = MIN_LIFETIME;
            }
        }

        if params.eta_storage <= 0.0 {
            warn!(
                "Round-trip efficiency of {} replaced with {MIN_ROUND_TRIP_EFFICIENCY}",
                params.eta_storage
            );
            params.eta_storage = MIN_ROUND_TRIP_EFFICIENCY;
        }

        check_parameters(&params)?;

        let discount_rate = real_discount_rate(params.interest, params.inflation);
        let eta_single = params.eta_storage.sqrt();
        Ok(Self {
            params,
            discount_rate,
            eta_single,
        })
    }

    /// The validated parameters
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// The objective of the run
    pub fn objective(&self) -> Objective {
        self.params.objective
    }

    /// Real discount rate (interest minus inflation)
    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    /// Single-trip storage efficiency, the square root of the round-trip efficiency
    pub fn eta_single(&self) -> f64 {
        self.eta_single
    }

    /// Capital recovery factor of a subsystem
    pub fn crf(&self, subsystem: Subsystem) -> f64 {
        capital_recovery_factor(self.params.lifetime(subsystem), self.discount_rate)
    }

    /// Annualised cost per MW of capacity of a subsystem: capital cost × CRF plus fixed cost
    pub fn annual_cost_per_capacity(&self, subsystem: Subsystem) -> f64 {
        let p = &self.params;
        annual_capital_cost(p.capital_cost(subsystem), p.lifetime(subsystem), self.discount_rate)
            + p.fixed_cost(subsystem)
    }

    /// Every scalar parameter and derived parameter, by summary name
    pub fn iter_summary(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        let p = &self.params;
        let derived = [
            ("delta_t", p.delta_t),
            ("E_well_duration", p.storage_duration),
            ("E_well_min_fr", p.min_storage_fr),
            ("E_well_max_fr", p.max_storage_fr),
            ("eta_storage_roundtrip", p.eta_storage),
            ("eta_storage_single", self.eta_single),
            ("i", self.discount_rate),
            ("CC_value", p.cc_value),
            ("CC_wind", p.cc_wind),
            ("CC_exp", p.cc_exp),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value));

        let per_subsystem = Subsystem::iter().flat_map(move |s| {
            [
                (format!("C_{s}"), p.capital_cost(s)),
                (format!("F_{s}"), p.fixed_cost(s)),
                (format!("V_{s}"), p.variable_cost(s)),
                (format!("L_{s}"), p.lifetime(s)),
                (format!("CRF_{s}"), self.crf(s)),
            ]
        });

        derived.chain(per_subsystem)
    }
}

/// Check the parameters which cannot be repaired by clamping
fn check_parameters(params: &Parameters) -> Result<(), ModelError> {
    let fail = |msg: String| Err(ModelError::DegenerateParameter(msg));

    if params.delta_t <= 0.0 {
        return fail(format!("delta_t must be positive (got {})", params.delta_t));
    }

    for (name, value) in [
        ("x_wind", params.x_wind),
        ("x_well", params.x_well),
        ("x_cmp", params.x_cmp),
        ("x_exp", params.x_exp),
        ("x_dispatch", params.x_dispatch),
        ("storage_duration", params.storage_duration),
    ] {
        if value < 0.0 {
            return fail(format!("{name} cannot be negative (got {value})"));
        }
    }

    if params.eta_storage > 1.0 {
        return fail(format!(
            "eta_storage cannot exceed 1 (got {})",
            params.eta_storage
        ));
    }

    let fractions = 0.0..=1.0;
    if !fractions.contains(&params.min_storage_fr)
        || !fractions.contains(&params.max_storage_fr)
        || params.min_storage_fr > params.max_storage_fr
    {
        return fail(format!(
            "storage fractions must satisfy 0 <= min_storage_fr <= max_storage_fr <= 1 \
            (got {} and {})",
            params.min_storage_fr, params.max_storage_fr
        ));
    }

    if let Some(rate) = params.ramp_rate {
        if rate < 0.0 {
            return fail(format!("ramp_rate cannot be negative (got {rate})"));
        }
    }

    if params.interest - params.inflation <= -1.0 {
        return fail("real discount rate must be greater than -1".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_battery_archetype() {
        let params = Parameters::for_archetype(StorageArchetype::Battery);
        for value in [
            params.c_well,
            params.f_well,
            params.v_well,
            params.c_cmp,
            params.f_cmp,
            params.v_cmp,
        ] {
            assert_approx_eq!(f64, value, 0.0);
        }
        assert_approx_eq!(f64, params.c_exp, 5_038_000.0);
        assert_approx_eq!(f64, params.f_exp, 10_000.0);
        assert_approx_eq!(f64, params.v_exp, 0.3);
        assert_approx_eq!(f64, params.l_well, 10.0);
        assert_approx_eq!(f64, params.l_cmp, 10.0);
        assert_approx_eq!(f64, params.l_exp, 10.0);
        assert_approx_eq!(f64, params.eta_storage, 0.86);

        // Wind farm is untouched
        assert_approx_eq!(f64, params.c_wind, Parameters::default().c_wind);
    }

    #[test]
    fn test_wind_only_archetype() {
        let params = Parameters::for_archetype(StorageArchetype::WindOnly);
        assert_approx_eq!(f64, params.x_well, 0.0);
        assert_approx_eq!(f64, params.x_cmp, 0.0);
        assert_approx_eq!(f64, params.x_exp, 0.0);
        assert_approx_eq!(f64, params.x_wind, 500.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    fn test_efficiency_floor(#[case] eta: f64) {
        let params = Parameters {
            eta_storage: eta,
            ..Default::default()
        };
        let set = ParameterSet::new(params).unwrap();
        assert_approx_eq!(f64, set.params().eta_storage, MIN_ROUND_TRIP_EFFICIENCY);
        assert_approx_eq!(f64, set.eta_single(), 0.1);
    }

    #[test]
    fn test_lifetime_clamped() {
        let params = Parameters {
            l_wind: 0.0,
            l_exp: 0.5,
            ..Default::default()
        };
        let set = ParameterSet::new(params).unwrap();
        assert_approx_eq!(f64, set.params().l_wind, 1.0);
        assert_approx_eq!(f64, set.params().l_exp, 1.0);
        assert_approx_eq!(f64, set.params().l_well, 25.0);

        // CRF for a one-year loan is 1 + i
        assert_approx_eq!(f64, set.crf(Subsystem::Wind), 1.025, epsilon = 1e-12);
    }

    #[test]
    fn test_default_crf() {
        let set = ParameterSet::new(Parameters::default()).unwrap();
        assert_approx_eq!(f64, set.discount_rate(), 0.025);
        let i: f64 = 0.025;
        let expected = i + i / ((1.0 + i).powf(25.0) - 1.0);
        for subsystem in [Subsystem::Wind, Subsystem::Expander] {
            assert_approx_eq!(f64, set.crf(subsystem), expected, epsilon = 1e-12);
        }
        assert_approx_eq!(
            f64,
            set.annual_cost_per_capacity(Subsystem::Wind),
            4_444_000.0 * expected + 129_000.0,
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case(Parameters { x_wind: -1.0, ..Default::default() }, "x_wind")]
    #[case(Parameters { x_dispatch: -5.0, ..Default::default() }, "x_dispatch")]
    #[case(Parameters { delta_t: 0.0, ..Default::default() }, "delta_t")]
    #[case(Parameters { eta_storage: 1.5, ..Default::default() }, "eta_storage")]
    #[case(Parameters { min_storage_fr: 0.8, max_storage_fr: 0.5, ..Default::default() }, "storage fractions")]
    #[case(Parameters { ramp_rate: Some(-1.0), ..Default::default() }, "ramp_rate")]
    #[case(Parameters { c_wind: f64::NAN, ..Default::default() }, "c_wind")]
    fn test_invalid_parameters(#[case] params: Parameters, #[case] fragment: &str) {
        let err = ParameterSet::new(params).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateParameter(_)));
        assert!(err.to_string().contains(fragment), "{err}");
    }

    #[test]
    fn test_iter_summary() {
        let set = ParameterSet::new(Parameters::default()).unwrap();
        let summary: Vec<_> = set.iter_summary().collect();
        assert!(summary.iter().any(|(name, _)| name == "CRF_exp"));
        assert!(summary.iter().any(|(name, _)| name == "C_well"));
        let (_, eta) = summary
            .iter()
            .find(|(name, _)| name == "eta_storage_single")
            .unwrap();
        assert_approx_eq!(f64, *eta, 0.75_f64.sqrt());
    }
}
