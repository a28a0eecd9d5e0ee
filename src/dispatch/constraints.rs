//! Code for adding constraints to the dispatch optimisation problem.
//!
//! Each [`ConstraintKind`] is a generator which appends a family of rows to the problem. The set
//! of generators used for a run is chosen by [`constraint_set`] from the parameters alone, so it
//! can be inspected (and tested) without building a model.
use super::ModelContext;
use super::variables::{Variable, Variables};
use crate::parameters::{Parameters, Subsystem};
use crate::time_series::WindResource;
use highs::RowProblem as Problem;
use itertools::izip;
use strum::{Display, IntoEnumIterator};

/// Number of days in a year, used for capacity credits
const DAYS_PER_YEAR: f64 = 365.0;

/// A family of constraints in the dispatch model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintKind {
    /// Wind power equals the available resource
    WindAvailability,
    /// Supply equals demand at every hour
    PowerBalance,
    /// Compressor and expander flows are within their ratings and the well's power rating
    PowerCapacity,
    /// Grid sales are limited by the wind farm's interconnection
    GridSellLimit,
    /// Combined grid sales and purchases are limited by the interconnection
    GridInterconnection,
    /// Grid purchases are limited by the interconnection
    GridBuyEnabled,
    /// Grid purchases are forbidden
    GridBuyDisabled,
    /// Stored energy is within the well's energy capacity
    StorageCapacity,
    /// The first hour starts at the initial storage level
    StorageInit,
    /// Stored energy evolves with compressor and expander flows
    StorageBalance,
    /// Flows in the first hour are energy neutral (optional)
    StorageWrapAround,
    /// The last hour ends at the initial storage level
    StorageCyclic,
    /// Emissions displaced by net delivered energy
    Emissions,
    /// Annual energy quantities
    YearlyEnergy,
    /// Hourly and annual electricity revenue
    ElectricityRevenue,
    /// Capacity credits from wind and expander capacity
    CapacityCredit,
    /// Capacity credits from the constant dispatch level
    CapacityCreditSimple,
    /// Electricity revenue plus capacity credits
    TotalRevenue,
    /// Annualised capital, fixed and variable costs
    Costs,
    /// Total revenue minus costs
    Profit,
    /// Price-weighted delivered energy
    ElectricityValue,
    /// Well, compressor and expander share one sized rating
    StorageCapacityTied,
    /// Output to the grid is constant
    ConstantDispatch,
    /// Change in output between hours is limited
    RampLimit,
}

/// Constraints present in every model, in the order they are added
const CORE_CONSTRAINTS: [ConstraintKind; 17] = [
    ConstraintKind::WindAvailability,
    ConstraintKind::PowerBalance,
    ConstraintKind::PowerCapacity,
    ConstraintKind::GridSellLimit,
    ConstraintKind::GridInterconnection,
    ConstraintKind::StorageCapacity,
    ConstraintKind::StorageInit,
    ConstraintKind::StorageBalance,
    ConstraintKind::StorageCyclic,
    ConstraintKind::Emissions,
    ConstraintKind::YearlyEnergy,
    ConstraintKind::ElectricityRevenue,
    ConstraintKind::TotalRevenue,
    ConstraintKind::Costs,
    ConstraintKind::Profit,
    ConstraintKind::ElectricityValue,
    ConstraintKind::GridBuyDisabled,
];

/// The constraint generators for a run with the given parameters.
///
/// The core set is chosen by the objective. Ramp limits and the energy-neutral first hour are
/// added only when the parameters ask for them.
pub fn constraint_set(params: &Parameters) -> Vec<ConstraintKind> {
    let objective = params.objective;
    let mut set: Vec<_> = CORE_CONSTRAINTS.to_vec();

    if objective.allows_arbitrage() {
        for kind in &mut set {
            if *kind == ConstraintKind::GridBuyDisabled {
                *kind = ConstraintKind::GridBuyEnabled;
            }
        }
    }

    set.push(if objective.is_constant_dispatch() {
        ConstraintKind::CapacityCreditSimple
    } else {
        ConstraintKind::CapacityCredit
    });

    if objective.sized_capacities().storage {
        set.push(ConstraintKind::StorageCapacityTied);
    }
    if objective.is_constant_dispatch() {
        set.push(ConstraintKind::ConstantDispatch);
    }
    if params.neutral_first_hour {
        set.push(ConstraintKind::StorageWrapAround);
    }
    if params.ramp_rate.is_some() {
        set.push(ConstraintKind::RampLimit);
    }

    set
}

impl ConstraintKind {
    /// Add the rows for this family of constraints to the problem
    pub fn add_to_problem(self, problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
        match self {
            Self::WindAvailability => add_wind_availability(problem, vars, ctx),
            Self::PowerBalance => add_power_balance(problem, vars),
            Self::PowerCapacity => add_power_capacity(problem, vars),
            Self::GridSellLimit => add_grid_sell_limit(problem, vars),
            Self::GridInterconnection => add_grid_interconnection(problem, vars),
            Self::GridBuyEnabled => add_grid_buy_enabled(problem, vars),
            Self::GridBuyDisabled => add_grid_buy_disabled(problem, vars),
            Self::StorageCapacity => add_storage_capacity(problem, vars, ctx),
            Self::StorageInit => add_storage_init(problem, vars, ctx),
            Self::StorageBalance => add_storage_balance(problem, vars, ctx),
            Self::StorageWrapAround => add_storage_wrap_around(problem, vars, ctx),
            Self::StorageCyclic => add_storage_cyclic(problem, vars),
            Self::Emissions => add_emissions(problem, vars, ctx),
            Self::YearlyEnergy => add_yearly_energy(problem, vars, ctx),
            Self::ElectricityRevenue => add_electricity_revenue(problem, vars, ctx),
            Self::CapacityCredit => add_capacity_credit(problem, vars, ctx),
            Self::CapacityCreditSimple => add_capacity_credit_simple(problem, vars, ctx),
            Self::TotalRevenue => add_total_revenue(problem, vars),
            Self::Costs => add_costs(problem, vars, ctx),
            Self::Profit => add_profit(problem, vars),
            Self::ElectricityValue => add_electricity_value(problem, vars, ctx),
            Self::StorageCapacityTied => add_storage_capacity_tied(problem, vars),
            Self::ConstantDispatch => add_constant_dispatch(problem, vars),
            Self::RampLimit => add_ramp_limit(problem, vars, ctx),
        }
    }
}

/// Add a row `Σ coeff·var == 0`
fn add_equality<I>(problem: &mut Problem, terms: I)
where
    I: IntoIterator<Item = (Variable, f64)>,
{
    problem.add_row(0.0..=0.0, terms.into_iter().map(|(var, c)| (var.col(), c)));
}

/// Add a row `Σ coeff·var <= 0`
fn add_non_positive<I>(problem: &mut Problem, terms: I)
where
    I: IntoIterator<Item = (Variable, f64)>,
{
    problem.add_row(..=0.0, terms.into_iter().map(|(var, c)| (var.col(), c)));
}

/// Define `total == factor·Σ vars`, returned as terms of an equality row
fn sum_terms(
    total: Variable,
    vars: &[Variable],
    factor: f64,
) -> impl Iterator<Item = (Variable, f64)> + '_ {
    std::iter::once((total, 1.0)).chain(vars.iter().map(move |&var| (var, -factor)))
}

fn add_wind_availability(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let p_wind = &vars.hourly.p_wind;
    match ctx.series.wind() {
        WindResource::Fraction(fractions) => {
            // P_wind == X_wind * fraction
            for (&var, &fraction) in p_wind.iter().zip(fractions) {
                add_equality(problem, [(var, 1.0), (vars.capacity.wind, -fraction)]);
            }
        }
        WindResource::Power(power) => {
            for (&var, &mw) in p_wind.iter().zip(power) {
                problem.add_row(mw..=mw, [(var.col(), 1.0)]);
            }
        }
    }
}

fn add_power_balance(problem: &mut Problem, vars: &Variables) {
    let h = &vars.hourly;
    for (&wind, &exp, &buy, &curtail, &sell, &cmp) in izip!(
        &h.p_wind,
        &h.p_exp,
        &h.p_grid_buy,
        &h.p_curtail,
        &h.p_grid_sell,
        &h.p_cmp
    ) {
        add_equality(
            problem,
            [
                (wind, 1.0),
                (exp, 1.0),
                (buy, 1.0),
                (curtail, -1.0),
                (sell, -1.0),
                (cmp, -1.0),
            ],
        );
    }
}

fn add_power_capacity(problem: &mut Problem, vars: &Variables) {
    let cap = &vars.capacity;
    for (&cmp, &exp) in vars.hourly.p_cmp.iter().zip(&vars.hourly.p_exp) {
        add_non_positive(problem, [(cmp, 1.0), (cap.cmp, -1.0)]);
        add_non_positive(problem, [(exp, 1.0), (cap.exp, -1.0)]);
        add_non_positive(problem, [(cmp, 1.0), (cap.well, -1.0)]);
        add_non_positive(problem, [(exp, 1.0), (cap.well, -1.0)]);
    }
}

fn add_grid_sell_limit(problem: &mut Problem, vars: &Variables) {
    for &sell in &vars.hourly.p_grid_sell {
        add_non_positive(problem, [(sell, 1.0), (vars.capacity.wind, -1.0)]);
    }
}

fn add_grid_interconnection(problem: &mut Problem, vars: &Variables) {
    let h = &vars.hourly;
    for (&sell, &buy) in h.p_grid_sell.iter().zip(&h.p_grid_buy) {
        add_non_positive(problem, [(sell, 1.0), (buy, 1.0), (vars.capacity.wind, -1.0)]);
    }
}

fn add_grid_buy_enabled(problem: &mut Problem, vars: &Variables) {
    for &buy in &vars.hourly.p_grid_buy {
        add_non_positive(problem, [(buy, 1.0), (vars.capacity.wind, -1.0)]);
    }
}

fn add_grid_buy_disabled(problem: &mut Problem, vars: &Variables) {
    for &buy in &vars.hourly.p_grid_buy {
        add_non_positive(problem, [(buy, 1.0)]);
    }
}

fn add_storage_capacity(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let params = ctx.params.params();
    let min = params.min_storage_fr * params.storage_duration;
    let max = params.max_storage_fr * params.storage_duration;
    let well = vars.capacity.well;
    for &energy in &vars.hourly.e_well {
        // min_fr * duration * X_well <= E_well
        add_non_positive(problem, [(well, min), (energy, -1.0)]);
        // E_well <= max_fr * duration * X_well
        add_non_positive(problem, [(energy, 1.0), (well, -max)]);
    }
}

fn add_storage_init(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let init = vars.scalar.e_well_init;
    add_equality(problem, [(vars.hourly.e_well[0], 1.0), (init, -1.0)]);

    // Initial fraction of the well's energy capacity is at most one
    let duration = ctx.params.params().storage_duration;
    add_non_positive(problem, [(init, 1.0), (vars.capacity.well, -duration)]);
}

fn add_storage_balance(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let delta_t = ctx.delta_t();
    let eta = ctx.params.eta_single();
    for t in 1..ctx.hours() {
        // E[t] == E[t-1] + dt * eta * P_cmp[t] - dt * P_exp[t] / eta
        add_equality(
            problem,
            [
                (h.e_well[t], 1.0),
                (h.e_well[t - 1], -1.0),
                (h.p_cmp[t], -delta_t * eta),
                (h.p_exp[t], delta_t / eta),
            ],
        );
    }
}

fn add_storage_wrap_around(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let eta = ctx.params.eta_single();
    add_equality(problem, [(h.p_cmp[0], eta), (h.p_exp[0], -1.0 / eta)]);
}

fn add_storage_cyclic(problem: &mut Problem, vars: &Variables) {
    let h = &vars.hourly;
    if let Some(&last) = h.e_well.last() {
        add_equality(problem, [(last, 1.0), (vars.scalar.e_well_init, -1.0)]);
    }
}

fn add_emissions(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let delta_t = ctx.delta_t();
    let terms = izip!(&h.p_grid_sell, &h.p_grid_buy, ctx.series.emissions()).flat_map(
        |(&sell, &buy, &emissions)| {
            [(sell, -delta_t * emissions), (buy, delta_t * emissions)]
        },
    );
    add_equality(
        problem,
        std::iter::once((vars.scalar.avoided_emissions, 1.0)).chain(terms),
    );
}

fn add_yearly_energy(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let s = &vars.scalar;
    let factor = ctx.annual_scale * ctx.delta_t();
    for (total, hourly) in [
        (s.yearly_electricity, &h.p_grid_sell),
        (s.yearly_electricity_generated, &h.p_wind),
        (s.yearly_electricity_purchased, &h.p_grid_buy),
        (s.yearly_curtailment, &h.p_curtail),
        (s.yearly_exp_usage, &h.p_exp),
        (s.yearly_cmp_usage, &h.p_cmp),
    ] {
        add_equality(problem, sum_terms(total, hourly, factor));
    }
}

fn add_electricity_revenue(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let delta_t = ctx.delta_t();
    for (&revenue, &sell, &buy, &price) in izip!(
        &h.electricity_revenue,
        &h.p_grid_sell,
        &h.p_grid_buy,
        ctx.series.price()
    ) {
        // revenue == dt * (sell - buy) * price
        add_equality(
            problem,
            [
                (revenue, 1.0),
                (sell, -delta_t * price),
                (buy, delta_t * price),
            ],
        );
    }

    add_equality(
        problem,
        sum_terms(
            vars.scalar.yearly_electricity_revenue,
            &h.electricity_revenue,
            ctx.annual_scale,
        ),
    );
}

fn add_capacity_credit(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let params = ctx.params.params();
    let value = params.cc_value * DAYS_PER_YEAR;
    add_equality(
        problem,
        [
            (vars.scalar.yearly_capacity_credit, 1.0),
            (vars.capacity.wind, -value * params.cc_wind),
            (vars.capacity.exp, -value * params.cc_exp),
        ],
    );
}

fn add_capacity_credit_simple(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let value = ctx.params.params().cc_value * DAYS_PER_YEAR;
    add_equality(
        problem,
        [
            (vars.scalar.yearly_capacity_credit, 1.0),
            (vars.capacity.dispatch, -value),
        ],
    );
}

fn add_total_revenue(problem: &mut Problem, vars: &Variables) {
    let s = &vars.scalar;
    add_equality(
        problem,
        [
            (s.yearly_total_revenue, 1.0),
            (s.yearly_electricity_revenue, -1.0),
            (s.yearly_capacity_credit, -1.0),
        ],
    );
}

fn add_costs(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let params = ctx.params.params();
    let h = &vars.hourly;
    let factor = ctx.annual_scale * ctx.delta_t();

    let capital_and_fixed = Subsystem::iter().map(|s| {
        (
            vars.capacity.get(s),
            -ctx.params.annual_cost_per_capacity(s),
        )
    });

    // Energy injected into the well is charged at the compressor's flow
    let variable = [
        (&h.p_wind, params.v_wind),
        (&h.p_cmp, params.v_cmp + params.v_well),
        (&h.p_exp, params.v_exp),
    ]
    .into_iter()
    .flat_map(|(hourly, cost)| hourly.iter().map(move |&var| (var, -factor * cost)));

    add_equality(
        problem,
        std::iter::once((vars.scalar.yearly_costs, 1.0))
            .chain(capital_and_fixed)
            .chain(variable),
    );
}

fn add_profit(problem: &mut Problem, vars: &Variables) {
    let s = &vars.scalar;
    add_equality(
        problem,
        [
            (s.yearly_profit, 1.0),
            (s.yearly_total_revenue, -1.0),
            (s.yearly_costs, 1.0),
        ],
    );
}

fn add_electricity_value(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let h = &vars.hourly;
    let factor = ctx.annual_scale * ctx.delta_t();
    let terms = izip!(&h.p_grid_sell, &h.p_grid_buy, &ctx.relative_price).flat_map(
        |(&sell, &buy, &weight)| [(sell, -factor * weight), (buy, factor * weight)],
    );
    add_equality(
        problem,
        std::iter::once((vars.scalar.yearly_electricity_value, 1.0)).chain(terms),
    );
}

fn add_storage_capacity_tied(problem: &mut Problem, vars: &Variables) {
    let cap = &vars.capacity;
    if let Some(storage) = cap.storage {
        for var in [cap.well, cap.cmp, cap.exp] {
            add_equality(problem, [(var, 1.0), (storage, -1.0)]);
        }
    }
}

fn add_constant_dispatch(problem: &mut Problem, vars: &Variables) {
    for &sell in &vars.hourly.p_grid_sell {
        add_equality(problem, [(sell, 1.0), (vars.capacity.dispatch, -1.0)]);
    }
}

fn add_ramp_limit(problem: &mut Problem, vars: &Variables, ctx: &ModelContext) {
    let Some(rate) = ctx.params.params().ramp_rate else {
        return;
    };
    let limit = rate * ctx.delta_t();
    for pair in vars.hourly.p_grid_sell.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        problem.add_row(-limit..=limit, [(next.col(), 1.0), (prev.col(), -1.0)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Objective;
    use rstest::rstest;

    fn set_for(objective: Objective) -> Vec<ConstraintKind> {
        constraint_set(&Parameters {
            objective,
            ..Default::default()
        })
    }

    #[test]
    fn test_core_constraints_always_present() {
        for objective in Objective::iter() {
            let set = set_for(objective);
            for kind in &CORE_CONSTRAINTS {
                if *kind != ConstraintKind::GridBuyDisabled {
                    assert!(set.contains(kind), "{objective} is missing {kind}");
                }
            }
            assert!(!set.contains(&ConstraintKind::RampLimit));
            assert!(!set.contains(&ConstraintKind::StorageWrapAround));
        }
    }

    #[test]
    fn test_grid_buy_only_with_arbitrage() {
        let set = set_for(Objective::RevenueArbitrage);
        assert!(set.contains(&ConstraintKind::GridBuyEnabled));
        assert!(!set.contains(&ConstraintKind::GridBuyDisabled));

        let set = set_for(Objective::Revenue);
        assert!(set.contains(&ConstraintKind::GridBuyDisabled));
        assert!(!set.contains(&ConstraintKind::GridBuyEnabled));
    }

    #[rstest]
    #[case(Objective::Revenue, false, false)]
    #[case(Objective::Profit, false, false)]
    #[case(Objective::Cove, false, false)]
    #[case(Objective::ConstantDispatchFixDispatch, true, true)]
    #[case(Objective::ConstantDispatchFixDispatchStorage, true, false)]
    #[case(Objective::ConstantDispatchFixAll, true, false)]
    #[case(Objective::ConstantDispatchFixWindStorage, true, false)]
    fn test_conditional_constraints(
        #[case] objective: Objective,
        #[case] constant: bool,
        #[case] tied: bool,
    ) {
        let set = set_for(objective);
        assert_eq!(set.contains(&ConstraintKind::ConstantDispatch), constant);
        assert_eq!(set.contains(&ConstraintKind::CapacityCreditSimple), constant);
        assert_eq!(set.contains(&ConstraintKind::CapacityCredit), !constant);
        assert_eq!(set.contains(&ConstraintKind::StorageCapacityTied), tied);
    }

    #[test]
    fn test_optional_constraints() {
        let set = constraint_set(&Parameters {
            ramp_rate: Some(10.0),
            neutral_first_hour: true,
            ..Default::default()
        });
        assert_eq!(
            set[set.len() - 2..],
            [ConstraintKind::StorageWrapAround, ConstraintKind::RampLimit]
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ConstraintKind::StorageWrapAround.to_string(), "storage_wrap_around");
    }
}
