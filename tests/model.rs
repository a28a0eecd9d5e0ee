//! Integration tests which solve small dispatch models and check properties of the solution.
use float_cmp::assert_approx_eq;
use itertools::izip;
use ocaes::error::ModelError;
use ocaes::parameters::{Objective, ParameterSet, Parameters, StorageArchetype, Subsystem};
use ocaes::results::Solution;
use ocaes::simulation;
use ocaes::solver::SolverOptions;
use ocaes::time_series::TimeSeries;

const TOLERANCE: f64 = 1e-5;

/// Number of hours in the varying series
const HOURS: usize = 48;

/// Two days of data alternating between six cheap and six expensive hours
fn series_from_wind(wind: Vec<f64>) -> TimeSeries {
    let price = (0..HOURS)
        .map(|t| if (t / 6) % 2 == 0 { 10.0 } else { 60.0 })
        .collect();
    let emissions = (0..HOURS).map(|t| 0.3 + 0.1 * (t % 3) as f64).collect();
    TimeSeries::from_wind_fraction(wind, price, emissions).unwrap()
}

fn varying_series() -> TimeSeries {
    series_from_wind((0..HOURS).map(|t| [0.8, 0.3, 0.6, 0.1][t % 4]).collect())
}

/// Like [`varying_series`], but without any wind in the first hour
fn calm_start_series() -> TimeSeries {
    series_from_wind(
        (0..HOURS)
            .map(|t| if t == 0 { 0.0 } else { [0.8, 0.3, 0.6, 0.1][t % 4] })
            .collect(),
    )
}

/// Annualisation factor for the varying series, with hourly time steps
fn annual_scale() -> f64 {
    8760.0 / HOURS as f64
}

/// A flat series of the given length
fn flat_series(hours: usize, fraction: f64, price: f64) -> TimeSeries {
    TimeSeries::from_wind_fraction(vec![fraction; hours], vec![price; hours], vec![0.5; hours])
        .unwrap()
}

fn solve(params: Parameters, series: &TimeSeries) -> Result<Solution, ModelError> {
    let params = ParameterSet::new(params).unwrap();
    simulation::run(&params, series, &SolverOptions::default())
}

fn column<'a>(solution: &'a Solution, name: &str) -> &'a [f64] {
    solution.hourly.column(name).unwrap()
}

fn summary(solution: &Solution, name: &str) -> f64 {
    solution.summary.get(name).unwrap()
}

#[test]
fn test_power_balance_and_cyclic_storage() {
    let series = varying_series();
    let solution = solve(Parameters::default(), &series).unwrap();
    assert_eq!(solution.hourly.len(), series.len());

    for (wind, exp, buy, curtail, sell, cmp) in izip!(
        column(&solution, "P_wind"),
        column(&solution, "P_exp"),
        column(&solution, "P_grid_buy"),
        column(&solution, "P_curtail"),
        column(&solution, "P_grid_sell"),
        column(&solution, "P_cmp"),
    ) {
        assert_approx_eq!(f64, wind + exp + buy, curtail + sell + cmp, epsilon = TOLERANCE);
        assert_approx_eq!(f64, *buy, 0.0, epsilon = TOLERANCE);
    }

    let energy = column(&solution, "E_well");
    let init = summary(&solution, "E_well_init");
    assert_approx_eq!(f64, energy[0], init, epsilon = TOLERANCE);
    assert_approx_eq!(f64, energy[energy.len() - 1], init, epsilon = TOLERANCE);

    for name in ["P_wind", "P_cmp", "P_exp", "P_curtail", "P_grid_sell", "E_well"] {
        assert!(column(&solution, name).iter().all(|&x| x >= -TOLERANCE));
    }

    // Storage is worth using with this price spread
    assert!(column(&solution, "P_exp").iter().any(|&p| p > 1.0));
}

#[test]
fn test_revenue_increases_with_efficiency() {
    let series = varying_series();
    let revenue = |eta_storage| {
        let params = Parameters {
            eta_storage,
            ..Parameters::default()
        };
        summary(&solve(params, &series).unwrap(), "yearly_total_revenue")
    };

    let low = revenue(0.5);
    let high = revenue(0.9);
    assert!(high >= low - TOLERANCE, "{high} < {low}");
}

#[test]
fn test_zero_efficiency_is_floored() {
    let params = Parameters {
        eta_storage: 0.0,
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();
    assert_approx_eq!(f64, summary(&solution, "eta_storage_roundtrip"), 0.01);
    assert_approx_eq!(f64, summary(&solution, "eta_storage_single"), 0.1);
}

#[test]
fn test_wind_only() {
    let series = varying_series();
    let params = Parameters::for_archetype(StorageArchetype::WindOnly);
    let solution = solve(params, &series).unwrap();

    for (&wind, &sell, &cmp, &exp) in izip!(
        column(&solution, "P_wind"),
        column(&solution, "P_grid_sell"),
        column(&solution, "P_cmp"),
        column(&solution, "P_exp"),
    ) {
        assert_approx_eq!(f64, wind, sell, epsilon = TOLERANCE);
        assert_approx_eq!(f64, cmp, 0.0, epsilon = TOLERANCE);
        assert_approx_eq!(f64, exp, 0.0, epsilon = TOLERANCE);
    }
}

#[test]
fn test_constant_dispatch() {
    let params = Parameters {
        objective: Objective::ConstantDispatchFixDispatch,
        x_dispatch: 25.0,
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();

    for &sell in column(&solution, "P_grid_sell") {
        assert_approx_eq!(f64, sell, 25.0, epsilon = TOLERANCE);
    }

    // Storage capacities are sized together
    let storage = summary(&solution, "X_storage");
    for name in ["X_well", "X_cmp", "X_exp"] {
        assert_approx_eq!(f64, summary(&solution, name), storage, epsilon = TOLERANCE);
    }
    assert!(summary(&solution, "X_wind") >= 25.0 - TOLERANCE);
}

#[test]
fn test_lcoe_of_flat_wind_farm() {
    let params = Parameters {
        x_well: 0.0,
        x_cmp: 0.0,
        x_exp: 0.0,
        cc_value: 0.0,
        ..Parameters::default()
    };
    let params = ParameterSet::new(params).unwrap();
    let series = flat_series(72, 0.5, 30.0);
    let solution = simulation::run(&params, &series, &SolverOptions::default()).unwrap();

    // 250 MW delivered in every hour of the year
    let yearly_electricity = 2_190_000.0;
    assert_approx_eq!(
        f64,
        summary(&solution, "yearly_electricity"),
        yearly_electricity,
        epsilon = 1e-3
    );
    for name in ["yearly_electricity_revenue", "yearly_total_revenue"] {
        assert_approx_eq!(
            f64,
            summary(&solution, name),
            30.0 * yearly_electricity,
            epsilon = 1e-1
        );
    }

    let costs = 500.0 * params.annual_cost_per_capacity(Subsystem::Wind);
    assert_approx_eq!(f64, summary(&solution, "yearly_costs"), costs, epsilon = 1e-3);

    // With a flat price the value of energy equals the energy itself
    let lcoe = summary(&solution, "LCOE");
    assert_approx_eq!(f64, lcoe, costs / yearly_electricity, epsilon = 1e-6);
    assert_approx_eq!(f64, summary(&solution, "COVE"), lcoe, epsilon = 1e-6);
    assert_approx_eq!(
        f64,
        summary(&solution, "revenue_per_kWh"),
        0.03,
        epsilon = 1e-6
    );
}

#[test]
fn test_infeasible_constant_dispatch() {
    let params = Parameters {
        objective: Objective::ConstantDispatchFixAll,
        x_wind: 100.0,
        x_dispatch: 200.0,
        ..Parameters::default()
    };
    let result = solve(params, &varying_series());
    assert!(matches!(result, Err(ModelError::InfeasibleModel { .. })));
}

#[test]
fn test_constant_dispatch_without_wind_in_first_hour() {
    let params = Parameters {
        objective: Objective::ConstantDispatchFixDispatch,
        x_dispatch: 25.0,
        ..Parameters::default()
    };
    let series = calm_start_series();
    let solution = solve(params.clone(), &series).unwrap();

    // The first hour is served from storage
    assert_approx_eq!(f64, column(&solution, "P_wind")[0], 0.0, epsilon = TOLERANCE);
    assert_approx_eq!(f64, column(&solution, "P_grid_sell")[0], 25.0, epsilon = TOLERANCE);
    assert!(column(&solution, "P_exp")[0] >= 25.0 - TOLERANCE);
    assert!(summary(&solution, "X_exp") >= 25.0 - TOLERANCE);

    // Requiring energy-neutral flows in the first hour rules this out
    let params = Parameters {
        neutral_first_hour: true,
        ..params
    };
    assert!(matches!(
        solve(params, &series),
        Err(ModelError::InfeasibleModel { .. })
    ));
}

#[test]
fn test_arbitrage_buys_cheap_electricity() {
    let params = Parameters {
        objective: Objective::RevenueArbitrage,
        ..Parameters::default()
    };
    let series = varying_series();
    let solution = solve(params, &series).unwrap();

    let buy = column(&solution, "P_grid_buy");
    let bought_cheaply: f64 = izip!(buy, series.price())
        .filter(|&(_, &price)| price < 20.0)
        .map(|(&buy, _)| buy)
        .sum();
    assert!(bought_cheaply > 1.0, "bought {bought_cheaply} MWh");

    // Purchases count against avoided emissions
    let expected: f64 = izip!(column(&solution, "P_grid_sell"), buy, series.emissions())
        .map(|(sell, buy, emissions)| (sell - buy) * emissions)
        .sum();
    assert_approx_eq!(
        f64,
        summary(&solution, "avoided_emissions"),
        expected,
        epsilon = 1e-4
    );
}

#[test]
fn test_ramp_limit() {
    let rate = 20.0;
    let params = Parameters {
        ramp_rate: Some(rate),
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();

    for pair in column(&solution, "P_grid_sell").windows(2) {
        assert!(
            (pair[1] - pair[0]).abs() <= rate + TOLERANCE,
            "{} -> {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_profit() {
    let params = Parameters {
        objective: Objective::Profit,
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();

    let total_revenue = summary(&solution, "yearly_total_revenue");
    assert_approx_eq!(
        f64,
        total_revenue,
        summary(&solution, "yearly_electricity_revenue")
            + summary(&solution, "yearly_capacity_credit"),
        epsilon = 1.0
    );
    assert_approx_eq!(
        f64,
        summary(&solution, "yearly_profit"),
        total_revenue - summary(&solution, "yearly_costs"),
        epsilon = 1.0
    );
}

#[test]
fn test_cove_weights_energy_by_relative_price() {
    let params = Parameters {
        objective: Objective::Cove,
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();

    let weighted: f64 = izip!(
        column(&solution, "P_grid_sell"),
        column(&solution, "P_grid_buy"),
        column(&solution, "R")
    )
    .map(|(sell, buy, weight)| (sell - buy) * weight)
    .sum();
    assert_approx_eq!(
        f64,
        summary(&solution, "yearly_electricity_value"),
        annual_scale() * weighted,
        epsilon = 1e-2
    );
}

#[test]
fn test_constant_dispatch_level_is_sized() {
    let params = Parameters {
        objective: Objective::ConstantDispatchFixWindStorage,
        ..Parameters::default()
    };
    let solution = solve(params, &varying_series()).unwrap();

    let dispatch = summary(&solution, "X_dispatch");
    assert!(dispatch > 1.0, "dispatch level {dispatch}");
    for &sell in column(&solution, "P_grid_sell") {
        assert_approx_eq!(f64, sell, dispatch, epsilon = TOLERANCE);
    }
}
