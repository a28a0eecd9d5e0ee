//! Decision variables of the dispatch model.
use super::ModelContext;
use crate::parameters::{ObjectiveTarget, Subsystem};
use highs::RowProblem as Problem;

/// A decision variable in the optimisation.
///
/// Along with the HiGHS column, we keep the column's position so that its value can be looked up
/// in the solution.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    col: highs::Col,
    index: usize,
}

impl Variable {
    /// The column in the HiGHS problem
    pub fn col(self) -> highs::Col {
        self.col
    }

    /// The value of this variable in a vector of solution column values
    pub fn value(self, columns: &[f64]) -> f64 {
        columns[self.index]
    }
}

/// Allocates columns and keeps count of them
struct ColumnAllocator<'a> {
    problem: &'a mut Problem,
    count: usize,
}

impl ColumnAllocator<'_> {
    fn add(&mut self, cost: f64, lower: f64, upper: f64) -> Variable {
        let col = self.problem.add_column(cost, lower..=upper);
        let var = Variable {
            col,
            index: self.count,
        };
        self.count += 1;
        var
    }

    /// A non-negative variable for every hour
    fn add_hourly(&mut self, hours: usize) -> Vec<Variable> {
        (0..hours).map(|_| self.add(0.0, 0.0, f64::INFINITY)).collect()
    }

    /// A capacity which is either fixed at `value` or sized by the optimisation
    fn add_capacity(&mut self, value: f64, sized: bool) -> Variable {
        if sized {
            self.add(0.0, 0.0, f64::INFINITY)
        } else {
            self.add(0.0, value, value)
        }
    }

    /// An accounting variable of either sign, which may carry the objective
    fn add_free(&mut self, cost: f64) -> Variable {
        self.add(cost, f64::NEG_INFINITY, f64::INFINITY)
    }
}

/// Per-hour decision variables (MW, except `e_well` in MWh and `electricity_revenue` in $)
pub struct HourlyVariables {
    /// Wind power delivered to the collection point
    pub p_wind: Vec<Variable>,
    /// Compressor intake power
    pub p_cmp: Vec<Variable>,
    /// Expander output power
    pub p_exp: Vec<Variable>,
    /// Curtailed wind power
    pub p_curtail: Vec<Variable>,
    /// Power delivered to the grid
    pub p_grid_sell: Vec<Variable>,
    /// Power purchased from the grid
    pub p_grid_buy: Vec<Variable>,
    /// Energy stored at the end of the hour
    pub e_well: Vec<Variable>,
    /// Net revenue from electricity sales in the hour
    pub electricity_revenue: Vec<Variable>,
}

/// Power capacities (MW), fixed or sized depending on the objective
pub struct CapacityVariables {
    /// Wind farm
    pub wind: Variable,
    /// Well power rating
    pub well: Variable,
    /// Compressor
    pub cmp: Variable,
    /// Expander
    pub exp: Variable,
    /// Constant dispatch level
    pub dispatch: Variable,
    /// Common storage rating, present only when storage is sized
    pub storage: Option<Variable>,
}

impl CapacityVariables {
    /// The capacity variable of a subsystem
    pub fn get(&self, subsystem: Subsystem) -> Variable {
        match subsystem {
            Subsystem::Wind => self.wind,
            Subsystem::Well => self.well,
            Subsystem::Compressor => self.cmp,
            Subsystem::Expander => self.exp,
        }
    }
}

/// Whole-horizon accounting variables
pub struct ScalarVariables {
    /// Initial (and final) stored energy (MWh)
    pub e_well_init: Variable,
    /// Emissions avoided by delivered energy (t CO2)
    pub avoided_emissions: Variable,
    /// Energy delivered to the grid, scaled to one year (MWh)
    pub yearly_electricity: Variable,
    /// Wind energy generated, scaled to one year (MWh)
    pub yearly_electricity_generated: Variable,
    /// Energy purchased from the grid, scaled to one year (MWh)
    pub yearly_electricity_purchased: Variable,
    /// Curtailed energy, scaled to one year (MWh)
    pub yearly_curtailment: Variable,
    /// Expander output, scaled to one year (MWh)
    pub yearly_exp_usage: Variable,
    /// Compressor intake, scaled to one year (MWh)
    pub yearly_cmp_usage: Variable,
    /// Net electricity revenue, scaled to one year ($)
    pub yearly_electricity_revenue: Variable,
    /// Capacity credit revenue ($)
    pub yearly_capacity_credit: Variable,
    /// Electricity revenue plus capacity credits ($)
    pub yearly_total_revenue: Variable,
    /// Annualised capital, fixed and variable costs ($)
    pub yearly_costs: Variable,
    /// Total revenue minus costs ($)
    pub yearly_profit: Variable,
    /// Price-weighted delivered energy, scaled to one year (MWh)
    pub yearly_electricity_value: Variable,
}

/// Every decision variable of the dispatch model
pub struct Variables {
    /// Per-hour variables
    pub hourly: HourlyVariables,
    /// Capacities
    pub capacity: CapacityVariables,
    /// Whole-horizon variables
    pub scalar: ScalarVariables,
}

impl Variables {
    /// Add all variables to the problem.
    ///
    /// The variable targeted by the objective gets a cost coefficient of one; all other columns
    /// have zero cost.
    pub fn add_to_problem(problem: &mut Problem, ctx: &ModelContext) -> Self {
        let params = ctx.params.params();
        let hours = ctx.hours();
        let sized = ctx.params.objective().sized_capacities();
        let target = ctx.params.objective().target();
        let cost_if = |t: ObjectiveTarget| if t == target { 1.0 } else { 0.0 };

        let mut columns = ColumnAllocator { problem, count: 0 };

        let hourly = HourlyVariables {
            p_wind: columns.add_hourly(hours),
            p_cmp: columns.add_hourly(hours),
            p_exp: columns.add_hourly(hours),
            p_curtail: columns.add_hourly(hours),
            p_grid_sell: columns.add_hourly(hours),
            p_grid_buy: columns.add_hourly(hours),
            e_well: columns.add_hourly(hours),
            electricity_revenue: (0..hours).map(|_| columns.add_free(0.0)).collect(),
        };

        let capacity = CapacityVariables {
            wind: columns.add_capacity(params.x_wind, sized.wind),
            well: columns.add_capacity(params.x_well, sized.storage),
            cmp: columns.add_capacity(params.x_cmp, sized.storage),
            exp: columns.add_capacity(params.x_exp, sized.storage),
            dispatch: columns.add_capacity(params.x_dispatch, sized.dispatch),
            storage: sized
                .storage
                .then(|| columns.add(0.0, 0.0, f64::INFINITY)),
        };

        let scalar = ScalarVariables {
            e_well_init: columns.add(0.0, 0.0, f64::INFINITY),
            avoided_emissions: columns.add_free(0.0),
            yearly_electricity: columns.add_free(0.0),
            yearly_electricity_generated: columns.add_free(0.0),
            yearly_electricity_purchased: columns.add_free(0.0),
            yearly_curtailment: columns.add_free(0.0),
            yearly_exp_usage: columns.add_free(0.0),
            yearly_cmp_usage: columns.add_free(0.0),
            yearly_electricity_revenue: columns
                .add_free(cost_if(ObjectiveTarget::ElectricityRevenue)),
            yearly_capacity_credit: columns.add_free(0.0),
            yearly_total_revenue: columns.add_free(0.0),
            yearly_costs: columns.add_free(cost_if(ObjectiveTarget::Costs)),
            yearly_profit: columns.add_free(cost_if(ObjectiveTarget::Profit)),
            yearly_electricity_value: columns.add_free(cost_if(ObjectiveTarget::ElectricityValue)),
        };

        Self {
            hourly,
            capacity,
            scalar,
        }
    }

    /// Per-hour variables by output column name
    pub fn iter_hourly(&self) -> impl Iterator<Item = (&'static str, &[Variable])> {
        let h = &self.hourly;
        [
            ("P_wind", h.p_wind.as_slice()),
            ("P_cmp", h.p_cmp.as_slice()),
            ("P_exp", h.p_exp.as_slice()),
            ("P_curtail", h.p_curtail.as_slice()),
            ("P_grid_sell", h.p_grid_sell.as_slice()),
            ("P_grid_buy", h.p_grid_buy.as_slice()),
            ("E_well", h.e_well.as_slice()),
            ("electricity_revenue", h.electricity_revenue.as_slice()),
        ]
        .into_iter()
    }

    /// Whole-horizon variables (including capacities) by summary name
    pub fn iter_scalar(&self) -> impl Iterator<Item = (&'static str, Variable)> {
        let c = &self.capacity;
        let s = &self.scalar;
        [
            ("X_wind", c.wind),
            ("X_well", c.well),
            ("X_cmp", c.cmp),
            ("X_exp", c.exp),
            ("X_dispatch", c.dispatch),
            ("E_well_init", s.e_well_init),
            ("avoided_emissions", s.avoided_emissions),
            ("yearly_electricity", s.yearly_electricity),
            ("yearly_electricity_generated", s.yearly_electricity_generated),
            ("yearly_electricity_purchased", s.yearly_electricity_purchased),
            ("yearly_curtailment", s.yearly_curtailment),
            ("yearly_exp_usage", s.yearly_exp_usage),
            ("yearly_cmp_usage", s.yearly_cmp_usage),
            ("yearly_electricity_revenue", s.yearly_electricity_revenue),
            ("yearly_capacity_credit", s.yearly_capacity_credit),
            ("yearly_total_revenue", s.yearly_total_revenue),
            ("yearly_costs", s.yearly_costs),
            ("yearly_profit", s.yearly_profit),
            ("yearly_electricity_value", s.yearly_electricity_value),
        ]
        .into_iter()
        .chain(c.storage.map(|var| ("X_storage", var)))
    }
}
