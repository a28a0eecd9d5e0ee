//! The operating mode selector, which decides the objective and which capacities are sized.
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The objective of a model run.
///
/// Exactly one objective is active per run. Besides the objective function itself, the mode
/// determines whether grid purchases are allowed, whether output must be constant and which
/// capacities are decision variables rather than fixed parameters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Objective {
    /// Maximise annualised electricity revenue
    #[default]
    #[strum(serialize = "REVENUE")]
    Revenue,
    /// Maximise annualised electricity revenue, with purchases from the grid allowed
    #[strum(serialize = "REVENUE_ARBITRAGE")]
    RevenueArbitrage,
    /// Maximise annualised profit, including capacity credits
    #[strum(serialize = "PROFIT")]
    Profit,
    /// Maximise price-weighted delivered energy
    #[strum(serialize = "COVE")]
    Cove,
    /// Constant dispatch at a fixed level; wind and storage capacities are sized for least cost
    #[strum(serialize = "CD_FIX_DISP")]
    ConstantDispatchFixDispatch,
    /// Constant dispatch with dispatch and storage fixed; wind capacity is sized for least cost
    #[strum(serialize = "CD_FIX_DISP_STOR")]
    ConstantDispatchFixDispatchStorage,
    /// Constant dispatch with every capacity fixed; least-cost operation
    #[strum(serialize = "CD_FIX_DISP_WIND_STOR")]
    ConstantDispatchFixAll,
    /// Constant dispatch with wind and storage fixed; the dispatch level is chosen to maximise
    /// price-weighted delivered energy
    #[strum(serialize = "CD_FIX_WIND_STOR")]
    ConstantDispatchFixWindStorage,
}

/// The summary quantity which the objective function optimises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveTarget {
    /// Maximise `yearly_electricity_revenue`
    ElectricityRevenue,
    /// Maximise `yearly_profit`
    Profit,
    /// Maximise `yearly_electricity_value`
    ElectricityValue,
    /// Minimise `yearly_costs`
    Costs,
}

impl ObjectiveTarget {
    /// Whether the target is maximised (otherwise it is minimised)
    pub fn is_maximised(self) -> bool {
        !matches!(self, Self::Costs)
    }
}

/// Which capacities are decision variables for a given objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizedCapacities {
    /// Wind farm capacity
    pub wind: bool,
    /// Storage capacities (well, compressor and expander, tied to one rating)
    pub storage: bool,
    /// Constant dispatch level
    pub dispatch: bool,
}

impl Objective {
    /// The quantity optimised by this objective
    pub fn target(self) -> ObjectiveTarget {
        match self {
            Self::Revenue | Self::RevenueArbitrage => ObjectiveTarget::ElectricityRevenue,
            Self::Profit => ObjectiveTarget::Profit,
            Self::Cove | Self::ConstantDispatchFixWindStorage => ObjectiveTarget::ElectricityValue,
            Self::ConstantDispatchFixDispatch
            | Self::ConstantDispatchFixDispatchStorage
            | Self::ConstantDispatchFixAll => ObjectiveTarget::Costs,
        }
    }

    /// Whether electricity may be bought from the grid to charge storage
    pub fn allows_arbitrage(self) -> bool {
        matches!(self, Self::RevenueArbitrage)
    }

    /// Whether the output to the grid is held constant for the whole horizon
    pub fn is_constant_dispatch(self) -> bool {
        matches!(
            self,
            Self::ConstantDispatchFixDispatch
                | Self::ConstantDispatchFixDispatchStorage
                | Self::ConstantDispatchFixAll
                | Self::ConstantDispatchFixWindStorage
        )
    }

    /// Which capacities are sized by the optimisation
    pub fn sized_capacities(self) -> SizedCapacities {
        match self {
            Self::ConstantDispatchFixDispatch => SizedCapacities {
                wind: true,
                storage: true,
                dispatch: false,
            },
            Self::ConstantDispatchFixDispatchStorage => SizedCapacities {
                wind: true,
                ..Default::default()
            },
            Self::ConstantDispatchFixWindStorage => SizedCapacities {
                dispatch: true,
                ..Default::default()
            },
            _ => SizedCapacities::default(),
        }
    }

    /// Parse an objective name, failing with [`ModelError::UnknownObjective`]
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        Self::from_str(name.trim()).map_err(|_| ModelError::UnknownObjective(name.to_string()))
    }
}

impl TryFrom<String> for Objective {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
