//! Tunable planner policy.
//!
//! Every threshold the offense planner uses lives here so a scenario can
//! override it from RON instead of relying on compiled-in constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::research::ResearchId;
use crate::snapshot::{Difficulty, Facility};

/// Planets per fleet, keyed by difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetDividers {
    /// Divider on easy.
    pub easy: u32,
    /// Divider on normal.
    pub normal: u32,
    /// Divider on hard.
    pub hard: u32,
}

impl Default for FleetDividers {
    fn default() -> Self {
        Self {
            easy: 5,
            normal: 4,
            hard: 3,
        }
    }
}

impl FleetDividers {
    /// Divider for a difficulty.
    #[must_use]
    pub const fn divider(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Stock target and production batch for one ship class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTarget {
    /// Units wanted per type (per fleet for hull classes).
    pub per_type: u32,
    /// Units ordered per production order.
    pub batch: u32,
}

impl StockTarget {
    /// Create a stock target.
    #[must_use]
    pub const fn new(per_type: u32, batch: u32) -> Self {
        Self { per_type, batch }
    }
}

/// Construction cost of each facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityCosts {
    /// Orbital factory.
    pub orbital_factory: i64,
    /// Military spaceport.
    pub military_spaceport: i64,
}

impl Default for FacilityCosts {
    fn default() -> Self {
        Self {
            orbital_factory: 50_000,
            military_spaceport: 40_000,
        }
    }
}

impl FacilityCosts {
    /// Cost of a facility.
    #[must_use]
    pub const fn cost(&self, facility: Facility) -> i64 {
        match facility {
            Facility::OrbitalFactory => self.orbital_factory,
            Facility::MilitarySpaceport => self.military_spaceport,
        }
    }
}

/// Offense planner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Planets per fleet by difficulty.
    pub dividers: FleetDividers,
    /// Treasury below which no new fleet project starts.
    pub money_threshold: i64,
    /// Fighter stock per type.
    pub fighters: StockTarget,
    /// Cruisers per fleet.
    pub cruisers: StockTarget,
    /// Battleships per fleet.
    pub battleships: StockTarget,
    /// Battleship-class blueprint never used in war fleets.
    pub colony_ship: ResearchId,
    /// Facility construction costs.
    pub facility_costs: FacilityCosts,
    /// Decommissioned hulls sell for `production_cost / resale_divisor`.
    pub resale_divisor: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            dividers: FleetDividers::default(),
            money_threshold: 100_000,
            fighters: StockTarget::new(30, 10),
            cruisers: StockTarget::new(25, 2),
            battleships: StockTarget::new(3, 1),
            colony_ship: ResearchId::new("ColonyShip"),
            facility_costs: FacilityCosts::default(),
            resale_divisor: 2,
        }
    }
}

impl PlannerConfig {
    /// Fleets the faction should own: `planets / divider + 1`.
    #[must_use]
    pub fn desired_fleets(&self, planets: usize, difficulty: Difficulty) -> usize {
        let divider = self.dividers.divider(difficulty).max(1) as usize;
        planets / divider + 1
    }

    /// Reject values that would make the planner divide by zero or never act.
    pub fn validate(&self) -> Result<()> {
        let dividers = [self.dividers.easy, self.dividers.normal, self.dividers.hard];
        if dividers.contains(&0) {
            return Err(PlannerError::InvalidState(
                "fleet dividers must be positive".to_string(),
            ));
        }
        for (name, target) in [
            ("fighters", self.fighters),
            ("cruisers", self.cruisers),
            ("battleships", self.battleships),
        ] {
            if target.batch == 0 {
                return Err(PlannerError::InvalidState(format!(
                    "{name} batch must be positive"
                )));
            }
        }
        if self.resale_divisor <= 0 {
            return Err(PlannerError::InvalidState(
                "resale divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PlannerError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        Self::parse(ron_str, "<inline>")
    }

    fn parse(ron_str: &str, origin: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_str).map_err(|e| PlannerError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
