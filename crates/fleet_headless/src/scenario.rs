//! Scenario loading and configuration.
//!
//! Scenarios define the starting state for headless runs: the research
//! catalog, every faction's planets, fleets and storage, and optional
//! planner settings.

use std::collections::BTreeMap;
use std::path::Path;

use fleet_core::config::PlannerConfig;
use fleet_core::data::CatalogData;
use fleet_core::economy::{FactionEconomy, Fleet, InventoryItem, Planet};
use fleet_core::error::PlannerError;
use fleet_core::math::Vec2Fixed;
use fleet_core::research::ResearchCatalog;
use fleet_core::snapshot::{Difficulty, Facility, FactionId, FleetId, FleetTask, PlanetId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Catalog or planner settings are invalid.
    #[error("Invalid scenario data: {0}")]
    Invalid(#[from] PlannerError),
}

fn default_ticks() -> u64 {
    200
}

fn default_fleet_speed() -> i32 {
    8
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ticks to run unless overridden on the command line.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Map units a fleet covers per tick.
    #[serde(default = "default_fleet_speed")]
    pub fleet_speed: i32,
    /// Blueprints shared by every faction.
    pub catalog: CatalogData,
    /// Planner settings; defaults when absent.
    #[serde(default)]
    pub config: Option<PlannerConfig>,
    /// Faction setups.
    pub factions: Vec<FactionSetup>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Validate and convert into runnable state.
    pub fn build(&self) -> Result<ScenarioState, ScenarioError> {
        let catalog = self.catalog.clone().into_catalog()?;
        let config = self.config.clone().unwrap_or_default();
        config.validate()?;

        let mut factions = Vec::with_capacity(self.factions.len());
        for setup in &self.factions {
            let economy = setup.to_economy();
            for id in economy.available_research.iter().chain(economy.inventory.keys()) {
                catalog.get(id)?;
            }
            factions.push(economy);
        }

        Ok(ScenarioState {
            catalog,
            config,
            factions,
        })
    }
}

/// A validated scenario ready to run.
#[derive(Debug, Clone)]
pub struct ScenarioState {
    /// Shared blueprints.
    pub catalog: ResearchCatalog,
    /// Planner settings.
    pub config: PlannerConfig,
    /// Initial faction states.
    pub factions: Vec<FactionEconomy>,
}

/// Setup for a single faction in the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionSetup {
    /// Faction identifier.
    pub id: String,
    /// Difficulty the faction plays at.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Starting treasury.
    pub money: i64,
    /// Owned planets.
    pub planets: Vec<PlanetSetup>,
    /// Researched blueprints, in unlock order.
    #[serde(default)]
    pub available: Vec<String>,
    /// Starting storage.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    /// Starting fleets.
    #[serde(default)]
    pub fleets: Vec<FleetSetup>,
}

impl FactionSetup {
    /// Build the live state this setup describes.
    #[must_use]
    pub fn to_economy(&self) -> FactionEconomy {
        let mut economy = FactionEconomy::new(FactionId::new(&self.id), self.difficulty, self.money);
        for planet in &self.planets {
            economy = economy.with_planet(planet.to_planet());
        }
        for fleet in &self.fleets {
            economy = economy.with_fleet(fleet.to_fleet());
        }
        for id in &self.available {
            economy = economy.with_available(id.as_str());
        }
        for (id, &count) in &self.inventory {
            economy = economy.with_inventory(id.as_str(), count);
        }
        economy
    }
}

/// Placement of a planet at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetSetup {
    /// Planet identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Position (x, y).
    pub position: (i32, i32),
    /// Population.
    pub population: u32,
    /// Facilities already built.
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

impl PlanetSetup {
    fn to_planet(&self) -> Planet {
        let (x, y) = self.position;
        self.facilities.iter().fold(
            Planet::new(
                PlanetId(self.id),
                self.name.clone(),
                Vec2Fixed::from_ints(x, y),
                self.population,
            ),
            |planet, &facility| planet.with_facility(facility),
        )
    }
}

/// Placement of a fleet at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSetup {
    /// Fleet identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Position (x, y).
    pub position: (i32, i32),
    /// Current task.
    #[serde(default)]
    pub task: FleetTask,
    /// Planet the fleet starts docked at.
    #[serde(default)]
    pub docked_at: Option<u32>,
    /// Units as (research, count).
    pub units: Vec<(String, u32)>,
}

impl FleetSetup {
    fn to_fleet(&self) -> Fleet {
        let (x, y) = self.position;
        let mut fleet = Fleet::new(FleetId(self.id), self.name.clone(), Vec2Fixed::from_ints(x, y));
        fleet.task = self.task;
        fleet.docked_at = self.docked_at.map(PlanetId);
        fleet.inventory = self
            .units
            .iter()
            .map(|(research, count)| InventoryItem::new(research.as_str(), *count))
            .collect();
        fleet
    }
}
