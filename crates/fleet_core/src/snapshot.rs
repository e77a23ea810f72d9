//! Immutable per-tick view of one faction's empire.
//!
//! The simulation builds an [`AiWorld`] before each planning pass and
//! discards it afterwards. Nothing in a planning pass mutates it; every
//! change the planner wants is expressed as a [`crate::command::Command`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::Vec2Fixed;
use crate::research::{ResearchCatalog, ResearchCategory, ResearchId, ResearchType};

/// Identifier of a faction (one computer-controlled empire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub String);

impl FactionId {
    /// Create a new faction ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for fleets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FleetId(pub u32);

impl fmt::Display for FleetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fleet#{}", self.0)
    }
}

/// Unique identifier for planets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planet#{}", self.0)
    }
}

/// Game difficulty, which scales how many fleets the AI keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Fewest fleets per planet.
    Easy,
    /// Default.
    #[default]
    Normal,
    /// Most fleets per planet.
    Hard,
}

/// What a fleet is currently doing.
///
/// Variants are declared most urgent first, so the derived ordering ranks
/// tasks by ordinal: anything greater than [`FleetTask::Upgrade`] is less
/// urgent and may be interrupted for an upgrade.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum FleetTask {
    /// Scripted by a campaign mission.
    Script,
    /// Ordered by a human player.
    Forced,
    /// Attacking a target.
    Attack,
    /// Escorting colonization.
    Colonize,
    /// Defending a planet.
    Defend,
    /// Travelling to a spaceport to be refitted.
    Upgrade,
    /// Plain relocation.
    Move,
    /// Patrolling.
    Patrol,
    /// Exploring.
    Explore,
    /// No assigned task.
    #[default]
    Idle,
}

/// Planet facilities the planner cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facility {
    /// Required to produce battleships.
    OrbitalFactory,
    /// Required to assemble and refit fleets.
    MilitarySpaceport,
}

/// One ship class (or ground unit) assigned to a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiInventoryItem {
    /// Owning fleet.
    pub fleet: FleetId,
    /// Blueprint of the unit.
    pub research: ResearchId,
    /// Number of units.
    pub count: u32,
}

/// Aggregate combat statistics of a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FleetStatistics {
    /// Total firepower.
    pub firepower: i64,
    /// Ground units carried.
    pub vehicle_count: u32,
    /// Planet the fleet is docked at, if any.
    pub planet: Option<PlanetId>,
}

/// Read-only view of one owned fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiFleet {
    /// Fleet identifier.
    pub id: FleetId,
    /// Display name.
    pub name: String,
    /// Current location.
    pub position: Vec2Fixed,
    /// Current task.
    pub task: FleetTask,
    /// Destination planet while travelling.
    pub target: Option<PlanetId>,
    /// Units in the fleet.
    pub inventory: Vec<AiInventoryItem>,
    /// Combat statistics.
    pub statistics: FleetStatistics,
}

impl AiFleet {
    /// Create an idle, empty fleet.
    #[must_use]
    pub fn new(id: FleetId, name: impl Into<String>, position: Vec2Fixed) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            task: FleetTask::Idle,
            target: None,
            inventory: Vec::new(),
            statistics: FleetStatistics::default(),
        }
    }

    /// Whether the fleet is travelling.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    /// Whether the fleet is stationary at a planet.
    #[must_use]
    pub const fn is_docked(&self) -> bool {
        !self.is_moving() && self.statistics.planet.is_some()
    }
}

/// Read-only view of one owned planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPlanet {
    /// Planet identifier.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Map location.
    pub position: Vec2Fixed,
    /// Population, used to rank assembly and construction sites.
    pub population: u32,
    /// Facilities already built.
    pub facilities: BTreeSet<Facility>,
}

impl AiPlanet {
    /// Create a planet without facilities.
    #[must_use]
    pub fn new(id: PlanetId, name: impl Into<String>, position: Vec2Fixed, population: u32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            population,
            facilities: BTreeSet::new(),
        }
    }

    /// Add a facility.
    #[must_use]
    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facilities.insert(facility);
        self
    }

    /// Whether the facility exists here.
    #[must_use]
    pub fn has(&self, facility: Facility) -> bool {
        self.facilities.contains(&facility)
    }

    /// Whether fleets can be assembled and refitted here.
    #[must_use]
    pub fn has_military_spaceport(&self) -> bool {
        self.has(Facility::MilitarySpaceport)
    }
}

/// Snapshot of one faction's empire for a single planning pass.
#[derive(Debug, Clone)]
pub struct AiWorld {
    /// Faction being planned for.
    pub faction: FactionId,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Treasury.
    pub money: i64,
    /// Owned planets, in snapshot order.
    pub own_planets: Vec<AiPlanet>,
    /// Owned fleets, in snapshot order.
    pub own_fleets: Vec<AiFleet>,
    /// Unlocked research, in snapshot order.
    pub available_research: Vec<ResearchId>,
    /// Unassigned units and equipment in faction storage.
    pub inventory: BTreeMap<ResearchId, u32>,
    /// Research with an open production order.
    pub in_production: BTreeSet<ResearchId>,
    /// Shared blueprint registry.
    pub catalog: Arc<ResearchCatalog>,
}

impl AiWorld {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new(faction: FactionId, difficulty: Difficulty, catalog: Arc<ResearchCatalog>) -> Self {
        Self {
            faction,
            difficulty,
            money: 0,
            own_planets: Vec::new(),
            own_fleets: Vec::new(),
            available_research: Vec::new(),
            inventory: BTreeMap::new(),
            in_production: BTreeSet::new(),
            catalog,
        }
    }

    /// Set the treasury.
    #[must_use]
    pub fn with_money(mut self, money: i64) -> Self {
        self.money = money;
        self
    }

    /// Add an owned planet.
    #[must_use]
    pub fn with_planet(mut self, planet: AiPlanet) -> Self {
        self.own_planets.push(planet);
        self
    }

    /// Add an owned fleet.
    #[must_use]
    pub fn with_fleet(mut self, fleet: AiFleet) -> Self {
        self.own_fleets.push(fleet);
        self
    }

    /// Unlock a research.
    #[must_use]
    pub fn with_available(mut self, research: impl Into<ResearchId>) -> Self {
        self.available_research.push(research.into());
        self
    }

    /// Set a storage count.
    #[must_use]
    pub fn with_inventory(mut self, research: impl Into<ResearchId>, count: u32) -> Self {
        self.inventory.insert(research.into(), count);
        self
    }

    /// Mark a research as being produced.
    #[must_use]
    pub fn with_production(mut self, research: impl Into<ResearchId>) -> Self {
        self.in_production.insert(research.into());
        self
    }

    /// Units of `research` in faction storage.
    #[must_use]
    pub fn inventory_count(&self, research: &ResearchId) -> u32 {
        self.inventory.get(research).copied().unwrap_or(0)
    }

    /// Whether the research is unlocked.
    #[must_use]
    pub fn is_available(&self, research: &ResearchId) -> bool {
        self.available_research.contains(research)
    }

    /// Whether a production order is already open for the research.
    #[must_use]
    pub fn is_in_production(&self, research: &ResearchId) -> bool {
        self.in_production.contains(research)
    }

    /// Resolve a blueprint.
    pub fn research(&self, id: &ResearchId) -> Result<&ResearchType> {
        self.catalog.get(id)
    }

    /// Unlocked blueprints of a category, in snapshot order.
    pub fn available_in(&self, category: ResearchCategory) -> Result<Vec<&ResearchType>> {
        let mut result = Vec::new();
        for id in &self.available_research {
            let rt = self.catalog.get(id)?;
            if rt.category == category {
                result.push(rt);
            }
        }
        Ok(result)
    }

    /// Whether any owned planet has the facility.
    #[must_use]
    pub fn has_facility(&self, facility: Facility) -> bool {
        self.own_planets.iter().any(|p| p.has(facility))
    }
}
