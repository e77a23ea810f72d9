//! Live faction state and the commit executor.
//!
//! [`FactionEconomy`] is the mutable truth a planning pass never sees
//! directly. [`FactionEconomy::snapshot`] turns it into an immutable
//! [`AiWorld`]; [`FactionEconomy::execute`] applies the resulting commands
//! afterwards. State may have moved on in between, so every command is
//! re-validated here, and a command that can no longer be honoured leaves
//! the economy exactly as it found it.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::{Command, CreateFleetCommand};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::math::Vec2Fixed;
use crate::research::{ResearchCatalog, ResearchId, ResearchType, SlotKind, DAMAGE_PROPERTY};
use crate::snapshot::{
    AiFleet, AiInventoryItem, AiPlanet, AiWorld, Difficulty, Facility, FactionId, FleetId,
    FleetStatistics, FleetTask, PlanetId,
};

/// Equipment mounted in one slot of every unit of an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MountedEquipment {
    /// Slot identifier on the hull blueprint.
    pub slot: String,
    /// Mounted item.
    pub research: ResearchId,
    /// Units mounted per hull.
    pub count: u32,
}

/// Units of one blueprint assigned to a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Blueprint.
    pub research: ResearchId,
    /// Number of units.
    pub count: u32,
    /// Variable-slot equipment on each unit.
    #[serde(default)]
    pub equipment: Vec<MountedEquipment>,
}

impl InventoryItem {
    /// Create an unequipped item.
    #[must_use]
    pub fn new(research: impl Into<ResearchId>, count: u32) -> Self {
        Self {
            research: research.into(),
            count,
            equipment: Vec::new(),
        }
    }
}

/// A fleet in live state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fleet {
    /// Fleet identifier.
    pub id: FleetId,
    /// Display name.
    pub name: String,
    /// Current location.
    pub position: Vec2Fixed,
    /// Current task.
    #[serde(default)]
    pub task: FleetTask,
    /// Destination while travelling.
    #[serde(default)]
    pub target: Option<PlanetId>,
    /// Planet the fleet is parked at.
    #[serde(default)]
    pub docked_at: Option<PlanetId>,
    /// Assigned units.
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl Fleet {
    /// Create an idle, empty fleet.
    #[must_use]
    pub fn new(id: FleetId, name: impl Into<String>, position: Vec2Fixed) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            task: FleetTask::Idle,
            target: None,
            docked_at: None,
            inventory: Vec::new(),
        }
    }

    /// Add units.
    #[must_use]
    pub fn with_item(mut self, item: InventoryItem) -> Self {
        self.inventory.push(item);
        self
    }

    /// Total units across every item.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.inventory.iter().map(|i| i.count).sum()
    }
}

/// A planet in live state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Planet {
    /// Planet identifier.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Map location.
    pub position: Vec2Fixed,
    /// Population.
    pub population: u32,
    /// Built facilities.
    #[serde(default)]
    pub facilities: BTreeSet<Facility>,
}

impl Planet {
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
}

/// An open production order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionOrder {
    /// Blueprint being produced.
    pub research: ResearchId,
    /// Units still to produce.
    pub remaining: u32,
}

/// Something the commit executor changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A new fleet was assembled.
    FleetDeployed {
        /// New fleet.
        fleet: FleetId,
        /// Assembly planet.
        planet: PlanetId,
        /// Units transferred from storage.
        units: u32,
    },
    /// A fleet was ordered to move.
    FleetDispatched {
        /// Fleet.
        fleet: FleetId,
        /// Destination.
        planet: PlanetId,
        /// New task, if reassigned.
        task: Option<FleetTask>,
    },
    /// A production order was opened or extended.
    ProductionQueued {
        /// Blueprint.
        research: ResearchId,
        /// Units added.
        batch: u32,
    },
    /// A facility was built.
    FacilityBuilt {
        /// Facility kind.
        facility: Facility,
        /// Site.
        planet: PlanetId,
        /// Money spent.
        cost: i64,
    },
    /// A fleet was stripped and sold.
    FleetDecommissioned {
        /// Removed fleet.
        fleet: FleetId,
        /// Money credited for the hulls.
        proceeds: i64,
    },
}

/// Result of committing one command.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The command took effect.
    Applied(EconomyEvent),
    /// The command was rejected and nothing changed.
    Aborted {
        /// Kind of the rejected command.
        command: &'static str,
        /// Why it was rejected.
        error: PlannerError,
    },
}

impl CommitOutcome {
    /// Whether the command took effect.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Units withdrawn from storage during one commit, for rollback.
type Withdrawals = Vec<(ResearchId, u32)>;

/// Mutable state of one faction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionEconomy {
    /// Owner.
    pub faction: FactionId,
    /// Difficulty level.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Treasury.
    pub money: i64,
    /// Owned planets.
    #[serde(default)]
    pub planets: Vec<Planet>,
    /// Owned fleets.
    #[serde(default)]
    pub fleets: Vec<Fleet>,
    /// Unlocked research, in unlock order.
    #[serde(default)]
    pub available_research: Vec<ResearchId>,
    /// Unassigned units and equipment.
    #[serde(default)]
    pub inventory: BTreeMap<ResearchId, u32>,
    /// Open production orders, oldest first.
    #[serde(default)]
    pub production: Vec<ProductionOrder>,
    /// Lower bound for the next fleet id.
    #[serde(default)]
    pub next_fleet_id: u32,
}

impl FactionEconomy {
    /// Create an empty economy.
    #[must_use]
    pub fn new(faction: FactionId, difficulty: Difficulty, money: i64) -> Self {
        Self {
            faction,
            difficulty,
            money,
            planets: Vec::new(),
            fleets: Vec::new(),
            available_research: Vec::new(),
            inventory: BTreeMap::new(),
            production: Vec::new(),
            next_fleet_id: 0,
        }
    }

    /// Add a planet.
    #[must_use]
    pub fn with_planet(mut self, planet: Planet) -> Self {
        self.planets.push(planet);
        self
    }

    /// Add a fleet.
    #[must_use]
    pub fn with_fleet(mut self, fleet: Fleet) -> Self {
        self.fleets.push(fleet);
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

    /// Units in storage.
    #[must_use]
    pub fn stored(&self, research: &ResearchId) -> u32 {
        self.inventory.get(research).copied().unwrap_or(0)
    }

    /// Put units into storage.
    pub fn store(&mut self, research: &ResearchId, count: u32) {
        deposit(&mut self.inventory, research, count);
    }

    /// Check if the treasury covers a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i64) -> bool {
        self.money >= cost
    }

    /// Spend money if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, amount: i64) -> bool {
        if self.can_afford(amount) {
            self.money -= amount;
            true
        } else {
            false
        }
    }

    /// Look up a fleet.
    #[must_use]
    pub fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.iter().find(|f| f.id == id)
    }

    /// Look up a planet.
    #[must_use]
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    /// Hash of the complete faction state.
    ///
    /// Two economies that went through the same commands hash equal, which
    /// is what the determinism checks compare.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn fleet_index(&self, id: FleetId) -> Result<usize> {
        self.fleets
            .iter()
            .position(|f| f.id == id)
            .ok_or(PlannerError::FleetNotFound(id))
    }

    fn planet_index(&self, id: PlanetId) -> Result<usize> {
        self.planets
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlannerError::PlanetNotFound(id))
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Build the immutable view a planning pass runs against.
    ///
    /// # Errors
    /// If a fleet carries a blueprint the catalog does not define.
    pub fn snapshot(&self, catalog: Arc<ResearchCatalog>) -> Result<AiWorld> {
        let mut fleets = Vec::with_capacity(self.fleets.len());
        for fleet in &self.fleets {
            fleets.push(fleet_view(&catalog, fleet)?);
        }

        let mut world = AiWorld::new(self.faction.clone(), self.difficulty, catalog)
            .with_money(self.money);
        world.own_planets = self
            .planets
            .iter()
            .map(|p| AiPlanet {
                id: p.id,
                name: p.name.clone(),
                position: p.position,
                population: p.population,
                facilities: p.facilities.clone(),
            })
            .collect();
        world.own_fleets = fleets;
        world.available_research = self.available_research.clone();
        world.inventory = self
            .inventory
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(id, &count)| (id.clone(), count))
            .collect();
        world.in_production = self
            .production
            .iter()
            .filter(|o| o.remaining > 0)
            .map(|o| o.research.clone())
            .collect();
        Ok(world)
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Apply queued commands in order, each on its own.
    pub fn execute<'q>(
        &mut self,
        catalog: &ResearchCatalog,
        config: &PlannerConfig,
        queue: impl IntoIterator<Item = &'q Command>,
    ) -> Vec<CommitOutcome> {
        let outcomes: Vec<CommitOutcome> = queue
            .into_iter()
            .map(|command| self.apply(catalog, config, command))
            .collect();
        #[cfg(feature = "debug-validation")]
        self.debug_validate();
        outcomes
    }

    #[cfg(feature = "debug-validation")]
    fn debug_validate(&self) {
        let mut ids = BTreeSet::new();
        for fleet in &self.fleets {
            debug_assert!(ids.insert(fleet.id), "duplicate {}", fleet.id);
        }
    }

    /// Re-validate and apply one command.
    ///
    /// A rejected command is logged and reported, never propagated.
    pub fn apply(
        &mut self,
        catalog: &ResearchCatalog,
        config: &PlannerConfig,
        command: &Command,
    ) -> CommitOutcome {
        let result = match command {
            Command::CreateFleet(create) => self.deploy_fleet(catalog, create),
            Command::MoveFleet {
                fleet,
                planet,
                task,
            } => self.move_fleet(*fleet, *planet, *task),
            Command::StartProduction { research, batch } => {
                self.start_production(catalog, research, *batch)
            }
            Command::BuildFacility { facility, planet } => {
                self.build_facility(config, *facility, *planet)
            }
            Command::DecommissionFleet { fleet } => self.decommission_fleet(catalog, config, *fleet),
        };

        match result {
            Ok(event) => {
                debug!(faction = %self.faction, command = command.kind(), ?event, "committed");
                CommitOutcome::Applied(event)
            }
            Err(error) => {
                warn!(
                    faction = %self.faction,
                    command = command.kind(),
                    "commit aborted: {error}"
                );
                CommitOutcome::Aborted {
                    command: command.kind(),
                    error,
                }
            }
        }
    }

    fn deploy_fleet(
        &mut self,
        catalog: &ResearchCatalog,
        create: &CreateFleetCommand,
    ) -> Result<EconomyEvent> {
        let planet = &self.planets[self.planet_index(create.planet)?];
        if !planet.has(Facility::MilitarySpaceport) {
            return Err(PlannerError::InvalidState(format!(
                "{} has no military spaceport",
                create.planet
            )));
        }
        let position = planet.position;

        let mut withdrawals = Withdrawals::new();
        let items = match self.withdraw_loadout(create, &mut withdrawals) {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                return Err(PlannerError::InvalidState(
                    "deployed fleet would be empty".to_string(),
                ));
            }
            Err(e) => {
                warn!(
                    faction = %self.faction,
                    fleet = %create.name,
                    "discarding partially assembled fleet"
                );
                self.refund(withdrawals);
                return Err(e);
            }
        };

        let id = self.fresh_fleet_id();
        let mut fleet = Fleet::new(id, create.name.clone(), position);
        fleet.docked_at = Some(create.planet);
        fleet.inventory = items;
        let units = fleet.unit_count();
        self.fleets.push(fleet);
        self.next_fleet_id = id.0 + 1;

        if let Err(e) = self.upgrade_all(catalog, id) {
            warn!(faction = %self.faction, fleet = %id, "refit after deploy failed: {e}");
        }
        info!(faction = %self.faction, fleet = %id, planet = %create.planet, units, "fleet deployed");
        Ok(EconomyEvent::FleetDeployed {
            fleet: id,
            planet: create.planet,
            units,
        })
    }

    /// Take every unit of a deploy order out of storage, one category at a
    /// time. Stops at the first shortfall; `withdrawals` then lists what was
    /// already taken.
    fn withdraw_loadout(
        &mut self,
        create: &CreateFleetCommand,
        withdrawals: &mut Withdrawals,
    ) -> Result<Vec<InventoryItem>> {
        let mut items = Vec::new();
        for hull in create.battleships.iter().chain(&create.cruisers) {
            self.withdraw(hull, 1, withdrawals)?;
            items.push(InventoryItem::new(hull.clone(), 1));
        }

        let tanks = create
            .vehicles
            .best_tank
            .as_ref()
            .map(|tank| (tank, create.vehicles.tank_count));
        let grouped = create
            .fighters
            .iter()
            .map(|(id, count)| (id, *count))
            .chain(tanks)
            .chain(create.vehicles.vehicle_config.iter().map(|(id, c)| (id, *c)));
        for (id, count) in grouped {
            if count == 0 {
                continue;
            }
            self.withdraw(id, count, withdrawals)?;
            items.push(InventoryItem::new(id.clone(), count));
        }
        Ok(items)
    }

    fn withdraw(
        &mut self,
        research: &ResearchId,
        count: u32,
        withdrawals: &mut Withdrawals,
    ) -> Result<()> {
        let available = self.stored(research);
        if available < count {
            return Err(PlannerError::InsufficientInventory {
                research: research.clone(),
                required: count,
                available,
            });
        }
        self.inventory.insert(research.clone(), available - count);
        withdrawals.push((research.clone(), count));
        Ok(())
    }

    fn refund(&mut self, withdrawals: Withdrawals) {
        for (research, count) in withdrawals.into_iter().rev() {
            self.store(&research, count);
        }
    }

    fn fresh_fleet_id(&self) -> FleetId {
        let after_existing = self.fleets.iter().map(|f| f.id.0 + 1).max().unwrap_or(0);
        FleetId(self.next_fleet_id.max(after_existing))
    }

    /// Fill every variable slot of a fleet with the best unlocked item in
    /// storage, returning replaced equipment to storage.
    ///
    /// Slots stay as they are when storage cannot equip every hull of the
    /// item with at least one unit.
    pub fn upgrade_all(&mut self, catalog: &ResearchCatalog, fleet: FleetId) -> Result<()> {
        let index = self.fleet_index(fleet)?;
        let Self {
            fleets,
            inventory,
            available_research,
            ..
        } = self;
        for item in &mut fleets[index].inventory {
            let hull = catalog.get(&item.research)?;
            refit_item(hull, available_research, inventory, item);
        }
        Ok(())
    }

    fn move_fleet(
        &mut self,
        fleet: FleetId,
        planet: PlanetId,
        task: Option<FleetTask>,
    ) -> Result<EconomyEvent> {
        self.planet_index(planet)?;
        let index = self.fleet_index(fleet)?;
        let moving = &mut self.fleets[index];
        moving.target = Some(planet);
        moving.docked_at = None;
        if let Some(task) = task {
            moving.task = task;
        }
        info!(faction = %self.faction, %fleet, %planet, ?task, "fleet dispatched");
        Ok(EconomyEvent::FleetDispatched {
            fleet,
            planet,
            task,
        })
    }

    fn start_production(
        &mut self,
        catalog: &ResearchCatalog,
        research: &ResearchId,
        batch: u32,
    ) -> Result<EconomyEvent> {
        catalog.get(research)?;
        if !self.available_research.contains(research) {
            return Err(PlannerError::InvalidState(format!(
                "{research} has not been researched"
            )));
        }
        if batch == 0 {
            return Err(PlannerError::InvalidState(format!(
                "empty production batch for {research}"
            )));
        }
        match self.production.iter_mut().find(|o| &o.research == research) {
            Some(order) => order.remaining += batch,
            None => self.production.push(ProductionOrder {
                research: research.clone(),
                remaining: batch,
            }),
        }
        Ok(EconomyEvent::ProductionQueued {
            research: research.clone(),
            batch,
        })
    }

    fn build_facility(
        &mut self,
        config: &PlannerConfig,
        facility: Facility,
        planet: PlanetId,
    ) -> Result<EconomyEvent> {
        let index = self.planet_index(planet)?;
        if self.planets[index].has(facility) {
            return Err(PlannerError::InvalidState(format!(
                "{planet} already has {facility:?}"
            )));
        }
        let cost = config.facility_costs.cost(facility);
        if !self.spend(cost) {
            return Err(PlannerError::InsufficientFunds {
                required: cost,
                available: self.money,
            });
        }
        self.planets[index].facilities.insert(facility);
        info!(faction = %self.faction, ?facility, %planet, cost, "facility built");
        Ok(EconomyEvent::FacilityBuilt {
            facility,
            planet,
            cost,
        })
    }

    fn decommission_fleet(
        &mut self,
        catalog: &ResearchCatalog,
        config: &PlannerConfig,
        fleet: FleetId,
    ) -> Result<EconomyEvent> {
        let index = self.fleet_index(fleet)?;
        let divisor = config.resale_divisor.max(1);
        let mut proceeds = 0;
        for item in &self.fleets[index].inventory {
            let hull = catalog.get(&item.research)?;
            proceeds += hull.production_cost * i64::from(item.count) / divisor;
        }

        let removed = self.fleets.remove(index);
        for item in removed.inventory {
            for mounted in item.equipment {
                self.store(&mounted.research, mounted.count * item.count);
            }
        }
        self.money += proceeds;
        info!(faction = %self.faction, %fleet, proceeds, "fleet decommissioned");
        Ok(EconomyEvent::FleetDecommissioned { fleet, proceeds })
    }
}

fn deposit(storage: &mut BTreeMap<ResearchId, u32>, research: &ResearchId, count: u32) {
    if count > 0 {
        *storage.entry(research.clone()).or_insert(0) += count;
    }
}

fn refit_item(
    hull: &ResearchType,
    available: &[ResearchId],
    storage: &mut BTreeMap<ResearchId, u32>,
    item: &mut InventoryItem,
) {
    if item.count == 0 {
        return;
    }
    for slot in &hull.slots {
        let SlotKind::Variable { items, max } = &slot.kind else {
            continue;
        };
        let Some(best) = items.iter().rev().find(|c| available.contains(c)) else {
            continue;
        };
        let per_hull_stock = storage.get(best).copied().unwrap_or(0) / item.count;
        let mounted = item.equipment.iter().position(|m| m.slot == slot.id);

        let current = match mounted {
            Some(pos) if item.equipment[pos].research == *best => item.equipment[pos].count,
            Some(_) if per_hull_stock == 0 => continue,
            Some(pos) => {
                let old = item.equipment.remove(pos);
                deposit(storage, &old.research, old.count * item.count);
                0
            }
            None => 0,
        };
        let add = max.saturating_sub(current).min(per_hull_stock);
        if add == 0 {
            continue;
        }
        if let Some(stock) = storage.get_mut(best) {
            *stock -= add * item.count;
        }
        match item.equipment.iter_mut().find(|m| m.slot == slot.id) {
            Some(m) => m.count += add,
            None => item.equipment.push(MountedEquipment {
                slot: slot.id.clone(),
                research: best.clone(),
                count: add,
            }),
        }
    }
}

fn damage(rt: &ResearchType) -> i64 {
    i64::from(rt.get_int(DAMAGE_PROPERTY).unwrap_or(0))
}

fn fleet_view(catalog: &ResearchCatalog, fleet: &Fleet) -> Result<AiFleet> {
    let mut firepower = 0;
    let mut vehicle_count = 0;
    for item in &fleet.inventory {
        let rt = catalog.get(&item.research)?;
        let count = i64::from(item.count);
        firepower += damage(rt) * count;
        if rt.category.is_ground_vehicle() {
            vehicle_count += item.count;
        }
        for slot in &rt.slots {
            if let SlotKind::Fixed { item: fixed } = &slot.kind {
                firepower += damage(catalog.get(fixed)?) * count;
            }
        }
        for mounted in &item.equipment {
            firepower += damage(catalog.get(&mounted.research)?) * i64::from(mounted.count) * count;
        }
    }

    Ok(AiFleet {
        id: fleet.id,
        name: fleet.name.clone(),
        position: fleet.position,
        task: fleet.task,
        target: fleet.target,
        inventory: fleet
            .inventory
            .iter()
            .map(|i| AiInventoryItem {
                fleet: fleet.id,
                research: i.research.clone(),
                count: i.count,
            })
            .collect(),
        statistics: FleetStatistics {
            firepower,
            vehicle_count,
            planet: if fleet.target.is_none() {
                fleet.docked_at
            } else {
                None
            },
        },
    })
}
