//! Military fleet growth and refit policy.
//!
//! Each tick the [`OffensePlanner`] either tops up the fleet count or, once
//! the quota is met, sends the weakest outdated fleet for a refit. Every
//! step is a gate: the first one that issues an order ends the pass.
//!
//! ## Assembly order
//!
//! 1. Treasury threshold.
//! 2. Fighter stock, cruiser stock, orbital factory, battleship stock,
//!    military spaceport.
//! 3. Hull selection and equipment demand.
//! 4. Vehicle loadout for the selected battleships.
//! 5. One [`Command::CreateFleet`](crate::command::Command::CreateFleet) at
//!    the best spaceport.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::command::{Controls, CreateFleetCommand};
use crate::config::PlannerConfig;
use crate::equipment::{count_equipments, vehicle_capacity};
use crate::error::Result;
use crate::gates::{
    check_military_spaceport, check_orbital_factory, check_production, check_production_demand,
    demand_met,
};
use crate::planner::Planner;
use crate::research::{ResearchCategory, ResearchId, ResearchType};
use crate::selection::{
    allot_fighters, find_best_military_spaceport, find_closest_military_spaceport,
    most_expensive_available, take_expensive_first, weakest_fleet,
};
use crate::snapshot::{AiFleet, AiWorld, FleetTask};
use crate::vehicles::{DefaultVehiclePlanner, VehiclePlanner};

/// Ship categories compared when judging whether a fleet is outdated.
const SHIP_CATEGORIES: [ResearchCategory; 3] = [
    ResearchCategory::Fighters,
    ResearchCategory::Cruisers,
    ResearchCategory::Battleships,
];

/// Unlocked hulls split by class.
struct Hulls<'w> {
    fighters: Vec<&'w ResearchType>,
    cruisers: Vec<&'w ResearchType>,
    battleships: Vec<&'w ResearchType>,
}

/// Decides when to build ships, assemble fleets and refit old ones.
pub struct OffensePlanner {
    config: PlannerConfig,
    vehicles: Box<dyn VehiclePlanner>,
}

impl std::fmt::Debug for OffensePlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffensePlanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for OffensePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl OffensePlanner {
    /// Create a planner with the default vehicle policy.
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            vehicles: Box::new(DefaultVehiclePlanner),
        }
    }

    /// Replace the vehicle loadout policy.
    #[must_use]
    pub fn with_vehicle_planner(mut self, vehicles: impl VehiclePlanner + 'static) -> Self {
        self.vehicles = Box::new(vehicles);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn hulls<'w>(&self, world: &'w AiWorld) -> Result<Hulls<'w>> {
        let mut hulls = Hulls {
            fighters: Vec::new(),
            cruisers: Vec::new(),
            battleships: Vec::new(),
        };
        for id in &world.available_research {
            let rt = world.research(id)?;
            match rt.category {
                ResearchCategory::Fighters => hulls.fighters.push(rt),
                ResearchCategory::Cruisers => hulls.cruisers.push(rt),
                ResearchCategory::Battleships if rt.id != self.config.colony_ship => {
                    hulls.battleships.push(rt);
                }
                _ => {}
            }
        }
        Ok(hulls)
    }

    /// Stock gates in priority order. Returns `true` once one fired.
    fn check_stock(&self, world: &AiWorld, controls: &mut dyn Controls, hulls: &Hulls<'_>) -> bool {
        let cfg = &self.config;
        check_production(
            world,
            controls,
            &hulls.fighters,
            cfg.fighters.per_type,
            cfg.fighters.batch,
        ) || check_production(
            world,
            controls,
            &hulls.cruisers,
            cfg.cruisers.per_type,
            cfg.cruisers.batch,
        ) || check_orbital_factory(world, controls, cfg.facility_costs.orbital_factory)
            || check_production(
                world,
                controls,
                &hulls.battleships,
                cfg.battleships.per_type,
                cfg.battleships.batch,
            )
            || check_military_spaceport(world, controls, cfg.facility_costs.military_spaceport)
    }

    fn plan_new_fleet(&self, world: &AiWorld, controls: &mut dyn Controls) -> Result<()> {
        let cfg = &self.config;
        if world.money < cfg.money_threshold {
            debug!(faction = %world.faction, money = world.money, "saving for next fleet");
            return Ok(());
        }

        let hulls = self.hulls(world)?;
        if self.check_stock(world, controls, &hulls) {
            return Ok(());
        }

        let battleships =
            take_expensive_first(world, &hulls.battleships, cfg.battleships.per_type);
        let cruisers = take_expensive_first(world, &hulls.cruisers, cfg.cruisers.per_type);
        let (fighters, fighter_total) = allot_fighters(world, &hulls.fighters, cfg.fighters.per_type);

        let full_fighters = hulls.fighters.len() as u64 * u64::from(cfg.fighters.per_type);
        if battleships.len() < cfg.battleships.per_type as usize
            || cruisers.len() < cfg.cruisers.per_type as usize
            || u64::from(fighter_total) < full_fighters
        {
            debug!(
                faction = %world.faction,
                battleships = battleships.len(),
                cruisers = cruisers.len(),
                fighters = fighter_total,
                "fleet composition below threshold"
            );
            return Ok(());
        }

        let mut big_ships = Vec::with_capacity(battleships.len() + cruisers.len());
        for id in cruisers.iter().chain(&battleships) {
            big_ships.push(world.research(id)?);
        }
        let equipment = count_equipments(world, big_ships.iter().copied());
        if wait_for(world, controls, &equipment, "equipment") {
            return Ok(());
        }

        let mut capital = Vec::with_capacity(battleships.len());
        for id in &battleships {
            capital.push(world.research(id)?);
        }
        let capacity = vehicle_capacity(world, capital)?;
        let Some(vehicles) = self.vehicles.plan_vehicles(world, capacity)? else {
            debug!(faction = %world.faction, capacity, "no feasible vehicle loadout");
            return Ok(());
        };
        if wait_for(world, controls, &vehicles.demand(), "vehicles") {
            return Ok(());
        }

        let Some(spaceport) = find_best_military_spaceport(world) else {
            debug!(faction = %world.faction, "no spaceport to assemble at");
            return Ok(());
        };

        info!(
            faction = %world.faction,
            planet = %spaceport.id,
            battleships = battleships.len(),
            cruisers = cruisers.len(),
            fighters = fighter_total,
            vehicles = vehicles.total_units(),
            "deploying new fleet"
        );
        controls.create_fleet(CreateFleetCommand {
            name: format!("{}.fleet", world.faction),
            planet: spaceport.id,
            battleships,
            cruisers,
            fighters,
            vehicles,
        });
        Ok(())
    }
}

/// Order the first shortfall of `demand`. Returns `true` while anything is
/// still missing, ordered or not.
fn wait_for(
    world: &AiWorld,
    controls: &mut dyn Controls,
    demand: &BTreeMap<ResearchId, u32>,
    what: &str,
) -> bool {
    if demand_met(world, demand) {
        return false;
    }
    if !check_production_demand(world, controls, demand) {
        debug!(faction = %world.faction, what, "waiting for production");
    }
    true
}

impl OffensePlanner {
    fn check_fleet_upgrade(&self, world: &AiWorld, controls: &mut dyn Controls) -> Result<()> {
        let upgrading = || world.own_fleets.iter().filter(|f| f.task == FleetTask::Upgrade);

        if upgrading().any(AiFleet::is_moving) {
            debug!(faction = %world.faction, "refit already under way");
            return Ok(());
        }
        if let Some(arrived) = upgrading().find(|f| f.is_docked()) {
            info!(faction = %world.faction, fleet = %arrived.id, "decommissioning refitted fleet");
            controls.decommission_fleet(arrived.id);
            return Ok(());
        }

        let mut candidates = Vec::new();
        for fleet in world.own_fleets.iter().filter(|f| f.task > FleetTask::Upgrade) {
            if self.needs_upgrade(world, fleet)? {
                candidates.push(fleet);
            }
        }
        let Some(weakest) = weakest_fleet(candidates) else {
            return Ok(());
        };

        let Some(spaceport) = find_closest_military_spaceport(world, weakest.position) else {
            check_military_spaceport(
                world,
                controls,
                self.config.facility_costs.military_spaceport,
            );
            return Ok(());
        };

        info!(
            faction = %world.faction,
            fleet = %weakest.id,
            firepower = weakest.statistics.firepower,
            planet = %spaceport.id,
            "sending fleet for refit"
        );
        controls.move_fleet(weakest.id, spaceport.id, Some(FleetTask::Upgrade));
        Ok(())
    }

    /// Whether the fleet carries obsolete vehicles or outdated hulls.
    pub fn needs_upgrade(&self, world: &AiWorld, fleet: &AiFleet) -> Result<bool> {
        if self.vehicles.has_obsolete_vehicles(world, fleet)? {
            return Ok(true);
        }
        for category in SHIP_CATEGORIES {
            let current = best_equipped(world, fleet, category)?;
            let best = most_expensive_available(world, category)?;
            if is_better(current, best) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The most expensive hull of a category in the fleet.
fn best_equipped<'w>(
    world: &'w AiWorld,
    fleet: &AiFleet,
    category: ResearchCategory,
) -> Result<Option<&'w ResearchType>> {
    let mut best: Option<&ResearchType> = None;
    for item in &fleet.inventory {
        let rt = world.research(&item.research)?;
        if rt.category == category && best.map_or(true, |b| rt.production_cost > b.production_cost)
        {
            best = Some(rt);
        }
    }
    Ok(best)
}

/// Whether `best` would improve on `current`, judged by production cost.
///
/// An empty category counts as improvable as soon as anything is available.
#[must_use]
pub fn is_better(current: Option<&ResearchType>, best: Option<&ResearchType>) -> bool {
    match (current, best) {
        (None, Some(_)) => true,
        (Some(current), Some(best)) => current.production_cost < best.production_cost,
        (_, None) => false,
    }
}

impl Planner for OffensePlanner {
    fn name(&self) -> &'static str {
        "offense"
    }

    fn plan(&self, world: &AiWorld, controls: &mut dyn Controls) -> Result<()> {
        let desired = self
            .config
            .desired_fleets(world.own_planets.len(), world.difficulty);
        if world.own_fleets.len() >= desired {
            return self.check_fleet_upgrade(world, controls);
        }
        self.plan_new_fleet(world, controls)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::command::{ActionQueue, Command};
    use crate::math::Vec2Fixed;
    use crate::research::{EquipmentSlot, ResearchCatalog, VEHICLES_PROPERTY};
    use crate::snapshot::{
        AiInventoryItem, AiPlanet, Difficulty, Facility, FactionId, FleetId, PlanetId,
    };
    use crate::vehicles::VehiclePlan;

    // ========================================================================
    // Fixtures
    // ========================================================================

    fn catalog() -> Arc<ResearchCatalog> {
        let mut catalog = ResearchCatalog::new();
        for (id, cost) in [("F1", 1_000), ("F2", 1_500), ("F3", 2_000)] {
            catalog.register(ResearchType::new(id, id, ResearchCategory::Fighters, cost));
        }
        catalog.register(ResearchType::new("Laser", "Laser", ResearchCategory::Weapons, 300));
        catalog.register(
            ResearchType::new("Bay", "Bay", ResearchCategory::Equipment, 900)
                .with_property(VEHICLES_PROPERTY, 2),
        );
        catalog.register(
            ResearchType::new("C1", "Cruiser", ResearchCategory::Cruisers, 10_000).with_slot(
                EquipmentSlot::variable("guns", vec!["Laser".into()], 2),
            ),
        );
        catalog.register(ResearchType::new("C2", "Cruiser II", ResearchCategory::Cruisers, 14_000));
        catalog.register(
            ResearchType::new("B1", "Battleship", ResearchCategory::Battleships, 60_000)
                .with_property(VEHICLES_PROPERTY, 2)
                .with_slot(EquipmentSlot::variable("bay", vec!["Bay".into()], 1)),
        );
        catalog.register(ResearchType::new(
            "ColonyShip",
            "Colony Ship",
            ResearchCategory::Battleships,
            200_000,
        ));
        catalog.register(ResearchType::new("Tank", "Tank", ResearchCategory::Tanks, 500));
        Arc::new(catalog)
    }

    fn planet(id: u32, population: u32, facilities: &[Facility]) -> AiPlanet {
        let mut planet = AiPlanet::new(
            PlanetId(id),
            format!("P{id}"),
            Vec2Fixed::from_ints(id as i32 * 10, 0),
            population,
        );
        for &facility in facilities {
            planet = planet.with_facility(facility);
        }
        planet
    }

    fn fleet(id: u32, task: FleetTask, firepower: i64, hulls: &[(&str, u32)]) -> AiFleet {
        let mut fleet = AiFleet::new(FleetId(id), format!("Fleet {id}"), Vec2Fixed::from_ints(0, 0));
        fleet.task = task;
        fleet.statistics.firepower = firepower;
        for &(research, count) in hulls {
            fleet.inventory.push(AiInventoryItem {
                fleet: FleetId(id),
                research: research.into(),
                count,
            });
        }
        fleet
    }

    /// A rich faction with one developed planet and nothing in storage.
    fn base_world() -> AiWorld {
        AiWorld::new(FactionId::new("garthog"), Difficulty::Normal, catalog())
            .with_money(500_000)
            .with_planet(planet(
                1,
                1_000,
                &[Facility::OrbitalFactory, Facility::MilitarySpaceport],
            ))
            .with_available("F1")
            .with_available("F2")
            .with_available("F3")
            .with_available("C1")
            .with_available("B1")
            .with_available("ColonyShip")
            .with_available("Laser")
            .with_available("Bay")
            .with_available("Tank")
    }

    /// `base_world` with every hull stocked.
    fn stocked_world() -> AiWorld {
        base_world()
            .with_inventory("F1", 30)
            .with_inventory("F2", 30)
            .with_inventory("F3", 30)
            .with_inventory("C1", 25)
            .with_inventory("B1", 3)
    }

    fn plan(world: &AiWorld) -> ActionQueue {
        let mut queue = ActionQueue::new();
        OffensePlanner::default()
            .plan(world, &mut queue)
            .expect("plan succeeds");
        queue
    }

    // ========================================================================
    // Quota and treasury
    // ========================================================================

    #[test]
    fn test_poor_faction_does_nothing() {
        let world = base_world().with_money(50_000);
        assert!(plan(&world).is_empty());
    }

    #[test]
    fn test_quota_not_met_proceeds_to_gating() {
        let mut world = base_world();
        for id in 2..=10 {
            world = world.with_planet(planet(id, 10, &[]));
        }
        world = world
            .with_fleet(fleet(1, FleetTask::Defend, 10, &[]))
            .with_fleet(fleet(2, FleetTask::Defend, 10, &[]));

        let queue = plan(&world);
        assert!(matches!(
            queue.iter().next(),
            Some(Command::StartProduction { research, batch: 10 }) if research.as_str() == "F1"
        ));
    }

    #[test]
    fn test_fighter_shortfall_orders_first_type() {
        let world = base_world()
            .with_inventory("F1", 10)
            .with_inventory("F2", 10)
            .with_inventory("F3", 10);
        let queue = plan(&world);
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.iter().next(),
            Some(&Command::StartProduction {
                research: "F1".into(),
                batch: 10
            })
        );
    }

    #[test]
    fn test_cruiser_gate_follows_fighters() {
        let world = base_world()
            .with_inventory("F1", 30)
            .with_inventory("F2", 30)
            .with_inventory("F3", 30);
        assert!(matches!(
            plan(&world).iter().next(),
            Some(Command::StartProduction { research, batch: 2 }) if research.as_str() == "C1"
        ));
    }

    #[test]
    fn test_missing_factory_is_built_before_battleships() {
        let world = AiWorld {
            own_planets: vec![planet(1, 1_000, &[Facility::MilitarySpaceport])],
            ..stocked_world().with_inventory("B1", 0)
        };
        assert_eq!(
            plan(&world).iter().next(),
            Some(&Command::BuildFacility {
                facility: Facility::OrbitalFactory,
                planet: PlanetId(1)
            })
        );
    }

    #[test]
    fn test_colony_ship_is_never_ordered() {
        let world = stocked_world().with_inventory("B1", 0);
        assert!(matches!(
            plan(&world).iter().next(),
            Some(Command::StartProduction { research, batch: 1 }) if research.as_str() == "B1"
        ));
    }

    // ========================================================================
    // Assembly
    // ========================================================================

    #[test]
    fn test_equipment_shortfall_orders_missing_amount() {
        let world = stocked_world()
            .with_inventory("Laser", 20)
            .with_inventory("Bay", 3);
        let queue = plan(&world);
        assert_eq!(queue.len(), 1);
        // 25 cruisers with two guns each
        assert_eq!(
            queue.iter().next(),
            Some(&Command::StartProduction {
                research: "Laser".into(),
                batch: 30
            })
        );
    }

    #[test]
    fn test_equipment_in_production_waits_without_deploying() {
        let world = stocked_world().with_production("Laser").with_production("Bay");
        assert!(plan(&world).is_empty());
    }

    #[test]
    fn test_vehicle_shortfall_orders_tanks() {
        let world = stocked_world()
            .with_inventory("Laser", 50)
            .with_inventory("Bay", 3);
        // 3 battleships: hull 2 + bay 2 each
        assert_eq!(
            plan(&world).iter().next(),
            Some(&Command::StartProduction {
                research: "Tank".into(),
                batch: 12
            })
        );
    }

    #[test]
    fn test_full_stock_deploys_fleet() {
        let world = stocked_world()
            .with_planet(planet(2, 50, &[Facility::MilitarySpaceport]))
            .with_inventory("Laser", 50)
            .with_inventory("Bay", 3)
            .with_inventory("Tank", 12);
        let queue = plan(&world);
        assert_eq!(queue.len(), 1);

        let Some(Command::CreateFleet(command)) = queue.iter().next() else {
            panic!("expected a fleet deployment, got {queue:?}");
        };
        assert_eq!(command.name, "garthog.fleet");
        assert_eq!(command.planet, PlanetId(1), "largest spaceport assembles");
        assert_eq!(command.battleships.len(), 3);
        assert_eq!(command.cruisers.len(), 25);
        assert_eq!(
            command.fighters,
            vec![("F3".into(), 30), ("F2".into(), 30), ("F1".into(), 30)]
        );
        assert_eq!(command.vehicles.best_tank, Some(ResearchId::new("Tank")));
        assert_eq!(command.vehicles.tank_count, 12);
    }

    struct NoLoadout;

    impl VehiclePlanner for NoLoadout {
        fn plan_vehicles(&self, _: &AiWorld, _: u32) -> Result<Option<VehiclePlan>> {
            Ok(None)
        }

        fn has_obsolete_vehicles(&self, _: &AiWorld, _: &AiFleet) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_infeasible_loadout_aborts_assembly() {
        let world = stocked_world()
            .with_inventory("Laser", 50)
            .with_inventory("Bay", 3);
        let planner = OffensePlanner::default().with_vehicle_planner(NoLoadout);
        let mut queue = ActionQueue::new();
        planner.plan(&world, &mut queue).expect("plan");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unknown_research_is_an_error() {
        let world = base_world().with_available("Ghost");
        let mut queue = ActionQueue::new();
        assert!(OffensePlanner::default().plan(&world, &mut queue).is_err());
    }

    // ========================================================================
    // Upgrade check
    // ========================================================================

    fn quota_met(fleets: Vec<AiFleet>) -> AiWorld {
        let mut world = base_world().with_available("C2");
        for f in fleets {
            world = world.with_fleet(f);
        }
        world
    }

    #[test]
    fn test_docked_upgrade_fleet_is_decommissioned() {
        let mut arrived = fleet(1, FleetTask::Upgrade, 100, &[("C1", 5)]);
        arrived.statistics.planet = Some(PlanetId(1));
        let world = quota_met(vec![fleet(2, FleetTask::Idle, 1, &[("C1", 1)]), arrived]);

        let queue = plan(&world);
        assert_eq!(
            queue.iter().collect::<Vec<_>>(),
            vec![&Command::DecommissionFleet { fleet: FleetId(1) }]
        );
    }

    #[test]
    fn test_refit_in_flight_blocks_new_refit() {
        let mut travelling = fleet(1, FleetTask::Upgrade, 100, &[]);
        travelling.target = Some(PlanetId(1));
        let world = quota_met(vec![travelling, fleet(2, FleetTask::Idle, 1, &[("C1", 1)])]);
        assert!(plan(&world).is_empty());
    }

    #[test]
    fn test_weakest_outdated_fleet_is_sent_for_refit() {
        let world = quota_met(vec![
            fleet(1, FleetTask::Patrol, 500, &[("C1", 5)]),
            fleet(2, FleetTask::Idle, 50, &[("C1", 2)]),
            fleet(3, FleetTask::Attack, 10, &[("C1", 1)]),
            fleet(4, FleetTask::Idle, 50, &[("C1", 2)]),
        ]);
        assert_eq!(
            plan(&world).iter().next(),
            Some(&Command::MoveFleet {
                fleet: FleetId(2),
                planet: PlanetId(1),
                task: Some(FleetTask::Upgrade)
            })
        );
    }

    #[test]
    fn test_is_better_compares_cost() {
        let world = base_world().with_available("C2");
        let c1 = world.research(&"C1".into()).expect("known");
        let c2 = world.research(&"C2".into()).expect("known");
        assert!(is_better(None, Some(c1)));
        assert!(is_better(Some(c1), Some(c2)));
        assert!(!is_better(Some(c2), Some(c1)));
        assert!(!is_better(Some(c1), None));
        assert!(!is_better(None, None));
    }

    #[test]
    fn test_up_to_date_fleet_does_not_need_upgrade() {
        let world = AiWorld {
            available_research: base_world()
                .available_research
                .into_iter()
                .filter(|id| id.as_str() != "ColonyShip")
                .collect(),
            ..base_world()
        };
        let modern = fleet(1, FleetTask::Idle, 0, &[("F3", 30), ("C1", 25), ("B1", 3)]);
        assert!(!OffensePlanner::default()
            .needs_upgrade(&world, &modern)
            .expect("check"));
    }

    #[test]
    fn test_colony_ship_outclasses_battleships() {
        // Fleet construction skips the colony ship; the refit comparison does not.
        let world = base_world();
        let battle_group = fleet(1, FleetTask::Idle, 0, &[("F3", 30), ("C1", 25), ("B1", 3)]);
        assert!(OffensePlanner::default()
            .needs_upgrade(&world, &battle_group)
            .expect("check"));
    }

    #[test]
    fn test_equal_cost_hulls_are_not_better() {
        let mut catalog = (*catalog()).clone();
        catalog.register(ResearchType::new("C1b", "Cruiser B", ResearchCategory::Cruisers, 10_000));
        let world = AiWorld::new(FactionId::new("garthog"), Difficulty::Normal, Arc::new(catalog))
            .with_available("C1")
            .with_available("C1b");
        let cruisers = fleet(1, FleetTask::Idle, 0, &[("C1", 4)]);

        let best = most_expensive_available(&world, ResearchCategory::Cruisers).expect("known");
        assert_eq!(best.map(|rt| rt.id.as_str()), Some("C1"));
        assert!(!OffensePlanner::default()
            .needs_upgrade(&world, &cruisers)
            .expect("check"));
    }

    #[test]
    fn test_refit_without_spaceport_builds_one() {
        let world = AiWorld {
            own_planets: vec![planet(1, 1_000, &[])],
            ..quota_met(vec![fleet(1, FleetTask::Idle, 5, &[("C1", 1)])])
        };
        assert_eq!(
            plan(&world).iter().next(),
            Some(&Command::BuildFacility {
                facility: Facility::MilitarySpaceport,
                planet: PlanetId(1)
            })
        );
    }
}
