//! Offense planner integration tests.
//!
//! These run full plan-then-commit cycles against live faction economies
//! built from the shared fixtures.

use fleet_core::command::{ActionQueue, Command};
use fleet_core::config::PlannerConfig;
use fleet_core::economy::{CommitOutcome, EconomyEvent, FactionEconomy};
use fleet_core::math::Vec2Fixed;
use fleet_core::offense::OffensePlanner;
use fleet_core::planner::{run_pass, PlannerSchedule};
use fleet_core::research::ResearchId;
use fleet_core::snapshot::{FleetId, FleetTask, PlanetId};
use fleet_test_utils::fixtures::{
    fleet_with, shared_catalog, standard_catalog, standard_economy, stocked_economy,
};

fn plan(economy: &FactionEconomy) -> ActionQueue {
    let world = economy.snapshot(shared_catalog()).expect("snapshot");
    run_pass(&OffensePlanner::default(), &world).expect("plan")
}

fn commit(economy: &mut FactionEconomy, queue: &ActionQueue) -> Vec<CommitOutcome> {
    economy.execute(&standard_catalog(), &PlannerConfig::default(), queue.iter())
}

// =============================================================================
// Fleet assembly
// =============================================================================

#[test]
fn test_stocked_faction_deploys_fleet() {
    let mut economy = stocked_economy("garthog");
    let queue = plan(&economy);

    assert_eq!(queue.len(), 1);
    let Some(Command::CreateFleet(create)) = queue.iter().next() else {
        panic!("expected a fleet, got {queue:?}");
    };
    assert_eq!(create.planet, PlanetId(1));
    assert_eq!(create.battleships.len(), 3);
    assert_eq!(create.cruisers.len(), 25);
    assert!(create.cruisers.iter().all(|c| c.as_str() == "Cruiser"));
    assert_eq!(create.vehicles.tank_count, 23);

    let outcomes = commit(&mut economy, &queue);
    assert!(matches!(
        outcomes.as_slice(),
        [CommitOutcome::Applied(EconomyEvent::FleetDeployed { units: 112, .. })]
    ));

    let fleet = &economy.fleets[0];
    assert_eq!(fleet.name, "garthog.fleet");
    assert_eq!(fleet.docked_at, Some(PlanetId(1)));
    // Every laser went onto the hulls.
    assert_eq!(economy.stored(&ResearchId::new("Laser2")), 0);
    assert_eq!(economy.stored(&ResearchId::new("Tank1")), 0);
    assert_eq!(economy.stored(&ResearchId::new("Destroyer")), 25);
}

#[test]
fn test_deployed_fleet_is_up_to_date() {
    let mut economy = stocked_economy("garthog");
    let queue = plan(&economy);
    commit(&mut economy, &queue);

    // Quota is one fleet for two planets, and the new fleet needs no refit.
    assert!(plan(&economy).is_empty());
}

#[test]
fn test_empty_storage_orders_fighters_first() {
    let queue = plan(&standard_economy("garthog"));
    assert_eq!(
        queue.iter().collect::<Vec<_>>(),
        vec![&Command::StartProduction {
            research: ResearchId::new("Fighter1"),
            batch: 10,
        }]
    );
}

#[test]
fn test_stale_deploy_leaves_economy_untouched() {
    let mut economy = stocked_economy("garthog");
    let queue = plan(&economy);

    // A battleship disappears between planning and commit.
    economy.inventory.insert(ResearchId::new("Battleship1"), 2);
    let before = economy.clone();

    let outcomes = commit(&mut economy, &queue);
    assert!(matches!(
        outcomes.as_slice(),
        [CommitOutcome::Aborted {
            command: "create_fleet",
            ..
        }]
    ));
    assert_eq!(economy, before);
    assert_eq!(economy.state_hash(), before.state_hash());
}

// =============================================================================
// Refit cycle
// =============================================================================

#[test]
fn test_outdated_fleet_refit_cycle() {
    let mut outdated = fleet_with(7, FleetTask::Patrol, &[("Fighter1", 20)]);
    outdated.position = Vec2Fixed::from_ints(40, 30);
    let mut economy = standard_economy("garthog").with_fleet(outdated);
    let money = economy.money;

    // Tick 1: sent to the only spaceport.
    let queue = plan(&economy);
    assert_eq!(
        queue.iter().collect::<Vec<_>>(),
        vec![&Command::MoveFleet {
            fleet: FleetId(7),
            planet: PlanetId(1),
            task: Some(FleetTask::Upgrade),
        }]
    );
    assert!(commit(&mut economy, &queue).iter().all(CommitOutcome::is_applied));

    // Still travelling: nothing to do.
    assert!(plan(&economy).is_empty());

    // Arrival.
    let fleet = &mut economy.fleets[0];
    fleet.target = None;
    fleet.docked_at = Some(PlanetId(1));
    fleet.position = Vec2Fixed::ZERO;

    let queue = plan(&economy);
    assert_eq!(
        queue.iter().collect::<Vec<_>>(),
        vec![&Command::DecommissionFleet { fleet: FleetId(7) }]
    );
    commit(&mut economy, &queue);

    assert!(economy.fleets.is_empty());
    assert_eq!(economy.money, money + 20 * 1_000 / 2);
}

#[test]
fn test_schedule_runs_offense_planner() {
    let schedule = PlannerSchedule::new().with_planner(OffensePlanner::default());
    let world = stocked_economy("garthog")
        .snapshot(shared_catalog())
        .expect("snapshot");

    let pass = schedule.run(&world);
    assert!(pass.faults.is_empty());
    assert_eq!(pass.queue.len(), 1);
}
