//! World advancement between planning passes.
//!
//! The planner only decides; something has to turn production orders into
//! units and move dispatched fleets. This module does the minimum a host
//! game would: one unit per order per tick, and straight-line movement at a
//! fixed speed.

use fleet_core::economy::FactionEconomy;
use fleet_core::math::Fixed;
use fleet_core::research::{ResearchCatalog, ResearchId};
use fleet_core::snapshot::{FleetId, FleetTask, PlanetId};
use tracing::{debug, info, trace};

/// What happened to one faction during a world step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Units that left the production line.
    pub produced: Vec<ResearchId>,
    /// Money spent on production.
    pub spent: i64,
    /// Fleets that reached their destination.
    pub arrivals: Vec<(FleetId, PlanetId)>,
}

/// Advance production and movement by one tick.
pub fn step(economy: &mut FactionEconomy, catalog: &ResearchCatalog, fleet_speed: Fixed) -> StepReport {
    let mut report = StepReport::default();
    advance_production(economy, catalog, &mut report);
    advance_fleets(economy, fleet_speed, &mut report);
    report
}

/// Build one unit of every open order the treasury can pay for.
///
/// Orders are served oldest first; an order that cannot be afforded this
/// tick waits without blocking younger orders. Finished orders are removed.
pub fn advance_production(
    economy: &mut FactionEconomy,
    catalog: &ResearchCatalog,
    report: &mut StepReport,
) {
    let mut built = Vec::new();
    for order in &mut economy.production {
        if order.remaining == 0 {
            continue;
        }
        let Ok(rt) = catalog.get(&order.research) else {
            debug!(faction = %economy.faction, research = %order.research, "dropping order for unknown research");
            order.remaining = 0;
            continue;
        };
        if economy.money < rt.production_cost {
            trace!(faction = %economy.faction, research = %order.research, "production stalled");
            continue;
        }
        economy.money -= rt.production_cost;
        report.spent += rt.production_cost;
        order.remaining -= 1;
        built.push(order.research.clone());
    }
    economy.production.retain(|o| o.remaining > 0);

    for research in &built {
        economy.store(research, 1);
    }
    report.produced.extend(built);
}

/// Move every travelling fleet towards its target; arrival docks it.
pub fn advance_fleets(economy: &mut FactionEconomy, speed: Fixed, report: &mut StepReport) {
    let FactionEconomy {
        faction,
        planets,
        fleets,
        ..
    } = economy;
    for fleet in fleets.iter_mut() {
        let Some(target) = fleet.target else {
            continue;
        };
        let Some(planet) = planets.iter().find(|p| p.id == target) else {
            debug!(%faction, fleet = %fleet.id, planet = %target, "target planet lost, stopping");
            fleet.target = None;
            // A stranded refit would never dock; free the fleet for the next check.
            if fleet.task == FleetTask::Upgrade {
                fleet.task = FleetTask::Idle;
            }
            continue;
        };
        let (position, arrived) = fleet.position.step_towards(planet.position, speed);
        fleet.position = position;
        if arrived {
            fleet.target = None;
            fleet.docked_at = Some(target);
            info!(%faction, fleet = %fleet.id, planet = %target, "fleet arrived");
            report.arrivals.push((fleet.id, target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::economy::{Fleet, Planet, ProductionOrder};
    use fleet_core::math::Vec2Fixed;
    use fleet_core::research::{ResearchCategory, ResearchType};
    use fleet_core::snapshot::{Difficulty, FactionId};

    fn catalog() -> ResearchCatalog {
        let mut catalog = ResearchCatalog::new();
        catalog.register(ResearchType::new("F1", "Fighter", ResearchCategory::Fighters, 1_000));
        catalog.register(ResearchType::new("B1", "Battleship", ResearchCategory::Battleships, 50_000));
        catalog
    }

    fn economy(money: i64) -> FactionEconomy {
        FactionEconomy::new(FactionId::new("ai"), Difficulty::Normal, money)
            .with_planet(Planet::new(PlanetId(1), "Home", Vec2Fixed::ZERO, 1_000))
            .with_planet(Planet::new(PlanetId(2), "Far", Vec2Fixed::from_ints(30, 40), 500))
    }

    fn order(research: &str, remaining: u32) -> ProductionOrder {
        ProductionOrder {
            research: ResearchId::new(research),
            remaining,
        }
    }

    #[test]
    fn test_production_builds_one_unit_per_order() {
        let mut economy = economy(10_000);
        economy.production = vec![order("F1", 2)];
        let catalog = catalog();

        let first = step(&mut economy, &catalog, Fixed::from_num(5));
        assert_eq!(first.produced, vec![ResearchId::new("F1")]);
        assert_eq!(first.spent, 1_000);
        step(&mut economy, &catalog, Fixed::from_num(5));

        assert_eq!(economy.stored(&ResearchId::new("F1")), 2);
        assert_eq!(economy.money, 8_000);
        assert!(economy.production.is_empty());
    }

    #[test]
    fn test_unaffordable_order_waits() {
        let mut economy = economy(20_000);
        economy.production = vec![order("B1", 1), order("F1", 1)];

        let report = step(&mut economy, &catalog(), Fixed::from_num(5));

        assert_eq!(report.produced, vec![ResearchId::new("F1")]);
        assert_eq!(economy.production, vec![order("B1", 1)]);
        assert_eq!(economy.money, 19_000);
    }

    #[test]
    fn test_fleet_travels_and_docks() {
        let mut fleet = Fleet::new(FleetId(4), "Raiders", Vec2Fixed::ZERO);
        fleet.target = Some(PlanetId(2));
        let mut economy = economy(0).with_fleet(fleet);
        let catalog = catalog();

        // Distance 50 at speed 20: two steps in flight, the third arrives.
        for _ in 0..2 {
            let report = step(&mut economy, &catalog, Fixed::from_num(20));
            assert!(report.arrivals.is_empty());
        }
        let report = step(&mut economy, &catalog, Fixed::from_num(20));

        assert_eq!(report.arrivals, vec![(FleetId(4), PlanetId(2))]);
        let fleet = &economy.fleets[0];
        assert_eq!(fleet.position, Vec2Fixed::from_ints(30, 40));
        assert_eq!(fleet.docked_at, Some(PlanetId(2)));
        assert!(fleet.target.is_none());
    }

    #[test]
    fn test_lost_refit_target_releases_fleet() {
        let mut fleet = Fleet::new(FleetId(4), "Old Guard", Vec2Fixed::ZERO);
        fleet.task = FleetTask::Upgrade;
        fleet.target = Some(PlanetId(2));
        let mut economy = economy(0).with_fleet(fleet);
        economy.planets.retain(|p| p.id != PlanetId(2));

        let report = step(&mut economy, &catalog(), Fixed::from_num(20));

        assert!(report.arrivals.is_empty());
        let fleet = &economy.fleets[0];
        assert!(fleet.target.is_none());
        assert!(fleet.docked_at.is_none());
        assert_eq!(fleet.task, FleetTask::Idle);
    }
}
