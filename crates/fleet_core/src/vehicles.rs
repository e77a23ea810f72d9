//! Ground-vehicle loadouts for battleship vehicle bays.
//!
//! The offense planner treats vehicle planning as a black box: given a
//! carrying capacity it asks a [`VehiclePlanner`] for a loadout and gives up
//! for this tick when none is possible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::research::{ResearchCategory, ResearchId, ResearchType};
use crate::selection::{expensive_first, most_expensive_available};
use crate::snapshot::{AiFleet, AiWorld};

/// A concrete ground-vehicle loadout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehiclePlan {
    /// Main battle tank type, if any is unlocked.
    pub best_tank: Option<ResearchId>,
    /// Number of tanks.
    pub tank_count: u32,
    /// Support vehicles and their counts.
    pub vehicle_config: BTreeMap<ResearchId, u32>,
}

impl VehiclePlan {
    /// Units of every type the loadout needs from storage.
    #[must_use]
    pub fn demand(&self) -> BTreeMap<ResearchId, u32> {
        let mut demand = self.vehicle_config.clone();
        if let Some(tank) = &self.best_tank {
            if self.tank_count > 0 {
                *demand.entry(tank.clone()).or_insert(0) += self.tank_count;
            }
        }
        demand
    }

    /// Total ground units in the loadout.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.tank_count + self.vehicle_config.values().sum::<u32>()
    }
}

/// Plans ground-vehicle loadouts and judges carried vehicles.
pub trait VehiclePlanner: Send + Sync {
    /// Compute a loadout filling `capacity`.
    ///
    /// Returns `Ok(None)` when no loadout fits, for instance when vehicle
    /// bays exist but no ground unit has been researched.
    fn plan_vehicles(&self, world: &AiWorld, capacity: u32) -> Result<Option<VehiclePlan>>;

    /// Whether the fleet carries ground units that newer research replaces.
    fn has_obsolete_vehicles(&self, world: &AiWorld, fleet: &AiFleet) -> Result<bool>;
}

/// Default loadout policy.
///
/// Up to half of the capacity goes to one of each support vehicle, most
/// expensive first; the remainder is filled with the best tank. Without any
/// tank research the best support vehicle fills the remainder instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVehiclePlanner;

impl VehiclePlanner for DefaultVehiclePlanner {
    fn plan_vehicles(&self, world: &AiWorld, capacity: u32) -> Result<Option<VehiclePlan>> {
        if capacity == 0 {
            return Ok(Some(VehiclePlan::default()));
        }

        let mut tanks = world.available_in(ResearchCategory::Tanks)?;
        let mut support = world.available_in(ResearchCategory::Vehicles)?;
        if tanks.is_empty() && support.is_empty() {
            return Ok(None);
        }
        tanks.sort_by(|a, b| expensive_first(a, b));
        support.sort_by(|a, b| expensive_first(a, b));

        let support_budget = if tanks.is_empty() { capacity } else { capacity / 2 };
        let mut plan = VehiclePlan::default();
        let mut used = 0;
        for vehicle in &support {
            if used >= support_budget {
                break;
            }
            *plan.vehicle_config.entry(vehicle.id.clone()).or_insert(0) += 1;
            used += 1;
        }

        let remaining = capacity - used;
        if let Some(tank) = tanks.first() {
            plan.best_tank = Some(tank.id.clone());
            plan.tank_count = remaining;
        } else if let Some(vehicle) = support.first() {
            *plan.vehicle_config.entry(vehicle.id.clone()).or_insert(0) += remaining;
        }

        Ok(Some(plan))
    }

    fn has_obsolete_vehicles(&self, world: &AiWorld, fleet: &AiFleet) -> Result<bool> {
        if fleet.statistics.vehicle_count == 0 {
            return Ok(false);
        }
        for item in &fleet.inventory {
            let carried = world.research(&item.research)?;
            if !carried.category.is_ground_vehicle() {
                continue;
            }
            if is_outclassed(world, carried)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn is_outclassed(world: &AiWorld, carried: &ResearchType) -> Result<bool> {
    let best = most_expensive_available(world, carried.category)?;
    Ok(best.is_some_and(|best| best.production_cost > carried.production_cost))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::math::Vec2Fixed;
    use crate::research::ResearchCatalog;
    use crate::snapshot::{AiInventoryItem, Difficulty, FactionId, FleetId};

    fn catalog() -> Arc<ResearchCatalog> {
        let mut catalog = ResearchCatalog::new();
        catalog.register(ResearchType::new("Tank1", "Tank", ResearchCategory::Tanks, 300));
        catalog.register(ResearchType::new("Tank2", "Tank II", ResearchCategory::Tanks, 600));
        catalog.register(ResearchType::new("Radar", "Radar Car", ResearchCategory::Vehicles, 400));
        catalog.register(ResearchType::new("Sled", "Rocket Sled", ResearchCategory::Vehicles, 800));
        Arc::new(catalog)
    }

    fn world() -> AiWorld {
        AiWorld::new(FactionId::new("ai"), Difficulty::Normal, catalog())
    }

    #[test]
    fn test_zero_capacity_is_empty_plan() {
        let plan = DefaultVehiclePlanner
            .plan_vehicles(&world(), 0)
            .expect("plan")
            .expect("feasible");
        assert_eq!(plan.total_units(), 0);
        assert!(plan.demand().is_empty());
    }

    #[test]
    fn test_no_ground_research_is_infeasible() {
        let plan = DefaultVehiclePlanner.plan_vehicles(&world(), 6).expect("plan");
        assert!(plan.is_none());
    }

    #[test]
    fn test_mixed_loadout_fills_capacity() {
        let world = world()
            .with_available("Tank1")
            .with_available("Tank2")
            .with_available("Radar")
            .with_available("Sled");
        let plan = DefaultVehiclePlanner
            .plan_vehicles(&world, 10)
            .expect("plan")
            .expect("feasible");

        assert_eq!(plan.best_tank, Some(ResearchId::new("Tank2")));
        assert_eq!(plan.tank_count, 8);
        assert_eq!(plan.vehicle_config.get(&ResearchId::new("Sled")), Some(&1));
        assert_eq!(plan.vehicle_config.get(&ResearchId::new("Radar")), Some(&1));
        assert_eq!(plan.total_units(), 10);
    }

    #[test]
    fn test_support_only_loadout_uses_best_vehicle() {
        let world = world().with_available("Radar").with_available("Sled");
        let plan = DefaultVehiclePlanner
            .plan_vehicles(&world, 5)
            .expect("plan")
            .expect("feasible");
        assert!(plan.best_tank.is_none());
        assert_eq!(plan.vehicle_config.get(&ResearchId::new("Sled")), Some(&4));
        assert_eq!(plan.vehicle_config.get(&ResearchId::new("Radar")), Some(&1));
    }

    #[test]
    fn test_obsolete_tank_detected() {
        let world = world().with_available("Tank1").with_available("Tank2");
        let mut fleet = AiFleet::new(FleetId(1), "Old Guard", Vec2Fixed::ZERO);
        fleet.inventory.push(AiInventoryItem {
            fleet: FleetId(1),
            research: "Tank1".into(),
            count: 4,
        });
        fleet.statistics.vehicle_count = 4;
        assert!(DefaultVehiclePlanner
            .has_obsolete_vehicles(&world, &fleet)
            .expect("check"));

        fleet.inventory[0].research = "Tank2".into();
        assert!(!DefaultVehiclePlanner
            .has_obsolete_vehicles(&world, &fleet)
            .expect("check"));
    }
}
