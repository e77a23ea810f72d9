//! Deterministic ranking of candidate ships, fleets and planets.
//!
//! Every helper breaks ties by snapshot order so that two passes over the
//! same snapshot always choose the same candidate.

use std::cmp::{Ordering, Reverse};

use crate::error::Result;
use crate::math::Vec2Fixed;
use crate::research::{ResearchCategory, ResearchId, ResearchType};
use crate::snapshot::{AiFleet, AiPlanet, AiWorld, Facility};

/// Order blueprints by descending production cost.
///
/// Pair with a stable sort so equal costs keep snapshot order.
#[must_use]
pub fn expensive_first(a: &ResearchType, b: &ResearchType) -> Ordering {
    b.production_cost.cmp(&a.production_cost)
}

/// Pick up to `limit` hulls from storage, most expensive type first.
///
/// Each returned id stands for one unit, so a type appears as many times as
/// it was picked.
#[must_use]
pub fn take_expensive_first(
    world: &AiWorld,
    candidates: &[&ResearchType],
    limit: u32,
) -> Vec<ResearchId> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| expensive_first(a, b));

    let mut picked = Vec::new();
    for rt in sorted {
        let mut count = world.inventory_count(&rt.id);
        while picked.len() < limit as usize && count > 0 {
            picked.push(rt.id.clone());
            count -= 1;
        }
    }
    picked
}

/// Allot up to `per_type` units of every stocked fighter type.
///
/// Returns the allotment, most expensive first, and the total fighter count.
#[must_use]
pub fn allot_fighters(
    world: &AiWorld,
    fighters: &[&ResearchType],
    per_type: u32,
) -> (Vec<(ResearchId, u32)>, u32) {
    let mut sorted = fighters.to_vec();
    sorted.sort_by(|a, b| expensive_first(a, b));

    let mut allotment = Vec::new();
    let mut total = 0;
    for rt in sorted {
        let stocked = world.inventory_count(&rt.id);
        if stocked > 0 {
            let take = stocked.min(per_type);
            allotment.push((rt.id.clone(), take));
            total += take;
        }
    }
    (allotment, total)
}

/// The most expensive unlocked blueprint of a category.
///
/// The first one in snapshot order wins a cost tie.
pub fn most_expensive_available(
    world: &AiWorld,
    category: ResearchCategory,
) -> Result<Option<&ResearchType>> {
    Ok(world
        .available_in(category)?
        .into_iter()
        .min_by_key(|rt| Reverse(rt.production_cost)))
}

/// The fleet with the least firepower.
///
/// `min_by_key` returns the first of several equal minima, so a firepower
/// tie goes to the fleet seen first.
pub fn weakest_fleet<'a>(fleets: impl IntoIterator<Item = &'a AiFleet>) -> Option<&'a AiFleet> {
    fleets.into_iter().min_by_key(|f| f.statistics.firepower)
}

/// The military spaceport used to assemble new fleets: highest population.
#[must_use]
pub fn find_best_military_spaceport(world: &AiWorld) -> Option<&AiPlanet> {
    world
        .own_planets
        .iter()
        .filter(|p| p.has_military_spaceport())
        .min_by_key(|p| Reverse(p.population))
}

/// The military spaceport nearest to a map position.
#[must_use]
pub fn find_closest_military_spaceport(world: &AiWorld, from: Vec2Fixed) -> Option<&AiPlanet> {
    world
        .own_planets
        .iter()
        .filter(|p| p.has_military_spaceport())
        .min_by_key(|p| p.position.distance_squared(from))
}

/// The planet where a missing facility should be built: highest population
/// among planets that lack it.
#[must_use]
pub fn facility_site(world: &AiWorld, facility: Facility) -> Option<&AiPlanet> {
    world
        .own_planets
        .iter()
        .filter(|p| !p.has(facility))
        .min_by_key(|p| Reverse(p.population))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::research::ResearchCatalog;
    use crate::snapshot::{Difficulty, FactionId, FleetId, PlanetId};

    fn catalog() -> Arc<ResearchCatalog> {
        let mut catalog = ResearchCatalog::new();
        catalog.register(ResearchType::new("C1", "Cruiser", ResearchCategory::Cruisers, 10_000));
        catalog.register(ResearchType::new("C2", "Cruiser II", ResearchCategory::Cruisers, 20_000));
        catalog.register(ResearchType::new("C3", "Cruiser III", ResearchCategory::Cruisers, 20_000));
        Arc::new(catalog)
    }

    fn world() -> AiWorld {
        AiWorld::new(FactionId::new("ai"), Difficulty::Normal, catalog())
            .with_available("C1")
            .with_available("C2")
            .with_available("C3")
    }

    fn fleet(id: u32, firepower: i64) -> AiFleet {
        let mut fleet = AiFleet::new(FleetId(id), format!("F{id}"), Vec2Fixed::ZERO);
        fleet.statistics.firepower = firepower;
        fleet
    }

    #[test]
    fn test_take_expensive_first_prefers_costly_hulls() {
        let world = world()
            .with_inventory("C1", 10)
            .with_inventory("C2", 2)
            .with_inventory("C3", 1);
        let candidates = world.available_in(ResearchCategory::Cruisers).expect("known");
        let picked = take_expensive_first(&world, &candidates, 5);
        let ids: Vec<&str> = picked.iter().map(ResearchId::as_str).collect();
        // C2 and C3 tie on cost; snapshot order keeps C2 first.
        assert_eq!(ids, vec!["C2", "C2", "C3", "C1", "C1"]);
    }

    #[test]
    fn test_take_expensive_first_stops_when_storage_runs_out() {
        let world = world().with_inventory("C1", 2);
        let candidates = world.available_in(ResearchCategory::Cruisers).expect("known");
        assert_eq!(take_expensive_first(&world, &candidates, 25).len(), 2);
    }

    #[test]
    fn test_allot_fighters_caps_each_type() {
        let world = world().with_inventory("C1", 45).with_inventory("C2", 12);
        let types = world.available_in(ResearchCategory::Cruisers).expect("known");
        let (allotment, total) = allot_fighters(&world, &types, 30);
        assert_eq!(
            allotment,
            vec![(ResearchId::new("C2"), 12), (ResearchId::new("C1"), 30)]
        );
        assert_eq!(total, 42);
    }

    #[test]
    fn test_most_expensive_tie_goes_to_first() {
        let world = world();
        let best = most_expensive_available(&world, ResearchCategory::Cruisers)
            .expect("known")
            .expect("some");
        assert_eq!(best.id, ResearchId::new("C2"));
    }

    #[test]
    fn test_weakest_fleet_tie_goes_to_first() {
        let fleets = vec![fleet(1, 50), fleet(2, 10), fleet(3, 10)];
        assert_eq!(weakest_fleet(&fleets).map(|f| f.id), Some(FleetId(2)));
        assert!(weakest_fleet(&Vec::<AiFleet>::new()).is_none());
    }

    #[test]
    fn test_spaceport_locators() {
        let world = world()
            .with_planet(AiPlanet::new(PlanetId(1), "Near", Vec2Fixed::from_ints(1, 1), 100))
            .with_planet(
                AiPlanet::new(PlanetId(2), "Far", Vec2Fixed::from_ints(50, 50), 900)
                    .with_facility(Facility::MilitarySpaceport),
            )
            .with_planet(
                AiPlanet::new(PlanetId(3), "Mid", Vec2Fixed::from_ints(10, 10), 300)
                    .with_facility(Facility::MilitarySpaceport),
            );

        assert_eq!(find_best_military_spaceport(&world).map(|p| p.id), Some(PlanetId(2)));
        assert_eq!(
            find_closest_military_spaceport(&world, Vec2Fixed::ZERO).map(|p| p.id),
            Some(PlanetId(3))
        );
        assert_eq!(
            facility_site(&world, Facility::MilitarySpaceport).map(|p| p.id),
            Some(PlanetId(1))
        );
    }
}
