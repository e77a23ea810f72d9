//! Test fixtures and helpers.
//!
//! A small but complete research tree and faction economies at well-known
//! stages of fleet growth, for consistent testing.

use std::sync::Arc;

use fixed::types::I32F32;
use fleet_core::economy::{FactionEconomy, Fleet, InventoryItem, Planet};
use fleet_core::math::Vec2Fixed;
use fleet_core::research::{
    EquipmentSlot, ResearchCatalog, ResearchCategory, ResearchType, DAMAGE_PROPERTY,
    VEHICLES_PROPERTY,
};
use fleet_core::snapshot::{Difficulty, Facility, FactionId, FleetId, FleetTask, PlanetId};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Every blueprint id in [`standard_catalog`], in unlock order.
pub const STANDARD_RESEARCH: [&str; 15] = [
    "Fighter1",
    "Fighter2",
    "Destroyer",
    "Cruiser",
    "Battleship1",
    "ColonyShip",
    "Laser1",
    "Laser2",
    "IonCannon",
    "Shield1",
    "SmallBay",
    "LargeBay",
    "Tank1",
    "Tank2",
    "RadarCar",
];

fn weapon(id: &str, cost: i64, damage: i32) -> ResearchType {
    ResearchType::new(id, id, ResearchCategory::Weapons, cost).with_property(DAMAGE_PROPERTY, damage)
}

fn bay(id: &str, cost: i64, vehicles: i32) -> ResearchType {
    ResearchType::new(id, id, ResearchCategory::Equipment, cost)
        .with_property(VEHICLES_PROPERTY, vehicles)
}

fn guns(max: u32) -> EquipmentSlot {
    EquipmentSlot::variable("guns", vec!["Laser1".into(), "Laser2".into()], max)
}

/// A research tree with two of most things.
///
/// Hulls: two fighters, two cruisers, one battleship and the colony ship.
/// Equipment: two lasers, an ion cannon (fixed on battleships), a shield and
/// two vehicle bays. Ground units: two tanks and a radar car.
#[must_use]
pub fn standard_catalog() -> ResearchCatalog {
    let mut catalog = ResearchCatalog::new();

    catalog.register(weapon("Laser1", 300, 4));
    catalog.register(weapon("Laser2", 700, 7));
    catalog.register(weapon("IonCannon", 3_000, 25));
    catalog.register(ResearchType::new(
        "Shield1",
        "Shield",
        ResearchCategory::Equipment,
        600,
    ));
    catalog.register(bay("SmallBay", 1_000, 2));
    catalog.register(bay("LargeBay", 2_000, 4));

    catalog.register(
        ResearchType::new("Fighter1", "Fighter", ResearchCategory::Fighters, 1_000)
            .with_property(DAMAGE_PROPERTY, 2),
    );
    catalog.register(
        ResearchType::new("Fighter2", "Interceptor", ResearchCategory::Fighters, 1_800)
            .with_property(DAMAGE_PROPERTY, 3),
    );

    let shield = EquipmentSlot::variable("shield", vec!["Shield1".into()], 1);
    catalog.register(
        ResearchType::new("Destroyer", "Destroyer", ResearchCategory::Cruisers, 9_000)
            .with_slot(guns(2))
            .with_slot(shield.clone()),
    );
    catalog.register(
        ResearchType::new("Cruiser", "Cruiser", ResearchCategory::Cruisers, 15_000)
            .with_slot(guns(3))
            .with_slot(shield),
    );
    catalog.register(
        ResearchType::new("Battleship1", "Battleship", ResearchCategory::Battleships, 60_000)
            .with_property(VEHICLES_PROPERTY, 4)
            .with_slot(guns(4))
            .with_slot(EquipmentSlot::variable(
                "bay",
                vec!["SmallBay".into(), "LargeBay".into()],
                1,
            ))
            .with_slot(EquipmentSlot::fixed("main", "IonCannon")),
    );
    catalog.register(ResearchType::new(
        "ColonyShip",
        "Colony Ship",
        ResearchCategory::Battleships,
        120_000,
    ));

    catalog.register(ResearchType::new("Tank1", "Tank", ResearchCategory::Tanks, 400));
    catalog.register(ResearchType::new("Tank2", "Heavy Tank", ResearchCategory::Tanks, 900));
    catalog.register(ResearchType::new(
        "RadarCar",
        "Radar Car",
        ResearchCategory::Vehicles,
        500,
    ));
    catalog
}

/// [`standard_catalog`] behind an `Arc`, ready for snapshots.
#[must_use]
pub fn shared_catalog() -> Arc<ResearchCatalog> {
    Arc::new(standard_catalog())
}

/// A planet at whole map coordinates.
#[must_use]
pub fn planet(id: u32, population: u32, x: i32, y: i32, facilities: &[Facility]) -> Planet {
    facilities.iter().fold(
        Planet::new(PlanetId(id), format!("Planet {id}"), Vec2Fixed::from_ints(x, y), population),
        |planet, &facility| planet.with_facility(facility),
    )
}

/// A fleet carrying plain (unequipped) units.
#[must_use]
pub fn fleet_with(id: u32, task: FleetTask, items: &[(&str, u32)]) -> Fleet {
    let mut fleet = Fleet::new(FleetId(id), format!("Fleet {id}"), Vec2Fixed::ZERO);
    fleet.task = task;
    for &(research, count) in items {
        fleet.inventory.push(InventoryItem::new(research, count));
    }
    fleet
}

/// A rich, developed faction with most of the tree unlocked and empty storage.
///
/// The capital has both facilities; a smaller outpost has none.
#[must_use]
pub fn standard_economy(faction: &str) -> FactionEconomy {
    let mut economy = FactionEconomy::new(FactionId::new(faction), Difficulty::Normal, 250_000)
        .with_planet(planet(
            1,
            5_000,
            0,
            0,
            &[Facility::OrbitalFactory, Facility::MilitarySpaceport],
        ))
        .with_planet(planet(2, 800, 40, 30, &[]));
    for id in STANDARD_RESEARCH {
        // Tank2 stays locked so Tank1 is the loadout tank. An unlocked colony
        // ship would outclass every battleship and mark new fleets for refit.
        if id != "Tank2" && id != "ColonyShip" {
            economy = economy.with_available(id);
        }
    }
    economy
}

/// [`standard_economy`] holding exactly what one new fleet needs.
///
/// With default planner settings the next pass deploys 3 battleships,
/// 25 cruisers, 30 of each fighter, and a loadout of 23 tanks plus one radar
/// car.
#[must_use]
pub fn stocked_economy(faction: &str) -> FactionEconomy {
    standard_economy(faction)
        .with_inventory("Fighter1", 30)
        .with_inventory("Fighter2", 30)
        .with_inventory("Destroyer", 25)
        .with_inventory("Cruiser", 25)
        .with_inventory("Battleship1", 3)
        .with_inventory("Laser2", 87)
        .with_inventory("Shield1", 25)
        .with_inventory("LargeBay", 3)
        .with_inventory("Tank1", 23)
        .with_inventory("RadarCar", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = standard_catalog();
        catalog.validate().expect("valid catalog");
        assert_eq!(catalog.len(), STANDARD_RESEARCH.len());
    }

    #[test]
    fn test_stocked_economy_snapshot() {
        let world = stocked_economy("ai")
            .snapshot(shared_catalog())
            .expect("snapshot");
        assert_eq!(world.own_planets.len(), 2);
        assert_eq!(world.inventory_count(&"Laser2".into()), 87);
        assert!(!world.is_available(&"Tank2".into()));
        assert!(!world.is_available(&"ColonyShip".into()));
    }
}
