//! Research blueprints: ships, equipment, weapons and ground vehicles.
//!
//! Blueprints are loaded once at game-data initialization and never mutated.
//! Everything downstream refers to them by [`ResearchId`] and resolves the
//! blueprint through the shared [`ResearchCatalog`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Property key holding the ground-vehicle carrying capacity.
pub const VEHICLES_PROPERTY: &str = "vehicles";

/// Property key holding the firepower one unit contributes to its fleet.
pub const DAMAGE_PROPERTY: &str = "damage";

/// Unique identifier for a research blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResearchId(pub String);

impl ResearchId {
    /// Create a new research ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResearchId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Top-level grouping of research categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MainCategory {
    /// Hulls of every size.
    Spaceships,
    /// Hyperdrives, shields, radars, vehicle bays.
    Equipment,
    /// Ship weapons and ground units.
    Weapons,
}

/// Research sub-category a blueprint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResearchCategory {
    /// Small craft, stocked in bulk.
    Fighters,
    /// Medium hulls with equipment slots.
    Cruisers,
    /// Capital hulls, usually carrying vehicle bays.
    Battleships,
    /// Slot equipment.
    Equipment,
    /// Slot weapons.
    Weapons,
    /// Main battle tanks.
    Tanks,
    /// Support ground vehicles.
    Vehicles,
}

impl ResearchCategory {
    /// The main category this sub-category belongs to.
    #[must_use]
    pub const fn main(self) -> MainCategory {
        match self {
            Self::Fighters | Self::Cruisers | Self::Battleships => MainCategory::Spaceships,
            Self::Equipment => MainCategory::Equipment,
            Self::Weapons | Self::Tanks | Self::Vehicles => MainCategory::Weapons,
        }
    }

    /// Whether units of this category are ground vehicles.
    #[must_use]
    pub const fn is_ground_vehicle(self) -> bool {
        matches!(self, Self::Tanks | Self::Vehicles)
    }
}

/// How a slot chooses its item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    /// Exactly one mandatory item, always mounted.
    Fixed {
        /// The mounted item.
        item: ResearchId,
    },
    /// Ranked compatible items; the best currently available one is mounted.
    Variable {
        /// Compatible items, weakest first.
        items: Vec<ResearchId>,
        /// Units mounted when the slot is filled.
        max: u32,
    },
}

/// An equipment mount on a ship blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    /// Slot identifier, unique within its blueprint.
    pub id: String,
    /// Fixed or variable item selection.
    pub kind: SlotKind,
}

impl EquipmentSlot {
    /// Create a fixed slot.
    #[must_use]
    pub fn fixed(id: impl Into<String>, item: impl Into<ResearchId>) -> Self {
        Self {
            id: id.into(),
            kind: SlotKind::Fixed { item: item.into() },
        }
    }

    /// Create a variable slot.
    #[must_use]
    pub fn variable(id: impl Into<String>, items: Vec<ResearchId>, max: u32) -> Self {
        Self {
            id: id.into(),
            kind: SlotKind::Variable { items, max },
        }
    }

    /// Whether the slot is fixed.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self.kind, SlotKind::Fixed { .. })
    }

    /// Candidate items in rank order, weakest first.
    #[must_use]
    pub fn items(&self) -> &[ResearchId] {
        match &self.kind {
            SlotKind::Fixed { item } => std::slice::from_ref(item),
            SlotKind::Variable { items, .. } => items,
        }
    }

    /// Units mounted in this slot when filled.
    #[must_use]
    pub const fn max(&self) -> u32 {
        match &self.kind {
            SlotKind::Fixed { .. } => 1,
            SlotKind::Variable { max, .. } => *max,
        }
    }
}

/// An immutable research blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchType {
    /// Unique identifier.
    pub id: ResearchId,
    /// Display name.
    pub name: String,
    /// Sub-category.
    pub category: ResearchCategory,
    /// Money cost to produce one unit.
    pub production_cost: i64,
    /// Named numeric properties such as `vehicles`.
    #[serde(default)]
    pub properties: BTreeMap<String, i32>,
    /// Equipment mounts, in blueprint order.
    #[serde(default)]
    pub slots: Vec<EquipmentSlot>,
}

impl ResearchType {
    /// Create a blueprint without properties or slots.
    #[must_use]
    pub fn new(
        id: impl Into<ResearchId>,
        name: impl Into<String>,
        category: ResearchCategory,
        production_cost: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            production_cost,
            properties: BTreeMap::new(),
            slots: Vec::new(),
        }
    }

    /// Add a numeric property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: i32) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Add an equipment slot.
    #[must_use]
    pub fn with_slot(mut self, slot: EquipmentSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Whether the property is defined.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Numeric property value, if defined.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.properties.get(key).copied()
    }

    /// Ground-vehicle capacity contributed by this blueprint alone.
    #[must_use]
    pub fn vehicle_capacity(&self) -> u32 {
        self.get_int(VEHICLES_PROPERTY)
            .map_or(0, |v| u32::try_from(v).unwrap_or(0))
    }
}

/// Registry of every blueprint known to the game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchCatalog {
    research: BTreeMap<ResearchId, ResearchType>,
}

impl ResearchCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blueprint, replacing any previous one with the same id.
    pub fn register(&mut self, research: ResearchType) {
        self.research.insert(research.id.clone(), research);
    }

    /// Look up a blueprint.
    pub fn get(&self, id: &ResearchId) -> Result<&ResearchType> {
        self.research
            .get(id)
            .ok_or_else(|| PlannerError::UnknownResearch(id.clone()))
    }

    /// Whether the blueprint is registered.
    #[must_use]
    pub fn contains(&self, id: &ResearchId) -> bool {
        self.research.contains_key(id)
    }

    /// Iterate blueprints in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResearchType> {
        self.research.values()
    }

    /// Number of registered blueprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.research.len()
    }

    /// Whether no blueprints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.research.is_empty()
    }

    /// Check every slot of every blueprint against the catalog.
    ///
    /// Slot items must exist and must not be hulls; variable slots need at
    /// least one candidate and a positive `max`.
    pub fn validate(&self) -> Result<()> {
        for rt in self.research.values() {
            for slot in &rt.slots {
                if let SlotKind::Variable { items, max } = &slot.kind {
                    if items.is_empty() {
                        return Err(corrupt(&rt.id, format!("slot '{}' has no items", slot.id)));
                    }
                    if *max == 0 {
                        return Err(corrupt(&rt.id, format!("slot '{}' has max 0", slot.id)));
                    }
                }
                for item in slot.items() {
                    let equipment = self.get(item).map_err(|_| {
                        corrupt(
                            &rt.id,
                            format!("slot '{}' references unknown item '{item}'", slot.id),
                        )
                    })?;
                    if equipment.category.main() == MainCategory::Spaceships {
                        return Err(corrupt(
                            &rt.id,
                            format!("slot '{}' mounts hull '{item}'", slot.id),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn corrupt(id: &ResearchId, reason: String) -> PlannerError {
    PlannerError::CorruptBlueprint {
        id: id.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ResearchCatalog {
        let mut catalog = ResearchCatalog::new();
        catalog.register(ResearchType::new("Laser1", "Laser", ResearchCategory::Weapons, 500));
        catalog.register(ResearchType::new("Laser2", "Laser II", ResearchCategory::Weapons, 900));
        catalog.register(
            ResearchType::new("Cruiser1", "Cruiser", ResearchCategory::Cruisers, 20_000)
                .with_slot(EquipmentSlot::variable(
                    "guns",
                    vec!["Laser1".into(), "Laser2".into()],
                    4,
                )),
        );
        catalog
    }

    #[test]
    fn test_category_main_grouping() {
        assert_eq!(ResearchCategory::Cruisers.main(), MainCategory::Spaceships);
        assert_eq!(ResearchCategory::Tanks.main(), MainCategory::Weapons);
        assert_eq!(ResearchCategory::Equipment.main(), MainCategory::Equipment);
        assert!(ResearchCategory::Vehicles.is_ground_vehicle());
        assert!(!ResearchCategory::Weapons.is_ground_vehicle());
    }

    #[test]
    fn test_fixed_slot_has_single_item() {
        let slot = EquipmentSlot::fixed("bay", "Bay1");
        assert!(slot.is_fixed());
        assert_eq!(slot.items(), &[ResearchId::new("Bay1")]);
        assert_eq!(slot.max(), 1);
    }

    #[test]
    fn test_vehicle_capacity_property() {
        let ship = ResearchType::new("BS", "Battleship", ResearchCategory::Battleships, 1)
            .with_property(VEHICLES_PROPERTY, 8);
        assert!(ship.has(VEHICLES_PROPERTY));
        assert_eq!(ship.vehicle_capacity(), 8);

        let negative = ResearchType::new("X", "X", ResearchCategory::Battleships, 1)
            .with_property(VEHICLES_PROPERTY, -3);
        assert_eq!(negative.vehicle_capacity(), 0);
    }

    #[test]
    fn test_catalog_lookup_unknown_is_error() {
        let catalog = catalog();
        assert!(catalog.get(&"Cruiser1".into()).is_ok());
        assert!(matches!(
            catalog.get(&"Nope".into()),
            Err(PlannerError::UnknownResearch(_))
        ));
    }

    #[test]
    fn test_validate_accepts_consistent_catalog() {
        assert!(catalog().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_slot_item() {
        let mut catalog = catalog();
        catalog.register(
            ResearchType::new("Cruiser2", "Cruiser II", ResearchCategory::Cruisers, 30_000)
                .with_slot(EquipmentSlot::fixed("shield", "Shield9")),
        );
        assert!(matches!(
            catalog.validate(),
            Err(PlannerError::CorruptBlueprint { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_variable_slot() {
        let mut catalog = catalog();
        catalog.register(
            ResearchType::new("Cruiser3", "Cruiser III", ResearchCategory::Cruisers, 30_000)
                .with_slot(EquipmentSlot::variable("guns", Vec::new(), 2)),
        );
        assert!(catalog.validate().is_err());
    }
}
