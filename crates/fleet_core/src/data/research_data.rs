//! Raw research data as authored in RON files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::research::{EquipmentSlot, ResearchCategory, ResearchId, ResearchType};

/// Raw equipment slot definition.
///
/// The file format keeps the flat `fixed` flag and item list; conversion
/// into [`EquipmentSlot`] rejects fixed slots that do not list exactly one
/// item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotData {
    /// Slot identifier.
    pub id: String,
    /// Compatible items, weakest first.
    pub items: Vec<String>,
    /// Whether the slot holds a single mandatory item.
    #[serde(default)]
    pub fixed: bool,
    /// Units mounted when filled.
    #[serde(default = "default_slot_max")]
    pub max: u32,
}

fn default_slot_max() -> u32 {
    1
}

/// Data-driven research definition.
///
/// # Example RON
///
/// ```ron
/// ResearchData(
///     id: "Destroyer",
///     name: "Destroyer",
///     category: Cruisers,
///     production_cost: 24000,
///     properties: {},
///     slots: [
///         SlotData(id: "guns", items: ["Laser1", "Laser2"], max: 4),
///         SlotData(id: "drive", items: ["Hyperdrive1"], fixed: true),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Research sub-category.
    pub category: ResearchCategory,
    /// Money cost per unit.
    pub production_cost: i64,
    /// Named numeric properties.
    #[serde(default)]
    pub properties: BTreeMap<String, i32>,
    /// Equipment slots.
    #[serde(default)]
    pub slots: Vec<SlotData>,
}

impl ResearchData {
    /// Convert into a validated blueprint.
    pub fn into_research(self) -> Result<ResearchType> {
        let id = ResearchId::new(self.id);
        if self.production_cost < 0 {
            return Err(PlannerError::CorruptBlueprint {
                id,
                reason: format!("negative production cost {}", self.production_cost),
            });
        }
        let mut slots = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            slots.push(slot.into_slot(&id)?);
        }
        Ok(ResearchType {
            id,
            name: self.name,
            category: self.category,
            production_cost: self.production_cost,
            properties: self.properties,
            slots,
        })
    }
}

impl SlotData {
    fn into_slot(self, owner: &ResearchId) -> Result<EquipmentSlot> {
        if self.fixed {
            let mut items = self.items;
            if items.len() != 1 {
                return Err(PlannerError::CorruptBlueprint {
                    id: owner.clone(),
                    reason: format!(
                        "fixed slot '{}' lists {} items, expected 1",
                        self.id,
                        items.len()
                    ),
                });
            }
            let item = items.remove(0);
            Ok(EquipmentSlot::fixed(self.id, ResearchId::new(item)))
        } else {
            let items = self.items.into_iter().map(ResearchId::new).collect();
            Ok(EquipmentSlot::variable(self.id, items, self.max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::SlotKind;

    fn cruiser(slots: Vec<SlotData>) -> ResearchData {
        ResearchData {
            id: "Destroyer".to_string(),
            name: "Destroyer".to_string(),
            category: ResearchCategory::Cruisers,
            production_cost: 24_000,
            properties: BTreeMap::new(),
            slots,
        }
    }

    #[test]
    fn test_fixed_slot_with_one_item_converts() {
        let rt = cruiser(vec![SlotData {
            id: "drive".to_string(),
            items: vec!["Hyperdrive1".to_string()],
            fixed: true,
            max: 1,
        }])
        .into_research()
        .expect("valid blueprint");
        assert_eq!(
            rt.slots[0].kind,
            SlotKind::Fixed {
                item: ResearchId::new("Hyperdrive1")
            }
        );
    }

    #[test]
    fn test_fixed_slot_with_two_items_is_corrupt() {
        let result = cruiser(vec![SlotData {
            id: "drive".to_string(),
            items: vec!["Hyperdrive1".to_string(), "Hyperdrive2".to_string()],
            fixed: true,
            max: 1,
        }])
        .into_research();
        assert!(matches!(result, Err(PlannerError::CorruptBlueprint { .. })));
    }

    #[test]
    fn test_negative_cost_is_corrupt() {
        let mut data = cruiser(Vec::new());
        data.production_cost = -1;
        assert!(data.into_research().is_err());
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"ResearchData(
            id: "Destroyer",
            name: "Destroyer",
            category: Cruisers,
            production_cost: 24000,
            slots: [
                SlotData(id: "guns", items: ["Laser1", "Laser2"], max: 4),
            ],
        )"#;
        let data: ResearchData = ron::from_str(ron).expect("parse");
        let rt = data.into_research().expect("valid");
        assert_eq!(rt.slots[0].max(), 4);
        assert_eq!(rt.slots[0].items().len(), 2);
    }
}
