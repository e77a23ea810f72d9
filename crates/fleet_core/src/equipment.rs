//! Equipment demand and vehicle capacity of ship blueprints.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::research::{EquipmentSlot, ResearchId, ResearchType, SlotKind, VEHICLES_PROPERTY};
use crate::snapshot::AiWorld;

/// The best currently available item of a slot.
///
/// Items are ranked weakest first, so this is the last unlocked entry.
/// Returns `None` when nothing in the slot has been researched yet.
#[must_use]
pub fn best_available<'a>(world: &AiWorld, slot: &'a EquipmentSlot) -> Option<&'a ResearchId> {
    slot.items().iter().rev().find(|item| world.is_available(item))
}

/// Total equipment and weapons needed to fully equip `ships`.
///
/// Every variable slot on every ship adds `slot.max` units of its best
/// available item. Fixed slots come with the hull and add nothing; slots
/// with no unlocked item are skipped rather than failing the whole count.
pub fn count_equipments<'a>(
    world: &AiWorld,
    ships: impl IntoIterator<Item = &'a ResearchType>,
) -> BTreeMap<ResearchId, u32> {
    let mut demand = BTreeMap::new();
    for ship in ships {
        for slot in &ship.slots {
            if slot.is_fixed() {
                continue;
            }
            if let Some(item) = best_available(world, slot) {
                *demand.entry(item.clone()).or_insert(0) += slot.max();
            }
        }
    }
    demand
}

/// Ground-vehicle capacity of a set of hulls.
///
/// Each hull contributes its own `vehicles` property plus one bay per slot:
/// the item of a fixed slot if it carries vehicles, or the last unlocked
/// vehicle-carrying item of a variable slot.
pub fn vehicle_capacity<'a>(
    world: &AiWorld,
    ships: impl IntoIterator<Item = &'a ResearchType>,
) -> Result<u32> {
    let mut capacity = 0;
    for ship in ships {
        capacity += ship.vehicle_capacity();
        for slot in &ship.slots {
            if let Some(bay) = vehicle_bay(world, slot)? {
                capacity += bay.vehicle_capacity();
            }
        }
    }
    Ok(capacity)
}

fn vehicle_bay<'w>(world: &'w AiWorld, slot: &EquipmentSlot) -> Result<Option<&'w ResearchType>> {
    match &slot.kind {
        SlotKind::Fixed { item } => {
            let rt = world.research(item)?;
            Ok(rt.has(VEHICLES_PROPERTY).then_some(rt))
        }
        SlotKind::Variable { items, .. } => {
            let mut bay = None;
            for item in items {
                let rt = world.research(item)?;
                if rt.has(VEHICLES_PROPERTY) && world.is_available(item) {
                    bay = Some(rt);
                }
            }
            Ok(bay)
        }
    }
}
