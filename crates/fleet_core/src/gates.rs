//! Early-exit production and infrastructure gates.
//!
//! A gate returns `true` when it issued an order, which tells the caller to
//! stop evaluating for this tick.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::command::Controls;
use crate::research::{ResearchId, ResearchType};
use crate::selection::facility_site;
use crate::snapshot::{AiWorld, Facility};

/// Order `batch` units of the first candidate stocked below `per_type`.
///
/// Candidates already in production are skipped. Returns `false` when every
/// candidate meets its target or is already queued.
pub fn check_production(
    world: &AiWorld,
    controls: &mut dyn Controls,
    candidates: &[&ResearchType],
    per_type: u32,
    batch: u32,
) -> bool {
    for rt in candidates {
        let stocked = world.inventory_count(&rt.id);
        if stocked < per_type && !world.is_in_production(&rt.id) {
            info!(
                faction = %world.faction,
                research = %rt.id,
                stocked,
                target = per_type,
                batch,
                "production order"
            );
            controls.start_production(rt.id.clone(), batch);
            return true;
        }
    }
    false
}

/// Order the shortfall of the first item stocked below its exact demand.
pub fn check_production_demand(
    world: &AiWorld,
    controls: &mut dyn Controls,
    demand: &BTreeMap<ResearchId, u32>,
) -> bool {
    for (id, &required) in demand {
        let stocked = world.inventory_count(id);
        if stocked < required && !world.is_in_production(id) {
            let shortfall = required - stocked;
            info!(
                faction = %world.faction,
                research = %id,
                stocked,
                required,
                "production order for shortfall"
            );
            controls.start_production(id.clone(), shortfall);
            return true;
        }
    }
    false
}

/// Whether every demanded item is in storage.
#[must_use]
pub fn demand_met(world: &AiWorld, demand: &BTreeMap<ResearchId, u32>) -> bool {
    demand
        .iter()
        .all(|(id, &required)| world.inventory_count(id) >= required)
}

/// Build a missing orbital factory if affordable.
pub fn check_orbital_factory(world: &AiWorld, controls: &mut dyn Controls, cost: i64) -> bool {
    check_facility(world, controls, Facility::OrbitalFactory, cost)
}

/// Build a missing military spaceport if affordable.
pub fn check_military_spaceport(world: &AiWorld, controls: &mut dyn Controls, cost: i64) -> bool {
    check_facility(world, controls, Facility::MilitarySpaceport, cost)
}

fn check_facility(
    world: &AiWorld,
    controls: &mut dyn Controls,
    facility: Facility,
    cost: i64,
) -> bool {
    if world.has_facility(facility) {
        return false;
    }
    if world.money < cost {
        debug!(faction = %world.faction, ?facility, cost, money = world.money, "cannot afford facility");
        return false;
    }
    let Some(site) = facility_site(world, facility) else {
        debug!(faction = %world.faction, ?facility, "no site for facility");
        return false;
    };
    info!(faction = %world.faction, ?facility, planet = %site.id, "construction order");
    controls.build_facility(facility, site.id);
    true
}
