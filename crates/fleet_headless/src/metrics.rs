//! Run metrics collection.
//!
//! Counts what each faction's planners achieved over a run so that balance
//! and regression checks can compare runs without reading logs.

use std::collections::BTreeMap;
use std::path::Path;

use fleet_core::economy::{CommitOutcome, EconomyEvent, FactionEconomy};
use fleet_core::snapshot::FactionId;
use serde::{Deserialize, Serialize};

use crate::simulation::StepReport;

/// Complete metrics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Ticks run.
    pub ticks: u64,
    /// Per-faction metrics, keyed by faction id.
    pub factions: BTreeMap<String, FactionMetrics>,
    /// Combined state hash after the last tick (for determinism validation).
    pub final_state_hash: u64,
}

impl RunMetrics {
    /// Create an empty metrics record.
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Get or create faction metrics.
    pub fn faction_mut(&mut self, faction: &FactionId) -> &mut FactionMetrics {
        self.factions
            .entry(faction.0.clone())
            .or_insert_with(|| FactionMetrics::new(&faction.0))
    }

    /// Record the outcomes of one committed queue.
    pub fn record_outcomes(&mut self, tick: u64, faction: &FactionId, outcomes: &[CommitOutcome]) {
        let metrics = self.faction_mut(faction);
        for outcome in outcomes {
            match outcome {
                CommitOutcome::Applied(event) => metrics.record_event(tick, event),
                CommitOutcome::Aborted { .. } => metrics.commit_failures += 1,
            }
        }
    }

    /// Record planner faults caught at the schedule boundary.
    pub fn record_faults(&mut self, faction: &FactionId, faults: usize) {
        self.faction_mut(faction).planner_faults += faults as u32;
    }

    /// Record a world step.
    pub fn record_step(&mut self, faction: &FactionId, step: &StepReport) {
        let metrics = self.faction_mut(faction);
        for research in &step.produced {
            *metrics.units_produced.entry(research.to_string()).or_insert(0) += 1;
        }
        metrics.production_spent += step.spent;
        metrics.fleet_arrivals += step.arrivals.len() as u32;
    }

    /// Finalize the run with end-of-run state.
    pub fn finalize(&mut self, ticks: u64, factions: &[FactionEconomy], state_hash: u64) {
        self.ticks = ticks;
        self.final_state_hash = state_hash;
        for economy in factions {
            let metrics = self.faction_mut(&economy.faction);
            metrics.final_money = economy.money;
            metrics.final_fleets = economy.fleets.len() as u32;
        }
    }

    /// Save metrics to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load metrics from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Metrics for a single faction in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Faction identifier.
    pub faction_id: String,

    // === Planner decisions ===
    /// New fleets assembled.
    pub fleets_deployed: u32,
    /// Fleets sold after a refit trip.
    pub fleets_decommissioned: u32,
    /// Fleets sent somewhere.
    pub fleets_dispatched: u32,
    /// Production orders accepted.
    pub production_orders: u32,
    /// Facilities built, by kind.
    pub facilities_built: BTreeMap<String, u32>,
    /// Commands the commit executor rejected.
    pub commit_failures: u32,
    /// Planner passes that failed outright.
    pub planner_faults: u32,

    // === Economy ===
    /// Units produced by research.
    pub units_produced: BTreeMap<String, u32>,
    /// Money spent on production.
    pub production_spent: i64,
    /// Money earned from decommissioning.
    pub resale_income: i64,
    /// Fleets that reached their destination.
    pub fleet_arrivals: u32,

    // === Timing ===
    /// Tick of the first deployment.
    pub first_deploy_tick: Option<u64>,

    // === Final state ===
    /// Treasury at the end of the run.
    pub final_money: i64,
    /// Fleets at the end of the run.
    pub final_fleets: u32,
}

impl FactionMetrics {
    /// Create empty metrics for a faction.
    #[must_use]
    pub fn new(faction_id: impl Into<String>) -> Self {
        Self {
            faction_id: faction_id.into(),
            ..Default::default()
        }
    }

    fn record_event(&mut self, tick: u64, event: &EconomyEvent) {
        match event {
            EconomyEvent::FleetDeployed { .. } => {
                self.fleets_deployed += 1;
                self.first_deploy_tick.get_or_insert(tick);
            }
            EconomyEvent::FleetDispatched { .. } => self.fleets_dispatched += 1,
            EconomyEvent::ProductionQueued { .. } => self.production_orders += 1,
            EconomyEvent::FacilityBuilt { facility, .. } => {
                *self
                    .facilities_built
                    .entry(format!("{facility:?}"))
                    .or_insert(0) += 1;
            }
            EconomyEvent::FleetDecommissioned { proceeds, .. } => {
                self.fleets_decommissioned += 1;
                self.resale_income += proceeds;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::error::PlannerError;
    use fleet_core::research::ResearchId;
    use fleet_core::snapshot::{Facility, FleetId, PlanetId};

    #[test]
    fn test_outcomes_are_counted() {
        let faction = FactionId::new("garthog");
        let mut metrics = RunMetrics::new("skirmish");
        metrics.record_outcomes(
            4,
            &faction,
            &[
                CommitOutcome::Applied(EconomyEvent::ProductionQueued {
                    research: ResearchId::new("F1"),
                    batch: 10,
                }),
                CommitOutcome::Applied(EconomyEvent::FacilityBuilt {
                    facility: Facility::MilitarySpaceport,
                    planet: PlanetId(1),
                    cost: 40_000,
                }),
                CommitOutcome::Aborted {
                    command: "create_fleet",
                    error: PlannerError::InvalidState("gone".to_string()),
                },
            ],
        );
        metrics.record_outcomes(
            9,
            &faction,
            &[CommitOutcome::Applied(EconomyEvent::FleetDeployed {
                fleet: FleetId(0),
                planet: PlanetId(1),
                units: 40,
            })],
        );

        let garthog = &metrics.factions["garthog"];
        assert_eq!(garthog.production_orders, 1);
        assert_eq!(garthog.facilities_built["MilitarySpaceport"], 1);
        assert_eq!(garthog.commit_failures, 1);
        assert_eq!(garthog.fleets_deployed, 1);
        assert_eq!(garthog.first_deploy_tick, Some(9));
    }

    #[test]
    fn test_metrics_save_load() {
        let mut metrics = RunMetrics::new("skirmish");
        metrics.faction_mut(&FactionId::new("morgath")).production_spent = 12_000;
        metrics.final_state_hash = 42;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        metrics.save(&path).unwrap();

        let loaded = RunMetrics::load(&path).unwrap();
        assert_eq!(loaded.final_state_hash, 42);
        assert_eq!(loaded.factions["morgath"].production_spent, 12_000);
    }
}
