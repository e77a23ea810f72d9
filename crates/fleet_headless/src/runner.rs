//! Tick loop for headless runs.
//!
//! Every tick runs three phases:
//!
//! 1. **Plan**: each faction gets a fresh snapshot and runs the planner
//!    schedule. Factions are independent, so this runs in parallel.
//! 2. **Commit**: each faction's queue is applied to its own economy and
//!    the outcomes are journaled in faction order.
//! 3. **Advance**: production and fleet movement move the world on.
//!
//! Results depend only on the scenario, never on thread scheduling.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fleet_core::command::ActionQueue;
use fleet_core::config::PlannerConfig;
use fleet_core::economy::{CommitOutcome, FactionEconomy};
use fleet_core::error::Result as PlannerResult;
use fleet_core::math::Fixed;
use fleet_core::offense::OffensePlanner;
use fleet_core::planner::PlannerSchedule;
use fleet_core::replay::CommandJournal;
use fleet_core::research::ResearchCatalog;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::metrics::RunMetrics;
use crate::scenario::{Scenario, ScenarioError, ScenarioState};
use crate::simulation::{self, StepReport};

/// Configuration for a headless run.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Override the scenario's tick count.
    pub ticks: Option<u64>,
    /// Write the command journal here when set.
    pub journal_path: Option<PathBuf>,
}

/// Result of a finished run.
#[derive(Debug)]
pub struct RunResult {
    /// Collected metrics.
    pub metrics: RunMetrics,
    /// Every command issued, with its commit result.
    pub journal: CommandJournal,
    /// Faction states after the last tick.
    pub factions: Vec<FactionEconomy>,
}

/// One faction's planning and commit output for a tick.
struct FactionPass {
    queue: ActionQueue,
    outcomes: Vec<CommitOutcome>,
    faults: usize,
    step: StepReport,
}

/// Runs a scenario to completion.
pub struct HeadlessRunner {
    name: String,
    catalog: Arc<ResearchCatalog>,
    planner_config: PlannerConfig,
    schedule: PlannerSchedule,
    factions: Vec<FactionEconomy>,
    ticks: u64,
    fleet_speed: Fixed,
    journal_path: Option<PathBuf>,
}

impl std::fmt::Debug for HeadlessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessRunner")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("factions", &self.factions.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl HeadlessRunner {
    /// Prepare a run from a scenario.
    pub fn new(scenario: &Scenario, config: HeadlessConfig) -> Result<Self, ScenarioError> {
        let ScenarioState {
            catalog,
            config: planner_config,
            factions,
        } = scenario.build()?;
        let schedule =
            PlannerSchedule::new().with_planner(OffensePlanner::new(planner_config.clone()));

        Ok(Self {
            name: scenario.name.clone(),
            catalog: Arc::new(catalog),
            planner_config,
            schedule,
            factions,
            ticks: config.ticks.unwrap_or(scenario.ticks),
            fleet_speed: Fixed::from_num(scenario.fleet_speed.max(1)),
            journal_path: config.journal_path,
        })
    }

    /// Run every tick and collect the results.
    pub fn run(mut self) -> PlannerResult<RunResult> {
        let start = Instant::now();
        let mut journal = CommandJournal::new(&self.name, &self.factions)?;
        let mut metrics = RunMetrics::new(&self.name);

        info!(
            scenario = %self.name,
            factions = self.factions.len(),
            ticks = self.ticks,
            "Starting headless run"
        );

        for tick in 0..self.ticks {
            let passes = self.run_tick();
            for (economy, pass) in self.factions.iter().zip(&passes) {
                journal.record_pass(tick, &economy.faction, pass.queue.iter(), &pass.outcomes);
                metrics.record_outcomes(tick, &economy.faction, &pass.outcomes);
                metrics.record_faults(&economy.faction, pass.faults);
                metrics.record_step(&economy.faction, &pass.step);
            }
            if tick % 50 == 0 {
                debug!(tick, hash = combined_hash(&self.factions), "Progress");
            }
        }

        let final_hash = combined_hash(&self.factions);
        journal.finalize(self.ticks, final_hash);
        metrics.finalize(self.ticks, &self.factions, final_hash);

        if let Some(path) = &self.journal_path {
            journal.save(path)?;
            info!(path = %path.display(), entries = journal.entries.len(), "Journal saved");
        }

        info!(
            scenario = %self.name,
            duration_ms = start.elapsed().as_millis() as u64,
            final_hash,
            rejected = journal.rejected_count(),
            "Headless run complete"
        );

        Ok(RunResult {
            metrics,
            journal,
            factions: self.factions,
        })
    }

    fn run_tick(&mut self) -> Vec<FactionPass> {
        let catalog = &self.catalog;
        let config = &self.planner_config;
        let schedule = &self.schedule;
        let speed = self.fleet_speed;

        self.factions
            .par_iter_mut()
            .map(|economy| {
                let (queue, faults) = match economy.snapshot(Arc::clone(catalog)) {
                    Ok(world) => {
                        let pass = schedule.run(&world);
                        (pass.queue, pass.faults.len())
                    }
                    Err(e) => {
                        error!(faction = %economy.faction, "snapshot failed: {e}");
                        (ActionQueue::new(), 1)
                    }
                };
                let outcomes = economy.execute(catalog, config, queue.iter());
                let rejected = outcomes.iter().filter(|o| !o.is_applied()).count();
                if rejected > 0 {
                    warn!(faction = %economy.faction, rejected, "commands rejected at commit");
                }
                let step = simulation::step(economy, catalog, speed);
                FactionPass {
                    queue,
                    outcomes,
                    faults,
                    step,
                }
            })
            .collect()
    }
}

/// Hash of every faction state, in scenario order.
#[must_use]
pub fn combined_hash(factions: &[FactionEconomy]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for economy in factions {
        economy.state_hash().hash(&mut hasher);
    }
    hasher.finish()
}

/// Run a scenario `runs` times and check that every run ends in the same
/// state.
pub fn verify_determinism(scenario: &Scenario, ticks: Option<u64>, runs: u32) -> Result<bool, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let runner = HeadlessRunner::new(
            scenario,
            HeadlessConfig {
                ticks,
                journal_path: None,
            },
        )?;
        let result = runner.run()?;
        debug!(run, hash = result.metrics.final_state_hash, "Verification run");
        hashes.push(result.metrics.final_state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
