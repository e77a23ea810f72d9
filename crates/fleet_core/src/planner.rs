//! The per-tick decision contract shared by every planning policy.
//!
//! A [`Planner`] looks at one [`AiWorld`] and either queues nothing or queues
//! one logically atomic batch of commands, then returns. The order of checks
//! inside a policy is its priority order: once an earlier check commits, the
//! later ones wait for the next tick.
//!
//! Policies are independent values. A [`PlannerSchedule`] runs them in a
//! fixed order for one faction and is the fault boundary: a policy that
//! fails has its queue discarded and the remaining policies still run.

use tracing::{debug, error};

use crate::command::{ActionQueue, Controls};
use crate::error::Result;
use crate::snapshot::AiWorld;

/// A decision policy run once per tick per faction.
pub trait Planner: Send + Sync {
    /// Policy name for logs.
    fn name(&self) -> &'static str;

    /// Inspect the snapshot and queue at most one coherent decision.
    ///
    /// # Errors
    /// Only for data the snapshot should never contain, such as research
    /// ids missing from the catalog. Infeasibility is `Ok(())` with nothing
    /// queued.
    fn plan(&self, world: &AiWorld, controls: &mut dyn Controls) -> Result<()>;
}

/// Run one policy against a fresh queue.
///
/// The queue is dropped if the policy fails, so an abandoned pass never
/// leaks partial decisions.
pub fn run_pass(planner: &dyn Planner, world: &AiWorld) -> Result<ActionQueue> {
    let mut queue = ActionQueue::new();
    planner.plan(world, &mut queue)?;
    Ok(queue)
}

/// A policy failure caught at the schedule boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerFault {
    /// Policy that failed.
    pub planner: &'static str,
    /// Error description.
    pub message: String,
}

/// Output of running a schedule for one faction.
#[derive(Debug, Clone, Default)]
pub struct ScheduledPass {
    /// Commands from every successful policy, in schedule order.
    pub queue: ActionQueue,
    /// Policies that failed this tick.
    pub faults: Vec<PlannerFault>,
}

/// Ordered set of policies run for a faction each tick.
#[derive(Default)]
pub struct PlannerSchedule {
    planners: Vec<Box<dyn Planner>>,
}

impl std::fmt::Debug for PlannerSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.planners.iter().map(|p| p.name()))
            .finish()
    }
}

impl PlannerSchedule {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a policy.
    #[must_use]
    pub fn with_planner(mut self, planner: impl Planner + 'static) -> Self {
        self.planners.push(Box::new(planner));
        self
    }

    /// Number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.planners.len()
    }

    /// Whether the schedule has no policies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planners.is_empty()
    }

    /// Run every policy against the same snapshot.
    pub fn run(&self, world: &AiWorld) -> ScheduledPass {
        let mut pass = ScheduledPass::default();
        for planner in &self.planners {
            match run_pass(planner.as_ref(), world) {
                Ok(queue) => {
                    debug!(
                        faction = %world.faction,
                        planner = planner.name(),
                        commands = queue.len(),
                        "planner pass complete"
                    );
                    pass.queue.extend(queue);
                }
                Err(e) => {
                    error!(
                        faction = %world.faction,
                        planner = planner.name(),
                        "planner pass failed: {e}"
                    );
                    pass.faults.push(PlannerFault {
                        planner: planner.name(),
                        message: e.to_string(),
                    });
                }
            }
        }
        pass
    }
}
