//! Determinism testing utilities.
//!
//! Provides a harness for verifying that planning passes and commit runs
//! produce identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A planner must decide the same way for the same snapshot, whichever
//! thread or process runs it. Sources of non-determinism include:
//!
//! - **Floating-point math**: positions use fixed-point arithmetic via
//!   [`fleet_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Planning state uses `BTreeMap`/`BTreeSet` and ordered `Vec`s only.
//!
//! - **Tie-breaks**: every ranking helper resolves ties by snapshot order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual helpers (selection, gates, equipment)
//! 2. **Property tests**: random snapshots still plan deterministically
//! 3. **Integration tests**: multi-tick runs reach the same state hash
//! 4. **Parallel tests**: N threads planning the same snapshot all agree

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use fleet_core::command::ActionQueue;
use fleet_core::planner::{run_pass, Planner};
use fleet_core::snapshot::AiWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps run.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            ticks,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Run is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the process
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use fleet_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     20, // 20 ticks each
///     || stocked_economy("ai"),
///     |economy| { plan_and_commit(economy); },
///     |economy| economy.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, ticks)
}

/// Hash of a queue's bincode encoding.
///
/// Two queues hash equal exactly when they hold the same commands in the
/// same order. A failed pass hashes as zero.
#[must_use]
pub fn queue_hash(queue: &ActionQueue) -> u64 {
    bincode::serialize(queue).map_or(0, |bytes| compute_hash(&bytes))
}

fn pass_hash(planner: &dyn Planner, world: &AiWorld) -> u64 {
    run_pass(planner, world).map_or(0, |queue| queue_hash(&queue))
}

/// Plan the same snapshot `runs` times and compare the queues.
#[must_use]
pub fn verify_planner_determinism(
    planner: &dyn Planner,
    world: &AiWorld,
    runs: usize,
) -> DeterminismResult {
    let hashes = (0..runs).map(|_| pass_hash(planner, world)).collect();
    DeterminismResult::from_hashes(hashes, 1)
}

/// Plan the same snapshot on `threads` scoped threads and compare the
/// queues.
///
/// Catches planners that depend on anything outside the snapshot, such as
/// thread-local state or hash-map iteration order.
///
/// # Panics
///
/// Panics if a planning thread panics.
#[must_use]
pub fn run_parallel_passes<P>(planner: &P, world: &AiWorld, threads: usize) -> DeterminismResult
where
    P: Planner,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| pass_hash(planner, world)))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("planning thread panicked"))
            .collect()
    });

    DeterminismResult::from_hashes(hashes, 1)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for planner inputs.
///
/// These strategies generate random but reproducible snapshots for
/// property-based testing of planner rules.
pub mod strategies {
    use proptest::prelude::*;

    use fleet_core::math::{Fixed, Vec2Fixed};
    use fleet_core::snapshot::{AiFleet, Difficulty, FleetId, FleetTask};

    /// Generate a fixed-point number in a reasonable range for positions.
    ///
    /// Range: -10000 to 10000 (typical map size)
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-10000i32..10000i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point 2D vector for positions.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate any difficulty.
    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Normal),
            Just(Difficulty::Hard),
        ]
    }

    /// Generate any fleet task.
    pub fn arb_fleet_task() -> impl Strategy<Value = FleetTask> {
        prop_oneof![
            Just(FleetTask::Script),
            Just(FleetTask::Forced),
            Just(FleetTask::Attack),
            Just(FleetTask::Colonize),
            Just(FleetTask::Defend),
            Just(FleetTask::Upgrade),
            Just(FleetTask::Move),
            Just(FleetTask::Patrol),
            Just(FleetTask::Explore),
            Just(FleetTask::Idle),
        ]
    }

    /// Generate firepower values (0-500). The narrow range makes ties common.
    pub fn arb_firepower() -> impl Strategy<Value = i64> {
        0i64..500
    }

    /// Generate a list of stationary fleets with unique ids in list order.
    pub fn arb_fleet_list(max_fleets: usize) -> impl Strategy<Value = Vec<AiFleet>> {
        proptest::collection::vec(
            (arb_vec2_position(), arb_fleet_task(), arb_firepower()),
            1..max_fleets,
        )
        .prop_map(|parts| {
            parts
                .into_iter()
                .zip(1u32..)
                .map(|((position, task, firepower), id)| {
                    let mut fleet = AiFleet::new(FleetId(id), format!("Fleet {id}"), position);
                    fleet.task = task;
                    fleet.statistics.firepower = firepower;
                    fleet
                })
                .collect()
        })
    }

    /// Generate a storage count for one item (0-60).
    pub fn arb_stock() -> impl Strategy<Value = u32> {
        0u32..60
    }
}
