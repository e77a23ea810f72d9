//! Headless fleet planner runner for testing and CI verification.
//!
//! This crate runs computer-controlled factions through a scenario without
//! a host game. Each tick every faction is snapshotted, planned and
//! committed, then a minimal world step advances production and fleet
//! movement. This enables:
//!
//! - **Planner testing**: watch fleets grow and refit over hundreds of ticks
//! - **CI verification**: automated checks of planner behaviour and determinism
//! - **Data validation**: catch corrupt blueprints before a game loads them
//!
//! # Output
//!
//! - **stdout**: the JSON run report
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a scenario and write the report
//! cargo run -p fleet_headless -- run --scenario scenarios/skirmish.ron --output report.json
//!
//! # Check a scenario's catalog and settings
//! cargo run -p fleet_headless -- validate --scenario scenarios/skirmish.ron
//!
//! # Verify determinism
//! cargo run -p fleet_headless -- verify --scenario scenarios/skirmish.ron --runs 5
//! ```

pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod simulation;

pub use metrics::{FactionMetrics, RunMetrics};
pub use runner::{combined_hash, verify_determinism, HeadlessConfig, HeadlessRunner, RunResult};
pub use scenario::{FactionSetup, Scenario, ScenarioError, ScenarioState};
pub use simulation::StepReport;
