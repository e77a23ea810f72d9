//! # Fleet Core
//!
//! Deterministic strategic fleet planner for computer-controlled factions.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond data and journal loading
//! - No randomness
//! - No floating-point math (uses fixed-point)
//!
//! Each tick the host builds an immutable [`snapshot::AiWorld`] per faction,
//! runs its [`planner::PlannerSchedule`], and commits the resulting
//! [`command::ActionQueue`] through [`economy::FactionEconomy::execute`].
//! Planning never mutates live state; commits re-validate every command.
//!
//! ## Crate Structure
//!
//! - [`research`] / [`data`] - Blueprints and their RON loader
//! - [`snapshot`] - Per-tick read-only view
//! - [`command`] - Deferred commands and the action queue
//! - [`planner`] - Decision policy contract and schedule
//! - [`offense`] - Fleet growth and refit policy
//! - [`gates`], [`equipment`], [`vehicles`], [`selection`] - Planning helpers
//! - [`economy`] - Live state and commit executor
//! - [`replay`] - Command journal

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod command;
pub mod config;
pub mod data;
pub mod economy;
pub mod equipment;
pub mod error;
pub mod gates;
pub mod math;
pub mod offense;
pub mod planner;
pub mod replay;
pub mod research;
pub mod selection;
pub mod snapshot;
pub mod vehicles;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::command::{ActionQueue, Command, Controls, CreateFleetCommand};
    pub use crate::config::PlannerConfig;
    pub use crate::economy::{
        CommitOutcome, EconomyEvent, FactionEconomy, Fleet, InventoryItem, Planet,
    };
    pub use crate::error::{PlannerError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::offense::OffensePlanner;
    pub use crate::planner::{Planner, PlannerSchedule, ScheduledPass};
    pub use crate::replay::CommandJournal;
    pub use crate::research::{ResearchCatalog, ResearchCategory, ResearchId, ResearchType};
    pub use crate::snapshot::{
        AiFleet, AiPlanet, AiWorld, Difficulty, Facility, FactionId, FleetId, FleetTask, PlanetId,
    };
    pub use crate::vehicles::{DefaultVehiclePlanner, VehiclePlan, VehiclePlanner};
}
