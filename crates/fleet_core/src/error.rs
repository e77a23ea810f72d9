//! Error types for fleet planning.
//!
//! Expected infeasibility (nothing to do this tick) is never an error: the
//! planner simply leaves the queue empty. Errors here are reserved for data
//! that should never have reached the planner, and for the commit executor
//! when a command names something that no longer exists.

use thiserror::Error;

use crate::research::ResearchId;
use crate::snapshot::{FleetId, PlanetId};

/// Result type alias using [`PlannerError`].
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Top-level error type for the planning core.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// A research id was referenced that the catalog does not define.
    #[error("Unknown research: {0}")]
    UnknownResearch(ResearchId),

    /// Blueprint data violates a structural invariant.
    #[error("Corrupt blueprint '{id}': {reason}")]
    CorruptBlueprint {
        /// Blueprint that failed validation.
        id: ResearchId,
        /// What is wrong with it.
        reason: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Fleet not present in live state.
    #[error("Fleet not found: {0}")]
    FleetNotFound(FleetId),

    /// Planet not present in live state.
    #[error("Planet not found: {0}")]
    PlanetNotFound(PlanetId),

    /// Inventory no longer holds what a command needs.
    #[error("Insufficient inventory: need {required} of {research}, have {available}")]
    InsufficientInventory {
        /// Research type being transferred.
        research: ResearchId,
        /// Units required.
        required: u32,
        /// Units available.
        available: u32,
    },

    /// Treasury cannot cover a purchase.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Money required.
        required: i64,
        /// Money available.
        available: i64,
    },

    /// Invalid planner or economy state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
