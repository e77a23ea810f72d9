//! # Fleet Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Research catalog and faction economy fixtures
//! - Planner determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
