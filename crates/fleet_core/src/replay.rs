//! Command journal for recording and auditing planner decisions.
//!
//! A journal stores the initial faction states and every command the
//! planners issued, tick by tick, together with whether the commit executor
//! accepted it. Saved journals let a run be inspected or compared against a
//! later run of the same scenario.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::Command;
use crate::economy::{CommitOutcome, FactionEconomy};
use crate::error::{PlannerError, Result};
use crate::snapshot::FactionId;

/// Journal file format version for compatibility.
pub const JOURNAL_VERSION: u32 = 1;

/// One committed (or rejected) command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Tick the command was planned in.
    pub tick: u64,
    /// Faction that issued it.
    pub faction: FactionId,
    /// The command.
    pub command: Command,
    /// Whether the commit executor applied it.
    pub applied: bool,
}

/// Complete journal of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandJournal {
    /// Journal format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Serialized initial faction states.
    pub initial_state: Vec<u8>,
    /// Commands in the order they were committed.
    pub entries: Vec<JournalEntry>,
    /// Last tick that ran.
    pub final_tick: u64,
    /// Combined state hash after the last tick.
    pub final_hash: u64,
}

impl CommandJournal {
    /// Start a journal from the initial faction states.
    ///
    /// # Errors
    /// If the states cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, initial: &[FactionEconomy]) -> Result<Self> {
        let initial_state = bincode::serialize(initial).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to serialize initial state: {e}"))
        })?;
        Ok(Self {
            version: JOURNAL_VERSION,
            scenario_id: scenario_id.into(),
            initial_state,
            entries: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        })
    }

    /// Record one command.
    pub fn record(&mut self, tick: u64, faction: FactionId, command: Command, applied: bool) {
        self.entries.push(JournalEntry {
            tick,
            faction,
            command,
            applied,
        });
    }

    /// Record a committed queue alongside its outcomes.
    ///
    /// Commands and outcomes are paired in order.
    pub fn record_pass<'q>(
        &mut self,
        tick: u64,
        faction: &FactionId,
        commands: impl IntoIterator<Item = &'q Command>,
        outcomes: &[CommitOutcome],
    ) {
        for (command, outcome) in commands.into_iter().zip(outcomes) {
            self.record(tick, faction.clone(), command.clone(), outcome.is_applied());
        }
    }

    /// Finalize the journal with end-of-run state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Deserialize the initial faction states.
    ///
    /// # Errors
    /// If the stored bytes are corrupt.
    pub fn restore_initial_state(&self) -> Result<Vec<FactionEconomy>> {
        bincode::deserialize(&self.initial_state).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to deserialize initial state: {e}"))
        })
    }

    /// Entries recorded during a tick.
    #[must_use]
    pub fn entries_at_tick(&self, tick: u64) -> Vec<&JournalEntry> {
        self.entries.iter().filter(|e| e.tick == tick).collect()
    }

    /// Entries for one faction.
    pub fn entries_for<'a>(&'a self, faction: &'a FactionId) -> impl Iterator<Item = &'a JournalEntry> {
        self.entries.iter().filter(move |e| &e.faction == faction)
    }

    /// Number of commands the executor rejected.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.applied).count()
    }

    /// Save the journal to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to serialize journal: {e}"))
        })?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to write journal file: {e}"))
        })?;
        Ok(())
    }

    /// Load a journal from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version
    /// check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to read journal file: {e}"))
        })?;
        let journal: Self = bincode::deserialize(&bytes).map_err(|e| {
            PlannerError::InvalidState(format!("Failed to deserialize journal: {e}"))
        })?;

        if journal.version != JOURNAL_VERSION {
            return Err(PlannerError::InvalidState(format!(
                "Journal version mismatch: expected {JOURNAL_VERSION}, got {}",
                journal.version
            )));
        }

        Ok(journal)
    }
}
