//! Deferred commands issued by planners.
//!
//! A planning pass never touches live state. It records [`Command`] values
//! in an [`ActionQueue`]; the simulation applies them afterwards, in
//! submission order, re-validating each one against the live economy.
//! Commands carry only identifiers and snapshot-derived values, never
//! references into live state.

use serde::{Deserialize, Serialize};

use crate::research::ResearchId;
use crate::snapshot::{Facility, FleetId, FleetTask, PlanetId};
use crate::vehicles::VehiclePlan;

/// Everything needed to assemble a new fleet at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFleetCommand {
    /// Name of the new fleet.
    pub name: String,
    /// Spaceport planet where the fleet is assembled.
    pub planet: PlanetId,
    /// One entry per battleship hull.
    pub battleships: Vec<ResearchId>,
    /// One entry per cruiser hull.
    pub cruisers: Vec<ResearchId>,
    /// Fighter allotment per type.
    pub fighters: Vec<(ResearchId, u32)>,
    /// Ground-vehicle loadout.
    pub vehicles: VehiclePlan,
}

/// A unit of delayed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Assemble a new fleet from faction storage.
    CreateFleet(CreateFleetCommand),
    /// Send a fleet to a planet, optionally reassigning its task.
    MoveFleet {
        /// Fleet to move.
        fleet: FleetId,
        /// Destination.
        planet: PlanetId,
        /// New task, if any.
        task: Option<FleetTask>,
    },
    /// Queue production of a blueprint.
    StartProduction {
        /// Blueprint to produce.
        research: ResearchId,
        /// Units to produce.
        batch: u32,
    },
    /// Build a facility on a planet.
    BuildFacility {
        /// Facility kind.
        facility: Facility,
        /// Construction site.
        planet: PlanetId,
    },
    /// Strip a fleet's equipment back to storage and sell its hulls.
    DecommissionFleet {
        /// Fleet to decommission.
        fleet: FleetId,
    },
}

impl Command {
    /// Short label for logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateFleet(_) => "create_fleet",
            Self::MoveFleet { .. } => "move_fleet",
            Self::StartProduction { .. } => "start_production",
            Self::BuildFacility { .. } => "build_facility",
            Self::DecommissionFleet { .. } => "decommission_fleet",
        }
    }
}

/// Command-issuing interface handed to planners.
///
/// Implementors only need [`Controls::submit`]; the named helpers build the
/// matching [`Command`].
pub trait Controls {
    /// Record a command for later execution.
    fn submit(&mut self, command: Command);

    /// Assemble a new fleet.
    fn create_fleet(&mut self, command: CreateFleetCommand) {
        self.submit(Command::CreateFleet(command));
    }

    /// Move a fleet, optionally reassigning its task.
    fn move_fleet(&mut self, fleet: FleetId, planet: PlanetId, task: Option<FleetTask>) {
        self.submit(Command::MoveFleet {
            fleet,
            planet,
            task,
        });
    }

    /// Queue production.
    fn start_production(&mut self, research: ResearchId, batch: u32) {
        self.submit(Command::StartProduction { research, batch });
    }

    /// Build a facility.
    fn build_facility(&mut self, facility: Facility, planet: PlanetId) {
        self.submit(Command::BuildFacility { facility, planet });
    }

    /// Decommission a fleet.
    fn decommission_fleet(&mut self, fleet: FleetId) {
        self.submit(Command::DecommissionFleet { fleet });
    }
}

/// Ordered commands accumulated during one planning pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    actions: Vec<Command>,
}

impl ActionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing was queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Queued commands in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.actions.iter()
    }

    /// Append every command of another queue.
    pub fn extend(&mut self, other: ActionQueue) {
        self.actions.extend(other.actions);
    }
}

impl Controls for ActionQueue {
    fn submit(&mut self, command: Command) {
        self.actions.push(command);
    }
}

impl IntoIterator for ActionQueue {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl<'a> IntoIterator for &'a ActionQueue {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
