//! Inbound events raised by collaborators outside the core.

use serde::{Deserialize, Serialize};

use crate::graph::TriggerId;
use crate::grid::GridCell;
use crate::room::{HostileId, SealChange};
use crate::session::TransitionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DungeonEvent {
    /// The player walked into a door trigger volume.
    DoorCrossed { trigger: TriggerId, target: GridCell },
    HostileSpawned { room: GridCell, hostile: HostileId },
    HostileDefeated { room: GridCell, hostile: HostileId },
    /// The player entered a room's interior volume (not a door).
    RoomBoundaryEntered { room: GridCell },
}

/// What the session did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Transition(TransitionRequest),
    Seal(Option<SealChange>),
    /// Whether the current room changed.
    Entered(bool),
}
