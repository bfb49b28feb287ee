//! Per-room runtime state.
//!
//! A [`RoomNode`] owns its identity (cell, role, spawn distance), its fixed
//! door mask, and the set of hostiles currently alive inside it. The room is
//! Sealed exactly while that set is non-empty. Side effects of sealing
//! (walls, trigger arming) are applied by the session from the returned
//! [`SealChange`]; the room itself only tracks state.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::{DoorMask, GridCell};

/// Distance value for a room the spawn BFS never reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Special-purpose category of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomRole {
    #[default]
    Regular,
    Boss,
    Shop,
    Secret,
}

impl RoomRole {
    /// Single-character glyph for map dumps.
    pub fn glyph(&self) -> char {
        match self {
            RoomRole::Regular => '#',
            RoomRole::Boss => 'B',
            RoomRole::Shop => '$',
            RoomRole::Secret => '?',
        }
    }
}

/// Identity of a live hostile actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostileId(pub u64);

impl fmt::Display for HostileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hostile#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SealState {
    #[default]
    Unsealed,
    Sealed,
}

/// A seal state edge produced by a hostile registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealChange {
    Sealed,
    Unsealed,
}

#[derive(Debug, Clone)]
pub struct RoomNode {
    position: GridCell,
    pub role: RoomRole,
    pub distance_from_spawn: u32,
    doors: Option<DoorMask>,
    hostiles: HashSet<HostileId>,
    state: SealState,
    cleared_once: bool,
    encounter_spawned: bool,
}

impl RoomNode {
    pub fn new(position: GridCell) -> Self {
        Self {
            position,
            role: RoomRole::Regular,
            distance_from_spawn: UNREACHABLE,
            doors: None,
            hostiles: HashSet::new(),
            state: SealState::Unsealed,
            cleared_once: false,
            encounter_spawned: false,
        }
    }

    pub fn position(&self) -> GridCell {
        self.position
    }

    /// One-time door initialization from adjacency.
    ///
    /// Repeating the call with the same mask is a no-op. A different mask
    /// after initialization is a generator defect.
    pub fn set_door_mask(&mut self, mask: DoorMask) {
        match self.doors {
            None => self.doors = Some(mask),
            Some(existing) if existing == mask => {}
            Some(existing) => {
                debug_assert!(
                    false,
                    "door mask of {} changed from {} to {}",
                    self.position, existing, mask
                );
                tracing::warn!(
                    room = %self.position,
                    %existing,
                    rejected = %mask,
                    "ignoring door mask change after initialization"
                );
            }
        }
    }

    /// Doors present, independent of seal state.
    pub fn doors(&self) -> DoorMask {
        self.doors.unwrap_or(DoorMask::NONE)
    }

    /// Doorways that currently behave as doors: none while Sealed.
    pub fn open_doors(&self) -> DoorMask {
        match self.state {
            SealState::Sealed => DoorMask::NONE,
            SealState::Unsealed => self.doors(),
        }
    }

    pub fn register_hostile(&mut self, id: HostileId) -> Option<SealChange> {
        if !self.hostiles.insert(id) {
            return None;
        }
        if self.state == SealState::Unsealed {
            self.state = SealState::Sealed;
            return Some(SealChange::Sealed);
        }
        None
    }

    pub fn unregister_hostile(&mut self, id: HostileId) -> Option<SealChange> {
        if !self.hostiles.remove(&id) {
            return None;
        }
        if self.hostiles.is_empty() && self.state == SealState::Sealed {
            self.state = SealState::Unsealed;
            self.cleared_once = true;
            return Some(SealChange::Unsealed);
        }
        None
    }

    /// No hostiles alive in the room.
    pub fn is_cleared(&self) -> bool {
        self.hostiles.is_empty()
    }

    /// The room has been sealed and then fully cleared at least once.
    pub fn was_ever_cleared(&self) -> bool {
        self.cleared_once
    }

    pub fn is_sealed(&self) -> bool {
        self.state == SealState::Sealed
    }

    pub fn seal_state(&self) -> SealState {
        self.state
    }

    pub fn hostile_count(&self) -> usize {
        self.hostiles.len()
    }

    pub fn has_hostile(&self, id: HostileId) -> bool {
        self.hostiles.contains(&id)
    }

    pub fn encounter_spawned(&self) -> bool {
        self.encounter_spawned
    }

    pub(crate) fn mark_encounter_spawned(&mut self) {
        self.encounter_spawned = true;
    }
}
