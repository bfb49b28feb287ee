//! Encounter planning: how many hostiles a room gets on first entry and
//! where they appear.

use bevy::math::Vec2;

use crate::engine::config::EncounterConfig;
use crate::room::{HostileId, RoomNode, RoomRole};

#[derive(Debug, Clone)]
pub struct EncounterPlan {
    config: EncounterConfig,
}

impl EncounterPlan {
    pub fn new(config: EncounterConfig) -> Self {
        Self { config }
    }

    /// Hostile count for `room`, capped by the number of spawn points.
    /// The spawn room, shops and secrets are always peaceful.
    pub fn hostiles_for(&self, room: &RoomNode) -> usize {
        if room.distance_from_spawn == 0 {
            return 0;
        }
        let wanted = match room.role {
            RoomRole::Regular => self.config.regular_hostiles,
            RoomRole::Boss => self.config.boss_hostiles,
            RoomRole::Shop | RoomRole::Secret => 0,
        };
        (wanted as usize).min(self.config.spawn_offsets.len())
    }

    /// World positions for `count` hostiles around `center`.
    pub fn spawn_positions(&self, center: Vec2, count: usize) -> Vec<Vec2> {
        self.config
            .spawn_offsets
            .iter()
            .take(count)
            .map(|(x, y)| center + Vec2::new(*x, *y))
            .collect()
    }
}

/// Monotonic hostile id source, one per session.
#[derive(Debug, Clone, Default)]
pub struct HostileIds {
    next: u64,
}

impl HostileIds {
    pub fn allocate(&mut self) -> HostileId {
        let id = HostileId(self.next);
        self.next += 1;
        id
    }
}
