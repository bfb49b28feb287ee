//! Outbound interfaces to the systems the core drives but does not own:
//! minimap, player input, viewport, door trigger volumes, room visuals and
//! hostile spawning.
//!
//! Every collaborator is optional. A missing one is simply skipped; the
//! session's own state is never affected by which collaborators exist.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bevy::math::Vec2;

use crate::graph::{MinimapEntry, TriggerId};
use crate::grid::{DoorMask, GridCell};
use crate::room::HostileId;

pub trait MinimapBuilder: Send + Sync {
    fn build_map(&mut self, rooms: &[MinimapEntry]);
}

pub trait PlayerControl: Send + Sync {
    fn set_input_enabled(&mut self, enabled: bool);
    fn zero_velocity(&mut self);
}

pub trait Viewport: Send + Sync {
    fn set_position(&mut self, position: Vec2);
}

pub trait DoorTriggers: Send + Sync {
    fn set_enabled(&mut self, trigger: TriggerId, enabled: bool);
}

pub trait RoomView: Send + Sync {
    /// `open` doorways render as doors, every other side as wall.
    fn show_doors(&mut self, room: GridCell, open: DoorMask);
}

pub trait HostileSpawner: Send + Sync {
    fn spawn(&mut self, room: GridCell, hostile: HostileId, position: Vec2);
}

#[derive(Default)]
pub struct Collaborators {
    pub minimap: Option<Box<dyn MinimapBuilder>>,
    pub player: Option<Box<dyn PlayerControl>>,
    pub viewport: Option<Box<dyn Viewport>>,
    pub triggers: Option<Box<dyn DoorTriggers>>,
    pub room_view: Option<Box<dyn RoomView>>,
    pub spawner: Option<Box<dyn HostileSpawner>>,
}

impl Collaborators {
    pub fn with_minimap(mut self, minimap: impl MinimapBuilder + 'static) -> Self {
        self.minimap = Some(Box::new(minimap));
        self
    }

    pub fn with_player(mut self, player: impl PlayerControl + 'static) -> Self {
        self.player = Some(Box::new(player));
        self
    }

    pub fn with_viewport(mut self, viewport: impl Viewport + 'static) -> Self {
        self.viewport = Some(Box::new(viewport));
        self
    }

    pub fn with_triggers(mut self, triggers: impl DoorTriggers + 'static) -> Self {
        self.triggers = Some(Box::new(triggers));
        self
    }

    pub fn with_room_view(mut self, room_view: impl RoomView + 'static) -> Self {
        self.room_view = Some(Box::new(room_view));
        self
    }

    pub fn with_spawner(mut self, spawner: impl HostileSpawner + 'static) -> Self {
        self.spawner = Some(Box::new(spawner));
        self
    }

    /// Every slot filled by one shared [`CallLog`] recorder.
    pub fn recording(log: &CallLog) -> Self {
        Self::default()
            .with_minimap(log.clone())
            .with_player(log.clone())
            .with_viewport(log.clone())
            .with_triggers(log.clone())
            .with_room_view(log.clone())
            .with_spawner(log.clone())
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("minimap", &self.minimap.is_some())
            .field("player", &self.player.is_some())
            .field("viewport", &self.viewport.is_some())
            .field("triggers", &self.triggers.is_some())
            .field("room_view", &self.room_view.is_some())
            .field("spawner", &self.spawner.is_some())
            .finish()
    }
}

// =====================================================
// Recording collaborator
// =====================================================

/// One outbound call, as seen by a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorCall {
    BuildMap(Vec<MinimapEntry>),
    SetInputEnabled(bool),
    ZeroVelocity,
    SetViewport(Vec2),
    SetTriggerEnabled(TriggerId, bool),
    ShowDoors(GridCell, DoorMask),
    SpawnHostile(GridCell, HostileId, Vec2),
}

/// Shared, cloneable log of collaborator calls, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<CollaboratorCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: CollaboratorCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<CollaboratorCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Final enabled state of every trigger that was ever touched.
    pub fn trigger_states(&self) -> BTreeMap<TriggerId, bool> {
        let mut states = BTreeMap::new();
        for call in self.calls() {
            if let CollaboratorCall::SetTriggerEnabled(trigger, enabled) = call {
                states.insert(trigger, enabled);
            }
        }
        states
    }

    /// Triggers whose last recorded state is enabled.
    pub fn enabled_triggers(&self) -> Vec<TriggerId> {
        self.trigger_states()
            .into_iter()
            .filter_map(|(t, enabled)| enabled.then_some(t))
            .collect()
    }

    pub fn viewport_positions(&self) -> Vec<Vec2> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CollaboratorCall::SetViewport(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn input_changes(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CollaboratorCall::SetInputEnabled(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn spawned(&self) -> Vec<(GridCell, HostileId)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CollaboratorCall::SpawnHostile(room, id, _) => Some((room, id)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&CollaboratorCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

impl MinimapBuilder for CallLog {
    fn build_map(&mut self, rooms: &[MinimapEntry]) {
        self.push(CollaboratorCall::BuildMap(rooms.to_vec()));
    }
}

impl PlayerControl for CallLog {
    fn set_input_enabled(&mut self, enabled: bool) {
        self.push(CollaboratorCall::SetInputEnabled(enabled));
    }

    fn zero_velocity(&mut self) {
        self.push(CollaboratorCall::ZeroVelocity);
    }
}

impl Viewport for CallLog {
    fn set_position(&mut self, position: Vec2) {
        self.push(CollaboratorCall::SetViewport(position));
    }
}

impl DoorTriggers for CallLog {
    fn set_enabled(&mut self, trigger: TriggerId, enabled: bool) {
        self.push(CollaboratorCall::SetTriggerEnabled(trigger, enabled));
    }
}

impl RoomView for CallLog {
    fn show_doors(&mut self, room: GridCell, open: DoorMask) {
        self.push(CollaboratorCall::ShowDoors(room, open));
    }
}

impl HostileSpawner for CallLog {
    fn spawn(&mut self, room: GridCell, hostile: HostileId, position: Vec2) {
        self.push(CollaboratorCall::SpawnHostile(room, hostile, position));
    }
}
