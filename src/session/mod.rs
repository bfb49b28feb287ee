//! Dungeon session: the single authority over the active room.
//!
//! The session owns the [`DungeonGraph`] and drives the room transition
//! state machine:
//!
//! ```text
//! Idle --request_transition (accepted)--> Transitioning
//! Transitioning --tick (threshold or timeout)--> Idle
//! ```
//!
//! Requests made while Transitioning are dropped, never queued.
//!
//! Door trigger arming is derived, not tracked by hand: after every state
//! change the wanted set is recomputed and diffed against what is armed.
//! The wanted set is every door trigger of the rooms adjacent to the current
//! room, or nothing while a transition is in flight or the current room is
//! sealed.

pub mod transition;

use std::collections::BTreeSet;

use bevy::math::Vec2;

use crate::collaborators::Collaborators;
use crate::encounter::{EncounterPlan, HostileIds};
use crate::engine::config::DungeonConfig;
use crate::error::SessionError;
use crate::events::{DungeonEvent, EventOutcome};
use crate::graph::{DungeonGraph, TriggerId};
use crate::grid::GridCell;
use crate::room::{HostileId, RoomNode, SealChange};

pub use transition::{Transition, TransitionStep};

/// Result of asking for a room transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest {
    Accepted,
    /// Another transition is in flight, the target is already current, or
    /// the door that raised it is not armed.
    Dropped,
}

pub struct DungeonSession {
    config: DungeonConfig,
    collaborators: Collaborators,
    encounters: EncounterPlan,
    hostile_ids: HostileIds,
    graph: Option<DungeonGraph>,
    current: Option<GridCell>,
    previous: Option<GridCell>,
    transition: Option<Transition>,
    armed: BTreeSet<TriggerId>,
    viewport: Vec2,
}

impl DungeonSession {
    pub fn new(config: DungeonConfig, collaborators: Collaborators) -> Self {
        Self {
            encounters: EncounterPlan::new(config.encounters.clone()),
            config,
            collaborators,
            hostile_ids: HostileIds::default(),
            graph: None,
            current: None,
            previous: None,
            transition: None,
            armed: BTreeSet::new(),
            viewport: Vec2::ZERO,
        }
    }

    // -------------------------------------------------
    // Queries
    // -------------------------------------------------

    pub fn graph(&self) -> Option<&DungeonGraph> {
        self.graph.as_ref()
    }

    pub fn current_cell(&self) -> Option<GridCell> {
        self.current
    }

    pub fn previous_cell(&self) -> Option<GridCell> {
        self.previous
    }

    pub fn current_room(&self) -> Option<&RoomNode> {
        let cell = self.current?;
        self.graph.as_ref()?.room(cell)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn armed_triggers(&self) -> &BTreeSet<TriggerId> {
        &self.armed
    }

    pub fn viewport_position(&self) -> Vec2 {
        self.viewport
    }

    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    // -------------------------------------------------
    // Graph registration
    // -------------------------------------------------

    /// Replace any previous dungeon with `graph` and enter its start room.
    pub fn register_graph(&mut self, graph: DungeonGraph) {
        if self.transition.take().is_some() {
            if let Some(player) = self.collaborators.player.as_mut() {
                player.set_input_enabled(true);
            }
        }

        let start = graph.start();
        let layout = &self.config.layout;
        self.viewport = graph.world_center(start, layout);
        let minimap = graph.minimap_entries(layout);

        if let Some(viewport) = self.collaborators.viewport.as_mut() {
            viewport.set_position(self.viewport);
        }
        if let Some(builder) = self.collaborators.minimap.as_mut() {
            builder.build_map(&minimap);
        }
        if let Some(view) = self.collaborators.room_view.as_mut() {
            for cell in graph.cells() {
                if let Some(room) = graph.room(cell) {
                    view.show_doors(cell, room.open_doors());
                }
            }
        }

        tracing::info!(rooms = graph.len(), %start, "dungeon registered");

        self.current = Some(start);
        self.previous = None;
        self.hostile_ids = HostileIds::default();
        let all_triggers = graph.all_triggers();
        self.graph = Some(graph);

        // Disarm old-graph triggers the new graph sends no state for.
        let stale: Vec<TriggerId> = std::mem::take(&mut self.armed)
            .into_iter()
            .filter(|trigger| !all_triggers.contains(trigger))
            .collect();
        if let Some(triggers) = self.collaborators.triggers.as_mut() {
            for trigger in &stale {
                triggers.set_enabled(*trigger, false);
            }
        }

        // Every trigger of the new graph gets an explicit initial state.
        self.enter_room(start);
        let wanted = self.wanted_triggers();
        if let Some(triggers) = self.collaborators.triggers.as_mut() {
            for trigger in &all_triggers {
                triggers.set_enabled(*trigger, wanted.contains(trigger));
            }
        }
        self.armed = wanted;
    }

    // -------------------------------------------------
    // Transitions
    // -------------------------------------------------

    pub fn request_transition(
        &mut self,
        target: GridCell,
    ) -> Result<TransitionRequest, SessionError> {
        let graph = self.graph.as_ref().ok_or(SessionError::NoGraph)?;
        if self.transition.is_some() {
            return Ok(TransitionRequest::Dropped);
        }
        if !graph.contains(target) {
            return Err(SessionError::UnknownRoom(target));
        }
        if self.current == Some(target) {
            return Ok(TransitionRequest::Dropped);
        }

        let end = graph.world_center(target, &self.config.layout);
        self.transition = Some(Transition::new(
            self.current,
            target,
            self.viewport,
            end,
            &self.config.transition,
        ));
        self.sync_triggers();
        if let Some(player) = self.collaborators.player.as_mut() {
            player.zero_velocity();
            player.set_input_enabled(false);
        }
        tracing::debug!(from = ?self.current, to = %target, "transition started");
        Ok(TransitionRequest::Accepted)
    }

    /// Advance one simulated frame. Returns the room entered if a
    /// transition completed during this tick.
    pub fn tick(&mut self, dt: f32) -> Option<GridCell> {
        let step = self.transition.as_mut()?.advance(dt);
        match step {
            TransitionStep::Moving(position) => {
                self.move_viewport(position);
                None
            }
            TransitionStep::Arrived(position) => {
                self.move_viewport(position);
                let finished = self.transition.take()?;
                let target = finished.target;

                self.previous = self.current;
                self.current = Some(target);
                self.enter_room(target);
                self.sync_triggers();
                if let Some(player) = self.collaborators.player.as_mut() {
                    player.set_input_enabled(true);
                }
                tracing::info!(
                    room = %target,
                    elapsed = finished.elapsed(),
                    "transition complete"
                );
                Some(target)
            }
        }
    }

    /// Instantaneous room entry, outside the animated transition path.
    ///
    /// Returns whether the current room changed. Entering the room a
    /// transition is already heading to is left to the transition.
    pub fn notify_room_entered(&mut self, room: GridCell) -> Result<bool, SessionError> {
        let graph = self.graph.as_ref().ok_or(SessionError::NoGraph)?;
        if !graph.contains(room) {
            return Err(SessionError::UnknownRoom(room));
        }
        if self.current == Some(room) {
            return Ok(false);
        }
        if self.transition.as_ref().is_some_and(|t| t.target == room) {
            return Ok(false);
        }

        let center = graph.world_center(room, &self.config.layout);
        self.previous = self.current;
        self.current = Some(room);
        if self.transition.is_none() {
            self.move_viewport(center);
            self.enter_room(room);
        }
        self.sync_triggers();
        tracing::debug!(%room, "room entered");
        Ok(true)
    }

    // -------------------------------------------------
    // Hostiles
    // -------------------------------------------------

    pub fn hostile_spawned(
        &mut self,
        room: GridCell,
        hostile: HostileId,
    ) -> Result<Option<SealChange>, SessionError> {
        let change = self
            .room_mut(room)?
            .register_hostile(hostile);
        self.apply_seal_change(room, change);
        Ok(change)
    }

    pub fn hostile_defeated(
        &mut self,
        room: GridCell,
        hostile: HostileId,
    ) -> Result<Option<SealChange>, SessionError> {
        let change = self
            .room_mut(room)?
            .unregister_hostile(hostile);
        self.apply_seal_change(room, change);
        Ok(change)
    }

    // -------------------------------------------------
    // Events
    // -------------------------------------------------

    pub fn handle_event(&mut self, event: DungeonEvent) -> Result<EventOutcome, SessionError> {
        match event {
            DungeonEvent::DoorCrossed { trigger, target } => {
                // A door only ever leads into the room it sits in.
                if !self.armed.contains(&trigger) || target != trigger.room {
                    return Ok(EventOutcome::Transition(TransitionRequest::Dropped));
                }
                self.request_transition(target)
                    .map(EventOutcome::Transition)
            }
            DungeonEvent::HostileSpawned { room, hostile } => {
                self.hostile_spawned(room, hostile).map(EventOutcome::Seal)
            }
            DungeonEvent::HostileDefeated { room, hostile } => {
                self.hostile_defeated(room, hostile).map(EventOutcome::Seal)
            }
            DungeonEvent::RoomBoundaryEntered { room } => {
                self.notify_room_entered(room).map(EventOutcome::Entered)
            }
        }
    }

    // -------------------------------------------------
    // Internals
    // -------------------------------------------------

    fn room_mut(&mut self, cell: GridCell) -> Result<&mut RoomNode, SessionError> {
        self.graph
            .as_mut()
            .ok_or(SessionError::NoGraph)?
            .room_mut(cell)
            .ok_or(SessionError::UnknownRoom(cell))
    }

    fn move_viewport(&mut self, position: Vec2) {
        self.viewport = position;
        if let Some(viewport) = self.collaborators.viewport.as_mut() {
            viewport.set_position(position);
        }
    }

    fn apply_seal_change(&mut self, cell: GridCell, change: Option<SealChange>) {
        let Some(change) = change else {
            return;
        };
        let open = self
            .graph
            .as_ref()
            .and_then(|g| g.room(cell))
            .map(|r| r.open_doors())
            .unwrap_or_default();
        if let Some(view) = self.collaborators.room_view.as_mut() {
            view.show_doors(cell, open);
        }
        tracing::debug!(room = %cell, ?change, "room seal changed");
        self.sync_triggers();
    }

    /// First entry into a room spawns its encounter, once.
    fn enter_room(&mut self, cell: GridCell) {
        let layout = &self.config.layout;
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        let center = graph.world_center(cell, layout);
        let Some(room) = graph.room_mut(cell) else {
            return;
        };
        if room.encounter_spawned() {
            return;
        }
        room.mark_encounter_spawned();

        let Some(spawner) = self.collaborators.spawner.as_mut() else {
            return;
        };
        let count = self.encounters.hostiles_for(room);
        let positions = self.encounters.spawn_positions(center, count);
        let mut sealed = None;
        for position in positions {
            let id = self.hostile_ids.allocate();
            spawner.spawn(cell, id, position);
            sealed = sealed.or(room.register_hostile(id));
        }
        if count > 0 {
            tracing::debug!(room = %cell, count, "encounter spawned");
        }
        self.apply_seal_change(cell, sealed);
    }

    fn wanted_triggers(&self) -> BTreeSet<TriggerId> {
        if self.transition.is_some() {
            return BTreeSet::new();
        }
        let (Some(graph), Some(current)) = (self.graph.as_ref(), self.current) else {
            return BTreeSet::new();
        };
        if graph.room(current).map_or(true, |r| r.is_sealed()) {
            return BTreeSet::new();
        }
        graph
            .neighbors(current)
            .flat_map(|neighbor| graph.triggers_of(neighbor))
            .collect()
    }

    fn sync_triggers(&mut self) {
        let wanted = self.wanted_triggers();
        if wanted == self.armed {
            return;
        }
        if let Some(triggers) = self.collaborators.triggers.as_mut() {
            for trigger in self.armed.difference(&wanted) {
                triggers.set_enabled(*trigger, false);
            }
            for trigger in wanted.difference(&self.armed) {
                triggers.set_enabled(*trigger, true);
            }
        }
        tracing::debug!(armed = wanted.len(), "door triggers synced");
        self.armed = wanted;
    }
}

impl std::fmt::Debug for DungeonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DungeonSession")
            .field("rooms", &self.graph.as_ref().map(|g| g.len()))
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("transitioning", &self.transition.is_some())
            .field("armed", &self.armed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CallLog, CollaboratorCall};
    use crate::engine::config::{EncounterConfig, GenerationConfig};
    use crate::generation::GridGraphGenerator;
    use crate::graph::tests::plus_graph;
    use crate::grid::Direction;

    const DT: f32 = 1.0 / 60.0;

    fn peaceful_config() -> DungeonConfig {
        DungeonConfig {
            encounters: EncounterConfig {
                regular_hostiles: 0,
                boss_hostiles: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn session(config: DungeonConfig) -> (DungeonSession, CallLog) {
        let log = CallLog::new();
        let mut session = DungeonSession::new(config, Collaborators::recording(&log));
        session.register_graph(plus_graph());
        (session, log)
    }

    fn run_to_completion(session: &mut DungeonSession) -> GridCell {
        for _ in 0..600 {
            if let Some(room) = session.tick(DT) {
                return room;
            }
        }
        panic!("transition never completed");
    }

    fn adjacent_triggers(graph: &DungeonGraph, cell: GridCell) -> BTreeSet<TriggerId> {
        graph
            .neighbors(cell)
            .flat_map(|n| graph.triggers_of(n))
            .collect()
    }

    #[test]
    fn test_register_graph_arms_start_neighbours() {
        let (session, log) = session(peaceful_config());
        let graph = session.graph().unwrap();
        let start = graph.start();
        assert_eq!(session.current_cell(), Some(start));
        assert_eq!(session.armed_triggers(), &adjacent_triggers(graph, start));
        // Every trigger received an explicit state.
        assert_eq!(log.trigger_states().len(), graph.all_triggers().len());
        assert_eq!(
            log.enabled_triggers().into_iter().collect::<BTreeSet<_>>(),
            *session.armed_triggers()
        );
        assert!(session.armed_triggers().iter().all(|t| t.room != start));
    }

    #[test]
    fn test_register_graph_builds_minimap_once() {
        let (_session, log) = session(peaceful_config());
        assert_eq!(
            log.count(|c| matches!(c, CollaboratorCall::BuildMap(entries) if entries.len() == 7)),
            1
        );
        assert_eq!(log.viewport_positions(), vec![Vec2::ZERO]);
    }

    #[test]
    fn test_transition_lifecycle() {
        let (mut session, log) = session(peaceful_config());
        let east = GridCell::new(3, 2);

        assert_eq!(session.request_transition(east), Ok(TransitionRequest::Accepted));
        assert!(session.is_transitioning());
        assert!(session.armed_triggers().is_empty());
        assert_eq!(log.input_changes(), vec![false]);

        assert_eq!(run_to_completion(&mut session), east);
        assert!(!session.is_transitioning());
        assert_eq!(session.current_cell(), Some(east));
        assert_eq!(session.previous_cell(), Some(GridCell::new(2, 2)));
        assert_eq!(session.viewport_position(), Vec2::new(16.0, 0.0));
        assert_eq!(log.input_changes(), vec![false, true]);

        let graph = session.graph().unwrap();
        assert_eq!(session.armed_triggers(), &adjacent_triggers(graph, east));
        assert_eq!(
            log.enabled_triggers().into_iter().collect::<BTreeSet<_>>(),
            *session.armed_triggers()
        );
    }

    #[test]
    fn test_second_request_dropped_while_transitioning() {
        let (mut session, log) = session(peaceful_config());
        assert_eq!(
            session.request_transition(GridCell::new(3, 2)),
            Ok(TransitionRequest::Accepted)
        );
        session.tick(DT);
        assert_eq!(
            session.request_transition(GridCell::new(1, 2)),
            Ok(TransitionRequest::Dropped)
        );
        assert_eq!(run_to_completion(&mut session), GridCell::new(3, 2));
        assert_eq!(log.count(|c| *c == CollaboratorCall::ZeroVelocity), 1);
        assert!(session.tick(DT).is_none());
    }

    #[test]
    fn test_request_to_current_room_dropped() {
        let (mut session, _log) = session(peaceful_config());
        assert_eq!(
            session.request_transition(GridCell::new(2, 2)),
            Ok(TransitionRequest::Dropped)
        );
        assert!(!session.is_transitioning());
    }

    #[test]
    fn test_request_unknown_room_errors() {
        let (mut session, _log) = session(peaceful_config());
        assert_eq!(
            session.request_transition(GridCell::new(0, 0)),
            Err(SessionError::UnknownRoom(GridCell::new(0, 0)))
        );
    }

    #[test]
    fn test_no_graph() {
        let mut session = DungeonSession::new(DungeonConfig::default(), Collaborators::default());
        assert_eq!(
            session.request_transition(GridCell::new(0, 0)),
            Err(SessionError::NoGraph)
        );
        assert!(session.tick(DT).is_none());
    }

    #[test]
    fn test_door_event_on_disarmed_trigger_dropped() {
        let (mut session, _log) = session(peaceful_config());
        let start_trigger = TriggerId {
            room: GridCell::new(2, 2),
            side: Direction::East,
        };
        let outcome = session.handle_event(DungeonEvent::DoorCrossed {
            trigger: start_trigger,
            target: GridCell::new(2, 2),
        });
        assert_eq!(outcome, Ok(EventOutcome::Transition(TransitionRequest::Dropped)));

        let east_trigger = TriggerId {
            room: GridCell::new(3, 2),
            side: Direction::West,
        };
        let outcome = session.handle_event(DungeonEvent::DoorCrossed {
            trigger: east_trigger,
            target: GridCell::new(3, 2),
        });
        assert_eq!(outcome, Ok(EventOutcome::Transition(TransitionRequest::Accepted)));
    }

    #[test]
    fn test_door_event_with_mismatched_target_dropped() {
        let (mut session, log) = session(peaceful_config());
        let east_trigger = TriggerId {
            room: GridCell::new(3, 2),
            side: Direction::West,
        };
        assert!(session.armed_triggers().contains(&east_trigger));
        log.clear();

        // Boss room (4, 2) is not adjacent to the start.
        let outcome = session.handle_event(DungeonEvent::DoorCrossed {
            trigger: east_trigger,
            target: GridCell::new(4, 2),
        });
        assert_eq!(outcome, Ok(EventOutcome::Transition(TransitionRequest::Dropped)));
        assert!(!session.is_transitioning());
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_notify_room_entered() {
        let (mut session, _log) = session(peaceful_config());
        let west = GridCell::new(1, 2);
        assert_eq!(session.notify_room_entered(west), Ok(true));
        assert_eq!(session.current_cell(), Some(west));
        assert_eq!(session.previous_cell(), Some(GridCell::new(2, 2)));
        assert_eq!(session.viewport_position(), Vec2::new(-16.0, 0.0));
        let graph = session.graph().unwrap();
        assert_eq!(session.armed_triggers(), &adjacent_triggers(graph, west));
        assert_eq!(session.notify_room_entered(west), Ok(false));
    }

    #[test]
    fn test_entered_event_for_transition_target_deferred() {
        let (mut session, _log) = session(peaceful_config());
        let east = GridCell::new(3, 2);
        session.request_transition(east).unwrap();
        assert_eq!(session.notify_room_entered(east), Ok(false));
        assert_eq!(session.current_cell(), Some(GridCell::new(2, 2)));
        assert!(session.armed_triggers().is_empty());
        run_to_completion(&mut session);
        assert_eq!(session.current_cell(), Some(east));
        assert_eq!(session.notify_room_entered(east), Ok(false));
    }

    #[test]
    fn test_sealed_current_room_disarms_triggers() {
        let (mut session, log) = session(peaceful_config());
        let start = GridCell::new(2, 2);
        let e1 = HostileId(100);

        assert_eq!(session.hostile_spawned(start, e1), Ok(Some(SealChange::Sealed)));
        assert!(session.armed_triggers().is_empty());
        assert!(log.enabled_triggers().is_empty());
        assert!(log.calls().contains(&CollaboratorCall::ShowDoors(
            start,
            crate::grid::DoorMask::NONE
        )));

        assert_eq!(session.hostile_defeated(start, e1), Ok(Some(SealChange::Unsealed)));
        let graph = session.graph().unwrap();
        assert_eq!(session.armed_triggers(), &adjacent_triggers(graph, start));
    }

    #[test]
    fn test_sealing_other_room_keeps_triggers() {
        let (mut session, _log) = session(peaceful_config());
        let before = session.armed_triggers().clone();
        session.hostile_spawned(GridCell::new(4, 2), HostileId(1)).unwrap();
        assert_eq!(session.armed_triggers(), &before);
    }

    #[test]
    fn test_hostile_in_unknown_room() {
        let (mut session, _log) = session(peaceful_config());
        assert_eq!(
            session.hostile_spawned(GridCell::new(0, 0), HostileId(1)),
            Err(SessionError::UnknownRoom(GridCell::new(0, 0)))
        );
    }

    #[test]
    fn test_encounter_spawns_on_first_entry_only() {
        let (mut session, log) = session(DungeonConfig::default());
        let east = GridCell::new(3, 2);
        session.request_transition(east).unwrap();
        run_to_completion(&mut session);

        let spawned = log.spawned();
        assert_eq!(spawned.len(), 2);
        assert!(spawned.iter().all(|(room, _)| *room == east));
        assert!(session.current_room().unwrap().is_sealed());
        assert!(session.armed_triggers().is_empty());

        for (room, id) in spawned {
            session.hostile_defeated(room, id).unwrap();
        }
        assert!(!session.current_room().unwrap().is_sealed());
        assert!(!session.armed_triggers().is_empty());

        session.request_transition(GridCell::new(2, 2)).unwrap();
        run_to_completion(&mut session);
        session.request_transition(east).unwrap();
        run_to_completion(&mut session);
        assert_eq!(log.spawned().len(), 2);
        assert!(!session.current_room().unwrap().is_sealed());
    }

    #[test]
    fn test_register_graph_replaces_previous() {
        let (mut session, log) = session(peaceful_config());
        session.request_transition(GridCell::new(3, 2)).unwrap();
        session.tick(DT);
        log.clear();

        session.register_graph(plus_graph());
        assert!(!session.is_transitioning());
        assert_eq!(session.current_cell(), Some(GridCell::new(2, 2)));
        assert_eq!(log.input_changes(), vec![true]);
        let graph = session.graph().unwrap();
        assert_eq!(session.armed_triggers(), &adjacent_triggers(graph, graph.start()));
    }

    #[test]
    fn test_register_graph_disarms_triggers_of_previous_graph() {
        let (mut session, log) = session(peaceful_config());
        let old_armed = session.armed_triggers().clone();

        let generated = GridGraphGenerator::new(GenerationConfig::default())
            .unwrap()
            .generate_seeded(7)
            .unwrap();
        let new_triggers: BTreeSet<TriggerId> = generated.all_triggers().into_iter().collect();
        session.register_graph(generated);

        let states = log.trigger_states();
        for trigger in old_armed.difference(&new_triggers) {
            assert_eq!(states.get(trigger), Some(&false), "{trigger:?} left enabled");
        }
        assert_eq!(
            log.enabled_triggers().into_iter().collect::<BTreeSet<_>>(),
            *session.armed_triggers()
        );
    }
}
