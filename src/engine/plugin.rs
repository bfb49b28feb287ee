use bevy::prelude::*;
use std::sync::{Arc, Mutex, RwLock};

use crate::collaborators::Collaborators;
use crate::engine::config::DungeonConfig;
use crate::engine::DungeonEngine;
use crate::events::DungeonEvent;
use crate::grid::GridCell;

/// Runs a [`DungeonEngine`] inside a Bevy app: inbound [`DungeonEventMsg`]s
/// are applied first, then the session is ticked with the frame delta.
///
/// Collaborators are handed over once, when the plugin is built. A plugin
/// built without any still runs the session, but nothing is spawned or drawn.
#[derive(Default)]
pub struct DungeonPlugin {
    pub config: DungeonConfig,
    collaborators: Mutex<Option<Collaborators>>,
}

impl DungeonPlugin {
    pub fn new(config: DungeonConfig) -> Self {
        Self {
            config,
            collaborators: Mutex::new(None),
        }
    }

    pub fn with_collaborators(self, collaborators: Collaborators) -> Self {
        Self {
            collaborators: Mutex::new(Some(collaborators)),
            ..self
        }
    }
}

impl Plugin for DungeonPlugin {
    fn build(&self, app: &mut App) {
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(err) => {
                tracing::error!(%err, "invalid dungeon config, using defaults");
                DungeonConfig::default()
            }
        };
        let collaborators = match self.collaborators.lock() {
            Ok(mut slot) => slot.take().unwrap_or_default(),
            Err(_) => {
                tracing::error!("dungeon collaborators unavailable, running without them");
                Collaborators::default()
            }
        };
        let Ok(mut engine) = DungeonEngine::new(config, collaborators) else {
            return;
        };
        if let Err(err) = engine.regenerate() {
            tracing::error!(%err, "initial dungeon generation failed");
        }

        app.insert_resource(DungeonResource(Arc::new(RwLock::new(engine))))
            .add_event::<DungeonEventMsg>()
            .add_event::<RoomEnteredMsg>()
            .add_systems(Update, (dungeon_event_system, dungeon_tick_system).chain());
    }
}

#[derive(Resource, Clone)]
pub struct DungeonResource(pub Arc<RwLock<DungeonEngine>>);

/// Inbound event from gameplay systems (door volumes, combat).
#[derive(Event, Debug, Clone, Copy)]
pub struct DungeonEventMsg(pub DungeonEvent);

/// Sent when a room transition completes.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomEnteredMsg(pub GridCell);

fn dungeon_event_system(mut events: EventReader<DungeonEventMsg>, engine_res: Res<DungeonResource>) {
    let Ok(mut engine) = engine_res.0.write() else {
        return;
    };
    for DungeonEventMsg(event) in events.read() {
        if let Err(err) = engine.handle_event(*event) {
            tracing::warn!(%err, ?event, "dungeon event rejected");
        }
    }
}

fn dungeon_tick_system(
    time: Res<Time>,
    engine_res: Res<DungeonResource>,
    mut entered: EventWriter<RoomEnteredMsg>,
) {
    if let Ok(mut engine) = engine_res.0.write() {
        if let Some(room) = engine.tick(time.delta_secs()) {
            entered.send(RoomEnteredMsg(room));
        }
    }
}
