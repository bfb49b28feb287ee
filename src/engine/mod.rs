//! Dungeon Engine - Integration Layer
//!
//! Owns the configuration and the [`DungeonSession`], generates dungeons
//! into it, and advances it once per frame. The Bevy plugin is a thin shell
//! around this type; headless runs and tests drive it directly.

pub mod config;
pub mod plugin;

use serde::{Deserialize, Serialize};

pub use config::DungeonConfig;
pub use plugin::{DungeonEventMsg, DungeonPlugin, DungeonResource, RoomEnteredMsg};

use crate::collaborators::Collaborators;
use crate::error::{ConfigError, GenerationError, SessionError};
use crate::events::{DungeonEvent, EventOutcome};
use crate::generation::{generate_with_retries, DungeonSeed};
use crate::grid::GridCell;
use crate::session::DungeonSession;

/// Summary of one generated dungeon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonRun {
    /// 0-based index of this dungeon within the engine's lifetime
    pub index: u32,
    /// Seed of the successful attempt
    pub seed: u64,
    pub attempts: u32,
    pub rooms: usize,
}

/// The session holds the only copy of the configuration; it is fixed once
/// the engine is built.
pub struct DungeonEngine {
    session: DungeonSession,
    runs: u32,
    elapsed_seconds: f32,
}

impl DungeonEngine {
    pub fn new(config: DungeonConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            session: DungeonSession::new(config, collaborators),
            runs: 0,
            elapsed_seconds: 0.0,
        })
    }

    /// Generate the next dungeon and make it the session's active graph.
    ///
    /// Each call derives a fresh root seed from the configured seed, so a
    /// sequence of regenerations is reproducible.
    pub fn regenerate(&mut self) -> Result<DungeonRun, GenerationError> {
        let index = self.runs;
        let config = self.session.config();
        let root = DungeonSeed::new(config.seed).child(index);
        let dungeon = generate_with_retries(&config.generation, root)?;
        let run = DungeonRun {
            index,
            seed: dungeon.seed,
            attempts: dungeon.attempts,
            rooms: dungeon.graph.len(),
        };
        self.session.register_graph(dungeon.graph);
        self.runs += 1;
        Ok(run)
    }

    /// Advance the engine by one frame
    pub fn tick(&mut self, delta_seconds: f32) -> Option<GridCell> {
        self.elapsed_seconds += delta_seconds;
        self.session.tick(delta_seconds)
    }

    pub fn handle_event(&mut self, event: DungeonEvent) -> Result<EventOutcome, SessionError> {
        self.session.handle_event(event)
    }

    pub fn config(&self) -> &DungeonConfig {
        self.session.config()
    }

    pub fn session(&self) -> &DungeonSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DungeonSession {
        &mut self.session
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }
}

// =====================================================
// Tests
// =====================================================
