//! Dungeon Core - Room Graph Library
//!
//! Deterministic core of a top-down room-to-room dungeon:
//! - Grid room-graph generation (seeded, bounded retries)
//! - Room roles, door masks, sealing while hostiles remain
//! - Session state machine for animated room transitions and door arming
//! - Collaborator traits for the minimap, player, viewport, doors and spawning
//! - Parallel generation survey for tuning
//! - Bevy plugin wrapping the engine

pub mod collaborators;
pub mod constants;
pub mod encounter;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod graph;
pub mod grid;
pub mod logging;
pub mod room;
pub mod session;
pub mod survey;
