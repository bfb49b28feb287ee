//! Centralized default policy constants for the dungeon core.
//!
//! Every value here is only a default: the live value always comes from
//! [`crate::engine::config::DungeonConfig`], so tuning never requires a rebuild.

// =====================================================
// Grid generation
// =====================================================

/// Default grid width in cells
pub const GRID_WIDTH: i32 = 11;

/// Default grid height in cells
pub const GRID_HEIGHT: i32 = 9;

/// Default spawn cell (roughly the grid centre)
pub const START_CELL: (i32, i32) = (5, 4);

/// Default lower bound on room count
pub const MIN_ROOMS: usize = 8;

/// Default upper bound on room count
pub const MAX_ROOMS: usize = 14;

/// Chance that the randomized BFS occupies a free neighbour
pub const EXPANSION_PROBABILITY: f64 = 0.6;

/// Generation attempts before giving up with `RetriesExhausted`
pub const MAX_GENERATION_ATTEMPTS: u32 = 32;

/// Seed used when the config does not carry one
pub const DEFAULT_SEED: u64 = 42;

// =====================================================
// Room transitions
// =====================================================

/// Viewport interpolation duration in seconds
pub const TRANSITION_DURATION_SECS: f32 = 0.35;

/// Hard stop for a viewport move, even if the threshold was never met
pub const TRANSITION_TIMEOUT_SECS: f32 = 1.0;

/// Distance under which the viewport is considered arrived
pub const POSITION_THRESHOLD: f32 = 0.05;

// =====================================================
// World layout
// =====================================================

/// Horizontal distance between neighbouring room centres
pub const ROOM_SPACING_X: f32 = 16.0;

/// Vertical distance between neighbouring room centres
pub const ROOM_SPACING_Y: f32 = 9.0;

/// Player spawn point relative to the start room centre
pub const PLAYER_SPAWN_OFFSET: (f32, f32) = (0.2, 0.3);

// =====================================================
// Encounters
// =====================================================

/// Hostiles spawned on first entry into a regular room
pub const REGULAR_ROOM_HOSTILES: u32 = 2;

/// Hostiles spawned on first entry into the boss room
pub const BOSS_ROOM_HOSTILES: u32 = 1;

/// Hostile spawn points relative to the room centre (the four corners)
pub const HOSTILE_SPAWN_OFFSETS: [(f32, f32); 4] = [(-4.0, 4.0), (4.0, 4.0), (-4.0, -4.0), (4.0, -4.0)];
