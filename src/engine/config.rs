use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::grid::GridCell;

/// Top-level configuration for a dungeon run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    pub seed: u64,
    pub generation: GenerationConfig,
    pub transition: TransitionConfig,
    pub layout: LayoutConfig,
    pub encounters: EncounterConfig,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            generation: GenerationConfig::default(),
            transition: TransitionConfig::default(),
            layout: LayoutConfig::default(),
            encounters: EncounterConfig::default(),
        }
    }
}

/// Inputs to the grid graph generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub width: i32,
    pub height: i32,
    pub start: GridCell,
    pub min_rooms: usize,
    pub max_rooms: usize,
    pub expansion_probability: f64,
    pub max_attempts: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            start: GridCell::from(START_CELL),
            min_rooms: MIN_ROOMS,
            max_rooms: MAX_ROOMS,
            expansion_probability: EXPANSION_PROBABILITY,
            max_attempts: MAX_GENERATION_ATTEMPTS,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1 || self.height < 1 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.start.in_bounds(self.width, self.height) {
            return Err(ConfigError::Invalid(format!(
                "start cell {} outside {}x{} grid",
                self.start, self.width, self.height
            )));
        }
        if self.min_rooms == 0 || self.min_rooms > self.max_rooms {
            return Err(ConfigError::Invalid(format!(
                "room bounds must satisfy 1 <= min ({}) <= max ({})",
                self.min_rooms, self.max_rooms
            )));
        }
        // Cell indices are computed in i32.
        let Some(capacity) = self.width.checked_mul(self.height) else {
            return Err(ConfigError::Invalid(format!(
                "grid {}x{} has more cells than can be indexed",
                self.width, self.height
            )));
        };
        let capacity = capacity as usize;
        if self.max_rooms > capacity {
            return Err(ConfigError::Invalid(format!(
                "max_rooms {} exceeds grid capacity {}",
                self.max_rooms, capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.expansion_probability) {
            return Err(ConfigError::Invalid(format!(
                "expansion_probability {} not in [0, 1]",
                self.expansion_probability
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

/// Viewport move timing between rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration: f32,
    pub timeout: f32,
    pub position_threshold: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: TRANSITION_DURATION_SECS,
            timeout: TRANSITION_TIMEOUT_SECS,
            position_threshold: POSITION_THRESHOLD,
        }
    }
}

impl TransitionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration > 0.0) {
            return Err(ConfigError::Invalid("transition duration must be > 0".into()));
        }
        if !(self.timeout > 0.0) {
            return Err(ConfigError::Invalid("transition timeout must be > 0".into()));
        }
        if !(self.position_threshold >= 0.0) {
            return Err(ConfigError::Invalid(
                "position_threshold must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Grid-to-world mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub player_spawn_offset: (f32, f32),
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_x: ROOM_SPACING_X,
            spacing_y: ROOM_SPACING_Y,
            player_spawn_offset: PLAYER_SPAWN_OFFSET,
        }
    }
}

/// Hostile spawning on first room entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub regular_hostiles: u32,
    pub boss_hostiles: u32,
    pub spawn_offsets: Vec<(f32, f32)>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            regular_hostiles: REGULAR_ROOM_HOSTILES,
            boss_hostiles: BOSS_ROOM_HOSTILES,
            spawn_offsets: HOSTILE_SPAWN_OFFSETS.to_vec(),
        }
    }
}

impl DungeonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        self.transition.validate()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load from a `.json` or `.ron` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("ron") => Self::from_ron(&text),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}
