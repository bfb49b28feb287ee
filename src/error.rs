//! Error taxonomy for generation, configuration, and session handling.
//!
//! Dropped transition requests are deliberately absent: they are a defined
//! outcome ([`crate::session::TransitionRequest::Dropped`]), not a failure.

use std::path::PathBuf;

use crate::grid::GridCell;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Unsupported config extension: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The frontier ran dry before `min_rooms` could be placed. Retry with a new seed.
    #[error("Insufficient rooms: placed {placed}, need {required}")]
    InsufficientRooms { placed: usize, required: usize },

    #[error("Generation failed after {attempts} attempts (last: {last})")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A logic defect, never a recoverable runtime condition.
    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl GenerationError {
    /// Whether a fresh seed could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::InsufficientRooms { .. })
    }

    /// Short stable label, used to bucket failures in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InsufficientRooms { .. } => "insufficient_rooms",
            GenerationError::RetriesExhausted { .. } => "retries_exhausted",
            GenerationError::Config(_) => "config",
            GenerationError::Invariant(_) => "invariant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown room {0}")]
    UnknownRoom(GridCell),

    #[error("No dungeon graph registered")]
    NoGraph,
}
