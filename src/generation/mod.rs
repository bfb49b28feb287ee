pub mod grid_graph;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

pub use grid_graph::GridGraphGenerator;

use crate::engine::config::GenerationConfig;
use crate::error::GenerationError;
use crate::graph::DungeonGraph;

/// Root seed of a dungeon run. Every generation attempt derives its own
/// seed from it, so a retry never replays the attempt that just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonSeed {
    pub seed: u64,
}

impl DungeonSeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Deterministic per-attempt seed from the root seed and attempt index
    pub fn attempt_seed(&self, attempt: u32) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(attempt.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Independent root seed for the `index`-th dungeon of a batch
    /// (regenerations, surveys).
    pub fn child(&self, index: u32) -> DungeonSeed {
        let mut hasher = Sha3_256::new();
        hasher.update(b"run");
        hasher.update(self.seed.to_le_bytes());
        hasher.update(index.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        DungeonSeed::new(u64::from_le_bytes(bytes))
    }
}

/// A successful generation and how it was reached.
#[derive(Debug, Clone)]
pub struct GeneratedDungeon {
    pub graph: DungeonGraph,
    /// Seed of the attempt that succeeded
    pub seed: u64,
    /// 1-based count of attempts used
    pub attempts: u32,
}

/// Generate with a bounded number of fresh-seed retries.
///
/// Only `InsufficientRooms` is retried; anything else is returned at once.
/// After `config.max_attempts` failures the last one is wrapped in
/// `RetriesExhausted`.
pub fn generate_with_retries(
    config: &GenerationConfig,
    seed: DungeonSeed,
) -> Result<GeneratedDungeon, GenerationError> {
    let generator = GridGraphGenerator::new(config.clone())?;
    let mut last = None;

    for attempt in 0..config.max_attempts {
        let attempt_seed = seed.attempt_seed(attempt);
        match generator.generate_seeded(attempt_seed) {
            Ok(graph) => {
                tracing::debug!(
                    rooms = graph.len(),
                    attempt = attempt + 1,
                    seed = attempt_seed,
                    "dungeon generated"
                );
                return Ok(GeneratedDungeon {
                    graph,
                    seed: attempt_seed,
                    attempts: attempt + 1,
                });
            }
            Err(err) if err.is_retryable() => {
                tracing::warn!(attempt = attempt + 1, seed = attempt_seed, %err, "generation attempt failed, retrying");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(GenerationError::RetriesExhausted {
        attempts: config.max_attempts,
        last: Box::new(last.unwrap_or(GenerationError::InsufficientRooms {
            placed: 0,
            required: config.min_rooms,
        })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCell;

    #[test]
    fn test_attempt_seeds_deterministic() {
        let seed = DungeonSeed::new(12345);
        assert_eq!(seed.attempt_seed(0), seed.attempt_seed(0));
    }

    #[test]
    fn test_attempt_seeds_differ() {
        let seed = DungeonSeed::new(12345);
        assert_ne!(seed.attempt_seed(0), seed.attempt_seed(1));
        assert_ne!(seed.attempt_seed(0), DungeonSeed::new(12346).attempt_seed(0));
    }

    #[test]
    fn test_generate_with_retries_default_config() {
        let result = generate_with_retries(&GenerationConfig::default(), DungeonSeed::new(42)).unwrap();
        assert!(result.attempts >= 1);
        assert!(result.graph.len() >= 8 && result.graph.len() <= 14);
        assert_eq!(result.graph.validate(), Ok(()));
    }

    #[test]
    fn test_retries_are_bounded() {
        // A 2x1 grid can never hold 3 role rooms.
        let config = GenerationConfig {
            width: 2,
            height: 1,
            start: GridCell::new(0, 0),
            min_rooms: 1,
            max_rooms: 2,
            max_attempts: 5,
            ..Default::default()
        };
        match generate_with_retries(&config, DungeonSeed::new(1)) {
            Err(GenerationError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(*last, GenerationError::InsufficientRooms { .. }));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_low_min_rooms_succeeds_first_attempt() {
        let config = GenerationConfig {
            min_rooms: 2,
            expansion_probability: 0.0,
            ..Default::default()
        };
        let result = generate_with_retries(&config, DungeonSeed::new(1)).unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.graph.len(), 3);
    }

    #[test]
    fn test_invalid_config_not_retried() {
        let config = GenerationConfig {
            min_rooms: 0,
            ..Default::default()
        };
        assert!(matches!(
            generate_with_retries(&config, DungeonSeed::new(1)),
            Err(GenerationError::Config(_))
        ));
    }
}
