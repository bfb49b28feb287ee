//! Batch generation survey
//!
//! Generates many dungeons from one base seed and summarizes the results,
//! for tuning room bounds and expansion probability. Runs are independent
//! and spread across cores with rayon; each run owns its RNG.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::config::GenerationConfig;
use crate::generation::{generate_with_retries, DungeonSeed};
use crate::logging::TimingSpan;
use crate::room::RoomRole;

/// Outcome of a single surveyed run
#[derive(Debug, Clone)]
enum RunOutcome {
    Generated {
        rooms: usize,
        attempts: u32,
        boss_distance: u32,
        valid: bool,
    },
    Failed(&'static str),
}

/// Aggregate statistics over a batch of generations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyReport {
    pub runs: u32,
    pub successes: u32,
    pub failures: BTreeMap<String, u32>,
    /// Generated graphs that failed structural validation; must stay zero.
    pub invalid: u32,
    pub min_rooms: usize,
    pub max_rooms: usize,
    pub mean_rooms: f32,
    pub mean_attempts: f32,
    pub mean_boss_distance: f32,
}

impl SurveyReport {
    pub fn success_rate(&self) -> f32 {
        if self.runs == 0 {
            return 0.0;
        }
        self.successes as f32 / self.runs as f32
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Generate `runs` dungeons in parallel and summarize them.
pub fn survey(config: &GenerationConfig, base_seed: u64, runs: u32) -> SurveyReport {
    let _span = TimingSpan::new("survey");
    let root = DungeonSeed::new(base_seed);
    let outcomes: Vec<RunOutcome> = (0..runs)
        .into_par_iter()
        .map(|run| survey_run(config, root.child(run)))
        .collect();

    let report = summarize(&outcomes);
    tracing::info!(
        runs = report.runs,
        successes = report.successes,
        mean_rooms = report.mean_rooms,
        "survey complete"
    );
    report
}

fn survey_run(config: &GenerationConfig, seed: DungeonSeed) -> RunOutcome {
    match generate_with_retries(config, seed) {
        Ok(dungeon) => {
            let graph = &dungeon.graph;
            RunOutcome::Generated {
                rooms: graph.len(),
                attempts: dungeon.attempts,
                boss_distance: graph
                    .room_with_role(RoomRole::Boss)
                    .map_or(0, |r| r.distance_from_spawn),
                valid: graph.validate().is_ok(),
            }
        }
        Err(err) => RunOutcome::Failed(err.kind()),
    }
}

fn summarize(outcomes: &[RunOutcome]) -> SurveyReport {
    let mut report = SurveyReport {
        runs: outcomes.len() as u32,
        min_rooms: usize::MAX,
        ..Default::default()
    };
    let mut total_rooms = 0usize;
    let mut total_attempts = 0u64;
    let mut total_boss = 0u64;

    for outcome in outcomes {
        match outcome {
            RunOutcome::Generated {
                rooms,
                attempts,
                boss_distance,
                valid,
            } => {
                report.successes += 1;
                if !valid {
                    report.invalid += 1;
                }
                report.min_rooms = report.min_rooms.min(*rooms);
                report.max_rooms = report.max_rooms.max(*rooms);
                total_rooms += rooms;
                total_attempts += u64::from(*attempts);
                total_boss += u64::from(*boss_distance);
            }
            RunOutcome::Failed(kind) => {
                *report.failures.entry((*kind).to_string()).or_insert(0) += 1;
            }
        }
    }

    if report.successes == 0 {
        report.min_rooms = 0;
        return report;
    }
    let n = report.successes as f32;
    report.mean_rooms = total_rooms as f32 / n;
    report.mean_attempts = total_attempts as f32 / n;
    report.mean_boss_distance = total_boss as f32 / n;
    report
}
