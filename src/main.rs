//! Headless demo: generate a dungeon, walk it room by room, clear every
//! encounter along the way, then survey the configured generator.
//!
//! Usage: `dungeon-demo [config.json|config.ron]`

use anyhow::{Context, Result};

use dungeon_core::collaborators::{CallLog, Collaborators};
use dungeon_core::engine::{DungeonConfig, DungeonEngine};
use dungeon_core::events::DungeonEvent;
use dungeon_core::logging::{init_tracing, TracingConfig};
use dungeon_core::survey::survey;

const FRAME: f32 = 1.0 / 60.0;
const WALK_STEPS: usize = 6;
const SURVEY_RUNS: u32 = 1_000;

fn main() -> Result<()> {
    init_tracing(&TracingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(path) => DungeonConfig::load(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => DungeonConfig::default(),
    };

    let log = CallLog::new();
    let mut engine = DungeonEngine::new(config.clone(), Collaborators::recording(&log))?;
    let run = engine.regenerate().context("generating dungeon")?;
    println!(
        "Dungeon #{}: {} rooms, seed {:#018x}, {} attempt(s)",
        run.index, run.rooms, run.seed, run.attempts
    );
    if let Some(graph) = engine.session().graph() {
        println!("{}", graph.render_ascii());
    }

    for _ in 0..WALK_STEPS {
        let Some(trigger) = engine.session().armed_triggers().iter().next().copied() else {
            break;
        };
        engine.handle_event(DungeonEvent::DoorCrossed {
            trigger,
            target: trigger.room,
        })?;

        let mut frames = 0;
        let entered = loop {
            frames += 1;
            if let Some(room) = engine.tick(FRAME) {
                break room;
            }
        };
        println!("Entered {} after {} frames", entered, frames);

        let hostiles: Vec<_> = log
            .spawned()
            .into_iter()
            .filter(|(room, id)| {
                *room == entered
                    && engine
                        .session()
                        .current_room()
                        .is_some_and(|r| r.has_hostile(*id))
            })
            .collect();
        for (room, hostile) in hostiles {
            let outcome = engine.handle_event(DungeonEvent::HostileDefeated { room, hostile })?;
            println!("  defeated {} -> {:?}", hostile, outcome);
        }
    }

    let report = survey(&config.generation, config.seed, SURVEY_RUNS);
    println!("{}", report.to_json());
    Ok(())
}
