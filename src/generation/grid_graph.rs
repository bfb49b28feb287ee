//! Grid room-graph generator.
//!
//! Grows a connected set of rooms from the spawn cell with a randomized BFS,
//! tops it up from the frontier when growth stalls under `min_rooms`, then
//! computes spawn distances, places the Boss/Shop/Secret roles, and fixes
//! each room's door mask from the final occupancy.
//!
//! The random source is injected, so a seed fully determines the result.
//! Candidate pools are always sorted before sampling for the same reason.

use std::collections::{HashMap, VecDeque};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::engine::config::GenerationConfig;
use crate::error::{ConfigError, GenerationError};
use crate::graph::DungeonGraph;
use crate::grid::{Direction, GridCell};
use crate::room::{RoomNode, RoomRole, UNREACHABLE};

/// Boss, Shop and Secret each need their own room.
const ROLE_ROOMS: usize = 3;

/// Generation-only occupancy map. Discarded once rooms are built.
struct Occupancy {
    width: i32,
    height: i32,
    occupied: Vec<bool>,
    /// Occupied cells in placement order
    order: Vec<GridCell>,
}

impl Occupancy {
    fn new(width: i32, height: i32) -> Result<Self, GenerationError> {
        let cells = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                GenerationError::Invariant(format!("grid {}x{} has no addressable size", width, height))
            })?;
        Ok(Self {
            width,
            height,
            occupied: vec![false; cells],
            order: Vec::new(),
        })
    }

    /// Row-major index. `new` bounds `width * height` to `i32`, so this cannot overflow.
    fn index(&self, cell: GridCell) -> Option<usize> {
        cell.in_bounds(self.width, self.height)
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// In bounds and still free.
    fn is_free(&self, cell: GridCell) -> bool {
        self.index(cell).is_some_and(|i| !self.occupied[i])
    }

    fn occupy(&mut self, cell: GridCell) {
        if let Some(i) = self.index(cell) {
            if !self.occupied[i] {
                self.occupied[i] = true;
                self.order.push(cell);
            }
        }
    }

    fn count(&self) -> usize {
        self.order.len()
    }

    /// Free in-bounds cells next to an occupied one. A cell touching k
    /// occupied cells appears k times, which biases picks towards pockets.
    fn frontier(&self) -> Vec<GridCell> {
        self.order
            .iter()
            .flat_map(|cell| cell.neighbors())
            .filter(|n| self.is_free(*n))
            .collect()
    }
}

pub struct GridGraphGenerator {
    config: GenerationConfig,
}

impl GridGraphGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate from a seed using the crate's standard RNG.
    pub fn generate_seeded(&self, seed: u64) -> Result<DungeonGraph, GenerationError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.generate(&mut rng)
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DungeonGraph, GenerationError> {
        let cfg = &self.config;

        let mut occupancy = Occupancy::new(cfg.width, cfg.height)?;
        self.grow(&mut occupancy, rng);
        self.fill_to_minimum(&mut occupancy, rng)?;

        let required = self.required_rooms();
        if occupancy.count() < required {
            return Err(GenerationError::InsufficientRooms {
                placed: occupancy.count(),
                required,
            });
        }

        let mut rooms: HashMap<GridCell, RoomNode> = occupancy
            .order
            .iter()
            .map(|cell| (*cell, RoomNode::new(*cell)))
            .collect();

        assign_distances(&mut rooms, cfg.start)?;
        assign_roles(&mut rooms, rng)?;

        let mut graph = DungeonGraph::new(cfg.width, cfg.height, cfg.start, rooms);
        for cell in graph.cells() {
            let mask = graph.adjacency_mask(cell);
            if let Some(room) = graph.room_mut(cell) {
                room.set_door_mask(mask);
            }
        }
        Ok(graph)
    }

    /// Randomized BFS from the start cell, capped at `max_rooms`.
    fn grow<R: Rng + ?Sized>(&self, occupancy: &mut Occupancy, rng: &mut R) {
        let cfg = &self.config;
        let mut queue = VecDeque::from([cfg.start]);
        occupancy.occupy(cfg.start);

        while let Some(current) = queue.pop_front() {
            if occupancy.count() >= cfg.max_rooms {
                break;
            }
            let mut dirs = Direction::ALL;
            dirs.shuffle(rng);

            for dir in dirs {
                if occupancy.count() >= cfg.max_rooms {
                    break;
                }
                let next = current.step(dir);
                if !occupancy.is_free(next) {
                    continue;
                }
                if rng.gen_bool(cfg.expansion_probability) {
                    occupancy.occupy(next);
                    queue.push_back(next);
                }
            }
        }
    }

    /// `min_rooms`, raised so the three role rooms always fit.
    fn required_rooms(&self) -> usize {
        self.config.min_rooms.max(ROLE_ROOMS)
    }

    /// Occupy random frontier cells until the required room count is
    /// reached, never past `max_rooms`.
    fn fill_to_minimum<R: Rng + ?Sized>(
        &self,
        occupancy: &mut Occupancy,
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        let target = self.required_rooms().min(self.config.max_rooms);
        while occupancy.count() < target {
            let frontier = occupancy.frontier();
            let Some(cell) = frontier.choose(rng).copied() else {
                return Err(GenerationError::InsufficientRooms {
                    placed: occupancy.count(),
                    required: self.required_rooms(),
                });
            };
            occupancy.occupy(cell);
        }
        Ok(())
    }
}

/// BFS hop counts from `start` over room adjacency.
fn assign_distances(
    rooms: &mut HashMap<GridCell, RoomNode>,
    start: GridCell,
) -> Result<(), GenerationError> {
    let mut distances: HashMap<GridCell, u32> = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);

    while let Some(cell) = queue.pop_front() {
        let next_distance = distances[&cell] + 1;
        for neighbor in cell.neighbors() {
            if rooms.contains_key(&neighbor) && !distances.contains_key(&neighbor) {
                distances.insert(neighbor, next_distance);
                queue.push_back(neighbor);
            }
        }
    }

    for (cell, room) in rooms.iter_mut() {
        room.distance_from_spawn = distances.get(cell).copied().unwrap_or(UNREACHABLE);
    }

    if let Some(orphan) = rooms
        .values()
        .find(|r| r.distance_from_spawn == UNREACHABLE)
    {
        let msg = format!("room {} unreachable from spawn {}", orphan.position(), start);
        debug_assert!(false, "{}", msg);
        return Err(GenerationError::Invariant(msg));
    }
    Ok(())
}

/// Boss at maximum distance, Shop on a leaf when possible, Secret anywhere else.
fn assign_roles<R: Rng + ?Sized>(
    rooms: &mut HashMap<GridCell, RoomNode>,
    rng: &mut R,
) -> Result<(), GenerationError> {
    let mut cells: Vec<GridCell> = rooms.keys().copied().collect();
    cells.sort();

    let max_distance = rooms
        .values()
        .map(|r| r.distance_from_spawn)
        .max()
        .unwrap_or(0);
    let furthest: Vec<GridCell> = cells
        .iter()
        .copied()
        .filter(|c| rooms[c].distance_from_spawn == max_distance)
        .collect();
    let boss = pick(&furthest, rng, "boss")?;

    let leaves: Vec<GridCell> = cells
        .iter()
        .copied()
        .filter(|c| *c != boss)
        .filter(|c| c.neighbors().iter().filter(|n| rooms.contains_key(n)).count() == 1)
        .collect();
    let shop = if leaves.is_empty() {
        let remaining: Vec<GridCell> = cells.iter().copied().filter(|c| *c != boss).collect();
        pick(&remaining, rng, "shop")?
    } else {
        pick(&leaves, rng, "shop")?
    };

    let secret_pool: Vec<GridCell> = cells
        .iter()
        .copied()
        .filter(|c| *c != boss && *c != shop)
        .collect();
    let secret = pick(&secret_pool, rng, "secret")?;

    for (cell, role) in [(boss, RoomRole::Boss), (shop, RoomRole::Shop), (secret, RoomRole::Secret)] {
        if let Some(room) = rooms.get_mut(&cell) {
            room.role = role;
        }
    }
    tracing::debug!(%boss, %shop, %secret, max_distance, "room roles assigned");
    Ok(())
}

fn pick<R: Rng + ?Sized>(
    pool: &[GridCell],
    rng: &mut R,
    role: &str,
) -> Result<GridCell, GenerationError> {
    pool.choose(rng)
        .copied()
        .ok_or_else(|| GenerationError::Invariant(format!("no candidate room for {}", role)))
}
