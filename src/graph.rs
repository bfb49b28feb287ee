//! The generated room graph.
//!
//! Rooms are keyed by [`GridCell`]; two rooms are adjacent iff their cells
//! are one axis-aligned step apart. The graph is connected by construction.
//! [`DungeonGraph::validate`] re-checks every structural invariant through an
//! independent petgraph view and is used by tests and the survey.

use std::collections::HashMap;
use std::fmt;

use bevy::math::Vec2;
use petgraph::algo::dijkstra;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::engine::config::LayoutConfig;
use crate::grid::{Direction, DoorMask, GridCell};
use crate::room::{RoomNode, RoomRole, UNREACHABLE};

/// A door trigger volume: the doorway on `side` of `room`.
///
/// The trigger sits just inside `room`, so crossing it means the player is
/// stepping into `room`; `room` is its transition target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId {
    pub room: GridCell,
    pub side: Direction,
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.room, self.side)
    }
}

/// One minimap icon, positioned in normalized `[0, 1]` map space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimapEntry {
    pub cell: GridCell,
    pub role: RoomRole,
    pub normalized: (f32, f32),
}

#[derive(Debug, Clone)]
pub struct DungeonGraph {
    width: i32,
    height: i32,
    start: GridCell,
    rooms: HashMap<GridCell, RoomNode>,
}

impl DungeonGraph {
    pub(crate) fn new(
        width: i32,
        height: i32,
        start: GridCell,
        rooms: HashMap<GridCell, RoomNode>,
    ) -> Self {
        Self {
            width,
            height,
            start,
            rooms,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The spawn cell; its room is the initial active room.
    pub fn start(&self) -> GridCell {
        self.start
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.rooms.contains_key(&cell)
    }

    pub fn room(&self, cell: GridCell) -> Option<&RoomNode> {
        self.rooms.get(&cell)
    }

    pub(crate) fn room_mut(&mut self, cell: GridCell) -> Option<&mut RoomNode> {
        self.rooms.get_mut(&cell)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomNode> {
        self.rooms.values()
    }

    /// All cells, sorted so iteration is reproducible.
    pub fn cells(&self) -> Vec<GridCell> {
        let mut cells: Vec<GridCell> = self.rooms.keys().copied().collect();
        cells.sort();
        cells
    }

    /// Occupied neighbours of `cell`.
    pub fn neighbors(&self, cell: GridCell) -> impl Iterator<Item = GridCell> + '_ {
        cell.neighbors()
            .into_iter()
            .filter(move |n| self.rooms.contains_key(n))
    }

    pub fn neighbor_count(&self, cell: GridCell) -> usize {
        self.neighbors(cell).count()
    }

    /// Door mask implied by occupancy alone.
    pub fn adjacency_mask(&self, cell: GridCell) -> DoorMask {
        let mut mask = DoorMask::NONE;
        for dir in Direction::ALL {
            mask.set(dir, self.rooms.contains_key(&cell.step(dir)));
        }
        mask
    }

    /// Every door trigger of the room at `cell`.
    pub fn triggers_of(&self, cell: GridCell) -> Vec<TriggerId> {
        self.room(cell)
            .map(|room| {
                room.doors()
                    .directions()
                    .map(|side| TriggerId { room: cell, side })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every door trigger in the dungeon.
    pub fn all_triggers(&self) -> Vec<TriggerId> {
        self.cells()
            .into_iter()
            .flat_map(|cell| self.triggers_of(cell))
            .collect()
    }

    pub fn room_with_role(&self, role: RoomRole) -> Option<&RoomNode> {
        self.rooms.values().find(|r| r.role == role)
    }

    pub fn max_distance(&self) -> u32 {
        self.rooms
            .values()
            .map(|r| r.distance_from_spawn)
            .filter(|d| *d != UNREACHABLE)
            .max()
            .unwrap_or(0)
    }

    /// World-space centre of a room cell, with the grid centred on the origin.
    pub fn world_center(&self, cell: GridCell, layout: &LayoutConfig) -> Vec2 {
        let center_x = (self.width - 1) as f32 / 2.0;
        let center_y = (self.height - 1) as f32 / 2.0;
        Vec2::new(
            (cell.x as f32 - center_x) * layout.spacing_x,
            (cell.y as f32 - center_y) * layout.spacing_y,
        )
    }

    pub fn player_spawn(&self, layout: &LayoutConfig) -> Vec2 {
        let (ox, oy) = layout.player_spawn_offset;
        self.world_center(self.start, layout) + Vec2::new(ox, oy)
    }

    /// Minimap icons, normalized over the bounding box of room centres.
    pub fn minimap_entries(&self, layout: &LayoutConfig) -> Vec<MinimapEntry> {
        let cells = self.cells();
        let centers: Vec<Vec2> = cells
            .iter()
            .map(|c| self.world_center(*c, layout))
            .collect();
        let min = centers.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min);
        let max = centers.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max);
        let extent = (max - min).max(Vec2::ONE);

        cells
            .iter()
            .zip(centers)
            .filter_map(|(cell, center)| {
                let room = self.room(*cell)?;
                let n = (center - min) / extent;
                Some(MinimapEntry {
                    cell: *cell,
                    role: room.role,
                    normalized: (n.x, n.y),
                })
            })
            .collect()
    }

    fn to_petgraph(&self) -> UnGraphMap<GridCell, ()> {
        let mut graph = UnGraphMap::new();
        for cell in self.cells() {
            graph.add_node(cell);
        }
        for cell in self.cells() {
            for dir in [Direction::North, Direction::East] {
                let next = cell.step(dir);
                if self.rooms.contains_key(&next) {
                    graph.add_edge(cell, next, ());
                }
            }
        }
        graph
    }

    pub fn is_connected(&self) -> bool {
        if !self.contains(self.start) {
            return false;
        }
        dijkstra(&self.to_petgraph(), self.start, None, |_| 1u32).len() == self.len()
    }

    /// Check every structural invariant, reporting the first one broken.
    pub fn validate(&self) -> Result<(), String> {
        if !self.contains(self.start) {
            return Err(format!("start cell {} has no room", self.start));
        }

        let distances = dijkstra(&self.to_petgraph(), self.start, None, |_| 1u32);
        if distances.len() != self.len() {
            return Err(format!(
                "graph disconnected: {} of {} rooms reachable",
                distances.len(),
                self.len()
            ));
        }

        for (cell, room) in &self.rooms {
            if room.position() != *cell {
                return Err(format!("room at {} is keyed as {}", room.position(), cell));
            }
            if !cell.in_bounds(self.width, self.height) {
                return Err(format!("room {} outside the grid", cell));
            }
            if distances.get(cell) != Some(&room.distance_from_spawn) {
                return Err(format!(
                    "room {} records distance {} but BFS says {:?}",
                    cell,
                    room.distance_from_spawn,
                    distances.get(cell)
                ));
            }
            for dir in Direction::ALL {
                let door = room.doors().has(dir);
                let neighbor = self.rooms.get(&cell.step(dir));
                if door != neighbor.is_some() {
                    return Err(format!("room {} door {:?} disagrees with adjacency", cell, dir));
                }
                if let Some(neighbor) = neighbor {
                    if !neighbor.doors().has(dir.opposite()) {
                        return Err(format!("door {} {:?} has no matching door back", cell, dir));
                    }
                }
            }
        }

        for role in [RoomRole::Boss, RoomRole::Shop, RoomRole::Secret] {
            let count = self.rooms.values().filter(|r| r.role == role).count();
            if count != 1 {
                return Err(format!("expected exactly one {:?} room, found {}", role, count));
            }
        }

        let max = self.max_distance();
        if let Some(boss) = self.room_with_role(RoomRole::Boss) {
            if boss.distance_from_spawn != max {
                return Err(format!(
                    "boss at distance {} but maximum is {}",
                    boss.distance_from_spawn, max
                ));
            }
        }
        Ok(())
    }

    /// Text map, north at the top. `S` marks the spawn room.
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = GridCell::new(x, y);
                let glyph = match self.room(cell) {
                    Some(_) if cell == self.start => 'S',
                    Some(room) => room.role.glyph(),
                    None => '.',
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for DungeonGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_ascii())
    }
}
