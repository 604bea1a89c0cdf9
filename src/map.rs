use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::coordinate::Coordinate;
use crate::drone::Drone;
use crate::error::TileError;
use crate::tile::Tile;
use crate::types::{Context, DroneId, Icon, MapId, MAX_SEARCH_ITERATIONS};

#[derive(Clone, Copy, Eq, PartialEq)]
struct Node {
    cost: u32,
    position: Coordinate,
}

// Reversed so the BinaryHeap pops the cheapest node first.
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Everything the Overlord has learned about one deployment zone.
pub struct Map {
    id: MapId,
    density: f32,
    tiles: BTreeMap<Coordinate, Tile>,
    origin: Option<Coordinate>,                // NOTE - Fixed by the first report
    untasked_minerals: BTreeSet<Coordinate>,   // NOTE - Known deposits nobody is heading for
    tasked_minerals: BTreeSet<Coordinate>,     // NOTE - Deposits promised to a miner
    scout_count: u32,
    positions: BTreeMap<DroneId, Coordinate>,  // NOTE - Who stands where on this map
}

impl Map {
    pub fn new(id: MapId, density: f32) -> Self {
        Self {
            id,
            density,
            tiles: BTreeMap::new(),
            origin: None,
            untasked_minerals: BTreeSet::new(),
            tasked_minerals: BTreeSet::new(),
            scout_count: 0,
            positions: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// The deploy zone, known once the first drone has reported.
    pub fn origin(&self) -> Option<Coordinate> {
        self.origin
    }

    pub fn tile(&self, coordinate: Coordinate) -> Option<&Tile> {
        self.tiles.get(&coordinate)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Inserts or replaces a tile.
    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.coordinate(), tile);
    }

    /// Displayed icon at `coordinate`, `None` when unseen or undiscovered.
    pub fn icon_at(&self, coordinate: Coordinate) -> Option<Icon> {
        self.tiles.get(&coordinate).and_then(Tile::icon)
    }

    pub fn terrain_at(&self, coordinate: Coordinate) -> Option<Icon> {
        self.tiles.get(&coordinate).and_then(Tile::terrain)
    }

    pub fn discovered_count(&self) -> usize {
        self.tiles.values().filter(|tile| tile.is_discovered()).count()
    }

    /// Merges a drone's report into the map.
    ///
    /// Each reported neighbour is written, minerals are tracked, and every still
    /// unknown cardinal neighbour of a reported tile gets an undiscovered placeholder so
    /// the frontier can be enumerated. The first report on a fresh map fixes the origin.
    pub fn update_context(&mut self, context: &Context) {
        let position = context.coordinate();
        if self.origin.is_none() {
            debug!(map = %self.id, origin = %position, "map origin discovered");
            self.origin = Some(position);
            self.tiles
                .insert(position, Tile::discovered(position, Icon::DeployZone));
        }

        for (coordinate, icon) in position.cardinals().into_iter().zip(context.neighbors()) {
            self.record_terrain(coordinate, icon);
            for neighbor in coordinate.cardinals() {
                self.tiles
                    .entry(neighbor)
                    .or_insert_with(|| Tile::new(neighbor));
            }
        }
        trace!(map = %self.id, at = %position, tiles = self.tiles.len(), "context merged");
    }

    fn record_terrain(&mut self, coordinate: Coordinate, icon: Icon) {
        // A drone standing there hides the ground; keep whatever we knew.
        if icon == Icon::Occupied {
            return;
        }
        self.tiles
            .entry(coordinate)
            .or_insert_with(|| Tile::new(coordinate))
            .set_terrain(icon);

        if icon == Icon::Mineral {
            if !self.tasked_minerals.contains(&coordinate) {
                self.untasked_minerals.insert(coordinate);
            }
        } else {
            // mined out, whether or not someone was on it
            self.untasked_minerals.remove(&coordinate);
            self.tasked_minerals.remove(&coordinate);
        }
    }

    pub fn unexplored_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(|tile| !tile.is_discovered())
    }

    /// Cheapest known route from `start` to `end`, inclusive of both ends.
    ///
    /// Entering a tile costs its icon's path weight; walls, minerals and undiscovered
    /// tiles are never expanded. `end` only has to be adjacent to an expanded tile, so
    /// minerals and unknown tiles are valid destinations. Returns an empty path when
    /// nothing is found within `MAX_SEARCH_ITERATIONS` pops.
    pub fn dijkstra(&self, start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
        let mut open_set = BinaryHeap::new();
        let mut visited: HashSet<Coordinate> = HashSet::new();
        let mut best_cost: HashMap<Coordinate, u32> = HashMap::new();
        let mut came_from: HashMap<Coordinate, Coordinate> = HashMap::new();

        best_cost.insert(start, 0);
        open_set.push(Node {
            cost: 0,
            position: start,
        });

        let mut iterations = 0;
        while let Some(Node { cost, position }) = open_set.pop() {
            if iterations == MAX_SEARCH_ITERATIONS {
                debug!(map = %self.id, %start, %end, "search budget exhausted");
                return Vec::new();
            }
            iterations += 1;

            if !visited.insert(position) {
                continue;
            }
            if position == end {
                return rebuild_path(start, end, &came_from);
            }
            let neighbors = position.cardinals();
            if neighbors.contains(&end) {
                came_from.insert(end, position);
                return rebuild_path(start, end, &came_from);
            }

            for neighbor in neighbors {
                if visited.contains(&neighbor) {
                    continue;
                }
                let Some(weight) = self.icon_at(neighbor).and_then(Icon::path_weight) else {
                    continue;
                };
                let tentative = cost + weight;
                if best_cost.get(&neighbor).is_none_or(|&known| tentative < known) {
                    best_cost.insert(neighbor, tentative);
                    came_from.insert(neighbor, position);
                    open_set.push(Node {
                        cost: tentative,
                        position: neighbor,
                    });
                }
            }
        }

        Vec::new()
    }

    pub fn has_untasked_minerals(&self) -> bool {
        !self.untasked_minerals.is_empty()
    }

    pub fn untasked_minerals(&self) -> &BTreeSet<Coordinate> {
        &self.untasked_minerals
    }

    pub fn tasked_minerals(&self) -> &BTreeSet<Coordinate> {
        &self.tasked_minerals
    }

    /// Hands the closest reachable untasked mineral to `miner` and returns the full
    /// route, mineral included.
    ///
    /// Minerals are tried nearest to the origin first. When none of them has a known
    /// route they all stay untasked and the miner is left untouched.
    pub fn task_miner(&mut self, miner: &mut Drone) -> Vec<Coordinate> {
        let Some(origin) = self.origin else {
            return Vec::new();
        };
        let mut candidates: Vec<Coordinate> = self.untasked_minerals.iter().copied().collect();
        candidates.sort_by_key(|mineral| origin.manhattan(*mineral));

        for mineral in candidates {
            let path = self.dijkstra(origin, mineral);
            if path.is_empty() {
                // NOTE - Left untasked, a later report may open a way in
                trace!(map = %self.id, %mineral, "no known route to mineral");
                continue;
            }
            self.untasked_minerals.remove(&mineral);
            self.tasked_minerals.insert(mineral);
            debug!(map = %self.id, %mineral, miner = %miner.id(), "mineral tasked");
            miner.set_path(path.clone());
            return path;
        }

        warn!(map = %self.id, "no untasked mineral can be reached");
        Vec::new()
    }

    /// Returns a tasked mineral to the untasked pool, e.g. when its miner died.
    pub fn untask_mineral(&mut self, mineral: Coordinate) {
        if self.tasked_minerals.remove(&mineral) {
            self.untasked_minerals.insert(mineral);
        }
    }

    pub fn scout_count(&self) -> u32 {
        self.scout_count
    }

    pub fn add_scout(&mut self) {
        self.scout_count += 1;
    }

    pub fn remove_scout(&mut self) {
        self.scout_count = self.scout_count.saturating_sub(1);
    }

    /// Moves `drone` onto `at`. `Ok(false)` when the tile is blocked or taken, in which
    /// case the drone is not tracked as an occupant.
    pub fn place_drone(&mut self, drone: DroneId, at: Coordinate) -> Result<bool, TileError> {
        if self.positions.get(&drone) == Some(&at) {
            return Ok(true);
        }
        self.remove_drone(drone)?;

        let Some(tile) = self.tiles.get_mut(&at) else {
            return Err(TileError::OccupyUndiscovered(at));
        };
        let placed = tile.occupy(drone)?;
        if placed {
            self.positions.insert(drone, at);
        }
        Ok(placed)
    }

    pub fn remove_drone(&mut self, drone: DroneId) -> Result<(), TileError> {
        if let Some(previous) = self.positions.remove(&drone) {
            if let Some(tile) = self.tiles.get_mut(&previous) {
                tile.unoccupy()?;
            }
        }
        Ok(())
    }

    pub fn drone_position(&self, drone: DroneId) -> Option<Coordinate> {
        self.positions.get(&drone).copied()
    }

    pub fn origin_occupied(&self) -> bool {
        self.origin
            .and_then(|origin| self.tiles.get(&origin))
            .is_some_and(|tile| tile.occupant().is_some())
    }
}

fn rebuild_path(
    start: Coordinate,
    end: Coordinate,
    came_from: &HashMap<Coordinate, Coordinate>,
) -> Vec<Coordinate> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let Some(&previous) = came_from.get(&current) else {
            return Vec::new();
        };
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
