//! # World Module
//!
//! Ground truth for the reference driver. A `Zone` is a fully known grid generated from
//! Perlin noise; a `Simulation` plays the driver's part of the per-tick protocol: it
//! applies the Overlord's orders, builds each drone's context and resolves the moves the
//! drones answer with.
//!
//! Zones use the same coordinates as the Overlord's maps: `x` grows east, `y` grows
//! north, and `(0, 0)` is the south-west corner.

use std::collections::{BTreeMap, BTreeSet};

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::coordinate::Coordinate;
use crate::error::{IconError, OverlordError};
use crate::overlord::{Action, Overlord};
use crate::types::{Context, Direction, DroneId, Icon, MapId};

/// NOTE - Units held by a mineral deposit built from a text layout
pub const DEFAULT_DEPOSIT: u32 = 3;

pub struct Zone {
    tiles: Vec<Vec<Icon>>,
    deposits: BTreeMap<Coordinate, u32>,
    deploy_zone: Coordinate,
}

impl Zone {
    /// Noise terrain walled in on every side, with a clear area around a central
    /// deploy zone. The same seed always yields the same zone.
    pub fn generate(seed: u64, width: usize, height: usize) -> Self {
        let width = width.max(7);
        let height = height.max(7);
        let perlin = Perlin::new(seed as u32);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut tiles = vec![vec![Icon::Empty; width]; height];
        let mut deposits = BTreeMap::new();

        for (y, row) in tiles.iter_mut().enumerate() {
            for (x, tile) in row.iter_mut().enumerate() {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    *tile = Icon::Wall;
                    continue;
                }
                let nx = x as f64 / width as f64;
                let ny = y as f64 / height as f64;
                let value = perlin.get([nx * 6.0, ny * 6.0]);

                *tile = if value > 0.4 {
                    Icon::Wall
                } else if value > 0.25 {
                    Icon::Mineral
                } else if value < -0.45 {
                    Icon::Acid
                } else {
                    Icon::Empty
                };
                if *tile == Icon::Mineral {
                    deposits.insert(Coordinate::new(x as i32, y as i32), rng.gen_range(2..=6));
                }
            }
        }

        let deploy_zone = Coordinate::new((width / 2) as i32, (height / 2) as i32);
        let mut zone = Self {
            tiles,
            deposits,
            deploy_zone,
        };
        // Deploy area clear
        for dy in -2..=2 {
            for dx in -2..=2 {
                zone.set(Coordinate::new(deploy_zone.x + dx, deploy_zone.y + dy), Icon::Empty);
            }
        }
        zone.set(deploy_zone, Icon::DeployZone);
        debug!(seed, width, height, minerals = zone.remaining_minerals(), "zone generated");
        zone
    }

    /// Builds a zone from wire codes, rows listed top (highest `y`) first. Every
    /// mineral holds `DEFAULT_DEPOSIT` units. Without a `_` the centre becomes the
    /// deploy zone.
    pub fn from_rows(rows: &[&str]) -> Result<Self, IconError> {
        let height = rows.len();
        let mut tiles = vec![Vec::new(); height];
        let mut deposits = BTreeMap::new();
        let mut deploy_zone = None;

        for (row, line) in rows.iter().enumerate() {
            let y = height - 1 - row;
            for (x, code) in line.chars().enumerate() {
                let icon = Icon::try_from(code)?;
                let at = Coordinate::new(x as i32, y as i32);
                match icon {
                    Icon::Mineral => {
                        deposits.insert(at, DEFAULT_DEPOSIT);
                    }
                    Icon::DeployZone if deploy_zone.is_none() => deploy_zone = Some(at),
                    _ => {}
                }
                tiles[y].push(icon);
            }
        }

        let width = tiles.iter().map(Vec::len).max().unwrap_or(0);
        let mut zone = Self {
            tiles,
            deposits,
            deploy_zone: Coordinate::new((width / 2) as i32, (height / 2) as i32),
        };
        match deploy_zone {
            Some(at) => zone.deploy_zone = at,
            None => zone.set(zone.deploy_zone, Icon::DeployZone),
        }
        Ok(zone)
    }

    pub fn deploy_zone(&self) -> Coordinate {
        self.deploy_zone
    }

    /// Terrain at `at`; anything off the grid is wall.
    pub fn icon_at(&self, at: Coordinate) -> Icon {
        usize::try_from(at.y)
            .ok()
            .zip(usize::try_from(at.x).ok())
            .and_then(|(y, x)| self.tiles.get(y)?.get(x).copied())
            .unwrap_or(Icon::Wall)
    }

    fn set(&mut self, at: Coordinate, icon: Icon) {
        let (Ok(y), Ok(x)) = (usize::try_from(at.y), usize::try_from(at.x)) else {
            return;
        };
        if let Some(tile) = self.tiles.get_mut(y).and_then(|row| row.get_mut(x)) {
            *tile = icon;
            if icon != Icon::Mineral {
                self.deposits.remove(&at);
            }
        }
    }

    /// What a drone standing at `at` sees. Traversable neighbours listed in `occupied`
    /// show up as `Occupied`.
    pub fn context_at(&self, at: Coordinate, occupied: &BTreeSet<Coordinate>) -> Context {
        let neighbors = at.cardinals().map(|neighbor| {
            let icon = self.icon_at(neighbor);
            if icon.traversable() && occupied.contains(&neighbor) {
                Icon::Occupied
            } else {
                icon
            }
        });
        Context::new(at, neighbors)
    }

    /// Share of the grid covered by walls.
    pub fn density(&self) -> f32 {
        let total: usize = self.tiles.iter().map(Vec::len).sum();
        if total == 0 {
            return 0.0;
        }
        let walls = self
            .tiles
            .iter()
            .flatten()
            .filter(|icon| **icon == Icon::Wall)
            .count();
        walls as f32 / total as f32
    }

    pub fn remaining_minerals(&self) -> u32 {
        self.deposits.values().sum()
    }

    pub fn deposit_at(&self, at: Coordinate) -> Option<u32> {
        self.deposits.get(&at).copied()
    }

    /// Applies a drone's answer and returns where it ends up.
    ///
    /// Moving into a mineral mines one unit and leaves the drone in place; a depleted
    /// deposit turns into empty ground. Walls stop the drone, and so do other drones
    /// anywhere but on the deploy zone.
    pub fn resolve_move(
        &mut self,
        from: Coordinate,
        direction: Direction,
        occupied: &BTreeSet<Coordinate>,
    ) -> Coordinate {
        let target = from.translate(direction);
        if target == from {
            return from;
        }
        match self.icon_at(target) {
            Icon::Mineral => {
                if let Some(units) = self.deposits.get_mut(&target) {
                    *units = units.saturating_sub(1);
                    trace!(at = %target, left = *units, "mineral mined");
                    if *units == 0 {
                        self.set(target, Icon::Empty);
                    }
                }
                from
            }
            icon if icon.traversable() => {
                if target != self.deploy_zone && occupied.contains(&target) {
                    from
                } else {
                    target
                }
            }
            _ => from,
        }
    }
}

/// Reference driver: an Overlord playing against generated zones.
pub struct Simulation {
    overlord: Overlord,
    zones: BTreeMap<MapId, Zone>,
    positions: BTreeMap<DroneId, (MapId, Coordinate)>,
}

impl Simulation {
    /// Registers every zone with the Overlord under its key.
    pub fn new(mut overlord: Overlord, zones: BTreeMap<MapId, Zone>) -> Self {
        for (id, zone) in &zones {
            overlord.add_map(*id, zone.density());
        }
        Self {
            overlord,
            zones,
            positions: BTreeMap::new(),
        }
    }

    pub fn overlord(&self) -> &Overlord {
        &self.overlord
    }

    pub fn zone(&self, id: MapId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Where each deployed drone stands in its zone.
    pub fn positions(&self) -> &BTreeMap<DroneId, (MapId, Coordinate)> {
        &self.positions
    }

    /// One protocol round: the Overlord's step, then every deployed drone acts once per
    /// point of `moves`.
    pub fn tick(&mut self) -> Result<Action, OverlordError> {
        let action = self.overlord.step()?;
        match action {
            Action::Deploy { drone, map } => {
                let zone = self.zones.get(&map).ok_or(OverlordError::UnknownMap(map))?;
                self.positions.insert(drone, (map, zone.deploy_zone()));
            }
            Action::Return { drone } => {
                self.positions.remove(&drone);
            }
            Action::Idle => {}
        }

        let deployed: Vec<DroneId> = self.positions.keys().copied().collect();
        for drone in deployed {
            let moves = self.overlord.drone(drone).map_or(0, |unit| unit.stats().moves);
            for _ in 0..moves {
                if !self.act(drone)? {
                    break;
                }
            }
        }
        Ok(action)
    }

    /// Returns false once the drone is gone.
    fn act(&mut self, drone: DroneId) -> Result<bool, OverlordError> {
        let Some(&(map, at)) = self.positions.get(&drone) else {
            return Ok(false);
        };
        if self.overlord.drone(drone).is_none() {
            self.positions.remove(&drone);
            return Ok(false);
        }
        let occupied: BTreeSet<Coordinate> = self
            .positions
            .iter()
            .filter(|(other, (other_map, _))| **other != drone && *other_map == map)
            .map(|(_, (_, position))| *position)
            .collect();
        let zone = self.zones.get_mut(&map).ok_or(OverlordError::UnknownMap(map))?;

        let context = zone.context_at(at, &occupied);
        let direction = self.overlord.drone_action(drone, &context)?;
        if self.overlord.drone(drone).is_none() {
            info!(%drone, %map, %at, "drone wreck left on the field");
            self.positions.remove(&drone);
            return Ok(false);
        }
        let next = zone.resolve_move(at, direction, &occupied);
        self.positions.insert(drone, (map, next));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn generated_zone_is_walled_with_a_clear_deploy_area() {
        let zone = Zone::generate(11, 30, 20);
        let center = zone.deploy_zone();
        assert_eq!(center, c(15, 10));
        assert_eq!(zone.icon_at(center), Icon::DeployZone);
        for neighbor in center.cardinals() {
            assert_eq!(zone.icon_at(neighbor), Icon::Empty);
        }
        for x in 0..30 {
            assert_eq!(zone.icon_at(c(x, 0)), Icon::Wall);
            assert_eq!(zone.icon_at(c(x, 19)), Icon::Wall);
        }
        assert_eq!(zone.icon_at(c(-1, 5)), Icon::Wall);
        assert_eq!(zone.icon_at(c(31, 5)), Icon::Wall);
        assert!(zone.density() > 0.0);
    }

    #[test]
    fn same_seed_same_zone() {
        let a = Zone::generate(5, 24, 24);
        let b = Zone::generate(5, 24, 24);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.deposits, b.deposits);
    }

    #[test]
    fn rows_are_read_top_down() {
        let zone = Zone::from_rows(&["#*#", "#_ ", "###"]).unwrap();
        assert_eq!(zone.deploy_zone(), c(1, 1));
        assert_eq!(zone.icon_at(c(1, 2)), Icon::Mineral);
        assert_eq!(zone.icon_at(c(2, 1)), Icon::Empty);
        assert_eq!(zone.deposit_at(c(1, 2)), Some(DEFAULT_DEPOSIT));
        assert!(Zone::from_rows(&["#x#"]).is_err());
    }

    #[test]
    fn context_shows_other_drones() {
        let zone = Zone::from_rows(&["   ", " _ ", "   "]).unwrap();
        let occupied = BTreeSet::from([c(1, 2), c(0, 0)]);
        let context = zone.context_at(c(1, 1), &occupied);
        assert_eq!(
            context.neighbors(),
            [Icon::Occupied, Icon::Empty, Icon::Empty, Icon::Empty]
        );
    }

    #[test]
    fn mining_depletes_deposits() {
        let mut zone = Zone::from_rows(&["*", "_"]).unwrap();
        let none = BTreeSet::new();
        for left in (0..DEFAULT_DEPOSIT).rev() {
            assert_eq!(zone.resolve_move(c(0, 0), Direction::North, &none), c(0, 0));
            assert_eq!(zone.remaining_minerals(), left);
        }
        assert_eq!(zone.icon_at(c(0, 1)), Icon::Empty);
        assert_eq!(zone.resolve_move(c(0, 0), Direction::North, &none), c(0, 1));
    }

    #[test]
    fn walls_and_drones_block_moves() {
        let mut zone = Zone::from_rows(&["#  _"]).unwrap();
        let none = BTreeSet::new();
        assert_eq!(zone.resolve_move(c(1, 0), Direction::West, &none), c(1, 0));
        assert_eq!(zone.resolve_move(c(1, 0), Direction::East, &none), c(2, 0));
        let taken = BTreeSet::from([c(2, 0)]);
        assert_eq!(zone.resolve_move(c(1, 0), Direction::East, &taken), c(1, 0));
        // the deploy zone holds any number of drones
        let landing = BTreeSet::from([c(3, 0)]);
        assert_eq!(zone.resolve_move(c(2, 0), Direction::East, &landing), c(3, 0));
    }
}
