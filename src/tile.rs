use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::TileError;
use crate::types::{DroneId, Icon};

/// One cell of a map as far as the Overlord knows it.
///
/// `terrain == None` means nobody has reported this cell yet. The occupant is a plain
/// id: the map owns tiles, the Overlord owns drones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    coordinate: Coordinate,
    terrain: Option<Icon>,
    occupant: Option<DroneId>,
}

impl Tile {
    /// An undiscovered placeholder.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            terrain: None,
            occupant: None,
        }
    }

    pub fn discovered(coordinate: Coordinate, terrain: Icon) -> Self {
        Self {
            coordinate,
            terrain: Some(terrain),
            occupant: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Icon as displayed: `Occupied` while a drone stands here, else the terrain.
    pub fn icon(&self) -> Option<Icon> {
        match self.occupant {
            Some(_) => Some(Icon::Occupied),
            None => self.terrain,
        }
    }

    /// Ground truth, unaffected by occupation.
    pub fn terrain(&self) -> Option<Icon> {
        self.terrain
    }

    pub fn set_terrain(&mut self, terrain: Icon) {
        self.terrain = Some(terrain);
    }

    pub fn is_discovered(&self) -> bool {
        self.terrain.is_some()
    }

    pub fn occupant(&self) -> Option<DroneId> {
        self.occupant
    }

    /// Places `drone` on this tile.
    ///
    /// Returns `Ok(false)` when the terrain is not traversable or another drone is
    /// already here. Occupying an undiscovered tile is a caller bug and is an error.
    pub fn occupy(&mut self, drone: DroneId) -> Result<bool, TileError> {
        let Some(terrain) = self.terrain else {
            return Err(TileError::OccupyUndiscovered(self.coordinate));
        };
        if !terrain.traversable() {
            return Ok(false);
        }
        match self.occupant {
            Some(current) => Ok(current == drone),
            None => {
                self.occupant = Some(drone);
                Ok(true)
            }
        }
    }

    /// Clears the occupant. `Ok(false)` when nobody was here.
    pub fn unoccupy(&mut self) -> Result<bool, TileError> {
        if !self.is_discovered() {
            return Err(TileError::UnoccupyUndiscovered(self.coordinate));
        }
        Ok(self.occupant.take().is_some())
    }
}
