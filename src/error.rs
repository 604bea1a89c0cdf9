use thiserror::Error;

use crate::coordinate::Coordinate;
use crate::types::{DroneId, MapId};

/// A token that is not one of the cardinal direction names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectionError {
    #[error("unknown direction '{0}'")]
    Unknown(String),
}

/// A terrain code outside `# ~ * _ Z` and space.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IconError {
    #[error("unknown terrain code '{0}'")]
    UnknownCode(char),
}

/// Occupancy changes on tiles nobody has seen yet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TileError {
    #[error("tile at {0} is undiscovered and cannot be occupied")]
    OccupyUndiscovered(Coordinate),

    #[error("tile at {0} is undiscovered and cannot be unoccupied")]
    UnoccupyUndiscovered(Coordinate),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlueprintError {
    #[error(
        "total drone cost must be a whole number: health={health}, capacity={capacity}, moves={moves}"
    )]
    FractionalCost {
        health: i32,
        capacity: u32,
        moves: u32,
    },

    #[error("budget of {budget} cannot buy a minimum fleet costing {required}")]
    InsufficientBudget { budget: u32, required: u32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OverlordError {
    #[error("no drone with id {0}")]
    UnknownDrone(DroneId),

    #[error("no map with id {0}")]
    UnknownMap(MapId),

    #[error("drone {0} is not deployed")]
    NotDeployed(DroneId),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
