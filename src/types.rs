//! # Zerg Mining Types Module
//!
//! This module defines the core data types shared by the discovery engine, the drones
//! and the Overlord. They are the vocabulary of the per-tick protocol spoken between the
//! engine and the external driver.
//!
//! ## Key Components
//!
//! - **Icon**: Terrain kinds a drone can report, with traversal and cost rules
//! - **Direction**: The movement command a drone answers with every tick
//! - **Context**: A drone's position plus the four terrain codes around it
//! - **DroneKind** / **DroneState**: Specialisation and behavioural state of a drone
//! - **DroneId** / **MapId**: Identifiers used on the wire (`DEPLOY 3 1`, `RETURN 3`)
//!
//! All types are serializable so snapshots can be handed to dashboards as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::{DirectionError, IconError};

/// NOTE - Pops allowed in a single Dijkstra search before giving up
pub const MAX_SEARCH_ITERATIONS: usize = 1000;

/// NOTE - Default probability a scout candidate is skipped while choosing a target
pub const DEFAULT_SCOUT_SKIP_CHANCE: f64 = 0.5;

/// NOTE - Default hard cap on the number of drones bought by a fleet plan
pub const DEFAULT_MAX_FLEET: u32 = 6;

/// Identifier of a drone, unique for the lifetime of an Overlord.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DroneId(pub u32);

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a deployment zone, chosen by the driver in `add_map`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NOTE - Terrain kinds as reported by the driver
///
/// An undiscovered tile has no icon at all; it is modelled as `Option::<Icon>::None`
/// wherever discovery matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Icon {
    Wall,       // NOTE - '#', impassable, hurts when bumped
    Acid,       // NOTE - '~', traversable but corrosive
    Mineral,    // NOTE - '*', mined from an adjacent tile
    DeployZone, // NOTE - '_', where drones land and are picked up
    Empty,      // NOTE - ' ', free ground
    Occupied,   // NOTE - 'Z', a drone stands here
}

impl Icon {
    pub const ALL: [Icon; 6] = [
        Icon::Wall,
        Icon::Acid,
        Icon::Mineral,
        Icon::DeployZone,
        Icon::Empty,
        Icon::Occupied,
    ];

    /// Whether a drone may stand on a tile with this icon.
    pub fn traversable(self) -> bool {
        matches!(self, Icon::DeployZone | Icon::Acid | Icon::Empty)
    }

    /// Health lost when a drone moves into a tile with this icon.
    pub fn health_cost(self) -> i32 {
        match self {
            Icon::Wall => 1,
            Icon::Acid => 3,
            _ => 0,
        }
    }

    /// Edge weight used by path search, `None` when the tile must not be expanded.
    pub fn path_weight(self) -> Option<u32> {
        match self {
            Icon::Empty | Icon::Occupied | Icon::DeployZone => Some(1),
            Icon::Acid => Some(10),
            Icon::Wall | Icon::Mineral => None,
        }
    }

    /// Terrain next to which an undiscovered tile is worth scouting.
    pub fn invites_exploration(self) -> bool {
        matches!(
            self,
            Icon::Mineral | Icon::Empty | Icon::DeployZone | Icon::Acid
        )
    }

    /// Single character wire code.
    pub fn code(self) -> char {
        match self {
            Icon::Wall => '#',
            Icon::Acid => '~',
            Icon::Mineral => '*',
            Icon::DeployZone => '_',
            Icon::Empty => ' ',
            Icon::Occupied => 'Z',
        }
    }

    /// Glyph used by terminal dashboards.
    pub fn glyph(self) -> char {
        match self {
            Icon::Wall => '\u{00A4}',
            Icon::Acid => '\u{05E1}',
            Icon::Mineral => '\u{0275}',
            Icon::DeployZone => '\u{02C5}',
            Icon::Empty => ' ',
            Icon::Occupied => '\u{017E}',
        }
    }
}

impl TryFrom<char> for Icon {
    type Error = IconError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        Icon::ALL
            .into_iter()
            .find(|icon| icon.code() == code)
            .ok_or(IconError::UnknownCode(code))
    }
}

/// NOTE - Movement command answered by a drone every tick
///
/// `Indeterminate` is produced by `Coordinate::direction` for diagonal offsets and is
/// never sent to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Center,
    Indeterminate,
}

impl Direction {
    /// The four cardinal directions in reporting order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            other => other,
        }
    }

    pub fn is_cardinal(self) -> bool {
        Direction::CARDINALS.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
            Direction::Center => "CENTER",
            Direction::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionError;

    /// Parses the wire names; `Indeterminate` is deliberately not accepted.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Ok(Direction::North),
            "SOUTH" => Ok(Direction::South),
            "EAST" => Ok(Direction::East),
            "WEST" => Ok(Direction::West),
            "CENTER" => Ok(Direction::Center),
            _ => Err(DirectionError::Unknown(token.to_string())),
        }
    }
}

/// NOTE - Drone specialisation, also the key of the Overlord's idle pools
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DroneKind {
    Scout, // NOTE - Reveals the map
    Miner, // NOTE - Harvests a tasked mineral
}

impl fmt::Display for DroneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneKind::Scout => f.pad("Scout"),
            DroneKind::Miner => f.pad("Miner"),
        }
    }
}

/// NOTE - Behavioural state of a drone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DroneState {
    Waiting,   // NOTE - No path, waiting for orders or pickup
    Traveling, // NOTE - Following a path
    Working,   // NOTE - Mining next to its mineral
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneState::Waiting => f.pad("Waiting"),
            DroneState::Traveling => f.pad("Traveling"),
            DroneState::Working => f.pad("Working"),
        }
    }
}

/// What a drone sees at the start of a tick: its own position and the terrain on its
/// four sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub x: i32,
    pub y: i32,
    pub north: Icon,
    pub south: Icon,
    pub east: Icon,
    pub west: Icon,
}

impl Context {
    pub fn new(position: Coordinate, neighbors: [Icon; 4]) -> Self {
        let [north, south, east, west] = neighbors;
        Self {
            x: position.x,
            y: position.y,
            north,
            south,
            east,
            west,
        }
    }

    /// Builds a context from the driver's single character codes, ordered N, S, E, W.
    pub fn from_codes(x: i32, y: i32, codes: [char; 4]) -> Result<Self, IconError> {
        let [north, south, east, west] = codes;
        Ok(Self {
            x,
            y,
            north: Icon::try_from(north)?,
            south: Icon::try_from(south)?,
            east: Icon::try_from(east)?,
            west: Icon::try_from(west)?,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    /// Neighbour icons in the same order as `Coordinate::cardinals`.
    pub fn neighbors(&self) -> [Icon; 4] {
        [self.north, self.south, self.east, self.west]
    }

    /// Icon on the given side, `None` for `Center` and `Indeterminate`.
    pub fn toward(&self, direction: Direction) -> Option<Icon> {
        match direction {
            Direction::North => Some(self.north),
            Direction::South => Some(self.south),
            Direction::East => Some(self.east),
            Direction::West => Some(self.west),
            Direction::Center | Direction::Indeterminate => None,
        }
    }

    pub fn boxed_in(&self) -> bool {
        self.neighbors().iter().all(|icon| !icon.traversable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_codes_round_trip_through_char() {
        for icon in Icon::ALL {
            assert_eq!(Icon::try_from(icon.code()), Ok(icon));
        }
        assert_eq!(Icon::try_from('?'), Err(IconError::UnknownCode('?')));
    }

    #[test]
    fn traversal_rules() {
        assert!(Icon::Empty.traversable());
        assert!(Icon::Acid.traversable());
        assert!(Icon::DeployZone.traversable());
        assert!(!Icon::Wall.traversable());
        assert!(!Icon::Mineral.traversable());
        assert_eq!(Icon::Wall.health_cost(), 1);
        assert_eq!(Icon::Acid.health_cost(), 3);
        assert_eq!(Icon::Empty.health_cost(), 0);
        assert_eq!(Icon::Acid.path_weight(), Some(10));
        assert_eq!(Icon::Occupied.path_weight(), Some(1));
        assert_eq!(Icon::Wall.path_weight(), None);
    }

    #[test]
    fn direction_parsing_rejects_unknown_tokens() {
        assert_eq!("north".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("WEST".parse::<Direction>(), Ok(Direction::West));
        assert_eq!(
            "up".parse::<Direction>(),
            Err(DirectionError::Unknown("up".to_string()))
        );
        assert!("INDETERMINATE".parse::<Direction>().is_err());
    }

    #[test]
    fn context_from_codes_keeps_reporting_order() {
        let context = Context::from_codes(2, -1, ['#', '~', '*', ' ']).unwrap();
        assert_eq!(context.coordinate(), Coordinate::new(2, -1));
        assert_eq!(
            context.neighbors(),
            [Icon::Wall, Icon::Acid, Icon::Mineral, Icon::Empty]
        );
        assert_eq!(context.toward(Direction::East), Some(Icon::Mineral));
        assert_eq!(context.toward(Direction::Center), None);
        assert!(Context::from_codes(0, 0, ['#', '#', '#', 'x']).is_err());
    }

    #[test]
    fn boxed_in_only_when_every_side_is_blocked() {
        let walled = Context::new(Coordinate::new(0, 0), [Icon::Wall; 4]);
        assert!(walled.boxed_in());
        let open = Context::new(
            Coordinate::new(0, 0),
            [Icon::Wall, Icon::Mineral, Icon::Wall, Icon::Acid],
        );
        assert!(!open.boxed_in());
    }
}
