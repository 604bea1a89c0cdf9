//! # Overlord Snapshot Module
//!
//! Serializable summaries of the Overlord's state, for dashboards and for the JSON report
//! printed by the simulation driver. Snapshots are copies: holding one never borrows the
//! Overlord.
//!
//! ## Data Structures
//!
//! - **MapSummary**: discovery progress and mineral bookkeeping of one map
//! - **DroneSummary**: health, load, state and whereabouts of one drone
//! - **OverlordSnapshot**: everything above plus fleet totals for one tick

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::drone::Drone;
use crate::map::Map;
use crate::overlord::Overlord;
use crate::types::{DroneId, DroneKind, DroneState, MapId};

/// Discovery progress of one deployment zone.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapSummary {
    pub id: MapId,
    pub density: f32,
    /// Deploy zone, unknown until the first report
    pub origin: Option<Coordinate>,
    pub discovered_tiles: usize,
    /// Placeholders bordering discovered ground
    pub frontier_tiles: usize,
    pub untasked_minerals: Vec<Coordinate>,
    pub tasked_minerals: Vec<Coordinate>,
    pub scout_count: u32,
}

/// Status of a single drone.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DroneSummary {
    pub id: DroneId,
    pub kind: DroneKind,
    pub state: DroneState,
    pub health: i32,
    pub max_health: i32,
    /// Minerals carried right now
    pub carried: u32,
    pub capacity: u32,
    pub steps: u32,
    pub map: Option<MapId>,
    /// Last position the Overlord placed the drone at
    pub position: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub mineral: Option<Coordinate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OverlordSnapshot {
    pub tick: u64,
    pub collected_minerals: u32,
    pub idle_scouts: usize,
    pub idle_miners: usize,
    pub pending_pickups: Vec<DroneId>,
    pub maps: Vec<MapSummary>,
    pub drones: Vec<DroneSummary>,
}

impl OverlordSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn create_map_summary(map: &Map) -> MapSummary {
    MapSummary {
        id: map.id(),
        density: map.density(),
        origin: map.origin(),
        discovered_tiles: map.discovered_count(),
        frontier_tiles: map.unexplored_tiles().count(),
        untasked_minerals: map.untasked_minerals().iter().copied().collect(),
        tasked_minerals: map.tasked_minerals().iter().copied().collect(),
        scout_count: map.scout_count(),
    }
}

pub fn create_drone_summary(drone: &Drone, position: Option<Coordinate>) -> DroneSummary {
    DroneSummary {
        id: drone.id(),
        kind: drone.kind(),
        state: drone.state(),
        health: drone.health(),
        max_health: drone.stats().health,
        carried: drone.capacity(),
        capacity: drone.stats().capacity,
        steps: drone.steps(),
        map: drone.map(),
        position,
        destination: drone.destination(),
        mineral: drone.mineral_location(),
    }
}

/// Assembles the full snapshot for the Overlord's current tick.
pub fn create_snapshot(overlord: &Overlord) -> OverlordSnapshot {
    let drones = overlord
        .drones()
        .values()
        .map(|drone| {
            let position = drone
                .map()
                .and_then(|map| overlord.maps().get(&map))
                .and_then(|map| map.drone_position(drone.id()));
            create_drone_summary(drone, position)
        })
        .collect();

    OverlordSnapshot {
        tick: overlord.tick(),
        collected_minerals: overlord.collected_minerals(),
        idle_scouts: overlord.idle_count(DroneKind::Scout),
        idle_miners: overlord.idle_count(DroneKind::Miner),
        pending_pickups: overlord.pending_pickups().collect(),
        maps: overlord.maps().values().map(create_map_summary).collect(),
        drones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlordConfig;
    use crate::types::{Context, Icon};

    #[test]
    fn map_summary_counts_discovery() {
        let mut map = Map::new(MapId(2), 0.4);
        map.update_context(&Context::new(
            Coordinate::new(0, 0),
            [Icon::Mineral, Icon::Wall, Icon::Empty, Icon::Empty],
        ));
        let summary = create_map_summary(&map);
        assert_eq!(summary.origin, Some(Coordinate::new(0, 0)));
        assert_eq!(summary.discovered_tiles, 5);
        assert_eq!(summary.untasked_minerals, vec![Coordinate::new(0, 1)]);
        assert!(summary.tasked_minerals.is_empty());
        assert!(summary.frontier_tiles > 0);
    }

    #[test]
    fn fresh_overlord_snapshot_serializes() {
        let overlord = Overlord::new(&OverlordConfig::default()).unwrap();
        let snapshot = overlord.snapshot();
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.drones.len(), snapshot.idle_scouts + snapshot.idle_miners);
        assert!(snapshot.drones.iter().all(|drone| drone.map.is_none()));

        let json = snapshot.to_json().unwrap();
        let parsed: OverlordSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
