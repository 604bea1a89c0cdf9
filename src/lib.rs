// Zerg mining engine
// Exposes every module for the simulation driver and integration tests

pub mod blueprint;   // Drone stats, creation cost and fleet purchasing
pub mod config;      // Overlord configuration loaded from JSON
pub mod coordinate;  // Grid points and direction arithmetic
pub mod display;     // Dashboard notifications and terminal rendering
pub mod drone;       // Per-drone state machine
pub mod error;       // Error enums for every layer
pub mod map;         // Discovered terrain, minerals and path search
pub mod overlord;    // Scheduling of deployments and recalls
pub mod snapshot;    // Serializable state summaries
pub mod tile;        // One discovered-or-not cell
pub mod types;       // Terrain, directions, contexts and ids
pub mod world;       // Ground-truth zones and the reference driver

// Re-exports of the main types
pub use blueprint::{DroneStats, FleetPlan, drone_blueprint, plan_fleet};
pub use config::OverlordConfig;
pub use coordinate::Coordinate;
pub use display::{Dashboard, NullDashboard, TerminalDashboard};
pub use drone::{Drone, DroneLink};
pub use error::*;
pub use map::Map;
pub use overlord::{Action, Overlord, assign_scout_target};
pub use snapshot::OverlordSnapshot;
pub use tile::Tile;
pub use types::*;
pub use world::{Simulation, Zone};
