use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::blueprint::DroneStats;
use crate::coordinate::Coordinate;
use crate::types::{Context, Direction, DroneId, DroneKind, DroneState, Icon, MapId};

/// The Overlord as seen from a drone: everything a drone may tell it mid-tick.
pub trait DroneLink {
    fn enqueue_map_update(&mut self, drone: DroneId, map: MapId, context: Context);
    fn request_pickup(&mut self, drone: DroneId, map: MapId);
    fn mark_drone_dead(&mut self, drone: DroneId);
    fn release_mineral(&mut self, map: MapId, mineral: Coordinate);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Scout,
    Miner {
        mineral: Option<Coordinate>,
        approach: Option<Direction>,
    },
}

pub struct Drone {
    id: DroneId,
    role: Role,
    stats: DroneStats,
    health: i32,
    capacity: u32,
    state: DroneState,
    path: VecDeque<Coordinate>,
    traveled: VecDeque<Coordinate>,
    steps: u32,
    map: Option<MapId>,
}

impl Drone {
    pub fn new(id: DroneId, kind: DroneKind, stats: DroneStats) -> Self {
        let role = match kind {
            DroneKind::Scout => Role::Scout,
            DroneKind::Miner => Role::Miner {
                mineral: None,
                approach: None,
            },
        };
        Self {
            id,
            role,
            stats,
            health: stats.health,
            capacity: 0,
            state: DroneState::Waiting,
            path: VecDeque::new(),
            traveled: VecDeque::new(),
            steps: 0,
            map: None,
        }
    }

    pub fn id(&self) -> DroneId {
        self.id
    }

    pub fn kind(&self) -> DroneKind {
        match self.role {
            Role::Scout => DroneKind::Scout,
            Role::Miner { .. } => DroneKind::Miner,
        }
    }

    pub fn stats(&self) -> DroneStats {
        self.stats
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Minerals currently carried.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn state(&self) -> DroneState {
        self.state
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn map(&self) -> Option<MapId> {
        self.map
    }

    pub fn path(&self) -> &VecDeque<Coordinate> {
        &self.path
    }

    /// Path nodes already walked, most recent first.
    pub fn traveled(&self) -> &VecDeque<Coordinate> {
        &self.traveled
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.path.back().copied()
    }

    pub fn mineral_location(&self) -> Option<Coordinate> {
        match self.role {
            Role::Miner { mineral, .. } => mineral,
            Role::Scout => None,
        }
    }

    /// Side the miner will mine from once it reaches the end of its path.
    pub fn mineral_approach(&self) -> Option<Direction> {
        match self.role {
            Role::Miner { approach, .. } => approach,
            Role::Scout => None,
        }
    }

    pub fn deploy(&mut self, map: MapId) {
        self.map = Some(map);
    }

    /// Takes the drone off its map. Returns the minerals it carried.
    pub fn recall(&mut self) -> u32 {
        self.map = None;
        self.path.clear();
        self.traveled.clear();
        self.state = DroneState::Waiting;
        if let Role::Miner { mineral, approach } = &mut self.role {
            *mineral = None;
            *approach = None;
        }
        self.reset_minerals()
    }

    pub fn reset_minerals(&mut self) -> u32 {
        std::mem::take(&mut self.capacity)
    }

    /// Sets the route to follow; the back of the path is the destination.
    ///
    /// Miners keep the last coordinate for themselves as the mineral to mine and only
    /// walk up to the tile before it.
    pub fn set_path(&mut self, mut path: Vec<Coordinate>) {
        if let Role::Miner { mineral, approach } = &mut self.role {
            *mineral = path.pop();
            *approach = match (path.last(), *mineral) {
                (Some(last), Some(target)) => Some(last.direction(target)),
                _ => None,
            };
        }
        self.set_route(path);
    }

    fn set_route(&mut self, path: Vec<Coordinate>) {
        // start and destination alone are not a journey
        self.state = if path.len() > 2 {
            DroneState::Traveling
        } else {
            DroneState::Waiting
        };
        self.path = path.into();
        self.traveled.clear();
    }

    /// Decides this tick's move from what the drone sees around it.
    pub fn action(&mut self, context: &Context, link: &mut dyn DroneLink) -> Direction {
        match self.role {
            Role::Scout if context.boxed_in() => {
                debug!(drone = %self.id, at = %context.coordinate(), "scout boxed in");
                self.report(context, link);
                self.finish_traveling(link);
                self.request_pickup(link);
                Direction::Center
            }
            Role::Miner { .. } if self.state == DroneState::Working => {
                self.report(context, link);
                self.mine(context, link)
            }
            _ => {
                let direction = self.step(context, link);
                if self.state == DroneState::Working {
                    self.mine(context, link)
                } else {
                    direction
                }
            }
        }
    }

    fn step(&mut self, context: &Context, link: &mut dyn DroneLink) -> Direction {
        self.report(context, link);
        if self.path.is_empty() {
            self.finish_traveling(link);
            return Direction::Center;
        }
        self.travel(context, link)
    }

    fn travel(&mut self, context: &Context, link: &mut dyn DroneLink) -> Direction {
        let current = context.coordinate();
        let next = self.advance_path(current);
        match current.direction(next) {
            Direction::Center => {
                self.finish_traveling(link);
                Direction::Center
            }
            Direction::Indeterminate => {
                warn!(drone = %self.id, at = %current, %next, "drone is off its path");
                self.path.clear();
                self.finish_traveling(link);
                Direction::Center
            }
            direction => {
                let target = context.toward(direction).unwrap_or(Icon::Empty);
                self.handle_moving(target, link);
                if target == Icon::Wall {
                    debug!(drone = %self.id, at = %current, %direction, "path runs into a wall");
                    self.path.clear();
                    self.finish_traveling(link);
                }
                direction
            }
        }
    }

    /// Consumes the head of the path once it has been reached and returns the next
    /// coordinate to head for; the current one when there is nowhere left to go.
    fn advance_path(&mut self, current: Coordinate) -> Coordinate {
        if self.path.front() == Some(&current) {
            if let Some(reached) = self.path.pop_front() {
                self.traveled.push_front(reached);
            }
        }
        let Some(&next) = self.path.front() else {
            return current;
        };
        // Scouts target undiscovered tiles; seeing one from next door is enough.
        if self.role == Role::Scout && self.path.len() == 1 {
            trace!(drone = %self.id, target = %next, "scout stops short of its target");
            self.path.pop_front();
            return current;
        }
        next
    }

    fn handle_moving(&mut self, target: Icon, link: &mut dyn DroneLink) {
        self.take_damage(target.health_cost(), link);
        self.hit_mineral(target);
        if target.traversable() {
            self.steps += 1;
        }
    }

    /// Returns false once the damage has killed the drone.
    fn take_damage(&mut self, damage: i32, link: &mut dyn DroneLink) -> bool {
        let was_alive = self.is_alive();
        self.health -= damage;
        if was_alive && !self.is_alive() {
            warn!(drone = %self.id, kind = %self.kind(), "drone destroyed");
            link.mark_drone_dead(self.id);
        }
        self.is_alive()
    }

    fn hit_mineral(&mut self, target: Icon) -> bool {
        let is_mineral = target == Icon::Mineral;
        if is_mineral && self.capacity < self.stats.capacity {
            self.capacity += 1;
        }
        is_mineral
    }

    fn mine(&mut self, context: &Context, link: &mut dyn DroneLink) -> Direction {
        let current = context.coordinate();
        let Role::Miner {
            mineral: Some(mineral),
            approach,
        } = self.role
        else {
            self.state = DroneState::Waiting;
            return Direction::Center;
        };

        let direction = approach
            .filter(|side| current.translate(*side) == mineral)
            .unwrap_or_else(|| current.direction(mineral));
        let facing = if current.is_adjacent(mineral) {
            context.toward(direction)
        } else {
            None
        };

        if facing == Some(Icon::Mineral) && self.capacity < self.stats.capacity {
            self.handle_moving(Icon::Mineral, link);
            return direction;
        }

        // Only a deposit seen empty from next door is done with. Leaving full, or
        // giving up short of it, hands it back for someone else.
        if facing != Some(Icon::Empty) {
            if let Some(map) = self.map {
                link.release_mineral(map, mineral);
            }
        }
        debug!(drone = %self.id, %mineral, carried = self.capacity, "mining done, heading back");
        self.role = Role::Miner {
            mineral: None,
            approach: None,
        };
        let way_back: Vec<Coordinate> = self.traveled.drain(..).collect();
        self.set_route(way_back);
        self.state = DroneState::Traveling;
        self.travel(context, link)
    }

    fn finish_traveling(&mut self, link: &mut dyn DroneLink) {
        match self.role {
            Role::Miner {
                mineral: Some(_), ..
            } => self.state = DroneState::Working,
            Role::Miner { mineral: None, .. } => {
                self.request_pickup(link);
                self.state = DroneState::Waiting;
            }
            Role::Scout => self.state = DroneState::Waiting,
        }
    }

    fn report(&self, context: &Context, link: &mut dyn DroneLink) {
        if let Some(map) = self.map {
            link.enqueue_map_update(self.id, map, *context);
        }
    }

    fn request_pickup(&self, link: &mut dyn DroneLink) {
        if let Some(map) = self.map {
            link.request_pickup(self.id, map);
        }
    }
}
