use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::blueprint::plan_fleet;
use crate::config::OverlordConfig;
use crate::coordinate::Coordinate;
use crate::display::{Dashboard, NullDashboard};
use crate::drone::{Drone, DroneLink};
use crate::error::OverlordError;
use crate::map::Map;
use crate::snapshot::{OverlordSnapshot, create_snapshot};
use crate::tile::Tile;
use crate::types::{Context, DEFAULT_SCOUT_SKIP_CHANCE, Direction, DroneId, DroneKind, DroneState, Icon, MapId};

/// What the Overlord tells the driver at the end of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Deploy { drone: DroneId, map: MapId },
    Return { drone: DroneId },
    Idle,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Deploy { drone, map } => write!(f, "DEPLOY {drone} {map}"),
            Action::Return { drone } => write!(f, "RETURN {drone}"),
            Action::Idle => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct MapUpdate {
    drone: DroneId,
    map: MapId,
    context: Context,
}

/// Messages drones leave for the Overlord while acting, drained on the next step.
#[derive(Default)]
struct Mailbox {
    updates: VecDeque<MapUpdate>,
    pickups: VecDeque<(MapId, DroneId)>,
    pending: BTreeSet<DroneId>,
    fallen: Vec<DroneId>,
    released: Vec<(MapId, Coordinate)>,
}

impl DroneLink for Mailbox {
    fn enqueue_map_update(&mut self, drone: DroneId, map: MapId, context: Context) {
        self.updates.push_back(MapUpdate {
            drone,
            map,
            context,
        });
    }

    fn request_pickup(&mut self, drone: DroneId, map: MapId) {
        if self.pending.insert(drone) {
            self.pickups.push_back((map, drone));
        }
    }

    fn mark_drone_dead(&mut self, drone: DroneId) {
        self.fallen.push(drone);
    }

    fn release_mineral(&mut self, map: MapId, mineral: Coordinate) {
        self.released.push((map, mineral));
    }
}

/// Central coordinator: owns every drone and every map, and turns the drones' reports
/// into one deploy or recall order per step.
pub struct Overlord {
    drones: BTreeMap<DroneId, Drone>,
    idle: BTreeMap<DroneKind, BTreeSet<DroneId>>,  // NOTE - Drones waiting in the hive
    deployed: BTreeMap<DroneId, Option<MapId>>,     // NOTE - Every live drone and where it is
    maps: BTreeMap<MapId, Map>,
    mailbox: Mailbox,
    rng: ChaCha8Rng,
    skip_chance: f64,
    dashboard: Box<dyn Dashboard>,
    tick: u64,
    collected_minerals: u32,
}

impl Overlord {
    pub fn new(config: &OverlordConfig) -> Result<Self, OverlordError> {
        Self::with_dashboard(config, Box::new(NullDashboard))
    }

    /// Buys the fleet from `config.budget` and parks every drone in its idle pool.
    pub fn with_dashboard(
        config: &OverlordConfig,
        mut dashboard: Box<dyn Dashboard>,
    ) -> Result<Self, OverlordError> {
        let plan = plan_fleet(config.budget, config.max_fleet)?;

        let mut drones = BTreeMap::new();
        let mut idle: BTreeMap<DroneKind, BTreeSet<DroneId>> = BTreeMap::new();
        let mut deployed = BTreeMap::new();
        let (mut scouts, mut miners) = (0, 0);
        while scouts + miners < plan.total() {
            let kind = if scouts < plan.scouts && (scouts <= miners || miners == plan.miners) {
                scouts += 1;
                DroneKind::Scout
            } else {
                miners += 1;
                DroneKind::Miner
            };
            let id = DroneId(scouts + miners);
            drones.insert(id, Drone::new(id, kind, plan.stats(kind)));
            idle.entry(kind).or_default().insert(id);
            deployed.insert(id, None);
        }
        info!(
            scouts = plan.scouts,
            miners = plan.miners,
            spent = plan.spent,
            remaining = plan.remaining,
            "fleet spawned"
        );
        dashboard.update_drone_table(&drones);

        Ok(Self {
            drones,
            idle,
            deployed,
            maps: BTreeMap::new(),
            mailbox: Mailbox::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            skip_chance: config.skip_chance(),
            dashboard,
            tick: 0,
            collected_minerals: 0,
        })
    }

    /// Registers a deployment zone. Registering the same id twice keeps the first map.
    pub fn add_map(&mut self, id: MapId, density: f32) {
        if self.maps.contains_key(&id) {
            warn!(map = %id, "map already registered");
            return;
        }
        let map = Map::new(id, density);
        self.dashboard.create_map_gui(&map);
        self.maps.insert(id, map);
        debug!(map = %id, density, "map registered");
    }

    /// One scheduling decision. Drains what drones reported since the last step and
    /// answers with at most one order.
    pub fn step(&mut self) -> Result<Action, OverlordError> {
        self.tick += 1;

        // NOTE - Catch up on everything the drones said since the last step
        self.bury_fallen()?;
        self.apply_released_minerals();
        self.process_updates()?;

        // NOTE - One order per step, recalls before any deployment
        let action = match self.recall_one()? {
            Some(action) => action,
            None => match self.deploy_miner() {
                Some(action) => action,
                None => self.deploy_scout().unwrap_or(Action::Idle),
            },
        };

        if action != Action::Idle {
            info!(tick = self.tick, %action, "overlord order");
        }
        self.dashboard.update_drone_table(&self.drones);
        self.dashboard.insert_action(&action, self.tick);
        Ok(action)
    }

    /// Lets a deployed drone decide its move for this tick.
    pub fn drone_action(&mut self, id: DroneId, context: &Context) -> Result<Direction, OverlordError> {
        let drone = self.drones.get_mut(&id).ok_or(OverlordError::UnknownDrone(id))?;
        if drone.map().is_none() {
            return Err(OverlordError::NotDeployed(id));
        }
        let direction = drone.action(context, &mut self.mailbox);
        trace!(drone = %id, at = %context.coordinate(), %direction, "drone acted");
        self.bury_fallen()?;
        Ok(direction)
    }

    fn apply_released_minerals(&mut self) {
        for (map, mineral) in self.mailbox.released.drain(..) {
            if let Some(zone) = self.maps.get_mut(&map) {
                debug!(%map, %mineral, "mineral released");
                zone.untask_mineral(mineral);
            }
        }
    }

    fn process_updates(&mut self) -> Result<(), OverlordError> {
        let mut changed = false;
        while let Some(MapUpdate {
            drone,
            map,
            context,
        }) = self.mailbox.updates.pop_front()
        {
            if self.deployed.get(&drone).copied().flatten() != Some(map) {
                trace!(%drone, %map, "stale update skipped");
                continue;
            }
            let Some(zone) = self.maps.get_mut(&map) else {
                warn!(%drone, %map, "update for unknown map");
                continue;
            };
            let at = context.coordinate();
            zone.update_context(&context);
            if !zone.place_drone(drone, at)? {
                debug!(%drone, %map, %at, "tile already taken");
            }
            changed = true;

            let Some(unit) = self.drones.get_mut(&drone) else {
                continue;
            };
            if unit.kind() == DroneKind::Scout && unit.state() == DroneState::Waiting {
                let path = assign_scout_target(zone, at, &mut self.rng, self.skip_chance);
                if path.is_empty() {
                    debug!(%drone, %map, "nothing left to scout from here");
                    self.mailbox.request_pickup(drone, map);
                } else {
                    debug!(%drone, %map, target = ?path.last(), hops = path.len(), "scout target assigned");
                    unit.set_path(path);
                }
            }
        }
        if changed {
            self.dashboard.update_maps(&self.maps);
        }
        Ok(())
    }

    /// Pops pickup requests until one names a drone that can still be recalled.
    fn recall_one(&mut self) -> Result<Option<Action>, OverlordError> {
        while let Some((map, id)) = self.mailbox.pickups.pop_front() {
            self.mailbox.pending.remove(&id);
            if self.deployed.get(&id).copied().flatten() != Some(map) {
                trace!(drone = %id, %map, "stale pickup skipped");
                continue;
            }
            let Some(drone) = self.drones.get_mut(&id) else {
                continue;
            };

            if let (Some(mineral), Some(zone)) = (drone.mineral_location(), self.maps.get_mut(&map)) {
                zone.untask_mineral(mineral);
            }
            let kind = drone.kind();
            let carried = drone.recall();
            self.collected_minerals += carried;
            self.deployed.insert(id, None);
            self.idle.entry(kind).or_default().insert(id);
            if let Some(zone) = self.maps.get_mut(&map) {
                zone.remove_drone(id)?;
                if kind == DroneKind::Scout {
                    zone.remove_scout();
                }
            }
            info!(drone = %id, %map, %kind, carried, total = self.collected_minerals, "drone recalled");
            return Ok(Some(Action::Return { drone: id }));
        }
        Ok(None)
    }

    fn deploy_miner(&mut self) -> Option<Action> {
        let miner = self.idle.get(&DroneKind::Miner)?.first().copied()?;
        for (&map_id, zone) in self.maps.iter_mut() {
            if !zone.has_untasked_minerals() || zone.origin_occupied() {
                continue;
            }
            let drone = self.drones.get_mut(&miner)?;
            let path = zone.task_miner(drone);
            if path.is_empty() {
                continue;
            }
            drone.deploy(map_id);
            self.deployed.insert(miner, Some(map_id));
            if let Some(pool) = self.idle.get_mut(&DroneKind::Miner) {
                pool.remove(&miner);
            }
            info!(drone = %miner, map = %map_id, mineral = ?drone.mineral_location(), "miner deployed");
            return Some(Action::Deploy {
                drone: miner,
                map: map_id,
            });
        }
        None
    }

    fn deploy_scout(&mut self) -> Option<Action> {
        let scout = self.idle.get(&DroneKind::Scout)?.first().copied()?;
        let zone = self.maps.values_mut().min_by(|a, b| {
            a.scout_count()
                .cmp(&b.scout_count())
                .then_with(|| a.density().total_cmp(&b.density()))
        })?;
        let drone = self.drones.get_mut(&scout)?;
        let map_id = zone.id();
        zone.add_scout();
        drone.deploy(map_id);
        self.deployed.insert(scout, Some(map_id));
        if let Some(pool) = self.idle.get_mut(&DroneKind::Scout) {
            pool.remove(&scout);
        }
        info!(drone = %scout, map = %map_id, scouts = zone.scout_count(), "scout deployed");
        Some(Action::Deploy {
            drone: scout,
            map: map_id,
        })
    }

    fn bury_fallen(&mut self) -> Result<(), OverlordError> {
        let fallen: Vec<DroneId> = self.mailbox.fallen.drain(..).collect();
        for id in fallen {
            self.mark_drone_dead(id)?;
        }
        Ok(())
    }

    /// Forgets a drone everywhere. Unknown ids are ignored.
    fn mark_drone_dead(&mut self, id: DroneId) -> Result<(), OverlordError> {
        let Some(drone) = self.drones.remove(&id) else {
            return Ok(());
        };
        for pool in self.idle.values_mut() {
            pool.remove(&id);
        }
        self.mailbox.pending.remove(&id);
        let map = self.deployed.remove(&id).flatten().or(drone.map());
        if let Some(zone) = map.and_then(|map| self.maps.get_mut(&map)) {
            zone.remove_drone(id)?;
            if drone.kind() == DroneKind::Scout {
                zone.remove_scout();
            }
            if let Some(mineral) = drone.mineral_location() {
                zone.untask_mineral(mineral);
            }
        }
        warn!(drone = %id, kind = %drone.kind(), map = ?map, "drone lost");
        Ok(())
    }

    pub fn drone(&self, id: DroneId) -> Option<&Drone> {
        self.drones.get(&id)
    }

    pub fn drones(&self) -> &BTreeMap<DroneId, Drone> {
        &self.drones
    }

    pub fn map(&self, id: MapId) -> Result<&Map, OverlordError> {
        self.maps.get(&id).ok_or(OverlordError::UnknownMap(id))
    }

    pub fn map_mut(&mut self, id: MapId) -> Result<&mut Map, OverlordError> {
        self.maps.get_mut(&id).ok_or(OverlordError::UnknownMap(id))
    }

    pub fn maps(&self) -> &BTreeMap<MapId, Map> {
        &self.maps
    }

    pub fn idle_count(&self, kind: DroneKind) -> usize {
        self.idle.get(&kind).map_or(0, BTreeSet::len)
    }

    pub fn deployed_map(&self, id: DroneId) -> Option<MapId> {
        self.deployed.get(&id).copied().flatten()
    }

    /// Drones currently deployed, in id order.
    pub fn deployed_drones(&self) -> impl Iterator<Item = (DroneId, MapId)> + '_ {
        self.deployed
            .iter()
            .filter_map(|(&drone, &map)| map.map(|map| (drone, map)))
    }

    pub fn pending_pickups(&self) -> impl Iterator<Item = DroneId> + '_ {
        self.mailbox.pickups.iter().map(|&(_, drone)| drone)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Minerals brought home by recalled drones.
    pub fn collected_minerals(&self) -> u32 {
        self.collected_minerals
    }

    pub fn snapshot(&self) -> OverlordSnapshot {
        create_snapshot(self)
    }
}

/// Picks a scouting destination for a drone standing at `start`.
///
/// Undiscovered tiles are tried farthest first by true Manhattan distance from `start`,
/// not a signed coordinate sum, so targets behind the scout rank as far as the ones
/// ahead of it. Each is skipped with probability `skip_chance` and must border known
/// open ground. The first one Dijkstra can reach wins. An empty path means nothing is
/// worth scouting.
pub fn assign_scout_target<R: Rng + ?Sized>(
    map: &Map,
    start: Coordinate,
    rng: &mut R,
    skip_chance: f64,
) -> Vec<Coordinate> {
    let skip_chance = if (0.0..=1.0).contains(&skip_chance) {
        skip_chance
    } else {
        DEFAULT_SCOUT_SKIP_CHANCE
    };

    let mut candidates: Vec<Coordinate> = map.unexplored_tiles().map(Tile::coordinate).collect();
    candidates.sort_by_key(|candidate| Reverse(start.manhattan(*candidate)));

    for target in candidates {
        if rng.gen_bool(skip_chance) {
            continue;
        }
        let borders_open_ground = target
            .cardinals()
            .into_iter()
            .any(|neighbor| map.terrain_at(neighbor).is_some_and(Icon::invites_exploration));
        if !borders_open_ground {
            continue;
        }
        let path = map.dijkstra(start, target);
        if !path.is_empty() {
            return path;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OverlordConfig {
        OverlordConfig {
            budget: 19,
            seed: 1,
            scout_skip_chance: 0.0,
            max_fleet: 2,
        }
    }

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn actions_print_as_wire_commands() {
        assert_eq!(
            Action::Deploy {
                drone: DroneId(3),
                map: MapId(1)
            }
            .to_string(),
            "DEPLOY 3 1"
        );
        assert_eq!(Action::Return { drone: DroneId(7) }.to_string(), "RETURN 7");
        assert_eq!(Action::Idle.to_string(), "");
    }

    #[test]
    fn mailbox_deduplicates_pickups() {
        let mut mailbox = Mailbox::default();
        mailbox.request_pickup(DroneId(1), MapId(1));
        mailbox.request_pickup(DroneId(1), MapId(1));
        mailbox.request_pickup(DroneId(2), MapId(1));
        assert_eq!(mailbox.pickups.len(), 2);
    }

    #[test]
    fn fleet_alternates_kinds() {
        let overlord = Overlord::new(&OverlordConfig {
            budget: 100,
            max_fleet: 4,
            ..config()
        })
        .unwrap();
        let kinds: Vec<DroneKind> = overlord.drones().values().map(Drone::kind).collect();
        assert_eq!(
            kinds,
            vec![DroneKind::Scout, DroneKind::Miner, DroneKind::Scout, DroneKind::Miner]
        );
        assert_eq!(overlord.idle_count(DroneKind::Scout), 2);
        assert_eq!(overlord.idle_count(DroneKind::Miner), 2);
    }

    #[test]
    fn too_small_budget_fails() {
        let result = Overlord::new(&OverlordConfig {
            budget: 5,
            ..config()
        });
        assert!(matches!(result, Err(OverlordError::Blueprint(_))));
    }

    #[test]
    fn no_maps_means_no_orders() {
        let mut overlord = Overlord::new(&config()).unwrap();
        assert_eq!(overlord.step(), Ok(Action::Idle));
    }

    #[test]
    fn scouts_go_to_the_emptiest_map() {
        let mut overlord = Overlord::new(&OverlordConfig {
            budget: 100,
            max_fleet: 4,
            ..config()
        })
        .unwrap();
        overlord.add_map(MapId(1), 0.6);
        overlord.add_map(MapId(2), 0.2);

        // tie on scout count: the sparser map first
        assert_eq!(
            overlord.step(),
            Ok(Action::Deploy {
                drone: DroneId(1),
                map: MapId(2)
            })
        );
        assert_eq!(
            overlord.step(),
            Ok(Action::Deploy {
                drone: DroneId(3),
                map: MapId(1)
            })
        );
        assert_eq!(overlord.map(MapId(1)).unwrap().scout_count(), 1);
        assert_eq!(overlord.map(MapId(2)).unwrap().scout_count(), 1);
        assert_eq!(overlord.step(), Ok(Action::Idle));
    }

    #[test]
    fn undeployed_drones_cannot_act() {
        let mut overlord = Overlord::new(&config()).unwrap();
        let context = Context::new(c(0, 0), [Icon::Empty; 4]);
        assert_eq!(
            overlord.drone_action(DroneId(2), &context),
            Err(OverlordError::NotDeployed(DroneId(2)))
        );
        assert_eq!(
            overlord.drone_action(DroneId(99), &context),
            Err(OverlordError::UnknownDrone(DroneId(99)))
        );
    }

    #[test]
    fn scout_target_is_the_farthest_reachable_frontier() {
        let mut map = Map::new(MapId(1), 0.0);
        map.update_context(&Context::new(c(0, 0), [Icon::Empty, Icon::Wall, Icon::Wall, Icon::Wall]));
        map.update_context(&Context::new(c(0, 1), [Icon::Empty, Icon::DeployZone, Icon::Wall, Icon::Wall]));
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let path = assign_scout_target(&map, c(0, 0), &mut rng, 0.0);
        // (-2, 1) is as far but only borders walls and unknown ground
        assert_eq!(path, vec![c(0, 0), c(0, 1), c(0, 2), c(-1, 2)]);
        assert!(map.tile(c(-1, 2)).is_some_and(|tile| !tile.is_discovered()));
    }

    #[test]
    fn scout_target_is_empty_when_everything_is_walled() {
        let mut map = Map::new(MapId(1), 0.0);
        map.update_context(&Context::new(c(0, 0), [Icon::Wall; 4]));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(assign_scout_target(&map, c(0, 0), &mut rng, 0.0).is_empty());
        // an out of range chance is tolerated
        assert!(assign_scout_target(&map, c(0, 0), &mut rng, 7.0).is_empty());
    }

    #[test]
    fn always_skipping_finds_nothing() {
        let mut map = Map::new(MapId(1), 0.0);
        map.update_context(&Context::new(c(0, 0), [Icon::Empty; 4]));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(assign_scout_target(&map, c(0, 0), &mut rng, 1.0).is_empty());
    }
}
