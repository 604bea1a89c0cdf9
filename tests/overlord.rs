use std::collections::{BTreeMap, BTreeSet};

use zerg_mining::{
    Action, Context, Coordinate, DroneId, DroneKind, DroneState, Icon, MapId, Overlord,
    OverlordConfig, OverlordError, Simulation, Zone,
};

fn config(budget: u32, max_fleet: u32) -> OverlordConfig {
    OverlordConfig {
        budget,
        seed: 9,
        scout_skip_chance: 0.0,
        max_fleet,
    }
}

fn c(x: i32, y: i32) -> Coordinate {
    Coordinate::new(x, y)
}

fn walled(x: i32, y: i32) -> Context {
    Context::new(c(x, y), [Icon::Wall; 4])
}

#[test]
fn boxed_in_scout_is_recalled() {
    let mut overlord = Overlord::new(&config(19, 2)).unwrap();
    overlord.add_map(MapId(1), 0.0);

    let deploy = overlord.step().unwrap();
    assert_eq!(deploy.to_string(), "DEPLOY 1 1");
    assert_eq!(overlord.deployed_map(DroneId(1)), Some(MapId(1)));

    let direction = overlord.drone_action(DroneId(1), &walled(0, 0)).unwrap();
    assert_eq!(direction.to_string(), "CENTER");
    assert_eq!(overlord.pending_pickups().collect::<Vec<_>>(), vec![DroneId(1)]);

    let recall = overlord.step().unwrap();
    assert_eq!(recall.to_string(), "RETURN 1");
    assert_eq!(overlord.deployed_map(DroneId(1)), None);
    assert_eq!(overlord.idle_count(DroneKind::Scout), 1);
    assert_eq!(overlord.map(MapId(1)).unwrap().scout_count(), 0);
    assert_eq!(overlord.pending_pickups().count(), 0);
}

#[test]
fn at_most_one_recall_per_step() {
    let mut overlord = Overlord::new(&config(100, 4)).unwrap();
    overlord.add_map(MapId(1), 0.1);
    overlord.add_map(MapId(2), 0.2);

    assert_eq!(
        overlord.step(),
        Ok(Action::Deploy {
            drone: DroneId(1),
            map: MapId(1)
        })
    );
    assert_eq!(
        overlord.step(),
        Ok(Action::Deploy {
            drone: DroneId(3),
            map: MapId(2)
        })
    );
    overlord.drone_action(DroneId(1), &walled(0, 0)).unwrap();
    overlord.drone_action(DroneId(3), &walled(5, 5)).unwrap();
    // asking twice does not queue twice
    overlord.drone_action(DroneId(1), &walled(0, 0)).unwrap();

    assert_eq!(overlord.step(), Ok(Action::Return { drone: DroneId(1) }));
    assert_eq!(overlord.step(), Ok(Action::Return { drone: DroneId(3) }));
    assert_eq!(overlord.pending_pickups().count(), 0);
}

#[test]
fn known_mineral_brings_a_miner() {
    let mut overlord = Overlord::new(&config(19, 2)).unwrap();
    overlord.add_map(MapId(1), 0.0);
    overlord
        .map_mut(MapId(1))
        .unwrap()
        .update_context(&Context::new(
            c(0, 0),
            [Icon::Mineral, Icon::Empty, Icon::Empty, Icon::Empty],
        ));

    let action = overlord.step().unwrap();
    assert_eq!(action.to_string(), "DEPLOY 2 1");
    let miner = overlord.drone(DroneId(2)).unwrap();
    assert_eq!(miner.kind(), DroneKind::Miner);
    assert_eq!(miner.mineral_location(), Some(c(0, 1)));
    let map = overlord.map(MapId(1)).unwrap();
    assert!(map.tasked_minerals().contains(&c(0, 1)));
    assert!(!map.has_untasked_minerals());

    // standing next to its mineral it starts mining right away
    let context = Context::new(c(0, 0), [Icon::Mineral, Icon::Empty, Icon::Empty, Icon::Empty]);
    let direction = overlord.drone_action(DroneId(2), &context).unwrap();
    assert_eq!(direction.to_string(), "NORTH");
    let miner = overlord.drone(DroneId(2)).unwrap();
    assert_eq!(miner.state(), DroneState::Working);
    assert_eq!(miner.capacity(), 1);
}

#[test]
fn turned_back_miner_hands_its_mineral_back() {
    let mut overlord = Overlord::new(&config(19, 2)).unwrap();
    overlord.add_map(MapId(1), 0.0);
    let map = overlord.map_mut(MapId(1)).unwrap();
    map.update_context(&Context::new(c(0, 0), [Icon::Empty, Icon::Wall, Icon::Wall, Icon::Wall]));
    map.update_context(&Context::new(
        c(0, 1),
        [Icon::Empty, Icon::DeployZone, Icon::Wall, Icon::Wall],
    ));
    map.update_context(&Context::new(
        c(0, 2),
        [Icon::Mineral, Icon::Empty, Icon::Wall, Icon::Wall],
    ));

    assert_eq!(overlord.step().unwrap().to_string(), "DEPLOY 2 1");
    assert_eq!(overlord.drone(DroneId(2)).unwrap().mineral_location(), Some(c(0, 3)));

    // the corridor turns out to be closed right outside the deploy zone
    let direction = overlord.drone_action(DroneId(2), &walled(0, 0)).unwrap();
    assert_eq!(direction.to_string(), "CENTER");
    assert_eq!(overlord.step(), Ok(Action::Return { drone: DroneId(2) }));

    let map = overlord.map(MapId(1)).unwrap();
    assert!(map.tasked_minerals().is_empty());
    assert_eq!(map.untasked_minerals(), &BTreeSet::from([c(0, 3)]));
    assert_eq!(overlord.idle_count(DroneKind::Miner), 1);

    // with no way in the miner stays home and a scout goes instead
    assert_eq!(overlord.step().unwrap().to_string(), "DEPLOY 1 1");
    assert_eq!(overlord.idle_count(DroneKind::Miner), 1);
}

#[test]
fn dead_drones_are_forgotten() {
    let mut overlord = Overlord::new(&config(19, 2)).unwrap();
    overlord.add_map(MapId(1), 0.0);
    let acid = Context::new(c(0, 0), [Icon::Acid; 4]);

    assert_eq!(overlord.step().unwrap().to_string(), "DEPLOY 1 1");
    overlord.drone_action(DroneId(1), &acid).unwrap();
    // the report gives the scout a route through acid
    assert_eq!(overlord.step(), Ok(Action::Idle));
    assert_eq!(
        overlord.drone(DroneId(1)).map(|scout| scout.state()),
        Some(DroneState::Traveling)
    );

    // the driver keeps answering from the start tile, so every attempt burns
    let mut attempts = 0;
    while overlord.drone(DroneId(1)).is_some() {
        assert_eq!(overlord.drone_action(DroneId(1), &acid).unwrap().to_string(), "WEST");
        attempts += 1;
        assert!(attempts <= 14);
    }
    assert_eq!(attempts, 14);

    assert_eq!(overlord.deployed_map(DroneId(1)), None);
    assert_eq!(overlord.idle_count(DroneKind::Scout), 0);
    assert_eq!(overlord.map(MapId(1)).unwrap().scout_count(), 0);
    assert_eq!(
        overlord.drone_action(DroneId(1), &acid),
        Err(OverlordError::UnknownDrone(DroneId(1)))
    );
    // its queued reports are skipped and nothing is left to send out
    assert_eq!(overlord.step(), Ok(Action::Idle));
    assert!(overlord.snapshot().drones.iter().all(|drone| drone.id != DroneId(1)));
}

#[test]
fn small_zone_is_mined_out() {
    let zone = Zone::from_rows(&[
        "#######",
        "#     #",
        "# _ * #",
        "#     #",
        "#######",
    ])
    .unwrap();
    let overlord = Overlord::new(&config(19, 2)).unwrap();
    let mut simulation = Simulation::new(overlord, BTreeMap::from([(MapId(1), zone)]));

    for _ in 0..150 {
        simulation.tick().unwrap();
        if simulation.overlord().collected_minerals() > 0 {
            break;
        }
    }

    assert_eq!(simulation.overlord().collected_minerals(), 3);
    assert_eq!(simulation.zone(MapId(1)).map(Zone::remaining_minerals), Some(0));
    let map = simulation.overlord().map(MapId(1)).unwrap();
    assert_eq!(map.origin(), Some(c(2, 2)));
    assert!(map.tasked_minerals().is_empty());
    assert!(map.untasked_minerals().is_empty());
}

fn run(seed: u64, ticks: usize) -> (Simulation, Vec<Action>) {
    let zones = BTreeMap::from([
        (MapId(1), Zone::generate(seed, 30, 20)),
        (MapId(2), Zone::generate(seed + 1, 30, 20)),
    ]);
    let overlord = Overlord::new(&OverlordConfig {
        seed,
        ..config(60, 6)
    })
    .unwrap();
    let mut simulation = Simulation::new(overlord, zones);

    let mut actions = Vec::new();
    let mut deployed = BTreeSet::new();
    for _ in 0..ticks {
        let action = simulation.tick().unwrap();
        deployed.retain(|drone| simulation.overlord().drone(*drone).is_some());
        match action {
            Action::Deploy { drone, .. } => assert!(deployed.insert(drone), "{drone} deployed twice"),
            Action::Return { drone } => assert!(deployed.remove(&drone), "{drone} was not out"),
            Action::Idle => {}
        }

        for map in simulation.overlord().maps().values() {
            assert!(map.untasked_minerals().is_disjoint(map.tasked_minerals()));
        }
        actions.push(action);
    }
    (simulation, actions)
}

#[test]
fn generated_zones_run_cleanly() {
    let (simulation, actions) = run(3, 200);
    let overlord = simulation.overlord();

    for (id, map) in overlord.maps() {
        let zone = simulation.zone(*id).unwrap();
        assert_eq!(map.origin(), Some(zone.deploy_zone()));
        assert!(map.discovered_count() > 5);
    }
    assert!(actions.iter().any(|action| matches!(action, Action::Deploy { .. })));
    for (drone, (map, _)) in simulation.positions() {
        assert_eq!(overlord.deployed_map(*drone), Some(*map));
    }
}

#[test]
fn same_seed_same_orders() {
    let (_, first) = run(21, 80);
    let (_, second) = run(21, 80);
    assert_eq!(first, second);
}
