//! End-to-end runs of the monitoring clock

use firewatch_core::{
    BoundaryPreset, EnvironmentModel, MonitoringSimulation, Position, RouteAlgorithm, RouteOptions,
    Sensor, SimulationConfig, ZoneDefinition, ZoneStrategy,
};

#[ctor::ctor]
fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two sensor clusters, one on the first preset fire origin and one on the second
fn network() -> Vec<Sensor> {
    let mut sensors = Vec::new();
    for (lat, lon) in [(34.05, -118.05), (34.18, -118.22)] {
        for (dlat, dlon) in [(0.0, 0.0), (0.01, 0.01), (-0.01, 0.015), (0.012, -0.01)] {
            let id = sensors.len() as u32 + 1;
            sensors.push(Sensor::new(id, Position::new(lat + dlat, lon + dlon), 0.0));
        }
    }
    sensors
}

fn config() -> SimulationConfig {
    SimulationConfig::default()
        .with_zones(ZoneStrategy::Proximity { radius_miles: 3.0 })
        .with_route(RouteOptions::default().with_algorithm(RouteAlgorithm::SimulatedAnnealing))
}

#[test]
fn test_fire_grows_into_boundaries() {
    let mut sim =
        MonitoringSimulation::new(EnvironmentModel::southern_california(), network(), config())
            .unwrap();
    assert_eq!(sim.zones().len(), 2);

    let mut last = None;
    for _ in 0..60 {
        last = Some(sim.step());
    }
    let report = last.unwrap();
    assert_eq!(report.tick, 60);
    assert!(report.boundaries_refreshed);
    assert!(!report.critical_sensors.is_empty());

    // Both origins are burning by tick 60; every critical sensor sits inside
    // its zone's medium-risk ring
    for (zone, boundary) in sim.zones().iter().zip(sim.zone_boundaries()) {
        assert!(!boundary.medium_risk.is_empty(), "{}", zone.name);
        for sensor in zone.select(sim.sensors()) {
            if report.critical_sensors.contains(&sensor.id) {
                assert!(boundary.medium_risk.contains(sensor.position));
            }
        }
    }
}

#[test]
fn test_routes_cover_each_zone() {
    let mut sim =
        MonitoringSimulation::new(EnvironmentModel::southern_california(), network(), config())
            .unwrap();
    sim.seek(40);
    for zone_id in 0..sim.zones().len() {
        let zone = sim.zones()[zone_id].clone();
        let route = sim.route_for_zone(zone_id).unwrap();
        let mut visited = route.visit_order.clone();
        visited.sort_unstable();
        let mut members = zone.sensor_ids.clone();
        members.sort_unstable();
        assert_eq!(visited, members, "{}", zone.name);
        assert!(!route.dense_path.is_empty());
    }
}

#[test]
fn test_replay_after_seek() {
    let mut a =
        MonitoringSimulation::new(EnvironmentModel::southern_california(), network(), config())
            .unwrap();
    let mut b =
        MonitoringSimulation::new(EnvironmentModel::southern_california(), network(), config())
            .unwrap();

    for _ in 0..25 {
        a.step();
    }
    b.seek(70);
    b.seek(25);
    let report_a = a.step();
    let report_b = b.step();
    assert_eq!(report_a, report_b);
}

#[test]
fn test_static_zones_and_presets() {
    let config = SimulationConfig::default()
        .with_boundary(BoundaryPreset::Tight.options())
        .with_zones(ZoneStrategy::Static(vec![
            ZoneDefinition::new("Foothills", [1, 2, 3, 4]),
            ZoneDefinition::new("Canyon", [5, 6, 7, 8, 42]),
        ]));
    let sim =
        MonitoringSimulation::new(EnvironmentModel::southern_california(), network(), config)
            .unwrap();
    let names: Vec<&str> = sim.zones().iter().map(|z| z.name.as_str()).collect();
    assert_eq!(names, vec!["Foothills", "Canyon"]);
    assert_eq!(sim.zones()[1].len(), 4);
}
