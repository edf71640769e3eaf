use clap::{Parser, ValueEnum};
use firewatch_core::{
    EnvironmentModel, MonitoringSimulation, Position, RouteAlgorithm, RouteOptions, Sensor,
    SimulationConfig, ZoneStrategy,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Headless wildfire monitoring demo
#[derive(Parser, Debug)]
#[command(name = "firewatch-demo")]
#[command(about = "Runs the monitoring clock over a synthetic sensor network", long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 60)]
    ticks: u32,

    /// Recompute zone boundaries every N ticks
    #[arg(short, long, default_value_t = 5)]
    boundary_interval: u32,

    /// Route ordering strategy
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Annealing)]
    algorithm: AlgorithmArg,

    /// Proximity radius (miles) for grouping sensors into zones
    #[arg(short, long, default_value_t = 5.0)]
    zone_radius: f64,

    /// Seed for the randomized route strategies
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Print a report line every N ticks
    #[arg(short, long, default_value_t = 10)]
    report_interval: u32,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    NearestNeighbor,
    Annealing,
    Genetic,
}

impl From<AlgorithmArg> for RouteAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::NearestNeighbor => Self::NearestNeighbor,
            AlgorithmArg::Annealing => Self::SimulatedAnnealing,
            AlgorithmArg::Genetic => Self::Genetic,
        }
    }
}

/// Three clusters of sensors around the preset fire origins plus a few
/// outliers in quiet terrain
fn sensor_network() -> Vec<Sensor> {
    let clusters = [(34.05, -118.05), (34.18, -118.22), (34.30, -117.95)];
    let offsets = [(0.0, 0.0), (0.015, 0.01), (-0.01, 0.02), (0.02, -0.015), (-0.02, -0.01)];

    let mut sensors = Vec::new();
    for (lat, lon) in clusters {
        for (dlat, dlon) in offsets {
            let id = sensors.len() as u32 + 1;
            sensors.push(Sensor::new(id, Position::new(lat + dlat, lon + dlon), 0.0));
        }
    }
    for (lat, lon) in [(33.90, -118.40), (34.45, -118.60)] {
        let id = sensors.len() as u32 + 1;
        sensors.push(Sensor::new(id, Position::new(lat, lon), 0.0));
    }
    sensors
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Wildfire Monitoring Demo ===\n");

    let config = SimulationConfig::default()
        .with_boundary_interval(args.boundary_interval)
        .with_zones(ZoneStrategy::Proximity {
            radius_miles: args.zone_radius,
        })
        .with_route(
            RouteOptions::default()
                .with_algorithm(args.algorithm.into())
                .with_seed(args.seed),
        );

    let mut sim = match MonitoringSimulation::new(
        EnvironmentModel::southern_california(),
        sensor_network(),
        config,
    ) {
        Ok(sim) => sim,
        Err(err) => {
            error!("Invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    println!(
        "{} sensors in {} zone(s), {} ticks, boundaries every {} tick(s)\n",
        sim.sensors().len(),
        sim.zones().len(),
        args.ticks,
        args.boundary_interval
    );

    println!("Tick | Critical | Max P(fire) | High-risk vertices | Medium-risk vertices");
    println!("-----|----------|-------------|--------------------|---------------------");

    let report_interval = args.report_interval.max(1);
    for _ in 0..args.ticks {
        let report = sim.step();
        if report.tick % report_interval != 0 {
            continue;
        }
        let max_probability = report
            .readings
            .iter()
            .map(|r| r.reading.fire_probability)
            .fold(0.0, f64::max);
        let (high, medium) = sim
            .zone_boundaries()
            .iter()
            .fold((0, 0), |(h, m), b| (h + b.high_risk.len(), m + b.medium_risk.len()));
        println!(
            "{:4} | {:8} | {:11.1} | {:18} | {:20}",
            report.tick,
            report.critical_sensors.len(),
            max_probability,
            high,
            medium
        );
    }

    println!("\n=== Patrol Routes (tick {}) ===", sim.tick());
    for zone_id in 0..sim.zones().len() {
        let name = sim.zones()[zone_id].name.clone();
        let Some(route) = sim.route_for_zone(zone_id) else {
            continue;
        };
        let order: Vec<String> = route.visit_order.iter().map(ToString::to_string).collect();
        println!(
            "{name} [{}]: {} | {:.2} mi | {} path points",
            route.algorithm,
            order.join(" -> "),
            route.cost_miles,
            route.dense_path.len()
        );
    }

    let (hits, misses) = sim.boundary_cache_stats();
    println!("\nBoundary cache: {hits} hit(s), {misses} miss(es)");
}
