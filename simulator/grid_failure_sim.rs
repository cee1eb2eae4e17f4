// Grid producer-failure comparison: how much of the content stays reachable
// after the producer is cut off, for several router cache sizes

use ndn_sim::{RecordKind, ScenarioConfig, SimulationDriver, SimulationResult, TopologySpec};

struct PeriodMetrics {
    requests: usize,
    served: usize,
}

impl PeriodMetrics {
    fn served_percent(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.served as f64 / self.requests as f64 * 100.0
        }
    }
}

/// Retrieval outcomes issued at times in [from, to)
fn period_metrics(result: &SimulationResult, from: f64, to: f64) -> PeriodMetrics {
    let mut metrics = PeriodMetrics { requests: 0, served: 0 };
    for record in result.event_log.iter().filter(|r| r.time >= from && r.time < to) {
        match record.kind {
            RecordKind::LocalHit | RecordKind::Satisfied { .. } => {
                metrics.requests += 1;
                metrics.served += 1;
            }
            RecordKind::Exhausted => metrics.requests += 1,
            _ => {}
        }
    }
    metrics
}

fn run_simulation(cache_size: usize, seed: u64) -> (PeriodMetrics, PeriodMetrics, SimulationResult) {
    let config = ScenarioConfig {
        num_contents: 200,
        cache_size,
        connection_rate: 2.0,
        disconnection_rate: 0.02,
        initialization_period_length: 200.0,
        observation_period_length: 200.0,
        zipf_exponent: 0.8,
        seed: Some(seed),
        ..ScenarioConfig::default()
    };
    let boundary = config.initialization_period_length;
    let horizon = config.horizon();

    let built = TopologySpec::Grid { rows: 3, cols: 3 }
        .build()
        .unwrap_or_else(|e| panic!("grid topology: {}", e));
    let result = SimulationDriver::new(config, built)
        .and_then(|driver| driver.run())
        .unwrap_or_else(|e| panic!("simulation failed: {}", e));

    let before = period_metrics(&result, 0.0, boundary);
    let after = period_metrics(&result, boundary, horizon);
    (before, after, result)
}

fn main() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init();

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  Producer Failure: Router Cache Size Comparison       ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    println!("Hypothesis:");
    println!("  Larger router caches keep more of the popular content");
    println!("  reachable once the producer is gone.\n");

    println!("Setup:");
    println!("  - 3x3 router grid, one consumer per router, producer on the last");
    println!("  - 200 contents, Zipf s=0.8, 2 connects/s");
    println!("  - Producer cut off at t=200s, observed until t=400s\n");

    let seed = 0x5eed;
    let cache_sizes = [2usize, 10, 50];

    println!("┌────────────┬──────────────┬──────────────┬──────────────┐");
    println!("│ Cache size │ Served before│ Served after │ Router hits  │");
    println!("├────────────┼──────────────┼──────────────┼──────────────┤");

    for cache_size in cache_sizes {
        let (before, after, result) = run_simulation(cache_size, seed);
        let router_hits = result.cache_totals(ndn_sim::NodeRole::Router).hits;
        println!(
            "│ {:>10} │ {:>11.1}% │ {:>11.1}% │ {:>12} │",
            cache_size,
            before.served_percent(),
            after.served_percent(),
            router_hits
        );
    }

    println!("└────────────┴──────────────┴──────────────┴──────────────┘\n");

    println!("Full result for cache size {}:", cache_sizes[1]);
    let (_, _, result) = run_simulation(cache_sizes[1], seed);
    result.print_summary();
}
