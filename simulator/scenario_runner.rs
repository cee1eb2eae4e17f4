// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner simulator/scenarios/grid_3x3.yaml
//   cargo run --bin scenario_runner simulator/scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner simulator/scenarios/grid_3x3.yaml --seed 42 --csv events.csv

mod event_sinks;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simple_logger::SimpleLogger;

use event_sinks::{ConsoleEventSink, CsvEventSink, MultiEventSink};
use ndn_sim::{ScenarioConfig, SimulationDriver, TopologySpec};

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Simulation parameters, missing fields take their defaults
    #[serde(default)]
    config: ScenarioConfig,

    /// Router graph the consumers and the producer are attached to
    #[serde(default)]
    topology: TopologySpec,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

#[derive(Debug, Default)]
struct RunnerArgs {
    seed: Option<u64>,
    csv: Option<PathBuf>,
    trace_events: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED] [--csv FILE] [--events]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} simulator/scenarios/grid_3x3.yaml", args[0]);
        eprintln!("  {} simulator/scenarios/", args[0]);
        eprintln!("  {} simulator/scenarios/line.yaml --seed 42 --csv line.csv", args[0]);
        std::process::exit(1);
    }

    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Failed to install logger: {}", e);
    }

    let path = Path::new(&args[1]);
    let runner_args = parse_args(&args[2..]).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if path.is_file() {
        run_scenario_file(path, &runner_args, runner_args.csv.clone());
    } else if path.is_dir() {
        run_scenario_directory(path, &runner_args);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<RunnerArgs, String> {
    let mut parsed = RunnerArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                parsed.seed = Some(parse_seed(value)?);
            }
            "--csv" => {
                let value = iter.next().ok_or("--csv needs a file name")?;
                parsed.csv = Some(PathBuf::from(value));
            }
            "--events" => parsed.trace_events = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn parse_seed(value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid seed {}: {}", value, e))
}

fn run_scenario_directory(dir: &Path, args: &RunnerArgs) {
    let mut scenarios = Vec::new();

    // Find all .yaml files
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                 ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        // one CSV per scenario, named after the scenario file
        let csv = args.csv.as_ref().map(|base| csv_path_for(base, scenario_path));
        run_scenario_file(scenario_path, args, csv);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn csv_path_for(base: &Path, scenario: &Path) -> PathBuf {
    let stem = scenario
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scenario");
    let base_stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("events");
    base.with_file_name(format!("{}_{}.csv", base_stem, stem))
}

fn run_scenario_file(path: &Path, args: &RunnerArgs, csv: Option<PathBuf>) {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    match scenario.meta.name {
        Some(ref name) => println!("║  {}", name),
        None => println!(
            "║  Scenario: {}",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed")
        ),
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc.trim());
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis.trim());
    }

    let mut config = scenario.config;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    println!("Configuration:");
    println!("  Topology: {:?}", scenario.topology);
    println!("  Contents: {}", config.num_contents);
    println!("  Router Cache: {}", config.cache_size);
    println!(
        "  Rates: connect {} /s, disconnect {} /s per session",
        config.connection_rate, config.disconnection_rate
    );
    println!(
        "  Periods: {}s initialization, {}s observation",
        config.initialization_period_length, config.observation_period_length
    );
    println!("  Zipf: s={} q={}", config.zipf_exponent, config.zipf_shift);
    println!("\nStarting simulation...\n");

    let built = scenario.topology.build().unwrap_or_else(|e| {
        eprintln!("Invalid topology in {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let mut driver = SimulationDriver::new(config, built).unwrap_or_else(|e| {
        eprintln!("Invalid configuration in {}: {}", path.display(), e);
        std::process::exit(1);
    });

    let mut sinks = MultiEventSink::new();
    if args.trace_events {
        sinks.add_sink(Box::new(ConsoleEventSink::new(true)));
    }
    if let Some(ref csv_path) = csv {
        match CsvEventSink::new(csv_path) {
            Ok(sink) => sinks.add_sink(Box::new(sink)),
            Err(e) => eprintln!("Cannot create {}: {}", csv_path.display(), e),
        }
    }
    if !sinks.is_empty() {
        driver = driver.with_event_sink(Box::new(sinks));
    }

    let result = driver.run().unwrap_or_else(|e| {
        eprintln!("Simulation aborted: {}", e);
        std::process::exit(1);
    });

    result.print_summary();

    if let Some(csv_path) = csv {
        println!("Events written to {}", csv_path.display());
    }
    println!("\n✓ Scenario complete!\n");
}
