// Default scenario: 3x3 router grid, producer cut off after initialization

use std::error::Error;

use log::info;
use simple_logger::SimpleLogger;

use ndn_sim::{ScenarioConfig, SimulationDriver, TopologySpec};

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new().with_level(log::LevelFilter::Info).init()?;

    info!("starting");

    let config = ScenarioConfig::default();
    let built = TopologySpec::default().build()?;
    let result = SimulationDriver::new(config, built)?.run()?;

    result.print_summary();
    Ok(())
}
