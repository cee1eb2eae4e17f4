//! # ndn_sim - NDN cache churn simulator
//!
//! A discrete-event simulation of flood-based content retrieval over a
//! named-data network whose consumers connect and disconnect over time. A single
//! producer serves the whole content universe until, at the end of an
//! initialization period, it is cut off from the network; during the following
//! observation period consumers can only be served from in-network caches and
//! from each other.
//!
//! ## Core Components
//!
//! - **EventScheduler**: time-ordered event queue with FIFO tie-break
//! - **ChurnProcess**: exponential connect/disconnect inter-arrival generator
//! - **PopularitySampler**: Zipf-Mandelbrot content popularity
//! - **RoutingTable / LinkControl**: per-node FIB with default and content-scoped
//!   entries, link Up/Down state
//! - **ContentStore**: per-node LRU cache with role-dependent capacity
//! - **FloodEngine**: hop-bounded flood retrieval with duplicate suppression
//! - **SimulationDriver**: the two-phase scenario and the producer failure
//!
//! ```no_run
//! use ndn_sim::{ScenarioConfig, SimulationDriver, TopologySpec};
//!
//! let config = ScenarioConfig {
//!     seed: Some(42),
//!     ..ScenarioConfig::default()
//! };
//! let built = TopologySpec::default().build().unwrap();
//! let result = SimulationDriver::new(config, built).unwrap().run().unwrap();
//! result.print_summary();
//! ```

// Simulation core
pub mod ndn_churn;
pub mod ndn_content_store;
pub mod ndn_driver;
pub mod ndn_fib;
pub mod ndn_flood;
pub mod ndn_popularity;
pub mod ndn_scheduler;
pub mod ndn_sessions;

// Network model
pub mod ndn_node;
pub mod ndn_topology;

// Shared types, configuration, errors and results
pub mod ndn_config;
pub mod ndn_error;
pub mod ndn_interface;
pub mod ndn_stats;

// Re-export commonly used types
pub use ndn_config::{ScenarioConfig, TopologySpec};
pub use ndn_driver::{Phase, SimEvent, SimulationDriver};
pub use ndn_error::{SimError, SimResult};
pub use ndn_interface::{
    ContentId, EventRecord, EventSink, LinkId, NodeId, NodeRole, NoOpSink, RecordKind, SimTime,
};
pub use ndn_stats::{ChurnStats, NodeStats, SimulationResult};
pub use ndn_topology::{BuiltTopology, LinkControl, Topology, TopologyBuilder};
