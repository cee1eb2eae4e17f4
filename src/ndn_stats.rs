// Simulation Statistics

use std::collections::BTreeMap;

use crate::ndn_content_store::CacheCounters;
use crate::ndn_flood::FloodStats;
use crate::ndn_interface::{EventRecord, NodeId, NodeRole, RecordKind, SimTime};

// ============================================================================
// Simulation Result
// ============================================================================

/// Complete simulation result
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Configuration summary
    pub config_summary: String,

    /// Random seed used
    pub seed_used: u64,

    /// Simulated time of the last processed event
    pub end_time: SimTime,

    /// Events dispatched by the scheduler
    pub events_processed: u64,

    /// Per-node cache state at the end of the run
    pub node_stats: BTreeMap<NodeId, NodeStats>,

    /// Flood retrieval statistics
    pub flood: FloodStats,

    /// Churn statistics
    pub churn: ChurnStats,

    /// Event log (what happened and when), empty if recording was disabled
    pub event_log: Vec<EventRecord>,
}

/// Cache state of a single node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    pub role: NodeRole,
    pub counters: CacheCounters,
    pub occupancy: usize,
    pub capacity: usize,
    /// FIB entries left at the end of the run
    pub fib_entries: usize,
}

/// Connect / disconnect process statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChurnStats {
    pub connects: u64,
    pub disconnects: u64,

    /// Disconnect events that found no open session
    pub skipped_disconnects: u64,

    pub scoped_route_removals: u64,
    pub default_route_removals: u64,

    /// Highest number of simultaneously open sessions
    pub peak_active: u64,

    /// Sessions still open when the run stopped
    pub final_active: u64,

    /// Disconnect rate in effect when the run stopped
    pub final_disconnect_rate: f64,
}

impl SimulationResult {
    /// Records of one kind, compared by label so payload-carrying kinds match too
    pub fn records_of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &EventRecord> {
        self.event_log
            .iter()
            .filter(move |r| r.kind.label() == kind.label())
    }

    /// Cache counters summed over all nodes with `role`
    pub fn cache_totals(&self, role: NodeRole) -> CacheCounters {
        let mut total = CacheCounters::default();
        for stats in self.node_stats.values().filter(|s| s.role == role) {
            total.hits += stats.counters.hits;
            total.misses += stats.counters.misses;
            total.insertions += stats.counters.insertions;
            total.evictions += stats.counters.evictions;
        }
        total
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║    NDN CACHE CHURN SIMULATION RESULTS                  ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration: {}", self.config_summary);
        println!("Seed: {}", self.seed_used);
        println!("End time: {:.3}s, events processed: {}", self.end_time, self.events_processed);
        println!();

        println!("═══ Churn ═══");
        println!("  Connects: {}", self.churn.connects);
        println!("  Disconnects: {} ({} skipped)", self.churn.disconnects, self.churn.skipped_disconnects);
        println!("  Peak Active Sessions: {}", self.churn.peak_active);
        println!("  Final Active Sessions: {}", self.churn.final_active);
        println!("  Final Disconnect Rate: {:.4}", self.churn.final_disconnect_rate);
        println!(
            "  Route Removals: {} scoped, {} default",
            self.churn.scoped_route_removals, self.churn.default_route_removals
        );
        println!();

        println!("═══ Flood Retrieval ═══");
        println!("  Issued: {}", self.flood.issued);
        println!("  Local Hits: {}", self.flood.local_hits);
        println!("  Satisfied: {}", self.flood.satisfied);
        println!("  Exhausted: {}", self.flood.exhausted);
        if self.flood.issued > 0 {
            println!("  Satisfaction Rate: {:.1}%", self.flood.satisfaction_ratio() * 100.0);
        }
        println!(
            "  Forwards: {} ({} duplicates suppressed)",
            self.flood.forwards, self.flood.duplicates_suppressed
        );
        for (hops, count) in &self.flood.hops_histogram {
            println!("    {} hops: {}", hops, count);
        }
        println!();

        println!("═══ Caches ═══");
        for role in [NodeRole::Router, NodeRole::Access, NodeRole::Consumer] {
            let totals = self.cache_totals(role);
            if totals.hits + totals.misses == 0 && totals.insertions == 0 {
                continue;
            }
            println!(
                "  {:<9} hits={} misses={} evictions={} hit ratio={:.1}%",
                role.as_str(),
                totals.hits,
                totals.misses,
                totals.evictions,
                totals.hit_ratio() * 100.0
            );
        }
        println!();

        if !self.event_log.is_empty() {
            println!("═══ Event Log ═══");
            println!("  {} records", self.event_log.len());
            let mut by_label: BTreeMap<&str, usize> = BTreeMap::new();
            for record in &self.event_log {
                *by_label.entry(record.kind.label()).or_insert(0) += 1;
            }
            for (label, count) in by_label {
                println!("    {:<10} {}", label, count);
            }
            println!();
        }
    }
}
