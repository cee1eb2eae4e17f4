// Flood-based content retrieval
//
// An interest for a content is flooded hop by hop along FIB next hops over Up
// links, each copy carrying one hop less. Every node checks its content store on
// arrival. The nearest hit (breadth-first, so fewest hops) answers; its data
// travels back along the interest's path and is cached at every infrastructure
// node on the way, including the originator when the originator is one.
// Duplicate copies of the same flood are dropped by each node's seen record,
// which keeps cyclic topologies finite even with a large hop budget.
//
// Floods complete within the event that issued them; no other event can
// interleave with a flood.

use std::collections::{BTreeMap, VecDeque};

use log::trace;

use crate::ndn_error::{SimError, SimResult};
use crate::ndn_interface::{ContentId, FloodId, NodeId};
use crate::ndn_node::SimNode;
use crate::ndn_topology::{LinkControl, Topology};

/// Lifecycle of one flood request: Issued -> Forwarded* -> Satisfied | Exhausted
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FloodState {
    Issued,
    Forwarded,
    Satisfied,
    Exhausted,
}

impl FloodState {
    fn can_become(&self, next: FloodState) -> bool {
        matches!(
            (self, next),
            (FloodState::Issued, FloodState::Forwarded)
                | (FloodState::Issued, FloodState::Satisfied)
                | (FloodState::Issued, FloodState::Exhausted)
                | (FloodState::Forwarded, FloodState::Forwarded)
                | (FloodState::Forwarded, FloodState::Satisfied)
                | (FloodState::Forwarded, FloodState::Exhausted)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FloodOutcome {
    /// Data found at `source`, `path` runs from the originator to the source
    Satisfied { source: NodeId, hops: u32, path: Vec<NodeId> },
    /// No copy of the interest reached a node holding the content
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct FloodReport {
    pub id: FloodId,
    pub origin: NodeId,
    pub content: ContentId,
    pub state: FloodState,
    pub outcome: FloodOutcome,
    /// Interest copies sent over links
    pub forwards: u32,
    /// Copies dropped because the receiver had already seen this flood
    pub duplicates: u32,
}

impl FloodReport {
    pub fn is_satisfied(&self) -> bool {
        matches!(self.outcome, FloodOutcome::Satisfied { .. })
    }

    pub fn is_local_hit(&self) -> bool {
        matches!(self.outcome, FloodOutcome::Satisfied { hops: 0, .. })
    }

    /// Whether any copy of the interest was received by `node` (originator excluded)
    pub fn reached(&self, node: NodeId) -> bool {
        match &self.outcome {
            FloodOutcome::Satisfied { path, .. } => path.iter().skip(1).any(|&n| n == node),
            FloodOutcome::Exhausted => false,
        }
    }
}

/// Aggregate flood counters for a run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloodStats {
    pub issued: u64,
    pub local_hits: u64,
    pub satisfied: u64,
    pub exhausted: u64,
    pub forwards: u64,
    pub duplicates_suppressed: u64,
    /// Satisfied floods by hop count of the answering node
    pub hops_histogram: BTreeMap<u32, u64>,
}

impl FloodStats {
    pub fn satisfaction_ratio(&self) -> f64 {
        if self.issued == 0 {
            0.0
        } else {
            self.satisfied as f64 / self.issued as f64
        }
    }

    fn record(&mut self, report: &FloodReport) {
        self.issued += 1;
        self.forwards += report.forwards as u64;
        self.duplicates_suppressed += report.duplicates as u64;
        match &report.outcome {
            FloodOutcome::Satisfied { hops, .. } => {
                self.satisfied += 1;
                if *hops == 0 {
                    self.local_hits += 1;
                }
                *self.hops_histogram.entry(*hops).or_insert(0) += 1;
            }
            FloodOutcome::Exhausted => self.exhausted += 1,
        }
    }
}

/// One interest copy in flight
struct Visit {
    node: NodeId,
    parent: Option<usize>,
    hops_left: u32,
}

/// Issues flood requests and tracks their statistics
pub struct FloodEngine {
    next_id: FloodId,
    stats: FloodStats,
}

impl FloodEngine {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            stats: FloodStats::default(),
        }
    }

    pub fn stats(&self) -> &FloodStats {
        &self.stats
    }

    /// Flood an interest for `content` from `origin` with `hop_budget` hops
    pub fn flood(
        &mut self,
        nodes: &mut [SimNode],
        topology: &Topology,
        prefix: &str,
        origin: NodeId,
        content: ContentId,
        hop_budget: u32,
    ) -> SimResult<FloodReport> {
        if origin >= nodes.len() {
            return Err(SimError::UnknownNode(origin));
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut report = FloodReport {
            id,
            origin,
            content,
            state: FloodState::Issued,
            outcome: FloodOutcome::Exhausted,
            forwards: 0,
            duplicates: 0,
        };

        nodes[origin].mark_seen(id);
        if nodes[origin].store.get(content).is_some() {
            trace!("flood {}: local hit for {} at {}", id, content, origin);
            transition(&mut report, FloodState::Satisfied);
            report.outcome = FloodOutcome::Satisfied {
                source: origin,
                hops: 0,
                path: vec![origin],
            };
            self.stats.record(&report);
            return Ok(report);
        }

        let mut visits = vec![Visit {
            node: origin,
            parent: None,
            hops_left: hop_budget,
        }];
        let mut queue = VecDeque::from([0usize]);
        let mut found = None;

        'search: while let Some(current) = queue.pop_front() {
            let node = visits[current].node;
            let hops_left = visits[current].hops_left;
            if hops_left == 0 {
                continue;
            }
            let arrived_from = visits[current].parent.map(|p| visits[p].node);
            let next_hops = nodes[node].fib.lookup(prefix, content).to_vec();

            for next in next_hops {
                if Some(next) == arrived_from {
                    continue;
                }
                let Some(link) = topology.link_between(node, next) else {
                    continue;
                };
                if !topology.is_up(link) || next >= nodes.len() {
                    continue;
                }

                report.forwards += 1;
                transition(&mut report, FloodState::Forwarded);
                trace!("flood {}: {} -> {} ({} hops left)", id, node, next, hops_left - 1);

                if !nodes[next].mark_seen(id) {
                    report.duplicates += 1;
                    continue;
                }

                visits.push(Visit {
                    node: next,
                    parent: Some(current),
                    hops_left: hops_left - 1,
                });
                let visit = visits.len() - 1;

                if let Some(marker) = nodes[next].store.get(content) {
                    found = Some((visit, marker));
                    break 'search;
                }
                queue.push_back(visit);
            }
        }

        match found {
            Some((visit, marker)) => {
                let path = path_to(&visits, visit);
                let source = visits[visit].node;
                let hops = (path.len() - 1) as u32;

                // data returns source -> originator, caching on infrastructure nodes
                for &hop in path.iter().rev().skip(1) {
                    if nodes[hop].role.is_infrastructure() {
                        nodes[hop].store.put_marker(marker);
                    }
                }

                trace!("flood {}: {} satisfied by {} after {} hops", id, content, source, hops);
                transition(&mut report, FloodState::Satisfied);
                report.outcome = FloodOutcome::Satisfied { source, hops, path };
            }
            None => {
                trace!("flood {}: {} exhausted from {}", id, content, origin);
                transition(&mut report, FloodState::Exhausted);
            }
        }

        self.stats.record(&report);
        Ok(report)
    }
}

impl Default for FloodEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn transition(report: &mut FloodReport, next: FloodState) {
    debug_assert!(
        report.state.can_become(next),
        "illegal flood transition {:?} -> {:?}",
        report.state,
        next
    );
    report.state = next;
}

fn path_to(visits: &[Visit], last: usize) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut cursor = Some(last);
    while let Some(index) = cursor {
        path.push(visits[index].node);
        cursor = visits[index].parent;
    }
    path.reverse();
    path
}
