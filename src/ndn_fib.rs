// Forwarding information base
//
// A prefix has one coarse default next-hop set plus any number of
// content-scoped next-hop sets layered on top of it. The two layers are stored
// separately; removing one never touches the other.

use std::collections::VecDeque;

use hashbrown::HashMap;
use log::debug;

use crate::ndn_interface::{ContentId, NodeId};
use crate::ndn_topology::{LinkControl, Topology};

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    defaults: HashMap<String, Vec<NodeId>>,
    scoped: HashMap<String, HashMap<ContentId, Vec<NodeId>>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `next_hop` to the default set of `prefix`
    pub fn install_default(&mut self, prefix: &str, next_hop: NodeId) {
        let hops = self.defaults.entry(prefix.to_string()).or_default();
        if !hops.contains(&next_hop) {
            hops.push(next_hop);
        }
    }

    /// Add `next_hop` to the set scoped to `content` under `prefix`
    pub fn install_scoped(&mut self, prefix: &str, content: ContentId, next_hop: NodeId) {
        let hops = self
            .scoped
            .entry(prefix.to_string())
            .or_default()
            .entry(content)
            .or_default();
        if !hops.contains(&next_hop) {
            hops.push(next_hop);
        }
    }

    /// Remove default entries of `prefix`: only the one toward `next_hop` if
    /// given, all of them otherwise. Returns the number of entries removed.
    pub fn remove_default(&mut self, prefix: &str, next_hop: Option<NodeId>) -> usize {
        let Some(hops) = self.defaults.get_mut(prefix) else {
            return 0;
        };
        let removed = remove_hops(hops, next_hop);
        if hops.is_empty() {
            self.defaults.remove(prefix);
        }
        removed
    }

    /// Remove entries scoped to `content` under `prefix`, with the same
    /// next-hop semantics as `remove_default`
    pub fn remove_scoped(&mut self, prefix: &str, content: ContentId, next_hop: Option<NodeId>) -> usize {
        let Some(by_content) = self.scoped.get_mut(prefix) else {
            return 0;
        };
        let Some(hops) = by_content.get_mut(&content) else {
            return 0;
        };
        let removed = remove_hops(hops, next_hop);
        if hops.is_empty() {
            by_content.remove(&content);
        }
        if by_content.is_empty() {
            self.scoped.remove(prefix);
        }
        removed
    }

    /// Next hops for `content` under `prefix`: the scoped set if one exists,
    /// else the default set, else empty (route miss)
    pub fn lookup(&self, prefix: &str, content: ContentId) -> &[NodeId] {
        if let Some(hops) = self.scoped.get(prefix).and_then(|m| m.get(&content)) {
            return hops;
        }
        self.defaults.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn default_hops(&self, prefix: &str) -> &[NodeId] {
        self.defaults.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn scoped_hops(&self, prefix: &str, content: ContentId) -> &[NodeId] {
        self.scoped
            .get(prefix)
            .and_then(|m| m.get(&content))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of (prefix, [content], next hop) entries
    pub fn len(&self) -> usize {
        let defaults: usize = self.defaults.values().map(Vec::len).sum();
        let scoped: usize = self
            .scoped
            .values()
            .flat_map(|m| m.values())
            .map(Vec::len)
            .sum();
        defaults + scoped
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_hops(hops: &mut Vec<NodeId>, next_hop: Option<NodeId>) -> usize {
    let before = hops.len();
    match next_hop {
        Some(hop) => hops.retain(|&h| h != hop),
        None => hops.clear(),
    }
    before - hops.len()
}

// ============================================================================
// Global routing
// ============================================================================

/// Install default routes for `prefix` toward `origin` on every node
///
/// Hop distances to `origin` are computed over Up links; each node gets a
/// default entry toward every neighbour that is one hop closer. Nodes that
/// cannot reach `origin` get no entry.
pub fn install_global_routes(
    tables: &mut [RoutingTable],
    topology: &Topology,
    prefix: &str,
    origin: NodeId,
) -> usize {
    let distance = hop_distances(topology, origin);
    let mut installed = 0;

    for (node, table) in tables.iter_mut().enumerate() {
        let Some(own) = distance.get(node).copied().flatten() else {
            continue;
        };
        if own == 0 {
            continue;
        }
        for &(neighbor, link) in topology.neighbors(node) {
            if !topology.is_up(link) {
                continue;
            }
            if distance.get(neighbor).copied().flatten() == Some(own - 1) {
                table.install_default(prefix, neighbor);
                installed += 1;
            }
        }
    }

    debug!(
        "installed {} default routes for {} toward node {}",
        installed, prefix, origin
    );
    installed
}

/// Breadth-first hop count from `origin` over Up links
pub fn hop_distances(topology: &Topology, origin: NodeId) -> Vec<Option<u32>> {
    let mut distance = vec![None; topology.num_nodes()];
    if origin >= distance.len() {
        return distance;
    }

    let mut queue = VecDeque::new();
    distance[origin] = Some(0);
    queue.push_back(origin);

    while let Some(node) = queue.pop_front() {
        let next = distance[node].unwrap_or(0) + 1;
        for &(neighbor, link) in topology.neighbors(node) {
            if topology.is_up(link) && distance[neighbor].is_none() {
                distance[neighbor] = Some(next);
                queue.push_back(neighbor);
            }
        }
    }

    distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndn_interface::NodeRole;
    use crate::ndn_topology::{LinkControl, TopologyBuilder};

    const P: &str = "/prefix";

    #[test]
    fn test_scoped_survives_default_removal() {
        let mut fib = RoutingTable::new();
        fib.install_scoped(P, 7, 10);
        fib.install_default(P, 20);
        assert_eq!(fib.lookup(P, 7), &[10]);
        assert_eq!(fib.lookup(P, 8), &[20]);

        assert_eq!(fib.remove_default(P, None), 1);
        assert_eq!(fib.lookup(P, 7), &[10]);
        assert!(fib.lookup(P, 8).is_empty());
    }

    #[test]
    fn test_default_survives_scoped_removal() {
        let mut fib = RoutingTable::new();
        fib.install_default(P, 20);
        fib.install_scoped(P, 7, 10);

        assert_eq!(fib.remove_scoped(P, 7, None), 1);
        assert_eq!(fib.lookup(P, 7), &[20]);
        assert_eq!(fib.default_hops(P), &[20]);
    }

    #[test]
    fn test_remove_specific_next_hop() {
        let mut fib = RoutingTable::new();
        fib.install_scoped(P, 3, 1);
        fib.install_scoped(P, 3, 2);
        fib.install_scoped(P, 3, 2);
        assert_eq!(fib.scoped_hops(P, 3), &[1, 2]);

        assert_eq!(fib.remove_scoped(P, 3, Some(2)), 1);
        assert_eq!(fib.scoped_hops(P, 3), &[1]);
        assert_eq!(fib.remove_scoped(P, 3, Some(9)), 0);

        fib.install_default(P, 4);
        fib.install_default(P, 5);
        assert_eq!(fib.remove_default(P, Some(4)), 1);
        assert_eq!(fib.default_hops(P), &[5]);
        assert_eq!(fib.len(), 2);
    }

    #[test]
    fn test_lookup_miss_is_empty() {
        let mut fib = RoutingTable::new();
        assert!(fib.lookup(P, 0).is_empty());
        assert_eq!(fib.remove_default(P, None), 0);
        assert_eq!(fib.remove_scoped(P, 0, None), 0);
        assert!(fib.is_empty());

        fib.install_default("/other", 1);
        assert!(fib.lookup(P, 0).is_empty());
    }

    #[test]
    fn test_global_routes_on_line() {
        // consumer(0) - router(1) - router(2) - producer(3)
        let built = TopologyBuilder::line(2).unwrap();
        let topo = built.topology;
        let mut tables = vec![RoutingTable::new(); topo.num_nodes()];

        install_global_routes(&mut tables, &topo, P, built.producer);

        assert_eq!(tables[0].default_hops(P), &[1]);
        assert_eq!(tables[1].default_hops(P), &[2]);
        assert_eq!(tables[2].default_hops(P), &[3]);
        assert!(tables[3].default_hops(P).is_empty());
    }

    #[test]
    fn test_global_routes_skip_down_links() {
        let built = TopologyBuilder::line(1).unwrap();
        let mut topo = built.topology;
        let link = topo.link_between(1, 2).unwrap();
        topo.fail(link).unwrap();

        let mut tables = vec![RoutingTable::new(); topo.num_nodes()];
        install_global_routes(&mut tables, &topo, P, built.producer);

        assert!(tables[0].default_hops(P).is_empty());
        assert!(tables[1].default_hops(P).is_empty());
        assert_eq!(topo.role(0), Some(NodeRole::Consumer));
    }

    #[test]
    fn test_grid_routes_use_all_shortest_paths() {
        let built = TopologyBuilder::grid(2, 2).unwrap();
        let topo = built.topology;
        let mut tables = vec![RoutingTable::new(); topo.num_nodes()];
        install_global_routes(&mut tables, &topo, P, built.producer);

        // router 0 is diagonal to router 3 (the producer's access router)
        let mut hops = tables[0].default_hops(P).to_vec();
        hops.sort();
        assert_eq!(hops, vec![1, 2]);
    }
}
