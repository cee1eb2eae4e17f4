// Node/link graph and link status control
//
// Links are undirected and start Up. Only `LinkControl` flips their status.

use hashbrown::HashMap;
use log::{debug, info};

use crate::ndn_error::{SimError, SimResult};
use crate::ndn_interface::{LinkId, NodeId, NodeRole};

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,
    pub up: bool,
}

impl Link {
    /// The endpoint opposite to `node`, if `node` is an endpoint at all
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.a {
            Some(self.b)
        } else if node == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Result of a link status change. Repeating a change is not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkTransition {
    Changed,
    AlreadyDown,
    AlreadyUp,
}

/// Operational status control of links
pub trait LinkControl {
    fn fail(&mut self, link: LinkId) -> SimResult<LinkTransition>;

    fn restore(&mut self, link: LinkId) -> SimResult<LinkTransition>;

    fn is_up(&self, link: LinkId) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Topology {
    roles: Vec<NodeRole>,
    links: Vec<Link>,
    adjacency: Vec<Vec<(NodeId, LinkId)>>,
    by_pair: HashMap<(NodeId, NodeId), LinkId>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, role: NodeRole) -> NodeId {
        self.roles.push(role);
        self.adjacency.push(Vec::new());
        self.roles.len() - 1
    }

    /// Add an Up link between two existing, distinct, not yet linked nodes
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> SimResult<LinkId> {
        for node in [a, b] {
            if node >= self.roles.len() {
                return Err(SimError::UnknownNode(node));
            }
        }
        if a == b {
            return Err(SimError::InvalidTopology {
                reason: format!("self loop on node {}", a),
            });
        }
        let key = canonical_pair(a, b);
        if self.by_pair.contains_key(&key) {
            return Err(SimError::InvalidTopology {
                reason: format!("duplicate link {}-{}", a, b),
            });
        }

        let id = self.links.len();
        self.links.push(Link { a, b, up: true });
        self.adjacency[a].push((b, id));
        self.adjacency[b].push((a, id));
        self.by_pair.insert(key, id);
        Ok(id)
    }

    pub fn num_nodes(&self) -> usize {
        self.roles.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn role(&self, node: NodeId) -> Option<NodeRole> {
        self.roles.get(node).copied()
    }

    pub fn roles(&self) -> &[NodeRole] {
        &self.roles
    }

    pub fn link(&self, link: LinkId) -> Option<&Link> {
        self.links.get(link)
    }

    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        self.by_pair.get(&canonical_pair(a, b)).copied()
    }

    /// All (neighbour, link) pairs of `node`, whatever the link status
    pub fn neighbors(&self, node: NodeId) -> &[(NodeId, LinkId)] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> Vec<NodeId> {
        (0..self.roles.len()).filter(|&n| self.roles[n] == role).collect()
    }

    pub fn infrastructure(&self) -> Vec<NodeId> {
        (0..self.roles.len())
            .filter(|&n| self.roles[n].is_infrastructure())
            .collect()
    }

    /// The infrastructure node a leaf is attached to
    pub fn access_of(&self, leaf: NodeId) -> Option<NodeId> {
        self.neighbors(leaf)
            .iter()
            .map(|&(n, _)| n)
            .find(|&n| self.roles[n].is_infrastructure())
    }

    fn set_status(&mut self, link: LinkId, up: bool) -> SimResult<LinkTransition> {
        let entry = self.links.get_mut(link).ok_or(SimError::UnknownLink(link))?;
        if entry.up == up {
            return Ok(if up {
                LinkTransition::AlreadyUp
            } else {
                LinkTransition::AlreadyDown
            });
        }
        entry.up = up;
        debug!(
            "link {} ({}-{}) now {}",
            link,
            entry.a,
            entry.b,
            if up { "up" } else { "down" }
        );
        Ok(LinkTransition::Changed)
    }
}

impl LinkControl for Topology {
    fn fail(&mut self, link: LinkId) -> SimResult<LinkTransition> {
        self.set_status(link, false)
    }

    fn restore(&mut self, link: LinkId) -> SimResult<LinkTransition> {
        self.set_status(link, true)
    }

    fn is_up(&self, link: LinkId) -> bool {
        self.links.get(link).is_some_and(|l| l.up)
    }
}

fn canonical_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// A topology together with the roles the scenario needs to know about
#[derive(Debug, Clone)]
pub struct BuiltTopology {
    pub topology: Topology,
    pub consumers: Vec<NodeId>,
    pub producer: NodeId,
    /// Infrastructure node the producer hangs off
    pub producer_access: NodeId,
}

impl BuiltTopology {
    pub fn producer_link(&self) -> Option<LinkId> {
        self.topology.link_between(self.producer_access, self.producer)
    }
}

pub struct TopologyBuilder;

impl TopologyBuilder {
    /// consumer - router x `routers` - producer
    ///
    /// Node 0 is the consumer, nodes 1..=routers the routers, the last node
    /// the producer.
    pub fn line(routers: usize) -> SimResult<BuiltTopology> {
        if routers == 0 {
            return Err(SimError::InvalidTopology {
                reason: "line needs at least one router".to_string(),
            });
        }

        let mut topo = Topology::new();
        let consumer = topo.add_node(NodeRole::Consumer);
        let mut previous = consumer;
        for _ in 0..routers {
            let router = topo.add_node(NodeRole::Router);
            topo.add_link(previous, router)?;
            previous = router;
        }
        let producer = topo.add_node(NodeRole::Producer);
        topo.add_link(previous, producer)?;

        Ok(BuiltTopology {
            topology: topo,
            consumers: vec![consumer],
            producer,
            producer_access: previous,
        })
    }

    /// `rows` x `cols` router grid with one leaf per router
    ///
    /// Routers are numbered row-major from 0. Router i < n-1 gets consumer n+i,
    /// the last router gets the producer (node 2n-1).
    pub fn grid(rows: usize, cols: usize) -> SimResult<BuiltTopology> {
        let n = rows * cols;
        if n < 2 {
            return Err(SimError::InvalidTopology {
                reason: format!("grid {}x{} needs at least two routers", rows, cols),
            });
        }

        let mut topo = Topology::new();
        for _ in 0..n {
            topo.add_node(NodeRole::Router);
        }
        for r in 0..rows {
            for c in 0..cols {
                let node = r * cols + c;
                if c + 1 < cols {
                    topo.add_link(node, node + 1)?;
                }
                if r + 1 < rows {
                    topo.add_link(node, node + cols)?;
                }
            }
        }

        Self::attach_leaves(topo, n)
    }

    /// Attach one leaf per infrastructure node of an existing router graph
    /// whose nodes 0..n are all infrastructure
    pub fn attach_leaves(mut topo: Topology, n: usize) -> SimResult<BuiltTopology> {
        if n < 2 || topo.num_nodes() != n {
            return Err(SimError::InvalidTopology {
                reason: format!("expected {} bare infrastructure nodes", n),
            });
        }

        let mut consumers = Vec::with_capacity(n - 1);
        for router in 0..n - 1 {
            let consumer = topo.add_node(NodeRole::Consumer);
            topo.add_link(router, consumer)?;
            consumers.push(consumer);
        }
        let producer_access = n - 1;
        let producer = topo.add_node(NodeRole::Producer);
        topo.add_link(producer_access, producer)?;

        info!(
            "Number_of_infrastructure_nodes: {} ({} consumers, producer {} at {})",
            n,
            consumers.len(),
            producer,
            producer_access
        );

        Ok(BuiltTopology {
            topology: topo,
            consumers,
            producer,
            producer_access,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_layout() {
        let built = TopologyBuilder::line(1).unwrap();
        let topo = &built.topology;
        assert_eq!(topo.num_nodes(), 3);
        assert_eq!(topo.num_links(), 2);
        assert_eq!(built.consumers, vec![0]);
        assert_eq!(built.producer, 2);
        assert_eq!(built.producer_access, 1);
        assert_eq!(topo.access_of(0), Some(1));
        assert_eq!(topo.access_of(2), Some(1));
        assert!(built.producer_link().is_some());
    }

    #[test]
    fn test_grid_layout() {
        let built = TopologyBuilder::grid(3, 3).unwrap();
        let topo = &built.topology;
        assert_eq!(topo.num_nodes(), 18);
        // 12 grid links + 9 leaf links
        assert_eq!(topo.num_links(), 21);
        assert_eq!(built.consumers, (9..17).collect::<Vec<_>>());
        assert_eq!(built.producer, 17);
        assert_eq!(built.producer_access, 8);
        assert_eq!(topo.infrastructure(), (0..9).collect::<Vec<_>>());
        assert_eq!(topo.neighbors(4).len(), 5);
        assert_eq!(topo.access_of(9), Some(0));
    }

    #[test]
    fn test_fail_and_restore_are_idempotent() {
        let mut built = TopologyBuilder::line(1).unwrap();
        let link = built.producer_link().unwrap();
        let topo = &mut built.topology;

        assert!(topo.is_up(link));
        assert_eq!(topo.fail(link), Ok(LinkTransition::Changed));
        assert_eq!(topo.fail(link), Ok(LinkTransition::AlreadyDown));
        assert!(!topo.is_up(link));
        assert_eq!(topo.restore(link), Ok(LinkTransition::Changed));
        assert_eq!(topo.restore(link), Ok(LinkTransition::AlreadyUp));
        assert_eq!(topo.fail(99), Err(SimError::UnknownLink(99)));
    }

    #[test]
    fn test_bad_links_rejected() {
        let mut topo = Topology::new();
        let a = topo.add_node(NodeRole::Router);
        let b = topo.add_node(NodeRole::Router);
        assert!(topo.add_link(a, a).is_err());
        assert_eq!(topo.add_link(a, 5), Err(SimError::UnknownNode(5)));
        topo.add_link(a, b).unwrap();
        assert!(topo.add_link(b, a).is_err());
        assert_eq!(topo.link_between(b, a), Some(0));
        assert_eq!(topo.link(0).and_then(|l| l.other(a)), Some(b));
    }

    #[test]
    fn test_degenerate_builders_rejected() {
        assert!(TopologyBuilder::line(0).is_err());
        assert!(TopologyBuilder::grid(1, 1).is_err());
    }
}
