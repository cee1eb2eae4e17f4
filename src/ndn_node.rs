// Simulated node: role, content store, FIB and flood suppression record

use indexmap::IndexSet;

use crate::ndn_content_store::ContentStore;
use crate::ndn_error::SimResult;
use crate::ndn_fib::RoutingTable;
use crate::ndn_interface::{ContentId, DataMarker, FloodId, NodeId, NodeRole};

// how many recent flood ids a node remembers
pub const SEEN_RECORD_SIZE: usize = 256;

pub struct SimNode {
    pub id: NodeId,
    pub role: NodeRole,
    pub store: ContentStore,
    pub fib: RoutingTable,
    seen: IndexSet<FloodId>,
}

impl SimNode {
    pub fn new(id: NodeId, role: NodeRole, router_capacity: usize, universe_size: usize) -> SimResult<Self> {
        Ok(Self {
            id,
            role,
            store: ContentStore::for_role(role, router_capacity, universe_size)?,
            fib: RoutingTable::new(),
            seen: IndexSet::new(),
        })
    }

    /// Record that this node processed `flood`. Returns false if it already had,
    /// in which case the copy must be dropped.
    pub fn mark_seen(&mut self, flood: FloodId) -> bool {
        if self.seen.contains(&flood) {
            return false;
        }
        if self.seen.len() >= SEEN_RECORD_SIZE {
            self.seen.shift_remove_index(0);
        }
        self.seen.insert(flood)
    }

    pub fn has_seen(&self, flood: FloodId) -> bool {
        self.seen.contains(&flood)
    }

    /// Fill the store with every content of the universe (producer side)
    pub fn seed_store(&mut self, universe_size: u64, payload_size: u32) {
        for content in 0..universe_size as ContentId {
            self.store.put_marker(DataMarker {
                content,
                payload_size,
            });
        }
    }
}
