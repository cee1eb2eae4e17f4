// all node identities are dense indices into the topology's node table
pub type NodeId = usize;
pub type LinkId = usize;

// content ids are popularity ranks, 0 being the most popular
pub type ContentId = u64;
pub type FloodId = u64;

// simulated seconds on the single logical clock
pub type SimTime = f64;

pub const DEFAULT_PREFIX: &str = "/prefix";
pub const DEFAULT_PAYLOAD_SIZE: u32 = 1024;

// default flood hop budget: covers consumer to producer on the default 3x3
// grid (at most 6 hops) with room to spare; seen records bound cyclic floods
pub const DEFAULT_HOP_BUDGET: u32 = 8;

/// Role a node plays in the scenario.
///
/// Infrastructure nodes (`Router`, `Access`) get the bounded cache and take part
/// in the producer-disconnect route removal. Leaves (`Consumer`, `Producer`) get a
/// cache as large as the content universe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeRole {
    Consumer,
    Router,
    Producer,
    Access,
}

impl NodeRole {
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, NodeRole::Router | NodeRole::Access)
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_infrastructure()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Consumer => "consumer",
            NodeRole::Router => "router",
            NodeRole::Producer => "producer",
            NodeRole::Access => "access",
        }
    }
}

/// Marker stored in a content store in place of the real data packet
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DataMarker {
    pub content: ContentId,
    pub payload_size: u32,
}

impl DataMarker {
    pub fn new(content: ContentId) -> Self {
        Self {
            content,
            payload_size: DEFAULT_PAYLOAD_SIZE,
        }
    }
}

// ============================================================================
// Event Logging System
// ============================================================================

/// What happened, as recorded in the per-run event log
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// Consumer opened a session for a content
    Connect,
    /// Consumer closed a session for a content
    Disconnect,
    /// Scoped route for a content removed at an access router
    RemoveScopedRoute,
    /// Default route for the prefix removed at a node
    RemoveDefaultRoute,
    LinkFail,
    LinkRestore,
    PhaseChange,
    /// Flood answered from the originator's own store
    LocalHit,
    /// Flood answered after traversing the network
    Satisfied { hops: u32, source: usize },
    /// Flood ran out of hops or eligible next hops
    Exhausted,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Connect => "CON",
            RecordKind::Disconnect => "DISCONN",
            RecordKind::RemoveScopedRoute => "RMV_SIT",
            RecordKind::RemoveDefaultRoute => "RMV_FIB",
            RecordKind::LinkFail => "LINK_FAIL",
            RecordKind::LinkRestore => "LINK_UP",
            RecordKind::PhaseChange => "PHASE",
            RecordKind::LocalHit => "LOCAL_HIT",
            RecordKind::Satisfied { .. } => "SATISFIED",
            RecordKind::Exhausted => "EXHAUSTED",
        }
    }
}

/// One timestamped line of the event log
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub time: SimTime,
    pub node: NodeId,
    pub content: Option<ContentId>,
    pub kind: RecordKind,
}

/// Trait for consuming event records as the simulation produces them
pub trait EventSink {
    fn log(&mut self, record: &EventRecord);
}

/// No-op event sink
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _record: &EventRecord) {}
}
