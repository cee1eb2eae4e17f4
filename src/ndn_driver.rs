// Simulation driver
//
// Owns every piece of mutable simulation state and runs the churn /
// producer-failure scenario on top of the event scheduler:
//
//   Initialization    connect arrivals only, each one a flood retrieval
//   ProducerDisconnect at the boundary instant: default routes removed at every
//                     infrastructure node, then the producer link fails
//   Observation       interleaved connects and disconnects until the horizon
//   Stopped           scheduler halted, pending events dropped

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::ndn_churn::ChurnProcess;
use crate::ndn_config::ScenarioConfig;
use crate::ndn_error::{SimError, SimResult};
use crate::ndn_fib::{hop_distances, install_global_routes, RoutingTable};
use crate::ndn_flood::{FloodEngine, FloodOutcome, FloodReport};
use crate::ndn_interface::{
    ContentId, DataMarker, EventRecord, EventSink, LinkId, NodeId, RecordKind, SimTime,
};
use crate::ndn_node::SimNode;
use crate::ndn_popularity::PopularitySampler;
use crate::ndn_scheduler::{EventHandle, EventScheduler, RunOutcome};
use crate::ndn_sessions::SessionTable;
use crate::ndn_stats::{ChurnStats, NodeStats, SimulationResult};
use crate::ndn_topology::{BuiltTopology, LinkControl, LinkTransition};

/// Scenario phase
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Initialization,
    ProducerDisconnect,
    Observation,
    Stopped,
}

/// Events understood by the driver
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    /// A random consumer opens a session for a sampled content and retrieves it
    Connect,
    /// A random open session is closed
    Disconnect,
    /// Bare flood retrieval from `origin`, without session bookkeeping
    Retrieve { origin: NodeId, content: ContentId },
    /// Remove routes for the configured prefix at `node`: the entry scoped to
    /// `content` if given, the default entry otherwise; only the one toward
    /// `next_hop` if given
    RouteRemoval {
        node: NodeId,
        content: Option<ContentId>,
        next_hop: Option<NodeId>,
    },
    LinkFail(LinkId),
    LinkRestore(LinkId),
    /// Enter the given phase
    PhaseBoundary(Phase),
}

// ============================================================================
// World state
// ============================================================================

/// Everything event handlers mutate, kept apart from the scheduler so both
/// can be borrowed at once
struct World {
    config: ScenarioConfig,
    built: BuiltTopology,
    nodes: Vec<SimNode>,
    sessions: SessionTable,
    churn: ChurnProcess,
    sampler: PopularitySampler,
    flood: FloodEngine,
    rng: StdRng,
    phase: Phase,
    churn_stats: ChurnStats,
    event_log: Vec<EventRecord>,
    sink: Option<Box<dyn EventSink>>,
}

impl World {
    fn handle(
        &mut self,
        scheduler: &mut EventScheduler<SimEvent>,
        time: SimTime,
        event: SimEvent,
    ) -> SimResult<()> {
        match event {
            SimEvent::Connect => self.on_connect(scheduler, time),
            SimEvent::Disconnect => self.on_disconnect(scheduler, time),
            SimEvent::Retrieve { origin, content } => {
                self.retrieve(time, origin, content)?;
                Ok(())
            }
            SimEvent::RouteRemoval {
                node,
                content,
                next_hop,
            } => self.on_route_removal(time, node, content, next_hop),
            SimEvent::LinkFail(link) => self.on_link_change(time, link, false),
            SimEvent::LinkRestore(link) => self.on_link_change(time, link, true),
            SimEvent::PhaseBoundary(phase) => self.on_phase(scheduler, time, phase),
        }
    }

    fn on_connect(&mut self, scheduler: &mut EventScheduler<SimEvent>, time: SimTime) -> SimResult<()> {
        let consumers = &self.built.consumers;
        if consumers.is_empty() {
            return Err(SimError::InvalidTopology {
                reason: "no consumer to connect".to_string(),
            });
        }
        let consumer = consumers[self.rng.gen_range(0..consumers.len())];
        let content = self.sampler.next();

        let count = self.sessions.open(consumer, content);
        self.churn.record_connect()?;
        self.churn_stats.connects += 1;
        self.churn_stats.peak_active = self.churn_stats.peak_active.max(self.sessions.active());

        debug!(
            "CON {:.6} node {} content {} sessions {} active {}",
            time,
            consumer,
            content,
            count,
            self.sessions.active()
        );
        self.record(time, consumer, Some(content), RecordKind::Connect);

        let report = self.retrieve(time, consumer, content)?;
        if report.is_satisfied() {
            self.establish_session_route(consumer, content);
        }

        // initialization arrivals stop at the boundary, observation ones at the horizon
        let limit = match self.phase {
            Phase::Initialization => self.config.initialization_period_length,
            _ => self.config.horizon(),
        };
        let next = time + self.churn.next_connect_interval();
        if next < limit {
            scheduler.schedule(next, SimEvent::Connect)?;
        }
        Ok(())
    }

    fn on_disconnect(&mut self, scheduler: &mut EventScheduler<SimEvent>, time: SimTime) -> SimResult<()> {
        match self.sessions.close_random(&mut self.rng) {
            Some(closed) => {
                self.churn.record_disconnect()?;
                self.churn_stats.disconnects += 1;
                debug!(
                    "DISCONN {:.6} node {} content {} sessions {} rate {:.4}",
                    time,
                    closed.consumer,
                    closed.content,
                    closed.remaining,
                    self.churn.disconnect_rate()
                );
                self.record(time, closed.consumer, Some(closed.content), RecordKind::Disconnect);

                if closed.was_last() {
                    if let Some(access) = self.built.topology.access_of(closed.consumer) {
                        scheduler.schedule(
                            time,
                            SimEvent::RouteRemoval {
                                node: access,
                                content: Some(closed.content),
                                next_hop: Some(closed.consumer),
                            },
                        )?;
                    }
                }
            }
            None => {
                self.churn_stats.skipped_disconnects += 1;
                debug!("DISCONN {:.6} skipped, no open session", time);
            }
        }

        let next = time + self.churn.next_disconnect_interval();
        if next < self.config.horizon() {
            scheduler.schedule(next, SimEvent::Disconnect)?;
        }
        Ok(())
    }

    fn on_route_removal(
        &mut self,
        time: SimTime,
        node: NodeId,
        content: Option<ContentId>,
        next_hop: Option<NodeId>,
    ) -> SimResult<()> {
        let prefix = self.config.prefix.clone();
        let fib = &mut self.nodes.get_mut(node).ok_or(SimError::UnknownNode(node))?.fib;

        match content {
            Some(content) => {
                let removed = fib.remove_scoped(&prefix, content, next_hop);
                self.churn_stats.scoped_route_removals += removed as u64;
                debug!("RMV_SIT {:.6} node {} content {} removed {}", time, node, content, removed);
                self.record(time, node, Some(content), RecordKind::RemoveScopedRoute);
            }
            None => {
                let removed = fib.remove_default(&prefix, next_hop);
                self.churn_stats.default_route_removals += removed as u64;
                debug!("RMV_FIB {:.6} node {} prefix {} removed {}", time, node, prefix, removed);
                self.record(time, node, None, RecordKind::RemoveDefaultRoute);
            }
        }
        Ok(())
    }

    fn on_link_change(&mut self, time: SimTime, link: LinkId, up: bool) -> SimResult<()> {
        let topology = &mut self.built.topology;
        let endpoint = topology.link(link).ok_or(SimError::UnknownLink(link))?.a;
        let transition = if up {
            topology.restore(link)?
        } else {
            topology.fail(link)?
        };

        let kind = if up { RecordKind::LinkRestore } else { RecordKind::LinkFail };
        match transition {
            LinkTransition::Changed => info!("{} {:.6} link {}", kind.label(), time, link),
            _ => debug!("{} {:.6} link {} unchanged ({:?})", kind.label(), time, link, transition),
        }
        self.record(time, endpoint, None, kind);
        Ok(())
    }

    fn on_phase(
        &mut self,
        scheduler: &mut EventScheduler<SimEvent>,
        time: SimTime,
        phase: Phase,
    ) -> SimResult<()> {
        info!("phase {:?} -> {:?} at {:.6}", self.phase, phase, time);
        self.phase = phase;
        self.record(time, self.built.producer, None, RecordKind::PhaseChange);

        if phase == Phase::Observation {
            let start = time + self.config.first_arrival_offset;
            let horizon = self.config.horizon();
            // the disconnect timer starts together with the connect timer;
            // FIFO puts the first connect ahead of it
            if start < horizon {
                scheduler.schedule(start, SimEvent::Connect)?;
                scheduler.schedule(start, SimEvent::Disconnect)?;
            }
        }
        Ok(())
    }

    fn retrieve(&mut self, time: SimTime, origin: NodeId, content: ContentId) -> SimResult<FloodReport> {
        let report = self.flood.flood(
            &mut self.nodes,
            &self.built.topology,
            &self.config.prefix,
            origin,
            content,
            self.config.hop_budget,
        )?;

        let kind = match &report.outcome {
            FloodOutcome::Satisfied { hops: 0, .. } => RecordKind::LocalHit,
            FloodOutcome::Satisfied { source, hops, .. } => RecordKind::Satisfied {
                hops: *hops,
                source: *source,
            },
            FloodOutcome::Exhausted => RecordKind::Exhausted,
        };
        self.record(time, origin, Some(content), kind);
        Ok(report)
    }

    /// Keep the retrieved content at the consumer and advertise it from the
    /// consumer's access router
    fn establish_session_route(&mut self, consumer: NodeId, content: ContentId) {
        if let Some(node) = self.nodes.get_mut(consumer) {
            if !node.store.contains(content) {
                node.store.put_marker(DataMarker {
                    content,
                    payload_size: self.config.payload_size,
                });
            }
        }
        if let Some(access) = self.built.topology.access_of(consumer) {
            if let Some(node) = self.nodes.get_mut(access) {
                node.fib.install_scoped(&self.config.prefix, content, consumer);
            }
        }
    }

    fn record(&mut self, time: SimTime, node: NodeId, content: Option<ContentId>, kind: RecordKind) {
        let record = EventRecord {
            time,
            node,
            content,
            kind,
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.log(&record);
        }
        if self.config.record_events {
            self.event_log.push(record);
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Runs one scenario from configuration to `SimulationResult`
pub struct SimulationDriver {
    scheduler: EventScheduler<SimEvent>,
    world: World,
    seed: u64,
    started: bool,
}

impl SimulationDriver {
    /// Validate `config`, build the nodes of `built` and install the default
    /// routes toward the producer. Nothing is scheduled yet.
    pub fn new(config: ScenarioConfig, built: BuiltTopology) -> SimResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let churn = ChurnProcess::with_rng(
            config.connection_rate,
            config.disconnection_rate,
            StdRng::seed_from_u64(rng.next_u64()),
        )?;
        let sampler = PopularitySampler::with_rng(
            config.num_contents,
            config.zipf_shift,
            config.zipf_exponent,
            StdRng::seed_from_u64(rng.next_u64()),
        )?;

        let topology = &built.topology;
        let mut nodes = Vec::with_capacity(topology.num_nodes());
        for (id, &role) in topology.roles().iter().enumerate() {
            nodes.push(SimNode::new(id, role, config.cache_size, config.num_contents as usize)?);
        }
        nodes
            .get_mut(built.producer)
            .ok_or(SimError::UnknownNode(built.producer))?
            .seed_store(config.num_contents, config.payload_size);

        let mut tables = vec![RoutingTable::new(); nodes.len()];
        install_global_routes(&mut tables, topology, &config.prefix, built.producer);
        for (node, table) in nodes.iter_mut().zip(tables) {
            node.fib = table;
        }

        info!("Params: {}", config.summary());
        info!(
            "nodes: {}, links: {}, consumers: {}, producer: {}, seed: {}",
            topology.num_nodes(),
            topology.num_links(),
            built.consumers.len(),
            built.producer,
            seed
        );
        let unreachable = consumers_beyond_budget(&built, config.hop_budget);
        if !unreachable.is_empty() {
            warn!(
                "hop budget {} cannot reach the producer from consumers {:?}",
                config.hop_budget, unreachable
            );
        }

        Ok(Self {
            scheduler: EventScheduler::new(),
            world: World {
                config,
                built,
                nodes,
                sessions: SessionTable::new(),
                churn,
                sampler,
                flood: FloodEngine::new(),
                rng,
                phase: Phase::Initialization,
                churn_stats: ChurnStats::default(),
                event_log: Vec::new(),
                sink: None,
            },
            seed,
            started: false,
        })
    }

    /// Stream every event record to `sink` as it is produced
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.world.sink = Some(sink);
        self
    }

    /// Schedule the scenario itself: the first arrival and the producer
    /// disconnect at the end of initialization. Does nothing if already done.
    pub fn start(&mut self) -> SimResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let config = &self.world.config;
        let boundary = config.initialization_period_length;
        if config.first_arrival_offset < boundary {
            self.scheduler.schedule(config.first_arrival_offset, SimEvent::Connect)?;
        }

        // same instant, FIFO: routes go before the link, both before observation
        self.scheduler
            .schedule(boundary, SimEvent::PhaseBoundary(Phase::ProducerDisconnect))?;
        for node in self.world.built.topology.infrastructure() {
            self.scheduler.schedule(
                boundary,
                SimEvent::RouteRemoval {
                    node,
                    content: None,
                    next_hop: None,
                },
            )?;
        }
        let link = self.world.built.producer_link().ok_or_else(|| SimError::InvalidTopology {
            reason: "producer has no access link".to_string(),
        })?;
        self.scheduler.schedule(boundary, SimEvent::LinkFail(link))?;
        self.scheduler
            .schedule(boundary, SimEvent::PhaseBoundary(Phase::Observation))?;
        Ok(())
    }

    /// Schedule an extra event at an absolute time
    pub fn schedule(&mut self, time: SimTime, event: SimEvent) -> SimResult<EventHandle> {
        self.scheduler.schedule(time, event)
    }

    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    /// Process events up to `stop_time`; a handler error aborts the run
    pub fn run_until(&mut self, stop_time: SimTime) -> SimResult<RunOutcome> {
        let world = &mut self.world;
        self.scheduler
            .run_until(stop_time, |scheduler, next| world.handle(scheduler, next.time, next.event))
    }

    /// Run the scenario to its horizon and stop the scheduler
    pub fn execute(&mut self) -> SimResult<RunOutcome> {
        self.start()?;
        let horizon = self.world.config.horizon();
        let outcome = self.run_until(horizon)?;

        self.scheduler.advance_to(horizon);
        self.scheduler.halt();
        info!(
            "phase {:?} -> {:?} at {:.6}, {} events processed",
            self.world.phase,
            Phase::Stopped,
            horizon,
            self.scheduler.processed()
        );
        self.world.phase = Phase::Stopped;
        Ok(outcome)
    }

    /// Run the whole scenario and collect its result
    pub fn run(mut self) -> SimResult<SimulationResult> {
        self.execute()?;
        Ok(self.into_result())
    }

    pub fn into_result(self) -> SimulationResult {
        let world = self.world;
        let node_stats: BTreeMap<NodeId, NodeStats> = world
            .nodes
            .iter()
            .map(|node| {
                (
                    node.id,
                    NodeStats {
                        role: node.role,
                        counters: node.store.counters(),
                        occupancy: node.store.len(),
                        capacity: node.store.capacity(),
                        fib_entries: node.fib.len(),
                    },
                )
            })
            .collect();

        let mut churn = world.churn_stats;
        churn.final_active = world.sessions.active();
        churn.final_disconnect_rate = world.churn.disconnect_rate();

        SimulationResult {
            config_summary: world.config.summary(),
            seed_used: self.seed,
            end_time: self.scheduler.now(),
            events_processed: self.scheduler.processed(),
            node_stats,
            flood: world.flood.stats().clone(),
            churn,
            event_log: world.event_log,
        }
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn phase(&self) -> Phase {
        self.world.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.world.nodes.get(id)
    }

    /// Consumers whose floods cannot reach the producer within the hop budget
    pub fn consumers_beyond_budget(&self) -> Vec<NodeId> {
        consumers_beyond_budget(&self.world.built, self.world.config.hop_budget)
    }

    pub fn topology(&self) -> &BuiltTopology {
        &self.world.built
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.world.sessions
    }

    pub fn churn(&self) -> &ChurnProcess {
        &self.world.churn
    }

    pub fn event_log(&self) -> &[EventRecord] {
        &self.world.event_log
    }
}

fn consumers_beyond_budget(built: &BuiltTopology, hop_budget: u32) -> Vec<NodeId> {
    let distance = hop_distances(&built.topology, built.producer);
    built
        .consumers
        .iter()
        .copied()
        .filter(|&c| distance.get(c).copied().flatten().map_or(true, |d| d > hop_budget))
        .collect()
}
