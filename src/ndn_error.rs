// Error taxonomy for the simulator
//
// Only configuration faults and internal faults are errors. Route misses, cache
// misses, flood exhaustion and repeated link toggles are ordinary outcomes and
// are returned as values by the components that produce them.

use crate::ndn_interface::{LinkId, NodeId, SimTime};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Event scheduled before the current clock or at a non-finite instant
    #[error("cannot schedule at t={time} (clock is at t={now})")]
    InvalidTime { time: SimTime, now: SimTime },

    /// Distribution or sampler parameter outside its domain
    #[error("invalid {parameter}: {value}")]
    InvalidDomain { parameter: &'static str, value: f64 },

    #[error("cache capacity must be positive, got {capacity}")]
    CapacityViolation { capacity: usize },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    #[error("scheduler stopped, event at t={time} rejected")]
    SchedulerStopped { time: SimTime },

    #[error("invalid topology: {reason}")]
    InvalidTopology { reason: String },
}

pub type SimResult<T> = Result<T, SimError>;

/// Check that a distribution parameter is finite and strictly positive
pub fn require_positive(parameter: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidDomain { parameter, value })
    }
}
