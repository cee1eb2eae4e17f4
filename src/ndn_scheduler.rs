// Discrete event scheduler
//
// Single logical clock, single-threaded. Events are ordered by fire time and,
// for equal fire times, by insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashSet;

use crate::ndn_error::{SimError, SimResult};
use crate::ndn_interface::SimTime;

/// Handle returned by `schedule`, used to make a pending event inert
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

impl EventHandle {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// A scheduled event with its fire time and insertion sequence
#[derive(Debug, Clone)]
pub struct ScheduledEvent<E> {
    pub time: SimTime,
    pub seq: u64,
    pub event: E,
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.seq == other.seq
    }
}

impl<E> Eq for ScheduledEvent<E> {}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, earliest (time, seq) must pop first
        match other.time.total_cmp(&self.time) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

/// Why `run_until` returned
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// No events left in the queue
    Drained,
    /// Next pending event lies beyond the stop time
    ReachedStopTime,
    /// `halt` was called, from a handler or before the run
    Halted,
}

/// Time-ordered event queue with FIFO tie-break
///
/// Handlers run to completion one at a time. A handler error stops the run
/// immediately and is returned to the caller; the queue is left as it was
/// after the failing event was extracted.
pub struct EventScheduler<E> {
    now: SimTime,
    queue: BinaryHeap<ScheduledEvent<E>>,
    next_seq: u64,
    cancelled: HashSet<u64>,
    stopped: bool,
    processed: u64,
}

impl<E> EventScheduler<E> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            queue: BinaryHeap::new(),
            next_seq: 0,
            cancelled: HashSet::new(),
            stopped: false,
            processed: 0,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events executed so far (inert events are not counted)
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of events still queued, including inert ones
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Insert an event at an absolute time
    ///
    /// Scheduling at the current instant is allowed and runs after every event
    /// already queued for that instant.
    pub fn schedule(&mut self, time: SimTime, event: E) -> SimResult<EventHandle> {
        if self.stopped {
            return Err(SimError::SchedulerStopped { time });
        }
        if !time.is_finite() || time < 0.0 || time < self.now {
            return Err(SimError::InvalidTime { time, now: self.now });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledEvent { time, seq, event });
        Ok(EventHandle(seq))
    }

    /// Insert an event `delay` seconds after the current time
    pub fn schedule_in(&mut self, delay: SimTime, event: E) -> SimResult<EventHandle> {
        self.schedule(self.now + delay, event)
    }

    /// Mark a pending event inert; it is discarded when it reaches the head
    /// of the queue. Returns false if the handle was already cancelled.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.cancelled.insert(handle.0)
    }

    /// Extract the earliest live event with time <= `stop_time`, advancing the clock
    pub fn pop_due(&mut self, stop_time: SimTime) -> Option<ScheduledEvent<E>> {
        while let Some(head) = self.queue.peek() {
            if self.stopped || head.time > stop_time {
                return None;
            }
            let next = self.queue.pop()?;
            if self.cancelled.remove(&next.seq) {
                continue;
            }
            self.now = next.time;
            self.processed += 1;
            return Some(next);
        }
        None
    }

    /// Execute events in (time, insertion) order until none remain with
    /// time <= `stop_time`
    pub fn run_until<F>(&mut self, stop_time: SimTime, mut handler: F) -> SimResult<RunOutcome>
    where
        F: FnMut(&mut Self, ScheduledEvent<E>) -> SimResult<()>,
    {
        while let Some(next) = self.pop_due(stop_time) {
            handler(self, next)?;
        }

        if self.stopped {
            Ok(RunOutcome::Halted)
        } else if self.queue.is_empty() {
            Ok(RunOutcome::Drained)
        } else {
            Ok(RunOutcome::ReachedStopTime)
        }
    }

    /// Stop the scheduler: unfired events are dropped and no further events
    /// are admitted
    pub fn halt(&mut self) {
        self.stopped = true;
        self.queue.clear();
        self.cancelled.clear();
    }

    /// Move the clock forward to `time` without executing anything
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }
}

impl<E> Default for EventScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_ordering() {
        let mut sched = EventScheduler::new();
        sched.schedule(3.0, "c").unwrap();
        sched.schedule(1.0, "a").unwrap();
        sched.schedule(2.0, "b").unwrap();

        let mut seen = Vec::new();
        let outcome = sched
            .run_until(10.0, |_, ev| {
                seen.push(ev.event);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(outcome, RunOutcome::Drained);
        assert_eq!(sched.now(), 3.0);
        assert_eq!(sched.processed(), 3);
    }

    #[test]
    fn test_same_time_is_fifo() {
        let mut sched = EventScheduler::new();
        for i in 0..20 {
            sched.schedule(5.0, i).unwrap();
        }

        let mut seen = Vec::new();
        sched
            .run_until(5.0, |_, ev| {
                seen.push(ev.event);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_handler_scheduled_event_at_same_instant_runs_after_queued_ones() {
        let mut sched = EventScheduler::new();
        sched.schedule(1.0, "first").unwrap();
        sched.schedule(1.0, "second").unwrap();

        let mut seen = Vec::new();
        sched
            .run_until(2.0, |s, ev| {
                if ev.event == "first" {
                    s.schedule(1.0, "spawned").unwrap();
                }
                seen.push(ev.event);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec!["first", "second", "spawned"]);
    }

    #[test]
    fn test_stop_time_leaves_later_events() {
        let mut sched = EventScheduler::new();
        sched.schedule(1.0, 1).unwrap();
        sched.schedule(2.0, 2).unwrap();
        sched.schedule(2.5, 3).unwrap();

        let mut seen = Vec::new();
        let outcome = sched
            .run_until(2.0, |_, ev| {
                seen.push(ev.event);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(outcome, RunOutcome::ReachedStopTime);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_invalid_times_rejected() {
        let mut sched: EventScheduler<u8> = EventScheduler::new();
        assert!(matches!(
            sched.schedule(-1.0, 0),
            Err(SimError::InvalidTime { .. })
        ));
        assert!(sched.schedule(f64::NAN, 0).is_err());

        sched.schedule(4.0, 0).unwrap();
        sched.run_until(4.0, |_, _| Ok(())).unwrap();
        assert!(matches!(
            sched.schedule(3.0, 0),
            Err(SimError::InvalidTime { time, now }) if time == 3.0 && now == 4.0
        ));
        assert!(sched.schedule(4.0, 0).is_ok());
    }

    #[test]
    fn test_cancelled_event_is_inert() {
        let mut sched = EventScheduler::new();
        sched.schedule(1.0, "keep").unwrap();
        let handle = sched.schedule(2.0, "drop").unwrap();
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));

        let mut seen = Vec::new();
        sched
            .run_until(5.0, |_, ev| {
                seen.push(ev.event);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen, vec!["keep"]);
        assert_eq!(sched.processed(), 1);
    }

    #[test]
    fn test_handler_error_is_fatal() {
        let mut sched = EventScheduler::new();
        sched.schedule(1.0, 1).unwrap();
        sched.schedule(2.0, 2).unwrap();
        sched.schedule(3.0, 3).unwrap();

        let mut seen = Vec::new();
        let result = sched.run_until(10.0, |_, ev| {
            seen.push(ev.event);
            if ev.event == 2 {
                return Err(SimError::UnknownNode(99));
            }
            Ok(())
        });

        assert_eq!(result, Err(SimError::UnknownNode(99)));
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_halt_drops_pending_and_rejects_new_events() {
        let mut sched = EventScheduler::new();
        sched.schedule(1.0, 1).unwrap();
        sched.schedule(2.0, 2).unwrap();

        let mut seen = Vec::new();
        let outcome = sched
            .run_until(10.0, |s, ev| {
                seen.push(ev.event);
                s.halt();
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome, RunOutcome::Halted);
        assert_eq!(seen, vec![1]);
        assert_eq!(sched.pending(), 0);
        assert!(matches!(
            sched.schedule(5.0, 3),
            Err(SimError::SchedulerStopped { .. })
        ));
    }
}
