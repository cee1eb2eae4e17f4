// Active session bookkeeping
//
// Reference count of open sessions per (consumer, content). Consumers without
// any open session are dropped from the table so random selection only ever
// lands on a consumer that can disconnect.

use indexmap::IndexMap;
use rand::Rng;

use crate::ndn_interface::{ContentId, NodeId};

/// Result of closing one session
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Closed {
    pub consumer: NodeId,
    pub content: ContentId,
    /// Sessions left for this (consumer, content)
    pub remaining: u32,
}

impl Closed {
    pub fn was_last(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    sessions: IndexMap<NodeId, IndexMap<ContentId, u32>>,
    active: u64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; returns the new count for (consumer, content)
    pub fn open(&mut self, consumer: NodeId, content: ContentId) -> u32 {
        let count = self
            .sessions
            .entry(consumer)
            .or_default()
            .entry(content)
            .or_insert(0);
        *count += 1;
        self.active += 1;
        *count
    }

    /// Close one session of (consumer, content), if any is open
    pub fn close(&mut self, consumer: NodeId, content: ContentId) -> Option<Closed> {
        let by_content = self.sessions.get_mut(&consumer)?;
        let count = by_content.get_mut(&content)?;
        *count -= 1;
        let remaining = *count;

        if remaining == 0 {
            by_content.swap_remove(&content);
        }
        if by_content.is_empty() {
            self.sessions.swap_remove(&consumer);
        }
        self.active -= 1;

        Some(Closed {
            consumer,
            content,
            remaining,
        })
    }

    /// Close one session picked at random: a random consumer with open
    /// sessions, then a random content of that consumer
    pub fn close_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Closed> {
        if self.sessions.is_empty() {
            return None;
        }
        let consumer_index = rng.gen_range(0..self.sessions.len());
        let (&consumer, by_content) = self.sessions.get_index(consumer_index)?;
        let content_index = rng.gen_range(0..by_content.len());
        let (&content, _) = by_content.get_index(content_index)?;
        self.close(consumer, content)
    }

    pub fn count(&self, consumer: NodeId, content: ContentId) -> u32 {
        self.sessions
            .get(&consumer)
            .and_then(|m| m.get(&content))
            .copied()
            .unwrap_or(0)
    }

    /// Total open sessions over all consumers and contents
    pub fn active(&self) -> u64 {
        self.active
    }

    pub fn consumers_with_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }
}
