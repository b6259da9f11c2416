//! Eviction Queue Module
//!
//! Orders cached entries for size-based eviction. Order is by write
//! timestamp only; reads are not tracked, so an entry that is read often but
//! never rewritten is evicted as eagerly as one nobody reads.

use std::collections::VecDeque;

// == Eviction Candidate ==
/// A logical entry considered for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    /// Logical key, without the namespace prefix
    pub key: String,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Estimated bytes held by the entry, chunk records included
    pub size: usize,
}

// == Eviction Queue ==
/// Candidates ordered oldest first.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest write
/// - Back = Newest write
#[derive(Debug, Default)]
pub struct EvictionQueue {
    order: VecDeque<EvictionCandidate>,
}

impl EvictionQueue {
    // == Constructor ==
    /// Builds a queue from unordered candidates.
    ///
    /// Equal timestamps fall back to key order so eviction is deterministic.
    pub fn new(mut candidates: Vec<EvictionCandidate>) -> Self {
        candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.key.cmp(&b.key)));
        Self {
            order: candidates.into(),
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest candidate.
    ///
    /// Returns None if the queue is empty.
    pub fn evict_oldest(&mut self) -> Option<EvictionCandidate> {
        self.order.pop_front()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, timestamp: u64) -> EvictionCandidate {
        EvictionCandidate {
            key: key.to_string(),
            timestamp,
            size: 10,
        }
    }

    #[test]
    fn test_queue_empty() {
        let mut queue = EvictionQueue::new(Vec::new());
        assert_eq!(queue.evict_oldest(), None);
    }

    #[test]
    fn test_evicts_by_timestamp() {
        let mut queue = EvictionQueue::new(vec![
            candidate("c", 30),
            candidate("a", 10),
            candidate("b", 20),
        ]);

        assert_eq!(queue.evict_oldest().map(|c| c.key), Some("a".to_string()));
        assert_eq!(queue.evict_oldest().map(|c| c.key), Some("b".to_string()));
        assert_eq!(queue.evict_oldest().map(|c| c.key), Some("c".to_string()));
        assert_eq!(queue.evict_oldest(), None);
    }

    #[test]
    fn test_ties_break_on_key() {
        let mut queue = EvictionQueue::new(vec![candidate("y", 5), candidate("x", 5)]);
        assert_eq!(queue.evict_oldest().map(|c| c.key), Some("x".to_string()));
    }
}
