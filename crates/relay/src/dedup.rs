//! Duplicate filter: at-most-once reaction per gateway event id.
//!
//! Ids are remembered for a fixed TTL and the set is capped; once full, the
//! oldest id is forgotten first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct DuplicateFilter {
    state: Mutex<SeenSet>,
    capacity: usize,
    ttl: Duration,
}

#[derive(Default)]
struct SeenSet {
    ids: HashMap<String, Instant>,
    /// Insertion order; timestamps are non-decreasing front to back.
    order: VecDeque<(String, Instant)>,
}

impl DuplicateFilter {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(SeenSet::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// First call for an id returns `false` and marks it; later calls return
    /// `true` until the id expires or is evicted.
    pub fn seen(&self, event_id: &str) -> bool {
        self.seen_at(event_id, Instant::now())
    }

    fn seen_at(&self, event_id: &str, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some((_, at)) = state.order.front() {
            if now.saturating_duration_since(*at) < self.ttl {
                break;
            }
            if let Some((id, _)) = state.order.pop_front() {
                state.ids.remove(&id);
            }
        }

        if state.ids.contains_key(event_id) {
            debug!(event_id, "Duplicate event");
            return true;
        }

        state.ids.insert(event_id.to_string(), now);
        state.order.push_back((event_id.to_string(), now));
        while state.order.len() > self.capacity {
            if let Some((id, _)) = state.order.pop_front() {
                state.ids.remove(&id);
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
