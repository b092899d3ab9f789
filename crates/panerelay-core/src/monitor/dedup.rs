//! Sent-response memory
//!
//! Remembers the normalised form of every reply already delivered so a reply
//! that is still on screen after a resync, or that scrolls without changing,
//! is never sent twice. Oldest entries are evicted past `capacity`.

use std::collections::{HashSet, VecDeque};

use crate::semantic::normalize_for_comparison;

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct SentResponses {
    keys: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for SentResponses {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SentResponses {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `text`; returns `true` if it had not been seen before
    pub fn insert(&mut self, text: &str) -> bool {
        let key = normalize_for_comparison(text);
        if !self.keys.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.keys.remove(&evicted);
            }
        }
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.keys.contains(&normalize_for_comparison(text))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.order.clear();
    }
}
