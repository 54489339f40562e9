//! Bounded history helpers

use super::types::MetricsRecord;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Helper trait for bounded VecDeque operations
pub(super) trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T, max_size: usize);
}

impl<T> BoundedPush<T> for VecDeque<T> {
    /// Push a value while maintaining a maximum size (O(1) amortized)
    #[inline]
    fn push_bounded(&mut self, value: T, max_size: usize) {
        if max_size == 0 {
            return;
        }
        while self.len() >= max_size {
            self.pop_front();
        }
        self.push_back(value);
    }
}

/// Drop records older than `cutoff` from the front; returns how many went
pub(super) fn prune_before(history: &mut VecDeque<MetricsRecord>, cutoff: DateTime<Utc>) -> usize {
    let mut pruned = 0;
    while history.front().is_some_and(|r| r.recorded_at < cutoff) {
        history.pop_front();
        pruned += 1;
    }
    pruned
}
