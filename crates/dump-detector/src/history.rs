//! Bounded snapshot history.
//!
//! Retains just enough snapshots to answer "what was the price of X
//! about `w` ago?" for the longest configured window `w`. Appends evict
//! from the front once capacity is reached.
//!
//! Window lookup is measured back from the latest snapshot: a window of
//! `k` sampling intervals selects the snapshot `k` positions before the
//! latest. When fewer snapshots exist, the oldest one is used
//! (clamp-to-oldest), which trades precision for availability during
//! warm-up.

use crate::error::{DetectorError, DetectorResult};
use crate::rule::Rule;
use crate::snapshot::PriceSnapshot;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Number of sampling intervals covering `window`: `ceil(window / interval)`.
///
/// A zero interval is treated as one millisecond so the division is defined.
pub fn lookback_steps(window: Duration, sampling_interval: Duration) -> usize {
    let interval_ms = sampling_interval.as_millis().max(1);
    let window_ms = window.as_millis();
    window_ms.div_ceil(interval_ms) as usize
}

/// FIFO history of price snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: VecDeque<Arc<PriceSnapshot>>,
    capacity: usize,
}

impl SnapshotHistory {
    /// Create an empty history holding at most `capacity` snapshots.
    ///
    /// Capacity is at least 2 so a baseline distinct from the latest
    /// snapshot can exist.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Size the history for the longest rule window.
    ///
    /// Holds `ceil(max_window / interval)` prior snapshots plus the
    /// latest one, so the longest window has an exact baseline once warm.
    pub fn for_rules(rules: &[Rule], sampling_interval: Duration) -> Self {
        let max_steps = rules
            .iter()
            .map(|r| lookback_steps(r.time_window(), sampling_interval))
            .max()
            .unwrap_or(0);
        Self::with_capacity(max_steps + 1)
    }

    /// Append a snapshot, evicting the oldest when full.
    ///
    /// Returns the evicted snapshot, if any. Rejects a snapshot that is
    /// not strictly newer than the latest one and leaves the history
    /// unchanged.
    pub fn append(&mut self, snapshot: PriceSnapshot) -> DetectorResult<Option<Arc<PriceSnapshot>>> {
        if let Some(latest) = self.entries.back() {
            if snapshot.captured_at() <= latest.captured_at() {
                return Err(DetectorError::OutOfOrderSnapshot {
                    captured_at: snapshot.captured_at().to_rfc3339(),
                    latest: latest.captured_at().to_rfc3339(),
                });
            }
        }

        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(Arc::new(snapshot));
        Ok(evicted)
    }

    /// Most recent snapshot, `None` before the first tick.
    pub fn latest(&self) -> Option<&Arc<PriceSnapshot>> {
        self.entries.back()
    }

    /// Index of the baseline snapshot for `window`, `None` when empty.
    ///
    /// With `prior = len - 1` snapshots before the latest,
    /// `index = max(0, prior - steps)`, always within `[0, len - 1]`.
    pub fn window_index(&self, window: Duration, sampling_interval: Duration) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let prior = self.entries.len() - 1;
        let steps = lookback_steps(window, sampling_interval);
        let index = prior.saturating_sub(steps);
        Some(index.min(self.entries.len() - 1))
    }

    /// Baseline snapshot for `window`, clamped to the oldest retained one.
    ///
    /// With a single snapshot this is the latest snapshot itself; callers
    /// treat that as "no baseline yet".
    pub fn snapshot_for_window(
        &self,
        window: Duration,
        sampling_interval: Duration,
    ) -> Option<&Arc<PriceSnapshot>> {
        self.window_index(window, sampling_interval)
            .and_then(|i| self.entries.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PriceSnapshot>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// History shared between the single tick writer and any number of
/// readers (dashboards, notification path).
///
/// Append and eviction happen under one write lock, so a reader sees
/// either the state before or after a tick's append, never in between.
/// Reads hand out `Arc` clones and never hold the lock past the call.
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<RwLock<SnapshotHistory>>,
}

impl SharedHistory {
    pub fn new(history: SnapshotHistory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(history)),
        }
    }

    pub fn append(&self, snapshot: PriceSnapshot) -> DetectorResult<Option<Arc<PriceSnapshot>>> {
        self.inner.write().append(snapshot)
    }

    pub fn latest(&self) -> Option<Arc<PriceSnapshot>> {
        self.inner.read().latest().cloned()
    }

    pub fn snapshot_for_window(
        &self,
        window: Duration,
        sampling_interval: Duration,
    ) -> Option<Arc<PriceSnapshot>> {
        self.inner
            .read()
            .snapshot_for_window(window, sampling_interval)
            .cloned()
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshots(&self) -> Vec<Arc<PriceSnapshot>> {
        self.inner.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Run `f` against a consistent view of the history.
    pub fn with_read<R>(&self, f: impl FnOnce(&SnapshotHistory) -> R) -> R {
        f(&self.inner.read())
    }
}
