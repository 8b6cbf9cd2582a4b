// Copyright (C) 2025 The Sail Authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Optional bookkeeping of every open dataset/sink/cursor, so a long-running
//! connection can be swept for resources a caller forgot to close. Disabled
//! by default (`StoreConfig::track_resource_sites`); the teacher doesn't
//! track allocation sites anywhere, so this is new, built the way the
//! teacher tracks everything else stateful — an `Arc<Mutex<_>>` registry
//! behind a small handle type.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct OpenResource {
    kind: &'static str,
    label: String,
    opened_at: Instant,
}

pub struct LeakTracker {
    enabled: bool,
    next_id: AtomicU64,
    open: Mutex<HashMap<u64, OpenResource>>,
}

impl LeakTracker {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a newly opened resource, returning a handle to release
    /// later. Returns `None` when tracking is disabled — callers pass the
    /// `Option` straight to `release`, which is a no-op for `None`.
    pub fn track(&self, kind: &'static str, label: impl Into<String>) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.open.lock().unwrap().insert(
            id,
            OpenResource {
                kind,
                label: label.into(),
                opened_at: Instant::now(),
            },
        );
        Some(id)
    }

    pub fn release(&self, handle: Option<u64>) {
        if let Some(id) = handle {
            self.open.lock().unwrap().remove(&id);
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    /// Returns a description of every still-open resource older than
    /// `max_age` — meant to be logged by a periodic sweep
    /// (`StoreConfig::leak_collection_interval_ms`).
    pub fn sweep(&self, max_age: Duration) -> Vec<String> {
        let now = Instant::now();
        self.open
            .lock()
            .unwrap()
            .values()
            .filter(|r| now.duration_since(r.opened_at) > max_age)
            .map(|r| format!("{} opened {:?} ago at {}", r.kind, now.duration_since(r.opened_at), r.label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracker_never_retains_anything() {
        let tracker = LeakTracker::new(false);
        let handle = tracker.track("dataset", "test");
        assert!(handle.is_none());
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn release_removes_tracked_resource() {
        let tracker = LeakTracker::new(true);
        let handle = tracker.track("sink", "test");
        assert_eq!(tracker.open_count(), 1);
        tracker.release(handle);
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn sweep_reports_only_resources_older_than_threshold() {
        let tracker = LeakTracker::new(true);
        tracker.track("cursor", "fresh");
        assert!(tracker.sweep(Duration::from_secs(3600)).is_empty());
        assert_eq!(tracker.sweep(Duration::from_secs(0)).len(), 1);
    }
}
