//! Directed-edge traffic caches shared across root evaluations

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use crate::traffic::{CityPath, Traffic};

/// Storage for resolved directed-edge aggregates.
///
/// Entries live for a whole batch. Each path should be written exactly once;
/// a second write means the same edge was materialised twice and is counted
/// as an overwrite.
pub trait TrafficCache {
    /// Cached traffic for `path`, if it was resolved earlier in this batch
    fn get(&self, path: &CityPath) -> Option<Traffic>;

    /// Record the traffic for `path`
    fn put(&self, path: CityPath, traffic: Traffic);

    /// Forget every entry (only when starting over on a different graph)
    fn clear(&mut self);

    /// Number of cached paths
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of writes that hit an already cached path
    fn overwrites(&self) -> usize;
}

/// Single-threaded cache backed by a HashMap
#[derive(Debug, Default)]
pub struct PathTrafficCache {
    entries: RefCell<HashMap<CityPath, Traffic>>,
    overwrites: Cell<usize>,
}

impl PathTrafficCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrafficCache for PathTrafficCache {
    fn get(&self, path: &CityPath) -> Option<Traffic> {
        self.entries.borrow().get(path).copied()
    }

    fn put(&self, path: CityPath, traffic: Traffic) {
        if let Some(previous) = self.entries.borrow_mut().insert(path, traffic) {
            log::warn!(
                "Path {:?} resolved twice (previous {}, now {})",
                path, previous, traffic
            );
            self.overwrites.set(self.overwrites.get() + 1);
        }
    }

    fn clear(&mut self) {
        self.entries.get_mut().clear();
        self.overwrites.set(0);
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn overwrites(&self) -> usize {
        self.overwrites.get()
    }
}

/// Concurrent cache for evaluating roots in parallel.
///
/// Two roots may race to resolve the same path. The first write wins and later
/// writes leave the stored value untouched; they are still counted as overwrites.
#[derive(Debug, Default)]
pub struct SharedPathTrafficCache {
    entries: DashMap<CityPath, Traffic>,
    overwrites: AtomicUsize,
}

impl SharedPathTrafficCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrafficCache for SharedPathTrafficCache {
    fn get(&self, path: &CityPath) -> Option<Traffic> {
        self.entries.get(path).map(|entry| *entry.value())
    }

    fn put(&self, path: CityPath, traffic: Traffic) {
        match self.entries.entry(path) {
            Entry::Occupied(entry) => {
                let kept = *entry.get();
                if kept != traffic {
                    log::warn!(
                        "Path {:?} resolved to different values (kept {}, dropped {})",
                        path, kept, traffic
                    );
                }
                self.overwrites.fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(entry) => {
                entry.insert(traffic);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        *self.overwrites.get_mut() = 0;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn overwrites(&self) -> usize {
        self.overwrites.load(Ordering::Relaxed)
    }
}
