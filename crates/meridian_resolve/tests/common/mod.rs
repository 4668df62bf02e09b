//! Shared helpers for `meridian_resolve` integration tests.
//!
//! Import via `mod common;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not every item is used by every test binary"
)]

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meridian_resolve::instance::{Dispose, Instance};
use parking_lot::Mutex;

// ═══════════════════════════════════════════════════════════════════════════════
// COUNTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// A shared counter handed to factories and disposables.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPOSABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Records every disposal into a shared log and bumps a counter.
#[derive(Debug)]
pub struct Tracked {
    pub name: &'static str,
    log: DisposalLog,
}

impl Tracked {
    pub fn new(name: &'static str, log: &DisposalLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }

    /// Builds a disposable instance logging to `log`.
    pub fn instance(name: &'static str, log: &DisposalLog) -> Instance {
        Instance::disposable(Self::new(name, log))
    }
}

impl Dispose for Tracked {
    fn dispose(&self) {
        self.log.record(self.name);
    }
}

/// Ordered record of disposals.
#[derive(Debug, Clone, Default)]
pub struct DisposalLog(Arc<Mutex<Vec<&'static str>>>);

impl DisposalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &'static str) {
        self.0.lock().push(name);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().iter().filter(|entry| **entry == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}
