//! Optional instrumentation for build, fit and query passes.
//!
//! A [`ProfileHook`] is handed to the hierarchy by its owner; nothing here is
//! global. [`ScopeTimings`] is a ready-made hook that accumulates wall time
//! per scope.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Receives begin/end notifications around instrumented passes
pub trait ProfileHook: Send + Sync {
    fn begin_scope(&self, name: &'static str);
    fn end_scope(&self, name: &'static str);
}

/// Scope names reported by the hierarchy
pub mod scopes {
    pub const BUILD: &str = "bvh.build";
    pub const FIT: &str = "bvh.fit";
    pub const INSERT: &str = "bvh.insert";
    pub const RESTRUCTURE: &str = "bvh.restructure";
    pub const QUERY_FRUSTUM: &str = "bvh.query.frustum";
    pub const QUERY_RAY: &str = "bvh.query.ray";
    pub const QUERY_VOLUME: &str = "bvh.query.volume";
}

/// Ends its scope when dropped
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ProfileScope {
    hook: Option<Arc<dyn ProfileHook>>,
    name: &'static str,
}

impl ProfileScope {
    pub fn new(hook: Option<&Arc<dyn ProfileHook>>, name: &'static str) -> Self {
        let hook = hook.cloned();
        if let Some(hook) = &hook {
            hook.begin_scope(name);
        }
        Self { hook, name }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if let Some(hook) = &self.hook {
            hook.end_scope(self.name);
        }
    }
}

/// Accumulated timing for one scope name
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScopeTiming {
    pub calls: u64,
    pub total: Duration,
}

#[derive(Default)]
struct TimingState {
    open: Vec<(&'static str, Instant)>,
    totals: HashMap<&'static str, ScopeTiming>,
}

/// Hook that records call counts and wall time per scope
#[derive(Default)]
pub struct ScopeTimings {
    state: Mutex<TimingState>,
}

impl ScopeTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ScopeTiming> {
        self.state.lock().totals.get(name).copied()
    }

    /// Snapshot of every scope seen so far, sorted by name
    pub fn snapshot(&self) -> Vec<(&'static str, ScopeTiming)> {
        let state = self.state.lock();
        let mut all: Vec<_> = state.totals.iter().map(|(k, v)| (*k, *v)).collect();
        all.sort_by_key(|(name, _)| *name);
        all
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.open.clear();
        state.totals.clear();
    }
}

impl ProfileHook for ScopeTimings {
    fn begin_scope(&self, name: &'static str) {
        self.state.lock().open.push((name, Instant::now()));
    }

    fn end_scope(&self, name: &'static str) {
        let mut state = self.state.lock();
        // Scopes nest, so the matching begin is the innermost open one.
        let Some(pos) = state.open.iter().rposition(|(open, _)| *open == name) else {
            log::warn!("profile scope '{}' ended without a begin", name);
            return;
        };
        let (_, started) = state.open.remove(pos);
        let timing = state.totals.entry(name).or_default();
        timing.calls += 1;
        timing.total += started.elapsed();
    }
}
