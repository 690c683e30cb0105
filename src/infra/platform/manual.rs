//! Manually driven platform for tests, demos, and headless hosts.
//!
//! Entries, intersection changes, heap snapshots, and idle periods are
//! injected by the caller instead of coming from a browser.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::core::{
    Capabilities, ElementHandle, EngineError, EntryCallback, HeapSnapshot, IdleJob, IdlePlatform,
    IntersectionCallback, IntersectionEntry, IntersectionPlatform, ObservationKind,
    PerformanceEntry, PerformancePlatform, Subscription, VisibilityOptions,
};

#[derive(Default)]
struct PlatformState {
    next_id: u64,
    entry_subs: HashMap<u64, (ObservationKind, EntryCallback)>,
    regions: HashMap<u64, (ElementHandle, IntersectionCallback)>,
    heap: Option<HeapSnapshot>,
    idle_jobs: VecDeque<IdleJob>,
    failing: HashSet<ObservationKind>,
    disconnects: usize,
}

impl PlatformState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A platform whose events are pushed by the caller.
pub struct ManualPlatform {
    capabilities: Capabilities,
    intersection: bool,
    state: Arc<Mutex<PlatformState>>,
}

impl ManualPlatform {
    /// Platform reporting `capabilities` and supporting intersection observation.
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            intersection: true,
            state: Arc::new(Mutex::new(PlatformState::default())),
        }
    }

    /// Platform reporting every capability.
    pub fn full() -> Self {
        Self::new(Capabilities::all())
    }

    /// Make subscriptions to `kind` fail even though the probe reports it.
    #[must_use]
    pub fn with_failing(self, kind: ObservationKind) -> Self {
        self.state.lock().failing.insert(kind);
        self
    }

    /// Remove intersection observation support.
    #[must_use]
    pub fn without_intersection(mut self) -> Self {
        self.intersection = false;
        self
    }

    /// Deliver `entry` to every subscriber of its kind. Returns how many received it.
    pub fn emit(&self, entry: PerformanceEntry) -> usize {
        let kind = entry.kind();
        let callbacks: Vec<EntryCallback> = self
            .state
            .lock()
            .entry_subs
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in &callbacks {
            cb(entry.clone());
        }
        callbacks.len()
    }

    /// Report an intersection change for every observer of `element`.
    pub fn set_intersection(&self, element: &ElementHandle, entry: IntersectionEntry) -> usize {
        let callbacks: Vec<IntersectionCallback> = self
            .state
            .lock()
            .regions
            .values()
            .filter(|(e, _)| e == element)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in &callbacks {
            cb(entry);
        }
        callbacks.len()
    }

    /// Shorthand for a fully visible or fully hidden region.
    pub fn set_visible(&self, element: &ElementHandle, visible: bool) -> usize {
        self.set_intersection(
            element,
            IntersectionEntry {
                is_intersecting: visible,
                intersection_ratio: if visible { 1.0 } else { 0.0 },
            },
        )
    }

    /// Set the heap snapshot returned to the sampler.
    pub fn set_heap(&self, snapshot: HeapSnapshot) {
        self.state.lock().heap = Some(snapshot);
    }

    /// Run every queued idle job. Jobs queued while running wait for the next call.
    pub fn run_idle(&self) -> usize {
        let jobs: Vec<IdleJob> = self.state.lock().idle_jobs.drain(..).collect();
        let count = jobs.len();
        for job in jobs {
            job();
        }
        count
    }

    /// Number of queued idle jobs.
    pub fn pending_idle(&self) -> usize {
        self.state.lock().idle_jobs.len()
    }

    /// Live entry subscriptions.
    pub fn entry_subscriptions(&self) -> usize {
        self.state.lock().entry_subs.len()
    }

    /// Live intersection observers.
    pub fn observed_regions(&self) -> usize {
        self.state.lock().regions.len()
    }

    /// Total subscriptions and observers disconnected so far.
    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }
}

impl PerformancePlatform for ManualPlatform {
    fn probe(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn subscribe(
        &self,
        kind: ObservationKind,
        callback: EntryCallback,
    ) -> Result<Box<dyn Subscription>, EngineError> {
        if !self.capabilities.contains(kind) {
            return Err(EngineError::UnsupportedCapability(kind));
        }
        let mut state = self.state.lock();
        if state.failing.contains(&kind) {
            return Err(EngineError::Subscription(format!("{kind:?} observer rejected entry type")));
        }
        let id = state.next_id();
        state.entry_subs.insert(id, (kind, callback));
        Ok(Box::new(ManualSubscription {
            id,
            target: Target::Entry,
            state: Arc::downgrade(&self.state),
            connected: true,
        }))
    }

    fn heap_snapshot(&self) -> Option<HeapSnapshot> {
        if !self.capabilities.contains(ObservationKind::Memory) {
            return None;
        }
        self.state.lock().heap
    }
}

impl IntersectionPlatform for ManualPlatform {
    fn observe(
        &self,
        element: &ElementHandle,
        _options: &VisibilityOptions,
        callback: IntersectionCallback,
    ) -> Result<Box<dyn Subscription>, EngineError> {
        if !self.intersection {
            return Err(EngineError::Subscription("intersection observation unavailable".into()));
        }
        let mut state = self.state.lock();
        let id = state.next_id();
        state.regions.insert(id, (element.clone(), callback));
        Ok(Box::new(ManualSubscription {
            id,
            target: Target::Region,
            state: Arc::downgrade(&self.state),
            connected: true,
        }))
    }
}

impl IdlePlatform for ManualPlatform {
    fn request_idle(&self, job: IdleJob) {
        self.state.lock().idle_jobs.push_back(job);
    }
}

enum Target {
    Entry,
    Region,
}

struct ManualSubscription {
    id: u64,
    target: Target,
    state: Weak<Mutex<PlatformState>>,
    connected: bool,
}

impl Subscription for ManualSubscription {
    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        let removed = match self.target {
            Target::Entry => state.entry_subs.remove(&self.id).is_some(),
            Target::Region => state.regions.remove(&self.id).is_some(),
        };
        if removed {
            state.disconnects += 1;
        }
    }
}

impl Drop for ManualSubscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}
