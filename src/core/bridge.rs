//! Observation bridge: platform timing entries to metric records.
//!
//! The bridge probes platform capabilities once at construction, subscribes
//! to every supported entry kind, and starts the periodic heap sampler.
//! Missing or failing primitives are reported as
//! [`Diagnostic::Unsupported`] and skipped. Every subscription and the heap
//! sampler are torn down by [`ObservationBridge::shutdown`], which also runs
//! on drop.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::diagnostics::Diagnostic;
use crate::core::sink::MetricSink;
use crate::core::spawn::Spawn;
use crate::core::EngineError;
use crate::util::clock::bytes_to_mb;
use crate::util::serde::{names, MetricCategory};

/// A platform observation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// Navigation timing.
    Navigation,
    /// Paint timing.
    Paint,
    /// Largest contentful paint entries.
    LargestContentfulPaint,
    /// Layout instability entries.
    LayoutShift,
    /// First input entries.
    FirstInput,
    /// Resource timing.
    Resource,
    /// Heap introspection.
    Memory,
}

impl ObservationKind {
    /// Kinds delivered through subscriptions (everything except heap probing).
    pub const ENTRY_KINDS: [Self; 6] = [
        Self::Navigation,
        Self::Paint,
        Self::LargestContentfulPaint,
        Self::LayoutShift,
        Self::FirstInput,
        Self::Resource,
    ];
}

/// Set of observation kinds a platform supports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<ObservationKind>);

impl Capabilities {
    /// No capabilities.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every observation kind.
    pub fn all() -> Self {
        let mut set: BTreeSet<_> = ObservationKind::ENTRY_KINDS.into_iter().collect();
        set.insert(ObservationKind::Memory);
        Self(set)
    }

    /// Add a kind.
    #[must_use]
    pub fn with(mut self, kind: ObservationKind) -> Self {
        self.0.insert(kind);
        self
    }

    /// Remove a kind.
    #[must_use]
    pub fn without(mut self, kind: ObservationKind) -> Self {
        self.0.remove(&kind);
        self
    }

    /// Whether `kind` is supported.
    pub fn contains(&self, kind: ObservationKind) -> bool {
        self.0.contains(&kind)
    }
}

/// Navigation timing, relative to navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    /// Request dispatched.
    pub request_start_ms: f64,
    /// First response byte received.
    pub response_start_ms: f64,
    /// DOMContentLoaded finished; zero if not reached yet.
    pub dom_content_loaded_ms: f64,
    /// Load event finished; zero if not reached yet.
    pub load_event_end_ms: f64,
}

/// Resource timing for one fetched resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTiming {
    /// Resource URL.
    pub name: String,
    /// Fetch duration.
    pub duration_ms: f64,
    /// Bytes transferred over the network, zero when served from cache.
    pub transfer_size: u64,
}

/// Heap usage snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapSnapshot {
    /// Used heap bytes.
    pub used_bytes: u64,
    /// Allocated heap bytes.
    pub total_bytes: u64,
    /// Heap size limit in bytes.
    pub limit_bytes: u64,
}

/// A raw entry delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformanceEntry {
    /// Navigation timing.
    Navigation(NavigationTiming),
    /// A paint entry such as `first-paint` or `first-contentful-paint`.
    Paint {
        /// Paint name.
        name: String,
        /// Paint time.
        start_time_ms: f64,
    },
    /// A largest contentful paint candidate.
    LargestContentfulPaint {
        /// Render time of the candidate.
        start_time_ms: f64,
    },
    /// A layout shift.
    LayoutShift {
        /// Shift score.
        value: f64,
        /// Whether user input happened shortly before the shift.
        had_recent_input: bool,
    },
    /// The first user input.
    FirstInput {
        /// Input time.
        start_time_ms: f64,
        /// Time the handler started.
        processing_start_ms: f64,
    },
    /// Resource timing.
    Resource(ResourceTiming),
}

impl PerformanceEntry {
    /// Observation kind that delivers this entry.
    pub const fn kind(&self) -> ObservationKind {
        match self {
            Self::Navigation(_) => ObservationKind::Navigation,
            Self::Paint { .. } => ObservationKind::Paint,
            Self::LargestContentfulPaint { .. } => ObservationKind::LargestContentfulPaint,
            Self::LayoutShift { .. } => ObservationKind::LayoutShift,
            Self::FirstInput { .. } => ObservationKind::FirstInput,
            Self::Resource(_) => ObservationKind::Resource,
        }
    }
}

/// Callback invoked by the platform for each delivered entry.
pub type EntryCallback = Arc<dyn Fn(PerformanceEntry) + Send + Sync>;

/// A live platform subscription.
pub trait Subscription: Send {
    /// Detach from the platform. Calling it again has no effect.
    fn disconnect(&mut self);
}

/// Platform timing and heap primitives.
pub trait PerformancePlatform: Send + Sync {
    /// Report which observation kinds exist on this platform.
    fn probe(&self) -> Capabilities;

    /// Subscribe `callback` to entries of `kind`.
    fn subscribe(
        &self,
        kind: ObservationKind,
        callback: EntryCallback,
    ) -> Result<Box<dyn Subscription>, EngineError>;

    /// Current heap usage, if the platform exposes it.
    fn heap_snapshot(&self) -> Option<HeapSnapshot>;
}

struct BridgeInner {
    sink: Arc<MetricSink>,
    cls_total: Mutex<f64>,
    stopped: AtomicBool,
}

impl BridgeInner {
    fn handle(&self, entry: PerformanceEntry) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let sink = &self.sink;
        match entry {
            PerformanceEntry::Navigation(t) => {
                let ttfb = (t.response_start_ms - t.request_start_ms).max(0.0);
                sink.record(names::TIME_TO_FIRST_BYTE, ttfb, MetricCategory::WebVital);
                if t.dom_content_loaded_ms > 0.0 {
                    sink.record(
                        names::DOM_CONTENT_LOADED,
                        t.dom_content_loaded_ms,
                        MetricCategory::Load,
                    );
                }
                if t.load_event_end_ms > 0.0 {
                    sink.record(names::PAGE_LOAD, t.load_event_end_ms, MetricCategory::Load);
                }
            }
            PerformanceEntry::Paint { name, start_time_ms } => {
                if name == names::FIRST_CONTENTFUL_PAINT {
                    sink.record(
                        names::FIRST_CONTENTFUL_PAINT,
                        start_time_ms,
                        MetricCategory::WebVital,
                    );
                }
            }
            PerformanceEntry::LargestContentfulPaint { start_time_ms } => {
                sink.record(
                    names::LARGEST_CONTENTFUL_PAINT,
                    start_time_ms,
                    MetricCategory::WebVital,
                );
            }
            PerformanceEntry::LayoutShift {
                value,
                had_recent_input,
            } => {
                if had_recent_input {
                    return;
                }
                let total = {
                    let mut cls = self.cls_total.lock();
                    *cls += value;
                    *cls
                };
                sink.record(names::CUMULATIVE_LAYOUT_SHIFT, total, MetricCategory::WebVital);
            }
            PerformanceEntry::FirstInput {
                start_time_ms,
                processing_start_ms,
            } => {
                let delay = (processing_start_ms - start_time_ms).max(0.0);
                sink.record(names::FIRST_INPUT_DELAY, delay, MetricCategory::WebVital);
            }
            PerformanceEntry::Resource(r) => self.handle_resource(r),
        }
    }

    fn handle_resource(&self, r: ResourceTiming) {
        let path = strip_query(&r.name);
        if is_script(path) {
            let budget = self.sink.config().bundle_size.max_chunk_bytes;
            if r.transfer_size > budget {
                self.sink.log().emit(Diagnostic::OversizedBundle {
                    resource: r.name.clone(),
                    transfer_bytes: r.transfer_size,
                    budget_bytes: budget,
                });
            }
            self.sink.record(names::BUNDLE_LOAD, r.duration_ms, MetricCategory::Load);
        } else if is_image(path) {
            self.sink.record(names::IMAGE_LOAD, r.duration_ms, MetricCategory::Load);
        }
    }

    fn sample_heap(&self, snapshot: HeapSnapshot) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let used_mb = bytes_to_mb(snapshot.used_bytes);
        let total_mb = bytes_to_mb(snapshot.total_bytes);
        self.sink.record(names::HEAP_USED, used_mb, MetricCategory::Memory);
        self.sink.record(names::HEAP_TOTAL, total_mb, MetricCategory::Memory);

        let limit_mb = self.sink.config().memory.high_usage_mb;
        if used_mb > limit_mb {
            self.sink.log().emit(Diagnostic::HighMemory { used_mb, limit_mb });
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn is_script(path: &str) -> bool {
    path.ends_with(".js") || path.ends_with(".mjs")
}

fn is_image(path: &str) -> bool {
    const EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".avif", ".svg"];
    let lower = path.to_ascii_lowercase();
    EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Subscribes to platform observations and feeds the metric sink.
pub struct ObservationBridge {
    inner: Arc<BridgeInner>,
    capabilities: Capabilities,
    subscriptions: Mutex<Vec<Box<dyn Subscription>>>,
    heap_stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl ObservationBridge {
    /// Probe `platform`, subscribe to what it supports, and start heap sampling.
    ///
    /// When metrics are disabled the bridge is inert: no subscription is made.
    pub fn start<S: Spawn>(
        platform: Arc<dyn PerformancePlatform>,
        sink: Arc<MetricSink>,
        spawner: &S,
    ) -> Self {
        let enabled = sink.config().enable_metrics;
        let interval = sink.config().heap_sample_interval();
        let bridge = Self {
            inner: Arc::new(BridgeInner {
                sink,
                cls_total: Mutex::new(0.0),
                stopped: AtomicBool::new(false),
            }),
            capabilities: if enabled { platform.probe() } else { Capabilities::none() },
            subscriptions: Mutex::new(Vec::new()),
            heap_stop: Mutex::new(None),
        };
        if !enabled {
            tracing::debug!(
                target: "adaptive_vitals",
                "metrics disabled; observation bridge inert"
            );
            return bridge;
        }

        for kind in ObservationKind::ENTRY_KINDS {
            if !bridge.capabilities.contains(kind) {
                bridge.unsupported(kind, "not reported by capability probe");
                continue;
            }
            let inner = Arc::clone(&bridge.inner);
            let callback: EntryCallback = Arc::new(move |entry| inner.handle(entry));
            match platform.subscribe(kind, callback) {
                Ok(sub) => bridge.subscriptions.lock().push(sub),
                Err(e) => bridge.unsupported(kind, &e.to_string()),
            }
        }

        if bridge.capabilities.contains(ObservationKind::Memory) {
            let (tx, mut rx) = oneshot::channel::<()>();
            *bridge.heap_stop.lock() = Some(tx);
            let inner = Arc::clone(&bridge.inner);
            spawner.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately; sampling starts one period in.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = &mut rx => break,
                        _ = ticker.tick() => {
                            if let Some(snapshot) = platform.heap_snapshot() {
                                inner.sample_heap(snapshot);
                            }
                        }
                    }
                }
                tracing::debug!(target: "adaptive_vitals", "heap sampler stopped");
            });
        } else {
            bridge.unsupported(ObservationKind::Memory, "not reported by capability probe");
        }

        bridge
    }

    fn unsupported(&self, kind: ObservationKind, reason: &str) {
        self.inner.sink.log().emit(Diagnostic::Unsupported {
            kind,
            reason: reason.to_string(),
        });
    }

    /// Capabilities found at construction.
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Number of live platform subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Map one entry to metric records, as if the platform had delivered it.
    pub fn handle_entry(&self, entry: PerformanceEntry) {
        self.inner.handle(entry);
    }

    /// Record one heap sample, as if the sampler had fired.
    pub fn sample_heap(&self, snapshot: HeapSnapshot) {
        self.inner.sample_heap(snapshot);
    }

    /// Disconnect every subscription and stop the heap sampler. Idempotent.
    pub fn shutdown(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let subs: Vec<_> = self.subscriptions.lock().drain(..).collect();
        let count = subs.len();
        for mut sub in subs {
            sub.disconnect();
        }
        if let Some(stop) = self.heap_stop.lock().take() {
            let _ = stop.send(());
        }
        tracing::debug!(
            target: "adaptive_vitals",
            subscriptions = count,
            "observation bridge shut down"
        );
    }
}

impl Drop for ObservationBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
