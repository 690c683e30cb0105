//! Adaptive loading scheduler for deferred units.
//!
//! Each declared unit owns one slot in a keyed store. A slot moves
//! `Pending -> Loading -> Ready | Failed` and never back: the loader is a
//! `FnOnce` taken out of the slot and invoked under its lock, so it runs at
//! most once for the lifetime of the scheduler. Everyone who asks for a unit
//! while it is loading shares the same in-flight future. Loaders must not
//! call back into the scheduler before returning their future.
//!
//! Units are started by:
//! - `mount`, for ungated units;
//! - the first visible transition of a hosting region, for `mount_visible`;
//! - the idle-time prefetch queue, for high priority units and `prefetch`.
//!
//! Failed units are terminal, including loaders that panic. A fresh
//! `declare` is the only way to retry.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::MetricsConfig;
use crate::core::diagnostics::{Diagnostic, DiagnosticLog};
use crate::core::prefetch::PrefetchQueue;
use crate::core::spawn::{IdlePlatform, Spawn};
use crate::core::visibility::VisibilitySignal;
use crate::core::{AppResult, EngineError};
use crate::util::serde::{Priority, UnitId};

/// Loader for a deferred unit, for callers that prefer a trait object over a closure.
#[async_trait]
pub trait UnitLoader<U>: Send + Sync {
    /// Fetch and build the unit.
    async fn load(&self) -> AppResult<U>;
}

type LoaderFn<U> = Box<dyn FnOnce() -> BoxFuture<'static, AppResult<U>> + Send>;
type SharedLoad<U> = Shared<BoxFuture<'static, Result<Arc<U>, String>>>;

/// Lifecycle state of a deferred unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    /// Declared, loader not started.
    Pending,
    /// Loader running.
    Loading,
    /// Loader resolved.
    Ready,
    /// Loader rejected; terminal.
    Failed(String),
}

/// Result of mounting a unit.
#[derive(Debug, Clone)]
pub enum Mount<U, P> {
    /// The unit is loaded.
    Ready(Arc<U>),
    /// The unit is not loaded yet; render this instead.
    Placeholder(P),
    /// The loader rejected; the caller renders an error affordance.
    Failed(String),
}

impl<U, P> Mount<U, P> {
    /// Whether this is the placeholder.
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// The loaded unit, if any.
    pub const fn ready(&self) -> Option<&Arc<U>> {
        match self {
            Self::Ready(unit) => Some(unit),
            _ => None,
        }
    }
}

/// Handle to a declared unit. Only the scheduler that issued it accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitHandle {
    scheduler: Uuid,
    id: UnitId,
    priority: Priority,
}

impl UnitHandle {
    /// Unit identifier.
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Declared priority.
    pub const fn priority(&self) -> Priority {
        self.priority
    }
}

enum Phase<U> {
    Pending(LoaderFn<U>),
    Loading(SharedLoad<U>),
    Ready(Arc<U>),
    Failed(String),
}

enum Progress<U> {
    Idle,
    InFlight(SharedLoad<U>),
    Ready(Arc<U>),
    Failed(String),
}

impl<U> Phase<U> {
    /// Promote a finished in-flight load so readers see it synchronously.
    fn settle(&mut self) {
        let finished = match self {
            Self::Loading(fut) => fut.peek().cloned(),
            _ => None,
        };
        match finished {
            Some(Ok(unit)) => *self = Self::Ready(unit),
            Some(Err(reason)) => *self = Self::Failed(reason),
            None => {}
        }
    }

    fn progress(&self) -> Progress<U> {
        match self {
            Self::Pending(_) => Progress::Idle,
            Self::Loading(fut) => Progress::InFlight(fut.clone()),
            Self::Ready(unit) => Progress::Ready(Arc::clone(unit)),
            Self::Failed(reason) => Progress::Failed(reason.clone()),
        }
    }
}

struct UnitSlot<U, P> {
    id: UnitId,
    placeholder: P,
    phase: Mutex<Phase<U>>,
    // Signal the most recent visibility watcher waits on.
    watched: Mutex<Option<Uuid>>,
}

impl<U, P> UnitSlot<U, P> {
    fn progress(&self) -> Progress<U> {
        let mut phase = self.phase.lock();
        phase.settle();
        phase.progress()
    }
}

struct Inner<U, P, S> {
    id: Uuid,
    config: Arc<MetricsConfig>,
    spawner: S,
    idle: Option<Arc<dyn IdlePlatform>>,
    log: Arc<dyn DiagnosticLog>,
    units: Mutex<HashMap<UnitId, Arc<UnitSlot<U, P>>>>,
    next_id: AtomicU64,
    prefetch: Mutex<PrefetchQueue>,
    drain_scheduled: AtomicBool,
}

impl<U, P, S> Inner<U, P, S>
where
    U: Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    fn slot(&self, handle: UnitHandle) -> Result<Arc<UnitSlot<U, P>>, EngineError> {
        if handle.scheduler != self.id {
            return Err(EngineError::UnknownUnit(handle.id));
        }
        self.units
            .lock()
            .get(&handle.id)
            .cloned()
            .ok_or(EngineError::UnknownUnit(handle.id))
    }

    /// Start the loader if the unit is pending and report its progress.
    fn start(&self, slot: &Arc<UnitSlot<U, P>>) -> Progress<U> {
        let mut phase = slot.phase.lock();
        phase.settle();
        let loader = match std::mem::replace(&mut *phase, Phase::Failed(String::new())) {
            Phase::Pending(loader) => loader,
            other => {
                let progress = other.progress();
                *phase = other;
                return progress;
            }
        };

        // The loader only builds the future; its body runs on the spawner.
        let pending = match catch_unwind(AssertUnwindSafe(loader)) {
            Ok(pending) => pending,
            Err(panic) => {
                let reason = panic_reason(panic.as_ref());
                *phase = Phase::Failed(reason.clone());
                drop(phase);
                self.log.emit(Diagnostic::LoaderFailed {
                    unit: slot.id,
                    reason: reason.clone(),
                });
                return Progress::Failed(reason);
            }
        };
        let shared = async move {
            match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(result) => result.map(Arc::new).map_err(|e| format!("{e:#}")),
                Err(panic) => Err(panic_reason(panic.as_ref())),
            }
        }
        .boxed()
        .shared();
        *phase = Phase::Loading(shared.clone());
        drop(phase);

        tracing::debug!(target: "adaptive_vitals", unit = slot.id, "deferred unit loading");
        let driver = shared.clone();
        let slot = Arc::clone(slot);
        let log = Arc::clone(&self.log);
        self.spawner.spawn(async move {
            let outcome = driver.await;
            let failure = outcome.as_ref().err().cloned();
            {
                let mut phase = slot.phase.lock();
                *phase = match outcome {
                    Ok(unit) => Phase::Ready(unit),
                    Err(reason) => Phase::Failed(reason),
                };
            }
            match failure {
                Some(reason) => log.emit(Diagnostic::LoaderFailed {
                    unit: slot.id,
                    reason,
                }),
                None => {
                    tracing::debug!(
                        target: "adaptive_vitals",
                        unit = slot.id,
                        "deferred unit ready"
                    );
                }
            }
        });

        Progress::InFlight(shared)
    }

    fn mount_from(&self, slot: &UnitSlot<U, P>, progress: Progress<U>) -> Mount<U, P> {
        match progress {
            Progress::Ready(unit) => Mount::Ready(unit),
            Progress::Failed(reason) => Mount::Failed(reason),
            Progress::Idle | Progress::InFlight(_) => {
                Mount::Placeholder(slot.placeholder.clone())
            }
        }
    }

    fn enqueue_prefetch(self: &Arc<Self>, handle: UnitHandle) {
        self.prefetch.lock().push(handle.id, handle.priority);
        if self.drain_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = Arc::clone(self);
        let job = move || inner.drain_prefetch();
        match &self.idle {
            Some(idle) => idle.request_idle(Box::new(job)),
            None => {
                let delay = self.config.idle_fallback();
                self.spawner.spawn(async move {
                    tokio::time::sleep(delay).await;
                    job();
                });
            }
        }
    }

    fn drain_prefetch(&self) {
        self.drain_scheduled.store(false, Ordering::Release);
        loop {
            let Some(id) = self.prefetch.lock().pop() else {
                break;
            };
            let slot = self.units.lock().get(&id).cloned();
            if let Some(slot) = slot {
                self.start(&slot);
            }
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("loader panicked: {message}")
}

/// Schedules the loading of deferred units.
///
/// Cloning is cheap; clones share the same store.
pub struct AdaptiveScheduler<U, P, S> {
    inner: Arc<Inner<U, P, S>>,
}

impl<U, P, S> Clone for AdaptiveScheduler<U, P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U, P, S> AdaptiveScheduler<U, P, S>
where
    U: Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a scheduler. Without an `idle` primitive, background fetches
    /// run after the configured fallback tick.
    pub fn new(
        config: Arc<MetricsConfig>,
        spawner: S,
        log: Arc<dyn DiagnosticLog>,
        idle: Option<Arc<dyn IdlePlatform>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                config,
                spawner,
                idle,
                log,
                units: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                prefetch: Mutex::new(PrefetchQueue::new()),
                drain_scheduled: AtomicBool::new(false),
            }),
        }
    }

    /// Declare a unit. Nothing is fetched yet unless `priority` is high,
    /// in which case the fetch is queued for the next idle period.
    pub fn declare<F, Fut>(&self, loader: F, priority: Priority, placeholder: P) -> UnitHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<U>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = UnitHandle {
            scheduler: self.inner.id,
            id,
            priority,
        };
        let slot = Arc::new(UnitSlot {
            id,
            placeholder,
            phase: Mutex::new(Phase::Pending(Box::new(move || loader().boxed()))),
            watched: Mutex::new(None),
        });
        self.inner.units.lock().insert(id, Arc::clone(&slot));

        let features = &self.inner.config.features;
        if !features.lazy_loading {
            self.inner.start(&slot);
        } else if priority == Priority::High && features.prefetch_high_priority {
            self.inner.enqueue_prefetch(handle);
        }
        tracing::debug!(target: "adaptive_vitals", unit = id, ?priority, "deferred unit declared");
        handle
    }

    /// Declare a unit backed by a [`UnitLoader`].
    pub fn declare_loader(
        &self,
        loader: Arc<dyn UnitLoader<U>>,
        priority: Priority,
        placeholder: P,
    ) -> UnitHandle {
        self.declare(move || async move { loader.load().await }, priority, placeholder)
    }

    /// Mount an ungated unit: start it if pending, then return the unit,
    /// its placeholder, or its failure.
    pub fn mount(&self, handle: UnitHandle) -> Result<Mount<U, P>, EngineError> {
        let slot = self.inner.slot(handle)?;
        let progress = self.inner.start(&slot);
        Ok(self.inner.mount_from(&slot, progress))
    }

    /// Mount a unit hosted in a region that may be off screen.
    ///
    /// The loader starts on the region's first visible transition and never
    /// before; the placeholder is returned until the unit is ready. Mounting
    /// a pending unit whose region is already disposed is an error. Each new
    /// signal gets its own watcher, so a region re-observed after disposal
    /// still triggers the load.
    pub fn mount_visible(
        &self,
        handle: UnitHandle,
        signal: &VisibilitySignal,
    ) -> Result<Mount<U, P>, EngineError> {
        let slot = self.inner.slot(handle)?;
        let progress = slot.progress();
        if !matches!(progress, Progress::Idle) {
            return Ok(self.inner.mount_from(&slot, progress));
        }
        if signal.is_disposed() {
            return Err(EngineError::RegionDisposed(handle.id));
        }
        if signal.is_visible() {
            let progress = self.inner.start(&slot);
            return Ok(self.inner.mount_from(&slot, progress));
        }
        let fresh = {
            let mut watched = slot.watched.lock();
            let fresh = *watched != Some(signal.id());
            *watched = Some(signal.id());
            fresh
        };
        if fresh {
            let inner = Arc::clone(&self.inner);
            let watched = Arc::clone(&slot);
            let signal = signal.clone();
            self.inner.spawner.spawn(async move {
                if signal.wait_until_visible().await {
                    inner.start(&watched);
                    return;
                }
                let mut current = watched.watched.lock();
                if *current == Some(signal.id()) {
                    *current = None;
                }
                drop(current);
                tracing::debug!(
                    target: "adaptive_vitals",
                    unit = watched.id,
                    "hosting region disposed before load"
                );
            });
        }
        Ok(self.inner.mount_from(&slot, Progress::Idle))
    }

    /// Queue a unit of any priority for the next idle period.
    pub fn prefetch(&self, handle: UnitHandle) -> Result<(), EngineError> {
        let slot = self.inner.slot(handle)?;
        if matches!(slot.progress(), Progress::Idle) {
            self.inner.enqueue_prefetch(handle);
        }
        Ok(())
    }

    /// Start the unit if needed and wait for its outcome. Concurrent callers
    /// share one in-flight load.
    pub async fn load(&self, handle: UnitHandle) -> Result<Arc<U>, EngineError> {
        let slot = self.inner.slot(handle)?;
        let fut = match self.inner.start(&slot) {
            Progress::Ready(unit) => return Ok(unit),
            Progress::Failed(reason) => {
                return Err(EngineError::LoaderFailed {
                    unit: handle.id,
                    reason,
                })
            }
            Progress::InFlight(fut) => fut,
            Progress::Idle => return Err(EngineError::UnknownUnit(handle.id)),
        };
        fut.await.map_err(|reason| EngineError::LoaderFailed {
            unit: handle.id,
            reason,
        })
    }

    /// Current state of a unit.
    pub fn state(&self, handle: UnitHandle) -> Result<UnitState, EngineError> {
        let slot = self.inner.slot(handle)?;
        Ok(match slot.progress() {
            Progress::Idle => UnitState::Pending,
            Progress::InFlight(_) => UnitState::Loading,
            Progress::Ready(_) => UnitState::Ready,
            Progress::Failed(reason) => UnitState::Failed(reason),
        })
    }

    /// Number of declared units.
    pub fn len(&self) -> usize {
        self.inner.units.lock().len()
    }

    /// Whether no unit has been declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
