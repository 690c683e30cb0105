//! Viewport visibility tracking for hosting regions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::core::bridge::Subscription;
use crate::core::EngineError;

/// Opaque handle to a UI region supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    /// Wrap a host-specific element identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The wrapped identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Intersection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityOptions {
    /// Margin around the viewport, CSS syntax.
    pub root_margin: String,
    /// Visible ratio at or above which the region counts as visible.
    pub threshold: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            root_margin: "100px".into(),
            threshold: 0.1,
        }
    }
}

/// One intersection change reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Whether the region intersects the (margin-extended) viewport.
    pub is_intersecting: bool,
    /// Visible fraction of the region in `[0, 1]`.
    pub intersection_ratio: f64,
}

/// Callback invoked by the platform on intersection changes.
pub type IntersectionCallback = Arc<dyn Fn(IntersectionEntry) + Send + Sync>;

/// Platform viewport-intersection primitive.
pub trait IntersectionPlatform: Send + Sync {
    /// Start observing `element`.
    fn observe(
        &self,
        element: &ElementHandle,
        options: &VisibilityOptions,
        callback: IntersectionCallback,
    ) -> Result<Box<dyn Subscription>, EngineError>;
}

struct Region {
    id: Uuid,
    element: ElementHandle,
    threshold: f64,
    sender: Mutex<Option<watch::Sender<bool>>>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
    disposed: AtomicBool,
}

impl Region {
    fn on_entry(&self, entry: IntersectionEntry) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let visible = entry.is_intersecting && entry.intersection_ratio >= self.threshold;
        if let Some(tx) = self.sender.lock().as_ref() {
            tx.send_if_modified(|current| {
                let changed = *current != visible;
                *current = visible;
                changed
            });
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(mut sub) = self.subscription.lock().take() {
            sub.disconnect();
        }
        // Dropping the sender wakes every waiter.
        self.sender.lock().take();
        tracing::debug!(
            target: "adaptive_vitals",
            region = %self.id,
            element = self.element.as_str(),
            "visibility region disposed"
        );
    }
}

/// Live visibility of one observed region.
#[derive(Clone)]
pub struct VisibilitySignal {
    region: Arc<Region>,
    rx: watch::Receiver<bool>,
}

impl VisibilitySignal {
    /// Identifier of this observation; every `observe` call gets a new one.
    pub fn id(&self) -> Uuid {
        self.region.id
    }

    /// Current visibility.
    pub fn is_visible(&self) -> bool {
        !self.is_disposed() && *self.rx.borrow()
    }

    /// Whether the region has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.region.disposed.load(Ordering::Acquire)
    }

    /// Resolve `true` once the region is visible, or `false` if it is
    /// disposed first.
    pub async fn wait_until_visible(&self) -> bool {
        let mut rx = self.rx.clone();
        loop {
            if self.is_disposed() {
                return false;
            }
            if *rx.borrow_and_update() {
                return true;
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }
}

impl std::fmt::Debug for VisibilitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilitySignal")
            .field("id", &self.region.id)
            .field("element", &self.region.element)
            .field("visible", &self.is_visible())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Detaches the observer of a region exactly once. Dropping it disposes too.
pub struct Disposer {
    region: Arc<Region>,
}

impl Disposer {
    /// Detach the observer; later calls are no-ops.
    pub fn dispose(&self) {
        self.region.dispose();
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.region.dispose();
    }
}

/// Produces visibility signals for host regions.
#[derive(Clone)]
pub struct VisibilityTracker {
    platform: Arc<dyn IntersectionPlatform>,
}

impl VisibilityTracker {
    /// Create a tracker over a platform intersection primitive.
    pub fn new(platform: Arc<dyn IntersectionPlatform>) -> Self {
        Self { platform }
    }

    /// Observe `element`. Each call yields an independent signal, even for
    /// an element observed before.
    pub fn observe(
        &self,
        element: &ElementHandle,
        options: &VisibilityOptions,
    ) -> Result<(VisibilitySignal, Disposer), EngineError> {
        let (tx, rx) = watch::channel(false);
        let region = Arc::new(Region {
            id: Uuid::new_v4(),
            element: element.clone(),
            threshold: options.threshold,
            sender: Mutex::new(Some(tx)),
            subscription: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });

        let weak: Weak<Region> = Arc::downgrade(&region);
        let callback: IntersectionCallback = Arc::new(move |entry| {
            if let Some(region) = weak.upgrade() {
                region.on_entry(entry);
            }
        });
        let subscription = self.platform.observe(element, options, callback)?;
        *region.subscription.lock() = Some(subscription);

        Ok((
            VisibilitySignal {
                region: Arc::clone(&region),
                rx,
            },
            Disposer { region },
        ))
    }
}
