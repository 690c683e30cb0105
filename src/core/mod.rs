//! Core engine: metric sink, observation bridge, visibility tracking, and
//! the adaptive loading scheduler.

pub mod bridge;
pub mod diagnostics;
pub mod error;
pub mod prefetch;
pub mod scheduler;
pub mod sink;
pub mod spawn;
pub mod visibility;

pub use bridge::{
    Capabilities, EntryCallback, HeapSnapshot, NavigationTiming, ObservationBridge,
    ObservationKind, PerformanceEntry, PerformancePlatform, ResourceTiming, Subscription,
};
pub use diagnostics::{Diagnostic, DiagnosticLog, TracingLog};
pub use error::{AppResult, EngineError};
pub use prefetch::PrefetchQueue;
pub use scheduler::{AdaptiveScheduler, Mount, UnitHandle, UnitLoader, UnitState};
pub use sink::{AnalyticsSink, FixedSampler, MetricSink, RandomSampler, RecordOutcome, Sampler};
pub use spawn::{IdleJob, IdlePlatform, Spawn};
pub use visibility::{
    Disposer, ElementHandle, IntersectionCallback, IntersectionEntry, IntersectionPlatform,
    VisibilityOptions, VisibilitySignal, VisibilityTracker,
};
