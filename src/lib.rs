//! # Adaptive Vitals
//!
//! Client-side performance instrumentation and adaptive lazy loading for the
//! Prometheus AI Platform front end.
//!
//! The engine turns raw platform timing events into sampled, thresholded
//! metric signals, and decides when optional UI units are fetched: eagerly
//! in the background, on mount, or once their hosting region scrolls into view.
//!
//! ## Components
//!
//! - **Configuration** ([`config::MetricsConfig`]): immutable budgets and toggles
//!   resolved once from the environment.
//! - **Metric sink** ([`core::MetricSink`]): the single write path. Disabled
//!   check, sampling, diagnostic logging, threshold warnings, analytics hand-off.
//! - **Observation bridge** ([`core::ObservationBridge`]): maps navigation, paint,
//!   layout-shift, input, resource, and heap observations onto the sink.
//! - **Visibility tracker** ([`core::VisibilityTracker`]): live per-region
//!   visibility signals with idempotent disposal.
//! - **Adaptive scheduler** ([`core::AdaptiveScheduler`]): at-most-once,
//!   priority-aware loading of deferred units with placeholder rendering.
//!
//! Platform primitives (timing observers, intersection observers, idle
//! callbacks) are traits; [`infra::ManualPlatform`] drives them by hand.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adaptive_vitals::builders::EngineBuilder;
//! use adaptive_vitals::core::{ElementHandle, VisibilityOptions};
//! use adaptive_vitals::infra::ManualPlatform;
//! use adaptive_vitals::runtime::TokioSpawner;
//! use adaptive_vitals::util::Priority;
//!
//! let platform = Arc::new(ManualPlatform::full());
//! let spawner = TokioSpawner::current();
//! let engine = EngineBuilder::from_env()?
//!     .build(platform.clone(), platform.clone(), &spawner)?;
//!
//! let scheduler = engine.scheduler::<Chart, &'static str, _>(spawner, Some(platform.clone()));
//! let chart = scheduler.declare(|| Chart::fetch(), Priority::Low, "loading chart");
//!
//! let region = ElementHandle::new("pricing-chart");
//! let (signal, _dispose) = engine.tracker().observe(&region, &VisibilityOptions::default())?;
//! let view = scheduler.mount_visible(chart, &signal)?; // placeholder until scrolled into view
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Configuration registry for budgets, thresholds, and toggles.
pub mod config;
/// Core engine components.
pub mod core;
/// Builders to assemble the engine from configuration.
pub mod builders;
/// Analytics, diagnostic, and platform adapters.
pub mod infra;
/// Runtime adapters for the host event loop.
pub mod runtime;
/// Shared utilities.
pub mod util;
