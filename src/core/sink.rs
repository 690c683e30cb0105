//! Metric sink: the single write path for observations.
//!
//! `record` is fire-and-forget. It checks the master switch first, validates
//! the value, applies sampling, and only then logs, evaluates the threshold,
//! and forwards to analytics. Sampling gates every downstream effect,
//! including threshold warnings.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use crate::config::MetricsConfig;
use crate::core::diagnostics::{Diagnostic, DiagnosticLog};
use crate::core::EngineError;
use crate::util::clock::now_ms;
use crate::util::serde::{Metric, MetricCategory};

/// External analytics collaborator.
///
/// Called synchronously for every kept observation; implementations are
/// expected to hand the value off (batch, queue) rather than transmit inline.
pub trait AnalyticsSink: Send + Sync {
    /// Accept one observation.
    fn send(&self, name: &str, value: f64, category: MetricCategory) -> Result<(), EngineError>;
}

/// Source of uniform draws in `[0, 1)` for sampling decisions.
pub trait Sampler: Send + Sync {
    /// Draw one value in `[0, 1)`.
    fn draw(&self) -> f64;
}

/// Sampler backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn draw(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Sampler that always returns the same draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub f64);

impl Sampler for FixedSampler {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// What happened to a single `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Metrics are disabled; nothing was done.
    Disabled,
    /// The value was negative or not finite.
    Invalid,
    /// The sampling draw discarded the observation.
    Discarded,
    /// The observation was logged and forwarded.
    Recorded {
        /// Whether the value was strictly above its threshold.
        threshold_exceeded: bool,
    },
}

/// The metric sink.
pub struct MetricSink {
    config: Arc<MetricsConfig>,
    log: Arc<dyn DiagnosticLog>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    sampler: Arc<dyn Sampler>,
}

impl MetricSink {
    /// Create a sink that logs to `log` and samples with [`RandomSampler`].
    pub fn new(config: Arc<MetricsConfig>, log: Arc<dyn DiagnosticLog>) -> Self {
        Self {
            config,
            log,
            analytics: None,
            sampler: Arc::new(RandomSampler),
        }
    }

    /// Attach an analytics collaborator.
    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Replace the sampler.
    #[must_use]
    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Configuration this sink was built with.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Diagnostic log shared with other components.
    pub fn log(&self) -> &Arc<dyn DiagnosticLog> {
        &self.log
    }

    /// Record one observation. Never panics and never blocks on analytics.
    pub fn record(&self, name: &str, value: f64, category: MetricCategory) -> RecordOutcome {
        if !self.config.enable_metrics {
            return RecordOutcome::Disabled;
        }
        if !value.is_finite() || value < 0.0 {
            self.log.emit(Diagnostic::InvalidValue {
                name: name.to_string(),
                value,
            });
            return RecordOutcome::Invalid;
        }
        if self.sampler.draw() >= self.config.sample_rate {
            return RecordOutcome::Discarded;
        }

        let metric = Metric {
            name: name.to_string(),
            value,
            category,
            timestamp_ms: now_ms(),
        };
        let threshold = self.config.threshold_for(name, category);
        let threshold_exceeded = threshold.is_some_and(|t| value > t);

        self.log.emit(Diagnostic::Observed(metric.clone()));
        if let Some(threshold) = threshold.filter(|_| threshold_exceeded) {
            self.log.emit(Diagnostic::ThresholdExceeded { metric, threshold });
        }
        self.forward(name, value, category);

        RecordOutcome::Recorded { threshold_exceeded }
    }

    /// Run `f`, record its wall-clock duration in milliseconds, and return its result.
    pub fn measure<R>(&self, name: &str, category: MetricCategory, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.record(name, elapsed_ms(start), category);
        out
    }

    /// Await `fut`, record its wall-clock duration in milliseconds, and return its output.
    pub async fn measure_async<F>(&self, name: &str, category: MetricCategory, fut: F) -> F::Output
    where
        F: Future,
    {
        let start = Instant::now();
        let out = fut.await;
        self.record(name, elapsed_ms(start), category);
        out
    }

    fn forward(&self, name: &str, value: f64, category: MetricCategory) {
        let Some(analytics) = self.analytics.as_ref() else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(|| analytics.send(name, value, category))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.log.emit(Diagnostic::AnalyticsFailed(e.to_string())),
            Err(_) => self
                .log
                .emit(Diagnostic::AnalyticsFailed("analytics collaborator panicked".into())),
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
