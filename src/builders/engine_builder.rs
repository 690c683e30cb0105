//! Assemble the engine from one resolved configuration.

use std::sync::Arc;

use crate::config::MetricsConfig;
use crate::core::{
    AdaptiveScheduler, AnalyticsSink, DiagnosticLog, EngineError, IdlePlatform,
    IntersectionPlatform, MetricSink, ObservationBridge, PerformancePlatform, Sampler, Spawn,
    TracingLog, VisibilityTracker,
};

/// Builder that wires every component to the same immutable configuration
/// and diagnostic log.
pub struct EngineBuilder {
    config: Arc<MetricsConfig>,
    log: Arc<dyn DiagnosticLog>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    sampler: Option<Arc<dyn Sampler>>,
}

impl EngineBuilder {
    /// Start from an explicit configuration, logging through `tracing`.
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config: Arc::new(config),
            log: Arc::new(TracingLog),
            analytics: None,
            sampler: None,
        }
    }

    /// Start from the configuration resolved from the process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        MetricsConfig::resolve().map(Self::new)
    }

    /// Replace the diagnostic log.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn DiagnosticLog>) -> Self {
        self.log = log;
        self
    }

    /// Attach the analytics collaborator.
    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Replace the sampler.
    #[must_use]
    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// The configuration every component will share.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Validate the configuration, build the sink and tracker, and start the bridge.
    pub fn build<S: Spawn>(
        self,
        performance: Arc<dyn PerformancePlatform>,
        intersection: Arc<dyn IntersectionPlatform>,
        spawner: &S,
    ) -> Result<Engine, EngineError> {
        self.config.validate().map_err(EngineError::Config)?;

        let mut sink = MetricSink::new(Arc::clone(&self.config), Arc::clone(&self.log));
        if let Some(analytics) = self.analytics {
            sink = sink.with_analytics(analytics);
        }
        if let Some(sampler) = self.sampler {
            sink = sink.with_sampler(sampler);
        }
        let sink = Arc::new(sink);
        let bridge = ObservationBridge::start(performance, Arc::clone(&sink), spawner);
        tracing::info!(
            target: "adaptive_vitals",
            environment = ?self.config.environment,
            enabled = self.config.enable_metrics,
            sample_rate = self.config.sample_rate,
            "metrics engine started"
        );

        Ok(Engine {
            config: self.config,
            log: self.log,
            sink,
            bridge,
            tracker: VisibilityTracker::new(intersection),
        })
    }
}

/// A running engine.
pub struct Engine {
    config: Arc<MetricsConfig>,
    log: Arc<dyn DiagnosticLog>,
    sink: Arc<MetricSink>,
    bridge: ObservationBridge,
    tracker: VisibilityTracker,
}

impl Engine {
    /// Shared configuration.
    pub fn config(&self) -> &Arc<MetricsConfig> {
        &self.config
    }

    /// The metric sink.
    pub fn sink(&self) -> &Arc<MetricSink> {
        &self.sink
    }

    /// The observation bridge.
    pub const fn bridge(&self) -> &ObservationBridge {
        &self.bridge
    }

    /// The visibility tracker.
    pub const fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    /// Create a loading scheduler sharing this engine's configuration and log.
    pub fn scheduler<U, P, S>(
        &self,
        spawner: S,
        idle: Option<Arc<dyn IdlePlatform>>,
    ) -> AdaptiveScheduler<U, P, S>
    where
        U: Send + Sync + 'static,
        P: Clone + Send + Sync + 'static,
        S: Spawn + Send + Sync + 'static,
    {
        AdaptiveScheduler::new(Arc::clone(&self.config), spawner, Arc::clone(&self.log), idle)
    }

    /// Tear down every platform subscription.
    pub fn shutdown(&self) {
        self.bridge.shutdown();
    }
}
