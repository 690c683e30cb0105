//! End-to-end tests through the engine builder.

use std::sync::Arc;

use adaptive_vitals::builders::{Engine, EngineBuilder};
use adaptive_vitals::config::MetricsConfig;
use adaptive_vitals::core::{
    AnalyticsSink, Diagnostic, EngineError, FixedSampler, RandomSampler, RecordOutcome,
};
use adaptive_vitals::infra::{
    ChannelAnalytics, InMemoryAnalytics, InMemoryDiagnostics, ManualPlatform,
};
use adaptive_vitals::runtime::TokioSpawner;
use adaptive_vitals::util::{names, MetricCategory};

fn engine(
    cfg: MetricsConfig,
    analytics: Arc<dyn AnalyticsSink>,
    log: Arc<InMemoryDiagnostics>,
) -> (Engine, Arc<ManualPlatform>) {
    let platform = Arc::new(ManualPlatform::full());
    let engine = EngineBuilder::new(cfg)
        .with_log(log)
        .with_analytics(analytics)
        .with_sampler(Arc::new(RandomSampler))
        .build(platform.clone(), platform.clone(), &TokioSpawner::current())
        .unwrap();
    (engine, platform)
}

fn with_rate(sample_rate: f64) -> MetricsConfig {
    MetricsConfig {
        sample_rate,
        ..MetricsConfig::default()
    }
}

#[tokio::test]
async fn test_full_sample_rate_forwards_everything() {
    let analytics = Arc::new(InMemoryAnalytics::new(1024));
    let log = Arc::new(InMemoryDiagnostics::new(4096));
    let (engine, _) = engine(with_rate(1.0), analytics.clone(), log);

    for i in 0..500 {
        engine
            .sink()
            .record(names::COMPONENT_RENDER, f64::from(i % 10), MetricCategory::Render);
    }
    assert_eq!(analytics.metrics().len(), 500);
}

#[tokio::test]
async fn test_zero_sample_rate_forwards_nothing() {
    let analytics = Arc::new(InMemoryAnalytics::new(1024));
    let log = Arc::new(InMemoryDiagnostics::new(4096));
    let (engine, _) = engine(with_rate(0.0), analytics.clone(), log.clone());

    for _ in 0..500 {
        assert_eq!(
            engine.sink().record(names::API_RESPONSE, 9000.0, MetricCategory::Network),
            RecordOutcome::Discarded
        );
    }
    assert!(analytics.metrics().is_empty());
    assert_eq!(
        log.count(|d| matches!(
            d,
            Diagnostic::Observed(_) | Diagnostic::ThresholdExceeded { .. }
        )),
        0
    );
}

#[tokio::test]
async fn test_disabled_metrics_never_reach_analytics() {
    let analytics = Arc::new(InMemoryAnalytics::new(16));
    let log = Arc::new(InMemoryDiagnostics::new(16));
    let cfg = MetricsConfig {
        enable_metrics: false,
        ..MetricsConfig::default()
    };
    let (engine, platform) = engine(cfg, analytics.clone(), log.clone());

    assert_eq!(
        engine.sink().record(names::BUNDLE_LOAD, 5000.0, MetricCategory::Load),
        RecordOutcome::Disabled
    );
    assert_eq!(platform.entry_subscriptions(), 0);
    assert!(analytics.metrics().is_empty());
    assert!(log.diagnostics().is_empty());
}

#[tokio::test]
async fn test_threshold_is_strict() {
    let analytics = Arc::new(InMemoryAnalytics::new(16));
    let log = Arc::new(InMemoryDiagnostics::new(16));
    let (engine, _) = engine(with_rate(1.0), analytics, log.clone());

    assert_eq!(
        engine.sink().record(names::COMPONENT_RENDER, 16.0, MetricCategory::Render),
        RecordOutcome::Recorded {
            threshold_exceeded: false
        }
    );
    assert_eq!(
        engine.sink().record(names::COMPONENT_RENDER, 16.5, MetricCategory::Render),
        RecordOutcome::Recorded {
            threshold_exceeded: true
        }
    );
    assert_eq!(
        log.count(|d| matches!(
            d,
            Diagnostic::ThresholdExceeded { threshold, .. }
                if (*threshold - 16.0).abs() < f64::EPSILON
        )),
        1
    );
}

#[tokio::test]
async fn test_measure_records_duration() {
    let analytics = Arc::new(InMemoryAnalytics::new(16));
    let log = Arc::new(InMemoryDiagnostics::new(16));
    let (engine, _) = engine(with_rate(1.0), analytics.clone(), log);

    let out = engine
        .sink()
        .measure(names::COMPONENT_RENDER, MetricCategory::Render, || 6 * 7);
    assert_eq!(out, 42);

    let body = engine
        .sink()
        .measure_async(names::API_RESPONSE, MetricCategory::Network, async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            "ok"
        })
        .await;
    assert_eq!(body, "ok");

    let api = analytics.named(names::API_RESPONSE);
    assert_eq!(api.len(), 1);
    assert!(api[0].value >= 5.0);
    assert_eq!(analytics.named(names::COMPONENT_RENDER).len(), 1);
}

#[tokio::test]
async fn test_channel_analytics_reports_backpressure() {
    let (analytics, mut rx) = ChannelAnalytics::new(1);
    let log = Arc::new(InMemoryDiagnostics::new(16));
    let (engine, _) = engine(with_rate(1.0), Arc::new(analytics), log.clone());

    engine.sink().record("first", 1.0, MetricCategory::Load);
    engine.sink().record("second", 2.0, MetricCategory::Load);

    assert_eq!(rx.recv().await.unwrap().name, "first");
    assert_eq!(
        log.count(|d| matches!(d, Diagnostic::AnalyticsFailed(_))),
        1
    );
}

#[tokio::test]
async fn test_invalid_values_are_dropped() {
    let analytics = Arc::new(InMemoryAnalytics::new(16));
    let log = Arc::new(InMemoryDiagnostics::new(16));
    let platform = Arc::new(ManualPlatform::full());
    let engine = EngineBuilder::new(MetricsConfig::default())
        .with_log(log.clone())
        .with_analytics(analytics.clone())
        .with_sampler(Arc::new(FixedSampler(0.0)))
        .build(platform.clone(), platform, &TokioSpawner::current())
        .unwrap();

    assert_eq!(
        engine.sink().record("x", f64::NAN, MetricCategory::Load),
        RecordOutcome::Invalid
    );
    assert_eq!(
        engine.sink().record("x", -1.0, MetricCategory::Load),
        RecordOutcome::Invalid
    );
    assert!(analytics.metrics().is_empty());
    assert_eq!(
        log.count(|d| matches!(d, Diagnostic::InvalidValue { .. })),
        2
    );
}

#[test]
fn test_env_resolution_errors_surface_as_config_errors() {
    let lookup = |key: &str| match key {
        "METRICS_SAMPLE_RATE" => Some("lots".to_string()),
        _ => None,
    };
    assert!(matches!(
        MetricsConfig::resolve_from(lookup),
        Err(EngineError::Config(_))
    ));
}
