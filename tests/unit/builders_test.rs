//! Tests for builder modules

use std::sync::Arc;

use adaptive_vitals::builders::EngineBuilder;
use adaptive_vitals::config::MetricsConfig;
use adaptive_vitals::core::{EngineError, FixedSampler, Mount};
use adaptive_vitals::infra::{InMemoryAnalytics, InMemoryDiagnostics, ManualPlatform};
use adaptive_vitals::runtime::TokioSpawner;
use adaptive_vitals::util::{MetricCategory, Priority};

#[tokio::test]
async fn test_engine_builder_wires_sink_and_bridge() {
    let platform = Arc::new(ManualPlatform::full());
    let analytics = Arc::new(InMemoryAnalytics::new(16));
    let spawner = TokioSpawner::current();

    let engine = EngineBuilder::new(MetricsConfig::default())
        .with_log(Arc::new(InMemoryDiagnostics::new(16)))
        .with_analytics(analytics.clone())
        .with_sampler(Arc::new(FixedSampler(0.0)))
        .build(platform.clone(), platform.clone(), &spawner)
        .expect("engine");

    assert_eq!(engine.bridge().active_subscriptions(), 6);
    engine.sink().record("api-response", 12.0, MetricCategory::Network);
    assert_eq!(analytics.metrics().len(), 1);

    engine.shutdown();
    assert_eq!(platform.entry_subscriptions(), 0);
}

#[tokio::test]
async fn test_engine_builder_rejects_invalid_config() {
    let platform = Arc::new(ManualPlatform::full());
    let cfg = MetricsConfig {
        sample_rate: 2.0,
        ..MetricsConfig::default()
    };
    let result = EngineBuilder::new(cfg).build(
        platform.clone(),
        platform.clone(),
        &TokioSpawner::current(),
    );
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[tokio::test]
async fn test_engine_scheduler_shares_config() {
    let platform = Arc::new(ManualPlatform::full());
    let spawner = TokioSpawner::current();
    let engine = EngineBuilder::new(MetricsConfig::default())
        .build(platform.clone(), platform.clone(), &spawner)
        .expect("engine");

    let scheduler = engine.scheduler::<u32, &'static str, _>(spawner, None);
    let handle = scheduler.declare(|| async { Ok(5) }, Priority::Low, "placeholder");
    assert!(scheduler.mount(handle).unwrap().is_placeholder());
    let unit = scheduler.load(handle).await.unwrap();
    assert_eq!(*unit, 5);
    assert!(matches!(scheduler.mount(handle).unwrap(), Mount::Ready(_)));
}
