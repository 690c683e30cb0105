//! Tests for configuration validation

use adaptive_vitals::config::{Environment, MetricsConfig};
use adaptive_vitals::util::{names, MetricCategory};

#[test]
fn test_default_config_is_valid() {
    assert!(MetricsConfig::default().validate().is_ok());
    assert!(MetricsConfig::for_environment(Environment::Production)
        .validate()
        .is_ok());
}

#[test]
fn test_invalid_sample_rate() {
    let cfg = MetricsConfig {
        sample_rate: -0.1,
        ..MetricsConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_max_chunk() {
    let mut cfg = MetricsConfig::default();
    cfg.bundle_size.max_chunk_bytes = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_threshold() {
    let mut cfg = MetricsConfig::default();
    cfg.web_vital_budgets.lcp_ms = f64::NAN;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_heap_interval() {
    let mut cfg = MetricsConfig::default();
    cfg.memory.sample_interval_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json_fills_defaults() {
    let json = r#"{
        "environment": "production",
        "enable_metrics": true,
        "sample_rate": 0.25,
        "web_vital_budgets": { "lcp_ms": 3000.0 },
        "bundle_size": { "max_chunk_bytes": 100000 }
    }"#;

    let cfg = MetricsConfig::from_json_str(json).expect("valid config");
    assert_eq!(cfg.environment, Environment::Production);
    assert!(cfg.enable_metrics);
    assert!((cfg.sample_rate - 0.25).abs() < f64::EPSILON);
    assert!((cfg.web_vital_budgets.lcp_ms - 3000.0).abs() < f64::EPSILON);
    assert!((cfg.web_vital_budgets.fid_ms - 100.0).abs() < f64::EPSILON);
    assert_eq!(cfg.bundle_size.max_chunk_bytes, 100_000);
    assert!(cfg.features.lazy_loading);
}

#[test]
fn test_bundle_budget_serializes_chunk_ceiling_only() {
    let cfg = MetricsConfig::default();
    let json = serde_json::to_value(&cfg).unwrap();
    let bundle = json["bundle_size"].as_object().unwrap();
    assert_eq!(bundle.len(), 1);
    assert_eq!(bundle["max_chunk_bytes"], 250_000);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(MetricsConfig::from_json_str(r#"{ "sample_rate": 3.0 }"#).is_err());
    assert!(MetricsConfig::from_json_str("not json").is_err());
}

#[test]
fn test_web_vital_thresholds() {
    let cfg = MetricsConfig::default();
    let lookup = |name| cfg.threshold_for(name, MetricCategory::WebVital);
    assert_eq!(lookup(names::FIRST_INPUT_DELAY), Some(100.0));
    assert_eq!(lookup(names::CUMULATIVE_LAYOUT_SHIFT), Some(0.1));
    assert_eq!(lookup(names::FIRST_CONTENTFUL_PAINT), Some(1800.0));
    assert_eq!(lookup(names::TIME_TO_FIRST_BYTE), Some(800.0));
    assert_eq!(lookup("unknown-vital"), None);
}

#[test]
fn test_load_thresholds() {
    let cfg = MetricsConfig::default();
    assert_eq!(
        cfg.threshold_for(names::BUNDLE_LOAD, MetricCategory::Load),
        Some(1000.0)
    );
    assert_eq!(
        cfg.threshold_for(names::IMAGE_LOAD, MetricCategory::Load),
        Some(2000.0)
    );
    assert_eq!(
        cfg.threshold_for(names::PAGE_LOAD, MetricCategory::Load),
        None
    );
}
