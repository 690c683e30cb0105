//! Tests for utility functions

use adaptive_vitals::util::{names, Metric, MetricCategory, Priority};

#[test]
fn test_priority_ordering() {
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
}

#[test]
fn test_priority_serde() {
    let json = serde_json::to_string(&Priority::High).unwrap();
    assert_eq!(json, "\"high\"");
    let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
    assert_eq!(parsed, Priority::Low);
}

#[test]
fn test_metric_serde() {
    let metric = Metric {
        name: names::LARGEST_CONTENTFUL_PAINT.to_string(),
        value: 1234.5,
        category: MetricCategory::WebVital,
        timestamp_ms: 1_700_000_000_000,
    };
    let json = serde_json::to_value(&metric).unwrap();
    assert_eq!(json["category"], "web_vital");
    assert_eq!(json["name"], "largest-contentful-paint");
}
