//! Tests for analytics collaborators

use adaptive_vitals::core::AnalyticsSink;
use adaptive_vitals::infra::InMemoryAnalytics;
use adaptive_vitals::util::MetricCategory;

#[test]
fn test_in_memory_analytics() {
    let analytics = InMemoryAnalytics::new(10);
    analytics.send("bundle-load", 320.0, MetricCategory::Load).unwrap();

    let metrics = analytics.metrics();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].name, "bundle-load");
    assert_eq!(metrics[0].category, MetricCategory::Load);
    assert!(metrics[0].timestamp_ms > 0);
}

#[test]
fn test_in_memory_analytics_overflow() {
    let analytics = InMemoryAnalytics::new(2);
    analytics.send("a", 1.0, MetricCategory::Load).unwrap();
    analytics.send("b", 2.0, MetricCategory::Load).unwrap();
    analytics.send("c", 3.0, MetricCategory::Load).unwrap();

    let metrics = analytics.metrics();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].name, "b"); // First one popped
    assert_eq!(metrics[1].name, "c");
}

#[test]
fn test_named_filter() {
    let analytics = InMemoryAnalytics::new(10);
    analytics.send("a", 1.0, MetricCategory::Load).unwrap();
    analytics.send("b", 2.0, MetricCategory::Load).unwrap();
    analytics.send("a", 3.0, MetricCategory::Load).unwrap();
    assert_eq!(analytics.named("a").len(), 2);
}
