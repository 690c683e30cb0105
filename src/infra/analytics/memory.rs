//! In-memory analytics collaborator.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{AnalyticsSink, EngineError};
use crate::util::clock::now_ms;
use crate::util::serde::{Metric, MetricCategory};

/// Bounded in-memory analytics buffer for development and testing.
/// The oldest observation is evicted when full.
pub struct InMemoryAnalytics {
    metrics: Mutex<VecDeque<Metric>>,
    max_metrics: usize,
}

impl InMemoryAnalytics {
    /// Create a buffer holding at most `max_metrics` observations.
    pub fn new(max_metrics: usize) -> Self {
        Self {
            metrics: Mutex::new(VecDeque::with_capacity(max_metrics.min(1024))),
            max_metrics,
        }
    }

    /// Snapshot of buffered observations, oldest first.
    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics.lock().iter().cloned().collect()
    }

    /// Buffered observations with the given name.
    pub fn named(&self, name: &str) -> Vec<Metric> {
        self.metrics
            .lock()
            .iter()
            .filter(|m| m.name == name)
            .cloned()
            .collect()
    }
}

impl AnalyticsSink for InMemoryAnalytics {
    fn send(&self, name: &str, value: f64, category: MetricCategory) -> Result<(), EngineError> {
        let mut metrics = self.metrics.lock();
        if metrics.len() >= self.max_metrics {
            metrics.pop_front();
        }
        metrics.push_back(Metric {
            name: name.to_string(),
            value,
            category,
            timestamp_ms: now_ms(),
        });
        Ok(())
    }
}
