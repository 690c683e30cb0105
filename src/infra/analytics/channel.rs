//! Channel hand-off to an asynchronous telemetry pipeline.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::core::{AnalyticsSink, EngineError};
use crate::util::clock::now_ms;
use crate::util::serde::{Metric, MetricCategory};

/// Forwards observations into a bounded channel without waiting.
///
/// The receiving task batches and transmits at its own pace. A full or
/// closed channel is reported as an error, which the sink logs and drops.
#[derive(Clone)]
pub struct ChannelAnalytics {
    tx: mpsc::Sender<Metric>,
}

impl ChannelAnalytics {
    /// Create the sender half and the receiver the pipeline drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Metric>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelAnalytics {
    fn send(&self, name: &str, value: f64, category: MetricCategory) -> Result<(), EngineError> {
        let metric = Metric {
            name: name.to_string(),
            value,
            category,
            timestamp_ms: now_ms(),
        };
        self.tx.try_send(metric).map_err(|e| match e {
            TrySendError::Full(m) => {
                EngineError::Analytics(format!("pipeline full, dropped {}", m.name))
            }
            TrySendError::Closed(m) => {
                EngineError::Analytics(format!("pipeline closed, dropped {}", m.name))
            }
        })
    }
}
