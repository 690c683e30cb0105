//! Structured diagnostic channel.
//!
//! Every human-facing note the engine produces is a typed [`Diagnostic`]
//! delivered to an injected [`DiagnosticLog`]. The default [`TracingLog`]
//! maps them onto `tracing` events; tests use
//! [`InMemoryDiagnostics`](crate::infra::diagnostics::InMemoryDiagnostics).

use crate::core::bridge::ObservationKind;
use crate::util::serde::{Metric, UnitId};

/// A diagnostic produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A metric passed sampling and was recorded.
    Observed(Metric),
    /// A recorded metric is strictly above its configured threshold.
    ThresholdExceeded {
        /// The offending observation.
        metric: Metric,
        /// Configured ceiling.
        threshold: f64,
    },
    /// A script bundle transferred more bytes than the chunk budget.
    OversizedBundle {
        /// Resource URL.
        resource: String,
        /// Bytes transferred over the network.
        transfer_bytes: u64,
        /// Configured max chunk size.
        budget_bytes: u64,
    },
    /// Used heap is above the high usage line.
    HighMemory {
        /// Used heap in megabytes.
        used_mb: f64,
        /// Configured line in megabytes.
        limit_mb: f64,
    },
    /// A platform primitive is unavailable; the feature is skipped.
    Unsupported {
        /// Observation that could not be set up.
        kind: ObservationKind,
        /// Why it could not be set up.
        reason: String,
    },
    /// An observation with a negative or non-finite value was dropped.
    InvalidValue {
        /// Metric name.
        name: String,
        /// Rejected value.
        value: f64,
    },
    /// The analytics collaborator failed; the observation was not forwarded.
    AnalyticsFailed(String),
    /// A deferred unit's loader rejected.
    LoaderFailed {
        /// Failed unit.
        unit: UnitId,
        /// Rendered loader error.
        reason: String,
    },
}

/// Destination for engine diagnostics.
///
/// Implementations must not block and must not panic.
pub trait DiagnosticLog: Send + Sync {
    /// Emit one diagnostic.
    fn emit(&self, diagnostic: Diagnostic);
}

/// Diagnostic log backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DiagnosticLog for TracingLog {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Observed(m) => tracing::info!(
                target: "adaptive_vitals",
                name = %m.name,
                value = m.value,
                category = ?m.category,
                "metric recorded"
            ),
            Diagnostic::ThresholdExceeded { metric, threshold } => tracing::warn!(
                target: "adaptive_vitals",
                name = %metric.name,
                value = metric.value,
                threshold,
                "performance threshold exceeded"
            ),
            Diagnostic::OversizedBundle {
                resource,
                transfer_bytes,
                budget_bytes,
            } => tracing::warn!(
                target: "adaptive_vitals",
                %resource,
                transfer_bytes,
                budget_bytes,
                "large bundle detected"
            ),
            Diagnostic::HighMemory { used_mb, limit_mb } => tracing::warn!(
                target: "adaptive_vitals",
                used_mb,
                limit_mb,
                "high memory usage"
            ),
            Diagnostic::Unsupported { kind, reason } => tracing::debug!(
                target: "adaptive_vitals",
                ?kind,
                %reason,
                "observation not supported"
            ),
            Diagnostic::InvalidValue { name, value } => tracing::debug!(
                target: "adaptive_vitals",
                %name,
                value,
                "dropped invalid metric value"
            ),
            Diagnostic::AnalyticsFailed(reason) => tracing::debug!(
                target: "adaptive_vitals",
                %reason,
                "analytics forwarding failed"
            ),
            Diagnostic::LoaderFailed { unit, reason } => tracing::error!(
                target: "adaptive_vitals",
                unit,
                %reason,
                "deferred unit failed to load"
            ),
        }
    }
}
