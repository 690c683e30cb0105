//! Error types for engine operations.

use thiserror::Error;

use crate::core::bridge::ObservationKind;
use crate::util::serde::UnitId;

/// Errors produced by engine components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A platform observation primitive is missing.
    #[error("unsupported capability: {0:?}")]
    UnsupportedCapability(ObservationKind),
    /// The platform refused a subscription.
    #[error("subscription failed: {0}")]
    Subscription(String),
    /// Configuration could not be resolved or failed validation.
    #[error("config error: {0}")]
    Config(String),
    /// A deferred unit's loader rejected; the unit is terminally failed.
    #[error("unit {unit} failed to load: {reason}")]
    LoaderFailed {
        /// Unit whose loader failed.
        unit: UnitId,
        /// Rendered loader error.
        reason: String,
    },
    /// The handle does not belong to this scheduler.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    /// The hosting region was disposed before the unit started loading.
    #[error("region disposed before unit {0} started loading")]
    RegionDisposed(UnitId),
    /// The analytics collaborator rejected an observation.
    #[error("analytics error: {0}")]
    Analytics(String),
}

/// Application-facing result used by caller-supplied loaders.
pub type AppResult<T> = Result<T, anyhow::Error>;
