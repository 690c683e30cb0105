//! Configuration registry: budgets, thresholds, and toggles.

pub mod metrics;

pub use metrics::{
    BundleSizeBudget, Environment, FeatureToggles, MemoryBudget, MetricsConfig, WarningThresholds,
    WebVitalBudgets,
};
