//! Serializable data types shared across the engine.

use serde::{Deserialize, Serialize};

/// Identifier of a declared deferred unit.
pub type UnitId = u64;

/// Loading priority of a deferred unit.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Fetched only when mounted.
    Low,
    /// Fetched only when mounted.
    Medium,
    /// Fetched eagerly in the background at declaration time.
    High,
}

/// Category of a metric observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Component render durations.
    Render,
    /// Chunk, image, and page load durations.
    Load,
    /// Network and API response durations.
    Network,
    /// Heap sizes in megabytes.
    Memory,
    /// Core web vitals.
    WebVital,
}

/// A single timestamped observation.
///
/// Metrics form an append-only stream; nothing mutates a metric after it
/// has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, see [`names`].
    pub name: String,
    /// Non-negative duration in milliseconds, ratio, or size in megabytes.
    pub value: f64,
    /// Category of the observation.
    pub category: MetricCategory,
    /// Milliseconds since the Unix epoch at which the value was observed.
    pub timestamp_ms: u128,
}

/// Well-known metric names emitted by the observation bridge.
pub mod names {
    /// Time from request start to first response byte.
    pub const TIME_TO_FIRST_BYTE: &str = "time-to-first-byte";
    /// First contentful paint.
    pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";
    /// Largest contentful paint.
    pub const LARGEST_CONTENTFUL_PAINT: &str = "largest-contentful-paint";
    /// Running layout-shift total, excluding input-driven shifts.
    pub const CUMULATIVE_LAYOUT_SHIFT: &str = "cumulative-layout-shift";
    /// Delay between first input and its processing.
    pub const FIRST_INPUT_DELAY: &str = "first-input-delay";
    /// Script bundle download duration.
    pub const BUNDLE_LOAD: &str = "bundle-load";
    /// Image download duration.
    pub const IMAGE_LOAD: &str = "image-load";
    /// Component render duration.
    pub const COMPONENT_RENDER: &str = "component-render";
    /// API round trip duration.
    pub const API_RESPONSE: &str = "api-response";
    /// DOMContentLoaded relative to navigation start.
    pub const DOM_CONTENT_LOADED: &str = "dom-content-loaded";
    /// Load event end relative to navigation start.
    pub const PAGE_LOAD: &str = "page-load";
    /// Used heap in megabytes.
    pub const HEAP_USED: &str = "heap-used";
    /// Total heap in megabytes.
    pub const HEAP_TOTAL: &str = "heap-total";
}
