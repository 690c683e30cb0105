//! Metric budgets, thresholds, and feature toggles.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::EngineError;
use crate::util::serde::{names, MetricCategory};

/// Execution environment the configuration was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development: everything observed, nothing sampled away.
    Development,
    /// Production: collection opt-in, sampled.
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

/// Warning thresholds in milliseconds for non-vital timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningThresholds {
    /// One frame at 60 fps.
    pub component_render_ms: f64,
    /// Lazy chunk download.
    pub chunk_load_ms: f64,
    /// API round trip.
    pub api_response_ms: f64,
    /// Image download.
    pub image_load_ms: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            component_render_ms: 16.0,
            chunk_load_ms: 1000.0,
            api_response_ms: 500.0,
            image_load_ms: 2000.0,
        }
    }
}

/// Core web vital budgets. CLS is unitless, the rest are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebVitalBudgets {
    /// Largest contentful paint.
    pub lcp_ms: f64,
    /// First input delay.
    pub fid_ms: f64,
    /// Cumulative layout shift.
    pub cls: f64,
    /// First contentful paint.
    pub fcp_ms: f64,
    /// Time to first byte.
    pub ttfb_ms: f64,
}

impl Default for WebVitalBudgets {
    fn default() -> Self {
        Self {
            lcp_ms: 2500.0,
            fid_ms: 100.0,
            cls: 0.1,
            fcp_ms: 1800.0,
            ttfb_ms: 800.0,
        }
    }
}

/// Bundle size ceilings in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleSizeBudget {
    /// Largest acceptable transferred size of a single script chunk.
    pub max_chunk_bytes: u64,
}

impl Default for BundleSizeBudget {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 250_000,
        }
    }
}

/// Heap sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryBudget {
    /// Seconds between heap samples.
    pub sample_interval_secs: u64,
    /// Used-heap size above which a high memory warning is emitted.
    pub high_usage_mb: f64,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self {
            sample_interval_secs: 30,
            high_usage_mb: 100.0,
        }
    }
}

/// Feature toggles for the loading scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// When false every declared unit is fetched immediately.
    pub lazy_loading: bool,
    /// When false high priority units wait for a mount like the others.
    pub prefetch_high_priority: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            lazy_loading: true,
            prefetch_high_priority: true,
        }
    }
}

/// Immutable engine configuration.
///
/// Resolved once at startup and shared by reference (`Arc<MetricsConfig>`)
/// with every component; nothing reads the environment afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Environment the values were resolved for.
    pub environment: Environment,
    /// Master switch for the metric sink.
    pub enable_metrics: bool,
    /// Probability in `[0, 1]` that an observation is kept.
    pub sample_rate: f64,
    /// Non-vital warning thresholds.
    pub warning_thresholds: WarningThresholds,
    /// Core web vital budgets.
    pub web_vital_budgets: WebVitalBudgets,
    /// Bundle size ceilings.
    pub bundle_size: BundleSizeBudget,
    /// Heap sampling settings.
    pub memory: MemoryBudget,
    /// Scheduler toggles.
    pub features: FeatureToggles,
    /// Timer tick used for background fetches when no idle primitive exists.
    pub idle_fallback_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

impl MetricsConfig {
    /// Defaults for the given environment.
    pub fn for_environment(environment: Environment) -> Self {
        let production = environment == Environment::Production;
        Self {
            environment,
            enable_metrics: !production,
            sample_rate: if production { 0.1 } else { 1.0 },
            warning_thresholds: WarningThresholds::default(),
            web_vital_budgets: WebVitalBudgets::default(),
            bundle_size: BundleSizeBudget::default(),
            memory: MemoryBudget::default(),
            features: FeatureToggles::default(),
            idle_fallback_ms: 1,
        }
    }

    /// Resolve configuration from the process environment.
    ///
    /// Loads `.env` (if present) first. Recognized variables are `APP_ENV`,
    /// `ENABLE_METRICS`, `METRICS_SAMPLE_RATE`, and `MAX_CHUNK_BYTES`.
    pub fn resolve() -> Result<Self, EngineError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(target: "adaptive_vitals", "no .env loaded: {e}");
        }
        Self::resolve_from(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn resolve_from<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value).map_err(EngineError::Config)?,
            None => Environment::Development,
        };
        let mut cfg = Self::for_environment(environment);

        if let Some(value) = lookup("ENABLE_METRICS") {
            cfg.enable_metrics = parse_bool(&value).ok_or_else(|| {
                EngineError::Config(format!("ENABLE_METRICS: `{value}` is not a bool"))
            })?;
        }
        if let Some(value) = lookup("METRICS_SAMPLE_RATE") {
            cfg.sample_rate = value
                .trim()
                .parse()
                .map_err(|e| EngineError::Config(format!("METRICS_SAMPLE_RATE: {e}")))?;
        }
        if let Some(value) = lookup("MAX_CHUNK_BYTES") {
            cfg.bundle_size.max_chunk_bytes = value
                .trim()
                .parse()
                .map_err(|e| EngineError::Config(format!("MAX_CHUNK_BYTES: {e}")))?;
        }

        cfg.validate().map_err(EngineError::Config)?;
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(format!("sample_rate must be within [0, 1], got {}", self.sample_rate));
        }
        let t = &self.warning_thresholds;
        let v = &self.web_vital_budgets;
        for (name, value) in [
            ("component_render_ms", t.component_render_ms),
            ("chunk_load_ms", t.chunk_load_ms),
            ("api_response_ms", t.api_response_ms),
            ("image_load_ms", t.image_load_ms),
            ("lcp_ms", v.lcp_ms),
            ("fid_ms", v.fid_ms),
            ("cls", v.cls),
            ("fcp_ms", v.fcp_ms),
            ("ttfb_ms", v.ttfb_ms),
            ("high_usage_mb", self.memory.high_usage_mb),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
        if self.bundle_size.max_chunk_bytes == 0 {
            return Err("max_chunk_bytes must be greater than 0".into());
        }
        if self.memory.sample_interval_secs == 0 {
            return Err("sample_interval_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Threshold for a metric, looked up by name and then by category.
    pub fn threshold_for(&self, name: &str, category: MetricCategory) -> Option<f64> {
        let t = &self.warning_thresholds;
        let v = &self.web_vital_budgets;
        let by_name = match name {
            names::LARGEST_CONTENTFUL_PAINT => Some(v.lcp_ms),
            names::FIRST_INPUT_DELAY => Some(v.fid_ms),
            names::CUMULATIVE_LAYOUT_SHIFT => Some(v.cls),
            names::FIRST_CONTENTFUL_PAINT => Some(v.fcp_ms),
            names::TIME_TO_FIRST_BYTE => Some(v.ttfb_ms),
            names::COMPONENT_RENDER => Some(t.component_render_ms),
            names::BUNDLE_LOAD => Some(t.chunk_load_ms),
            names::API_RESPONSE => Some(t.api_response_ms),
            names::IMAGE_LOAD => Some(t.image_load_ms),
            _ => None,
        };
        by_name.or(match category {
            MetricCategory::Render => Some(t.component_render_ms),
            MetricCategory::Network => Some(t.api_response_ms),
            MetricCategory::Load | MetricCategory::Memory | MetricCategory::WebVital => None,
        })
    }

    /// Heap sampling period.
    pub const fn heap_sample_interval(&self) -> Duration {
        Duration::from_secs(self.memory.sample_interval_secs)
    }

    /// Fallback delay for background fetches.
    pub const fn idle_fallback(&self) -> Duration {
        Duration::from_millis(self.idle_fallback_ms)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
