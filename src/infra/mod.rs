//! Infrastructure adapters: analytics collaborators, diagnostic logs, and platforms.

pub mod analytics;
pub mod diagnostics;
pub mod platform;

pub use analytics::{ChannelAnalytics, InMemoryAnalytics};
pub use diagnostics::InMemoryDiagnostics;
pub use platform::ManualPlatform;
