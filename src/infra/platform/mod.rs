//! Platform adapters.

pub mod manual;

pub use manual::ManualPlatform;
