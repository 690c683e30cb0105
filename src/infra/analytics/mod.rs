//! Analytics collaborators.

pub mod channel;
pub mod memory;

pub use channel::ChannelAnalytics;
pub use memory::InMemoryAnalytics;
