//! Diagnostic log backends.

pub mod memory;

pub use memory::InMemoryDiagnostics;
