//! Runtime adapters for the host event loop.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
