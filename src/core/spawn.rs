//! Host event-loop seams: task spawning and idle scheduling.

use std::future::Future;

/// Abstraction for spawning background work on the host runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Work queued for an idle period.
pub type IdleJob = Box<dyn FnOnce() + Send + 'static>;

/// Platform idle-scheduling primitive (an idle-callback queue).
///
/// Platforms without one are handled by the scheduler with a short timer tick.
pub trait IdlePlatform: Send + Sync {
    /// Run `job` once the host has no pending higher-priority work.
    fn request_idle(&self, job: IdleJob);
}
