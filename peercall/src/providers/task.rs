//! Task spawning for single-threaded environments.

use std::future::Future;
use tokio::task::JoinHandle;

/// Provider for spawning local tasks.
///
/// Tasks run on the current thread, interleaved with the caller at await
/// points. Nothing spawned here needs to be `Send`.
pub trait TaskProvider: Clone {
    /// Spawn a named task that runs on the current thread.
    fn spawn_task<F>(&self, name: &str, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + 'static;
}

/// Tokio-based task provider using `spawn_local`.
///
/// Must be used from inside a `tokio::task::LocalSet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTaskProvider;

impl TaskProvider for TokioTaskProvider {
    fn spawn_task<F>(&self, name: &str, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + 'static,
    {
        let task_name = name.to_string();
        tokio::task::spawn_local(async move {
            tracing::trace!("Task {} starting", task_name);
            future.await;
            tracing::trace!("Task {} completed", task_name);
        })
    }
}
