//! Runtime providers: clock and task spawning.
//!
//! The engine never calls tokio directly for time or spawning; it goes
//! through a [`Providers`] bundle so both concerns can be swapped together.

pub mod task;
pub mod time;

pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{TimeProvider, TokioTimeProvider};

/// Bundle of the provider types an engine runs on.
pub trait Providers: Clone + 'static {
    /// Time provider type for sleep and monotonic time queries.
    type Time: TimeProvider + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + 'static;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;
}

/// Production providers using the Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioProviders {
    time: TokioTimeProvider,
    task: TokioTaskProvider,
}

impl TokioProviders {
    /// Create a new production providers bundle.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Providers for TokioProviders {
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }
}
