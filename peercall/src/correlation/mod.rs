//! Request/response correlation: completion handles, the pending table and
//! the timeout sweeper.

pub mod completion;
pub mod pending;
pub mod sweeper;

// Re-exports
pub use completion::{Completion, Outcome, Reply};
pub use pending::{Mismatch, PendingEntry, PendingTable};
