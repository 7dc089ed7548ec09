//! Remote procedure invocation: descriptors, targets and access control.

pub mod access;
pub mod procedure;
pub mod target;

// Re-exports
pub use access::{RpcConfig, RpcMode, RpcTable};
pub use procedure::ProcedureRef;
pub use target::{ProcedureHost, ProcedureTable, RemoteTarget, TargetRegistry, TargetResolver};
