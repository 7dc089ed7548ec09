//! Common imports for building on the correlation engine.

pub use crate::config::EngineConfig;
pub use crate::correlation::{Outcome, Reply};
pub use crate::engine::{CorrelationEngine, EngineBuilder, EngineStats, RequestOptions};
pub use crate::error::{InvocationError, InvocationErrorKind, PeerCallError, ProcedureError};
pub use crate::id::{PeerId, RequestId};
pub use crate::invocation::{
    ProcedureHost, ProcedureRef, ProcedureTable, RemoteTarget, RpcConfig, RpcMode,
    TargetRegistry, TargetResolver,
};
pub use crate::messaging::{MemoryNetwork, MessageCarrier, MessageListener, Payload, Transport};

pub use async_trait::async_trait;
pub use std::rc::Rc;
pub use std::time::Duration;
