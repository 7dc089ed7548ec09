//! Targets of remote invocations and how paths resolve to them.
//!
//! # Architecture
//!
//! ```text
//! Invocation { target_path, method, args }
//!   ↓
//! TargetResolver::resolve(target_path) → Rc<dyn RemoteTarget>
//!   ↓
//! RemoteTarget::rpc_table()            → access control (see access.rs)
//!   ↓
//! RemoteTarget::call(method, args)     → Payload
//! ```
//!
//! [`ProcedureHost`] is the stock target: a path, an authority and a
//! [`ProcedureTable`] mapping method names to async handlers.
//! [`TargetRegistry`] is the stock resolver.

use crate::error::ProcedureError;
use crate::id::PeerId;
use crate::invocation::{RpcConfig, RpcTable};
use crate::messaging::Payload;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// A live object that may receive remote invocations.
#[async_trait(?Send)]
pub trait RemoteTarget {
    /// Path this target is registered under.
    fn path(&self) -> &str;

    /// Peer allowed to call authority-only methods.
    fn authority(&self) -> PeerId {
        PeerId::AUTHORITY
    }

    /// Remote-procedure declarations; `None` if the target declares none.
    fn rpc_table(&self) -> Option<&RpcTable>;

    /// Run `method` with `args`. May suspend.
    async fn call(&self, method: &str, args: Vec<Payload>) -> Result<Payload, ProcedureError>;
}

/// Maps a path to a live target.
pub trait TargetResolver {
    /// Look up the target at `path`.
    fn resolve(&self, path: &str) -> Option<Rc<dyn RemoteTarget>>;
}

/// Future produced by a type-erased procedure.
type ProcedureFuture = Pin<Box<dyn Future<Output = Result<Payload, ProcedureError>>>>;

/// Type-erased procedure: bound arguments in, boxed future out.
type ProcedureFn = Box<dyn Fn(Vec<Payload>) -> ProcedureFuture>;

/// Method implementations of a target, with their remote-call declarations.
///
/// # Example
///
/// ```rust,ignore
/// let mut procedures = ProcedureTable::new();
/// procedures.register_typed("add", RpcConfig::any_peer(), |(a, b): (i64, i64)| async move {
///     Ok(a + b)
/// });
/// ```
#[derive(Default)]
pub struct ProcedureTable {
    rpc: RpcTable,
    handlers: HashMap<String, ProcedureFn>,
}

impl ProcedureTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a method's access rules without implementing it.
    pub fn declare(&mut self, method: impl Into<String>, config: RpcConfig) -> &mut Self {
        self.rpc.declare(method, config);
        self
    }

    /// Register a handler working on raw payloads.
    pub fn register<F, Fut>(
        &mut self,
        method: impl Into<String>,
        config: RpcConfig,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Vec<Payload>) -> Fut + 'static,
        Fut: Future<Output = Result<Payload, ProcedureError>> + 'static,
    {
        let method = method.into();
        tracing::debug!("Registering procedure '{}' ({:?})", method, config.mode);

        self.rpc.declare(method.clone(), config);
        let erased: ProcedureFn =
            Box::new(move |args: Vec<Payload>| -> ProcedureFuture { Box::pin(handler(args)) });
        self.handlers.insert(method, erased);
        self
    }

    /// Register a handler with typed arguments and result.
    ///
    /// The bound arguments are decoded as a sequence into `Args` (a tuple, or
    /// a `Vec`), and the result is encoded back into a [`Payload`]. Use a
    /// one-element tuple `(T,)` for single-argument methods.
    pub fn register_typed<Args, Res, F, Fut>(
        &mut self,
        method: impl Into<String>,
        config: RpcConfig,
        handler: F,
    ) -> &mut Self
    where
        Args: DeserializeOwned + 'static,
        Res: Serialize + 'static,
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Result<Res, ProcedureError>> + 'static,
    {
        let method = method.into();
        let name = method.clone();
        let handler = Rc::new(handler);

        self.register(method, config, move |args: Vec<Payload>| {
            let name = name.clone();
            let handler = handler.clone();
            async move {
                // 1. Decode the argument list
                let list = Value::Array(args.into_iter().map(Payload::into_value).collect());
                let args: Args =
                    serde_json::from_value(list).map_err(|e| ProcedureError::InvalidArguments {
                        method: name.clone(),
                        reason: e.to_string(),
                    })?;

                // 2. Run the handler
                let result = handler(args).await?;

                // 3. Encode the result
                Payload::encode(&result).map_err(|e| {
                    ProcedureError::Failed(format!("failed to encode result of {}: {}", name, e))
                })
            }
        })
    }

    /// Remote-call declarations.
    pub fn rpc_table(&self) -> &RpcTable {
        &self.rpc
    }

    /// Check if `method` has an implementation.
    pub fn has_handler(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Run `method`.
    pub async fn call(&self, method: &str, args: Vec<Payload>) -> Result<Payload, ProcedureError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| ProcedureError::UnknownMethod(method.to_string()))?;

        handler(args).await
    }
}

/// Stock [`RemoteTarget`]: a path, an authority and optional procedures.
pub struct ProcedureHost {
    path: String,
    authority: Cell<PeerId>,
    procedures: Option<ProcedureTable>,
}

impl ProcedureHost {
    /// A target that declares no remote procedures at all.
    pub fn bare(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            authority: Cell::new(PeerId::AUTHORITY),
            procedures: None,
        }
    }

    /// A target exposing `procedures`.
    pub fn new(path: impl Into<String>, procedures: ProcedureTable) -> Self {
        Self {
            path: path.into(),
            authority: Cell::new(PeerId::AUTHORITY),
            procedures: Some(procedures),
        }
    }

    /// Builder-style authority override.
    pub fn with_authority(self, authority: PeerId) -> Self {
        self.authority.set(authority);
        self
    }

    /// Hand authority over to another peer.
    pub fn set_authority(&self, authority: PeerId) {
        self.authority.set(authority);
    }
}

#[async_trait(?Send)]
impl RemoteTarget for ProcedureHost {
    fn path(&self) -> &str {
        &self.path
    }

    fn authority(&self) -> PeerId {
        self.authority.get()
    }

    fn rpc_table(&self) -> Option<&RpcTable> {
        self.procedures.as_ref().map(ProcedureTable::rpc_table)
    }

    async fn call(&self, method: &str, args: Vec<Payload>) -> Result<Payload, ProcedureError> {
        match &self.procedures {
            Some(procedures) => procedures.call(method, args).await,
            None => Err(ProcedureError::UnknownMethod(method.to_string())),
        }
    }
}

/// In-memory [`TargetResolver`] keyed by target path.
#[derive(Default)]
pub struct TargetRegistry {
    targets: RefCell<HashMap<String, Rc<dyn RemoteTarget>>>,
}

impl TargetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target under its own path, replacing any previous one.
    pub fn add(&self, target: Rc<dyn RemoteTarget>) {
        let path = target.path().to_string();
        tracing::debug!(path = %path, "target added");
        self.targets.borrow_mut().insert(path, target);
    }

    /// Remove the target at `path`. Returns it if it was present.
    pub fn remove(&self, path: &str) -> Option<Rc<dyn RemoteTarget>> {
        self.targets.borrow_mut().remove(path)
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.borrow().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.borrow().is_empty()
    }
}

impl TargetResolver for TargetRegistry {
    fn resolve(&self, path: &str) -> Option<Rc<dyn RemoteTarget>> {
        self.targets.borrow().get(path).cloned()
    }
}
