//! Remote-procedure access control.
//!
//! A target that accepts remote calls declares, per method, an [`RpcConfig`]:
//! who may call it ([`RpcMode`]) and whether the peer hosting the target may
//! call it on itself. Methods that are not declared are [`RpcMode::Disabled`].

use crate::error::InvocationError;
use crate::id::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Who may invoke a method remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RpcMode {
    /// Not remotely callable.
    #[default]
    Disabled,

    /// Any peer may call.
    AnyPeer,

    /// Only the target's authority may call.
    AuthorityOnly,
}

/// Remote-call declaration of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Access-control mode.
    pub mode: RpcMode,

    /// Whether the peer hosting the target may invoke the method on itself.
    pub call_local: bool,
}

impl RpcConfig {
    /// Callable by any peer, but not by the hosting peer itself.
    pub fn any_peer() -> Self {
        Self {
            mode: RpcMode::AnyPeer,
            call_local: false,
        }
    }

    /// Callable only by the target's authority.
    pub fn authority_only() -> Self {
        Self {
            mode: RpcMode::AuthorityOnly,
            call_local: false,
        }
    }

    /// Also allow the hosting peer to call.
    pub fn call_local(mut self) -> Self {
        self.call_local = true;
        self
    }
}

/// Per-method remote-call declarations of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcTable {
    methods: BTreeMap<String, RpcConfig>,
}

impl RpcTable {
    /// Create an empty table: every method is disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a method. Redeclaring replaces the previous config.
    pub fn declare(&mut self, method: impl Into<String>, config: RpcConfig) -> &mut Self {
        self.methods.insert(method.into(), config);
        self
    }

    /// Config of `method`; undeclared methods are disabled.
    pub fn config_for(&self, method: &str) -> RpcConfig {
        self.methods.get(method).copied().unwrap_or_default()
    }

    /// Declared method names, sorted.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Check a call of `method` by `caller` against this table.
    ///
    /// Checks run in order: mode disabled, authority, call-locality.
    ///
    /// # Parameters
    ///
    /// - `path`: target path, for error context only
    /// - `caller`: peer that sent the invocation
    /// - `local`: peer hosting the target
    /// - `authority`: the target's designated authority
    pub fn authorize(
        &self,
        method: &str,
        path: &str,
        caller: PeerId,
        local: PeerId,
        authority: PeerId,
    ) -> Result<RpcConfig, InvocationError> {
        let config = self.config_for(method);

        match config.mode {
            RpcMode::Disabled => {
                return Err(InvocationError::MethodNotRemote {
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
            RpcMode::AuthorityOnly if caller != authority => {
                return Err(InvocationError::AccessDenied {
                    method: method.to_string(),
                    caller,
                    authority,
                });
            }
            RpcMode::AuthorityOnly | RpcMode::AnyPeer => {}
        }

        if !config.call_local && caller == local {
            return Err(InvocationError::CallLocalViolation {
                method: method.to_string(),
            });
        }

        Ok(config)
    }
}
