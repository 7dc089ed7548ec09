//! Error types for the peercall correlation engine.

use crate::id::PeerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an inbound invocation is refused or fails on the responder.
///
/// These travel back to the requester inside a failure envelope, so they are
/// serializable. The requester never receives them as a `Result`: it gets its
/// fallback value and the error is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvocationError {
    /// No live target is registered at the requested path.
    #[error("target not found: {path}")]
    TargetNotFound {
        /// Requested target path.
        path: String,
    },

    /// The target resolved to the correlation engine itself.
    #[error("recursive call blocked: {path} is the correlation engine")]
    RecursiveCallBlocked {
        /// Requested target path.
        path: String,
    },

    /// The target exposes no remote-procedure metadata.
    #[error("no remote procedures declared at {path}")]
    NoScriptAtTarget {
        /// Requested target path.
        path: String,
    },

    /// The method is not declared for remote use (or not declared at all).
    #[error("method '{method}' on {path} is not remotely callable")]
    MethodNotRemote {
        /// Requested method.
        method: String,
        /// Path of the target.
        path: String,
    },

    /// The method is authority-only and the caller is not the authority.
    #[error("access denied: '{method}' is authority-only ({caller} is not {authority})")]
    AccessDenied {
        /// Requested method.
        method: String,
        /// Peer that sent the invocation.
        caller: PeerId,
        /// The target's authority.
        authority: PeerId,
    },

    /// The caller is the local peer and the method is not marked call-local.
    #[error("'{method}' may not be called by the peer that hosts it")]
    CallLocalViolation {
        /// Requested method.
        method: String,
    },

    /// Validation passed but the procedure itself failed.
    #[error("'{method}' failed: {reason}")]
    ExecutionFailed {
        /// Method that ran.
        method: String,
        /// The procedure's error message.
        reason: String,
    },
}

impl InvocationError {
    /// The kind of this error, without its context.
    pub fn kind(&self) -> InvocationErrorKind {
        match self {
            InvocationError::TargetNotFound { .. } => InvocationErrorKind::TargetNotFound,
            InvocationError::RecursiveCallBlocked { .. } => {
                InvocationErrorKind::RecursiveCallBlocked
            }
            InvocationError::NoScriptAtTarget { .. } => InvocationErrorKind::NoScriptAtTarget,
            InvocationError::MethodNotRemote { .. } => InvocationErrorKind::MethodNotRemote,
            InvocationError::AccessDenied { .. } => InvocationErrorKind::AccessDenied,
            InvocationError::CallLocalViolation { .. } => InvocationErrorKind::CallLocalViolation,
            InvocationError::ExecutionFailed { .. } => InvocationErrorKind::ExecutionFailed,
        }
    }
}

/// Context-free discriminant of [`InvocationError`], used for counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvocationErrorKind {
    /// See [`InvocationError::TargetNotFound`].
    TargetNotFound,
    /// See [`InvocationError::RecursiveCallBlocked`].
    RecursiveCallBlocked,
    /// See [`InvocationError::NoScriptAtTarget`].
    NoScriptAtTarget,
    /// See [`InvocationError::MethodNotRemote`].
    MethodNotRemote,
    /// See [`InvocationError::AccessDenied`].
    AccessDenied,
    /// See [`InvocationError::CallLocalViolation`].
    CallLocalViolation,
    /// See [`InvocationError::ExecutionFailed`].
    ExecutionFailed,
}

/// Errors raised by a procedure implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcedureError {
    /// The target declares the method but has no implementation for it.
    #[error("no implementation for method '{0}'")]
    UnknownMethod(String),

    /// The bound arguments could not be decoded into the handler's types.
    #[error("invalid arguments for '{method}': {reason}")]
    InvalidArguments {
        /// Method being called.
        method: String,
        /// Decoder error message.
        reason: String,
    },

    /// The handler ran and reported a failure.
    #[error("{0}")]
    Failed(String),
}

/// Errors from the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The destination peer has never joined the network.
    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// The destination peer left the network or stopped receiving.
    #[error("peer disconnected: {0}")]
    Disconnected(PeerId),

    /// This transport has been closed.
    #[error("transport closed")]
    Closed,
}

/// Errors from encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to encode an envelope to bytes.
    #[error("encode error: {0}")]
    Encode(#[source] Box<dyn std::error::Error>),

    /// Failed to decode bytes to an envelope.
    #[error("decode error: {0}")]
    Decode(#[source] Box<dyn std::error::Error>),
}

/// Errors related to engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The sweeper would spin without yielding.
    #[error("sweep_interval must be greater than zero")]
    ZeroSweepInterval,

    /// The engine needs a path so it can recognise calls addressed to itself.
    #[error("engine_path cannot be empty")]
    EmptyEnginePath,

    /// The builder was not given a transport.
    #[error("a transport is required to build an engine")]
    MissingTransport,

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for fallible operations of this crate.
#[derive(Debug, Error)]
pub enum PeerCallError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Procedure error.
    #[error("procedure error: {0}")]
    Procedure(#[from] ProcedureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_error_display() {
        let err = InvocationError::AccessDenied {
            method: "kick".to_string(),
            caller: PeerId::new(3),
            authority: PeerId::new(1),
        };
        assert_eq!(
            err.to_string(),
            "access denied: 'kick' is authority-only (peer#3 is not peer#1)"
        );
        assert_eq!(err.kind(), InvocationErrorKind::AccessDenied);
    }

    #[test]
    fn test_invocation_error_travels_over_the_wire() {
        let err = InvocationError::NoScriptAtTarget {
            path: "/root/level/door".to_string(),
        };
        let bytes = serde_json::to_vec(&err).unwrap();
        let decoded: InvocationError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, err);
    }

    #[test]
    fn test_umbrella_conversions() {
        let err: PeerCallError = TransportError::UnknownPeer(PeerId::new(9)).into();
        assert!(matches!(err, PeerCallError::Transport(_)));

        let err: PeerCallError = ConfigError::ZeroSweepInterval.into();
        assert_eq!(
            err.to_string(),
            "configuration error: sweep_interval must be greater than zero"
        );
    }
}
