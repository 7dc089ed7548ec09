//! Bound procedure references.

use crate::messaging::Payload;
use serde::Serialize;
use std::fmt;

/// A method on a target, together with its bound arguments.
///
/// This is a plain descriptor, not a closure: the target is looked up by
/// path through a [`TargetResolver`](crate::invocation::TargetResolver) at the
/// moment of the call, on whichever peer executes it.
///
/// # Example
///
/// ```rust,ignore
/// let open = ProcedureRef::new("/root/level/door", "open").arg(true);
/// let reply = engine.send_invocation(PeerId::new(1), open);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureRef {
    /// Path of the target object.
    pub target_path: String,

    /// Method name on the target.
    pub method: String,

    /// Arguments, in order.
    pub args: Vec<Payload>,
}

impl ProcedureRef {
    /// Reference `method` on the target at `target_path`, with no arguments.
    pub fn new(target_path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, value: impl Into<Payload>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append an argument of any serializable type.
    pub fn encode_arg<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.args.push(Payload::encode(value)?);
        Ok(self)
    }

    /// Replace all arguments.
    pub fn with_args(mut self, args: Vec<Payload>) -> Self {
        self.args = args;
        self
    }
}

impl fmt::Display for ProcedureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}({} args)", self.target_path, self.method, self.args.len())
    }
}
