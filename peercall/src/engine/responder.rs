//! Answering inbound requests.
//!
//! # Invocation checks
//!
//! Run in this order; the first failure is sent back as a
//! [`Envelope::Failure`] and nothing is executed:
//!
//! 1. target path resolves to a live target
//! 2. target is not the engine itself
//! 3. target declares remote procedures at all
//! 4. method is remotely callable
//! 5. authority-only methods come from the target's authority
//! 6. the hosting peer calls itself only when `call_local` allows it
//!
//! Errors raised by the procedure itself become `ExecutionFailed`.

use crate::engine::CorrelationEngine;
use crate::error::InvocationError;
use crate::id::{PeerId, RequestId};
use crate::invocation::ProcedureRef;
use crate::messaging::{Envelope, MessageCarrier, MessageCodec, Payload};
use crate::providers::Providers;
use std::rc::Rc;

impl<P, C> CorrelationEngine<P, C>
where
    P: Providers,
    C: MessageCodec,
{
    pub(crate) async fn respond_to_message(
        self: Rc<Self>,
        sender: PeerId,
        id: RequestId,
        payload: Payload,
    ) {
        let mut carrier = MessageCarrier::new(sender, id, payload);
        self.listeners.dispatch(&mut carrier).await;

        let value = carrier.into_result();
        tracing::debug!(request_id = %id, to = %sender, "answering message");
        self.stats.borrow_mut().messages_answered += 1;
        self.send_response(sender, Envelope::Success { id, value });
    }

    pub(crate) async fn respond_to_invocation(
        self: Rc<Self>,
        sender: PeerId,
        id: RequestId,
        method: String,
        target_path: String,
        args: Vec<Payload>,
    ) {
        let procedure = ProcedureRef::new(target_path, method).with_args(args);

        let envelope = match self.invoke(sender, procedure).await {
            Ok(value) => {
                self.stats.borrow_mut().invocations_answered += 1;
                Envelope::Success { id, value }
            }
            Err(error) => {
                tracing::error!(
                    request_id = %id,
                    from = %sender,
                    error = %error,
                    "rejecting invocation"
                );
                self.stats.borrow_mut().record_rejection(error.kind());
                Envelope::Failure { id, error }
            }
        };

        self.send_response(sender, envelope);
    }

    async fn invoke(
        &self,
        caller: PeerId,
        procedure: ProcedureRef,
    ) -> Result<Payload, InvocationError> {
        let ProcedureRef {
            target_path,
            method,
            args,
        } = procedure;

        let target = self
            .resolver
            .resolve(&target_path)
            .ok_or_else(|| InvocationError::TargetNotFound {
                path: target_path.clone(),
            })?;

        if target.path() == self.config().engine_path {
            return Err(InvocationError::RecursiveCallBlocked { path: target_path });
        }

        let rpc = target
            .rpc_table()
            .ok_or_else(|| InvocationError::NoScriptAtTarget {
                path: target_path.clone(),
            })?;

        rpc.authorize(
            &method,
            &target_path,
            caller,
            self.local_peer(),
            target.authority(),
        )?;

        tracing::debug!(
            path = %target_path,
            method = %method,
            caller = %caller,
            args = args.len(),
            "invoking procedure"
        );

        target
            .call(&method, args)
            .await
            .map_err(|e| InvocationError::ExecutionFailed {
                method,
                reason: e.to_string(),
            })
    }
}
