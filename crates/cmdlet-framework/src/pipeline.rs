//! # Invocation Pipeline
//!
//! [`Invoker`] runs an [`Operation`] end to end:
//!
//! 1. resolve and validate the selector (before anything leaves the process),
//! 2. ask the confirmation gate when the operation's impact reaches the
//!    configured threshold and `force` is not set,
//! 3. assemble the request from the frozen context,
//! 4. dispatch it once,
//! 5. project the response into the emitted value.
//!
//! [`execute`] and [`execute_async`] are the bare generic form of steps 3-5
//! for callers that bring their own assemble, call and project functions.

use crate::confirm::{ConfirmImpact, ConfirmRequest, ConfirmationGate};
use crate::context::InvocationContext;
use crate::dispatch::{CancelSignal, Dispatcher};
use crate::error::InvokeError;
use crate::operation::Operation;
use crate::select::Selector;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument};

/// Assemble, call, project.
pub fn execute<P, Req, Resp, Out, E>(
    context: &InvocationContext<P>,
    assemble: impl FnOnce(&P) -> Req,
    call: impl FnOnce(Req) -> Result<Resp, E>,
    project: impl FnOnce(Resp, &P) -> Out,
) -> Result<Out, E> {
    let request = assemble(context.params());
    let response = call(request)?;
    Ok(project(response, context.params()))
}

/// [`execute`] with an asynchronous call.
pub async fn execute_async<P, Req, Resp, Out, E, Fut>(
    context: &InvocationContext<P>,
    assemble: impl FnOnce(&P) -> Req,
    call: impl FnOnce(Req) -> Fut,
    project: impl FnOnce(Resp, &P) -> Out,
) -> Result<Out, E>
where
    Fut: Future<Output = Result<Resp, E>>,
{
    let request = assemble(context.params());
    let response = call(request).await?;
    Ok(project(response, context.params()))
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Emitted(Value),
    /// The confirmation gate declined; nothing was sent.
    Declined,
}

impl Outcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Emitted(v) => Some(v),
            Outcome::Declined => None,
        }
    }
}

/// Runs operations whose client type is `C`.
pub struct Invoker<C: ?Sized> {
    dispatcher: Dispatcher<C>,
    gate: Arc<dyn ConfirmationGate>,
    threshold: ConfirmImpact,
}

impl<C: ?Sized> Clone for Invoker<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            gate: self.gate.clone(),
            threshold: self.threshold,
        }
    }
}

impl<C: ?Sized + Send + Sync> Invoker<C> {
    pub fn new(dispatcher: Dispatcher<C>, gate: Arc<dyn ConfirmationGate>) -> Self {
        Self {
            dispatcher,
            gate,
            threshold: ConfirmImpact::Medium,
        }
    }

    /// Lowest impact that requires confirmation.
    pub fn with_threshold(mut self, threshold: ConfirmImpact) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    #[instrument(name = "invoke", skip_all, fields(operation = O::NAME, service = O::SERVICE))]
    pub async fn invoke<O>(
        &self,
        ctx: &InvocationContext<O::Params>,
        cancel: Option<&CancelSignal>,
    ) -> Result<Outcome, InvokeError>
    where
        O: Operation<Client = C>,
    {
        let selector = match ctx.selector() {
            Some(selector) => {
                selector.validate(&O::schema())?;
                selector.clone()
            }
            None => Selector::parse_for(O::DEFAULT_SELECT, &O::schema())?,
        };
        if ctx.region().is_none() {
            return Err(InvokeError::MissingRegion { operation: O::NAME });
        }

        if self.needs_confirmation::<O>(ctx) {
            let request = ConfirmRequest {
                operation: O::NAME,
                target: O::target(ctx.params()),
                impact: O::IMPACT,
            };
            if !self.gate.confirm(&request) {
                info!(confirm_target = %request.target, "Declined");
                return Ok(Outcome::Declined);
            }
        }

        let request = O::assemble(ctx.params());
        let response = self.dispatcher.dispatch::<O>(ctx, request, cancel).await?;
        let value = selector.project(O::NAME, &response, ctx.params())?;
        Ok(Outcome::Emitted(value))
    }

    /// [`invoke`](Self::invoke) on a private current-thread runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn invoke_blocking<O>(
        &self,
        ctx: &InvocationContext<O::Params>,
    ) -> Result<Outcome, InvokeError>
    where
        O: Operation<Client = C>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.invoke::<O>(ctx, None))
    }

    fn needs_confirmation<O: Operation>(&self, ctx: &InvocationContext<O::Params>) -> bool {
        !ctx.force() && O::IMPACT != ConfirmImpact::None && O::IMPACT >= self.threshold
    }
}
