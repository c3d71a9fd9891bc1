//! # Dispatcher
//!
//! The dispatcher sends one assembled request to the service and returns
//! the response. It resolves the client through the [`ClientCache`], issues
//! exactly one call (no retry) and classifies the failure:
//!
//! - transport failures (name resolution, connect, timeout) become
//!   [`InvokeError::Endpoint`], naming the operation, endpoint and region;
//! - everything else is passed through as [`InvokeError::Service`].
//!
//! Operations marked [`Operation::CANCELLABLE`] race the call against a
//! [`CancelSignal`]. The in-flight call is dropped when the signal fires.

use crate::client::{ClientCache, ClientKey};
use crate::context::InvocationContext;
use crate::error::{InvokeError, ServiceError};
use crate::operation::Operation;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Cancels in-flight calls observing the paired [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Observes a [`CancelHandle`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|c| *c).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// Sends requests of operations whose client type is `C`.
pub struct Dispatcher<C: ?Sized> {
    cache: Arc<ClientCache<C>>,
}

impl<C: ?Sized> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<C: ?Sized + Send + Sync> Dispatcher<C> {
    pub fn new(cache: Arc<ClientCache<C>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ClientCache<C> {
        &self.cache
    }

    pub async fn dispatch<O>(
        &self,
        ctx: &InvocationContext<O::Params>,
        request: O::Request,
        cancel: Option<&CancelSignal>,
    ) -> Result<O::Response, InvokeError>
    where
        O: Operation<Client = C>,
    {
        let region = ctx
            .region()
            .cloned()
            .ok_or(InvokeError::MissingRegion { operation: O::NAME })?;
        debug!(operation = O::NAME, service = O::SERVICE, %region, ?request, "Dispatch");

        let key = ClientKey {
            credentials: ctx.credentials().clone(),
            region: region.clone(),
        };
        let client = self
            .cache
            .get_or_create(&key)
            .map_err(|e| classify::<O>(e, region.as_str()))?;

        let call = O::call(&*client, request);
        let result = match cancel {
            Some(signal) if O::CANCELLABLE => {
                let mut signal = signal.clone();
                tokio::select! {
                    result = call => result,
                    _ = signal.cancelled() => {
                        info!(operation = O::NAME, "Cancelled");
                        return Err(InvokeError::Cancelled { operation: O::NAME });
                    }
                }
            }
            _ => call.await,
        };

        result.map_err(|e| classify::<O>(e, region.as_str()))
    }
}

fn classify<O: Operation + ?Sized>(error: ServiceError, region: &str) -> InvokeError {
    if let ServiceError::Transport { kind, endpoint, .. } = &error {
        let (kind, endpoint) = (*kind, endpoint.clone());
        warn!(operation = O::NAME, %endpoint, region, %kind, "Endpoint unreachable");
        return InvokeError::Endpoint {
            operation: O::NAME,
            endpoint,
            region: region.to_string(),
            kind,
            source: error,
        };
    }
    debug!(operation = O::NAME, %error, "Service error");
    InvokeError::Service(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_pair() {
        let (handle, mut signal) = cancel_pair();
        assert!(!signal.is_cancelled());
        handle.cancel();
        signal.cancelled().await;
        assert!(signal.is_cancelled());
    }
}
