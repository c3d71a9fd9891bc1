//! # Host
//!
//! The [`Host`] owns one [`Invoker`] per service and the ambient settings
//! shared by every command it runs. Because client caches live in the
//! invokers, a long-lived host (the `session` command) reuses clients, and
//! with them the local backends, across invocations.
//!
//! ## Architecture Note
//!
//! Routing from an operation to the right invoker goes through the
//! [`Hosted`] trait, implemented for each service's client trait object. An
//! operation's `Client` associated type is therefore all the host needs to
//! find its invoker:
//!
//! ```text
//! Operation::Client = dyn SqsApi ──► <dyn SqsApi as Hosted>::invoker(host) ──► &host.sqs
//! ```

use crate::config::Settings;
use crate::pinpoint_email::local::LocalPinpointEmail;
use crate::pinpoint_email::PinpointEmailApi;
use crate::sqs::local::LocalSqs;
use crate::sqs::SqsApi;
use cmdlet_framework::{
    Ambient, CancelSignal, ClientCache, ClientKey, ConfirmationGate, ContextBuilder,
    CredentialRef, Dispatcher, InvokeError, Invoker, Operation, Outcome, Region, Selector,
    ServiceError,
};
use std::sync::Arc;
use tracing::debug;

/// Per-command settings layered over the host's ambient settings.
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub select: Option<String>,
    pub force: bool,
}

/// Client trait objects the host can route to.
pub trait Hosted: Send + Sync {
    fn invoker(host: &Host) -> &Invoker<Self>;
}

impl Hosted for dyn SqsApi {
    fn invoker(host: &Host) -> &Invoker<Self> {
        &host.sqs
    }
}

impl Hosted for dyn PinpointEmailApi {
    fn invoker(host: &Host) -> &Invoker<Self> {
        &host.pinpoint_email
    }
}

pub struct Host {
    sqs: Invoker<dyn SqsApi>,
    pinpoint_email: Invoker<dyn PinpointEmailApi>,
    ambient: Ambient,
}

impl Host {
    pub fn new(
        sqs: ClientCache<dyn SqsApi>,
        pinpoint_email: ClientCache<dyn PinpointEmailApi>,
        gate: Arc<dyn ConfirmationGate>,
        settings: &Settings,
    ) -> Self {
        Self {
            sqs: Invoker::new(Dispatcher::new(Arc::new(sqs)), gate.clone())
                .with_threshold(settings.confirm_impact),
            pinpoint_email: Invoker::new(Dispatcher::new(Arc::new(pinpoint_email)), gate)
                .with_threshold(settings.confirm_impact),
            ambient: settings.ambient(),
        }
    }

    /// Host backed by in-process services, one per credentials and region.
    pub fn local(settings: &Settings, gate: Arc<dyn ConfirmationGate>) -> Self {
        Self::new(
            local_sqs_cache(settings.local_account_id.clone()),
            local_pinpoint_email_cache(),
            gate,
            settings,
        )
    }

    pub fn sqs(&self) -> &Invoker<dyn SqsApi> {
        &self.sqs
    }

    pub fn pinpoint_email(&self) -> &Invoker<dyn PinpointEmailApi> {
        &self.pinpoint_email
    }

    /// Builds the invocation context for `params` and runs `O` through its
    /// service's invoker.
    pub async fn run<O>(
        &self,
        params: O::Params,
        options: &InvocationOptions,
        cancel: Option<&CancelSignal>,
    ) -> Result<Outcome, InvokeError>
    where
        O: Operation,
        O::Client: Hosted,
    {
        let mut builder = ContextBuilder::new(params)
            .ambient(self.ambient.clone())
            .force(options.force);
        if let Some(region) = &options.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(profile) = &options.profile {
            builder = builder.credentials(CredentialRef::profile(profile.clone()));
        }
        if let Some(raw) = &options.select {
            builder = builder.selector(Selector::parse_for(raw, &O::schema())?);
        }
        let ctx = builder.build::<O>();
        debug!(operation = O::NAME, diagnostics = ctx.diagnostics().len(), "Context built");

        <O::Client as Hosted>::invoker(self)
            .invoke::<O>(&ctx, cancel)
            .await
    }
}

pub fn local_sqs_cache(account_id: String) -> ClientCache<dyn SqsApi> {
    ClientCache::new(
        move |key: &ClientKey| -> Result<Arc<dyn SqsApi>, ServiceError> {
            Ok(Arc::new(LocalSqs::spawn(&key.region, &account_id)))
        },
    )
}

pub fn local_pinpoint_email_cache() -> ClientCache<dyn PinpointEmailApi> {
    ClientCache::new(
        |key: &ClientKey| -> Result<Arc<dyn PinpointEmailApi>, ServiceError> {
            Ok(Arc::new(LocalPinpointEmail::spawn(&key.region)))
        },
    )
}
