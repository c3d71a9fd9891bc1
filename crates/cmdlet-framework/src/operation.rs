//! # Operation Trait
//!
//! The `Operation` trait is the contract every remote API operation implements
//! to run through the generic pipeline. It names the operation's parameter,
//! request and response types, says which parameters are required, how a
//! request is assembled from the bound parameters, and how the service client
//! is called.
//!
//! # Architecture Note
//! The pipeline (context builder, dispatcher, projector) is written *once*
//! against this trait. Adding an operation means adding a type and an impl,
//! never another copy of the pipeline.
//!
//! Associated types keep the stages type-safe: a `SendMessage` context can
//! only be assembled into a `SendMessageRequest`, and that request can only be
//! handed to the client method that accepts it.
//!
//! # Provided Items
//! - [`Operation::IMPACT`] defaults to [`ConfirmImpact::None`] (read-only).
//! - [`Operation::CANCELLABLE`] defaults to `false`.
//! - [`Operation::DEFAULT_SELECT`] defaults to `*` (whole response).
//! - [`Operation::requirements`] defaults to no required parameters.
//! - [`Operation::target`] defaults to the operation name.

use crate::confirm::ConfirmImpact;
use crate::error::ServiceError;
use crate::param::Requirements;
use crate::select::SelectSchema;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

/// One remote API operation.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Remote operation name, e.g. `SendMessage`.
    const NAME: &'static str;

    /// Service the operation belongs to, e.g. `sqs`.
    const SERVICE: &'static str;

    const IMPACT: ConfirmImpact = ConfirmImpact::None;

    /// Whether an in-flight call may be abandoned on a cancel signal.
    const CANCELLABLE: bool = false;

    /// Selector used when the caller supplies none.
    const DEFAULT_SELECT: &'static str = "*";

    /// Response fields a selector may name.
    const RESPONSE_FIELDS: &'static [&'static str];

    /// Input parameters a `^Name` selector may pass through.
    const PASS_THROUGH: &'static [&'static str] = &[];

    /// Bound parameters. Every field is an `Option`.
    type Params: Serialize + Debug + Send + Sync;

    /// Request shape sent to the service.
    type Request: Serialize + Debug + Send + Sync;

    type Response: Serialize + Debug + Send + Sync + 'static;

    /// Service client trait object the call goes through (e.g. `dyn SqsApi`).
    type Client: ?Sized + Send + Sync;

    /// Declares required parameters.
    fn requirements(_params: &Self::Params, _req: &mut Requirements) {}

    /// Builds the request. Must be pure: the same parameters always yield an
    /// equal request.
    fn assemble(params: &Self::Params) -> Self::Request;

    /// Human-readable target shown when confirmation is requested.
    fn target(_params: &Self::Params) -> String {
        Self::NAME.to_string()
    }

    async fn call(client: &Self::Client, request: Self::Request)
        -> Result<Self::Response, ServiceError>;

    fn schema() -> SelectSchema {
        SelectSchema {
            operation: Self::NAME,
            response_fields: Self::RESPONSE_FIELDS,
            pass_through: Self::PASS_THROUGH,
        }
    }
}
