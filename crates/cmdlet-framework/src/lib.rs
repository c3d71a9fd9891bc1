//! # Cmdlet Framework
//!
//! A generic pipeline that turns a command invocation with typed, optional
//! parameters into exactly one remote API call, and the response into a
//! single emitted value.
//!
//! ## Pipeline
//!
//! ```text
//! bound params ─▶ ContextBuilder ─▶ InvocationContext
//!                                         │
//!        Selector::validate ◀─────────────┤
//!        ConfirmationGate   ◀─────────────┤
//!        Operation::assemble ◀────────────┘
//!                 │
//!                 ▼
//!           Dispatcher ─▶ ClientCache ─▶ service client (one call)
//!                 │
//!                 ▼
//!        Selector::project ─▶ Outcome::Emitted(Value)
//! ```
//!
//! - **[`context`]**: binds parameters and ambient settings, records
//!   diagnostics for missing required parameters, then freezes.
//! - **[`assemble`]**: the [`Group`] combinator that omits unbound nested
//!   structures entirely.
//! - **[`dispatch`]**: one call per invocation, transport failures rewrapped
//!   with the endpoint name, optional cancellation.
//! - **[`select`]**: `*`, `Name` and `^Name` projection.
//! - **[`pipeline`]**: the [`Invoker`] that ties the stages together.
//!
//! ## Defining an Operation
//!
//! ```rust
//! use async_trait::async_trait;
//! use cmdlet_framework::{
//!     ConfirmImpact, ContextBuilder, Operation, Requirements, ServiceError,
//! };
//! use serde::Serialize;
//!
//! #[derive(Debug, Default, Serialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct PurgeParams { queue_url: Option<String> }
//!
//! #[derive(Debug, PartialEq, Serialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct PurgeRequest {
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     queue_url: Option<String>,
//! }
//!
//! trait QueueApi: Send + Sync {
//!     fn purge(&self, request: PurgeRequest) -> Result<(), ServiceError>;
//! }
//!
//! struct Purge;
//!
//! #[async_trait]
//! impl Operation for Purge {
//!     const NAME: &'static str = "PurgeQueue";
//!     const SERVICE: &'static str = "sqs";
//!     const IMPACT: ConfirmImpact = ConfirmImpact::High;
//!     const RESPONSE_FIELDS: &'static [&'static str] = &[];
//!     const PASS_THROUGH: &'static [&'static str] = &["QueueUrl"];
//!     type Params = PurgeParams;
//!     type Request = PurgeRequest;
//!     type Response = ();
//!     type Client = dyn QueueApi;
//!
//!     fn requirements(p: &PurgeParams, req: &mut Requirements) {
//!         req.require("QueueUrl", &p.queue_url);
//!     }
//!     fn assemble(p: &PurgeParams) -> PurgeRequest {
//!         PurgeRequest { queue_url: p.queue_url.clone() }
//!     }
//!     async fn call(client: &Self::Client, request: PurgeRequest) -> Result<(), ServiceError> {
//!         client.purge(request)
//!     }
//! }
//!
//! let ctx = ContextBuilder::new(PurgeParams::default()).build::<Purge>();
//! assert_eq!(ctx.diagnostics().len(), 1);
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockService`](mock::MockService), an
//! expectation queue that records every request it receives. The [`local`]
//! module provides an in-process backend for stateful multi-step tests.

pub mod assemble;
pub mod client;
pub mod confirm;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod local;
pub mod mock;
pub mod operation;
pub mod param;
pub mod pipeline;
pub mod select;
pub mod tracing;

// Re-export core types for convenience
pub use assemble::Group;
pub use client::{ClientCache, ClientFactory, ClientKey};
pub use confirm::{AutoApprove, AutoDecline, ConfirmImpact, ConfirmRequest, ConfirmationGate, PromptGate};
pub use context::{Ambient, ContextBuilder, CredentialRef, InvocationContext, Region};
pub use dispatch::{cancel_pair, CancelHandle, CancelSignal, Dispatcher};
pub use error::{ErrorRecord, InvokeError, ServiceError, TransportKind};
pub use local::{LocalBackend, LocalHandle};
pub use operation::Operation;
pub use param::{Blank, Diagnostic, DiagnosticKind, Requirements};
pub use pipeline::{execute, execute_async, Invoker, Outcome};
pub use select::{SelectSchema, Selector};
