//! # cmdlet-aws
//!
//! Amazon SQS and Amazon Pinpoint Email operations on top of
//! [`cmdlet_framework`], plus the `awscmd` command-line host.
//!
//! ## Modules
//!
//! - **[sqs]** / **[pinpoint_email]**: per service, the wire shapes
//!   (`model`), the client trait (`SqsApi`, `PinpointEmailApi`), one
//!   [`Operation`](cmdlet_framework::Operation) per API call (`ops`), and an
//!   in-process service (`local`).
//! - **[host]**: routes operations to per-service invokers and builds their
//!   invocation contexts.
//! - **[cli]**: clap surface, output writing and the line-oriented session.
//! - **[config]**: layered [`Settings`](config::Settings).
//! - **[mock]**: scripted clients for tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cmdlet_aws::config::Settings;
//! use cmdlet_aws::host::{Host, InvocationOptions};
//! use cmdlet_aws::sqs::ops::{CreateQueue, CreateQueueParams};
//! use cmdlet_framework::AutoApprove;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), cmdlet_framework::InvokeError> {
//! let settings = Settings {
//!     region: Some("us-east-1".into()),
//!     ..Default::default()
//! };
//! let host = Host::local(&settings, Arc::new(AutoApprove));
//! let params = CreateQueueParams {
//!     queue_name: Some("orders".into()),
//!     ..Default::default()
//! };
//! let outcome = host
//!     .run::<CreateQueue>(params, &InvocationOptions::default(), None)
//!     .await?;
//! println!("{:?}", outcome.value());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod host;
pub mod mock;
pub mod params;
pub mod pinpoint_email;
pub mod sqs;
