//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the `tracing` subscriber for a host process.
//!
//! ## Configuration
//!
//! - `RUST_LOG` wins when it is set and valid.
//! - Otherwise the `default_directive` passed in (e.g. `warn`, or
//!   `cmdlet_framework=debug`) is used.
//! - Output is the compact format without module paths, written to **stderr**
//!   so stdout stays free for emitted values.
//!
//! ## What Gets Traced
//!
//! - **Invocations**: one `invoke` span per operation with `operation` and
//!   `service` fields
//! - **Diagnostics**: missing or blank required parameters (`WARN`)
//! - **Dispatch**: the full request at `DEBUG`, endpoint failures at `WARN`
//! - **Client cache**: client creation (`INFO`) and hits (`DEBUG`)
//! - **Local backend**: startup and shutdown with the number of requests handled
//!
//! ```bash
//! # Show assembled requests
//! RUST_LOG=debug awscmd --region us-east-1 sqs list-queues
//! ```
use tracing_subscriber::EnvFilter;

pub fn setup_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}
