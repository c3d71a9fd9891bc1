//! # Invocation Errors
//!
//! Two layers of errors flow through an invocation:
//!
//! - [`ServiceError`] is what a service client reports: either a transport
//!   failure (the endpoint could not be reached) or a failure returned by the
//!   remote API itself.
//! - [`InvokeError`] is what the pipeline reports to its caller. Transport
//!   failures are rewrapped into [`InvokeError::Endpoint`] with a message that
//!   names the endpoint; API failures pass through untouched as
//!   [`InvokeError::Service`].

use serde::Serialize;
use std::fmt;

/// How a transport failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransportKind {
    NameResolution,
    Connect,
    Timeout,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::NameResolution => write!(f, "name resolution failure"),
            TransportKind::Connect => write!(f, "connection failure"),
            TransportKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Errors reported by a service client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{kind} calling {endpoint}: {message}")]
    Transport {
        kind: TransportKind,
        endpoint: String,
        message: String,
    },
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    #[error("Service client closed")]
    ClientClosed,
}

impl ServiceError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn transport(
        kind: TransportKind,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ServiceError::Transport {
            kind,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// True for failures that happened before the remote API could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport { .. })
    }

    /// The API error code, if the remote API produced one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ServiceError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Errors that end an invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("{operation}: unable to reach endpoint {endpoint} in region {region} ({kind}). Check the region and network connectivity")]
    Endpoint {
        operation: &'static str,
        endpoint: String,
        region: String,
        kind: TransportKind,
        #[source]
        source: ServiceError,
    },
    #[error(transparent)]
    Service(ServiceError),
    #[error("{operation}: invalid selector '{selector}': {reason}")]
    InvalidSelector {
        operation: &'static str,
        selector: String,
        reason: String,
    },
    #[error("{operation}: no region specified or obtained from settings")]
    MissingRegion { operation: &'static str },
    #[error("{operation}: cancelled")]
    Cancelled { operation: &'static str },
    #[error("{operation}: could not serialize value for projection: {source}")]
    Projection {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl InvokeError {
    /// Error category reported alongside the message in host error records.
    pub fn category(&self) -> &'static str {
        match self {
            InvokeError::Endpoint { .. } => "ConnectionError",
            InvokeError::Service(ServiceError::Api { .. }) => "InvalidOperation",
            InvokeError::Service(_) => "ConnectionError",
            InvokeError::InvalidSelector { .. } => "InvalidArgument",
            InvokeError::MissingRegion { .. } => "InvalidArgument",
            InvokeError::Cancelled { .. } => "OperationStopped",
            InvokeError::Projection { .. } => "InvalidResult",
            InvokeError::Runtime(_) => "NotSpecified",
        }
    }
}

/// Serializable stand-in for a value when an invocation fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorRecord {
    pub operation: String,
    pub category: &'static str,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(operation: impl Into<String>, error: &InvokeError) -> Self {
        Self {
            operation: operation.into(),
            category: error.category(),
            message: error.to_string(),
        }
    }
}
