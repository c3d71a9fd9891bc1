//! # Mock Service & Testing Guide
//!
//! [`MockService`] stands in for a remote service in tests. Service crates
//! implement their client traits for it by forwarding every call to
//! [`MockService::respond`]; tests queue expectations, run invocations and
//! then inspect what was sent.
//!
//! ## When to use the Mock vs the Local Backend
//!
//! | Feature | MockService | LocalBackend |
//! |---------|-------------|--------------|
//! | **State** | None (expectations) | Real service state |
//! | **Error injection** | Easy (`return_err`) | Only what the state allows |
//! | **Inspecting requests** | Every request recorded as JSON | Not recorded |
//! | **Use case** | Pipeline behavior, exact wire shape | Multi-step flows |
//!
//! ## Example
//!
//! ```rust
//! use cmdlet_framework::mock::MockService;
//! use cmdlet_framework::ServiceError;
//!
//! #[derive(serde::Serialize)]
//! struct Ping { target: String }
//!
//! let mock = MockService::new();
//! mock.expect("Ping").return_ok(String::from("pong"));
//! mock.expect("Ping").return_err(ServiceError::api("Throttling", "slow down"));
//!
//! let first: Result<String, _> = mock.respond("Ping", &Ping { target: "a".into() });
//! assert_eq!(first.unwrap(), "pong");
//! let second: Result<String, _> = mock.respond("Ping", &Ping { target: "b".into() });
//! assert!(second.is_err());
//!
//! assert_eq!(mock.call_count(), 2);
//! assert_eq!(mock.requests()[1].1["target"], "b");
//! mock.verify();
//! ```
//!
//! ## Testing Failure Scenarios
//!
//! Transport failures that are hard to provoke against a real endpoint are
//! one line here:
//!
//! ```rust,ignore
//! mock.expect("SendMessage").return_err(ServiceError::transport(
//!     TransportKind::NameResolution,
//!     "sqs.nowhere-1.amazonaws.com",
//!     "no such host",
//! ));
//! ```

use crate::error::ServiceError;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// One queued response.
struct Expectation {
    operation: &'static str,
    response: Result<Box<dyn Any + Send>, ServiceError>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<(String, Value)>,
}

/// Scripted service with request recording. Clones share state.
#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<MockState>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next call to `operation`.
    pub fn expect(&self, operation: &'static str) -> ExpectationBuilder {
        ExpectationBuilder {
            operation,
            state: self.state.clone(),
        }
    }

    /// Records `request` and pops the next expectation.
    ///
    /// # Panics
    /// If no expectation is queued, the queued one is for another operation,
    /// or its value is not an `R`.
    pub fn respond<Req, R>(&self, operation: &str, request: &Req) -> Result<R, ServiceError>
    where
        Req: Serialize + ?Sized,
        R: 'static,
    {
        let mut state = self.lock();
        let recorded = serde_json::to_value(request).unwrap_or(Value::Null);
        state.requests.push((operation.to_string(), recorded));

        let expectation = state.expectations.pop_front();
        drop(state);

        match expectation {
            Some(Expectation {
                operation: expected,
                response,
            }) if expected == operation => response.map(|boxed| match boxed.downcast::<R>() {
                Ok(value) => *value,
                Err(_) => panic!("Expectation for {operation} holds a value of the wrong type"),
            }),
            Some(Expectation {
                operation: expected,
                ..
            }) => panic!("Unexpected call to {operation}, expected {expected}"),
            None => panic!("Unexpected call to {operation}, no expectations left"),
        }
    }

    /// Names of the operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().requests.iter().map(|(op, _)| op.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Every request received, serialized with its wire names.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.lock().requests.clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<Value> {
        self.lock().requests.last().map(|(_, v)| v.clone())
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builder returned by [`MockService::expect`].
pub struct ExpectationBuilder {
    operation: &'static str,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Sets the expectation to return a successful result.
    pub fn return_ok<R: Send + 'static>(self, value: R) {
        self.push(Ok(Box::new(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ServiceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Box<dyn Any + Send>, ServiceError>) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.expectations.push_back(Expectation {
            operation: self.operation,
            response,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_records_requests_and_pops_in_order() {
        let mock = MockService::new();
        mock.expect("CreateQueue").return_ok(1u32);
        mock.expect("DeleteQueue").return_ok(());

        let id: u32 = mock.respond("CreateQueue", &json!({"QueueName": "q1"})).unwrap();
        assert_eq!(id, 1);
        let () = mock.respond("DeleteQueue", &json!({"QueueUrl": "u"})).unwrap();

        assert_eq!(mock.calls(), vec!["CreateQueue", "DeleteQueue"]);
        assert_eq!(mock.last_request(), Some(json!({"QueueUrl": "u"})));
        mock.verify();
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_reports_leftovers() {
        let mock = MockService::new();
        mock.expect("GetAccount").return_ok(());
        mock.verify();
    }

    #[test]
    #[should_panic(expected = "Unexpected call to PurgeQueue")]
    fn test_mismatched_operation_panics() {
        let mock = MockService::new();
        mock.expect("ListQueues").return_ok(());
        let _: Result<(), _> = mock.respond("PurgeQueue", &json!({}));
    }
}
