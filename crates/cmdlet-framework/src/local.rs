//! # Local Service Backend
//!
//! `LocalBackend<S>` is an in-process stand-in for a remote service. It owns
//! the service state `S` inside a Tokio task and applies requests to it one
//! at a time, so the state needs no locking. Callers talk to it through a
//! cloneable [`LocalHandle`].
//!
//! # Architecture Note
//! This is the server half of an actor: an mpsc receiver feeding a loop that
//! has exclusive ownership of the state. Each request is a closure over
//! `&mut S` paired with a oneshot sender for its result.
//!
//! ```rust
//! use cmdlet_framework::local::LocalBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (backend, handle) = LocalBackend::new(Vec::<String>::new(), 16);
//!     tokio::spawn(backend.run("queue"));
//!
//!     let len = handle
//!         .exec(|items| {
//!             items.push("hello".to_string());
//!             Ok(items.len())
//!         })
//!         .await
//!         .unwrap();
//!     assert_eq!(len, 1);
//! }
//! ```

use crate::error::ServiceError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Server half: owns the state and the request receiver.
pub struct LocalBackend<S> {
    receiver: mpsc::Receiver<Job<S>>,
    state: S,
}

impl<S: Send + 'static> LocalBackend<S> {
    /// Creates the backend and its handle.
    ///
    /// `buffer_size` bounds the request channel; callers wait when it is full.
    pub fn new(state: S, buffer_size: usize) -> (Self, LocalHandle<S>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver, state }, LocalHandle { sender })
    }

    /// Processes requests until every handle is dropped.
    pub async fn run(mut self, service: &'static str) {
        info!(service, "Local backend started");
        let mut handled = 0u64;
        while let Some(job) = self.receiver.recv().await {
            job(&mut self.state);
            handled += 1;
            debug!(service, handled, "Request handled");
        }
        info!(service, handled, "Local backend shutdown");
    }
}

/// Client half: cheap to clone, holds only a sender.
pub struct LocalHandle<S> {
    sender: mpsc::Sender<Job<S>>,
}

impl<S> Clone for LocalHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: Send + 'static> LocalHandle<S> {
    /// Runs `f` against the backend state and returns its result.
    pub async fn exec<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> Result<R, ServiceError> + Send + 'static,
    {
        let (respond_to, response) = oneshot::channel();
        let job: Job<S> = Box::new(move |state| {
            let _ = respond_to.send(f(state));
        });
        self.sender
            .send(job)
            .await
            .map_err(|_| ServiceError::ClientClosed)?;
        response.await.map_err(|_| ServiceError::ClientClosed)?
    }
}
