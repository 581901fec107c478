//! In-process event queue for deferred listener delivery.
//!
//! A single background thread drains the queue. The thread exits once the
//! queue is closed (or dropped) and every pending event has been handled.

use std::sync::{Mutex, mpsc};
use std::thread::JoinHandle;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("event queue lock poisoned")]
    Poisoned,

    #[error("event queue is closed")]
    Closed,
}

/// FIFO hand-off between mutating requests and the drain thread.
#[derive(Debug)]
pub struct EventQueue<M> {
    sender: Mutex<Option<mpsc::Sender<M>>>,
}

impl<M: Send + 'static> EventQueue<M> {
    /// Create the queue and start its drain thread.
    ///
    /// `handler` is called once per pushed message, in push order.
    pub fn spawn<F>(thread_name: &str, mut handler: F) -> Result<(Self, JoinHandle<()>), std::io::Error>
    where
        F: FnMut(M) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<M>();
        let name = thread_name.to_string();
        let handle = std::thread::Builder::new().name(name.clone()).spawn(move || {
            tracing::debug!(queue = %name, "event queue worker started");
            while let Ok(message) = rx.recv() {
                handler(message);
            }
            tracing::debug!(queue = %name, "event queue worker stopped");
        })?;

        Ok((
            Self {
                sender: Mutex::new(Some(tx)),
            },
            handle,
        ))
    }
}

impl<M> EventQueue<M> {
    pub fn push(&self, message: M) -> Result<(), QueueError> {
        let guard = self.sender.lock().map_err(|_| QueueError::Poisoned)?;
        let sender = guard.as_ref().ok_or(QueueError::Closed)?;
        sender.send(message).map_err(|_| QueueError::Closed)
    }

    /// Stop accepting messages. Already queued messages are still drained.
    pub fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}
