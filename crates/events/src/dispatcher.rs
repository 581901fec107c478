//! Listener dispatch with per-listener fault isolation.
//!
//! Every listener call is its own failure boundary: an `Err` or a panic is
//! logged and recorded in the [`DispatchReport`], and the remaining listeners
//! still run. Nothing a listener does can fail the mutation that produced the
//! event.

use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::Serialize;

use adminhub_core::Model;

use crate::event::{DomainEvent, Event};
use crate::listener::ListenerRegistry;
use crate::queue::EventQueue;

/// How listener delivery is scheduled relative to the mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Listeners run inline before the mutation call returns.
    #[default]
    Sync,
    /// Listeners run on a background worker; security-relevant kinds stay inline.
    Queued,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(DispatchMode::Sync),
            "queued" | "queue" | "async" => Ok(DispatchMode::Queued),
            other => Err(format!("unknown dispatch mode '{other}' (expected sync|queued)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerFailure {
    pub listener: &'static str,
    pub error: String,
}

/// Outcome of handing one event to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub event_type: String,
    /// The event was handed to the background queue; listener outcomes are not known yet.
    pub queued: bool,
    pub delivered: Vec<&'static str>,
    pub failed: Vec<ListenerFailure>,
}

impl DispatchReport {
    fn pending(event_type: String, queued: bool) -> Self {
        Self {
            event_type,
            queued,
            delivered: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Hands domain events to the listeners registered for their kind.
pub struct EventDispatcher<M> {
    registry: Arc<ListenerRegistry<M>>,
    queue: Option<EventQueue<DomainEvent<M>>>,
    worker: Option<JoinHandle<()>>,
}

impl<M: Model> EventDispatcher<M> {
    /// Dispatcher that always delivers inline.
    pub fn sync(registry: ListenerRegistry<M>) -> Self {
        Self {
            registry: Arc::new(registry),
            queue: None,
            worker: None,
        }
    }

    /// Dispatcher that defers non-security events to a background worker.
    ///
    /// Falls back to inline delivery if the worker thread cannot be started.
    pub fn queued(registry: ListenerRegistry<M>) -> Self {
        let registry = Arc::new(registry);
        let worker_registry = registry.clone();
        let spawned = EventQueue::spawn(&format!("{}-events", M::NAME), move |event: DomainEvent<M>| {
            deliver(&*worker_registry, &event);
        });

        match spawned {
            Ok((queue, worker)) => Self {
                registry,
                queue: Some(queue),
                worker: Some(worker),
            },
            Err(e) => {
                tracing::error!(model = M::NAME, error = %e, "failed to start event worker; dispatching inline");
                Self {
                    registry,
                    queue: None,
                    worker: None,
                }
            }
        }
    }

    pub fn with_mode(registry: ListenerRegistry<M>, mode: DispatchMode) -> Self {
        match mode {
            DispatchMode::Sync => Self::sync(registry),
            DispatchMode::Queued => Self::queued(registry),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        if self.queue.is_some() {
            DispatchMode::Queued
        } else {
            DispatchMode::Sync
        }
    }

    pub fn registry(&self) -> &ListenerRegistry<M> {
        &self.registry
    }

    /// Dispatch events in order.
    pub fn dispatch(&self, events: Vec<DomainEvent<M>>) -> Vec<DispatchReport> {
        events.into_iter().map(|ev| self.dispatch_one(ev)).collect()
    }

    pub fn dispatch_one(&self, event: DomainEvent<M>) -> DispatchReport {
        let kind = event.kind();

        if kind.is_terminal() {
            tracing::debug!(event_type = %event.event_type(), "terminal event; no listeners fire");
            return DispatchReport::pending(event.event_type(), false);
        }

        if let Some(queue) = &self.queue {
            if !kind.requires_sync_dispatch() {
                match queue.push(event.clone()) {
                    Ok(()) => return DispatchReport::pending(event.event_type(), true),
                    Err(e) => {
                        tracing::warn!(event_type = %event.event_type(), error = %e, "failed to enqueue event; delivering inline");
                    }
                }
            }
        }

        deliver(&*self.registry, &event)
    }

    /// Stop the background worker after it drains pending events.
    pub fn shutdown(&mut self) {
        if let Some(queue) = &self.queue {
            queue.close();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(model = M::NAME, "event worker panicked during shutdown");
            }
        }
    }
}

impl<M> Drop for EventDispatcher<M> {
    fn drop(&mut self) {
        if let Some(queue) = &self.queue {
            queue.close();
        }
    }
}

fn deliver<M: Model>(registry: &ListenerRegistry<M>, event: &DomainEvent<M>) -> DispatchReport {
    let mut report = DispatchReport::pending(event.event_type(), false);

    for listener in registry.listeners_for(event.kind()) {
        let name = listener.name();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.handle(event)));

        match outcome {
            Ok(Ok(())) => {
                tracing::debug!(listener = name, event_type = %report.event_type, "listener handled event");
                report.delivered.push(name);
            }
            Ok(Err(e)) => {
                let error = format!("{e:#}");
                tracing::error!(listener = name, event_type = %report.event_type, error = %error, "listener failed");
                report.failed.push(ListenerFailure { listener: name, error });
            }
            Err(payload) => {
                let error = panic_message(payload.as_ref());
                tracing::error!(listener = name, event_type = %report.event_type, error = %error, "listener panicked");
                report.failed.push(ListenerFailure { listener: name, error });
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}
