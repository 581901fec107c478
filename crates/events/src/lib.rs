//! Domain events: lifecycle hooks, listener registration and dispatch.
//!
//! Mutations call [`ModelObserver`] hooks explicitly; the hooks return the
//! [`DomainEvent`]s to hand to an [`EventDispatcher`], which runs the listeners
//! registered for each [`EventKind`] in order.

pub mod dispatcher;
pub mod event;
pub mod listener;
pub mod observer;
pub mod queue;

pub use dispatcher::{DispatchMode, DispatchReport, EventDispatcher, ListenerFailure};
pub use event::{DomainEvent, Event, EventKind};
pub use listener::{Listener, ListenerRegistry};
pub use observer::{ModelObserver, ObserverError};
pub use queue::{EventQueue, QueueError};
