//! Routing of decoded events to their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::domain_event::DomainEvent;
use super::error::DispatchError;

/// Applies one kind of event to local state.
#[async_trait]
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Handles a single event.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the payload is invalid or the local
    /// write fails. The event is dropped either way.
    async fn handle(&self, event: &DomainEvent) -> Result<(), DispatchError>;
}

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler applied the event.
    Handled,
    /// No handler is registered for the event kind.
    Unhandled,
    /// The handler rejected the payload.
    Rejected,
    /// The handler failed to apply a valid payload.
    Failed,
}

/// Registry mapping event kinds to handlers.
#[derive(Debug, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Dispatcher::register`].
    #[must_use]
    pub fn with_handler(mut self, kind: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Registers `handler` for `kind`, returning the handler it replaces.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Option<Arc<dyn EventHandler>> {
        self.handlers.insert(kind.into(), handler)
    }

    /// Returns `true` if a handler is registered for `kind`.
    #[must_use]
    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Routes `event` to its handler and logs anything but success.
    pub async fn dispatch(&self, event: &DomainEvent) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(event.kind()) else {
            tracing::debug!(kind = event.kind(), "no handler for event kind; ignored");
            return DispatchOutcome::Unhandled;
        };

        match handler.handle(event).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) if e.is_validation() => {
                tracing::warn!(kind = event.kind(), error = %e, "event rejected");
                DispatchOutcome::Rejected
            }
            Err(e) => {
                tracing::error!(kind = event.kind(), error = %e, "event handling failed");
                DispatchOutcome::Failed
            }
        }
    }
}
