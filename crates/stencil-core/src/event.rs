//! Event system for editor notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! The rendering layer needs to know when to redraw and when an
//! entity it decorates went away. Rather than holding callbacks, the
//! editor broadcasts events as values over `tokio::sync::broadcast`:
//! - Subscribers receive clones
//! - Lagged receivers don't block the editor
//! - Nobody needs a reference back into the editor

use stencil_buffer::{EntityId, EntityKind, SelectionRange};
use tokio::sync::broadcast;

/// Events that can occur in the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    // Content events
    /// Text or entity coverage changed
    ContentChanged,
    /// A new entity was registered
    EntityCreated { entity: EntityId, kind: EntityKind },
    /// An entity left the registry
    EntityRemoved(EntityId),

    // Selection events
    /// Selection or caret moved
    SelectionChanged(SelectionRange),

    // Editor events
    /// Configuration changed
    ConfigChanged,
    /// The set of known variables changed
    VariablesChanged,
}

/// Event bus for broadcasting editor events.
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(editor.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let EditorEvent::EntityRemoved(id) = event {
///             // Drop the decoration for `id`
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event already queued, without waiting.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                }
                Err(_) => return events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EditorEvent::ConfigChanged);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EditorEvent::ConfigChanged);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(EditorEvent::EntityRemoved(EntityId::new(3)));

        assert_eq!(rx1.recv().await.unwrap(), EditorEvent::EntityRemoved(EntityId::new(3)));
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_stops_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::ContentChanged);
        drop(bus);

        assert_eq!(handler.next().await, Some(EditorEvent::ContentChanged));
        assert_eq!(handler.next().await, None);
    }

    #[test]
    fn test_drain_collects_pending() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        bus.emit(EditorEvent::ContentChanged);
        bus.emit(EditorEvent::VariablesChanged);

        assert_eq!(
            handler.drain(),
            vec![EditorEvent::ContentChanged, EditorEvent::VariablesChanged]
        );
        assert!(handler.drain().is_empty());
    }
}
