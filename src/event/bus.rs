use std::cell::RefCell;

use super::{DrawingEvent, EventHandler};

/// A simple event bus for broadcasting drawing events to registered handlers
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    /// Emit an event to all registered handlers
    pub fn emit(&self, event: DrawingEvent) {
        log::trace!("Event: {event:?}");
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn handlers_receive_events_in_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event: &DrawingEvent| sink.borrow_mut().push(event.clone()));

        bus.emit(DrawingEvent::Loaded);
        bus.emit(DrawingEvent::HistoryChanged { can_undo: true, can_redo: false });

        assert_eq!(
            *seen.borrow(),
            vec![
                DrawingEvent::Loaded,
                DrawingEvent::HistoryChanged { can_undo: true, can_redo: false },
            ]
        );
    }
}
