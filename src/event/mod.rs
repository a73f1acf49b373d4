mod bus;
mod events;

pub use bus::EventBus;
pub use events::DrawingEvent;

/// Receives notifications from a drawing session
pub trait EventHandler {
    fn handle_event(&mut self, event: &DrawingEvent);
}

impl<F: FnMut(&DrawingEvent)> EventHandler for F {
    fn handle_event(&mut self, event: &DrawingEvent) {
        self(event)
    }
}
