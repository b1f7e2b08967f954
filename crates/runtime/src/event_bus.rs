use foundation::time::TimeMs;

/// An event stamped with the engine time it was emitted at.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub at: TimeMs,
    pub event: E,
}

/// Append-only event log, drained by the host.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, at: TimeMs, event: E) {
        self.events.push(Event { at, event });
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}
