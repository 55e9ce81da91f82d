/// Observable session output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A line of server text (PrintJSON)
    Message(String),

    /// Slot authenticated
    Connected {
        team: i64,
        slot: i64,
    },

    /// A hint was requested for one of our own missing locations
    HintRequested {
        location: i64,
    },

    /// The idle timer crossed a milestone and earned a hint credit
    HintEarned,

    /// Session ended after a fatal error
    Disconnected {
        reason: String,
    },
}

/// Event handler trait
pub trait EventHandler {
    fn on_event(&mut self, event: SessionEvent);
}

/// Simple event collector
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SessionEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventHandler for EventCollector {
    fn on_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_collector() {
        let mut collector = EventCollector::new();
        assert!(collector.is_empty());

        collector.on_event(SessionEvent::Message("hello".into()));
        collector.on_event(SessionEvent::HintEarned);

        assert!(!collector.is_empty());

        let events = collector.drain();
        assert_eq!(events, vec![SessionEvent::Message("hello".into()), SessionEvent::HintEarned]);
        assert!(collector.is_empty());
    }
}
