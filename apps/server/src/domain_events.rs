//! Bridge from ledger domain events to the server event bus.

use savings_ledger_core::events::{DomainEvent, DomainEventSink};

use crate::events::{
    EventBus, ServerEvent, CONTRIBUTIONS_CHANGED, GOALS_CHANGED, LEDGER_IMPORTED,
    LEDGER_RECALCULATED,
};

/// Publishes every domain event on the [`EventBus`] with its JSON payload.
pub struct WebDomainEventSink {
    event_bus: EventBus,
}

impl WebDomainEventSink {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::GoalsChanged { .. } => GOALS_CHANGED,
        DomainEvent::ContributionsChanged { .. } => CONTRIBUTIONS_CHANGED,
        DomainEvent::LedgerRecalculated { .. } => LEDGER_RECALCULATED,
        DomainEvent::LedgerImported { .. } => LEDGER_IMPORTED,
    }
}

impl DomainEventSink for WebDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        let name = event_name(&event);
        let server_event = match serde_json::to_value(&event) {
            Ok(payload) => ServerEvent::with_payload(name, payload),
            Err(err) => {
                tracing::warn!("Failed to serialize domain event {}: {}", name, err);
                ServerEvent::new(name)
            }
        };
        self.event_bus.publish(server_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_publishes_payload() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let sink = WebDomainEventSink::new(bus);

        sink.emit(DomainEvent::contributions_changed(
            vec!["g1".to_string()],
            vec!["exp-1".to_string()],
        ));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.name, CONTRIBUTIONS_CHANGED);
        let payload = event.payload.unwrap();
        assert_eq!(payload["type"], "contributions_changed");
        assert_eq!(payload["expense_ids"][0], "exp-1");
    }
}
