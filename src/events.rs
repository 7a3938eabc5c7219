use bevy_ecs::prelude::Entity;
use std::fmt;

/// Integer event class identifier. Key-down events and the custom-event
/// space use fixed codes so scripts can subscribe by plain integers.
pub type EventCode = u32;

pub const EVENT_KEYDOWN: EventCode = 0x300;
pub const EVENT_CUSTOM_BASE: EventCode = 0x2_0000;

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl EventPayload {
    pub fn scancode(&self) -> Option<u32> {
        match self {
            EventPayload::Int(value) if *value >= 0 => u32::try_from(*value).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPayload::Empty => write!(f, "()"),
            EventPayload::Int(value) => write!(f, "{value}"),
            EventPayload::Float(value) => write!(f, "{value}"),
            EventPayload::Bool(value) => write!(f, "{value}"),
            EventPayload::Text(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub code: EventCode,
    pub payload: EventPayload,
    /// Targeted events are delivered only to handlers registered for this
    /// entity; global handlers for the same code do not see them.
    pub target: Option<Entity>,
}

/// FIFO queue pumped synchronously once per step. Handlers always run on the
/// thread that drains the bus, so callback execution is serialized.
#[derive(Default)]
pub struct EventBus {
    events: Vec<QueuedEvent>,
}

impl EventBus {
    pub fn global(&mut self, code: EventCode, payload: EventPayload) {
        self.events.push(QueuedEvent { code, payload, target: None });
    }

    pub fn notify(&mut self, target: Entity, code: EventCode, payload: EventPayload) {
        self.events.push(QueuedEvent { code, payload, target: Some(target) });
    }

    pub fn drain(&mut self) -> Vec<QueuedEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    #[test]
    fn drain_preserves_queue_order() {
        let mut bus = EventBus::default();
        bus.global(EVENT_CUSTOM_BASE, EventPayload::Text("first".into()));
        bus.global(EVENT_CUSTOM_BASE + 1, EventPayload::Empty);
        bus.global(EVENT_KEYDOWN, EventPayload::Int(6));

        let drained = bus.drain();
        assert!(bus.is_empty());
        assert_eq!(
            drained.iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![EVENT_CUSTOM_BASE, EVENT_CUSTOM_BASE + 1, EVENT_KEYDOWN]
        );
    }

    #[test]
    fn notify_carries_the_target_entity() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();

        let mut bus = EventBus::default();
        bus.notify(entity, EVENT_CUSTOM_BASE + 1, EventPayload::Empty);

        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].target, Some(entity));
    }

    #[test]
    fn scancode_rejects_non_integer_payloads() {
        assert_eq!(EventPayload::Int(25).scancode(), Some(25));
        assert_eq!(EventPayload::Int(-1).scancode(), None);
        assert_eq!(EventPayload::Text("25".into()).scancode(), None);
    }
}
