//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;

use super::types::{CastEvent, ReplicationEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Cast lifecycle (start, release, timeout, dispose, rejection)
    Cast,
    /// Traffic with peers
    Replication,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Cast(CastEvent),
    Replication(ReplicationEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Cast(_) => Topic::Cast,
            Event::Replication(_) => Topic::Replication,
        }
    }
}

impl From<CastEvent> for Event {
    fn from(event: CastEvent) -> Self {
        Event::Cast(event)
    }
}

impl From<ReplicationEvent> for Event {
    fn from(event: ReplicationEvent) -> Self {
        Event::Replication(event)
    }
}

struct Channels {
    cast: broadcast::Sender<Event>,
    replication: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Every topic has its own broadcast channel, created up front, so
/// subscribers only see the events they asked for. Cloning is cheap and
/// clones share the channels.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                cast: broadcast::channel(capacity).0,
                replication: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Cast => &self.channels.cast,
            Topic::Replication => &self.channels.replication,
        }
    }

    /// Publish an event to its corresponding topic. Best-effort: events
    /// with no subscriber are dropped.
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
