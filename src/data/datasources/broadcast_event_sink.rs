use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    constants::DEFAULT_EVENT_CHANNEL_CAPACITY,
    domain::{entities::store_event::StoreEvent, repositories::event_sink::EventSink},
};

/// Fans store events out to every subscriber over a broadcast channel.
///
/// Subscribers that fall more than the channel capacity behind miss the
/// oldest events.
#[derive(Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<StoreEvent>,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: StoreEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "store event emitted"),
            Err(_) => debug!(event = name, "store event emitted with no subscribers"),
        }
    }
}
