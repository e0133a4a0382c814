//! Event bus for observers of the bridged player.
//!
//! Uses tokio::sync::broadcast for pub/sub. Events are published by the
//! adapter when a poll observes a change in the projected properties, and
//! by the lifecycle operations (turn on/off).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::player::PlayerState;

/// Events published on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    /// Entity turned on (snapshot seeded, polling enabled)
    PlayerTurnedOn { player: String },
    /// Entity turned off (snapshot cleared, polling disabled)
    PlayerTurnedOff { player: String },
    /// Projected playback state changed between polls
    StateChanged { player: String, state: PlayerState },
    /// Media title changed between polls (None = cleared)
    NowPlayingChanged {
        player: String,
        title: Option<String>,
    },
    /// Volume level or mute flag changed between polls
    VolumeChanged {
        player: String,
        level: f32,
        is_muted: bool,
    },
    /// A playlist was selected locally as the current source
    SourceSelected {
        player: String,
        source: Option<String>,
    },
    /// The poll driver exited
    PollerStopped { player: String },
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers. Lossy when nobody listens.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Shared event bus wrapped in Arc for thread-safe sharing
pub type SharedBus = Arc<EventBus>;

/// Create a new shared event bus with the default capacity (64 events)
pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::new(64))
}
