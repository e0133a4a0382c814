//! Fixed-cadence poll driver.
//!
//! Stands in for the host framework's entity scheduler: calls
//! [`MediaPlayer::update`] on a fixed interval until cancelled. Polls
//! never overlap because each tick awaits the previous update.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::bus::{BusEvent, SharedBus};
use crate::entity::MediaPlayer;

/// Default cadence between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Drives a [`MediaPlayer`] at a fixed cadence.
pub struct Poller<P: MediaPlayer> {
    player: Arc<P>,
    bus: SharedBus,
    shutdown: CancellationToken,
}

impl<P: MediaPlayer> Poller<P> {
    pub fn new(player: Arc<P>, bus: SharedBus, shutdown: CancellationToken) -> Self {
        Self {
            player,
            bus,
            shutdown,
        }
    }

    /// Run until the shutdown token fires.
    ///
    /// Update errors (malformed device responses) are logged and polling
    /// continues; transport failures never even reach here.
    pub async fn run(self, poll_interval: Duration) {
        let name = self.player.name().to_string();
        info!("polling {} every {:?}", name, poll_interval);

        let mut timer = interval(poll_interval);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("{}: poller shutting down", name);
                    break;
                }
                _ = timer.tick() => {
                    if let Err(e) = self.player.update().await {
                        error!("{}: update failed: {:#}", name, e);
                    }
                }
            }
        }

        self.bus.publish(BusEvent::PollerStopped { player: name });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::create_bus;
    use crate::player::PlayerState;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts update calls, optionally failing each one.
    struct CountingPlayer {
        updates: AtomicUsize,
        fail: bool,
    }

    impl CountingPlayer {
        fn new(fail: bool) -> Self {
            Self {
                updates: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl MediaPlayer for CountingPlayer {
        fn name(&self) -> &str {
            "counting"
        }
        fn supported_features(&self) -> u32 {
            0
        }
        async fn update(&self) -> Result<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow::anyhow!("simulated decode failure"))
            } else {
                Ok(())
            }
        }
        async fn state(&self) -> PlayerState {
            PlayerState::Off
        }
        async fn media_title(&self) -> Option<String> {
            None
        }
        async fn volume_level(&self) -> f32 {
            0.0
        }
        async fn is_volume_muted(&self) -> bool {
            false
        }
        async fn media_duration(&self) -> Result<u32> {
            Ok(0)
        }
        async fn source(&self) -> Option<String> {
            None
        }
        async fn source_list(&self) -> Option<Vec<String>> {
            None
        }
        async fn volume_up(&self) {}
        async fn volume_down(&self) {}
        async fn mute_volume(&self) {}
        async fn media_play(&self) {}
        async fn media_pause(&self) {}
        async fn media_stop(&self) {}
        async fn media_next_track(&self) {}
        async fn media_previous_track(&self) {}
        async fn select_source(&self, _source: &str) {}
        async fn turn_on(&self) {}
        async fn turn_off(&self) {}
    }

    #[tokio::test]
    async fn poller_ticks_until_cancelled() {
        let bus = create_bus();
        let mut rx = bus.subscribe();
        let player = Arc::new(CountingPlayer::new(false));
        let shutdown = CancellationToken::new();

        let poller = Poller::new(player.clone(), bus, shutdown.clone());
        let task = tokio::spawn(poller.run(Duration::from_millis(10)));

        tokio::time::sleep(Duration::from_millis(55)).await;
        shutdown.cancel();
        task.await.unwrap();

        // First tick fires immediately, then roughly every 10ms
        assert!(player.updates.load(Ordering::SeqCst) >= 3);
        assert!(matches!(
            rx.recv().await.unwrap(),
            BusEvent::PollerStopped { .. }
        ));
    }

    #[tokio::test]
    async fn poller_keeps_going_after_update_errors() {
        let bus = create_bus();
        let player = Arc::new(CountingPlayer::new(true));
        let shutdown = CancellationToken::new();

        let poller = Poller::new(player.clone(), bus, shutdown.clone());
        let task = tokio::spawn(poller.run(Duration::from_millis(10)));

        tokio::time::sleep(Duration::from_millis(55)).await;
        shutdown.cancel();
        task.await.unwrap();

        assert!(player.updates.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn cancelled_token_stops_promptly() {
        let bus = create_bus();
        let player = Arc::new(CountingPlayer::new(false));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let poller = Poller::new(player, bus, shutdown);
        // Must return without waiting out a full interval
        tokio::time::timeout(Duration::from_secs(1), poller.run(Duration::from_secs(60)))
            .await
            .expect("poller should exit immediately");
    }
}
