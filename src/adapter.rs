//! Adapter for an MPC-HC style player exposed over its web API.
//!
//! All reads are projections of the last polled status snapshot; commands
//! go out as fire-and-forget GETs with a command code. The adapter is
//! "off" until [`MultiroomAdapter::turn_on`] seeds the snapshot, and polls
//! are no-ops while off.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use url::Url;

use crate::bus::{BusEvent, SharedBus};
use crate::entity::MediaPlayer;
use crate::player::{self, support, CommandCode, PlayerState};

/// Timeout for one round trip to the device
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Internal adapter state. The snapshot is replaced wholesale on every
/// successful poll; the playlist cache is filled once and kept for the
/// adapter's lifetime; the current playlist is local-only and never
/// reconciled against the device.
#[derive(Default)]
struct AdapterState {
    snapshot: Option<Value>,
    playlists: Option<Vec<String>>,
    current_playlist: Option<String>,
}

/// Bridged multiroom media player.
pub struct MultiroomAdapter {
    name: String,
    endpoint: Url,
    client: Client,
    state: Arc<RwLock<AdapterState>>,
    bus: SharedBus,
}

impl MultiroomAdapter {
    /// Create an adapter for the device at `host:port`.
    ///
    /// `http://` is assumed when the host carries no scheme.
    pub fn new(name: impl Into<String>, host: &str, port: u16, bus: SharedBus) -> Result<Self> {
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        let endpoint = Url::parse(&format!("{base}:{port}"))
            .with_context(|| format!("invalid endpoint {base}:{port}"))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            name: name.into(),
            endpoint,
            client,
            state: Arc::new(RwLock::new(AdapterState::default())),
            bus,
        })
    }

    /// Device endpoint root, e.g. `http://10.0.0.5:1234/`.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Whether the entity has been turned on (a snapshot exists).
    pub async fn is_on(&self) -> bool {
        self.state.read().await.snapshot.is_some()
    }

    /// Poll the device once.
    ///
    /// No-op while off. A transport failure leaves the previous snapshot
    /// and cache untouched and is only logged; a body that fails to parse
    /// propagates to the caller with the snapshot untouched.
    pub async fn update(&self) -> Result<()> {
        if !self.is_on().await {
            return Ok(());
        }

        let body = match self.fetch("status").await {
            Ok(body) => body,
            Err(e) => {
                warn!("could not update media player at {}: {}", self.endpoint, e);
                return Ok(());
            }
        };
        let snapshot: Value =
            serde_json::from_str(&body).context("malformed status payload")?;

        let previous = {
            let mut state = self.state.write().await;
            state.snapshot.replace(snapshot)
        };
        self.publish_changes(previous.as_ref()).await;

        if self.state.read().await.playlists.is_none() {
            let body = match self.fetch("playlist").await {
                Ok(body) => body,
                Err(e) => {
                    warn!("could not fetch playlists from {}: {}", self.endpoint, e);
                    return Ok(());
                }
            };
            let payload: Value =
                serde_json::from_str(&body).context("malformed playlist payload")?;
            let names: Vec<String> = payload
                .get("playlist")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("playlist payload without playlist field"))?
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            debug!("cached {} playlists from {}", names.len(), self.endpoint);
            self.state.write().await.playlists = Some(names);
        }

        Ok(())
    }

    /// GET `{endpoint}/?command={command}&player_name={name}` and return
    /// the raw body.
    async fn fetch(&self, command: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(format!("{}?command={}", self.endpoint, command))
            .query(&[("player_name", self.name.as_str())])
            .send()
            .await?
            .text()
            .await
    }

    /// Dispatch a command code to the device, fire-and-forget.
    ///
    /// The current source is resolved to its zero-based index in the
    /// playlist cache (empty when unset or unknown) and sent along with
    /// the command and the player name. Transport failures are logged,
    /// never surfaced, never retried.
    pub async fn send_command(&self, command: CommandCode) {
        let playlist_index = {
            let state = self.state.read().await;
            match (&state.playlists, &state.current_playlist) {
                (Some(playlists), Some(current)) => playlists
                    .iter()
                    .position(|name| name == current)
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            }
        };

        let params = [
            ("command", command.as_str()),
            ("playlist", playlist_index.as_str()),
            ("player_name", self.name.as_str()),
        ];
        if let Err(e) = self.client.get(self.endpoint.clone()).query(&params).send().await {
            error!(
                "could not send command {} to multiroom at {}: {}",
                command, self.endpoint, e
            );
        }
    }

    /// Diff the previous snapshot against the current one and publish
    /// change events.
    async fn publish_changes(&self, previous: Option<&Value>) {
        let state = self.state.read().await;
        let current = state.snapshot.as_ref();

        let old_state = player::state_of(previous);
        let new_state = player::state_of(current);
        if old_state != new_state {
            self.bus.publish(BusEvent::StateChanged {
                player: self.name.clone(),
                state: new_state,
            });
        }

        let old_title = previous.and_then(player::title_of);
        let new_title = current.and_then(player::title_of);
        if old_title != new_title {
            self.bus.publish(BusEvent::NowPlayingChanged {
                player: self.name.clone(),
                title: new_title,
            });
        }

        let volume = |snapshot: Option<&Value>| {
            snapshot
                .map(|s| (player::volume_percent_of(s), player::is_muted(s)))
                .unwrap_or((0.0, false))
        };
        let (old_level, old_muted) = volume(previous);
        let (new_level, new_muted) = volume(current);
        if old_level != new_level || old_muted != new_muted {
            self.bus.publish(BusEvent::VolumeChanged {
                player: self.name.clone(),
                level: new_level,
                is_muted: new_muted,
            });
        }
    }

    /// Select a playlist by name and start playing it.
    ///
    /// An unknown name clears the current source and dispatches nothing.
    pub async fn play_media(&self, media_id: &str) {
        let known = {
            let state = self.state.read().await;
            state
                .playlists
                .as_ref()
                .is_some_and(|playlists| playlists.iter().any(|name| name == media_id))
        };

        if known {
            self.state.write().await.current_playlist = Some(media_id.to_string());
            self.bus.publish(BusEvent::SourceSelected {
                player: self.name.clone(),
                source: Some(media_id.to_string()),
            });
            self.send_command(CommandCode::Play).await;
        } else {
            self.state.write().await.current_playlist = None;
            warn!("unknown playlist name {media_id:?}");
            self.bus.publish(BusEvent::SourceSelected {
                player: self.name.clone(),
                source: None,
            });
        }
    }

    /// Current input source (playlist name), if any.
    pub async fn source(&self) -> Option<String> {
        self.state.read().await.current_playlist.clone()
    }

    /// Available input sources, once the playlist cache is populated.
    pub async fn source_list(&self) -> Option<Vec<String>> {
        self.state.read().await.playlists.clone()
    }

    /// Projected playback state.
    pub async fn state(&self) -> PlayerState {
        player::state_of(self.state.read().await.snapshot.as_ref())
    }

    /// Title of the currently playing media.
    pub async fn media_title(&self) -> Option<String> {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .and_then(player::title_of)
    }

    /// Volume as a percentage (0..100).
    pub async fn volume_level(&self) -> f32 {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .map(player::volume_percent_of)
            .unwrap_or(0.0)
    }

    pub async fn is_volume_muted(&self) -> bool {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .map(player::is_muted)
            .unwrap_or(false)
    }

    /// Duration of the current media in seconds.
    pub async fn media_duration(&self) -> Result<u32> {
        match self.state.read().await.snapshot.as_ref() {
            Some(snapshot) => player::duration_secs_of(snapshot),
            None => Ok(0),
        }
    }

    /// Play: toggles when the device is already playing or paused,
    /// otherwise replays the current source.
    pub async fn media_play(&self) {
        match self.state().await {
            PlayerState::Playing | PlayerState::Paused => {
                self.send_command(CommandCode::PlayPause).await;
            }
            _ => match self.source().await {
                Some(source) => self.play_media(&source).await,
                None => warn!("no source selected, nothing to play"),
            },
        }
    }

    pub async fn media_pause(&self) {
        self.send_command(CommandCode::PlayPause).await;
    }

    pub async fn media_stop(&self) {
        self.send_command(CommandCode::Stop).await;
    }

    /// Turn the entity on: purely local, seeds the snapshot with the
    /// `connect` sentinel so subsequent polls go out.
    pub async fn turn_on(&self) {
        self.state.write().await.snapshot = Some(json!({"state": "connect"}));
        self.bus.publish(BusEvent::PlayerTurnedOn {
            player: self.name.clone(),
        });
    }

    /// Turn the entity off: stop playback on the device and clear the
    /// snapshot, which disables polling until turned on again.
    pub async fn turn_off(&self) {
        self.send_command(CommandCode::Stop).await;
        self.state.write().await.snapshot = None;
        self.bus.publish(BusEvent::PlayerTurnedOff {
            player: self.name.clone(),
        });
    }
}

#[async_trait]
impl MediaPlayer for MultiroomAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_features(&self) -> u32 {
        support::ALL
    }

    async fn update(&self) -> Result<()> {
        MultiroomAdapter::update(self).await
    }

    async fn state(&self) -> PlayerState {
        MultiroomAdapter::state(self).await
    }

    async fn media_title(&self) -> Option<String> {
        MultiroomAdapter::media_title(self).await
    }

    async fn volume_level(&self) -> f32 {
        MultiroomAdapter::volume_level(self).await
    }

    async fn is_volume_muted(&self) -> bool {
        MultiroomAdapter::is_volume_muted(self).await
    }

    async fn media_duration(&self) -> Result<u32> {
        MultiroomAdapter::media_duration(self).await
    }

    async fn source(&self) -> Option<String> {
        MultiroomAdapter::source(self).await
    }

    async fn source_list(&self) -> Option<Vec<String>> {
        MultiroomAdapter::source_list(self).await
    }

    async fn volume_up(&self) {
        self.send_command(CommandCode::VolumeUp).await;
    }

    async fn volume_down(&self) {
        self.send_command(CommandCode::VolumeDown).await;
    }

    async fn mute_volume(&self) {
        self.send_command(CommandCode::Mute).await;
    }

    async fn media_play(&self) {
        MultiroomAdapter::media_play(self).await;
    }

    async fn media_pause(&self) {
        MultiroomAdapter::media_pause(self).await;
    }

    async fn media_stop(&self) {
        MultiroomAdapter::media_stop(self).await;
    }

    async fn media_next_track(&self) {
        self.send_command(CommandCode::NextTrack).await;
    }

    async fn media_previous_track(&self) {
        self.send_command(CommandCode::PreviousTrack).await;
    }

    async fn select_source(&self, source: &str) {
        self.play_media(source).await;
    }

    async fn turn_on(&self) {
        MultiroomAdapter::turn_on(self).await;
    }

    async fn turn_off(&self) {
        MultiroomAdapter::turn_off(self).await;
    }
}
