//! Media-player entity contract.
//!
//! This trait is the seam toward the host automation framework: the
//! framework owns entity registration and scheduling, the implementor owns
//! the device protocol. Properties are read-only projections of the last
//! polled snapshot; command methods are fire-and-forget.

use anyhow::Result;
use async_trait::async_trait;

use crate::player::PlayerState;

/// A single remotely controlled media player.
#[async_trait]
pub trait MediaPlayer: Send + Sync + 'static {
    /// Entity name, also sent to the device as `player_name`.
    fn name(&self) -> &str;

    /// Feature bitmask (see [`crate::player::support`]).
    fn supported_features(&self) -> u32;

    /// Poll the device once and refresh the snapshot.
    ///
    /// No-op while the entity is off. Transport failures are logged and
    /// swallowed; a malformed response body is the one error that
    /// surfaces here.
    async fn update(&self) -> Result<()>;

    // Properties

    async fn state(&self) -> PlayerState;
    async fn media_title(&self) -> Option<String>;
    /// Volume as a percentage (0..100).
    async fn volume_level(&self) -> f32;
    async fn is_volume_muted(&self) -> bool;
    /// Duration of the current media in seconds. Errors on a malformed
    /// duration string from the device.
    async fn media_duration(&self) -> Result<u32>;
    /// Currently selected input source (playlist name).
    async fn source(&self) -> Option<String>;
    /// Available input sources, once the playlist cache is populated.
    async fn source_list(&self) -> Option<Vec<String>>;

    // Commands

    async fn volume_up(&self);
    async fn volume_down(&self);
    async fn mute_volume(&self);
    async fn media_play(&self);
    async fn media_pause(&self);
    async fn media_stop(&self);
    async fn media_next_track(&self);
    async fn media_previous_track(&self);
    async fn select_source(&self, source: &str);
    async fn turn_on(&self);
    async fn turn_off(&self);
}
