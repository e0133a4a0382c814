//! Multiroom Bridge
//!
//! Exposes a remote MPC-HC style media player (HTTP web API with
//! query-string command codes) as a single media-player entity.
//!
//! This library provides:
//! - A polling adapter over the device's status/playlist endpoints
//! - A `MediaPlayer` trait as the seam toward a host automation framework
//! - A fixed-cadence poll driver with cancellation
//! - An event bus publishing state/volume/now-playing changes

pub mod adapter;
pub mod bus;
pub mod config;
pub mod entity;
pub mod player;
pub mod poller;
