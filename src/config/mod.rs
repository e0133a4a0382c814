//! Configuration management

use anyhow::Result;
use serde::Deserialize;

/// Bridge configuration.
///
/// `host` is the only required setting; everything else has a default
/// matching the device's factory configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Device host, with or without a scheme
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Entity name, also sent to the device as `player_name`
    #[serde(default = "default_name")]
    pub name: String,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_port() -> u16 {
    1234
}

fn default_name() -> String {
    "multiroom".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

/// Get config directory (MULTIROOM_CONFIG_DIR, XDG, or platform default)
pub fn get_config_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("MULTIROOM_CONFIG_DIR") {
        return std::path::PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home)
                .join("Library/Application Support/multiroom-bridge");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return std::path::PathBuf::from(xdg).join("multiroom-bridge");
        }
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home).join(".config/multiroom-bridge");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return std::path::PathBuf::from(appdata).join("multiroom-bridge");
        }
    }

    std::path::PathBuf::from(".")
}

/// Load configuration from file and environment.
///
/// Precedence: `MULTIROOM_*` environment variables, then legacy
/// `MPC_HOST`/`MPC_PORT`, then the `config` file in the config dir, then
/// defaults. Fails when no host is configured anywhere.
pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", 1234)?
        .set_default("name", "multiroom")?
        .set_default("poll_interval_secs", 10)?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        .add_source(::config::Environment::with_prefix("MULTIROOM").try_parsing(true));

    // Explicit precedence for host/port: MULTIROOM_* > legacy MPC_* >
    // config file > default. The legacy vars are still set by existing
    // deployments and only apply when the prefixed var is absent.
    if let Ok(host) = std::env::var("MULTIROOM_HOST") {
        builder = builder.set_override("host", host)?;
    } else if let Ok(host) = std::env::var("MPC_HOST") {
        builder = builder.set_override("host", host)?;
    }
    if let Ok(port) = std::env::var("MULTIROOM_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("MPC_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}
