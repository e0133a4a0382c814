//! Mock MPC-HC style device for testing
//!
//! Simulates the web API at the endpoint root: `?command=status` and
//! `?command=playlist` serve JSON, any other command code is recorded
//! together with its `playlist` and `player_name` query parameters.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// One recorded command dispatch
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub command: String,
    pub playlist: String,
    pub player_name: String,
}

struct MockDeviceState {
    /// Raw body served for `command=status` (not necessarily valid JSON)
    status_body: String,
    playlist_names: Vec<String>,
    commands: Vec<CommandRecord>,
    status_hits: usize,
    playlist_hits: usize,
}

/// Mock multiroom device server
pub struct MockMultiroomServer {
    addr: SocketAddr,
    state: Arc<RwLock<MockDeviceState>>,
    handle: JoinHandle<()>,
}

impl MockMultiroomServer {
    /// Start a mock device on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockDeviceState {
            status_body: json!({"state": "connect"}).to_string(),
            playlist_names: Vec::new(),
            commands: Vec::new(),
            status_hits: 0,
            playlist_hits: 0,
        }));

        let app = Router::new()
            .route("/", get(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Set the status JSON served to the next polls
    pub async fn set_status(&self, status: Value) {
        self.state.write().await.status_body = status.to_string();
    }

    /// Serve a raw (possibly malformed) status body
    pub async fn set_raw_status(&self, body: &str) {
        self.state.write().await.status_body = body.to_string();
    }

    /// Set the playlist names served for `command=playlist`
    pub async fn set_playlists(&self, names: &[&str]) {
        self.state.write().await.playlist_names =
            names.iter().map(|s| s.to_string()).collect();
    }

    /// Commands recorded so far (excluding status/playlist reads)
    pub async fn commands(&self) -> Vec<CommandRecord> {
        self.state.read().await.commands.clone()
    }

    pub async fn status_hits(&self) -> usize {
        self.state.read().await.status_hits
    }

    pub async fn playlist_hits(&self) -> usize {
        self.state.read().await.playlist_hits
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn handle_request(
    State(state): State<Arc<RwLock<MockDeviceState>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, StatusCode> {
    let command = params.get("command").ok_or(StatusCode::BAD_REQUEST)?;

    let mut state = state.write().await;
    match command.as_str() {
        "status" => {
            state.status_hits += 1;
            Ok(state.status_body.clone())
        }
        "playlist" => {
            state.playlist_hits += 1;
            Ok(json!({"playlist": state.playlist_names}).to_string())
        }
        other => {
            state.commands.push(CommandRecord {
                command: other.to_string(),
                playlist: params.get("playlist").cloned().unwrap_or_default(),
                player_name: params.get("player_name").cloned().unwrap_or_default(),
            });
            Ok("OK".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_device_starts_and_stops() {
        let server = MockMultiroomServer::start().await;
        assert!(server.addr().port() > 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn mock_device_serves_status_and_counts_hits() {
        let server = MockMultiroomServer::start().await;
        server.set_status(json!({"state": "playing"})).await;

        let client = reqwest::Client::new();
        let body = client
            .get(format!(
                "http://{}/?command=status&player_name=test",
                server.addr()
            ))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["state"], "playing");
        assert_eq!(server.status_hits().await, 1);

        server.stop().await;
    }

    #[tokio::test]
    async fn mock_device_records_commands() {
        let server = MockMultiroomServer::start().await;

        let client = reqwest::Client::new();
        client
            .get(format!(
                "http://{}/?command=player_stop&playlist=&player_name=test",
                server.addr()
            ))
            .send()
            .await
            .unwrap();

        let commands = server.commands().await;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "player_stop");
        assert_eq!(commands[0].playlist, "");
        assert_eq!(commands[0].player_name, "test");

        server.stop().await;
    }
}
