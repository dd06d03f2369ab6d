// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket live feed of newly stored commits.
//!
//! Server -> Client (JSON), one commit per message in the same wire shape
//! as the REST endpoints:
//! ```json
//! {"id": "…", "author": "…", "coordinates": [52.5, 13.4], …}
//! ```
//!
//! The feed is one-directional; client frames other than Close are
//! ignored. A consumer that falls behind the broadcast buffer is resumed
//! at the live edge — the feed is a pulse, not a replay log.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::server::GatewayState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Forward broadcast commits to one WebSocket client until it leaves.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut live_rx = state.live_tx.subscribe();

    loop {
        tokio::select! {
            received = live_rx.recv() => {
                match received {
                    Ok(commit) => {
                        let Ok(payload) = serde_json::to_string(&commit) else {
                            continue;
                        };
                        if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "live feed consumer lagged; resuming at live edge");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // one-directional feed
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("live feed client disconnected");
}

#[cfg(test)]
mod tests {
    use gitpulse_core::types::{Commit, GeoPoint};
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn broadcast_delivers_commits_to_subscribers() {
        let (tx, mut rx) = broadcast::channel::<Commit>(8);
        let commit = Commit {
            id: "sha".into(),
            author: "alice".into(),
            author_url: "https://github.com/alice".into(),
            message: "update".into(),
            repository: "alice/repo".into(),
            timestamp: 1,
            coordinates: Some(GeoPoint::new(52.5, 13.4)),
            language: None,
        };
        tx.send(commit.clone()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), commit);
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_commits() {
        let (tx, _keepalive) = broadcast::channel::<Commit>(8);
        let commit = Commit {
            id: "early".into(),
            author: "alice".into(),
            author_url: "https://github.com/alice".into(),
            message: "update".into(),
            repository: "alice/repo".into(),
            timestamp: 1,
            coordinates: None,
            language: None,
        };
        tx.send(commit).unwrap();

        // The feed is live-edge only: a consumer connecting now sees
        // nothing until the next stored commit.
        let mut rx = tx.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
