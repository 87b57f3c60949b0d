use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream::{self, StreamExt};
use rl_core::types::ChatMessage;
use rl_core::Result;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::warn;

use crate::AppState;

const FANOUT_BUFFER: usize = 256;

/// Process-wide chat log: an append-only message sequence plus a broadcast
/// fan-out for live subscribers. Resets with the process.
pub struct ChatLog {
    messages: Mutex<Vec<ChatMessage>>,
    fanout: broadcast::Sender<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        let (fanout, _) = broadcast::channel(FANOUT_BUFFER);
        Self {
            messages: Mutex::new(Vec::new()),
            fanout,
        }
    }

    /// Appends a message and fans it out to every live subscriber. The id is
    /// the log length at insert time.
    pub async fn post(&self, user: String, text: String) -> ChatMessage {
        let mut messages = self.messages.lock().await;
        let message = ChatMessage {
            id: messages.len() as u64,
            user,
            text,
        };
        messages.push(message.clone());
        // A send error only means nobody is listening right now.
        let _ = self.fanout.send(message.clone());
        message
    }

    /// Current snapshot plus a live receiver. Both are taken under the log
    /// lock, so a racing post lands in exactly one of the two.
    pub async fn subscribe(&self) -> (Vec<ChatMessage>, broadcast::Receiver<ChatMessage>) {
        let messages = self.messages.lock().await;
        (messages.clone(), self.fanout.subscribe())
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub user: String,
    pub text: String,
}

fn encode_line(message: &ChatMessage) -> Result<String> {
    Ok(serde_json::to_string(message)? + "\n")
}

/// Newline-delimited JSON stream: the full snapshot, then live inserts until
/// the client goes away.
pub async fn chat_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (snapshot, live) = state.chat.subscribe().await;

    let snapshot = stream::iter(snapshot).map(|message| encode_line(&message));
    let live = stream::unfold(live, |mut rx| async move {
        match rx.recv().await {
            Ok(message) => Some((encode_line(&message), rx)),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("chat subscriber lagged, closing its stream ({missed} missed)");
                None
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    });

    let body = Body::from_stream(snapshot.chain(live));
    ([(header::CONTENT_TYPE, "application/x-ndjson")], body)
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<IncomingMessage>,
) -> Json<ChatMessage> {
    Json(state.chat.post(message.user, message.text).await)
}
