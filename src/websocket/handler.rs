use crate::{error::ApiError, websocket::messages::ServerMessage, AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use serde::Serialize;
use std::{fmt::Display, sync::Arc};

/// WebSocket upgrade handler for a game's live result feed
pub async fn handle_game_results_socket(
    Path(game_id): Path<i64>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.get_game(game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }

    tracing::info!(game_id, "Live result viewer connecting");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, game_id)))
}

/// Pump broadcasts for one game to a single viewer until either side closes
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, game_id: i64) {
    let (mut sender, mut receiver) = socket.split();
    let subscription = state.broadcaster.subscribe(game_id);
    let connection_id = subscription.connection_id;
    let mut rx = subscription.receiver;

    tracing::info!(
        game_id,
        %connection_id,
        viewers = state.broadcaster.subscriber_count(game_id),
        "Live result viewer connected"
    );

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        let hello = ServerMessage::Subscribed { game_id };
        if send_json(&mut sender, &hello).await.is_err() {
            return;
        }
        while let Some(msg) = rx.recv().await {
            if send_json(&mut sender, &msg).await.is_err() {
                break;
            }
        }
    });

    // Viewers only listen; incoming frames are read to notice the close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                tracing::debug!(game_id, %connection_id, "Viewer sent close frame");
                break;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    state.broadcaster.unsubscribe(game_id, connection_id);

    tracing::info!(game_id, %connection_id, "Live result viewer disconnected");
}

/// Send one JSON text frame. Err means the viewer should be dropped.
async fn send_json<S, T>(sender: &mut S, msg: &T) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    T: Serialize,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            return Err(());
        }
    };

    sender.send(Message::Text(json.into())).await.map_err(|e| {
        tracing::debug!("WebSocket send failed: {}", e);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_send_json_writes_a_text_frame() {
        let (mut tx, mut rx) = mpsc::channel::<Message>(4);
        let msg = ServerMessage::Subscribed { game_id: 3 };
        assert!(send_json(&mut tx, &msg).await.is_ok());

        match rx.try_next().unwrap() {
            Some(Message::Text(text)) => {
                assert_eq!(text.as_str(), r#"{"type":"subscribed","game_id":3}"#)
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_json_reports_unserializable_message() {
        let (mut tx, mut rx) = mpsc::channel::<Message>(4);
        // JSON object keys must be strings
        let unserializable: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);

        assert!(send_json(&mut tx, &unserializable).await.is_err());
        assert!(rx.try_next().is_err());
    }

    #[tokio::test]
    async fn test_send_json_reports_closed_sink() {
        let (mut tx, rx) = mpsc::channel::<Message>(4);
        drop(rx);
        let msg = ServerMessage::Subscribed { game_id: 3 };
        assert!(send_json(&mut tx, &msg).await.is_err());
    }
}
