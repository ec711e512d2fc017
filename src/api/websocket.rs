use std::sync::Arc;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use crate::api::AppState;
use crate::broadcast::{ClientMessage, ServerMessage};
use crate::types::ConnectionId;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    tracing::info!("Client connected: {}", id);

    // Drain this connection's outbound queue onto the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to encode frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Handle control frames from the client
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match ClientMessage::parse(&text) {
                    Ok(ClientMessage::Subscribe(filters)) => {
                        let broadcaster = recv_state.broadcaster.clone();
                        let options = filters.to_query(broadcaster.view(), &recv_state.pagination);
                        broadcaster.register(id, tx.clone());

                        // Fetch the first page off the read loop
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            broadcaster.push_initial_page(id, &tx, &options).await;
                        });
                    }
                    Ok(ClientMessage::Unsubscribe) => {
                        recv_state.broadcaster.unsubscribe(&id);
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring frame from {}: {}", id, e);
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.broadcaster.disconnect(&id);
}
