//! WebSocket push endpoint
//!
//! Each accepted connection becomes one observer of the notification hub and
//! receives every catalog event as a JSON text frame until either side closes.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notifications::{EventReceiver, NotificationHub};
use crate::web::AppState;

/// `GET /ws`
pub async fn notifications_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = state.catalog.notifications().clone();
    ws.on_upgrade(move |socket| observe(socket, hub))
}

async fn observe(socket: WebSocket, hub: NotificationHub) {
    let observer_id = Uuid::new_v4();
    let events = hub.subscribe();
    info!(%observer_id, observers = hub.observer_count(), "Push observer connected");

    forward_events(socket, events, observer_id).await;

    info!(%observer_id, "Push observer disconnected");
}

async fn forward_events(socket: WebSocket, mut events: EventReceiver, observer_id: Uuid) {
    let (mut outgoing, mut incoming) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(%observer_id, "Failed to encode {} event: {}", event.kind(), e);
                            continue;
                        }
                    };
                    if let Err(e) = outgoing.send(Message::Text(text)).await {
                        debug!(%observer_id, "Push delivery failed: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%observer_id, skipped, "Push observer lagging, events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%observer_id, "Push connection error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
