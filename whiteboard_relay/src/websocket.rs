use crate::relay::{ConnectionId, Outbound, Recipients, Relay, RelayPolicy};
use axum::{
    extract::{
        Path, State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use nanoid::nanoid;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{
    Mutex,
    broadcast::{self, error::RecvError},
};
use tracing::{debug, info, warn};
use whiteboard_client::shared_types::{ConnectionInfo, WsMessage};

// A relayed frame and who should see it.
#[derive(Debug, Clone)]
struct Envelope {
    recipients: Recipients,
    payload: Utf8Bytes,
}

/// One drawing room: a broadcast channel every connection in the room is
/// subscribed to, plus the relay state for those connections.
#[derive(Debug)]
pub struct Room {
    tx: broadcast::Sender<Envelope>,
    relay: Mutex<Relay>,
}

/// The shared state for our WebSocket rooms.
/// Rooms are created by their first connection and dropped with their last.
/// Lock order is always `rooms`, then a room's `relay`.
#[derive(Debug)]
pub struct AppWsState {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    policy: RelayPolicy,
    capacity: usize,
    default_room: String,
}

impl AppWsState {
    pub fn new(policy: RelayPolicy, capacity: usize, default_room: impl Into<String>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            policy,
            capacity,
            default_room: default_room.into(),
        }
    }

    pub fn policy(&self) -> RelayPolicy {
        self.policy
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn connection_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.lock().await;
        match rooms.get(room_id) {
            Some(room) => room.relay.lock().await.len(),
            None => 0,
        }
    }

    // Subscribes before returning, so nothing relayed after the join is missed.
    async fn join(&self, room_id: &str, id: &str) -> (Arc<Room>, broadcast::Receiver<Envelope>) {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!("Opening room {}", room_id);
                Arc::new(Room {
                    tx: broadcast::channel(self.capacity).0,
                    relay: Mutex::new(Relay::new(self.policy)),
                })
            })
            .clone();

        room.relay.lock().await.connect(id);
        let rx = room.tx.subscribe();
        (room, rx)
    }

    async fn leave(&self, room_id: &str, id: &str) {
        let mut rooms = self.rooms.lock().await;
        let now_empty = match rooms.get(room_id) {
            Some(room) => {
                let mut relay = room.relay.lock().await;
                relay.disconnect(id);
                relay.is_empty()
            }
            None => false,
        };

        if now_empty {
            rooms.remove(room_id);
            debug!("Closed empty room {}", room_id);
        }
    }
}

/// WebSocket entry point for the default room.
pub async fn default_room_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppWsState>>,
) -> impl IntoResponse {
    let room_id = state.default_room.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

/// WebSocket entry point for a named room.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppWsState>>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

/// The main logic for a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppWsState>, room_id: String) {
    let id: ConnectionId = nanoid!(10);
    info!("Client {} connected to room {}", id, room_id);

    let (room, mut rx) = state.join(&room_id, &id).await;

    // Split the WebSocket into a sender and receiver.
    let (mut sender, mut receiver) = socket.split();

    let welcome = WsMessage::Connected(ConnectionInfo {
        id: id.clone(),
        echoes: state.policy() == RelayPolicy::Echo,
    });
    let greeted = match serde_json::to_string(&welcome) {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode welcome for {}: {}", id, e);
            true
        }
    };

    if greeted {
        // Task to forward relayed frames from the room to this client.
        let send_id = id.clone();
        let mut send_task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if !envelope.recipients.includes(&send_id) {
                            continue;
                        }
                        if sender.send(Message::Text(envelope.payload)).await.is_err() {
                            break;
                        }
                    }
                    // A dropped segment only leaves a gap in the stroke.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Client {} fell behind, skipped {} frames", send_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        // Task to handle incoming frames from the client.
        let recv_id = id.clone();
        let recv_room = Arc::clone(&room);
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        let outbound = recv_room.relay.lock().await.handle(&recv_id, text.as_str());
                        if let Some(Outbound {
                            recipients,
                            payload,
                        }) = outbound
                        {
                            // No active subscribers, but that's okay.
                            let _ = recv_room.tx.send(Envelope {
                                recipients,
                                payload: payload.into(),
                            });
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        // Wait for either task to finish. If one does, the other should be aborted.
        tokio::select! {
            _ = (&mut send_task) => recv_task.abort(),
            _ = (&mut recv_task) => send_task.abort(),
        };
    }

    state.leave(&room_id, &id).await;
    info!("Client {} disconnected from room {}", id, room_id);
}
