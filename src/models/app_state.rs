use actix::Addr;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{ChessWebSocketMessage, ServerMessage};
use crate::rooms::{RoomRegistry, RoomUpdate};
use crate::websocket::ChessWebSocket;

/// Application state shared between connections
pub struct AppState {
    pub registry: RoomRegistry,
    pub sessions: Mutex<HashMap<String, Addr<ChessWebSocket>>>,
}

impl AppState {
    pub fn new(registry: RoomRegistry) -> Self {
        AppState {
            registry,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, id: &str, addr: Addr<ChessWebSocket>) -> usize {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(id.to_string(), addr);
                sessions.len()
            }
            Err(_) => {
                warn!("Session table poisoned, connection {} not registered", id);
                0
            }
        }
    }

    pub fn unregister(&self, id: &str) -> usize {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.remove(id);
                sessions.len()
            }
            Err(_) => 0,
        }
    }

    /// Pushes `message` to every listed connection that is still open.
    pub fn broadcast(&self, connections: &[String], message: &ServerMessage) {
        if connections.is_empty() {
            return;
        }
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize broadcast: {}", e);
                return;
            }
        };
        let Ok(sessions) = self.sessions.lock() else {
            warn!("Session table poisoned, dropping broadcast");
            return;
        };
        for id in connections {
            match sessions.get(id) {
                Some(addr) => addr.do_send(ChessWebSocketMessage(text.clone())),
                None => debug!("Connection {} is gone, skipping", id),
            }
        }
    }

    /// Sends a committed state to the duplex connections seated in its room.
    pub fn publish(&self, update: &RoomUpdate) {
        self.broadcast(&update.recipients, &ServerMessage::from(update));
    }

    /// Closes rooms idle for at least `max_idle` and tells whoever is still
    /// connected to them. Returns how many rooms were closed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let expired = self.registry.remove_idle(max_idle);
        for departure in &expired {
            self.broadcast(
                &departure.notify,
                &ServerMessage::RoomClosed {
                    room_id: departure.room_id.clone(),
                },
            );
        }
        if !expired.is_empty() {
            info!("Idle sweep closed {} room(s)", expired.len());
        }
        expired.len()
    }
}
