use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::*;
use crate::rooms::RoomError;

/// WebSocket handler for one client connection. The connection's seat, if
/// any, lives in the room registry under `id`.
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total_sessions = self.app_state.register(&self.id, ctx.address());
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let Some(departure) = self.app_state.registry.disconnect(&self.id) {
            info!(
                "Connection {} left room {}, notifying {} peer(s)",
                self.id,
                departure.room_id,
                departure.notify.len()
            );
            self.app_state
                .broadcast(&departure.notify, &ServerMessage::OpponentDisconnected);
        }

        let total_sessions = self.app_state.unregister(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                info!("Received text message on {}: {}", self.id, text);
                match ClientMessage::parse(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send_error(&e, ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_error(
                    &RoomError::MalformedRequest("binary messages are not supported".into()),
                    ctx,
                );
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    /// Writes a frame to this connection only.
    pub fn send(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }

    pub fn send_error(&self, err: &RoomError, ctx: &mut ws::WebsocketContext<Self>) {
        self.send(&ServerMessage::from(err), ctx);
    }

    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let result = match msg {
            ClientMessage::CreateRoom { nickname } => self.handle_create(&nickname, ctx),
            ClientMessage::JoinRoom { room_id, nickname } => {
                self.handle_join(&room_id, &nickname, ctx)
            }
            ClientMessage::Move { mv } => self.handle_move(mv),
            ClientMessage::Resign {} => self.handle_resign(),
            ClientMessage::NewGame {} => self.handle_new_game(),
            ClientMessage::LegalMoves { square } => self.handle_legal_moves(&square, ctx),
            ClientMessage::GetState {} => self.handle_get_state(ctx),
        };
        if let Err(e) = result {
            self.send_error(&e, ctx);
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    // Generate a unique ID for this connection
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection request, assigned id {}", id);

    let ws = ChessWebSocket {
        id,
        app_state: app_state.clone(),
    };
    ws::start(ws, &req, stream)
}
