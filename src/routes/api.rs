use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::models::{AppState, ServerMessage};
use crate::rooms::{RoomError, RoomUpdate};

impl ResponseError for RoomError {
    fn status_code(&self) -> StatusCode {
        match self {
            RoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            RoomError::RoomFull => StatusCode::CONFLICT,
            RoomError::NotSeated => StatusCode::FORBIDDEN,
            RoomError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "error": self.to_string(),
        }))
    }
}

#[derive(Deserialize, Debug)]
pub struct NicknameBody {
    pub nickname: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBody {
    pub player_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    pub player_id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

/// Answers the caller and forwards the new state to any duplex connections
/// seated in the room.
fn respond_with_update(state: &AppState, update: RoomUpdate) -> HttpResponse {
    state.publish(&update);
    HttpResponse::Ok().json(update)
}

pub async fn warmup() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

pub async fn create_room(
    state: web::Data<AppState>,
    body: web::Json<NicknameBody>,
) -> Result<HttpResponse, RoomError> {
    let created = state.registry.create_room(&body.nickname, None)?;
    Ok(HttpResponse::Ok().json(created))
}

pub async fn join_room(
    state: web::Data<AppState>,
    room_id: web::Path<String>,
    body: web::Json<NicknameBody>,
) -> Result<HttpResponse, RoomError> {
    let joined = state.registry.join_room(&room_id, &body.nickname, None)?;
    if let Some(host) = &joined.host_connection {
        let host = [host.clone()];
        state.broadcast(
            &host,
            &ServerMessage::OpponentJoined {
                opponent_nickname: body.nickname.trim().to_string(),
            },
        );
        state.broadcast(&host, &ServerMessage::from(&joined));
    }
    Ok(HttpResponse::Ok().json(joined))
}

pub async fn submit_move(
    state: web::Data<AppState>,
    room_id: web::Path<String>,
    body: web::Json<MoveBody>,
) -> Result<HttpResponse, RoomError> {
    let update = state.registry.submit_move(
        &room_id,
        &body.player_id,
        &body.from,
        &body.to,
        body.promotion.as_deref(),
    )?;
    Ok(respond_with_update(&state, update))
}

pub async fn resign(
    state: web::Data<AppState>,
    room_id: web::Path<String>,
    body: web::Json<PlayerBody>,
) -> Result<HttpResponse, RoomError> {
    let update = state.registry.resign(&room_id, &body.player_id)?;
    Ok(respond_with_update(&state, update))
}

pub async fn new_game(
    state: web::Data<AppState>,
    room_id: web::Path<String>,
    body: web::Json<PlayerBody>,
) -> Result<HttpResponse, RoomError> {
    let update = state.registry.new_game(&room_id, &body.player_id)?;
    info!("New game in room {} via HTTP", update.room_id);
    Ok(respond_with_update(&state, update))
}

pub async fn room_state(
    state: web::Data<AppState>,
    room_id: web::Path<String>,
) -> Result<HttpResponse, RoomError> {
    Ok(HttpResponse::Ok().json(state.registry.state(&room_id)?))
}

pub async fn legal_moves(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, RoomError> {
    let (room_id, square) = path.into_inner();
    let moves = state.registry.legal_moves(&room_id, &square)?;
    Ok(HttpResponse::Ok().json(json!({ "moves": moves })))
}
