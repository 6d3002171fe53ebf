use actix_web::{web, HttpResponse, Responder};

use crate::rooms::RoomError;

pub mod api;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Rooms")
}

/// Body extractor settings: undecodable or incomplete bodies are reported
/// with the same error shape as every other rejected request.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| RoomError::MalformedRequest(err.to_string()).into())
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(
            web::scope("/api")
                .route("/warmup", web::get().to(api::warmup))
                .route("/room", web::post().to(api::create_room))
                .route("/room/{room_id}/join", web::post().to(api::join_room))
                .route("/room/{room_id}/move", web::post().to(api::submit_move))
                .route("/room/{room_id}/resign", web::post().to(api::resign))
                .route("/room/{room_id}/new-game", web::post().to(api::new_game))
                .route("/room/{room_id}/state", web::get().to(api::room_state))
                .route(
                    "/room/{room_id}/moves/{square}",
                    web::get().to(api::legal_moves),
                ),
        )
        .service(web::resource("/").route(web::get().to(index)));
}
