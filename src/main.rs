use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use log::info;

use chess_rooms::config::ServerConfig;
use chess_rooms::models::AppState;
use chess_rooms::rooms::RoomRegistry;
use chess_rooms::routes;

/// Periodically closes rooms nobody has touched for a while.
fn spawn_idle_sweeper(app_state: web::Data<AppState>, config: &ServerConfig) {
    let max_idle = config.room_idle_timeout();
    let every = config.sweep_interval();
    actix_rt::spawn(async move {
        let mut ticker = actix_rt::time::interval(every);
        loop {
            ticker.tick().await;
            app_state.sweep_idle(max_idle);
        }
    });
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = ServerConfig::parse();

    let app_state = web::Data::new(AppState::new(RoomRegistry::new()));
    spawn_idle_sweeper(app_state.clone(), &config);

    let (host, port) = config.bind_addr();
    info!("Starting chess server at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(routes::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
