use std::time::Duration;

use clap::Parser;

/// Server settings, read from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess_rooms", about = "Two-player chess rooms over HTTP and WebSocket")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "CHESS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Rooms untouched for this long are closed
    #[arg(
        long,
        env = "ROOM_IDLE_TIMEOUT_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub room_idle_timeout_secs: u64,

    /// How often to look for idle rooms
    #[arg(
        long,
        env = "ROOM_SWEEP_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn room_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room_idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
