//! Two-player chess rooms: a rules engine, a room registry that seats players
//! and serializes their moves, and the HTTP/WebSocket surface in front of it.

pub mod config;
pub mod game;
pub mod models;
pub mod rooms;
pub mod routes;
pub mod websocket;
