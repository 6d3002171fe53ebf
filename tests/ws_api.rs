use std::fmt::Debug;
use std::time::Duration;

use actix_web::{web, App};
use awc::ws;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::{json, Value};

use chess_rooms::models::AppState;
use chess_rooms::rooms::RoomRegistry;
use chess_rooms::routes::configure_routes;

fn server(state: web::Data<AppState>) -> actix_test::TestServer {
    actix_test::start(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure_routes)
    })
}

fn shared_state() -> web::Data<AppState> {
    web::Data::new(AppState::new(RoomRegistry::new()))
}

async fn send<S>(conn: &mut S, frame: Value)
where
    S: Sink<ws::Message> + Unpin,
    S::Error: Debug,
{
    conn.send(ws::Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame, parsed. Control frames are skipped.
async fn recv<S, E>(conn: &mut S) -> Value
where
    S: Stream<Item = Result<ws::Frame, E>> + Unpin,
    E: Debug,
{
    loop {
        match conn.next().await {
            Some(Ok(ws::Frame::Text(bytes))) => return serde_json::from_slice(&bytes).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("connection ended: {other:?}"),
        }
    }
}

#[actix_web::test]
async fn two_players_play_over_websocket() {
    let mut srv = server(shared_state());
    let mut host = srv.ws_at("/ws").await.unwrap();
    let mut guest = srv.ws_at("/ws").await.unwrap();

    send(&mut host, json!({"type": "createRoom", "nickname": "alice"})).await;
    let created = recv(&mut host).await;
    assert_eq!(created["type"], "roomCreated");
    assert_eq!(created["color"], "white");
    let room_id = created["roomId"].as_str().unwrap().to_string();

    send(
        &mut guest,
        json!({"type": "joinRoom", "roomId": room_id.to_lowercase(), "nickname": "bob"}),
    )
    .await;
    let joined = recv(&mut guest).await;
    assert_eq!(joined["type"], "roomJoined");
    assert_eq!(joined["opponentNickname"], "alice");
    let state = recv(&mut guest).await;
    assert_eq!(state["type"], "gameState");
    assert_eq!(state["version"], 1);

    let notice = recv(&mut host).await;
    assert_eq!(notice["type"], "opponentJoined");
    assert_eq!(notice["opponentNickname"], "bob");
    assert_eq!(recv(&mut host).await["version"], 1);

    // room and player come from the connection, not from the frame
    send(
        &mut host,
        json!({
            "type": "move",
            "roomId": "ZZZZZZ",
            "playerId": "someone-else",
            "move": {"from": "e2", "to": "e4"}
        }),
    )
    .await;
    for conn in [&mut host, &mut guest] {
        let update = recv(conn).await;
        assert_eq!(update["type"], "gameState");
        assert_eq!(update["roomId"], room_id.as_str());
        assert_eq!(update["version"], 2);
        assert_eq!(update["game"]["turn"], "black");
    }

    send(&mut host, json!({"type": "move", "move": {"from": "d2", "to": "d4"}})).await;
    let rejected = recv(&mut host).await;
    assert_eq!(rejected["type"], "error");
    assert_eq!(rejected["code"], "NOT_YOUR_TURN");

    send(&mut guest, json!({"type": "legalMoves", "square": "g8"})).await;
    let moves = recv(&mut guest).await;
    assert_eq!(moves["type"], "legalMoves");
    assert_eq!(moves["moves"].as_array().unwrap().len(), 2);

    send(&mut guest, json!({"type": "getState"})).await;
    let snapshot = recv(&mut guest).await;
    assert_eq!(snapshot["type"], "roomState");
    assert_eq!(snapshot["status"], "active");
    assert_eq!(snapshot["version"], 2);
}

#[actix_web::test]
async fn unseated_and_already_seated_requests_are_refused() {
    let mut srv = server(shared_state());
    let mut conn = srv.ws_at("/ws").await.unwrap();

    send(&mut conn, json!({"type": "move", "move": {"from": "e2", "to": "e4"}})).await;
    assert_eq!(recv(&mut conn).await["code"], "NOT_SEATED");
    send(&mut conn, json!({"type": "resign"})).await;
    assert_eq!(recv(&mut conn).await["code"], "NOT_SEATED");

    send(&mut conn, json!({"type": "createRoom", "nickname": "alice"})).await;
    let created = recv(&mut conn).await;
    assert_eq!(created["type"], "roomCreated");
    let room_id = created["roomId"].as_str().unwrap().to_string();

    send(&mut conn, json!({"type": "createRoom", "nickname": "alice"})).await;
    assert_eq!(recv(&mut conn).await["code"], "MALFORMED_REQUEST");
    send(
        &mut conn,
        json!({"type": "joinRoom", "roomId": room_id, "nickname": "alice"}),
    )
    .await;
    assert_eq!(recv(&mut conn).await["code"], "MALFORMED_REQUEST");

    send(&mut conn, json!({"type": "teleport"})).await;
    assert_eq!(recv(&mut conn).await["code"], "UNKNOWN_OPERATION");
    conn.send(ws::Message::Text("{not json".into())).await.unwrap();
    assert_eq!(recv(&mut conn).await["code"], "MALFORMED_REQUEST");
}

#[actix_web::test]
async fn closing_a_seated_connection_notifies_the_opponent() {
    let state = shared_state();
    let mut srv = server(state.clone());
    let mut host = srv.ws_at("/ws").await.unwrap();
    let mut guest = srv.ws_at("/ws").await.unwrap();

    send(&mut host, json!({"type": "createRoom", "nickname": "alice"})).await;
    let room_id = recv(&mut host).await["roomId"]
        .as_str()
        .unwrap()
        .to_string();
    send(
        &mut guest,
        json!({"type": "joinRoom", "roomId": room_id, "nickname": "bob"}),
    )
    .await;
    assert_eq!(recv(&mut guest).await["type"], "roomJoined");
    assert_eq!(recv(&mut guest).await["type"], "gameState");
    assert_eq!(recv(&mut host).await["type"], "opponentJoined");
    assert_eq!(recv(&mut host).await["type"], "gameState");

    guest.send(ws::Message::Close(None)).await.unwrap();
    assert_eq!(recv(&mut host).await["type"], "opponentDisconnected");
    assert_eq!(state.registry.room_count(), 0);

    // the room is gone, so the host is free to open a new one
    send(&mut host, json!({"type": "createRoom", "nickname": "alice"})).await;
    assert_eq!(recv(&mut host).await["type"], "roomCreated");
}

#[actix_web::test]
async fn idle_sweep_closes_the_room() {
    let state = shared_state();
    let mut srv = server(state.clone());
    let mut host = srv.ws_at("/ws").await.unwrap();

    send(&mut host, json!({"type": "createRoom", "nickname": "alice"})).await;
    let room_id = recv(&mut host).await["roomId"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(state.sweep_idle(Duration::from_secs(3600)), 0);
    assert_eq!(state.sweep_idle(Duration::ZERO), 1);
    let closed = recv(&mut host).await;
    assert_eq!(closed["type"], "roomClosed");
    assert_eq!(closed["roomId"], room_id.as_str());

    send(&mut host, json!({"type": "getState"})).await;
    assert_eq!(recv(&mut host).await["code"], "NOT_SEATED");
}
