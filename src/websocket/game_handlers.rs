use actix_web_actors::ws;
use log::info;

use crate::models::{MovePayload, ServerMessage};
use crate::rooms::{RoomError, RoomResult, Seat};
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    fn seat(&self) -> RoomResult<Seat> {
        self.app_state
            .registry
            .seat_of(&self.id)
            .ok_or(RoomError::NotSeated)
    }

    fn ensure_unseated(&self) -> RoomResult<()> {
        match self.app_state.registry.seat_of(&self.id) {
            Some(seat) => Err(RoomError::MalformedRequest(format!(
                "already seated in room {}",
                seat.room_id
            ))),
            None => Ok(()),
        }
    }

    pub fn handle_create(
        &mut self,
        nickname: &str,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> RoomResult<()> {
        self.ensure_unseated()?;
        let created = self.app_state.registry.create_room(nickname, Some(&self.id))?;
        info!("Connection {} created room {}", self.id, created.room_id);
        self.send(&ServerMessage::RoomCreated(created), ctx);
        Ok(())
    }

    pub fn handle_join(
        &mut self,
        room_id: &str,
        nickname: &str,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> RoomResult<()> {
        self.ensure_unseated()?;
        let joined = self
            .app_state
            .registry
            .join_room(room_id, nickname, Some(&self.id))?;
        info!("Connection {} joined room {}", self.id, joined.room_id);

        let game = ServerMessage::from(&joined);
        let host: Vec<String> = joined.host_connection.iter().cloned().collect();
        self.app_state.broadcast(
            &host,
            &ServerMessage::OpponentJoined {
                opponent_nickname: nickname.trim().to_string(),
            },
        );
        self.app_state.broadcast(&host, &game);

        self.send(&ServerMessage::RoomJoined(joined), ctx);
        self.send(&game, ctx);
        Ok(())
    }

    pub fn handle_move(&mut self, mv: MovePayload) -> RoomResult<()> {
        let seat = self.seat()?;
        let update = self.app_state.registry.submit_move(
            &seat.room_id,
            &seat.player_id,
            &mv.from,
            &mv.to,
            mv.promotion.as_deref(),
        )?;
        self.app_state.publish(&update);
        Ok(())
    }

    pub fn handle_resign(&mut self) -> RoomResult<()> {
        let seat = self.seat()?;
        let update = self
            .app_state
            .registry
            .resign(&seat.room_id, &seat.player_id)?;
        self.app_state.publish(&update);
        Ok(())
    }

    pub fn handle_new_game(&mut self) -> RoomResult<()> {
        let seat = self.seat()?;
        let update = self
            .app_state
            .registry
            .new_game(&seat.room_id, &seat.player_id)?;
        self.app_state.publish(&update);
        Ok(())
    }

    pub fn handle_legal_moves(
        &mut self,
        square: &str,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> RoomResult<()> {
        let seat = self.seat()?;
        let moves = self.app_state.registry.legal_moves(&seat.room_id, square)?;
        self.send(
            &ServerMessage::LegalMoves {
                room_id: seat.room_id,
                square: square.trim().to_string(),
                moves,
            },
            ctx,
        );
        Ok(())
    }

    pub fn handle_get_state(&mut self, ctx: &mut ws::WebsocketContext<Self>) -> RoomResult<()> {
        let seat = self.seat()?;
        let snapshot = self.app_state.registry.state(&seat.room_id)?;
        self.send(&ServerMessage::RoomState(snapshot), ctx);
        Ok(())
    }
}
