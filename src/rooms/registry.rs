use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use super::error::{RoomError, RoomResult};
use super::ids::{generate_player_id, normalize_room_id, RandomRoomIds, RoomIdSource};
use crate::game::{parse_promotion, parse_square, Color, GameState, Move, SessionStatus};

/// Attempts at finding an unused room code before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// A seated player. `connection` is the duplex connection the player joined
/// through, if any; request/response players have none.
#[derive(Serialize, Debug, Clone)]
pub struct Player {
    pub id: String,
    pub color: Color,
    pub nickname: String,
    #[serde(skip)]
    pub connection: Option<String>,
}

/// One game room. `players[0]` is always white and `players[1]` black.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    pub game_state: GameState,
    pub created_at: Instant,
    pub updated_at: Instant,
    /// Bumped on every committed change.
    pub version: u64,
    closed: bool,
}

impl Room {
    fn new(id: String, host: Player) -> Self {
        let now = Instant::now();
        Room {
            id,
            players: vec![host],
            game_state: GameState::new(),
            created_at: now,
            updated_at: now,
            version: 0,
            closed: false,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Connections of every seated player, for fan-out.
    pub fn connections(&self) -> Vec<String> {
        self.players
            .iter()
            .filter_map(|p| p.connection.clone())
            .collect()
    }

    pub fn status(&self) -> SessionStatus {
        self.game_state.status(self.players.len())
    }

    fn touch(&mut self) {
        self.updated_at = Instant::now();
        self.version += 1;
    }

    fn commit(&mut self, game_state: GameState) {
        self.game_state = game_state;
        self.touch();
    }

    fn update(&self) -> RoomUpdate {
        RoomUpdate {
            room_id: self.id.clone(),
            game_state: self.game_state.clone(),
            version: self.version,
            recipients: self.connections(),
        }
    }
}

/// Which room and seat a connection belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub room_id: String,
    pub player_id: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_id: String,
    pub player_id: String,
    pub color: Color,
    pub game_state: GameState,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    pub room_id: String,
    pub player_id: String,
    pub color: Color,
    pub opponent_nickname: String,
    pub game_state: GameState,
    pub version: u64,
    #[serde(skip)]
    pub host_connection: Option<String>,
}

/// A committed game-state change and who should hear about it. `version`
/// orders updates of one room; a listener that already holds a higher
/// version drops this one.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    #[serde(skip)]
    pub room_id: String,
    pub game_state: GameState,
    pub version: u64,
    #[serde(skip)]
    pub recipients: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub game_state: GameState,
    pub players: Vec<Player>,
    #[serde(flatten)]
    pub status: SessionStatus,
    pub version: u64,
}

/// A destroyed room and the connections left behind in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: String,
    pub notify: Vec<String>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> RoomResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| RoomError::PersistenceFailure(format!("{what} lock poisoned")))
}

fn required(value: &str, what: &str) -> RoomResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RoomError::MalformedRequest(format!("{what} required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Owns every live room plus the connection → seat table.
///
/// Each room sits behind its own mutex, and every operation performs its
/// whole read → validate → commit sequence while holding it, so two moves
/// for the same room are always applied one after the other.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Mutex<Room>>>>,
    connections: Mutex<HashMap<String, Seat>>,
    ids: Box<dyn RoomIdSource>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        RoomRegistry::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_id_source(RandomRoomIds)
    }

    pub fn with_id_source(ids: impl RoomIdSource + 'static) -> Self {
        RoomRegistry {
            rooms: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            ids: Box::new(ids),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().map(|rooms| rooms.len()).unwrap_or(0)
    }

    fn room(&self, raw_id: &str) -> RoomResult<Arc<Mutex<Room>>> {
        let id = normalize_room_id(raw_id);
        if id.is_empty() {
            return Err(RoomError::MalformedRequest("room id required".into()));
        }
        lock(&self.rooms, "room table")?
            .get(&id)
            .cloned()
            .ok_or(RoomError::RoomNotFound(id))
    }

    /// Runs `f` with the room locked. A room removed while the caller was
    /// waiting for the lock counts as not found.
    fn with_room<T>(
        &self,
        raw_id: &str,
        f: impl FnOnce(&mut Room) -> RoomResult<T>,
    ) -> RoomResult<T> {
        let handle = self.room(raw_id)?;
        let mut room = lock(&handle, "room")?;
        if room.closed {
            return Err(RoomError::RoomNotFound(room.id.clone()));
        }
        f(&mut *room)
    }

    /// Records which seat `connection` holds. Callers hold the room (or the
    /// room table) while binding, so `destroy` cannot slip in between the
    /// seat being taken and the connection being recorded.
    fn bind(&self, connection: Option<&str>, room_id: &str, player_id: &str) -> RoomResult<()> {
        if let Some(connection) = connection {
            lock(&self.connections, "connection table")?.insert(
                connection.to_string(),
                Seat {
                    room_id: room_id.to_string(),
                    player_id: player_id.to_string(),
                },
            );
        }
        Ok(())
    }

    /// Opens a room with the caller seated as white. Retries with a new code
    /// if the generated one is already taken.
    pub fn create_room(&self, nickname: &str, connection: Option<&str>) -> RoomResult<RoomCreated> {
        let nickname = required(nickname, "nickname")?;
        let player_id = generate_player_id();
        let host = Player {
            id: player_id.clone(),
            color: Color::White,
            nickname,
            connection: connection.map(str::to_string),
        };

        let mut rooms = lock(&self.rooms, "room table")?;
        let room_id = (0..MAX_ID_ATTEMPTS)
            .map(|_| self.ids.next_id())
            .find(|candidate| {
                let taken = rooms.contains_key(candidate);
                if taken {
                    debug!("Room id {} already taken, retrying", candidate);
                }
                !taken
            })
            .ok_or_else(|| RoomError::PersistenceFailure("could not allocate a room id".into()))?;

        self.bind(connection, &room_id, &player_id)?;
        let room = Room::new(room_id.clone(), host);
        let game_state = room.game_state.clone();
        rooms.insert(room_id.clone(), Arc::new(Mutex::new(room)));
        drop(rooms);

        info!("Created room {} (host {})", room_id, player_id);
        Ok(RoomCreated {
            room_id,
            player_id,
            color: Color::White,
            game_state,
        })
    }

    /// Seats the caller as black in an existing room.
    pub fn join_room(
        &self,
        room_id: &str,
        nickname: &str,
        connection: Option<&str>,
    ) -> RoomResult<RoomJoined> {
        let nickname = required(nickname, "nickname")?;
        let joined = self.with_room(room_id, |room| {
            if room.players.len() >= 2 {
                return Err(RoomError::RoomFull);
            }
            let player_id = generate_player_id();
            self.bind(connection, &room.id, &player_id)?;
            room.players.push(Player {
                id: player_id.clone(),
                color: Color::Black,
                nickname,
                connection: connection.map(str::to_string),
            });
            room.touch();
            let host = &room.players[0];
            Ok(RoomJoined {
                room_id: room.id.clone(),
                player_id,
                color: Color::Black,
                opponent_nickname: host.nickname.clone(),
                game_state: room.game_state.clone(),
                version: room.version,
                host_connection: host.connection.clone(),
            })
        })?;
        info!("Player {} joined room {}", joined.player_id, joined.room_id);
        Ok(joined)
    }

    /// Validates and commits a move. Checks run in a fixed order: room,
    /// opponent present, game still running, caller seated and on turn,
    /// notation, legality.
    pub fn submit_move(
        &self,
        room_id: &str,
        player_id: &str,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> RoomResult<RoomUpdate> {
        self.with_room(room_id, |room| {
            if room.players.len() < 2 {
                return Err(RoomError::OpponentNotConnected);
            }
            if room.game_state.is_over() {
                return Err(RoomError::GameAlreadyEnded);
            }
            let player = room.player(player_id).ok_or(RoomError::NotSeated)?;
            if player.color != room.game_state.turn {
                return Err(RoomError::NotYourTurn);
            }
            let (Some(from), Some(to)) = (parse_square(from.trim()), parse_square(to.trim())) else {
                return Err(RoomError::InvalidSquareNotation);
            };
            let mv = room
                .game_state
                .find_legal_move(from, to, parse_promotion(promotion))
                .ok_or(RoomError::IllegalMove)?;

            let next = room.game_state.apply_move(&mv);
            room.commit(next);
            info!(
                "Room {}: {} played {}{}{}",
                room.id,
                player_id,
                mv.from,
                mv.to,
                mv.promotion.map(|p| format!("={p}")).unwrap_or_default()
            );
            if let Some(outcome) = room.game_state.outcome() {
                info!("Room {} game over: {:?}", room.id, outcome);
            }
            Ok(room.update())
        })
        .inspect_err(|e| warn!("Move rejected in room {}: {}", room_id, e.code()))
    }

    /// Resigns on behalf of the caller. Resigning a finished game returns its
    /// state unchanged.
    pub fn resign(&self, room_id: &str, player_id: &str) -> RoomResult<RoomUpdate> {
        self.with_room(room_id, |room| {
            let color = room.player(player_id).ok_or(RoomError::NotSeated)?.color;
            if !room.game_state.is_over() {
                let next = room.game_state.resign(color);
                room.commit(next);
                info!("Room {}: {} resigned", room.id, color.as_str());
            }
            Ok(room.update())
        })
    }

    /// Replaces the room's game with a fresh one, whatever state it was in.
    pub fn new_game(&self, room_id: &str, player_id: &str) -> RoomResult<RoomUpdate> {
        self.with_room(room_id, |room| {
            if room.player(player_id).is_none() {
                return Err(RoomError::NotSeated);
            }
            room.commit(GameState::new());
            info!("Room {}: new game started by {}", room.id, player_id);
            Ok(room.update())
        })
    }

    pub fn state(&self, room_id: &str) -> RoomResult<RoomSnapshot> {
        self.with_room(room_id, |room| {
            Ok(RoomSnapshot {
                room_id: room.id.clone(),
                game_state: room.game_state.clone(),
                players: room.players.clone(),
                status: room.status(),
                version: room.version,
            })
        })
    }

    /// Legal moves of whatever stands on `square` in the room's current game.
    pub fn legal_moves(&self, room_id: &str, square: &str) -> RoomResult<Vec<Move>> {
        self.with_room(room_id, |room| {
            let square = parse_square(square.trim()).ok_or(RoomError::InvalidSquareNotation)?;
            Ok(room.game_state.legal_moves_from(square))
        })
    }

    pub fn seat_of(&self, connection: &str) -> Option<Seat> {
        self.connections.lock().ok()?.get(connection).cloned()
    }

    /// Forgets a connection. If it held a seat the whole room is destroyed;
    /// the returned departure lists the other connections to notify.
    pub fn disconnect(&self, connection: &str) -> Option<Departure> {
        let seat = match self.connections.lock() {
            Ok(mut connections) => connections.remove(connection)?,
            Err(_) => {
                warn!("Connection table poisoned while dropping {}", connection);
                return None;
            }
        };
        let departure = self.destroy(&seat.room_id)?;
        info!(
            "Room {} closed after {} disconnected",
            departure.room_id, seat.player_id
        );
        Some(Departure {
            notify: departure
                .notify
                .into_iter()
                .filter(|c| c != connection)
                .collect(),
            ..departure
        })
    }

    /// Removes a room and every connection bound to it.
    fn destroy(&self, room_id: &str) -> Option<Departure> {
        let handle = self.rooms.lock().ok()?.remove(room_id)?;
        let notify = match handle.lock() {
            Ok(mut room) => {
                room.closed = true;
                room.connections()
            }
            Err(_) => Vec::new(),
        };
        if let Ok(mut connections) = self.connections.lock() {
            connections.retain(|_, seat| seat.room_id != room_id);
        }
        Some(Departure {
            room_id: room_id.to_string(),
            notify,
        })
    }

    /// Destroys rooms that have not changed for `max_idle`.
    pub fn remove_idle(&self, max_idle: Duration) -> Vec<Departure> {
        let now = Instant::now();
        let stale: Vec<String> = match self.rooms.lock() {
            Ok(rooms) => rooms
                .iter()
                .filter(|(_, handle)| {
                    handle
                        .lock()
                        .map(|room| now.duration_since(room.updated_at) >= max_idle)
                        .unwrap_or(true)
                })
                .map(|(id, _)| id.clone())
                .collect(),
            Err(_) => return Vec::new(),
        };
        stale
            .iter()
            .filter_map(|id| self.destroy(id))
            .inspect(|d| info!("Room {} expired after being idle", d.room_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out a fixed sequence of codes.
    struct ScriptedIds {
        ids: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl ScriptedIds {
        fn new(ids: Vec<&'static str>) -> Self {
            ScriptedIds {
                ids,
                next: AtomicUsize::new(0),
            }
        }
    }

    impl RoomIdSource for ScriptedIds {
        fn next_id(&self) -> String {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.ids[i.min(self.ids.len() - 1)].to_string()
        }
    }

    #[test]
    fn create_retries_on_collision() {
        let registry = RoomRegistry::with_id_source(ScriptedIds::new(vec![
            "AAAAAA", "AAAAAA", "AAAAAA", "BBBBBB",
        ]));
        let first = registry.create_room("alice", None).unwrap();
        let second = registry.create_room("bob", None).unwrap();
        assert_eq!(first.room_id, "AAAAAA");
        assert_eq!(second.room_id, "BBBBBB");
        assert_eq!(registry.room_count(), 2);
    }

    #[test]
    fn create_gives_up_when_every_code_is_taken() {
        let registry = RoomRegistry::with_id_source(ScriptedIds::new(vec!["AAAAAA"]));
        registry.create_room("alice", None).unwrap();
        let err = registry.create_room("bob", None).unwrap_err();
        assert!(err.is_server_error());
    }

    #[test]
    fn blank_nickname_is_malformed() {
        let registry = RoomRegistry::new();
        assert!(matches!(
            registry.create_room("   ", None),
            Err(RoomError::MalformedRequest(_))
        ));
    }

    #[test]
    fn join_is_case_insensitive_and_seats_black() {
        let registry = RoomRegistry::with_id_source(ScriptedIds::new(vec!["ABCDEF"]));
        registry.create_room("alice", None).unwrap();
        let joined = registry.join_room("abcdef", "bob", None).unwrap();
        assert_eq!(joined.room_id, "ABCDEF");
        assert_eq!(joined.color, Color::Black);
        assert_eq!(joined.opponent_nickname, "alice");

        let snapshot = registry.state("ABCDEF").unwrap();
        assert_eq!(snapshot.players[0].color, Color::White);
        assert_eq!(snapshot.players[1].color, Color::Black);
        assert_eq!(snapshot.status, SessionStatus::Active);
    }

    #[test]
    fn third_player_is_turned_away() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", None).unwrap();
        registry.join_room(&room.room_id, "bob", None).unwrap();
        assert_eq!(
            registry.join_room(&room.room_id, "carol", None).unwrap_err(),
            RoomError::RoomFull
        );
    }

    #[test]
    fn rejected_moves_leave_state_untouched() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", None).unwrap();
        let guest = registry.join_room(&room.room_id, "bob", None).unwrap();
        let before = registry.state(&room.room_id).unwrap();

        assert_eq!(
            registry
                .submit_move(&room.room_id, &guest.player_id, "e7", "e5", None)
                .unwrap_err(),
            RoomError::NotYourTurn
        );
        assert_eq!(
            registry
                .submit_move(&room.room_id, "stranger", "e2", "e4", None)
                .unwrap_err(),
            RoomError::NotSeated
        );
        assert_eq!(
            registry
                .submit_move(&room.room_id, &room.player_id, "e2", "e9", None)
                .unwrap_err(),
            RoomError::InvalidSquareNotation
        );
        assert_eq!(
            registry
                .submit_move(&room.room_id, &room.player_id, "e2", "e5", None)
                .unwrap_err(),
            RoomError::IllegalMove
        );
        assert_eq!(
            registry
                .submit_move(&room.room_id, &room.player_id, "e2", "e4", Some("queen"))
                .unwrap_err(),
            RoomError::IllegalMove
        );

        let after = registry.state(&room.room_id).unwrap();
        assert_eq!(after.game_state, before.game_state);
        assert_eq!(after.version, before.version);
    }

    #[test]
    fn invalid_promotion_token_is_ignored() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", None).unwrap();
        registry.join_room(&room.room_id, "bob", None).unwrap();
        let update = registry
            .submit_move(&room.room_id, &room.player_id, "e2", "e4", Some("dragon"))
            .unwrap();
        assert_eq!(update.game_state.turn, Color::Black);
    }

    #[test]
    fn disconnect_destroys_the_room_and_notifies_the_opponent() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", Some("conn-a")).unwrap();
        let joined = registry
            .join_room(&room.room_id, "bob", Some("conn-b"))
            .unwrap();
        assert_eq!(joined.host_connection.as_deref(), Some("conn-a"));
        assert_eq!(
            registry.seat_of("conn-b"),
            Some(Seat {
                room_id: room.room_id.clone(),
                player_id: joined.player_id.clone(),
            })
        );

        let departure = registry.disconnect("conn-a").unwrap();
        assert_eq!(departure.room_id, room.room_id);
        assert_eq!(departure.notify, vec!["conn-b".to_string()]);
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.seat_of("conn-b"), None);
        assert!(matches!(
            registry.state(&room.room_id),
            Err(RoomError::RoomNotFound(_))
        ));
        // the other side closing afterwards finds nothing to do
        assert_eq!(registry.disconnect("conn-b"), None);
    }

    #[test]
    fn idle_rooms_expire() {
        let registry = RoomRegistry::new();
        registry.create_room("alice", Some("conn-a")).unwrap();
        assert!(registry.remove_idle(Duration::from_secs(3600)).is_empty());
        let expired = registry.remove_idle(Duration::ZERO);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].notify, vec!["conn-a".to_string()]);
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.seat_of("conn-a"), None);
    }

    #[test]
    fn legal_moves_query() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", None).unwrap();
        let moves = registry.legal_moves(&room.room_id, "g1").unwrap();
        let targets: Vec<String> = moves.iter().map(|m| m.to.to_string()).collect();
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&"f3".to_string()));
        assert!(targets.contains(&"h3".to_string()));
        assert_eq!(
            registry.legal_moves(&room.room_id, "z9").unwrap_err(),
            RoomError::InvalidSquareNotation
        );
    }

    #[test]
    fn concurrent_moves_commit_once() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.create_room("alice", None).unwrap();
        registry.join_room(&room.room_id, "bob", None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let room_id = room.room_id.clone();
                let player_id = room.player_id.clone();
                std::thread::spawn(move || {
                    registry
                        .submit_move(&room_id, &player_id, "e2", "e4", None)
                        .is_ok()
                })
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(registry.state(&room.room_id).unwrap().version, 2);
    }

    #[test]
    fn updates_carry_increasing_versions() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("alice", None).unwrap();
        let guest = registry.join_room(&room.room_id, "bob", None).unwrap();
        assert_eq!(guest.version, 1);

        let first = registry
            .submit_move(&room.room_id, &room.player_id, "e2", "e4", None)
            .unwrap();
        let resigned = registry.resign(&room.room_id, &guest.player_id).unwrap();
        let fresh = registry.new_game(&room.room_id, &room.player_id).unwrap();
        assert_eq!([first.version, resigned.version, fresh.version], [2, 3, 4]);

        let json = serde_json::to_value(&fresh).unwrap();
        assert_eq!(json["version"], 4);
        assert!(json.get("recipients").is_none());
    }

    #[test]
    fn join_racing_a_host_disconnect_leaves_no_stale_seat() {
        let registry = Arc::new(RoomRegistry::new());
        for i in 0..500 {
            let host_conn = format!("host-{i}");
            let guest_conn = format!("guest-{i}");
            let room = registry.create_room("alice", Some(&host_conn)).unwrap();

            let joiner = {
                let registry = Arc::clone(&registry);
                let room_id = room.room_id.clone();
                let guest_conn = guest_conn.clone();
                std::thread::spawn(move || {
                    let _ = registry.join_room(&room_id, "bob", Some(&guest_conn));
                })
            };
            registry.disconnect(&host_conn);
            joiner.join().unwrap();

            assert_eq!(registry.room_count(), 0);
            assert_eq!(registry.seat_of(&guest_conn), None, "iteration {i}");
        }
    }

    #[test]
    fn create_racing_an_idle_sweep_leaves_no_stale_seat() {
        let registry = Arc::new(RoomRegistry::new());
        for i in 0..500 {
            let conn = format!("host-{i}");
            let creator = {
                let registry = Arc::clone(&registry);
                let conn = conn.clone();
                std::thread::spawn(move || {
                    registry.create_room("alice", Some(&conn)).unwrap();
                })
            };
            registry.remove_idle(Duration::ZERO);
            creator.join().unwrap();
            registry.remove_idle(Duration::ZERO);

            assert_eq!(registry.room_count(), 0);
            assert_eq!(registry.seat_of(&conn), None, "iteration {i}");
        }
    }
}
