//! Room registry: seats players, enforces turn order and owns room lifetimes.

pub mod error;
pub mod ids;
pub mod registry;

pub use error::{RoomError, RoomResult};
pub use registry::{
    Departure, Player, Room, RoomCreated, RoomJoined, RoomRegistry, RoomSnapshot, RoomUpdate, Seat,
};
