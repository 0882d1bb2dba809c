//! Domain layer.
//!
//! ビジネスルールの中核。他のどの層にも依存しません。

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod repository;
pub mod trajectory;
pub mod value_object;

pub use entity::*;
pub use error::{LedgerError, MessagePushError, RepositoryError, RoomError, ValueObjectError};
pub use event::OutboundEvent;
pub use factory::{ClientIdFactory, SessionIdFactory, UserIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{
    EntryMutation, RoomHandle, RoomRepository, SessionLedgerRepository, StatsRepository,
    UserDirectory,
};
pub use trajectory::{Edge, Point, Trajectory};
pub use value_object::{
    ClientId, ParticipantName, ParticipantRef, ReactionSymbol, RoomId, SessionId, Timestamp,
    UserId, VoteValue,
};
