//! Identifier factories (UUID v4).

use uuid::Uuid;

use super::{ClientId, SessionId, UserId};

/// Connection id factory
pub struct ClientIdFactory;

impl ClientIdFactory {
    pub fn generate() -> ClientId {
        ClientId::from(Uuid::new_v4())
    }
}

/// Session ledger entry id factory
pub struct SessionIdFactory;

impl SessionIdFactory {
    pub fn generate() -> SessionId {
        SessionId::from_uuid(Uuid::new_v4())
    }
}

/// User id factory, for tests and seeding
pub struct UserIdFactory;

impl UserIdFactory {
    pub fn generate() -> UserId {
        UserId::from_uuid(Uuid::new_v4())
    }
}
