//! Value objects.
//!
//! 生の文字列や数値をそのまま扱わず、生成時に検証を済ませた型として扱います。
//! 一度生成された値オブジェクトは常に有効であることが保証されます。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a participant display name (in characters)
pub const PARTICIPANT_NAME_MAX_CHARS: usize = 64;

/// Maximum length of a reaction symbol (in characters)
pub const REACTION_SYMBOL_MAX_CHARS: usize = 16;

/// Connection identity of a WebSocket client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ClientIdEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<Uuid> for ClientId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room identifier used by the room manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Room used when a client does not name one
    pub const DEFAULT: &'static str = "default";

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn default_room() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name of a room participant (primary identity inside a room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::NameEmpty);
        }
        let chars = trimmed.chars().count();
        if chars > PARTICIPANT_NAME_MAX_CHARS {
            return Err(ValueObjectError::NameTooLong {
                max: PARTICIPANT_NAME_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A vote on the estimation scale.
///
/// Finite and non-negative. The scale's zero point is a valid vote.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteValue(f64);

impl VoteValue {
    pub fn new(value: f64) -> Result<Self, ValueObjectError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValueObjectError::InvalidVote(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Canonical histogram key (`3`, `0.5`, `13`).
    pub fn histogram_key(&self) -> String {
        self.0.to_string()
    }
}

impl TryFrom<f64> for VoteValue {
    type Error = ValueObjectError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Reaction symbol (usually a single emoji).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionSymbol(String);

impl ReactionSymbol {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::SymbolEmpty);
        }
        let chars = trimmed.chars().count();
        if chars > REACTION_SYMBOL_MAX_CHARS {
            return Err(ValueObjectError::SymbolTooLong {
                max: REACTION_SYMBOL_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReactionSymbol {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Durable session ledger entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidIdentifier(value.to_string()))
    }
}

impl FromStr for SessionId {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Durable user identifier (issued by the external account service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidIdentifier(value.to_string()))
    }
}

impl FromStr for UserId {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of someone taking part in a round.
///
/// `Stored` ids belong to the durable user directory. `Ephemeral` ids are
/// anything else a client may send (connection ids, guest names); they can
/// never be folded into durable statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParticipantRef {
    Stored(UserId),
    Ephemeral(String),
}

impl ParticipantRef {
    /// Classify a raw identifier received at a boundary.
    pub fn classify(raw: &str) -> Self {
        match UserId::parse(raw) {
            Ok(user_id) => Self::Stored(user_id),
            Err(_) => Self::Ephemeral(raw.to_string()),
        }
    }

    /// The durable id, or `InvalidIdentifier` for an ephemeral one.
    pub fn stored(&self) -> Result<UserId, ValueObjectError> {
        match self {
            Self::Stored(user_id) => Ok(*user_id),
            Self::Ephemeral(raw) => Err(ValueObjectError::InvalidIdentifier(raw.clone())),
        }
    }
}

impl From<UserId> for ParticipantRef {
    fn from(value: UserId) -> Self {
        Self::Stored(value)
    }
}

/// Unix timestamp (UTC, milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
