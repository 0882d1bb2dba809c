//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `type`, with camelCase fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Client → server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    Join { name: String },
    Vote { value: f64 },
    Reveal,
    Reset,
    RecalculateAverage,
    ResetUsers,
    ThrowReaction { target_id: String, symbol: String },
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    RoomState(RoomStateDto),
    ReactionThrown {
        target_id: String,
        from_id: String,
        symbol: String,
        trajectory: TrajectoryDto,
    },
    ForceLogout,
    StatsChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateDto {
    pub participants: Vec<ParticipantDto>,
    pub is_revealed: bool,
    pub average_vote: Option<f64>,
    pub changed_participant_names: Vec<String>,
    pub agreement: Option<AgreementDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: String,
    pub name: String,
    pub online: bool,
    pub vote: Option<f64>,
    pub changed_vote_after_reveal: bool,
    /// Unix milliseconds
    pub joined_at: i64,
    pub reaction_counters: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgreementDto {
    pub symbol: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryDto {
    pub edge: String,
    pub origin: PointDto,
    pub angle: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointDto {
    pub x: f64,
    pub y: f64,
}
