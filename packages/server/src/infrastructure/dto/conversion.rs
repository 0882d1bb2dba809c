//! Conversion logic between DTOs and domain entities.

use huddle_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    Agreement, Edge, OutboundEvent, Page, Participant, ReactionRecord, RoomState,
    SessionLedgerEntry, SessionStatus, SessionSummary, Timestamp, Trajectory, VoteRecord,
};
use crate::infrastructure::dto::{http, websocket as ws};

fn rfc3339(timestamp: Timestamp) -> String {
    timestamp_to_rfc3339(timestamp.value())
}

fn status_label(status: SessionStatus) -> String {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Revealed => "revealed",
        SessionStatus::Completed => "completed",
    }
    .to_string()
}

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<Agreement> for ws::AgreementDto {
    fn from(model: Agreement) -> Self {
        Self {
            symbol: model.symbol,
            description: model.description,
        }
    }
}

impl From<Participant> for ws::ParticipantDto {
    fn from(model: Participant) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name.as_str().to_string(),
            online: model.online,
            vote: model.vote.map(|v| v.value()),
            changed_vote_after_reveal: model.changed_vote_after_reveal,
            joined_at: model.joined_at.value(),
            reaction_counters: model
                .reaction_counters
                .into_iter()
                .map(|(symbol, count)| (symbol.as_str().to_string(), count))
                .collect(),
        }
    }
}

impl From<RoomState> for ws::RoomStateDto {
    fn from(model: RoomState) -> Self {
        Self {
            participants: model.participants.into_iter().map(Into::into).collect(),
            is_revealed: model.is_revealed,
            average_vote: model.average_vote,
            changed_participant_names: model
                .changed_participant_names
                .iter()
                .map(|name| name.as_str().to_string())
                .collect(),
            agreement: model.agreement.map(Into::into),
        }
    }
}

impl From<Trajectory> for ws::TrajectoryDto {
    fn from(model: Trajectory) -> Self {
        let edge = match model.edge {
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
        };
        Self {
            edge: edge.to_string(),
            origin: ws::PointDto {
                x: model.origin.x,
                y: model.origin.y,
            },
            angle: model.angle,
            speed: model.speed,
        }
    }
}

impl From<OutboundEvent> for ws::OutboundMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::RoomState(state) => Self::RoomState(state.into()),
            OutboundEvent::ReactionThrown {
                target_id,
                from_id,
                symbol,
                trajectory,
            } => Self::ReactionThrown {
                target_id: target_id.into_string(),
                from_id: from_id.into_string(),
                symbol: symbol.as_str().to_string(),
                trajectory: trajectory.into(),
            },
            OutboundEvent::ForceLogout => Self::ForceLogout,
            OutboundEvent::StatsChanged => Self::StatsChanged,
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<VoteRecord> for http::VoteRecordDto {
    fn from(model: VoteRecord) -> Self {
        Self {
            user_id: model.user_id.to_string(),
            username: model.username.as_str().to_string(),
            initial_vote: model.initial_vote.value(),
            final_vote: model.final_vote.value(),
            voted_at: rfc3339(model.voted_at),
            changed_after_reveal: model.changed_after_reveal,
        }
    }
}

impl From<ReactionRecord> for http::ReactionRecordDto {
    fn from(model: ReactionRecord) -> Self {
        Self {
            sender_id: model.sender_id.to_string(),
            target_id: model.target_id.to_string(),
            sender_name: model.sender_name.as_str().to_string(),
            target_name: model.target_name.as_str().to_string(),
            symbol: model.symbol.as_str().to_string(),
            thrown_at: rfc3339(model.thrown_at),
        }
    }
}

impl From<SessionLedgerEntry> for http::SessionDto {
    fn from(model: SessionLedgerEntry) -> Self {
        Self {
            id: model.id.to_string(),
            created_by: model.created_by.to_string(),
            title: model.title,
            status: status_label(model.status),
            participant_ids: model
                .participant_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            votes: model.votes.into_iter().map(Into::into).collect(),
            reactions: model.reactions.into_iter().map(Into::into).collect(),
            was_revealed: model.was_revealed,
            average_vote: model.average_vote,
            agreement: model.agreement.map(Into::into),
            statistics_processed: model.statistics_processed,
            created_at: rfc3339(model.created_at),
            revealed_at: model.revealed_at.map(rfc3339),
            completed_at: model.completed_at.map(rfc3339),
        }
    }
}

impl From<SessionSummary> for http::SessionSummaryDto {
    fn from(model: SessionSummary) -> Self {
        Self {
            id: model.id.to_string(),
            title: model.title,
            status: status_label(model.status),
            created_by: model.created_by.to_string(),
            participant_count: model.participant_count,
            vote_count: model.vote_count,
            average_vote: model.average_vote,
            agreement: model.agreement.map(Into::into),
            created_at: rfc3339(model.created_at),
            revealed_at: model.revealed_at.map(rfc3339),
            completed_at: model.completed_at.map(rfc3339),
        }
    }
}

impl<T, U: From<T>> From<Page<T>> for http::PageDto<U> {
    fn from(model: Page<T>) -> Self {
        Self {
            items: model.items.into_iter().map(Into::into).collect(),
            page: model.page,
            limit: model.limit,
            total: model.total,
        }
    }
}
