//! HTTP API DTOs.
//!
//! Timestamps are rendered as RFC 3339 (UTC) strings.

use serde::{Deserialize, Serialize};

use crate::usecase::AggregationReport;

use super::websocket::AgreementDto;

// ========================================
// Requests
// ========================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub created_by: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVoteRequest {
    pub user_id: String,
    pub username: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionRequest {
    pub sender_id: String,
    pub target_id: String,
    pub sender_name: String,
    pub target_name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

// ========================================
// Responses
// ========================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecordDto {
    pub user_id: String,
    pub username: String,
    pub initial_vote: f64,
    pub final_vote: f64,
    pub voted_at: String,
    pub changed_after_reveal: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecordDto {
    pub sender_id: String,
    pub target_id: String,
    pub sender_name: String,
    pub target_name: String,
    pub symbol: String,
    pub thrown_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: String,
    pub created_by: String,
    pub title: String,
    pub status: String,
    pub participant_ids: Vec<String>,
    pub votes: Vec<VoteRecordDto>,
    pub reactions: Vec<ReactionRecordDto>,
    pub was_revealed: bool,
    pub average_vote: Option<f64>,
    pub agreement: Option<AgreementDto>,
    pub statistics_processed: bool,
    pub created_at: String,
    pub revealed_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryDto {
    pub id: String,
    pub title: String,
    pub status: String,
    pub created_by: String,
    pub participant_count: usize,
    pub vote_count: usize,
    pub average_vote: Option<f64>,
    pub agreement: Option<AgreementDto>,
    pub created_at: String,
    pub revealed_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

/// Reveal / complete response
#[derive(Debug, Clone, Serialize)]
pub struct SessionTransitionDto {
    pub session: SessionDto,
    pub aggregation: AggregationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
