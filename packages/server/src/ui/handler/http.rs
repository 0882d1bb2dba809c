//! HTTP endpoint handlers.
//!
//! ハンドラはパスとボディを値オブジェクトに変換して UseCase を呼び、
//! 結果を DTO（または Serialize 済みのドメイン集計）として返すだけです。
//! エラーは `ApiError` がステータスコードと `{"error", "message"}` に変換します。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{
        GlobalStatsAggregate, PageRequest, ParticipantName, ParticipantRef, ReactionSymbol,
        RoomId, SessionId, SessionLedgerEntry, SessionStatistics, UserId, UserStatsAggregate,
        VoteValue,
    },
    infrastructure::dto::{
        http::{
            AddParticipantRequest, AddReactionRequest, AddVoteRequest, CreateSessionRequest,
            ErrorResponse, PageDto, PageQuery, SessionDto, SessionSummaryDto,
            SessionTransitionDto,
        },
        websocket::RoomStateDto,
    },
    ui::state::AppState,
    usecase::{AggregationReport, UseCaseError},
};

/// UseCaseError rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(UseCaseError);

impl<E: Into<UseCaseError>> From<E> for ApiError {
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::InvalidArgument(_) | UseCaseError::InvalidIdentifier(_) => {
                StatusCode::BAD_REQUEST
            }
            UseCaseError::Conflict(_) => StatusCode::CONFLICT,
            UseCaseError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn session_id(raw: &str) -> Result<SessionId, ApiError> {
    Ok(SessionId::parse(raw)?)
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(UserId::parse(raw)?)
}

fn transition(
    (entry, aggregation): (SessionLedgerEntry, AggregationReport),
) -> SessionTransitionDto {
    SessionTransitionDto {
        session: entry.into(),
        aggregation,
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current snapshot of a live room
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<RoomStateDto> {
    let room_id = RoomId::new(room_id)?;
    let snapshot = state.room_coordinator.snapshot(&room_id).await?;
    Ok(Json(snapshot.into()))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionDto>), ApiError> {
    let created_by = user_id(&request.created_by)?;
    let entry = state
        .session_ledger
        .create_session(created_by, request.title)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionDto> {
    let entry = state.session_ledger.get_session(&session_id(&id)?).await?;
    Ok(Json(entry.into()))
}

pub async fn add_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AddParticipantRequest>,
) -> ApiResult<SessionDto> {
    let entry = state
        .session_ledger
        .add_participant(
            &session_id(&id)?,
            user_id(&request.user_id)?,
            ParticipantName::new(request.username)?,
        )
        .await?;
    Ok(Json(entry.into()))
}

pub async fn add_vote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AddVoteRequest>,
) -> ApiResult<SessionDto> {
    let entry = state
        .session_ledger
        .add_vote(
            &session_id(&id)?,
            user_id(&request.user_id)?,
            ParticipantName::new(request.username)?,
            VoteValue::new(request.value)?,
        )
        .await?;
    Ok(Json(entry.into()))
}

pub async fn reveal_votes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionTransitionDto> {
    let result = state.session_ledger.reveal_votes(&session_id(&id)?).await?;
    Ok(Json(transition(result)))
}

pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionTransitionDto> {
    let result = state
        .session_ledger
        .complete_session(&session_id(&id)?)
        .await?;
    Ok(Json(transition(result)))
}

pub async fn add_reaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AddReactionRequest>,
) -> ApiResult<SessionDto> {
    let entry = state
        .session_ledger
        .add_reaction(
            &session_id(&id)?,
            ParticipantRef::classify(&request.sender_id),
            ParticipantRef::classify(&request.target_id),
            ParticipantName::new(request.sender_name)?,
            ParticipantName::new(request.target_name)?,
            ReactionSymbol::new(request.symbol)?,
        )
        .await?;
    Ok(Json(entry.into()))
}

pub async fn session_statistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionStatistics> {
    let statistics = state.session_ledger.statistics(&session_id(&id)?).await?;
    Ok(Json(statistics))
}

/// Sessions a user created or took part in, newest first
pub async fn user_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<PageDto<SessionSummaryDto>> {
    let page = PageRequest::new(query.page, query.limit);
    let history = state.session_ledger.history(&user_id(&id)?, page).await?;
    Ok(Json(history.into()))
}

pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserStatsAggregate> {
    let stats = state.statistics_aggregator.user_stats(&user_id(&id)?).await?;
    Ok(Json(stats))
}

pub async fn global_stats(State(state): State<Arc<AppState>>) -> ApiResult<GlobalStatsAggregate> {
    Ok(Json(state.statistics_aggregator.global_stats().await?))
}
