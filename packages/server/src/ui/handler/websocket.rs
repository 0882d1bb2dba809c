//! WebSocket connection handlers.
//!
//! 1接続につき2つのタスクを動かします。
//! - `pusher_loop`: MessagePusher が積んだフレームをソケットへ書き出す
//! - 受信タスク: 受信フレームをパースして RoomCoordinator に渡す
//!
//! どちらかが終了した時点で接続を閉じ、参加者をオフラインにします。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, ClientIdFactory, ParticipantName, ReactionSymbol, RoomId, VoteValue},
    infrastructure::dto::websocket::InboundMessage,
    ui::state::AppState,
    usecase::UseCaseError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = match query.room {
        Some(raw) => RoomId::new(raw.clone()).map_err(|e| {
            tracing::warn!("Invalid room id '{}': {}", raw, e);
            StatusCode::BAD_REQUEST
        })?,
        None => RoomId::default_room(),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id)))
}

/// Spawns a task that drains `rx` into the WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let connection = ClientIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    let (sender, mut receiver) = socket.split();

    let mut send_task = pusher_loop(rx, sender);

    // 接続直後にスナップショットが1回送られる
    state
        .room_coordinator
        .attach(&room_id, connection.clone(), tx)
        .await;

    let recv_state = state.clone();
    let recv_room = room_id.clone();
    let recv_connection = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    handle_frame(&recv_state, &recv_room, &recv_connection, text.as_str()).await
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.room_coordinator.detach(&room_id, &connection).await;
}

/// Parse one text frame and apply it. Failures are logged and dropped.
async fn handle_frame(state: &AppState, room_id: &RoomId, connection: &ClientId, text: &str) {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Ignoring malformed frame from '{}': {}", connection, e);
            return;
        }
    };

    if let Err(e) = dispatch(state, room_id, connection, message).await {
        tracing::warn!(
            "Action from '{}' in room '{}' rejected ({}): {}",
            connection,
            room_id,
            e.kind(),
            e
        );
    }
}

async fn dispatch(
    state: &AppState,
    room_id: &RoomId,
    connection: &ClientId,
    message: InboundMessage,
) -> Result<(), UseCaseError> {
    let coordinator = &state.room_coordinator;
    match message {
        InboundMessage::Join { name } => {
            coordinator
                .join(room_id, connection, ParticipantName::new(name)?)
                .await?;
        }
        InboundMessage::Vote { value } => {
            coordinator
                .cast_vote(room_id, connection, VoteValue::new(value)?)
                .await?;
        }
        InboundMessage::Reveal => {
            coordinator.reveal(room_id).await?;
        }
        InboundMessage::Reset => {
            coordinator.reset(room_id).await?;
        }
        InboundMessage::RecalculateAverage => {
            coordinator.recalculate_average(room_id).await?;
        }
        InboundMessage::ResetUsers => {
            coordinator.reset_users(room_id).await?;
        }
        InboundMessage::ThrowReaction { target_id, symbol } => {
            let target = ClientId::new(target_id)?;
            coordinator
                .throw_reaction(room_id, connection, &target, ReactionSymbol::new(symbol)?)
                .await?;
        }
    }
    Ok(())
}
