//! Events pushed from the server to connected clients.
//!
//! ドメイン層はイベントの意味だけを扱い、ワイヤ形式（JSON）への変換は
//! Infrastructure 層の DTO が担います。

use super::{ClientId, ReactionSymbol, entity::RoomState, trajectory::Trajectory};

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Full room snapshot
    RoomState(RoomState),
    ReactionThrown {
        target_id: ClientId,
        from_id: ClientId,
        symbol: ReactionSymbol,
        trajectory: Trajectory,
    },
    ForceLogout,
    /// Durable statistics changed; clients re-fetch
    StatsChanged,
}

impl OutboundEvent {
    /// Wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomState(_) => "roomState",
            Self::ReactionThrown { .. } => "reactionThrown",
            Self::ForceLogout => "forceLogout",
            Self::StatsChanged => "statsChanged",
        }
    }
}
