//! Room aggregate: the authoritative live state of one estimation room.
//!
//! ## 状態遷移
//!
//! ```text
//!            reveal()
//!   Voting ───────────▶ Revealed ──┐
//!     ▲                    │       │ recalculate_average()
//!     └────── reset() ─────┘ ◀─────┘
//! ```
//!
//! 終端状態はなく、ルームは無期限に存続します。
//! ここにあるメソッドはすべて同期的な純粋な状態変更で、直列化は呼び出し側
//! （`RoomCoordinator` が保持するルームごとの Mutex）が担います。

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::agreement::{Agreement, room_agreement, rounded_average};
use crate::domain::{
    ClientId, ParticipantName, ReactionSymbol, RoomError, RoomId, Timestamp, VoteValue,
};

/// A person in the room, keyed by display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Current connection identity (rebound on rejoin)
    pub id: ClientId,
    pub name: ParticipantName,
    pub online: bool,
    pub vote: Option<VoteValue>,
    pub changed_vote_after_reveal: bool,
    pub joined_at: Timestamp,
    pub reaction_counters: BTreeMap<ReactionSymbol, u64>,
}

impl Participant {
    pub fn new(id: ClientId, name: ParticipantName, joined_at: Timestamp) -> Self {
        Self {
            id,
            name,
            online: true,
            vote: None,
            changed_vote_after_reveal: false,
            joined_at,
            reaction_counters: BTreeMap::new(),
        }
    }

    fn clear_round(&mut self) {
        self.vote = None;
        self.changed_vote_after_reveal = false;
        self.reaction_counters.clear();
    }
}

/// Shared view broadcast to every connection after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub participants: Vec<Participant>,
    pub is_revealed: bool,
    pub average_vote: Option<f64>,
    pub changed_participant_names: Vec<ParticipantName>,
    pub agreement: Option<Agreement>,
}

/// Result of a `join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Created,
    /// An existing participant was rebound from its previous connection
    Rebound { previous: ClientId },
}

/// Room aggregate
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    /// Connections currently attached to the room (broadcast audience)
    audience: BTreeSet<ClientId>,
    state: RoomState,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            audience: BTreeSet::new(),
            state: RoomState::default(),
        }
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn snapshot(&self) -> RoomState {
        self.state.clone()
    }

    pub fn audience(&self) -> Vec<ClientId> {
        self.audience.iter().cloned().collect()
    }

    pub fn attach(&mut self, connection: ClientId) -> bool {
        self.audience.insert(connection)
    }

    pub fn detach(&mut self, connection: &ClientId) -> bool {
        self.audience.remove(connection)
    }

    pub fn participant(&self, id: &ClientId) -> Option<&Participant> {
        self.position_of(id).map(|index| &self.state.participants[index])
    }

    fn participant_mut(&mut self, id: &ClientId) -> Option<&mut Participant> {
        self.position_of(id)
            .map(|index| &mut self.state.participants[index])
    }

    /// Online holder of the connection first, then a stale one.
    fn position_of(&self, id: &ClientId) -> Option<usize> {
        let participants = &self.state.participants;
        participants
            .iter()
            .position(|p| &p.id == id && p.online)
            .or_else(|| participants.iter().position(|p| &p.id == id))
    }

    /// Join by name, rebinding an existing participant to `connection`.
    ///
    /// Rebinding discards everything recorded under the old connection:
    /// vote, changed flag, reaction counters and join time. The name also
    /// leaves `changed_participant_names`.
    pub fn join(
        &mut self,
        connection: ClientId,
        name: ParticipantName,
        now: Timestamp,
    ) -> JoinOutcome {
        // A connection speaks for one participant at a time.
        for other in self
            .state
            .participants
            .iter_mut()
            .filter(|p| p.id == connection && p.name != name)
        {
            other.online = false;
        }

        match self.state.participants.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                let previous = std::mem::replace(&mut existing.id, connection);
                existing.clear_round();
                existing.joined_at = now;
                existing.online = true;
                self.state.changed_participant_names.retain(|n| n != &name);
                JoinOutcome::Rebound { previous }
            }
            None => {
                self.state
                    .participants
                    .push(Participant::new(connection, name, now));
                JoinOutcome::Created
            }
        }
    }

    pub fn cast_vote(&mut self, participant_id: &ClientId, value: VoteValue) -> Result<(), RoomError> {
        let is_revealed = self.state.is_revealed;
        let participant = self
            .participant_mut(participant_id)
            .ok_or_else(|| RoomError::ParticipantNotFound(participant_id.to_string()))?;
        if !participant.online {
            return Err(RoomError::ParticipantOffline(participant.name.as_str().to_string()));
        }

        let changed = is_revealed && participant.vote.is_some_and(|prev| prev != value);
        participant.vote = Some(value);

        if changed {
            participant.changed_vote_after_reveal = true;
            let name = participant.name.clone();
            if !self.state.changed_participant_names.contains(&name) {
                self.state.changed_participant_names.push(name);
            }
        }
        Ok(())
    }

    pub fn reveal(&mut self) {
        self.state.is_revealed = true;
        self.recompute_average();
    }

    pub fn reset(&mut self) {
        for participant in &mut self.state.participants {
            participant.clear_round();
        }
        self.state.is_revealed = false;
        self.state.average_vote = None;
        self.state.agreement = None;
        self.state.changed_participant_names.clear();
    }

    pub fn recalculate_average(&mut self) -> Result<(), RoomError> {
        if !self.state.is_revealed {
            return Err(RoomError::NotRevealed);
        }
        self.recompute_average();
        for participant in &mut self.state.participants {
            participant.changed_vote_after_reveal = false;
        }
        self.state.changed_participant_names.clear();
        Ok(())
    }

    /// Drop every participant. The audience stays attached.
    pub fn reset_users(&mut self) {
        self.state.participants.clear();
        self.state.agreement = None;
        self.state.average_vote = None;
        self.state.changed_participant_names.clear();
    }

    pub fn throw_reaction(
        &mut self,
        from: &ClientId,
        target: &ClientId,
        symbol: ReactionSymbol,
    ) -> Result<(), RoomError> {
        if from == target {
            return Err(RoomError::SelfReaction);
        }
        if self.participant(from).is_none() {
            return Err(RoomError::ParticipantNotFound(from.to_string()));
        }
        let target_participant = self
            .participant_mut(target)
            .ok_or_else(|| RoomError::ParticipantNotFound(target.to_string()))?;
        *target_participant.reaction_counters.entry(symbol).or_insert(0) += 1;
        Ok(())
    }

    /// Mark offline. Returns `false` when no participant uses this connection.
    pub fn disconnect(&mut self, participant_id: &ClientId) -> bool {
        match self.participant_mut(participant_id) {
            Some(participant) => {
                participant.online = false;
                true
            }
            None => false,
        }
    }

    fn eligible_votes(&self) -> Vec<f64> {
        self.state
            .participants
            .iter()
            .filter(|p| p.online)
            .filter_map(|p| p.vote.map(|v| v.value()))
            .collect()
    }

    fn recompute_average(&mut self) {
        let votes = self.eligible_votes();
        self.state.average_vote = rounded_average(&votes);
        self.state.agreement = room_agreement(&votes).map(Agreement::from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::agreement::AgreementLevel;

    fn client(id: &str) -> ClientId {
        ClientId::new(id.to_string()).unwrap()
    }

    fn name(value: &str) -> ParticipantName {
        ParticipantName::new(value.to_string()).unwrap()
    }

    fn vote(value: f64) -> VoteValue {
        VoteValue::new(value).unwrap()
    }

    fn symbol(value: &str) -> ReactionSymbol {
        ReactionSymbol::new(value.to_string()).unwrap()
    }

    fn create_room_with(names: &[&str]) -> Room {
        let mut room = Room::new(RoomId::default_room(), Timestamp::new(0));
        for n in names {
            room.join(client(&format!("conn-{}", n)), name(n), Timestamp::new(1000));
        }
        room
    }

    #[test]
    fn test_join_creates_participant_without_vote() {
        // テスト項目: 新しい名前で参加すると投票なしの参加者が作成される
        // given (前提条件):
        let mut room = Room::new(RoomId::default_room(), Timestamp::new(0));

        // when (操作):
        let outcome = room.join(client("c1"), name("alice"), Timestamp::new(1000));

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Created);
        let participants = &room.state().participants;
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].name.as_str(), "alice");
        assert!(participants[0].online);
        assert_eq!(participants[0].vote, None);
        assert_eq!(participants[0].joined_at, Timestamp::new(1000));
    }

    #[test]
    fn test_rejoin_with_same_name_resets_round_data() {
        // テスト項目: 同じ名前で再参加すると投票・フラグ・リアクションがリセットされ、名前は保持される
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");
        room.cast_vote(&alice, vote(3.0)).unwrap();
        room.reveal();
        room.cast_vote(&alice, vote(5.0)).unwrap();
        room.throw_reaction(&bob, &alice, symbol("🍅")).unwrap();
        room.disconnect(&alice);

        // when (操作):
        let outcome = room.join(client("conn-alice-2"), name("alice"), Timestamp::new(5000));

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Rebound { previous: alice });
        assert_eq!(room.state().participants.len(), 2);
        let rejoined = room.participant(&client("conn-alice-2")).unwrap();
        assert_eq!(rejoined.name.as_str(), "alice");
        assert!(rejoined.online);
        assert_eq!(rejoined.vote, None);
        assert!(!rejoined.changed_vote_after_reveal);
        assert!(rejoined.reaction_counters.is_empty());
        assert_eq!(rejoined.joined_at, Timestamp::new(5000));
        assert!(room.participant(&client("conn-alice")).is_none());
    }

    #[test]
    fn test_rejoin_removes_name_from_changed_list() {
        // テスト項目: 公開後に投票を変えた参加者が同じ名前で再参加すると、変更者一覧から外れる
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");
        room.cast_vote(&alice, vote(3.0)).unwrap();
        room.cast_vote(&bob, vote(5.0)).unwrap();
        room.reveal();
        room.cast_vote(&alice, vote(8.0)).unwrap();
        room.cast_vote(&bob, vote(1.0)).unwrap();
        assert_eq!(
            room.state().changed_participant_names,
            vec![name("alice"), name("bob")]
        );

        // when (操作):
        room.join(client("conn-alice-2"), name("alice"), Timestamp::new(5000));

        // then (期待する結果):
        assert_eq!(room.state().changed_participant_names, vec![name("bob")]);
        let rejoined = room.participant(&client("conn-alice-2")).unwrap();
        assert!(!rejoined.changed_vote_after_reveal);
    }

    #[test]
    fn test_cast_vote_requires_online_participant() {
        // テスト項目: 存在しない・オフラインの参加者は投票できない
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);
        let alice = client("conn-alice");
        room.disconnect(&alice);

        // when (操作):
        let offline = room.cast_vote(&alice, vote(1.0));
        let unknown = room.cast_vote(&client("nobody"), vote(1.0));

        // then (期待する結果):
        assert_eq!(offline, Err(RoomError::ParticipantOffline("alice".to_string())));
        assert_eq!(unknown, Err(RoomError::ParticipantNotFound("nobody".to_string())));
    }

    #[test]
    fn test_reveal_computes_average() {
        // テスト項目: [1,2,3,5] を公開すると平均 2.8 になる
        // given (前提条件):
        let mut room = create_room_with(&["a", "b", "c", "d"]);
        for (n, v) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 5.0)] {
            room.cast_vote(&client(&format!("conn-{}", n)), vote(v)).unwrap();
        }

        // when (操作):
        room.reveal();

        // then (期待する結果):
        assert!(room.state().is_revealed);
        assert_eq!(room.state().average_vote, Some(2.8));
        assert!(room.state().agreement.is_some());
    }

    #[test]
    fn test_reveal_all_equal_is_full_agreement() {
        // テスト項目: 全員同じ投票なら完全一致
        // given (前提条件):
        let mut room = create_room_with(&["a", "b", "c"]);
        for n in ["a", "b", "c"] {
            room.cast_vote(&client(&format!("conn-{}", n)), vote(1.0)).unwrap();
        }

        // when (操作):
        room.reveal();

        // then (期待する結果):
        assert_eq!(room.state().agreement, Some(AgreementLevel::Full.agreement()));
    }

    #[test]
    fn test_reveal_ignores_offline_and_missing_votes() {
        // テスト項目: オフラインの参加者と未投票の参加者は平均から除外される
        // given (前提条件):
        let mut room = create_room_with(&["a", "b", "c"]);
        room.cast_vote(&client("conn-a"), vote(2.0)).unwrap();
        room.cast_vote(&client("conn-b"), vote(8.0)).unwrap();
        room.disconnect(&client("conn-b"));

        // when (操作):
        room.reveal();

        // then (期待する結果):
        assert_eq!(room.state().average_vote, Some(2.0));
    }

    #[test]
    fn test_reveal_without_votes_has_no_average() {
        // テスト項目: 有効な投票がなければ平均と一致度は null
        // given (前提条件):
        let mut room = create_room_with(&["a"]);

        // when (操作):
        room.reveal();

        // then (期待する結果):
        assert_eq!(room.state().average_vote, None);
        assert_eq!(room.state().agreement, None);
    }

    #[test]
    fn test_change_after_reveal_is_tracked_once() {
        // テスト項目: 公開後に投票を変えるとフラグが立ち、名前は一度だけ記録される
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);
        let alice = client("conn-alice");
        room.cast_vote(&alice, vote(3.0)).unwrap();
        room.reveal();

        // when (操作):
        room.cast_vote(&alice, vote(5.0)).unwrap();
        room.cast_vote(&alice, vote(8.0)).unwrap();

        // then (期待する結果):
        let participant = room.participant(&alice).unwrap();
        assert!(participant.changed_vote_after_reveal);
        assert_eq!(participant.vote, Some(vote(8.0)));
        assert_eq!(room.state().changed_participant_names, vec![name("alice")]);
    }

    #[test]
    fn test_vote_before_reveal_is_not_a_change() {
        // テスト項目: 公開前の投票変更や、公開後の初投票・同じ値の再投票は変更扱いにならない
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");
        room.cast_vote(&alice, vote(3.0)).unwrap();
        room.cast_vote(&alice, vote(5.0)).unwrap();
        room.reveal();

        // when (操作):
        room.cast_vote(&bob, vote(2.0)).unwrap();
        room.cast_vote(&alice, vote(5.0)).unwrap();

        // then (期待する結果):
        assert!(!room.participant(&alice).unwrap().changed_vote_after_reveal);
        assert!(!room.participant(&bob).unwrap().changed_vote_after_reveal);
        assert!(room.state().changed_participant_names.is_empty());
    }

    #[test]
    fn test_recalculate_average_clears_changes() {
        // テスト項目: 再計算で変更フラグと名前リストがクリアされ、現在の投票で平均が再計算される
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");
        room.cast_vote(&alice, vote(1.0)).unwrap();
        room.cast_vote(&bob, vote(3.0)).unwrap();
        room.reveal();
        room.cast_vote(&alice, vote(5.0)).unwrap();
        assert_eq!(room.state().average_vote, Some(2.0));

        // when (操作):
        room.recalculate_average().unwrap();

        // then (期待する結果):
        assert_eq!(room.state().average_vote, Some(4.0));
        assert!(room.state().changed_participant_names.is_empty());
        assert!(
            room.state()
                .participants
                .iter()
                .all(|p| !p.changed_vote_after_reveal)
        );
    }

    #[test]
    fn test_recalculate_average_requires_reveal() {
        // テスト項目: 公開前の再計算はエラーになる
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);

        // when (操作):
        let result = room.recalculate_average();

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotRevealed));
    }

    #[test]
    fn test_reset_returns_to_voting() {
        // テスト項目: リセットで投票・フラグ・カウンターが消え、投票状態に戻る
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");
        room.cast_vote(&alice, vote(1.0)).unwrap();
        room.reveal();
        room.cast_vote(&alice, vote(2.0)).unwrap();
        room.throw_reaction(&bob, &alice, symbol("🎉")).unwrap();

        // when (操作):
        room.reset();

        // then (期待する結果):
        let state = room.state();
        assert!(!state.is_revealed);
        assert_eq!(state.average_vote, None);
        assert_eq!(state.agreement, None);
        assert!(state.changed_participant_names.is_empty());
        assert_eq!(state.participants.len(), 2);
        assert!(state.participants.iter().all(|p| p.vote.is_none()
            && !p.changed_vote_after_reveal
            && p.reaction_counters.is_empty()));
    }

    #[test]
    fn test_reset_users_clears_participants() {
        // テスト項目: 全ユーザーリセットで参加者リストと一致度が空になる
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        room.attach(client("conn-alice"));
        room.cast_vote(&client("conn-alice"), vote(1.0)).unwrap();
        room.reveal();

        // when (操作):
        room.reset_users();

        // then (期待する結果):
        assert!(room.state().participants.is_empty());
        assert_eq!(room.state().agreement, None);
        assert_eq!(room.audience(), vec![client("conn-alice")]);
    }

    #[test]
    fn test_throw_reaction_increments_target_counter() {
        // テスト項目: リアクションを投げると対象のカウンターが増える
        // given (前提条件):
        let mut room = create_room_with(&["alice", "bob"]);
        let alice = client("conn-alice");
        let bob = client("conn-bob");

        // when (操作):
        room.throw_reaction(&alice, &bob, symbol("🍅")).unwrap();
        room.throw_reaction(&alice, &bob, symbol("🍅")).unwrap();
        room.throw_reaction(&alice, &bob, symbol("🎉")).unwrap();

        // then (期待する結果):
        let counters = &room.participant(&bob).unwrap().reaction_counters;
        assert_eq!(counters.get(&symbol("🍅")), Some(&2));
        assert_eq!(counters.get(&symbol("🎉")), Some(&1));
        assert!(room.participant(&alice).unwrap().reaction_counters.is_empty());
    }

    #[test]
    fn test_throw_reaction_validation() {
        // テスト項目: 自分自身へのリアクションや存在しない参加者へのリアクションは拒否される
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);
        let alice = client("conn-alice");

        // when (操作):
        let to_self = room.throw_reaction(&alice, &alice, symbol("🍅"));
        let to_unknown = room.throw_reaction(&alice, &client("ghost"), symbol("🍅"));
        let from_unknown = room.throw_reaction(&client("ghost"), &alice, symbol("🍅"));

        // then (期待する結果):
        assert_eq!(to_self, Err(RoomError::SelfReaction));
        assert_eq!(to_unknown, Err(RoomError::ParticipantNotFound("ghost".to_string())));
        assert_eq!(from_unknown, Err(RoomError::ParticipantNotFound("ghost".to_string())));
    }

    #[test]
    fn test_disconnect_keeps_participant() {
        // テスト項目: 切断しても参加者は削除されずオフラインになる
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);
        let alice = client("conn-alice");

        // when (操作):
        let known = room.disconnect(&alice);
        let unknown = room.disconnect(&client("ghost"));

        // then (期待する結果):
        assert!(known);
        assert!(!unknown);
        assert_eq!(room.state().participants.len(), 1);
        assert!(!room.state().participants[0].online);
    }

    #[test]
    fn test_join_under_new_name_releases_old_identity() {
        // テスト項目: 同じ接続で別名参加すると、以前の参加者はオフラインになる
        // given (前提条件):
        let mut room = create_room_with(&["alice"]);

        // when (操作):
        room.join(client("conn-alice"), name("alicia"), Timestamp::new(2000));

        // then (期待する結果):
        let state = room.state();
        assert_eq!(state.participants.len(), 2);
        assert!(!state.participants[0].online);
        assert!(state.participants[1].online);
        assert_eq!(
            room.participant(&client("conn-alice")).map(|p| p.name.as_str()),
            Some("alicia")
        );
    }
}
