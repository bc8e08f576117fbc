//! Connection session state machine.
//!
//! One `ConnectionSession` exists per signaling connection and is owned by the
//! connection's reader task, so transitions never race with each other.
//!
//! ```text
//! Connected ──room request──▶ RoomPending ──ok──▶ InRoom
//!     ▲                          │ rejected          │ leave-room
//!     └──────────────────────────┘                   ▼
//!     ◀─────────────── finish_leave ─────────── Disconnecting ──finish_disconnect──▶ Closed
//! ```

use super::{
    error::SessionError,
    value_object::{ConnectionId, DisplayName, PeerId, RoomId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Connected,
    RoomPending,
    InRoom,
    Disconnecting,
    Closed,
}

#[derive(Debug)]
pub struct ConnectionSession {
    connection_id: ConnectionId,
    room_id: Option<RoomId>,
    peer_id: Option<PeerId>,
    display_name: Option<DisplayName>,
    state: SignalingState,
    /// Set once joined; cleared as soon as leave/disconnect handling begins
    active: bool,
}

impl ConnectionSession {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            room_id: None,
            peer_id: None,
            display_name: None,
            state: SignalingState::Connected,
            active: false,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn peer_id(&self) -> Option<&PeerId> {
        self.peer_id.as_ref()
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Connected → RoomPending
    pub fn begin_room_request(&mut self) -> Result<(), SessionError> {
        match self.state {
            SignalingState::Connected => {
                self.state = SignalingState::RoomPending;
                Ok(())
            }
            SignalingState::RoomPending => Err(SessionError::RequestPending),
            SignalingState::InRoom => Err(SessionError::AlreadyInRoom(
                self.room_id
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
            )),
            SignalingState::Disconnecting | SignalingState::Closed => Err(SessionError::Closed),
        }
    }

    /// RoomPending → InRoom
    pub fn complete_room_request(
        &mut self,
        room_id: RoomId,
        peer_id: PeerId,
        display_name: DisplayName,
    ) {
        if self.state != SignalingState::RoomPending {
            tracing::warn!(
                "Ignoring room completion for '{}' in state {:?}",
                self.connection_id,
                self.state
            );
            return;
        }
        self.room_id = Some(room_id);
        self.peer_id = Some(peer_id);
        self.display_name = Some(display_name);
        self.state = SignalingState::InRoom;
        self.active = true;
    }

    /// RoomPending → Connected (registry rejected the request)
    pub fn abort_room_request(&mut self) {
        if self.state == SignalingState::RoomPending {
            self.state = SignalingState::Connected;
        }
    }

    /// InRoom → Disconnecting for an explicit `leave-room`.
    ///
    /// Returns the room to clean up, or `None` when the connection is not an
    /// active member of `room_id` (a no-op, not an error).
    pub fn begin_leave(&mut self, room_id: &RoomId) -> Option<RoomId> {
        if !self.active || self.room_id.as_ref() != Some(room_id) {
            return None;
        }
        self.active = false;
        self.state = SignalingState::Disconnecting;
        self.room_id.take()
    }

    /// Disconnecting → Connected once leave cleanup is done
    pub fn finish_leave(&mut self) {
        if self.state == SignalingState::Disconnecting {
            self.state = SignalingState::Connected;
            self.peer_id = None;
            self.display_name = None;
        }
    }

    /// Any → Disconnecting for a transport disconnect.
    ///
    /// The outer `Option` is `None` when disconnect handling already began;
    /// the inner one carries the room that still needs cleanup.
    pub fn begin_disconnect(&mut self) -> Option<Option<RoomId>> {
        if matches!(
            self.state,
            SignalingState::Disconnecting | SignalingState::Closed
        ) {
            return None;
        }
        let room = if self.active {
            self.active = false;
            self.room_id.take()
        } else {
            None
        };
        self.state = SignalingState::Disconnecting;
        Some(room)
    }

    /// Disconnecting → Closed
    pub fn finish_disconnect(&mut self) {
        self.active = false;
        self.state = SignalingState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined_session() -> ConnectionSession {
        let mut session = ConnectionSession::new(ConnectionId::new("c1".to_string()).unwrap());
        session.begin_room_request().unwrap();
        session.complete_room_request(
            RoomId::new("r1".to_string()).unwrap(),
            PeerId::new("p1".to_string()).unwrap(),
            DisplayName::new("Alice".to_string()).unwrap(),
        );
        session
    }

    #[test]
    fn test_new_session_is_connected_and_inactive() {
        // テスト項目: 新規セッションは Connected 状態で非アクティブ
        // given (前提条件):

        // when (操作):
        let session = ConnectionSession::new(ConnectionId::generate());

        // then (期待する結果):
        assert_eq!(session.state(), SignalingState::Connected);
        assert!(!session.is_active());
        assert!(session.room_id().is_none());
    }

    #[test]
    fn test_join_transitions_to_in_room() {
        // テスト項目: 参加成功で InRoom かつアクティブになる
        // given (前提条件):

        // when (操作):
        let session = joined_session();

        // then (期待する結果):
        assert_eq!(session.state(), SignalingState::InRoom);
        assert!(session.is_active());
        assert_eq!(session.room_id().unwrap().as_str(), "r1");
        assert_eq!(session.peer_id().unwrap().as_str(), "p1");
    }

    #[test]
    fn test_rejected_request_returns_to_connected() {
        // テスト項目: 参加が拒否されたら Connected に戻る
        // given (前提条件):
        let mut session = ConnectionSession::new(ConnectionId::generate());
        session.begin_room_request().unwrap();

        // when (操作):
        session.abort_room_request();

        // then (期待する結果):
        assert_eq!(session.state(), SignalingState::Connected);
        assert!(session.begin_room_request().is_ok());
    }

    #[test]
    fn test_room_request_while_in_room_is_rejected() {
        // テスト項目: 参加中に別の Room 操作をするとエラーになる
        // given (前提条件):
        let mut session = joined_session();

        // when (操作):
        let result = session.begin_room_request();

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::AlreadyInRoom("r1".to_string())));
        assert_eq!(session.state(), SignalingState::InRoom);
    }

    #[test]
    fn test_leave_is_idempotent() {
        // テスト項目: leave を 2 回呼んでも 2 回目は no-op
        // given (前提条件):
        let mut session = joined_session();
        let room_id = RoomId::new("r1".to_string()).unwrap();

        // when (操作):
        let first = session.begin_leave(&room_id);
        session.finish_leave();
        let second = session.begin_leave(&room_id);

        // then (期待する結果):
        assert_eq!(first, Some(room_id));
        assert_eq!(second, None);
        assert_eq!(session.state(), SignalingState::Connected);
        assert!(!session.is_active());
    }

    #[test]
    fn test_leave_other_room_is_noop() {
        // テスト項目: 参加していない Room からの leave は no-op
        // given (前提条件):
        let mut session = joined_session();

        // when (操作):
        let result = session.begin_leave(&RoomId::new("other".to_string()).unwrap());

        // then (期待する結果):
        assert_eq!(result, None);
        assert!(session.is_active());
    }

    #[test]
    fn test_disconnect_cleans_up_only_once() {
        // テスト項目: 切断処理は一度だけ Room のクリーンアップ対象を返す
        // given (前提条件):
        let mut session = joined_session();

        // when (操作):
        let first = session.begin_disconnect();
        session.finish_disconnect();
        let second = session.begin_disconnect();

        // then (期待する結果):
        assert_eq!(first, Some(Some(RoomId::new("r1".to_string()).unwrap())));
        assert_eq!(second, None);
        assert_eq!(session.state(), SignalingState::Closed);
    }

    #[test]
    fn test_disconnect_after_leave_has_nothing_to_clean() {
        // テスト項目: leave 後の切断では Room のクリーンアップは不要
        // given (前提条件):
        let mut session = joined_session();
        session.begin_leave(&RoomId::new("r1".to_string()).unwrap());
        session.finish_leave();

        // when (操作):
        let result = session.begin_disconnect();

        // then (期待する結果):
        assert_eq!(result, Some(None));
    }

    #[test]
    fn test_closed_session_rejects_room_requests() {
        // テスト項目: Closed のセッションは Room 操作を受け付けない
        // given (前提条件):
        let mut session = ConnectionSession::new(ConnectionId::generate());
        session.begin_disconnect();
        session.finish_disconnect();

        // when (操作):
        let result = session.begin_room_request();

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::Closed));
    }
}
