//! Entity 定義
//!
//! Room は参加者の集合を保持し、定員と重複参加の不変条件を自身で守ります。

use serde::Serialize;

use super::{
    error::RoomError,
    value_object::{ConnectionId, DisplayName, PeerId, RoomId, Timestamp},
};

/// Default maximum number of participants per room
pub const DEFAULT_MAX_PARTICIPANTS: usize = 10;

/// A connection that has successfully joined a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: DisplayName,
    pub peer_id: PeerId,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(
        connection_id: ConnectionId,
        display_name: DisplayName,
        peer_id: PeerId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            display_name,
            peer_id,
            joined_at,
        }
    }
}

/// Room entity
///
/// Participants are kept in join order so that "existing participants"
/// snapshots are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    /// Connection that created the room (informational only)
    pub host: ConnectionId,
    pub participants: Vec<Participant>,
    pub created_at: Timestamp,
    pub max_participants: usize,
}

impl Room {
    /// Create a room with its creator as the first participant
    pub fn new(id: RoomId, creator: Participant, created_at: Timestamp) -> Self {
        Self::with_capacity(id, creator, created_at, DEFAULT_MAX_PARTICIPANTS)
    }

    pub fn with_capacity(
        id: RoomId,
        creator: Participant,
        created_at: Timestamp,
        max_participants: usize,
    ) -> Self {
        Self {
            id,
            host: creator.connection_id.clone(),
            participants: vec![creator],
            created_at,
            max_participants,
        }
    }

    /// Add a participant, enforcing capacity and uniqueness
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        if self.contains(&participant.connection_id) {
            return Err(RoomError::DuplicateParticipant(
                participant.connection_id.into_string(),
            ));
        }
        if self.is_full() {
            return Err(RoomError::Full {
                max_participants: self.max_participants,
            });
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Remove a participant, returning it if it was present
    pub fn remove_participant(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.connection_id == connection_id)?;
        Some(self.participants.remove(index))
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.participants
            .iter()
            .any(|p| &p.connection_id == connection_id)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Connection ids of every participant except `exclude`
    pub fn other_connection_ids(&self, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.participants
            .iter()
            .filter(|p| &p.connection_id != exclude)
            .map(|p| p.connection_id.clone())
            .collect()
    }
}
