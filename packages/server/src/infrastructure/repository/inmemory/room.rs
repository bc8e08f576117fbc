//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! 全 Room を 1 つの `Mutex<HashMap>` で保持し、各メソッドはロックを
//! 保持したまま完結するため、変更系メソッド同士は原子的に適用されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Departure, Participant, RepositoryError, Room, RoomError, RoomId,
    RoomRepository, Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// Key: room id
    rooms: Mutex<HashMap<String, Room>>,
    max_participants: usize,
}

impl InMemoryRoomRepository {
    pub fn new(max_participants: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            max_participants,
        }
    }
}

fn map_room_error(room_id: &RoomId, error: RoomError) -> RepositoryError {
    match error {
        RoomError::Full { max_participants } => RepositoryError::RoomFull {
            room_id: room_id.as_str().to_string(),
            max_participants,
        },
        RoomError::DuplicateParticipant(id) => RepositoryError::DuplicateParticipant(id),
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(
        &self,
        room_id: RoomId,
        creator: Participant,
        created_at: Timestamp,
    ) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(room_id.as_str()) {
            return Err(RepositoryError::RoomAlreadyExists(room_id.into_string()));
        }

        let room = Room::with_capacity(room_id, creator, created_at, self.max_participants);
        rooms.insert(room.id.as_str().to_string(), room.clone());
        tracing::info!(
            "Room '{}' created by '{}' ({} rooms)",
            room.id,
            room.host,
            rooms.len()
        );
        Ok(room)
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id.as_str())
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;

        let existing = room.participants.clone();
        let connection_id = participant.connection_id.clone();
        room.add_participant(participant)
            .map_err(|e| map_room_error(room_id, e))?;

        tracing::info!(
            "'{}' joined room '{}' ({}/{})",
            connection_id,
            room_id,
            room.participant_count(),
            room.max_participants
        );
        Ok(existing)
    }

    async fn leave_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Departure> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id.as_str())?;
        let participant = room.remove_participant(connection_id)?;

        if room.is_empty() {
            rooms.remove(room_id.as_str());
            tracing::info!(
                "'{}' left room '{}'; room is empty and was deleted",
                connection_id,
                room_id
            );
            return Some(Departure {
                participant,
                remaining: Vec::new(),
                room_deleted: true,
            });
        }

        let remaining = room.other_connection_ids(connection_id);
        tracing::info!(
            "'{}' left room '{}' ({} remaining)",
            connection_id,
            room_id,
            remaining.len()
        );
        Some(Departure {
            participant,
            remaining,
            room_deleted: false,
        })
    }

    async fn broadcast_targets(
        &self,
        room_id: &RoomId,
        exclude: &ConnectionId,
    ) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id.as_str())
            .map(|room| room.other_connection_ids(exclude))
            .unwrap_or_default()
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id.as_str()).cloned()
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Room> = rooms.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        list
    }

    async fn count_rooms(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }

    async fn remove_empty_rooms(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        let before = rooms.len();
        rooms.retain(|_, room| !room.is_empty());
        before - rooms.len()
    }

    fn max_participants(&self) -> usize {
        self.max_participants
    }
}
