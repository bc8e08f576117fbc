//! Shared application state.

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::{
    config::TransportConfig,
    domain::{MessagePusher, RoomRepository, SttProvider},
    usecase::{
        CleanupEmptyRoomsUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
        DisconnectParticipantUseCase, GetRoomInfoUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, RelaySignalUseCase, TranscriptionSettings, TranscriptionUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// CreateRoomUseCase（Room 作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// JoinRoomUseCase（Room 参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（Room 退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// RelaySignalUseCase（signal 中継のユースケース）
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    pub get_room_info_usecase: Arc<GetRoomInfoUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub cleanup_empty_rooms_usecase: Arc<CleanupEmptyRoomsUseCase>,
    /// TranscriptionUseCase（ライブ文字起こしのユースケース）
    pub transcription_usecase: Arc<TranscriptionUseCase>,
    pub clock: Arc<dyn Clock>,
    pub transport: TransportConfig,
}

impl AppState {
    /// Wire every use case to the given repository, pusher and provider
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        stt_provider: Option<Arc<dyn SttProvider>>,
        transcription: TranscriptionSettings,
        clock: Arc<dyn Clock>,
        transport: TransportConfig,
    ) -> Self {
        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                message_pusher.clone(),
            )),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                repository.clone(),
                clock.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            relay_signal_usecase: Arc::new(RelaySignalUseCase::new(message_pusher)),
            get_room_info_usecase: Arc::new(GetRoomInfoUseCase::new(repository.clone())),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            cleanup_empty_rooms_usecase: Arc::new(CleanupEmptyRoomsUseCase::new(repository)),
            transcription_usecase: Arc::new(TranscriptionUseCase::new(
                stt_provider,
                transcription,
                clock.clone(),
            )),
            clock,
            transport,
        }
    }
}
