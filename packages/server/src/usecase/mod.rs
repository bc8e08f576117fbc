//! UseCase layer
//!
//! 1 つの操作につき 1 つの構造体。ドメイン層の trait（`RoomRepository`,
//! `MessagePusher`, `SttProvider`）にのみ依存します。

mod cleanup_rooms;
mod connect_participant;
mod create_room;
mod disconnect_participant;
mod error;
mod get_room_info;
mod get_rooms;
mod join_room;
mod leave_room;
mod relay_signal;
mod transcription;

pub use cleanup_rooms::CleanupEmptyRoomsUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    CreateRoomError, GetRoomInfoError, JoinRoomError, RelaySignalError, TranscriptionError,
};
pub use get_room_info::GetRoomInfoUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use transcription::{
    AudioOutcome, TranscriptionBridge, TranscriptionOutput, TranscriptionSettings,
    TranscriptionUseCase,
};
