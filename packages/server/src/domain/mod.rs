//! Domain layer
//!
//! 外部のフレームワークやプロトコルに依存しない型とルールを定義します。

pub mod audio;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod session;
pub mod transcription;
pub mod value_object;

pub use entity::{DEFAULT_MAX_PARTICIPANTS, Participant, Room};
pub use error::{
    MessagePushError, RepositoryError, RoomError, SessionError, ValueObjectError,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{Departure, RoomRepository};
pub use session::{ConnectionSession, SignalingState};
pub use transcription::{
    BridgeState, SttCommand, SttError, SttEvent, SttOptions, SttProvider, SttSendError,
    SttStream, TranscriptRecord, TranscriptionContext,
};
#[cfg(test)]
pub use transcription::MockSttProvider;
pub use value_object::{
    ConnectionId, DisplayName, PeerId, RoomId, RoomIdFactory, Timestamp,
};
