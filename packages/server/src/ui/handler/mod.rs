//! Request handlers.

mod http;
mod signaling;
mod transcript;
mod transport;

pub use http::{get_room_detail, get_rooms, health_check, service_info};
pub use signaling::signaling_handler;
pub use transcript::transcript_handler;
