//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、外部とやり取りする DTO。

pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod stt;
