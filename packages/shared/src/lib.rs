//! Utilities shared by the Huddle server and client.

pub mod logger;
pub mod time;
