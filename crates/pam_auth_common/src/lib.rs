//! Types shared between the PAM bridge and its front ends.

pub mod messages;
pub mod sys;

pub use messages::{MessageStyle, SessionResult};
