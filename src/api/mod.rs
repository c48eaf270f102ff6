pub mod chat;
pub mod client;

pub use chat::ChatSession;
pub use client::{ApiError, GuardianClient};
