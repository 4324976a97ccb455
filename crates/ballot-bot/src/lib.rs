pub mod commands;
pub mod error;
pub mod hashing;
pub mod orchestrator;
mod render;
pub mod session;

pub use error::BotError;
pub use orchestrator::{BotConfig, Orchestrator};
pub use session::{Pending, Session, SessionStore};
