//! Per-user conversation memory for Gondola: bounded turn history with
//! idle expiry and a background sweeper.

pub mod store;
pub mod sweeper;
pub mod turn;

pub use store::{
    Clock, ConversationStore, SessionStats, SessionStore, SessionStoreConfig, SystemClock,
};
pub use sweeper::SweepHandle;
pub use turn::{Role, Session, Turn};

#[cfg(test)]
mod tests;
