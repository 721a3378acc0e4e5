//! Domain layer of the GhostEnergy dashboard client.
//!
//! Holds the models shared by every layer, the ports the application layer
//! talks through (`AuthApi`, `DashboardApi`, `AssistantApi`,
//! `KeyValueStore`) and the pure helpers that need no I/O.

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod state;
pub mod storage;

// Re-export common error type
pub use error::{GhostError, Result};
pub use state::StateCell;
