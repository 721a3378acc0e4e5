//! Application layer for GhostEnergy.
//!
//! The three stateful components of the dashboard client. Each one owns its
//! observable state and talks to the outside world only through the ports
//! defined in `ghostenergy-core`.

pub mod chat_manager;
pub mod session_store;
pub mod site_loader;

pub use chat_manager::{ChatSessionManager, SendOutcome};
pub use session_store::SessionStore;
pub use site_loader::{LoadOutcome, SiteDataLoader};
