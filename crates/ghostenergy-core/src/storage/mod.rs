//! Durable client-side key/value storage.
//!
//! Defines the interface the session store persists through, decoupling it
//! from any concrete backend (JSON file, in-memory map, browser storage).

use crate::error::Result;
use async_trait::async_trait;

/// Storage key holding the opaque auth token.
pub const TOKEN_KEY: &str = "indra_token";

/// Storage key holding the serialized user profile (JSON object).
pub const USER_KEY: &str = "indra_user";

/// An abstract string key/value store.
///
/// # Implementation Notes
///
/// Implementations should make each individual write durable before
/// returning. Multi-key atomicity is the caller's concern.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: Backend failure
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
