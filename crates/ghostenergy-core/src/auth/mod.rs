//! Authentication domain module.
//!
//! - `model`: user profile and login payloads
//! - `AuthApi`: port to the authentication endpoint

mod model;

pub use model::{LoginRequest, LoginResponse, Navigation, UserProfile};

use crate::error::Result;
use async_trait::async_trait;

/// Remote authentication endpoint.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token and profile.
    ///
    /// Rejections carry the server `detail` in
    /// [`GhostError::Api`](crate::error::GhostError::Api).
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
}
