//! Authentication domain models.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as returned by the login endpoint and
/// persisted under [`USER_KEY`](crate::storage::USER_KEY).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub role: String,
    /// Avatar reference (URL or asset name)
    #[serde(default)]
    pub avatar: String,
}

/// Credentials sent to `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Where the caller should send the user after a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The unauthenticated entry point
    Login,
    /// The dashboard
    Dashboard,
}
