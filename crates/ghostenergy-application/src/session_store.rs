//! Authenticated-user state backed by durable key/value storage.

use ghostenergy_core::auth::{AuthApi, LoginRequest, Navigation, UserProfile};
use ghostenergy_core::error::{GhostError, Result};
use ghostenergy_core::state::StateCell;
use ghostenergy_core::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use std::sync::Arc;
use tokio::sync::watch;

/// Shown when the login form is submitted with a blank field.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Por favor completa todos los campos";

/// Shown when the auth service rejects a login without a detail.
pub const AUTH_FAILED_MESSAGE: &str = "Error de autenticación";

/// Holds the signed-in user.
///
/// The token and the serialized profile live in a [`KeyValueStore`] and are
/// written and cleared as a pair. The in-memory profile is published through
/// a [`StateCell`] so views can subscribe to sign-in/sign-out.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    auth: Arc<dyn AuthApi>,
    user: StateCell<Option<UserProfile>>,
    loading: StateCell<bool>,
    error_message: StateCell<Option<String>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, auth: Arc<dyn AuthApi>) -> Self {
        Self {
            storage,
            auth,
            user: StateCell::new(None),
            loading: StateCell::new(false),
            error_message: StateCell::new(None),
        }
    }

    /// Rebuilds the in-memory session from durable storage.
    ///
    /// The token is not re-validated. A half-written pair or an unreadable
    /// profile is cleared so storage and memory agree again.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let profile = self.storage.get(USER_KEY).await?;
        let token = self.storage.get(TOKEN_KEY).await?;

        let user = match (profile, token) {
            (None, None) => None,
            (Some(raw), Some(_)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Stored user profile is unreadable, clearing session: {}", e);
                    self.clear_storage().await;
                    None
                }
            },
            (profile, _) => {
                tracing::warn!(
                    "Stored session is half-written (profile: {}), clearing it",
                    profile.is_some()
                );
                self.clear_storage().await;
                None
            }
        };

        if let Some(user) = &user {
            tracing::info!("Restored session for '{}'", user.name);
        }
        self.user.set(user.clone());
        Ok(user)
    }

    /// Exchanges credentials for a session.
    ///
    /// On success the token and profile are persisted, the user is published
    /// and [`Navigation::Dashboard`] is returned. On failure the previous
    /// session is left as it was and the error carries the text to show
    /// (also published through [`error_message`](Self::error_message)).
    pub async fn login(&self, username: &str, password: &str) -> Result<Navigation> {
        if username.trim().is_empty() || password.trim().is_empty() {
            self.error_message.set(Some(MISSING_CREDENTIALS_MESSAGE.to_string()));
            return Err(GhostError::validation(MISSING_CREDENTIALS_MESSAGE));
        }

        self.loading.set(true);
        self.error_message.set(None);

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let result = self.authenticate(&request).await;
        self.loading.set(false);

        match result {
            Ok(user) => {
                tracing::info!("Logged in as '{}' ({})", user.name, user.role);
                self.user.set(Some(user));
                Ok(Navigation::Dashboard)
            }
            Err(e) => {
                let message = login_failure_message(&e);
                tracing::error!("Login for '{}' failed: {}", username, e);
                self.error_message.set(Some(message.clone()));
                Err(GhostError::authentication(message))
            }
        }
    }

    /// Clears the durable pair and the in-memory session. Never fails.
    pub async fn logout(&self) -> Navigation {
        self.clear_storage().await;
        self.user.set(None);
        self.error_message.set(None);
        tracing::info!("Logged out");
        Navigation::Login
    }

    /// True iff a token is present in durable storage. Expiry is not checked.
    pub async fn is_authenticated(&self) -> bool {
        match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::error!("Failed to read auth token: {}", e);
                false
            }
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.user.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.user.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// The last login failure text, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error_message.get()
    }

    async fn authenticate(&self, request: &LoginRequest) -> Result<UserProfile> {
        let response = self.auth.login(request).await?;
        self.persist(&response.token, &response.user).await?;
        Ok(response.user)
    }

    /// Writes profile then token. A failed write puts both keys back to
    /// what they held before, so a previous session survives intact.
    async fn persist(&self, token: &str, user: &UserProfile) -> Result<()> {
        let profile = serde_json::to_string(user)?;
        let previous_profile = self.storage.get(USER_KEY).await?;
        let previous_token = self.storage.get(TOKEN_KEY).await?;

        let written = match self.storage.set(USER_KEY, &profile).await {
            Ok(()) => self.storage.set(TOKEN_KEY, token).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            self.restore_key(USER_KEY, previous_profile.as_deref()).await;
            self.restore_key(TOKEN_KEY, previous_token.as_deref()).await;
            return Err(e);
        }
        Ok(())
    }

    async fn restore_key(&self, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(value) => self.storage.set(key, value).await,
            None => self.storage.remove(key).await,
        };
        if let Err(e) = result {
            tracing::error!("Failed to roll back '{}' in storage: {}", key, e);
        }
    }

    async fn clear_storage(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::error!("Failed to remove '{}' from storage: {}", key, e);
            }
        }
    }
}

fn login_failure_message(error: &GhostError) -> String {
    error
        .server_detail()
        .map(str::to_string)
        .unwrap_or_else(|| AUTH_FAILED_MESSAGE.to_string())
}
