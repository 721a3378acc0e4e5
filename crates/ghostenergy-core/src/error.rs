//! Error types for the GhostEnergy client.

use thiserror::Error;

/// A shared error type for every GhostEnergy crate.
///
/// Variants follow the error taxonomy of the dashboard: authentication
/// failures, remote API rejections, transport problems and local storage or
/// configuration issues. None of them is fatal; callers convert them into
/// visible state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GhostError {
    /// Credentials were rejected or could not be checked
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The remote API answered with a non-success status
    #[error("API error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    /// The request never produced a usable response (connection, timeout, decoding)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Durable client-side storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before reaching the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GhostError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Creates an Api error
    pub fn api(status: u16, detail: Option<String>) -> Self {
        Self::Api { status, detail }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The detail string the server attached to a rejection, if any.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref().filter(|d| !d.trim().is_empty()),
            _ => None,
        }
    }

    /// Human-readable text for surfacing this error in the UI.
    ///
    /// Prefers the server-provided detail over the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { status, detail } => match detail.as_deref() {
                Some(detail) if !detail.trim().is_empty() => detail.to_string(),
                _ => format!("HTTP {}", status),
            },
            Self::Authentication(message)
            | Self::Transport(message)
            | Self::Storage(message)
            | Self::Config(message)
            | Self::Validation(message)
            | Self::Internal(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GhostError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for GhostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GhostError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GhostError>`.
pub type Result<T> = std::result::Result<T, GhostError>;
