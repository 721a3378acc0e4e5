//! Chat domain module.
//!
//! # Module Structure
//!
//! - `message`: message types (`Sender`, `ChatMessage`)
//! - `model`: the `ChatSession` aggregate and title derivation
//! - `recency`: today / yesterday / this-week grouping
//! - `relative_time`: sidebar age labels
//! - `AssistantApi`: port to the assistant chat endpoint

mod message;
mod model;
mod recency;
mod relative_time;

pub use message::{ChatMessage, Sender};
pub use model::{ChatSession, PLACEHOLDER_TITLE, TITLE_MAX_CHARS, derive_title};
pub use recency::{RecencyGroups, group_by_recency};
pub use relative_time::format_relative_time;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Question sent to the assistant, scoped to one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "sede")]
    pub site_id: String,
    #[serde(rename = "pregunta")]
    pub question: String,
}

/// Assistant reply. Both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(rename = "respuesta", default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    /// The answer text, if it carries any non-blank content.
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// The assistant chat endpoint.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
