//! Multi-session assistant chat.

use chrono::Utc;
use ghostenergy_core::chat::{AssistantApi, ChatMessage, ChatRequest, ChatSession};
use ghostenergy_core::state::StateCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Reply text when the assistant answered without content.
pub const NO_ANSWER_TEXT: &str = "No se pudo obtener una respuesta.";

/// Error detail used when the failure carries no server message.
pub const CONNECTIVITY_ERROR_TEXT: &str =
    "No se pudo conectar con el asistente IA. Por favor, intenta nuevamente.";

/// Result of [`ChatSessionManager::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text, or another send was still in flight
    Ignored,
    /// The assistant replied; carries the session the exchange went to
    Answered { session_id: String },
    /// The request failed and an error message was added to the session
    Failed { session_id: String },
}

/// Manages the chat sessions, the active one and the assistant round trips.
///
/// Sessions are kept newest first. Updates never modify a stored session in
/// place: the collection is rebuilt with the changed session swapped in by id.
/// At most one message is in flight per manager.
pub struct ChatSessionManager {
    api: Arc<dyn AssistantApi>,
    sessions: StateCell<Vec<ChatSession>>,
    active_id: StateCell<Option<String>>,
    current_messages: StateCell<Vec<ChatMessage>>,
    is_sending: StateCell<bool>,
    in_flight: AtomicBool,
}

impl ChatSessionManager {
    pub fn new(api: Arc<dyn AssistantApi>) -> Self {
        Self {
            api,
            sessions: StateCell::new(Vec::new()),
            active_id: StateCell::new(None),
            current_messages: StateCell::new(Vec::new()),
            is_sending: StateCell::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Prepends an empty session and makes it active. Returns its id.
    pub fn create_session(&self) -> String {
        let session = ChatSession::new(Utc::now());
        let id = session.id.clone();
        self.sessions.update(|sessions| sessions.insert(0, session));
        self.activate(&id, Vec::new());
        tracing::debug!("Created chat session {}", id);
        id
    }

    /// Activates an existing session. Unknown ids are ignored.
    pub fn select_session(&self, id: &str) -> bool {
        let messages = self
            .sessions
            .with(|sessions| sessions.iter().find(|s| s.id == id).map(|s| s.messages.clone()));
        match messages {
            Some(messages) => {
                self.activate(id, messages);
                true
            }
            None => {
                tracing::debug!("Ignoring selection of unknown chat session {}", id);
                false
            }
        }
    }

    /// Sends `text` to the assistant on behalf of the active session.
    ///
    /// The user message is visible immediately; the reply (or a readable
    /// error) is appended to the same session when the round trip ends.
    /// Failures never propagate.
    pub async fn send_message(&self, text: &str, site_id: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &self.is_sending) else {
            tracing::debug!("A message is already in flight, ignoring");
            return SendOutcome::Ignored;
        };

        let session_id = match self.active_id.get() {
            Some(id) => id,
            None => self.create_session(),
        };
        self.append(&session_id, ChatMessage::user(text));

        let request = ChatRequest {
            site_id: site_id.to_string(),
            question: text.to_string(),
        };
        tracing::debug!("Asking assistant about site '{}'", site_id);

        let (reply, outcome) = match self.api.ask(&request).await {
            Ok(response) => {
                if let Some(error) = response.error.as_deref() {
                    tracing::warn!("Assistant reported an error: {}", error);
                }
                let reply = response
                    .answer_text()
                    .map(str::to_string)
                    .unwrap_or_else(|| NO_ANSWER_TEXT.to_string());
                (reply, SendOutcome::Answered { session_id: session_id.clone() })
            }
            Err(e) => {
                tracing::error!("Assistant request failed: {}", e);
                let detail = e.server_detail().unwrap_or(CONNECTIVITY_ERROR_TEXT);
                (
                    format!("Error: {}", detail),
                    SendOutcome::Failed { session_id: session_id.clone() },
                )
            }
        };

        self.append(&session_id, ChatMessage::assistant(reply));
        outcome
    }

    /// Forgets every session, e.g. when the user signs out.
    ///
    /// A reply still in flight is dropped when it arrives because its
    /// session no longer exists.
    pub fn reset(&self) {
        self.sessions.set(Vec::new());
        self.active_id.set(None);
        self.current_messages.set(Vec::new());
        tracing::debug!("Cleared chat sessions");
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.sessions.get()
    }

    pub fn session(&self, id: &str) -> Option<ChatSession> {
        self.sessions
            .with(|sessions| sessions.iter().find(|s| s.id == id).cloned())
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.active_id.get()
    }

    pub fn current_messages(&self) -> Vec<ChatMessage> {
        self.current_messages.get()
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending.get()
    }

    pub fn subscribe_sessions(&self) -> watch::Receiver<Vec<ChatSession>> {
        self.sessions.subscribe()
    }

    pub fn subscribe_active_session_id(&self) -> watch::Receiver<Option<String>> {
        self.active_id.subscribe()
    }

    pub fn subscribe_current_messages(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.current_messages.subscribe()
    }

    pub fn subscribe_is_sending(&self) -> watch::Receiver<bool> {
        self.is_sending.subscribe()
    }

    fn activate(&self, id: &str, messages: Vec<ChatMessage>) {
        self.active_id.set(Some(id.to_string()));
        self.current_messages.set(messages);
    }

    /// Replaces session `id` with a copy that has `message` appended.
    fn append(&self, id: &str, message: ChatMessage) {
        let mut updated = None;
        self.sessions.update(|sessions| {
            let next: Vec<ChatSession> = sessions
                .iter()
                .map(|s| {
                    if s.id == id {
                        let next = s.with_message(message.clone());
                        updated = Some(next.messages.clone());
                        next
                    } else {
                        s.clone()
                    }
                })
                .collect();
            *sessions = next;
        });

        match updated {
            Some(messages) if self.active_id.with(|active| active.as_deref() == Some(id)) => {
                self.current_messages.set(messages);
            }
            Some(_) => {}
            None => tracing::warn!("Dropping message for missing chat session {}", id),
        }
    }
}

/// Holds the single-flight slot; releases it on drop, including cancellation.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    is_sending: &'a StateCell<bool>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, is_sending: &'a StateCell<bool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        is_sending.set(true);
        Some(Self { flag, is_sending })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.is_sending.set(false);
        self.flag.store(false, Ordering::Release);
    }
}
