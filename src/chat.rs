//! Conversational assistant with keyword-routed search grounding.
//!
//! The agent keeps an append-only transcript and, lazily, a persistent
//! session whose history is replayed on every memory-bearing turn. Turns
//! that look like they need current information are instead routed to a
//! single-shot grounded call with no conversational memory.
//!
//! The routing check is deliberately simple substring matching, kept for
//! compatibility with the dashboard's established behavior.

use crate::error::GeminiError;
use crate::gemini::{
    ChatMessage, Citation, GenerateRequest, Role, TextGenerator, ThinkingLevel,
};
use crate::models::GeminiModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One visible transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
}

impl ChatTurn {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

const ASSISTANT_PERSONA: &str = "\
You are an AI assistant specializing in Legal Execution Department (LED) \
property investment. You help analyze auction assets and write Scrapy spiders \
to find the best opportunities using AHP principles.";

/// Appended in place of a reply when either path fails.
const FAILURE_NOTICE: &str = "Connection issue. Please re-open the chat.";

/// Substrings that route a turn to the grounded single-shot path.
const LIVE_INFO_MARKERS: &[&str] = &["search", "what is the current", "latest"];

/// Whether the input looks like it needs current, real-time information.
///
/// Case-insensitive substring checks over a fixed term list, a placeholder
/// for a real classifier, preserved as-is.
pub fn needs_live_search(input: &str) -> bool {
    let lowered = input.to_lowercase();
    LIVE_INFO_MARKERS.iter().any(|term| lowered.contains(term))
}

/// Server-side conversation state, replayed on every session turn.
///
/// Owned exclusively by its [`ChatAgent`]; discarded, never repaired, when
/// a call against it fails.
struct ChatSession {
    history: Vec<ChatMessage>,
}

impl ChatSession {
    fn new() -> Self {
        Self {
            history: Vec::new(),
        }
    }
}

/// Multi-turn assistant for the dashboard's chat panel.
///
/// One turn at a time: [`ChatAgent::send`] takes `&mut self`, so a second
/// turn cannot start while one is in flight.
pub struct ChatAgent<G> {
    gemini: G,
    session: Option<ChatSession>,
    transcript: Vec<ChatTurn>,
}

impl<G: TextGenerator> ChatAgent<G> {
    pub fn new(gemini: G) -> Self {
        Self {
            gemini,
            session: None,
            transcript: Vec::new(),
        }
    }

    /// The visible conversation, oldest first. Append-only.
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// True once a persistent session has been opened and not yet discarded.
    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    /// Sends one user turn and returns the resulting model turn.
    ///
    /// Both the user turn and the reply are appended to the transcript, in
    /// that order. Failures do not surface as errors here: the session is
    /// discarded and a fixed failure notice is appended as the reply, so
    /// the conversation stays renderable and the next turn starts fresh.
    pub async fn send(&mut self, input: &str) -> &ChatTurn {
        self.transcript.push(ChatTurn::user(input));

        let reply = if needs_live_search(input) {
            debug!(target: "led_scout::chat", event = "turn_routed_grounded");
            self.grounded_reply(input).await
        } else {
            debug!(target: "led_scout::chat", event = "turn_routed_session");
            self.session_reply(input).await
        };

        let turn = match reply {
            Ok(turn) => turn,
            Err(err) => {
                warn!(
                    target: "led_scout::chat",
                    error = %err,
                    event = "chat_turn_failed"
                );
                self.session = None;
                ChatTurn::model(FAILURE_NOTICE)
            }
        };

        self.transcript.push(turn);
        &self.transcript[self.transcript.len() - 1]
    }

    /// Single-shot grounded lookup; no conversational memory.
    async fn grounded_reply(&self, input: &str) -> Result<ChatTurn, GeminiError> {
        let request = GenerateRequest::new(GeminiModel::Flash3, input).with_google_search(true);
        let response = self.gemini.generate(request).await?;
        Ok(ChatTurn {
            role: Role::Model,
            text: response.text,
            sources: response.citations,
        })
    }

    /// Memory-bearing turn through the persistent session, opened lazily.
    async fn session_reply(&mut self, input: &str) -> Result<ChatTurn, GeminiError> {
        let session = self.session.get_or_insert_with(ChatSession::new);
        session.history.push(ChatMessage::user(input));

        let request = GenerateRequest::from_messages(GeminiModel::Pro3, session.history.clone())
            .with_system_instruction(ASSISTANT_PERSONA)
            .with_thinking_level(ThinkingLevel::High);

        let response = self.gemini.generate(request).await?;
        session.history.push(ChatMessage::model(&response.text));
        Ok(ChatTurn::model(response.text))
    }
}
