//! Chat session with a (simulated) assistant.
//!
//! A [`ChatSession`] owns an ordered transcript that always starts with the assistant's
//! greeting. Sending a message appends it immediately and spawns a reply task; the reply is
//! appended once the [`Responder`] returns, unless it was cancelled first.
//!
//! At most one reply is in flight. Cancellation and clearing happen under the transcript lock,
//! and the reply task re-checks its token under the same lock before appending, so a cancelled
//! reply can never show up in the transcript.

pub mod responder;

use crate::errors::{Error, Result};
use crate::types::ModelId;
use crate::validation::Validator;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

pub use responder::{Responder, SimulatedResponder};

const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
const GREETING_MODEL: &str = "GPT-4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Model that produced an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            model: None,
        }
    }

    fn assistant(content: String, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content,
            timestamp: Utc::now(),
            model: Some(model.into()),
        }
    }

    fn greeting() -> Self {
        Self::assistant(GREETING.to_string(), GREETING_MODEL)
    }
}

/// Suggested file name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("chat-export-{}.json", date.format("%Y-%m-%d"))
}

struct InFlight {
    id: Uuid,
    token: CancellationToken,
}

struct Transcript {
    messages: Vec<ChatMessage>,
    pending: Option<InFlight>,
}

impl Transcript {
    fn new() -> Self {
        Self {
            messages: vec![ChatMessage::greeting()],
            pending: None,
        }
    }

    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(in_flight) => {
                in_flight.token.cancel();
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, id: Uuid) {
        if self.pending.as_ref().is_some_and(|p| p.id == id) {
            self.pending = None;
        }
    }
}

/// Handle on a reply that is being produced.
pub struct PendingReply {
    message: ChatMessage,
    model: ModelId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PendingReply {
    /// The user message the reply answers, as appended to the transcript.
    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    /// Stop the reply. A cancelled reply is never appended.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the reply task has finished, appended or not.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Chat reply task failed");
        }
    }
}

/// The shared chat session. Clones share one transcript.
#[derive(Clone)]
pub struct ChatSession {
    transcript: Arc<Mutex<Transcript>>,
    responder: Arc<dyn Responder>,
}

impl ChatSession {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            transcript: Arc::new(Mutex::new(Transcript::new())),
            responder,
        }
    }

    /// A session answered by [`SimulatedResponder`] after `latency`.
    pub fn simulated(latency: Duration) -> Self {
        Self::new(Arc::new(SimulatedResponder::new(latency)))
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().await.messages.clone()
    }

    pub async fn is_pending(&self) -> bool {
        self.transcript.lock().await.pending.is_some()
    }

    /// Append a user message and start producing the reply from `model`.
    ///
    /// Blank text is rejected, as is a new message while a reply is still pending.
    #[instrument(skip(self, text), fields(model = %model, len = text.len()), err)]
    pub async fn send_message(&self, text: &str, model: &ModelId) -> Result<PendingReply> {
        let mut validator = Validator::new();
        validator.required("content", text);
        validator.finish()?;

        let mut transcript = self.transcript.lock().await;
        if transcript.pending.is_some() {
            return Err(Error::Conflict {
                message: "A reply is still pending; cancel it before sending another message".to_string(),
            });
        }

        let message = ChatMessage::user(text);
        transcript.messages.push(message.clone());

        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        transcript.pending = Some(InFlight { id, token: token.clone() });

        let task = tokio::spawn(reply(
            self.transcript.clone(),
            self.responder.clone(),
            id,
            token.clone(),
            text.to_string(),
            model.clone(),
        ));

        Ok(PendingReply {
            message,
            model: model.clone(),
            token,
            task,
        })
    }

    /// Cancel the reply in flight, returning whether there was one.
    pub async fn cancel_pending(&self) -> bool {
        let cancelled = self.transcript.lock().await.cancel_pending();
        if cancelled {
            info!("Pending chat reply cancelled");
        }
        cancelled
    }

    /// Reset the transcript to the greeting, cancelling any reply in flight.
    pub async fn clear(&self) {
        let mut transcript = self.transcript.lock().await;
        transcript.cancel_pending();
        *transcript = Transcript::new();
        debug!("Chat transcript cleared");
    }

    /// The transcript as pretty-printed JSON.
    pub async fn export(&self) -> Result<String> {
        let messages = self.transcript().await;
        serde_json::to_string_pretty(&messages).map_err(|e| Error::Other(e.into()))
    }
}

async fn reply(
    transcript: Arc<Mutex<Transcript>>,
    responder: Arc<dyn Responder>,
    id: Uuid,
    token: CancellationToken,
    prompt: String,
    model: ModelId,
) {
    let result = tokio::select! {
        _ = token.cancelled() => None,
        result = responder.respond(&prompt, &model) => Some(result),
    };

    let mut transcript = transcript.lock().await;
    transcript.finish(id);
    let Some(result) = result.filter(|_| !token.is_cancelled()) else {
        debug!("Chat reply cancelled before completion");
        return;
    };

    match result {
        Ok(content) => transcript.messages.push(ChatMessage::assistant(content, model)),
        Err(e) => error!(error = %e, model = %model, "Assistant failed to reply"),
    }
}
