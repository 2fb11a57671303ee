//! Producers of assistant replies.

use crate::types::ModelId;
use async_trait::async_trait;
use std::time::Duration;

/// Produces the assistant's reply to one user message.
///
/// Implementations may take as long as they like; the session races them against
/// cancellation. An error is logged by the session and no reply is appended.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, prompt: &str, model: &ModelId) -> anyhow::Result<String>;
}

/// Answers every message with a fixed template after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedResponder {
    latency: Duration,
}

impl SimulatedResponder {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn reply_text(prompt: &str, model: &ModelId) -> String {
        format!(
            "I understand you're asking about: \"{prompt}\". This is a simulated response from the {model} model. \
             In a real implementation, this would connect to your configured LLM API."
        )
    }
}

#[async_trait]
impl Responder for SimulatedResponder {
    async fn respond(&self, prompt: &str, model: &ModelId) -> anyhow::Result<String> {
        tokio::time::sleep(self.latency).await;
        Ok(Self::reply_text(prompt, model))
    }
}
