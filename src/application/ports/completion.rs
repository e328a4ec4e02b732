use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use thiserror::Error;

/// Speaker of a conversation turn as the completion API names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            top_k: None,
            top_p: None,
            max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub contents: Vec<ChatTurn>,
    pub generation: GenerationConfig,
    /// Applies the medium-and-above block threshold to the standard harm categories.
    pub safety_filters: bool,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API rate limited")]
    RateLimited,
    #[error("completion API returned HTTP {0}")]
    Http(u16),
    #[error("completion transport error: {0}")]
    Transport(String),
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Text-completion backend used by the chat assistant.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the first candidate's text. `Ok(None)` means the API answered without text.
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, CompletionError>;
}
