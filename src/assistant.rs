//! Text-completion client for the assistant command
//!
//! Forwards free-form prompts to an OpenAI-compatible chat completion API
//! and returns the first choice's content verbatim.

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use thiserror::Error;

const COMPLETION_MODEL: &str = "gpt-3.5-turbo";

/// Errors that can occur during a completion request
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Request building or API failure
    #[error("completion API error: {0}")]
    Api(String),
    /// The API returned no usable choice
    #[error("empty completion response")]
    EmptyResponse,
}

/// Interface for text-completion providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Completion: Send + Sync {
    /// Complete `prompt` and return the response text
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Chat-completion client over the OpenAI API
pub struct OpenAiAssistant {
    client: Client<OpenAIConfig>,
}

impl OpenAiAssistant {
    /// Create a client using the given API key
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl Completion for OpenAiAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| AssistantError::Api(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(COMPLETION_MODEL)
            .messages(messages)
            .build()
            .map_err(|e| AssistantError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AssistantError::Api(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AssistantError::EmptyResponse)
    }
}
