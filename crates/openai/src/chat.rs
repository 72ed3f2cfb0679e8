use async_trait::async_trait;
use route_planning::provider::{ProviderError, TextGenerationProvider};
use serde::{Deserialize, Serialize};

use crate::client::OpenAiClient;
use crate::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.to_owned(),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn text(self) -> Result<String, ApiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ApiError::EmptyCompletion)
    }
}

impl OpenAiClient {
    pub async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, ApiError> {
        let request = ChatCompletionRequest {
            model: self.credentials.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
            temperature: Some(0.7),
            max_tokens: Some(2000),
        };
        self.post::<_, ChatCompletionResponse>("chat/completions", &request)
            .await?
            .text()
    }
}

#[async_trait]
impl TextGenerationProvider for OpenAiClient {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError> {
        Ok(self.complete(system_prompt, prompt).await?)
    }
}
