//! Language-generation capability used by the synthesize and summarize stages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Error;
use crate::message::Message;
use crate::provider::{CompletionRequest, Provider};

/// Turns an instruction preset plus an input text into generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, instructions: &str, input: &str) -> Result<String, Error>;
}

/// [`Generator`] backed by a chat-completion [`Provider`].
///
/// The instructions become the system message and the input the single user
/// message. The assistant reply is returned as-is.
pub struct ProviderGenerator {
    provider: Arc<dyn Provider>,
    model: Option<String>,
    temperature: Option<f32>,
    parameters: HashMap<String, serde_json::Value>,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: None,
            temperature: None,
            parameters: HashMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, serde_json::Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(&self, instructions: &str, input: &str) -> Result<String, Error> {
        let mut request =
            CompletionRequest::new(vec![Message::system(instructions), Message::user(input)]);

        if let Some(model) = &self.model {
            request = request.with_model(model.as_str());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if !self.parameters.is_empty() {
            request = request.with_extra(self.parameters.clone());
        }

        let response = self.provider.complete(request).await?;

        debug!(
            provider = self.provider.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Generation finished"
        );

        Ok(response.message.content)
    }
}
