//! OpenAI-backed implementation of [`AnswerProvider`].

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        audio::{AudioInput, CreateTranscriptionRequest},
        chat::{
            ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
            ChatCompletionRequestMessageContentPartTextArgs,
            ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
            CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageUrlArgs,
        },
    },
    Client,
};
use async_trait::async_trait;
use base64::Engine;
use std::future::Future;
use std::time::Duration;

use crate::config::ProvidersConfig;

use super::{AnswerProvider, AudioClip, CompletionKind, ImageCapture, ProviderError};

const EXTRACT_SYSTEM_PROMPT: &str = "You read text out of screenshots. Return every piece of \
    visible text from the image, preserving line breaks and code formatting. Return ONLY the \
    text. If the image contains no readable text, return an empty response.";

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    answer_model: String,
    clarify_model: String,
    transcribe_model: String,
    extract_model: String,
    timeout: Duration,
    max_answer_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &ProvidersConfig) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(key) = &config.api_key {
            openai_config = openai_config.with_api_key(key.clone());
        }
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base.clone());
        }

        Self {
            client: Client::with_config(openai_config),
            answer_model: config.answer_model.clone(),
            clarify_model: config.clarify_model.clone(),
            transcribe_model: config.transcribe_model.clone(),
            extract_model: config.extract_model.clone(),
            timeout: config.request_timeout,
            max_answer_tokens: config.max_answer_tokens,
            temperature: config.temperature,
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, OpenAIError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ProviderError::Request(e.to_string())),
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }

    async fn run_chat(&self, request: CreateChatCompletionRequest) -> Result<String, ProviderError> {
        let response = self.with_timeout(self.client.chat().create(request)).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    async fn complete(
        &self,
        kind: CompletionKind,
        system: &str,
        user: &str,
    ) -> Result<String, ProviderError> {
        let model = match kind {
            CompletionKind::Answer => &self.answer_model,
            CompletionKind::Clarify => &self.clarify_model,
        };

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| ProviderError::Request(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(|e| ProviderError::Request(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_tokens(self.max_answer_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        self.run_chat(request).await
    }

    async fn transcribe(&self, clip: AudioClip) -> Result<String, ProviderError> {
        let input = AudioInput::from_vec_u8(clip.filename, clip.bytes);

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.transcribe_model.clone(),
            ..Default::default()
        };

        let response = self
            .with_timeout(self.client.audio().transcription().create(request))
            .await?;
        Ok(response.text)
    }

    async fn extract_text(&self, capture: ImageCapture) -> Result<String, ProviderError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&capture.bytes);
        let data_url = format!("data:{};base64,{}", capture.mime_type, encoded);

        let parts = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text("Extract all text from this screenshot.")
                .build()
                .map_err(|e| ProviderError::Request(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(data_url)
                        .build()
                        .map_err(|e| ProviderError::Request(e.to_string()))?,
                )
                .build()
                .map_err(|e| ProviderError::Request(e.to_string()))?
                .into(),
        ];

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(EXTRACT_SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| ProviderError::Request(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(parts)
                    .build()
                    .map_err(|e| ProviderError::Request(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.extract_model)
            .messages(messages)
            .max_tokens(self.max_answer_tokens)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let response = self.with_timeout(self.client.chat().create(request)).await?;
        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_builds_from_configured_models() {
        let request = CreateChatCompletionRequestArgs::default()
            .model("gpt-4o-mini")
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content("system")
                        .build()
                        .unwrap(),
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content("user")
                        .build()
                        .unwrap(),
                ),
            ])
            .max_tokens(600u32)
            .build()
            .unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 2);
    }

    #[tokio::test]
    async fn timeout_is_reported_as_such() {
        let provider = OpenAiProvider::new(&ProvidersConfig {
            request_timeout: Duration::from_millis(5),
            ..Default::default()
        });
        let result = provider
            .with_timeout(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ProviderError::Timeout(_))));
    }
}
