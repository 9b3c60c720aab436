//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the drafting/analysis LLM.
//! It implements the `LanguageModel` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use docket_core::ports::{LanguageModel, PortError, PortResult};
use regex::Regex;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LanguageModel` using an OpenAI-compatible
/// chat-completion model.
#[derive(Clone)]
pub struct OpenAiTextModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTextModel {
    /// Creates a new `OpenAiTextModel`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Chat models like to wrap whole-document answers in a Markdown code fence
/// even when told not to. Strip one outer fence when present.
fn strip_code_fence(text: &str) -> String {
    let fenced = Regex::new(r"(?s)^\s*```[a-zA-Z]*\n(.*?)\n?```\s*$").unwrap();
    match fenced.captures(text) {
        Some(captures) => captures[1].to_string(),
        None => text.to_string(),
    }
}

//=========================================================================================
// `LanguageModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl LanguageModel for OpenAiTextModel {
    /// Sends `instructions` as the system message and `text` as the user
    /// message, returning the model's reply as plain text.
    async fn complete(&self, text: &str, instructions: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(strip_code_fence(&content))
            } else {
                Err(PortError::Unexpected(
                    "LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
