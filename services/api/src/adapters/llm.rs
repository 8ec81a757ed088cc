//! services/api/src/adapters/llm.rs
//!
//! Shared plumbing for the OpenAI-backed adapters: building a chat request from a system
//! prompt plus conversation turns, and decoding JSON answers into core domain types.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use lexvault_core::ports::{PortError, PortResult};
use serde::de::DeserializeOwned;

/// One prior message in a conversation.
#[derive(Debug, Clone)]
pub enum Turn {
    User(String),
    Assistant(String),
}

fn build_messages(system: &str, turns: &[Turn]) -> PortResult<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(turns.len() + 1);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
    );
    for turn in turns {
        let message: ChatCompletionRequestMessage = match turn {
            Turn::User(text) => ChatCompletionRequestUserMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            Turn::Assistant(text) => ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        };
        messages.push(message);
    }
    Ok(messages)
}

/// Sends one chat completion and returns the text of the first choice.
pub async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    system: &str,
    turns: &[Turn],
) -> PortResult<String> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(build_messages(system, turns)?)
        .n(1)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| PortError::MalformedResponse("The model returned no text content.".to_string()))
}

/// Strips an optional Markdown code fence around a JSON body.
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Decodes a model answer into `T`. Any missing field or wrong type is a
/// `MalformedResponse`; nothing is defaulted.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    serde_json::from_str(unfence(raw)).map_err(|e| PortError::MalformedResponse(e.to_string()))
}
