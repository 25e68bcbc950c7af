//! Generation request types

use super::provider::ProviderKind;
use crate::analysis::AnalysisContext;
use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// How the caller wants the output delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Sync,
    Stream,
    Structured,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Stream => write!(f, "stream"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// Either a bare prompt or a full conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestInput {
    Prompt { prompt: String },
    Messages { messages: Vec<ChatMessage> },
}

/// Per-request generation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// JSON Schema the structured output must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
    /// Workload context the request is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisContext>,
}

/// A request as constructed by the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Requested provider hint; `None` routes to the working provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(flatten)]
    pub input: RequestInput,
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Create a synchronous request from a prompt
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            provider: None,
            input: RequestInput::Prompt {
                prompt: prompt.into(),
            },
            mode: GenerationMode::Sync,
            options: GenerationOptions::default(),
        }
    }

    /// Create a synchronous request from a conversation
    pub fn messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            provider: None,
            input: RequestInput::Messages { messages },
            mode: GenerationMode::Sync,
            options: GenerationOptions::default(),
        }
    }

    /// Set the requested provider
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the delivery mode
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Request structured output matching `schema`
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.options.schema = Some(schema);
        self.mode = GenerationMode::Structured;
        self
    }

    /// Attach workload analysis context
    pub fn with_analysis(mut self, analysis: AnalysisContext) -> Self {
        self.options.analysis = Some(analysis);
        self
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.options.system_instruction = Some(instruction.into());
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    /// Normalize the input into a conversation the adapters understand.
    ///
    /// The system instruction, when present, is prepended as a system message
    /// unless the conversation already starts with one.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = match &self.input {
            RequestInput::Prompt { prompt } => vec![ChatMessage::user(prompt.clone())],
            RequestInput::Messages { messages } => messages.clone(),
        };

        if let Some(instruction) = &self.options.system_instruction {
            let has_system = messages
                .first()
                .is_some_and(|m| m.role == MessageRole::System);
            if !has_system {
                messages.insert(0, ChatMessage::system(instruction.clone()));
            }
        }

        messages
    }

    /// Reject requests no backend could serve
    pub fn validate(&self) -> GatewayResult<()> {
        let empty = match &self.input {
            RequestInput::Prompt { prompt } => prompt.trim().is_empty(),
            RequestInput::Messages { messages } => {
                messages.iter().all(|m| m.role == MessageRole::System)
                    || messages.iter().all(|m| m.content.trim().is_empty())
            }
        };
        if empty {
            return Err(GatewayError::invalid_request(
                "request contains no user content",
                "input",
            ));
        }

        if self.mode == GenerationMode::Structured && self.options.schema.is_none() {
            return Err(GatewayError::invalid_request(
                "structured mode requires a schema",
                "options.schema",
            ));
        }

        if let Some(temperature) = self.options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(GatewayError::invalid_request(
                    format!("temperature {} is outside 0.0..=2.0", temperature),
                    "options.temperature",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_prompt_request() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "provider": "gemini",
            "prompt": "Summarize my week",
            "mode": "stream",
            "options": {"maxTokens": 256, "systemInstruction": "Be brief"}
        }))
        .unwrap();

        assert_eq!(request.provider, Some(ProviderKind::Gemini));
        assert_eq!(request.mode, GenerationMode::Stream);
        assert_eq!(request.options.max_tokens, Some(256));

        let messages = request.to_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "Summarize my week");
    }

    #[test]
    fn test_deserialize_messages_request_defaults_to_sync() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert_eq!(request.mode, GenerationMode::Sync);
        assert!(request.provider.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_existing_system_message_is_kept() {
        let request = GenerationRequest::messages(vec![
            ChatMessage::system("original"),
            ChatMessage::user("hi"),
        ])
        .with_system_instruction("ignored");

        let messages = request.to_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "original");
    }

    #[test]
    fn test_validate_rejects_empty_and_schemaless_structured() {
        assert!(GenerationRequest::prompt("   ").validate().is_err());

        let request = GenerationRequest::prompt("x").with_mode(GenerationMode::Structured);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("schema"));

        let request = GenerationRequest::prompt("x").with_schema(json!({"type": "object"}));
        assert!(request.validate().is_ok());
    }
}
