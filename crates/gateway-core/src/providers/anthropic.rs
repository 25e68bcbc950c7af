//! Claude adapter (Anthropic Messages API)

use super::adapter::AdapterSettings;
use super::error_utils::{from_response, malformed_body, from_transport};
use super::sse::SseEvent;
use super::stream::{EventParser, ParsedEvent, ProviderStream, sse_stream};
use super::structured;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{
    ChatMessage, GenerationOptions, GenerationResult, MessageRole, ProviderKind,
    StructuredContent, TokenUsage,
};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::instrument;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    settings: AdapterSettings,
    http_client: Client,
}

impl AnthropicProvider {
    pub fn new(settings: AdapterSettings, http_client: Client) -> Self {
        Self {
            settings,
            http_client,
        }
    }

    fn request_body(&self, messages: &[ChatMessage], options: &GenerationOptions, stream: bool) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                json!({
                    "role": if m.role == MessageRole::Assistant { "assistant" } else { "user" },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": self.settings.model,
            "messages": turns,
            "max_tokens": options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if !system.is_empty() {
            let system = system.join("\n\n");
            body["system"] = if self.settings.context_caching {
                json!([{
                    "type": "text",
                    "text": system,
                    "cache_control": {"type": "ephemeral"}
                }])
            } else {
                json!(system)
            };
        }
        if let Some(temperature) = options.temperature {
            // the Messages API caps temperature at 1.0
            body["temperature"] = json!(temperature.min(1.0));
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    async fn send(&self, body: &Value, started: Instant) -> GatewayResult<reqwest::Response> {
        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", self.settings.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| from_transport(e, ProviderKind::Claude, started))?;

        if !response.status().is_success() {
            return Err(from_response(response, ProviderKind::Claude, started).await);
        }
        Ok(response)
    }

    #[instrument(skip(self, messages, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult> {
        let started = Instant::now();
        let response = self
            .send(&self.request_body(messages, options, false), started)
            .await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| malformed_body(e, ProviderKind::Claude))?;
        parse_response(&json)
    }

    #[instrument(skip(self, messages, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream> {
        let started = Instant::now();
        let response = self
            .send(&self.request_body(messages, options, true), started)
            .await?;
        Ok(sse_stream(
            Box::pin(response.bytes_stream()),
            ClaudeEventParser::default(),
            ProviderKind::Claude,
            started,
        ))
    }

    /// No native schema mode: instruct, parse, validate
    #[instrument(skip(self, messages, schema, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent> {
        let messages = structured::with_schema_instruction(messages, schema);
        let result = self.generate_content(&messages, options).await?;
        let value = structured::coerce(&result.text, schema)?;
        Ok(StructuredContent {
            value,
            raw_text: result.text,
            usage: result.usage,
        })
    }
}

fn usage_from(usage: &Value) -> TokenUsage {
    let field = |name: &str| usage[name].as_u64().unwrap_or(0);
    let cache_read = field("cache_read_input_tokens");
    // input_tokens excludes cached segments
    let prompt = field("input_tokens") + cache_read + field("cache_creation_input_tokens");
    TokenUsage::new(prompt, field("output_tokens")).with_cached(cache_read)
}

fn parse_response(json: &Value) -> GatewayResult<GenerationResult> {
    let blocks = json["content"]
        .as_array()
        .ok_or_else(|| malformed_body("missing content", ProviderKind::Claude))?;
    let text: String = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect();

    let truncated = json["stop_reason"] == "max_tokens";
    Ok(
        GenerationResult::new(text, usage_from(&json["usage"]), ProviderKind::Claude)
            .with_truncated(truncated),
    )
}

/// Handles `message_start`, `content_block_delta`, `message_delta`,
/// `message_stop` and `error` events
#[derive(Debug, Default)]
struct ClaudeEventParser {
    usage: TokenUsage,
}

impl EventParser for ClaudeEventParser {
    fn on_event(&mut self, event: &SseEvent) -> GatewayResult<ParsedEvent> {
        let Ok(data) = serde_json::from_str::<Value>(&event.data) else {
            return Ok(ParsedEvent::skip());
        };
        let event_type = event.name.as_deref().or_else(|| data["type"].as_str());

        match event_type {
            Some("message_start") => {
                self.usage = usage_from(&data["message"]["usage"]);
                Ok(ParsedEvent::skip())
            }
            Some("content_block_delta") if data["delta"]["type"] == "text_delta" => Ok(
                ParsedEvent::text(data["delta"]["text"].as_str().unwrap_or_default()),
            ),
            Some("message_delta") => {
                if let Some(output) = data["usage"]["output_tokens"].as_u64() {
                    self.usage.completion_tokens = output;
                }
                Ok(ParsedEvent::skip())
            }
            Some("message_stop") => Ok(ParsedEvent::done()),
            Some("error") => Err(GatewayError::upstream(
                ProviderKind::Claude,
                format!(
                    "stream error: {}",
                    data["error"]["message"].as_str().unwrap_or("unknown error")
                ),
            )),
            _ => Ok(ParsedEvent::skip()),
        }
    }

    fn usage(&self) -> TokenUsage {
        self.usage
    }
}
