//! Google Gemini adapter

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

/// Schema keywords the `responseSchema` subset rejects
const UNSUPPORTED_SCHEMA_KEYS: [&str; 3] = ["$schema", "$id", "additionalProperties"];

pub struct GeminiProvider {
    settings: AdapterSettings,
    http_client: Client,
}

impl GeminiProvider {
    pub fn new(settings: AdapterSettings, http_client: Client) -> Self {
        Self {
            settings,
            http_client,
        }
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        schema: Option<&Value>,
    ) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                json!({
                    "role": if m.role == MessageRole::Assistant { "model" } else { "user" },
                    "parts": [{"text": m.content}],
                })
            })
            .collect();

        let mut body = json!({ "contents": contents });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{"text": system.join("\n\n")}] });
        }

        let mut generation_config = json!({});
        if let Some(max_tokens) = options.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(schema) = schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = response_schema(schema);
        }
        if generation_config
            .as_object()
            .is_some_and(|obj| !obj.is_empty())
        {
            body["generationConfig"] = generation_config;
        }
        body
    }

    async fn send(&self, method: &str, body: &Value, started: Instant) -> GatewayResult<reqwest::Response> {
        // the key travels in a header so it never shows up in a logged URL
        let url = format!(
            "{}/v1beta/models/{}:{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
            method
        );
        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", self.settings.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| from_transport(e, ProviderKind::Gemini, started))?;

        if !response.status().is_success() {
            return Err(from_response(response, ProviderKind::Gemini, started).await);
        }
        Ok(response)
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        schema: Option<&Value>,
    ) -> GatewayResult<GenerationResult> {
        let started = Instant::now();
        let body = self.request_body(messages, options, schema);
        let response = self.send("generateContent", &body, started).await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| malformed_body(e, ProviderKind::Gemini))?;
        parse_response(&json)
    }

    #[instrument(skip(self, messages, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult> {
        self.generate(messages, options, None).await
    }

    #[instrument(skip(self, messages, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream> {
        let started = Instant::now();
        let body = self.request_body(messages, options, None);
        let response = self
            .send("streamGenerateContent?alt=sse", &body, started)
            .await?;
        Ok(sse_stream(
            Box::pin(response.bytes_stream()),
            GeminiEventParser::default(),
            ProviderKind::Gemini,
            started,
        ))
    }

    /// Native JSON mode; the result is still validated locally
    #[instrument(skip(self, messages, schema, options), fields(model = %self.settings.model), level = "debug")]
    pub async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent> {
        let result = self.generate(messages, options, Some(schema)).await?;
        let value = structured::coerce(&result.text, schema)?;
        Ok(StructuredContent {
            value,
            raw_text: result.text,
            usage: result.usage,
        })
    }
}

/// Copy of `schema` without the keywords Gemini refuses
fn response_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), response_schema(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(response_schema).collect()),
        other => other.clone(),
    }
}

fn usage_from(metadata: &Value) -> TokenUsage {
    let field = |name: &str| metadata[name].as_u64().unwrap_or(0);
    TokenUsage::new(field("promptTokenCount"), field("candidatesTokenCount"))
        .with_cached(field("cachedContentTokenCount"))
}

fn candidate_text(json: &Value) -> String {
    json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default()
}

fn parse_response(json: &Value) -> GatewayResult<GenerationResult> {
    let candidate = &json["candidates"][0];
    if candidate.is_null() {
        let reason = json["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates returned");
        return Err(GatewayError::upstream(
            ProviderKind::Gemini,
            format!("Gemini returned no output: {}", reason),
        ));
    }

    let truncated = candidate["finishReason"] == "MAX_TOKENS";
    Ok(GenerationResult::new(
        candidate_text(json),
        usage_from(&json["usageMetadata"]),
        ProviderKind::Gemini,
    )
    .with_truncated(truncated))
}

/// Every event is a full `GenerateContentResponse` carrying a text delta;
/// the body simply ends after the last one
#[derive(Debug, Default)]
struct GeminiEventParser {
    usage: TokenUsage,
}

impl EventParser for GeminiEventParser {
    fn on_event(&mut self, event: &SseEvent) -> GatewayResult<ParsedEvent> {
        let Ok(data) = serde_json::from_str::<Value>(&event.data) else {
            return Ok(ParsedEvent::skip());
        };
        if let Some(message) = data["error"]["message"].as_str() {
            return Err(GatewayError::upstream(
                ProviderKind::Gemini,
                format!("stream error: {}", message),
            ));
        }
        if data["usageMetadata"].is_object() {
            self.usage = usage_from(&data["usageMetadata"]);
        }
        Ok(ParsedEvent::text(candidate_text(&data)))
    }

    fn usage(&self) -> TokenUsage {
        self.usage
    }
}
