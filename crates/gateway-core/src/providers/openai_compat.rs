//! OpenAI-compatible chat completions adapter, shared by DeepSeek and Kimi

use super::adapter::AdapterSettings;
use super::error_utils::{from_response, malformed_body, from_transport};
use super::sse::SseEvent;
use super::stream::{EventParser, ParsedEvent, ProviderStream, sse_stream};
use super::structured;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{
    ChatMessage, GenerationOptions, GenerationResult, ProviderKind, StructuredContent, TokenUsage,
};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::instrument;

pub struct OpenAiCompatProvider {
    provider: ProviderKind,
    settings: AdapterSettings,
    http_client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(provider: ProviderKind, settings: AdapterSettings, http_client: Client) -> Self {
        Self {
            provider,
            settings,
            http_client,
        }
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        stream: bool,
        json_mode: bool,
    ) -> Value {
        let mut body = json!({
            "model": self.settings.model,
            "messages": messages,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        if stream {
            body["stream"] = json!(true);
            body["stream_options"] = json!({"include_usage": true});
        }
        body
    }

    async fn send(&self, body: &Value, started: Instant) -> GatewayResult<reqwest::Response> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.settings.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| from_transport(e, self.provider, started))?;

        if !response.status().is_success() {
            return Err(from_response(response, self.provider, started).await);
        }
        Ok(response)
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        json_mode: bool,
    ) -> GatewayResult<GenerationResult> {
        let started = Instant::now();
        let body = self.request_body(messages, options, false, json_mode);
        let response = self.send(&body, started).await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| malformed_body(e, self.provider))?;
        parse_response(self.provider, &json)
    }

    #[instrument(skip(self, messages, options), fields(provider = %self.provider, model = %self.settings.model), level = "debug")]
    pub async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult> {
        self.complete(messages, options, false).await
    }

    #[instrument(skip(self, messages, options), fields(provider = %self.provider, model = %self.settings.model), level = "debug")]
    pub async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream> {
        let started = Instant::now();
        let body = self.request_body(messages, options, true, false);
        let response = self.send(&body, started).await?;
        Ok(sse_stream(
            Box::pin(response.bytes_stream()),
            ChatCompletionParser::new(self.provider),
            self.provider,
            started,
        ))
    }

    /// JSON mode only guarantees syntax, so the schema goes in the prompt
    #[instrument(skip(self, messages, schema, options), fields(provider = %self.provider, model = %self.settings.model), level = "debug")]
    pub async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent> {
        let messages = structured::with_schema_instruction(messages, schema);
        let result = self.complete(&messages, options, true).await?;
        let value = structured::coerce(&result.text, schema)?;
        Ok(StructuredContent {
            value,
            raw_text: result.text,
            usage: result.usage,
        })
    }
}

fn usage_from(usage: &Value) -> TokenUsage {
    let prompt = usage["prompt_tokens"].as_u64().unwrap_or(0);
    let completion = usage["completion_tokens"].as_u64().unwrap_or(0);
    // DeepSeek reports cache hits at the top level, Kimi in prompt_tokens_details
    let cached = usage["prompt_cache_hit_tokens"]
        .as_u64()
        .or_else(|| usage["prompt_tokens_details"]["cached_tokens"].as_u64())
        .or_else(|| usage["cached_tokens"].as_u64())
        .unwrap_or(0);
    TokenUsage::new(prompt, completion).with_cached(cached)
}

fn parse_response(provider: ProviderKind, json: &Value) -> GatewayResult<GenerationResult> {
    let choice = &json["choices"][0];
    if choice.is_null() {
        return Err(malformed_body("response has no choices", provider));
    }
    let text = choice["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let truncated = choice["finish_reason"] == "length";
    Ok(GenerationResult::new(text, usage_from(&json["usage"]), provider).with_truncated(truncated))
}

/// `chat.completion.chunk` events terminated by `[DONE]`
#[derive(Debug)]
struct ChatCompletionParser {
    provider: ProviderKind,
    usage: TokenUsage,
}

impl ChatCompletionParser {
    fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            usage: TokenUsage::default(),
        }
    }
}

impl EventParser for ChatCompletionParser {
    fn on_event(&mut self, event: &SseEvent) -> GatewayResult<ParsedEvent> {
        if event.is_done() {
            return Ok(ParsedEvent::done());
        }
        let Ok(data) = serde_json::from_str::<Value>(&event.data) else {
            return Ok(ParsedEvent::skip());
        };
        if let Some(message) = data["error"]["message"].as_str() {
            return Err(GatewayError::upstream(
                self.provider,
                format!("stream error: {}", message),
            ));
        }
        if data["usage"].is_object() {
            self.usage = usage_from(&data["usage"]);
        }
        // Kimi attaches usage to the final choice instead
        if data["choices"][0]["usage"].is_object() {
            self.usage = usage_from(&data["choices"][0]["usage"]);
        }
        match data["choices"][0]["delta"]["content"].as_str() {
            Some(text) => Ok(ParsedEvent::text(text)),
            None => Ok(ParsedEvent::skip()),
        }
    }

    fn usage(&self) -> TokenUsage {
        self.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_cache_hits() {
        let json = json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}],
            "usage": {
                "prompt_tokens": 100,
                "completion_tokens": 10,
                "prompt_cache_hit_tokens": 64,
                "prompt_cache_miss_tokens": 36
            }
        });
        let result = parse_response(ProviderKind::DeepSeek, &json).unwrap();
        assert_eq!(result.text, "ok");
        assert_eq!(result.usage.cached_tokens, 64);
        assert_eq!(result.provider_used, ProviderKind::DeepSeek);
    }

    #[test]
    fn test_kimi_cached_tokens_in_details() {
        let usage = usage_from(&json!({
            "prompt_tokens": 50,
            "completion_tokens": 5,
            "prompt_tokens_details": {"cached_tokens": 20}
        }));
        assert_eq!(usage, TokenUsage::new(50, 5).with_cached(20));
    }

    #[test]
    fn test_length_finish_marks_truncated() {
        let json = json!({
            "choices": [{"message": {"content": "partial"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1}
        });
        assert!(parse_response(ProviderKind::Kimi, &json).unwrap().truncated);
    }

    #[test]
    fn test_stream_parser() {
        let mut parser = ChatCompletionParser::new(ProviderKind::DeepSeek);
        let delta = SseEvent::new(r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#);
        assert_eq!(parser.on_event(&delta).unwrap().text.as_deref(), Some("Hi"));

        let usage = SseEvent::new(
            r#"{"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":1}}"#,
        );
        assert!(parser.on_event(&usage).unwrap().text.is_none());
        assert!(parser.on_event(&SseEvent::new("[DONE]")).unwrap().done);
        assert_eq!(parser.usage(), TokenUsage::new(3, 1));
    }
}
