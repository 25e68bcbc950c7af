//! Deterministic local provider
//!
//! The terminal fallback: it needs no credential, performs no I/O and never
//! fails. Output is derived from the request's analysis context when present.

use super::stream::{ProviderStream, StreamPiece};
use crate::analysis::{canned_analysis, generic_analysis};
use crate::error::GatewayResult;
use crate::types::{
    ChatMessage, GenerationOptions, GenerationResult, MessageRole, ProviderKind,
    StructuredContent, TokenUsage,
};
use serde_json::{Map, Value, json};

/// Byte size of streamed pieces; small and odd so multi-byte characters
/// regularly straddle two pieces
const STREAM_PIECE_BYTES: usize = 7;

#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    fn respond(&self, messages: &[ChatMessage], options: &GenerationOptions) -> (String, TokenUsage) {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let text = match &options.analysis {
            Some(context) => canned_analysis(context),
            None => generic_analysis(prompt),
        };
        let full_prompt: String = messages.iter().map(|m| m.content.as_str()).collect();
        let usage = TokenUsage::estimate(&full_prompt, &text);
        (text, usage)
    }

    pub async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult> {
        let (text, usage) = self.respond(messages, options);
        Ok(GenerationResult::new(text, usage, ProviderKind::Mock))
    }

    pub async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream> {
        let (text, usage) = self.respond(messages, options);
        let mut pieces: Vec<GatewayResult<StreamPiece>> = text
            .as_bytes()
            .chunks(STREAM_PIECE_BYTES)
            .map(|chunk| Ok(StreamPiece::Data(chunk.to_vec())))
            .collect();
        pieces.push(Ok(StreamPiece::Usage(usage)));
        Ok(Box::pin(futures::stream::iter(pieces)))
    }

    /// Fills the schema's shape with the canned analysis
    pub async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent> {
        let (text, usage) = self.respond(messages, options);
        let filler = Filler::from_text(&text);
        let value = filler.fill(None, schema);
        Ok(StructuredContent {
            raw_text: value.to_string(),
            value,
            usage,
        })
    }
}

/// Builds a schema-shaped value out of a canned analysis
struct Filler {
    summary: String,
    suggestions: Vec<String>,
}

impl Filler {
    fn from_text(text: &str) -> Self {
        let (summary, rest) = text.split_once("Suggestions:").unwrap_or((text, ""));
        let suggestions = rest
            .lines()
            .filter_map(|line| line.trim().split_once(". "))
            .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .map(|(_, s)| s.to_string())
            .collect();
        Self {
            summary: summary.trim().to_string(),
            suggestions,
        }
    }

    fn fill(&self, name: Option<&str>, schema: &Value) -> Value {
        if let Some(value) = schema.get("const") {
            return value.clone();
        }
        if let Some(first) = schema.get("enum").and_then(|e| e.as_array()?.first()) {
            return first.clone();
        }

        let schema_type = match &schema["type"] {
            Value::String(t) => t.as_str(),
            // first non-null member of a type union
            Value::Array(types) => types
                .iter()
                .filter_map(|t| t.as_str())
                .find(|t| *t != "null")
                .unwrap_or("null"),
            _ if schema.get("properties").is_some() => "object",
            _ => "string",
        };

        match schema_type {
            "object" => {
                let mut map = Map::new();
                if let Some(properties) = schema["properties"].as_object() {
                    for (key, property) in properties {
                        map.insert(key.clone(), self.fill(Some(key), property));
                    }
                }
                Value::Object(map)
            }
            "array" => self.fill_array(name, schema),
            "string" => json!(self.string_for(name)),
            "integer" => json!(schema["minimum"].as_i64().unwrap_or(0)),
            "number" => json!(schema["minimum"].as_f64().unwrap_or(0.0)),
            "boolean" => json!(false),
            _ => Value::Null,
        }
    }

    fn fill_array(&self, name: Option<&str>, schema: &Value) -> Value {
        let items = &schema["items"];
        let min_items = schema["minItems"].as_u64().unwrap_or(0) as usize;
        let max_items = schema["maxItems"].as_u64().map(|m| m as usize);
        let string_items = items["type"] == "string" || items.is_null();

        let mut values: Vec<Value> = if string_items && is_suggestion_field(name) {
            self.suggestions.iter().map(|s| json!(s)).collect()
        } else {
            Vec::new()
        };
        while values.len() < min_items {
            values.push(self.fill(None, items));
        }
        if let Some(max) = max_items {
            values.truncate(max.max(min_items));
        }
        Value::Array(values)
    }

    fn string_for(&self, name: Option<&str>) -> String {
        match name {
            Some(n) if is_suggestion_field(Some(n)) => self.suggestions.join("\n"),
            Some(n) => {
                let n = n.to_lowercase();
                if ["summary", "analysis", "text", "content", "insight", "overview"]
                    .iter()
                    .any(|k| n.contains(k))
                {
                    self.summary.clone()
                } else {
                    String::new()
                }
            }
            None => self.summary.clone(),
        }
    }
}

fn is_suggestion_field(name: Option<&str>) -> bool {
    name.is_some_and(|n| {
        let n = n.to_lowercase();
        n.contains("suggestion") || n.contains("recommendation")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisContext, AnalysisKind};
    use crate::providers::stream::collect_stream;
    use futures::StreamExt;

    fn options_with_context() -> GenerationOptions {
        GenerationOptions {
            analysis: Some(AnalysisContext::new(AnalysisKind::InitialSummary, vec![])),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initial_summary_without_activities() {
        let result = MockProvider::new()
            .generate_content(&[ChatMessage::user("summarize")], &options_with_context())
            .await
            .unwrap();
        assert!(result.text.contains("No activities recorded yet"));
        assert_eq!(result.provider_used, ProviderKind::Mock);
        assert!(result.usage.completion_tokens > 0);
    }

    #[tokio::test]
    async fn test_stream_reassembles_to_sync_text() {
        let messages = [ChatMessage::user("Résumé of the week — données")];
        let provider = MockProvider::new();
        let sync = provider
            .generate_content(&messages, &GenerationOptions::default())
            .await
            .unwrap();
        let stream = provider
            .generate_content_stream(&messages, &GenerationOptions::default())
            .await
            .unwrap();
        let (text, usage) = collect_stream(stream).await.unwrap();
        assert_eq!(text, sync.text);
        assert_eq!(usage, sync.usage);
    }

    #[tokio::test]
    async fn test_stream_pieces_are_small() {
        let stream = MockProvider::new()
            .generate_content_stream(&[ChatMessage::user("hi")], &GenerationOptions::default())
            .await
            .unwrap();
        let pieces: Vec<_> = stream.collect().await;
        assert!(pieces.len() > 2);
        for piece in &pieces[..pieces.len() - 1] {
            match piece {
                Ok(StreamPiece::Data(bytes)) => assert!(bytes.len() <= STREAM_PIECE_BYTES),
                other => panic!("unexpected piece: {other:?}"),
            }
        }
        assert!(matches!(pieces.last(), Some(Ok(StreamPiece::Usage(_)))));
    }

    #[tokio::test]
    async fn test_structured_output_matches_schema() {
        let schema = json!({
            "type": "object",
            "required": ["summary", "suggestions", "score", "focus"],
            "properties": {
                "summary": {"type": "string"},
                "suggestions": {"type": "array", "items": {"type": "string"}, "minItems": 3},
                "score": {"type": "integer", "minimum": 1, "maximum": 10},
                "focus": {"type": "string", "enum": ["deep", "shallow"]}
            }
        });
        let content = MockProvider::new()
            .generate_structured_content(&[ChatMessage::user("go")], &schema, &options_with_context())
            .await
            .unwrap();

        crate::providers::structured::validate(&content.value, &schema).unwrap();
        assert!(content.value["summary"]
            .as_str()
            .unwrap()
            .contains("No activities recorded yet"));
        assert_eq!(content.value["suggestions"].as_array().unwrap().len(), 3);
        assert_eq!(content.value["score"], 1);
        assert_eq!(content.value["focus"], "deep");
    }
}
