//! Structured output helpers
//!
//! Adapters without native schema enforcement ask for JSON in the prompt, then
//! pull the outermost JSON value out of the reply and validate it.

use crate::error::{GatewayError, GatewayResult};
use crate::types::{ChatMessage, MessageRole};
use serde_json::Value;

/// Maximum number of schema violations carried in an error
const MAX_REPORTED_ERRORS: usize = 10;

/// System instruction asking for schema-conforming JSON
pub fn schema_instruction(schema: &Value) -> String {
    format!(
        "Respond with a single JSON value that conforms to this JSON Schema. \
         Do not wrap it in markdown and do not add commentary.\n{}",
        schema
    )
}

/// Messages with the schema instruction merged into the system message
pub fn with_schema_instruction(messages: &[ChatMessage], schema: &Value) -> Vec<ChatMessage> {
    let instruction = schema_instruction(schema);
    let mut messages = messages.to_vec();
    match messages.first_mut() {
        Some(first) if first.role == MessageRole::System => {
            first.content = format!("{}\n\n{}", first.content, instruction);
        }
        _ => messages.insert(0, ChatMessage::system(instruction)),
    }
    messages
}

/// Extract the outermost JSON object or array from free text
///
/// Accepts bare JSON, JSON inside a markdown code fence, or JSON surrounded by
/// prose.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = strip_code_fence(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find(['{', '['])?;
    let open = trimmed[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Validate a value against a JSON Schema
pub fn validate(value: &Value, schema: &Value) -> GatewayResult<()> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        GatewayError::schema(format!("invalid schema: {}", e), vec![e.to_string()])
    })?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .take(MAX_REPORTED_ERRORS)
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::schema(
            "output does not match the requested schema",
            errors,
        ))
    }
}

/// Parse free text and validate it, the whole structured-output path
pub fn coerce(text: &str, schema: &Value) -> GatewayResult<Value> {
    let value = extract_json(text).ok_or_else(|| {
        GatewayError::schema(
            "output contains no JSON value",
            vec![text.chars().take(200).collect()],
        )
    })?;
    validate(&value, schema)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["summary", "score"],
            "properties": {
                "summary": {"type": "string"},
                "score": {"type": "integer", "minimum": 0}
            }
        })
    }

    #[test]
    fn test_extract_bare_and_fenced() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
        assert_eq!(
            extract_json("```json\n{\"a\": [1, 2]}\n```"),
            Some(json!({"a": [1, 2]}))
        );
        assert_eq!(extract_json("```\n[1]\n```"), Some(json!([1])));
    }

    #[test]
    fn test_extract_from_prose() {
        let text = "Here is the result: {\"summary\": \"ok\", \"score\": 3}. Hope it helps!";
        assert_eq!(
            extract_json(text),
            Some(json!({"summary": "ok", "score": 3}))
        );
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_coerce_validates() {
        let value = coerce(r#"{"summary": "busy week", "score": 4}"#, &schema()).unwrap();
        assert_eq!(value["score"], 4);

        let err = coerce(r#"{"summary": "busy week", "score": -1}"#, &schema()).unwrap_err();
        match err {
            GatewayError::SchemaValidation { errors, .. } => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coerce_without_json_is_schema_error() {
        let err = coerce("I cannot do that", &schema()).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaValidation { .. }));
    }

    #[test]
    fn test_schema_instruction_merges_into_system() {
        let messages = vec![ChatMessage::system("Be brief"), ChatMessage::user("hi")];
        let merged = with_schema_instruction(&messages, &schema());
        assert_eq!(merged.len(), 2);
        assert!(merged[0].content.starts_with("Be brief"));
        assert!(merged[0].content.contains("JSON Schema"));

        let merged = with_schema_instruction(&[ChatMessage::user("hi")], &schema());
        assert_eq!(merged[0].role, MessageRole::System);
    }
}
