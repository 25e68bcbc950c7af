//! Upstream failures mapped onto the gateway error taxonomy
//!
//! Bodies are scrubbed of credentials before they reach an error message.

use crate::error::GatewayError;
use crate::timeout::OperationClass;
use crate::types::ProviderKind;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Provider bodies can echo whole prompts; keep error messages short
const BODY_LIMIT: usize = 1_024;
const MASK: &str = "[REDACTED]";

/// JSON fields whose values are dropped wholesale
const SECRET_FIELDS: [&str; 7] = [
    "api_key",
    "apikey",
    "token",
    "secret",
    "password",
    "authorization",
    "cookie",
];

/// Inline secret shapes, applied in order
static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bbearer\s+[\w.+/=-]{8,}").expect("bearer pattern"),
            "Bearer [REDACTED]",
        ),
        (
            Regex::new(r#"(?i)\b(x-api-key|x-goog-api-key|api[_-]?key|key|token|secret|password)\b\s*[:=]\s*["']?[^"',\s}&]+"#)
                .expect("key=value pattern"),
            "$1=[REDACTED]",
        ),
        (
            Regex::new(r"\b(sk-[\w-]{8,}|AIza[\w-]{20,})").expect("vendor key pattern"),
            MASK,
        ),
    ]
});

/// Strip credentials from an upstream error body and clip it to [`BODY_LIMIT`]
pub fn scrub_body(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "<empty body>".to_string();
    }
    let scrubbed = match serde_json::from_str::<Value>(raw) {
        Ok(mut json) => {
            scrub_json(&mut json);
            json.to_string()
        }
        Err(_) => scrub_text(raw),
    };
    clip(scrubbed)
}

fn scrub_json(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (name, field) in fields.iter_mut() {
                let name = name.to_ascii_lowercase().replace('-', "_");
                if SECRET_FIELDS.iter().any(|secret| name.contains(secret)) {
                    *field = Value::String(MASK.to_string());
                } else {
                    scrub_json(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub_json),
        Value::String(text) => *text = scrub_text(text),
        _ => {}
    }
}

fn scrub_text(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

fn clip(text: String) -> String {
    match text.char_indices().nth(BODY_LIMIT) {
        Some((cut, _)) => {
            let dropped = text[cut..].chars().count();
            format!("{}... [{} more chars]", &text[..cut], dropped)
        }
        None => text,
    }
}

/// Map a status code and sanitized body onto the error taxonomy
pub fn error_for_status(
    provider: ProviderKind,
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
    started: Instant,
) -> GatewayError {
    let message = format!(
        "{} API error (status {}): {}",
        provider,
        status.as_u16(),
        scrub_body(body)
    );
    match status.as_u16() {
        401 | 403 => GatewayError::auth(provider, message),
        429 => GatewayError::rate_limited_with_retry(provider, message, retry_after),
        408 | 504 => {
            GatewayError::timeout(OperationClass::Generation, started.elapsed()).for_provider(provider)
        }
        code => GatewayError::upstream_with_status(provider, message, code),
    }
}

/// Build an error from a non-success HTTP response
pub async fn from_response(
    response: reqwest::Response,
    provider: ProviderKind,
    started: Instant,
) -> GatewayError {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    error_for_status(provider, status, &body, retry_after, started)
}

/// Map a transport failure (connect, read, timeout)
pub fn from_transport(
    error: reqwest::Error,
    provider: ProviderKind,
    started: Instant,
) -> GatewayError {
    if error.is_timeout() {
        return GatewayError::timeout(OperationClass::Generation, started.elapsed())
            .for_provider(provider);
    }
    // reqwest messages include the URL; never echo it raw
    let error = error.without_url();
    GatewayError::upstream(
        provider,
        format!(
            "{} request failed: {}",
            provider,
            scrub_text(&error.to_string())
        ),
    )
}

/// Build an error from a body that could not be decoded
pub fn malformed_body(error: impl std::fmt::Display, provider: ProviderKind) -> GatewayError {
    GatewayError::upstream(
        provider,
        format!("Failed to parse {} response: {}", provider, error),
    )
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
