use super::*;
use crate::analysis::{AnalysisContext, AnalysisKind};
use crate::config::RuntimeEnvironment;
use crate::credential::{
    CredentialKey, CredentialStore, InMemoryCredentialStore, ProviderConfiguration,
    encrypt_credential,
};
use crate::rate_limiter::RateLimitConfig;
use crate::streaming::StreamFrame;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;

fn production() -> GatewayConfig {
    GatewayConfig::for_environment(RuntimeEnvironment::Production)
}

fn mock_only() -> Gateway {
    Gateway::builder(production()).build().unwrap()
}

fn initial_summary() -> GenerationRequest {
    GenerationRequest::prompt("Summarize my workload")
        .with_analysis(AnalysisContext::new(AnalysisKind::InitialSummary, Vec::new()))
}

struct SlowStore;

#[async_trait]
impl CredentialStore for SlowStore {
    async fn configurations(
        &self,
        _provider: ProviderKind,
    ) -> GatewayResult<Vec<ProviderConfiguration>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_empty_store_is_served_by_mock() {
    let gateway = mock_only();
    let result = gateway
        .generate(initial_summary())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(result.provider_used, ProviderKind::Mock);
    assert!(result.used_fallback);
    assert_eq!(result.fallback_provider, Some(ProviderKind::Mock));
    assert!(!result.timeout);
    assert!(result.text.contains("No activities recorded yet"));
    let suggestions = result
        .text
        .lines()
        .skip_while(|l| !l.starts_with("Suggestions:"))
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .count();
    assert_eq!(suggestions, 3);
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let gateway = mock_only();
    let err = gateway
        .generate(GenerationRequest::prompt("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest { .. }));

    let err = gateway
        .generate(GenerationRequest::prompt("hi").with_mode(GenerationMode::Structured))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_stream_matches_sync_text() {
    let gateway = mock_only();
    let sync = gateway
        .generate(initial_summary())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let stream = gateway
        .generate(initial_summary().with_mode(GenerationMode::Stream))
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    let frames: Vec<StreamFrame> = stream.collect().await;

    assert!(matches!(frames.first(), Some(StreamFrame::Fallback(_))));
    match frames.last() {
        Some(StreamFrame::Complete(complete)) => {
            assert_eq!(complete.full_content, sync.text);
            assert!(complete.used_fallback);
            assert!(!complete.truncated);
        }
        other => panic!("unexpected terminal frame: {:?}", other),
    }
    assert_eq!(frames.iter().filter(|f| f.is_terminal()).count(), 1);

    let analysis = gateway.ledger().cost_analysis(ProviderKind::Mock);
    assert_eq!(analysis.request_count, 2);
}

#[tokio::test]
async fn test_structured_output_is_attached() {
    let gateway = mock_only();
    let schema = json!({
        "type": "object",
        "required": ["summary", "suggestions"],
        "properties": {
            "summary": {"type": "string"},
            "suggestions": {"type": "array", "items": {"type": "string"}}
        }
    });
    let result = gateway
        .generate(initial_summary().with_schema(schema))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let structured = result.structured.unwrap();
    assert_eq!(structured["suggestions"].as_array().unwrap().len(), 3);
    assert_eq!(result.provider_used, ProviderKind::Mock);
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_degrades() {
    let mut config = production();
    config.timeouts.request = Duration::from_secs(3);
    config.timeouts.generation = Duration::from_secs(3);
    config.timeouts.credential_lookup = Duration::from_secs(2);
    let gateway = Gateway::builder(config)
        .store(Arc::new(SlowStore))
        .build()
        .unwrap();

    let started = tokio::time::Instant::now();
    let result = gateway
        .generate(initial_summary().with_provider(ProviderKind::Gemini))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(result.timeout);
    assert!(result.used_fallback);
    assert_eq!(result.provider_used, ProviderKind::Mock);
    assert_eq!(result.requested_provider, Some(ProviderKind::Gemini));
    assert!(result.text.contains("No activities recorded yet"));
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_degrades_stream() {
    let mut config = production();
    config.timeouts.request = Duration::from_secs(3);
    config.timeouts.generation = Duration::from_secs(3);
    config.timeouts.credential_lookup = Duration::from_secs(2);
    let gateway = Gateway::builder(config)
        .store(Arc::new(SlowStore))
        .build()
        .unwrap();

    let frames: Vec<StreamFrame> = gateway
        .generate(initial_summary().with_mode(GenerationMode::Stream))
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .collect()
        .await;

    match frames.first() {
        Some(StreamFrame::Fallback(frame)) => assert_eq!(frame.reason, "timeout"),
        other => panic!("unexpected opening frame: {:?}", other),
    }
    assert!(matches!(frames.last(), Some(StreamFrame::Complete(_))));
}

fn mock_capped_at_one_request() -> Gateway {
    let mut config = production();
    config.enforce_rate_limits = true;
    if let Some(mock) = config.providers.get_mut(&ProviderKind::Mock) {
        mock.rate_limits = RateLimitConfig {
            requests_per_minute: Some(1),
            ..RateLimitConfig::unlimited()
        };
    }
    Gateway::builder(config).build().unwrap()
}

#[tokio::test]
async fn test_exhausted_chain_degrades_without_timeout() {
    let gateway = mock_capped_at_one_request();
    let served = gateway
        .generate(initial_summary())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert!(!served.timeout);

    let degraded = gateway
        .generate(initial_summary())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert!(!degraded.timeout);
    assert!(degraded.used_fallback);
    assert_eq!(degraded.provider_used, ProviderKind::Mock);
    assert!(degraded.text.contains("No activities recorded yet"));
}

#[tokio::test]
async fn test_exhausted_chain_stream_names_cause() {
    let gateway = mock_capped_at_one_request();
    gateway.generate(initial_summary()).await.unwrap();

    let frames: Vec<StreamFrame> = gateway
        .generate(initial_summary().with_mode(GenerationMode::Stream))
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .collect()
        .await;

    match frames.first() {
        Some(StreamFrame::Fallback(frame)) => {
            assert_eq!(frame.reason, "error: CONFIGURATION_ERROR")
        }
        other => panic!("unexpected opening frame: {:?}", other),
    }
    assert!(matches!(frames.last(), Some(StreamFrame::Complete(_))));
}

#[tokio::test]
async fn test_diagnostics_list_configured_providers() {
    let key = CredentialKey::generate();
    let sealed = encrypt_credential(&key, "sk-ant-diagnostics").unwrap();
    let store = InMemoryCredentialStore::new(vec![
        ProviderConfiguration::new("cfg-claude-primary", ProviderKind::Claude, sealed)
            .as_default(),
    ])
    .unwrap();
    let gateway = Gateway::builder(production().with_credential_key(key))
        .store(Arc::new(store))
        .build()
        .unwrap();

    let diagnostics = gateway.diagnostics().await;
    let listed: Vec<ProviderKind> = diagnostics.providers.iter().map(|p| p.provider).collect();
    assert_eq!(listed, vec![ProviderKind::Claude, ProviderKind::Mock]);

    let claude = diagnostics.provider(ProviderKind::Claude).unwrap();
    let configuration = claude.configuration.as_deref().unwrap();
    assert_ne!(configuration, "cfg-claude-primary");
    assert!(configuration.starts_with("cfg..."));
    assert!(claude.cache_statistics.is_some());
    assert!(claude.health_status.available);

    let json = serde_json::to_string(&diagnostics).unwrap();
    assert!(!json.contains("sk-ant-diagnostics"));
    assert!(json.contains("usageStatistics"));
    assert!(json.contains("rateLimiting"));
}

#[tokio::test]
async fn test_ledger_is_shared_between_gateways() {
    let ledger = Arc::new(UsageLedger::with_defaults());
    let first = Gateway::builder(production())
        .ledger(Arc::clone(&ledger))
        .build()
        .unwrap();
    let second = Gateway::builder(production())
        .ledger(Arc::clone(&ledger))
        .build()
        .unwrap();

    first.generate(initial_summary()).await.unwrap();
    second.generate(initial_summary()).await.unwrap();
    assert_eq!(ledger.cost_analysis(ProviderKind::Mock).request_count, 2);

    ledger.reset();
    assert_eq!(first.ledger().cost_analysis(ProviderKind::Mock).request_count, 0);
}
