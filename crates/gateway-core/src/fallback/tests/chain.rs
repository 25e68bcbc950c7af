//! Candidate walking and fallback tagging

use super::{
    Script, ScriptedOp, SlowStore, orchestrator, orchestrator_with, production_config,
};
use crate::error::{FailureKind, GatewayError};
use crate::fallback::FallbackReason;
use crate::types::ProviderKind;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_first_candidate_serves() {
    let orchestrator = orchestrator(production_config());
    let op = ScriptedOp::new();

    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.value, ProviderKind::Claude);
    assert_eq!(attempted.provider, ProviderKind::Claude);
    assert!(!attempted.used_fallback);
    assert_eq!(attempted.fallback_reason, None);
    assert_eq!(attempted.attempts, 1);
    assert!(orchestrator.history().is_empty());
    assert_eq!(orchestrator.health_status(ProviderKind::Claude).successful_requests, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_moves_to_next_provider() {
    let orchestrator = orchestrator(production_config());
    let op = ScriptedOp::new().failing(ProviderKind::Claude, Script::Hang);

    let attempted = orchestrator
        .run(Some(ProviderKind::Claude), &op)
        .await
        .unwrap();
    assert_eq!(attempted.provider, ProviderKind::Gemini);
    assert_eq!(attempted.requested_provider, Some(ProviderKind::Claude));
    assert!(attempted.used_fallback);
    assert_eq!(attempted.fallback_reason, Some(FallbackReason::Timeout));

    let history = orchestrator.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from, ProviderKind::Claude);
    assert_eq!(history[0].to, Some(ProviderKind::Gemini));

    let claude = orchestrator.health_status(ProviderKind::Claude);
    assert!(!claude.available);
    assert_eq!(claude.last_failure_kind, Some(FailureKind::Timeout));
}

#[tokio::test]
async fn test_cooling_provider_is_tried_last() {
    let orchestrator = orchestrator(production_config());
    let failing = ScriptedOp::new().failing(ProviderKind::Claude, Script::Upstream);
    orchestrator.run(None, &failing).await.unwrap();

    let op = ScriptedOp::new();
    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Gemini);
    assert!(!attempted.used_fallback);
    assert_eq!(op.calls(), vec![ProviderKind::Gemini]);
}

#[tokio::test]
async fn test_schema_failure_does_not_cool_provider() {
    let orchestrator = orchestrator(production_config());
    let failing = ScriptedOp::new().failing(ProviderKind::Claude, Script::Schema);
    let attempted = orchestrator.run(None, &failing).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Gemini);
    assert!(attempted.used_fallback);

    let status = orchestrator.health_status(ProviderKind::Claude);
    assert!(status.available);
    assert_eq!(status.consecutive_failures, 0);

    let op = ScriptedOp::new();
    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Claude);
    assert_eq!(op.calls(), vec![ProviderKind::Claude]);
}

#[tokio::test]
async fn test_missing_configuration_falls_back() {
    let orchestrator = orchestrator(production_config());
    let op = ScriptedOp::new();

    let attempted = orchestrator
        .run(Some(ProviderKind::DeepSeek), &op)
        .await
        .unwrap();
    assert_eq!(attempted.provider, ProviderKind::Claude);
    assert!(attempted.used_fallback);
    assert_eq!(
        attempted.fallback_reason,
        Some(FallbackReason::MissingCredential(
            "no active configuration".to_string()
        ))
    );
    assert_eq!(op.calls(), vec![ProviderKind::Claude]);
}

#[tokio::test]
async fn test_every_remote_failing_ends_on_mock() {
    let orchestrator = orchestrator(production_config());
    let op = ScriptedOp::new()
        .failing(ProviderKind::Claude, Script::Upstream)
        .failing(ProviderKind::Gemini, Script::Upstream);

    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Mock);
    assert!(attempted.used_fallback);
    assert_eq!(attempted.attempts, 5);
    assert_eq!(
        op.calls(),
        vec![ProviderKind::Claude, ProviderKind::Gemini, ProviderKind::Mock]
    );

    let history = orchestrator.history();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history[0].reason,
        FallbackReason::Error("UPSTREAM_ERROR".to_string())
    );
    assert_eq!(history[3].to, Some(ProviderKind::Mock));
}

#[tokio::test]
async fn test_skipping_unconfigured_providers_is_not_fallback() {
    let orchestrator = orchestrator(
        production_config().with_fallback_order(vec![ProviderKind::Kimi, ProviderKind::Gemini]),
    );
    let op = ScriptedOp::new();

    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Gemini);
    assert!(!attempted.used_fallback);
    assert_eq!(attempted.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_lands_on_mock_in_bounded_time() {
    let config = production_config();
    let lookup = config.timeouts.credential_lookup;
    let orchestrator = orchestrator_with(
        Arc::new(SlowStore(Duration::from_secs(600))),
        None,
        config,
    );
    let op = ScriptedOp::new();

    let started = tokio::time::Instant::now();
    let attempted = orchestrator.run(None, &op).await.unwrap();
    assert_eq!(attempted.provider, ProviderKind::Mock);
    assert!(attempted.used_fallback);
    assert!(started.elapsed() <= lookup * 4 + Duration::from_millis(100));
    match attempted.fallback_reason {
        Some(FallbackReason::MissingCredential(reason)) => {
            assert!(reason.contains("timed out"), "{}", reason)
        }
        other => panic!("unexpected reason: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_request_is_not_retried() {
    let orchestrator = orchestrator(production_config());
    let op = ScriptedOp::new().failing(ProviderKind::Claude, Script::Invalid);

    let err = orchestrator.run(None, &op).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest { .. }));
    assert_eq!(op.calls(), vec![ProviderKind::Claude]);
    assert!(orchestrator.history().is_empty());
}

#[tokio::test]
async fn test_history_is_bounded() {
    let mut config = production_config();
    config.max_fallback_history = 2;
    let orchestrator = orchestrator(config);
    let op = ScriptedOp::new()
        .failing(ProviderKind::Claude, Script::Upstream)
        .failing(ProviderKind::Gemini, Script::Upstream);

    orchestrator.run(None, &op).await.unwrap();
    let history = orchestrator.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].to, Some(ProviderKind::Mock));

    orchestrator.reset_health();
    assert!(orchestrator.history().is_empty());
    assert!(orchestrator.health_status(ProviderKind::Claude).available);
}
