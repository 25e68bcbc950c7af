//! Orchestrator tests

mod chain;

use super::operation::Operation;
use super::orchestrator::FallbackOrchestrator;
use crate::config::{GatewayConfig, RuntimeEnvironment};
use crate::credential::{
    ConfigurationResolver, CredentialKey, CredentialStore, InMemoryCredentialStore,
    ProviderConfiguration, encrypt_credential,
};
use crate::error::{GatewayError, GatewayResult};
use crate::ledger::UsageLedger;
use crate::providers::{ProviderAdapter, ProviderInstance, build_http_client};
use crate::types::{GenerationMode, ProviderKind, TokenUsage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(super) enum Script {
    Upstream,
    Hang,
    Invalid,
    Schema,
}

/// Operation that answers with the provider it ran on, failing on cue
#[derive(Default)]
pub(super) struct ScriptedOp {
    scripts: HashMap<ProviderKind, Script>,
    usage: Option<TokenUsage>,
    calls: Mutex<Vec<ProviderKind>>,
}

impl ScriptedOp {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn failing(mut self, provider: ProviderKind, script: Script) -> Self {
        self.scripts.insert(provider, script);
        self
    }

    pub(super) fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub(super) fn calls(&self) -> Vec<ProviderKind> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Operation for ScriptedOp {
    type Output = ProviderKind;

    fn mode(&self) -> GenerationMode {
        GenerationMode::Sync
    }

    async fn call(&self, adapter: &ProviderInstance) -> GatewayResult<ProviderKind> {
        let provider = adapter.kind();
        self.calls.lock().push(provider);
        match self.scripts.get(&provider) {
            None => Ok(provider),
            Some(Script::Upstream) => Err(GatewayError::upstream_with_status(
                provider,
                "internal server error",
                500,
            )),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Invalid) => Err(GatewayError::invalid_request("prompt is empty", "prompt")),
            Some(Script::Schema) => Err(GatewayError::schema(
                "missing required field",
                vec!["\"summary\" is a required property".to_string()],
            )),
        }
    }

    fn usage(&self, _output: &ProviderKind) -> Option<TokenUsage> {
        self.usage
    }
}

/// Store that never answers in time
pub(super) struct SlowStore(pub Duration);

#[async_trait]
impl CredentialStore for SlowStore {
    async fn configurations(
        &self,
        _provider: ProviderKind,
    ) -> GatewayResult<Vec<ProviderConfiguration>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

pub(super) fn production_config() -> GatewayConfig {
    GatewayConfig::for_environment(RuntimeEnvironment::Production)
}

/// Store holding sealed credentials for Claude and Gemini only
pub(super) fn claude_and_gemini(key: &CredentialKey) -> InMemoryCredentialStore {
    let seal = |value: &str| encrypt_credential(key, value).unwrap();
    InMemoryCredentialStore::new(vec![
        ProviderConfiguration::new("cfg-claude-0001", ProviderKind::Claude, seal("sk-ant-test"))
            .as_default(),
        ProviderConfiguration::new("cfg-gemini-0001", ProviderKind::Gemini, seal("gm-test")),
    ])
    .unwrap()
}

pub(super) fn orchestrator_with(
    store: Arc<dyn CredentialStore>,
    key: Option<CredentialKey>,
    config: GatewayConfig,
) -> FallbackOrchestrator {
    let resolver = ConfigurationResolver::new(store, key, config.timeouts.credential_lookup);
    let ledger = Arc::new(UsageLedger::new(config.rate_limits(), config.pricing()));
    let http_client = build_http_client(Duration::from_secs(5)).unwrap();
    FallbackOrchestrator::new(resolver, Arc::new(config), http_client, ledger)
}

pub(super) fn orchestrator(config: GatewayConfig) -> FallbackOrchestrator {
    let key = CredentialKey::generate();
    let store = Arc::new(claude_and_gemini(&key));
    orchestrator_with(store, Some(key), config)
}
