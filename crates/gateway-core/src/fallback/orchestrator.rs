//! Fallback orchestrator
//!
//! Walks the candidate list for one request: resolve the credential, build
//! the adapter, pass the usage ceilings, then race the call against the
//! generation deadline. Any failure on the way moves on to the next
//! candidate; Mock closes the list and cannot fail.

use super::operation::Operation;
use super::policy::FallbackPolicy;
use super::state::HealthRegistry;
use super::types::{Attempted, FallbackEvent, FallbackReason, ProviderHealthStatus};
use crate::config::GatewayConfig;
use crate::credential::{ConfigurationResolver, CredentialLookup};
use crate::error::{GatewayError, GatewayResult};
use crate::ledger::UsageLedger;
use crate::providers::ProviderInstance;
use crate::timeout::{OperationClass, race};
use crate::types::ProviderKind;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub struct FallbackOrchestrator {
    resolver: ConfigurationResolver,
    config: Arc<GatewayConfig>,
    http_client: Client,
    ledger: Arc<UsageLedger>,
    health: HealthRegistry,
    policy: FallbackPolicy,
    history: Mutex<VecDeque<FallbackEvent>>,
    max_history: usize,
    generation_timeout: Duration,
}

impl FallbackOrchestrator {
    pub fn new(
        resolver: ConfigurationResolver,
        config: Arc<GatewayConfig>,
        http_client: Client,
        ledger: Arc<UsageLedger>,
    ) -> Self {
        Self {
            health: HealthRegistry::new(config.failure_cooldown),
            policy: FallbackPolicy::new(config.fallback_order.clone()),
            max_history: config.max_fallback_history,
            generation_timeout: config.timeouts.generation,
            history: Mutex::new(VecDeque::new()),
            resolver,
            config,
            http_client,
            ledger,
        }
    }

    /// Run `operation` against the first provider able to serve it
    ///
    /// Only non-retryable errors escape early. When every candidate fails
    /// the result is a configuration error, which cannot happen while Mock
    /// is on the list.
    #[instrument(skip(self, operation), fields(mode = %operation.mode()), level = "debug")]
    pub async fn run<O: Operation>(
        &self,
        requested: Option<ProviderKind>,
        operation: &O,
    ) -> GatewayResult<Attempted<O::Output>> {
        let candidates = self.policy.candidates(requested, &self.health);
        let mut pending: Option<(ProviderKind, FallbackReason)> = None;
        let mut last_reason: Option<FallbackReason> = None;
        let mut call_failed = false;

        for (index, provider) in candidates.iter().copied().enumerate() {
            let attempt = index + 1;
            if let Some((from, reason)) = pending.take() {
                warn!(
                    from = %from,
                    provider = %provider,
                    attempt,
                    reason = %reason,
                    "falling back to next provider"
                );
                self.push_event(from, Some(provider), reason.clone());
                last_reason = Some(reason);
            }

            let adapter = match self.construct(provider).await {
                Ok(adapter) => adapter,
                Err(reason) => {
                    pending = Some((provider, reason));
                    continue;
                }
            };

            if let Err(e) = self
                .ledger
                .admit(provider, self.config.enforce_rate_limits)
            {
                pending = Some((provider, FallbackReason::from_error(&e)));
                call_failed = true;
                continue;
            }

            let started = Instant::now();
            match race(
                OperationClass::Generation,
                self.generation_timeout,
                operation.call(&adapter),
            )
            .await
            {
                Ok(value) => {
                    self.health.record_success(provider);
                    if let Some(usage) = operation.usage(&value) {
                        self.ledger.record_completion(provider, &usage);
                    }

                    let used_fallback = match requested {
                        Some(requested) => provider != requested,
                        None => call_failed || provider == ProviderKind::Mock,
                    };
                    if used_fallback {
                        info!(
                            provider = %provider,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "request served by fallback provider"
                        );
                    } else {
                        debug!(provider = %provider, attempt, "request served");
                    }

                    return Ok(Attempted {
                        value,
                        provider,
                        requested_provider: requested,
                        used_fallback,
                        fallback_reason: if used_fallback { last_reason } else { None },
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let e = e.for_provider(provider);
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    // schema mismatches leave health untouched
                    if !matches!(e, GatewayError::SchemaValidation { .. }) {
                        self.health.record_failure(provider, e.failure_kind());
                    }
                    warn!(
                        provider = %provider,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "provider call failed"
                    );
                    pending = Some((provider, FallbackReason::from_error(&e)));
                    call_failed = true;
                }
            }
        }

        if let Some((from, reason)) = pending {
            self.push_event(from, None, reason);
        }
        Err(GatewayError::config("no provider could serve the request"))
    }

    async fn construct(&self, provider: ProviderKind) -> Result<ProviderInstance, FallbackReason> {
        let credential = if provider.requires_credential() {
            match self.resolver.resolve(provider).await {
                CredentialLookup::Resolved(credential) => Some(credential),
                CredentialLookup::Missing(reason) => {
                    return Err(FallbackReason::from_missing(&reason));
                }
            }
        } else {
            None
        };

        ProviderInstance::create(
            provider,
            credential.as_ref(),
            &self.config.provider(provider),
            self.http_client.clone(),
        )
        .map_err(|e| {
            warn!(provider = %provider, error = %e, "adapter construction failed");
            FallbackReason::from_error(&e)
        })
    }

    fn push_event(&self, from: ProviderKind, to: Option<ProviderKind>, reason: FallbackReason) {
        let mut history = self.history.lock();
        history.push_back(FallbackEvent {
            from,
            to,
            reason,
            timestamp: Utc::now(),
        });
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    pub fn health_status(&self, provider: ProviderKind) -> ProviderHealthStatus {
        self.health.status(provider)
    }

    /// Recent hops, oldest first
    pub fn history(&self) -> Vec<FallbackEvent> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    pub fn reset_health(&self) {
        self.health.reset();
        self.history.lock().clear();
    }
}
