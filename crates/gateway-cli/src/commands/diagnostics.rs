//! `diagnostics` command

use super::build_gateway;
use anyhow::Context;
use gateway_core::{GatewayConfig, GenerationRequest};
use std::path::Path;
use tracing::info;

pub async fn execute(
    config: GatewayConfig,
    store: Option<&Path>,
    warm_up: u32,
    warm_up_prompt: &str,
) -> anyhow::Result<()> {
    let gateway = build_gateway(config, store)?;

    for round in 1..=warm_up {
        let result = gateway
            .generate(GenerationRequest::prompt(warm_up_prompt))
            .await
            .context("Warm-up request rejected")?
            .into_result();
        if let Some(result) = result {
            info!(
                round,
                provider = %result.provider_used,
                used_fallback = result.used_fallback,
                "warm-up request served"
            );
        }
    }

    let diagnostics = gateway.diagnostics().await;
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    Ok(())
}
