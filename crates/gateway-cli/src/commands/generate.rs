//! `generate` command

use super::build_gateway;
use crate::args::GenerateArgs;
use anyhow::Context;
use futures::StreamExt;
use gateway_core::{
    Activity, AnalysisContext, GatewayConfig, GatewayResponse, GenerationMode, GenerationRequest,
};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    config: GatewayConfig,
    store: Option<&Path>,
    args: GenerateArgs,
) -> anyhow::Result<()> {
    let request = build_request(args)?;
    let gateway = build_gateway(config, store)?;

    // Ctrl-C closes an open stream cleanly
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let response = gateway
        .generate_with_cancel(request, cancel)
        .await
        .context("Request rejected")?;

    match response {
        GatewayResponse::Complete(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        GatewayResponse::Stream(mut frames) => {
            let mut stdout = std::io::stdout();
            while let Some(frame) = frames.next().await {
                let sse = frame.to_sse().context("Failed to encode stream frame")?;
                stdout.write_all(sse.as_bytes())?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}

fn build_request(args: GenerateArgs) -> anyhow::Result<GenerationRequest> {
    let mut request = GenerationRequest::prompt(args.prompt).with_mode(args.mode.into());
    if let Some(provider) = args.provider {
        request = request.with_provider(provider);
    }
    if let Some(path) = &args.schema {
        request = request.with_schema(read_json(path)?);
    }
    if let Some(system) = args.system {
        request = request.with_system_instruction(system);
    }
    if let Some(max_tokens) = args.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request.options.temperature = args.temperature;

    if let Some(kind) = args.analysis {
        let activities: Vec<Activity> = match &args.activities {
            Some(path) => serde_json::from_value(read_json(path)?)
                .with_context(|| format!("Invalid activities in {}", path.display()))?,
            None => Vec::new(),
        };
        request = request.with_analysis(AnalysisContext::new(kind.into(), activities));
    }

    if request.mode == GenerationMode::Structured && request.options.schema.is_none() {
        anyhow::bail!("--mode structured needs --schema <FILE>");
    }
    Ok(request)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AnalysisArg, ModeArg};
    use gateway_core::{AnalysisKind, ProviderKind};

    fn args(prompt: &str) -> GenerateArgs {
        GenerateArgs {
            prompt: prompt.to_string(),
            provider: None,
            mode: ModeArg::Sync,
            schema: None,
            system: None,
            max_tokens: None,
            temperature: None,
            analysis: None,
            activities: None,
        }
    }

    #[test]
    fn test_schema_file_switches_to_structured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();

        let mut generate = args("Analyze");
        generate.schema = Some(path);
        generate.provider = Some(ProviderKind::Gemini);
        let request = build_request(generate).unwrap();
        assert_eq!(request.mode, GenerationMode::Structured);
        assert_eq!(request.provider, Some(ProviderKind::Gemini));
    }

    #[test]
    fn test_activities_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activities.json");
        std::fs::write(
            &path,
            r#"[{"title": "Planning", "durationMinutes": 45, "category": "meetings"}]"#,
        )
        .unwrap();

        let mut generate = args("Summarize");
        generate.analysis = Some(AnalysisArg::WeeklyReview);
        generate.activities = Some(path);
        let request = build_request(generate).unwrap();
        let analysis = request.options.analysis.unwrap();
        assert_eq!(analysis.kind, AnalysisKind::WeeklyReview);
        assert_eq!(analysis.activities[0].duration_minutes, 45);
    }

    #[test]
    fn test_structured_without_schema_is_rejected() {
        let mut generate = args("Analyze");
        generate.mode = ModeArg::Structured;
        assert!(build_request(generate).is_err());
    }
}
