//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use gateway_core::{AnalysisKind, GenerationMode, ProviderKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gateway")]
#[command(about = "AI gateway - route generation requests across LLM backends")]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON or TOML); `GATEWAY_*` variables override it
    #[arg(long, global = true, env = "GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file holding provider configurations
    #[arg(long, global = true, env = "GATEWAY_CREDENTIAL_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one generation request
    Generate(GenerateArgs),

    /// Print provider health, usage and cost as JSON
    Diagnostics {
        /// Requests to send first so the counters have something to show
        #[arg(long, default_value_t = 0)]
        warm_up: u32,

        /// Prompt used for warm-up requests
        #[arg(long, default_value = "Summarize my workload")]
        warm_up_prompt: String,
    },

    /// Seal an API key into an encrypted credential reference
    EncryptCredential {
        /// API key to seal; read from stdin when omitted
        #[arg(long)]
        value: Option<String>,

        /// Print a freshly generated credential key instead
        #[arg(long, conflicts_with = "value")]
        generate_key: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Prompt text
    pub prompt: String,

    /// Preferred provider (claude, gemini, deepseek, kimi, mock)
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    #[arg(long, value_enum, default_value = "sync")]
    pub mode: ModeArg,

    /// JSON Schema file; implies structured mode
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// System instruction
    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,

    /// Kind of workload analysis the prompt asks for
    #[arg(long, value_enum)]
    pub analysis: Option<AnalysisArg>,

    /// JSON array of activities for the analysis context
    #[arg(long, requires = "analysis")]
    pub activities: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sync,
    Stream,
    Structured,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sync => GenerationMode::Sync,
            ModeArg::Stream => GenerationMode::Stream,
            ModeArg::Structured => GenerationMode::Structured,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisArg {
    InitialSummary,
    WorkloadBalance,
    ProductivityInsights,
    WeeklyReview,
}

impl From<AnalysisArg> for AnalysisKind {
    fn from(kind: AnalysisArg) -> Self {
        match kind {
            AnalysisArg::InitialSummary => AnalysisKind::InitialSummary,
            AnalysisArg::WorkloadBalance => AnalysisKind::WorkloadBalance,
            AnalysisArg::ProductivityInsights => AnalysisKind::ProductivityInsights,
            AnalysisArg::WeeklyReview => AnalysisKind::WeeklyReview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_generate() {
        let cli = Cli::try_parse_from([
            "gateway",
            "generate",
            "How was my week?",
            "--provider",
            "anthropic",
            "--mode",
            "stream",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.provider, Some(ProviderKind::Claude));
                assert_eq!(GenerationMode::from(args.mode), GenerationMode::Stream);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_activities_require_analysis() {
        let parsed = Cli::try_parse_from([
            "gateway",
            "generate",
            "hi",
            "--activities",
            "activities.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_generate_key_conflicts_with_value() {
        let parsed = Cli::try_parse_from([
            "gateway",
            "encrypt-credential",
            "--value",
            "sk-test",
            "--generate-key",
        ]);
        assert!(parsed.is_err());
    }
}
