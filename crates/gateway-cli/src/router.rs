//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::{commands, logging};
use anyhow::Context;
use gateway_core::config::load_config;

/// Load configuration, install logging and run the chosen command
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })?;
    logging::init(&config.logging);

    match cli.command {
        Commands::Generate(args) => {
            commands::generate::execute(config, cli.store.as_deref(), args).await
        }
        Commands::Diagnostics {
            warm_up,
            warm_up_prompt,
        } => commands::diagnostics::execute(config, cli.store.as_deref(), warm_up, &warm_up_prompt).await,
        Commands::EncryptCredential {
            value,
            generate_key,
        } => commands::encrypt_credential::execute(&config, value, generate_key),
    }
}
