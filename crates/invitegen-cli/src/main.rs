//! CLI entry point for invitegen.
//!
//! This binary provides the `invitegen` command: fetch an event page,
//! generate an invitation with a hosted language model, append the
//! registration link, and optionally create a mail draft.

mod cli;
mod config;
mod helpers;
mod pipeline;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use invitegen_adapters::Adapter;
use invitegen_agent::{AgentError, LlmInvitationGenerator};
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::helpers::{env_non_empty, init_tracing, log_level, print_missing_key_hint};
use crate::pipeline::{DraftStatus, PipelineOptions, ensure_healthy, run_pipeline};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` may hold API keys; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(AgentError::MissingApiKey { provider }) = e.downcast_ref::<AgentError>() {
                let env_var = provider
                    .parse::<invitegen_agent::Provider>()
                    .map(|p| p.api_key_env())
                    .unwrap_or("API key");
                print_missing_key_hint(provider, env_var);
            }
            error!(error = %format!("{e:#}"), "invitegen failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 1. Configuration: file, then environment, then flags.
    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env(env_non_empty);
    config.apply_cli(&cli);
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model_id,
        region = %config.llm.region,
        mail = %config.mail.backend,
        "configuration loaded"
    );

    // 2. Collaborators.  Configuration problems surface before the browser starts.
    let generator = LlmInvitationGenerator::from_config(config.inference_config(env_non_empty)?)?;
    let composer = config.mail_backend()?.composer();

    let mut fetcher = config.browser_fetcher();
    fetcher
        .connect()
        .await
        .context("failed to connect to the browser")?;
    if let Err(e) = ensure_healthy(&fetcher).await {
        let _ = fetcher.disconnect().await;
        return Err(e);
    }

    let options = PipelineOptions {
        url: cli.url.clone(),
        temp_file: cli.temp_file.clone(),
        output: cli.output.clone(),
        registration_link: cli.registration_link.clone(),
        generate_email: cli.generate_email,
        email_to: config.recipient(cli.email_to.as_deref()),
    };

    // 3. Run.
    let mut stdout = std::io::stdout();
    let result = run_pipeline(&fetcher, &generator, composer.as_ref(), &options, &mut stdout).await;

    if let Err(e) = fetcher.disconnect().await {
        warn!(error = %e, "failed to disconnect browser");
    }

    let report = result?;
    info!(
        registration_link = report.link.link().unwrap_or("-"),
        chars = report.invitation.as_str().chars().count(),
        "invitation finalized"
    );
    match report.draft {
        DraftStatus::Created => info!("draft opened in the mail client"),
        DraftStatus::Failed(_) => warn!("invitation generated, but the draft could not be created"),
        DraftStatus::NotRequested => {}
    }
    if let Some(path) = report.output_path {
        println!("\nInvitation saved to: {}", path.display());
    }
    Ok(())
}
