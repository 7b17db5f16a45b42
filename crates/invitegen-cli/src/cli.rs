//! CLI argument definitions for invitegen.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! wiring the pipeline together.

use std::path::PathBuf;

use clap::Parser;

/// invitegen -- turn an event page into a formatted invitation.
#[derive(Parser, Debug)]
#[command(
    name = "invitegen",
    version,
    about = "Fetch an event page, generate an invitation, and optionally draft an email",
    long_about = "Loads an event web page in a headless browser, asks a hosted language model \
                  to rewrite it as an invitation, appends the registration link, and can \
                  create an HTML draft in Microsoft Outlook for Mac."
)]
pub struct Cli {
    /// Event page URL.
    pub url: String,

    /// File receiving the raw page text (overwritten on every run).
    #[arg(long, value_name = "PATH", default_value = "input_file.txt")]
    pub temp_file: PathBuf,

    /// Save the finalized invitation to this file.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Registration link to use instead of searching the page text.
    #[arg(long, value_name = "URL")]
    pub registration_link: Option<String>,

    /// Create a mail draft from the invitation.
    #[arg(long)]
    pub generate_email: bool,

    /// Draft recipient (defaults to `mail.default_recipient`).
    #[arg(long, value_name = "ADDR")]
    pub email_to: Option<String>,

    /// Configuration file; a missing default file is ignored.
    #[arg(long, value_name = "PATH", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Inference backend: bedrock-claude, bedrock-nova or anthropic.
    #[arg(long)]
    pub provider: Option<String>,

    /// Model identifier for the inference backend.
    #[arg(long)]
    pub model_id: Option<String>,

    /// AWS region for Bedrock backends.
    #[arg(long)]
    pub region: Option<String>,

    /// Wait after page navigation before reading text, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub settle_delay_ms: Option<u64>,

    /// Enable debug logging.
    #[arg(long, short)]
    pub verbose: bool,
}
