//! The fetch → generate → finalize → draft pipeline.
//!
//! Steps run strictly in sequence.  Fetch, generation and file I/O failures
//! abort the run; a draft failure is logged and recorded in the
//! [`RunReport`] but the run still succeeds.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};

use invitegen_adapters::{Adapter, Draft, DraftComposer, HealthStatus, PageFetcher};
use invitegen_agent::InvitationGenerator;
use invitegen_format::{FinalizedInvitation, LinkOutcome, resolve_registration_link};

/// Per-run inputs taken from the command line.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Event page URL.
    pub url: String,
    /// Intermediate raw-text file, overwritten on every run.
    pub temp_file: PathBuf,
    /// Where to save the finalized invitation, if anywhere.
    pub output: Option<PathBuf>,
    /// Explicit registration link override.
    pub registration_link: Option<String>,
    /// Whether to create a mail draft.
    pub generate_email: bool,
    /// Draft recipient.
    pub email_to: Option<String>,
}

/// What happened to the mail draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftStatus {
    /// No draft was requested.
    NotRequested,
    /// The composer created the draft.
    Created,
    /// The composer failed; the message is the diagnostic.
    Failed(String),
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// What finalization did with the registration link.
    pub link: LinkOutcome,
    /// The invitation as printed.
    pub invitation: FinalizedInvitation,
    /// The file the invitation was saved to, if requested.
    pub output_path: Option<PathBuf>,
    /// Outcome of draft creation.
    pub draft: DraftStatus,
}

/// Run the pipeline once.
///
/// The finalized invitation is written to `out`.
pub async fn run_pipeline(
    fetcher: &dyn PageFetcher,
    generator: &dyn InvitationGenerator,
    composer: &dyn DraftComposer,
    options: &PipelineOptions,
    out: &mut dyn Write,
) -> Result<RunReport> {
    // 1. Fetch and persist the raw page text.
    info!(url = %options.url, "fetching event page");
    let raw_text = fetcher
        .fetch_text(&options.url)
        .await
        .with_context(|| format!("failed to fetch `{}`", options.url))?;

    tokio::fs::write(&options.temp_file, &raw_text)
        .await
        .with_context(|| {
            format!(
                "failed to write page text to `{}`",
                options.temp_file.display()
            )
        })?;
    info!(
        path = %options.temp_file.display(),
        chars = raw_text.chars().count(),
        "page text saved"
    );

    // 2. Generate.
    info!(backend = %generator.describe(), "generating invitation");
    let generated = generator
        .generate(&raw_text)
        .await
        .context("invitation generation failed")?;

    // 3. Resolve and append the registration link.
    let link = resolve_registration_link(options.registration_link.as_deref(), &raw_text);
    let (invitation, outcome) = FinalizedInvitation::finalize(generated, link.as_deref());
    if outcome == LinkOutcome::Missing {
        warn!("no registration link found or provided");
    }

    // 4. Show and optionally save.
    writeln!(out, "{}", link_notice(&outcome))?;
    writeln!(out, "\n--- Generated Invitation ---\n")?;
    writeln!(out, "{invitation}")?;
    out.flush()?;

    if let Some(ref path) = options.output {
        tokio::fs::write(path, invitation.as_str())
            .await
            .with_context(|| format!("failed to save invitation to `{}`", path.display()))?;
        info!(path = %path.display(), "invitation saved");
    }

    // 5. Draft.
    let draft = if options.generate_email {
        compose_draft(composer, &invitation, options.email_to.as_deref()).await
    } else {
        DraftStatus::NotRequested
    };

    Ok(RunReport {
        link: outcome,
        invitation,
        output_path: options.output.clone(),
        draft,
    })
}

/// One-line report of what finalization did with the registration link.
pub fn link_notice(outcome: &LinkOutcome) -> String {
    match outcome {
        LinkOutcome::Appended(link) => format!("Registration link added: {link}"),
        LinkOutcome::AlreadyPresent(_) => "Registration link already included by the model.".into(),
        LinkOutcome::Missing => "No registration link found or provided.".into(),
    }
}

/// Check a connected adapter before use.
///
/// A degraded adapter is only logged; an unhealthy one is an error.
pub async fn ensure_healthy(adapter: &dyn Adapter) -> Result<()> {
    let status = adapter
        .health_check()
        .await
        .with_context(|| format!("health check of `{}` failed", adapter.id()))?;
    match status {
        HealthStatus::Healthy => {
            info!(adapter = adapter.id(), "adapter healthy");
            Ok(())
        }
        HealthStatus::Degraded => {
            warn!(adapter = adapter.id(), "adapter degraded; continuing");
            Ok(())
        }
        HealthStatus::Unhealthy => bail!("adapter `{}` is unhealthy", adapter.id()),
    }
}

/// Hand the invitation to `composer`; failures are logged, not propagated.
async fn compose_draft(
    composer: &dyn DraftComposer,
    invitation: &FinalizedInvitation,
    recipient: Option<&str>,
) -> DraftStatus {
    let draft = Draft::new(invitation.subject_line(), invitation.to_html()).with_recipient(recipient);
    info!(
        backend = composer.name(),
        subject = %draft.subject,
        recipient = draft.recipient.as_deref().unwrap_or("-"),
        "creating mail draft"
    );

    match composer.compose(&draft).await {
        Ok(()) => DraftStatus::Created,
        Err(e) => {
            error!(backend = composer.name(), error = %e, "failed to create mail draft");
            DraftStatus::Failed(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
