//! Mail draft composers.
//!
//! [`OutlookDraftComposer`] drives Microsoft Outlook for Mac through
//! AppleScript.  The HTML body is written to a scoped temporary file whose
//! path is embedded in the script, because AppleScript string literals are a
//! poor carrier for a whole HTML document.  The file is removed when the
//! composer returns, whether or not `osascript` succeeded.
//!
//! [`DisabledDraftComposer`] accepts every draft and does nothing.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::script::{DEFAULT_TIMEOUT_SECS, run_script};
use crate::traits::{Draft, DraftComposer};

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Which draft composer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    /// Microsoft Outlook for Mac via `osascript`.
    #[default]
    Outlook,
    /// Skip draft creation.
    Disabled,
}

impl MailBackend {
    /// The configuration name of this backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outlook => "outlook",
            Self::Disabled => "disabled",
        }
    }

    /// Build the composer for this backend.
    pub fn composer(self) -> Box<dyn DraftComposer> {
        match self {
            Self::Outlook => Box::new(OutlookDraftComposer::new()),
            Self::Disabled => Box::new(DisabledDraftComposer),
        }
    }
}

impl fmt::Display for MailBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailBackend {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outlook" => Ok(Self::Outlook),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(AdapterError::ConfigError(format!(
                "unknown mail backend `{other}`; expected `outlook` or `disabled`"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outlook (macOS)
// ---------------------------------------------------------------------------

/// Creates HTML drafts in Microsoft Outlook for Mac.
pub struct OutlookDraftComposer {
    /// Timeout for the `osascript` invocation in seconds.
    timeout_secs: u64,
}

impl OutlookDraftComposer {
    /// Create a composer with the default script timeout.
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the `osascript` timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OutlookDraftComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftComposer for OutlookDraftComposer {
    fn name(&self) -> &str {
        "outlook"
    }

    async fn compose(&self, draft: &Draft) -> Result<()> {
        if !cfg!(target_os = "macos") {
            return Err(AdapterError::Unsupported {
                operation: "outlook draft".into(),
                platform: std::env::consts::OS.into(),
            });
        }

        let mut html_file = tempfile::Builder::new()
            .prefix("invitegen-")
            .suffix(".html")
            .tempfile()?;
        html_file.write_all(draft.html_body.as_bytes())?;
        html_file.flush()?;

        let script = outlook_draft_script(html_file.path(), draft);
        debug!(
            path = %html_file.path().display(),
            subject = %draft.subject,
            has_recipient = draft.recipient.is_some(),
            "invoking osascript"
        );

        let result = run_script("osascript", &["-e", &script], self.timeout_secs).await;

        if let Err(e) = html_file.close() {
            warn!(error = %e, "failed to remove temporary HTML file");
        }

        let output = result?;
        if !output.success() {
            return Err(AdapterError::ExecutionFailed {
                operation: "osascript".into(),
                reason: format!(
                    "exit code {}: {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            });
        }

        info!(subject = %draft.subject, "draft created in Microsoft Outlook");
        Ok(())
    }
}

/// Build the AppleScript that creates and opens the Outlook draft.
pub fn outlook_draft_script(html_path: &Path, draft: &Draft) -> String {
    let path = applescript_string(&html_path.to_string_lossy());
    let subject = applescript_string(&draft.subject);

    let recipient = draft
        .recipient
        .as_deref()
        .map(|to| {
            format!(
                "        make new recipient at newMessage with properties {{email address:{{address:{}}}}}\n",
                applescript_string(to)
            )
        })
        .unwrap_or_default();

    format!(
        "set htmlFile to POSIX file {path} as alias\n\
         set htmlContent to read htmlFile as «class utf8»\n\
         \n\
         tell application \"Microsoft Outlook\"\n\
         \x20   set newMessage to make new outgoing message with properties {{subject:{subject}}}\n\
         \x20   tell newMessage\n\
         \x20       set content to htmlContent\n\
         {recipient}\
         \x20       open\n\
         \x20   end tell\n\
         \x20   activate\n\
         end tell\n"
    )
}

/// Quote `value` as an AppleScript string literal.
///
/// Backslashes and double quotes are escaped; line breaks become spaces.
pub fn applescript_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Disabled
// ---------------------------------------------------------------------------

/// A composer that creates nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDraftComposer;

#[async_trait]
impl DraftComposer for DisabledDraftComposer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn compose(&self, draft: &Draft) -> Result<()> {
        info!(subject = %draft.subject, "mail backend disabled; draft not created");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
