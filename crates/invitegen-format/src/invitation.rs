//! Invitation finalization: registration link handling and subject lines.
//!
//! A [`FinalizedInvitation`] can only be obtained through
//! [`FinalizedInvitation::finalize`], so HTML rendering and subject
//! derivation never see text whose registration link is still pending.

use std::fmt;

use crate::html::{convert_to_html, split_lines};

/// Subject used when the invitation contains no `**` heading line.
pub const FALLBACK_SUBJECT: &str = "You're Invited: AWS Tech Event";

/// Marker placed in front of an appended registration link.
const LINK_BLOCK_PREFIX: &str = "🔗 ";

/// The canonical registration-link token, `[Register here](<link>)`.
///
/// Duplicate detection compares against this exact string.
pub fn registration_token(link: &str) -> String {
    format!("[Register here]({link})")
}

/// What finalization did with the registration link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The canonical token was appended as a trailing block.
    Appended(String),
    /// The model had already included the canonical token verbatim.
    AlreadyPresent(String),
    /// No link was supplied or found.
    Missing,
}

impl LinkOutcome {
    /// The resolved link, if any.
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Appended(link) | Self::AlreadyPresent(link) => Some(link),
            Self::Missing => None,
        }
    }
}

/// Invitation text whose registration link has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedInvitation {
    text: String,
}

impl FinalizedInvitation {
    /// Finalize generated invitation text.
    ///
    /// When `link` is present and its canonical token does not already occur
    /// in `text`, the token is appended after a blank line.  Finalizing text
    /// that already contains the token leaves it unchanged.
    pub fn finalize(text: impl Into<String>, link: Option<&str>) -> (Self, LinkOutcome) {
        let mut text = text.into();

        let outcome = match link {
            Some(link) => {
                let token = registration_token(link);
                if text.contains(&token) {
                    LinkOutcome::AlreadyPresent(link.to_owned())
                } else {
                    text.push_str("\n\n");
                    text.push_str(LINK_BLOCK_PREFIX);
                    text.push_str(&token);
                    LinkOutcome::Appended(link.to_owned())
                }
            }
            None => LinkOutcome::Missing,
        };

        (Self { text }, outcome)
    }

    /// The finalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the invitation, returning the text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Derive a mail subject: the first line starting with `**`, with the
    /// surrounding `*` and space characters stripped.
    pub fn subject_line(&self) -> String {
        split_lines(&self.text)
            .into_iter()
            .find(|line| line.starts_with("**"))
            .map(|line| line.trim_matches(|c| c == '*' || c == ' ').to_owned())
            .unwrap_or_else(|| FALLBACK_SUBJECT.to_owned())
    }

    /// Render the invitation as an HTML document.
    pub fn to_html(&self) -> String {
        convert_to_html(&self.text)
    }
}

impl fmt::Display for FinalizedInvitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for FinalizedInvitation {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
