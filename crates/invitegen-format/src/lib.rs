//! Invitation dialect handling for invitegen.
//!
//! The language model is instructed to answer in a small markdown-like
//! dialect: `**bold**` heading lines, `## ` / `### ` subheadings, `- ` list
//! items and `[label](url)` links.  This crate holds the pure, I/O-free
//! transformations applied to that text:
//!
//! - [`link`] -- locate a registration URL in raw page text.
//! - [`html`] -- render the dialect as a minimal HTML document for mail clients.
//! - [`invitation`] -- append the registration link and derive the subject line.

pub mod html;
pub mod invitation;
pub mod link;

pub use html::{convert_to_html, split_lines};
pub use invitation::{FALLBACK_SUBJECT, FinalizedInvitation, LinkOutcome, registration_token};
pub use link::{extract_registration_link, resolve_registration_link};
