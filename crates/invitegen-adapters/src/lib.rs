//! External collaborators for invitegen: a headless-browser page fetcher and
//! mail draft composers.
//!
//! The pipeline depends only on the capability traits [`PageFetcher`] and
//! [`DraftComposer`]; the browser fetcher also implements the [`Adapter`]
//! lifecycle because it owns a browser process.

pub mod browser;
pub mod error;
pub mod mail;
pub mod script;
pub mod traits;

pub use browser::BrowserFetcher;
pub use error::{AdapterError, Result};
pub use mail::{DisabledDraftComposer, MailBackend, OutlookDraftComposer};
pub use script::{ScriptOutput, run_script};
pub use traits::{Adapter, Draft, DraftComposer, HealthStatus, PageFetcher};
