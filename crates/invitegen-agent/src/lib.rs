//! Invitation generation for invitegen.
//!
//! ```text
//! raw page text ──> prompt ──> InferenceClient ──> response JSON ──> extract ──> invitation text
//!                               (Bedrock Claude │ Bedrock Nova │ Anthropic)
//! ```
//!
//! ## Modules
//!
//! - [`prompt`] -- the fixed copywriting instruction.
//! - [`llm`] -- inference client and response extraction strategies.
//! - [`generator`] -- the [`InvitationGenerator`] capability trait.
//! - [`error`] -- agent error types.

pub mod error;
pub mod generator;
pub mod llm;
pub mod prompt;

pub use error::{AgentError, Result};
pub use generator::{InvitationGenerator, LlmInvitationGenerator};
pub use llm::{InferenceClient, InferenceConfig, Provider, extract_generated_text};
pub use prompt::build_prompt;
