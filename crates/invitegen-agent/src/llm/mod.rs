//! LLM integration layer.
//!
//! - [`client`] -- HTTP client for Bedrock (Claude and Nova shapes) and the
//!   Anthropic Messages API.
//! - [`extract`] -- ordered strategies that pull generated text out of a
//!   response body.

pub mod client;
pub mod extract;

pub use client::{InferenceClient, InferenceConfig, Provider};
pub use extract::extract_generated_text;
