//! Shared helper functions for the CLI.
//!
//! Tracing initialization and environment variable utilities.

use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// The default log level for the requested verbosity.
pub fn log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Read an environment variable, treating empty values as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Print an error about a missing API key.
pub fn print_missing_key_hint(provider: &str, env_var: &str) {
    eprintln!();
    eprintln!("  Error: {provider} provider selected but no API key found.");
    eprintln!("  Set it in your environment or in .env:");
    eprintln!("    export {env_var}=...");
    eprintln!();
}
