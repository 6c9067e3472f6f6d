//! Q Apps export command
//!
//! Wires configuration, the management API and the exporter into a single
//! sequential run. The binary in `main.rs` only parses arguments and builds
//! the AWS client; everything else lives in [`pipeline`] so it can be driven
//! against the in-memory API in tests.

pub mod pipeline;
pub mod summary;

pub use pipeline::{run, RunContext};
pub use summary::RunSummary;

use qapps_core::AppError;

/// Initialize tracing for the CLI.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `info` over `warn`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

/// Operator-facing rendering of a fatal error.
///
/// When an [`AppError`] is somewhere in the chain its code, cause chain and
/// suggested action are included; anything else falls back to the context chain.
pub fn diagnostic(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AppError>() {
        Some(app_error) => format!(
            "Error [{}]: {:#}\n  {}\nSuggested action: {}",
            app_error.error_code(),
            err,
            app_error.detailed_message(),
            app_error.suggested_action()
        ),
        None => format!("Error: {:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_diagnostic_includes_code_and_action() {
        let result: Result<(), AppError> =
            Err(AppError::Credentials("ExpiredToken".to_string()));
        let err = result.context("export run failed").unwrap_err();

        let text = diagnostic(&err);
        assert!(text.starts_with("Error [CREDENTIALS_ERROR]: export run failed"));
        assert!(text.contains("Credential error: ExpiredToken"));
        assert!(text.contains(
            "Suggested action: Refresh the credentials file or check the configured profile"
        ));
    }

    #[test]
    fn test_diagnostic_without_app_error() {
        let err = anyhow::anyhow!("boom").context("starting up");
        assert_eq!(diagnostic(&err), "Error: starting up: boom");
    }
}
