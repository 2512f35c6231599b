// Error types for storefront-e2e
//
// `Error` covers everything that can fail a test or abort a session.
// `CleanupError` is the error type of teardown steps; those are logged and
// swallowed by `cleanup::best_effort` and never reach the test outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storefront-e2e operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a session or fail a test case
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential environment variable is unset or empty
    ///
    /// Raised before any browser action runs.
    #[error(
        "Missing credential: environment variable {var} is not set. \
        Export SAUCE_USERNAME and SAUCE_PASSWORD before running the suite."
    )]
    MissingCredential { var: &'static str },

    /// The configured browser engine is not one of chromium, firefox, webkit
    #[error("Unsupported browser '{0}'. Expected one of: chromium, firefox, webkit")]
    UnsupportedBrowser(String),

    /// The Playwright driver or the browser process could not be started
    #[error("Failed to launch {browser}: {source}")]
    BrowserLaunch {
        browser: String,
        #[source]
        source: playwright_rs::Error,
    },

    /// Any other failure reported by the automation library
    /// (navigation, wait/assert timeouts, closed targets)
    #[error(transparent)]
    Playwright(#[from] playwright_rs::Error),

    /// A page-state check made by a scenario did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Base URL or page path that does not form a valid URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Checkout form data with a blank field
    #[error("Invalid customer info: {field} must not be empty")]
    InvalidCustomerInfo { field: &'static str },

    /// The test body panicked
    #[error("Test panicked: {0}")]
    Panicked(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors that should abort the whole session rather than fail one case.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential { .. } | Error::UnsupportedBrowser(_) | Error::BrowserLaunch { .. }
        )
    }
}

/// Errors raised by teardown steps
///
/// Losing a debugging artifact must not change a test's outcome, so these
/// are only ever logged.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Automation-library call made during teardown failed
    #[error("{step}: {source}")]
    Playwright {
        step: &'static str,
        #[source]
        source: playwright_rs::Error,
    },

    /// Filesystem operation on an artifact failed
    #[error("{step} {}: {source}", .path.display())]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Refused to touch a path outside this run's artifact namespace
    #[error("Refusing to touch {} outside {}", .path.display(), .root.display())]
    OutsideNamespace { path: PathBuf, root: PathBuf },

    /// Tracing protocol response was missing the expected artifact
    #[error("Trace protocol: {0}")]
    Protocol(String),

    /// External command failed or could not be spawned
    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
}

impl CleanupError {
    pub(crate) fn io(step: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleanupError::Io {
            step,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn playwright(step: &'static str, source: playwright_rs::Error) -> Self {
        CleanupError::Playwright { step, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_variable() {
        let err = Error::MissingCredential {
            var: "SAUCE_PASSWORD",
        };
        assert!(err.to_string().contains("SAUCE_PASSWORD"));
        assert!(err.is_setup());
    }

    #[test]
    fn test_assertion_is_not_setup() {
        assert!(!Error::Assertion("cart badge".into()).is_setup());
        assert!(!Error::InvalidCustomerInfo { field: "postal_code" }.is_setup());
    }

    #[test]
    fn test_outside_namespace_message() {
        let err = CleanupError::OutsideNamespace {
            path: PathBuf::from("/tmp/other/video.webm"),
            root: PathBuf::from("/tmp/mine"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/other/video.webm"));
        assert!(msg.contains("/tmp/mine"));
    }
}
