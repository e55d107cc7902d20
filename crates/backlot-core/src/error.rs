//! Backend boundary error types.

use thiserror::Error;

/// Error surfaced by a generation backend or credential host call.
///
/// Cloneable so scripted test backends can replay the same failure.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The provider rejected or failed the request.
    #[error("backend api error: {message}")]
    Api {
        /// Provider-supplied failure message.
        message: String,
        /// HTTP-equivalent status code, when the provider reported one.
        status: Option<u16>,
    },

    /// Transport-level failure before a provider response was obtained.
    #[error("backend transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Creates an api error with no status code.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an api error carrying a provider status code.
    #[must_use]
    pub fn api_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            message: message.into(),
            status: Some(status),
        }
    }
}
