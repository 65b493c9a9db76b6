use thiserror::Error;

/// Errors raised by the sign-in/sign-out flows and their collaborators.
///
/// Provider denial, user cancellation and anti-forgery mismatches are not
/// errors; they are reported through [`SignInOutcome`](super::SignInOutcome)
/// and a user-facing alert.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),
    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),
    #[error("Another sign-in or sign-out is already in progress")]
    Busy,
    #[error("Authorization timed out after {0}ms")]
    Timeout(u64),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
