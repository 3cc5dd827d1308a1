use thiserror::Error;

/// Failures surfaced by the backend gateway.
///
/// The split that matters downstream is transient vs not: a transient
/// failure means the backend could not be reached and says nothing about
/// the session, so callers must leave it intact. Every other variant is the
/// backend explicitly saying no.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error("access token rejected")]
    TokenRejected,

    #[error("refresh token rejected")]
    RefreshTokenInvalid,

    #[error("backend unreachable: {0}")]
    Network(String),
}

impl BackendError {
    /// True when the failure says nothing about the credential itself.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
