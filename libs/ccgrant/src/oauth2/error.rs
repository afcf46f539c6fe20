use ccgrant_http::BoxError;
use http::StatusCode;
use thiserror::Error;

/// Errors returned by the client credentials token flow.
///
/// No variant formats a client secret, assertion or access token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// Missing or inconsistent configuration, detected before any network call.
    #[error("OAuth2 config error: {0}")]
    Config(String),

    /// The client assertion provider failed; no request was sent.
    #[error("client assertion failed: {0}")]
    Assertion(#[source] BoxError),

    /// Network, TLS, timeout or body-size failure talking to the token endpoint.
    ///
    /// The message comes from
    /// [`format_http_error`](crate::http_error::format_http_error).
    #[error("{0}")]
    Transport(String),

    /// A successful HTTP response that does not hold a usable token.
    #[error("invalid token response: {0}")]
    Protocol(String),

    /// The token endpoint rejected the request.
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    /// The caller's cancellation token fired before the exchange finished.
    #[error("token request cancelled")]
    Cancelled,
}

impl TokenError {
    /// The retrieval error, when the endpoint answered with an OAuth2 error.
    #[must_use]
    pub fn as_retrieve(&self) -> Option<&RetrieveError> {
        match self {
            Self::Retrieve(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response from the token endpoint (RFC 6749 §5.2).
///
/// `body` keeps the raw payload for diagnostics. `Display` shows only the
/// status and the parsed error fields.
#[derive(Debug, Clone, Error)]
#[error("token endpoint returned {status}{}", describe(.error_code.as_deref(), .error_description.as_deref()))]
pub struct RetrieveError {
    pub status: StatusCode,
    pub body: String,
    /// `error` field of the response, e.g. `invalid_client`.
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub error_uri: Option<String>,
}

fn describe(code: Option<&str>, description: Option<&str>) -> String {
    match (code, description) {
        (Some(code), Some(desc)) => format!(": {code}: {desc}"),
        (Some(code), None) => format!(": {code}"),
        (None, Some(desc)) => format!(": {desc}"),
        (None, None) => String::new(),
    }
}
