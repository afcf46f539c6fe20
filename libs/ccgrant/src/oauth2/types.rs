use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ccgrant_http::BoxError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::secret::SecretString;

/// `client_assertion_type` sent with every assertion (RFC 7523 §2.2).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Where `client_id` / `client_secret` are placed in a token request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStyle {
    /// Form fields in the request body.
    InParams,
    /// HTTP Basic authentication (RFC 6749 §2.3.1).
    InHeader,
    /// Use the style learned for this endpoint, else try `InParams` and
    /// fall back to `InHeader` when the endpoint rejects it.
    #[default]
    AutoDetect,
}

/// Produces a fresh signed client assertion (usually a JWT) per token request.
///
/// Called once for every exchange; the result is never cached. The
/// implementation may perform I/O and should observe `cancel`.
#[async_trait]
pub trait ClientAssertionProvider: Send + Sync {
    async fn assertion(&self, cancel: &CancellationToken) -> Result<SecretString, BoxError>;
}

/// Assertion provider returning a fixed, pre-signed assertion.
#[derive(Clone, Debug)]
pub struct StaticAssertion(SecretString);

impl StaticAssertion {
    pub fn new(assertion: impl Into<SecretString>) -> Self {
        Self(assertion.into())
    }
}

#[async_trait]
impl ClientAssertionProvider for StaticAssertion {
    async fn assertion(&self, _cancel: &CancellationToken) -> Result<SecretString, BoxError> {
        Ok(self.0.clone())
    }
}

/// How the client proves its identity.
#[derive(Clone)]
pub enum ClientCredential {
    /// Shared secret. May be empty, in which case only `client_id` is sent.
    Secret(SecretString),
    /// Signed assertion generated per request. Always sent in the body.
    Assertion(Arc<dyn ClientAssertionProvider>),
}

impl ClientCredential {
    pub fn secret(secret: impl Into<SecretString>) -> Self {
        Self::Secret(secret.into())
    }

    pub fn assertion(provider: impl ClientAssertionProvider + 'static) -> Self {
        Self::Assertion(Arc::new(provider))
    }

    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

impl Default for ClientCredential {
    fn default() -> Self {
        Self::Secret(SecretString::default())
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret([REDACTED])"),
            Self::Assertion(_) => f.write_str("Assertion(..)"),
        }
    }
}
