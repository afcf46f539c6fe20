use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::TokenError;
use super::exchange::TokenExchanger;
use super::supplier::TokenSupplier;
use super::token::{DEFAULT_EXPIRY_DELTA, Token};
use super::types::{AuthStyle, ClientCredential};

/// Form fields the builder owns. `scope` is only reserved while `scopes`
/// is non-empty and `grant_type` may always be overridden.
const RESERVED_PARAMS: [&str; 4] = [
    "client_id",
    "client_secret",
    "client_assertion",
    "client_assertion_type",
];

/// Configuration for the `OAuth2` client credentials grant.
///
/// Build it with struct-update syntax over [`Default`]. Nothing is checked
/// until a token is requested; [`validate`](Self::validate) runs at the
/// start of every exchange.
///
/// `Debug` redacts the credential and extra-header values.
#[derive(Clone)]
pub struct ClientCredentialsConfig {
    /// Token endpoint URL. Required.
    pub token_endpoint: Option<Url>,

    /// `OAuth2` client identifier. Required.
    pub client_id: String,

    /// Shared secret or assertion provider.
    pub credential: ClientCredential,

    /// Requested scopes, sent space-joined in this order.
    pub scopes: Vec<String>,

    /// Extra form fields for every request. A `grant_type` entry replaces
    /// `client_credentials`.
    pub endpoint_params: BTreeMap<String, Vec<String>>,

    /// Where `client_id` / `client_secret` are placed.
    pub auth_style: AuthStyle,

    /// Extra headers attached to every token request (vendor quirks).
    pub extra_headers: Vec<(String, String)>,

    /// A cached token is refreshed this long before it expires (default: 10 s).
    pub expiry_delta: Duration,

    /// Transport settings for the token endpoint. When `None`,
    /// [`HttpClientConfig::token_endpoint()`](ccgrant_http::HttpClientConfig::token_endpoint)
    /// is used.
    pub http_config: Option<ccgrant_http::HttpClientConfig>,
}

impl ClientCredentialsConfig {
    /// Check that the configuration can produce a token request.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] if:
    /// - `client_id` is empty,
    /// - `token_endpoint` is not set, or
    /// - `endpoint_params` would overwrite a credential field, or `scope`
    ///   while `scopes` is non-empty.
    pub fn validate(&self) -> Result<(), TokenError> {
        self.endpoint().map(|_| ())
    }

    /// Validated token endpoint.
    pub(crate) fn endpoint(&self) -> Result<&Url, TokenError> {
        if self.client_id.trim().is_empty() {
            return Err(TokenError::Config("client_id must not be empty".into()));
        }
        let endpoint = self
            .token_endpoint
            .as_ref()
            .ok_or_else(|| TokenError::Config("token_endpoint is required".into()))?;

        for key in self.endpoint_params.keys() {
            let reserved = RESERVED_PARAMS.contains(&key.as_str())
                || (key == "scope" && !self.scopes.is_empty());
            if reserved {
                return Err(TokenError::Config(format!(
                    "endpoint_params cannot overwrite parameter {key:?}"
                )));
            }
        }
        Ok(endpoint)
    }

    /// Build a caching, self-refreshing token supplier for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Transport`] if the HTTP client cannot be built.
    pub fn token_source(self) -> Result<TokenSupplier, TokenError> {
        TokenSupplier::new(self)
    }

    /// Perform a single uncached exchange.
    ///
    /// # Errors
    ///
    /// Any [`TokenError`] produced by [`TokenExchanger::exchange`].
    pub async fn token(&self, cancel: &CancellationToken) -> Result<Token, TokenError> {
        TokenExchanger::new(self.clone())?.exchange(cancel).await
    }
}

impl Default for ClientCredentialsConfig {
    fn default() -> Self {
        Self {
            token_endpoint: None,
            client_id: String::new(),
            credential: ClientCredential::default(),
            scopes: Vec::new(),
            endpoint_params: BTreeMap::new(),
            auth_style: AuthStyle::default(),
            extra_headers: Vec::new(),
            expiry_delta: DEFAULT_EXPIRY_DELTA,
            http_config: None,
        }
    }
}

impl fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted_headers: Vec<_> = self
            .extra_headers
            .iter()
            .map(|(k, _)| (k.as_str(), "[REDACTED]"))
            .collect();
        f.debug_struct("ClientCredentialsConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("credential", &self.credential)
            .field("scopes", &self.scopes)
            .field("endpoint_params", &self.endpoint_params)
            .field("auth_style", &self.auth_style)
            .field("extra_headers", &redacted_headers)
            .field("expiry_delta", &self.expiry_delta)
            .field("http_config", &self.http_config)
            .finish()
    }
}
