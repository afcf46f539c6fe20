use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ccgrant::oauth2::DEFAULT_EXPIRY_DELTA;
use ccgrant::{AuthStyle, ClientCredential, ClientCredentialsConfig, SecretString};
use ccgrant_http::{HttpClientConfig, TransportSecurity};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::assertion::FileAssertion;

/// Environment variables with this prefix override the config file.
/// Nested keys use `__`, e.g. `CCGRANT_ENDPOINT_PARAMS__AUDIENCE`.
pub const ENV_PREFIX: &str = "CCGRANT_";

/// Effective CLI settings.
///
/// Layered as: built-in defaults → YAML file → `CCGRANT_*` environment →
/// command-line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token_endpoint: Option<Url>,
    pub client_id: String,
    pub client_secret: Option<SecretString>,
    /// File holding a signed client assertion; re-read for every request.
    pub client_assertion_file: Option<PathBuf>,
    pub scopes: Vec<String>,
    pub endpoint_params: BTreeMap<String, Vec<String>>,
    pub auth_style: AuthStyle,
    pub extra_headers: BTreeMap<String, String>,
    pub expiry_delta_secs: u64,
    pub request_timeout_secs: u64,
    pub allow_insecure_http: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_endpoint: None,
            client_id: String::new(),
            client_secret: None,
            client_assertion_file: None,
            scopes: Vec::new(),
            endpoint_params: BTreeMap::new(),
            auth_style: AuthStyle::default(),
            extra_headers: BTreeMap::new(),
            expiry_delta_secs: DEFAULT_EXPIRY_DELTA.as_secs(),
            request_timeout_secs: 30,
            allow_insecure_http: false,
        }
    }
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_insecure_http: bool,
}

impl Settings {
    /// Build the layered figment without extracting it.
    pub fn figment(path: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
    }

    /// Load settings from all layers.
    ///
    /// # Errors
    ///
    /// Fails when a layer cannot be parsed or holds a value of the wrong type.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::figment(path, overrides)
            .extract()
            .context("failed to load configuration")
    }

    fn transport(&self) -> TransportSecurity {
        if self.allow_insecure_http {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        }
    }

    /// Transport settings for calls to protected resources.
    #[must_use]
    pub fn api_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            transport: self.transport(),
            ..HttpClientConfig::default()
        }
    }

    /// Turn the settings into a validated grant configuration.
    ///
    /// # Errors
    ///
    /// Fails when both a secret and an assertion file are given, or when
    /// the resulting configuration does not validate.
    pub fn into_config(self) -> Result<ClientCredentialsConfig> {
        let http_config = HttpClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            transport: self.transport(),
            ..HttpClientConfig::token_endpoint()
        };

        let credential = match (self.client_secret, self.client_assertion_file) {
            (Some(_), Some(_)) => {
                bail!("client_secret and client_assertion_file are mutually exclusive")
            }
            (_, Some(path)) => ClientCredential::assertion(FileAssertion::new(path)),
            (secret, None) => ClientCredential::Secret(secret.unwrap_or_default()),
        };

        let config = ClientCredentialsConfig {
            token_endpoint: self.token_endpoint,
            client_id: self.client_id,
            credential,
            scopes: self.scopes,
            endpoint_params: self.endpoint_params,
            auth_style: self.auth_style,
            extra_headers: self.extra_headers.into_iter().collect(),
            expiry_delta: Duration::from_secs(self.expiry_delta_secs),
            http_config: Some(http_config),
        };
        config.validate().context("invalid client configuration")?;
        Ok(config)
    }
}
