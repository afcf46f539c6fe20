use std::collections::BTreeMap;
use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use tokio_util::sync::CancellationToken;
use url::form_urlencoded::byte_serialize;
use zeroize::{Zeroize, Zeroizing};

use super::config::ClientCredentialsConfig;
use super::error::TokenError;
use super::types::{AuthStyle, ClientCredential, JWT_BEARER_ASSERTION_TYPE};
use crate::secret::SecretString;

/// Client credentials sent as HTTP Basic authentication.
pub struct BasicCredentials {
    client_id: String,
    client_secret: SecretString,
}

impl BasicCredentials {
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `Basic base64(urlencode(id) ":" urlencode(secret))` per RFC 6749 §2.3.1.
    #[must_use]
    pub fn header_value(&self) -> Zeroizing<String> {
        let id: String = byte_serialize(self.client_id.as_bytes()).collect();
        let secret = Zeroizing::new(
            byte_serialize(self.client_secret.expose().as_bytes()).collect::<String>(),
        );
        let pair = Zeroizing::new(format!("{id}:{}", &*secret));
        let encoded = Zeroizing::new(general_purpose::STANDARD.encode(pair.as_bytes()));
        Zeroizing::new(format!("Basic {}", &*encoded))
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .finish()
    }
}

/// A fully-formed token request: form fields plus optional Basic credentials.
///
/// Fields are kept sorted by key so the encoded body is deterministic.
/// Values are zeroed on drop and never printed by `Debug`.
pub struct TokenRequest {
    params: BTreeMap<String, Vec<String>>,
    basic: Option<BasicCredentials>,
}

impl TokenRequest {
    /// First value of a form field.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All form fields in encoding order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    #[must_use]
    pub fn basic_auth(&self) -> Option<&BasicCredentials> {
        self.basic.as_ref()
    }

    /// `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Protocol`] if a field cannot be encoded.
    pub fn encode_body(&self) -> Result<Zeroizing<String>, TokenError> {
        let pairs: Vec<(&str, &str)> = self.params().collect();
        serde_urlencoded::to_string(pairs)
            .map(Zeroizing::new)
            .map_err(|e| TokenError::Protocol(format!("cannot encode token request: {e}")))
    }
}

impl Drop for TokenRequest {
    fn drop(&mut self) {
        for values in self.params.values_mut() {
            values.zeroize();
        }
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("basic", &self.basic)
            .finish()
    }
}

/// Build the token request for `config` using a concrete `style`.
///
/// `AutoDetect` is treated as `InParams`; probing is the exchanger's job.
/// With an assertion credential the assertion provider is called here, and
/// the style is ignored because assertions always travel in the body.
///
/// # Errors
///
/// - [`TokenError::Assertion`] if the assertion provider fails.
/// - [`TokenError::Cancelled`] if `cancel` fires while waiting for it.
pub async fn build_token_request(
    config: &ClientCredentialsConfig,
    style: AuthStyle,
    cancel: &CancellationToken,
) -> Result<TokenRequest, TokenError> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    params.insert("grant_type".into(), vec!["client_credentials".into()]);
    if !config.scopes.is_empty() {
        params.insert("scope".into(), vec![config.scopes.join(" ")]);
    }
    for (key, values) in &config.endpoint_params {
        params.insert(key.clone(), values.clone());
    }

    let mut basic = None;
    match &config.credential {
        ClientCredential::Assertion(provider) => {
            let assertion = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TokenError::Cancelled),
                res = provider.assertion(cancel) => res.map_err(TokenError::Assertion)?,
            };
            params.insert("client_id".into(), vec![config.client_id.clone()]);
            params.insert(
                "client_assertion".into(),
                vec![assertion.expose().to_owned()],
            );
            params.insert(
                "client_assertion_type".into(),
                vec![JWT_BEARER_ASSERTION_TYPE.to_owned()],
            );
        }
        ClientCredential::Secret(secret) => match style {
            AuthStyle::InHeader => {
                basic = Some(BasicCredentials {
                    client_id: config.client_id.clone(),
                    client_secret: secret.clone(),
                });
            }
            AuthStyle::InParams | AuthStyle::AutoDetect => {
                params.insert("client_id".into(), vec![config.client_id.clone()]);
                if !secret.is_empty() {
                    params.insert("client_secret".into(), vec![secret.expose().to_owned()]);
                }
            }
        },
    }

    Ok(TokenRequest { params, basic })
}
