use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::secret::SecretString;

/// Default skew applied when judging whether a token is still usable.
pub const DEFAULT_EXPIRY_DELTA: Duration = Duration::from_secs(10);

/// An access token issued by the token endpoint.
///
/// Immutable once built. Suppliers replace tokens wholesale and hand them
/// out behind `Arc`. `Debug` redacts the token values.
#[derive(Clone)]
pub struct Token {
    access_token: SecretString,
    token_type: String,
    refresh_token: Option<SecretString>,
    expiry: Option<OffsetDateTime>,
    extra: Map<String, Value>,
}

impl Token {
    /// A bearer token with no known expiry.
    pub fn new(access_token: impl Into<SecretString>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_owned(),
            refresh_token: None,
            expiry: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<SecretString>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: OffsetDateTime) -> Self {
        self.expiry = Some(expiry);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// The raw access token. Do not log the result.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose()
    }

    /// `token_type` as returned by the server (`bearer` when absent).
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Scheme for the `Authorization` header.
    ///
    /// `bearer`, `mac` and `basic` are normalized to `Bearer`, `MAC` and
    /// `Basic` in any case; other types pass through unchanged.
    #[must_use]
    pub fn auth_scheme(&self) -> &str {
        let tt = self.token_type.as_str();
        if tt.is_empty() || tt.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else if tt.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if tt.eq_ignore_ascii_case("basic") {
            "Basic"
        } else {
            tt
        }
    }

    /// Refresh token, if the server returned one. Unused by this grant.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(SecretString::expose)
    }

    /// Absolute expiry, `None` when the server sent no `expires_in`.
    #[must_use]
    pub fn expiry(&self) -> Option<OffsetDateTime> {
        self.expiry
    }

    /// Provider-specific response field, e.g. `id_token` or `scope`.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    #[must_use]
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Valid with the default 10 second skew.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_with(DEFAULT_EXPIRY_DELTA)
    }

    /// Non-empty and, when an expiry is known, expiring later than `delta`
    /// from now.
    #[must_use]
    pub fn is_valid_with(&self, delta: Duration) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(OffsetDateTime::now_utc(), delta)
    }

    /// A delta too large to subtract from the expiry counts as expired.
    fn is_expired_at(&self, now: OffsetDateTime, delta: Duration) -> bool {
        let Some(expiry) = self.expiry else {
            return false;
        };
        time::Duration::try_from(delta)
            .ok()
            .and_then(|delta| expiry.checked_sub(delta))
            .is_none_or(|refresh_at| refresh_at <= now)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &self.access_token)
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token)
            .field("expiry", &self.expiry)
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
