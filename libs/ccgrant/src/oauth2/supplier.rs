use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::config::ClientCredentialsConfig;
use super::error::TokenError;
use super::exchange::TokenExchanger;
use super::source::TokenSource;
use super::token::Token;

struct SupplierInner {
    source: Arc<dyn TokenSource>,
    cached: ArcSwapOption<Token>,
    /// Serializes refreshes so concurrent callers share one exchange.
    refresh: Mutex<()>,
    expiry_delta: Duration,
}

/// Caching token supplier with on-demand refresh.
///
/// Reads of a valid cached token are lock-free (`ArcSwap`). When the cache
/// is empty or within `expiry_delta` of expiring, one caller performs the
/// exchange while the others wait for its result. A failed refresh empties
/// the cache and returns the error; the next call tries again.
///
/// `TokenSupplier` is [`Clone`] + [`Send`] + [`Sync`]; clones share the cache.
#[derive(Clone)]
pub struct TokenSupplier {
    inner: Arc<SupplierInner>,
}

impl fmt::Debug for TokenSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSupplier")
            .field("cached", &self.inner.cached.load().is_some())
            .field("expiry_delta", &self.inner.expiry_delta)
            .finish_non_exhaustive()
    }
}

impl TokenSupplier {
    /// Supplier backed by a [`TokenExchanger`] for `config`.
    ///
    /// No token is fetched until the first call to [`token`](Self::token).
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ClientCredentialsConfig) -> Result<Self, TokenError> {
        let expiry_delta = config.expiry_delta;
        let exchanger = TokenExchanger::new(config)?;
        Ok(Self::from_source(exchanger, expiry_delta))
    }

    /// Cache tokens produced by any `source`.
    pub fn from_source(source: impl TokenSource + 'static, expiry_delta: Duration) -> Self {
        Self {
            inner: Arc::new(SupplierInner {
                source: Arc::new(source),
                cached: ArcSwapOption::empty(),
                refresh: Mutex::new(()),
                expiry_delta,
            }),
        }
    }

    /// Start from an already-issued token; the source is used once it expires.
    #[must_use]
    pub fn with_initial_token(self, token: Token) -> Self {
        self.inner.cached.store(Some(Arc::new(token)));
        self
    }

    /// Return the cached token if still valid, otherwise exchange for a new one.
    ///
    /// # Errors
    ///
    /// Returns the source's error when a refresh fails, or
    /// [`TokenError::Cancelled`] if `cancel` fires while waiting.
    pub async fn token(&self, cancel: &CancellationToken) -> Result<Arc<Token>, TokenError> {
        if let Some(token) = self.fresh() {
            tracing::trace!("token cache hit");
            return Ok(token);
        }

        let _guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TokenError::Cancelled),
            guard = self.inner.refresh.lock() => guard,
        };

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        tracing::debug!("refreshing token");
        match self.inner.source.token(cancel).await {
            Ok(token) => {
                self.inner.cached.store(Some(Arc::clone(&token)));
                Ok(token)
            }
            Err(e) => {
                self.inner.cached.store(None);
                if !matches!(e, TokenError::Cancelled) {
                    tracing::warn!(error = %e, "token refresh failed");
                }
                Err(e)
            }
        }
    }

    /// Currently cached token without any network I/O, valid or not.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<Token>> {
        self.inner.cached.load_full()
    }

    /// Drop the cached token so the next call exchanges again, e.g. after a
    /// downstream `401`.
    pub fn invalidate(&self) {
        tracing::debug!("token invalidated");
        self.inner.cached.store(None);
    }

    fn fresh(&self) -> Option<Arc<Token>> {
        self.inner
            .cached
            .load_full()
            .filter(|t| t.is_valid_with(self.inner.expiry_delta))
    }
}

#[async_trait]
impl TokenSource for TokenSupplier {
    async fn token(&self, cancel: &CancellationToken) -> Result<Arc<Token>, TokenError> {
        TokenSupplier::token(self, cancel).await
    }
}
