use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::TokenError;
use super::token::Token;

/// Anything that can hand out an access token.
///
/// Implemented by [`TokenExchanger`](super::exchange::TokenExchanger)
/// (one exchange per call), [`TokenSupplier`](super::supplier::TokenSupplier)
/// (cached) and [`StaticTokenSource`].
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token that was valid when handed out.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Cancelled`] when `cancel` fires, or whatever
    /// error prevented obtaining a token.
    async fn token(&self, cancel: &CancellationToken) -> Result<Arc<Token>, TokenError>;
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    async fn token(&self, cancel: &CancellationToken) -> Result<Arc<Token>, TokenError> {
        (**self).token(cancel).await
    }
}

/// Always returns the same token and never refreshes it.
#[derive(Clone, Debug)]
pub struct StaticTokenSource {
    token: Arc<Token>,
}

impl StaticTokenSource {
    #[must_use]
    pub fn new(token: Token) -> Self {
        Self {
            token: Arc::new(token),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self, _cancel: &CancellationToken) -> Result<Arc<Token>, TokenError> {
        Ok(Arc::clone(&self.token))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_returns_same_token() {
        let source = StaticTokenSource::new(Token::new("fixed"));
        let cancel = CancellationToken::new();

        let a = source.token(&cancel).await.unwrap();
        let b = source.token(&cancel).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.access_token(), "fixed");
    }

    #[tokio::test]
    async fn arc_dyn_source_delegates() {
        let source: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::new(Token::new("dyn")));
        let token = source.token(&CancellationToken::new()).await.unwrap();
        assert_eq!(token.access_token(), "dyn");
    }
}
