use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use ccgrant_http::HttpError;
use http::header::{AUTHORIZATION, HeaderName};
use http::{HeaderValue, Request, Response};
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use zeroize::Zeroizing;

use super::source::TokenSource;

/// Tower layer that attaches the current access token to outbound requests.
///
/// Sets `Authorization: <scheme> <token>` (or a custom header) before
/// forwarding to the inner service. If no token can be obtained the request
/// is not sent and the call fails with [`HttpError::Auth`], whose source is
/// the [`TokenError`](super::error::TokenError).
#[derive(Clone)]
pub struct BearerAuthLayer {
    source: Arc<dyn TokenSource>,
    header_name: HeaderName,
    cancel: CancellationToken,
}

impl std::fmt::Debug for BearerAuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthLayer")
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

impl BearerAuthLayer {
    /// Create a layer that injects `Authorization: <scheme> <token>`.
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self::with_header_name(source, AUTHORIZATION)
    }

    /// Create a layer that injects `<header_name>: <scheme> <token>`.
    pub fn with_header_name(source: impl TokenSource + 'static, header_name: HeaderName) -> Self {
        Self {
            source: Arc::new(source),
            header_name,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort token acquisition for in-flight requests when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            source: Arc::clone(&self.source),
            header_name: self.header_name.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// Service created by [`BearerAuthLayer`].
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    source: Arc<dyn TokenSource>,
    header_name: HeaderName,
    cancel: CancellationToken,
}

impl<S, B, ResBody> Service<Request<B>> for BearerAuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let source = Arc::clone(&self.source);
        let header_name = self.header_name.clone();
        let cancel = self.cancel.clone();

        // Clone-swap pattern (Tower Service contract).
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let token = source
                .token(&cancel)
                .await
                .map_err(|e| HttpError::Auth(Box::new(e)))?;

            let raw = Zeroizing::new(format!("{} {}", token.auth_scheme(), token.access_token()));
            let mut value = HeaderValue::from_str(&raw)?;
            value.set_sensitive(true);
            req.headers_mut().insert(header_name, value);

            inner.call(req).await
        })
    }
}
