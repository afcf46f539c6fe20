use http::header::HeaderName;
use tower::util::BoxCloneSyncService;

use super::layer::BearerAuthLayer;
use super::source::TokenSource;

/// Extension trait for adding token injection to
/// [`ccgrant_http::HttpClientBuilder`].
///
/// # Example
///
/// ```ignore
/// use ccgrant::HttpClientBuilderExt;
///
/// let tokens = config.token_source()?;
/// let client = HttpClientBuilder::new()
///     .with_token_source(tokens)
///     .build()?;
/// ```
pub trait HttpClientBuilderExt {
    /// Add `Authorization: <scheme> <token>` injection to the HTTP client.
    #[must_use]
    fn with_token_source(self, source: impl TokenSource + 'static) -> Self;

    /// Add `<header_name>: <scheme> <token>` injection to the HTTP client.
    #[must_use]
    fn with_token_source_header(
        self,
        source: impl TokenSource + 'static,
        header_name: HeaderName,
    ) -> Self;

    /// Install a preconfigured [`BearerAuthLayer`], e.g. one bound to a
    /// shutdown [`CancellationToken`](tokio_util::sync::CancellationToken).
    #[must_use]
    fn with_token_layer(self, layer: BearerAuthLayer) -> Self;
}

impl HttpClientBuilderExt for ccgrant_http::HttpClientBuilder {
    fn with_token_source(self, source: impl TokenSource + 'static) -> Self {
        install(self, BearerAuthLayer::new(source))
    }

    fn with_token_source_header(
        self,
        source: impl TokenSource + 'static,
        header_name: HeaderName,
    ) -> Self {
        install(self, BearerAuthLayer::with_header_name(source, header_name))
    }

    fn with_token_layer(self, layer: BearerAuthLayer) -> Self {
        install(self, layer)
    }
}

fn install(
    builder: ccgrant_http::HttpClientBuilder,
    layer: BearerAuthLayer,
) -> ccgrant_http::HttpClientBuilder {
    builder.with_auth_layer(move |svc| {
        BoxCloneSyncService::new(tower::ServiceBuilder::new().layer(layer).service(svc))
    })
}
