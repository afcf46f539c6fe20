use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::Full;
use tower::util::BoxCloneSyncService;

use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;

/// Type-erased service at the top of the client's middleware stack.
///
/// Auth layers receive and return this type, see
/// [`HttpClientBuilder::with_auth_layer`].
pub type HttpService =
    BoxCloneSyncService<Request<Full<Bytes>>, Response<ResponseBody>, HttpError>;

/// HTTP client with a reqwest-like API
///
/// Cloning is cheap; clones share the connection pool. The client is
/// `Send + Sync` so it can be stored directly in shared state.
///
/// ```ignore
/// let client = HttpClient::builder().build()?;
/// let data: MyData = client
///     .get("https://example.com/api")
///     .send()
///     .await?
///     .json()
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: HttpService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        HttpClientBuilder::new().build()
    }

    /// Create a builder for configuring the HTTP client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Create a GET request builder
    ///
    /// The URL must be absolute. `http://` URLs additionally require
    /// [`TransportSecurity::AllowInsecureHttp`].
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Create a request builder for an arbitrary method
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.transport_security,
        )
    }

    /// Maximum buffered response body size for this client.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::HttpClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_client_is_send_sync() {
        assert_send_sync::<HttpClient>();
    }

    #[tokio::test]
    async fn test_get_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/test");
            then.status(200).json_body(json!({"success": true}));
        });

        let client = test_client();
        let body: serde_json::Value = client
            .get(&server.url("/test"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_post_form() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("grant_type=client_credentials&scope=a+b");
            then.status(200).body("ok");
        });

        let client = test_client();
        let text = client
            .post(&server.url("/token"))
            .form(&[("grant_type", "client_credentials"), ("scope", "a b")])
            .unwrap()
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(text, "ok");
        mock.assert();
    }

    #[tokio::test]
    async fn test_non_2xx_is_ok_until_checked() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/error");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"error":"not_found"}"#);
        });

        let client = test_client();
        let resp = client.get(&server.url("/error")).send().await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);

        let err = resp.error_for_status().unwrap_err();
        assert!(matches!(
            err,
            HttpError::HttpStatus {
                status: http::StatusCode::NOT_FOUND,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_body_limit_enforced() {
        let server = MockServer::start();
        let large_body = "x".repeat(2048);
        server.mock(|when, then| {
            when.method(GET).path("/large");
            then.status(200).body(&large_body);
        });

        let client = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .max_body_size(1024)
            .build()
            .unwrap();
        let err = client
            .get(&server.url("/large"))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_client() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/concurrent");
            then.status(200);
        });

        let client = test_client();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            let url = server.url("/concurrent");
            handles.push(tokio::spawn(async move {
                client.get(&url).send().await.map(|r| r.status())
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), http::StatusCode::OK);
        }
        mock.assert_calls(8);
    }
}
