use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::{BoxError, HttpError};

/// Type alias for the boxed response body produced by the service stack.
pub type ResponseBody = http_body_util::combinators::UnsyncBoxBody<Bytes, BoxError>;

/// HTTP response wrapper with body-reading helpers
///
/// Provides a reqwest-like API for reading response bodies:
/// - `resp.error_for_status()?` - Check status without reading body
/// - `resp.bytes().await?` - Read raw bytes (any status)
/// - `resp.json::<T>().await?` - Parse as JSON with status check
///
/// All body reads enforce the configured `max_body_size` limit.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Raw `Content-Type` header value, if present and valid ASCII.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Consume the wrapper and return the inner response.
    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }

    /// Check status and return error for non-2xx responses
    ///
    /// Does NOT read the response body.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::HttpStatus` if the response status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.inner.status().is_success() {
            return Ok(self);
        }

        Err(HttpError::HttpStatus {
            status: self.inner.status(),
            content_type: self.content_type().map(String::from),
        })
    }

    /// Read response body as bytes without status check
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    /// Returns `HttpError::Transport` if the body stream fails.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_body_limited(self.inner.into_body(), self.max_body_size).await
    }

    /// Read response body as text (UTF-8, lossy) with status check
    ///
    /// # Errors
    /// Returns `HttpError::HttpStatus` if status is not 2xx.
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    pub async fn text(self) -> Result<String, HttpError> {
        let body = self.error_for_status()?.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Parse response body as JSON with status check
    ///
    /// # Errors
    /// Returns `HttpError::HttpStatus` if status is not 2xx.
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    /// Returns `HttpError::Json` if parsing fails.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body = self.error_for_status()?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Collect data frames until the stream ends or `limit` would be exceeded.
async fn read_body_limited(mut body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                return Err(HttpError::BodyTooLarge { limit });
            }
            buf.extend_from_slice(&data);
        }
    }
    Ok(buf.freeze())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response(status: StatusCode, content_type: Option<&str>, body: &'static str) -> HttpResponse {
        let mut builder = Response::builder().status(status);
        if let Some(ct) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, ct);
        }
        let body = Full::new(Bytes::from_static(body.as_bytes()))
            .map_err(|never| match never {})
            .boxed_unsync();
        HttpResponse {
            inner: builder.body(body).unwrap(),
            max_body_size: 16,
        }
    }

    #[tokio::test]
    async fn bytes_ignores_status() {
        let resp = response(StatusCode::BAD_REQUEST, None, "nope");
        assert_eq!(resp.bytes().await.unwrap(), Bytes::from_static(b"nope"));
    }

    #[tokio::test]
    async fn bytes_enforces_limit() {
        let resp = response(StatusCode::OK, None, "this body is longer than sixteen bytes");
        let err = resp.bytes().await.unwrap_err();
        assert!(
            matches!(err, HttpError::BodyTooLarge { limit: 16 }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn body_read_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let read = response(StatusCode::OK, None, "ok").bytes();
        assert_send(&read);
    }

    #[tokio::test]
    async fn body_at_exact_limit_is_accepted() {
        let resp = response(StatusCode::OK, None, "sixteen bytes!!!");
        assert_eq!(resp.bytes().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn json_checks_status_first() {
        let resp = response(StatusCode::UNAUTHORIZED, Some("application/json"), "{}");
        let err = resp.json::<serde_json::Value>().await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::HttpStatus { status: StatusCode::UNAUTHORIZED, ref content_type }
                if content_type.as_deref() == Some("application/json")
        ));
    }

    #[tokio::test]
    async fn text_reads_success_body() {
        let resp = response(StatusCode::OK, Some("text/plain"), "hello");
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.text().await.unwrap(), "hello");
    }
}
