/// Format a [`ccgrant_http::HttpError`] into a message with a context prefix.
///
/// This is the single place that matches on `HttpError` for token
/// acquisition. `HttpStatus` renders only the status code; response bodies
/// are never included.
#[must_use]
pub fn format_http_error(e: &ccgrant_http::HttpError, prefix: &str) -> String {
    use ccgrant_http::HttpError;

    match e {
        HttpError::HttpStatus { status, .. } => format!("{prefix} HTTP {status}"),
        HttpError::Json(err) => format!("{prefix} JSON parse failed: {err}"),
        HttpError::Timeout(duration) => {
            format!("{prefix} request timed out after {duration:?}")
        }
        HttpError::Transport(err) => format!("{prefix} transport error: {err}"),
        HttpError::BodyTooLarge { limit } => {
            format!("{prefix} response too large: limit {limit} bytes")
        }
        HttpError::Tls(err) => format!("{prefix} TLS error: {err}"),
        HttpError::RequestBuild(err) => format!("{prefix} request build failed: {err}"),
        HttpError::InvalidHeaderName(err) => format!("{prefix} invalid header name: {err}"),
        HttpError::InvalidHeaderValue(err) => format!("{prefix} invalid header value: {err}"),
        HttpError::FormEncode(err) => format!("{prefix} form encode error: {err}"),
        HttpError::Auth(err) => format!("{prefix} credentials unavailable: {err}"),
        HttpError::InvalidUri { url, reason } => {
            format!("{prefix} invalid URL '{url}': {reason}")
        }
        HttpError::InvalidScheme { scheme, reason } => {
            format!("{prefix} invalid scheme '{scheme}': {reason}")
        }
        // Unknown variants may carry sensitive Display output
        _ => format!("{prefix} request failed"),
    }
}
