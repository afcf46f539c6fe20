use http::StatusCode;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::error::{RetrieveError, TokenError};
use super::token::Token;

/// Fields that never end up in [`Token::extras`].
const TOKEN_FIELDS: [&str; 2] = ["access_token", "refresh_token"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFormat {
    Json,
    Form,
}

/// Pick a parser from the declared media type, sniffing the body when the
/// type is missing or unknown.
pub(crate) fn detect_format(content_type: Option<&str>, body: &[u8]) -> BodyFormat {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mt| mt.trim().to_ascii_lowercase());

    match media_type.as_deref() {
        Some("application/json") => BodyFormat::Json,
        Some(mt) if mt.ends_with("+json") => BodyFormat::Json,
        Some("application/x-www-form-urlencoded" | "text/plain") => BodyFormat::Form,
        _ => {
            let first = body.iter().find(|b| !b.is_ascii_whitespace());
            if first == Some(&b'{') {
                BodyFormat::Json
            } else {
                BodyFormat::Form
            }
        }
    }
}

/// Flat view of a response body with string-valued lookups.
struct Fields {
    map: Map<String, Value>,
    format: BodyFormat,
}

impl Fields {
    fn parse(format: BodyFormat, body: &[u8]) -> Result<Self, String> {
        let map = match format {
            BodyFormat::Json => serde_json::from_slice::<Map<String, Value>>(body)
                .map_err(|e| format!("cannot parse JSON body: {e}"))?,
            BodyFormat::Form => {
                let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
                    .map_err(|e| format!("cannot parse form body: {e}"))?;
                let mut map = Map::new();
                for (k, v) in pairs {
                    map.entry(k).or_insert(Value::String(v));
                }
                map
            }
        };
        Ok(Self { map, format })
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }

    /// `expires_in` in seconds, clamped to the `i32` range.
    ///
    /// JSON accepts a number or a numeric string and rejects anything else.
    /// Form values that do not parse are ignored.
    fn expires_in(&self) -> Result<Option<i64>, TokenError> {
        let Some(value) = self.map.get("expires_in") else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match (parsed, self.format) {
            (Some(secs), _) => Ok(Some(secs.clamp(i64::from(i32::MIN), i64::from(i32::MAX)))),
            (None, BodyFormat::Form) => Ok(None),
            (None, BodyFormat::Json) => Err(TokenError::Protocol(format!(
                "expires_in is not an integer: {value}"
            ))),
        }
    }

    fn into_retrieve_error(self, status: StatusCode, body: &[u8]) -> RetrieveError {
        RetrieveError {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
            error_code: self.string("error").map(String::from),
            error_description: self.string("error_description").map(String::from),
            error_uri: self.string("error_uri").map(String::from),
        }
    }
}

/// Turn a non-2xx response into a [`RetrieveError`], parsing the OAuth2
/// error fields on a best-effort basis.
pub(crate) fn parse_error_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> RetrieveError {
    let format = detect_format(content_type, body);
    match Fields::parse(format, body) {
        Ok(fields) => fields.into_retrieve_error(status, body),
        Err(_) => RetrieveError {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
            error_code: None,
            error_description: None,
            error_uri: None,
        },
    }
}

/// Parse a 2xx token response received at `received_at`.
///
/// # Errors
///
/// - [`TokenError::Retrieve`] if the body has no token but carries an `error`.
/// - [`TokenError::Protocol`] if the body cannot be parsed, `access_token`
///   is missing or empty, or `expires_in` is malformed.
pub(crate) fn parse_token_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
    received_at: OffsetDateTime,
) -> Result<Token, TokenError> {
    let format = detect_format(content_type, body);
    let fields = Fields::parse(format, body).map_err(TokenError::Protocol)?;

    let access_token = match fields.map.get("access_token") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) | None => {
            if fields.string("error").is_some() {
                return Err(fields.into_retrieve_error(status, body).into());
            }
            return Err(TokenError::Protocol(
                "server response missing access_token".into(),
            ));
        }
        Some(_) => {
            return Err(TokenError::Protocol(
                "access_token is not a string".into(),
            ));
        }
    };

    let token_type = fields
        .string("token_type")
        .filter(|tt| !tt.is_empty())
        .unwrap_or("bearer")
        .to_owned();
    let refresh_token = fields
        .string("refresh_token")
        .filter(|rt| !rt.is_empty())
        .map(String::from);
    let expires_in = fields.expires_in()?;

    let mut extra = fields.map;
    for key in TOKEN_FIELDS {
        extra.remove(key);
    }

    let mut token = Token::new(access_token)
        .with_token_type(token_type)
        .with_extra(extra);
    if let Some(rt) = refresh_token {
        token = token.with_refresh_token(rt);
    }
    if let Some(secs) = expires_in.filter(|s| *s != 0) {
        token = token.with_expiry(received_at + time::Duration::seconds(secs));
    }
    Ok(token)
}
