//! `OAuth2` client credentials grant (RFC 6749 §4.4).
//!
//! [`ClientCredentialsConfig`] describes the client. [`TokenExchanger`]
//! performs one exchange per call, [`TokenSupplier`] caches and refreshes,
//! and [`HttpClientBuilderExt`] wires a [`TokenSource`] into an outbound
//! [`ccgrant_http::HttpClient`].

pub mod auth_style;
pub mod builder_ext;
pub mod config;
pub mod error;
pub mod exchange;
pub mod layer;
pub mod request;
pub(crate) mod response;
pub mod source;
pub mod supplier;
pub mod token;
pub mod types;

pub use auth_style::AuthStyleCache;
pub use builder_ext::HttpClientBuilderExt;
pub use config::ClientCredentialsConfig;
pub use error::{RetrieveError, TokenError};
pub use exchange::TokenExchanger;
pub use layer::{BearerAuthLayer, BearerAuthService};
pub use request::{BasicCredentials, TokenRequest, build_token_request};
pub use source::{StaticTokenSource, TokenSource};
pub use supplier::TokenSupplier;
pub use token::{DEFAULT_EXPIRY_DELTA, Token};
pub use types::{
    AuthStyle, ClientAssertionProvider, ClientCredential, JWT_BEARER_ASSERTION_TYPE,
    StaticAssertion,
};
