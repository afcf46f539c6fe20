#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! `OAuth2` client credentials grant for service-to-service calls.
//!
//! # Example
//!
//! ```ignore
//! use ccgrant::{ClientCredential, ClientCredentialsConfig, HttpClientBuilderExt};
//! use ccgrant_http::HttpClientBuilder;
//!
//! let config = ClientCredentialsConfig {
//!     token_endpoint: Some("https://issuer.example.com/oauth/token".parse()?),
//!     client_id: "my-service".into(),
//!     credential: ClientCredential::secret("s3cret"),
//!     scopes: vec!["read".into()],
//!     ..Default::default()
//! };
//!
//! let client = HttpClientBuilder::new()
//!     .with_token_source(config.token_source()?)
//!     .build()?;
//! ```

pub mod http_error;
pub mod oauth2;
pub mod secret;

pub use oauth2::{
    AuthStyle, AuthStyleCache, BearerAuthLayer, ClientAssertionProvider, ClientCredential,
    ClientCredentialsConfig, HttpClientBuilderExt, RetrieveError, StaticAssertion,
    StaticTokenSource, Token, TokenError, TokenExchanger, TokenSource, TokenSupplier,
};
pub use secret::SecretString;
