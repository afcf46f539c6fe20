#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP client infrastructure for `ccgrant`
//!
//! This crate provides a hyper-based HTTP client with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - Configurable per-request timeouts
//! - User-Agent header injection
//! - Bounded response body reads
//! - A hook for an outermost auth layer
//!
//! # Example
//!
//! ```ignore
//! use ccgrant_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .user_agent("my-app/1.0")
//!     .build()?;
//!
//! let data: MyData = client
//!     .get("https://example.com/api")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;

pub use builder::HttpClientBuilder;
pub use client::{HttpClient, HttpService};
pub use config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, HttpClientConfig, TransportSecurity};
pub use error::{BoxError, HttpError};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};
