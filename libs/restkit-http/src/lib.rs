#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed REST helpers over a tower HTTP transport
//!
//! [`RestClient`] wraps GET, POST, PUT, PATCH, DELETE, multipart upload and
//! streaming download behind typed methods that:
//! - Serialize request bodies to JSON (`None` sends no content)
//! - Add an `Accept-Language` header derived from the process locale
//! - Decode JSON responses into the caller's type
//! - Report every outcome as an [`ApiResult`], never as `Err` or a panic
//!
//! Non-2xx responses become failures with the real status. Bodies sent as
//! `application/problem+json` are parsed into a [`Problem`]; any other body
//! is kept verbatim as the failure detail. Faults raised before a response
//! exists are failures with status 500.
//!
//! The default transport is a pooled hyper client with rustls, request
//! timeout, `User-Agent`, transparent decompression and bounded redirect
//! following. Any tower service can be plugged in with
//! [`RestClient::from_service`].
//!
//! # Example
//!
//! ```ignore
//! use restkit_http::{ApiRequest, ApiResponse, ApiResult, RestClient};
//!
//! #[derive(serde::Serialize)]
//! #[serde(rename_all = "camelCase")]
//! struct NewUser { display_name: String }
//! impl ApiRequest for NewUser {}
//!
//! #[derive(serde::Deserialize)]
//! struct User { id: u64 }
//! impl ApiResponse for User {}
//!
//! let client = RestClient::builder()
//!     .base_url("https://api.example.com/v1/".parse()?)
//!     .build()?;
//!
//! let created: ApiResult<User> = client
//!     .post("users", Some(&NewUser { display_name: "Ada".into() }))
//!     .await;
//! if let Some(errors) = created.problem().and_then(|p| p.errors.as_ref()) {
//!     for e in errors {
//!         eprintln!("{}: {}", e.field, e.message);
//!     }
//! }
//! ```

mod builder;
mod client;
mod config;
mod content;
mod contract;
mod download;
mod error;
mod headers;
mod layers;
mod response;
#[cfg(test)]
mod test_log;
mod tls;
mod transport;
mod upload;

pub use builder::RestClientBuilder;
pub use client::RestClient;
pub use config::{
    DEFAULT_CONFIG_KEY, DEFAULT_USER_AGENT, RestClientConfig, TlsRootConfig, TransportSecurity,
};
pub use contract::{ApiRequest, ApiResponse};
pub use download::DownloadResponse;
pub use error::{InvalidUriKind, RestError};
pub use headers::{ANY_LANGUAGE, current_language};
pub use layers::{DefaultHeaderLayer, DefaultHeaderService};
pub use response::ResponseBody;
pub use transport::{HttpTransport, RequestBody};
pub use upload::{UploadContent, UploadRequest};

pub use restkit_errors::{
    APPLICATION_PROBLEM_JSON, ApiResult, FailureKind, Problem, ValidationViolation,
};

// Tokens are part of `RestClient::with_cancellation`.
pub use tokio_util::sync::CancellationToken;
