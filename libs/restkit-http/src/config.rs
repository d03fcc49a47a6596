use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::RestError;

/// Default User-Agent string for REST calls
pub const DEFAULT_USER_AGENT: &str = concat!("restkit-http/", env!("CARGO_PKG_VERSION"));

/// Configuration section read by [`RestClientConfig::from_figment`] callers
/// that have no reason to pick another name.
pub const DEFAULT_CONFIG_KEY: &str = "rest_client";

/// TLS root certificate configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Use Mozilla's root certificates (webpki-roots, no OS dependency)
    #[default]
    WebPki,
    /// Use OS native root certificate store
    Native,
}

/// Transport security configuration
///
/// Controls whether the client enforces TLS or allows insecure HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Require TLS for all connections (HTTPS only) - default and recommended
    #[default]
    TlsOnly,
    /// Allow insecure HTTP connections (for testing with mock servers only)
    AllowInsecureHttp,
}

/// REST client configuration
///
/// Deserializable so that it can live in the application's config file:
///
/// ```yaml
/// rest_client:
///   base_url: "https://api.example.com/v1/"
///   accept_language: "en-GB"
///   request_timeout: "15s"
///   max_redirects: 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestClientConfig {
    /// Base URL that relative request URLs are resolved against (default: none)
    ///
    /// Keep the trailing slash on path prefixes: `https://host/v1/` joined
    /// with `users` gives `https://host/v1/users`.
    pub base_url: Option<Url>,

    /// `Accept-Language` value sent when the caller provides none
    /// (default: derived from the process locale)
    pub accept_language: Option<String>,

    /// User-Agent header value
    pub user_agent: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum size of a buffered body in bytes (default: 10 MB)
    ///
    /// Applies to JSON and error responses and to upload content. Download
    /// streams are not limited.
    pub max_body_size: usize,

    /// Maximum number of redirects to follow; `0` disables following (default: 10)
    pub max_redirects: usize,

    /// Timeout for idle pooled connections (default: 90 seconds)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS root certificate strategy (default: `WebPki`)
    pub tls_roots: TlsRootConfig,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            accept_language: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            max_redirects: 10,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
        }
    }
}

impl RestClientConfig {
    /// Configuration for tests against local mock servers (plain HTTP allowed).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            transport: TransportSecurity::AllowInsecureHttp,
            ..Self::default()
        }
    }

    /// Extract the configuration stored under `key`.
    ///
    /// A missing section yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Config`] if the section exists but does not
    /// match the expected shape.
    pub fn from_figment(figment: &Figment, key: &str) -> Result<Self, RestError> {
        if !figment.contains(key) {
            return Ok(Self::default());
        }
        figment
            .extract_inner::<Self>(key)
            .map_err(|e| RestError::Config(Box::new(e)))
    }
}
