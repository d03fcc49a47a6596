use std::time::Duration;

use bytes::Bytes;
use http::HeaderValue;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::decompression::DecompressionLayer;
use tower_http::follow_redirect::FollowRedirectLayer;
use tower_http::follow_redirect::policy::Limited;
use url::Url;

use crate::client::RestClient;
use crate::config::{RestClientConfig, TlsRootConfig, TransportSecurity};
use crate::error::RestError;
use crate::headers::current_language;
use crate::layers::DefaultHeaderLayer;
use crate::tls;
use crate::transport::{HttpTransport, into_transport};

/// Builder for a [`RestClient`] backed by the default hyper transport.
#[derive(Debug, Clone, Default)]
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Resolve relative request URLs against `base_url`.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    /// Fixed `Accept-Language` value instead of the process locale.
    #[must_use]
    pub fn accept_language(mut self, language: impl Into<String>) -> Self {
        self.config.accept_language = Some(language.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the maximum buffered body size, for responses and uploads
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set the maximum number of redirects to follow; `0` returns 3xx
    /// responses as they are.
    #[must_use]
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn no_redirects(self) -> Self {
        self.max_redirects(0)
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    #[must_use]
    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// Set transport security mode
    ///
    /// Use `TransportSecurity::AllowInsecureHttp` only for testing with mock servers.
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow plain `http://` URLs (for testing only)
    ///
    /// Only available in debug builds or with the `allow-insecure-http`
    /// feature, so release binaries cannot enable it by accident.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails, or if the user agent
    /// or accept language is not a valid header value.
    pub fn build(self) -> Result<RestClient, RestError> {
        let config = self.config;

        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let accept_language = match &config.accept_language {
            Some(language) => HeaderValue::try_from(language.as_str())?,
            None => HeaderValue::try_from(current_language())?,
        };
        let transport = build_transport(&config)?;

        tracing::debug!(
            base_url = config.base_url.as_ref().map(Url::as_str),
            accept_language = ?accept_language,
            timeout = ?config.request_timeout,
            "REST client built"
        );

        Ok(RestClient {
            transport,
            base_url: config.base_url,
            accept_language,
            max_body_size: config.max_body_size,
            transport_security: config.transport,
            cancellation: None,
        })
    }
}

/// Compose the default tower stack over a pooled hyper client.
///
/// Request flow (outer → inner):
///   Timeout → User-Agent → Decompression → FollowRedirect → hyper client
fn build_transport(config: &RestClientConfig) -> Result<HttpTransport, RestError> {
    let timeout = config.request_timeout;
    let https = tls::https_connector(config.tls_roots, config.transport)?;

    let mut client_builder = Client::builder(TokioExecutor::new());
    // pool_idle_timeout has no effect without a pool timer
    client_builder
        .pool_timer(TokioTimer::new())
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .http2_only(false);
    if let Some(idle_timeout) = config.pool_idle_timeout {
        client_builder.pool_idle_timeout(idle_timeout);
    }
    let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

    let service = ServiceBuilder::new()
        .layer(TimeoutLayer::new(timeout))
        .layer(DefaultHeaderLayer::user_agent(&config.user_agent)?)
        .layer(DecompressionLayer::new())
        .layer(FollowRedirectLayer::with_policy(Limited::new(
            config.max_redirects,
        )))
        .service(hyper_client);

    let service = tower::ServiceExt::map_err(service, move |e: tower::BoxError| {
        map_tower_error(e, timeout)
    });
    Ok(into_transport(service))
}

fn map_tower_error(err: tower::BoxError, timeout: Duration) -> RestError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return RestError::Timeout(timeout);
    }
    RestError::from_boxed(err)
}
