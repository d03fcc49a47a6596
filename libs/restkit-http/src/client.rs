use std::future::Future;

use bytes::Bytes;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use restkit_errors::{ApiResult, Problem};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use url::Url;

use crate::builder::RestClientBuilder;
use crate::config::TransportSecurity;
use crate::content::RequestContent;
use crate::contract::{ApiRequest, ApiResponse};
use crate::download::DownloadResponse;
use crate::error::{InvalidUriKind, RestError};
use crate::headers::{ANY_LANGUAGE, apply_headers, current_language};
use crate::response::{ResponseBody, is_problem_json, read_body_limited};
use crate::transport::{HttpTransport, RequestBody, into_transport};
use crate::upload::UploadRequest;

/// Typed REST helper.
///
/// Every verb returns an [`ApiResult`]; no call returns `Err` or panics.
/// Non-2xx responses become failures carrying the real status, and faults
/// raised before a response exists (invalid URL, network, timeout,
/// decoding) become failures with status 500.
///
/// `RestClient` is `Clone + Send + Sync`. Clones share the transport and its
/// connection pool.
///
/// ```ignore
/// let client = RestClient::builder()
///     .base_url("https://api.example.com/v1/".parse()?)
///     .build()?;
///
/// let order: ApiResult<Order> = client.get("orders/42").await;
/// match order.into_result() {
///     Ok(Some(order)) => println!("{}", order.id),
///     Ok(None) => println!("no content"),
///     Err(problem) => eprintln!("{}: {}", problem.title, problem.detail),
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    pub(crate) transport: HttpTransport,
    pub(crate) base_url: Option<Url>,
    pub(crate) accept_language: HeaderValue,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("accept_language", &self.accept_language)
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of the status check shared by all verbs.
enum Dispatched<T> {
    /// 2xx other than 204: the body still has to be decoded.
    Success(Response<ResponseBody>),
    /// Final result that needs no decoding (204 or non-2xx).
    Settled(ApiResult<T>),
}

impl RestClient {
    /// Create a client with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, RestError> {
        RestClientBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    /// Send through a caller-supplied transport instead of the default
    /// hyper stack.
    ///
    /// The transport owns connection security, so both `http` and `https`
    /// URLs are passed through. Timeouts, redirects and the user agent are
    /// also up to the transport.
    pub fn from_service<S, B>(service: S) -> Self
    where
        S: tower::Service<Request<RequestBody>, Response = Response<B>>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Error: Into<tower::BoxError>,
        S::Future: Send + 'static,
        B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let accept_language = HeaderValue::try_from(current_language())
            .unwrap_or_else(|_| HeaderValue::from_static(ANY_LANGUAGE));
        Self {
            transport: into_transport(service),
            base_url: None,
            accept_language,
            max_body_size: crate::config::RestClientConfig::default().max_body_size,
            transport_security: TransportSecurity::AllowInsecureHttp,
            cancellation: None,
        }
    }

    /// Resolve relative request URLs against `base_url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// `Accept-Language` sent when the caller provides none.
    #[must_use]
    pub fn with_accept_language(mut self, language: HeaderValue) -> Self {
        self.accept_language = language;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Handle whose calls stop as soon as `token` is cancelled.
    ///
    /// A cancelled call yields a failure with status 500 for which
    /// [`ApiResult::is_cancelled`] is true. Dropping the returned future
    /// cancels the call as well.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    pub async fn get<R: ApiResponse>(&self, url: &str) -> ApiResult<R> {
        self.get_with_headers(url, &[]).await
    }

    pub async fn get_with_headers<R: ApiResponse>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        self.execute(Method::GET, url, headers, no_content(), decode_json::<R>)
            .await
    }

    /// POST `body` as JSON. `None` sends no content.
    pub async fn post<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<R> {
        self.post_with_headers(url, body, &[]).await
    }

    pub async fn post_with_headers<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        self.execute(Method::POST, url, headers, json_content(body), decode_json::<R>)
            .await
    }

    pub async fn put<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<R> {
        self.put_with_headers(url, body, &[]).await
    }

    pub async fn put_with_headers<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        self.execute(Method::PUT, url, headers, json_content(body), decode_json::<R>)
            .await
    }

    pub async fn patch<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<R> {
        self.patch_with_headers(url, body, &[]).await
    }

    pub async fn patch_with_headers<B: ApiRequest, R: ApiResponse>(
        &self,
        url: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        self.execute(Method::PATCH, url, headers, json_content(body), decode_json::<R>)
            .await
    }

    pub async fn delete<R: ApiResponse>(&self, url: &str) -> ApiResult<R> {
        self.delete_with_headers(url, &[]).await
    }

    pub async fn delete_with_headers<R: ApiResponse>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        self.execute(Method::DELETE, url, headers, no_content(), decode_json::<R>)
            .await
    }

    /// POST one file as `multipart/form-data`.
    pub async fn upload<R: ApiResponse>(&self, url: &str, request: UploadRequest) -> ApiResult<R> {
        self.upload_with_headers(url, request, &[]).await
    }

    pub async fn upload_with_headers<R: ApiResponse>(
        &self,
        url: &str,
        request: UploadRequest,
        headers: &[(&str, &str)],
    ) -> ApiResult<R> {
        let limit = self.max_body_size;
        let content = async move { request.into_content(limit).await.map(Some) };
        self.execute(Method::POST, url, headers, content, decode_json::<R>)
            .await
    }

    /// GET a file. The body is handed over unread inside the
    /// [`DownloadResponse`].
    pub async fn download(&self, url: &str) -> ApiResult<DownloadResponse> {
        self.download_with_headers(url, &[]).await
    }

    pub async fn download_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> ApiResult<DownloadResponse> {
        self.execute(Method::GET, url, headers, no_content(), decode_download)
            .await
    }

    /// Run one call through the pipeline and fold every error into the result.
    async fn execute<T, C, D, F>(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        content: C,
        decode: D,
    ) -> ApiResult<T>
    where
        C: Future<Output = Result<Option<RequestContent>, RestError>>,
        D: FnOnce(Response<ResponseBody>, usize) -> F,
        F: Future<Output = Result<ApiResult<T>, RestError>>,
    {
        let call = self.run(&method, url, headers, content, decode);

        let outcome = match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(RestError::Cancelled),
                outcome = call => outcome,
            },
            None => call.await,
        };

        settle(&method, url, outcome)
    }

    async fn run<T, C, D, F>(
        &self,
        method: &Method,
        url: &str,
        headers: &[(&str, &str)],
        content: C,
        decode: D,
    ) -> Result<ApiResult<T>, RestError>
    where
        C: Future<Output = Result<Option<RequestContent>, RestError>>,
        D: FnOnce(Response<ResponseBody>, usize) -> F,
        F: Future<Output = Result<ApiResult<T>, RestError>>,
    {
        let content = content.await?;
        let response = self.send(method, url, headers, content).await?;
        match check_status(response, self.max_body_size).await? {
            Dispatched::Settled(result) => Ok(result),
            Dispatched::Success(response) => decode(response, self.max_body_size).await,
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        headers: &[(&str, &str)],
        content: Option<RequestContent>,
    ) -> Result<Response<ResponseBody>, RestError> {
        let uri = self.resolve_url(url)?;
        let mut request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(RequestBody::default())?;

        apply_headers(request.headers_mut(), headers, &self.accept_language)?;
        if let Some(content) = content {
            content.attach(&mut request);
        }

        tracing::debug!(%method, uri = %request.uri(), "sending REST request");
        let response = self.transport.clone().oneshot(request).await?;
        tracing::debug!(%method, url, status = %response.status(), "REST response received");
        Ok(response)
    }

    /// Turn `url` into an absolute URI the transport may use.
    fn resolve_url(&self, url: &str) -> Result<http::Uri, RestError> {
        let resolved = match Url::parse(url) {
            Ok(absolute) => absolute,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let Some(base) = &self.base_url else {
                    return Err(RestError::InvalidUri {
                        url: url.to_owned(),
                        kind: InvalidUriKind::MissingBaseUrl,
                        reason: "relative URL and no base URL configured".to_owned(),
                    });
                };
                base.join(url).map_err(|e| invalid_url(url, &e))?
            }
            Err(e) => return Err(invalid_url(url, &e)),
        };

        match resolved.scheme() {
            "https" => {}
            "http" => {
                if self.transport_security == TransportSecurity::TlsOnly {
                    return Err(RestError::InvalidScheme {
                        scheme: "http".to_owned(),
                        reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                    });
                }
            }
            scheme => {
                return Err(RestError::InvalidScheme {
                    scheme: scheme.to_owned(),
                    reason: "only http:// and https:// schemes are supported".to_owned(),
                });
            }
        }

        if !resolved.has_host() {
            return Err(RestError::InvalidUri {
                url: url.to_owned(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        resolved
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| RestError::InvalidUri {
                url: url.to_owned(),
                kind: InvalidUriKind::ParseError,
                reason: e.to_string(),
            })
    }
}

fn invalid_url(url: &str, err: &url::ParseError) -> RestError {
    RestError::InvalidUri {
        url: url.to_owned(),
        kind: InvalidUriKind::ParseError,
        reason: err.to_string(),
    }
}

async fn no_content() -> Result<Option<RequestContent>, RestError> {
    Ok(None)
}

async fn json_content<B: ApiRequest>(body: Option<&B>) -> Result<Option<RequestContent>, RestError> {
    RequestContent::json(body)
}

/// 204 and non-2xx responses are final here; other 2xx responses go on to
/// decoding.
async fn check_status<T>(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Dispatched<T>, RestError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Dispatched::Settled(ApiResult::empty(status)));
    }
    if status.is_success() {
        return Ok(Dispatched::Success(response));
    }

    let problem_json = is_problem_json(response.headers());
    let body = read_body_limited(response, limit).await?;
    if problem_json {
        match Problem::from_response_body(status, &body) {
            Ok(problem) => return Ok(Dispatched::Settled(ApiResult::from_problem(status, problem))),
            Err(e) => {
                tracing::debug!(%status, error = %e, "malformed problem details body, keeping raw text");
            }
        }
    }
    Ok(Dispatched::Settled(ApiResult::unstructured(
        status,
        String::from_utf8_lossy(&body),
    )))
}

/// Empty bodies and JSON `null` are successes without a value.
async fn decode_json<R: DeserializeOwned>(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<ApiResult<R>, RestError> {
    let status = response.status();
    let body = read_body_limited(response, limit).await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApiResult::empty(status));
    }
    Ok(match serde_json::from_slice::<Option<R>>(&body)? {
        Some(value) => ApiResult::ok(status, value),
        None => ApiResult::empty(status),
    })
}

async fn decode_download(
    response: Response<ResponseBody>,
    _limit: usize,
) -> Result<ApiResult<DownloadResponse>, RestError> {
    let status = response.status();
    let (parts, body) = response.into_parts();
    Ok(ApiResult::ok(
        status,
        DownloadResponse::from_parts(&parts.headers, body),
    ))
}

fn settle<T>(method: &Method, url: &str, outcome: Result<ApiResult<T>, RestError>) -> ApiResult<T> {
    match outcome {
        Ok(result) => result,
        Err(RestError::Cancelled) => {
            tracing::debug!(%method, url, "REST request cancelled");
            ApiResult::cancelled(RestError::Cancelled.to_string())
        }
        Err(err) => {
            tracing::warn!(%method, url, error = %err, "REST request failed");
            ApiResult::transport_failure(err.to_string())
        }
    }
}
