//! The transport seam.
//!
//! The pipeline sends through a type-erased tower service. The default one
//! is built by [`RestClientBuilder`](crate::RestClientBuilder) on top of
//! hyper; anything else with the same request/response shape can be
//! injected through [`RestClient::from_service`](crate::RestClient::from_service).

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;

use crate::error::RestError;
use crate::response::{ResponseBody, box_response};

/// Body type of outgoing requests.
pub type RequestBody = Full<Bytes>;

/// Type-erased, cloneable, shareable transport.
pub type HttpTransport = BoxCloneSyncService<Request<RequestBody>, Response<ResponseBody>, RestError>;

/// Erase a tower service into an [`HttpTransport`].
pub(crate) fn into_transport<S, B>(service: S) -> HttpTransport
where
    S: tower::Service<Request<RequestBody>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Error: Into<tower::BoxError>,
    S::Future: Send + 'static,
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let service = service
        .map_response(box_response)
        .map_err(|e| RestError::from_boxed(e.into()));
    BoxCloneSyncService::new(service)
}
