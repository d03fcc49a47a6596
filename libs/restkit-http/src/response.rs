use crate::error::RestError;
use bytes::Bytes;
use http::{HeaderMap, Response};
use http_body_util::BodyExt;
use restkit_errors::APPLICATION_PROBLEM_JSON;

/// Type alias for the boxed response body handed out by the transport.
///
/// Decompression has already been applied when the default transport is used.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Box any response body into [`ResponseBody`].
pub(crate) fn box_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

/// Read the whole body, failing with `BodyTooLarge` once `limit` is exceeded.
pub(crate) async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, RestError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(RestError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(RestError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

/// Media type of the `Content-Type` header without parameters, lowercased.
pub(crate) fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
    match value.parse::<mime::Mime>() {
        Ok(parsed) => Some(parsed.essence_str().to_ascii_lowercase()),
        Err(_) => value
            .split(';')
            .next()
            .map(|essence| essence.trim().to_ascii_lowercase()),
    }
}

pub(crate) fn is_problem_json(headers: &HeaderMap) -> bool {
    media_type(headers).as_deref() == Some(APPLICATION_PROBLEM_JSON)
}

pub(crate) fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
