use crate::error::RestError;
use http::header::HeaderName;
use http::{HeaderValue, Request, Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that sets a header on every request that does not already
/// carry it. The default transport uses it for `User-Agent`.
#[derive(Clone)]
pub struct DefaultHeaderLayer {
    name: HeaderName,
    value: HeaderValue,
}

impl DefaultHeaderLayer {
    /// # Errors
    /// Returns `RestError::InvalidHeaderValue` if `value` is not a valid header value
    pub fn try_new(name: HeaderName, value: impl AsRef<str>) -> Result<Self, RestError> {
        let value = HeaderValue::from_str(value.as_ref())?;
        Ok(Self { name, value })
    }

    /// # Errors
    /// Returns `RestError::InvalidHeaderValue` if `user_agent` is not a valid header value
    pub fn user_agent(user_agent: impl AsRef<str>) -> Result<Self, RestError> {
        Self::try_new(http::header::USER_AGENT, user_agent)
    }
}

impl<S> Layer<S> for DefaultHeaderLayer {
    type Service = DefaultHeaderService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeaderService {
            inner,
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DefaultHeaderService<S> {
    inner: S,
    name: HeaderName,
    value: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeaderService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        if !req.headers().contains_key(&self.name) {
            req.headers_mut()
                .insert(self.name.clone(), self.value.clone());
        }
        self.inner.call(req)
    }
}
