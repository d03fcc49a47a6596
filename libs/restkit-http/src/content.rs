//! Request bodies: JSON documents and `multipart/form-data` forms.

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::Request;
use rand::Rng;
use serde::Serialize;

use crate::error::RestError;
use crate::transport::RequestBody;

const APPLICATION_JSON: &str = "application/json";

/// Encoded request body together with its content type.
#[derive(Debug, Clone)]
pub(crate) struct RequestContent {
    content_type: HeaderValue,
    body: Bytes,
}

impl RequestContent {
    /// Serialize `body` as JSON.
    ///
    /// `None`, and values that serialize to JSON `null`, produce no content.
    pub(crate) fn json<B>(body: Option<&B>) -> Result<Option<Self>, RestError>
    where
        B: Serialize + ?Sized,
    {
        let Some(body) = body else {
            return Ok(None);
        };
        let bytes = serde_json::to_vec(body)?;
        if bytes == b"null" {
            return Ok(None);
        }
        Ok(Some(Self {
            content_type: HeaderValue::from_static(APPLICATION_JSON),
            body: Bytes::from(bytes),
        }))
    }

    #[cfg(test)]
    pub(crate) fn body(&self) -> &Bytes {
        &self.body
    }

    #[cfg(test)]
    pub(crate) fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    /// Attach to `request`, setting `Content-Type` unless the caller already did.
    pub(crate) fn attach(self, request: &mut Request<RequestBody>) {
        request
            .headers_mut()
            .entry(CONTENT_TYPE)
            .or_insert(self.content_type);
        *request.body_mut() = RequestBody::new(self.body);
    }
}

/// `multipart/form-data` encoder (RFC 7578).
pub(crate) struct MultipartForm {
    boundary: String,
    body: BytesMut,
}

impl MultipartForm {
    pub(crate) fn new() -> Self {
        let mut rng = rand::rng();
        let boundary = format!(
            "restkit-{:016x}{:016x}",
            rng.random::<u64>(),
            rng.random::<u64>()
        );
        Self {
            boundary,
            body: BytesMut::new(),
        }
    }

    /// Append one part. `file_name` adds the `filename` parameter and
    /// `content_type` the part's `Content-Type` header.
    pub(crate) fn part(
        &mut self,
        name: &str,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) {
        let mut head = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"",
            self.boundary,
            escape_quoted(name)
        );
        if let Some(file_name) = file_name {
            head.push_str("; filename=\"");
            head.push_str(&escape_quoted(file_name));
            head.push('"');
        }
        head.push_str("\r\n");
        if let Some(content_type) = content_type {
            head.push_str("Content-Type: ");
            head.push_str(content_type);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        self.body.put_slice(head.as_bytes());
        self.body.put_slice(data);
        self.body.put_slice(b"\r\n");
    }

    pub(crate) fn finish(mut self) -> Result<RequestContent, RestError> {
        self.body.put_slice(b"--");
        self.body.put_slice(self.boundary.as_bytes());
        self.body.put_slice(b"--\r\n");

        let content_type =
            HeaderValue::try_from(format!("multipart/form-data; boundary={}", self.boundary))?;
        Ok(RequestContent {
            content_type,
            body: self.body.freeze(),
        })
    }
}

/// Escape a quoted-string parameter the way browsers do for form data.
fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
