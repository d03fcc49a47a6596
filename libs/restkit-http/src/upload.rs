use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::content::{MultipartForm, RequestContent};
use crate::error::RestError;

/// Payload of a file upload: an async reader or bytes already in memory.
pub enum UploadContent {
    Reader(Pin<Box<dyn AsyncRead + Send + Sync>>),
    Bytes(Bytes),
}

impl UploadContent {
    /// Wrap any async reader, e.g. a `tokio::fs::File`.
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        Self::Reader(Box::pin(reader))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Read the whole content, failing once it grows past `limit` bytes.
    async fn read_all(self, limit: usize) -> Result<Bytes, RestError> {
        match self {
            Self::Bytes(bytes) if bytes.len() > limit => Err(RestError::BodyTooLarge {
                limit,
                actual: bytes.len(),
            }),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Reader(reader) => {
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                let mut buf = Vec::new();
                reader.take(cap).read_to_end(&mut buf).await?;
                if buf.len() > limit {
                    return Err(RestError::BodyTooLarge {
                        limit,
                        actual: buf.len(),
                    });
                }
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(_) => f.write_str("UploadContent::Reader(..)"),
            Self::Bytes(bytes) => write!(f, "UploadContent::Bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<Bytes> for UploadContent {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for UploadContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// A single file sent as one `multipart/form-data` part.
///
/// `key` names the form field. A missing `content` still sends the part,
/// empty.
#[derive(Debug)]
pub struct UploadRequest {
    pub key: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: Option<UploadContent>,
}

impl UploadRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            file_name: None,
            content_type: None,
            content: None,
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<UploadContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Drain the content, at most `limit` bytes, and encode the form.
    ///
    /// The content type must parse as a media type; it is written into the
    /// part headers verbatim.
    pub(crate) async fn into_content(self, limit: usize) -> Result<RequestContent, RestError> {
        if let Some(content_type) = &self.content_type {
            content_type
                .parse::<mime::Mime>()
                .map_err(|source| RestError::InvalidContentType {
                    value: content_type.clone(),
                    source,
                })?;
        }

        let data = match self.content {
            Some(content) => content.read_all(limit).await?,
            None => Bytes::new(),
        };

        let mut form = MultipartForm::new();
        form.part(
            &self.key,
            self.file_name.as_deref(),
            self.content_type.as_deref(),
            &data,
        );
        form.finish()
    }
}
