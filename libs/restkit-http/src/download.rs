use bytes::Bytes;
use http::HeaderMap;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http_body_util::BodyExt;

use crate::error::RestError;
use crate::response::{ResponseBody, content_length, read_body_limited};

/// A file streamed back from a `download` call.
///
/// Metadata comes from the response headers. The body is not read until
/// the caller consumes it.
pub struct DownloadResponse {
    /// `filename` parameter of `Content-Disposition`, quotes trimmed.
    pub file_name: Option<String>,
    /// Raw `Content-Type` value.
    pub content_type: Option<String>,
    /// `Content-Length`, if the server sent one.
    pub size_in_bytes: Option<u64>,
    body: ResponseBody,
}

impl DownloadResponse {
    pub(crate) fn from_parts(headers: &HeaderMap, body: ResponseBody) -> Self {
        Self {
            file_name: disposition_file_name(headers),
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            size_in_bytes: content_length(headers),
            body,
        }
    }

    /// Read the whole file into memory, up to `limit` bytes.
    ///
    /// # Errors
    /// `BodyTooLarge` past the limit, `Transport` if the stream breaks.
    pub async fn bytes(self, limit: usize) -> Result<Bytes, RestError> {
        read_body_limited(http::Response::new(self.body), limit).await
    }

    /// Take the body stream as is.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Drain the stream without keeping its content.
    ///
    /// # Errors
    /// `Transport` if the stream breaks.
    pub async fn discard(self) -> Result<(), RestError> {
        let mut body = std::pin::pin!(self.body);
        while let Some(frame) = body.frame().await {
            frame.map_err(RestError::Transport)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for DownloadResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResponse")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_in_bytes", &self.size_in_bytes)
            .finish_non_exhaustive()
    }
}

fn disposition_file_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    let mut extended = None;
    for param in value.split(';').skip(1) {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw.trim_matches('"').to_owned()),
            "filename*" => extended = decode_ext_value(raw),
            _ => {}
        }
    }

    plain.or(extended).filter(|name| !name.is_empty())
}

/// Decode an RFC 8187 `charset'lang'value` parameter. Only UTF-8 and
/// ISO-8859-1 declare a charset we can read.
fn decode_ext_value(raw: &str) -> Option<String> {
    let mut pieces = raw.splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;

    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes.into_owned()).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.iter().copied().map(char::from).collect())
    } else {
        None
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http_body_util::Full;

    fn headers(pairs: &[(http::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    fn body(data: &'static [u8]) -> ResponseBody {
        crate::response::box_response(http::Response::new(Full::new(Bytes::from_static(data))))
            .into_body()
    }

    #[test]
    fn test_metadata_from_headers() {
        let headers = headers(&[
            (CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
            (CONTENT_TYPE, "application/pdf"),
            (http::header::CONTENT_LENGTH, "4"),
        ]);
        let download = DownloadResponse::from_parts(&headers, body(b"%PDF"));

        assert_eq!(download.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(download.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(download.size_in_bytes, Some(4));
    }

    #[test]
    fn test_missing_headers_leave_metadata_empty() {
        let download = DownloadResponse::from_parts(&HeaderMap::new(), body(b""));

        assert_eq!(download.file_name, None);
        assert_eq!(download.content_type, None);
        assert_eq!(download.size_in_bytes, None);
    }

    #[test]
    fn test_unquoted_file_name() {
        let headers = headers(&[(CONTENT_DISPOSITION, "attachment; filename=data.csv")]);
        assert_eq!(disposition_file_name(&headers).as_deref(), Some("data.csv"));
    }

    #[test]
    fn test_extended_file_name() {
        let headers = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.txt",
        )]);
        assert_eq!(disposition_file_name(&headers).as_deref(), Some("résumé.txt"));
    }

    #[test]
    fn test_extended_file_name_latin1() {
        let headers = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename*=iso-8859-1'en'%A3%20rates.txt",
        )]);
        assert_eq!(disposition_file_name(&headers).as_deref(), Some("£ rates.txt"));
    }

    #[test]
    fn test_extended_file_name_unknown_charset() {
        let headers = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename*=koi8-r''%C1.txt",
        )]);
        assert_eq!(disposition_file_name(&headers), None);
    }

    #[test]
    fn test_plain_file_name_preferred() {
        let headers = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename*=UTF-8''other.txt; filename=\"plain.txt\"",
        )]);
        assert_eq!(disposition_file_name(&headers).as_deref(), Some("plain.txt"));
    }

    #[test]
    fn test_inline_without_file_name() {
        let headers = headers(&[(CONTENT_DISPOSITION, "inline")]);
        assert_eq!(disposition_file_name(&headers), None);
    }

    #[tokio::test]
    async fn test_bytes_reads_stream() {
        let download = DownloadResponse::from_parts(&HeaderMap::new(), body(b"file content"));
        assert_eq!(download.bytes(1024).await.unwrap(), "file content");
    }

    #[tokio::test]
    async fn test_bytes_respects_limit() {
        let download = DownloadResponse::from_parts(&HeaderMap::new(), body(b"file content"));
        assert!(matches!(
            download.bytes(4).await,
            Err(RestError::BodyTooLarge { limit: 4, .. })
        ));
    }
}
