//! Buffered response of a remote call.

use crate::{CallError, CallResult};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};

/// A fully buffered HTTP response.
///
/// Bodies are read eagerly so interceptors can inspect them and converters can
/// decode them without another round trip to the transport.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: url::Url,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: url::Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// Read the whole body off the transport.
    pub(crate) async fn from_reqwest(mut response: reqwest::Response) -> CallResult<Self> {
        let headers = std::mem::take(response.headers_mut());
        let (status, url) = (response.status(), response.url().clone());
        Ok(Self::new(status, headers, response.bytes().await?, url))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// URL the exchange ended at, after redirects.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8, with invalid sequences replaced.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Content-Type` without parameters, e.g. `application/json`.
    pub fn media_type(&self) -> Option<&str> {
        let content_type = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        content_type.split(';').next().map(str::trim)
    }

    /// Turn a non-2xx status into [`CallError::Status`], keeping the body.
    pub fn error_for_status(self) -> CallResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(CallError::Status {
            status: self.status.as_u16(),
            body: self.text_lossy(),
        })
    }
}
