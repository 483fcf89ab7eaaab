//! Response sink handed to every handler.
//!
//! [`ResponseWriter`] remembers the status it was told to use, separately from the bytes it
//! holds, so middleware can inspect the outcome before anything is flushed to the client.

use crate::body::Body;
use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status set so far, `200 OK` when nothing was set
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn written_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends to the body
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(bytes.as_ref());
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_written(&self) -> bool {
        self.status.is_some() || !self.body.is_empty()
    }

    /// Replaces the body with plain text at `status`
    pub fn text(&mut self, status: StatusCode, text: &str) -> &mut Self {
        self.body.clear();
        self.set_status(status)
            .insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
            .insert_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))
            .write(text)
    }

    /// Replaces the body with `data` serialized as json at `status`.
    ///
    /// A value that fails to serialize turns the response into a bare 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, data: &T) -> &mut Self {
        self.body.clear();
        match serde_json::to_vec(data) {
            Ok(json) => self
                .set_status(status)
                .insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .write(json),
            Err(e) => {
                error!(cause = %e, "serialize json response error");
                self.headers.remove(CONTENT_TYPE);
                self.set_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub fn reset(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }

    pub fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::once(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }

    pub fn take_body(&mut self) -> Bytes {
        self.body.split().freeze()
    }
}
