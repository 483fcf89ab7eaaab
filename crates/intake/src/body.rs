//! Request body and the replay buffer.
//!
//! A [`Body`] is either already in memory or a boxed stream. [`capture`] turns the streaming
//! form into the in-memory form exactly once, so every later stage (and the final handler)
//! can read the same bytes again.

use crate::error::BoxError;
use crate::Request;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body is empty")]
    Empty,
    #[error("read request body failed: {0}")]
    Read(#[source] BoxError),
}

impl BodyError {
    pub fn read<E: Into<BoxError>>(e: E) -> Self {
        Self::Read(e.into())
    }
}

pub struct Body {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(BoxBody<Bytes, BoxError>),
}

impl Body {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self { inner: Kind::Once(Some(bytes)) }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        Self { inner: Kind::Stream(BoxBody::new(body.map_err(Into::into))) }
    }

    /// The in-memory content, `None` while the body is still an unread stream
    pub fn buffered(&self) -> Option<Bytes> {
        match &self.inner {
            Kind::Once(Some(bytes)) => Some(bytes.clone()),
            Kind::Once(None) => Some(Bytes::new()),
            Kind::Stream(_) => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(bytes) => f.debug_tuple("Body::Once").field(bytes).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let kind = &mut self.get_mut().inner;
        match kind {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}

/// Reads the whole body and puts an identical in-memory body back on the request.
///
/// Already buffered bodies are returned without another read, a drained body yields empty
/// bytes. On a read failure the request is left with an empty body.
pub async fn capture(req: &mut Request) -> Result<Bytes, BodyError> {
    if let Some(bytes) = req.body().buffered() {
        return Ok(bytes);
    }

    let body = std::mem::take(req.body_mut());
    let bytes = body.collect().await.map_err(BodyError::Read)?.to_bytes();
    *req.body_mut() = Body::once(bytes.clone());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use http_body_util::StreamBody;
    use std::io;

    fn check_send_sync<T: Send + Sync>() {}

    fn stream_request(chunks: Vec<Result<Frame<Bytes>, io::Error>>) -> Request {
        let stream = futures::stream::iter(chunks).map_err(BoxError::from);
        http::Request::post("/").body(Body::stream(StreamBody::new(stream))).unwrap()
    }

    #[test]
    fn is_send_and_sync() {
        check_send_sync::<Body>();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_string_body() {
        let s = "Hello world".to_string();
        let len = s.len() as u64;

        let mut body = Body::from(s);

        assert_eq!(body.size_hint().exact(), Some(len));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from("Hello world"));

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_empty_body() {
        let mut body = Body::from("");

        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));

        assert!(body.frame().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn capture_is_idempotent_and_replays() {
        let mut req = stream_request(vec![
            Ok(Frame::data(Bytes::from_static(b"{\"na"))),
            Ok(Frame::data(Bytes::from_static(b"me\":"))),
            Ok(Frame::data(Bytes::from_static(b"1}"))),
        ]);

        let first = capture(&mut req).await.unwrap();
        let second = capture(&mut req).await.unwrap();
        assert_eq!(first, Bytes::from_static(b"{\"name\":1}"));
        assert_eq!(first, second);

        let direct = std::mem::take(req.body_mut()).collect().await.unwrap().to_bytes();
        assert_eq!(direct, first);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn capture_of_absent_or_drained_body_is_empty() {
        let mut req = http::Request::get("/").body(Body::empty()).unwrap();
        assert!(capture(&mut req).await.unwrap().is_empty());

        let mut req = http::Request::post("/").body(Body::from("abc")).unwrap();
        let _ = req.body_mut().frame().await;
        assert!(capture(&mut req).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn capture_reports_stream_failure() {
        let mut req = stream_request(vec![
            Ok(Frame::data(Bytes::from_static(b"abc"))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let err = capture(&mut req).await.unwrap_err();
        assert!(matches!(err, BodyError::Read(_)));
        assert!(req.body().buffered().is_some_and(|bytes| bytes.is_empty()));
    }
}
