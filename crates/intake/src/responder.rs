//! Conversion of handler results into what the [`ResponseWriter`] holds.
//!
//! The [`Responder`] trait lets a handler hand back a plain value and have it rendered:
//! strings become plain text, [`Json`] becomes `application/json`, and a `(StatusCode, T)`
//! pair overrides the status of whatever `T` renders.

use crate::response::ResponseWriter;
use crate::Request;
use http::StatusCode;
use serde::Serialize;

pub trait Responder {
    fn respond_to(self, req: &Request, resp: &mut ResponseWriter);
}

/// Serializes the inner value as the json body
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// A bare status keeps whatever body was already written
impl Responder for StatusCode {
    fn respond_to(self, _req: &Request, resp: &mut ResponseWriter) {
        resp.set_status(self);
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn respond_to(self, req: &Request, resp: &mut ResponseWriter) {
        let (status, body) = self;
        body.respond_to(req, resp);
        resp.set_status(status);
    }
}

/// Lets a handler bail out with a status, e.g. `Err(StatusCode::NOT_FOUND)`
impl<T: Responder> Responder for Result<T, StatusCode> {
    fn respond_to(self, req: &Request, resp: &mut ResponseWriter) {
        match self {
            Ok(body) => body.respond_to(req, resp),
            Err(status) => status.respond_to(req, resp),
        }
    }
}

macro_rules! text_responder {
    ($($ty:ty),*) => {$(
        impl Responder for $ty {
            fn respond_to(self, _req: &Request, resp: &mut ResponseWriter) {
                resp.text(StatusCode::OK, &self);
            }
        }
    )*};
}

text_responder!(&'static str, String);

impl<T: Serialize> Responder for Json<T> {
    fn respond_to(self, _req: &Request, resp: &mut ResponseWriter) {
        resp.json(StatusCode::OK, &self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Body;
    use http::header::CONTENT_TYPE;

    fn render(responder: impl Responder) -> ResponseWriter {
        let req = http::Request::get("/").body(Body::empty()).unwrap();
        let mut resp = ResponseWriter::new();
        responder.respond_to(&req, &mut resp);
        resp
    }

    #[test]
    fn strings_are_plain_text() {
        let resp = render("hello");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"hello");
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn status_pairs_override_status() {
        let resp = render((StatusCode::CREATED, Json(serde_json::json!({"id": 7}))));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.body(), br#"{"id":7}"#);

        let resp = render((StatusCode::GONE, String::from("gone")));
        assert_eq!(resp.status(), StatusCode::GONE);
        assert_eq!(resp.body(), b"gone");
    }

    #[test]
    fn status_pair_of_bare_status_keeps_the_outer_status() {
        let resp = render((StatusCode::ACCEPTED, StatusCode::NO_CONTENT));
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn errors_render_their_status() {
        let ok: Result<&'static str, StatusCode> = Ok("fine");
        assert_eq!(render(ok).body(), b"fine");

        let err: Result<&'static str, StatusCode> = Err(StatusCode::NOT_FOUND);
        assert_eq!(render(err).status(), StatusCode::NOT_FOUND);
    }
}
