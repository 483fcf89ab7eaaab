//! Status rendering overrides and canned responders.
//!
//! Every canned responder (and the default tier of the error router) renders through
//! [`StatusHandlers::respond`], so registering a callback for a status changes how that
//! status looks everywhere without touching call sites.

use crate::context;
use crate::message::{Lang, Message};
use crate::response::ResponseWriter;
use crate::Request;
use arc_swap::ArcSwap;
use http::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait StatusCallback: Send + Sync {
    fn call(&self, req: &mut Request, resp: &mut ResponseWriter, message: &Message, status: StatusCode);
}

impl<F> StatusCallback for F
where
    F: Fn(&mut Request, &mut ResponseWriter, &Message, StatusCode) + Send + Sync,
{
    fn call(&self, req: &mut Request, resp: &mut ResponseWriter, message: &Message, status: StatusCode) {
        (self)(req, resp, message, status);
    }
}

pub struct StatusHandlers {
    table: ArcSwap<HashMap<StatusCode, Arc<dyn StatusCallback>>>,
}

macro_rules! canned_responder {
    ($($name:ident => $status:ident),* $(,)?) => {
        $(
            #[doc = concat!("Aborts the request and renders `text` as `", stringify!($status), "`")]
            pub fn $name(&self, req: &mut Request, resp: &mut ResponseWriter, text: &str) {
                let message = Message::new(StatusCode::$status, 0).with_text(Lang::default(), text);
                self.respond(req, resp, &message, Lang::default());
            }
        )*
    };
}

impl StatusHandlers {
    pub fn new() -> Self {
        Self { table: ArcSwap::from_pointee(HashMap::new()) }
    }

    /// Replaces rendering of `status` for every responder, returning whether one was replaced
    pub fn register(&self, status: StatusCode, callback: impl StatusCallback + 'static) -> bool {
        let callback: Arc<dyn StatusCallback> = Arc::new(callback);
        let mut replaced = false;
        self.table.rcu(|table| {
            let mut table = HashMap::clone(table);
            replaced = table.insert(status, Arc::clone(&callback)).is_some();
            table
        });
        replaced
    }

    pub fn unregister(&self, status: StatusCode) -> bool {
        let mut removed = false;
        self.table.rcu(|table| {
            let mut table = HashMap::clone(table);
            removed = table.remove(&status).is_some();
            table
        });
        removed
    }

    pub fn get(&self, status: StatusCode) -> Option<Arc<dyn StatusCallback>> {
        self.table.load().get(&status).cloned()
    }

    /// Aborts the request and renders `message` at its status.
    ///
    /// A registered override for that status takes over, otherwise the text in `lang` is
    /// written as plain text.
    pub fn respond(&self, req: &mut Request, resp: &mut ResponseWriter, message: &Message, lang: Lang) {
        context::abort(req);

        let status = message.status();
        match self.get(status) {
            Some(callback) => callback.call(req, resp, message, status),
            None => {
                resp.text(status, message.render_text(lang));
            }
        }
    }

    /// Aborts the request and renders `data` as json at `status`
    pub fn json<T: Serialize + ?Sized>(&self, req: &mut Request, resp: &mut ResponseWriter, status: StatusCode, data: &T) {
        context::abort(req);
        resp.json(status, data);
    }

    canned_responder! {
        ok => OK,
        created => CREATED,
        accepted => ACCEPTED,
        no_content => NO_CONTENT,
        bad_request => BAD_REQUEST,
        unauthorized => UNAUTHORIZED,
        forbidden => FORBIDDEN,
        not_found => NOT_FOUND,
        method_not_allowed => METHOD_NOT_ALLOWED,
        conflict => CONFLICT,
        unsupported_media_type => UNSUPPORTED_MEDIA_TYPE,
        unprocessable_entity => UNPROCESSABLE_ENTITY,
        too_many_requests => TOO_MANY_REQUESTS,
        internal_server_error => INTERNAL_SERVER_ERROR,
        service_unavailable => SERVICE_UNAVAILABLE,
    }
}

impl Default for StatusHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusHandlers").field("overrides", &self.table.load().keys().collect::<Vec<_>>()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Body;
    use http::header::CONTENT_TYPE;

    fn request() -> Request {
        http::Request::get("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn canned_responders_render_plain_text_and_abort() {
        let statuses = StatusHandlers::new();
        let mut req = request();
        let mut resp = ResponseWriter::new();

        statuses.not_found(&mut req, &mut resp, "no such user");

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.body(), b"no such user");
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert!(context::is_aborted(&req));
    }

    #[test]
    fn override_applies_to_every_responder_of_that_status() {
        let statuses = StatusHandlers::new();
        assert!(!statuses.register(
            StatusCode::BAD_REQUEST,
            |_req: &mut Request, resp: &mut ResponseWriter, message: &Message, status: StatusCode| {
                resp.json(status, &serde_json::json!({"msg": message.render_text(Lang::En)}));
            },
        ));

        let mut req = request();
        let mut resp = ResponseWriter::new();
        statuses.bad_request(&mut req, &mut resp, "oops");
        assert_eq!(resp.body(), br#"{"msg":"oops"}"#);
        assert!(context::is_aborted(&req));

        let mut resp = ResponseWriter::new();
        statuses.forbidden(&mut request(), &mut resp, "nope");
        assert_eq!(resp.body(), b"nope");

        assert!(statuses.unregister(StatusCode::BAD_REQUEST));
        let mut resp = ResponseWriter::new();
        statuses.bad_request(&mut request(), &mut resp, "oops");
        assert_eq!(resp.body(), b"oops");
    }

    #[test]
    fn json_aborts() {
        let statuses = StatusHandlers::new();
        let mut req = request();
        let mut resp = ResponseWriter::new();
        statuses.json(&mut req, &mut resp, StatusCode::OK, &[1, 2]);
        assert_eq!(resp.body(), b"[1,2]");
        assert!(context::is_aborted(&req));
    }
}
