//! Shared state of the intake pipeline.
//!
//! A [`Registry`] is built once, wrapped in an [`Arc`](std::sync::Arc) and handed to every
//! bind stage. Its tables may be changed at any time, requests in flight see either the old
//! or the new table, never a partial one.

use crate::dispatch::{ErrorHandlers, Tier};
use crate::error::{BindError, BoxError};
use crate::message::{Lang, Message, Messages};
use crate::response::ResponseWriter;
use crate::settings::IntakeSettings;
use crate::status::StatusHandlers;
use crate::Request;
use serde_json::Value;
use tracing::trace;

#[derive(Debug, Default)]
pub struct Registry {
    settings: IntakeSettings,
    errors: ErrorHandlers,
    statuses: StatusHandlers,
    messages: Messages,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: IntakeSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn settings(&self) -> &IntakeSettings {
        &self.settings
    }

    pub fn errors(&self) -> &ErrorHandlers {
        &self.errors
    }

    pub fn statuses(&self) -> &StatusHandlers {
        &self.statuses
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Hands `err` to exactly one handler: the global one, else the one registered for its
    /// kind, else the built-in default.
    pub fn route_error(&self, req: &mut Request, resp: &mut ResponseWriter, err: &BindError) -> Tier {
        let tier = if let Some(global) = self.errors.global() {
            global.handle(req, resp, err);
            Tier::Global
        } else if let Some(handler) = self.errors.get(err.kind()) {
            handler.handle(req, resp, err);
            Tier::Kind
        } else {
            self.respond_default(req, resp, err);
            Tier::Default
        };

        trace!(kind = ?err.kind(), ?tier, "bind error routed");
        tier
    }

    /// Routes an arbitrary error, classifying it as [`Default`](crate::ErrorKind::Default)
    /// unless a [`BindError`] is found in its source chain
    pub fn route_any(&self, req: &mut Request, resp: &mut ResponseWriter, err: BoxError) -> Tier {
        let err = BindError::classify(err);
        self.route_error(req, resp, &err)
    }

    /// Aborts the request and renders the kind's message at its default status
    pub fn respond_default(&self, req: &mut Request, resp: &mut ResponseWriter, err: &BindError) {
        let message = Message::new(err.status(), 0).with_text(Lang::En, err.kind().message());
        self.statuses.respond(req, resp, &message, self.messages.default_lang());
    }

    /// Renders the message registered under `code`, see [`Messages::dispatch`]
    pub fn dispatch(&self, code: u32, req: &mut Request, resp: &mut ResponseWriter, payload: &Value) -> bool {
        self.messages.dispatch(&self.statuses, code, req, resp, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyError;
    use crate::dispatch::ErrorHandler;
    use crate::error::ErrorKind;
    use crate::{context, Body};
    use http::StatusCode;
    use mockall::mock;
    use thiserror::Error;

    mock! {
        Handler {}
        impl ErrorHandler for Handler {
            fn handle(&self, req: &mut Request, resp: &mut ResponseWriter, err: &BindError);
        }
    }

    fn request() -> Request {
        http::Request::post("/").body(Body::empty()).unwrap()
    }

    fn route(registry: &Registry, kind: ErrorKind) -> (Tier, Request, ResponseWriter) {
        let mut req = request();
        let mut resp = ResponseWriter::new();
        let tier = registry.route_error(&mut req, &mut resp, &BindError::new(kind, "cause"));
        (tier, req, resp)
    }

    #[test]
    fn global_handler_wins_for_every_kind() {
        let registry = Registry::new();

        let mut global = MockHandler::new();
        global.expect_handle().times(ErrorKind::ALL.len()).return_const(());
        let mut per_kind = MockHandler::new();
        per_kind.expect_handle().never();

        registry.errors().register(ErrorKind::BodyValidate, per_kind);
        registry.errors().register_global(global);

        for kind in ErrorKind::ALL {
            let (tier, req, resp) = route(&registry, kind);
            assert_eq!(tier, Tier::Global);
            assert!(!context::is_aborted(&req));
            assert!(!resp.is_written());
        }
    }

    #[test]
    fn kind_handler_runs_without_global() {
        let registry = Registry::new();

        let mut handler = MockHandler::new();
        handler
            .expect_handle()
            .withf(|_, _, err| err.kind() == ErrorKind::Decode)
            .times(1)
            .returning(|req, resp, _| {
                context::abort(req);
                resp.set_status(StatusCode::UNPROCESSABLE_ENTITY);
            });
        registry.errors().register(ErrorKind::Decode, handler);

        let (tier, req, resp) = route(&registry, ErrorKind::Decode);
        assert_eq!(tier, Tier::Kind);
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(context::is_aborted(&req));

        let (tier, _, resp) = route(&registry, ErrorKind::ParseQuery);
        assert_eq!(tier, Tier::Default);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn default_tier_renders_kind_message() {
        let registry = Registry::new();

        let (tier, req, resp) = route(&registry, ErrorKind::BodyValidate);
        assert_eq!(tier, Tier::Default);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body(), b"validate request body failed");
        assert!(context::is_aborted(&req));

        let (_, _, resp) = route(&registry, ErrorKind::UnsupportedMediaType);
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let mut req = request();
        let mut resp = ResponseWriter::new();
        registry.route_error(&mut req, &mut resp, &BindError::new(ErrorKind::BodyRead, BodyError::Empty));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn default_tier_honors_status_overrides() {
        let registry = Registry::new();
        registry.statuses().register(
            StatusCode::BAD_REQUEST,
            |_req: &mut Request, resp: &mut ResponseWriter, message: &Message, status: StatusCode| {
                resp.json(status, &serde_json::json!({"error": message.render_text(Lang::En)}));
            },
        );

        let (_, req, resp) = route(&registry, ErrorKind::Decode);
        assert_eq!(resp.body(), br#"{"error":"decode request values failed"}"#);
        assert!(context::is_aborted(&req));
    }

    #[test]
    fn route_any_classifies() {
        #[derive(Debug, Error)]
        #[error("wrapped")]
        struct Wrapped(#[source] BindError);

        let registry = Registry::new();
        let mut handler = MockHandler::new();
        handler.expect_handle().times(1).return_const(());
        registry.errors().register(ErrorKind::ModelSelect, handler);

        let mut req = request();
        let mut resp = ResponseWriter::new();

        let wrapped = Box::new(Wrapped(BindError::new(ErrorKind::ModelSelect, "no model")));
        assert_eq!(registry.route_any(&mut req, &mut resp, wrapped), Tier::Kind);

        assert_eq!(registry.route_any(&mut req, &mut resp, "unexpected".into()), Tier::Default);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body(), b"bind request failed");
    }

    #[test]
    fn dispatch_goes_through_messages() {
        let registry = Registry::new();
        registry.messages().register(Message::new(StatusCode::CONFLICT, 42).with_text(Lang::En, "taken"));

        let mut req = request();
        let mut resp = ResponseWriter::new();
        assert!(registry.dispatch(42, &mut req, &mut resp, &Value::Null));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.body(), b"taken");
    }
}
