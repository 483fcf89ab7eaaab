//! Handler composition.
//!
//! Two shapes are available:
//! - [`wrap`] nests handlers "onion" style: the first middleware is the outermost layer and
//!   sees the request first and the response last.
//! - [`Chain`] runs handlers one after another and stops as soon as the abort flag is set.
//!
//! [`Route`] combines both, the way most applications declare an endpoint.

mod bind;
mod chain;
mod pre;
mod route;

use crate::handler::{BoxHandler, RequestHandler};
use crate::response::ResponseWriter;
use crate::Request;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

pub use bind::BindHandler;
pub use chain::Chain;
pub use pre::Pre;
pub use route::Route;

/// Turns a handler into another one that surrounds it
pub trait Middleware: Send + Sync {
    fn wrap(&self, handler: BoxHandler) -> BoxHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync,
{
    fn wrap(&self, handler: BoxHandler) -> BoxHandler {
        (self)(handler)
    }
}

pub type BoxMiddleware = Arc<dyn Middleware>;

/// Wraps `target` with `middlewares`, the first one ending up outermost
pub fn wrap(target: BoxHandler, middlewares: &[BoxMiddleware]) -> BoxHandler {
    middlewares.iter().rev().fold(target, |handler, middleware| middleware.wrap(handler))
}

/// The rest of the onion, handed to a [`from_fn`] middleware
#[derive(Clone)]
pub struct Next {
    handler: BoxHandler,
}

impl Next {
    pub async fn run(&self, req: &mut Request, resp: &mut ResponseWriter) {
        self.handler.invoke(req, resp).await;
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

/// Builds a middleware from an async fn that decides if and when to call [`Next::run`]
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter, Next) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    FnMiddleware { f: Arc::new(f) }
}

pub struct FnMiddleware<F> {
    f: Arc<F>,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter, Next) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn wrap(&self, handler: BoxHandler) -> BoxHandler {
        Arc::new(FnMiddlewareHandler { f: Arc::clone(&self.f), next: Next { handler } })
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMiddleware")
    }
}

struct FnMiddlewareHandler<F> {
    f: Arc<F>,
    next: Next,
}

#[async_trait]
impl<F> RequestHandler for FnMiddlewareHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter, Next) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        (self.f)(req, resp, self.next.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::{context, Body};

    fn request() -> Request {
        http::Request::get("/").body(Body::empty()).unwrap()
    }

    fn trace(req: &mut Request, step: &str) {
        let mut steps = context::get_string(req, "trace");
        if !steps.is_empty() {
            steps.push(' ');
        }
        steps.push_str(step);
        context::set(req, "trace", steps);
    }

    struct Layer {
        name: &'static str,
        inner: BoxHandler,
    }

    fn layer(name: &'static str) -> BoxMiddleware {
        Arc::new(move |inner: BoxHandler| -> BoxHandler { Arc::new(Layer { name, inner }) })
    }

    #[async_trait]
    impl RequestHandler for Layer {
        async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
            trace(req, &format!("{}>", self.name));
            self.inner.invoke(req, resp).await;
            trace(req, &format!("<{}", self.name));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn first_middleware_is_outermost() {
        let target: BoxHandler = Arc::new(handler_fn(|req: &mut Request, _: &mut ResponseWriter| trace(req, "s0")));

        let handler = wrap(target, &[layer("s2"), layer("s1")]);

        let mut req = request();
        handler.invoke(&mut req, &mut ResponseWriter::new()).await;
        assert_eq!(context::get_string(&req, "trace"), "s2> s1> s0 <s1 <s2");
    }

    fn guard<'a>(req: &'a mut Request, resp: &'a mut ResponseWriter, next: Next) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if context::get_bool(req, "allowed") {
                next.run(req, resp).await;
                resp.insert_header(http::header::HeaderName::from_static("x-guard"), http::HeaderValue::from_static("passed"));
            } else {
                resp.text(http::StatusCode::FORBIDDEN, "denied");
            }
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn from_fn_decides_whether_to_continue() {
        let target: BoxHandler = Arc::new(handler_fn(|_: &mut Request, resp: &mut ResponseWriter| {
            resp.text(http::StatusCode::OK, "inside");
        }));
        let handler = wrap(target, &[Arc::new(from_fn(guard))]);

        let mut req = request();
        let mut resp = ResponseWriter::new();
        handler.invoke(&mut req, &mut resp).await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);

        let mut req = request();
        context::set(&mut req, "allowed", true);
        let mut resp = ResponseWriter::new();
        handler.invoke(&mut req, &mut resp).await;
        assert_eq!(resp.body(), b"inside");
        assert_eq!(resp.headers()["x-guard"], "passed");
    }
}
