use crate::responder::Responder;
use crate::response::ResponseWriter;
use crate::Request;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// A step of request handling.
///
/// Handlers share the request and the response sink. They signal "stop here" through the
/// abort flag in the request context rather than through a return value.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter);
}

pub type BoxHandler = Arc<dyn RequestHandler>;

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        self.as_ref().invoke(req, resp).await;
    }
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        self.as_ref().invoke(req, resp).await;
    }
}

/// a synchronous closure as a handler
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut Request, &mut ResponseWriter) + Send + Sync,
{
    FnHandler { f }
}

#[async_trait]
impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&mut Request, &mut ResponseWriter) + Send + Sync,
{
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        (self.f)(req, resp);
    }
}

/// an async fn borrowing the request and the response as a handler
pub struct AsyncFnHandler<F> {
    f: F,
}

pub fn async_handler_fn<F>(f: F) -> AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter) -> BoxFuture<'a, ()> + Send + Sync,
{
    AsyncFnHandler { f }
}

#[async_trait]
impl<F> RequestHandler for AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseWriter) -> BoxFuture<'a, ()> + Send + Sync,
{
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        (self.f)(req, resp).await;
    }
}

/// a closure producing a [`Responder`] as a handler
pub struct ResponderHandler<F> {
    f: F,
}

pub fn responder_fn<F, R>(f: F) -> ResponderHandler<F>
where
    F: Fn(&Request) -> R + Send + Sync,
    R: Responder,
{
    ResponderHandler { f }
}

#[async_trait]
impl<F, R> RequestHandler for ResponderHandler<F>
where
    F: Fn(&Request) -> R + Send + Sync,
    R: Responder,
{
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        (self.f)(req).respond_to(req, resp);
    }
}

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl<F> fmt::Debug for $name<F> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(stringify!($name))
                }
            }
        )*
    };
}

opaque_debug!(FnHandler, AsyncFnHandler, ResponderHandler);
