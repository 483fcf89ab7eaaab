use crate::context;
use crate::handler::{BoxHandler, RequestHandler};
use crate::middleware::Middleware;
use crate::request::RequestExt;
use crate::response::ResponseWriter;
use crate::Request;
use async_trait::async_trait;
use tracing::trace;

/// Gives every request a fresh context before anything else runs.
///
/// Values left behind by an earlier pass, the abort flag included, are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pre;

impl Middleware for Pre {
    fn wrap(&self, handler: BoxHandler) -> BoxHandler {
        std::sync::Arc::new(PreHandler { inner: handler })
    }
}

struct PreHandler {
    inner: BoxHandler,
}

#[async_trait]
impl RequestHandler for PreHandler {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        context::new_scope(req);
        trace!(request_id = req.request_id().unwrap_or_default(), "request context created");
        self.inner.invoke(req, resp).await;
    }
}
