use crate::context;
use crate::handler::{BoxHandler, RequestHandler};
use crate::response::ResponseWriter;
use crate::Request;
use async_trait::async_trait;
use std::fmt;
use tracing::trace;

/// Runs handlers in order, stopping once one of them aborts the request.
///
/// The abort flag is checked before every handler, so a request that arrives already aborted
/// runs nothing. Absent handlers are skipped.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<Option<BoxHandler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, handler: BoxHandler) -> Self {
        self.handlers.push(Some(handler));
        self
    }

    #[must_use]
    pub fn then_optional(mut self, handler: Option<BoxHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn then_all(mut self, handlers: impl IntoIterator<Item = BoxHandler>) -> Self {
        self.handlers.extend(handlers.into_iter().map(Some));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FromIterator<BoxHandler> for Chain {
    fn from_iter<I: IntoIterator<Item = BoxHandler>>(iter: I) -> Self {
        Self::new().then_all(iter)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.handlers.len()).finish()
    }
}

#[async_trait]
impl RequestHandler for Chain {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        for (index, handler) in self.handlers.iter().enumerate() {
            if context::is_aborted(req) {
                trace!(index, "chain aborted");
                return;
            }
            if let Some(handler) = handler {
                handler.invoke(req, resp).await;
            }
        }
    }
}
