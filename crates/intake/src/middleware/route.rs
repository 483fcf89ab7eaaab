use crate::bind::BindTarget;
use crate::handler::BoxHandler;
use crate::intake::Intake;
use crate::middleware::{wrap, BindHandler, BoxMiddleware, Chain, Pre};
use crate::registry::Registry;
use std::fmt;
use std::sync::Arc;

/// Declares an endpoint: middlewares around a chain of before handlers, the target and after
/// handlers.
///
/// The assembled handler is `middlewares( Chain( Chain(before.., target), after.. ) )`, the
/// first middleware being the outermost.
#[derive(Clone)]
pub struct Route {
    middlewares: Vec<BoxMiddleware>,
    before: Vec<BoxHandler>,
    after: Vec<BoxHandler>,
    intake: Intake,
}

impl Route {
    /// A route whose outermost middleware is [`Pre`]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::empty(registry).use_middleware(Arc::new(Pre))
    }

    /// A route without any middleware
    pub fn empty(registry: Arc<Registry>) -> Self {
        Self { middlewares: Vec::new(), before: Vec::new(), after: Vec::new(), intake: Intake::new(registry) }
    }

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    #[must_use]
    pub fn use_middleware(mut self, middleware: BoxMiddleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    #[must_use]
    pub fn before(mut self, handler: BoxHandler) -> Self {
        self.before.push(handler);
        self
    }

    #[must_use]
    pub fn after(mut self, handler: BoxHandler) -> Self {
        self.after.push(handler);
        self
    }

    /// A copy of this route that binds onto `target` after the before handlers declared so far
    #[must_use]
    pub fn bind(&self, target: BindTarget) -> Self {
        let mut route = self.clone();
        route.before.push(Arc::new(BindHandler::new(self.intake.clone(), target)));
        route
    }

    /// Assembles the route around `target`
    pub fn handler(&self, target: BoxHandler) -> BoxHandler {
        let inner = Chain::new().then_all(self.before.iter().cloned()).then(target);
        let outer = Chain::new().then(Arc::new(inner)).then_all(self.after.iter().cloned());
        wrap(Arc::new(outer), &self.middlewares)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("middlewares", &self.middlewares.len())
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish_non_exhaustive()
    }
}
