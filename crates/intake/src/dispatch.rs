//! Error handler tables used by the error router.
//!
//! Routing itself lives on [`Registry::route_error`](crate::Registry::route_error): a global
//! handler preempts everything, then the handler registered for the error's kind, then the
//! built-in default. Exactly one of the three runs per failure.

use crate::error::{BindError, ErrorKind};
use crate::response::ResponseWriter;
use crate::Request;
use arc_swap::{ArcSwap, ArcSwapOption};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Renders a classified pipeline failure.
///
/// Custom handlers own the outcome: the request is only aborted if the handler aborts it.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, req: &mut Request, resp: &mut ResponseWriter, err: &BindError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut Request, &mut ResponseWriter, &BindError) + Send + Sync,
{
    fn handle(&self, req: &mut Request, resp: &mut ResponseWriter, err: &BindError) {
        (self)(req, resp, err);
    }
}

/// The tier that produced the response for a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Global,
    Kind,
    Default,
}

pub struct ErrorHandlers {
    global: ArcSwapOption<Box<dyn ErrorHandler>>,
    per_kind: ArcSwap<HashMap<ErrorKind, Arc<dyn ErrorHandler>>>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self { global: ArcSwapOption::empty(), per_kind: ArcSwap::from_pointee(HashMap::new()) }
    }

    /// Registers the handler for `kind`, returning whether one was replaced
    pub fn register(&self, kind: ErrorKind, handler: impl ErrorHandler + 'static) -> bool {
        let handler: Arc<dyn ErrorHandler> = Arc::new(handler);
        let mut replaced = false;
        self.per_kind.rcu(|table| {
            let mut table = HashMap::clone(table);
            replaced = table.insert(kind, Arc::clone(&handler)).is_some();
            table
        });
        replaced
    }

    pub fn unregister(&self, kind: ErrorKind) -> bool {
        let mut removed = false;
        self.per_kind.rcu(|table| {
            let mut table = HashMap::clone(table);
            removed = table.remove(&kind).is_some();
            table
        });
        removed
    }

    /// Installs a catch-all handler that wins over every per-kind handler
    pub fn register_global(&self, handler: impl ErrorHandler + 'static) {
        let handler: Box<dyn ErrorHandler> = Box::new(handler);
        self.global.store(Some(Arc::new(handler)));
    }

    pub fn clear_global(&self) {
        self.global.store(None);
    }

    pub fn global(&self) -> Option<Arc<Box<dyn ErrorHandler>>> {
        self.global.load_full()
    }

    pub fn get(&self, kind: ErrorKind) -> Option<Arc<dyn ErrorHandler>> {
        self.per_kind.load().get(&kind).cloned()
    }
}

impl Default for ErrorHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlers")
            .field("global", &self.global.load().is_some())
            .field("kinds", &self.per_kind.load().keys().collect::<Vec<_>>())
            .finish()
    }
}
