//! Request intake for http handlers.
//!
//! The crate takes an [`http::Request`] that has already been received and turns it into
//! something a handler can work with:
//!
//! - the media type is resolved and the body is captured once, then replayed to anyone who
//!   asks for it again ([`body::capture`])
//! - form, multipart and json bodies are parsed, together with the query string
//!   ([`Intake::parse`])
//! - the values are bound onto a typed model and validated ([`Intake::bind`])
//! - failures are sent to exactly one error handler, global first, then per kind, then a
//!   built-in default ([`Registry::route_error`])
//!
//! Handlers are composed with [`middleware::wrap`] (onion) and [`middleware::Chain`] (stops on
//! abort), and [`middleware::Route`] puts both together for a typical endpoint. State shared
//! between handlers of one request lives in its [`context`].

pub mod bind;
pub mod body;
pub mod context;
mod decode;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod intake;
pub mod media;
pub mod message;
pub mod middleware;
pub mod multipart;
pub mod registry;
pub mod request;
pub mod responder;
pub mod response;
pub mod settings;
pub mod status;
pub mod validate;
pub mod values;

/// The request type every handler sees
pub type Request = http::Request<Body>;

pub use bind::{BindTarget, Model, Shape};
pub use body::{Body, BodyError};
pub use dispatch::{ErrorHandler, Tier};
pub use error::{BindError, BoxError, ErrorKind};
pub use handler::{async_handler_fn, handler_fn, responder_fn, BoxHandler, RequestHandler};
pub use intake::{Intake, ValidateResult};
pub use media::{MediaKind, MediaType};
pub use message::{Lang, Message};
pub use middleware::{BoxMiddleware, Chain, Middleware, Route};
pub use registry::Registry;
pub use request::RequestExt;
pub use responder::{Json, Responder};
pub use response::ResponseWriter;
pub use settings::IntakeSettings;
pub use validate::{Checks, Validate, ValidationErrors};
pub use values::FormValues;
