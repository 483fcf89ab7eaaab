//! Classified pipeline errors.
//!
//! Every stage of the intake pipeline fails with a [`BindError`], which pairs a closed
//! [`ErrorKind`] with the original cause. The kind drives routing in the error dispatcher,
//! the cause is kept untouched so handlers can inspect it (for example to read field
//! diagnostics out of a [`ValidationErrors`](crate::validate::ValidationErrors)).

use crate::body::BodyError;
use crate::validate::ValidationErrors;
use http::StatusCode;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// The erased cause carried by classified errors.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// The closed set of pipeline failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// the request body could not be read, or was empty under strict body checking
    BodyRead,
    /// the json body could not be deserialized into the target
    BodyUnmarshal,
    /// a form or multipart body could not be parsed
    BodyParse,
    /// the content-type header is not a valid media type
    MediaTypeParse,
    /// the media type can not carry a bindable body
    UnsupportedMediaType,
    /// form or query values could not be decoded into the target
    Decode,
    /// the url query string is malformed
    ParseQuery,
    /// declared field constraints failed
    BodyValidate,
    /// the target's own request check failed
    SelfValidate,
    /// the target selection factory rejected the request
    ModelSelect,
    /// the target selection factory produced a shape that is not struct-like
    ModelSelectType,
    /// anything the pipeline did not classify itself
    Default,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::BodyRead,
        ErrorKind::BodyUnmarshal,
        ErrorKind::BodyParse,
        ErrorKind::MediaTypeParse,
        ErrorKind::UnsupportedMediaType,
        ErrorKind::Decode,
        ErrorKind::ParseQuery,
        ErrorKind::BodyValidate,
        ErrorKind::SelfValidate,
        ErrorKind::ModelSelect,
        ErrorKind::ModelSelectType,
        ErrorKind::Default,
    ];

    /// Static description of the failure class
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::BodyRead => "read request body failed",
            ErrorKind::BodyUnmarshal => "unmarshal request body failed",
            ErrorKind::BodyParse => "parse request body failed",
            ErrorKind::MediaTypeParse => "parse request media type failed",
            ErrorKind::UnsupportedMediaType => "request media type not supported",
            ErrorKind::Decode => "decode request values failed",
            ErrorKind::ParseQuery => "parse request query failed",
            ErrorKind::BodyValidate => "validate request body failed",
            ErrorKind::SelfValidate => "validate request failed",
            ErrorKind::ModelSelect => "select request model failed",
            ErrorKind::ModelSelectType => "select request model type error, must be struct-like",
            ErrorKind::Default => "bind request failed",
        }
    }

    /// The status family a kind maps to when no handler overrides it.
    ///
    /// Only [`ErrorKind::BodyRead`] may reach the 5xx family, and only when the body stream
    /// itself failed, see [`BindError::status`].
    pub fn default_status(self) -> StatusCode {
        match self {
            ErrorKind::MediaTypeParse | ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::BodyRead => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A pipeline failure tagged with its [`ErrorKind`].
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct BindError {
    kind: ErrorKind,
    source: BoxError,
}

impl BindError {
    pub fn new<E: Into<BoxError>>(kind: ErrorKind, cause: E) -> Self {
        Self { kind, source: cause.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// The original cause, exactly as the failing stage produced it
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    pub fn into_cause(self) -> BoxError {
        self.source
    }

    /// Field diagnostics when the structural validation failed
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.source.downcast_ref::<ValidationErrors>()
    }

    /// The status used when the error is rendered without an override.
    ///
    /// An empty body rejected by strict body checking is the client's fault and maps to 400,
    /// every other read failure stays in the 5xx family.
    pub fn status(&self) -> StatusCode {
        match (self.kind, self.source.downcast_ref::<BodyError>()) {
            (ErrorKind::BodyRead, Some(BodyError::Empty)) => StatusCode::BAD_REQUEST,
            (kind, _) => kind.default_status(),
        }
    }

    /// Finds the classified error inside an arbitrary error, following the source chain.
    ///
    /// Anything without a [`BindError`] inside is classified as [`ErrorKind::Default`].
    pub fn classify(err: BoxError) -> BindError {
        let err = match err.downcast::<BindError>() {
            Ok(bind_error) => return *bind_error,
            Err(err) => err,
        };

        let mut source = err.source();
        while let Some(current) = source {
            if let Some(bind_error) = current.downcast_ref::<BindError>() {
                return BindError::new(bind_error.kind, Reclassified(bind_error.to_string()));
            }
            source = current.source();
        }

        BindError::new(ErrorKind::Default, err)
    }
}

/// Cause used when a classified error is found behind another error and can not be moved out.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reclassified(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer {
        #[source]
        inner: BindError,
    }

    #[test]
    fn client_kinds_never_map_to_server_errors() {
        for kind in ErrorKind::ALL {
            if kind == ErrorKind::BodyRead {
                continue;
            }
            assert!(kind.default_status().is_client_error(), "{kind:?}");
        }
    }

    #[test]
    fn empty_body_read_is_a_client_error() {
        let err = BindError::new(ErrorKind::BodyRead, BodyError::Empty);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = BindError::new(ErrorKind::BodyRead, BodyError::read("connection reset"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn cause_is_kept_unmodified() {
        let err = BindError::new(ErrorKind::ModelSelect, "no model for action");
        assert_eq!(err.cause().to_string(), "no model for action");
        assert_eq!(err.to_string(), "select request model failed: no model for action");
    }

    #[test]
    fn classify_unwraps_nested_errors() {
        let direct: BoxError = Box::new(BindError::new(ErrorKind::Decode, "bad int"));
        assert_eq!(BindError::classify(direct).kind(), ErrorKind::Decode);

        let nested: BoxError = Box::new(Outer { inner: BindError::new(ErrorKind::ParseQuery, "bad escape") });
        assert_eq!(BindError::classify(nested).kind(), ErrorKind::ParseQuery);

        let plain: BoxError = "something else".into();
        let classified = BindError::classify(plain);
        assert_eq!(classified.kind(), ErrorKind::Default);
        assert_eq!(classified.status(), StatusCode::BAD_REQUEST);
    }
}
