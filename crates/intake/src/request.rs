//! Convenience accessors over the inbound request.

use crate::Request;
use crate::values::{FormValues, ValuesError};
use http::Method;
use http::header::{AsHeaderName, CONTENT_TYPE};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub trait RequestExt {
    /// Whether the method may carry a body that the pipeline should parse
    fn carries_body(&self) -> bool;

    /// The raw `Content-Type` header, empty when missing or not visible ascii
    fn content_type(&self) -> &str;

    fn header_str<K: AsHeaderName>(&self, name: K) -> Option<&str>;

    fn request_id(&self) -> Option<&str>;

    fn query_values(&self) -> Result<FormValues, ValuesError>;

    fn query(&self, key: &str) -> Option<String>;

    fn query_or(&self, key: &str, default: &str) -> String;
}

impl RequestExt for Request {
    fn carries_body(&self) -> bool {
        matches!(*self.method(), Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
    }

    fn content_type(&self) -> &str {
        self.header_str(CONTENT_TYPE).unwrap_or_default()
    }

    fn header_str<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers().get(name).and_then(|value| value.to_str().ok())
    }

    fn request_id(&self) -> Option<&str> {
        self.header_str(REQUEST_ID_HEADER).filter(|id| !id.is_empty())
    }

    fn query_values(&self) -> Result<FormValues, ValuesError> {
        match self.uri().query() {
            Some(query) => FormValues::parse(query.as_bytes()),
            None => Ok(FormValues::new()),
        }
    }

    fn query(&self, key: &str) -> Option<String> {
        self.query_values().ok()?.get(key).map(str::to_owned)
    }

    fn query_or(&self, key: &str, default: &str) -> String {
        self.query(key).filter(|value| !value.is_empty()).unwrap_or_else(|| default.to_owned())
    }
}
