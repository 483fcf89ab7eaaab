//! Content-type classification.

use mime::Mime;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Form,
    Multipart,
    Json,
    /// any other essence, lower-cased
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    kind: MediaKind,
    mime: Mime,
}

impl MediaType {
    /// Classifies a `Content-Type` header value.
    ///
    /// An empty value resolves to form-urlencoded, since most body-less requests carry none.
    pub fn resolve(header: &str) -> Result<Self, mime::FromStrError> {
        let header = header.trim();
        if header.is_empty() {
            return Ok(Self::from_mime(mime::APPLICATION_WWW_FORM_URLENCODED));
        }

        Mime::from_str(header).map(Self::from_mime)
    }

    fn from_mime(mime: Mime) -> Self {
        let (type_, subtype) = (mime.type_(), mime.subtype());
        let kind = if type_ == mime::APPLICATION && subtype == mime::WWW_FORM_URLENCODED {
            MediaKind::Form
        } else if type_ == mime::MULTIPART && subtype == mime::FORM_DATA {
            MediaKind::Multipart
        } else if type_ == mime::APPLICATION && subtype == mime::JSON {
            MediaKind::Json
        } else {
            MediaKind::Other(mime.essence_str().to_ascii_lowercase())
        };
        Self { kind, mime }
    }

    pub fn kind(&self) -> &MediaKind {
        &self.kind
    }

    pub fn mime(&self) -> &Mime {
        &self.mime
    }

    pub fn boundary(&self) -> Option<&str> {
        self.mime.get_param(mime::BOUNDARY).map(|name| name.as_str())
    }
}
