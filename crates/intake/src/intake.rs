//! The intake pipeline.
//!
//! [`Intake::parse`] resolves the media type, captures and parses the body according to the
//! method and media kind, and parses the query string. [`Intake::bind`] continues with target
//! selection, decoding and validation. Every stage short-circuits: the first failure is stored
//! on the [`ValidateResult`] and nothing after it runs, while everything gathered before the
//! failure (notably the raw body) stays available.

use crate::bind::{self, BindTarget, BoundModel, Model};
use crate::body::{self, BodyError};
use crate::error::{BindError, ErrorKind};
use crate::media::{MediaKind, MediaType};
use crate::multipart::{self, FilePart};
use crate::registry::Registry;
use crate::request::RequestExt;
use crate::values::FormValues;
use crate::Request;
use bytes::Bytes;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("media type `{0}` can not be bound")]
pub struct UnsupportedMedia(pub String);

#[derive(Default)]
pub struct ValidateResult {
    media: Option<MediaType>,
    body: Bytes,
    body_values: FormValues,
    query_values: FormValues,
    files: Vec<FilePart>,
    error: Option<BindError>,
    model: Option<Box<dyn BoundModel>>,
}

impl ValidateResult {
    pub fn media(&self) -> Option<&MediaType> {
        self.media.as_ref()
    }

    pub fn media_kind(&self) -> Option<&MediaKind> {
        self.media.as_ref().map(MediaType::kind)
    }

    /// Raw body bytes, kept even when a later stage failed
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_values(&self) -> &FormValues {
        &self.body_values
    }

    pub fn query_values(&self) -> &FormValues {
        &self.query_values
    }

    /// Body values first, query values filling in the keys the body did not set
    pub fn values(&self) -> FormValues {
        let mut values = self.body_values.clone();
        values.merge_absent(&self.query_values);
        values
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn take_error(&mut self) -> Option<BindError> {
        self.error.take()
    }

    pub fn model<T: Model>(&self) -> Option<&T> {
        self.model.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// The bound value as shared storage for the request context
    pub fn take_model(&mut self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.model.take().map(|model| Arc::from(model.into_any()))
    }

    pub fn into_model<T: Model>(self) -> Option<T> {
        self.model?.into_any().downcast::<T>().ok().map(|model| *model)
    }
}

impl fmt::Debug for ValidateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateResult")
            .field("media", &self.media_kind())
            .field("body_len", &self.body.len())
            .field("body_values", &self.body_values)
            .field("query_values", &self.query_values)
            .field("files", &self.files.len())
            .field("error", &self.error)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Intake {
    registry: Arc<Registry>,
}

impl Intake {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolves the media type, parses the body for body-carrying methods and always parses
    /// the query string.
    pub async fn parse(&self, req: &mut Request) -> ValidateResult {
        let mut result = ValidateResult::default();
        if let Err(e) = self.parse_into(req, &mut result).await {
            result.error = Some(e);
        }
        result
    }

    async fn parse_into(&self, req: &mut Request, result: &mut ValidateResult) -> Result<(), BindError> {
        let media = MediaType::resolve(req.content_type()).map_err(|e| BindError::new(ErrorKind::MediaTypeParse, e))?;
        let kind = media.kind().clone();
        result.media = Some(media);

        if req.carries_body() {
            match kind {
                MediaKind::Form => {
                    result.body = capture(req).await?;
                    result.body_values =
                        FormValues::parse(&result.body).map_err(|e| BindError::new(ErrorKind::BodyParse, e))?;
                }
                MediaKind::Multipart => {
                    result.body = capture(req).await?;
                    let settings = self.registry.settings();
                    let boundary = result.media.as_ref().and_then(MediaType::boundary);
                    let form = multipart::parse(&result.body, boundary, settings.multipart_memory())
                        .map_err(|e| BindError::new(ErrorKind::BodyParse, e))?;
                    result.body_values = form.values;
                    result.files = form.files;
                }
                MediaKind::Json => {
                    result.body = capture(req).await?;
                    if result.body.is_empty() && self.registry.settings().strict_body_check() {
                        return Err(BindError::new(ErrorKind::BodyRead, BodyError::Empty));
                    }
                }
                MediaKind::Other(essence) => {
                    return Err(BindError::new(ErrorKind::UnsupportedMediaType, UnsupportedMedia(essence)));
                }
            }
        }

        result.query_values = req.query_values().map_err(|e| BindError::new(ErrorKind::ParseQuery, e))?;
        Ok(())
    }

    /// Parses the request, then binds and validates it onto `target`
    pub async fn bind(&self, req: &mut Request, target: &BindTarget) -> ValidateResult {
        let mut result = self.parse(req).await;
        if result.is_ok() {
            match bind_into(req, target, &result) {
                Ok(model) => result.model = Some(model),
                Err(e) => result.error = Some(e),
            }
        }

        if let Some(err) = &result.error {
            let request_id = req.request_id().unwrap_or_default();
            debug!(request_id, kind = ?err.kind(), cause = %err.cause(), "bind request failed");
        }
        result
    }

    /// Binds onto `T` and hands back the value
    pub async fn bind_as<T: Model>(&self, req: &mut Request) -> Result<T, BindError> {
        let mut result = self.bind(req, &BindTarget::of::<T>()).await;
        if let Some(err) = result.take_error() {
            return Err(err);
        }
        result
            .into_model::<T>()
            .ok_or_else(|| BindError::new(ErrorKind::Default, "bound model has an unexpected type"))
    }
}

async fn capture(req: &mut Request) -> Result<Bytes, BindError> {
    body::capture(req).await.map_err(|e| BindError::new(ErrorKind::BodyRead, e))
}

fn bind_into(req: &Request, target: &BindTarget, result: &ValidateResult) -> Result<Box<dyn BoundModel>, BindError> {
    let shape = target.resolve(req)?;

    let model = match result.media_kind() {
        Some(MediaKind::Json) if req.carries_body() => shape.decode_json(&result.body)?,
        _ => shape.decode_values(&result.values())?,
    };

    bind::validate(model.as_ref(), req)?;
    Ok(model)
}
