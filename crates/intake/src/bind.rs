//! Binding parsed request data onto application types.
//!
//! A bind target is described by a [`Shape`], a type-erased token created with
//! [`Shape::of`]. It is never read for its contents, it only knows how to allocate and decode
//! a fresh value of its type. [`BindTarget`] either fixes the shape up front or selects it
//! per request through a factory.
//!
//! # Example
//!
//! ```
//! use micro_intake::bind::{BindTarget, Model, SelectError, Shape};
//! use micro_intake::validate::Validate;
//! use micro_intake::RequestExt;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Login {
//!     user: String,
//!     remember: bool,
//! }
//! impl Validate for Login {}
//! impl Model for Login {}
//!
//! #[derive(Debug, Deserialize)]
//! struct Logout {}
//! impl Validate for Logout {}
//! impl Model for Logout {}
//!
//! let target = BindTarget::select(|req| match req.query("action").as_deref() {
//!     Some("login") => Ok(Shape::of::<Login>()),
//!     Some("logout") => Ok(Shape::of::<Logout>()),
//!     other => Err(SelectError::NoModel(other.unwrap_or_default().to_owned()).into()),
//! });
//! # let _ = target;
//! ```

use crate::decode::{Filled, FormDeserializer, Zero};
use crate::error::{BindError, BoxError, ErrorKind};
use crate::validate::{Validate, ValidationErrors};
use crate::values::FormValues;
use crate::Request;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::forward_to_deserialize_any;
use std::any::{type_name, Any};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// A type requests can be bound to.
///
/// Fields the request leaves out take their zero value: empty strings and collections, `0`,
/// `false` and `None`, recursively for nested structs. Defaults declared with
/// `#[serde(default)]` are not consulted, and an enum field without a value fails to decode.
/// Form, multipart and query keys that repeat fill sequence fields in order.
pub trait Model: DeserializeOwned + Validate + Send + Sync + 'static {
    /// Business rules checked against the request after the declared constraints passed.
    ///
    /// The message of a rejection is carried as the cause of a
    /// [`SelfValidate`](ErrorKind::SelfValidate) error.
    fn check_request(&self, _req: &Request) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no model for `{0}`")]
    NoModel(String),
    #[error("`{0}` is not struct-like")]
    NotStructLike(&'static str),
}

/// Cause of a [`SelfValidate`](ErrorKind::SelfValidate) failure
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RequestRejected(pub String);

/// A freshly bound value, with its concrete type erased
pub trait BoundModel: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn validate_fields(&self) -> Result<(), ValidationErrors>;

    fn validate_request(&self, req: &Request) -> Result<(), String>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Model> BoundModel for T {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn validate_fields(&self) -> Result<(), ValidationErrors> {
        Validate::validate(self)
    }

    fn validate_request(&self, req: &Request) -> Result<(), String> {
        self.check_request(req)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for dyn BoundModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundModel").field(&self.type_name()).finish()
    }
}

trait ErasedShape: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn struct_like(&self) -> bool;

    fn decode_values(&self, values: &FormValues) -> Result<Box<dyn BoundModel>, BindError>;

    fn decode_json(&self, bytes: &[u8]) -> Result<Box<dyn BoundModel>, BindError>;
}

struct TypedShape<T> {
    struct_like: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Model> ErasedShape for TypedShape<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn struct_like(&self) -> bool {
        self.struct_like
    }

    fn decode_values(&self, values: &FormValues) -> Result<Box<dyn BoundModel>, BindError> {
        let model = T::deserialize(Filled(FormDeserializer::new(values)))
            .map_err(|e| BindError::new(ErrorKind::Decode, e))?;
        Ok(Box::new(model))
    }

    fn decode_json(&self, bytes: &[u8]) -> Result<Box<dyn BoundModel>, BindError> {
        let unmarshal = |e: serde_json::Error| BindError::new(ErrorKind::BodyUnmarshal, e);
        if bytes.is_empty() {
            return Ok(Box::new(T::deserialize(Zero::<serde_json::Error>::new()).map_err(unmarshal)?));
        }

        let mut de = serde_json::Deserializer::from_slice(bytes);
        let model = T::deserialize(Filled(&mut de)).map_err(unmarshal)?;
        de.end().map_err(unmarshal)?;
        Ok(Box::new(model))
    }
}

/// Type-erased description of a bind target type
#[derive(Clone)]
pub struct Shape {
    inner: Arc<dyn ErasedShape>,
}

impl Shape {
    pub fn of<T: Model>() -> Self {
        let struct_like = probe_struct_like::<T>();
        Self { inner: Arc::new(TypedShape::<T> { struct_like, _marker: PhantomData }) }
    }

    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    /// Whether the type deserializes from named fields, as structs and maps do
    pub fn is_struct_like(&self) -> bool {
        self.inner.struct_like()
    }

    pub(crate) fn decode_values(&self, values: &FormValues) -> Result<Box<dyn BoundModel>, BindError> {
        self.inner.decode_values(values)
    }

    pub(crate) fn decode_json(&self, bytes: &[u8]) -> Result<Box<dyn BoundModel>, BindError> {
        self.inner.decode_json(bytes)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type", &self.type_name())
            .field("struct_like", &self.is_struct_like())
            .finish()
    }
}

pub type ShapeFactory = Arc<dyn Fn(&Request) -> Result<Shape, BoxError> + Send + Sync>;

#[derive(Clone)]
pub enum BindTarget {
    Fixed(Shape),
    Factory(ShapeFactory),
}

impl BindTarget {
    pub fn of<T: Model>() -> Self {
        BindTarget::Fixed(Shape::of::<T>())
    }

    /// Selects the shape per request
    pub fn select<F>(factory: F) -> Self
    where
        F: Fn(&Request) -> Result<Shape, BoxError> + Send + Sync + 'static,
    {
        BindTarget::Factory(Arc::new(factory))
    }

    /// The shape to bind `req` onto.
    ///
    /// A factory failure is [`ModelSelect`](ErrorKind::ModelSelect), a shape that is not
    /// struct-like is [`ModelSelectType`](ErrorKind::ModelSelectType). Neither aborts the request.
    pub fn resolve(&self, req: &Request) -> Result<Shape, BindError> {
        let shape = match self {
            BindTarget::Fixed(shape) => shape.clone(),
            BindTarget::Factory(factory) => factory(req).map_err(|e| BindError::new(ErrorKind::ModelSelect, e))?,
        };

        if !shape.is_struct_like() {
            return Err(BindError::new(ErrorKind::ModelSelectType, SelectError::NotStructLike(shape.type_name())));
        }
        Ok(shape)
    }
}

impl fmt::Debug for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindTarget::Fixed(shape) => f.debug_tuple("Fixed").field(shape).finish(),
            BindTarget::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// Runs the declared constraints, then the model's own request check
pub(crate) fn validate(model: &dyn BoundModel, req: &Request) -> Result<(), BindError> {
    model.validate_fields().map_err(|errors| BindError::new(ErrorKind::BodyValidate, errors))?;
    model
        .validate_request(req)
        .map_err(|message| BindError::new(ErrorKind::SelfValidate, RequestRejected(message)))
}

fn probe_struct_like<T: DeserializeOwned>() -> bool {
    let struct_like = Cell::new(false);
    let _probe = T::deserialize(Probe { struct_like: &struct_like });
    struct_like.get()
}

/// Deserializer that records which shape a type asks for and then fails
struct Probe<'a> {
    struct_like: &'a Cell<bool>,
}

impl<'de> de::Deserializer<'de> for Probe<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("probe"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.struct_like.set(true);
        Err(de::Error::custom("probe"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        self.struct_like.set(true);
        Err(de::Error::custom("probe"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}
