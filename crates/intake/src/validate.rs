//! Declared field constraints.
//!
//! Constraints are declared once per type inside [`Validate::validate`] with a [`Checks`]
//! builder. Every failed constraint is recorded as a [`FieldError`] and the whole set is
//! returned untouched, so callers decide how to render it.
//!
//! # Example
//!
//! ```
//! use micro_intake::validate::{Checks, Validate, ValidationErrors};
//!
//! struct User {
//!     name: String,
//!     age: u8,
//! }
//!
//! impl Validate for User {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         Checks::for_struct("User")
//!             .required("Name", &self.name)
//!             .gte("Age", self.age, 1)
//!             .lte("Age", self.age, 150)
//!             .finish()
//!     }
//! }
//!
//! let err = User { name: String::new(), age: 0 }.validate().unwrap_err();
//! assert_eq!(err.to_line(), "User.Name failed on tag 'required'; User.Age failed on tag 'gte'");
//! ```

use std::fmt;
use thiserror::Error;

/// Structural constraints of a bindable type, passing by default
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// dotted path starting at the struct name, like `User.Addr.City`
    pub path: String,
    pub tag: &'static str,
    pub param: Option<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed on tag '{}'", self.path, self.tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.to_line())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Renders every diagnostic on one line: `<path> failed on tag '<tag>'; ...`
    pub fn to_line(&self) -> String {
        self.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Values that can be checked by `required`
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! numeric_presence {
    ($($ty:ty),*) => {
        $(
            impl Presence for $ty {
                fn is_present(&self) -> bool {
                    *self != <$ty>::default()
                }
            }
        )*
    };
}

numeric_presence!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

/// Values with a length, checked by `min`, `max` and `len`
pub trait Measure {
    fn measure(&self) -> usize;
}

impl Measure for str {
    fn measure(&self) -> usize {
        self.chars().count()
    }
}

impl Measure for String {
    fn measure(&self) -> usize {
        self.as_str().measure()
    }
}

impl<T> Measure for [T] {
    fn measure(&self) -> usize {
        self.len()
    }
}

impl<T> Measure for Vec<T> {
    fn measure(&self) -> usize {
        self.len()
    }
}

#[derive(Debug)]
pub struct Checks {
    prefix: String,
    errors: ValidationErrors,
}

impl Checks {
    pub fn for_struct(name: &str) -> Self {
        Self { prefix: format!("{name}."), errors: ValidationErrors::new() }
    }

    fn record(mut self, field: &str, tag: &'static str, param: Option<String>) -> Self {
        self.errors.push(FieldError { path: format!("{}{field}", self.prefix), tag, param });
        self
    }

    /// Records `tag` for `field` when `ok` is false
    pub fn check(self, field: &str, tag: &'static str, ok: bool) -> Self {
        if ok { self } else { self.record(field, tag, None) }
    }

    pub fn required<V: Presence + ?Sized>(self, field: &str, value: &V) -> Self {
        self.check(field, "required", value.is_present())
    }

    pub fn min<V: Measure + ?Sized>(self, field: &str, value: &V, min: usize) -> Self {
        if value.measure() >= min { self } else { self.record(field, "min", Some(min.to_string())) }
    }

    pub fn max<V: Measure + ?Sized>(self, field: &str, value: &V, max: usize) -> Self {
        if value.measure() <= max { self } else { self.record(field, "max", Some(max.to_string())) }
    }

    pub fn len<V: Measure + ?Sized>(self, field: &str, value: &V, len: usize) -> Self {
        if value.measure() == len { self } else { self.record(field, "len", Some(len.to_string())) }
    }

    pub fn gte<N: PartialOrd + fmt::Display>(self, field: &str, value: N, bound: N) -> Self {
        if value >= bound { self } else { self.record(field, "gte", Some(bound.to_string())) }
    }

    pub fn lte<N: PartialOrd + fmt::Display>(self, field: &str, value: N, bound: N) -> Self {
        if value <= bound { self } else { self.record(field, "lte", Some(bound.to_string())) }
    }

    pub fn email(self, field: &str, value: &str) -> Self {
        self.check(field, "email", is_email(value))
    }

    pub fn oneof(self, field: &str, value: &str, options: &[&str]) -> Self {
        if options.contains(&value) {
            self
        } else {
            self.record(field, "oneof", Some(options.join(" ")))
        }
    }

    /// Runs the constraints of a nested value, re-rooting its paths under `field`
    pub fn nested<T: Validate + ?Sized>(mut self, field: &str, value: &T) -> Self {
        if let Err(nested) = value.validate() {
            for error in nested.errors {
                let rest = error.path.split_once('.').map_or(error.path.as_str(), |(_, rest)| rest);
                let path = format!("{}{field}.{rest}", self.prefix);
                self.errors.push(FieldError { path, ..error });
            }
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !value.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Addr {
        city: String,
    }

    impl Validate for Addr {
        fn validate(&self) -> Result<(), ValidationErrors> {
            Checks::for_struct("Addr").min("City", &self.city, 2).finish()
        }
    }

    struct User {
        name: String,
        email: String,
        role: String,
        tags: Vec<String>,
        age: i64,
        addr: Addr,
    }

    impl Validate for User {
        fn validate(&self) -> Result<(), ValidationErrors> {
            Checks::for_struct("User")
                .required("Name", &self.name)
                .max("Name", &self.name, 8)
                .email("Email", &self.email)
                .oneof("Role", &self.role, &["admin", "guest"])
                .len("Tags", &self.tags, 2)
                .gte("Age", self.age, 0)
                .nested("Addr", &self.addr)
                .finish()
        }
    }

    fn valid_user() -> User {
        User {
            name: "tom".into(),
            email: "tom@example.com".into(),
            role: "guest".into(),
            tags: vec!["a".into(), "b".into()],
            age: 15,
            addr: Addr { city: "NYC".into() },
        }
    }

    #[test]
    fn valid_value_passes() {
        assert!(valid_user().validate().is_ok());
    }

    #[test]
    fn failures_are_collected_in_declaration_order() {
        let user = User {
            name: "a very long name".into(),
            email: "not-an-email".into(),
            role: "root".into(),
            tags: vec![],
            age: -1,
            addr: Addr { city: "X".into() },
        };

        let errors = user.validate().unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.tag)).collect();
        assert_eq!(
            paths,
            [
                ("User.Name", "max"),
                ("User.Email", "email"),
                ("User.Role", "oneof"),
                ("User.Tags", "len"),
                ("User.Age", "gte"),
                ("User.Addr.City", "min"),
            ]
        );
        assert_eq!(errors.errors()[2].param.as_deref(), Some("admin guest"));
    }

    #[test]
    fn to_line_joins_diagnostics() {
        let errors = Checks::for_struct("Req").required("Addr", "").min("Code", "12", 3).finish().unwrap_err();
        assert_eq!(errors.to_line(), "Req.Addr failed on tag 'required'; Req.Code failed on tag 'min'");
        assert_eq!(errors.to_string(), errors.to_line());
    }

    #[test]
    fn length_counts_characters() {
        assert!(Checks::for_struct("S").len("Name", "上海", 2).finish().is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@b..co"));
    }
}
