//! Per-request key/value scope.
//!
//! The scope lives in the request's [`http::Extensions`], so it travels with the request
//! through every handler without any extra plumbing. Writing to a request without a scope
//! attaches one on the fly.
//!
//! # Example
//!
//! ```
//! use micro_intake::{context, Body};
//!
//! let mut req = http::Request::get("/").body(Body::empty()).unwrap();
//! context::set(&mut req, "user", String::from("tom"));
//!
//! let forked = context::fork(&req);
//! context::set(&mut req, "user", String::from("jerry"));
//!
//! assert_eq!(context::get_string(&forked, "user"), "tom");
//! assert_eq!(context::get_string(&req, "user"), "jerry");
//! ```

use crate::body::Body;
use crate::Request;
use bytes::Bytes;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

pub const ABORT_KEY: &str = "__abort";
pub const REQ_DATA_KEY: &str = "__req_data";
pub const BODY_DATA_KEY: &str = "__body_data";

pub type Value = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Default)]
pub struct Scope {
    values: HashMap<String, Value>,
}

impl Scope {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Attaches an empty scope, replacing any scope already present
pub fn new_scope(req: &mut Request) -> &mut Request {
    req.extensions_mut().insert(Scope::default());
    req
}

pub fn scope(req: &Request) -> Option<&Scope> {
    req.extensions().get::<Scope>()
}

fn scope_mut(req: &mut Request) -> &mut Scope {
    req.extensions_mut().get_or_insert_default::<Scope>()
}

pub fn get(req: &Request, key: &str) -> Option<Value> {
    scope(req)?.values.get(key).cloned()
}

pub fn get_ref<'a, T: Any>(req: &'a Request, key: &str) -> Option<&'a T> {
    scope(req)?.values.get(key)?.downcast_ref::<T>()
}

pub fn get_as<T: Any + Clone>(req: &Request, key: &str) -> Option<T> {
    get_ref::<T>(req, key).cloned()
}

pub fn get_or<T: Any + Clone>(req: &Request, key: &str, default: T) -> T {
    get_as(req, key).unwrap_or(default)
}

pub fn set<T: Any + Send + Sync>(req: &mut Request, key: impl Into<String>, value: T) -> &mut Request {
    set_shared(req, key, Arc::new(value))
}

/// Stores an already shared value without wrapping it again
pub fn set_shared(req: &mut Request, key: impl Into<String>, value: Value) -> &mut Request {
    scope_mut(req).values.insert(key.into(), value);
    req
}

pub fn remove(req: &mut Request, key: &str) -> Option<Value> {
    req.extensions_mut().get_mut::<Scope>()?.values.remove(key)
}

/// Creates a new request sharing method, uri, version, headers and extensions with `req`,
/// holding its own copy of the scope.
///
/// The copy is shallow: values are shared, the mapping is not. The body is copied only when
/// it has already been captured, otherwise the fork gets an empty body.
pub fn fork(req: &Request) -> Request {
    let body = req.body().buffered().map_or_else(Body::empty, Body::once);

    let mut forked = http::Request::new(body);
    *forked.method_mut() = req.method().clone();
    *forked.uri_mut() = req.uri().clone();
    *forked.version_mut() = req.version();
    *forked.headers_mut() = req.headers().clone();
    *forked.extensions_mut() = req.extensions().clone();
    forked
}

macro_rules! typed_getter {
    ($get:ident, $get_or:ident, $ty:ty) => {
        #[doc = concat!("The `", stringify!($ty), "` stored at `key`, or its zero value")]
        pub fn $get(req: &Request, key: &str) -> $ty {
            $get_or(req, key, <$ty>::default())
        }

        pub fn $get_or(req: &Request, key: &str, default: $ty) -> $ty {
            get_as::<$ty>(req, key).unwrap_or(default)
        }
    };
}

typed_getter!(get_i64, get_i64_or, i64);
typed_getter!(get_i32, get_i32_or, i32);
typed_getter!(get_u64, get_u64_or, u64);
typed_getter!(get_u32, get_u32_or, u32);
typed_getter!(get_usize, get_usize_or, usize);
typed_getter!(get_f64, get_f64_or, f64);
typed_getter!(get_bool, get_bool_or, bool);
typed_getter!(get_bytes, get_bytes_or, Bytes);

/// The string stored at `key`; `&'static str` values are accepted too, empty reads as absent
pub fn get_string_or(req: &Request, key: &str, default: &str) -> String {
    let value = get_ref::<String>(req, key)
        .map(String::as_str)
        .or_else(|| get_ref::<&'static str>(req, key).copied())
        .filter(|s| !s.is_empty());
    value.unwrap_or(default).to_owned()
}

pub fn get_string(req: &Request, key: &str) -> String {
    get_string_or(req, key, "")
}

pub fn get_time_or(req: &Request, key: &str, default: SystemTime) -> SystemTime {
    get_as::<SystemTime>(req, key).unwrap_or(default)
}

pub fn get_time(req: &Request, key: &str) -> SystemTime {
    get_time_or(req, key, SystemTime::UNIX_EPOCH)
}

pub fn abort(req: &mut Request) {
    set(req, ABORT_KEY, true);
}

/// Clears the abort flag so the request can be run through another chain
pub fn resume(req: &mut Request) {
    set(req, ABORT_KEY, false);
}

pub fn is_aborted(req: &Request) -> bool {
    get_ref::<bool>(req, ABORT_KEY).copied().unwrap_or(false)
}

/// The model stored by a successful bind
pub fn bound<T: Any + Send + Sync>(req: &Request) -> Option<Arc<T>> {
    get(req, REQ_DATA_KEY)?.downcast::<T>().ok()
}

/// The raw body bytes captured during bind, kept even when a later stage failed
pub fn body_data(req: &Request) -> Option<Bytes> {
    get_as(req, BODY_DATA_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        http::Request::post("/users?id=1").header("x-a", "1").body(Body::from("payload")).unwrap()
    }

    #[test]
    fn set_attaches_scope_on_first_write() {
        let mut req = request();
        assert!(scope(&req).is_none());
        assert!(get(&req, "k").is_none());

        let same = set(&mut req, "k", 1_i64);
        assert_eq!(same.uri().path(), "/users");
        assert_eq!(get_i64(&req, "k"), 1);
        assert_eq!(scope(&req).map(Scope::len), Some(1));
    }

    #[test]
    fn new_scope_discards_previous_values() {
        let mut req = request();
        set(&mut req, "k", true);
        new_scope(&mut req);
        assert!(!get_bool(&req, "k"));
        assert!(scope(&req).is_some_and(Scope::is_empty));
    }

    #[test]
    fn fork_is_independent() {
        let mut original = request();
        set(&mut original, "k", String::from("v1"));

        let mut forked = fork(&original);
        set(&mut forked, "k", String::from("v2"));
        set(&mut forked, "only_fork", 1_u32);

        assert_eq!(get_string(&original, "k"), "v1");
        assert_eq!(get_string(&forked, "k"), "v2");
        assert!(get(&original, "only_fork").is_none());

        remove(&mut original, "k");
        assert_eq!(get_string(&forked, "k"), "v2");

        assert_eq!(forked.method(), original.method());
        assert_eq!(forked.uri(), original.uri());
        assert_eq!(forked.headers().get("x-a").unwrap(), "1");
        assert_eq!(forked.body().buffered(), Some(Bytes::from_static(b"payload")));
    }

    #[test]
    fn typed_accessors_fall_back_on_mismatch() {
        let mut req = request();
        set(&mut req, "n", 15_i64);
        set(&mut req, "s", "");
        set(&mut req, "t", SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(5));

        assert_eq!(get_i64(&req, "n"), 15);
        assert_eq!(get_i32(&req, "n"), 0);
        assert_eq!(get_i32_or(&req, "n", 7), 7);
        assert_eq!(get_string(&req, "n"), "");
        assert_eq!(get_string_or(&req, "s", "fallback"), "fallback");
        assert_eq!(get_string_or(&req, "missing", "fallback"), "fallback");
        assert_eq!(get_time(&req, "t"), SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(5));
        assert_eq!(get_time(&req, "n"), SystemTime::UNIX_EPOCH);
        assert!(get_f64(&req, "missing").abs() < f64::EPSILON);
        assert_eq!(get_or(&req, "n", 3_i64), 15);
    }

    #[test]
    fn abort_flag_can_be_cleared() {
        let mut req = request();
        assert!(!is_aborted(&req));
        abort(&mut req);
        assert!(is_aborted(&req));
        resume(&mut req);
        assert!(!is_aborted(&req));
    }

    #[test]
    fn bound_model_is_shared() {
        #[derive(Debug, PartialEq)]
        struct User {
            name: String,
        }

        let mut req = request();
        set(&mut req, REQ_DATA_KEY, User { name: "tom".into() });

        let user = bound::<User>(&req).unwrap();
        assert_eq!(user.name, "tom");
        assert!(bound::<String>(&req).is_none());
    }
}
