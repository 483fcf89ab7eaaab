//! Key to values multimap for query strings and form bodies.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuesError {
    #[error("invalid semicolon separator in `{0}`")]
    Semicolon(String),
    #[error("invalid percent escape in `{0}`")]
    InvalidEscape(String),
    #[error("values are not valid utf-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Decode(#[from] serde_urlencoded::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    inner: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` text.
    ///
    /// Segments separated by `;` and `%` signs not followed by two hex digits are rejected,
    /// empty segments are skipped.
    pub fn parse(raw: &[u8]) -> Result<Self, ValuesError> {
        let text = std::str::from_utf8(raw)?;
        for segment in text.split('&').filter(|s| !s.is_empty()) {
            if segment.contains(';') {
                return Err(ValuesError::Semicolon(segment.to_owned()));
            }
            if !valid_escapes(segment.as_bytes()) {
                return Err(ValuesError::InvalidEscape(segment.to_owned()));
            }
        }

        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(text)?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut values = Self::new();
        for (key, value) in pairs {
            values.append(key, value);
        }
        values
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// The first value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key)?.first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Adds the keys of `other` that are not present yet, keys already present are kept as is
    pub fn merge_absent(&mut self, other: &FormValues) {
        for (key, values) in &other.inner {
            if let Entry::Vacant(entry) = self.inner.entry(key.clone()) {
                entry.insert(values.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

fn valid_escapes(segment: &[u8]) -> bool {
    let mut i = 0;
    while i < segment.len() {
        if segment[i] == b'%' {
            match segment.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}
