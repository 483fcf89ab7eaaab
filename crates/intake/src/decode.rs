//! Serde adapters used when binding.
//!
//! [`FormDeserializer`] reads a [`FormValues`] multimap directly: a key with several values
//! can fill a sequence, a single value is parsed into whatever scalar the field asks for.
//! [`Filled`] wraps any deserializer so that struct fields missing from the input take their
//! zero value instead of failing, the way a freshly allocated value would look. [`Zero`]
//! produces those zero values: empty strings and collections, `0`, `false` and `None`.

use crate::values::FormValues;
use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use std::fmt;
use std::marker::PhantomData;

pub(crate) type Error = de::value::Error;

pub(crate) struct FormDeserializer<'a> {
    values: &'a FormValues,
}

impl<'a> FormDeserializer<'a> {
    pub(crate) fn new(values: &'a FormValues) -> Self {
        Self { values }
    }
}

impl<'de> Deserializer<'de> for FormDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_map(FormMap { iter: self.values.iter(), pending: None })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct FormMap<'a, I> {
    iter: I,
    pending: Option<&'a [String]>,
}

impl<'de, 'a, I> MapAccess<'de> for FormMap<'a, I>
where
    I: Iterator<Item = (&'a str, &'a [String])>,
{
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        let Some((key, values)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some(values);
        seed.deserialize(StrDeserializer::<Error>::new(key)).map(Some)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, Error> {
        let values = self
            .pending
            .take()
            .ok_or_else(|| <Error as de::Error>::custom("value requested before its key"))?;
        seed.deserialize(ValuesDeserializer { values })
    }
}

/// Every value given for one key
struct ValuesDeserializer<'a> {
    values: &'a [String],
}

impl ValuesDeserializer<'_> {
    fn first(&self) -> TextDeserializer<'_> {
        TextDeserializer(self.values.first().map_or("", String::as_str))
    }
}

macro_rules! forward_to_first {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            self.first().$method(visitor)
        }
    )*};
}

impl<'de> Deserializer<'de> for ValuesDeserializer<'_> {
    type Error = Error;

    forward_to_first! {
        deserialize_any deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32
        deserialize_i64 deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32
        deserialize_u64 deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_option deserialize_unit deserialize_map deserialize_identifier
        deserialize_ignored_any
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_seq(TextSeq { iter: self.values.iter().map(String::as_str) })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, name: &'static str, visitor: V) -> Result<V::Value, Error> {
        self.first().deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.first().deserialize_struct(name, fields, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.first().deserialize_enum(name, variants, visitor)
    }
}

struct TextSeq<I> {
    iter: I,
}

impl<'de, 'a, I: Iterator<Item = &'a str>> SeqAccess<'de> for TextSeq<I> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Error> {
        match self.iter.next() {
            Some(text) => seed.deserialize(TextDeserializer(text)).map(Some),
            None => Ok(None),
        }
    }
}

/// One form value, parsed on demand. An empty value is the zero value of any scalar.
struct TextDeserializer<'a>(&'a str);

macro_rules! parse_scalar {
    ($($method:ident => $visit:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            if self.0.is_empty() {
                return Zero::<Error>::new().$method(visitor);
            }
            let value = self
                .0
                .parse()
                .map_err(|e| <Error as de::Error>::custom(format_args!("invalid value `{}`: {e}", self.0)))?;
            visitor.$visit(value)
        }
    )*};
}

impl<'de> Deserializer<'de> for TextDeserializer<'_> {
    type Error = Error;

    parse_scalar! {
        deserialize_i8 => visit_i8
        deserialize_i16 => visit_i16
        deserialize_i32 => visit_i32
        deserialize_i64 => visit_i64
        deserialize_i128 => visit_i128
        deserialize_u8 => visit_u8
        deserialize_u16 => visit_u16
        deserialize_u32 => visit_u32
        deserialize_u64 => visit_u64
        deserialize_u128 => visit_u128
        deserialize_f32 => visit_f32
        deserialize_f64 => visit_f64
        deserialize_char => visit_char
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.0)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" | "off" => visitor.visit_bool(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" | "on" => visitor.visit_bool(true),
            other => Err(de::Error::invalid_value(Unexpected::Str(other), &visitor)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.0)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.0)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.0)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_bytes(self.0.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_bytes(self.0.as_bytes())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        if self.0.is_empty() { visitor.visit_none() } else { visitor.visit_some(self) }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_seq(TextSeq { iter: std::iter::once(self.0) })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        Err(de::Error::invalid_type(Unexpected::Str(self.0), &visitor))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        Err(de::Error::invalid_type(Unexpected::Str(self.0), &visitor))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_enum(StrDeserializer::<Error>::new(self.0))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }
}

/// Yields the zero value of whatever type is asked for.
///
/// Structs are zeroed field by field. Enums have no zero value and fail.
pub(crate) struct Zero<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> Zero<E> {
    pub(crate) fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

macro_rules! zero_scalar {
    ($($method:ident => $visit:ident($value:expr))*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
            visitor.$visit($value)
        }
    )*};
}

impl<'de, E: de::Error> Deserializer<'de> for Zero<E> {
    type Error = E;

    zero_scalar! {
        deserialize_bool => visit_bool(false)
        deserialize_i8 => visit_i8(0)
        deserialize_i16 => visit_i16(0)
        deserialize_i32 => visit_i32(0)
        deserialize_i64 => visit_i64(0)
        deserialize_i128 => visit_i128(0)
        deserialize_u8 => visit_u8(0)
        deserialize_u16 => visit_u16(0)
        deserialize_u32 => visit_u32(0)
        deserialize_u64 => visit_u64(0)
        deserialize_u128 => visit_u128(0)
        deserialize_f32 => visit_f32(0.0)
        deserialize_f64 => visit_f64(0.0)
        deserialize_char => visit_char('\0')
        deserialize_str => visit_str("")
        deserialize_string => visit_str("")
        deserialize_identifier => visit_str("")
        deserialize_bytes => visit_bytes(&[])
        deserialize_byte_buf => visit_bytes(&[])
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_unit()
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_none()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, E> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, E> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_seq(Nothing::<E>::new())
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, E> {
        visitor.visit_seq(Nothing::<E>::new())
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, E> {
        visitor.visit_seq(Nothing::<E>::new())
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_map(Nothing::<E>::new())
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, E> {
        FillVisitor { inner: visitor, fields }.visit_map(Nothing::<E>::new())
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, E> {
        Err(de::Error::custom(format_args!("enum `{name}` has no zero value")))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        visitor.visit_unit()
    }
}

/// An empty sequence or map
struct Nothing<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> Nothing<E> {
    fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<'de, E: de::Error> SeqAccess<'de> for Nothing<E> {
    type Error = E;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, _seed: T) -> Result<Option<T::Value>, E> {
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

impl<'de, E: de::Error> MapAccess<'de> for Nothing<E> {
    type Error = E;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, _seed: K) -> Result<Option<K::Value>, E> {
        Ok(None)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, _seed: S) -> Result<S::Value, E> {
        Err(de::Error::custom("value requested from an empty map"))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

/// Fills the struct fields the wrapped deserializer leaves out with [`Zero`].
///
/// Applies to nested structs too, including those inside options and sequences.
pub(crate) struct Filled<D>(pub(crate) D);

macro_rules! forward_to_inner {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, D::Error> {
            self.0.$method(visitor)
        }
    )*};
}

impl<'de, D: Deserializer<'de>> Deserializer<'de> for Filled<D> {
    type Error = D::Error;

    forward_to_inner! {
        deserialize_any deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32
        deserialize_i64 deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32
        deserialize_u64 deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_unit deserialize_map deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, D::Error> {
        self.0.deserialize_option(FillOption(visitor))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, D::Error> {
        self.0.deserialize_seq(FillElements(visitor))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, D::Error> {
        self.0.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, name: &'static str, visitor: V) -> Result<V::Value, D::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_newtype_struct(name, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_struct(name, fields, FillVisitor { inner: visitor, fields })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, D::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

struct FillSeed<S>(S);

impl<'de, S: DeserializeSeed<'de>> DeserializeSeed<'de> for FillSeed<S> {
    type Value = S::Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<S::Value, D::Error> {
        self.0.deserialize(Filled(deserializer))
    }
}

struct FillOption<V>(V);

impl<'de, V: Visitor<'de>> Visitor<'de> for FillOption<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.expecting(f)
    }

    fn visit_none<E: de::Error>(self) -> Result<V::Value, E> {
        self.0.visit_none()
    }

    fn visit_unit<E: de::Error>(self) -> Result<V::Value, E> {
        self.0.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<V::Value, D::Error> {
        self.0.visit_some(Filled(deserializer))
    }
}

struct FillElements<V>(V);

impl<'de, V: Visitor<'de>> Visitor<'de> for FillElements<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.expecting(f)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<V::Value, A::Error> {
        self.0.visit_seq(FillSeq(seq))
    }
}

struct FillSeq<A>(A);

impl<'de, A: SeqAccess<'de>> SeqAccess<'de> for FillSeq<A> {
    type Error = A::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, A::Error> {
        self.0.next_element_seed(FillSeed(seed))
    }

    fn size_hint(&self) -> Option<usize> {
        self.0.size_hint()
    }
}

struct FillVisitor<V> {
    inner: V,
    fields: &'static [&'static str],
}

impl<'de, V: Visitor<'de>> Visitor<'de> for FillVisitor<V> {
    type Value = V::Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.expecting(f)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<V::Value, A::Error> {
        self.inner.visit_map(FillMap {
            inner: map,
            fields: self.fields,
            seen: Vec::new(),
            exhausted: false,
            next: 0,
            missing: false,
        })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<V::Value, A::Error> {
        self.inner.visit_seq(seq)
    }
}

/// Replays the wrapped map, then hands out every field it never named
struct FillMap<A> {
    inner: A,
    fields: &'static [&'static str],
    seen: Vec<String>,
    exhausted: bool,
    next: usize,
    missing: bool,
}

impl<'de, A: MapAccess<'de>> MapAccess<'de> for FillMap<A> {
    type Error = A::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, A::Error> {
        if !self.exhausted {
            if let Some(key) = self.inner.next_key::<String>()? {
                let field = seed.deserialize(StrDeserializer::<A::Error>::new(&key))?;
                self.seen.push(key);
                return Ok(Some(field));
            }
            self.exhausted = true;
        }

        while let Some(&field) = self.fields.get(self.next) {
            self.next += 1;
            if !self.seen.iter().any(|seen| seen == field) {
                self.missing = true;
                return seed.deserialize(StrDeserializer::<A::Error>::new(field)).map(Some);
            }
        }
        Ok(None)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, A::Error> {
        if std::mem::take(&mut self.missing) {
            return seed.deserialize(Zero::<A::Error>::new());
        }
        self.inner.next_value_seed(FillSeed(seed))
    }

    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Address {
        city: String,
        zip: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        name: String,
        age: u8,
        admin: bool,
        tags: Vec<String>,
        nick: Option<String>,
        home: Address,
    }

    fn zero_profile() -> Profile {
        Profile {
            name: String::new(),
            age: 0,
            admin: false,
            tags: Vec::new(),
            nick: None,
            home: Address { city: String::new(), zip: 0 },
        }
    }

    fn from_form<T: for<'de> Deserialize<'de>>(pairs: &[(&str, &str)]) -> Result<T, Error> {
        let values = FormValues::from_pairs(pairs.iter().copied());
        T::deserialize(Filled(FormDeserializer::new(&values)))
    }

    #[test]
    fn zero_fills_every_field() {
        let profile = Profile::deserialize(Zero::<Error>::new()).unwrap();
        assert_eq!(profile, zero_profile());
    }

    #[test]
    fn form_fields_left_out_are_zero() {
        let profile: Profile = from_form(&[("name", "tom")]).unwrap();
        assert_eq!(profile, Profile { name: "tom".into(), ..zero_profile() });
    }

    #[test]
    fn repeated_form_keys_fill_sequences() {
        let profile: Profile = from_form(&[("tags", "a"), ("tags", "b"), ("age", "9")]).unwrap();
        assert_eq!(profile.tags, ["a", "b"]);
        assert_eq!(profile.age, 9);

        let profile: Profile = from_form(&[("tags", "solo")]).unwrap();
        assert_eq!(profile.tags, ["solo"]);
    }

    #[test]
    fn repeated_form_keys_bind_the_first_value_to_scalars() {
        let profile: Profile = from_form(&[("name", "first"), ("name", "second")]).unwrap();
        assert_eq!(profile.name, "first");
    }

    #[test]
    fn form_scalars_are_parsed() {
        let profile: Profile = from_form(&[("admin", "on"), ("nick", "t"), ("age", "")]).unwrap();
        assert!(profile.admin);
        assert_eq!(profile.nick.as_deref(), Some("t"));
        assert_eq!(profile.age, 0);

        let profile: Profile = from_form(&[("nick", "")]).unwrap();
        assert_eq!(profile.nick, None);

        let err = from_form::<Profile>(&[("age", "300")]).unwrap_err();
        assert!(err.to_string().contains("invalid value `300`"), "{err}");

        assert!(from_form::<Profile>(&[("admin", "maybe")]).is_err());
    }

    #[test]
    fn form_values_bind_unit_enums() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum Plan {
            Free,
            Pro,
        }

        #[derive(Debug, Deserialize)]
        struct Order {
            plan: Plan,
        }

        let order: Order = from_form(&[("plan", "pro")]).unwrap();
        assert_eq!(order.plan, Plan::Pro);

        let order: Order = from_form(&[("plan", "free")]).unwrap();
        assert_eq!(order.plan, Plan::Free);

        assert!(from_form::<Order>(&[]).is_err());
        assert!(from_form::<Order>(&[("plan", "gold")]).is_err());
    }

    #[test]
    fn json_fields_left_out_are_zero_at_every_depth() {
        let json = br#"{"name":"amy","home":{"city":"oslo"},"nick":null}"#;
        let mut de = serde_json::Deserializer::from_slice(json);
        let profile = Profile::deserialize(Filled(&mut de)).unwrap();
        de.end().unwrap();

        let expected = Profile {
            name: "amy".into(),
            home: Address { city: "oslo".into(), zip: 0 },
            ..zero_profile()
        };
        assert_eq!(profile, expected);
    }

    #[test]
    fn json_structs_inside_sequences_and_options_are_filled() {
        #[derive(Debug, Deserialize)]
        struct Book {
            shelf: Vec<Address>,
            spare: Option<Address>,
        }

        let json = br#"{"shelf":[{"zip":1},{"city":"rome"}],"spare":{"zip":7}}"#;
        let book = Book::deserialize(Filled(&mut serde_json::Deserializer::from_slice(json))).unwrap();
        assert_eq!(book.shelf[0], Address { city: String::new(), zip: 1 });
        assert_eq!(book.shelf[1], Address { city: "rome".into(), zip: 0 });
        assert_eq!(book.spare, Some(Address { city: String::new(), zip: 7 }));
    }

    #[test]
    fn present_fields_still_reject_bad_types() {
        let json = br#"{"age":"old"}"#;
        assert!(Profile::deserialize(Filled(&mut serde_json::Deserializer::from_slice(json))).is_err());
    }
}
