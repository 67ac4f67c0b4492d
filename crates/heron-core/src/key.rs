//! Canonical argument keys.
//!
//! Memoization looks results up by a [`CacheKey`] built from the full argument
//! value. The value is serialized into a tagged tree: every node records its
//! serde kind alongside its content, so `None`, `Some(None)`, `()` and a unit
//! struct all get different keys, and non-finite floats keep their identity.
//! Map entries are sorted by the canonical form of their keys, so two
//! `HashMap` arguments with equal contents produce the same key regardless
//! of iteration order.
//!
//! Canonicalization happens at call time. A value whose `Serialize` impl
//! fails has no canonical form and fails then, not when the wrapper is built.

use serde::ser::{self, Error as _, Serialize};
use serde_json::{json, Number, Value};
use std::fmt;

/// A normalized, comparable representation of a call's arguments.
///
/// Two argument values of the same type produce the same key exactly when
/// they serialize to the same serde data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Canonicalizes an argument value.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when the value refuses to serialize.
    pub fn from_args<A>(args: &A) -> Result<Self, serde_json::Error>
    where
        A: Serialize + ?Sized,
    {
        let tree = args.serialize(Canonical)?;
        Ok(Self(tree.to_string()))
    }

    /// Returns the canonical text of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn float(v: f64) -> Value {
    if v.is_nan() {
        return json!(["f", format!("nan:{:016x}", v.to_bits())]);
    }
    match Number::from_f64(v) {
        Some(n) => json!(["f", n]),
        None if v > 0.0 => json!(["f", "+inf"]),
        None => json!(["f", "-inf"]),
    }
}

/// Serializer producing the tagged tree behind a [`CacheKey`].
struct Canonical;

/// Collects the elements of sequences, tuples and structs.
struct Compound {
    head: Vec<Value>,
    items: Vec<Value>,
}

impl Compound {
    fn new(head: Vec<Value>, len: Option<usize>) -> Self {
        Self {
            head,
            items: Vec::with_capacity(len.unwrap_or(0)),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.items.push(value.serialize(Canonical)?);
        Ok(())
    }

    fn push_field<T: Serialize + ?Sized>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.items.push(json!([name, value.serialize(Canonical)?]));
        Ok(())
    }

    fn finish(mut self) -> Value {
        self.head.push(Value::Array(self.items));
        Value::Array(self.head)
    }
}

/// Collects map entries, sorted by key on completion.
struct Entries {
    entries: Vec<(String, Value, Value)>,
    pending: Option<Value>,
}

impl ser::Serializer for Canonical {
    type Ok = Value;
    type Error = serde_json::Error;
    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Entries;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, v: bool) -> Result<Value, Self::Error> {
        Ok(json!(["b", v]))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Self::Error> {
        Ok(json!(["i", i64::from(v)]))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Self::Error> {
        Ok(json!(["i", i64::from(v)]))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Self::Error> {
        Ok(json!(["i", i64::from(v)]))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Self::Error> {
        Ok(json!(["i", v]))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, Self::Error> {
        Ok(json!(["i", v.to_string()]))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Self::Error> {
        Ok(json!(["u", u64::from(v)]))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Self::Error> {
        Ok(json!(["u", u64::from(v)]))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Self::Error> {
        Ok(json!(["u", u64::from(v)]))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Self::Error> {
        Ok(json!(["u", v]))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, Self::Error> {
        Ok(json!(["u", v.to_string()]))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Self::Error> {
        Ok(float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Self::Error> {
        Ok(float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, Self::Error> {
        Ok(json!(["c", v.to_string()]))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Self::Error> {
        Ok(json!(["s", v]))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Self::Error> {
        Ok(json!(["bytes", v]))
    }

    fn serialize_none(self) -> Result<Value, Self::Error> {
        Ok(json!(["none"]))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, Self::Error> {
        Ok(json!(["some", value.serialize(Canonical)?]))
    }

    fn serialize_unit(self) -> Result<Value, Self::Error> {
        Ok(json!(["unit"]))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, Self::Error> {
        Ok(json!(["unit_struct", name]))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, Self::Error> {
        Ok(json!(["unit_variant", name, variant]))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, Self::Error> {
        Ok(json!(["newtype", name, value.serialize(Canonical)?]))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Self::Error> {
        Ok(json!(["newtype_variant", name, variant, value.serialize(Canonical)?]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound, Self::Error> {
        Ok(Compound::new(vec![json!("seq")], len))
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound, Self::Error> {
        Ok(Compound::new(vec![json!("tuple")], Some(len)))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Compound, Self::Error> {
        Ok(Compound::new(vec![json!("tuple_struct"), json!(name)], Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Compound, Self::Error> {
        Ok(Compound::new(
            vec![json!("tuple_variant"), json!(name), json!(variant)],
            Some(len),
        ))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Entries, Self::Error> {
        Ok(Entries {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Compound, Self::Error> {
        Ok(Compound::new(vec![json!("struct"), json!(name)], Some(len)))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Compound, Self::Error> {
        Ok(Compound::new(
            vec![json!("struct_variant"), json!(name), json!(variant)],
            Some(len),
        ))
    }
}

impl ser::SerializeSeq for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.push_field(key, value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for Compound {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.push_field(key, value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for Entries {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.pending = Some(key.serialize(Canonical)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .pending
            .take()
            .ok_or_else(|| serde_json::Error::custom("map value serialized before its key"))?;
        let value = value.serialize(Canonical)?;
        self.entries.push((key.to_string(), key, value));
        Ok(())
    }

    fn end(mut self) -> Result<Value, Self::Error> {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        let entries: Vec<Value> = self
            .entries
            .into_iter()
            .map(|(_, key, value)| json!([key, value]))
            .collect();
        Ok(json!(["map", entries]))
    }
}
