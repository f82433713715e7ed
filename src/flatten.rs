//! Custom serde Serializer that flattens any `Serialize` value into a flat map
//! of dotted keys and string values, the inverse of [`crate::flat`].
//!
//! Works on a [`TreeNode`](crate::tree::TreeNode), a typed config struct, a
//! `HashMap`, or a `serde_json::Value` alike. Encoding rules:
//!
//! - scalar → `prefix = value`
//! - mapping or struct → recurse with `prefix.key`
//! - empty sequence → `prefix = ""`
//! - sequence of scalars, none containing a comma → `prefix = a,b,c`
//! - any other sequence → recurse with `prefix.0`, `prefix.1`, ...
//! - root sequence → always indexed, as `0`, `1`, ...
//!
//! `Option::None` and unit values are skipped.

use indexmap::IndexMap;
use serde::ser::{self, Serialize};

use crate::error::FlatfigError;

type FlatMap = IndexMap<String, String>;

/// Flatten a `Serialize` value into dotted key-value pairs.
///
/// `Outer { database: Inner { hosts: vec!["a", "b"] } }` → `{"database.hosts": "a,b"}`
///
/// The root must serialize as a mapping, struct, or sequence. A root scalar
/// has no key to live under and is rejected.
pub fn to_flat_map<S: Serialize + ?Sized>(source: &S) -> Result<FlatMap, FlatfigError> {
    let mut out = FlatMap::new();
    let serializer = FlattenSerializer {
        prefix: None,
        out: &mut out,
    };
    match source.serialize(serializer) {
        Ok(Shape::Scalar(_)) => Err(FlattenError::root().into()),
        Ok(_) => Ok(out),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug)]
pub struct FlattenError(String);

impl FlattenError {
    fn root() -> Self {
        FlattenError("the root of a flat map must be a mapping or a sequence".into())
    }
}

impl std::fmt::Display for FlattenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flatten error: {}", self.0)
    }
}

impl std::error::Error for FlattenError {}

impl ser::Error for FlattenError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        FlattenError(msg.to_string())
    }
}

impl From<FlattenError> for FlatfigError {
    fn from(e: FlattenError) -> Self {
        FlatfigError::InvalidValue {
            key: "<flatten>".into(),
            reason: e.0,
        }
    }
}

/// What a serialized value turned into.
///
/// Scalars are handed back to the caller instead of written, because only the
/// enclosing sequence knows whether they join into one value or get indices.
enum Shape {
    Absent,
    Scalar(String),
    /// Already written to the output.
    Written,
}

/// `prefix` is `None` at the root. An empty root-level key is `Some("")`, so
/// its children still get a leading dot.
struct FlattenSerializer<'a> {
    prefix: Option<String>,
    out: &'a mut FlatMap,
}

impl<'a> FlattenSerializer<'a> {
    fn child(prefix: String, out: &'a mut FlatMap) -> Self {
        Self {
            prefix: Some(prefix),
            out,
        }
    }
}

fn dotted(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        None => key.to_string(),
        Some(prefix) => format!("{prefix}.{key}"),
    }
}

/// Serialize `value` under `key`, writing it out if it came back as a scalar.
fn write_entry<T: Serialize + ?Sized>(
    out: &mut FlatMap,
    key: String,
    value: &T,
) -> Result<(), FlattenError> {
    let shape = value.serialize(FlattenSerializer::child(key.clone(), out))?;
    if let Shape::Scalar(text) = shape {
        out.insert(key, text);
    }
    Ok(())
}

impl<'a> ser::Serializer for FlattenSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;
    type SerializeSeq = FlattenSeqSerializer<'a>;
    type SerializeTuple = FlattenSeqSerializer<'a>;
    type SerializeTupleStruct = FlattenSeqSerializer<'a>;
    type SerializeTupleVariant = FlattenSeqSerializer<'a>;
    type SerializeMap = FlattenMapSerializer<'a>;
    type SerializeStruct = FlattenStructSerializer<'a>;
    type SerializeStructVariant = FlattenStructSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<Shape, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Shape, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Shape, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_u8(self, v: u8) -> Result<Shape, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<Shape, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<Shape, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_f64(self, v: f64) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_char(self, v: char) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Shape, Self::Error> {
        Ok(Shape::Scalar(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Shape, Self::Error> {
        Err(FlattenError("bytes not supported".into()))
    }

    fn serialize_none(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Absent)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Shape, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Absent)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Shape, Self::Error> {
        Ok(Shape::Absent)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Shape, Self::Error> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Shape, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Shape, Self::Error> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(FlattenSeqSerializer {
            prefix: self.prefix,
            out: self.out,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(FlattenMapSerializer {
            prefix: self.prefix,
            out: self.out,
            current_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(FlattenStructSerializer {
            prefix: self.prefix,
            out: self.out,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(FlattenStructSerializer {
            prefix: self.prefix,
            out: self.out,
        })
    }
}

// --- SerializeStruct ---

struct FlattenStructSerializer<'a> {
    prefix: Option<String>,
    out: &'a mut FlatMap,
}

impl<'a> ser::SerializeStruct for FlattenStructSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        write_entry(self.out, dotted(self.prefix.as_deref(), key), value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Written)
    }
}

impl<'a> ser::SerializeStructVariant for FlattenStructSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Written)
    }
}

// --- SerializeMap ---

struct FlattenMapSerializer<'a> {
    prefix: Option<String>,
    out: &'a mut FlatMap,
    current_key: Option<String>,
}

impl<'a> ser::SerializeMap for FlattenMapSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.current_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| FlattenError("map value without a key".into()))?;
        write_entry(self.out, dotted(self.prefix.as_deref(), &key), value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Written)
    }
}

// --- SerializeSeq (for Vec/array fields) ---

/// One buffered sequence element: its shape, plus whatever it wrote under
/// its indexed prefix if it was nested.
struct Element {
    shape: Shape,
    nested: FlatMap,
}

struct FlattenSeqSerializer<'a> {
    prefix: Option<String>,
    out: &'a mut FlatMap,
    items: Vec<Element>,
}

impl<'a> ser::SerializeSeq for FlattenSeqSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let prefix = dotted(self.prefix.as_deref(), &self.items.len().to_string());
        let mut nested = FlatMap::new();
        let shape = value.serialize(FlattenSerializer::child(prefix, &mut nested))?;
        if !matches!(shape, Shape::Absent) {
            self.items.push(Element { shape, nested });
        }
        Ok(())
    }

    fn end(self) -> Result<Shape, Self::Error> {
        let FlattenSeqSerializer { prefix, out, items } = self;

        // A root sequence has no key to join under, so it is always indexed.
        let Some(prefix) = prefix else {
            write_indexed(out, None, items);
            return Ok(Shape::Written);
        };

        if items.is_empty() {
            out.insert(prefix, String::new());
            return Ok(Shape::Written);
        }

        // A comma inside any element would be read back as a separator.
        let joinable = items
            .iter()
            .all(|e| matches!(&e.shape, Shape::Scalar(text) if !text.contains(',')));

        if joinable {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|e| match e.shape {
                    Shape::Scalar(text) => Some(text),
                    _ => None,
                })
                .collect();
            out.insert(prefix, parts.join(","));
        } else {
            write_indexed(out, Some(&prefix), items);
        }
        Ok(Shape::Written)
    }
}

fn write_indexed(out: &mut FlatMap, prefix: Option<&str>, items: Vec<Element>) {
    for (index, element) in items.into_iter().enumerate() {
        match element.shape {
            Shape::Scalar(text) => {
                out.insert(dotted(prefix, &index.to_string()), text);
            }
            _ => out.extend(element.nested),
        }
    }
}

impl<'a> ser::SerializeTuple for FlattenSeqSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleStruct for FlattenSeqSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleVariant for FlattenSeqSerializer<'a> {
    type Ok = Shape;
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

// --- Key serializer (map keys become path segments) ---

struct KeySerializer;

fn key_error() -> FlattenError {
    FlattenError("map keys must be strings or integers".into())
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = FlattenError;
    type SerializeSeq = ser::Impossible<String, FlattenError>;
    type SerializeTuple = ser::Impossible<String, FlattenError>;
    type SerializeTupleStruct = ser::Impossible<String, FlattenError>;
    type SerializeTupleVariant = ser::Impossible<String, FlattenError>;
    type SerializeMap = ser::Impossible<String, FlattenError>;
    type SerializeStruct = ser::Impossible<String, FlattenError>;
    type SerializeStructVariant = ser::Impossible<String, FlattenError>;

    fn serialize_str(self, v: &str) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }

    fn serialize_bool(self, _: bool) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_i8(self, v: i8) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_i16(self, v: i16) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_i32(self, v: i32) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_i64(self, v: i64) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_u8(self, v: u8) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_u16(self, v: u16) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_u32(self, v: u32) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_u64(self, v: u64) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_f32(self, _: f32) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_f64(self, _: f64) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_char(self, v: char) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_none(self) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_unit(self) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        v: &'static str,
    ) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        v: &T,
    ) -> Result<String, Self::Error> {
        v.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String, Self::Error> {
        Err(key_error())
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(key_error())
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(key_error())
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(key_error())
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(key_error())
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(key_error())
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(key_error())
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(key_error())
    }
}
