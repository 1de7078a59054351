//! Mapping between typed objects and their JSON wire representation.
//!
//! Every object on the wire is a JSON object carrying a string discriminant in
//! `@type`. A Rust type participates in the protocol by implementing [`TdType`],
//! which is normally generated by the [`td_object!`](crate::td_object) macro for
//! concrete shapes and by [`td_union!`](crate::td_union) for closed groupings of
//! shapes.
//!
//! # Field mapping
//!
//! | protocol type | Rust type    | wire form                       |
//! |---------------|--------------|---------------------------------|
//! | `int32`       | `i32`        | number                          |
//! | `int53`       | `i64`        | number                          |
//! | `int64`       | [`Int64`]    | decimal string (number accepted) |
//! | `double`      | `f64`        | number                          |
//! | `Bool`        | `bool`       | boolean                         |
//! | `string`, `bytes` | `String` | string (bytes are base64 text)  |
//! | `vector<T>`   | `Vec<T>`     | array                           |
//! | optional `T`  | `Option<T>`  | omitted when `None`             |
//! | object/union  | struct/enum  | nested object with `@type`      |
//!
//! Unknown fields on a known `@type` are ignored; unknown `@type` values are
//! always an error.

mod macros;

use std::fmt;
use std::str::FromStr;

pub use serde_json::Value;

pub use crate::error::DecodeError;

pub type Map = serde_json::Map<String, Value>;

pub const TYPE_FIELD: &str = "@type";
pub const EXTRA_FIELD: &str = "@extra";
pub const CLIENT_ID_FIELD: &str = "@client_id";

/// A protocol object or a closed union of protocol objects.
pub trait TdType: Sized + Send + 'static {
    /// Rust-side name, used in error messages.
    const TYPE_NAME: &'static str;

    /// Whether `tag` selects this type (or one of its variants).
    fn has_tag(tag: &str) -> bool;

    /// The `@type` this value encodes to.
    fn tag(&self) -> &'static str;

    /// Builds the value from the fields of `map`. The `@type` has already been
    /// removed from `map` and checked with [`TdType::has_tag`].
    fn decode_tagged(tag: &str, map: &mut Map) -> Result<Self, DecodeError>;

    /// Writes every field except `@type` into `map`.
    fn encode_into(&self, map: &mut Map);
}

/// A request function: a protocol object answered by exactly one `Return` object.
pub trait Function: TdType {
    type Return: TdType;
}

/// Encodes `value` into a wire payload.
pub fn encode<T: TdType>(value: &T) -> Value {
    Value::Object(encode_map(value))
}

pub fn encode_map<T: TdType>(value: &T) -> Map {
    let mut map = Map::new();
    map.insert(TYPE_FIELD.to_owned(), Value::String(value.tag().to_owned()));
    value.encode_into(&mut map);
    map
}

/// Decodes a wire payload into `T`.
pub fn decode<T: TdType>(value: Value) -> Result<T, DecodeError> {
    match value {
        Value::Object(map) => decode_map(map),
        other => Err(DecodeError::TypeMismatch {
            type_name: T::TYPE_NAME,
            field: TYPE_FIELD,
            expected: "object",
            found: json_kind(&other),
        }),
    }
}

pub fn decode_str<T: TdType>(text: &str) -> Result<T, DecodeError> {
    decode(serde_json::from_str(text)?)
}

pub fn decode_map<T: TdType>(mut map: Map) -> Result<T, DecodeError> {
    let tag = match map.remove(TYPE_FIELD) {
        Some(Value::String(tag)) => tag,
        None | Some(Value::Null) => {
            return Err(DecodeError::MissingField {
                type_name: T::TYPE_NAME,
                field: TYPE_FIELD,
            });
        }
        Some(other) => {
            return Err(DecodeError::TypeMismatch {
                type_name: T::TYPE_NAME,
                field: TYPE_FIELD,
                expected: "string",
                found: json_kind(&other),
            });
        }
    };
    if !T::has_tag(&tag) {
        return Err(DecodeError::UnknownTag {
            tag,
            expected: T::TYPE_NAME,
        });
    }
    T::decode_tagged(&tag, &mut map)
}

/// Reads the `@type` of a payload without decoding it.
pub fn peek_tag(value: &Value) -> Option<&str> {
    value.get(TYPE_FIELD).and_then(Value::as_str)
}

pub fn peek_tag_map(map: &Map) -> Option<&str> {
    map.get(TYPE_FIELD).and_then(Value::as_str)
}

/// Where a field value sits, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct FieldCtx {
    pub type_name: &'static str,
    pub field: &'static str,
}

impl FieldCtx {
    pub fn missing(self) -> DecodeError {
        DecodeError::MissingField {
            type_name: self.type_name,
            field: self.field,
        }
    }

    pub fn mismatch(self, expected: &'static str, found: &Value) -> DecodeError {
        DecodeError::TypeMismatch {
            type_name: self.type_name,
            field: self.field,
            expected,
            found: json_kind(found),
        }
    }
}

/// A value that can occupy a field of a protocol object.
///
/// `from_slot` receives `None` when the field is absent; `to_slot` returns
/// `None` when the field must be omitted.
pub trait WireField: Sized {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError>;
    fn to_slot(&self) -> Option<Value>;
}

/// Removes `field` from `map` and decodes it. Used by generated code.
pub fn take_field<T: WireField>(
    map: &mut Map,
    type_name: &'static str,
    field: &'static str,
) -> Result<T, DecodeError> {
    T::from_slot(map.remove(field), FieldCtx { type_name, field })
}

/// Encodes `value` into `map` under `field`, omitting absent optionals.
pub fn put_field<T: WireField>(map: &mut Map, field: &'static str, value: &T) {
    if let Some(encoded) = value.to_slot() {
        map.insert(field.to_owned(), encoded);
    }
}

// Null counts as absent everywhere.
fn present(slot: Option<Value>, ctx: FieldCtx) -> Result<Value, DecodeError> {
    match slot {
        None | Some(Value::Null) => Err(ctx.missing()),
        Some(value) => Ok(value),
    }
}

/// Decodes a nested object field. Used by generated `WireField` impls.
pub fn object_from_slot<T: TdType>(slot: Option<Value>, ctx: FieldCtx) -> Result<T, DecodeError> {
    match present(slot, ctx)? {
        Value::Object(map) => decode_map(map),
        other => Err(ctx.mismatch("object", &other)),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl WireField for bool {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        match present(slot, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(ctx.mismatch("boolean", &other)),
        }
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }
}

impl WireField for i32 {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        let value = present(slot, ctx)?;
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| ctx.mismatch("int32", &value))
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::from(*self))
    }
}

impl WireField for i64 {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        let value = present(slot, ctx)?;
        value.as_i64().ok_or_else(|| ctx.mismatch("int53", &value))
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::from(*self))
    }
}

impl WireField for f64 {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        let value = present(slot, ctx)?;
        value.as_f64().ok_or_else(|| ctx.mismatch("double", &value))
    }

    fn to_slot(&self) -> Option<Value> {
        // Non-finite doubles have no JSON form.
        serde_json::Number::from_f64(*self).map(Value::Number)
    }
}

impl WireField for String {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        match present(slot, ctx)? {
            Value::String(s) => Ok(s),
            other => Err(ctx.mismatch("string", &other)),
        }
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }
}

impl<T: WireField> WireField for Option<T> {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        match slot {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_slot(Some(value), ctx).map(Some),
        }
    }

    fn to_slot(&self) -> Option<Value> {
        self.as_ref().and_then(WireField::to_slot)
    }
}

impl<T: WireField> WireField for Vec<T> {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        match present(slot, ctx)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::from_slot(Some(item), ctx))
                .collect(),
            other => Err(ctx.mismatch("array", &other)),
        }
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::Array(
            self.iter()
                .map(|item| item.to_slot().unwrap_or(Value::Null))
                .collect(),
        ))
    }
}

impl<T: WireField> WireField for Box<T> {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        T::from_slot(slot, ctx).map(Box::new)
    }

    fn to_slot(&self) -> Option<Value> {
        (**self).to_slot()
    }
}

/// A 64-bit integer carried on the wire as a decimal string.
///
/// JSON numbers cannot represent every `i64` exactly once they pass through a
/// double, so the engine sends these as strings. Decoding parses the string
/// directly; an integral JSON number is accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Int64(pub i64);

impl Int64 {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Int64 {
    fn from(value: i64) -> Self {
        Int64(value)
    }
}

impl From<Int64> for i64 {
    fn from(value: Int64) -> Self {
        value.0
    }
}

impl fmt::Display for Int64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Int64 {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Int64)
    }
}

impl WireField for Int64 {
    fn from_slot(slot: Option<Value>, ctx: FieldCtx) -> Result<Self, DecodeError> {
        let value = present(slot, ctx)?;
        let parsed = match &value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64().map(Int64),
            _ => None,
        };
        parsed.ok_or_else(|| ctx.mismatch("int64", &value))
    }

    fn to_slot(&self) -> Option<Value> {
        Some(Value::String(self.0.to_string()))
    }
}
