// Tagged values produced by decode functions and handed to destination setters.
use std::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::shape::{DestinationShape, FloatWidth, IntWidth};

/// Value held by a dynamic (any-typed) destination.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DynValue {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Time(OffsetDateTime),
}

impl DynValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DynValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<OffsetDateTime> {
        match self {
            DynValue::Time(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynValue::Null => f.write_str("null"),
            DynValue::Int(value) => write!(f, "{value}"),
            DynValue::Float(value) => write!(f, "{value}"),
            DynValue::Bool(value) => write!(f, "{value}"),
            DynValue::String(value) => f.write_str(value),
            DynValue::Bytes(value) => write!(f, "<{} bytes>", value.len()),
            DynValue::Time(value) => match value.format(&Rfc3339) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{value}"),
            },
        }
    }
}

/// Output of one decode function, already narrowed to its destination shape.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Time(OffsetDateTime),
    Dynamic(DynValue),
}

impl FieldValue {
    /// Shape of the slot this value was produced for.
    pub fn shape(&self) -> DestinationShape {
        match self {
            FieldValue::I8(_) => DestinationShape::signed(IntWidth::W8),
            FieldValue::I16(_) => DestinationShape::signed(IntWidth::W16),
            FieldValue::I32(_) => DestinationShape::signed(IntWidth::W32),
            FieldValue::I64(_) => DestinationShape::signed(IntWidth::W64),
            FieldValue::U8(_) => DestinationShape::unsigned(IntWidth::W8),
            FieldValue::U16(_) => DestinationShape::unsigned(IntWidth::W16),
            FieldValue::U32(_) => DestinationShape::unsigned(IntWidth::W32),
            FieldValue::U64(_) => DestinationShape::unsigned(IntWidth::W64),
            FieldValue::F32(_) => DestinationShape::Float(FloatWidth::W32),
            FieldValue::F64(_) => DestinationShape::Float(FloatWidth::W64),
            FieldValue::Bool(_) => DestinationShape::Bool,
            FieldValue::String(_) => DestinationShape::String,
            FieldValue::Bytes(_) => DestinationShape::Bytes,
            FieldValue::Time(_) => DestinationShape::Time,
            FieldValue::Dynamic(_) => DestinationShape::Dynamic,
        }
    }
}
