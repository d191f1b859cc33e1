//! Purpose: Select the decode function for a (source type, destination shape) pair.
//! Exports: `DecodeFn`, `DecodeContext`, `resolve_binding`.
//! Role: The compatibility matrix; everything not listed here is an unsupported binding.
//! Invariants: Selection is static: it depends only on the pair, never on row data.
//! Invariants: Decode functions read exactly one token and return `None` for JSON null.
//! Invariants: Integer narrowing wraps without range checks (upstream-compatible behavior).
//! Notes: Every source type can be read into a string destination as its raw, unparsed text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind, Representation};
use crate::core::scalar::{read_bool, read_float, read_int, read_string};
use crate::core::shape::{DestinationShape, FloatWidth, IntWidth};
use crate::core::source_type::SourceType;
use crate::core::temporal::{LayoutCache, SHARED_LAYOUT_CACHE, read_time};
use crate::core::token::TokenCursor;
use crate::core::value::{DynValue, FieldValue};

/// Per-call state available to decode functions.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext<'a> {
    layouts: Option<&'a LayoutCache>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(layouts: Option<&'a LayoutCache>) -> Self {
        Self { layouts }
    }

    pub fn layouts(&self) -> Option<&'a LayoutCache> {
        self.layouts
    }
}

impl DecodeContext<'static> {
    /// Context backed by the process-wide layout cache.
    pub fn shared() -> Self {
        Self::new(Some(&SHARED_LAYOUT_CACHE))
    }

    /// Context that always performs the full layout scan.
    pub fn uncached() -> Self {
        Self::new(None)
    }
}

pub type DecodeFn =
    fn(&mut dyn TokenCursor, &DecodeContext<'_>) -> Result<Option<FieldValue>, Error>;

pub fn resolve_binding(source: SourceType, shape: DestinationShape) -> Result<DecodeFn, Error> {
    use DestinationShape as D;
    use SourceType as S;

    let decode: DecodeFn = match (source, shape) {
        (_, D::String) => raw_text,

        (S::Integer, D::Int { width, signed }) => integer_fn(width, signed),
        (S::Integer, D::Dynamic) => integer_dynamic,

        (S::Bytes, D::Bytes) => bytes,
        (S::Bytes, D::Dynamic) => bytes_dynamic,

        (S::String, D::Dynamic) => string_dynamic,

        (S::FloatingPoint, D::Float(FloatWidth::W32)) => float32,
        (S::FloatingPoint, D::Float(FloatWidth::W64)) => float64,
        (S::FloatingPoint, D::Dynamic) => float_dynamic,

        (
            S::Temporal,
            D::Int {
                width: IntWidth::W64,
                signed: true,
            },
        ) => time_nanos_i64,
        (
            S::Temporal,
            D::Int {
                width: IntWidth::W64,
                signed: false,
            },
        ) => time_nanos_u64,
        (
            S::Temporal,
            D::Int {
                width: IntWidth::W32,
                signed: true,
            },
        ) => time_seconds_i32,
        (
            S::Temporal,
            D::Int {
                width: IntWidth::W32,
                signed: false,
            },
        ) => time_seconds_u32,
        (S::Temporal, D::Dynamic) => time_dynamic,
        (S::Temporal, D::Time | D::OptionalTime) => time_value,

        (S::Boolean, D::Bool) => boolean,
        (
            S::Boolean,
            D::Int {
                width: IntWidth::W8,
                signed: true,
            },
        ) => bool_flag_i8,
        (
            S::Boolean,
            D::Int {
                width: IntWidth::W8,
                signed: false,
            },
        ) => bool_flag_u8,
        (S::Boolean, D::Dynamic) => bool_dynamic,

        _ => {
            return Err(Error::new(ErrorKind::UnsupportedBinding)
                .with_message("no decoder for this source type and destination")
                .with_source_type(source)
                .with_shape(shape));
        }
    };
    Ok(decode)
}

fn raw_text(cursor: &mut dyn TokenCursor, _: &DecodeContext<'_>) -> Result<Option<FieldValue>, Error> {
    Ok(read_string(cursor)?.map(FieldValue::String))
}

fn string_dynamic(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_string(cursor)?.map(|text| FieldValue::Dynamic(DynValue::String(text))))
}

/// Integer destinations with their wrapping conversion from `i64`.
trait WrappingInt {
    fn wrap(value: i64) -> FieldValue;
}

macro_rules! wrapping_int {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl WrappingInt for $ty {
                fn wrap(value: i64) -> FieldValue {
                    FieldValue::$variant(value as $ty)
                }
            }
        )*
    };
}

wrapping_int!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

fn integer<T: WrappingInt>(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_int(cursor)?.map(T::wrap))
}

fn integer_fn(width: IntWidth, signed: bool) -> DecodeFn {
    match (width, signed) {
        (IntWidth::W8, true) => integer::<i8>,
        (IntWidth::W16, true) => integer::<i16>,
        (IntWidth::W32, true) => integer::<i32>,
        (IntWidth::W64, true) => integer::<i64>,
        (IntWidth::W8, false) => integer::<u8>,
        (IntWidth::W16, false) => integer::<u16>,
        (IntWidth::W32, false) => integer::<u32>,
        (IntWidth::W64, false) => integer::<u64>,
    }
}

fn integer_dynamic(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_int(cursor)?.map(|value| FieldValue::Dynamic(DynValue::Int(value))))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, Error> {
    STANDARD
        .decode(text)
        .map_err(|err| Error::malformed(Representation::Base64, text).with_source(err))
}

fn bytes(cursor: &mut dyn TokenCursor, _: &DecodeContext<'_>) -> Result<Option<FieldValue>, Error> {
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    decode_base64(&text).map(|data| Some(FieldValue::Bytes(data)))
}

fn bytes_dynamic(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    decode_base64(&text).map(|data| Some(FieldValue::Dynamic(DynValue::Bytes(data))))
}

fn float32(cursor: &mut dyn TokenCursor, _: &DecodeContext<'_>) -> Result<Option<FieldValue>, Error> {
    Ok(read_float(cursor)?.map(|value| FieldValue::F32(value as f32)))
}

fn float64(cursor: &mut dyn TokenCursor, _: &DecodeContext<'_>) -> Result<Option<FieldValue>, Error> {
    Ok(read_float(cursor)?.map(FieldValue::F64))
}

fn float_dynamic(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_float(cursor)?.map(|value| FieldValue::Dynamic(DynValue::Float(value))))
}

fn instant(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<OffsetDateTime>, Error> {
    read_time(cursor, ctx.layouts())
}

fn time_nanos_i64(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(|ts| FieldValue::I64(ts.unix_timestamp_nanos() as i64)))
}

fn time_nanos_u64(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(|ts| FieldValue::U64(ts.unix_timestamp_nanos() as u64)))
}

fn time_seconds_i32(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(|ts| FieldValue::I32(ts.unix_timestamp() as i32)))
}

fn time_seconds_u32(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(|ts| FieldValue::U32(ts.unix_timestamp() as u32)))
}

fn time_dynamic(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(|ts| FieldValue::Dynamic(DynValue::Time(ts))))
}

fn time_value(
    cursor: &mut dyn TokenCursor,
    ctx: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(instant(cursor, ctx)?.map(FieldValue::Time))
}

fn boolean(cursor: &mut dyn TokenCursor, _: &DecodeContext<'_>) -> Result<Option<FieldValue>, Error> {
    Ok(read_bool(cursor)?.map(FieldValue::Bool))
}

fn bool_flag_i8(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_bool(cursor)?.map(|flag| FieldValue::I8(i8::from(flag))))
}

fn bool_flag_u8(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_bool(cursor)?.map(|flag| FieldValue::U8(u8::from(flag))))
}

fn bool_dynamic(
    cursor: &mut dyn TokenCursor,
    _: &DecodeContext<'_>,
) -> Result<Option<FieldValue>, Error> {
    Ok(read_bool(cursor)?.map(|flag| FieldValue::Dynamic(DynValue::Bool(flag))))
}
