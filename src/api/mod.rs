//! Purpose: Define the public Rust API boundary for rowbind.
//! Exports: Schema, record, binding, and decoder types plus the scalar decoding primitives.
//! Role: Public, additive-only surface; hides how core modules are organized.
//! Invariants: This module is the only public path to core types.
//! Invariants: Internal modules remain private and are not directly exposed.

mod binder;
mod decoder;
mod record;
mod schema;

pub use crate::core::error::{Error, ErrorKind, Representation};
pub use crate::core::resolve::{DecodeContext, DecodeFn, resolve_binding};
pub use crate::core::scalar::{read_bool, read_float, read_int, read_string};
pub use crate::core::shape::{DestinationShape, FloatWidth, IntWidth};
pub use crate::core::source_type::SourceType;
pub use crate::core::temporal::{
    LayoutCache, LayoutError, SHARED_LAYOUT_CACHE, layout_names, parse_time, read_time,
    time_from_epoch_seconds,
};
pub use crate::core::token::{Token, TokenCursor, TokenKind, ValueCursor};
pub use crate::core::value::{DynValue, FieldValue};
pub use binder::{BindingTable, UnsupportedField, bindings_for, evict_bindings};
pub use decoder::{Decoder, DecoderOptions, LayoutCachePolicy, Rows};
pub use record::{DynamicRow, Field, Record, Slot};
pub use schema::{Column, Schema};
