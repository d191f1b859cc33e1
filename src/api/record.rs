//! Purpose: Describe destination records: typed slots, per-field setters, and dynamic rows.
//! Exports: `Slot`, `Field`, `Record`, `DynamicRow`, `record!`.
//! Role: Safe replacement for offset-based writes; each field owns one setter closure.
//! Invariants: A slot's `SHAPE` is what binding resolution sees for that field.
//! Invariants: `assign` either stores the whole value or leaves the slot untouched.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind};
use crate::core::shape::{DestinationShape, FloatWidth, IntWidth};
use crate::core::value::{DynValue, FieldValue};

pub(crate) type Setter<T> = Box<dyn Fn(&mut T, FieldValue) -> Result<(), Error> + Send + Sync>;

/// A destination field type with a fixed shape.
pub trait Slot {
    const SHAPE: DestinationShape;

    fn assign(&mut self, value: FieldValue) -> Result<(), Error>;
}

pub(crate) fn shape_mismatch(expected: DestinationShape, value: &FieldValue) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message(format!(
            "decoded {} value does not fit the destination slot",
            value.shape()
        ))
        .with_shape(expected)
}

macro_rules! value_slot {
    ($($ty:ty => $variant:ident, $shape:expr;)*) => {
        $(
            impl Slot for $ty {
                const SHAPE: DestinationShape = $shape;

                fn assign(&mut self, value: FieldValue) -> Result<(), Error> {
                    match value {
                        FieldValue::$variant(value) => {
                            *self = value;
                            Ok(())
                        }
                        other => Err(shape_mismatch(Self::SHAPE, &other)),
                    }
                }
            }
        )*
    };
}

value_slot! {
    i8 => I8, DestinationShape::signed(IntWidth::W8);
    i16 => I16, DestinationShape::signed(IntWidth::W16);
    i32 => I32, DestinationShape::signed(IntWidth::W32);
    i64 => I64, DestinationShape::signed(IntWidth::W64);
    u8 => U8, DestinationShape::unsigned(IntWidth::W8);
    u16 => U16, DestinationShape::unsigned(IntWidth::W16);
    u32 => U32, DestinationShape::unsigned(IntWidth::W32);
    u64 => U64, DestinationShape::unsigned(IntWidth::W64);
    f32 => F32, DestinationShape::Float(FloatWidth::W32);
    f64 => F64, DestinationShape::Float(FloatWidth::W64);
    bool => Bool, DestinationShape::Bool;
    String => String, DestinationShape::String;
    Vec<u8> => Bytes, DestinationShape::Bytes;
    OffsetDateTime => Time, DestinationShape::Time;
    DynValue => Dynamic, DestinationShape::Dynamic;
}

impl Slot for Option<OffsetDateTime> {
    const SHAPE: DestinationShape = DestinationShape::OptionalTime;

    fn assign(&mut self, value: FieldValue) -> Result<(), Error> {
        match value {
            FieldValue::Time(value) => {
                *self = Some(value);
                Ok(())
            }
            other => Err(shape_mismatch(Self::SHAPE, &other)),
        }
    }
}

/// One named field of a destination record.
pub struct Field<T> {
    column: &'static str,
    shape: DestinationShape,
    assign: Setter<T>,
}

impl<T: 'static> Field<T> {
    /// `column` is the result column this field is filled from.
    pub fn new<S, P>(column: &'static str, project: P) -> Self
    where
        S: Slot + 'static,
        P: Fn(&mut T) -> &mut S + Send + Sync + 'static,
    {
        Self {
            column,
            shape: S::SHAPE,
            assign: Box::new(move |record, value| project(record).assign(value)),
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn shape(&self) -> DestinationShape {
        self.shape
    }

    pub(crate) fn into_parts(self) -> (&'static str, DestinationShape, Setter<T>) {
        (self.column, self.shape, self.assign)
    }
}

/// A destination record type with a static field list.
pub trait Record: Sized + 'static {
    fn fields() -> Vec<Field<Self>>;
}

/// Implements [`Record`] for a struct whose fields all implement [`Slot`].
///
/// ```ignore
/// struct Visit { id: i64, started: OffsetDateTime, page: String }
/// rowbind::record!(Visit { id, started as "start_time", page });
/// ```
#[macro_export]
macro_rules! record {
    (@column $field:ident) => {
        ::std::stringify!($field)
    };
    (@column $field:ident $column:literal) => {
        $column
    };
    ($ty:ty { $($field:ident $(as $column:literal)?),* $(,)? }) => {
        impl $crate::api::Record for $ty {
            fn fields() -> ::std::vec::Vec<$crate::api::Field<Self>> {
                ::std::vec![$(
                    $crate::api::Field::new(
                        $crate::record!(@column $field $($column)?),
                        |record: &mut Self| &mut record.$field,
                    )
                ),*]
            }
        }
    };
}

/// Row decoded with the dynamic shape for every schema column; null columns are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicRow {
    values: BTreeMap<String, DynValue>,
}

impl DynamicRow {
    pub fn get(&self, column: &str) -> Option<&DynValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynValue)> {
        self.values.iter().map(|(column, value)| (column.as_str(), value))
    }

    pub fn into_values(self) -> BTreeMap<String, DynValue> {
        self.values
    }

    pub(crate) fn setter(column: String) -> Setter<DynamicRow> {
        Box::new(move |row, value| match value {
            FieldValue::Dynamic(value) => {
                row.values.insert(column.clone(), value);
                Ok(())
            }
            other => Err(shape_mismatch(DestinationShape::Dynamic, &other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DynamicRow, Record, Slot};
    use crate::core::error::ErrorKind;
    use crate::core::shape::{DestinationShape, IntWidth};
    use crate::core::value::{DynValue, FieldValue};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Default)]
    struct Sample {
        id: i64,
        label: String,
        seen: Option<OffsetDateTime>,
    }

    crate::record!(Sample { id, label as "name", seen });

    #[test]
    fn macro_lists_fields_with_shapes() {
        let fields = Sample::fields();
        let described: Vec<_> = fields
            .iter()
            .map(|field| (field.column(), field.shape()))
            .collect();
        assert_eq!(
            described,
            vec![
                ("id", DestinationShape::signed(IntWidth::W64)),
                ("name", DestinationShape::String),
                ("seen", DestinationShape::OptionalTime),
            ]
        );
    }

    #[test]
    fn setters_write_through_projection() {
        let mut sample = Sample::default();
        for field in Sample::fields() {
            let value = match field.column() {
                "id" => FieldValue::I64(7),
                "name" => FieldValue::String("seven".to_string()),
                _ => FieldValue::Time(datetime!(2021-07-01 00:00 UTC)),
            };
            let (_, _, assign) = field.into_parts();
            assign(&mut sample, value).expect("assign");
        }
        assert_eq!(sample.id, 7);
        assert_eq!(sample.label, "seven");
        assert_eq!(sample.seen, Some(datetime!(2021-07-01 00:00 UTC)));
    }

    #[test]
    fn mismatched_value_is_internal_error() {
        let mut slot = 0i32;
        let err = slot.assign(FieldValue::I64(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(slot, 0);
    }

    #[test]
    fn dynamic_row_setter_inserts_by_column() {
        let mut row = DynamicRow::default();
        let setter = DynamicRow::setter("n".to_string());
        setter(&mut row, FieldValue::Dynamic(DynValue::Int(3))).expect("assign");
        assert_eq!(row.get("n"), Some(&DynValue::Int(3)));
        assert!(setter(&mut row, FieldValue::I64(3)).is_err());
        assert_eq!(row.len(), 1);
    }
}
