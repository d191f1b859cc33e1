//! Purpose: Resolve a record type against a schema once and decode rows through the result.
//! Exports: `BindingTable`, `UnsupportedField`, `bindings_for`, `evict_bindings`.
//! Role: Per-(record type, schema) plan: one decode function and one setter per bound column.
//! Invariants: Tables are immutable after construction and shared behind `Arc`.
//! Invariants: The registry builds each table at most once, even under concurrent first use.
//! Invariants: Registry entries live until evicted by schema.
//! Invariants: JSON null leaves the destination field untouched; unknown row keys are skipped.
//! Notes: Rows are walked with borrowed keys and values; no intermediate `Value` is built.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError};

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;

use crate::api::record::{DynamicRow, Record, Setter};
use crate::api::schema::Schema;
use crate::core::error::{Error, ErrorKind};
use crate::core::resolve::{DecodeContext, DecodeFn, resolve_binding};
use crate::core::shape::DestinationShape;
use crate::core::source_type::SourceType;
use crate::core::token::{Token, TokenCursor, ValueCursor};

struct BoundField<T> {
    column: String,
    source_type: SourceType,
    shape: DestinationShape,
    decode: DecodeFn,
    assign: Setter<T>,
}

/// A record field whose column could not be bound; the field is never written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsupportedField {
    pub column: String,
    pub type_name: String,
    pub shape: DestinationShape,
}

impl UnsupportedField {
    pub fn to_error(&self) -> Error {
        Error::new(ErrorKind::UnsupportedBinding)
            .with_message("no decoder for this source type and destination")
            .with_column(&self.column)
            .with_source_type(&self.type_name)
            .with_shape(self.shape)
    }
}

pub struct BindingTable<T> {
    fields: Vec<BoundField<T>>,
    index: HashMap<String, usize>,
    unsupported: Vec<UnsupportedField>,
}

impl<T> fmt::Debug for BindingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("columns", &self.columns().collect::<Vec<_>>())
            .field("unsupported", &self.unsupported)
            .finish()
    }
}

impl<T: Record> BindingTable<T> {
    /// Binds every field of `T` that names a schema column.
    pub fn for_record(schema: &Schema) -> Self {
        Self::build(
            schema,
            T::fields().into_iter().map(|field| {
                let (column, shape, assign) = field.into_parts();
                (column.to_string(), shape, assign)
            }),
        )
    }
}

impl BindingTable<DynamicRow> {
    /// Binds every schema column with the dynamic shape.
    pub fn dynamic(schema: &Schema) -> Self {
        Self::build(
            schema,
            schema.columns().iter().map(|column| {
                let name = column.name().to_string();
                (
                    name.clone(),
                    DestinationShape::Dynamic,
                    DynamicRow::setter(name),
                )
            }),
        )
    }
}

impl<T> BindingTable<T> {
    fn build(
        schema: &Schema,
        candidates: impl IntoIterator<Item = (String, DestinationShape, Setter<T>)>,
    ) -> Self {
        let mut fields = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut unsupported = Vec::new();
        for (column, shape, assign) in candidates {
            let Some(declared) = schema.column(&column) else {
                tracing::debug!(column = %column, "record field has no schema column");
                continue;
            };
            if index.contains_key(&column) {
                tracing::warn!(column = %column, "column already bound by an earlier field");
                continue;
            }
            let resolved = declared
                .source_type()
                .map(|source_type| (source_type, resolve_binding(source_type, shape)));
            match resolved {
                Some((source_type, Ok(decode))) => {
                    index.insert(column.clone(), fields.len());
                    fields.push(BoundField {
                        column,
                        source_type,
                        shape,
                        decode,
                        assign,
                    });
                }
                _ => {
                    tracing::warn!(
                        column = %column,
                        type_name = declared.type_name(),
                        shape = %shape,
                        "unsupported binding; field will not be written"
                    );
                    unsupported.push(UnsupportedField {
                        column,
                        type_name: declared.type_name().to_string(),
                        shape,
                    });
                }
            }
        }
        tracing::debug!(
            bound = fields.len(),
            unsupported = unsupported.len(),
            "built binding table"
        );
        Self {
            fields,
            index,
            unsupported,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bound column names in record field order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.column.as_str())
    }

    pub fn unsupported(&self) -> &[UnsupportedField] {
        &self.unsupported
    }

    /// Fails with the first unsupported field, if any.
    pub fn check(&self) -> Result<(), Error> {
        match self.unsupported.first() {
            Some(field) => Err(field.to_error()),
            None => Ok(()),
        }
    }

    fn lookup(&self, column: &str) -> Option<&BoundField<T>> {
        self.index.get(column).map(|&slot| &self.fields[slot])
    }

    fn apply(
        &self,
        field: &BoundField<T>,
        cursor: &mut dyn TokenCursor,
        dest: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), Error> {
        let annotate = |err: Error| {
            err.with_column(&field.column)
                .with_source_type(field.source_type)
                .with_shape(field.shape)
        };
        match (field.decode)(cursor, ctx).map_err(annotate)? {
            Some(value) => (field.assign)(dest, value).map_err(annotate),
            None => Ok(()),
        }
    }

    /// Decodes one JSON object row; fields decoded before a failure stay written.
    pub fn decode_str(&self, row: &str, dest: &mut T, ctx: &DecodeContext<'_>) -> Result<(), Error> {
        let mut failure = None;
        let mut de = serde_json::Deserializer::from_str(row);
        let outcome = RowSeed {
            table: self,
            dest,
            ctx,
            failure: &mut failure,
        }
        .deserialize(&mut de)
        .and_then(|()| de.end());
        if let Some(err) = failure {
            return Err(err);
        }
        outcome.map_err(|err| {
            Error::new(ErrorKind::Structural)
                .with_message("malformed row")
                .with_source(err)
        })
    }

    /// Decodes a row that was already parsed into a JSON value.
    ///
    /// Keys are visited in the map's sorted order, not the row's document order, so the
    /// fields already written when a later field fails can differ from [`Self::decode_str`].
    pub fn decode_value(
        &self,
        row: &Value,
        dest: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), Error> {
        let Value::Object(entries) = row else {
            return Err(Error::new(ErrorKind::Structural).with_message("row is not a JSON object"));
        };
        for (column, value) in entries {
            if let Some(field) = self.lookup(column) {
                self.apply(field, &mut ValueCursor::new(value), dest, ctx)?;
            }
        }
        Ok(())
    }
}

struct RowSeed<'t, 'c, T> {
    table: &'t BindingTable<T>,
    dest: &'t mut T,
    ctx: &'t DecodeContext<'c>,
    failure: &'t mut Option<Error>,
}

impl<'de, T> DeserializeSeed<'de> for RowSeed<'_, '_, T> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, T> Visitor<'de> for RowSeed<'_, '_, T> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a row object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(ColumnKey(column)) = map.next_key()? {
            let Some(field) = self.table.lookup(&column) else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };
            let mut token: Token<'de> = map.next_value()?;
            if let Err(err) = self.table.apply(field, &mut token, self.dest, self.ctx) {
                *self.failure = Some(err);
                return Err(de::Error::custom("field decode failed"));
            }
        }
        Ok(())
    }
}

struct ColumnKey<'de>(Cow<'de, str>);

impl<'de> de::Deserialize<'de> for ColumnKey<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = ColumnKey<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a column name")
            }

            fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> Result<Self::Value, E> {
                Ok(ColumnKey(Cow::Borrowed(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ColumnKey(Cow::Owned(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ColumnKey(Cow::Owned(v)))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

type RegistryEntry = Arc<dyn Any + Send + Sync>;

static REGISTRY: LazyLock<Mutex<HashMap<(TypeId, Schema), RegistryEntry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Shared binding table for `T` under `schema`, built on first use.
///
/// The registry keeps one entry per distinct `(T, schema)` for the life of the process;
/// long-running callers that see many one-off schemas release them with [`evict_bindings`].
/// [`Decoder`](crate::api::Decoder) holds its own tables and calls this once per type.
pub fn bindings_for<T: Record>(schema: &Schema) -> Arc<BindingTable<T>> {
    let entry = {
        let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            registry
                .entry((TypeId::of::<T>(), schema.clone()))
                .or_insert_with(|| {
                    Arc::new(OnceLock::<Arc<BindingTable<T>>>::new()) as RegistryEntry
                }),
        )
    };
    match entry.downcast_ref::<OnceLock<Arc<BindingTable<T>>>>() {
        Some(slot) => Arc::clone(slot.get_or_init(|| {
            tracing::debug!(record = std::any::type_name::<T>(), "binding record type");
            Arc::new(BindingTable::for_record(schema))
        })),
        // Entries are keyed by `TypeId`, so the downcast only fails if that invariant breaks.
        None => Arc::new(BindingTable::for_record(schema)),
    }
}

/// Drops every registered table built for `schema`; returns how many were removed.
///
/// Tables already handed out stay valid. The next `bindings_for` call rebuilds.
pub fn evict_bindings(schema: &Schema) -> usize {
    let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    let before = registry.len();
    registry.retain(|(_, registered), _| registered != schema);
    before - registry.len()
}
