//! Purpose: Session entry point: decoder options, row decoding, and newline-delimited row streams.
//! Exports: `Decoder`, `DecoderOptions`, `LayoutCachePolicy`, `Rows`.
//! Role: Ties a schema to binding tables and a layout-cache policy for one consumer.
//! Invariants: A decoder never mutates its schema; binding tables come from the shared registry.
//! Invariants: Each record type consults the registry once per decoder; later rows reuse the table.
//! Invariants: `decode_row_atomic` commits all fields or none; `decode_row` may leave a prefix written.
//! Invariants: Row stream errors carry the 0-based index of the failing row.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::{BufRead, Lines};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::api::binder::{BindingTable, bindings_for};
use crate::api::record::{DynamicRow, Record};
use crate::api::schema::Schema;
use crate::core::error::{Error, ErrorKind};
use crate::core::resolve::DecodeContext;
use crate::core::temporal::LayoutCache;

/// Where the "last successful layout" hint for textual timestamps lives.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LayoutCachePolicy {
    /// One process-wide slot shared by every decoder using this policy.
    #[default]
    Shared,
    /// A slot owned by the decoder.
    PerSession,
    /// Always scan the full layout list.
    Disabled,
}

#[derive(Clone, Debug)]
pub struct DecoderOptions {
    pub layout_cache: LayoutCachePolicy,
    pub strict_bindings: bool,
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self {
            layout_cache: LayoutCachePolicy::Shared,
            strict_bindings: false,
        }
    }

    pub fn with_layout_cache(mut self, policy: LayoutCachePolicy) -> Self {
        self.layout_cache = policy;
        self
    }

    pub fn with_strict_bindings(mut self, strict: bool) -> Self {
        self.strict_bindings = strict;
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Decoder {
    schema: Schema,
    options: DecoderOptions,
    session_layouts: LayoutCache,
    tables: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    dynamic: OnceLock<BindingTable<DynamicRow>>,
}

impl Decoder {
    pub fn new(schema: Schema) -> Self {
        Self::with_options(schema, DecoderOptions::new())
    }

    pub fn with_options(schema: Schema, options: DecoderOptions) -> Self {
        Self {
            schema,
            options,
            session_layouts: LayoutCache::new(),
            tables: RwLock::new(HashMap::new()),
            dynamic: OnceLock::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode context reflecting this decoder's layout-cache policy.
    pub fn context(&self) -> DecodeContext<'_> {
        match self.options.layout_cache {
            LayoutCachePolicy::Shared => DecodeContext::shared(),
            LayoutCachePolicy::PerSession => DecodeContext::new(Some(&self.session_layouts)),
            LayoutCachePolicy::Disabled => DecodeContext::uncached(),
        }
    }

    /// Binding table for `T`; fails on unsupported fields only in strict mode.
    pub fn bind<T: Record>(&self) -> Result<Arc<BindingTable<T>>, Error> {
        let table = self.table::<T>();
        if self.options.strict_bindings {
            table.check()?;
        }
        Ok(table)
    }

    fn table<T: Record>(&self) -> Arc<BindingTable<T>> {
        let key = TypeId::of::<T>();
        let cached = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(table) = cached.and_then(|entry| entry.downcast::<BindingTable<T>>().ok()) {
            return table;
        }
        let table = bindings_for::<T>(&self.schema);
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&table) as Arc<dyn Any + Send + Sync>);
        table
    }

    pub fn decode_row<T: Record>(&self, row: &str, dest: &mut T) -> Result<(), Error> {
        self.bind::<T>()?.decode_str(row, dest, &self.context())
    }

    /// Like `decode_row`, but `dest` is only updated when every field decodes.
    pub fn decode_row_atomic<T: Record + Clone>(&self, row: &str, dest: &mut T) -> Result<(), Error> {
        let mut staged = dest.clone();
        self.decode_row(row, &mut staged)?;
        *dest = staged;
        Ok(())
    }

    pub fn decode_value<T: Record>(&self, row: &Value, dest: &mut T) -> Result<(), Error> {
        self.bind::<T>()?.decode_value(row, dest, &self.context())
    }

    /// Decodes every schema column into its dynamic value.
    pub fn decode_dynamic(&self, row: &str) -> Result<DynamicRow, Error> {
        let table = self
            .dynamic
            .get_or_init(|| BindingTable::dynamic(&self.schema));
        if self.options.strict_bindings {
            table.check()?;
        }
        let mut decoded = DynamicRow::default();
        table.decode_str(row, &mut decoded, &self.context())?;
        Ok(decoded)
    }

    /// Iterates newline-delimited row objects from `reader`, skipping blank lines.
    pub fn rows<T, R>(&self, reader: R) -> Result<Rows<'_, T, R>, Error>
    where
        T: Record + Default,
        R: BufRead,
    {
        Ok(Rows {
            decoder: self,
            table: self.bind::<T>()?,
            lines: reader.lines(),
            next_row: 0,
            done: false,
        })
    }
}

/// Iterator returned by [`Decoder::rows`]; a failed row is reported and skipped.
pub struct Rows<'d, T, R> {
    decoder: &'d Decoder,
    table: Arc<BindingTable<T>>,
    lines: Lines<R>,
    next_row: u64,
    done: bool,
}

impl<T: Record + Default, R: BufRead> Iterator for Rows<'_, T, R> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    self.done = true;
                    return Some(Err(Error::new(ErrorKind::Io)
                        .with_message("failed to read row")
                        .with_row(self.next_row)
                        .with_source(err)));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let row = self.next_row;
            self.next_row += 1;
            let mut record = T::default();
            let outcome = self
                .table
                .decode_str(&line, &mut record, &self.decoder.context());
            if let Err(err) = &outcome {
                tracing::trace!(row, error = %err, "row failed to decode");
            }
            return Some(outcome.map(|()| record).map_err(|err| err.with_row(row)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder, DecoderOptions, LayoutCachePolicy};
    use crate::api::binder::{bindings_for, evict_bindings};
    use crate::api::schema::Schema;
    use crate::core::error::{ErrorKind, Representation};
    use crate::core::value::DynValue;
    use std::io::Cursor;
    use std::sync::Arc;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Order {
        id: u32,
        total: f64,
        note: String,
    }

    crate::record!(Order { id, total, note });

    fn schema() -> Schema {
        Schema::default()
            .with_column("id", "INTEGER")
            .with_column("total", "NUMERIC")
            .with_column("note", "STRING")
    }

    #[test]
    fn decode_row_leaves_prefix_on_failure() {
        let decoder = Decoder::new(schema());
        let mut order = Order::default();
        let err = decoder
            .decode_row(r#"{"id":"4","total":"x","note":"n"}"#, &mut order)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed(Representation::Float));
        assert_eq!(order.id, 4);
        assert_eq!(order.note, "");
    }

    #[test]
    fn atomic_decode_commits_all_or_nothing() {
        let decoder = Decoder::new(schema());
        let mut order = Order::default();
        decoder
            .decode_row_atomic(r#"{"id":"4","total":"x"}"#, &mut order)
            .unwrap_err();
        assert_eq!(order, Order::default());

        decoder
            .decode_row_atomic(r#"{"id":"4","total":"2.5","note":"ok"}"#, &mut order)
            .expect("decode");
        assert_eq!(
            order,
            Order {
                id: 4,
                total: 2.5,
                note: "ok".to_string()
            }
        );
    }

    #[test]
    fn strict_bindings_reject_unsupported_fields() {
        let schema = Schema::default().with_column("note", "BOOLEAN");
        #[derive(Debug, Default)]
        struct Flagged {
            note: f32,
        }
        crate::record!(Flagged { note });

        let lenient = Decoder::new(schema.clone());
        let table = lenient.bind::<Flagged>().expect("lenient bind");
        assert_eq!(table.unsupported().len(), 1);

        let strict = Decoder::with_options(schema, DecoderOptions::new().with_strict_bindings(true));
        let err = strict.bind::<Flagged>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBinding);
        assert_eq!(err.column(), Some("note"));
        assert_eq!(err.shape(), Some("f32"));
    }

    #[test]
    fn decode_dynamic_uses_schema_types() {
        let decoder = Decoder::new(schema());
        let row = decoder
            .decode_dynamic(r#"{"id":"9","total":"1.25","note":null}"#)
            .expect("decode");
        assert_eq!(row.get("id"), Some(&DynValue::Int(9)));
        assert_eq!(row.get("total"), Some(&DynValue::Float(1.25)));
        assert_eq!(row.get("note"), None);
    }

    #[test]
    fn rows_report_index_and_continue() {
        let decoder = Decoder::with_options(
            schema(),
            DecoderOptions::new().with_layout_cache(LayoutCachePolicy::Disabled),
        );
        let input = "{\"id\":\"1\"}\n\n{\"id\":\"one\"}\n{\"id\":\"3\",\"note\":\"c\"}\n";
        let results: Vec<_> = decoder
            .rows::<Order, _>(Cursor::new(input))
            .expect("rows")
            .collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().map(|order| order.id).ok(), Some(1));
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert_eq!(err.column(), Some("id"));
        let third = results[2].as_ref().expect("third row");
        assert_eq!((third.id, third.note.as_str()), (3, "c"));
    }

    #[test]
    fn bound_tables_outlive_registry_eviction() {
        let schema = schema().with_column("decoder_cache_only", "STRING");
        let decoder = Decoder::new(schema.clone());
        let first = decoder.bind::<Order>().expect("bind");

        assert!(evict_bindings(&schema) >= 1);
        let rebuilt = bindings_for::<Order>(&schema);
        assert!(!Arc::ptr_eq(&first, &rebuilt));

        let mut order = Order::default();
        for id in 1..=3 {
            decoder
                .decode_row(&format!(r#"{{"id":"{id}"}}"#), &mut order)
                .expect("decode");
            assert!(Arc::ptr_eq(&first, &decoder.bind::<Order>().expect("bind")));
        }
        assert_eq!(order.id, 3);
    }

    #[test]
    fn session_policy_uses_private_cache() {
        #[derive(Debug, Default)]
        struct Stamp {
            at: i64,
        }
        crate::record!(Stamp { at });

        let decoder = Decoder::with_options(
            Schema::default().with_column("at", "TIMESTAMP"),
            DecoderOptions::new().with_layout_cache(LayoutCachePolicy::PerSession),
        );
        let mut stamp = Stamp::default();
        decoder
            .decode_row(r#"{"at":"2021-07-01"}"#, &mut stamp)
            .expect("decode");
        assert_eq!(stamp.at, 1_625_097_600_000_000_000);
        assert_eq!(decoder.context().layouts().and_then(|c| c.current()), Some("date"));
    }
}
