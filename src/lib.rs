//! Purpose: Decode JSON query-result rows into typed records driven by a column schema.
//! Exports: `api` (schema, records, binding tables, decoder sessions) and the `record!` macro.
//! Role: Library crate; callers own transport and hand rows over as JSON text or values.
//! Invariants: Binding is resolved once per (record type, schema) and reused for every row.
//! Invariants: Decoding never panics on row data; every failure is a typed `Error`.
pub mod api;
mod core;
