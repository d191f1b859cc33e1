//! Purpose: Model the result schema: column names and their declared source types.
//! Exports: `Schema`, `Column`.
//! Role: Input to binding resolution; parsed from the upstream table-schema document.
//! Invariants: Column order is preserved; unknown type names are kept, not rejected.
//! Invariants: Schemas are hashable so binding tables can be cached per schema.

use serde::Deserialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::source_type::SourceType;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Column {
    name: String,
    type_name: String,
    source_type: Option<SourceType>,
}

impl Column {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let source_type = SourceType::from_type_name(&type_name);
        Self {
            name: name.into(),
            type_name,
            source_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `None` when the declared type has no decoder.
    pub fn source_type(&self) -> Option<SourceType> {
        self.source_type
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Deserialize)]
struct FieldDoc {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn with_column(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, type_name));
        self
    }

    /// Parses a `{"fields":[{"name":..,"type":..}]}` schema document.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        let doc: SchemaDoc = serde_json::from_str(input).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid schema document")
                .with_source(err)
        })?;
        Ok(Self::new(
            doc.fields
                .into_iter()
                .map(|field| Column::new(field.name, field.type_name))
                .collect(),
        ))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
