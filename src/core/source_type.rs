//! Purpose: Map upstream column type names onto the semantic source types the decoder understands.
//! Exports: `SourceType`.
//! Role: Schema-side half of binding resolution; the other half is `DestinationShape`.
//! Invariants: Alias lists are fixed; unknown names are not coerced into a nearby type.
//! Invariants: Matching ignores ASCII case.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SourceType {
    Integer,
    Bytes,
    String,
    FloatingPoint,
    Temporal,
    Boolean,
}

const INTEGER_NAMES: &[&str] = &[
    "INT64",
    "INT",
    "SMALLINT",
    "INTEGER",
    "BIGINT",
    "TINYINT",
    "BYTEINT",
    "BIGNUMERIC",
    "BIGDECIMAL",
];
const FLOATING_POINT_NAMES: &[&str] = &["NUMERIC", "DECIMAL", "FLOAT64", "FLOAT"];
const TEMPORAL_NAMES: &[&str] = &["TIME", "TIMESTAMP", "DATE", "DATETIME"];

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Integer,
        SourceType::Bytes,
        SourceType::String,
        SourceType::FloatingPoint,
        SourceType::Temporal,
        SourceType::Boolean,
    ];

    /// Resolves a declared column type name, `None` when the name is not recognized.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let upper = upper.as_str();
        if INTEGER_NAMES.contains(&upper) {
            return Some(SourceType::Integer);
        }
        if FLOATING_POINT_NAMES.contains(&upper) {
            return Some(SourceType::FloatingPoint);
        }
        if TEMPORAL_NAMES.contains(&upper) {
            return Some(SourceType::Temporal);
        }
        match upper {
            "BYTES" => Some(SourceType::Bytes),
            "STRING" => Some(SourceType::String),
            "BOOLEAN" => Some(SourceType::Boolean),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Integer => "integer",
            SourceType::Bytes => "bytes",
            SourceType::String => "string",
            SourceType::FloatingPoint => "floating-point",
            SourceType::Temporal => "temporal",
            SourceType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_type_name(s).ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedBinding)
                .with_message("unknown column type")
                .with_source_type(s)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SourceType;
    use crate::core::error::ErrorKind;

    #[test]
    fn aliases_resolve_to_semantic_types() {
        let cases = [
            ("INT64", SourceType::Integer),
            ("bigint", SourceType::Integer),
            ("BIGNUMERIC", SourceType::Integer),
            ("BIGDECIMAL", SourceType::Integer),
            ("NUMERIC", SourceType::FloatingPoint),
            ("Float64", SourceType::FloatingPoint),
            ("DATETIME", SourceType::Temporal),
            ("DATE", SourceType::Temporal),
            ("BYTES", SourceType::Bytes),
            ("STRING", SourceType::String),
            ("BOOLEAN", SourceType::Boolean),
        ];
        for (name, expected) in cases {
            assert_eq!(SourceType::from_type_name(name), Some(expected), "{name}");
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(SourceType::from_type_name("GEOGRAPHY"), None);
        assert_eq!(SourceType::from_type_name("BOOL"), None);
        let err = "RECORD".parse::<SourceType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBinding);
        assert_eq!(err.source_type(), Some("RECORD"));
    }
}
