// Error model shared by binding resolution and per-row decoding.
use std::error::Error as StdError;
use std::fmt;

/// Textual representation a present token failed to parse as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Representation {
    Int,
    Float,
    Bool,
    Time,
    Base64,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Representation::Int => "int",
            Representation::Float => "float",
            Representation::Bool => "bool",
            Representation::Time => "time",
            Representation::Base64 => "base64",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    UnsupportedBinding,
    Malformed(Representation),
    Structural,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    column: Option<String>,
    source_type: Option<String>,
    shape: Option<String>,
    raw: Option<String>,
    row: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            column: None,
            source_type: None,
            shape: None,
            raw: None,
            row: None,
            source: None,
        }
    }

    pub(crate) fn malformed(representation: Representation, raw: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed(representation)).with_raw(raw)
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural).with_message(message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ErrorKind::Malformed(_))
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    pub fn shape(&self) -> Option<&str> {
        self.shape.as_deref()
    }

    /// Raw token text that failed to parse.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn row(&self) -> Option<u64> {
        self.row
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_source_type(mut self, source_type: impl fmt::Display) -> Self {
        self.source_type = Some(source_type.to_string());
        self
    }

    pub fn with_shape(mut self, shape: impl fmt::Display) -> Self {
        self.shape = Some(shape.to_string());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_row(mut self, row: u64) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Malformed(representation) => write!(f, "Malformed({representation})")?,
            kind => write!(f, "{kind:?}")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {column})")?;
        }
        if let Some(source_type) = &self.source_type {
            write!(f, " (source type: {source_type})")?;
        }
        if let Some(shape) = &self.shape {
            write!(f, " (destination: {shape})")?;
        }
        if let Some(raw) = &self.raw {
            write!(f, " (raw: {raw:?})")?;
        }
        if let Some(row) = self.row {
            write!(f, " (row: {row})")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
