// Static shape of a destination slot, fixed once per destination record type.
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FloatWidth {
    W32,
    W64,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DestinationShape {
    Int { width: IntWidth, signed: bool },
    Float(FloatWidth),
    String,
    Bool,
    Bytes,
    Dynamic,
    Time,
    OptionalTime,
}

impl DestinationShape {
    pub const ALL: [DestinationShape; 16] = [
        DestinationShape::signed(IntWidth::W8),
        DestinationShape::signed(IntWidth::W16),
        DestinationShape::signed(IntWidth::W32),
        DestinationShape::signed(IntWidth::W64),
        DestinationShape::unsigned(IntWidth::W8),
        DestinationShape::unsigned(IntWidth::W16),
        DestinationShape::unsigned(IntWidth::W32),
        DestinationShape::unsigned(IntWidth::W64),
        DestinationShape::Float(FloatWidth::W32),
        DestinationShape::Float(FloatWidth::W64),
        DestinationShape::String,
        DestinationShape::Bool,
        DestinationShape::Bytes,
        DestinationShape::Dynamic,
        DestinationShape::Time,
        DestinationShape::OptionalTime,
    ];

    pub const fn signed(width: IntWidth) -> Self {
        DestinationShape::Int {
            width,
            signed: true,
        }
    }

    pub const fn unsigned(width: IntWidth) -> Self {
        DestinationShape::Int {
            width,
            signed: false,
        }
    }
}

impl fmt::Display for DestinationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationShape::Int { width, signed } => {
                let prefix = if *signed { "i" } else { "u" };
                write!(f, "{prefix}{}", width.bits())
            }
            DestinationShape::Float(FloatWidth::W32) => f.write_str("f32"),
            DestinationShape::Float(FloatWidth::W64) => f.write_str("f64"),
            DestinationShape::String => f.write_str("string"),
            DestinationShape::Bool => f.write_str("bool"),
            DestinationShape::Bytes => f.write_str("bytes"),
            DestinationShape::Dynamic => f.write_str("dynamic"),
            DestinationShape::Time => f.write_str("time"),
            DestinationShape::OptionalTime => f.write_str("optional time"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DestinationShape, FloatWidth, IntWidth};

    #[test]
    fn display_names_are_stable() {
        let cases = [
            (DestinationShape::signed(IntWidth::W8), "i8"),
            (DestinationShape::unsigned(IntWidth::W64), "u64"),
            (DestinationShape::Float(FloatWidth::W32), "f32"),
            (DestinationShape::OptionalTime, "optional time"),
        ];
        for (shape, name) in cases {
            assert_eq!(shape.to_string(), name);
        }
    }
}
