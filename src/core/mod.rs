// Core decoding machinery: token boundary, scalar parsers, temporal layouts, binding resolution.
pub mod error;
pub mod resolve;
pub mod scalar;
pub mod shape;
pub mod source_type;
pub mod temporal;
pub mod token;
pub mod value;
