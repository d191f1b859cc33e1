//! Purpose: Define the scalar token boundary the decoder reads through.
//! Exports: `TokenCursor`, `TokenKind`, `Token`, `ValueCursor`.
//! Role: Contract with the upstream token stream: read a nullable string or a nullable number.
//! Invariants: Reading a token of the wrong structural type is a `Structural` error, never a coercion.
//! Invariants: Nested arrays/objects are drained from the stream before being reported.
//! Notes: `Token` borrows strings from the input whenever the deserializer allows it.

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Value;

use crate::core::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Null,
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Null => "null",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Bool => "bool",
            TokenKind::Array => "array",
            TokenKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Read position over exactly one JSON scalar value.
pub trait TokenCursor {
    fn kind(&self) -> TokenKind;

    /// Reads a string token; JSON null yields `None`.
    fn string_or_null(&mut self) -> Result<Option<Cow<'_, str>>, Error>;

    /// Reads a native JSON number token; JSON null yields `None`.
    fn number_or_null(&mut self) -> Result<Option<f64>, Error>;
}

fn unexpected(expected: &str, found: TokenKind) -> Error {
    Error::structural(format!("expected {expected} or null, found {found}"))
}

/// One scalar captured from a streaming deserializer.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'de> {
    Null,
    Str(Cow<'de, str>),
    Number(f64),
    Bool(bool),
    Nested(TokenKind),
}

impl TokenCursor for Token<'_> {
    fn kind(&self) -> TokenKind {
        match self {
            Token::Null => TokenKind::Null,
            Token::Str(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Bool(_) => TokenKind::Bool,
            Token::Nested(kind) => *kind,
        }
    }

    fn string_or_null(&mut self) -> Result<Option<Cow<'_, str>>, Error> {
        match self {
            Token::Null => Ok(None),
            Token::Str(text) => Ok(Some(Cow::Borrowed(&**text))),
            other => Err(unexpected("string", other.kind())),
        }
    }

    fn number_or_null(&mut self) -> Result<Option<f64>, Error> {
        match self {
            Token::Null => Ok(None),
            Token::Number(value) => Ok(Some(*value)),
            other => Err(unexpected("number", other.kind())),
        }
    }
}

impl<'de> Deserialize<'de> for Token<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TokenVisitor)
    }
}

struct TokenVisitor;

impl<'de> Visitor<'de> for TokenVisitor {
    type Value = Token<'de>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Token::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Token::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Token::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Token::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Token::Number(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Token::Number(value))
    }

    fn visit_borrowed_str<E: de::Error>(self, value: &'de str) -> Result<Self::Value, E> {
        Ok(Token::Str(Cow::Borrowed(value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(Token::Str(Cow::Owned(value.to_owned())))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(Token::Str(Cow::Owned(value)))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Token::Nested(TokenKind::Array))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Token::Nested(TokenKind::Object))
    }
}

/// Cursor over a value that was already parsed into a `serde_json::Value`.
#[derive(Clone, Copy, Debug)]
pub struct ValueCursor<'a> {
    value: &'a Value,
}

impl<'a> ValueCursor<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }
}

impl TokenCursor for ValueCursor<'_> {
    fn kind(&self) -> TokenKind {
        match self.value {
            Value::Null => TokenKind::Null,
            Value::String(_) => TokenKind::String,
            Value::Number(_) => TokenKind::Number,
            Value::Bool(_) => TokenKind::Bool,
            Value::Array(_) => TokenKind::Array,
            Value::Object(_) => TokenKind::Object,
        }
    }

    fn string_or_null(&mut self) -> Result<Option<Cow<'_, str>>, Error> {
        match self.value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(Cow::Borrowed(text.as_str()))),
            _ => Err(unexpected("string", self.kind())),
        }
    }

    fn number_or_null(&mut self) -> Result<Option<f64>, Error> {
        match self.value {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_f64()
                .map(Some)
                .ok_or_else(|| Error::structural(format!("number {number} is not representable"))),
            _ => Err(unexpected("number", self.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, TokenCursor, TokenKind, ValueCursor};
    use crate::core::error::ErrorKind;
    use serde_json::json;
    use std::borrow::Cow;

    #[test]
    fn tokens_borrow_unescaped_strings() {
        let token: Token<'_> = serde_json::from_str(r#""plain""#).expect("token");
        assert!(matches!(token, Token::Str(Cow::Borrowed("plain"))));

        let token: Token<'_> = serde_json::from_str(r#""esc\"aped""#).expect("token");
        assert_eq!(token, Token::Str(Cow::Owned("esc\"aped".to_string())));
    }

    #[test]
    fn nested_values_are_drained_and_reported() {
        let mut token: Token<'_> = serde_json::from_str(r#"{"a":[1,2,{"b":null}]}"#).expect("token");
        assert_eq!(token.kind(), TokenKind::Object);
        let err = token.string_or_null().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn null_reads_as_absent_for_both_readers() {
        let mut token: Token<'_> = serde_json::from_str("null").expect("token");
        assert_eq!(token.string_or_null().expect("string"), None);
        assert_eq!(token.number_or_null().expect("number"), None);
    }

    #[test]
    fn wrong_structural_type_is_an_error() {
        let mut token = Token::Number(1.5);
        assert_eq!(
            token.string_or_null().unwrap_err().kind(),
            ErrorKind::Structural
        );
        let mut token = Token::Str(Cow::Borrowed("1.5"));
        assert_eq!(
            token.number_or_null().unwrap_err().kind(),
            ErrorKind::Structural
        );
        let mut token = Token::Bool(true);
        assert!(token.string_or_null().is_err());
    }

    #[test]
    fn value_cursor_mirrors_token_semantics() {
        let value = json!({"s": "x", "n": 2.5, "z": null, "b": false});
        let mut s = ValueCursor::new(&value["s"]);
        assert_eq!(s.string_or_null().expect("s").as_deref(), Some("x"));
        let mut n = ValueCursor::new(&value["n"]);
        assert_eq!(n.kind(), TokenKind::Number);
        assert_eq!(n.number_or_null().expect("n"), Some(2.5));
        let mut z = ValueCursor::new(&value["z"]);
        assert_eq!(z.string_or_null().expect("z"), None);
        let mut b = ValueCursor::new(&value["b"]);
        assert_eq!(b.string_or_null().unwrap_err().kind(), ErrorKind::Structural);
    }
}
