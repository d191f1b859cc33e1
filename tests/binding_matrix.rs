//! Purpose: Pin the full source-type by destination-shape compatibility matrix.
//! Exports: Integration tests only.
//! Role: Guard against accidental widening or narrowing of supported bindings.
//! Invariants: Every pair is either supported or rejected with `UnsupportedBinding`.
//! Invariants: Every supported decoder maps JSON null to "no value".

use std::borrow::Cow;

use rowbind::api::{
    DecodeContext, DestinationShape, ErrorKind, FieldValue, FloatWidth, IntWidth, SourceType,
    Token, resolve_binding,
};

fn expected_supported(source: SourceType, shape: DestinationShape) -> bool {
    use DestinationShape as D;
    if shape == D::String {
        return true;
    }
    match source {
        SourceType::Integer => matches!(shape, D::Int { .. } | D::Dynamic),
        SourceType::Bytes => matches!(shape, D::Bytes | D::Dynamic),
        SourceType::String => shape == D::Dynamic,
        SourceType::FloatingPoint => matches!(shape, D::Float(_) | D::Dynamic),
        SourceType::Temporal => matches!(
            shape,
            D::Int {
                width: IntWidth::W32 | IntWidth::W64,
                ..
            } | D::Dynamic
                | D::Time
                | D::OptionalTime
        ),
        SourceType::Boolean => matches!(
            shape,
            D::Bool
                | D::Int {
                    width: IntWidth::W8,
                    ..
                }
                | D::Dynamic
        ),
    }
}

#[test]
fn every_pair_matches_the_matrix() {
    let mut supported = 0;
    for source in SourceType::ALL {
        for shape in DestinationShape::ALL {
            let resolved = resolve_binding(source, shape);
            if expected_supported(source, shape) {
                assert!(resolved.is_ok(), "{source} -> {shape} should be supported");
                supported += 1;
            } else {
                let err = resolved.err().expect("unsupported pair");
                assert_eq!(err.kind(), ErrorKind::UnsupportedBinding, "{source} -> {shape}");
                assert_eq!(err.source_type(), Some(source.as_str()));
                assert_eq!(err.shape(), Some(shape.to_string().as_str()));
            }
        }
    }
    assert_eq!(supported, 32);
}

#[test]
fn null_yields_no_value_for_every_supported_pair() {
    let ctx = DecodeContext::uncached();
    for source in SourceType::ALL {
        for shape in DestinationShape::ALL {
            let Ok(decode) = resolve_binding(source, shape) else {
                continue;
            };
            let value = decode(&mut Token::Null, &ctx).expect("null decodes");
            assert_eq!(value, None, "{source} -> {shape}");
        }
    }
}

#[test]
fn float_widths_and_integer_destinations_are_distinct() {
    assert!(resolve_binding(SourceType::FloatingPoint, DestinationShape::Float(FloatWidth::W32)).is_ok());
    assert!(
        resolve_binding(SourceType::FloatingPoint, DestinationShape::signed(IntWidth::W64))
            .is_err()
    );
    assert!(
        resolve_binding(SourceType::Integer, DestinationShape::Float(FloatWidth::W64)).is_err()
    );
    assert!(
        resolve_binding(SourceType::Temporal, DestinationShape::unsigned(IntWidth::W16)).is_err()
    );
}

fn render(value: &FieldValue) -> String {
    match value {
        FieldValue::I8(v) => v.to_string(),
        FieldValue::I16(v) => v.to_string(),
        FieldValue::I32(v) => v.to_string(),
        FieldValue::I64(v) => v.to_string(),
        FieldValue::U8(v) => v.to_string(),
        FieldValue::U16(v) => v.to_string(),
        FieldValue::U32(v) => v.to_string(),
        FieldValue::U64(v) => v.to_string(),
        FieldValue::F32(v) => v.to_string(),
        FieldValue::F64(v) => v.to_string(),
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::String(v) => v.clone(),
        FieldValue::Dynamic(v) => v.to_string(),
        other => panic!("no textual form for {other:?}"),
    }
}

#[test]
fn textual_values_round_trip_through_supported_pairs() {
    let ctx = DecodeContext::uncached();
    let cases = [
        (SourceType::Integer, "42"),
        (SourceType::FloatingPoint, "2.5"),
        (SourceType::Boolean, "true"),
        (SourceType::String, "plain text"),
    ];
    for (source, text) in cases {
        for shape in DestinationShape::ALL {
            let Ok(decode) = resolve_binding(source, shape) else {
                continue;
            };
            let value = decode(&mut Token::Str(Cow::Borrowed(text)), &ctx)
                .expect("decode")
                .expect("present");
            let expected = match (source, shape) {
                (SourceType::Boolean, DestinationShape::Int { .. }) => "1",
                _ => text,
            };
            assert_eq!(render(&value), expected, "{source} -> {shape}");
        }
    }
}

#[test]
fn integer_limits_and_truncation() {
    let ctx = DecodeContext::uncached();
    let max = "9223372036854775807";
    let wide = resolve_binding(SourceType::Integer, DestinationShape::signed(IntWidth::W64))
        .expect("i64");
    assert_eq!(
        wide(&mut Token::Str(Cow::Borrowed(max)), &ctx).expect("decode"),
        Some(FieldValue::I64(i64::MAX))
    );
    let narrow = resolve_binding(SourceType::Integer, DestinationShape::signed(IntWidth::W8))
        .expect("i8");
    assert_eq!(
        narrow(&mut Token::Str(Cow::Borrowed(max)), &ctx).expect("decode"),
        Some(FieldValue::I8(-1))
    );
}
