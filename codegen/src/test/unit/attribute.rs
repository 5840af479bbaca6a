use test_case::test_case;

use crate::Attribute;

#[test_case(Attribute::Bool(true), "true"; "bool")]
#[test_case(Attribute::Int(3), "3 : i64"; "int")]
#[test_case(Attribute::Float(1.0), "1.0 : f64"; "float_whole")]
#[test_case(Attribute::Float(0.25), "0.25 : f64"; "float_fraction")]
#[test_case(Attribute::Float(1e-9), "1.0e-9 : f64"; "float_exponent")]
#[test_case(Attribute::Str("Local".into()), "\"Local\""; "string")]
#[test_case(Attribute::usizes(&[1, 0]), "array<i64: 1, 0>"; "ints")]
#[test_case(Attribute::Ints(vec![]), "array<i64>"; "empty_ints")]
#[test_case(Attribute::Floats(vec![0.5, 2.0]), "array<f64: 0.5, 2.0>"; "floats")]
fn test_attribute_syntax(attribute: Attribute, expected: &str) {
    assert_eq!(attribute.to_string(), expected);
}
