//! Parse/serialize tables over the whole codec surface.
//!
//! Round-trip cases pin the canonical output text; failure cases pin the
//! exact error offsets. Cases involving dict output switch the process
//! default backend to the red-black tree so entry order is deterministic.

use motley_core::{Backend, Dict, Value, parse, set_default_backend, value_to_text};
use serial_test::serial;

fn roundtrip(input: &str) -> String {
    match parse(input) {
        Ok(v) => value_to_text(&v),
        Err(e) => panic!("parse of {input:?} failed: {e}"),
    }
}

#[test]
#[serial]
fn test_roundtrip_table() {
    set_default_backend(Backend::BstRb);

    let cases: &[(&str, &str)] = &[
        ("[]", "[]"),
        ("{}", "{}"),
        ("[{}]", "[{}]"),
        ("[{},{}]", "[{}, {}]"),
        ("[[],[]]", "[[], []]"),
        ("[[[[[]]]]]", "[[[[[]]]]]"),
        ("[1]", "[1]"),
        ("[1,2,3]", "[1, 2, 3]"),
        ("[1,2,3,]", "[1, 2, 3]"),
        ("{ }", "{}"),
        ("[ ]", "[]"),
        ("\"t\\\"tt\"", "\"t\\\"tt\""),
        ("\"str'ing\"", "\"str'ing\""),
        ("\"\\\"\\\"\\\"\"", "\"\\\"\\\"\\\"\""),
        ("\"\\\\\\\\\"", "\"\\\\\\\\\""),
        ("null", "null"),
        ("true", "true"),
        ("false", "false"),
        ("\"str\"", "\"str\""),
        ("12345", "12345"),
        ("-69.38", "-69.38"),
        ("'plata o plomo'", "\"plata o plomo\""),
        ("[1,2,3,4]", "[1, 2, 3, 4]"),
        ("{1:2}", "{1: 2}"),
        // bool keys sort before numeric keys
        ("{1:2, true: false}", "{true: false, 1: 2}"),
        ("{1: {2: {true: false}}}", "{1: {2: {true: false}}}"),
        ("{1:[1], 2:[2]}", "{1: [1], 2: [2]}"),
        ("1.2E34", "1.2e+34"),
        ("1 ", "1"),
        ("1.01 ", "1.01"),
        ("1\n", "1"),
        ("1.01\n", "1.01"),
        ("1\t", "1"),
        ("0.0", "0"),
        ("-0.0", "-0"),
        ("1.0", "1"),
        ("-1.0", "-1"),
        ("1.5", "1.5"),
        ("-1.5", "-1.5"),
        ("3.1416", "3.1416"),
        ("2E20", "2e+20"),
        ("2e20", "2e+20"),
        ("2E+20", "2e+20"),
        ("2E-20", "2e-20"),
        ("-1E10", "-10000000000"),
        ("1.234E+10", "12340000000"),
        ("1.234E-10", "1.234e-10"),
        ("0.9868011474609375", "0.9868011474609375"),
        ("45913141877270640000.0", "4.591314187727064e+19"),
        ("0.017976931348623157e+310", "1.7976931348623157e+308"),
        (
            "5708990770823839207320493820740630171355185152001e-3",
            "5.70899077082384e+45",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(&roundtrip(input), expected, "input {input:?}");
    }
}

#[test]
fn test_failure_table() {
    let cases: &[(&str, usize)] = &[
        ("[", 1),
        ("[],", 2),
        ("{},", 2),
        (",", 0),
        ("[0,,]", 3),
        ("null,", 4),
        ("\"str", 4),
        ("[{]}", 2),
        ("[1,2,}", 5),
        ("{1,2,}", 2),
        ("]", 0),
        ("}", 0),
        ("a", 0),
        ("&", 0),
        ("", 0),
        ("{true: {false: [];}}", 17),
        ("-", 0),
        ("[-]", 1),
        ("[-3-]", 3),
        ("--3", 0),
    ];
    for (input, offset) in cases {
        let err = parse(input).expect_err(input);
        assert_eq!(err.offset, *offset, "input {input:?}");
        assert_eq!(err.to_string(), format!("Parsing failed at offset {offset}"));
    }
}

#[test]
fn test_serialize_mixed_vector_in_dict() {
    let mut d = Dict::with_backend(Backend::BstRb);
    let v = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::vector(vec![]),
        Value::dict(Dict::with_backend(Backend::BstRb)),
        Value::Int(-1),
        Value::Int(2),
        Value::Real(3.4),
        Value::Size(1888888888888881),
        Value::Ptr(0),
    ];
    d.put(Value::str("key"), Value::vector(v));
    assert_eq!(
        d.to_string(),
        "{\"key\": [null, true, false, [], {}, -1, 2, 3.4, 1888888888888881, &(nil)]}"
    );
}

#[test]
#[serial]
fn test_default_backend_switch() {
    set_default_backend(Backend::Htbl);
    assert_eq!(Dict::new().backend(), Backend::Htbl);
    let parsed = parse("{1: 2}").expect("parse");
    assert_eq!(parsed.as_dict().borrow().backend(), Backend::Htbl);

    set_default_backend(Backend::BstPlain);
    assert_eq!(Dict::new().backend(), Backend::BstPlain);
}

#[test]
#[serial]
fn test_parsed_dicts_equal_across_backends() {
    let text = "{'a': [1, 2.0, {'b': null}], 'c': true}";
    set_default_backend(Backend::Htbl);
    let hashed = parse(text).expect("parse");
    set_default_backend(Backend::BstRb);
    let ordered = parse(text).expect("parse");
    assert_eq!(hashed, ordered);
    set_default_backend(Backend::BstPlain);
}
