use super::*;
use crate::value;

#[test]
fn test_macro_builds_nested_sequences() {
    let v = value!([1, "a", [true, null], []]);
    assert_eq!(
        v,
        Value::Seq(vec![
            Value::from(1),
            Value::from("a"),
            Value::Seq(vec![Value::from(true), Value::null()]),
            Value::Seq(vec![]),
        ])
    );
}

#[test]
fn test_seq_constructor() {
    assert_eq!(Value::seq(["a", "b"]), value!(["a", "b"]));
    assert_eq!(Value::seq(Vec::<Value>::new()), value!([]));
}

#[test]
fn test_accessors() {
    let v = value!(["name", "x"]);
    let items = v.as_seq().unwrap_or_default();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_str(), Some("name"));
    assert!(v.as_scalar().is_none());
    assert!(Value::from(3).as_seq().is_none());
}

#[test]
fn test_display() {
    assert_eq!(value!([1, ["a", null], 2.5]).to_string(), "[1, [\"a\", null], 2.5]");
    assert_eq!(value!([]).to_string(), "[]");
}
