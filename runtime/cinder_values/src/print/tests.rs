#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fmt;
use std::rc::Rc;

use cinder_ir::{ScalarName, TypeExpr};
use cinder_types::Number;
use pretty_assertions::assert_eq;

use crate::{Engine, HostType, Value};

#[test]
fn immediates() {
    let e = Engine::new();
    assert_eq!(e.display(Value::Nil), "()");
    assert_eq!(e.display(Value::Bool(true)), "#t");
    assert_eq!(e.display(Value::Bool(false)), "#f");
    assert_eq!(e.display(Value::Fixnum(-3)), "-3");
    assert_eq!(e.display(e.symbol("foo")), "foo");
}

#[test]
fn lists_and_vectors() {
    let mut e = Engine::new();
    let tail = e.cons(Value::Fixnum(2), Value::Fixnum(3));
    let dotted = e.cons(Value::Fixnum(1), tail);
    assert_eq!(e.display(dotted), "(1 2 . 3)");

    let inner = e.list(&[Value::Bool(true)]);
    let list = e.list(&[Value::Fixnum(1), inner]);
    assert_eq!(e.display(list), "(1 (#t))");

    let sym = e.symbol("x");
    let v = e.vector(vec![Value::Fixnum(1), sym]);
    assert_eq!(e.display(v), "[1 x]");
}

#[test]
fn scalars() {
    let mut e = Engine::new();
    let cases = [
        (Number::Double(2.0), "2.0"),
        (Number::Double(0.25), "0.25"),
        (Number::Double(f64::NAN), "+nan.0"),
        (Number::Double(f64::NEG_INFINITY), "-inf.0"),
        (Number::Int32(5), "#int32(5)"),
        (Number::Float(1.5), "#float(1.5)"),
        (Number::UInt64(u64::MAX), "#uint64(18446744073709551615)"),
        (Number::Int8(-1), "#int8(-1)"),
    ];
    for (n, expected) in cases {
        let v = e.make_number(n);
        assert_eq!(e.display(v), expected);
    }
}

#[test]
fn aliases_print_their_own_name() {
    let mut e = Engine::new();
    let v = e
        .new_value(&TypeExpr::Scalar(ScalarName::WChar), Some(Value::Fixnum(65)))
        .unwrap();
    assert_eq!(e.display(v), "#wchar(65)");
}

#[test]
fn text_prints_quoted() {
    let mut e = Engine::new();
    let v = e.text("say \"hi\"").unwrap();
    assert_eq!(e.display(v), r#""say \"hi\"""#);
}

#[test]
fn aggregates() {
    let mut e = Engine::new();
    let a = e
        .array(
            &TypeExpr::Scalar(ScalarName::Int8),
            &[Value::Fixnum(1), Value::Fixnum(2), Value::Fixnum(3)],
        )
        .unwrap();
    assert_eq!(e.display(a), "#(array int8 3)(1 2 3)");

    let expr = e.parse_type("(record (x int8) (y double))").unwrap();
    let init = e.list(&[Value::Fixnum(1), Value::Fixnum(2)]);
    let r = e.new_value(&expr, Some(init)).unwrap();
    assert_eq!(e.display(r), "#(record (x int8) (y double))((x 1) (y 2.0))");

    let expr = e.parse_type("(enum red green)").unwrap();
    let green = e.symbol("green");
    let en = e.new_value(&expr, Some(green)).unwrap();
    assert_eq!(e.display(en), "#(enum red green)(green)");
}

#[test]
fn pointers_print_as_hex() {
    let mut e = Engine::new();
    let expr = e.parse_type("(pointer void)").unwrap();
    let p = e.new_value(&expr, None).unwrap();
    assert_eq!(e.display(p), "#(pointer void)(#x0000000000000000)");
}

struct Port;

impl HostType for Port {
    fn print(&self, payload: &[u8], out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "#<port {}>", payload[0])
    }
}

#[test]
fn host_types_print_themselves() {
    let mut e = Engine::new();
    let ty = e.define_opaque_type("port", 1, Rc::new(Port), false).unwrap();
    let v = e.construct(ty, None).unwrap();
    e.payload_mut(v).unwrap()[0] = 3;
    assert_eq!(e.display(v), "#<port 3>");
}

#[test]
fn stale_handles_print_marker() {
    let mut e = Engine::new();
    let v = e.cons(Value::Nil, Value::Nil);
    e.collect();
    assert_eq!(e.display(v), "#<stale>");
}
