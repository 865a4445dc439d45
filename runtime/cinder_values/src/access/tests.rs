#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cmp::Ordering;
use std::rc::Rc;

use cinder_ir::{ScalarName, TypeExpr};
use cinder_types::{Number, TypeId};
use pretty_assertions::assert_eq;

use crate::heap::{InlineBytes, NativeBox, Object, Storage};
use crate::{Engine, ErrorKind, HostType, TypeOf, Value};

struct Handle;

impl HostType for Handle {}

fn int_array(e: &mut Engine, scalar: ScalarName, items: &[i64]) -> Value {
    let items: Vec<Value> = items.iter().map(|&n| Value::Fixnum(n)).collect();
    e.array(&TypeExpr::Scalar(scalar), &items).unwrap()
}

#[test]
fn aref_boxes_by_width() {
    let mut e = Engine::new();
    let narrow = int_array(&mut e, ScalarName::Int16, &[-3, 4]);
    assert_eq!(e.aref(narrow, Value::Fixnum(0)).unwrap(), Value::Fixnum(-3));

    let wide = int_array(&mut e, ScalarName::Int32, &[10, 20]);
    let v = e.aref(wide, Value::Fixnum(1)).unwrap();
    assert_eq!(e.number_value(v).unwrap(), Number::Int32(20));
    assert_eq!(e.value_type(v), Some(TypeId::INT32));
}

#[test]
fn index_bounds() {
    let mut e = Engine::new();
    let a = int_array(&mut e, ScalarName::Int8, &[1, 2, 3]);
    assert_eq!(e.aref(a, Value::Fixnum(2)).unwrap(), Value::Fixnum(3));

    let err = e.aref(a, Value::Fixnum(3)).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Bounds {
            op: "aref",
            index: 3,
            len: 3
        }
    ));
    assert!(e.aref(a, Value::Fixnum(-1)).unwrap_err().is_bounds());
    assert!(e.aset(a, Value::Fixnum(3), Value::Fixnum(0)).unwrap_err().is_bounds());

    let half = e.make_number(Number::Double(0.5));
    assert!(e.aref(a, half).unwrap_err().is_type());
}

#[test]
fn aset_converts_to_element_type() {
    let mut e = Engine::new();
    let a = int_array(&mut e, ScalarName::UInt8, &[0, 0]);
    e.aset(a, Value::Fixnum(1), Value::Fixnum(300)).unwrap();
    assert_eq!(e.payload(a).unwrap(), &[0, 44]);

    let sym = e.symbol("x");
    assert!(e.aset(a, Value::Fixnum(0), sym).unwrap_err().is_type());
    assert_eq!(e.payload(a).unwrap(), &[0, 44]);
}

#[test]
fn aref_of_nested_array_copies_row() {
    let mut e = Engine::new();
    let row0 = int_array(&mut e, ScalarName::Int8, &[1, 2]);
    let row1 = int_array(&mut e, ScalarName::Int8, &[3, 4]);
    let grid = e
        .array(&TypeExpr::array(TypeExpr::Scalar(ScalarName::Int8), 2), &[row0, row1])
        .unwrap();

    let row = e.aref(grid, Value::Fixnum(1)).unwrap();
    assert_eq!(e.payload(row).unwrap(), &[3, 4]);
    e.aset(row, Value::Fixnum(0), Value::Fixnum(9)).unwrap();
    assert_eq!(e.payload(grid).unwrap(), &[1, 2, 3, 4]);
}

#[test]
fn record_fields() {
    let mut e = Engine::new();
    let expr = e.parse_type("(record (tag int8) (weight double))").unwrap();
    let v = e.new_value(&expr, None).unwrap();
    let weight = e.intern("weight");
    let tag = e.intern("tag");

    let w = e.make_number(Number::Double(2.25));
    e.set_field(v, weight, w).unwrap();
    e.set_field(v, tag, Value::Fixnum(-2)).unwrap();

    let read = e.field(v, weight).unwrap();
    assert_eq!(e.number_value(read).unwrap(), Number::Double(2.25));
    assert_eq!(e.field(v, tag).unwrap(), Value::Fixnum(-2));

    let missing = e.intern("height");
    let err = e.field(v, missing).unwrap_err();
    assert_eq!(err.message, "field: no member named height");
}

#[test]
fn field_reads_stay_inside_the_payload() {
    let mut e = Engine::new();
    let expr = e.parse_type("(record (x int32) (y int64))").unwrap();
    let ty = e.get_type(&expr).unwrap();
    let short = e.heap.alloc(Object::Native(NativeBox {
        ty,
        len: 4,
        storage: Storage::Inline(InlineBytes::from_elem(0, 4)),
    }));
    let v = Value::Object(short);
    let x = e.intern("x");
    let y = e.intern("y");

    let read = e.field(v, x).unwrap();
    assert_eq!(e.number_value(read).unwrap(), Number::Int32(0));
    let err = e.field(v, y).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Bounds { index: 16, len: 4, .. }));
    assert!(e.set_field(v, y, Value::Fixnum(1)).unwrap_err().is_bounds());
}

#[test]
fn sizes() {
    let mut e = Engine::new();
    let expr = e.parse_type("(record (a int8) (b double))").unwrap();
    assert_eq!(e.sizeof_expr(&expr).unwrap(), 16);
    assert_eq!(e.sizeof_expr(&TypeExpr::Scalar(ScalarName::WChar)).unwrap(), 4);

    let incomplete = TypeExpr::array_of(TypeExpr::Scalar(ScalarName::Int8));
    assert!(e.sizeof_expr(&incomplete).unwrap_err().is_argument());

    let v = e.text("four").unwrap();
    assert_eq!(e.sizeof_value(v).unwrap(), 4);
    let n = e.number(cinder_types::NumKind::Int16, None).unwrap();
    assert_eq!(e.sizeof_value(n).unwrap(), 2);
}

#[test]
fn type_of_classifies() {
    let mut e = Engine::new();
    assert_eq!(e.type_of(Value::Nil).unwrap(), TypeOf::Null);
    assert_eq!(e.type_of(Value::Bool(true)).unwrap(), TypeOf::Boolean);
    assert_eq!(e.type_of(Value::Fixnum(1)).unwrap(), TypeOf::Fixnum);
    let sym = e.symbol("s");
    assert_eq!(e.type_of(sym).unwrap(), TypeOf::Symbol);
    let p = e.cons(Value::Nil, Value::Nil);
    assert_eq!(e.type_of(p).unwrap(), TypeOf::Pair);
    let vec = e.vector(vec![]);
    assert_eq!(e.type_of(vec).unwrap(), TypeOf::Vector);
    let t = e.text("x").unwrap();
    assert_eq!(e.type_of(t).unwrap(), TypeOf::Native(TypeId::TEXT));
    let f = e.make_number(Number::Float(1.0));
    assert_eq!(e.type_of(f).unwrap(), TypeOf::Native(TypeId::FLOAT));
}

#[test]
fn plain_data_and_copy() {
    let mut e = Engine::new();
    let opaque = e.define_opaque_type("handle", 8, Rc::new(Handle), false).unwrap();
    let h = e.construct(opaque, None).unwrap();
    let a = int_array(&mut e, ScalarName::Int8, &[5, 6]);
    let n = e.make_number(Number::Int64(1 << 40));

    assert!(e.is_plain_old_data(a));
    assert!(e.is_plain_old_data(n));
    assert!(!e.is_plain_old_data(h));
    assert!(!e.is_plain_old_data(Value::Fixnum(1)));

    assert_eq!(e.copy(Value::Fixnum(7)).unwrap(), Value::Fixnum(7));
    let err = e.copy(h).unwrap_err();
    assert_eq!(err.message, "copy: argument must be a plain-old-data type");
    let p = e.cons(Value::Nil, Value::Nil);
    let err = e.copy(p).unwrap_err();
    assert_eq!(err.message, "copy: argument must be a leaf atom");

    let c = e.copy(a).unwrap();
    assert_ne!(c, a);
    assert_eq!(e.payload(c).unwrap(), &[5, 6]);
    let cn = e.copy(n).unwrap();
    assert_eq!(e.number_value(cn).unwrap(), Number::Int64(1 << 40));
}

#[test]
fn byte_comparison() {
    let mut e = Engine::new();
    let abc = e.text("abc").unwrap();
    let abd = e.text("abd").unwrap();
    let ab = e.text("ab").unwrap();
    let abc2 = e.text("abc").unwrap();
    assert_eq!(e.compare_bytes(abc, abd).unwrap(), Ordering::Less);
    assert_eq!(e.compare_bytes(ab, abc).unwrap(), Ordering::Less);
    assert_eq!(e.compare_bytes(abc, abc2).unwrap(), Ordering::Equal);
    assert!(e.compare_bytes(abc, Value::Nil).unwrap_err().is_type());
}

#[test]
fn scalar_payloads_are_read_only() {
    let mut e = Engine::new();
    let n = e.make_number(Number::Int32(1));
    assert_eq!(e.payload(n).unwrap(), &1i32.to_ne_bytes());
    assert!(e.payload_mut(n).unwrap_err().is_argument());
}
