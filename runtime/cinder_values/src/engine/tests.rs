#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;
use std::sync::Arc;

use cinder_ir::StringInterner;
use pretty_assertions::assert_eq;

use crate::{Engine, EngineConfig, HostType, Value};

struct Blob;

impl HostType for Blob {}

#[test]
fn with_roots_protects_for_its_duration() {
    let mut e = Engine::new();
    let keep = e.cons(Value::Fixnum(1), Value::Nil);
    let lose = e.cons(Value::Fixnum(2), Value::Nil);

    e.with_roots(&[keep], |e| {
        e.collect();
    });

    assert!(e.is_live(keep));
    assert!(!e.is_live(lose));
    e.collect();
    assert!(!e.is_live(keep));
}

#[test]
fn explicit_root_stack() {
    let mut e = Engine::new();
    let v = e.text("rooted").unwrap();
    e.push_root(v);
    e.collect();
    assert_eq!(e.text_of(v).unwrap(), "rooted");
    assert_eq!(e.pop_root(), Some(v));
    assert_eq!(e.pop_root(), None);
}

#[test]
fn globals_are_roots() {
    let mut e = Engine::new();
    let v = e.list(&[Value::Fixnum(1), Value::Fixnum(2)]);
    e.set_global("xs", v);
    e.collect();

    let xs = e.global("xs").unwrap();
    assert_eq!(xs, v);
    assert_eq!(e.display(xs), "(1 2)");
    assert_eq!(e.global("missing"), None);
}

#[test]
fn pair_accessors() {
    let mut e = Engine::new();
    let p = e.cons(Value::Fixnum(1), Value::Bool(false));
    assert_eq!(e.car(p).unwrap(), Value::Fixnum(1));
    assert_eq!(e.cdr(p).unwrap(), Value::Bool(false));
    assert!(e.car(Value::Nil).unwrap_err().is_type());
    assert!(e.cdr(Value::Fixnum(3)).unwrap_err().is_type());
}

#[test]
fn sequences() {
    let mut e = Engine::new();
    let items = [Value::Fixnum(1), Value::Fixnum(2)];
    let list = e.list(&items);
    let vector = e.vector(items.to_vec());
    assert_eq!(e.sequence_items(list).unwrap(), Some(items.to_vec()));
    assert_eq!(e.sequence_items(vector).unwrap(), Some(items.to_vec()));
    assert_eq!(e.sequence_items(Value::Nil).unwrap(), Some(vec![]));
    assert_eq!(e.sequence_items(Value::Fixnum(1)).unwrap(), None);

    let improper = e.cons(Value::Fixnum(1), Value::Fixnum(2));
    assert!(e.sequence_items(improper).unwrap_err().is_argument());
}

#[test]
fn collect_resets_pressure_and_counts() {
    let config = EngineConfig::default().with_inline_threshold(8);
    let mut e = Engine::with_config(config);
    let v = e.text("longer than eight").unwrap();
    assert_eq!(e.pressure(), 18);
    assert_eq!(e.autorelease_count(), 1);

    e.push_root(v);
    let stats = e.collect();
    assert_eq!(stats.finalized, 0);
    assert_eq!(e.pressure(), 0);

    e.pop_root();
    let stats = e.collect();
    assert_eq!(stats.finalized, 1);
    assert_eq!(stats.released_bytes, 18);
    assert_eq!(e.autorelease_count(), 0);

    let totals = e.stats();
    assert_eq!(totals.collections, 2);
    assert_eq!(totals.finalized, 1);
    assert_eq!(totals.foreign_bytes, 18);
    assert_eq!(totals.pressure_collections, 0);
}

#[test]
fn shared_interner_agrees_on_symbols() {
    let interner = Arc::new(StringInterner::new());
    let name = interner.intern("shared");
    let e = Engine::with_interner(EngineConfig::default(), Arc::clone(&interner));
    assert_eq!(e.symbol("shared"), Value::Symbol(name));
}

#[test]
fn type_names() {
    let mut e = Engine::new();
    assert_eq!(e.type_name(Value::Nil), "nil");
    assert_eq!(e.type_name(Value::Fixnum(1)), "fixnum");
    let t = e.text("t").unwrap();
    assert_eq!(e.type_name(t), "(array byte)");
    let expr = e.parse_type("(array int16 2)").unwrap();
    let a = e.new_value(&expr, None).unwrap();
    assert_eq!(e.type_name(a), "(array int16 2)");

    e.collect();
    assert_eq!(e.type_name(a), "stale handle");
}

#[test]
fn opaque_names_are_unique() {
    let mut e = Engine::new();
    e.define_opaque_type("blob", 4, Rc::new(Blob), false).unwrap();
    assert!(e.define_opaque_type("blob", 8, Rc::new(Blob), false).unwrap_err().is_argument());
    assert!(e.define_opaque_type("int32", 4, Rc::new(Blob), false).unwrap_err().is_argument());

    let expr = e.parse_type("(array blob 2)").unwrap();
    let a = e.new_value(&expr, None).unwrap();
    assert_eq!(e.sizeof_value(a).unwrap(), 8);
}

#[test]
fn nested_incomplete_arrays_are_rejected() {
    let mut e = Engine::new();
    let expr = e.parse_type("(array (array int8))").unwrap();
    assert!(e.get_type(&expr).unwrap_err().is_argument());

    let expr = e.parse_type("(record (tail (array int8)))").unwrap();
    assert!(e.get_type(&expr).unwrap_err().is_argument());
}

#[test]
fn malformed_type_text_is_an_argument_error() {
    let e = Engine::new();
    assert!(e.parse_type("(array int8").unwrap_err().is_argument());

    let deep = format!("{}int8{}", "(pointer ".repeat(100_000), ")".repeat(100_000));
    assert!(e.parse_type(&deep).unwrap_err().is_argument());
}

#[test]
fn location_needs_a_heap_object() {
    let mut e = Engine::new();
    assert!(e.location(Value::Fixnum(1)).unwrap_err().is_type());
    let v = e.cons(Value::Nil, Value::Nil);
    assert!(e.location(v).is_ok());
    e.collect();
    assert!(e.location(v).is_err());
}
