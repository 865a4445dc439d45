#![allow(clippy::unwrap_used, clippy::expect_used)]

use cinder_ir::{ScalarName, TypeExpr};
use cinder_types::{NumKind, Number, TypeId};
use pretty_assertions::assert_eq;

use crate::heap::Object;
use crate::{Engine, ForeignBuf, StorageKind, Value, ViewSource};

fn bytes_type(e: &mut Engine, len: u64) -> TypeId {
    e.get_type(&TypeExpr::array(TypeExpr::Scalar(ScalarName::UInt8), len))
        .unwrap()
}

#[test]
fn numeric_types_box_as_scalars() {
    let mut e = Engine::new();
    let v = e.make_value(TypeId::DOUBLE, 8).unwrap();
    assert_eq!(e.storage_kind(v).unwrap(), StorageKind::Scalar);
    assert_eq!(e.number_value(v).unwrap(), Number::Double(0.0));
}

#[test]
fn empty_text_is_shared() {
    let mut e = Engine::new();
    let a = e.make_value(TypeId::TEXT, 0).unwrap();
    let b = e.text("").unwrap();
    assert_eq!(a, b);
    assert_eq!(e.text_of(a).unwrap(), "");
}

#[test]
fn inline_up_to_threshold() {
    let mut e = Engine::new();
    let at = bytes_type(&mut e, 384);
    let over = bytes_type(&mut e, 385);

    let small = e.make_value(at, 384).unwrap();
    assert_eq!(e.storage_kind(small).unwrap(), StorageKind::Inline);
    assert!(!e.is_autoreleased(small));
    assert_eq!(e.pressure(), 0);

    let big = e.make_value(over, 385).unwrap();
    assert_eq!(e.storage_kind(big).unwrap(), StorageKind::Owned);
    assert!(e.is_autoreleased(big));
    assert_eq!(e.pressure(), 385);
}

#[test]
fn text_reserves_terminator() {
    let mut e = Engine::new();
    let v = e.text("abc").unwrap();
    assert_eq!(e.sizeof_value(v).unwrap(), 3);
    assert_eq!(e.text_of(v).unwrap(), "abc");

    let r = v.as_object().unwrap();
    let Ok(Object::Native(nb)) = e.heap.get(r) else {
        panic!("text should be a native box");
    };
    assert_eq!(nb.storage.own_bytes(4), Some(&b"abc\0"[..]));
}

#[test]
fn int_value_picks_smallest_box() {
    let mut e = Engine::new();
    assert_eq!(e.int_value(5), Value::Fixnum(5));

    let v = e.int_value(1 << 62);
    assert_eq!(e.number_value(v).unwrap(), Number::Int64(1 << 62));

    let v = e.int_value(i128::from(u64::MAX));
    assert_eq!(e.number_value(v).unwrap(), Number::UInt64(u64::MAX));

    let v = e.int_value(1 << 64);
    assert_eq!(e.number_value(v).unwrap(), Number::UInt64(0));
}

#[test]
fn parent_views_are_bounds_checked() {
    let mut e = Engine::new();
    let eight = bytes_type(&mut e, 8);
    let four = bytes_type(&mut e, 4);
    let parent = e.make_value(eight, 8).unwrap();

    let ok = e.make_view(four, ViewSource::Parent { parent, offset: 4 }, 4);
    assert!(ok.is_ok());
    let err = e
        .make_view(four, ViewSource::Parent { parent, offset: 5 }, 4)
        .unwrap_err();
    assert!(err.is_bounds());
}

#[test]
fn views_share_the_parent_payload() {
    let mut e = Engine::new();
    let eight = bytes_type(&mut e, 8);
    let four = bytes_type(&mut e, 4);
    let two = bytes_type(&mut e, 2);
    let parent = e.make_value(eight, 8).unwrap();
    let view = e.make_view(four, ViewSource::Parent { parent, offset: 4 }, 4).unwrap();
    let inner = e.make_view(two, ViewSource::Parent { parent: view, offset: 2 }, 2).unwrap();

    e.payload_mut(inner).unwrap().copy_from_slice(&[7, 9]);

    assert_eq!(e.payload(parent).unwrap(), &[0, 0, 0, 0, 0, 0, 7, 9]);
    assert_eq!(e.storage_kind(inner).unwrap(), StorageKind::Parent);
    assert!(!e.is_autoreleased(view));
    assert!(!e.is_autoreleased(inner));
}

#[test]
fn adopted_external_memory_becomes_owned() {
    let mut e = Engine::new();
    let sixteen = bytes_type(&mut e, 16);
    let mut buf = ForeignBuf::alloc_zeroed(16).unwrap();
    buf.as_mut_slice()[0] = 42;

    let v = e.make_view(sixteen, ViewSource::External(buf), 16).unwrap();
    assert_eq!(e.storage_kind(v).unwrap(), StorageKind::External);
    assert!(!e.is_autoreleased(v));
    assert_eq!(e.payload(v).unwrap()[0], 42);

    e.adopt(v).unwrap();
    assert_eq!(e.storage_kind(v).unwrap(), StorageKind::Owned);
    assert!(e.is_autoreleased(v));
    assert!(e.adopt(v).is_err());
}

#[test]
fn clone_of_view_owns_fresh_storage() {
    let mut e = Engine::new();
    let eight = bytes_type(&mut e, 8);
    let four = bytes_type(&mut e, 4);
    let parent = e.make_value(eight, 8).unwrap();
    let view = e.make_view(four, ViewSource::Parent { parent, offset: 0 }, 4).unwrap();
    e.payload_mut(view).unwrap().copy_from_slice(&[1, 2, 3, 4]);

    let copy = e.clone_value(view).unwrap();
    assert_eq!(e.storage_kind(copy).unwrap(), StorageKind::Owned);
    e.payload_mut(copy).unwrap()[0] = 99;

    assert_eq!(e.payload(copy).unwrap(), &[99, 2, 3, 4]);
    assert_eq!(e.payload(parent).unwrap()[..4], [1, 2, 3, 4]);
}

#[test]
fn clone_of_inline_stays_inline() {
    let mut e = Engine::new();
    let v = e.text("hi").unwrap();
    let copy = e.clone_value(v).unwrap();
    assert_ne!(v, copy);
    assert_eq!(e.storage_kind(copy).unwrap(), StorageKind::Inline);
    assert_eq!(e.text_of(copy).unwrap(), "hi");
}

#[test]
fn pin_moves_inline_payload_out() {
    let mut e = Engine::new();
    let v = e.text("pinned").unwrap();
    e.pin(v).unwrap();
    assert_eq!(e.storage_kind(v).unwrap(), StorageKind::Owned);
    assert!(e.is_autoreleased(v));
    assert_eq!(e.text_of(v).unwrap(), "pinned");
}

#[test]
fn numeric_constructors_convert() {
    let mut e = Engine::new();
    let v = e.number(NumKind::Int32, Some(Value::Fixnum(300))).unwrap();
    assert_eq!(e.number_value(v).unwrap(), Number::Int32(300));

    let v = e.number(NumKind::UInt8, Some(Value::Fixnum(300))).unwrap();
    assert_eq!(e.number_value(v).unwrap(), Number::UInt8(44));

    let v = e.number(NumKind::Float, None).unwrap();
    assert_eq!(e.number_value(v).unwrap(), Number::Float(0.0));

    let sym = e.symbol("x");
    assert!(e.number(NumKind::Int64, Some(sym)).unwrap_err().is_type());
}

#[test]
fn incomplete_array_sized_from_source() {
    let mut e = Engine::new();
    let items = [Value::Fixnum(1), Value::Fixnum(2), Value::Fixnum(3)];
    let list = e.list(&items);
    let ty = TypeExpr::array_of(TypeExpr::Scalar(ScalarName::Int32));

    let v = e.new_value(&ty, Some(list)).unwrap();

    assert_eq!(e.sizeof_value(v).unwrap(), 12);
    assert_eq!(e.array_len(v).unwrap(), 3);
}

#[test]
fn array_helper_builds_complete_array() {
    let mut e = Engine::new();
    let v = e
        .array(&TypeExpr::Scalar(ScalarName::Int16), &[Value::Fixnum(-1), Value::Fixnum(2)])
        .unwrap();
    let mut expected = Vec::new();
    expected.extend_from_slice(&(-1i16).to_ne_bytes());
    expected.extend_from_slice(&2i16.to_ne_bytes());
    assert_eq!(e.payload(v).unwrap(), &expected[..]);
}

#[test]
fn sizes_must_match_the_descriptor() {
    let mut e = Engine::new();
    let expr = e.parse_type("(record (x int32) (y int64))").unwrap();
    let rec = e.get_type(&expr).unwrap();
    let four = bytes_type(&mut e, 4);
    let parent = e.make_value(four, 4).unwrap();

    let err = e
        .make_view(rec, ViewSource::Parent { parent, offset: 0 }, 4)
        .unwrap_err();
    assert!(err.is_argument());
    assert!(e.make_value(rec, 0).unwrap_err().is_argument());
    assert!(e.make_value(four, 5).unwrap_err().is_argument());
    assert!(e.make_view(TypeId::INT32, ViewSource::Parent { parent, offset: 0 }, 4).is_err());

    let ints = e.get_type(&TypeExpr::array_of(TypeExpr::Scalar(ScalarName::Int32))).unwrap();
    assert!(e.make_value(ints, 6).unwrap_err().is_argument());
    let v = e.make_value(ints, 8).unwrap();
    assert_eq!(e.array_len(v).unwrap(), 2);
}

#[test]
fn every_empty_byte_array_is_the_shared_text() {
    let mut e = Engine::new();
    let empty = e.get_type(&TypeExpr::array(TypeExpr::Scalar(ScalarName::Byte), 0)).unwrap();
    let a = e.make_value(empty, 0).unwrap();
    let b = e.text("").unwrap();
    assert_eq!(a, b);
    assert_eq!(e.object_count(), 1);
}

struct Closing;

impl crate::HostType for Closing {
    fn has_finalizer(&self) -> bool {
        true
    }
}

#[test]
fn pin_registers_a_value_once() {
    let mut e = Engine::new();
    let ty = e.define_opaque_type("closing", 4, std::rc::Rc::new(Closing), false).unwrap();
    let v = e.construct(ty, None).unwrap();
    assert_eq!(e.autorelease_count(), 1);

    e.pin(v).unwrap();
    assert_eq!(e.storage_kind(v).unwrap(), StorageKind::Owned);
    assert_eq!(e.autorelease_count(), 1);
}
