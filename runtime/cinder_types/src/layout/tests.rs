#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use cinder_ir::StringInterner;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn field(interner: &StringInterner, name: &str, ty: TypeExpr) -> Field {
    Field {
        name: interner.intern(name),
        ty,
    }
}

fn scalar(s: ScalarName) -> TypeExpr {
    TypeExpr::Scalar(s)
}

#[test]
fn scalar_layouts_are_native() {
    assert_eq!(sizeof_type(&scalar(ScalarName::Int8), &()), Ok(Layout::new(1, 1)));
    assert_eq!(sizeof_type(&scalar(ScalarName::UInt16), &()), Ok(Layout::new(2, 2)));
    assert_eq!(sizeof_type(&scalar(ScalarName::WChar), &()), Ok(Layout::new(4, 4)));
    assert_eq!(sizeof_type(&scalar(ScalarName::Float), &()), Ok(Layout::new(4, 4)));
    assert_eq!(sizeof_type(&scalar(ScalarName::ULong), &()), Ok(Layout::new(8, 8)));
    assert_eq!(sizeof_type(&scalar(ScalarName::Double), &()), Ok(Layout::new(8, 8)));
}

#[test]
fn pointers_and_functions_are_word_sized() {
    let p = TypeExpr::pointer(scalar(ScalarName::Int8));
    assert_eq!(sizeof_type(&p, &()), Ok(Layout::POINTER));
    let f = TypeExpr::CFunction {
        ret: Box::new(TypeExpr::Void),
        params: vec![],
    };
    assert_eq!(sizeof_type(&f, &()), Ok(Layout::POINTER));
}

#[test]
fn array_multiplies_element_size() {
    let a = TypeExpr::array(scalar(ScalarName::Int32), 3);
    assert_eq!(sizeof_type(&a, &()), Ok(Layout::new(12, 4)));
    let aa = TypeExpr::array(TypeExpr::array(scalar(ScalarName::Int16), 3), 2);
    assert_eq!(sizeof_type(&aa, &()), Ok(Layout::new(12, 2)));
}

#[test]
fn record_pads_fields_and_total() {
    let interner = StringInterner::new();
    let rec = TypeExpr::Record(vec![
        field(&interner, "a", scalar(ScalarName::Int8)),
        field(&interner, "b", scalar(ScalarName::Int32)),
        field(&interner, "c", scalar(ScalarName::Int8)),
    ]);
    assert_eq!(sizeof_type(&rec, &()), Ok(Layout::new(12, 4)));
    assert_eq!(field_offset(&rec, interner.intern("a"), &()), Ok(Some(0)));
    assert_eq!(field_offset(&rec, interner.intern("b"), &()), Ok(Some(4)));
    assert_eq!(field_offset(&rec, interner.intern("c"), &()), Ok(Some(8)));
    assert_eq!(field_offset(&rec, interner.intern("d"), &()), Ok(None));
}

#[test]
fn variant_takes_widest_field() {
    let interner = StringInterner::new();
    let v = TypeExpr::Variant(vec![
        field(&interner, "bytes", TypeExpr::array(scalar(ScalarName::UInt8), 5)),
        field(&interner, "half", scalar(ScalarName::Int16)),
    ]);
    assert_eq!(sizeof_type(&v, &()), Ok(Layout::new(6, 2)));
    assert_eq!(field_offset(&v, interner.intern("half"), &()), Ok(Some(0)));
}

#[test]
fn enum_is_four_bytes_regardless_of_members() {
    let interner = StringInterner::new();
    let names = (0..300).map(|i| interner.intern(&format!("e{i}"))).collect();
    assert_eq!(sizeof_type(&TypeExpr::Enum(names), &()), Ok(Layout::ENUM));
    assert_eq!(sizeof_type(&TypeExpr::Enum(vec![]), &()), Ok(Layout::ENUM));
}

#[test]
fn incomplete_array_has_no_size() {
    let a = TypeExpr::array_of(scalar(ScalarName::Int8));
    assert_eq!(sizeof_type(&a, &()), Err(LayoutError::IncompleteType));
}

#[test]
fn nested_incomplete_array_is_an_error() {
    let interner = StringInterner::new();
    let inner = TypeExpr::array_of(scalar(ScalarName::Int8));
    let outer = TypeExpr::array(inner.clone(), 4);
    assert_eq!(
        sizeof_type(&outer, &()),
        Err(LayoutError::NestedIncompleteArray("array".to_owned()))
    );
    let rec = TypeExpr::Record(vec![field(&interner, "tail", inner)]);
    assert_eq!(
        sizeof_type(&rec, &()),
        Err(LayoutError::NestedIncompleteArray("record".to_owned()))
    );
}

#[test]
fn void_and_unknown_names_are_invalid() {
    let interner = StringInterner::new();
    assert!(matches!(
        sizeof_type(&TypeExpr::Void, &()),
        Err(LayoutError::UnknownType(_))
    ));
    let named = TypeExpr::Named(interner.intern("port"));
    assert!(matches!(
        sizeof_type(&named, &()),
        Err(LayoutError::UnknownType(_))
    ));
}

#[test]
fn array_size_overflow_is_reported() {
    let a = TypeExpr::array(scalar(ScalarName::Double), u64::MAX / 2);
    assert_eq!(sizeof_type(&a, &()), Err(LayoutError::TooLarge));
}

#[test]
fn align_up_rounds_to_power_of_two() {
    assert_eq!(align_up(0, 8), 0);
    assert_eq!(align_up(1, 8), 8);
    assert_eq!(align_up(9, 4), 12);
    assert_eq!(align_up(7, 1), 7);
}

fn scalar_names() -> impl Strategy<Value = ScalarName> {
    prop::sample::select(ScalarName::ALL.to_vec())
}

proptest! {
    #[test]
    fn record_size_is_multiple_of_alignment(
        names in prop::collection::vec(scalar_names(), 0..12),
        lens in prop::collection::vec(0u64..4, 12),
    ) {
        let interner = StringInterner::new();
        let fields: Vec<Field> = names
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let ty = if lens[i] == 0 {
                    scalar(*s)
                } else {
                    TypeExpr::array(scalar(*s), lens[i])
                };
                field(&interner, &format!("f{i}"), ty)
            })
            .collect();
        let rec = TypeExpr::Record(fields.clone());
        let layout = sizeof_type(&rec, &()).unwrap();
        prop_assert_eq!(layout.size % layout.align, 0);

        // Structurally equal expressions lay out identically.
        let again = sizeof_type(&TypeExpr::Record(fields.clone()), &()).unwrap();
        prop_assert_eq!(layout, again);

        // Every field is aligned and inside the record.
        let (_, offsets) = record_layout(&fields, &()).unwrap();
        for (f, off) in fields.iter().zip(offsets) {
            let fl = sizeof_type(&f.ty, &()).unwrap();
            prop_assert_eq!(off % fl.align, 0);
            prop_assert!(off + fl.size <= layout.size);
        }
    }
}
