//! Native size and alignment of type expressions.
//!
//! Pure functions over [`TypeExpr`]; the only outside state consulted is the
//! size of host-defined opaque types, through [`OpaqueSizes`].

use cinder_ir::{ensure_sufficient_stack, Field, Name, ScalarName, TypeExpr};

use crate::numeric::NumKind;
use crate::LayoutError;

/// Width of pointers and code addresses.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Size and alignment of a native type, in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    pub size: usize,
    pub align: usize,
}

impl Layout {
    pub const POINTER: Layout = Layout::new(POINTER_SIZE, POINTER_SIZE);
    /// Named enumerations are stored as a native `int32`.
    pub const ENUM: Layout = Layout::new(4, 4);

    pub const fn new(size: usize, align: usize) -> Self {
        Layout { size, align }
    }

    pub const fn scalar(name: ScalarName) -> Self {
        let size = NumKind::from_scalar(name).size();
        Layout::new(size, size)
    }
}

/// Source of layouts for [`TypeExpr::Named`] opaque types.
pub trait OpaqueSizes {
    fn opaque_layout(&self, name: Name) -> Result<Layout, LayoutError>;
}

/// No opaque types are known.
impl OpaqueSizes for () {
    fn opaque_layout(&self, name: Name) -> Result<Layout, LayoutError> {
        Err(LayoutError::UnknownType(format!("{name:?}")))
    }
}

/// Round `offset` up to a multiple of `align` (a power of two, or 1).
#[inline]
pub const fn align_up(offset: usize, align: usize) -> usize {
    let mask = align - 1;
    (offset + mask) & !mask
}

/// Size and alignment of `expr`.
///
/// An array with no length has no size; asking for one is
/// [`LayoutError::IncompleteType`] at the top level and
/// [`LayoutError::NestedIncompleteArray`] anywhere inside another type.
pub fn sizeof_type(expr: &TypeExpr, opaque: &dyn OpaqueSizes) -> Result<Layout, LayoutError> {
    layout_of(expr, opaque, None)
}

/// Layout of `expr` as a component of `outer` (array element, field).
pub(crate) fn nested_layout(
    expr: &TypeExpr,
    outer: &str,
    opaque: &dyn OpaqueSizes,
) -> Result<Layout, LayoutError> {
    layout_of(expr, opaque, Some(outer))
}

fn layout_of(
    expr: &TypeExpr,
    opaque: &dyn OpaqueSizes,
    outer: Option<&str>,
) -> Result<Layout, LayoutError> {
    ensure_sufficient_stack(|| match expr {
        TypeExpr::Scalar(s) => Ok(Layout::scalar(*s)),
        TypeExpr::Void => Err(LayoutError::UnknownType("void".to_owned())),
        TypeExpr::Pointer(_) | TypeExpr::CFunction { .. } => Ok(Layout::POINTER),
        TypeExpr::Enum(_) => Ok(Layout::ENUM),
        TypeExpr::Named(name) => opaque.opaque_layout(*name),
        TypeExpr::Array { len: None, .. } => Err(match outer {
            Some(outer) => LayoutError::NestedIncompleteArray(outer.to_owned()),
            None => LayoutError::IncompleteType,
        }),
        TypeExpr::Array { elem, len: Some(n) } => {
            let elem = layout_of(elem, opaque, Some("array"))?;
            let n = usize::try_from(*n).map_err(|_| LayoutError::TooLarge)?;
            let size = elem.size.checked_mul(n).ok_or(LayoutError::TooLarge)?;
            Ok(Layout::new(size, elem.align))
        }
        TypeExpr::Record(fields) => record_layout(fields, opaque).map(|(l, _)| l),
        TypeExpr::Variant(fields) => variant_layout(fields, opaque),
    })
}

/// Layout of a record and the offset of each field, in declaration order.
pub fn record_layout(
    fields: &[Field],
    opaque: &dyn OpaqueSizes,
) -> Result<(Layout, Vec<usize>), LayoutError> {
    let mut offsets = Vec::with_capacity(fields.len());
    let mut offset = 0usize;
    let mut max_align = 1;
    for field in fields {
        let fl = layout_of(&field.ty, opaque, Some("record"))?;
        offset = align_up(offset, fl.align);
        offsets.push(offset);
        offset = offset.checked_add(fl.size).ok_or(LayoutError::TooLarge)?;
        max_align = max_align.max(fl.align);
    }
    Ok((Layout::new(align_up(offset, max_align), max_align), offsets))
}

fn variant_layout(fields: &[Field], opaque: &dyn OpaqueSizes) -> Result<Layout, LayoutError> {
    let mut size = 0;
    let mut max_align = 1;
    for field in fields {
        let fl = layout_of(&field.ty, opaque, Some("variant"))?;
        size = size.max(fl.size);
        max_align = max_align.max(fl.align);
    }
    Ok(Layout::new(align_up(size, max_align), max_align))
}

/// Byte offset of `field` within a record or variant expression.
///
/// `Ok(None)` if `expr` is not an aggregate or has no such field.
pub fn field_offset(
    expr: &TypeExpr,
    field: Name,
    opaque: &dyn OpaqueSizes,
) -> Result<Option<usize>, LayoutError> {
    match expr {
        TypeExpr::Record(fields) => {
            let mut offset = 0usize;
            for f in fields {
                let fl = layout_of(&f.ty, opaque, Some("record"))?;
                offset = align_up(offset, fl.align);
                if f.name == field {
                    return Ok(Some(offset));
                }
                offset = offset.checked_add(fl.size).ok_or(LayoutError::TooLarge)?;
            }
            Ok(None)
        }
        TypeExpr::Variant(fields) => Ok(fields.iter().any(|f| f.name == field).then_some(0)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests;
