//! Type descriptors.

use std::fmt;
use std::rc::Rc;

use cinder_ir::{Name, TypeExpr};

use crate::{DescFlags, Layout, NumKind, TypeId};

/// How values of a type are populated from a source value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitKind {
    /// Not constructible from a source; values are opaque bytes.
    None,
    Numeric(NumKind),
    Array,
    Record,
    Variant,
    Enum,
    /// Pointers and code addresses, from an integer address.
    Pointer,
    /// Delegated to the host type's own initializer.
    Host,
}

/// A named member of a record or variant, resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: Name,
    pub offset: usize,
    pub ty: TypeId,
}

/// Registry entry describing one native type.
///
/// `H` is the host vtable type carried by opaque descriptors. Everything but
/// the cached array-of descriptor is fixed at registration.
pub struct TypeDesc<H: ?Sized> {
    pub(crate) key: TypeExpr,
    pub(crate) kind: Option<NumKind>,
    pub(crate) layout: Layout,
    pub(crate) elem: Option<TypeId>,
    pub(crate) elem_size: usize,
    pub(crate) array_of: Option<TypeId>,
    pub(crate) init: InitKind,
    pub(crate) fields: Box<[FieldLayout]>,
    pub(crate) members: Box<[Name]>,
    pub(crate) host: Option<Rc<H>>,
    pub(crate) flags: DescFlags,
}

impl<H: ?Sized> TypeDesc<H> {
    pub(crate) fn new(key: TypeExpr, layout: Layout, init: InitKind, flags: DescFlags) -> Self {
        TypeDesc {
            key,
            kind: None,
            layout,
            elem: None,
            elem_size: 0,
            array_of: None,
            init,
            fields: Box::default(),
            members: Box::default(),
            host: None,
            flags,
        }
    }

    /// The expression this descriptor was registered under.
    #[inline]
    pub fn key(&self) -> &TypeExpr {
        &self.key
    }

    #[inline]
    pub fn num_kind(&self) -> Option<NumKind> {
        self.kind
    }

    /// Byte size; 0 for incomplete arrays.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Element descriptor of an array type.
    #[inline]
    pub fn elem(&self) -> Option<TypeId> {
        self.elem
    }

    /// Element stride of an array type.
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Declared element count of a complete array.
    pub fn array_len(&self) -> Option<usize> {
        match self.key {
            TypeExpr::Array { len: Some(_), .. } if self.elem_size > 0 => {
                Some(self.layout.size / self.elem_size)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn init(&self) -> InitKind {
        self.init
    }

    /// Record or variant members with their offsets.
    #[inline]
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn field(&self, name: Name) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Enumeration members; a member's value is its position.
    #[inline]
    pub fn enum_members(&self) -> &[Name] {
        &self.members
    }

    #[inline]
    pub fn host(&self) -> Option<&Rc<H>> {
        self.host.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> DescFlags {
        self.flags
    }

    #[inline]
    pub fn is_plain_data(&self) -> bool {
        self.flags.contains(DescFlags::PLAIN_DATA)
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.flags.contains(DescFlags::TEXT)
    }

    #[inline]
    pub fn is_incomplete(&self) -> bool {
        self.flags.contains(DescFlags::INCOMPLETE)
    }
}

impl<H: ?Sized> fmt::Debug for TypeDesc<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDesc")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("layout", &self.layout)
            .field("elem", &self.elem)
            .field("init", &self.init)
            .field("flags", &self.flags)
            .field("host", &self.host.is_some())
            .finish_non_exhaustive()
    }
}
