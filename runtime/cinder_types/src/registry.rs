//! Type descriptor registry.
//!
//! Interns type expressions into [`TypeDesc`]s addressed by [`TypeId`].
//! Scalars live at fixed indices; compound expressions are memoized in a
//! structural map, so equal expressions always resolve to the same id.

use std::rc::Rc;

use cinder_ir::{ensure_sufficient_stack, Name, ScalarName, SharedInterner, TypeExpr};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::descriptor::{FieldLayout, InitKind, TypeDesc};
use crate::layout::{self, Layout, OpaqueSizes, POINTER_SIZE};
use crate::{DescFlags, LayoutError, NumKind, TypeId};

/// Process-lifetime table of native type descriptors.
pub struct TypeRegistry<H: ?Sized> {
    descs: Vec<TypeDesc<H>>,
    by_key: FxHashMap<TypeExpr, TypeId>,
    opaque: FxHashMap<Name, TypeId>,
    interner: SharedInterner,
}

impl<H: ?Sized> TypeRegistry<H> {
    /// Create a registry with every scalar type and `(array byte)` in place.
    pub fn new(interner: SharedInterner) -> Self {
        let mut descs = Vec::with_capacity(64);
        for name in ScalarName::ALL {
            let kind = NumKind::from_scalar(name);
            let mut desc = TypeDesc::new(
                TypeExpr::Scalar(name),
                Layout::scalar(name),
                InitKind::Numeric(kind),
                DescFlags::NUMERIC | DescFlags::PLAIN_DATA,
            );
            desc.kind = Some(kind);
            descs.push(desc);
        }

        let text_key = TypeExpr::array_of(TypeExpr::Scalar(ScalarName::Byte));
        let mut text = TypeDesc::new(
            text_key.clone(),
            Layout::new(0, 1),
            InitKind::Array,
            DescFlags::ARRAY | DescFlags::PLAIN_DATA | DescFlags::TEXT | DescFlags::INCOMPLETE,
        );
        text.elem = Some(TypeId::BYTE);
        text.elem_size = 1;
        descs.push(text);
        descs[TypeId::BYTE.index()].array_of = Some(TypeId::TEXT);

        let mut by_key = FxHashMap::default();
        by_key.insert(text_key, TypeId::TEXT);

        TypeRegistry {
            descs,
            by_key,
            opaque: FxHashMap::default(),
            interner,
        }
    }

    #[inline]
    pub fn desc(&self, id: TypeId) -> &TypeDesc<H> {
        &self.descs[id.index()]
    }

    /// The expression `id` was registered under.
    #[inline]
    pub fn expr(&self, id: TypeId) -> &TypeExpr {
        &self.descs[id.index()].key
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Resolve `expr` to its descriptor, registering it on first use.
    ///
    /// An array without a length is accepted only as `expr` itself; the
    /// resulting descriptor has size 0 and the `INCOMPLETE` flag.
    pub fn get_type(&mut self, expr: &TypeExpr) -> Result<TypeId, LayoutError> {
        self.resolve(expr, None)
    }

    /// Descriptor for `(array elem)`, cached on the element descriptor.
    pub fn get_array_type(&mut self, elem: TypeId) -> Result<TypeId, LayoutError> {
        let desc = &self.descs[elem.index()];
        if let Some(id) = desc.array_of {
            return Ok(id);
        }
        let key = TypeExpr::array_of(desc.key.clone());
        let id = self.get_type(&key)?;
        self.descs[elem.index()].array_of = Some(id);
        Ok(id)
    }

    /// Register a host-implemented opaque type under `name`.
    ///
    /// `plain_data` marks types whose host supplies an initializer; their
    /// values may be copied byte-wise.
    pub fn define_opaque_type(
        &mut self,
        name: Name,
        size: usize,
        host: Rc<H>,
        plain_data: bool,
    ) -> Result<TypeId, LayoutError> {
        let text = self.interner.lookup(name);
        if self.opaque.contains_key(&name) || text == "void" || ScalarName::from_name(text).is_some()
        {
            return Err(LayoutError::Duplicate(text.to_owned()));
        }

        let align = if size == 0 {
            1
        } else {
            size.next_power_of_two().min(POINTER_SIZE)
        };
        let (init, flags) = if plain_data {
            (InitKind::Host, DescFlags::OPAQUE | DescFlags::PLAIN_DATA)
        } else {
            (InitKind::None, DescFlags::OPAQUE)
        };
        let key = TypeExpr::Named(name);
        let mut desc = TypeDesc::new(key.clone(), Layout::new(size, align), init, flags);
        desc.host = Some(host);

        let id = self.push(desc)?;
        self.opaque.insert(name, id);
        self.by_key.insert(key, id);
        debug!(name = text, id = id.raw(), size, "defined opaque type");
        Ok(id)
    }

    /// Byte offset of a named field of a record or variant type.
    pub fn field_offset(&self, id: TypeId, field: Name) -> Option<usize> {
        self.desc(id).field(field).map(|f| f.offset)
    }

    fn resolve(&mut self, expr: &TypeExpr, outer: Option<&'static str>) -> Result<TypeId, LayoutError> {
        match expr {
            TypeExpr::Scalar(s) => return Ok(TypeId::scalar(*s)),
            TypeExpr::Named(n) => return self.resolve_named(*n),
            TypeExpr::Array { len: None, .. } => {
                if let Some(outer) = outer {
                    return Err(LayoutError::NestedIncompleteArray(outer.to_owned()));
                }
            }
            _ => {}
        }
        if let Some(&id) = self.by_key.get(expr) {
            return Ok(id);
        }
        ensure_sufficient_stack(|| self.register(expr))
    }

    fn resolve_named(&self, name: Name) -> Result<TypeId, LayoutError> {
        self.opaque
            .get(&name)
            .copied()
            .ok_or_else(|| LayoutError::UnknownType(self.interner.lookup(name).to_owned()))
    }

    fn register(&mut self, expr: &TypeExpr) -> Result<TypeId, LayoutError> {
        let desc = match expr {
            TypeExpr::Array { elem, len } => {
                let elem_id = self.resolve(elem, Some("array"))?;
                let elem_desc = self.desc(elem_id);
                let stride = elem_desc.size();
                if stride == 0 {
                    return Err(LayoutError::InvalidElementType);
                }
                let size = match len {
                    Some(n) => usize::try_from(*n)
                        .ok()
                        .and_then(|n| n.checked_mul(stride))
                        .ok_or(LayoutError::TooLarge)?,
                    None => 0,
                };
                let mut flags = DescFlags::ARRAY;
                if elem_desc.is_plain_data() {
                    flags |= DescFlags::PLAIN_DATA;
                }
                if len.is_none() {
                    flags |= DescFlags::INCOMPLETE;
                }
                if elem_id == TypeId::BYTE {
                    flags |= DescFlags::TEXT;
                }
                let layout = Layout::new(size, elem_desc.align());
                let mut desc = TypeDesc::new(expr.clone(), layout, InitKind::Array, flags);
                desc.elem = Some(elem_id);
                desc.elem_size = stride;
                desc
            }
            TypeExpr::Record(fields) | TypeExpr::Variant(fields) => {
                let is_record = matches!(expr, TypeExpr::Record(_));
                let (layout, offsets) = if is_record {
                    layout::record_layout(fields, &*self)?
                } else {
                    (layout::sizeof_type(expr, &*self)?, vec![0; fields.len()])
                };
                let outer = if is_record { "record" } else { "variant" };
                let mut resolved = Vec::with_capacity(fields.len());
                let mut plain = true;
                for (field, offset) in fields.iter().zip(offsets) {
                    let ty = self.resolve(&field.ty, Some(outer))?;
                    plain &= self.desc(ty).is_plain_data();
                    resolved.push(FieldLayout {
                        name: field.name,
                        offset,
                        ty,
                    });
                }
                let (init, mut flags) = if is_record {
                    (InitKind::Record, DescFlags::RECORD)
                } else {
                    (InitKind::Variant, DescFlags::VARIANT)
                };
                if plain {
                    flags |= DescFlags::PLAIN_DATA;
                }
                let mut desc = TypeDesc::new(expr.clone(), layout, init, flags);
                desc.fields = resolved.into_boxed_slice();
                desc
            }
            TypeExpr::Enum(names) => {
                let mut desc = TypeDesc::new(
                    expr.clone(),
                    Layout::ENUM,
                    InitKind::Enum,
                    DescFlags::ENUM | DescFlags::PLAIN_DATA,
                );
                desc.members = names.clone().into_boxed_slice();
                desc
            }
            TypeExpr::Pointer(_) | TypeExpr::CFunction { .. } => TypeDesc::new(
                expr.clone(),
                Layout::POINTER,
                InitKind::Pointer,
                DescFlags::POINTER | DescFlags::PLAIN_DATA,
            ),
            TypeExpr::Void => return Err(LayoutError::UnknownType("void".to_owned())),
            TypeExpr::Scalar(s) => return Ok(TypeId::scalar(*s)),
            TypeExpr::Named(n) => return self.resolve_named(*n),
        };

        let size = desc.size();
        let id = self.push(desc)?;
        self.by_key.insert(expr.clone(), id);
        debug!(
            ty = %expr.display(&self.interner),
            id = id.raw(),
            size,
            "registered type descriptor"
        );
        Ok(id)
    }

    fn push(&mut self, desc: TypeDesc<H>) -> Result<TypeId, LayoutError> {
        let raw = u32::try_from(self.descs.len()).map_err(|_| LayoutError::TooLarge)?;
        self.descs.push(desc);
        Ok(TypeId::from_raw(raw))
    }
}

impl<H: ?Sized> OpaqueSizes for TypeRegistry<H> {
    fn opaque_layout(&self, name: Name) -> Result<Layout, LayoutError> {
        self.resolve_named(name).map(|id| self.desc(id).layout())
    }
}
