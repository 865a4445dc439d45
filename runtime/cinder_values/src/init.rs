//! Populating payload bytes from source values, per [`InitKind`].

use cinder_ir::Name;
use cinder_types::{ensure_sufficient_stack, InitKind, NumKind, Number, TypeId, POINTER_SIZE};

use crate::heap::Object;
use crate::{argument_error, type_error, Engine, EngineResult, Value};

impl Engine {
    /// Write `src` converted to `ty` into `dest`, which holds exactly one
    /// value of `ty`.
    pub(crate) fn init_bytes(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        ensure_sufficient_stack(|| self.init_dispatch(ty, src, dest))
    }

    fn init_dispatch(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        let desc = self.types.desc(ty);
        match desc.init() {
            InitKind::Numeric(kind) => {
                let n = self.number_of("c-value", src, 1)?.cast(kind);
                n.write_to(dest);
                Ok(())
            }
            InitKind::Array => self.init_array(ty, src, dest),
            InitKind::Record => self.init_record(ty, src, dest),
            InitKind::Variant => self.init_variant(ty, src, dest),
            InitKind::Enum => self.init_enum(ty, src, dest),
            InitKind::Pointer => {
                let n = self.number_of("c-value", src, 1)?;
                if !n.is_integer() {
                    return Err(type_error("c-value", "integer address", 1, self.type_name(src)));
                }
                let bytes = n.to_u64().to_ne_bytes();
                dest[..POINTER_SIZE].copy_from_slice(&bytes[..POINTER_SIZE]);
                Ok(())
            }
            InitKind::Host => match desc.host() {
                Some(host) => host.init(self, src, dest),
                None => Err(type_error("c-value", "plain-old-data type", 1, self.type_name(src))),
            },
            InitKind::None => {
                if self.same_type_bytes(ty, src, dest)? {
                    return Ok(());
                }
                Err(type_error("c-value", "plain-old-data type", 1, self.type_name(src)))
            }
        }
    }

    /// Byte-copy `src` if it is a native value of exactly `ty`.
    fn same_type_bytes(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<bool> {
        match self.object(src)? {
            Some(Object::Native(nb)) if nb.ty == ty && nb.len == dest.len() => {
                dest.copy_from_slice(self.payload(src)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn init_array(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        let desc = self.types.desc(ty);
        let (Some(elem), stride) = (desc.elem(), desc.elem_size()) else {
            return Err(argument_error("array: invalid element type"));
        };
        let count = dest.len() / stride;

        if let Some(items) = self.sequence_items(src)? {
            return self.init_array_items(ty, &items, dest);
        }
        if let Some(Object::Native(nb)) = self.object(src)? {
            let src_desc = self.types.desc(nb.ty);
            if src_desc.elem().is_some() {
                if src_desc.elem() != Some(elem) {
                    return Err(argument_error("array: element type mismatch"));
                }
                let bytes = self.payload(src)?;
                if bytes.len() != dest.len() {
                    return Err(argument_error("array: size mismatch"));
                }
                dest.copy_from_slice(bytes);
                return Ok(());
            }
        }
        if count == 1 {
            return self.init_bytes(elem, src, dest);
        }
        Err(type_error("array", "sequence", 1, self.type_name(src)))
    }

    /// Fill an array payload element by element.
    pub(crate) fn init_array_items(&self, ty: TypeId, items: &[Value], dest: &mut [u8]) -> EngineResult<()> {
        let desc = self.types.desc(ty);
        let (Some(elem), stride) = (desc.elem(), desc.elem_size()) else {
            return Err(argument_error("array: invalid element type"));
        };
        if items.len() * stride != dest.len() {
            return Err(argument_error("array: size mismatch"));
        }
        for (&item, chunk) in items.iter().zip(dest.chunks_exact_mut(stride)) {
            self.init_bytes(elem, item, chunk)?;
        }
        Ok(())
    }

    fn init_record(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        if self.same_type_bytes(ty, src, dest)? {
            return Ok(());
        }
        let Some(items) = self.sequence_items(src)? else {
            return Err(type_error("record", "sequence", 1, self.type_name(src)));
        };
        let desc = self.types.desc(ty);
        let fields = desc.fields();

        if let Some(pairs) = self.keyed_items(ty, &items)? {
            for (name, value) in pairs {
                let Some(field) = desc.field(name) else { continue };
                let size = self.types.desc(field.ty).size();
                self.init_bytes(field.ty, value, &mut dest[field.offset..field.offset + size])?;
            }
            return Ok(());
        }

        if items.len() != fields.len() {
            return Err(argument_error("record: field count mismatch"));
        }
        for (field, &value) in fields.iter().zip(items.iter()) {
            let size = self.types.desc(field.ty).size();
            self.init_bytes(field.ty, value, &mut dest[field.offset..field.offset + size])?;
        }
        Ok(())
    }

    /// `((name value) ...)` association, if every item names a field of `ty`.
    fn keyed_items(&self, ty: TypeId, items: &[Value]) -> EngineResult<Option<Vec<(Name, Value)>>> {
        if items.is_empty() {
            return Ok(None);
        }
        let desc = self.types.desc(ty);
        let mut pairs = Vec::with_capacity(items.len());
        for &item in items {
            match self.name_value_pair(item)? {
                Some(pair) if desc.field(pair.0).is_some() => pairs.push(pair),
                _ => return Ok(None),
            }
        }
        Ok(Some(pairs))
    }

    /// A two-element list whose head is a symbol.
    fn name_value_pair(&self, v: Value) -> EngineResult<Option<(Name, Value)>> {
        let Some(Object::Pair(head, _)) = self.object(v)? else {
            return Ok(None);
        };
        let Some(name) = head.as_symbol() else {
            return Ok(None);
        };
        match self.sequence_items(v) {
            Ok(Some(items)) if items.len() == 2 => Ok(Some((name, items[1]))),
            _ => Ok(None),
        }
    }

    fn init_variant(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        if self.same_type_bytes(ty, src, dest)? {
            return Ok(());
        }
        let Some((name, value)) = self.name_value_pair(src)? else {
            return Err(type_error("variant", "(name value) pair", 1, self.type_name(src)));
        };
        let desc = self.types.desc(ty);
        let Some(field) = desc.field(name) else {
            return Err(argument_error(format!(
                "variant: no member named {}",
                self.interner.lookup(name)
            )));
        };
        let size = self.types.desc(field.ty).size();
        dest.fill(0);
        self.init_bytes(field.ty, value, &mut dest[..size])
    }

    fn init_enum(&self, ty: TypeId, src: Value, dest: &mut [u8]) -> EngineResult<()> {
        let members = self.types.desc(ty).enum_members();
        let index = match src {
            Value::Symbol(name) => members
                .iter()
                .position(|&m| m == name)
                .ok_or_else(|| argument_error("enum: invalid enum value"))?,
            _ => {
                let n = self.number_of("enum", src, 1)?;
                let Some(i) = n.to_i128() else {
                    return Err(type_error("enum", "integer", 1, self.type_name(src)));
                };
                usize::try_from(i)
                    .ok()
                    .filter(|&i| i < members.len())
                    .ok_or_else(|| argument_error("enum: value out of range"))?
            }
        };
        Number::wrap(NumKind::Int32, index as i128).write_to(dest);
        Ok(())
    }
}
