//! Reading and writing native values, and the value-level builtins.

use std::cmp::Ordering;

use cinder_ir::{Name, TypeExpr};
use cinder_types::{sizeof_type, NumKind, Number, TypeId};

use crate::heap::{Object, StorageKind};
use crate::{argument_error, bounds_error, type_error, Engine, EngineResult, Value};

/// Classification returned by [`Engine::type_of`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeOf {
    Null,
    Boolean,
    Fixnum,
    Symbol,
    Pair,
    Vector,
    /// A scalar or native box of the given type.
    Native(TypeId),
}

impl Engine {
    /// Payload bytes of a scalar or native value.
    pub fn payload(&self, v: Value) -> EngineResult<&[u8]> {
        match v {
            Value::Object(r) => self.heap.payload(r),
            _ => Err(type_error("c-value", "native value", 1, self.type_name(v))),
        }
    }

    /// Mutable payload; scalar boxes are immutable.
    pub fn payload_mut(&mut self, v: Value) -> EngineResult<&mut [u8]> {
        match v {
            Value::Object(r) => self.heap.payload_mut(r),
            _ => Err(type_error("c-value", "native value", 1, self.type_name(v))),
        }
    }

    /// Descriptor id of a scalar or native value.
    pub fn value_type(&self, v: Value) -> Option<TypeId> {
        match self.object(v).ok()?? {
            Object::Scalar(s) => Some(s.ty),
            Object::Native(nb) => Some(nb.ty),
            _ => None,
        }
    }

    pub fn storage_kind(&self, v: Value) -> EngineResult<StorageKind> {
        match self.object(v)? {
            Some(Object::Scalar(_)) => Ok(StorageKind::Scalar),
            Some(Object::Native(nb)) => Ok(nb.storage.kind()),
            _ => Err(type_error("c-value", "native value", 1, self.type_name(v))),
        }
    }

    /// Array type, element stride and element count of `a`.
    fn array_parts(&self, op: &'static str, a: Value) -> EngineResult<(TypeId, usize, usize)> {
        if let Some(Object::Native(nb)) = self.object(a)? {
            let desc = self.types.desc(nb.ty);
            if let Some(elem) = desc.elem() {
                let stride = desc.elem_size();
                return Ok((elem, stride, nb.len.checked_div(stride).unwrap_or(0)));
            }
        }
        Err(type_error(op, "array", 1, self.type_name(a)))
    }

    pub fn array_len(&self, a: Value) -> EngineResult<usize> {
        self.array_parts("length", a).map(|(_, _, len)| len)
    }

    fn check_index(&self, op: &'static str, i: Value, len: usize) -> EngineResult<usize> {
        let index = match self.number_of(op, i, 2)?.to_i128() {
            Some(index) => index,
            None => return Err(type_error(op, "integer", 2, self.type_name(i))),
        };
        usize::try_from(index)
            .ok()
            .filter(|&ix| ix < len)
            .ok_or_else(|| bounds_error(op, index, len))
    }

    /// Element `i` of a native array.
    pub fn aref(&mut self, a: Value, i: Value) -> EngineResult<Value> {
        let (elem, stride, len) = self.array_parts("aref", a)?;
        let index = self.check_index("aref", i, len)?;
        let start = index * stride;
        let bytes = self.payload(a)?[start..start + stride].to_vec();
        self.with_roots(&[a], |e| e.read_element(elem, &bytes))
    }

    /// Store `x` at element `i`, converted by the element initializer.
    pub fn aset(&mut self, a: Value, i: Value, x: Value) -> EngineResult<()> {
        let (elem, stride, len) = self.array_parts("aset!", a)?;
        let index = self.check_index("aset!", i, len)?;
        let mut scratch = vec![0u8; stride];
        self.init_bytes(elem, x, &mut scratch)?;
        let start = index * stride;
        self.payload_mut(a)?[start..start + stride].copy_from_slice(&scratch);
        Ok(())
    }

    /// Read a record or variant member.
    pub fn field(&mut self, v: Value, name: Name) -> EngineResult<Value> {
        let (ty, offset, size) = self.field_parts(v, name)?;
        let bytes = self.payload(v)?[offset..offset + size].to_vec();
        self.with_roots(&[v], |e| e.read_element(ty, &bytes))
    }

    pub fn set_field(&mut self, v: Value, name: Name, x: Value) -> EngineResult<()> {
        let (ty, offset, size) = self.field_parts(v, name)?;
        let mut scratch = vec![0u8; size];
        self.init_bytes(ty, x, &mut scratch)?;
        self.payload_mut(v)?[offset..offset + size].copy_from_slice(&scratch);
        Ok(())
    }

    fn field_parts(&self, v: Value, name: Name) -> EngineResult<(TypeId, usize, usize)> {
        let Some(ty) = self.value_type(v) else {
            return Err(type_error("field", "record", 1, self.type_name(v)));
        };
        let desc = self.types.desc(ty);
        let Some(field) = desc.field(name) else {
            return Err(argument_error(format!(
                "field: no member named {}",
                self.interner.lookup(name)
            )));
        };
        let size = self.types.desc(field.ty).size();
        let len = self.payload(v)?.len();
        let end = field.offset + size;
        if end > len {
            return Err(bounds_error("field", end as i128, len));
        }
        Ok((field.ty, field.offset, size))
    }

    /// Box `bytes` as a value of `ty`.
    ///
    /// Integers narrower than 32 bits come back as fixnums; other numbers
    /// as scalar boxes; aggregates as fresh copies.
    pub(crate) fn read_element(&mut self, ty: TypeId, bytes: &[u8]) -> EngineResult<Value> {
        if let Some(kind) = self.types.desc(ty).num_kind() {
            let n = Number::from_bytes(kind, bytes).unwrap_or(Number::zero(kind));
            if kind < NumKind::Int32 {
                return Ok(Value::Fixnum(n.to_i64()));
            }
            return Ok(self.alloc_scalar(ty, n));
        }
        let v = self.make_value(ty, bytes.len())?;
        self.payload_mut(v)?.copy_from_slice(bytes);
        Ok(v)
    }

    /// Payload size of a value in bytes.
    pub fn sizeof_value(&self, v: Value) -> EngineResult<usize> {
        self.payload(v).map(<[u8]>::len)
    }

    /// Size of a type expression. Incomplete types are an error.
    pub fn sizeof_expr(&self, expr: &TypeExpr) -> EngineResult<usize> {
        Ok(sizeof_type(expr, &self.types)?.size)
    }

    pub fn type_of(&self, v: Value) -> EngineResult<TypeOf> {
        Ok(match v {
            Value::Nil => TypeOf::Null,
            Value::Bool(_) => TypeOf::Boolean,
            Value::Fixnum(_) => TypeOf::Fixnum,
            Value::Symbol(_) => TypeOf::Symbol,
            Value::Object(r) => match self.heap.get(r)? {
                Object::Pair(..) => TypeOf::Pair,
                Object::Vector(_) => TypeOf::Vector,
                Object::Scalar(s) => TypeOf::Native(s.ty),
                Object::Native(nb) => TypeOf::Native(nb.ty),
            },
        })
    }

    /// Whether `v` is a scalar, or a native value whose type has an
    /// initializer.
    pub fn is_plain_old_data(&self, v: Value) -> bool {
        match self.object(v) {
            Ok(Some(Object::Scalar(_))) => true,
            Ok(Some(Object::Native(nb))) => self.types.desc(nb.ty).is_plain_data(),
            _ => false,
        }
    }

    /// Copy a plain-old-data value. Immediates come back unchanged.
    pub fn copy(&mut self, v: Value) -> EngineResult<Value> {
        match self.object(v)? {
            None => Ok(v),
            Some(Object::Pair(..) | Object::Vector(_)) => {
                Err(argument_error("copy: argument must be a leaf atom"))
            }
            Some(_) if !self.is_plain_old_data(v) => {
                Err(argument_error("copy: argument must be a plain-old-data type"))
            }
            Some(_) => self.clone_value(v),
        }
    }

    /// Lexicographic comparison of two payloads; a proper prefix orders
    /// first.
    pub fn compare_bytes(&self, a: Value, b: Value) -> EngineResult<Ordering> {
        Ok(self.payload(a)?.cmp(self.payload(b)?))
    }
}

#[cfg(test)]
mod tests;
