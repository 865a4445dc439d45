//! Boxed value allocation and construction.
//!
//! Numeric types box into immutable [`ScalarBox`]es. Everything else gets a
//! native box whose storage depends on size: inline up to the configured
//! threshold, otherwise an owned foreign buffer that is autoreleased. Only
//! owned allocations add pressure, and only they can trigger a collection.

use cinder_ir::TypeExpr;
use cinder_types::{fits_fixnum, NumKind, Number, TypeId};
use tracing::{debug, trace};

use crate::heap::{ForeignBuf, InlineBytes, NativeBox, Object, ScalarBox, Storage};
use crate::{argument_error, bounds_error, memory_error, type_error, Engine, EngineResult, Value};

/// Memory a view refers to.
#[derive(Debug)]
pub enum ViewSource {
    /// A window into another native value, which the view keeps alive.
    Parent { parent: Value, offset: usize },
    /// Caller-managed memory. Never freed unless the view is adopted.
    External(ForeignBuf),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Placement {
    /// Inline when small enough.
    BySize,
    /// Always a fresh owned buffer.
    Owned,
}

impl Engine {
    /// Allocate a zeroed value of `ty` with a `size`-byte payload.
    ///
    /// `size` must be the type's size, or a whole number of elements for an
    /// incomplete array. Every empty byte array is the shared empty text.
    pub fn make_value(&mut self, ty: TypeId, size: usize) -> EngineResult<Value> {
        if let Some(kind) = self.types.desc(ty).num_kind() {
            return Ok(self.alloc_scalar(ty, Number::zero(kind)));
        }
        self.check_size(ty, size)?;
        if self.types.desc(ty).is_text() && size == 0 {
            return Ok(Value::Object(self.empty_text));
        }
        self.alloc_native(ty, size, Placement::BySize)
    }

    fn check_size(&self, ty: TypeId, size: usize) -> EngineResult<()> {
        let desc = self.types.desc(ty);
        let fits = if desc.is_incomplete() {
            match desc.elem_size() {
                0 => size == 0,
                stride => size % stride == 0,
            }
        } else {
            size == desc.size()
        };
        if fits {
            Ok(())
        } else {
            Err(argument_error(format!(
                "c-value: size {size} does not fit type {}",
                self.types.expr(ty).display(&self.interner)
            )))
        }
    }

    fn alloc_native(&mut self, ty: TypeId, len: usize, placement: Placement) -> EngineResult<Value> {
        let desc = self.types.desc(ty);
        // Text keeps a zero terminator past the end of the payload.
        let cap = if desc.is_text() {
            len.checked_add(1).ok_or_else(|| memory_error(len))?
        } else {
            len
        };
        let host_finalizer = desc.host().is_some_and(|h| h.has_finalizer());

        let storage = if placement == Placement::BySize && cap <= self.config.inline_threshold {
            Storage::Inline(InlineBytes::from_elem(0, cap))
        } else {
            self.note_foreign(cap);
            Storage::Owned(ForeignBuf::alloc_zeroed(cap)?)
        };
        let owned = matches!(storage, Storage::Owned(_));
        let r = self.heap.alloc(Object::Native(NativeBox { ty, len, storage }));
        if owned || host_finalizer {
            self.heap.finalizers.add(r);
        }
        Ok(Value::Object(r))
    }

    /// Account for `bytes` of foreign storage about to be allocated.
    ///
    /// Collects first if the pressure since the last collection is over the
    /// trigger, so anything the caller still needs must be rooted.
    pub(crate) fn note_foreign(&mut self, bytes: usize) {
        if self.pressure > self.config.alloc_limit_trigger {
            debug!(
                pressure = self.pressure,
                trigger = self.config.alloc_limit_trigger,
                "allocation pressure forcing collection"
            );
            self.stats.pressure_collections += 1;
            self.collect();
        }
        self.pressure += bytes;
        self.stats.foreign_bytes += bytes;
        trace!(bytes, pressure = self.pressure, "foreign buffer allocated");
    }

    pub(crate) fn alloc_scalar(&mut self, ty: TypeId, n: Number) -> Value {
        Value::Object(self.heap.alloc(Object::Scalar(ScalarBox::new(ty, n))))
    }

    /// Box `n` as a scalar of its own kind.
    pub fn make_number(&mut self, n: Number) -> Value {
        self.alloc_scalar(TypeId::scalar(n.kind().scalar()), n)
    }

    /// Smallest representation of an exact integer: fixnum, then `int64`,
    /// then `uint64`. Values past 64 bits wrap modulo 2^64.
    pub fn int_value(&mut self, v: i128) -> Value {
        if fits_fixnum(v) {
            return Value::Fixnum(v as i64);
        }
        let n = if let Ok(i) = i64::try_from(v) {
            Number::Int64(i)
        } else if let Ok(u) = u64::try_from(v) {
            Number::UInt64(u)
        } else if v > 0 {
            Number::UInt64(v as u64)
        } else {
            Number::Int64(v as i64)
        };
        self.make_number(n)
    }

    /// A value of `ty` whose payload lives elsewhere.
    ///
    /// Views register no finalizer. A view of a view refers to the
    /// outermost owner directly.
    pub fn make_view(&mut self, ty: TypeId, source: ViewSource, size: usize) -> EngineResult<Value> {
        if self.types.desc(ty).num_kind().is_some() {
            return Err(argument_error("c-value: scalar types cannot be views"));
        }
        self.check_size(ty, size)?;
        let storage = match source {
            ViewSource::Parent { parent, offset } => {
                let Some(pr) = parent.as_object() else {
                    return Err(type_error("c-value", "native value", 1, self.type_name(parent)));
                };
                let (owner, base, len) = match self.heap.get(pr)? {
                    Object::Native(NativeBox {
                        storage: Storage::Parent { parent: owner, offset: base },
                        len,
                        ..
                    }) => (*owner, *base, *len),
                    Object::Native(nb) => (pr, 0, nb.len),
                    _ => return Err(type_error("c-value", "native value", 1, self.type_name(parent))),
                };
                let end = offset.checked_add(size).unwrap_or(usize::MAX);
                if end > len {
                    return Err(bounds_error("c-value", end as i128, len));
                }
                Storage::Parent {
                    parent: owner,
                    offset: base + offset,
                }
            }
            ViewSource::External(buf) => {
                if size > buf.len() {
                    return Err(bounds_error("c-value", size as i128, buf.len()));
                }
                Storage::External(buf)
            }
        };
        let r = self.heap.alloc(Object::Native(NativeBox {
            ty,
            len: size,
            storage,
        }));
        Ok(Value::Object(r))
    }

    /// Take ownership of a caller-managed view's memory.
    ///
    /// The memory must have come from [`ForeignBuf::alloc_zeroed`]; it is
    /// released when the value is collected.
    pub fn adopt(&mut self, v: Value) -> EngineResult<()> {
        let r = v
            .as_object()
            .ok_or_else(|| type_error("adopt", "native value", 1, self.type_name(v)))?;
        match self.heap.get_mut(r)? {
            Object::Native(nb) => match std::mem::replace(&mut nb.storage, Storage::Inline(InlineBytes::new())) {
                Storage::External(buf) => nb.storage = Storage::Owned(buf),
                other => {
                    nb.storage = other;
                    return Err(argument_error("adopt: value does not reference external memory"));
                }
            },
            _ => return Err(argument_error("adopt: value does not reference external memory")),
        }
        self.heap.finalizers.add(r);
        Ok(())
    }

    /// Deep copy of a native value.
    ///
    /// Referenced storage is copied into a fresh owned buffer with no link
    /// to the source; inline storage is copied by size.
    pub fn clone_value(&mut self, v: Value) -> EngineResult<Value> {
        let Some(r) = v.as_object() else {
            return Err(type_error("copy", "native value", 1, self.type_name(v)));
        };
        let (ty, placement) = match self.heap.get(r)? {
            Object::Scalar(s) => {
                let (ty, n) = (s.ty, s.number());
                return Ok(self.alloc_scalar(ty, n));
            }
            Object::Native(nb) => {
                let placement = if matches!(nb.storage, Storage::Inline(_)) {
                    Placement::BySize
                } else {
                    Placement::Owned
                };
                (nb.ty, placement)
            }
            _ => return Err(type_error("copy", "native value", 1, self.type_name(v))),
        };
        let bytes = self.heap.payload(r)?.to_vec();
        if self.types.desc(ty).is_text() && bytes.is_empty() {
            return Ok(Value::Object(self.empty_text));
        }
        let copy = self.with_roots(&[v], |e| e.alloc_native(ty, bytes.len(), placement))?;
        self.payload_mut(copy)?.copy_from_slice(&bytes);
        Ok(copy)
    }

    /// Move an inline payload to a stable owned buffer.
    ///
    /// Values with referenced storage are already stable.
    pub fn pin(&mut self, v: Value) -> EngineResult<()> {
        let Some(r) = v.as_object() else {
            return Err(type_error("pin", "native value", 1, self.type_name(v)));
        };
        let cap = match self.heap.get(r)? {
            Object::Native(NativeBox {
                storage: Storage::Inline(bytes),
                ..
            }) => bytes.len(),
            Object::Native(_) => return Ok(()),
            _ => return Err(type_error("pin", "native value", 1, self.type_name(v))),
        };
        if r == self.empty_text {
            return Ok(());
        }
        self.with_roots(&[v], |e| e.note_foreign(cap));
        let mut buf = ForeignBuf::alloc_zeroed(cap)?;
        if let Object::Native(nb) = self.heap.get_mut(r)? {
            if let Storage::Inline(bytes) = &nb.storage {
                buf.as_mut_slice().copy_from_slice(bytes);
            }
            nb.storage = Storage::Owned(buf);
        }
        // Host-finalized values are registered from allocation.
        if !self.heap.finalizers.contains(r) {
            self.heap.finalizers.add(r);
        }
        Ok(())
    }

    /// Construct a value of `ty`, populated from `init` if given.
    ///
    /// An incomplete array type is sized from the source.
    pub fn construct(&mut self, ty: TypeId, init: Option<Value>) -> EngineResult<Value> {
        let desc = self.types.desc(ty);
        if let Some(kind) = desc.num_kind() {
            let n = match init {
                Some(src) => self.number_of("c-value", src, 1)?.cast(kind),
                None => Number::zero(kind),
            };
            return Ok(self.alloc_scalar(ty, n));
        }
        let size = if desc.is_incomplete() {
            let stride = desc.elem_size();
            match init {
                Some(src) => self
                    .source_count(src)?
                    .checked_mul(stride)
                    .ok_or_else(|| memory_error(usize::MAX))?,
                None => 0,
            }
        } else {
            desc.size()
        };
        let Some(src) = init else {
            return self.make_value(ty, size);
        };
        let mut scratch = vec![0u8; size];
        self.init_bytes(ty, src, &mut scratch)?;
        let v = self.with_roots(&[src], |e| e.make_value(ty, size))?;
        self.payload_mut(v)?.copy_from_slice(&scratch);
        Ok(v)
    }

    /// Element count a sequence or native array would fill.
    ///
    /// Anything else counts as one element.
    fn source_count(&self, src: Value) -> EngineResult<usize> {
        if let Some(items) = self.sequence_items(src)? {
            return Ok(items.len());
        }
        if let Some(Object::Native(nb)) = self.object(src)? {
            let desc = self.types.desc(nb.ty);
            if desc.elem().is_some() && desc.elem_size() > 0 {
                return Ok(nb.len / desc.elem_size());
            }
        }
        Ok(1)
    }

    /// Construct from a type expression.
    pub fn new_value(&mut self, expr: &TypeExpr, init: Option<Value>) -> EngineResult<Value> {
        let ty = self.get_type(expr)?;
        self.construct(ty, init)
    }

    /// Typed numeric constructor, defaulting to zero.
    pub fn number(&mut self, kind: NumKind, init: Option<Value>) -> EngineResult<Value> {
        self.construct(TypeId::scalar(kind.scalar()), init)
    }

    /// `(array elem n)` holding `items`.
    pub fn array(&mut self, elem: &TypeExpr, items: &[Value]) -> EngineResult<Value> {
        let ty = self.get_type(&TypeExpr::array(elem.clone(), items.len() as u64))?;
        let size = self.types.desc(ty).size();
        let mut scratch = vec![0u8; size];
        self.init_array_items(ty, items, &mut scratch)?;
        let v = self.with_roots(items, |e| e.make_value(ty, size))?;
        self.payload_mut(v)?.copy_from_slice(&scratch);
        Ok(v)
    }

    /// A text value holding the UTF-8 bytes of `s`.
    pub fn text(&mut self, s: &str) -> EngineResult<Value> {
        self.text_bytes(s.as_bytes())
    }

    pub fn text_bytes(&mut self, bytes: &[u8]) -> EngineResult<Value> {
        let v = self.make_value(TypeId::TEXT, bytes.len())?;
        self.payload_mut(v)?.copy_from_slice(bytes);
        Ok(v)
    }

    /// Borrow the contents of a text value.
    pub fn text_of(&self, v: Value) -> EngineResult<&str> {
        let is_text = match self.object(v)? {
            Some(Object::Native(nb)) => self.types.desc(nb.ty).is_text(),
            _ => false,
        };
        if !is_text {
            return Err(type_error("text", "text", 1, self.type_name(v)));
        }
        std::str::from_utf8(self.payload(v)?).map_err(|_| argument_error("text: invalid UTF-8"))
    }
}

#[cfg(test)]
mod tests;
