//! Heap object representations.

use cinder_types::{NumKind, Number, TypeId};
use smallvec::SmallVec;

use super::ForeignBuf;
use crate::{ObjRef, Value};

/// Inline payload buffer; larger inline payloads spill to the Rust heap but
/// still move with their object.
pub(crate) type InlineBytes = SmallVec<[u8; 24]>;

/// Where a native box keeps its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageKind {
    /// Immutable numeric scalar.
    Scalar,
    /// Embedded in the object.
    Inline,
    /// Separately allocated and owned; freed by the finalization sweep.
    Owned,
    /// Borrowed from a parent box, which is kept alive.
    Parent,
    /// Caller-managed memory, never freed by the engine.
    External,
}

pub(crate) enum Storage {
    Inline(InlineBytes),
    Owned(ForeignBuf),
    Parent { parent: ObjRef, offset: usize },
    External(ForeignBuf),
}

impl Storage {
    pub(crate) fn kind(&self) -> StorageKind {
        match self {
            Storage::Inline(_) => StorageKind::Inline,
            Storage::Owned(_) => StorageKind::Owned,
            Storage::Parent { .. } => StorageKind::Parent,
            Storage::External(_) => StorageKind::External,
        }
    }

    /// First `len` bytes of storage this box holds itself (not a parent's).
    pub(crate) fn own_bytes(&self, len: usize) -> Option<&[u8]> {
        match self {
            Storage::Inline(b) => b.get(..len),
            Storage::Owned(b) | Storage::External(b) => b.as_slice().get(..len),
            Storage::Parent { .. } => None,
        }
    }

    pub(crate) fn own_bytes_mut(&mut self, len: usize) -> Option<&mut [u8]> {
        match self {
            Storage::Inline(b) => b.get_mut(..len),
            Storage::Owned(b) | Storage::External(b) => b.as_mut_slice().get_mut(..len),
            Storage::Parent { .. } => None,
        }
    }

    /// Free owned storage. Other kinds are left alone. Returns bytes freed.
    pub(crate) fn release(&mut self, poison: bool) -> usize {
        if !matches!(self, Storage::Owned(_)) {
            return 0;
        }
        match std::mem::replace(self, Storage::Inline(InlineBytes::new())) {
            Storage::Owned(buf) => {
                let len = buf.len();
                buf.release(poison);
                len
            }
            _ => 0,
        }
    }
}

/// Immutable numeric box.
pub(crate) struct ScalarBox {
    pub(crate) ty: TypeId,
    kind: NumKind,
    bits: [u8; 8],
}

impl ScalarBox {
    pub(crate) fn new(ty: TypeId, n: Number) -> Self {
        ScalarBox {
            ty,
            kind: n.kind(),
            bits: n.to_bytes(),
        }
    }

    pub(crate) fn number(&self) -> Number {
        Number::from_bytes(self.kind, &self.bits).unwrap_or(Number::zero(self.kind))
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bits[..self.kind.size()]
    }
}

/// General native value: descriptor, payload length, storage.
pub(crate) struct NativeBox {
    pub(crate) ty: TypeId,
    pub(crate) len: usize,
    pub(crate) storage: Storage,
}

pub(crate) enum Object {
    Pair(Value, Value),
    Vector(Vec<Value>),
    Scalar(ScalarBox),
    Native(NativeBox),
}

impl Object {
    /// Handles this object keeps alive.
    pub(crate) fn children(&self, out: &mut SmallVec<[ObjRef; 8]>) {
        match self {
            Object::Pair(a, b) => out.extend([*a, *b].into_iter().filter_map(Value::as_object)),
            Object::Vector(items) => out.extend(items.iter().filter_map(|v| v.as_object())),
            Object::Native(NativeBox {
                storage: Storage::Parent { parent, .. },
                ..
            }) => out.push(*parent),
            Object::Native(_) | Object::Scalar(_) => {}
        }
    }
}
