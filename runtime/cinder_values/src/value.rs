//! Language values.

use std::fmt;

use cinder_ir::Name;

/// Handle to a heap object.
///
/// Resolved through the heap's handle table at every use, so a handle stays
/// valid while its object moves. The generation detects use after the
/// object was reclaimed.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        ObjRef { index, generation }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({}#{})", self.index, self.generation)
    }
}

/// A uniformly tagged language value.
///
/// `Fixnum` holds the tagged immediate integer and must stay within
/// `FIXNUM_MIN..=FIXNUM_MAX`; wider integers are boxed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Bool(bool),
    Fixnum(i64),
    Symbol(Name),
    Object(ObjRef),
}

impl Value {
    #[inline]
    pub fn as_object(self) -> Option<ObjRef> {
        match self {
            Value::Object(r) => Some(r),
            _ => None,
        }
    }

    #[inline]
    pub fn as_fixnum(self) -> Option<i64> {
        match self {
            Value::Fixnum(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_symbol(self) -> Option<Name> {
        match self {
            Value::Symbol(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Object(r)
    }
}
