//! Registry handle for type descriptors.

use std::fmt;

use cinder_ir::ScalarName;

/// A 32-bit index into a [`TypeRegistry`](crate::TypeRegistry).
///
/// Scalar types are pre-registered at the index of their [`ScalarName`], so
/// resolving a scalar never touches the structural table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const INT8: Self = Self::scalar(ScalarName::Int8);
    pub const UINT8: Self = Self::scalar(ScalarName::UInt8);
    pub const INT16: Self = Self::scalar(ScalarName::Int16);
    pub const UINT16: Self = Self::scalar(ScalarName::UInt16);
    pub const INT32: Self = Self::scalar(ScalarName::Int32);
    pub const UINT32: Self = Self::scalar(ScalarName::UInt32);
    pub const INT64: Self = Self::scalar(ScalarName::Int64);
    pub const UINT64: Self = Self::scalar(ScalarName::UInt64);
    pub const FLOAT: Self = Self::scalar(ScalarName::Float);
    pub const DOUBLE: Self = Self::scalar(ScalarName::Double);
    pub const BYTE: Self = Self::scalar(ScalarName::Byte);
    pub const WCHAR: Self = Self::scalar(ScalarName::WChar);
    pub const LONG: Self = Self::scalar(ScalarName::Long);
    pub const ULONG: Self = Self::scalar(ScalarName::ULong);

    /// `(array byte)`, the type of text values.
    pub const TEXT: Self = Self(ScalarName::COUNT as u32);

    /// First index for types registered on demand.
    pub const FIRST_DYNAMIC: u32 = ScalarName::COUNT as u32 + 1;

    #[inline]
    pub const fn scalar(name: ScalarName) -> Self {
        Self(name as u32)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Scalar name, if this is one of the pre-registered scalar types.
    pub fn as_scalar(self) -> Option<ScalarName> {
        ScalarName::ALL.get(self.index()).copied()
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_scalar() {
            Some(s) => write!(f, "TypeId({s})"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}
