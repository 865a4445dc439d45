//! Native scalar type names.

use std::fmt;

/// A scalar name from the type-expression vocabulary.
///
/// `Byte`, `WChar`, `Long` and `ULong` share a representation with a
/// fixed-width kind but stay distinct names, so values built from them keep
/// printing as what they were declared as.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum ScalarName {
    Int8 = 0,
    UInt8 = 1,
    Int16 = 2,
    UInt16 = 3,
    Int32 = 4,
    UInt32 = 5,
    Int64 = 6,
    UInt64 = 7,
    Float = 8,
    Double = 9,
    Byte = 10,
    WChar = 11,
    Long = 12,
    ULong = 13,
}

impl ScalarName {
    /// Number of scalar names.
    pub const COUNT: usize = 14;

    /// All scalar names, in discriminant order.
    pub const ALL: [ScalarName; Self::COUNT] = [
        ScalarName::Int8,
        ScalarName::UInt8,
        ScalarName::Int16,
        ScalarName::UInt16,
        ScalarName::Int32,
        ScalarName::UInt32,
        ScalarName::Int64,
        ScalarName::UInt64,
        ScalarName::Float,
        ScalarName::Double,
        ScalarName::Byte,
        ScalarName::WChar,
        ScalarName::Long,
        ScalarName::ULong,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ScalarName::Int8 => "int8",
            ScalarName::UInt8 => "uint8",
            ScalarName::Int16 => "int16",
            ScalarName::UInt16 => "uint16",
            ScalarName::Int32 => "int32",
            ScalarName::UInt32 => "uint32",
            ScalarName::Int64 => "int64",
            ScalarName::UInt64 => "uint64",
            ScalarName::Float => "float",
            ScalarName::Double => "double",
            ScalarName::Byte => "byte",
            ScalarName::WChar => "wchar",
            ScalarName::Long => "long",
            ScalarName::ULong => "ulong",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == s)
    }

    /// The fixed-width name this scalar shares its representation with.
    pub const fn canonical(self) -> ScalarName {
        match self {
            ScalarName::Byte => ScalarName::UInt8,
            ScalarName::WChar => ScalarName::Int32,
            ScalarName::Long => ScalarName::Int64,
            ScalarName::ULong => ScalarName::UInt64,
            other => other,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ScalarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
