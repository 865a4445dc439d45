//! The numeric tower: fixed-width kinds and conversion between them.
//!
//! Every kind-dependent operation goes through [`Number`], a closed sum over
//! [`NumKind`], instead of one code path per width/signedness pair.

use std::cmp::Ordering;

use cinder_ir::ScalarName;

/// Bit width of the tagged immediate integer.
pub const FIXNUM_BITS: u32 = 62;
/// Largest tagged immediate integer.
pub const FIXNUM_MAX: i64 = (1 << (FIXNUM_BITS - 1)) - 1;
/// Smallest tagged immediate integer.
pub const FIXNUM_MIN: i64 = -(1 << (FIXNUM_BITS - 1));

/// Whether `v` fits the tagged immediate range.
#[inline]
pub const fn fits_fixnum(v: i128) -> bool {
    v >= FIXNUM_MIN as i128 && v <= FIXNUM_MAX as i128
}

/// A fixed-width numeric kind.
///
/// Ordering is the promotion order: the wider of two kinds is their `max`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum NumKind {
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
}

impl NumKind {
    pub const ALL: [NumKind; 10] = [
        NumKind::Int8,
        NumKind::UInt8,
        NumKind::Int16,
        NumKind::UInt16,
        NumKind::Int32,
        NumKind::UInt32,
        NumKind::Int64,
        NumKind::UInt64,
        NumKind::Float,
        NumKind::Double,
    ];

    /// Byte width (and natural alignment).
    pub const fn size(self) -> usize {
        match self {
            NumKind::Int8 | NumKind::UInt8 => 1,
            NumKind::Int16 | NumKind::UInt16 => 2,
            NumKind::Int32 | NumKind::UInt32 | NumKind::Float => 4,
            NumKind::Int64 | NumKind::UInt64 | NumKind::Double => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, NumKind::Float | NumKind::Double)
    }

    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            NumKind::UInt8 | NumKind::UInt16 | NumKind::UInt32 | NumKind::UInt64
        )
    }

    pub const fn from_scalar(name: ScalarName) -> NumKind {
        match name.canonical() {
            ScalarName::Int8 => NumKind::Int8,
            ScalarName::UInt8 => NumKind::UInt8,
            ScalarName::Int16 => NumKind::Int16,
            ScalarName::UInt16 => NumKind::UInt16,
            ScalarName::Int32 => NumKind::Int32,
            ScalarName::UInt32 => NumKind::UInt32,
            ScalarName::Int64 => NumKind::Int64,
            ScalarName::Float => NumKind::Float,
            ScalarName::Double => NumKind::Double,
            // canonical() never yields an alias
            _ => NumKind::UInt64,
        }
    }

    /// The canonical scalar name of this kind.
    pub const fn scalar(self) -> ScalarName {
        match self {
            NumKind::Int8 => ScalarName::Int8,
            NumKind::UInt8 => ScalarName::UInt8,
            NumKind::Int16 => ScalarName::Int16,
            NumKind::UInt16 => ScalarName::UInt16,
            NumKind::Int32 => ScalarName::Int32,
            NumKind::UInt32 => ScalarName::UInt32,
            NumKind::Int64 => ScalarName::Int64,
            NumKind::UInt64 => ScalarName::UInt64,
            NumKind::Float => ScalarName::Float,
            NumKind::Double => ScalarName::Double,
        }
    }

    /// Inclusive value range of an integer kind.
    pub const fn int_range(self) -> Option<(i128, i128)> {
        Some(match self {
            NumKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            NumKind::UInt8 => (0, u8::MAX as i128),
            NumKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            NumKind::UInt16 => (0, u16::MAX as i128),
            NumKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            NumKind::UInt32 => (0, u32::MAX as i128),
            NumKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            NumKind::UInt64 => (0, u64::MAX as i128),
            NumKind::Float | NumKind::Double => return None,
        })
    }
}

/// A numeric value tagged with its kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
}

impl Number {
    pub const fn kind(self) -> NumKind {
        match self {
            Number::Int8(_) => NumKind::Int8,
            Number::UInt8(_) => NumKind::UInt8,
            Number::Int16(_) => NumKind::Int16,
            Number::UInt16(_) => NumKind::UInt16,
            Number::Int32(_) => NumKind::Int32,
            Number::UInt32(_) => NumKind::UInt32,
            Number::Int64(_) => NumKind::Int64,
            Number::UInt64(_) => NumKind::UInt64,
            Number::Float(_) => NumKind::Float,
            Number::Double(_) => NumKind::Double,
        }
    }

    pub fn zero(kind: NumKind) -> Number {
        Number::wrap(kind, 0)
    }

    /// Truncate `v` to `kind` (two's complement wraparound for integers).
    pub fn wrap(kind: NumKind, v: i128) -> Number {
        match kind {
            NumKind::Int8 => Number::Int8(v as i8),
            NumKind::UInt8 => Number::UInt8(v as u8),
            NumKind::Int16 => Number::Int16(v as i16),
            NumKind::UInt16 => Number::UInt16(v as u16),
            NumKind::Int32 => Number::Int32(v as i32),
            NumKind::UInt32 => Number::UInt32(v as u32),
            NumKind::Int64 => Number::Int64(v as i64),
            NumKind::UInt64 => Number::UInt64(v as u64),
            NumKind::Float => Number::Float(v as f32),
            NumKind::Double => Number::Double(v as f64),
        }
    }

    /// Convert a double to `kind`.
    ///
    /// Negative values headed for an unsigned kind go through `int64`, so
    /// `-1.0` becomes all-ones rather than saturating at zero.
    pub fn from_f64(kind: NumKind, d: f64) -> Number {
        match kind {
            NumKind::Float => Number::Float(d as f32),
            NumKind::Double => Number::Double(d),
            NumKind::Int64 => Number::Int64(d as i64),
            NumKind::UInt64 if d < 0.0 => Number::UInt64(d as i64 as u64),
            NumKind::UInt64 => Number::UInt64(d as u64),
            _ => Number::wrap(kind, i128::from(d as i64)),
        }
    }

    /// Decode native-endian bytes of `kind`. `None` if `bytes` is too short.
    pub fn from_bytes(kind: NumKind, bytes: &[u8]) -> Option<Number> {
        let b = bytes.get(..kind.size())?;
        let mut w = [0u8; 8];
        w[..b.len()].copy_from_slice(b);
        Some(match kind {
            NumKind::Int8 => Number::Int8(i8::from_ne_bytes([w[0]])),
            NumKind::UInt8 => Number::UInt8(w[0]),
            NumKind::Int16 => Number::Int16(i16::from_ne_bytes([w[0], w[1]])),
            NumKind::UInt16 => Number::UInt16(u16::from_ne_bytes([w[0], w[1]])),
            NumKind::Int32 => Number::Int32(i32::from_ne_bytes([w[0], w[1], w[2], w[3]])),
            NumKind::UInt32 => Number::UInt32(u32::from_ne_bytes([w[0], w[1], w[2], w[3]])),
            NumKind::Float => Number::Float(f32::from_ne_bytes([w[0], w[1], w[2], w[3]])),
            NumKind::Int64 => Number::Int64(i64::from_ne_bytes(w)),
            NumKind::UInt64 => Number::UInt64(u64::from_ne_bytes(w)),
            NumKind::Double => Number::Double(f64::from_ne_bytes(w)),
        })
    }

    /// Native-endian encoding; only the first `kind().size()` bytes are used.
    pub fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        match self {
            Number::Int8(v) => out[..1].copy_from_slice(&v.to_ne_bytes()),
            Number::UInt8(v) => out[0] = v,
            Number::Int16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
            Number::UInt16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
            Number::Int32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Number::UInt32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Number::Float(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
            Number::Int64(v) => out = v.to_ne_bytes(),
            Number::UInt64(v) => out = v.to_ne_bytes(),
            Number::Double(v) => out = v.to_ne_bytes(),
        }
        out
    }

    /// Write the native encoding into the front of `dest`.
    ///
    /// # Panics
    /// Panics if `dest` is shorter than the kind's size.
    pub fn write_to(self, dest: &mut [u8]) {
        let n = self.kind().size();
        dest[..n].copy_from_slice(&self.to_bytes()[..n]);
    }

    /// Exact integer value, or `None` for floats.
    pub fn to_i128(self) -> Option<i128> {
        Some(match self {
            Number::Int8(v) => i128::from(v),
            Number::UInt8(v) => i128::from(v),
            Number::Int16(v) => i128::from(v),
            Number::UInt16(v) => i128::from(v),
            Number::Int32(v) => i128::from(v),
            Number::UInt32(v) => i128::from(v),
            Number::Int64(v) => i128::from(v),
            Number::UInt64(v) => i128::from(v),
            Number::Float(_) | Number::Double(_) => return None,
        })
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Float(v) => f64::from(v),
            Number::Double(v) => v,
            int => int.to_i128().map_or(0.0, |v| v as f64),
        }
    }

    /// C-style `int64` cast.
    pub fn to_i64(self) -> i64 {
        match self.to_i128() {
            Some(v) => v as i64,
            None => self.to_f64() as i64,
        }
    }

    /// C-style `uint64` cast.
    pub fn to_u64(self) -> u64 {
        match self.to_i128() {
            Some(v) => v as u64,
            None => match Number::from_f64(NumKind::UInt64, self.to_f64()) {
                Number::UInt64(u) => u,
                _ => 0,
            },
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        !self.kind().is_float()
    }

    pub fn is_zero(self) -> bool {
        match self.to_i128() {
            Some(v) => v == 0,
            None => self.to_f64() == 0.0,
        }
    }

    /// Widen or narrow to `to`. Narrowing truncates without checking.
    pub fn cast(self, to: NumKind) -> Number {
        if self.kind() == to {
            return self;
        }
        match self.to_i128() {
            Some(v) => Number::wrap(to, v),
            None => Number::from_f64(to, self.to_f64()),
        }
    }

    /// Compare two numbers by exact value. `None` if either is NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self.to_i128(), other.to_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (None, None) => self.to_f64().partial_cmp(&other.to_f64()),
            (Some(a), None) => cmp_int_float(a, other.to_f64()),
            (None, Some(b)) => cmp_int_float(b, self.to_f64()).map(Ordering::reverse),
        }
    }
}

fn cmp_int_float(i: i128, f: f64) -> Option<Ordering> {
    match (i as f64).partial_cmp(&f)? {
        // `f` is integral here; settle by exact comparison.
        Ordering::Equal => Some(i.cmp(&(f as i128))),
        other => Some(other),
    }
}

/// Reinterpret `bytes` as `from` and convert to `to`.
///
/// Narrowing performs no overflow check. `None` if `bytes` is shorter than
/// the source kind.
pub fn convert(bytes: &[u8], from: NumKind, to: NumKind) -> Option<Number> {
    Number::from_bytes(from, bytes).map(|n| n.cast(to))
}
