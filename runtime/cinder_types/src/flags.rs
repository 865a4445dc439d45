//! Descriptor property flags, computed once at registration.

use bitflags::bitflags;

bitflags! {
    /// Cached properties of a registered type.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct DescFlags: u16 {
        /// A scalar numeric type.
        const NUMERIC = 1 << 0;
        /// Has an initializer, so values can be copied and written byte-wise.
        const PLAIN_DATA = 1 << 1;
        /// An array of `byte`; values carry a trailing terminator.
        const TEXT = 1 << 2;
        /// An array with no declared length.
        const INCOMPLETE = 1 << 3;
        /// Host-defined; layout was supplied rather than computed.
        const OPAQUE = 1 << 4;
        const ARRAY = 1 << 5;
        const RECORD = 1 << 6;
        const VARIANT = 1 << 7;
        const ENUM = 1 << 8;
        const POINTER = 1 << 9;
    }
}
