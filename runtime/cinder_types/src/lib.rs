//! Native type model for the Cinder runtime.
//!
//! - [`numeric`]: the numeric tower (`NumKind`, `Number`, conversion)
//! - [`layout`]: size/alignment of type expressions
//! - [`TypeRegistry`]: memoized descriptors addressed by [`TypeId`]
//!
//! Nothing here allocates managed values; see `cinder_values` for boxes.

mod descriptor;
mod error;
mod flags;
pub mod layout;
pub mod numeric;
mod registry;
mod type_id;

pub use descriptor::{FieldLayout, InitKind, TypeDesc};
pub use error::LayoutError;
pub use flags::DescFlags;
pub use layout::{align_up, field_offset, sizeof_type, Layout, OpaqueSizes, POINTER_SIZE};
pub use numeric::{convert, fits_fixnum, NumKind, Number, FIXNUM_MAX, FIXNUM_MIN};
pub use registry::TypeRegistry;
pub use cinder_ir::ensure_sufficient_stack;
pub use type_id::TypeId;
