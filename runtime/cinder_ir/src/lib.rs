//! Symbols and type expressions for the Cinder runtime.
//!
//! This crate has no knowledge of layout or values; it only defines the
//! vocabulary that `cinder_types` resolves into descriptors.

mod interner;
mod name;
mod parse;
mod scalar;
mod stack;
mod type_expr;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use parse::{parse_type, ParseError, MAX_NESTING};
pub use scalar::ScalarName;
pub use stack::ensure_sufficient_stack;
pub use type_expr::{Field, TypeExpr, TypeExprDisplay};
