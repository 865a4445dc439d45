//! Errors from layout computation and type registration.

/// A type expression that cannot be laid out or registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// An array without a length was asked for its size.
    #[error("sizeof: incomplete type")]
    IncompleteType,
    /// An array without a length appeared inside another type.
    #[error("incomplete array type nested inside `{0}`")]
    NestedIncompleteArray(String),
    #[error("invalid array element type")]
    InvalidElementType,
    #[error("invalid c type `{0}`")]
    UnknownType(String),
    #[error("type `{0}` is already defined")]
    Duplicate(String),
    #[error("type size overflows the address space")]
    TooLarge,
}
