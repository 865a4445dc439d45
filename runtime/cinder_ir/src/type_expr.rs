//! Type expressions: the vocabulary shared by surface syntax and the engine.
//!
//! A `TypeExpr` is the structural key of a type descriptor. Two expressions
//! that compare equal must resolve to the same descriptor, so the derived
//! `Eq`/`Hash` here are load-bearing for registry memoization.

use std::fmt;

use crate::{Name, ScalarName, StringInterner};

/// A named member of a record or variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Name,
    pub ty: TypeExpr,
}

/// A native type expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Scalar(ScalarName),
    Void,
    /// `(pointer T)`
    Pointer(Box<TypeExpr>),
    /// `(c-function ret (params...))`; an opaque code address.
    CFunction {
        ret: Box<TypeExpr>,
        params: Vec<TypeExpr>,
    },
    /// `(array T [n])`; `len` is `None` for an incomplete array.
    Array {
        elem: Box<TypeExpr>,
        len: Option<u64>,
    },
    /// `(record (name T)...)`, fields laid out in order.
    Record(Vec<Field>),
    /// `(variant (name T)...)`, fields share offset 0.
    Variant(Vec<Field>),
    /// `(enum name...)`
    Enum(Vec<Name>),
    /// A host-defined opaque type.
    Named(Name),
}

impl TypeExpr {
    #[inline]
    pub fn scalar(name: ScalarName) -> Self {
        TypeExpr::Scalar(name)
    }

    pub fn array(elem: TypeExpr, len: u64) -> Self {
        TypeExpr::Array {
            elem: Box::new(elem),
            len: Some(len),
        }
    }

    /// An array with no declared length.
    pub fn array_of(elem: TypeExpr) -> Self {
        TypeExpr::Array {
            elem: Box::new(elem),
            len: None,
        }
    }

    pub fn pointer(to: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(to))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeExpr::Scalar(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeExpr::Array { .. })
    }

    /// Element expression of an array, if this is one.
    pub fn element(&self) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Render with names resolved through `interner`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> TypeExprDisplay<'a> {
        TypeExprDisplay {
            expr: self,
            interner,
        }
    }
}

impl From<ScalarName> for TypeExpr {
    fn from(name: ScalarName) -> Self {
        TypeExpr::Scalar(name)
    }
}

/// Printer for [`TypeExpr`]. Output reads back through [`crate::parse_type`].
pub struct TypeExprDisplay<'a> {
    expr: &'a TypeExpr,
    interner: &'a StringInterner,
}

impl TypeExprDisplay<'_> {
    fn nested<'b>(&'b self, expr: &'b TypeExpr) -> TypeExprDisplay<'b> {
        TypeExprDisplay {
            expr,
            interner: self.interner,
        }
    }

    fn fields(&self, f: &mut fmt::Formatter<'_>, head: &str, fields: &[Field]) -> fmt::Result {
        write!(f, "({head}")?;
        for field in fields {
            write!(
                f,
                " ({} {})",
                self.interner.lookup(field.name),
                self.nested(&field.ty)
            )?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for TypeExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr {
            TypeExpr::Scalar(s) => f.write_str(s.as_str()),
            TypeExpr::Void => f.write_str("void"),
            TypeExpr::Pointer(to) => write!(f, "(pointer {})", self.nested(to)),
            TypeExpr::CFunction { ret, params } => {
                write!(f, "(c-function {} (", self.nested(ret))?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", self.nested(p))?;
                }
                f.write_str("))")
            }
            TypeExpr::Array { elem, len: Some(n) } => {
                write!(f, "(array {} {n})", self.nested(elem))
            }
            TypeExpr::Array { elem, len: None } => write!(f, "(array {})", self.nested(elem)),
            TypeExpr::Record(fields) => self.fields(f, "record", fields),
            TypeExpr::Variant(fields) => self.fields(f, "variant", fields),
            TypeExpr::Enum(names) => {
                f.write_str("(enum")?;
                for n in names {
                    write!(f, " {}", self.interner.lookup(*n))?;
                }
                f.write_str(")")
            }
            TypeExpr::Named(n) => f.write_str(self.interner.lookup(*n)),
        }
    }
}
