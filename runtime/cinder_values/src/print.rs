//! Printed representation of values.

use std::fmt::{self, Write};

use cinder_types::{ensure_sufficient_stack, InitKind, NumKind, Number, TypeId};

use crate::heap::Object;
use crate::{Engine, Value};

impl Engine {
    /// Printed form of `v`.
    pub fn display(&self, v: Value) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_repr(v, &mut out);
        out
    }

    pub fn write_repr(&self, v: Value, out: &mut dyn Write) -> fmt::Result {
        ensure_sufficient_stack(|| self.write_value_repr(v, out))
    }

    fn write_value_repr(&self, v: Value, out: &mut dyn Write) -> fmt::Result {
        match v {
            Value::Nil => out.write_str("()"),
            Value::Bool(true) => out.write_str("#t"),
            Value::Bool(false) => out.write_str("#f"),
            Value::Fixnum(n) => write!(out, "{n}"),
            Value::Symbol(name) => out.write_str(self.interner.lookup(name)),
            Value::Object(r) => match self.heap.get(r) {
                Err(_) => out.write_str("#<stale>"),
                Ok(Object::Pair(..)) => self.write_list(v, out),
                Ok(Object::Vector(items)) => {
                    out.write_char('[')?;
                    for (i, &item) in items.iter().enumerate() {
                        if i > 0 {
                            out.write_char(' ')?;
                        }
                        self.write_repr(item, out)?;
                    }
                    out.write_char(']')
                }
                Ok(Object::Scalar(s)) => write_scalar(s.ty, s.number(), out),
                Ok(Object::Native(nb)) => {
                    let desc = self.types.desc(nb.ty);
                    let bytes = self.heap.payload(r).unwrap_or_default();
                    if desc.is_text() {
                        return write!(out, "{:?}", String::from_utf8_lossy(bytes));
                    }
                    if let Some(host) = desc.host() {
                        return host.print(bytes, out);
                    }
                    write!(out, "#{}", desc.key().display(&self.interner))?;
                    self.write_native(nb.ty, bytes, out)
                }
            },
        }
    }

    fn write_list(&self, v: Value, out: &mut dyn Write) -> fmt::Result {
        out.write_char('(')?;
        let mut cur = v;
        let mut first = true;
        loop {
            match self.object(cur) {
                Ok(Some(Object::Pair(a, d))) => {
                    if !first {
                        out.write_char(' ')?;
                    }
                    first = false;
                    self.write_repr(*a, out)?;
                    cur = *d;
                }
                _ => break,
            }
        }
        if !cur.is_nil() {
            out.write_str(" . ")?;
            self.write_repr(cur, out)?;
        }
        out.write_char(')')
    }

    /// Body of a native value, recursing through its descriptor.
    fn write_native(&self, ty: TypeId, bytes: &[u8], out: &mut dyn Write) -> fmt::Result {
        let desc = self.types.desc(ty);
        match desc.init() {
            InitKind::Numeric(kind) => match Number::from_bytes(kind, bytes) {
                Some(n) => write_number(n, out),
                None => out.write_str("?"),
            },
            InitKind::Array => {
                let (Some(elem), stride) = (desc.elem(), desc.elem_size()) else {
                    return out.write_str("()");
                };
                out.write_char('(')?;
                for (i, chunk) in bytes.chunks_exact(stride).enumerate() {
                    if i > 0 {
                        out.write_char(' ')?;
                    }
                    self.write_native(elem, chunk, out)?;
                }
                out.write_char(')')
            }
            InitKind::Record => {
                out.write_char('(')?;
                for (i, field) in desc.fields().iter().enumerate() {
                    if i > 0 {
                        out.write_char(' ')?;
                    }
                    let size = self.types.desc(field.ty).size();
                    let chunk = bytes.get(field.offset..field.offset + size).unwrap_or_default();
                    write!(out, "({} ", self.interner.lookup(field.name))?;
                    self.write_native(field.ty, chunk, out)?;
                    out.write_char(')')?;
                }
                out.write_char(')')
            }
            InitKind::Enum => {
                let index = Number::from_bytes(NumKind::Int32, bytes).map_or(0, Number::to_i64);
                let name = usize::try_from(index)
                    .ok()
                    .and_then(|i| desc.enum_members().get(i))
                    .map_or("?", |&n| self.interner.lookup(n));
                write!(out, "({name})")
            }
            InitKind::Host => match desc.host() {
                Some(host) => host.print(bytes, out),
                None => write_hex(bytes, out),
            },
            InitKind::Pointer | InitKind::Variant | InitKind::None => write_hex(bytes, out),
        }
    }
}

fn write_scalar(ty: TypeId, n: Number, out: &mut dyn Write) -> fmt::Result {
    if ty == TypeId::DOUBLE {
        return write_number(n, out);
    }
    let name = ty.as_scalar().map_or("number", |s| s.as_str());
    write!(out, "#{name}(")?;
    write_number(n, out)?;
    out.write_char(')')
}

fn write_number(n: Number, out: &mut dyn Write) -> fmt::Result {
    match n {
        Number::Float(f) => write_float(f64::from(f), out),
        Number::Double(d) => write_float(d, out),
        int => write!(out, "{}", int.to_i128().unwrap_or(0)),
    }
}

fn write_float(d: f64, out: &mut dyn Write) -> fmt::Result {
    if d.is_nan() {
        out.write_str("+nan.0")
    } else if d.is_infinite() {
        out.write_str(if d > 0.0 { "+inf.0" } else { "-inf.0" })
    } else if d.fract() == 0.0 && d.abs() < 1e16 {
        write!(out, "{d:.1}")
    } else {
        write!(out, "{d}")
    }
}

fn write_hex(bytes: &[u8], out: &mut dyn Write) -> fmt::Result {
    out.write_str("(#x")?;
    for b in bytes {
        write!(out, "{b:02x}")?;
    }
    out.write_char(')')
}

#[cfg(test)]
mod tests;
