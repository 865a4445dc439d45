//! Typed binary I/O over `std::io` streams.

use std::io::{ErrorKind, Read, Write};

use cinder_ir::TypeExpr;
use cinder_types::{Number, TypeId};

use crate::heap::Object;
use crate::{argument_error, bounds_error, io_error, memory_error, type_error, Engine, EngineResult, Value};

impl Engine {
    /// Read one value of `expr`, or `count` elements of it as an array.
    ///
    /// Returns `None` when the input ends before a whole value was read.
    pub fn read_typed(
        &mut self,
        reader: &mut dyn Read,
        expr: &TypeExpr,
        count: Option<usize>,
    ) -> EngineResult<Option<Value>> {
        let elem = self.get_type(expr)?;
        let (ty, size) = match count {
            Some(n) => {
                let stride = self.types.desc(elem).size();
                let size = n.checked_mul(stride).ok_or_else(|| memory_error(usize::MAX))?;
                (self.get_array_type(elem)?, size)
            }
            None => {
                let desc = self.types.desc(elem);
                if desc.is_incomplete() {
                    return Err(argument_error("io.read: incomplete type"));
                }
                (elem, desc.size())
            }
        };

        let mut buf = vec![0u8; size];
        match reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(io_error("io.read", &e)),
        }

        if let Some(kind) = self.types.desc(ty).num_kind() {
            let n = Number::from_bytes(kind, &buf).unwrap_or(Number::zero(kind));
            return Ok(Some(self.alloc_scalar(ty, n)));
        }
        let v = self.make_value(ty, size)?;
        self.payload_mut(v)?.copy_from_slice(&buf);
        Ok(Some(v))
    }

    /// Write the payload of `v`, or the `(offset, count)` window of it.
    ///
    /// A `wchar` scalar is written as UTF-8 and takes no window. Returns the
    /// number of bytes written.
    pub fn write_value(
        &self,
        writer: &mut dyn Write,
        v: Value,
        range: Option<(usize, Option<usize>)>,
    ) -> EngineResult<usize> {
        if let Some(Object::Scalar(s)) = self.object(v)? {
            if s.ty == TypeId::WCHAR {
                if range.is_some() {
                    return Err(argument_error(
                        "io.write: offset argument not supported for characters",
                    ));
                }
                let code = s.number().to_u64();
                let c = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| argument_error("io.write: invalid character"))?;
                let mut utf8 = [0u8; 4];
                let encoded = c.encode_utf8(&mut utf8);
                writer
                    .write_all(encoded.as_bytes())
                    .map_err(|e| io_error("io.write", &e))?;
                return Ok(encoded.len());
            }
        }

        let bytes = match v {
            Value::Object(_) => self.payload(v)?,
            _ => return Err(type_error("io.write", "c-value", 2, self.type_name(v))),
        };
        let window = match range {
            None => bytes,
            Some((offset, count)) => {
                let len = bytes.len();
                let count = count.unwrap_or(len.saturating_sub(offset));
                if offset >= len {
                    return Err(bounds_error("io.write", offset as i128, len));
                }
                let end = offset.saturating_add(count);
                if end > len {
                    return Err(bounds_error("io.write", end as i128, len));
                }
                &bytes[offset..end]
            }
        };
        writer.write_all(window).map_err(|e| io_error("io.write", &e))?;
        Ok(window.len())
    }
}
