//! Bitwise operators.
//!
//! Two fixnums combine without boxing. Otherwise both operands convert to
//! the wider kind (fixnum counting as `int64`) and the result is a box of
//! that kind; kinds narrower than `int32` come back as fixnums.

use cinder_types::{NumKind, Number};

use crate::arith::Operand;
use crate::{type_error, Engine, EngineResult, Value};

#[derive(Copy, Clone, Debug)]
enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    fn name(self) -> &'static str {
        match self {
            BitOp::And => "logand",
            BitOp::Or => "logior",
            BitOp::Xor => "logxor",
        }
    }

    fn identity(self) -> i64 {
        match self {
            BitOp::And => -1,
            BitOp::Or | BitOp::Xor => 0,
        }
    }

    fn apply(self, a: i128, b: i128) -> i128 {
        match self {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
        }
    }
}

impl Engine {
    pub fn logand(&mut self, args: &[Value]) -> EngineResult<Value> {
        self.fold_bits(BitOp::And, args)
    }

    pub fn logior(&mut self, args: &[Value]) -> EngineResult<Value> {
        self.fold_bits(BitOp::Or, args)
    }

    pub fn logxor(&mut self, args: &[Value]) -> EngineResult<Value> {
        self.fold_bits(BitOp::Xor, args)
    }

    fn fold_bits(&mut self, op: BitOp, args: &[Value]) -> EngineResult<Value> {
        let Some((&first, rest)) = args.split_first() else {
            return Ok(Value::Fixnum(op.identity()));
        };
        let mut acc = self.int_operand(op.name(), first, 1)?;
        for (i, &arg) in rest.iter().enumerate() {
            let b = self.int_operand(op.name(), arg, i + 2)?;
            acc = match (acc, b) {
                (Operand::Fixnum(x), Operand::Fixnum(y)) => {
                    Operand::Fixnum(op.apply(i128::from(x), i128::from(y)) as i64)
                }
                (a, b) => {
                    let (a, b) = (a.number(), b.number());
                    let kind = a.kind().max(b.kind());
                    Operand::Boxed(combine(kind, a, b, |x, y| op.apply(x, y)))
                }
            };
        }
        Ok(self.finish_bits(acc))
    }

    pub fn lognot(&mut self, v: Value) -> EngineResult<Value> {
        let out = match self.int_operand("lognot", v, 1)? {
            Operand::Fixnum(n) => Operand::Fixnum(!n),
            Operand::Boxed(n) => Operand::Boxed(combine(n.kind(), n, n, |x, _| !x)),
        };
        Ok(self.finish_bits(out))
    }

    /// Arithmetic shift: left for positive `n`, right for negative.
    ///
    /// Left shifts are exact and the result takes the smallest
    /// representation that holds it; past 64 bits the result wraps.
    /// Right shifts of signed kinds extend the sign.
    pub fn ash(&mut self, a: Value, n: Value) -> EngineResult<Value> {
        let Value::Fixnum(n) = n else {
            return Err(type_error("ash", "fixnum", 2, self.type_name(n)));
        };
        let amount = u32::try_from(n.unsigned_abs()).unwrap_or(u32::MAX);
        match self.int_operand("ash", a, 1)? {
            Operand::Fixnum(x) if n <= 0 => Ok(Value::Fixnum(x >> amount.min(63))),
            Operand::Fixnum(x) => Ok(self.int_value(shl_wide(i128::from(x), amount))),
            Operand::Boxed(_) if n == 0 => Ok(a),
            Operand::Boxed(x) if n < 0 => {
                let kind = x.kind();
                let shifted = Number::wrap(kind, x.to_i128().unwrap_or(0) >> amount.min(127));
                Ok(self.finish_bits(Operand::Boxed(shifted)))
            }
            Operand::Boxed(Number::UInt64(x)) => Ok(self.int_value(shl_wide(i128::from(x), amount))),
            Operand::Boxed(x) => Ok(self.int_value(shl_wide(i128::from(x.to_i64()), amount))),
        }
    }

    fn int_operand(&self, op: &'static str, v: Value, position: usize) -> EngineResult<Operand> {
        let operand = self.operand(op, v, position)?;
        match operand {
            Operand::Boxed(n) if !n.is_integer() => Err(type_error(op, "integer", position, self.type_name(v))),
            _ => Ok(operand),
        }
    }

    fn finish_bits(&mut self, out: Operand) -> Value {
        match out {
            Operand::Fixnum(n) => Value::Fixnum(n),
            Operand::Boxed(n) if n.kind() < NumKind::Int32 => Value::Fixnum(n.to_i64()),
            Operand::Boxed(n) => self.make_number(n),
        }
    }
}

/// Apply `f` to both operands converted to `kind`, truncating the result
/// back to `kind`.
fn combine(kind: NumKind, a: Number, b: Number, f: impl Fn(i128, i128) -> i128) -> Number {
    let x = a.cast(kind).to_i128().unwrap_or(0);
    let y = b.cast(kind).to_i128().unwrap_or(0);
    Number::wrap(kind, f(x, y))
}

/// `x << amount` for a 64-bit `x`: exact for shifts below 64, else 0.
fn shl_wide(x: i128, amount: u32) -> i128 {
    if amount >= 64 {
        0
    } else {
        x << amount
    }
}
