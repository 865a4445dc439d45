//! Arithmetic over the numeric tower.
//!
//! Integer operands accumulate exactly in `i128`; floats in `f64`. The
//! result is a double if any operand was a float, otherwise the exact
//! integer in its smallest representation (see [`Engine::int_value`]).

use std::cmp::Ordering;

use cinder_types::{NumKind, Number};

use crate::heap::Object;
use crate::{argument_error, divide_by_zero, type_error, Engine, EngineResult, Value};

/// A numeric operand: an immediate or the contents of a scalar box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Operand {
    Fixnum(i64),
    Boxed(Number),
}

impl Operand {
    pub(crate) fn number(self) -> Number {
        match self {
            Operand::Fixnum(n) => Number::Int64(n),
            Operand::Boxed(n) => n,
        }
    }
}

/// Quotient accumulator for `/`.
#[derive(Copy, Clone, Debug)]
enum Quotient {
    Exact(i128),
    Inexact(f64),
}

impl Engine {
    pub(crate) fn operand(&self, op: &'static str, v: Value, position: usize) -> EngineResult<Operand> {
        match v {
            Value::Fixnum(n) => Ok(Operand::Fixnum(n)),
            Value::Object(r) => match self.heap.get(r)? {
                Object::Scalar(s) => Ok(Operand::Boxed(s.number())),
                _ => Err(type_error(op, "number", position, self.type_name(v))),
            },
            _ => Err(type_error(op, "number", position, self.type_name(v))),
        }
    }

    pub(crate) fn number_of(&self, op: &'static str, v: Value, position: usize) -> EngineResult<Number> {
        self.operand(op, v, position).map(Operand::number)
    }

    /// `(+ ...)`; the empty sum is 0.
    pub fn add(&mut self, args: &[Value]) -> EngineResult<Value> {
        let mut exact: i128 = 0;
        let mut inexact = None::<f64>;
        for (i, &arg) in args.iter().enumerate() {
            let n = self.number_of("+", arg, i + 1)?;
            match n.to_i128() {
                Some(v) => exact = exact.wrapping_add(v),
                None => *inexact.get_or_insert(0.0) += n.to_f64(),
            }
        }
        Ok(match inexact {
            Some(f) => self.make_number(Number::Double(f + exact as f64)),
            None => self.int_value(exact),
        })
    }

    /// `(* ...)`; the empty product is 1. Any float operand makes the result
    /// a double, even when an exact factor is zero.
    pub fn mul(&mut self, args: &[Value]) -> EngineResult<Value> {
        let mut exact: i128 = 1;
        let mut exact_f = 1.0f64;
        let mut overflowed = false;
        let mut negative = false;
        let mut inexact = None::<f64>;
        for (i, &arg) in args.iter().enumerate() {
            let n = self.number_of("*", arg, i + 1)?;
            match n.to_i128() {
                Some(v) => {
                    exact_f *= v as f64;
                    negative ^= v < 0;
                    match exact.checked_mul(v) {
                        Some(p) => exact = p,
                        None => {
                            overflowed = true;
                            exact = exact.wrapping_mul(v);
                        }
                    }
                }
                None => *inexact.get_or_insert(1.0) *= n.to_f64(),
            }
        }
        if let Some(f) = inexact {
            return Ok(self.make_number(Number::Double(f * exact_f)));
        }
        if overflowed && exact != 0 {
            // Only the low 64 bits are kept.
            let n = if negative {
                Number::Int64(exact as i64)
            } else {
                Number::UInt64(exact as u64)
            };
            return Ok(self.make_number(n));
        }
        Ok(self.int_value(exact))
    }

    /// `(- a)` negates; `(- a b ...)` subtracts the rest from `a`.
    pub fn sub(&mut self, args: &[Value]) -> EngineResult<Value> {
        match args {
            [] => Err(argument_error("-: too few arguments")),
            [a] => self.neg(*a),
            [a, rest @ ..] => {
                self.number_of("-", *a, 1)?;
                for (i, &arg) in rest.iter().enumerate() {
                    self.number_of("-", arg, i + 2)?;
                }
                let sum = self.add(rest)?;
                let negated = self.neg(sum)?;
                self.add(&[*a, negated])
            }
        }
    }

    /// Negation, keeping the operand's width where the result fits it.
    ///
    /// The minimum of a signed box has no negation in its own kind; it is
    /// returned as the unsigned box of the same width.
    pub fn neg(&mut self, v: Value) -> EngineResult<Value> {
        let n = match self.operand("-", v, 1)? {
            Operand::Fixnum(n) => return Ok(self.int_value(-i128::from(n))),
            Operand::Boxed(n) => n,
        };
        let out = match n {
            Number::Int8(x) => return Ok(Value::Fixnum(-i64::from(x))),
            Number::UInt8(x) => return Ok(Value::Fixnum(-i64::from(x))),
            Number::Int16(x) => return Ok(Value::Fixnum(-i64::from(x))),
            Number::UInt16(x) => return Ok(Value::Fixnum(-i64::from(x))),
            Number::Int32(i32::MIN) => Number::UInt32(1 << 31),
            Number::Int32(x) => Number::Int32(-x),
            Number::UInt32(x) if x <= 1 << 31 => Number::Int32((-i64::from(x)) as i32),
            Number::UInt32(x) => Number::Int64(-i64::from(x)),
            Number::Int64(i64::MIN) => Number::UInt64(1 << 63),
            Number::Int64(x) => Number::Int64(-x),
            Number::UInt64(x) => Number::Int64((x as i64).wrapping_neg()),
            Number::Float(x) => Number::Float(-x),
            Number::Double(x) => Number::Double(-x),
        };
        Ok(self.make_number(out))
    }

    /// `(/ a)` is `1/a`; `(/ a b ...)` divides left to right.
    ///
    /// Exact operands divide exactly when the quotient is integral. Only an
    /// exact zero divisor is an error; a float zero divides to infinity.
    pub fn div(&mut self, args: &[Value]) -> EngineResult<Value> {
        let (first, rest, offset) = match args {
            [] => return Err(argument_error("/: too few arguments")),
            [a] => (Value::Fixnum(1), std::slice::from_ref(a), 1),
            [a, rest @ ..] => (*a, rest, 2),
        };
        let mut acc = match self.number_of("/", first, 1)? {
            n if n.is_integer() => Quotient::Exact(n.to_i128().unwrap_or(0)),
            n => Quotient::Inexact(n.to_f64()),
        };
        for (i, &arg) in rest.iter().enumerate() {
            let d = self.number_of("/", arg, i + offset)?;
            acc = match (acc, d.to_i128()) {
                (_, Some(0)) => return Err(divide_by_zero("/")),
                (Quotient::Exact(a), Some(b)) if a % b == 0 => Quotient::Exact(a / b),
                (Quotient::Exact(a), Some(b)) => Quotient::Inexact(a as f64 / b as f64),
                (Quotient::Exact(a), None) => Quotient::Inexact(a as f64 / d.to_f64()),
                (Quotient::Inexact(a), _) => Quotient::Inexact(a / d.to_f64()),
            };
        }
        Ok(match acc {
            Quotient::Exact(q) => self.int_value(q),
            Quotient::Inexact(f) => self.make_number(Number::Double(f)),
        })
    }

    /// Integer division truncating toward zero.
    pub fn idiv(&mut self, a: Value, b: Value) -> EngineResult<Value> {
        let x = self.integer_of("div", a, 1)?;
        let y = self.integer_of("div", b, 2)?;
        if y == 0 {
            return Err(divide_by_zero("div"));
        }
        Ok(self.int_value(x / y))
    }

    fn integer_of(&self, op: &'static str, v: Value, position: usize) -> EngineResult<i128> {
        self.number_of(op, v, position)?
            .to_i128()
            .ok_or_else(|| type_error(op, "integer", position, self.type_name(v)))
    }

    /// Compare by exact value across all widths and signedness.
    pub fn num_cmp(&self, a: Value, b: Value) -> EngineResult<Ordering> {
        let x = self.number_of("<", a, 1)?;
        let y = self.number_of("<", b, 2)?;
        x.compare(y)
            .ok_or_else(|| argument_error("<: NaN has no ordering"))
    }

    /// Numeric equality. NaN equals nothing.
    pub fn num_eq(&self, a: Value, b: Value) -> EngineResult<bool> {
        let x = self.number_of("=", a, 1)?;
        let y = self.number_of("=", b, 2)?;
        Ok(x.compare(y) == Some(Ordering::Equal))
    }

    /// Numeric contents of `v`; fixnums read as `int64`.
    pub fn number_value(&self, v: Value) -> EngineResult<Number> {
        self.number_of("number", v, 1)
    }

    /// Whether `v` is a fixnum or a numeric box.
    pub fn is_number(&self, v: Value) -> bool {
        self.operand("number?", v, 1).is_ok()
    }

    /// Kind of a numeric value; fixnums report `int64`.
    pub fn num_kind(&self, v: Value) -> Option<NumKind> {
        self.operand("number?", v, 1).ok().map(|o| o.number().kind())
    }
}
