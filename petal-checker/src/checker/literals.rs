//! Numeric literal checking
//!
//! Literal values are held as arbitrary-precision integers (floats as a
//! mantissa and a power of ten), so range checks are exact at every width.

use super::Checker;
use crate::error::ErrorKind;
use crate::program::Builtin;
use crate::scope::Scope;
use num_bigint::{BigInt, Sign};
use petal_ast::{Span, TypeId};

/// Why an integer value does not fit a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RangeError {
    Overflow,
    NegativeUnsigned,
}

/// Checks `value` against a `bits` wide integer type
pub(crate) fn int_range_error(value: &BigInt, signed: bool, bits: u32) -> Option<RangeError> {
    if signed {
        let max = (BigInt::from(1) << (bits - 1)) - BigInt::from(1);
        let min = -(BigInt::from(1) << (bits - 1));
        (value < &min || value > &max).then_some(RangeError::Overflow)
    } else if value.sign() == Sign::Minus {
        Some(RangeError::NegativeUnsigned)
    } else {
        let max = (BigInt::from(1) << bits) - BigInt::from(1);
        (value > &max).then_some(RangeError::Overflow)
    }
}

/// Exponents beyond this overflow every type without computing the value
const MAX_EXPONENT: i64 = 1024;

/// A decimal literal as `mantissa * 10^exp`
#[derive(Debug, Clone, PartialEq)]
struct Decimal {
    mantissa: BigInt,
    exp: i64,
}

impl Decimal {
    fn parse(text: &str) -> Option<Self> {
        let (negative, rest) = split_sign(text);
        let rest = rest.replace('_', "");
        let (number, exp) = match rest.find(['e', 'E']) {
            Some(i) => (&rest[..i], rest[i + 1..].parse::<i64>().ok()?),
            None => (rest.as_str(), 0),
        };
        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        let digits = format!("{whole}{frac}");
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // trailing zeros move into the exponent: 1000e-3 is 1e0
        let significant = digits.trim_end_matches('0');
        if significant.is_empty() {
            return Some(Self {
                mantissa: BigInt::from(0),
                exp: 0,
            });
        }
        let mut mantissa = BigInt::parse_bytes(significant.as_bytes(), 10)?;
        if negative {
            mantissa = -mantissa;
        }
        let zeros = (digits.len() - significant.len()) as i64;
        Some(Self {
            mantissa,
            exp: exp.checked_sub(frac.len() as i64)?.checked_add(zeros)?,
        })
    }

    /// The integer value, or `None` if there is a fractional part
    fn to_integer(&self) -> Option<BigInt> {
        if self.exp >= 0 {
            return Some(&self.mantissa * BigInt::from(10).pow(self.exp as u32));
        }
        let divisor = BigInt::from(10).pow(self.exp.unsigned_abs() as u32);
        let zero = BigInt::from(0);
        (&self.mantissa % &divisor == zero).then(|| &self.mantissa / &divisor)
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// Parses an integer literal: decimal, or `0x`/`0o`/`0b` prefixed
fn parse_int(text: &str) -> Option<BigInt> {
    let (negative, rest) = split_sign(text);
    let rest = rest.replace('_', "");
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        Some("0o") | Some("0O") => (8, &rest[2..]),
        Some("0b") | Some("0B") => (2, &rest[2..]),
        _ => (10, rest.as_str()),
    };
    if digits.is_empty() {
        return None;
    }
    let value = BigInt::parse_bytes(digits.as_bytes(), radix)?;
    Some(if negative { -value } else { value })
}

impl Checker {
    /// The numeric type a literal should take: the wanted type if numeric
    fn numeric_want(&self, want: Option<TypeId>) -> Option<TypeId> {
        want.filter(|&t| self.program.is_numeric(t))
    }

    fn check_int_value(&mut self, scope: &Scope, lit: &str, value: &BigInt, ty: TypeId, span: &Span) {
        let Some(Builtin::Int { signed, bits }) = self.program.builtin(ty) else {
            return;
        };
        let kind = match int_range_error(value, signed, bits) {
            None => return,
            Some(RangeError::Overflow) => ErrorKind::Overflow {
                lit: lit.to_string(),
                ty: self.program.display(ty),
            },
            Some(RangeError::NegativeUnsigned) => ErrorKind::NegativeUnsigned {
                lit: lit.to_string(),
                ty: self.program.display(ty),
            },
        };
        self.error(kind, scope.module, span);
    }

    pub(crate) fn check_int_literal(
        &mut self,
        scope: &Scope,
        text: &str,
        span: &Span,
        want: Option<TypeId>,
    ) -> Option<TypeId> {
        let ty = self.numeric_want(want).unwrap_or(self.builtins.int);
        let Some(value) = parse_int(text) else {
            self.error(ErrorKind::BadLiteral { lit: text.to_string() }, scope.module, span);
            return Some(ty);
        };
        match self.program.builtin(ty) {
            Some(Builtin::Int { .. }) => self.check_int_value(scope, text, &value, ty, span),
            Some(Builtin::Float { bits }) => {
                let decimal = Decimal {
                    mantissa: value,
                    exp: 0,
                };
                self.check_float_range(scope, text, &decimal, bits, ty, span);
            }
            _ => {}
        }
        Some(ty)
    }

    pub(crate) fn check_float_literal(
        &mut self,
        scope: &Scope,
        text: &str,
        span: &Span,
        want: Option<TypeId>,
    ) -> Option<TypeId> {
        let ty = self.numeric_want(want).unwrap_or(self.builtins.float);
        let Some(decimal) = Decimal::parse(text) else {
            self.error(ErrorKind::BadLiteral { lit: text.to_string() }, scope.module, span);
            return Some(ty);
        };
        match self.program.builtin(ty) {
            Some(Builtin::Int { .. }) => {
                let zero = BigInt::from(0);
                let exact = if decimal.mantissa == zero {
                    Some(zero)
                } else if decimal.exp > MAX_EXPONENT {
                    let kind = ErrorKind::Overflow {
                        lit: text.to_string(),
                        ty: self.program.display(ty),
                    };
                    self.error(kind, scope.module, span);
                    return Some(ty);
                } else if decimal.exp < -MAX_EXPONENT {
                    None
                } else {
                    decimal.to_integer()
                };
                match exact {
                    Some(value) => self.check_int_value(scope, text, &value, ty, span),
                    None => {
                        let kind = ErrorKind::Truncated {
                            lit: text.to_string(),
                            ty: self.program.display(ty),
                        };
                        self.error(kind, scope.module, span);
                    }
                }
            }
            Some(Builtin::Float { bits }) => self.check_float_range(scope, text, &decimal, bits, ty, span),
            _ => {}
        }
        Some(ty)
    }

    fn check_float_range(
        &mut self,
        scope: &Scope,
        text: &str,
        decimal: &Decimal,
        bits: u32,
        ty: TypeId,
        span: &Span,
    ) {
        let magnitude = format!("{}e{}", decimal.mantissa, decimal.exp)
            .parse::<f64>()
            .map(f64::abs)
            .unwrap_or(f64::INFINITY);
        let max = if bits == 32 { f32::MAX as f64 } else { f64::MAX };
        if magnitude > max {
            let kind = ErrorKind::Overflow {
                lit: text.to_string(),
                ty: self.program.display(ty),
            };
            self.error(kind, scope.module, span);
        }
    }

    /// Runes are code points: `Rune` by default, or any wanted integer type
    /// wide enough to hold the value
    pub(crate) fn check_rune_literal(
        &mut self,
        scope: &Scope,
        c: char,
        span: &Span,
        want: Option<TypeId>,
    ) -> Option<TypeId> {
        let ty = want
            .filter(|&t| matches!(self.program.builtin(t), Some(Builtin::Int { .. })))
            .unwrap_or(self.builtins.rune);
        let value = BigInt::from(c as u32);
        self.check_int_value(scope, &format!("{:?}", c), &value, ty, span);
        Some(ty)
    }
}
