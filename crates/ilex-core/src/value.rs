//! Compile-time constant values.
//!
//! [`ConstValue`] carries one variant per primitive kind so that folding can
//! mirror runtime IL semantics exactly: an `int8` addition wraps at 8 bits, a
//! `uint64` shift masks its count, and so on. Conversions between kinds follow
//! the IL `conv.*` family (wrapping for integers, truncation for float to
//! integer).
//!
//! `decimal` is modeled as a 128-bit scaled integer. Addition, subtraction
//! and multiplication fold exactly; division folds only when the quotient is
//! exact within the maximum scale, otherwise the expression simply is not a
//! compile-time constant.

use std::cmp::Ordering;
use std::fmt;

use crate::primitives::PrimitiveKind;

/// Maximum decimal scale (digits after the decimal point).
pub const DECIMAL_MAX_SCALE: u8 = 28;

/// A 128-bit scaled decimal: `mantissa * 10^-scale`.
#[derive(Clone, Copy, Debug)]
pub struct Decimal {
    /// Signed mantissa.
    pub mantissa: i128,
    /// Number of decimal digits the mantissa is scaled by.
    pub scale: u8,
}

impl Decimal {
    /// A decimal from an integer value.
    pub const fn from_int(value: i128) -> Self {
        Self {
            mantissa: value,
            scale: 0,
        }
    }

    /// A decimal from a mantissa and scale.
    pub fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }.normalized()
    }

    /// Strip trailing zero digits so equal values compare equal structurally.
    fn normalized(mut self) -> Self {
        while self.scale > 0 && self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
        self
    }

    /// Rescale both operands to a common scale. Fails on mantissa overflow.
    fn align(a: Decimal, b: Decimal) -> Option<(i128, i128, u8)> {
        let scale = a.scale.max(b.scale);
        let am = rescale(a.mantissa, scale - a.scale)?;
        let bm = rescale(b.mantissa, scale - b.scale)?;
        Some((am, bm, scale))
    }

    /// Exact addition; `None` on overflow.
    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        let (a, b, scale) = Self::align(self, other)?;
        Some(Decimal::new(a.checked_add(b)?, scale))
    }

    /// Exact subtraction; `None` on overflow.
    pub fn checked_sub(self, other: Decimal) -> Option<Decimal> {
        let (a, b, scale) = Self::align(self, other)?;
        Some(Decimal::new(a.checked_sub(b)?, scale))
    }

    /// Exact multiplication; `None` on overflow or scale overflow.
    pub fn checked_mul(self, other: Decimal) -> Option<Decimal> {
        let scale = self.scale.checked_add(other.scale)?;
        if scale > DECIMAL_MAX_SCALE {
            return None;
        }
        Some(Decimal::new(
            self.mantissa.checked_mul(other.mantissa)?,
            scale,
        ))
    }

    /// Division that folds only when exact within [`DECIMAL_MAX_SCALE`];
    /// `None` for division by zero, overflow, or an inexact quotient.
    pub fn checked_div(self, other: Decimal) -> Option<Decimal> {
        if other.mantissa == 0 {
            return None;
        }
        let (mut num, den, _) = Self::align(self, other)?;
        let mut scale = 0u8;
        loop {
            if num % den == 0 {
                return Some(Decimal::new(num / den, scale));
            }
            if scale == DECIMAL_MAX_SCALE {
                return None;
            }
            num = num.checked_mul(10)?;
            scale += 1;
        }
    }

    /// Negation; `None` on `i128::MIN` overflow.
    pub fn checked_neg(self) -> Option<Decimal> {
        Some(Decimal {
            mantissa: self.mantissa.checked_neg()?,
            scale: self.scale,
        })
    }

    /// Whether this decimal is an integer that fits `i128` unchanged.
    pub fn to_integer(self) -> Option<i128> {
        if self.scale == 0 { Some(self.mantissa) } else { None }
    }
}

fn rescale(mantissa: i128, by: u8) -> Option<i128> {
    let mut m = mantissa;
    for _ in 0..by {
        m = m.checked_mul(10)?;
    }
    Some(m)
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.partial_cmp(other), Some(Ordering::Equal))
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b, _) = Decimal::align(*self, *other)?;
        Some(a.cmp(&b))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{digits:0>scale$}")
        }
    }
}

/// A typed compile-time constant value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    /// UTF-16 code unit.
    Char(u16),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Dec(Decimal),
    Str(String),
    Null,
}

impl ConstValue {
    /// The primitive kind this value is stored at, if it has one.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            ConstValue::Bool(_) => PrimitiveKind::Bool,
            ConstValue::Char(_) => PrimitiveKind::Char,
            ConstValue::I8(_) => PrimitiveKind::Int8,
            ConstValue::U8(_) => PrimitiveKind::UInt8,
            ConstValue::I16(_) => PrimitiveKind::Int16,
            ConstValue::U16(_) => PrimitiveKind::UInt16,
            ConstValue::I32(_) => PrimitiveKind::Int32,
            ConstValue::U32(_) => PrimitiveKind::UInt32,
            ConstValue::I64(_) => PrimitiveKind::Int64,
            ConstValue::U64(_) => PrimitiveKind::UInt64,
            ConstValue::F32(_) => PrimitiveKind::Float32,
            ConstValue::F64(_) => PrimitiveKind::Float64,
            ConstValue::Dec(_) => PrimitiveKind::Decimal,
            ConstValue::Str(_) | ConstValue::Null => return None,
        })
    }

    /// Integer value widened to `i128`, when this is an integer kind.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            ConstValue::Char(v) => *v as i128,
            ConstValue::I8(v) => *v as i128,
            ConstValue::U8(v) => *v as i128,
            ConstValue::I16(v) => *v as i128,
            ConstValue::U16(v) => *v as i128,
            ConstValue::I32(v) => *v as i128,
            ConstValue::U32(v) => *v as i128,
            ConstValue::I64(v) => *v as i128,
            ConstValue::U64(v) => *v as i128,
            _ => return None,
        })
    }

    /// Floating value widened to `f64`, for any numeric kind.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match self {
            ConstValue::F32(v) => *v as f64,
            ConstValue::F64(v) => *v,
            ConstValue::Dec(d) => {
                d.mantissa as f64 / 10f64.powi(d.scale as i32)
            }
            other => other.as_i128()? as f64,
        })
    }

    /// Whether a statically-known value provably fits the target integer
    /// kind without loss.
    pub fn fits_in(&self, target: PrimitiveKind) -> bool {
        let Some(v) = self.as_i128() else { return false };
        let (min, max): (i128, i128) = match target {
            PrimitiveKind::Char => (0, u16::MAX as i128),
            PrimitiveKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveKind::UInt8 => (0, u8::MAX as i128),
            PrimitiveKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveKind::UInt16 => (0, u16::MAX as i128),
            PrimitiveKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveKind::UInt32 => (0, u32::MAX as i128),
            PrimitiveKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            PrimitiveKind::UInt64 => (0, u64::MAX as i128),
            _ => return false,
        };
        v >= min && v <= max
    }

    /// Convert to the target kind with IL `conv.*` semantics: integers wrap,
    /// float-to-integer truncates (out-of-range truncation does not fold),
    /// integer-to-decimal is exact, float-to-decimal does not fold.
    pub fn convert_to(&self, target: PrimitiveKind) -> Option<ConstValue> {
        if self.kind() == Some(target) {
            return Some(self.clone());
        }
        match target {
            PrimitiveKind::Bool => match self {
                ConstValue::Bool(v) => Some(ConstValue::Bool(*v)),
                _ => None,
            },
            PrimitiveKind::Float32 => Some(ConstValue::F32(self.as_f64()? as f32)),
            PrimitiveKind::Float64 => Some(ConstValue::F64(self.as_f64()?)),
            PrimitiveKind::Decimal => match self {
                ConstValue::Dec(d) => Some(ConstValue::Dec(*d)),
                other => Some(ConstValue::Dec(Decimal::from_int(other.as_i128()?))),
            },
            integer => {
                let wide: i128 = match self {
                    ConstValue::F32(v) => float_to_i128(*v as f64)?,
                    ConstValue::F64(v) => float_to_i128(*v)?,
                    ConstValue::Dec(d) => d.to_integer()?,
                    other => other.as_i128()?,
                };
                Some(truncate_integer(wide, integer))
            }
        }
    }
}

/// Truncating integer conversion (wraps, like IL `conv.i1`/`conv.u4`/...).
fn truncate_integer(v: i128, target: PrimitiveKind) -> ConstValue {
    match target {
        PrimitiveKind::Char => ConstValue::Char(v as u16),
        PrimitiveKind::Int8 => ConstValue::I8(v as i8),
        PrimitiveKind::UInt8 => ConstValue::U8(v as u8),
        PrimitiveKind::Int16 => ConstValue::I16(v as i16),
        PrimitiveKind::UInt16 => ConstValue::U16(v as u16),
        PrimitiveKind::Int32 => ConstValue::I32(v as i32),
        PrimitiveKind::UInt32 => ConstValue::U32(v as u32),
        PrimitiveKind::Int64 => ConstValue::I64(v as i64),
        PrimitiveKind::UInt64 => ConstValue::U64(v as u64),
        // Callers only pass integer kinds here.
        _ => unreachable!("truncate_integer called with non-integer kind"),
    }
}

/// Float-to-integer truncation; out-of-range or NaN inputs do not fold.
fn float_to_i128(v: f64) -> Option<i128> {
    if v.is_nan() || v.is_infinite() {
        return None;
    }
    let t = v.trunc();
    if t < i128::MIN as f64 || t > i128::MAX as f64 {
        return None;
    }
    Some(t as i128)
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(v) => write!(f, "{v}"),
            ConstValue::Char(v) => write!(f, "'\\u{v:04x}'"),
            ConstValue::I8(v) => write!(f, "{v}"),
            ConstValue::U8(v) => write!(f, "{v}"),
            ConstValue::I16(v) => write!(f, "{v}"),
            ConstValue::U16(v) => write!(f, "{v}"),
            ConstValue::I32(v) => write!(f, "{v}"),
            ConstValue::U32(v) => write!(f, "{v}"),
            ConstValue::I64(v) => write!(f, "{v}"),
            ConstValue::U64(v) => write!(f, "{v}"),
            ConstValue::F32(v) => write!(f, "{v}"),
            ConstValue::F64(v) => write!(f, "{v}"),
            ConstValue::Dec(v) => write!(f, "{v}"),
            ConstValue::Str(v) => write!(f, "{v:?}"),
            ConstValue::Null => write!(f, "null"),
        }
    }
}
