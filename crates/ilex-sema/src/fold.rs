//! Constant folding with exact per-kind semantics.
//!
//! Operands arrive already converted to the operator's resolved operand
//! kind; folding then mirrors what the runtime would do at that kind. In an
//! unchecked context integer arithmetic wraps at the operand width; in a
//! checked context overflow is a reportable arithmetic error. Division by a
//! constant zero is left to the runtime: the expression simply is not a
//! compile-time constant. Decimal arithmetic is exact: a result that cannot
//! be represented exactly (an inexact quotient) is not a constant either.

use ilex_core::{ConstValue, Decimal, PrimitiveKind};

use crate::expr::{BinaryOp, UnaryOp};

/// Outcome of a fold attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Folded {
    /// The operation folded to a constant.
    Value(ConstValue),
    /// The operation is a compile-time arithmetic fault (checked overflow)
    /// that must be reported.
    ArithmeticError,
    /// The operation does not fold; the expression is not a constant.
    NotConst,
}

macro_rules! int_arith {
    ($a:expr, $b:expr, $op:expr, $checked:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => {
                if $checked {
                    match a.checked_add(b) {
                        Some(v) => Folded::Value($wrap(v)),
                        None => Folded::ArithmeticError,
                    }
                } else {
                    Folded::Value($wrap(a.wrapping_add(b)))
                }
            }
            BinaryOp::Subtract => {
                if $checked {
                    match a.checked_sub(b) {
                        Some(v) => Folded::Value($wrap(v)),
                        None => Folded::ArithmeticError,
                    }
                } else {
                    Folded::Value($wrap(a.wrapping_sub(b)))
                }
            }
            BinaryOp::Multiply => {
                if $checked {
                    match a.checked_mul(b) {
                        Some(v) => Folded::Value($wrap(v)),
                        None => Folded::ArithmeticError,
                    }
                } else {
                    Folded::Value($wrap(a.wrapping_mul(b)))
                }
            }
            BinaryOp::Divide => {
                if b == 0 {
                    Folded::NotConst
                } else if $checked {
                    match a.checked_div(b) {
                        Some(v) => Folded::Value($wrap(v)),
                        None => Folded::ArithmeticError,
                    }
                } else {
                    Folded::Value($wrap(a.wrapping_div(b)))
                }
            }
            BinaryOp::Remainder => {
                if b == 0 {
                    Folded::NotConst
                } else if $checked {
                    match a.checked_rem(b) {
                        Some(v) => Folded::Value($wrap(v)),
                        None => Folded::ArithmeticError,
                    }
                } else {
                    Folded::Value($wrap(a.wrapping_rem(b)))
                }
            }
            BinaryOp::BitAnd => Folded::Value($wrap(a & b)),
            BinaryOp::BitOr => Folded::Value($wrap(a | b)),
            BinaryOp::BitXor => Folded::Value($wrap(a ^ b)),
            BinaryOp::Equal => Folded::Value(ConstValue::Bool(a == b)),
            BinaryOp::NotEqual => Folded::Value(ConstValue::Bool(a != b)),
            BinaryOp::Less => Folded::Value(ConstValue::Bool(a < b)),
            BinaryOp::LessEqual => Folded::Value(ConstValue::Bool(a <= b)),
            BinaryOp::Greater => Folded::Value(ConstValue::Bool(a > b)),
            BinaryOp::GreaterEqual => Folded::Value(ConstValue::Bool(a >= b)),
            BinaryOp::LeftShift | BinaryOp::RightShift => Folded::NotConst,
        }
    }};
}

macro_rules! float_arith {
    ($a:expr, $b:expr, $op:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Folded::Value($wrap(a + b)),
            BinaryOp::Subtract => Folded::Value($wrap(a - b)),
            BinaryOp::Multiply => Folded::Value($wrap(a * b)),
            BinaryOp::Divide => Folded::Value($wrap(a / b)),
            BinaryOp::Remainder => Folded::Value($wrap(a % b)),
            BinaryOp::Equal => Folded::Value(ConstValue::Bool(a == b)),
            BinaryOp::NotEqual => Folded::Value(ConstValue::Bool(a != b)),
            BinaryOp::Less => Folded::Value(ConstValue::Bool(a < b)),
            BinaryOp::LessEqual => Folded::Value(ConstValue::Bool(a <= b)),
            BinaryOp::Greater => Folded::Value(ConstValue::Bool(a > b)),
            BinaryOp::GreaterEqual => Folded::Value(ConstValue::Bool(a >= b)),
            _ => Folded::NotConst,
        }
    }};
}

/// Fold a binary operation whose operands were both converted to `kind`.
/// Shift operations go through [`shift`] instead (their right operand stays
/// `int32`).
pub fn binary(
    op: BinaryOp,
    kind: PrimitiveKind,
    checked: bool,
    lhs: &ConstValue,
    rhs: &ConstValue,
) -> Folded {
    use ConstValue as V;
    match (kind, lhs, rhs) {
        (PrimitiveKind::Int8, V::I8(a), V::I8(b)) => int_arith!(*a, *b, op, checked, V::I8),
        (PrimitiveKind::UInt8, V::U8(a), V::U8(b)) => int_arith!(*a, *b, op, checked, V::U8),
        (PrimitiveKind::Int16, V::I16(a), V::I16(b)) => int_arith!(*a, *b, op, checked, V::I16),
        (PrimitiveKind::UInt16, V::U16(a), V::U16(b)) => int_arith!(*a, *b, op, checked, V::U16),
        (PrimitiveKind::Char, V::Char(a), V::Char(b)) => int_arith!(*a, *b, op, checked, V::Char),
        (PrimitiveKind::Int32, V::I32(a), V::I32(b)) => int_arith!(*a, *b, op, checked, V::I32),
        (PrimitiveKind::UInt32, V::U32(a), V::U32(b)) => int_arith!(*a, *b, op, checked, V::U32),
        (PrimitiveKind::Int64, V::I64(a), V::I64(b)) => int_arith!(*a, *b, op, checked, V::I64),
        (PrimitiveKind::UInt64, V::U64(a), V::U64(b)) => int_arith!(*a, *b, op, checked, V::U64),
        (PrimitiveKind::Float32, V::F32(a), V::F32(b)) => float_arith!(*a, *b, op, V::F32),
        (PrimitiveKind::Float64, V::F64(a), V::F64(b)) => float_arith!(*a, *b, op, V::F64),
        (PrimitiveKind::Decimal, V::Dec(a), V::Dec(b)) => decimal_binary(op, *a, *b),
        (PrimitiveKind::Bool, V::Bool(a), V::Bool(b)) => match op {
            BinaryOp::BitAnd => Folded::Value(V::Bool(a & b)),
            BinaryOp::BitOr => Folded::Value(V::Bool(a | b)),
            BinaryOp::BitXor => Folded::Value(V::Bool(a ^ b)),
            BinaryOp::Equal => Folded::Value(V::Bool(a == b)),
            BinaryOp::NotEqual => Folded::Value(V::Bool(a != b)),
            _ => Folded::NotConst,
        },
        _ => Folded::NotConst,
    }
}

fn decimal_binary(op: BinaryOp, a: Decimal, b: Decimal) -> Folded {
    match op {
        BinaryOp::Add => match a.checked_add(b) {
            Some(v) => Folded::Value(ConstValue::Dec(v)),
            None => Folded::ArithmeticError,
        },
        BinaryOp::Subtract => match a.checked_sub(b) {
            Some(v) => Folded::Value(ConstValue::Dec(v)),
            None => Folded::ArithmeticError,
        },
        BinaryOp::Multiply => match a.checked_mul(b) {
            Some(v) => Folded::Value(ConstValue::Dec(v)),
            None => Folded::ArithmeticError,
        },
        BinaryOp::Divide => {
            if b.mantissa == 0 {
                Folded::NotConst
            } else {
                // Inexact quotients are representable at runtime (rounded)
                // but are not compile-time constants here.
                match a.checked_div(b) {
                    Some(v) => Folded::Value(ConstValue::Dec(v)),
                    None => Folded::NotConst,
                }
            }
        }
        BinaryOp::Equal => Folded::Value(ConstValue::Bool(a == b)),
        BinaryOp::NotEqual => Folded::Value(ConstValue::Bool(a != b)),
        BinaryOp::Less => Folded::Value(ConstValue::Bool(a < b)),
        BinaryOp::LessEqual => Folded::Value(ConstValue::Bool(a <= b)),
        BinaryOp::Greater => Folded::Value(ConstValue::Bool(a > b)),
        BinaryOp::GreaterEqual => Folded::Value(ConstValue::Bool(a >= b)),
        _ => Folded::NotConst,
    }
}

/// Fold a shift. The count is masked to the operand width, matching the
/// runtime's shift semantics; shifts never overflow-check.
pub fn shift(op: BinaryOp, kind: PrimitiveKind, lhs: &ConstValue, count: i32) -> Folded {
    use ConstValue as V;
    let count = count as u32;
    let v = match (kind, lhs) {
        (PrimitiveKind::Int32, V::I32(a)) => match op {
            BinaryOp::LeftShift => V::I32(a.wrapping_shl(count)),
            BinaryOp::RightShift => V::I32(a.wrapping_shr(count)),
            _ => return Folded::NotConst,
        },
        (PrimitiveKind::UInt32, V::U32(a)) => match op {
            BinaryOp::LeftShift => V::U32(a.wrapping_shl(count)),
            BinaryOp::RightShift => V::U32(a.wrapping_shr(count)),
            _ => return Folded::NotConst,
        },
        (PrimitiveKind::Int64, V::I64(a)) => match op {
            BinaryOp::LeftShift => V::I64(a.wrapping_shl(count)),
            BinaryOp::RightShift => V::I64(a.wrapping_shr(count)),
            _ => return Folded::NotConst,
        },
        (PrimitiveKind::UInt64, V::U64(a)) => match op {
            BinaryOp::LeftShift => V::U64(a.wrapping_shl(count)),
            BinaryOp::RightShift => V::U64(a.wrapping_shr(count)),
            _ => return Folded::NotConst,
        },
        _ => return Folded::NotConst,
    };
    Folded::Value(v)
}

macro_rules! int_neg {
    ($a:expr, $checked:expr, $wrap:path) => {{
        if $checked {
            match $a.checked_neg() {
                Some(v) => Folded::Value($wrap(v)),
                None => Folded::ArithmeticError,
            }
        } else {
            Folded::Value($wrap($a.wrapping_neg()))
        }
    }};
}

/// Fold a unary operation whose operand was converted to `kind`.
pub fn unary(op: UnaryOp, kind: PrimitiveKind, checked: bool, v: &ConstValue) -> Folded {
    use ConstValue as V;
    match op {
        UnaryOp::Plus => Folded::Value(v.clone()),
        UnaryOp::Not => match v {
            V::Bool(b) => Folded::Value(V::Bool(!b)),
            _ => Folded::NotConst,
        },
        UnaryOp::Negate => match (kind, v) {
            (PrimitiveKind::Int32, V::I32(a)) => int_neg!(*a, checked, V::I32),
            (PrimitiveKind::Int64, V::I64(a)) => int_neg!(*a, checked, V::I64),
            (PrimitiveKind::Float32, V::F32(a)) => Folded::Value(V::F32(-a)),
            (PrimitiveKind::Float64, V::F64(a)) => Folded::Value(V::F64(-a)),
            (PrimitiveKind::Decimal, V::Dec(a)) => match a.checked_neg() {
                Some(d) => Folded::Value(V::Dec(d)),
                None => Folded::ArithmeticError,
            },
            _ => Folded::NotConst,
        },
        UnaryOp::Complement => match (kind, v) {
            (PrimitiveKind::Int32, V::I32(a)) => Folded::Value(V::I32(!a)),
            (PrimitiveKind::UInt32, V::U32(a)) => Folded::Value(V::U32(!a)),
            (PrimitiveKind::Int64, V::I64(a)) => Folded::Value(V::I64(!a)),
            (PrimitiveKind::UInt64, V::U64(a)) => Folded::Value(V::U64(!a)),
            _ => Folded::NotConst,
        },
    }
}

/// Fold string concatenation. A null constant operand concatenates as the
/// empty string.
pub fn concat(lhs: &ConstValue, rhs: &ConstValue) -> Option<ConstValue> {
    let side = |v: &ConstValue| match v {
        ConstValue::Str(s) => Some(s.clone()),
        ConstValue::Null => Some(String::new()),
        _ => None,
    };
    Some(ConstValue::Str(side(lhs)? + &side(rhs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_integer_arithmetic_wraps_at_width() {
        let r = binary(
            BinaryOp::Add,
            PrimitiveKind::Int8,
            false,
            &ConstValue::I8(127),
            &ConstValue::I8(1),
        );
        assert_eq!(r, Folded::Value(ConstValue::I8(-128)));
        let r = binary(
            BinaryOp::Multiply,
            PrimitiveKind::UInt64,
            false,
            &ConstValue::U64(u64::MAX),
            &ConstValue::U64(2),
        );
        assert_eq!(r, Folded::Value(ConstValue::U64(u64::MAX - 1)));
    }

    #[test]
    fn checked_overflow_is_an_error() {
        let r = binary(
            BinaryOp::Add,
            PrimitiveKind::Int32,
            true,
            &ConstValue::I32(i32::MAX),
            &ConstValue::I32(1),
        );
        assert_eq!(r, Folded::ArithmeticError);
        let ok = binary(
            BinaryOp::Add,
            PrimitiveKind::Int32,
            true,
            &ConstValue::I32(1),
            &ConstValue::I32(2),
        );
        assert_eq!(ok, Folded::Value(ConstValue::I32(3)));
    }

    #[test]
    fn division_by_zero_is_not_a_constant() {
        for op in [BinaryOp::Divide, BinaryOp::Remainder] {
            for checked in [false, true] {
                let r = binary(
                    op,
                    PrimitiveKind::Int32,
                    checked,
                    &ConstValue::I32(1),
                    &ConstValue::I32(0),
                );
                assert_eq!(r, Folded::NotConst);
            }
        }
        // Floats divide by zero to infinity instead.
        let r = binary(
            BinaryOp::Divide,
            PrimitiveKind::Float64,
            false,
            &ConstValue::F64(1.0),
            &ConstValue::F64(0.0),
        );
        assert_eq!(r, Folded::Value(ConstValue::F64(f64::INFINITY)));
    }

    #[test]
    fn shifts_mask_their_count() {
        let r = shift(BinaryOp::LeftShift, PrimitiveKind::Int32, &ConstValue::I32(1), 33);
        assert_eq!(r, Folded::Value(ConstValue::I32(2)));
        let r = shift(BinaryOp::RightShift, PrimitiveKind::Int64, &ConstValue::I64(-8), 1);
        assert_eq!(r, Folded::Value(ConstValue::I64(-4)));
        let r = shift(
            BinaryOp::RightShift,
            PrimitiveKind::UInt32,
            &ConstValue::U32(0x8000_0000),
            1,
        );
        assert_eq!(r, Folded::Value(ConstValue::U32(0x4000_0000)));
    }

    #[test]
    fn decimal_folds_exactly_or_not_at_all() {
        let one = ConstValue::Dec(Decimal::from_int(1));
        let three = ConstValue::Dec(Decimal::from_int(3));
        let four = ConstValue::Dec(Decimal::from_int(4));
        assert_eq!(
            binary(BinaryOp::Divide, PrimitiveKind::Decimal, false, &one, &four),
            Folded::Value(ConstValue::Dec(Decimal::new(25, 2)))
        );
        assert_eq!(
            binary(BinaryOp::Divide, PrimitiveKind::Decimal, false, &one, &three),
            Folded::NotConst
        );
        let zero = ConstValue::Dec(Decimal::from_int(0));
        assert_eq!(
            binary(BinaryOp::Divide, PrimitiveKind::Decimal, false, &one, &zero),
            Folded::NotConst
        );
    }

    #[test]
    fn negation_of_min_value() {
        assert_eq!(
            unary(
                UnaryOp::Negate,
                PrimitiveKind::Int32,
                false,
                &ConstValue::I32(i32::MIN)
            ),
            Folded::Value(ConstValue::I32(i32::MIN))
        );
        assert_eq!(
            unary(
                UnaryOp::Negate,
                PrimitiveKind::Int32,
                true,
                &ConstValue::I32(i32::MIN)
            ),
            Folded::ArithmeticError
        );
    }

    #[test]
    fn string_concat_treats_null_as_empty() {
        assert_eq!(
            concat(&ConstValue::Str("ab".into()), &ConstValue::Str("cd".into())),
            Some(ConstValue::Str("abcd".into()))
        );
        assert_eq!(
            concat(&ConstValue::Str("ab".into()), &ConstValue::Null),
            Some(ConstValue::Str("ab".into()))
        );
        assert_eq!(concat(&ConstValue::I32(1), &ConstValue::Str("x".into())), None);
    }

    #[test]
    fn comparisons_fold_to_bool() {
        assert_eq!(
            binary(
                BinaryOp::Less,
                PrimitiveKind::UInt64,
                false,
                &ConstValue::U64(1),
                &ConstValue::U64(2)
            ),
            Folded::Value(ConstValue::Bool(true))
        );
        let nan = ConstValue::F64(f64::NAN);
        assert_eq!(
            binary(BinaryOp::Equal, PrimitiveKind::Float64, false, &nan, &nan),
            Folded::Value(ConstValue::Bool(false))
        );
    }
}
