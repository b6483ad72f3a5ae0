//! Primitive numeric widening: the implicit-conversion table and its cost
//! grading.
//!
//! Implicit numeric conversions never lose information: an integer widens
//! only to a strictly wider integer that can represent every value (same
//! signedness, or unsigned into a wider signed), any integer widens to the
//! floating kinds and to decimal, and `float32` widens to `float64`. `char`
//! participates as an unsigned 16-bit source but is never a widening target.
//!
//! Costs grade distance for overload ranking: the nearest wider type is
//! cheapest, signed targets beat unsigned ones from an unsigned source, and
//! leaving the integer domain (float, then decimal) is dearer than staying
//! in it.

use ilex_core::PrimitiveKind;

/// Cost of crossing into `float32`.
const COST_TO_FLOAT32: u32 = 8;
/// Cost of crossing into `float64`.
const COST_TO_FLOAT64: u32 = 9;
/// Cost of crossing into `decimal`.
const COST_TO_DECIMAL: u32 = 10;

/// The cost of the implicit widening from `from` to `to`, or `None` when no
/// implicit conversion exists. Identity is the caller's case; `from == to`
/// reports `None` here.
pub fn widening_cost(from: PrimitiveKind, to: PrimitiveKind) -> Option<u32> {
    use PrimitiveKind::*;
    if from == to || from == Bool || to == Bool || to == Char {
        return None;
    }
    match to {
        Float32 => from.is_integer().then_some(COST_TO_FLOAT32),
        Float64 => match from {
            Float32 => Some(1),
            f if f.is_integer() => Some(COST_TO_FLOAT64),
            _ => None,
        },
        Decimal => from.is_integer().then_some(COST_TO_DECIMAL),
        _ if to.is_integer() && from.is_integer() => {
            // char -> uint16 is the one same-width widening: the value sets
            // are identical.
            if from == Char && to == UInt16 {
                return Some(1);
            }
            if to.bit_width() <= from.bit_width() {
                return None;
            }
            if from.is_signed_integer() && to.is_unsigned_integer() {
                return None;
            }
            let gap = (to.bit_width() - from.bit_width()) / 8;
            // Signed targets rank ahead of unsigned ones at the same width.
            let sign_penalty = u32::from(to.is_unsigned_integer());
            Some(gap + sign_penalty)
        }
        _ => None,
    }
}

/// Whether an implicit widening from `from` to `to` exists.
pub fn is_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    widening_cost(from, to).is_some()
}

/// Whether an explicit numeric conversion exists between two kinds. Any two
/// numeric kinds convert explicitly except that floats do not cast to
/// decimal (the value may have no decimal representation).
pub fn explicit_exists(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == PrimitiveKind::Bool || to == PrimitiveKind::Bool {
        return false;
    }
    if to == PrimitiveKind::Decimal && from.is_float() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use PrimitiveKind::*;

    #[test]
    fn signed_widens_to_wider_signed_only() {
        assert!(is_widening(Int8, Int16));
        assert!(is_widening(Int8, Int64));
        assert!(!is_widening(Int8, UInt16));
        assert!(!is_widening(Int32, UInt32));
        assert!(!is_widening(Int64, Int32));
    }

    #[test]
    fn unsigned_widens_both_ways() {
        assert!(is_widening(UInt8, Int16));
        assert!(is_widening(UInt8, UInt16));
        assert!(is_widening(UInt32, Int64));
        assert!(is_widening(UInt32, UInt64));
        assert!(!is_widening(UInt64, Int64));
    }

    #[test]
    fn char_is_a_source_never_a_target() {
        assert!(is_widening(Char, UInt16));
        assert!(is_widening(Char, Int32));
        assert!(is_widening(Char, UInt64));
        assert!(!is_widening(Char, Int16));
        assert!(!is_widening(UInt16, Char));
        assert!(!is_widening(Int32, Char));
    }

    #[test]
    fn floats_and_decimal() {
        assert!(is_widening(Float32, Float64));
        assert!(!is_widening(Float64, Float32));
        assert!(is_widening(Int64, Float32));
        assert!(is_widening(UInt64, Decimal));
        assert!(!is_widening(Float64, Decimal));
        assert!(!is_widening(Decimal, Float64));
    }

    #[test]
    fn nearer_targets_cost_less() {
        let near = widening_cost(Int8, Int16).unwrap();
        let far = widening_cost(Int8, Int64).unwrap();
        assert!(near < far);
        // Staying integral beats crossing to float, which beats decimal.
        let int = widening_cost(Int32, Int64).unwrap();
        let float = widening_cost(Int32, Float32).unwrap();
        let dec = widening_cost(Int32, Decimal).unwrap();
        assert!(int < float && float < dec);
        // From an unsigned source the signed target ranks first.
        let signed = widening_cost(UInt8, Int16).unwrap();
        let unsigned = widening_cost(UInt8, UInt16).unwrap();
        assert!(signed < unsigned);
    }

    #[test]
    fn explicit_covers_the_numeric_lattice() {
        assert!(explicit_exists(Float64, Int8));
        assert!(explicit_exists(Int64, Char));
        assert!(explicit_exists(Decimal, Float64));
        assert!(!explicit_exists(Float64, Decimal));
        assert!(!explicit_exists(Bool, Int32));
    }
}
