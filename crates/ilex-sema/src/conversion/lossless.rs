//! Losslessness check for integer conversions.

use ilex_core::{ConstValue, PrimitiveKind};

/// Whether converting an integer value of kind `from` to kind `to` can
/// never lose information.
///
/// Without a known value this demands matching sign categories and a target
/// at least as wide (unsigned also fits a strictly wider signed target).
/// With a statically-known value the ranges are checked directly, so a
/// constant may cross sign categories when its value provably fits.
pub fn integer_conversion_is_lossless(
    from: PrimitiveKind,
    to: PrimitiveKind,
    value: Option<&ConstValue>,
) -> bool {
    if !from.is_integer() || !to.is_integer() {
        return false;
    }
    if from == to {
        return true;
    }
    if let Some(v) = value {
        return v.fits_in(to);
    }
    if from.is_unsigned_integer() {
        if to.is_unsigned_integer() {
            to.bit_width() >= from.bit_width()
        } else {
            to.bit_width() > from.bit_width()
        }
    } else {
        to.is_signed_integer() && to.bit_width() >= from.bit_width()
    }
}
