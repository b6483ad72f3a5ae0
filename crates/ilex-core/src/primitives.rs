//! Well-known platform types and primitive type codes.
//!
//! The platform-type provider (§6 of the design) hands the engine canonical
//! identities for the primitive/runtime types that conversion tables and
//! built-in operator candidates are keyed on. These identities are reserved
//! constants rather than name hashes: the registry maps whatever surface
//! names a source language uses onto them.

use crate::TypeHash;

/// Identity of the `void` type.
pub const VOID: TypeHash = TypeHash(0x01);
/// Identity of the `bool` type.
pub const BOOL: TypeHash = TypeHash(0x02);
/// Identity of the `char` type (UTF-16 code unit, promotes like a 16-bit unsigned).
pub const CHAR: TypeHash = TypeHash(0x03);
/// Identity of the 8-bit signed integer type.
pub const INT8: TypeHash = TypeHash(0x04);
/// Identity of the 8-bit unsigned integer type.
pub const UINT8: TypeHash = TypeHash(0x05);
/// Identity of the 16-bit signed integer type.
pub const INT16: TypeHash = TypeHash(0x06);
/// Identity of the 16-bit unsigned integer type.
pub const UINT16: TypeHash = TypeHash(0x07);
/// Identity of the 32-bit signed integer type.
pub const INT32: TypeHash = TypeHash(0x08);
/// Identity of the 32-bit unsigned integer type.
pub const UINT32: TypeHash = TypeHash(0x09);
/// Identity of the 64-bit signed integer type.
pub const INT64: TypeHash = TypeHash(0x0a);
/// Identity of the 64-bit unsigned integer type.
pub const UINT64: TypeHash = TypeHash(0x0b);
/// Identity of the 32-bit IEEE float type.
pub const FLOAT32: TypeHash = TypeHash(0x0c);
/// Identity of the 64-bit IEEE float type.
pub const FLOAT64: TypeHash = TypeHash(0x0d);
/// Identity of the 128-bit decimal type.
pub const DECIMAL: TypeHash = TypeHash(0x0e);
/// Identity of the `string` type.
pub const STRING: TypeHash = TypeHash(0x0f);
/// Identity of the root `object` type.
pub const OBJECT: TypeHash = TypeHash(0x10);
/// Identity of the type of the `null` literal.
pub const NULL: TypeHash = TypeHash(0x11);
/// Identity of the abstract delegate base type.
pub const DELEGATE: TypeHash = TypeHash(0x12);
/// Identity standing for an anonymous function whose delegate type is not
/// yet pinned down by context (lambda arguments awaiting inference).
pub const LAMBDA: TypeHash = TypeHash(0x13);
/// Distinguished error-type sentinel. Resolution failures yield this, never
/// an absent type.
pub const ERROR: TypeHash = TypeHash(0xff);

/// The platform's canonical numeric (and promotable) type codes.
///
/// Conversion tables, built-in operator candidates and the constant evaluator
/// all switch on these codes. `Char` is promotable (it behaves as a 16-bit
/// unsigned in arithmetic) but is not itself an arithmetic result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
}

impl PrimitiveKind {
    /// Map a well-known type identity to its primitive kind.
    pub fn of(hash: TypeHash) -> Option<PrimitiveKind> {
        Some(match hash {
            BOOL => PrimitiveKind::Bool,
            CHAR => PrimitiveKind::Char,
            INT8 => PrimitiveKind::Int8,
            UINT8 => PrimitiveKind::UInt8,
            INT16 => PrimitiveKind::Int16,
            UINT16 => PrimitiveKind::UInt16,
            INT32 => PrimitiveKind::Int32,
            UINT32 => PrimitiveKind::UInt32,
            INT64 => PrimitiveKind::Int64,
            UINT64 => PrimitiveKind::UInt64,
            FLOAT32 => PrimitiveKind::Float32,
            FLOAT64 => PrimitiveKind::Float64,
            DECIMAL => PrimitiveKind::Decimal,
            _ => return None,
        })
    }

    /// The type identity for this kind.
    pub fn type_hash(self) -> TypeHash {
        match self {
            PrimitiveKind::Bool => BOOL,
            PrimitiveKind::Char => CHAR,
            PrimitiveKind::Int8 => INT8,
            PrimitiveKind::UInt8 => UINT8,
            PrimitiveKind::Int16 => INT16,
            PrimitiveKind::UInt16 => UINT16,
            PrimitiveKind::Int32 => INT32,
            PrimitiveKind::UInt32 => UINT32,
            PrimitiveKind::Int64 => INT64,
            PrimitiveKind::UInt64 => UINT64,
            PrimitiveKind::Float32 => FLOAT32,
            PrimitiveKind::Float64 => FLOAT64,
            PrimitiveKind::Decimal => DECIMAL,
        }
    }

    /// Whether this kind is a fixed-width integer (char counts: it promotes
    /// as a 16-bit unsigned).
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Char
                | PrimitiveKind::Int8
                | PrimitiveKind::UInt8
                | PrimitiveKind::Int16
                | PrimitiveKind::UInt16
                | PrimitiveKind::Int32
                | PrimitiveKind::UInt32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt64
        )
    }

    /// Whether this kind is a signed integer.
    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    /// Whether this kind is an unsigned integer (char included).
    pub fn is_unsigned_integer(self) -> bool {
        self.is_integer() && !self.is_signed_integer()
    }

    /// Whether this kind is a binary floating-point type.
    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    /// Whether this kind participates in arithmetic at all.
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Bool)
    }

    /// Bit width of an integer kind; floats/decimal/bool report their storage
    /// width.
    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Bool => 8,
            PrimitiveKind::Char | PrimitiveKind::Int16 | PrimitiveKind::UInt16 => 16,
            PrimitiveKind::Int8 | PrimitiveKind::UInt8 => 8,
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Float32 => 32,
            PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::Float64 => 64,
            PrimitiveKind::Decimal => 128,
        }
    }

    /// Size in bytes, used for pointer arithmetic scaling.
    pub fn byte_size(self) -> u32 {
        self.bit_width() / 8
    }

    /// Readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Decimal => "decimal",
        }
    }
}

/// Whether a type identity names a primitive numeric type.
pub fn is_primitive_numeric(hash: TypeHash) -> bool {
    PrimitiveKind::of(hash).is_some_and(|k| k.is_numeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            PrimitiveKind::Bool,
            PrimitiveKind::Char,
            PrimitiveKind::Int8,
            PrimitiveKind::UInt8,
            PrimitiveKind::Int16,
            PrimitiveKind::UInt16,
            PrimitiveKind::Int32,
            PrimitiveKind::UInt32,
            PrimitiveKind::Int64,
            PrimitiveKind::UInt64,
            PrimitiveKind::Float32,
            PrimitiveKind::Float64,
            PrimitiveKind::Decimal,
        ] {
            assert_eq!(PrimitiveKind::of(kind.type_hash()), Some(kind));
        }
    }

    #[test]
    fn char_promotes_as_unsigned_integer() {
        assert!(PrimitiveKind::Char.is_integer());
        assert!(PrimitiveKind::Char.is_unsigned_integer());
        assert!(!PrimitiveKind::Char.is_signed_integer());
        assert_eq!(PrimitiveKind::Char.bit_width(), 16);
    }

    #[test]
    fn bool_is_not_numeric() {
        assert!(!PrimitiveKind::Bool.is_numeric());
        assert!(!is_primitive_numeric(BOOL));
        assert!(is_primitive_numeric(INT32));
        assert!(is_primitive_numeric(DECIMAL));
        assert!(!is_primitive_numeric(STRING));
    }

    #[test]
    fn reserved_identities_are_distinct() {
        let all = [
            VOID, BOOL, CHAR, INT8, UINT8, INT16, UINT16, INT32, UINT32, INT64, UINT64, FLOAT32,
            FLOAT64, DECIMAL, STRING, OBJECT, NULL, DELEGATE, LAMBDA, ERROR,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
