//! `DataType` - a complete compile-time type reference.
//!
//! A `DataType` pairs a base-type identity with the modifiers that matter to
//! expression analysis: the nullable wrapper and by-reference passing. It is
//! `Copy` so types flow through resolution without allocation; everything
//! structural about a type (base class, interfaces, pointee, generic
//! arguments) lives in the symbol registry, looked up by hash.
//!
//! There is no "absent" type. Resolution failures produce
//! [`DataType::ERROR`], a distinguished sentinel that every downstream
//! consumer treats as already-reported.

use std::fmt;

use crate::{TypeHash, primitives};

/// A complete type reference: base identity plus modifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    /// The base type identity.
    pub type_hash: TypeHash,
    /// Whether the type is wrapped in the nullable wrapper (`T?`).
    pub nullable: bool,
    /// Whether the value is passed by reference (assignment targets,
    /// `ref`/`out` parameters).
    pub by_ref: bool,
}

impl DataType {
    /// The distinguished error-type sentinel.
    pub const ERROR: DataType = DataType::simple(primitives::ERROR);

    /// The `void` type.
    pub const VOID: DataType = DataType::simple(primitives::VOID);

    /// The `bool` type.
    pub const BOOL: DataType = DataType::simple(primitives::BOOL);

    /// The type of the `null` literal.
    pub const NULL: DataType = DataType::simple(primitives::NULL);

    /// The `string` type.
    pub const STRING: DataType = DataType::simple(primitives::STRING);

    /// The root `object` type.
    pub const OBJECT: DataType = DataType::simple(primitives::OBJECT);

    /// A plain type with no modifiers.
    #[inline]
    pub const fn simple(type_hash: TypeHash) -> Self {
        Self {
            type_hash,
            nullable: false,
            by_ref: false,
        }
    }

    /// The nullable wrapper around this type.
    #[inline]
    pub const fn as_nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// This type passed by reference.
    #[inline]
    pub const fn as_by_ref(self) -> Self {
        Self {
            by_ref: true,
            ..self
        }
    }

    /// Strip the by-ref modifier (the type of the referenced value).
    #[inline]
    pub const fn deref(self) -> Self {
        Self {
            by_ref: false,
            ..self
        }
    }

    /// Strip the nullable wrapper, yielding the wrapped type.
    #[inline]
    pub const fn unwrap_nullable(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    /// Whether this is the error-type sentinel.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.type_hash == primitives::ERROR
    }

    /// Whether this is the type of the `null` literal.
    #[inline]
    pub fn is_null_literal(&self) -> bool {
        self.type_hash == primitives::NULL
    }

    /// Whether this is `void`.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.type_hash == primitives::VOID
    }

    /// Whether two types refer to the same base type ignoring modifiers.
    #[inline]
    pub fn same_base(&self, other: &DataType) -> bool {
        self.type_hash == other.type_hash
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataType({:?}", self.type_hash)?;
        if self.nullable {
            write!(f, "?")?;
        }
        if self.by_ref {
            write!(f, "&")?;
        }
        write!(f, ")")
    }
}
