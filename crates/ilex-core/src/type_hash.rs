//! Deterministic hash-based identity for types and members.
//!
//! [`TypeHash`] is a 64-bit identity for types, methods, operators, fields and
//! properties. Hashes are computed deterministically from qualified names (and
//! signatures, for methods), so identities can be formed before the entity is
//! registered and are stable across compilation sessions.
//!
//! Derived type identities (pointer types, nullable wrappers, generic
//! instantiations) are computed from their component identities with
//! domain-specific mixing constants, so `T*`, `T?` and `G<T>` never collide
//! with plain type names.
//!
//! Well-known platform primitives use reserved identities (see
//! [`primitives`](crate::primitives)); the symbol registry, not name hashing,
//! is the authority that maps surface names onto them.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constants keeping distinct entity kinds in distinct hash
/// spaces even when names coincide.
pub mod hash_domains {
    /// Domain marker for plain type names.
    pub const TYPE: u64 = 0x51c3a7f09e2b6d84;
    /// Domain marker for method hashes (name + parameter types).
    pub const METHOD: u64 = 0x8d27e4b1f6a09c35;
    /// Domain marker for operator method hashes.
    pub const OPERATOR: u64 = 0x3b94d8c2a1e57f60;
    /// Domain marker for field hashes.
    pub const FIELD: u64 = 0xc65f10e98d3a42b7;
    /// Domain marker for property hashes.
    pub const PROPERTY: u64 = 0x7a08b5d3c29e61f4;
    /// Domain marker for pointer-to-T identities.
    pub const POINTER: u64 = 0xe912c74a5b08d3f6;
    /// Domain marker for nullable-of-T identities.
    pub const NULLABLE: u64 = 0x24d6f081a93c5e7b;
    /// Domain marker for constructed generic instances.
    pub const GENERIC_INSTANCE: u64 = 0xf73b19e0246a8c5d;
    /// Separator mixed between composite hash components.
    pub const SEP: u64 = 0x60a4e82d17f9c3b5;
}

/// A deterministic 64-bit identity for a type or member.
///
/// The same qualified name (or name + signature) always produces the same
/// hash, which lets the engine refer to entities before they are registered
/// and keeps registry lookups to a single map probe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// The empty/invalid identity.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Identity for a type from its qualified name.
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_domains::TYPE))
    }

    /// Identity for a method from declaring type, name and parameter types.
    pub fn method(declaring: TypeHash, name: &str, params: &[TypeHash]) -> Self {
        let mut acc = xxh64(name.as_bytes(), hash_domains::METHOD) ^ declaring.0;
        for (i, p) in params.iter().enumerate() {
            acc = acc
                .rotate_left(7)
                .wrapping_mul(hash_domains::SEP)
                .wrapping_add(p.0)
                .wrapping_add(i as u64 + 1);
        }
        TypeHash(acc)
    }

    /// Identity for an operator method (`op_Addition` and friends).
    pub fn operator(declaring: TypeHash, name: &str, params: &[TypeHash]) -> Self {
        let base = Self::method(declaring, name, params);
        TypeHash(base.0 ^ hash_domains::OPERATOR)
    }

    /// Identity for a field of a declaring type.
    pub fn field(declaring: TypeHash, name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_domains::FIELD) ^ declaring.0)
    }

    /// Identity for a property of a declaring type.
    pub fn property(declaring: TypeHash, name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_domains::PROPERTY) ^ declaring.0)
    }

    /// Identity of the pointer type `T*` for pointee `T`.
    pub fn pointer_to(pointee: TypeHash) -> Self {
        TypeHash(
            pointee
                .0
                .rotate_left(17)
                .wrapping_mul(hash_domains::SEP)
                .wrapping_add(hash_domains::POINTER),
        )
    }

    /// Identity of the nullable wrapper `T?` for wrapped `T`.
    pub fn nullable_of(wrapped: TypeHash) -> Self {
        TypeHash(
            wrapped
                .0
                .rotate_left(29)
                .wrapping_mul(hash_domains::SEP)
                .wrapping_add(hash_domains::NULLABLE),
        )
    }

    /// Identity of a constructed generic instance `G<A1, A2, ...>`.
    pub fn generic_instance(definition: TypeHash, args: &[TypeHash]) -> Self {
        let mut acc = definition.0 ^ hash_domains::GENERIC_INSTANCE;
        for (i, a) in args.iter().enumerate() {
            acc = acc
                .rotate_left(11)
                .wrapping_mul(hash_domains::SEP)
                .wrapping_add(a.0)
                .wrapping_add(i as u64 + 1);
        }
        TypeHash(acc)
    }

    /// Whether this is the empty/invalid identity.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_hash_is_deterministic() {
        assert_eq!(TypeHash::from_name("Player"), TypeHash::from_name("Player"));
        assert_ne!(TypeHash::from_name("Player"), TypeHash::from_name("Enemy"));
    }

    #[test]
    fn method_hash_depends_on_signature() {
        let t = TypeHash::from_name("Player");
        let a = TypeHash::method(t, "foo", &[TypeHash::from_name("int32")]);
        let b = TypeHash::method(t, "foo", &[TypeHash::from_name("float64")]);
        assert_ne!(a, b);
    }

    #[test]
    fn method_hash_depends_on_param_order() {
        let t = TypeHash::from_name("Player");
        let x = TypeHash::from_name("int32");
        let y = TypeHash::from_name("float64");
        assert_ne!(
            TypeHash::method(t, "foo", &[x, y]),
            TypeHash::method(t, "foo", &[y, x])
        );
    }

    #[test]
    fn derived_identities_are_distinct() {
        let t = TypeHash::from_name("int32");
        let ptr = TypeHash::pointer_to(t);
        let opt = TypeHash::nullable_of(t);
        assert_ne!(ptr, t);
        assert_ne!(opt, t);
        assert_ne!(ptr, opt);
        // Nesting distinguishes levels.
        assert_ne!(TypeHash::pointer_to(ptr), ptr);
    }

    #[test]
    fn generic_instance_depends_on_args() {
        let list = TypeHash::from_name("List");
        let a = TypeHash::generic_instance(list, &[TypeHash::from_name("int32")]);
        let b = TypeHash::generic_instance(list, &[TypeHash::from_name("string")]);
        assert_ne!(a, b);
        assert_ne!(a, list);
    }

    #[test]
    fn operator_and_method_domains_differ() {
        let t = TypeHash::from_name("Vec2");
        let params = [t, t];
        assert_ne!(
            TypeHash::method(t, "op_Addition", &params),
            TypeHash::operator(t, "op_Addition", &params)
        );
    }
}
