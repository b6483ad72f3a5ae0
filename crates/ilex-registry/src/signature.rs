//! Structural parameter types for generic methods.
//!
//! A generic method's declared parameter types cannot be plain [`DataType`]s:
//! they mention the method's own type parameters, possibly nested inside
//! constructed generics or function shapes. [`TyPattern`] is that structural
//! form. Unification of patterns against call-site argument types lives in
//! the semantic engine; this module only defines the shape and substitution.

use ilex_core::{DataType, TypeHash, primitives};

/// A declared type that may mention generic method type parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TyPattern {
    /// A concrete type.
    Exact(DataType),
    /// The method's type parameter at this index.
    Param(u16),
    /// The nullable wrapper over a pattern.
    Nullable(Box<TyPattern>),
    /// A constructed generic type `definition<args...>`.
    Instance {
        /// The generic definition's identity.
        definition: TypeHash,
        /// Argument patterns, in order.
        args: Vec<TyPattern>,
    },
    /// A function shape (delegate signature): used for lambda-typed
    /// parameters such as `Func<T, R>`-style converters.
    Fn {
        /// Parameter patterns.
        params: Vec<TyPattern>,
        /// Return pattern.
        ret: Box<TyPattern>,
    },
}

impl TyPattern {
    /// View as a concrete type, when the pattern mentions no type parameters
    /// at the top level.
    pub fn as_exact(&self) -> Option<DataType> {
        match self {
            TyPattern::Exact(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Whether the pattern mentions any type parameter.
    pub fn is_open(&self) -> bool {
        match self {
            TyPattern::Exact(_) => false,
            TyPattern::Param(_) => true,
            TyPattern::Nullable(inner) => inner.is_open(),
            TyPattern::Instance { args, .. } => args.iter().any(TyPattern::is_open),
            TyPattern::Fn { params, ret } => {
                params.iter().any(TyPattern::is_open) || ret.is_open()
            }
        }
    }

    /// A deterministic hash of the pattern's shape, used to give generic
    /// method definitions stable identities before instantiation.
    pub fn shape_hash(&self) -> TypeHash {
        match self {
            TyPattern::Exact(dt) => dt.type_hash,
            TyPattern::Param(i) => TypeHash(0x9e37_79b9_7f4a_7c15 ^ (*i as u64 + 1)),
            TyPattern::Nullable(inner) => TypeHash::nullable_of(inner.shape_hash()),
            TyPattern::Instance { definition, args } => {
                let arg_hashes: Vec<TypeHash> = args.iter().map(TyPattern::shape_hash).collect();
                TypeHash::generic_instance(*definition, &arg_hashes)
            }
            TyPattern::Fn { params, ret } => {
                let mut hashes: Vec<TypeHash> = params.iter().map(TyPattern::shape_hash).collect();
                hashes.push(ret.shape_hash());
                TypeHash::generic_instance(primitives::DELEGATE, &hashes)
            }
        }
    }

    /// Substitute inferred type arguments into the pattern, producing a
    /// concrete type. Fails when a mentioned type parameter is unresolved.
    pub fn substitute(&self, args: &[Option<DataType>]) -> Option<DataType> {
        match self {
            TyPattern::Exact(dt) => Some(*dt),
            TyPattern::Param(i) => args.get(*i as usize).copied().flatten(),
            TyPattern::Nullable(inner) => Some(inner.substitute(args)?.as_nullable()),
            TyPattern::Instance { definition, args: pattern_args } => {
                let mut hashes = Vec::with_capacity(pattern_args.len());
                for a in pattern_args {
                    hashes.push(a.substitute(args)?.type_hash);
                }
                Some(DataType::simple(TypeHash::generic_instance(
                    *definition,
                    &hashes,
                )))
            }
            TyPattern::Fn { params, ret } => {
                let mut hashes = Vec::with_capacity(params.len() + 1);
                for p in params {
                    hashes.push(p.substitute(args)?.type_hash);
                }
                hashes.push(ret.substitute(args)?.type_hash);
                Some(DataType::simple(TypeHash::generic_instance(
                    primitives::DELEGATE,
                    &hashes,
                )))
            }
        }
    }
}
