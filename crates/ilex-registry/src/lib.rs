//! Symbol, scope and platform-type providers for the ilex engine.
//!
//! The semantic engine does not own name lookup: a declaration phase
//! registers types and members here, and the engine resolves against that
//! registry plus a per-compilation-unit scope tree.

pub mod entries;
pub mod registry;
pub mod scope;
pub mod signature;

pub use entries::{
    ClassEntry, DelegateEntry, EnumEntry, FieldEntry, GenericInstanceEntry, InterfaceEntry,
    MemberFlags, MethodDef, Param, PointerEntry, PropertyEntry, TypeEntry, op_names,
};
pub use registry::{MemberRef, RegistryError, SymbolRegistry};
pub use scope::{AliasDef, LocalVar, NameResolution, Scope, ScopeId, ScopeTree};
pub use signature::TyPattern;
