//! The symbol registry: the engine's name/type lookup collaborator.
//!
//! Everything the engine resolves against - types, methods, fields,
//! properties, operator candidates - is registered here up front by the
//! declaration/symbol-table phase, keyed by [`TypeHash`] so lookups are a
//! single map probe.

use rustc_hash::FxHashMap;
use thiserror::Error;

use ilex_core::{DataType, PrimitiveKind, TypeHash, primitives};

use crate::entries::{
    FieldEntry, MethodDef, PointerEntry, PropertyEntry, TypeEntry,
};

/// Registration failures. Lookups never fail with these; only registration
/// does.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The same identity was registered twice.
    #[error("duplicate registration for {name} ({hash:?})")]
    Duplicate {
        /// Readable name of the duplicate.
        name: String,
        /// The clashing identity.
        hash: TypeHash,
    },
}

/// A member found by name on a type.
#[derive(Debug, Clone)]
pub enum MemberRef {
    /// A field.
    Field(TypeHash),
    /// A property.
    Property(TypeHash),
    /// A method group (one or more overloads sharing the name).
    MethodGroup(Vec<TypeHash>),
}

/// The symbol registry.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    methods: FxHashMap<TypeHash, MethodDef>,
    fields: FxHashMap<TypeHash, FieldEntry>,
    properties: FxHashMap<TypeHash, PropertyEntry>,
}

impl SymbolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the platform primitives.
    pub fn with_primitives() -> Self {
        let mut reg = Self::new();
        let prims: &[(TypeHash, &'static str)] = &[
            (primitives::VOID, "void"),
            (primitives::BOOL, "bool"),
            (primitives::CHAR, "char"),
            (primitives::INT8, "int8"),
            (primitives::UINT8, "uint8"),
            (primitives::INT16, "int16"),
            (primitives::UINT16, "uint16"),
            (primitives::INT32, "int32"),
            (primitives::UINT32, "uint32"),
            (primitives::INT64, "int64"),
            (primitives::UINT64, "uint64"),
            (primitives::FLOAT32, "float32"),
            (primitives::FLOAT64, "float64"),
            (primitives::DECIMAL, "decimal"),
            (primitives::STRING, "string"),
            (primitives::OBJECT, "object"),
            (primitives::NULL, "<null>"),
            (primitives::DELEGATE, "delegate"),
        ];
        for &(hash, name) in prims {
            reg.types.insert(
                hash,
                TypeEntry::Primitive {
                    hash,
                    name,
                    kind: PrimitiveKind::of(hash),
                },
            );
        }
        reg
    }

    /// Register a type entry.
    pub fn register_type(&mut self, entry: impl Into<TypeEntry>) -> Result<TypeHash, RegistryError> {
        let entry = entry.into();
        let hash = entry.hash();
        if self.types.contains_key(&hash) {
            return Err(RegistryError::Duplicate {
                name: entry.name(),
                hash,
            });
        }
        self.types.insert(hash, entry);
        Ok(hash)
    }

    /// Register a method and link it to its declaring class, if that class
    /// is registered.
    pub fn register_method(&mut self, def: MethodDef) -> Result<TypeHash, RegistryError> {
        let hash = def.hash;
        if self.methods.contains_key(&hash) {
            return Err(RegistryError::Duplicate {
                name: def.name.clone(),
                hash,
            });
        }
        let declaring = def.declaring_type;
        self.methods.insert(hash, def);
        if let Some(TypeEntry::Class(c)) = self.types.get_mut(&declaring) {
            c.methods.push(hash);
        } else if let Some(TypeEntry::Interface(i)) = self.types.get_mut(&declaring) {
            i.methods.push(hash);
        }
        Ok(hash)
    }

    /// Register a field and link it to its declaring class.
    pub fn register_field(&mut self, field: FieldEntry) -> Result<TypeHash, RegistryError> {
        let hash = field.hash;
        if self.fields.contains_key(&hash) {
            return Err(RegistryError::Duplicate {
                name: field.name.clone(),
                hash,
            });
        }
        let declaring = field.declaring_type;
        self.fields.insert(hash, field);
        if let Some(TypeEntry::Class(c)) = self.types.get_mut(&declaring) {
            c.fields.push(hash);
        }
        Ok(hash)
    }

    /// Register a property and link it to its declaring class.
    pub fn register_property(&mut self, prop: PropertyEntry) -> Result<TypeHash, RegistryError> {
        let hash = prop.hash;
        if self.properties.contains_key(&hash) {
            return Err(RegistryError::Duplicate {
                name: prop.name.clone(),
                hash,
            });
        }
        let declaring = prop.declaring_type;
        self.properties.insert(hash, prop);
        if let Some(TypeEntry::Class(c)) = self.types.get_mut(&declaring) {
            c.properties.push(hash);
        }
        Ok(hash)
    }

    /// Ensure the pointer type for a pointee exists and return its identity.
    pub fn ensure_pointer(&mut self, pointee: DataType) -> TypeHash {
        let hash = TypeHash::pointer_to(pointee.type_hash);
        self.types
            .entry(hash)
            .or_insert(TypeEntry::Pointer(PointerEntry { hash, pointee }));
        hash
    }

    /// Look up a type.
    pub fn get_type(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    /// Look up a method.
    pub fn get_method(&self, hash: TypeHash) -> Option<&MethodDef> {
        self.methods.get(&hash)
    }

    /// Look up a field.
    pub fn get_field(&self, hash: TypeHash) -> Option<&FieldEntry> {
        self.fields.get(&hash)
    }

    /// Look up a property.
    pub fn get_property(&self, hash: TypeHash) -> Option<&PropertyEntry> {
        self.properties.get(&hash)
    }

    /// Readable type name for diagnostics; never fails.
    pub fn type_name(&self, hash: TypeHash) -> String {
        if hash == primitives::ERROR {
            return "<error>".to_string();
        }
        self.get_type(hash)
            .map(|e| e.name())
            .unwrap_or_else(|| format!("{hash:?}"))
    }

    /// The base-class chain of a type, starting at the type itself.
    pub fn base_chain(&self, start: TypeHash) -> Vec<TypeHash> {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(base) = self
            .get_type(current)
            .and_then(TypeEntry::as_class)
            .and_then(|c| c.base)
        {
            // A malformed cyclic hierarchy must not loop resolution.
            if chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// Whether `ty` is `ancestor` or derives from it.
    pub fn is_derived_from(&self, ty: TypeHash, ancestor: TypeHash) -> bool {
        self.base_chain(ty).contains(&ancestor)
    }

    /// Whether `ty` (or a base of it) implements `interface`.
    pub fn implements(&self, ty: TypeHash, interface: TypeHash) -> bool {
        self.base_chain(ty).iter().any(|t| {
            self.get_type(*t)
                .and_then(TypeEntry::as_class)
                .is_some_and(|c| c.interfaces.contains(&interface))
        })
    }

    /// Static operator methods named `op_name` declared on `ty` or its base
    /// classes. Candidates appear most-derived first, in declaration order
    /// within each type; the overload ranker relies on that order for its
    /// documented tie-break.
    pub fn operator_candidates(&self, ty: TypeHash, op_name: &str) -> Vec<TypeHash> {
        let mut out = Vec::new();
        for t in self.base_chain(ty) {
            if let Some(class) = self.get_type(t).and_then(TypeEntry::as_class) {
                for &m in &class.methods {
                    if let Some(def) = self.get_method(m) {
                        if def.is_static() && def.name == op_name {
                            out.push(m);
                        }
                    }
                }
            }
        }
        out
    }

    /// All methods named `name` on `ty` and its base classes, most-derived
    /// first.
    pub fn methods_named(&self, ty: TypeHash, name: &str) -> Vec<TypeHash> {
        let mut out = Vec::new();
        for t in self.base_chain(ty) {
            let method_list = match self.get_type(t) {
                Some(TypeEntry::Class(c)) => &c.methods,
                Some(TypeEntry::Interface(i)) => &i.methods,
                _ => continue,
            };
            for &m in method_list {
                if let Some(def) = self.get_method(m) {
                    if def.name == name {
                        out.push(m);
                    }
                }
            }
        }
        out
    }

    /// Constructors of a class.
    pub fn constructors_of(&self, ty: TypeHash) -> Vec<TypeHash> {
        self.get_type(ty)
            .and_then(TypeEntry::as_class)
            .map(|c| {
                c.methods
                    .iter()
                    .copied()
                    .filter(|m| self.get_method(*m).is_some_and(|d| d.name == ".ctor"))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Indexers (indexed properties) of a type, most-derived first.
    pub fn indexers_of(&self, ty: TypeHash) -> Vec<TypeHash> {
        let mut out = Vec::new();
        for t in self.base_chain(ty) {
            if let Some(class) = self.get_type(t).and_then(TypeEntry::as_class) {
                for &p in &class.properties {
                    if self
                        .get_property(p)
                        .is_some_and(|prop| !prop.index_params.is_empty())
                    {
                        out.push(p);
                    }
                }
            }
        }
        out
    }

    /// Find a member named `name` on `ty`, walking the base chain. Fields
    /// and properties shadow by derivation; methods accumulate into a group.
    pub fn lookup_member(&self, ty: TypeHash, name: &str) -> Option<MemberRef> {
        let mut group = Vec::new();
        for t in self.base_chain(ty) {
            if let Some(class) = self.get_type(t).and_then(TypeEntry::as_class) {
                for &f in &class.fields {
                    if self.get_field(f).is_some_and(|fe| fe.name == name) {
                        return Some(MemberRef::Field(f));
                    }
                }
                for &p in &class.properties {
                    if self
                        .get_property(p)
                        .is_some_and(|pe| pe.name == name && pe.index_params.is_empty())
                    {
                        return Some(MemberRef::Property(p));
                    }
                }
                for &m in &class.methods {
                    if self.get_method(m).is_some_and(|md| md.name == name) {
                        group.push(m);
                    }
                }
            }
        }
        if group.is_empty() {
            None
        } else {
            Some(MemberRef::MethodGroup(group))
        }
    }

    /// Size in bytes of a type when it has a fixed layout the engine knows;
    /// used for pointer arithmetic scaling.
    pub fn byte_size_of(&self, hash: TypeHash) -> Option<u32> {
        match self.get_type(hash)? {
            TypeEntry::Primitive { kind, .. } => kind.map(PrimitiveKind::byte_size),
            TypeEntry::Enum(e) => {
                PrimitiveKind::of(e.underlying).map(PrimitiveKind::byte_size)
            }
            TypeEntry::Pointer(_) => Some(8),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{ClassEntry, MemberFlags, Param, op_names};
    use ilex_core::primitives;

    #[test]
    fn primitives_are_registered() {
        let reg = SymbolRegistry::with_primitives();
        assert!(reg.get_type(primitives::INT32).is_some());
        assert_eq!(reg.type_name(primitives::INT32), "int32");
        assert_eq!(reg.byte_size_of(primitives::INT32), Some(4));
        assert_eq!(reg.byte_size_of(primitives::STRING), None);
    }

    #[test]
    fn duplicate_type_registration_fails() {
        let mut reg = SymbolRegistry::with_primitives();
        reg.register_type(ClassEntry::new("Player")).unwrap();
        let err = reg.register_type(ClassEntry::new("Player")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
    }

    #[test]
    fn base_chain_walks_hierarchy() {
        let mut reg = SymbolRegistry::with_primitives();
        let entity = reg.register_type(ClassEntry::new("Entity")).unwrap();
        let actor = reg
            .register_type(ClassEntry::new("Actor").with_base(entity))
            .unwrap();
        let player = reg
            .register_type(ClassEntry::new("Player").with_base(actor))
            .unwrap();
        assert_eq!(reg.base_chain(player), vec![player, actor, entity]);
        assert!(reg.is_derived_from(player, entity));
        assert!(!reg.is_derived_from(entity, player));
    }

    #[test]
    fn operator_candidates_most_derived_first() {
        let mut reg = SymbolRegistry::with_primitives();
        let base = reg.register_type(ClassEntry::new("Base")).unwrap();
        let derived = reg
            .register_type(ClassEntry::new("Derived").with_base(base))
            .unwrap();
        let b = DataType::simple(base);
        let d = DataType::simple(derived);
        let base_op = reg
            .register_method(MethodDef::operator(
                base,
                op_names::ADDITION,
                vec![Param::new("a", b), Param::new("b", b)],
                b,
            ))
            .unwrap();
        let derived_op = reg
            .register_method(MethodDef::operator(
                derived,
                op_names::ADDITION,
                vec![Param::new("a", d), Param::new("b", d)],
                d,
            ))
            .unwrap();
        let cands = reg.operator_candidates(derived, op_names::ADDITION);
        assert_eq!(cands, vec![derived_op, base_op]);
    }

    #[test]
    fn member_lookup_prefers_fields_and_groups_methods() {
        let mut reg = SymbolRegistry::with_primitives();
        let t = reg.register_type(ClassEntry::new("Widget")).unwrap();
        let int32 = DataType::simple(primitives::INT32);
        reg.register_field(FieldEntry::new(t, "size", int32)).unwrap();
        reg.register_method(MethodDef::new(
            t,
            "resize",
            vec![Param::new("w", int32)],
            DataType::VOID,
        ))
        .unwrap();
        reg.register_method(MethodDef::new(
            t,
            "resize",
            vec![Param::new("w", int32), Param::new("h", int32)],
            DataType::VOID,
        ))
        .unwrap();

        assert!(matches!(reg.lookup_member(t, "size"), Some(MemberRef::Field(_))));
        match reg.lookup_member(t, "resize") {
            Some(MemberRef::MethodGroup(g)) => assert_eq!(g.len(), 2),
            other => panic!("expected method group, got {other:?}"),
        }
        assert!(reg.lookup_member(t, "missing").is_none());
    }

    #[test]
    fn pointer_types_are_interned() {
        let mut reg = SymbolRegistry::with_primitives();
        let p1 = reg.ensure_pointer(DataType::simple(primitives::INT32));
        let p2 = reg.ensure_pointer(DataType::simple(primitives::INT32));
        assert_eq!(p1, p2);
        let entry = reg.get_type(p1).unwrap().as_pointer().unwrap();
        assert_eq!(entry.pointee.type_hash, primitives::INT32);
        assert_eq!(reg.byte_size_of(p1), Some(8));
    }

    #[test]
    fn static_flag_distinguishes_member_kinds() {
        let mut reg = SymbolRegistry::with_primitives();
        let t = reg.register_type(ClassEntry::new("Counter")).unwrap();
        let int32 = DataType::simple(primitives::INT32);
        reg.register_field(
            FieldEntry::new(t, "total", int32).with_flags(MemberFlags::STATIC),
        )
        .unwrap();
        let Some(MemberRef::Field(f)) = reg.lookup_member(t, "total") else {
            panic!("expected field");
        };
        assert!(reg.get_field(f).unwrap().is_static());
    }
}
