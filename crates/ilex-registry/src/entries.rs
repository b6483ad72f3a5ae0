//! Type and member entries stored in the symbol registry.
//!
//! Entries are the registry-side description of everything the engine can
//! name: classes with their base chain and members, interfaces, enums with
//! their underlying type, pointer types, delegates, constructed generic
//! instances, and the primitives supplied by the platform-type provider.
//!
//! Failure never hides behind sentinel objects here: lookups return `Option`
//! and members that could not be resolved simply are not registered.

use bitflags::bitflags;
use ilex_core::{ConstValue, DataType, PrimitiveKind, Span, TypeHash};

use crate::signature::TyPattern;

bitflags! {
    /// Modifier flags shared by members.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemberFlags: u16 {
        /// Static member (no receiver).
        const STATIC = 1 << 0;
        /// Readonly field: assignable only inside a declaring-type constructor.
        const READONLY = 1 << 1;
        /// Virtual method.
        const VIRTUAL = 1 << 2;
        /// Abstract member.
        const ABSTRACT = 1 << 3;
        /// Member is not accessible outside its declaring assembly/type.
        const INACCESSIBLE = 1 << 4;
    }
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared type. For generic methods this may mention type parameters.
    pub ty: TyPattern,
    /// Default value substituted when the argument is omitted.
    pub default_value: Option<ConstValue>,
    /// Whether this is a trailing parameter-array (`params T[]`) parameter.
    pub is_param_array: bool,
}

impl Param {
    /// A plain parameter of a concrete type.
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty: TyPattern::Exact(ty),
            default_value: None,
            is_param_array: false,
        }
    }

    /// A parameter with a declared pattern type (generic methods).
    pub fn patterned(name: impl Into<String>, ty: TyPattern) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
            is_param_array: false,
        }
    }

    /// Attach a default value.
    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark as the trailing parameter-array parameter.
    pub fn as_param_array(mut self) -> Self {
        self.is_param_array = true;
        self
    }
}

/// A method, constructor, operator method, or indexer accessor.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Identity.
    pub hash: TypeHash,
    /// Name (`Add`, `op_Addition`, `.ctor`, ...).
    pub name: String,
    /// Declaring type.
    pub declaring_type: TypeHash,
    /// Ordered parameters.
    pub params: Vec<Param>,
    /// Return type.
    pub return_type: TyPattern,
    /// Generic type parameter names; empty for non-generic methods.
    pub type_params: Vec<String>,
    /// Modifier flags.
    pub flags: MemberFlags,
    /// Declaration site, used as a related location in diagnostics.
    pub span: Span,
}

impl MethodDef {
    /// A non-generic method definition; the hash is derived from the
    /// declaring type, name and parameter types.
    pub fn new(
        declaring_type: TypeHash,
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DataType,
    ) -> Self {
        let name = name.into();
        let param_hashes: Vec<TypeHash> = params
            .iter()
            .map(|p| p.ty.as_exact().map(|t| t.type_hash).unwrap_or(TypeHash::EMPTY))
            .collect();
        let hash = TypeHash::method(declaring_type, &name, &param_hashes);
        Self {
            hash,
            name,
            declaring_type,
            params,
            return_type: TyPattern::Exact(return_type),
            type_params: Vec::new(),
            flags: MemberFlags::empty(),
            span: Span::default(),
        }
    }

    /// A static operator method (`op_Addition` and friends).
    pub fn operator(
        declaring_type: TypeHash,
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DataType,
    ) -> Self {
        let mut def = Self::new(declaring_type, name, params, return_type);
        def.hash = TypeHash(def.hash.0 ^ ilex_core::type_hash::hash_domains::OPERATOR);
        def.flags |= MemberFlags::STATIC;
        def
    }

    /// A generic method: parameter and return types may be patterns over the
    /// given type parameters.
    pub fn generic(
        declaring_type: TypeHash,
        name: impl Into<String>,
        type_params: Vec<String>,
        params: Vec<Param>,
        return_type: TyPattern,
    ) -> Self {
        let name = name.into();
        let param_hashes: Vec<TypeHash> = params.iter().map(|p| p.ty.shape_hash()).collect();
        let hash = TypeHash::method(declaring_type, &name, &param_hashes);
        Self {
            hash,
            name,
            declaring_type,
            params,
            return_type,
            type_params,
            flags: MemberFlags::empty(),
            span: Span::default(),
        }
    }

    /// Builder-style flag application.
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Builder-style declaration span.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether this method requires no receiver.
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// Whether this method has generic type parameters.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Number of parameters that must be supplied (no default, not the
    /// parameter array).
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.default_value.is_none() && !p.is_param_array)
            .count()
    }

    /// The trailing parameter-array parameter, if declared.
    pub fn param_array(&self) -> Option<&Param> {
        self.params.last().filter(|p| p.is_param_array)
    }
}

/// A field.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Field name.
    pub name: String,
    /// Declaring type.
    pub declaring_type: TypeHash,
    /// Field type.
    pub ty: DataType,
    /// Modifier flags.
    pub flags: MemberFlags,
    /// Declaration site.
    pub span: Span,
}

impl FieldEntry {
    /// A plain instance field.
    pub fn new(declaring_type: TypeHash, name: impl Into<String>, ty: DataType) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::field(declaring_type, &name),
            name,
            declaring_type,
            ty,
            flags: MemberFlags::empty(),
            span: Span::default(),
        }
    }

    /// Builder-style flag application.
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether the field is readonly.
    pub fn is_readonly(&self) -> bool {
        self.flags.contains(MemberFlags::READONLY)
    }

    /// Whether the field is static.
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

/// A property (or indexer, when `index_params` is non-empty).
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Property name.
    pub name: String,
    /// Declaring type.
    pub declaring_type: TypeHash,
    /// Property value type.
    pub ty: DataType,
    /// Indexer parameter types; empty for plain properties.
    pub index_params: Vec<DataType>,
    /// Whether a getter exists.
    pub has_getter: bool,
    /// Whether a setter exists.
    pub has_setter: bool,
    /// Modifier flags.
    pub flags: MemberFlags,
    /// Declaration site.
    pub span: Span,
}

impl PropertyEntry {
    /// A read-write instance property.
    pub fn new(declaring_type: TypeHash, name: impl Into<String>, ty: DataType) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::property(declaring_type, &name),
            name,
            declaring_type,
            ty,
            index_params: Vec::new(),
            has_getter: true,
            has_setter: true,
            flags: MemberFlags::empty(),
            span: Span::default(),
        }
    }

    /// Remove the setter (read-only property).
    pub fn getter_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    /// Builder-style flag application.
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether the property is static.
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

/// A class (or struct: value-ness does not matter to expression analysis
/// beyond conversions, which key off the base chain).
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Qualified name.
    pub name: String,
    /// Base class, if any.
    pub base: Option<TypeHash>,
    /// Implemented interfaces.
    pub interfaces: Vec<TypeHash>,
    /// Member identities, in declaration order.
    pub fields: Vec<TypeHash>,
    /// Properties and indexers, in declaration order.
    pub properties: Vec<TypeHash>,
    /// Methods (including constructors and operators), in declaration order.
    pub methods: Vec<TypeHash>,
}

impl ClassEntry {
    /// A class with no base and no members yet.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the base class.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented interface.
    pub fn with_interface(mut self, interface: TypeHash) -> Self {
        self.interfaces.push(interface);
        self
    }
}

/// An interface.
#[derive(Debug, Clone)]
pub struct InterfaceEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Qualified name.
    pub name: String,
    /// Extended interfaces.
    pub extends: Vec<TypeHash>,
    /// Method identities.
    pub methods: Vec<TypeHash>,
}

impl InterfaceEntry {
    /// An interface with no members yet.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            extends: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// An enum with a fixed underlying integer type.
#[derive(Debug, Clone)]
pub struct EnumEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Qualified name.
    pub name: String,
    /// Underlying integer type.
    pub underlying: TypeHash,
    /// Named members with their constant values (at the underlying kind).
    pub members: Vec<(String, ConstValue)>,
}

impl EnumEntry {
    /// An enum over `int32` by default.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            underlying: ilex_core::primitives::INT32,
            members: Vec::new(),
        }
    }

    /// Set the underlying integer type.
    pub fn with_underlying(mut self, underlying: TypeHash) -> Self {
        self.underlying = underlying;
        self
    }

    /// Add a member.
    pub fn with_member(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.members.push((name.into(), value));
        self
    }
}

/// A pointer type `T*`.
#[derive(Debug, Clone)]
pub struct PointerEntry {
    /// Identity (derived from the pointee).
    pub hash: TypeHash,
    /// The pointed-to type.
    pub pointee: DataType,
}

/// A delegate type with a fixed signature.
#[derive(Debug, Clone)]
pub struct DelegateEntry {
    /// Identity.
    pub hash: TypeHash,
    /// Qualified name.
    pub name: String,
    /// Parameter types.
    pub params: Vec<DataType>,
    /// Return type.
    pub return_type: DataType,
}

impl DelegateEntry {
    /// A delegate from a name and signature.
    pub fn new(name: impl Into<String>, params: Vec<DataType>, return_type: DataType) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            params,
            return_type,
        }
    }
}

/// A constructed generic instance `G<A1, ...>`.
#[derive(Debug, Clone)]
pub struct GenericInstanceEntry {
    /// Identity (derived from definition + arguments).
    pub hash: TypeHash,
    /// The generic definition.
    pub definition: TypeHash,
    /// The type arguments, in order.
    pub args: Vec<DataType>,
}

impl GenericInstanceEntry {
    /// Construct the instance entry for `definition<args...>`.
    pub fn new(definition: TypeHash, args: Vec<DataType>) -> Self {
        let arg_hashes: Vec<TypeHash> = args.iter().map(|a| a.type_hash).collect();
        Self {
            hash: TypeHash::generic_instance(definition, &arg_hashes),
            definition,
            args,
        }
    }
}

/// A registered type.
#[derive(Debug, Clone)]
pub enum TypeEntry {
    /// A platform primitive.
    Primitive {
        /// Identity.
        hash: TypeHash,
        /// Canonical name.
        name: &'static str,
        /// Primitive kind, when numeric/promotable.
        kind: Option<PrimitiveKind>,
    },
    /// A class or struct.
    Class(ClassEntry),
    /// An interface.
    Interface(InterfaceEntry),
    /// An enum.
    Enum(EnumEntry),
    /// A pointer type.
    Pointer(PointerEntry),
    /// A delegate type.
    Delegate(DelegateEntry),
    /// A constructed generic instance.
    GenericInstance(GenericInstanceEntry),
}

impl TypeEntry {
    /// This entry's identity.
    pub fn hash(&self) -> TypeHash {
        match self {
            TypeEntry::Primitive { hash, .. } => *hash,
            TypeEntry::Class(c) => c.hash,
            TypeEntry::Interface(i) => i.hash,
            TypeEntry::Enum(e) => e.hash,
            TypeEntry::Pointer(p) => p.hash,
            TypeEntry::Delegate(d) => d.hash,
            TypeEntry::GenericInstance(g) => g.hash,
        }
    }

    /// Readable name for diagnostics.
    pub fn name(&self) -> String {
        match self {
            TypeEntry::Primitive { name, .. } => (*name).to_string(),
            TypeEntry::Class(c) => c.name.clone(),
            TypeEntry::Interface(i) => i.name.clone(),
            TypeEntry::Enum(e) => e.name.clone(),
            TypeEntry::Pointer(p) => format!("{:?}*", p.pointee.type_hash),
            TypeEntry::Delegate(d) => d.name.clone(),
            TypeEntry::GenericInstance(g) => format!("{:?}<...>", g.definition),
        }
    }

    /// View as class.
    pub fn as_class(&self) -> Option<&ClassEntry> {
        match self {
            TypeEntry::Class(c) => Some(c),
            _ => None,
        }
    }

    /// View as interface.
    pub fn as_interface(&self) -> Option<&InterfaceEntry> {
        match self {
            TypeEntry::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// View as enum.
    pub fn as_enum(&self) -> Option<&EnumEntry> {
        match self {
            TypeEntry::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// View as pointer.
    pub fn as_pointer(&self) -> Option<&PointerEntry> {
        match self {
            TypeEntry::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// View as delegate.
    pub fn as_delegate(&self) -> Option<&DelegateEntry> {
        match self {
            TypeEntry::Delegate(d) => Some(d),
            _ => None,
        }
    }

    /// View as generic instance.
    pub fn as_generic_instance(&self) -> Option<&GenericInstanceEntry> {
        match self {
            TypeEntry::GenericInstance(g) => Some(g),
            _ => None,
        }
    }
}

impl From<ClassEntry> for TypeEntry {
    fn from(c: ClassEntry) -> Self {
        TypeEntry::Class(c)
    }
}
impl From<InterfaceEntry> for TypeEntry {
    fn from(i: InterfaceEntry) -> Self {
        TypeEntry::Interface(i)
    }
}
impl From<EnumEntry> for TypeEntry {
    fn from(e: EnumEntry) -> Self {
        TypeEntry::Enum(e)
    }
}
impl From<DelegateEntry> for TypeEntry {
    fn from(d: DelegateEntry) -> Self {
        TypeEntry::Delegate(d)
    }
}
impl From<GenericInstanceEntry> for TypeEntry {
    fn from(g: GenericInstanceEntry) -> Self {
        TypeEntry::GenericInstance(g)
    }
}

/// Canonical operator method names, following the runtime's `op_*` scheme.
pub mod op_names {
    pub const ADDITION: &str = "op_Addition";
    pub const SUBTRACTION: &str = "op_Subtraction";
    pub const MULTIPLY: &str = "op_Multiply";
    pub const DIVISION: &str = "op_Division";
    pub const MODULUS: &str = "op_Modulus";
    pub const BITWISE_AND: &str = "op_BitwiseAnd";
    pub const BITWISE_OR: &str = "op_BitwiseOr";
    pub const EXCLUSIVE_OR: &str = "op_ExclusiveOr";
    pub const LEFT_SHIFT: &str = "op_LeftShift";
    pub const RIGHT_SHIFT: &str = "op_RightShift";
    pub const EQUALITY: &str = "op_Equality";
    pub const INEQUALITY: &str = "op_Inequality";
    pub const LESS_THAN: &str = "op_LessThan";
    pub const LESS_THAN_OR_EQUAL: &str = "op_LessThanOrEqual";
    pub const GREATER_THAN: &str = "op_GreaterThan";
    pub const GREATER_THAN_OR_EQUAL: &str = "op_GreaterThanOrEqual";
    pub const UNARY_NEGATION: &str = "op_UnaryNegation";
    pub const UNARY_PLUS: &str = "op_UnaryPlus";
    pub const LOGICAL_NOT: &str = "op_LogicalNot";
    pub const ONES_COMPLEMENT: &str = "op_OnesComplement";
    pub const TRUE: &str = "op_True";
    pub const FALSE: &str = "op_False";
    pub const IMPLICIT: &str = "op_Implicit";
    pub const EXPLICIT: &str = "op_Explicit";
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::primitives;

    #[test]
    fn method_hash_distinguishes_overloads() {
        let t = TypeHash::from_name("Calc");
        let a = MethodDef::new(
            t,
            "add",
            vec![Param::new("x", DataType::simple(primitives::INT32))],
            DataType::simple(primitives::INT32),
        );
        let b = MethodDef::new(
            t,
            "add",
            vec![Param::new("x", DataType::simple(primitives::FLOAT64))],
            DataType::simple(primitives::FLOAT64),
        );
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn required_params_ignores_defaults_and_param_array() {
        let t = TypeHash::from_name("Calc");
        let def = MethodDef::new(
            t,
            "f",
            vec![
                Param::new("a", DataType::simple(primitives::INT32)),
                Param::new("b", DataType::simple(primitives::INT32))
                    .with_default(ConstValue::I32(10)),
                Param::new("rest", DataType::simple(primitives::INT32)).as_param_array(),
            ],
            DataType::VOID,
        );
        assert_eq!(def.required_params(), 1);
        assert!(def.param_array().is_some());
    }

    #[test]
    fn readonly_flag() {
        let t = TypeHash::from_name("Config");
        let field = FieldEntry::new(t, "limit", DataType::simple(primitives::INT32))
            .with_flags(MemberFlags::READONLY);
        assert!(field.is_readonly());
        assert!(!field.is_static());
    }

    #[test]
    fn operator_def_is_static_and_distinct_from_method() {
        let t = TypeHash::from_name("Vec2");
        let params = || {
            vec![
                Param::new("a", DataType::simple(t)),
                Param::new("b", DataType::simple(t)),
            ]
        };
        let op = MethodDef::operator(t, op_names::ADDITION, params(), DataType::simple(t));
        let plain = MethodDef::new(t, op_names::ADDITION, params(), DataType::simple(t));
        assert!(op.is_static());
        assert_ne!(op.hash, plain.hash);
    }
}
