//! Conversion classification: what it takes to view a value of one type as
//! another.
//!
//! Every query returns a [`Conversion`] describing the kind of coercion and
//! a cost used by overload ranking: cheaper means closer. The implicit
//! ladder, cheapest first, is identity, numeric widening, reference upcast,
//! provably-fitting constants, boxing, then user-defined operators; nullable
//! lifting adds a small surcharge on top of the conversion it wraps.
//! Explicit casts additionally unlock narrowing, downcasts,
//! unwrapping, enum and pointer reinterpretation, and `op_Explicit`.
//!
//! Conversions involving the error sentinel always succeed silently: the
//! failure that produced the sentinel was already reported.

pub mod lossless;
pub mod primitive;
pub mod user_defined;

use ilex_core::{ConstValue, DataType, PrimitiveKind, TypeHash, primitives};
use ilex_registry::TypeEntry;

use crate::context::AnalysisContext;

pub(crate) const COST_IDENTITY: u32 = 0;
pub(crate) const COST_NULL: u32 = 1;
pub(crate) const COST_LIFT: u32 = 1;
// Ranks below every widening (those top out at the decimal crossing):
// a fitting constant must never beat a genuine numeric promotion.
pub(crate) const COST_CONST_FIT: u32 = 12;
pub(crate) const COST_UPCAST_BASE: u32 = 3;
pub(crate) const COST_INTERFACE: u32 = 5;
pub(crate) const COST_BOX: u32 = 14;
pub(crate) const COST_USER: u32 = 20;
pub(crate) const COST_EXPLICIT: u32 = 24;

/// How a conversion is performed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    /// Same type; nothing to do.
    Identity,
    /// One side is the error sentinel; the conversion is vacuous.
    ErrorSuppressed,
    /// Lossless numeric widening.
    NumericWidening {
        /// Source kind.
        from: PrimitiveKind,
        /// Target kind.
        to: PrimitiveKind,
    },
    /// Potentially lossy numeric conversion; explicit casts only.
    NumericNarrowing {
        /// Source kind.
        from: PrimitiveKind,
        /// Target kind.
        to: PrimitiveKind,
    },
    /// A compile-time constant that provably fits a narrower integer kind.
    ConstantNarrowing {
        /// Target kind.
        to: PrimitiveKind,
    },
    /// Derived-to-base or class-to-implemented-interface reference view.
    ReferenceUpcast,
    /// Base-to-derived or interface-to-class view; explicit casts only.
    ReferenceDowncast,
    /// Value type viewed as `object`.
    Boxing,
    /// `object` viewed as a value type; explicit casts only.
    Unboxing,
    /// Enum viewed at a numeric kind; explicit casts only.
    EnumToNumeric,
    /// Numeric (or another enum) viewed as an enum; explicit casts only.
    NumericToEnum,
    /// The `null` literal taking on a nullable, reference or pointer type.
    NullLiteral,
    /// Lifting over the nullable wrapper: the inner conversion applies to
    /// the wrapped value, null passes through.
    Nullable {
        /// Conversion between the unwrapped types.
        inner: Box<Conversion>,
    },
    /// Unwrapping `T?` to `T`; explicit casts only, faults on null at
    /// runtime.
    NullableUnwrap {
        /// Conversion applied after the unwrap.
        inner: Box<Conversion>,
    },
    /// A user-declared `op_Implicit`/`op_Explicit` method.
    UserDefined {
        /// The operator method.
        method: TypeHash,
        /// Whether the operator is lifted over nullable operands.
        lifted: bool,
    },
    /// Pointer reinterpretation; explicit casts only.
    PointerReinterpret,
}

/// A classified conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// How the value is coerced.
    pub kind: ConversionKind,
    /// Ranking cost; lower is a closer match.
    pub cost: u32,
    /// Whether the conversion applies without a cast.
    pub is_implicit: bool,
}

impl Conversion {
    fn implicit_kind(kind: ConversionKind, cost: u32) -> Self {
        Self {
            kind,
            cost,
            is_implicit: true,
        }
    }

    fn explicit_kind(kind: ConversionKind, cost: u32) -> Self {
        Self {
            kind,
            cost,
            is_implicit: false,
        }
    }

    /// The identity conversion.
    pub fn identity() -> Self {
        Self::implicit_kind(ConversionKind::Identity, COST_IDENTITY)
    }

    /// Whether this is the identity conversion.
    pub fn is_identity(&self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }
}

/// Find an implicit conversion from `source` to `target`. A known constant
/// value of the source expression widens what is allowed: a constant that
/// provably fits a narrower integer kind converts implicitly.
pub fn implicit(
    ctx: &AnalysisContext,
    source: DataType,
    value: Option<&ConstValue>,
    target: DataType,
) -> Option<Conversion> {
    standard_implicit(ctx, source, value, target)
        .or_else(|| user_defined::find_implicit(ctx, source, target))
}

/// Find a conversion usable under an explicit cast. Anything implicit
/// qualifies; casts additionally unlock the lossy and reinterpreting forms.
pub fn explicit(
    ctx: &AnalysisContext,
    source: DataType,
    value: Option<&ConstValue>,
    target: DataType,
) -> Option<Conversion> {
    if let Some(conv) = implicit(ctx, source, value, target) {
        return Some(conv);
    }
    standard_explicit(ctx, source, target).or_else(|| user_defined::find_explicit(ctx, source, target))
}

/// Implicit conversions excluding user-defined operators. User-defined
/// conversion lookup composes its operand adjustments from these, which
/// keeps the search from recursing through other user-defined operators.
pub(crate) fn standard_implicit(
    ctx: &AnalysisContext,
    source: DataType,
    value: Option<&ConstValue>,
    target: DataType,
) -> Option<Conversion> {
    if source.is_error() || target.is_error() {
        return Some(Conversion::implicit_kind(
            ConversionKind::ErrorSuppressed,
            COST_IDENTITY,
        ));
    }
    let source = source.deref();
    let target = target.deref();
    if source == target {
        return Some(Conversion::identity());
    }
    if source.is_null_literal() {
        let ok = target.nullable
            || ctx.is_reference_type(target.type_hash)
            || is_pointer(ctx, target.type_hash);
        return ok.then(|| Conversion::implicit_kind(ConversionKind::NullLiteral, COST_NULL));
    }
    if source.type_hash == primitives::LAMBDA {
        // Anonymous functions convert only where the call machinery can see
        // the node itself.
        return None;
    }
    if target.nullable {
        let t0 = target.unwrap_nullable();
        let (s0, v) = if source.nullable {
            (source.unwrap_nullable(), None)
        } else {
            (source, value)
        };
        let inner = if s0 == t0 {
            Conversion::identity()
        } else {
            plain_implicit(ctx, s0, v, t0)?
        };
        let cost = inner.cost + COST_LIFT;
        return Some(Conversion::implicit_kind(
            ConversionKind::Nullable {
                inner: Box::new(inner),
            },
            cost,
        ));
    }
    if source.nullable {
        // The only implicit way out of T? without the target also being
        // nullable is boxing to object.
        if target.type_hash == primitives::OBJECT {
            return Some(Conversion::implicit_kind(
                ConversionKind::Boxing,
                COST_BOX + 1,
            ));
        }
        return None;
    }
    plain_implicit(ctx, source, value, target)
}

/// Implicit conversions between plain (non-nullable) types.
fn plain_implicit(
    ctx: &AnalysisContext,
    source: DataType,
    value: Option<&ConstValue>,
    target: DataType,
) -> Option<Conversion> {
    if let (Some(from), Some(to)) = (
        PrimitiveKind::of(source.type_hash),
        PrimitiveKind::of(target.type_hash),
    ) {
        if let Some(cost) = primitive::widening_cost(from, to) {
            return Some(Conversion::implicit_kind(
                ConversionKind::NumericWidening { from, to },
                cost,
            ));
        }
        if to.is_integer() && value.is_some_and(|v| v.fits_in(to)) {
            return Some(Conversion::implicit_kind(
                ConversionKind::ConstantNarrowing { to },
                COST_CONST_FIT,
            ));
        }
        return None;
    }
    reference_implicit(ctx, source.type_hash, target.type_hash)
}

/// Reference upcasts and boxing.
fn reference_implicit(
    ctx: &AnalysisContext,
    source: TypeHash,
    target: TypeHash,
) -> Option<Conversion> {
    if target == primitives::OBJECT {
        if ctx.is_reference_type(source) {
            return Some(Conversion::implicit_kind(
                ConversionKind::ReferenceUpcast,
                COST_UPCAST_BASE + 2,
            ));
        }
        if PrimitiveKind::of(source).is_some() || is_enum(ctx, source) {
            return Some(Conversion::implicit_kind(ConversionKind::Boxing, COST_BOX));
        }
        return None;
    }
    if target == primitives::DELEGATE && is_delegate(ctx, source) {
        return Some(Conversion::implicit_kind(
            ConversionKind::ReferenceUpcast,
            COST_UPCAST_BASE,
        ));
    }
    if let Some(depth) = ctx
        .registry
        .base_chain(source)
        .iter()
        .position(|&t| t == target)
    {
        if depth > 0 {
            return Some(Conversion::implicit_kind(
                ConversionKind::ReferenceUpcast,
                COST_UPCAST_BASE + depth as u32 - 1,
            ));
        }
    }
    if matches!(ctx.registry.get_type(target), Some(TypeEntry::Interface(_)))
        && ctx.registry.implements(source, target)
    {
        return Some(Conversion::implicit_kind(
            ConversionKind::ReferenceUpcast,
            COST_INTERFACE,
        ));
    }
    None
}

/// Explicit-only conversions excluding user-defined operators.
pub(crate) fn standard_explicit(
    ctx: &AnalysisContext,
    source: DataType,
    target: DataType,
) -> Option<Conversion> {
    let source = source.deref();
    let target = target.deref();
    // Unwrapping T? (possibly converting the wrapped value too).
    if source.nullable && !target.nullable {
        let s0 = source.unwrap_nullable();
        let inner = if s0 == target {
            Conversion::identity()
        } else {
            standard_implicit(ctx, s0, None, target)
                .or_else(|| standard_explicit(ctx, s0, target))?
        };
        let cost = inner.cost + COST_EXPLICIT;
        return Some(Conversion::explicit_kind(
            ConversionKind::NullableUnwrap {
                inner: Box::new(inner),
            },
            cost,
        ));
    }
    if target.nullable {
        let t0 = target.unwrap_nullable();
        let s0 = if source.nullable {
            source.unwrap_nullable()
        } else {
            source
        };
        let inner = standard_explicit(ctx, s0, t0)?;
        let cost = inner.cost + COST_LIFT;
        return Some(Conversion::explicit_kind(
            ConversionKind::Nullable {
                inner: Box::new(inner),
            },
            cost,
        ));
    }

    let s = source.type_hash;
    let t = target.type_hash;
    if let (Some(from), Some(to)) = (PrimitiveKind::of(s), PrimitiveKind::of(t)) {
        return primitive::explicit_exists(from, to).then(|| {
            Conversion::explicit_kind(ConversionKind::NumericNarrowing { from, to }, COST_EXPLICIT)
        });
    }
    // Enums cast to and from any integer/numeric kind and other enums.
    if is_enum(ctx, s) && (PrimitiveKind::of(t).is_some_and(PrimitiveKind::is_numeric)) {
        return Some(Conversion::explicit_kind(
            ConversionKind::EnumToNumeric,
            COST_EXPLICIT,
        ));
    }
    if is_enum(ctx, t)
        && (PrimitiveKind::of(s).is_some_and(PrimitiveKind::is_numeric) || is_enum(ctx, s))
    {
        return Some(Conversion::explicit_kind(
            ConversionKind::NumericToEnum,
            COST_EXPLICIT,
        ));
    }
    // Unboxing and reference downcasts.
    if s == primitives::OBJECT {
        if PrimitiveKind::of(t).is_some() || is_enum(ctx, t) {
            return Some(Conversion::explicit_kind(
                ConversionKind::Unboxing,
                COST_EXPLICIT,
            ));
        }
        if ctx.is_reference_type(t) {
            return Some(Conversion::explicit_kind(
                ConversionKind::ReferenceDowncast,
                COST_EXPLICIT,
            ));
        }
    }
    if ctx.registry.is_derived_from(t, s) && s != t {
        return Some(Conversion::explicit_kind(
            ConversionKind::ReferenceDowncast,
            COST_EXPLICIT,
        ));
    }
    // From an interface down to any class (checked at runtime).
    if matches!(ctx.registry.get_type(s), Some(TypeEntry::Interface(_)))
        && matches!(ctx.registry.get_type(t), Some(TypeEntry::Class(_)))
    {
        return Some(Conversion::explicit_kind(
            ConversionKind::ReferenceDowncast,
            COST_EXPLICIT,
        ));
    }
    // Pointers reinterpret to other pointers and to/from the native-sized
    // integers.
    let s_ptr = is_pointer(ctx, s);
    let t_ptr = is_pointer(ctx, t);
    let native_int = |h: TypeHash| h == primitives::INT64 || h == primitives::UINT64;
    if (s_ptr && t_ptr) || (s_ptr && native_int(t)) || (t_ptr && native_int(s)) {
        return Some(Conversion::explicit_kind(
            ConversionKind::PointerReinterpret,
            COST_EXPLICIT,
        ));
    }
    None
}

pub(crate) fn is_enum(ctx: &AnalysisContext, hash: TypeHash) -> bool {
    matches!(ctx.registry.get_type(hash), Some(TypeEntry::Enum(_)))
}

pub(crate) fn is_delegate(ctx: &AnalysisContext, hash: TypeHash) -> bool {
    matches!(ctx.registry.get_type(hash), Some(TypeEntry::Delegate(_)))
}

pub(crate) fn is_pointer(ctx: &AnalysisContext, hash: TypeHash) -> bool {
    matches!(ctx.registry.get_type(hash), Some(TypeEntry::Pointer(_)))
}
