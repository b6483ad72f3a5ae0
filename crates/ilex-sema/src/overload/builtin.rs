//! Built-in operator candidates.
//!
//! When no user-defined operator claims an operand pair, operators fall
//! back to the fixed built-in candidate set: the numeric ladder (`int32`,
//! `uint32`, `int64`, `uint64`, `float32`, `float64`, `decimal`), boolean
//! logic, string concatenation and equality, enum arithmetic against the
//! underlying type, delegate combination, pointer arithmetic, and reference
//! equality. Two integer operands stay on the integer rungs; mixing
//! `uint64` with a signed type therefore finds no candidate at all rather
//! than silently drifting into floating point.

use ilex_core::{ConstValue, DataType, PrimitiveKind, TypeHash, primitives};
use ilex_registry::TypeEntry;

use crate::context::AnalysisContext;
use crate::conversion::{self, Conversion};
use crate::expr::{BinaryOp, UnaryOp};
use crate::overload::ranking::Candidate;
use crate::overload::{OperatorResolution, ResolvedOperator};

/// A resolved built-in operator form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOperator {
    /// Arithmetic or bitwise operation at a numeric kind.
    Numeric(PrimitiveKind),
    /// Comparison at a numeric kind; result is `bool`.
    Comparison(PrimitiveKind),
    /// Shift: left operand at the kind, right operand `int32`.
    Shift(PrimitiveKind),
    /// `&`, `|`, `^`, `==`, `!=` on `bool`.
    BoolLogic,
    /// String concatenation; the non-string operand is boxed.
    StringConcat,
    /// String equality.
    StringEquality,
    /// Reference identity equality.
    ReferenceEquality,
    /// Bitwise operation on an enum.
    EnumBitwise(TypeHash),
    /// Comparison between values of one enum.
    EnumComparison(TypeHash),
    /// Enum plus/minus its underlying type, yielding the enum.
    EnumAddUnderlying(TypeHash),
    /// Enum minus enum, yielding the underlying type.
    EnumDifference(TypeHash),
    /// Delegate `+`.
    DelegateCombine(TypeHash),
    /// Delegate `-`.
    DelegateRemove(TypeHash),
    /// Delegate `==`/`!=`.
    DelegateEquality(TypeHash),
    /// Pointer plus/minus an integer offset, scaled by the pointee size.
    PointerOffset(TypeHash),
    /// Pointer minus pointer, yielding an `int64` element distance.
    PointerDifference(TypeHash),
    /// Pointer comparison.
    PointerComparison(TypeHash),
    /// Unary `+`/`-` at a numeric kind.
    UnaryNumeric(PrimitiveKind),
    /// `~` at an integer kind.
    Complement(PrimitiveKind),
    /// `~` on an enum.
    EnumComplement(TypeHash),
    /// `!` on `bool`.
    BoolNot,
}

/// The numeric ladder considered for binary operators.
const NUMERIC_LADDER: [PrimitiveKind; 7] = [
    PrimitiveKind::Int32,
    PrimitiveKind::UInt32,
    PrimitiveKind::Int64,
    PrimitiveKind::UInt64,
    PrimitiveKind::Float32,
    PrimitiveKind::Float64,
    PrimitiveKind::Decimal,
];

/// The integer rungs (also the shift left-operand kinds).
const INTEGER_LADDER: [PrimitiveKind; 4] = [
    PrimitiveKind::Int32,
    PrimitiveKind::UInt32,
    PrimitiveKind::Int64,
    PrimitiveKind::UInt64,
];

/// Cost assessed on the boxed side of `string + object`.
const STRING_OPERAND_COST: u32 = 2;
/// Cost of the reference-equality fallback, so the specialized equality
/// forms outrank it.
const REFERENCE_EQUALITY_COST: u32 = 4;

struct Operand<'v> {
    ty: DataType,
    value: Option<&'v ConstValue>,
}

impl<'v> Operand<'v> {
    fn base(&self) -> DataType {
        self.ty.deref().unwrap_nullable()
    }

    /// Conversion of this operand to `target`, unwrapping a nullable
    /// operand first (the lifted form applies the conversion to the
    /// wrapped value).
    fn convert(&self, ctx: &AnalysisContext, target: DataType) -> Option<Conversion> {
        let src = self.ty.deref();
        if src.nullable {
            conversion::implicit(ctx, src.unwrap_nullable(), None, target)
        } else {
            conversion::implicit(ctx, src, self.value, target)
        }
    }
}

fn resolution(
    operator: BuiltinOperator,
    operand_type: DataType,
    result_type: DataType,
    lifted: bool,
) -> OperatorResolution {
    OperatorResolution {
        operator: ResolvedOperator::Builtin(operator),
        operand_type,
        result_type,
        lifted,
        truth_test: None,
    }
}

fn candidate(
    resolution: OperatorResolution,
    convs: &[&Conversion],
) -> Candidate<OperatorResolution> {
    let cost = convs.iter().map(|c| c.cost).sum();
    let exact = convs.iter().filter(|c| c.is_identity()).count() as u32;
    Candidate {
        item: resolution,
        cost,
        exact_matches: exact,
        depth: 0,
    }
}

/// All viable built-in candidates for a binary operator application.
pub fn binary_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    lt: DataType,
    lv: Option<&ConstValue>,
    rt: DataType,
    rv: Option<&ConstValue>,
) -> Vec<Candidate<OperatorResolution>> {
    let left = Operand {
        ty: lt,
        value: lv,
    };
    let right = Operand {
        ty: rt,
        value: rv,
    };
    let lifted = lt.deref().nullable || rt.deref().nullable;
    let mut out = Vec::new();

    numeric_candidates(ctx, op, &left, &right, lifted, &mut out);
    bool_candidates(ctx, op, &left, &right, &mut out);
    string_candidates(ctx, op, &left, &right, &mut out);
    enum_candidates(ctx, op, &left, &right, lifted, &mut out);
    delegate_candidates(ctx, op, &left, &right, &mut out);
    pointer_candidates(ctx, op, &left, &right, &mut out);
    reference_equality_candidates(ctx, op, &left, &right, &mut out);
    out
}

fn numeric_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    lifted: bool,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    let lk = ctx.primitive_kind(left.base());
    let rk = ctx.primitive_kind(right.base());
    if op.is_shift() {
        let int32 = DataType::simple(primitives::INT32);
        for kind in INTEGER_LADDER {
            let target = DataType::simple(kind.type_hash());
            let (Some(lc), Some(rc)) = (left.convert(ctx, target), right.convert(ctx, int32))
            else {
                continue;
            };
            let result = if lifted { target.as_nullable() } else { target };
            out.push(candidate(
                resolution(BuiltinOperator::Shift(kind), target, result, lifted),
                &[&lc, &rc],
            ));
        }
        return;
    }
    if !(op.is_arithmetic() || op.is_comparison() || op.is_bitwise()) {
        return;
    }
    // Two integer operands never drift onto the floating rungs; that keeps
    // signed/uint64 mixes an error instead of a silent float operation.
    let both_integer = lk.is_some_and(PrimitiveKind::is_integer)
        && rk.is_some_and(PrimitiveKind::is_integer);
    let ladder: &[PrimitiveKind] = if both_integer || op.is_bitwise() {
        &INTEGER_LADDER
    } else {
        &NUMERIC_LADDER
    };
    for &kind in ladder {
        let target = DataType::simple(kind.type_hash());
        let (Some(lc), Some(rc)) = (left.convert(ctx, target), right.convert(ctx, target)) else {
            continue;
        };
        let (operator, result) = if op.is_comparison() {
            (BuiltinOperator::Comparison(kind), DataType::BOOL)
        } else {
            let result = if lifted { target.as_nullable() } else { target };
            (BuiltinOperator::Numeric(kind), result)
        };
        out.push(candidate(
            resolution(operator, target, result, lifted),
            &[&lc, &rc],
        ));
    }
}

fn bool_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    if !(op.is_bitwise() || op.is_equality()) {
        return;
    }
    let (Some(lc), Some(rc)) = (
        left.convert(ctx, DataType::BOOL),
        right.convert(ctx, DataType::BOOL),
    ) else {
        return;
    };
    let lifted = left.ty.deref().nullable || right.ty.deref().nullable;
    let result = if lifted && op.is_bitwise() {
        DataType::BOOL.as_nullable()
    } else {
        DataType::BOOL
    };
    out.push(candidate(
        resolution(BuiltinOperator::BoolLogic, DataType::BOOL, result, lifted),
        &[&lc, &rc],
    ));
}

fn string_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    let l_str = left.base() == DataType::STRING || left.ty.is_null_literal();
    let r_str = right.base() == DataType::STRING || right.ty.is_null_literal();
    if op == BinaryOp::Add && (l_str || r_str) && !(left.ty.is_null_literal() && right.ty.is_null_literal()) {
        // The non-string side rides along boxed; void is the one thing with
        // no string form.
        if left.ty.deref().is_void() || right.ty.deref().is_void() {
            return;
        }
        let cost = u32::from(!l_str) * STRING_OPERAND_COST
            + u32::from(!r_str) * STRING_OPERAND_COST;
        let exact = u32::from(l_str) + u32::from(r_str);
        out.push(Candidate {
            item: resolution(
                BuiltinOperator::StringConcat,
                DataType::STRING,
                DataType::STRING,
                false,
            ),
            cost,
            exact_matches: exact,
            depth: 0,
        });
        return;
    }
    if op.is_equality() && l_str && r_str {
        let (Some(lc), Some(rc)) = (
            left.convert(ctx, DataType::STRING),
            right.convert(ctx, DataType::STRING),
        ) else {
            return;
        };
        out.push(candidate(
            resolution(
                BuiltinOperator::StringEquality,
                DataType::STRING,
                DataType::BOOL,
                false,
            ),
            &[&lc, &rc],
        ));
    }
}

fn enum_of(ctx: &AnalysisContext, ty: DataType) -> Option<(TypeHash, TypeHash)> {
    let hash = ty.deref().unwrap_nullable().type_hash;
    ctx.enum_underlying(hash).map(|u| (hash, u))
}

fn enum_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    lifted: bool,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    let le = enum_of(ctx, left.ty);
    let re = enum_of(ctx, right.ty);
    match (le, re) {
        (Some((e, underlying)), Some((e2, _))) if e == e2 => {
            let enum_ty = DataType::simple(e);
            let with_lift = |t: DataType| if lifted { t.as_nullable() } else { t };
            if op.is_comparison() {
                out.push(candidate(
                    resolution(
                        BuiltinOperator::EnumComparison(e),
                        enum_ty,
                        DataType::BOOL,
                        lifted,
                    ),
                    &[],
                ));
            } else if op.is_bitwise() {
                out.push(candidate(
                    resolution(
                        BuiltinOperator::EnumBitwise(e),
                        enum_ty,
                        with_lift(enum_ty),
                        lifted,
                    ),
                    &[],
                ));
            } else if op == BinaryOp::Subtract {
                out.push(candidate(
                    resolution(
                        BuiltinOperator::EnumDifference(e),
                        enum_ty,
                        with_lift(DataType::simple(underlying)),
                        lifted,
                    ),
                    &[],
                ));
            }
        }
        (Some((e, underlying)), None) | (None, Some((e, underlying)))
            if op == BinaryOp::Add || op == BinaryOp::Subtract =>
        {
            // enum + underlying (and underlying + enum for addition).
            if op == BinaryOp::Subtract && le.is_none() {
                return;
            }
            let numeric = if le.is_some() { right } else { left };
            let Some(nc) = numeric.convert(ctx, DataType::simple(underlying)) else {
                return;
            };
            let enum_ty = DataType::simple(e);
            let result = if lifted { enum_ty.as_nullable() } else { enum_ty };
            out.push(candidate(
                resolution(
                    BuiltinOperator::EnumAddUnderlying(e),
                    enum_ty,
                    result,
                    lifted,
                ),
                &[&nc],
            ));
        }
        _ => {}
    }
}

fn delegate_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    let l_del = conversion::is_delegate(ctx, left.base().type_hash);
    let r_del = conversion::is_delegate(ctx, right.base().type_hash);
    let d = if l_del {
        left.base().type_hash
    } else if r_del {
        right.base().type_hash
    } else {
        return;
    };
    let same = (l_del && r_del && left.base() == right.base())
        || (l_del && right.ty.is_null_literal())
        || (r_del && left.ty.is_null_literal());
    if !same {
        return;
    }
    let dt = DataType::simple(d);
    let operator = match op {
        BinaryOp::Add => BuiltinOperator::DelegateCombine(d),
        BinaryOp::Subtract => BuiltinOperator::DelegateRemove(d),
        BinaryOp::Equal | BinaryOp::NotEqual => BuiltinOperator::DelegateEquality(d),
        _ => return,
    };
    let result = if op.is_equality() { DataType::BOOL } else { dt };
    out.push(candidate(resolution(operator, dt, result, false), &[]));
}

fn pointer_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    let l_ptr = pointer_of(ctx, left.base());
    let r_ptr = pointer_of(ctx, right.base());
    let int64 = DataType::simple(primitives::INT64);
    match (l_ptr, r_ptr) {
        (Some(p), None) => {
            if op == BinaryOp::Add || op == BinaryOp::Subtract {
                if let Some(oc) = right.convert(ctx, int64) {
                    let pt = DataType::simple(p);
                    out.push(candidate(
                        resolution(BuiltinOperator::PointerOffset(p), pt, pt, false),
                        &[&oc],
                    ));
                }
            }
        }
        (None, Some(p)) => {
            if op == BinaryOp::Add {
                if let Some(oc) = left.convert(ctx, int64) {
                    let pt = DataType::simple(p);
                    out.push(candidate(
                        resolution(BuiltinOperator::PointerOffset(p), pt, pt, false),
                        &[&oc],
                    ));
                }
            }
        }
        (Some(p), Some(p2)) if p == p2 => {
            let pt = DataType::simple(p);
            if op == BinaryOp::Subtract {
                out.push(candidate(
                    resolution(BuiltinOperator::PointerDifference(p), pt, int64, false),
                    &[],
                ));
            } else if op.is_comparison() {
                out.push(candidate(
                    resolution(
                        BuiltinOperator::PointerComparison(p),
                        pt,
                        DataType::BOOL,
                        false,
                    ),
                    &[],
                ));
            }
        }
        _ => {}
    }
}

fn pointer_of(ctx: &AnalysisContext, ty: DataType) -> Option<TypeHash> {
    let hash = ty.type_hash;
    matches!(ctx.registry.get_type(hash), Some(TypeEntry::Pointer(_))).then_some(hash)
}

fn reference_equality_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    left: &Operand,
    right: &Operand,
    out: &mut Vec<Candidate<OperatorResolution>>,
) {
    if !op.is_equality() {
        return;
    }
    let l = left.ty.deref();
    let r = right.ty.deref();
    let null_vs_nullable = (l.is_null_literal() && (r.nullable || ctx.is_reference_type(r.type_hash) || conversion::is_pointer(ctx, r.type_hash)))
        || (r.is_null_literal() && (l.nullable || ctx.is_reference_type(l.type_hash) || conversion::is_pointer(ctx, l.type_hash)));
    let both_refs = ctx.is_reference_type(l.type_hash)
        && ctx.is_reference_type(r.type_hash)
        && (conversion::implicit(ctx, l, None, r).is_some()
            || conversion::implicit(ctx, r, None, l).is_some());
    if null_vs_nullable || both_refs {
        out.push(Candidate {
            item: resolution(
                BuiltinOperator::ReferenceEquality,
                DataType::OBJECT,
                DataType::BOOL,
                false,
            ),
            cost: REFERENCE_EQUALITY_COST,
            exact_matches: 0,
            depth: 0,
        });
    }
}

/// All viable built-in candidates for a unary operator application.
pub fn unary_candidates(
    ctx: &AnalysisContext,
    op: UnaryOp,
    ty: DataType,
    value: Option<&ConstValue>,
) -> Vec<Candidate<OperatorResolution>> {
    let operand = Operand { ty, value };
    let lifted = ty.deref().nullable;
    let mut out = Vec::new();
    let with_lift = |t: DataType| if lifted { t.as_nullable() } else { t };
    match op {
        UnaryOp::Not => {
            if let Some(c) = operand.convert(ctx, DataType::BOOL) {
                out.push(candidate(
                    resolution(
                        BuiltinOperator::BoolNot,
                        DataType::BOOL,
                        with_lift(DataType::BOOL),
                        lifted,
                    ),
                    &[&c],
                ));
            }
        }
        UnaryOp::Negate | UnaryOp::Plus => {
            let kinds: &[PrimitiveKind] = if op == UnaryOp::Negate {
                // uint32 negates through int64; uint64 has no negation.
                &[
                    PrimitiveKind::Int32,
                    PrimitiveKind::Int64,
                    PrimitiveKind::Float32,
                    PrimitiveKind::Float64,
                    PrimitiveKind::Decimal,
                ]
            } else {
                &NUMERIC_LADDER
            };
            for &kind in kinds {
                let target = DataType::simple(kind.type_hash());
                if let Some(c) = operand.convert(ctx, target) {
                    out.push(candidate(
                        resolution(
                            BuiltinOperator::UnaryNumeric(kind),
                            target,
                            with_lift(target),
                            lifted,
                        ),
                        &[&c],
                    ));
                }
            }
        }
        UnaryOp::Complement => {
            if let Some((e, _)) = enum_of(ctx, ty) {
                let enum_ty = DataType::simple(e);
                out.push(candidate(
                    resolution(
                        BuiltinOperator::EnumComplement(e),
                        enum_ty,
                        with_lift(enum_ty),
                        lifted,
                    ),
                    &[],
                ));
                return out;
            }
            for kind in INTEGER_LADDER {
                let target = DataType::simple(kind.type_hash());
                if let Some(c) = operand.convert(ctx, target) {
                    out.push(candidate(
                        resolution(
                            BuiltinOperator::Complement(kind),
                            target,
                            with_lift(target),
                            lifted,
                        ),
                        &[&c],
                    ));
                }
            }
        }
    }
    out
}
