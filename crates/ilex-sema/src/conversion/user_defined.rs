//! User-defined conversion operators (`op_Implicit` / `op_Explicit`).
//!
//! Candidates are the static conversion operators declared on the source
//! type, the target type, and their base classes. An operator applies when
//! a standard conversion carries the source into its parameter type and
//! another carries its return type into the target; at most one
//! user-defined step ever participates in a conversion. Operators lift over
//! nullable operand pairs.

use ilex_core::{DataType, TypeHash};
use ilex_registry::{TyPattern, op_names};

use crate::context::AnalysisContext;
use crate::conversion::{
    COST_LIFT, COST_USER, Conversion, ConversionKind, standard_explicit, standard_implicit,
};

/// Find the best applicable `op_Implicit`.
pub fn find_implicit(
    ctx: &AnalysisContext,
    source: DataType,
    target: DataType,
) -> Option<Conversion> {
    search(ctx, source, target, false)
}

/// Find the best applicable conversion operator for an explicit cast
/// (`op_Implicit` qualifies too, with explicit standard conversions allowed
/// on either side).
pub fn find_explicit(
    ctx: &AnalysisContext,
    source: DataType,
    target: DataType,
) -> Option<Conversion> {
    search(ctx, source, target, true)
}

fn search(
    ctx: &AnalysisContext,
    source: DataType,
    target: DataType,
    allow_explicit: bool,
) -> Option<Conversion> {
    if source.is_error() || target.is_error() || source.by_ref || target.by_ref {
        return None;
    }
    let mut candidates = Vec::new();
    collect(ctx, source.type_hash, op_names::IMPLICIT, &mut candidates);
    collect(ctx, target.type_hash, op_names::IMPLICIT, &mut candidates);
    if allow_explicit {
        collect(ctx, source.type_hash, op_names::EXPLICIT, &mut candidates);
        collect(ctx, target.type_hash, op_names::EXPLICIT, &mut candidates);
    }
    if source.nullable && target.nullable {
        let s0 = source.unwrap_nullable();
        let t0 = target.unwrap_nullable();
        collect(ctx, s0.type_hash, op_names::IMPLICIT, &mut candidates);
        collect(ctx, t0.type_hash, op_names::IMPLICIT, &mut candidates);
        if allow_explicit {
            collect(ctx, s0.type_hash, op_names::EXPLICIT, &mut candidates);
            collect(ctx, t0.type_hash, op_names::EXPLICIT, &mut candidates);
        }
    }
    candidates.dedup();

    let mut best: Option<Conversion> = None;
    for method in candidates {
        let Some(def) = ctx.registry.get_method(method) else {
            continue;
        };
        let (Some(param), Some(ret)) = (
            def.params.first().and_then(|p| p.ty.as_exact()),
            match &def.return_type {
                TyPattern::Exact(dt) => Some(*dt),
                _ => None,
            },
        ) else {
            continue;
        };
        if def.params.len() != 1 {
            continue;
        }
        for lifted in [false, true] {
            let (s, t) = if lifted {
                if !(source.nullable && target.nullable) {
                    continue;
                }
                (source.unwrap_nullable(), target.unwrap_nullable())
            } else {
                (source, target)
            };
            let Some(into) = bridge(ctx, s, param, allow_explicit) else {
                continue;
            };
            let Some(out) = bridge(ctx, ret, t, allow_explicit) else {
                continue;
            };
            let cost = COST_USER + into.cost + out.cost + if lifted { COST_LIFT } else { 0 };
            let conv = Conversion {
                kind: ConversionKind::UserDefined { method, lifted },
                cost,
                is_implicit: !allow_explicit,
            };
            if best.as_ref().is_none_or(|b| conv.cost < b.cost) {
                best = Some(conv);
            }
        }
    }
    best
}

/// Static conversion operators named `name` on `ty`'s base chain.
fn collect(ctx: &AnalysisContext, ty: TypeHash, name: &str, out: &mut Vec<TypeHash>) {
    out.extend(ctx.registry.operator_candidates(ty, name));
}

/// A standard conversion bridging one leg of a user-defined conversion.
fn bridge(
    ctx: &AnalysisContext,
    from: DataType,
    to: DataType,
    allow_explicit: bool,
) -> Option<Conversion> {
    standard_implicit(ctx, from, None, to).or_else(|| {
        if allow_explicit {
            standard_explicit(ctx, from, to)
        } else {
            None
        }
    })
}
