//! `?:` and `??` type inference.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, PrimitiveKind};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::BoundExpr;

/// `a ?? b`. The left side must be nullable, a reference, or the null
/// literal; the result type prefers the unwrapped left type, then the left
/// type, then the right type, whichever the other side converts to.
pub fn resolve_coalesce(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    left: &BoundExpr,
    right: &BoundExpr,
) -> DataType {
    let lt = left.ty(ctx);
    let rt = right.ty(ctx);
    if lt.is_error() || rt.is_error() {
        return DataType::ERROR;
    }
    let rv = right.value(ctx);

    if lt.is_null_literal() {
        if rt.is_null_literal() {
            ctx.report(Diagnostic::new(
                ErrorKind::CannotInferTypeOfCoalescing,
                node.span,
            ));
            return DataType::ERROR;
        }
        return rt.deref();
    }

    let l = lt.deref();
    let can_be_null = l.nullable || ctx.is_reference_type(l.type_hash);
    if can_be_null {
        let unwrapped = l.unwrap_nullable();
        if l.nullable && conversion::implicit(ctx, rt, rv.as_ref(), unwrapped).is_some() {
            return unwrapped;
        }
        if conversion::implicit(ctx, rt, rv.as_ref(), l).is_some() {
            return l;
        }
        if conversion::implicit(ctx, l, None, rt.deref()).is_some() {
            return rt.deref();
        }
    }
    ctx.report(Diagnostic::new(
        ErrorKind::CannotInferTypeOfCoalescing,
        node.span,
    ));
    DataType::ERROR
}

pub fn evaluate_coalesce(
    ctx: &AnalysisContext,
    left: &BoundExpr,
    right: &BoundExpr,
) -> Option<ConstValue> {
    match left.value(ctx)? {
        ConstValue::Null => right.value(ctx),
        v => Some(v),
    }
}

/// `cond ? a : b`. The result type is the branch type the other branch
/// implicitly converts to; identical branch types short-circuit the search.
pub fn resolve_conditional(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    condition: &BoundExpr,
    when_true: &BoundExpr,
    when_false: &BoundExpr,
) -> DataType {
    let ct = condition.ty(ctx);
    if !ct.is_error() {
        let cv = condition.value(ctx);
        if conversion::implicit(ctx, ct, cv.as_ref(), DataType::BOOL).is_none() {
            ctx.report(
                Diagnostic::new(ErrorKind::NoImplicitConversion, condition.span)
                    .with_arg(ctx.type_name(ct.deref().type_hash))
                    .with_arg("bool"),
            );
            node.mark_error();
        }
    }

    let tt = when_true.ty(ctx);
    let ft = when_false.ty(ctx);
    if tt.is_error() || ft.is_error() {
        return DataType::ERROR;
    }
    if tt.deref() == ft.deref() && !tt.is_null_literal() {
        return tt.deref();
    }
    let tv = when_true.value(ctx);
    let fv = when_false.value(ctx);
    let t_to_f =
        !ft.is_null_literal() && conversion::implicit(ctx, tt, tv.as_ref(), ft.deref()).is_some();
    let f_to_t =
        !tt.is_null_literal() && conversion::implicit(ctx, ft, fv.as_ref(), tt.deref()).is_some();
    match (t_to_f, f_to_t) {
        // Mutual conversions happen when a constant fits the narrower side;
        // the result is still the side the other widens to on type alone.
        (true, true) => {
            if conversion::implicit(ctx, tt, None, ft.deref()).is_some() {
                ft.deref()
            } else {
                tt.deref()
            }
        }
        (false, true) => tt.deref(),
        (true, false) => ft.deref(),
        (false, false) => {
            ctx.report(Diagnostic::new(
                ErrorKind::CannotInferTypeOfConditional,
                node.span,
            ));
            DataType::ERROR
        }
    }
}

pub fn evaluate_conditional(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    condition: &BoundExpr,
    when_true: &BoundExpr,
    when_false: &BoundExpr,
) -> Option<ConstValue> {
    let ConstValue::Bool(c) = condition.value(ctx)? else {
        return None;
    };
    let chosen = if c {
        when_true.value(ctx)?
    } else {
        when_false.value(ctx)?
    };
    // Fold at the unified result type so both branches agree on width.
    match PrimitiveKind::of(node.ty(ctx).type_hash) {
        Some(kind) if chosen != ConstValue::Null => chosen.convert_to(kind),
        _ => Some(chosen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, primitives};
    use ilex_registry::{ScopeTree, SymbolRegistry};

    use crate::expr::Expr;

    fn sp() -> Span {
        Span::point(1, 1)
    }

    fn analyze(e: Expr) -> (DataType, Option<ConstValue>, Vec<Diagnostic>) {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let bound = e.bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let ty = bound.ty(&ctx);
        let v = bound.value(&ctx);
        (ty, v, sink.diagnostics())
    }

    #[test]
    fn conditional_widens_to_the_common_type() {
        let e = Expr::conditional(
            Expr::boolean(true, sp()),
            Expr::int(1, sp()),
            Expr::literal(ConstValue::I64(2), sp()),
            sp(),
        );
        let (ty, v, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::INT64));
        assert_eq!(v, Some(ConstValue::I64(1)));
        assert!(diags.is_empty());
    }

    #[test]
    fn conditional_without_common_type_reports() {
        let e = Expr::conditional(
            Expr::boolean(true, sp()),
            Expr::boolean(false, sp()),
            Expr::string("x", sp()),
            sp(),
        );
        let (ty, _, diags) = analyze(e);
        assert!(ty.is_error());
        assert_eq!(diags[0].kind, ErrorKind::CannotInferTypeOfConditional);
    }

    #[test]
    fn non_bool_condition_reports_but_the_type_survives() {
        let e = Expr::conditional(
            Expr::string("oops", sp()),
            Expr::int(1, sp()),
            Expr::int(2, sp()),
            sp(),
        );
        let (ty, _, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::INT32));
        assert_eq!(diags[0].kind, ErrorKind::NoImplicitConversion);
    }

    #[test]
    fn coalesce_with_null_literal_left_takes_the_right_type() {
        let e = Expr::coalesce(Expr::null(sp()), Expr::string("d", sp()), sp());
        let (ty, v, diags) = analyze(e);
        assert_eq!(ty, DataType::STRING);
        assert_eq!(v, Some(ConstValue::Str("d".into())));
        assert!(diags.is_empty());
    }

    #[test]
    fn coalesce_unwraps_a_nullable_left() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.declare_local(
            root,
            "maybe",
            DataType::simple(primitives::INT32).as_nullable(),
        );
        let e = Expr::coalesce(Expr::name("maybe", sp()), Expr::int(0, sp()), sp())
            .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(e.ty(&ctx), DataType::simple(primitives::INT32));
        assert!(sink.is_empty());
    }

    #[test]
    fn coalesce_on_a_plain_value_type_reports() {
        let e = Expr::coalesce(Expr::int(1, sp()), Expr::int(2, sp()), sp());
        let (ty, _, diags) = analyze(e);
        assert!(ty.is_error());
        assert_eq!(diags[0].kind, ErrorKind::CannotInferTypeOfCoalescing);
    }
}
