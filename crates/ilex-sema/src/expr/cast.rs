//! Explicit casts.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, PrimitiveKind, primitives};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BoundExpr, ExprKind, lambda};

/// A cast always keeps its declared target type so downstream analysis
/// stays anchored; a missing conversion marks the node instead.
pub fn resolve(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    target: DataType,
    operand: &BoundExpr,
) -> DataType {
    let ot = operand.ty(ctx);
    if ot.is_error() {
        return target;
    }
    if ot.type_hash == primitives::LAMBDA && matches!(operand.kind, ExprKind::Lambda { .. }) {
        if lambda::conforms(ctx, operand, target).is_none() {
            report_no_cast(ctx, node, ot, target);
        }
        return target;
    }
    let ov = operand.value(ctx);
    if conversion::explicit(ctx, ot, ov.as_ref(), target).is_none() {
        report_no_cast(ctx, node, ot, target);
    }
    target
}

fn report_no_cast(ctx: &AnalysisContext, node: &BoundExpr, source: DataType, target: DataType) {
    ctx.report(
        Diagnostic::new(ErrorKind::NoExplicitConversion, node.span)
            .with_arg(ctx.type_name(source.deref().unwrap_nullable().type_hash))
            .with_arg(ctx.type_name(target.unwrap_nullable().type_hash)),
    );
    node.mark_error();
}

/// Fold a cast of a constant. Unchecked integer casts truncate like the
/// runtime conversion instructions; checked casts of a value that does not
/// fit report instead of wrapping.
pub fn evaluate(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    target: DataType,
    checked: bool,
    operand: &BoundExpr,
) -> Option<ConstValue> {
    let v = operand.value(ctx)?;
    if v == ConstValue::Null {
        return (target.nullable || ctx.is_reference_type(target.type_hash))
            .then_some(ConstValue::Null);
    }
    let base = target.unwrap_nullable();
    if base.type_hash == primitives::STRING {
        return matches!(v, ConstValue::Str(_)).then_some(v);
    }
    let kind = match PrimitiveKind::of(base.type_hash) {
        Some(kind) => kind,
        None => PrimitiveKind::of(ctx.enum_underlying(base.type_hash)?)?,
    };
    if checked && kind.is_integer() && !v.fits_in(kind) {
        ctx.report(Diagnostic::new(ErrorKind::ConstOutOfRange, node.span));
        node.mark_error();
        return None;
    }
    v.convert_to(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span};
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
    fn unchecked_narrowing_truncates() {
        let e = Expr::cast(
            DataType::simple(primitives::UINT8),
            Expr::int(300, sp()),
            sp(),
        );
        let (ty, v, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::UINT8));
        assert_eq!(v, Some(ConstValue::U8(44)));
        assert!(diags.is_empty());
    }

    #[test]
    fn checked_narrowing_out_of_range_reports() {
        let e = Expr::cast_checked(
            DataType::simple(primitives::UINT8),
            Expr::int(300, sp()),
            sp(),
        );
        let (ty, v, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::UINT8));
        assert_eq!(v, None);
        assert_eq!(diags[0].kind, ErrorKind::ConstOutOfRange);
    }

    #[test]
    fn float_to_int_cast_truncates_toward_zero() {
        let e = Expr::cast(
            DataType::simple(primitives::INT32),
            Expr::float(-2.9, sp()),
            sp(),
        );
        let (_, v, _) = analyze(e);
        assert_eq!(v, Some(ConstValue::I32(-2)));
    }

    #[test]
    fn impossible_cast_reports_but_keeps_the_declared_type() {
        let e = Expr::cast(DataType::BOOL, Expr::string("no", sp()), sp());
        let (ty, _, diags) = analyze(e);
        assert_eq!(ty, DataType::BOOL);
        assert_eq!(diags[0].kind, ErrorKind::NoExplicitConversion);
    }

    #[test]
    fn cast_keeps_its_type_over_a_broken_operand() {
        let e = Expr::cast(
            DataType::simple(primitives::INT32),
            Expr::error(sp()),
            sp(),
        );
        let (ty, _, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::INT32));
        assert!(diags.is_empty());
    }

    #[test]
    fn null_casts_to_nullable() {
        let e = Expr::cast(
            DataType::simple(primitives::INT32).as_nullable(),
            Expr::null(sp()),
            sp(),
        );
        let (ty, v, diags) = analyze(e);
        assert!(ty.nullable);
        assert_eq!(v, Some(ConstValue::Null));
        assert!(diags.is_empty());
    }
}
