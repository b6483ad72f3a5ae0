//! Binary operator resolution and folding.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, PrimitiveKind};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BinaryOp, BoundExpr, LogicalOp};
use crate::fold::{self, Folded};
use crate::overload::{self, BuiltinOperator, OperatorResolution, ResolvedOperator};

pub fn resolve(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: BinaryOp,
    left: &BoundExpr,
    right: &BoundExpr,
) -> DataType {
    let lt = left.ty(ctx);
    let rt = right.ty(ctx);
    if lt.is_error() || rt.is_error() {
        return DataType::ERROR;
    }
    let lv = left.value(ctx);
    let rv = right.value(ctx);
    match overload::resolve_binary(ctx, op, node.span, lt, lv.as_ref(), rt, rv.as_ref()) {
        Ok(resolution) => {
            let ty = resolution.result_type;
            node.set_operator(Some(resolution));
            ty
        }
        Err(diag) => {
            node.set_operator(None);
            ctx.report(diag);
            DataType::ERROR
        }
    }
}

/// `&&` and `||` over `bool` operands, or over a user-defined type that
/// declares the matching `&`/`|` operator together with `op_True`/`op_False`.
pub fn resolve_logical(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: LogicalOp,
    left: &BoundExpr,
    right: &BoundExpr,
) -> DataType {
    let lt = left.ty(ctx);
    let rt = right.ty(ctx);
    if lt.is_error() || rt.is_error() {
        return DataType::ERROR;
    }
    let both_bool = conversion::implicit(ctx, lt, None, DataType::BOOL).is_some()
        && conversion::implicit(ctx, rt, None, DataType::BOOL).is_some();
    if both_bool {
        node.set_operator(Some(OperatorResolution {
            operator: ResolvedOperator::Builtin(BuiltinOperator::BoolLogic),
            operand_type: DataType::BOOL,
            result_type: DataType::BOOL,
            lifted: false,
            truth_test: None,
        }));
        return DataType::BOOL;
    }
    // The user-defined form piggybacks on the eager bitwise operator; its
    // declaring type must supply the truth operators for the short circuit.
    let bitwise = match op {
        LogicalOp::And => BinaryOp::BitAnd,
        LogicalOp::Or => BinaryOp::BitOr,
    };
    if let Ok(resolution) = overload::resolve_binary(ctx, bitwise, node.span, lt, None, rt, None) {
        if let ResolvedOperator::UserDefined(_) = resolution.operator {
            let t = resolution.result_type.type_hash;
            let has_truth = !ctx
                .registry
                .operator_candidates(t, ilex_registry::op_names::TRUE)
                .is_empty()
                && !ctx
                    .registry
                    .operator_candidates(t, ilex_registry::op_names::FALSE)
                    .is_empty();
            if has_truth && resolution.result_type == lt.deref() {
                let ty = resolution.result_type;
                node.set_operator(Some(OperatorResolution {
                    truth_test: Some(t),
                    ..resolution
                }));
                return ty;
            }
        }
    }
    node.set_operator(None);
    ctx.report(
        Diagnostic::new(ErrorKind::BadBinaryOperation, node.span)
            .with_arg(match op {
                LogicalOp::And => "&&",
                LogicalOp::Or => "||",
            })
            .with_arg(ctx.type_name(lt.deref().unwrap_nullable().type_hash))
            .with_arg(ctx.type_name(rt.deref().unwrap_nullable().type_hash)),
    );
    DataType::ERROR
}

pub fn evaluate(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: BinaryOp,
    checked: bool,
    left: &BoundExpr,
    right: &BoundExpr,
) -> Option<ConstValue> {
    let resolution = node.operator(ctx)?.clone();
    let lv = left.value(ctx)?;
    let rv = right.value(ctx)?;
    if resolution.lifted {
        let l_null = lv == ConstValue::Null;
        let r_null = rv == ConstValue::Null;
        if l_null || r_null {
            // Null propagates through lifted arithmetic; lifted equality
            // compares null-ness, lifted ordering is false.
            return Some(match op {
                BinaryOp::Equal => ConstValue::Bool(l_null && r_null),
                BinaryOp::NotEqual => ConstValue::Bool(!(l_null && r_null)),
                op if op.is_relational() => ConstValue::Bool(false),
                _ => ConstValue::Null,
            });
        }
    }
    let folded = match resolution.operator {
        ResolvedOperator::Builtin(BuiltinOperator::Numeric(kind))
        | ResolvedOperator::Builtin(BuiltinOperator::Comparison(kind)) => {
            let a = lv.convert_to(kind)?;
            let b = rv.convert_to(kind)?;
            fold::binary(op, kind, checked, &a, &b)
        }
        ResolvedOperator::Builtin(BuiltinOperator::Shift(kind)) => {
            let a = lv.convert_to(kind)?;
            let ConstValue::I32(count) = rv.convert_to(PrimitiveKind::Int32)? else {
                return None;
            };
            fold::shift(op, kind, &a, count)
        }
        ResolvedOperator::Builtin(BuiltinOperator::BoolLogic) => {
            fold::binary(op, PrimitiveKind::Bool, checked, &lv, &rv)
        }
        ResolvedOperator::Builtin(BuiltinOperator::StringConcat) => {
            return fold::concat(&lv, &rv);
        }
        ResolvedOperator::Builtin(BuiltinOperator::StringEquality)
        | ResolvedOperator::Builtin(BuiltinOperator::ReferenceEquality) => {
            let equal = match (&lv, &rv) {
                (ConstValue::Str(a), ConstValue::Str(b)) => a == b,
                (ConstValue::Null, ConstValue::Null) => true,
                (ConstValue::Null, _) | (_, ConstValue::Null) => false,
                _ => return None,
            };
            return Some(ConstValue::Bool(if op == BinaryOp::Equal {
                equal
            } else {
                !equal
            }));
        }
        ResolvedOperator::Builtin(
            BuiltinOperator::EnumBitwise(e)
            | BuiltinOperator::EnumComparison(e)
            | BuiltinOperator::EnumDifference(e)
            | BuiltinOperator::EnumAddUnderlying(e),
        ) => {
            let kind = PrimitiveKind::of(ctx.enum_underlying(e)?)?;
            let a = lv.convert_to(kind)?;
            let b = rv.convert_to(kind)?;
            fold::binary(op, kind, checked, &a, &b)
        }
        _ => return None,
    };
    match folded {
        Folded::Value(v) => Some(v),
        Folded::ArithmeticError => {
            node.mark_error();
            ctx.report(Diagnostic::new(ErrorKind::ConstOutOfRange, node.span));
            None
        }
        Folded::NotConst => None,
    }
}

/// Short-circuit folding: a constant left side decides on its own.
pub fn evaluate_logical(
    ctx: &AnalysisContext,
    op: LogicalOp,
    left: &BoundExpr,
    right: &BoundExpr,
) -> Option<ConstValue> {
    let ConstValue::Bool(l) = left.value(ctx)? else {
        return None;
    };
    match (op, l) {
        (LogicalOp::And, false) => Some(ConstValue::Bool(false)),
        (LogicalOp::Or, true) => Some(ConstValue::Bool(true)),
        _ => match right.value(ctx)? {
            ConstValue::Bool(r) => Some(ConstValue::Bool(r)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, primitives};
    use ilex_registry::{ScopeTree, SymbolRegistry};

    use crate::expr::Expr;

    fn analyze(e: Expr) -> (Option<ConstValue>, DataType, Vec<ilex_core::Diagnostic>) {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let bound = e.bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let ty = bound.ty(&ctx);
        let v = bound.value(&ctx);
        let _ = bound.has_errors(&ctx);
        (v, ty, sink.diagnostics())
    }

    fn sp() -> Span {
        Span::point(1, 1)
    }

    #[test]
    fn mixed_widths_fold_at_the_promoted_kind() {
        let e = Expr::binary(
            BinaryOp::Add,
            Expr::literal(ConstValue::I8(100), sp()),
            Expr::literal(ConstValue::I8(100), sp()),
            sp(),
        );
        let (v, ty, diags) = analyze(e);
        // int8 operands promote to int32; no 8-bit wrap.
        assert_eq!(ty, DataType::simple(primitives::INT32));
        assert_eq!(v, Some(ConstValue::I32(200)));
        assert!(diags.is_empty());
    }

    #[test]
    fn checked_constant_overflow_reports() {
        let e = Expr::binary_checked(
            BinaryOp::Multiply,
            Expr::int(i32::MAX, sp()),
            Expr::int(2, sp()),
            sp(),
        );
        let (v, _, diags) = analyze(e);
        assert_eq!(v, None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::ConstOutOfRange);
    }

    #[test]
    fn string_concat_folds() {
        let e = Expr::binary(
            BinaryOp::Add,
            Expr::string("ab", sp()),
            Expr::string("cd", sp()),
            sp(),
        );
        let (v, ty, _) = analyze(e);
        assert_eq!(ty, DataType::STRING);
        assert_eq!(v, Some(ConstValue::Str("abcd".into())));
    }

    #[test]
    fn short_circuit_ignores_non_constant_right() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.declare_local(root, "flag", DataType::BOOL);
        let e = Expr::logical(
            LogicalOp::And,
            Expr::boolean(false, sp()),
            Expr::name("flag", sp()),
            sp(),
        )
        .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(e.ty(&ctx), DataType::BOOL);
        assert_eq!(e.value(&ctx), Some(ConstValue::Bool(false)));
    }

    #[test]
    fn comparison_folds_to_bool() {
        let e = Expr::binary(
            BinaryOp::Less,
            Expr::int(3, sp()),
            Expr::float(3.5, sp()),
            sp(),
        );
        let (v, ty, _) = analyze(e);
        assert_eq!(ty, DataType::BOOL);
        assert_eq!(v, Some(ConstValue::Bool(true)));
    }

    #[test]
    fn division_by_constant_zero_is_left_to_the_runtime() {
        let e = Expr::binary(BinaryOp::Divide, Expr::int(1, sp()), Expr::int(0, sp()), sp());
        let (v, ty, diags) = analyze(e);
        assert_eq!(ty, DataType::simple(primitives::INT32));
        assert_eq!(v, None);
        assert!(diags.is_empty());
    }
}
