//! Assignment targets: writability and the value-to-place conversion.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, primitives};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BinaryOp, BoundExpr, IncrementOp, Place};
use crate::overload;

pub fn resolve_assign(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    target: &BoundExpr,
    value: &BoundExpr,
) -> DataType {
    let tt = target.ty(ctx);
    if tt.is_error() {
        return DataType::ERROR;
    }
    let Some(place) = target.place(ctx).cloned() else {
        ctx.report(Diagnostic::new(
            ErrorKind::AssignmentLeftHandValueExpected,
            target.span,
        ));
        return DataType::ERROR;
    };
    check_writable(ctx, node, &place);

    let vt = value.ty(ctx);
    if !vt.is_error() {
        let vv = value.value(ctx);
        if conversion::implicit(ctx, vt, vv.as_ref(), place.ty()).is_none() {
            ctx.report(
                Diagnostic::new(ErrorKind::NoImplicitConversion, value.span)
                    .with_arg(ctx.type_name(vt.deref().unwrap_nullable().type_hash))
                    .with_arg(ctx.type_name(place.ty().unwrap_nullable().type_hash)),
            );
            node.mark_error();
        }
    }
    node.set_place(Some(place));
    tt.deref()
}

/// `target op= value` resolves the underlying binary operator over the
/// target and value types, then requires the result to come back to the
/// target type. A result that only converts back explicitly is accepted
/// when the value itself fits the target, which keeps `b += 1` legal for
/// the narrow integer types.
pub fn resolve_compound(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: BinaryOp,
    target: &BoundExpr,
    value: &BoundExpr,
) -> DataType {
    let tt = target.ty(ctx);
    let vt = value.ty(ctx);
    if tt.is_error() || vt.is_error() {
        return DataType::ERROR;
    }
    let Some(place) = target.place(ctx).cloned() else {
        ctx.report(Diagnostic::new(
            ErrorKind::AssignmentLeftHandValueExpected,
            target.span,
        ));
        return DataType::ERROR;
    };
    check_writable(ctx, node, &place);

    let vv = value.value(ctx);
    match overload::resolve_binary(ctx, op, node.span, tt, None, vt, vv.as_ref()) {
        Ok(resolution) => {
            let result = resolution.result_type;
            node.set_operator(Some(resolution));
            let back_implicit = conversion::implicit(ctx, result, None, place.ty()).is_some();
            let back_narrowing = conversion::explicit(ctx, result, None, place.ty()).is_some()
                && conversion::implicit(ctx, vt, vv.as_ref(), place.ty()).is_some();
            if !back_implicit && !back_narrowing {
                ctx.report(
                    Diagnostic::new(ErrorKind::NoImplicitConversion, node.span)
                        .with_arg(ctx.type_name(result.unwrap_nullable().type_hash))
                        .with_arg(ctx.type_name(place.ty().unwrap_nullable().type_hash)),
                );
                node.mark_error();
            }
            node.set_place(Some(place));
            tt.deref()
        }
        Err(diag) => {
            node.set_operator(None);
            node.set_place(Some(place));
            ctx.report(diag);
            DataType::ERROR
        }
    }
}

/// `++x` and friends: add or subtract one, store back, and take the target
/// type. The step result narrows back explicitly, which is what keeps the
/// small integer types incrementable.
pub fn resolve_increment(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: IncrementOp,
    target: &BoundExpr,
) -> DataType {
    let tt = target.ty(ctx);
    if tt.is_error() {
        return DataType::ERROR;
    }
    let Some(place) = target.place(ctx).cloned() else {
        ctx.report(Diagnostic::new(
            ErrorKind::AssignmentLeftHandValueExpected,
            target.span,
        ));
        return DataType::ERROR;
    };
    check_writable(ctx, node, &place);

    let bop = if op.is_increment() {
        BinaryOp::Add
    } else {
        BinaryOp::Subtract
    };
    let one = ConstValue::I32(1);
    let int32 = DataType::simple(primitives::INT32);
    match overload::resolve_binary(ctx, bop, node.span, tt, None, int32, Some(&one)) {
        Ok(resolution) => {
            let result = resolution.result_type;
            node.set_operator(Some(resolution));
            if conversion::explicit(ctx, result, None, place.ty()).is_none() {
                ctx.report(
                    Diagnostic::new(ErrorKind::NoImplicitConversion, node.span)
                        .with_arg(ctx.type_name(result.unwrap_nullable().type_hash))
                        .with_arg(ctx.type_name(place.ty().unwrap_nullable().type_hash)),
                );
                node.mark_error();
            }
            node.set_place(Some(place));
            tt.deref()
        }
        Err(diag) => {
            node.set_operator(None);
            node.set_place(Some(place));
            ctx.report(diag);
            DataType::ERROR
        }
    }
}

/// Readonly fields write only inside a constructor of their declaring
/// type; properties and indexers need a setter. The node type survives
/// either way so downstream analysis continues.
fn check_writable(ctx: &AnalysisContext, node: &BoundExpr, place: &Place) {
    match place {
        Place::Field { field, .. } => {
            if let Some(fe) = ctx.registry.get_field(*field) {
                let in_own_ctor =
                    ctx.scopes.get(node.scope).constructor_of == Some(fe.declaring_type);
                if fe.is_readonly() && !in_own_ctor {
                    ctx.report(
                        Diagnostic::new(ErrorKind::ReadonlyFieldAssignment, node.span)
                            .with_arg(fe.name.clone())
                            .with_related(fe.span),
                    );
                    node.mark_error();
                }
            }
        }
        Place::Property { property, .. } | Place::Indexer { property, .. } => {
            if let Some(pe) = ctx.registry.get_property(*property) {
                if !pe.has_setter {
                    ctx.report(
                        Diagnostic::new(ErrorKind::PropertyHasNoSetter, node.span)
                            .with_arg(pe.name.clone())
                            .with_related(pe.span),
                    );
                    node.mark_error();
                }
            }
        }
        Place::Local { .. } | Place::PointerTarget { .. } => {}
    }
}
