//! Unary operators, address-of, and dereference.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, PrimitiveKind, TypeHash};

use crate::context::AnalysisContext;
use crate::expr::{BoundExpr, Place, UnaryOp};
use crate::fold::{self, Folded};
use crate::overload::{self, BuiltinOperator, ResolvedOperator};

pub fn resolve(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: UnaryOp,
    operand: &BoundExpr,
) -> DataType {
    let ty = operand.ty(ctx);
    if ty.is_error() {
        return DataType::ERROR;
    }
    let value = operand.value(ctx);
    match overload::resolve_unary(ctx, op, node.span, ty, value.as_ref()) {
        Ok(resolution) => {
            let result = resolution.result_type;
            node.set_operator(Some(resolution));
            result
        }
        Err(diag) => {
            node.set_operator(None);
            ctx.report(diag);
            DataType::ERROR
        }
    }
}

/// `&x` requires an addressable operand and yields `T*` for an operand of
/// type `T`. The pointer type must already be known to the registry; an
/// unregistered pointee still produces the structural hash so downstream
/// consumers agree on identity.
pub fn resolve_address_of(ctx: &AnalysisContext, node: &BoundExpr, operand: &BoundExpr) -> DataType {
    let ty = operand.ty(ctx);
    if ty.is_error() {
        return DataType::ERROR;
    }
    if operand.place(ctx).is_none() {
        ctx.report(Diagnostic::new(ErrorKind::CannotTakeAddress, node.span));
        return DataType::ERROR;
    }
    DataType::simple(TypeHash::pointer_to(ty.deref().type_hash))
}

/// `*p` requires a non-void pointer and denotes the pointed-to storage.
pub fn resolve_deref(ctx: &AnalysisContext, node: &BoundExpr, operand: &BoundExpr) -> DataType {
    let ty = operand.ty(ctx);
    if ty.is_error() {
        return DataType::ERROR;
    }
    let Some(pointer) = ctx
        .registry
        .get_type(ty.deref().type_hash)
        .and_then(|e| e.as_pointer())
    else {
        ctx.report(
            Diagnostic::new(ErrorKind::BadUnaryOperation, node.span)
                .with_arg("*")
                .with_arg(ctx.type_name(ty.deref().type_hash)),
        );
        return DataType::ERROR;
    };
    if pointer.pointee.is_void() {
        ctx.report(Diagnostic::new(
            ErrorKind::UndefinedOperationOnVoidPointers,
            node.span,
        ));
        return DataType::ERROR;
    }
    let pointee = pointer.pointee;
    node.set_place(Some(Place::PointerTarget { ty: pointee }));
    pointee
}

pub fn evaluate(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: UnaryOp,
    checked: bool,
    operand: &BoundExpr,
) -> Option<ConstValue> {
    let resolution = node.operator(ctx)?.clone();
    let v = operand.value(ctx)?;
    if resolution.lifted && v == ConstValue::Null {
        return Some(ConstValue::Null);
    }
    let folded = match resolution.operator {
        ResolvedOperator::Builtin(BuiltinOperator::UnaryNumeric(kind))
        | ResolvedOperator::Builtin(BuiltinOperator::Complement(kind)) => {
            let v = v.convert_to(kind)?;
            fold::unary(op, kind, checked, &v)
        }
        ResolvedOperator::Builtin(BuiltinOperator::BoolNot) => {
            fold::unary(op, PrimitiveKind::Bool, checked, &v)
        }
        ResolvedOperator::Builtin(BuiltinOperator::EnumComplement(e)) => {
            let kind = PrimitiveKind::of(ctx.enum_underlying(e)?)?;
            let v = v.convert_to(kind)?;
            fold::unary(op, kind, checked, &v)
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
