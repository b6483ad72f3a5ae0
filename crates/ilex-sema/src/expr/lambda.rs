//! Lambdas and their conformance to delegate targets.
//!
//! A lambda has no type of its own: it resolves to a placeholder and only
//! acquires meaning against a delegate-typed target (a parameter, a cast).
//! Unannotated parameters are pinned to the target's parameter types the
//! first time a candidate commits to them; the body is then typed under
//! those pins and its result checked against the delegate's return type.

use ilex_core::{DataType, primitives};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BoundExpr, ExprKind, LambdaParam};

/// A lambda in isolation carries only the placeholder type.
pub fn resolve(_ctx: &AnalysisContext, _params: &[LambdaParam], _body: &BoundExpr) -> DataType {
    DataType::simple(primitives::LAMBDA)
}

/// The parameter and return types of a delegate-shaped target: a named
/// delegate, or a generic instance of the delegate definition whose last
/// argument is the return type.
pub(crate) fn delegate_signature(
    ctx: &AnalysisContext,
    ty: DataType,
) -> Option<(Vec<DataType>, DataType)> {
    let entry = ctx.registry.get_type(ty.deref().unwrap_nullable().type_hash)?;
    if let Some(d) = entry.as_delegate() {
        return Some((d.params.clone(), d.return_type));
    }
    let g = entry.as_generic_instance()?;
    if g.definition != primitives::DELEGATE {
        return None;
    }
    let (ret, params) = g.args.split_last()?;
    Some((params.to_vec(), *ret))
}

/// Whether the lambda node can take the shape of `target`, and at what
/// conversion cost. Pins unannotated parameters as a side effect.
pub(crate) fn conforms(ctx: &AnalysisContext, node: &BoundExpr, target: DataType) -> Option<u32> {
    let ExprKind::Lambda { params, body } = &node.kind else {
        return None;
    };
    let (sig_params, sig_ret) = delegate_signature(ctx, target)?;
    if params.len() != sig_params.len() {
        return None;
    }
    for (i, (p, sig)) in params.iter().zip(&sig_params).enumerate() {
        match p.ty {
            Some(declared) => {
                if declared.deref() != sig.deref() {
                    return None;
                }
            }
            None => ctx.pin_lambda_param(body.scope, i as u32, sig.deref()),
        }
    }
    let body_ty = body.ty(ctx);
    if body_ty.is_error() {
        return None;
    }
    if sig_ret.type_hash == primitives::VOID {
        return Some(1);
    }
    let bv = body.value(ctx);
    let conv = conversion::implicit(ctx, body_ty, bv.as_ref(), sig_ret)?;
    Some(1 + conv.cost)
}
