//! Projection into the canonical lowered form.
//!
//! Lowering consumes the resolutions the analysis queries cached on each
//! node and rewrites the tree so every semantic decision is spelled out:
//! conversions become explicit nodes, short-circuiting and coalescing
//! become conditionals over single-evaluation temporaries, compound
//! assignment evaluates its target once, pointer arithmetic is scaled to
//! byte offsets, and omitted defaulted arguments appear as constants. A
//! node that failed analysis lowers to [`CanonicalExpr::Error`]; callers
//! gate on [`BoundExpr::has_errors`] before handing trees to a backend.

pub mod model;

use ilex_core::{ConstValue, DataType, PrimitiveKind, primitives};
use ilex_registry::{MemberRef, MethodDef, NameResolution, op_names};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{
    BinaryOp, BoundExpr, Callee, ExprKind, IncrementOp, LambdaParam, LogicalOp, Place, UnaryOp,
    lambda,
};
use crate::overload::{
    BuiltinOperator, CallResolution, OperatorResolution, ResolvedOperator,
};

use model::{CallSite, CanonicalExpr, CanonicalPlace, TempDef};

/// Project one analyzed node. Children are reached through their own
/// memoized projections, so shared subtrees lower once.
pub fn project(ctx: &AnalysisContext, node: &BoundExpr) -> CanonicalExpr {
    let ty = node.ty(ctx);
    if ty.is_error() {
        return CanonicalExpr::Error;
    }
    if let Some(value) = node.value(ctx) {
        return CanonicalExpr::Constant { value, ty };
    }
    match &node.kind {
        ExprKind::Literal(v) => CanonicalExpr::Constant {
            value: v.clone(),
            ty,
        },
        ExprKind::This => CanonicalExpr::This { ty },
        // A member without a place is a method group used as a value; it
        // has no lowered form of its own.
        ExprKind::Name(_)
        | ExprKind::Member { .. }
        | ExprKind::StaticMember { .. }
        | ExprKind::Index { .. }
        | ExprKind::Deref { .. } => match lower_place(ctx, node) {
            Some(place) => CanonicalExpr::Read(place),
            None => CanonicalExpr::Error,
        },
        ExprKind::Binary {
            op,
            checked,
            left,
            right,
        } => lower_binary(ctx, node, *op, *checked, left, right),
        ExprKind::Logical { op, left, right } => lower_logical(ctx, node, *op, left, right),
        ExprKind::Coalesce { left, right } => lower_coalesce(ctx, node, left, right),
        ExprKind::Conditional {
            condition,
            when_true,
            when_false,
        } => CanonicalExpr::Conditional {
            condition: Box::new(converted(ctx, condition, DataType::BOOL)),
            when_true: Box::new(converted(ctx, when_true, ty)),
            when_false: Box::new(converted(ctx, when_false, ty)),
            ty,
        },
        ExprKind::Unary {
            op,
            checked,
            operand,
        } => lower_unary(ctx, node, *op, *checked, operand),
        ExprKind::Increment {
            op,
            checked,
            target,
        } => lower_increment(ctx, node, *op, *checked, target),
        ExprKind::Assign { target, value } => lower_assign(ctx, target, value),
        ExprKind::CompoundAssign {
            op,
            checked,
            target,
            value,
        } => lower_compound(ctx, node, *op, *checked, target, value),
        ExprKind::Call {
            callee, arguments, ..
        } => lower_call(ctx, node, callee, arguments),
        ExprKind::New { ty, arguments } => lower_new(ctx, node, *ty, arguments),
        ExprKind::Cast {
            target, operand, ..
        } => lower_cast(ctx, *target, operand),
        ExprKind::AddressOf { operand } => match lower_place(ctx, operand) {
            Some(place) => CanonicalExpr::AddressOf { place, ty },
            None => CanonicalExpr::Error,
        },
        ExprKind::Lambda { params, body } => lower_lambda(ctx, node, params, body),
        ExprKind::Error => CanonicalExpr::Error,
    }
}

/// Lower a child and apply the conversion its use site requires. A missing
/// conversion was already diagnosed during analysis; the operand passes
/// through unwrapped rather than failing twice.
fn converted(ctx: &AnalysisContext, node: &BoundExpr, target: DataType) -> CanonicalExpr {
    let lowered = node.project(ctx).clone();
    let source = node.ty(ctx);
    if source.type_hash == primitives::LAMBDA {
        // The lambda takes its delegate type from the use site.
        if let CanonicalExpr::Lambda { params, body, .. } = lowered {
            return CanonicalExpr::Lambda {
                params,
                body,
                ty: target,
            };
        }
        return lowered;
    }
    let value = node.value(ctx);
    coerce(ctx, source, value.as_ref(), lowered, target)
}

fn coerce(
    ctx: &AnalysisContext,
    source: DataType,
    value: Option<&ConstValue>,
    lowered: CanonicalExpr,
    target: DataType,
) -> CanonicalExpr {
    if source.is_error() || source.deref() == target.deref() {
        return lowered;
    }
    let conv = conversion::implicit(ctx, source, value, target)
        .or_else(|| conversion::explicit(ctx, source, value, target));
    match conv {
        Some(c) if c.is_identity() => lowered,
        Some(c) => CanonicalExpr::Convert {
            operand: Box::new(lowered),
            conversion: c,
            ty: target.deref(),
        },
        None => lowered,
    }
}

/// Map a node's cached [`Place`] to its lowered counterpart, supplying
/// receivers: an explicit one from the member syntax, the implicit `this`
/// for unqualified instance members, none for statics.
fn lower_place(ctx: &AnalysisContext, node: &BoundExpr) -> Option<CanonicalPlace> {
    let place = node.place(ctx)?.clone();
    Some(match place {
        Place::Local {
            scope, index, ty, ..
        } => CanonicalPlace::Local { scope, index, ty },
        Place::Field {
            field,
            is_static,
            ty,
        } => CanonicalPlace::Field {
            receiver: place_receiver(ctx, node, is_static),
            field,
            ty,
        },
        Place::Property {
            property,
            is_static,
            ty,
        } => CanonicalPlace::Property {
            receiver: place_receiver(ctx, node, is_static),
            property,
            ty,
        },
        Place::Indexer { property, ty } => {
            let ExprKind::Index {
                receiver,
                arguments,
            } = &node.kind
            else {
                return None;
            };
            let params = ctx.registry.get_property(property)?.index_params.clone();
            let arguments = arguments
                .iter()
                .zip(params)
                .map(|(a, p)| converted(ctx, a, p))
                .collect();
            CanonicalPlace::Indexer {
                receiver: Box::new(receiver.project(ctx).clone()),
                property,
                arguments,
                ty,
            }
        }
        Place::PointerTarget { ty } => {
            let pointer = match &node.kind {
                ExprKind::Deref { operand } => operand.project(ctx).clone(),
                ExprKind::Index {
                    receiver,
                    arguments,
                } => {
                    let [index] = arguments.as_slice() else {
                        return None;
                    };
                    CanonicalExpr::PointerOffset {
                        offset: Box::new(scaled_offset(ctx, index, ty)),
                        ty: receiver.ty(ctx).deref(),
                        pointer: Box::new(receiver.project(ctx).clone()),
                    }
                }
                _ => return None,
            };
            CanonicalPlace::PointerTarget {
                pointer: Box::new(pointer),
                ty,
            }
        }
    })
}

fn place_receiver(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    is_static: bool,
) -> Option<Box<CanonicalExpr>> {
    if is_static {
        return None;
    }
    if let ExprKind::Member { receiver, .. } = &node.kind {
        return Some(Box::new(receiver.project(ctx).clone()));
    }
    ctx.scopes.get(node.scope).this_type.map(|t| {
        Box::new(CanonicalExpr::This {
            ty: DataType::simple(t),
        })
    })
}

fn lower_binary(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: BinaryOp,
    checked: bool,
    left: &BoundExpr,
    right: &BoundExpr,
) -> CanonicalExpr {
    let Some(res) = node.operator(ctx).cloned() else {
        return CanonicalExpr::Error;
    };
    if let ResolvedOperator::Builtin(BuiltinOperator::PointerOffset(ptr)) = res.operator {
        return lower_pointer_offset(ctx, op, ptr, left, right, &res);
    }
    if let ResolvedOperator::Builtin(BuiltinOperator::PointerDifference(ptr)) = res.operator {
        return lower_pointer_difference(ctx, checked, ptr, left, right);
    }
    let lv = left.value(ctx);
    let rv = right.value(ctx);
    apply_operator(
        ctx,
        &res,
        op,
        checked,
        (left.ty(ctx), lv.as_ref(), left.project(ctx).clone()),
        (right.ty(ctx), rv.as_ref(), right.project(ctx).clone()),
    )
}

/// Carry out a resolved binary operator over two already-lowered operands.
/// Shared by binary nodes, compound assignment and increments.
fn apply_operator(
    ctx: &AnalysisContext,
    res: &OperatorResolution,
    op: BinaryOp,
    checked: bool,
    left: (DataType, Option<&ConstValue>, CanonicalExpr),
    right: (DataType, Option<&ConstValue>, CanonicalExpr),
) -> CanonicalExpr {
    match res.operator {
        ResolvedOperator::UserDefined(method) => {
            let targets = operator_param_types(ctx, method);
            let arguments = vec![
                coerce_to_param(ctx, left, targets.first().copied().flatten()),
                coerce_to_param(ctx, right, targets.get(1).copied().flatten()),
            ];
            CanonicalExpr::Call(CallSite {
                method: Some(method),
                callee: None,
                arguments,
                packed_from: None,
                ty: res.result_type,
            })
        }
        ResolvedOperator::Builtin(b) => {
            let target = if res.lifted {
                res.operand_type.as_nullable()
            } else {
                res.operand_type
            };
            let right_target = if matches!(b, BuiltinOperator::Shift(_)) {
                DataType::simple(primitives::INT32)
            } else {
                target
            };
            CanonicalExpr::Binary {
                op,
                operator: b,
                checked,
                lifted: res.lifted,
                left: Box::new(coerce(ctx, left.0, left.1, left.2, target)),
                right: Box::new(coerce(ctx, right.0, right.1, right.2, right_target)),
                ty: res.result_type,
            }
        }
    }
}

fn operator_param_types(ctx: &AnalysisContext, method: ilex_core::TypeHash) -> Vec<Option<DataType>> {
    ctx.registry
        .get_method(method)
        .map(|def| def.params.iter().map(|p| p.ty.as_exact()).collect())
        .unwrap_or_default()
}

fn coerce_to_param(
    ctx: &AnalysisContext,
    operand: (DataType, Option<&ConstValue>, CanonicalExpr),
    param: Option<DataType>,
) -> CanonicalExpr {
    match param {
        Some(p) => coerce(ctx, operand.0, operand.1, operand.2, p),
        None => operand.2,
    }
}

fn pointee_of(ctx: &AnalysisContext, pointer: ilex_core::TypeHash) -> Option<DataType> {
    ctx.registry
        .get_type(pointer)
        .and_then(|e| e.as_pointer())
        .map(|p| p.pointee)
}

/// The index operand converted to `int64` and scaled to a byte offset.
fn scaled_offset(ctx: &AnalysisContext, index: &BoundExpr, pointee: DataType) -> CanonicalExpr {
    let int64 = DataType::simple(primitives::INT64);
    let idx = converted(ctx, index, int64);
    let size = ctx.registry.byte_size_of(pointee.type_hash).unwrap_or(1);
    if size == 1 {
        return idx;
    }
    CanonicalExpr::Binary {
        op: BinaryOp::Multiply,
        operator: BuiltinOperator::Numeric(PrimitiveKind::Int64),
        checked: false,
        lifted: false,
        left: Box::new(idx),
        right: Box::new(CanonicalExpr::Constant {
            value: ConstValue::I64(i64::from(size)),
            ty: int64,
        }),
        ty: int64,
    }
}

fn lower_pointer_offset(
    ctx: &AnalysisContext,
    op: BinaryOp,
    pointer_ty: ilex_core::TypeHash,
    left: &BoundExpr,
    right: &BoundExpr,
    res: &OperatorResolution,
) -> CanonicalExpr {
    let Some(pointee) = pointee_of(ctx, pointer_ty) else {
        return CanonicalExpr::Error;
    };
    let (pointer, index) = if left.ty(ctx).deref().type_hash == pointer_ty {
        (left, right)
    } else {
        (right, left)
    };
    let int64 = DataType::simple(primitives::INT64);
    let mut offset = scaled_offset(ctx, index, pointee);
    if op == BinaryOp::Subtract {
        offset = CanonicalExpr::Unary {
            op: UnaryOp::Negate,
            operator: BuiltinOperator::UnaryNumeric(PrimitiveKind::Int64),
            checked: false,
            lifted: false,
            operand: Box::new(offset),
            ty: int64,
        };
    }
    CanonicalExpr::PointerOffset {
        pointer: Box::new(pointer.project(ctx).clone()),
        offset: Box::new(offset),
        ty: res.result_type,
    }
}

/// `p - q` is the byte difference divided back down to an element count.
fn lower_pointer_difference(
    ctx: &AnalysisContext,
    checked: bool,
    pointer_ty: ilex_core::TypeHash,
    left: &BoundExpr,
    right: &BoundExpr,
) -> CanonicalExpr {
    let Some(pointee) = pointee_of(ctx, pointer_ty) else {
        return CanonicalExpr::Error;
    };
    let int64 = DataType::simple(primitives::INT64);
    let bytes = CanonicalExpr::Binary {
        op: BinaryOp::Subtract,
        operator: BuiltinOperator::PointerDifference(pointer_ty),
        checked,
        lifted: false,
        left: Box::new(left.project(ctx).clone()),
        right: Box::new(right.project(ctx).clone()),
        ty: int64,
    };
    let size = ctx.registry.byte_size_of(pointee.type_hash).unwrap_or(1);
    if size == 1 {
        return bytes;
    }
    CanonicalExpr::Binary {
        op: BinaryOp::Divide,
        operator: BuiltinOperator::Numeric(PrimitiveKind::Int64),
        checked: false,
        lifted: false,
        left: Box::new(bytes),
        right: Box::new(CanonicalExpr::Constant {
            value: ConstValue::I64(i64::from(size)),
            ty: int64,
        }),
        ty: int64,
    }
}

fn lower_logical(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: LogicalOp,
    left: &BoundExpr,
    right: &BoundExpr,
) -> CanonicalExpr {
    let Some(res) = node.operator(ctx).cloned() else {
        return CanonicalExpr::Error;
    };
    if let Some(test_ty) = res.truth_test {
        let ResolvedOperator::UserDefined(method) = res.operator else {
            return CanonicalExpr::Error;
        };
        let test_name = match op {
            LogicalOp::And => op_names::FALSE,
            LogicalOp::Or => op_names::TRUE,
        };
        let Some(test) = ctx
            .registry
            .operator_candidates(test_ty, test_name)
            .first()
            .copied()
        else {
            return CanonicalExpr::Error;
        };
        let ty = res.result_type;
        let temp = ctx.fresh_temp();
        let read = CanonicalExpr::ReadTemp {
            temp,
            ty: left.ty(ctx).deref(),
        };
        let condition = CanonicalExpr::Call(CallSite {
            method: Some(test),
            callee: None,
            arguments: vec![read.clone()],
            packed_from: None,
            ty: DataType::BOOL,
        });
        let combine = CanonicalExpr::Call(CallSite {
            method: Some(method),
            callee: None,
            arguments: vec![read.clone(), right.project(ctx).clone()],
            packed_from: None,
            ty,
        });
        return CanonicalExpr::Sequence {
            temps: vec![TempDef {
                temp,
                value: left.project(ctx).clone(),
            }],
            result: Box::new(CanonicalExpr::Conditional {
                condition: Box::new(condition),
                when_true: Box::new(read),
                when_false: Box::new(combine),
                ty,
            }),
        };
    }
    let l = converted(ctx, left, DataType::BOOL);
    let r = converted(ctx, right, DataType::BOOL);
    let false_const = CanonicalExpr::Constant {
        value: ConstValue::Bool(false),
        ty: DataType::BOOL,
    };
    let true_const = CanonicalExpr::Constant {
        value: ConstValue::Bool(true),
        ty: DataType::BOOL,
    };
    let (when_true, when_false) = match op {
        LogicalOp::And => (r, false_const),
        LogicalOp::Or => (true_const, r),
    };
    CanonicalExpr::Conditional {
        condition: Box::new(l),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
        ty: DataType::BOOL,
    }
}

fn lower_coalesce(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    left: &BoundExpr,
    right: &BoundExpr,
) -> CanonicalExpr {
    let ty = node.ty(ctx);
    let lt = left.ty(ctx).deref();
    if lt.is_null_literal() {
        return converted(ctx, right, ty);
    }
    let temp = ctx.fresh_temp();
    let read = CanonicalExpr::ReadTemp { temp, ty: lt };
    let when_true = if lt.nullable && !ty.nullable {
        let unwrapped = lt.unwrap_nullable();
        coerce(
            ctx,
            unwrapped,
            None,
            CanonicalExpr::GetValue {
                operand: Box::new(read.clone()),
                ty: unwrapped,
            },
            ty,
        )
    } else {
        coerce(ctx, lt, None, read.clone(), ty)
    };
    CanonicalExpr::Sequence {
        temps: vec![TempDef {
            temp,
            value: left.project(ctx).clone(),
        }],
        result: Box::new(CanonicalExpr::Conditional {
            condition: Box::new(CanonicalExpr::HasValue {
                operand: Box::new(read),
            }),
            when_true: Box::new(when_true),
            when_false: Box::new(converted(ctx, right, ty)),
            ty,
        }),
    }
}

fn lower_unary(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: UnaryOp,
    checked: bool,
    operand: &BoundExpr,
) -> CanonicalExpr {
    let Some(res) = node.operator(ctx).cloned() else {
        return CanonicalExpr::Error;
    };
    match res.operator {
        ResolvedOperator::UserDefined(method) => {
            let targets = operator_param_types(ctx, method);
            let ov = operand.value(ctx);
            let arg = coerce_to_param(
                ctx,
                (operand.ty(ctx), ov.as_ref(), operand.project(ctx).clone()),
                targets.first().copied().flatten(),
            );
            CanonicalExpr::Call(CallSite {
                method: Some(method),
                callee: None,
                arguments: vec![arg],
                packed_from: None,
                ty: res.result_type,
            })
        }
        ResolvedOperator::Builtin(b) => {
            let target = if res.lifted {
                res.operand_type.as_nullable()
            } else {
                res.operand_type
            };
            CanonicalExpr::Unary {
                op,
                operator: b,
                checked,
                lifted: res.lifted,
                operand: Box::new(converted(ctx, operand, target)),
                ty: res.result_type,
            }
        }
    }
}

fn lower_assign(ctx: &AnalysisContext, target: &BoundExpr, value: &BoundExpr) -> CanonicalExpr {
    let Some(place) = lower_place(ctx, target) else {
        return CanonicalExpr::Error;
    };
    let ty = place.ty();
    CanonicalExpr::Assign {
        value: Box::new(converted(ctx, value, ty)),
        place,
        ty,
    }
}

fn lower_compound(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: BinaryOp,
    checked: bool,
    target: &BoundExpr,
    value: &BoundExpr,
) -> CanonicalExpr {
    let Some(res) = node.operator(ctx).cloned() else {
        return CanonicalExpr::Error;
    };
    let mut temps = Vec::new();
    let Some(place) = lower_place_once(ctx, target, &mut temps) else {
        return CanonicalExpr::Error;
    };
    let ty = place.ty();
    let vv = value.value(ctx);
    let stepped = apply_operator(
        ctx,
        &res,
        op,
        checked,
        (ty, None, CanonicalExpr::Read(place.clone())),
        (value.ty(ctx), vv.as_ref(), value.project(ctx).clone()),
    );
    let assign = CanonicalExpr::Assign {
        value: Box::new(coerce(ctx, res.result_type, None, stepped, ty)),
        place,
        ty,
    };
    seal(temps, assign)
}

fn lower_increment(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    op: IncrementOp,
    checked: bool,
    target: &BoundExpr,
) -> CanonicalExpr {
    let Some(res) = node.operator(ctx).cloned() else {
        return CanonicalExpr::Error;
    };
    let mut temps = Vec::new();
    let Some(place) = lower_place_once(ctx, target, &mut temps) else {
        return CanonicalExpr::Error;
    };
    let ty = place.ty();
    let int32 = DataType::simple(primitives::INT32);
    let one = ConstValue::I32(1);
    let step = if op.is_increment() {
        BinaryOp::Add
    } else {
        BinaryOp::Subtract
    };
    let stepped = apply_operator(
        ctx,
        &res,
        step,
        checked,
        (ty, None, CanonicalExpr::Read(place.clone())),
        (
            int32,
            Some(&one),
            CanonicalExpr::Constant {
                value: one.clone(),
                ty: int32,
            },
        ),
    );
    let assign = CanonicalExpr::Assign {
        value: Box::new(coerce(ctx, res.result_type, None, stepped, ty)),
        place: place.clone(),
        ty,
    };
    if op.is_prefix() {
        return seal(temps, assign);
    }
    let old = ctx.fresh_temp();
    temps.push(TempDef {
        temp: old,
        value: CanonicalExpr::Read(place),
    });
    temps.push(TempDef {
        temp: ctx.fresh_temp(),
        value: assign,
    });
    CanonicalExpr::Sequence {
        temps,
        result: Box::new(CanonicalExpr::ReadTemp { temp: old, ty }),
    }
}

fn seal(temps: Vec<TempDef>, result: CanonicalExpr) -> CanonicalExpr {
    if temps.is_empty() {
        result
    } else {
        CanonicalExpr::Sequence {
            temps,
            result: Box::new(result),
        }
    }
}

/// Lower a place for read-modify-write: receivers, index arguments and
/// pointers are hoisted into temporaries so they evaluate exactly once.
fn lower_place_once(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    temps: &mut Vec<TempDef>,
) -> Option<CanonicalPlace> {
    Some(match lower_place(ctx, node)? {
        CanonicalPlace::Field {
            receiver,
            field,
            ty,
        } => CanonicalPlace::Field {
            receiver: receiver.map(|r| Box::new(hoist(ctx, *r, temps))),
            field,
            ty,
        },
        CanonicalPlace::Property {
            receiver,
            property,
            ty,
        } => CanonicalPlace::Property {
            receiver: receiver.map(|r| Box::new(hoist(ctx, *r, temps))),
            property,
            ty,
        },
        CanonicalPlace::Indexer {
            receiver,
            property,
            arguments,
            ty,
        } => CanonicalPlace::Indexer {
            receiver: Box::new(hoist(ctx, *receiver, temps)),
            property,
            arguments: arguments
                .into_iter()
                .map(|a| hoist(ctx, a, temps))
                .collect(),
            ty,
        },
        CanonicalPlace::PointerTarget { pointer, ty } => CanonicalPlace::PointerTarget {
            pointer: Box::new(hoist(ctx, *pointer, temps)),
            ty,
        },
        simple @ (CanonicalPlace::Local { .. } | CanonicalPlace::Temp { .. }) => simple,
    })
}

fn hoist(ctx: &AnalysisContext, expr: CanonicalExpr, temps: &mut Vec<TempDef>) -> CanonicalExpr {
    match expr {
        CanonicalExpr::Constant { .. }
        | CanonicalExpr::This { .. }
        | CanonicalExpr::ReadTemp { .. } => expr,
        _ => {
            let temp = ctx.fresh_temp();
            let ty = expr.ty();
            temps.push(TempDef { temp, value: expr });
            CanonicalExpr::ReadTemp { temp, ty }
        }
    }
}

fn lower_call(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    callee: &Callee<Box<BoundExpr>>,
    arguments: &[Box<BoundExpr>],
) -> CanonicalExpr {
    if let Some(res) = node.call_resolution(ctx).cloned() {
        let is_static = ctx
            .registry
            .get_method(res.method)
            .is_some_and(MethodDef::is_static);
        let callee_expr = if is_static {
            None
        } else {
            match callee {
                Callee::Member { receiver, .. } => Some(Box::new(receiver.project(ctx).clone())),
                Callee::Name(_) => ctx.scopes.get(node.scope).this_type.map(|t| {
                    Box::new(CanonicalExpr::This {
                        ty: DataType::simple(t),
                    })
                }),
                Callee::Static { .. } => None,
            }
        };
        return CanonicalExpr::Call(CallSite {
            method: Some(res.method),
            callee: callee_expr,
            arguments: call_arguments(ctx, &res, arguments),
            packed_from: res.packed_from,
            ty: res.return_type,
        });
    }
    // No resolution: an invocation through a delegate value.
    let Some(delegate) = lower_delegate_callee(ctx, node, callee) else {
        return CanonicalExpr::Error;
    };
    let params = lambda::delegate_signature(ctx, delegate.ty()).map(|(p, _)| p);
    let arguments = arguments
        .iter()
        .enumerate()
        .map(|(i, a)| match params.as_ref().and_then(|p| p.get(i)) {
            Some(&p) => converted(ctx, a, p),
            None => a.project(ctx).clone(),
        })
        .collect();
    CanonicalExpr::Call(CallSite {
        method: None,
        callee: Some(Box::new(delegate)),
        arguments,
        packed_from: None,
        ty: node.ty(ctx),
    })
}

fn lower_delegate_callee(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    callee: &Callee<Box<BoundExpr>>,
) -> Option<CanonicalExpr> {
    match callee {
        Callee::Name(name) => match ctx.scopes.resolve_name(node.scope, name) {
            NameResolution::Local(scope, var) => {
                let ty = if var.ty.type_hash == primitives::LAMBDA {
                    ctx.lambda_param_type(scope, var.index)?
                } else {
                    var.ty
                };
                Some(CanonicalExpr::Read(CanonicalPlace::Local {
                    scope,
                    index: var.index,
                    ty,
                }))
            }
            _ => None,
        },
        Callee::Member { receiver, name } => {
            let base = receiver.ty(ctx).deref().unwrap_nullable().type_hash;
            match ctx.registry.lookup_member(base, name)? {
                MemberRef::Field(field) => {
                    let fe = ctx.registry.get_field(field)?;
                    Some(CanonicalExpr::Read(CanonicalPlace::Field {
                        receiver: (!fe.is_static())
                            .then(|| Box::new(receiver.project(ctx).clone())),
                        field,
                        ty: fe.ty,
                    }))
                }
                MemberRef::Property(property) => {
                    let pe = ctx.registry.get_property(property)?;
                    Some(CanonicalExpr::Read(CanonicalPlace::Property {
                        receiver: (!pe.is_static())
                            .then(|| Box::new(receiver.project(ctx).clone())),
                        property,
                        ty: pe.ty,
                    }))
                }
                MemberRef::MethodGroup(_) => None,
            }
        }
        Callee::Static { .. } => None,
    }
}

/// Supplied arguments in parameter order with their conversions, followed
/// by the constants filling omitted defaulted parameters. Packed arguments
/// convert to the parameter array's element type.
fn call_arguments(
    ctx: &AnalysisContext,
    res: &CallResolution,
    arguments: &[Box<BoundExpr>],
) -> Vec<CanonicalExpr> {
    let mut out = Vec::with_capacity(arguments.len() + res.defaults.len());
    for (i, arg) in arguments.iter().enumerate() {
        let target = match res.packed_from {
            Some(packed) if i >= packed => res.param_types.last().copied(),
            _ => res.param_types.get(i).copied(),
        };
        out.push(match target {
            Some(t) => converted(ctx, arg, t),
            None => arg.project(ctx).clone(),
        });
    }
    for (value, ty) in &res.defaults {
        out.push(CanonicalExpr::Constant {
            value: value.clone(),
            ty: *ty,
        });
    }
    out
}

fn lower_new(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    ty: DataType,
    arguments: &[Box<BoundExpr>],
) -> CanonicalExpr {
    match node.call_resolution(ctx).cloned() {
        Some(res) => CanonicalExpr::New(CallSite {
            method: Some(res.method),
            callee: None,
            arguments: call_arguments(ctx, &res, arguments),
            packed_from: res.packed_from,
            ty,
        }),
        // Default construction of a type with no declared constructors.
        None => CanonicalExpr::New(CallSite {
            method: None,
            callee: None,
            arguments: arguments.iter().map(|a| a.project(ctx).clone()).collect(),
            packed_from: None,
            ty,
        }),
    }
}

fn lower_cast(ctx: &AnalysisContext, target: DataType, operand: &BoundExpr) -> CanonicalExpr {
    let ot = operand.ty(ctx);
    if ot.is_error() {
        return CanonicalExpr::Error;
    }
    if ot.type_hash == primitives::LAMBDA {
        return converted(ctx, operand, target);
    }
    let ov = operand.value(ctx);
    match conversion::explicit(ctx, ot, ov.as_ref(), target) {
        Some(c) if c.is_identity() => operand.project(ctx).clone(),
        Some(c) => CanonicalExpr::Convert {
            operand: Box::new(operand.project(ctx).clone()),
            conversion: c,
            ty: target,
        },
        None => CanonicalExpr::Error,
    }
}

fn lower_lambda(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    params: &[LambdaParam],
    body: &BoundExpr,
) -> CanonicalExpr {
    let params = params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            p.ty.or_else(|| ctx.lambda_param_type(body.scope, i as u32))
                .unwrap_or(DataType::ERROR)
        })
        .collect();
    CanonicalExpr::Lambda {
        params,
        body: Box::new(body.project(ctx).clone()),
        ty: node.ty(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, TypeHash};
    use ilex_registry::{
        ClassEntry, FieldEntry, MemberFlags, Param, PropertyEntry, ScopeId, ScopeTree,
        SymbolRegistry,
    };

    use crate::expr::Expr;

    fn sp() -> Span {
        Span::point(1, 1)
    }

    fn int32() -> DataType {
        DataType::simple(primitives::INT32)
    }

    fn int64() -> DataType {
        DataType::simple(primitives::INT64)
    }

    fn lowered(
        build: impl FnOnce(&mut SymbolRegistry, &mut ScopeTree),
        e: Expr,
    ) -> CanonicalExpr {
        let mut registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        build(&mut registry, &mut scopes);
        let bound = e.bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(!bound.has_errors(&ctx), "unexpected diagnostics: {:?}", sink.diagnostics());
        bound.project(&ctx).clone()
    }

    #[test]
    fn constants_collapse_to_one_node() {
        let e = Expr::binary(
            crate::expr::BinaryOp::Add,
            Expr::int(2, sp()),
            Expr::int(3, sp()),
            sp(),
        );
        let c = lowered(|_, _| {}, e);
        assert_eq!(
            c,
            CanonicalExpr::Constant {
                value: ConstValue::I32(5),
                ty: int32(),
            }
        );
    }

    #[test]
    fn assignment_converts_the_stored_value() {
        let e = Expr::assign(Expr::name("wide", sp()), Expr::name("narrow", sp()), sp());
        let c = lowered(
            |_, scopes| {
                let root = ScopeId(0);
                scopes.declare_local(root, "wide", int64());
                scopes.declare_local(root, "narrow", int32());
            },
            e,
        );
        let CanonicalExpr::Assign { place, value, ty } = c else {
            panic!("expected assignment, got {c:?}");
        };
        assert_eq!(ty, int64());
        assert!(matches!(place, CanonicalPlace::Local { .. }));
        assert!(matches!(*value, CanonicalExpr::Convert { .. }));
    }

    #[test]
    fn logical_and_becomes_a_conditional() {
        let e = Expr::logical(
            LogicalOp::And,
            Expr::name("a", sp()),
            Expr::name("b", sp()),
            sp(),
        );
        let c = lowered(
            |_, scopes| {
                let root = ScopeId(0);
                scopes.declare_local(root, "a", DataType::BOOL);
                scopes.declare_local(root, "b", DataType::BOOL);
            },
            e,
        );
        let CanonicalExpr::Conditional {
            when_true,
            when_false,
            ..
        } = c
        else {
            panic!("expected conditional, got {c:?}");
        };
        assert!(matches!(*when_true, CanonicalExpr::Read(_)));
        assert_eq!(
            *when_false,
            CanonicalExpr::Constant {
                value: ConstValue::Bool(false),
                ty: DataType::BOOL,
            }
        );
    }

    #[test]
    fn coalescing_tests_the_left_operand_once() {
        let e = Expr::coalesce(Expr::name("maybe", sp()), Expr::int(0, sp()), sp());
        let c = lowered(
            |_, scopes| {
                scopes.declare_local(ScopeId(0), "maybe", int32().as_nullable());
            },
            e,
        );
        let CanonicalExpr::Sequence { temps, result } = c else {
            panic!("expected sequence, got {c:?}");
        };
        assert_eq!(temps.len(), 1);
        let CanonicalExpr::Conditional {
            condition,
            when_true,
            ty,
            ..
        } = *result
        else {
            panic!("expected conditional");
        };
        assert_eq!(ty, int32());
        assert!(matches!(*condition, CanonicalExpr::HasValue { .. }));
        assert!(matches!(*when_true, CanonicalExpr::GetValue { .. }));
    }

    #[test]
    fn pointer_indexing_scales_to_bytes() {
        let e = Expr::index(Expr::name("p", sp()), vec![Expr::int(2, sp())], sp());
        let c = lowered(
            |registry, scopes| {
                let ptr = registry.ensure_pointer(int32());
                scopes.declare_local(ScopeId(0), "p", DataType::simple(ptr));
            },
            e,
        );
        let CanonicalExpr::Read(CanonicalPlace::PointerTarget { pointer, ty }) = c else {
            panic!("expected pointer element read, got {c:?}");
        };
        assert_eq!(ty, int32());
        let CanonicalExpr::PointerOffset { offset, .. } = *pointer else {
            panic!("expected scaled pointer offset");
        };
        let CanonicalExpr::Binary { right, .. } = *offset else {
            panic!("expected scaling multiply");
        };
        assert_eq!(
            *right,
            CanonicalExpr::Constant {
                value: ConstValue::I64(4),
                ty: int64(),
            }
        );
    }

    #[test]
    fn post_increment_yields_the_old_value() {
        let e = Expr::increment(IncrementOp::PostIncrement, Expr::name("i", sp()), sp());
        let c = lowered(
            |_, scopes| {
                scopes.declare_local(ScopeId(0), "i", int32());
            },
            e,
        );
        let CanonicalExpr::Sequence { temps, result } = c else {
            panic!("expected sequence, got {c:?}");
        };
        assert_eq!(temps.len(), 2);
        assert!(matches!(temps[0].value, CanonicalExpr::Read(_)));
        assert!(matches!(temps[1].value, CanonicalExpr::Assign { .. }));
        let CanonicalExpr::ReadTemp { temp, ty } = *result else {
            panic!("expected old-value read");
        };
        assert_eq!(temp, temps[0].temp);
        assert_eq!(ty, int32());
    }

    #[test]
    fn omitted_defaults_appear_as_constants() {
        let e = Expr::call_static(
            TypeHash::from_name("Util"),
            "scale",
            vec![Expr::int(3, sp())],
            sp(),
        );
        let c = lowered(
            |registry, _| {
                let util = registry.register_type(ClassEntry::new("Util")).unwrap();
                registry
                    .register_method(
                        MethodDef::new(
                            util,
                            "scale",
                            vec![
                                Param::new("value", int32()),
                                Param::new("factor", int32()).with_default(ConstValue::I32(2)),
                            ],
                            int32(),
                        )
                        .with_flags(MemberFlags::STATIC),
                    )
                    .unwrap();
            },
            e,
        );
        let CanonicalExpr::Call(site) = c else {
            panic!("expected call, got {c:?}");
        };
        assert!(site.method.is_some());
        assert!(site.callee.is_none());
        assert_eq!(site.arguments.len(), 2);
        assert_eq!(
            site.arguments[1],
            CanonicalExpr::Constant {
                value: ConstValue::I32(2),
                ty: int32(),
            }
        );
    }

    #[test]
    fn failed_nodes_project_to_the_error_marker() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let e = Expr::binary(
            crate::expr::BinaryOp::Add,
            Expr::name("ghost", sp()),
            Expr::int(1, sp()),
            sp(),
        )
        .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(e.has_errors(&ctx));
        assert_eq!(e.project(&ctx), &CanonicalExpr::Error);
    }

    #[test]
    fn compound_assignment_evaluates_the_index_argument_once() {
        let e = Expr::compound_assign(
            BinaryOp::Add,
            Expr::index(
                Expr::name("buf", sp()),
                vec![Expr::call_static(
                    TypeHash::from_name("Counter"),
                    "next",
                    vec![],
                    sp(),
                )],
                sp(),
            ),
            Expr::int(1, sp()),
            sp(),
        );
        let c = lowered(
            |registry, scopes| {
                let counter = registry.register_type(ClassEntry::new("Counter")).unwrap();
                registry
                    .register_method(
                        MethodDef::new(counter, "next", vec![], int32())
                            .with_flags(MemberFlags::STATIC),
                    )
                    .unwrap();
                let buf = registry.register_type(ClassEntry::new("Buf")).unwrap();
                let mut item = PropertyEntry::new(buf, "Item", int32());
                item.index_params = vec![int32()];
                registry.register_property(item).unwrap();
                scopes.declare_local(ScopeId(0), "buf", DataType::simple(buf));
            },
            e,
        );
        let CanonicalExpr::Sequence { temps, result } = c else {
            panic!("expected sequence, got {c:?}");
        };
        // One temp for the receiver, one for the computed index.
        assert_eq!(temps.len(), 2);
        assert!(matches!(temps[1].value, CanonicalExpr::Call(_)));
        let CanonicalExpr::Assign { place, value, .. } = *result else {
            panic!("expected assignment result");
        };
        let CanonicalPlace::Indexer { arguments, .. } = &place else {
            panic!("expected indexer place");
        };
        assert!(matches!(arguments[0], CanonicalExpr::ReadTemp { .. }));
        let CanonicalExpr::Binary { left, .. } = *value else {
            panic!("expected the stepped value");
        };
        assert!(matches!(
            *left,
            CanonicalExpr::Read(CanonicalPlace::Indexer { .. })
        ));
    }

    #[test]
    fn instance_field_read_gains_its_receiver() {
        let e = Expr::member(Expr::name("p", sp()), "health", sp());
        let c = lowered(
            |registry, scopes| {
                let player = registry.register_type(ClassEntry::new("Player")).unwrap();
                registry
                    .register_field(FieldEntry::new(player, "health", int32()))
                    .unwrap();
                scopes.declare_local(ScopeId(0), "p", DataType::simple(player));
            },
            e,
        );
        let CanonicalExpr::Read(CanonicalPlace::Field { receiver, ty, .. }) = c else {
            panic!("expected field read, got {c:?}");
        };
        assert_eq!(ty, int32());
        assert!(matches!(
            receiver.as_deref(),
            Some(CanonicalExpr::Read(CanonicalPlace::Local { .. }))
        ));
    }
}
