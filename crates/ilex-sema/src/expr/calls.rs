//! Calls, construction and indexing.

use ilex_core::{DataType, Diagnostic, ErrorKind, TypeHash, primitives};
use ilex_registry::{MemberFlags, MemberRef, NameResolution};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BoundExpr, Callee, Place, lambda};
use crate::overload;

pub fn resolve_call_expr(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    callee: &Callee<Box<BoundExpr>>,
    type_args: &[DataType],
    arguments: &[Box<BoundExpr>],
) -> DataType {
    let args: Vec<&BoundExpr> = arguments.iter().map(Box::as_ref).collect();
    match callee {
        Callee::Name(name) => resolve_named_call(ctx, node, name, type_args, &args),
        Callee::Member { receiver, name } => {
            resolve_member_call(ctx, node, receiver, name, type_args, &args)
        }
        Callee::Static { ty, name } => {
            let methods = ctx.registry.methods_named(*ty, name);
            if methods.is_empty() {
                ctx.report(
                    Diagnostic::new(ErrorKind::NameNotInContext, node.span)
                        .with_arg(name.clone())
                        .with_arg(ctx.type_name(*ty)),
                );
                return DataType::ERROR;
            }
            let (ret, method) = run_resolution(ctx, node, name, &methods, type_args, &args);
            if let Some(method) = method {
                if ctx
                    .registry
                    .get_method(method)
                    .is_some_and(|d| !d.is_static())
                {
                    ctx.report(
                        Diagnostic::new(ErrorKind::ObjectRequired, node.span)
                            .with_arg(name.clone()),
                    );
                    node.mark_error();
                }
            }
            ret
        }
    }
}

/// An unqualified call: a local delegate value, or a method of the
/// enclosing type.
fn resolve_named_call(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    name: &str,
    type_args: &[DataType],
    args: &[&BoundExpr],
) -> DataType {
    match ctx.scopes.resolve_name(node.scope, name) {
        NameResolution::Local(scope, var) => {
            let ty = if var.ty.type_hash == primitives::LAMBDA {
                match ctx.lambda_param_type(scope, var.index) {
                    Some(pinned) => pinned,
                    None => return DataType::ERROR,
                }
            } else {
                var.ty
            };
            invoke_delegate(ctx, node, name, ty, args)
        }
        NameResolution::CyclicAlias(at) => {
            ctx.report(
                Diagnostic::new(ErrorKind::CyclicAlias, node.span)
                    .with_arg(name)
                    .with_related(at),
            );
            DataType::ERROR
        }
        NameResolution::Expanded(expanded) => {
            resolve_implicit_method(ctx, node, &expanded, type_args, args)
        }
        NameResolution::NotFound => resolve_implicit_method(ctx, node, name, type_args, args),
    }
}

fn resolve_implicit_method(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    name: &str,
    type_args: &[DataType],
    args: &[&BoundExpr],
) -> DataType {
    let Some(this) = ctx.scopes.get(node.scope).this_type else {
        ctx.report(Diagnostic::new(ErrorKind::NameNotInContext, node.span).with_arg(name));
        return DataType::ERROR;
    };
    let methods = ctx.registry.methods_named(this, name);
    if methods.is_empty() {
        ctx.report(Diagnostic::new(ErrorKind::NameNotInContext, node.span).with_arg(name));
        return DataType::ERROR;
    }
    run_resolution(ctx, node, name, &methods, type_args, args).0
}

fn resolve_member_call(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    receiver: &BoundExpr,
    name: &str,
    type_args: &[DataType],
    args: &[&BoundExpr],
) -> DataType {
    let rty = receiver.ty(ctx);
    if rty.is_error() {
        return DataType::ERROR;
    }
    if rty.is_null_literal() {
        ctx.report(Diagnostic::new(ErrorKind::ObjectRequired, receiver.span).with_arg(name));
        return DataType::ERROR;
    }
    let base = rty.deref().unwrap_nullable().type_hash;
    let methods = ctx.registry.methods_named(base, name);
    if !methods.is_empty() {
        let (ret, method) = run_resolution(ctx, node, name, &methods, type_args, args);
        if let Some(method) = method {
            if ctx
                .registry
                .get_method(method)
                .is_some_and(|d| d.is_static())
            {
                ctx.report(
                    Diagnostic::new(ErrorKind::ObjectProhibited, node.span).with_arg(name),
                );
                node.mark_error();
            }
        }
        return ret;
    }
    // No method group: a delegate-typed field or property is still callable.
    let delegate_ty = match ctx.registry.lookup_member(base, name) {
        Some(MemberRef::Field(f)) => ctx.registry.get_field(f).map(|fe| fe.ty),
        Some(MemberRef::Property(p)) => ctx.registry.get_property(p).map(|pe| pe.ty),
        _ => None,
    };
    match delegate_ty {
        Some(ty) => invoke_delegate(ctx, node, name, ty, args),
        None => {
            ctx.report(
                Diagnostic::new(ErrorKind::NameNotInContext, node.span)
                    .with_arg(name)
                    .with_arg(ctx.type_name(base)),
            );
            DataType::ERROR
        }
    }
}

fn run_resolution(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    name: &str,
    methods: &[TypeHash],
    type_args: &[DataType],
    args: &[&BoundExpr],
) -> (DataType, Option<TypeHash>) {
    match overload::resolve_call(ctx, node.span, name, methods, type_args, args) {
        Ok(resolution) => {
            let ret = resolution.return_type;
            let method = resolution.method;
            node.set_call(Some(resolution));
            (ret, Some(method))
        }
        Err(diag) => {
            node.set_call(None);
            ctx.report(diag);
            (DataType::ERROR, None)
        }
    }
}

/// Call through a delegate-typed value: the signature is fixed, so this is
/// a plain conversion check rather than overload resolution.
fn invoke_delegate(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    name: &str,
    ty: DataType,
    args: &[&BoundExpr],
) -> DataType {
    let Some((params, ret)) = lambda::delegate_signature(ctx, ty) else {
        ctx.report(Diagnostic::new(ErrorKind::CannotCallNonMethod, node.span).with_arg(name));
        return DataType::ERROR;
    };
    if params.len() != args.len() {
        ctx.report(
            Diagnostic::new(ErrorKind::BadNumberOfArguments, node.span).with_arg(name),
        );
        return DataType::ERROR;
    }
    for (arg, param) in args.iter().zip(&params) {
        let at = arg.ty(ctx);
        if at.is_error() {
            continue;
        }
        let av = arg.value(ctx);
        if conversion::implicit(ctx, at, av.as_ref(), *param).is_none() {
            ctx.report(
                Diagnostic::new(ErrorKind::NoImplicitConversion, arg.span)
                    .with_arg(ctx.type_name(at.deref().unwrap_nullable().type_hash))
                    .with_arg(ctx.type_name(param.unwrap_nullable().type_hash)),
            );
            node.mark_error();
        }
    }
    ret
}

/// `new T(args)`. The expression type is the constructed type regardless of
/// which constructor is picked; a class with no declared constructors still
/// constructs with no arguments.
pub fn resolve_new(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    ty: DataType,
    arguments: &[Box<BoundExpr>],
) -> DataType {
    if ty.is_error() {
        return DataType::ERROR;
    }
    let args: Vec<&BoundExpr> = arguments.iter().map(Box::as_ref).collect();
    let ctors = ctx.registry.constructors_of(ty.type_hash);
    if ctors.is_empty() {
        if !args.is_empty() {
            ctx.report(
                Diagnostic::new(ErrorKind::BadNumberOfArguments, node.span)
                    .with_arg(ctx.type_name(ty.type_hash)),
            );
            node.mark_error();
        }
        return ty;
    }
    match overload::resolve_call(ctx, node.span, ".ctor", &ctors, &[], &args) {
        Ok(resolution) => {
            node.set_call(Some(resolution));
            ty
        }
        Err(diag) => {
            node.set_call(None);
            ctx.report(diag);
            DataType::ERROR
        }
    }
}

/// Indexing. A pointer receiver is element access, scaled like pointer
/// arithmetic; anything else goes through the type's declared indexers.
pub fn resolve_index(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    receiver: &BoundExpr,
    arguments: &[Box<BoundExpr>],
) -> DataType {
    let rty = receiver.ty(ctx);
    if rty.is_error() {
        return DataType::ERROR;
    }
    let base = rty.deref().unwrap_nullable().type_hash;
    if let Some(pointer) = ctx.registry.get_type(base).and_then(|e| e.as_pointer()) {
        if pointer.pointee.is_void() {
            ctx.report(Diagnostic::new(
                ErrorKind::UndefinedOperationOnVoidPointers,
                node.span,
            ));
            return DataType::ERROR;
        }
        let pointee = pointer.pointee;
        let [index] = arguments else {
            ctx.report(Diagnostic::new(ErrorKind::BadNumberOfArguments, node.span));
            return DataType::ERROR;
        };
        let it = index.ty(ctx);
        if !it.is_error() {
            let iv = index.value(ctx);
            let int64 = DataType::simple(primitives::INT64);
            if conversion::implicit(ctx, it, iv.as_ref(), int64).is_none() {
                ctx.report(
                    Diagnostic::new(ErrorKind::NoImplicitConversion, index.span)
                        .with_arg(ctx.type_name(it.deref().unwrap_nullable().type_hash))
                        .with_arg("int64"),
                );
                node.mark_error();
            }
        }
        node.set_place(Some(Place::PointerTarget { ty: pointee }));
        return pointee;
    }

    resolve_indexer(ctx, node, base, arguments)
}

fn resolve_indexer(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    base: TypeHash,
    arguments: &[Box<BoundExpr>],
) -> DataType {
    let candidates = ctx.registry.indexers_of(base);
    if candidates.is_empty() {
        ctx.report(
            Diagnostic::new(ErrorKind::NoMatchingOverload, node.span)
                .with_arg("this[]")
                .with_arg(ctx.type_name(base)),
        );
        return DataType::ERROR;
    }
    let mut best: Option<(TypeHash, u32)> = None;
    let mut tied = false;
    for property in candidates {
        let Some(pe) = ctx.registry.get_property(property) else {
            continue;
        };
        if pe.flags.contains(MemberFlags::INACCESSIBLE) {
            continue;
        }
        if pe.index_params.len() != arguments.len() {
            continue;
        }
        let mut cost = 0u32;
        let mut ok = true;
        for (arg, param) in arguments.iter().zip(&pe.index_params) {
            let at = arg.ty(ctx);
            if at.is_error() {
                continue;
            }
            let av = arg.value(ctx);
            match conversion::implicit(ctx, at, av.as_ref(), *param) {
                Some(conv) => cost += conv.cost,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }
        match best {
            // Derivation order breaks exact ties: the first (most derived)
            // indexer wins over a base declaration of equal cost.
            Some((_, best_cost)) if cost > best_cost => {}
            Some((_, best_cost)) if cost == best_cost => tied = true,
            _ => {
                best = Some((property, cost));
                tied = false;
            }
        }
    }
    match best {
        Some((property, _)) if !tied => {
            let pe = ctx
                .registry
                .get_property(property)
                .expect("ranked indexer exists");
            if !pe.has_getter {
                ctx.report(
                    Diagnostic::new(ErrorKind::InaccessibleTypeMember, node.span)
                        .with_arg(pe.name.clone())
                        .with_related(pe.span),
                );
                node.mark_error();
            }
            let ty = pe.ty;
            node.set_place(Some(Place::Indexer { property, ty }));
            ty
        }
        Some(_) => {
            ctx.report(Diagnostic::new(ErrorKind::AmbiguousCall, node.span).with_arg("this[]"));
            DataType::ERROR
        }
        None => {
            ctx.report(
                Diagnostic::new(ErrorKind::NoMatchingOverload, node.span)
                    .with_arg("this[]")
                    .with_arg(ctx.type_name(base)),
            );
            DataType::ERROR
        }
    }
}
