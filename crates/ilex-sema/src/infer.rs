//! Generic method type-argument inference.
//!
//! Inference unifies the declared parameter patterns against the argument
//! types in two phases. Ordinary arguments contribute immediately; lambda
//! arguments are deferred until their parameter types are known from the
//! rest of the substitution, at which point the lambda body is typed under
//! those pins and its result type feeds back into the substitution. The
//! phases repeat until nothing changes, so a lambda whose result determines
//! another lambda's parameters still converges.

use ilex_core::DataType;
use ilex_registry::{MethodDef, TyPattern};

use crate::context::AnalysisContext;
use crate::conversion;
use crate::expr::{BoundExpr, ExprKind, lambda};

/// Infer the type arguments of `def` from the call-site arguments. `None`
/// when any type parameter stays unresolved or the arguments disagree.
pub fn infer_type_args(
    ctx: &AnalysisContext,
    def: &MethodDef,
    args: &[&BoundExpr],
) -> Option<Vec<DataType>> {
    let mut subst: Vec<Option<DataType>> = vec![None; def.type_params.len()];
    let fixed = if def.param_array().is_some() {
        def.params.len() - 1
    } else {
        def.params.len()
    };
    let pattern_for = |i: usize| -> Option<&TyPattern> {
        if i < fixed {
            def.params.get(i).map(|p| &p.ty)
        } else {
            def.params.get(fixed).map(|p| &p.ty)
        }
    };

    for (i, arg) in args.iter().enumerate() {
        if matches!(arg.kind, ExprKind::Lambda { .. }) {
            continue;
        }
        let ty = arg.ty(ctx);
        if ty.is_error() || ty.is_null_literal() {
            continue;
        }
        let pattern = pattern_for(i)?;
        if !unify(ctx, pattern, ty.deref(), &mut subst) {
            return None;
        }
    }

    // Lambda arguments join once their parameter types are determined;
    // repeat until the substitution stops growing.
    loop {
        let before = subst.clone();
        for (i, arg) in args.iter().enumerate() {
            let ExprKind::Lambda { params, body } = &arg.kind else {
                continue;
            };
            let Some(TyPattern::Fn {
                params: param_patterns,
                ret,
            }) = pattern_for(i)
            else {
                continue;
            };
            if param_patterns.len() != params.len() {
                return None;
            }
            let mut pinned = Vec::with_capacity(param_patterns.len());
            for pattern in param_patterns {
                match pattern.substitute(&subst) {
                    Some(ty) => pinned.push(ty),
                    None => {
                        pinned.clear();
                        break;
                    }
                }
            }
            if pinned.len() != param_patterns.len() {
                continue;
            }
            for (slot, ty) in pinned.iter().enumerate() {
                ctx.pin_lambda_param(body.scope, slot as u32, *ty);
            }
            let body_ty = body.ty(ctx);
            if body_ty.is_error() {
                return None;
            }
            if ret.is_open() && !unify(ctx, ret, body_ty.deref(), &mut subst) {
                return None;
            }
        }
        if subst == before {
            break;
        }
    }

    subst.into_iter().collect()
}

/// Unify one declared pattern against one concrete argument type,
/// accumulating bindings. A type parameter bound twice reconciles to the
/// more general of the two types when one converts to the other.
fn unify(
    ctx: &AnalysisContext,
    pattern: &TyPattern,
    ty: DataType,
    subst: &mut Vec<Option<DataType>>,
) -> bool {
    match pattern {
        TyPattern::Exact(_) => true,
        TyPattern::Param(i) => {
            let i = *i as usize;
            let Some(slot) = subst.get(i).copied() else {
                return false;
            };
            match slot {
                None => {
                    subst[i] = Some(ty);
                    true
                }
                Some(existing) if existing == ty => true,
                Some(existing) => {
                    if conversion::implicit(ctx, ty, None, existing).is_some() {
                        true
                    } else if conversion::implicit(ctx, existing, None, ty).is_some() {
                        subst[i] = Some(ty);
                        true
                    } else {
                        false
                    }
                }
            }
        }
        TyPattern::Nullable(inner) => unify(ctx, inner, ty.unwrap_nullable(), subst),
        TyPattern::Instance { definition, args } => {
            let Some(instance) = ctx
                .registry
                .get_type(ty.type_hash)
                .and_then(|e| e.as_generic_instance())
            else {
                return false;
            };
            if instance.definition != *definition || instance.args.len() != args.len() {
                return false;
            }
            let instance_args = instance.args.clone();
            args.iter()
                .zip(instance_args)
                .all(|(p, a)| unify(ctx, p, a, subst))
        }
        TyPattern::Fn { params, ret } => {
            let Some((sig_params, sig_ret)) = lambda::delegate_signature(ctx, ty) else {
                return false;
            };
            if params.len() != sig_params.len() {
                return false;
            }
            params
                .iter()
                .zip(sig_params)
                .all(|(p, a)| unify(ctx, p, a, subst))
                && unify(ctx, ret, sig_ret, subst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, primitives};
    use ilex_registry::{ClassEntry, Param, ScopeTree, SymbolRegistry};

    use crate::expr::Expr;

    fn generic_identity(registry: &mut SymbolRegistry) -> MethodDef {
        let host = registry.register_type(ClassEntry::new("Seq")).unwrap();
        MethodDef::generic(
            host,
            "identity",
            vec!["T".into()],
            vec![Param::patterned("value", TyPattern::Param(0))],
            TyPattern::Param(0),
        )
    }

    #[test]
    fn argument_type_binds_the_parameter() {
        let mut registry = SymbolRegistry::with_primitives();
        let def = generic_identity(&mut registry);
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let arg = Expr::int(7, Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let inferred = infer_type_args(&ctx, &def, &[&arg]).unwrap();
        assert_eq!(inferred, vec![DataType::simple(primitives::INT32)]);
    }

    #[test]
    fn conflicting_bindings_reconcile_to_the_wider_type() {
        let mut registry = SymbolRegistry::with_primitives();
        let host = registry.register_type(ClassEntry::new("Seq")).unwrap();
        let def = MethodDef::generic(
            host,
            "pair",
            vec!["T".into()],
            vec![
                Param::patterned("a", TyPattern::Param(0)),
                Param::patterned("b", TyPattern::Param(0)),
            ],
            TyPattern::Param(0),
        );
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(1, Span::point(1, 1)).bind(root, &mut scopes);
        let b = Expr::literal(ilex_core::ConstValue::I64(2), Span::point(1, 4))
            .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let inferred = infer_type_args(&ctx, &def, &[&a, &b]).unwrap();
        assert_eq!(inferred, vec![DataType::simple(primitives::INT64)]);
    }

    #[test]
    fn irreconcilable_bindings_fail() {
        let mut registry = SymbolRegistry::with_primitives();
        let host = registry.register_type(ClassEntry::new("Seq")).unwrap();
        let def = MethodDef::generic(
            host,
            "pair",
            vec!["T".into()],
            vec![
                Param::patterned("a", TyPattern::Param(0)),
                Param::patterned("b", TyPattern::Param(0)),
            ],
            TyPattern::Param(0),
        );
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::boolean(true, Span::point(1, 1)).bind(root, &mut scopes);
        let b = Expr::string("x", Span::point(1, 6)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(infer_type_args(&ctx, &def, &[&a, &b]).is_none());
    }

    #[test]
    fn unbound_parameters_fail_inference() {
        let mut registry = SymbolRegistry::with_primitives();
        let host = registry.register_type(ClassEntry::new("Seq")).unwrap();
        let def = MethodDef::generic(
            host,
            "make",
            vec!["T".into()],
            vec![Param::new("count", DataType::simple(primitives::INT32))],
            TyPattern::Param(0),
        );
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let arg = Expr::int(3, Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(infer_type_args(&ctx, &def, &[&arg]).is_none());
    }
}
