//! Operator and call overload resolution.
//!
//! Resolution runs in two tiers for operators: user-defined operator
//! methods on the operand types are considered first, and only when none
//! applies does the built-in candidate set come into play. Calls rank every
//! accessible signature of the method group by conversion cost, with
//! defaulted parameters and parameter-array packing as costed fallbacks.

pub mod builtin;
pub mod ranking;

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, Span, TypeHash};
use ilex_registry::{MemberFlags, MethodDef};

pub use builtin::BuiltinOperator;

use crate::context::AnalysisContext;
use crate::conversion::{self, COST_LIFT};
use crate::expr::{BinaryOp, BoundExpr, ExprKind, UnaryOp, lambda};
use crate::infer;
use crate::overload::ranking::{Candidate, Ranked};

/// Cost added per parameter filled from its declared default.
const COST_DEFAULTED: u32 = 1;
/// Cost added when trailing arguments are packed into a parameter array.
const COST_PACKED: u32 = 16;

/// How a resolved operator is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedOperator {
    /// A built-in operator form.
    Builtin(BuiltinOperator),
    /// A user-declared static operator method.
    UserDefined(TypeHash),
}

/// The outcome of operator resolution, cached on the operator node.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorResolution {
    /// What carries the operation out.
    pub operator: ResolvedOperator,
    /// The common operand type the operands convert to (for user-defined
    /// operators, the declaring type).
    pub operand_type: DataType,
    /// The expression's result type.
    pub result_type: DataType,
    /// Whether the operator is lifted over nullable operands.
    pub lifted: bool,
    /// For `&&`/`||` carried by a user-defined `&`/`|`: the type whose
    /// `op_True`/`op_False` decides the short circuit.
    pub truth_test: Option<TypeHash>,
}

/// The outcome of call resolution, cached on the call node.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResolution {
    /// The selected method.
    pub method: TypeHash,
    /// Generic type arguments, explicit or inferred; empty for non-generic
    /// methods.
    pub type_args: Vec<DataType>,
    /// Concrete parameter types after substitution. For a parameter array
    /// the last entry is the element type.
    pub param_types: Vec<DataType>,
    /// Values substituted for omitted defaulted parameters, in parameter
    /// order.
    pub defaults: Vec<(ConstValue, DataType)>,
    /// When trailing arguments are packed into the parameter array, the
    /// index of the first packed argument.
    pub packed_from: Option<usize>,
    /// The call's result type.
    pub return_type: DataType,
}

fn describe(ctx: &AnalysisContext, ty: DataType) -> String {
    let mut name = ctx.type_name(ty.deref().unwrap_nullable().type_hash);
    if ty.deref().nullable {
        name.push('?');
    }
    name
}

fn is_void_pointer(ctx: &AnalysisContext, ty: DataType) -> bool {
    ctx.registry
        .get_type(ty.deref().type_hash)
        .and_then(|e| e.as_pointer())
        .is_some_and(|p| p.pointee.is_void())
}

/// Resolve a binary operator over two operand types.
pub fn resolve_binary(
    ctx: &AnalysisContext,
    op: BinaryOp,
    span: Span,
    lt: DataType,
    lv: Option<&ConstValue>,
    rt: DataType,
    rv: Option<&ConstValue>,
) -> Result<OperatorResolution, Diagnostic> {
    // Pointer arithmetic needs an element size, which void* does not have.
    if (op == BinaryOp::Add || op == BinaryOp::Subtract)
        && (is_void_pointer(ctx, lt) || is_void_pointer(ctx, rt))
    {
        return Err(Diagnostic::new(
            ErrorKind::UndefinedOperationOnVoidPointers,
            span,
        ));
    }
    let user = user_binary_candidates(ctx, op, lt, lv, rt, rv);
    let pool = if user.is_empty() {
        builtin::binary_candidates(ctx, op, lt, lv, rt, rv)
    } else {
        user
    };
    match ranking::pick(pool) {
        Ranked::Best(res) => Ok(res),
        Ranked::Ambiguous(items) => Err(ambiguous_operator(ctx, span, &items)),
        Ranked::NoMatch => Err(Diagnostic::new(ErrorKind::BadBinaryOperation, span)
            .with_arg(op.op_name())
            .with_arg(describe(ctx, lt))
            .with_arg(describe(ctx, rt))),
    }
}

/// Resolve a unary operator over its operand type.
pub fn resolve_unary(
    ctx: &AnalysisContext,
    op: UnaryOp,
    span: Span,
    ty: DataType,
    value: Option<&ConstValue>,
) -> Result<OperatorResolution, Diagnostic> {
    let user = user_unary_candidates(ctx, op, ty, value);
    let pool = if user.is_empty() {
        builtin::unary_candidates(ctx, op, ty, value)
    } else {
        user
    };
    match ranking::pick(pool) {
        Ranked::Best(res) => Ok(res),
        Ranked::Ambiguous(items) => Err(ambiguous_operator(ctx, span, &items)),
        Ranked::NoMatch => Err(Diagnostic::new(ErrorKind::BadUnaryOperation, span)
            .with_arg(op.op_name())
            .with_arg(describe(ctx, ty))),
    }
}

fn ambiguous_operator(
    ctx: &AnalysisContext,
    span: Span,
    items: &[OperatorResolution],
) -> Diagnostic {
    let mut diag = Diagnostic::new(ErrorKind::AmbiguousCall, span);
    for item in items {
        if let ResolvedOperator::UserDefined(method) = item.operator {
            if let Some(def) = ctx.registry.get_method(method) {
                diag = diag.with_related(def.span);
            }
        }
    }
    diag
}

fn operator_methods(ctx: &AnalysisContext, name: &str, types: &[DataType]) -> Vec<TypeHash> {
    let mut methods: Vec<TypeHash> = Vec::new();
    for ty in types {
        for m in ctx
            .registry
            .operator_candidates(ty.deref().unwrap_nullable().type_hash, name)
        {
            if !methods.contains(&m) {
                methods.push(m);
            }
        }
    }
    methods
}

fn user_binary_candidates(
    ctx: &AnalysisContext,
    op: BinaryOp,
    lt: DataType,
    lv: Option<&ConstValue>,
    rt: DataType,
    rv: Option<&ConstValue>,
) -> Vec<Candidate<OperatorResolution>> {
    let mut out = Vec::new();
    let methods = operator_methods(ctx, op.op_name(), &[lt, rt]);
    let either_nullable = lt.deref().nullable || rt.deref().nullable;
    for (depth, method) in methods.into_iter().enumerate() {
        let Some(def) = ctx.registry.get_method(method) else {
            continue;
        };
        let [p0, p1] = def.params.as_slice() else {
            continue;
        };
        let (Some(p0), Some(p1)) = (p0.ty.as_exact(), p1.ty.as_exact()) else {
            continue;
        };
        let Some(ret) = def.return_type.as_exact() else {
            continue;
        };
        for lifted in [false, true] {
            if lifted && !(either_nullable && !p0.nullable && !p1.nullable) {
                continue;
            }
            let (ls, rs) = if lifted {
                (lt.deref().unwrap_nullable(), rt.deref().unwrap_nullable())
            } else {
                (lt, rt)
            };
            let (Some(lc), Some(rc)) = (
                conversion::implicit(ctx, ls, lv, p0),
                conversion::implicit(ctx, rs, rv, p1),
            ) else {
                continue;
            };
            let result = if lifted && ret != DataType::BOOL {
                ret.as_nullable()
            } else {
                ret
            };
            out.push(Candidate {
                item: OperatorResolution {
                    operator: ResolvedOperator::UserDefined(method),
                    operand_type: DataType::simple(def.declaring_type),
                    result_type: result,
                    lifted,
                    truth_test: None,
                },
                cost: lc.cost + rc.cost + if lifted { COST_LIFT } else { 0 },
                exact_matches: u32::from(lc.is_identity()) + u32::from(rc.is_identity()),
                depth: depth as u32,
            });
            // The unlifted form applied; the lifted one would only lose.
            break;
        }
    }
    out
}

fn user_unary_candidates(
    ctx: &AnalysisContext,
    op: UnaryOp,
    ty: DataType,
    value: Option<&ConstValue>,
) -> Vec<Candidate<OperatorResolution>> {
    let mut out = Vec::new();
    let methods = operator_methods(ctx, op.op_name(), &[ty]);
    let nullable = ty.deref().nullable;
    for (depth, method) in methods.into_iter().enumerate() {
        let Some(def) = ctx.registry.get_method(method) else {
            continue;
        };
        let [param] = def.params.as_slice() else {
            continue;
        };
        let Some(param) = param.ty.as_exact() else {
            continue;
        };
        let Some(ret) = def.return_type.as_exact() else {
            continue;
        };
        for lifted in [false, true] {
            if lifted && !(nullable && !param.nullable) {
                continue;
            }
            let src = if lifted {
                ty.deref().unwrap_nullable()
            } else {
                ty
            };
            let Some(c) = conversion::implicit(ctx, src, value, param) else {
                continue;
            };
            let result = if lifted && ret != DataType::BOOL {
                ret.as_nullable()
            } else {
                ret
            };
            out.push(Candidate {
                item: OperatorResolution {
                    operator: ResolvedOperator::UserDefined(method),
                    operand_type: DataType::simple(def.declaring_type),
                    result_type: result,
                    lifted,
                    truth_test: None,
                },
                cost: c.cost + if lifted { COST_LIFT } else { 0 },
                exact_matches: u32::from(c.is_identity()),
                depth: depth as u32,
            });
            break;
        }
    }
    out
}

enum CandidateOutcome {
    Viable(Candidate<CallResolution>),
    BadArity,
    NoInference,
    NotApplicable,
}

/// Resolve a call of `name` against the ordered method group `methods`
/// (most-derived declarations first).
pub fn resolve_call(
    ctx: &AnalysisContext,
    span: Span,
    name: &str,
    methods: &[TypeHash],
    explicit_type_args: &[DataType],
    args: &[&BoundExpr],
) -> Result<CallResolution, Diagnostic> {
    let mut pool = Vec::new();
    let mut considered = Vec::new();
    let mut arity_failures = 0usize;
    let mut signature_failures = 0usize;
    let mut inference_failed = false;
    let mut inaccessible = false;
    for (depth, &method) in methods.iter().enumerate() {
        let Some(def) = ctx.registry.get_method(method) else {
            continue;
        };
        considered.push(def.span);
        if def.flags.contains(MemberFlags::INACCESSIBLE) {
            inaccessible = true;
            continue;
        }
        match check_candidate(ctx, def, explicit_type_args, args) {
            CandidateOutcome::Viable(mut c) => {
                c.depth = depth as u32;
                pool.push(c);
            }
            CandidateOutcome::BadArity => arity_failures += 1,
            CandidateOutcome::NoInference => inference_failed = true,
            CandidateOutcome::NotApplicable => signature_failures += 1,
        }
    }
    match ranking::pick(pool) {
        Ranked::Best(res) => Ok(res),
        Ranked::Ambiguous(items) => {
            let mut diag = Diagnostic::new(ErrorKind::AmbiguousCall, span).with_arg(name);
            for item in &items {
                if let Some(def) = ctx.registry.get_method(item.method) {
                    diag = diag.with_related(def.span);
                }
            }
            Err(diag)
        }
        Ranked::NoMatch => {
            let kind = if inference_failed {
                ErrorKind::CantInferMethTypeArgs
            } else if inaccessible && signature_failures == 0 && arity_failures == 0 {
                ErrorKind::InaccessibleTypeMember
            } else if arity_failures > 0 && signature_failures == 0 {
                ErrorKind::BadNumberOfArguments
            } else {
                ErrorKind::NoMatchingOverload
            };
            let mut diag = Diagnostic::new(kind, span).with_arg(name);
            for related in considered {
                diag = diag.with_related(related);
            }
            Err(diag)
        }
    }
}

fn check_candidate(
    ctx: &AnalysisContext,
    def: &MethodDef,
    explicit_type_args: &[DataType],
    args: &[&BoundExpr],
) -> CandidateOutcome {
    let n = def.params.len();
    let has_pack = def.param_array().is_some();
    let fixed = if has_pack { n - 1 } else { n };
    if args.len() < def.required_params() || (!has_pack && args.len() > n) {
        return CandidateOutcome::BadArity;
    }
    let type_args: Vec<DataType> = if def.is_generic() {
        if !explicit_type_args.is_empty() {
            if explicit_type_args.len() != def.type_params.len() {
                return CandidateOutcome::BadArity;
            }
            explicit_type_args.to_vec()
        } else {
            match infer::infer_type_args(ctx, def, args) {
                Some(inferred) => inferred,
                None => return CandidateOutcome::NoInference,
            }
        }
    } else {
        Vec::new()
    };
    let subst: Vec<Option<DataType>> = type_args.iter().copied().map(Some).collect();
    let mut param_types = Vec::with_capacity(n);
    for p in &def.params {
        let Some(concrete) = p.ty.substitute(&subst) else {
            return CandidateOutcome::NotApplicable;
        };
        param_types.push(concrete);
    }
    let Some(return_type) = def.return_type.substitute(&subst) else {
        return CandidateOutcome::NotApplicable;
    };

    let mut cost = 0u32;
    let mut exact = 0u32;
    for (i, arg) in args.iter().enumerate() {
        let target = if has_pack && i >= fixed {
            param_types[fixed]
        } else {
            param_types[i]
        };
        match argument_cost(ctx, arg, target) {
            Some((c, is_exact)) => {
                cost += c;
                exact += u32::from(is_exact);
            }
            None => return CandidateOutcome::NotApplicable,
        }
    }
    let mut defaults = Vec::new();
    for i in args.len()..fixed {
        let Some(value) = def.params[i].default_value.clone() else {
            return CandidateOutcome::BadArity;
        };
        defaults.push((value, param_types[i]));
        cost += COST_DEFAULTED;
    }
    let packed_from = has_pack.then_some(fixed);
    if has_pack {
        cost += COST_PACKED;
    }
    CandidateOutcome::Viable(Candidate {
        item: CallResolution {
            method: def.hash,
            type_args,
            param_types,
            defaults,
            packed_from,
            return_type,
        },
        cost,
        exact_matches: exact,
        depth: 0,
    })
}

/// Conversion cost of one argument against its parameter type. Lambdas are
/// checked structurally against the delegate shape; everything else goes
/// through the implicit conversion.
fn argument_cost(
    ctx: &AnalysisContext,
    arg: &BoundExpr,
    target: DataType,
) -> Option<(u32, bool)> {
    if let ExprKind::Lambda { .. } = arg.kind {
        return lambda::conforms(ctx, arg, target).map(|cost| (cost, false));
    }
    let ty = arg.ty(ctx);
    if ty.is_error() {
        return Some((0, false));
    }
    if target.by_ref {
        // by-ref parameters take the operand location as-is.
        return (ty.deref().same_base(&target.deref())).then_some((0, true));
    }
    let value = arg.value(ctx);
    let conv = conversion::implicit(ctx, ty, value.as_ref(), target)?;
    Some((conv.cost, conv.is_identity()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, primitives};
    use ilex_registry::{ClassEntry, MethodDef, Param, ScopeTree, SymbolRegistry, TyPattern, op_names};

    use crate::expr::Expr;

    fn int32() -> DataType {
        DataType::simple(primitives::INT32)
    }

    fn float64() -> DataType {
        DataType::simple(primitives::FLOAT64)
    }

    #[test]
    fn integer_addition_resolves_to_int32() {
        let registry = SymbolRegistry::with_primitives();
        let scopes = ScopeTree::new();
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let res = resolve_binary(
            &ctx,
            BinaryOp::Add,
            Span::point(1, 1),
            int32(),
            None,
            int32(),
            None,
        )
        .unwrap();
        assert_eq!(res.result_type, int32());
        assert!(matches!(
            res.operator,
            ResolvedOperator::Builtin(BuiltinOperator::Numeric(ilex_core::PrimitiveKind::Int32))
        ));
    }

    #[test]
    fn int64_with_uint64_has_no_meaning() {
        let registry = SymbolRegistry::with_primitives();
        let scopes = ScopeTree::new();
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let err = resolve_binary(
            &ctx,
            BinaryOp::Add,
            Span::point(1, 1),
            DataType::simple(primitives::INT64),
            None,
            DataType::simple(primitives::UINT64),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadBinaryOperation);
    }

    #[test]
    fn user_operator_beats_builtins() {
        let mut registry = SymbolRegistry::with_primitives();
        let vec2 = registry.register_type(ClassEntry::new("Vec2")).unwrap();
        let v = DataType::simple(vec2);
        registry
            .register_method(MethodDef::operator(
                vec2,
                op_names::ADDITION,
                vec![Param::new("a", v), Param::new("b", v)],
                v,
            ))
            .unwrap();
        let scopes = ScopeTree::new();
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let res = resolve_binary(&ctx, BinaryOp::Add, Span::point(1, 1), v, None, v, None).unwrap();
        assert!(matches!(res.operator, ResolvedOperator::UserDefined(_)));
        assert_eq!(res.result_type, v);
    }

    #[test]
    fn comparison_results_are_bool() {
        let registry = SymbolRegistry::with_primitives();
        let scopes = ScopeTree::new();
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let res = resolve_binary(
            &ctx,
            BinaryOp::Less,
            Span::point(1, 1),
            int32(),
            None,
            float64(),
            None,
        )
        .unwrap();
        assert_eq!(res.result_type, DataType::BOOL);
    }

    #[test]
    fn lifted_arithmetic_produces_nullable() {
        let registry = SymbolRegistry::with_primitives();
        let scopes = ScopeTree::new();
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let res = resolve_binary(
            &ctx,
            BinaryOp::Add,
            Span::point(1, 1),
            int32().as_nullable(),
            None,
            int32(),
            None,
        )
        .unwrap();
        assert!(res.lifted);
        assert_eq!(res.result_type, int32().as_nullable());
    }

    fn call_setup() -> (SymbolRegistry, TypeHash) {
        let mut registry = SymbolRegistry::with_primitives();
        let calc = registry.register_type(ClassEntry::new("Calc")).unwrap();
        registry
            .register_method(MethodDef::new(
                calc,
                "add",
                vec![Param::new("x", int32()), Param::new("y", int32())],
                int32(),
            ))
            .unwrap();
        registry
            .register_method(MethodDef::new(
                calc,
                "add",
                vec![Param::new("x", float64()), Param::new("y", float64())],
                float64(),
            ))
            .unwrap();
        (registry, calc)
    }

    #[test]
    fn call_picks_the_cheaper_overload() {
        let (registry, calc) = call_setup();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(1, Span::point(1, 1)).bind(root, &mut scopes);
        let b = Expr::int(2, Span::point(1, 4)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(calc, "add");
        let res = resolve_call(&ctx, Span::point(1, 1), "add", &methods, &[], &[&a, &b]).unwrap();
        assert_eq!(res.return_type, int32());
        assert!(res.defaults.is_empty());
        assert!(res.packed_from.is_none());
    }

    #[test]
    fn call_with_no_viable_arity_reports_argument_count() {
        let (registry, calc) = call_setup();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(1, Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(calc, "add");
        let err =
            resolve_call(&ctx, Span::point(1, 1), "add", &methods, &[], &[&a]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadNumberOfArguments);
    }

    #[test]
    fn omitted_defaults_are_materialized() {
        let mut registry = SymbolRegistry::with_primitives();
        let calc = registry.register_type(ClassEntry::new("Calc")).unwrap();
        registry
            .register_method(MethodDef::new(
                calc,
                "scale",
                vec![
                    Param::new("x", int32()),
                    Param::new("by", int32()).with_default(ConstValue::I32(10)),
                ],
                int32(),
            ))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(3, Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(calc, "scale");
        let res = resolve_call(&ctx, Span::point(1, 1), "scale", &methods, &[], &[&a]).unwrap();
        assert_eq!(res.defaults, vec![(ConstValue::I32(10), int32())]);
    }

    #[test]
    fn trailing_arguments_pack_into_the_parameter_array() {
        let mut registry = SymbolRegistry::with_primitives();
        let calc = registry.register_type(ClassEntry::new("Calc")).unwrap();
        registry
            .register_method(MethodDef::new(
                calc,
                "sum",
                vec![Param::new("values", int32()).as_param_array()],
                int32(),
            ))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(1, Span::point(1, 1)).bind(root, &mut scopes);
        let b = Expr::int(2, Span::point(1, 4)).bind(root, &mut scopes);
        let c = Expr::int(3, Span::point(1, 7)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(calc, "sum");
        let res =
            resolve_call(&ctx, Span::point(1, 1), "sum", &methods, &[], &[&a, &b, &c]).unwrap();
        assert_eq!(res.packed_from, Some(0));
    }

    #[test]
    fn unconstrained_type_parameter_fails_inference() {
        let mut registry = SymbolRegistry::with_primitives();
        let seq = registry.register_type(ClassEntry::new("Seq")).unwrap();
        registry
            .register_method(MethodDef::generic(
                seq,
                "make",
                vec!["T".into()],
                vec![Param::new("count", int32())],
                TyPattern::Param(0),
            ))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let a = Expr::int(3, Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(seq, "make");
        let err =
            resolve_call(&ctx, Span::point(1, 1), "make", &methods, &[], &[&a]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CantInferMethTypeArgs);
    }

    #[test]
    fn by_ref_parameters_demand_the_same_base_type() {
        let mut registry = SymbolRegistry::with_primitives();
        let calc = registry.register_type(ClassEntry::new("Calc")).unwrap();
        registry
            .register_method(MethodDef::new(
                calc,
                "bump",
                vec![Param::new("x", int32().as_by_ref())],
                DataType::VOID,
            ))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.declare_local(root, "n", int32());
        let matching = Expr::name("n", Span::point(1, 1)).bind(root, &mut scopes);
        let widening = Expr::literal(ConstValue::I8(1), Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        let methods = registry.methods_named(calc, "bump");
        let res =
            resolve_call(&ctx, Span::point(1, 1), "bump", &methods, &[], &[&matching]).unwrap();
        assert_eq!(res.param_types, vec![int32().as_by_ref()]);
        // Widening would need a converted copy; a by-ref slot takes none.
        let err = resolve_call(&ctx, Span::point(1, 1), "bump", &methods, &[], &[&widening])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMatchingOverload);
    }
}
