//! End-to-end analysis through the public facade: host fills the registry
//! and scope tree, binds expressions, and reads answers off the queries.

use ilex::prelude::*;

fn sp() -> Span {
    Span::point(1, 1)
}

fn int32() -> DataType {
    DataType::simple(primitives::INT32)
}

fn int64() -> DataType {
    DataType::simple(primitives::INT64)
}

struct Host {
    registry: SymbolRegistry,
    scopes: ScopeTree,
    root: ScopeId,
}

impl Host {
    fn new() -> Self {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        Self {
            registry,
            scopes,
            root,
        }
    }

    fn analyze(&mut self, e: Expr) -> (DataType, Option<ConstValue>, bool, Vec<Diagnostic>) {
        let bound = e.bind(self.root, &mut self.scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&self.registry, &self.scopes, &sink);
        let ty = bound.ty(&ctx);
        let value = bound.value(&ctx);
        let errors = bound.has_errors(&ctx);
        (ty, value, errors, sink.diagnostics())
    }
}

#[test]
fn arithmetic_folds_with_precedence() {
    let mut host = Host::new();
    let e = Expr::binary(
        BinaryOp::Add,
        Expr::int(2, sp()),
        Expr::binary(BinaryOp::Multiply, Expr::int(3, sp()), Expr::int(4, sp()), sp()),
        sp(),
    );
    let (ty, value, errors, diags) = host.analyze(e);
    assert_eq!(ty, int32());
    assert_eq!(value, Some(ConstValue::I32(14)));
    assert!(!errors);
    assert!(diags.is_empty());
}

#[test]
fn mixed_numeric_operands_promote_to_float() {
    let mut host = Host::new();
    let e = Expr::binary(BinaryOp::Add, Expr::int(1, sp()), Expr::float(2.5, sp()), sp());
    let (ty, value, _, _) = host.analyze(e);
    assert_eq!(ty, DataType::simple(primitives::FLOAT64));
    assert_eq!(value, Some(ConstValue::F64(3.5)));
}

#[test]
fn string_concatenation_folds() {
    let mut host = Host::new();
    let e = Expr::binary(
        BinaryOp::Add,
        Expr::string("semantic ", sp()),
        Expr::string("engine", sp()),
        sp(),
    );
    let (ty, value, _, _) = host.analyze(e);
    assert_eq!(ty, DataType::STRING);
    assert_eq!(value, Some(ConstValue::Str("semantic engine".into())));
}

#[test]
fn checked_constant_overflow_is_reported() {
    let mut host = Host::new();
    let e = Expr::binary_checked(
        BinaryOp::Multiply,
        Expr::int(i32::MAX, sp()),
        Expr::int(2, sp()),
        sp(),
    );
    let (ty, value, errors, diags) = host.analyze(e);
    assert_eq!(ty, int32());
    assert_eq!(value, None);
    assert!(errors);
    assert_eq!(diags[0].kind, ErrorKind::ConstOutOfRange);
}

#[test]
fn overload_resolution_prefers_the_exact_signature() {
    let mut host = Host::new();
    let math = host
        .registry
        .register_type(ClassEntry::new("Math"))
        .unwrap();
    host.registry
        .register_method(
            MethodDef::new(math, "abs", vec![Param::new("x", int32())], int32())
                .with_flags(MemberFlags::STATIC),
        )
        .unwrap();
    host.registry
        .register_method(
            MethodDef::new(
                math,
                "abs",
                vec![Param::new("x", DataType::simple(primitives::FLOAT64))],
                DataType::simple(primitives::FLOAT64),
            )
            .with_flags(MemberFlags::STATIC),
        )
        .unwrap();

    let (ty, _, errors, _) =
        host.analyze(Expr::call_static(math, "abs", vec![Expr::int(-3, sp())], sp()));
    assert_eq!(ty, int32());
    assert!(!errors);

    let (ty, _, errors, _) = host.analyze(Expr::call_static(
        math,
        "abs",
        vec![Expr::float(-3.5, sp())],
        sp(),
    ));
    assert_eq!(ty, DataType::simple(primitives::FLOAT64));
    assert!(!errors);
}

#[test]
fn user_defined_operator_is_selected_over_builtins() {
    let mut host = Host::new();
    let vec2 = host
        .registry
        .register_type(ClassEntry::new("Vec2"))
        .unwrap();
    let vt = DataType::simple(vec2);
    host.registry
        .register_method(MethodDef::operator(
            vec2,
            op_names::ADDITION,
            vec![Param::new("a", vt), Param::new("b", vt)],
            vt,
        ))
        .unwrap();
    host.scopes.declare_local(host.root, "a", vt);
    host.scopes.declare_local(host.root, "b", vt);

    let e = Expr::binary(
        BinaryOp::Add,
        Expr::name("a", sp()),
        Expr::name("b", sp()),
        sp(),
    );
    let (ty, _, errors, diags) = host.analyze(e);
    assert_eq!(ty, vt);
    assert!(!errors);
    assert!(diags.is_empty());
}

#[test]
fn assignment_requires_an_implicit_conversion() {
    let mut host = Host::new();
    host.scopes.declare_local(host.root, "wide", int64());
    host.scopes.declare_local(host.root, "narrow", int32());

    let ok = Expr::assign(Expr::name("wide", sp()), Expr::name("narrow", sp()), sp());
    let (ty, _, errors, _) = host.analyze(ok);
    assert_eq!(ty, int64());
    assert!(!errors);

    let bad = Expr::assign(Expr::name("narrow", sp()), Expr::name("wide", sp()), sp());
    let (_, _, errors, diags) = host.analyze(bad);
    assert!(errors);
    assert_eq!(diags[0].kind, ErrorKind::NoImplicitConversion);
}

#[test]
fn nullable_operands_lift_the_operator() {
    let mut host = Host::new();
    host.scopes
        .declare_local(host.root, "maybe", int32().as_nullable());
    let e = Expr::binary(
        BinaryOp::Add,
        Expr::name("maybe", sp()),
        Expr::int(1, sp()),
        sp(),
    );
    let (ty, _, errors, _) = host.analyze(e);
    assert_eq!(ty, int32().as_nullable());
    assert!(!errors);
}

#[test]
fn conditional_branches_agree_on_the_wider_type() {
    let mut host = Host::new();
    host.scopes.declare_local(host.root, "flag", DataType::BOOL);
    let e = Expr::conditional(
        Expr::name("flag", sp()),
        Expr::int(1, sp()),
        Expr::literal(ConstValue::I64(10), sp()),
        sp(),
    );
    let (ty, _, errors, _) = host.analyze(e);
    assert_eq!(ty, int64());
    assert!(!errors);
}

#[test]
fn unknown_names_produce_one_diagnostic() {
    let mut host = Host::new();
    let e = Expr::binary(
        BinaryOp::Add,
        Expr::name("ghost", sp()),
        Expr::int(1, sp()),
        sp(),
    );
    let (ty, _, errors, diags) = host.analyze(e);
    assert!(ty.is_error());
    assert!(errors);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::NameNotInContext);
}
