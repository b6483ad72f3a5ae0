//! Projection through the public facade: analyzed trees come out in the
//! canonical form a backend consumes.

use ilex::prelude::*;

fn sp() -> Span {
    Span::point(1, 1)
}

fn int32() -> DataType {
    DataType::simple(primitives::INT32)
}

fn project(
    build: impl FnOnce(&mut SymbolRegistry, &mut ScopeTree, ScopeId),
    e: Expr,
) -> CanonicalExpr {
    let mut registry = SymbolRegistry::with_primitives();
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    build(&mut registry, &mut scopes, root);
    let bound = e.bind(root, &mut scopes);
    let sink = CollectingSink::new();
    let ctx = AnalysisContext::new(&registry, &scopes, &sink);
    assert!(
        !bound.has_errors(&ctx),
        "unexpected diagnostics: {:?}",
        sink.diagnostics()
    );
    bound.project(&ctx).clone()
}

#[test]
fn nested_arithmetic_keeps_its_operator_forms() {
    let e = Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(
            BinaryOp::Add,
            Expr::name("a", sp()),
            Expr::name("b", sp()),
            sp(),
        ),
        Expr::int(2, sp()),
        sp(),
    );
    let c = project(
        |_, scopes, root| {
            scopes.declare_local(root, "a", int32());
            scopes.declare_local(root, "b", int32());
        },
        e,
    );
    let CanonicalExpr::Binary {
        op,
        operator,
        left,
        ty,
        ..
    } = c
    else {
        panic!("expected binary, got {c:?}");
    };
    assert_eq!(op, BinaryOp::Multiply);
    assert_eq!(operator, BuiltinOperator::Numeric(PrimitiveKind::Int32));
    assert_eq!(ty, int32());
    assert!(matches!(*left, CanonicalExpr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn compound_assignment_evaluates_its_receiver_once() {
    let e = Expr::compound_assign(
        BinaryOp::Add,
        Expr::member(Expr::name("p", sp()), "health", sp()),
        Expr::int(5, sp()),
        sp(),
    );
    let c = project(
        |registry, scopes, root| {
            let player = registry.register_type(ClassEntry::new("Player")).unwrap();
            registry
                .register_field(FieldEntry::new(player, "health", int32()))
                .unwrap();
            scopes.declare_local(root, "p", DataType::simple(player));
        },
        e,
    );
    let CanonicalExpr::Sequence { temps, result } = c else {
        panic!("expected sequence, got {c:?}");
    };
    assert_eq!(temps.len(), 1);
    let CanonicalExpr::Assign { place, value, .. } = *result else {
        panic!("expected assignment result");
    };
    let CanonicalPlace::Field { receiver, .. } = &place else {
        panic!("expected field place");
    };
    assert!(matches!(
        receiver.as_deref(),
        Some(CanonicalExpr::ReadTemp { .. })
    ));
    let CanonicalExpr::Binary { left, .. } = *value else {
        panic!("expected the stepped value");
    };
    assert!(matches!(*left, CanonicalExpr::Read(CanonicalPlace::Field { .. })));
}

#[test]
fn instance_calls_carry_their_receiver() {
    let e = Expr::call_method(
        Expr::name("p", sp()),
        "heal",
        vec![Expr::int(5, sp())],
        sp(),
    );
    let c = project(
        |registry, scopes, root| {
            let player = registry.register_type(ClassEntry::new("Player")).unwrap();
            registry
                .register_method(MethodDef::new(
                    player,
                    "heal",
                    vec![Param::new("amount", int32())],
                    DataType::simple(primitives::VOID),
                ))
                .unwrap();
            scopes.declare_local(root, "p", DataType::simple(player));
        },
        e,
    );
    let CanonicalExpr::Call(site) = c else {
        panic!("expected call, got {c:?}");
    };
    assert!(site.method.is_some());
    assert!(matches!(
        site.callee.as_deref(),
        Some(CanonicalExpr::Read(CanonicalPlace::Local { .. }))
    ));
    assert_eq!(site.arguments.len(), 1);
}

#[test]
fn construction_resolves_its_constructor() {
    let e = Expr::construct(
        DataType::simple(TypeHash::from_name("Timer")),
        vec![Expr::int(60, sp())],
        sp(),
    );
    let c = project(
        |registry, _, _| {
            let timer = registry.register_type(ClassEntry::new("Timer")).unwrap();
            registry
                .register_method(MethodDef::new(
                    timer,
                    ".ctor",
                    vec![Param::new("seconds", int32())],
                    DataType::simple(primitives::VOID),
                ))
                .unwrap();
        },
        e,
    );
    let CanonicalExpr::New(site) = c else {
        panic!("expected construction, got {c:?}");
    };
    assert!(site.method.is_some());
    assert!(site.callee.is_none());
    assert_eq!(site.ty, DataType::simple(TypeHash::from_name("Timer")));
}

#[test]
fn casts_lower_to_explicit_conversions() {
    let e = Expr::cast(
        DataType::simple(primitives::INT64),
        Expr::name("x", sp()),
        sp(),
    );
    let c = project(
        |_, scopes, root| {
            scopes.declare_local(root, "x", int32());
        },
        e,
    );
    let CanonicalExpr::Convert { conversion, ty, .. } = c else {
        panic!("expected conversion, got {c:?}");
    };
    assert_eq!(ty, DataType::simple(primitives::INT64));
    assert!(matches!(
        conversion.kind,
        ConversionKind::NumericWidening { .. }
    ));
}
