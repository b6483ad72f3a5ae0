//! Name, `this` and member-access resolution.
//!
//! Simple names resolve against the scope chain first (locals, parameters,
//! aliases) and fall back to members of the enclosing type. Member access
//! walks the receiver type's base chain through the registry. Every
//! resolution that denotes a storage location caches a [`Place`] on the
//! node for the assignment and lowering paths.

use ilex_core::{ConstValue, DataType, Diagnostic, ErrorKind, TypeHash, primitives};
use ilex_registry::{MemberFlags, MemberRef, NameResolution, TypeEntry};

use crate::context::AnalysisContext;
use crate::expr::{BoundExpr, Place};

/// How the member is being reached; drives the static/instance checks.
#[derive(Clone, Copy, PartialEq)]
enum Access {
    /// Through an instance receiver expression.
    Instance,
    /// Through a type qualifier.
    Static,
    /// Through the implicit enclosing-type context of a simple name.
    Implicit,
}

pub fn resolve_name_type(ctx: &AnalysisContext, node: &BoundExpr, name: &str) -> DataType {
    match ctx.scopes.resolve_name(node.scope, name) {
        NameResolution::Local(scope, var) => {
            let ty = if var.ty.type_hash == primitives::LAMBDA {
                ctx.lambda_param_type(scope, var.index).unwrap_or(var.ty)
            } else {
                var.ty
            };
            node.set_place(Some(Place::Local {
                scope,
                index: var.index,
                name: var.name,
                ty,
            }));
            ty
        }
        NameResolution::Expanded(expanded) => {
            enclosing_member(ctx, node, &expanded).unwrap_or_else(|| {
                ctx.report(
                    Diagnostic::new(ErrorKind::NameNotInContext, node.span).with_arg(expanded),
                );
                DataType::ERROR
            })
        }
        NameResolution::CyclicAlias(declared_at) => {
            ctx.report(
                Diagnostic::new(ErrorKind::CyclicAlias, node.span)
                    .with_arg(name)
                    .with_related(declared_at),
            );
            DataType::ERROR
        }
        NameResolution::NotFound => enclosing_member(ctx, node, name).unwrap_or_else(|| {
            ctx.report(Diagnostic::new(ErrorKind::NameNotInContext, node.span).with_arg(name));
            DataType::ERROR
        }),
    }
}

/// A simple name that is a member of the enclosing type.
fn enclosing_member(ctx: &AnalysisContext, node: &BoundExpr, name: &str) -> Option<DataType> {
    let this_type = ctx.scopes.get(node.scope).this_type?;
    let member = ctx.registry.lookup_member(this_type, name)?;
    Some(member_access(ctx, node, member, Access::Implicit, name))
}

pub fn resolve_this(ctx: &AnalysisContext, node: &BoundExpr) -> DataType {
    match ctx.scopes.get(node.scope).this_type {
        Some(ty) => DataType::simple(ty),
        None => {
            ctx.report(Diagnostic::new(ErrorKind::ObjectRequired, node.span).with_arg("this"));
            DataType::ERROR
        }
    }
}

pub fn resolve_member(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    receiver: &BoundExpr,
    name: &str,
) -> DataType {
    let rty = receiver.ty(ctx);
    if rty.is_error() {
        return DataType::ERROR;
    }
    let base = rty.deref().unwrap_nullable();
    if base.is_null_literal() {
        ctx.report(Diagnostic::new(ErrorKind::ObjectRequired, node.span).with_arg(name));
        return DataType::ERROR;
    }
    match ctx.registry.lookup_member(base.type_hash, name) {
        Some(member) => member_access(ctx, node, member, Access::Instance, name),
        None => {
            ctx.report(
                Diagnostic::new(ErrorKind::NameNotInContext, node.span)
                    .with_arg(name)
                    .with_arg(ctx.type_name(base.type_hash)),
            );
            DataType::ERROR
        }
    }
}

pub fn resolve_static_member(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    ty: TypeHash,
    name: &str,
) -> DataType {
    if let Some(TypeEntry::Enum(e)) = ctx.registry.get_type(ty) {
        if e.members.iter().any(|(n, _)| n == name) {
            return DataType::simple(ty);
        }
    }
    match ctx.registry.lookup_member(ty, name) {
        Some(member) => member_access(ctx, node, member, Access::Static, name),
        None => {
            ctx.report(
                Diagnostic::new(ErrorKind::NameNotInContext, node.span)
                    .with_arg(name)
                    .with_arg(ctx.type_name(ty)),
            );
            DataType::ERROR
        }
    }
}

fn member_access(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    member: MemberRef,
    access: Access,
    name: &str,
) -> DataType {
    match member {
        MemberRef::Field(field) => {
            let Some(fe) = ctx.registry.get_field(field) else {
                return DataType::ERROR;
            };
            check_member_site(ctx, node, fe.flags, fe.is_static(), access, name, fe.span);
            node.set_place(Some(Place::Field {
                field,
                is_static: fe.is_static(),
                ty: fe.ty,
            }));
            fe.ty
        }
        MemberRef::Property(property) => {
            let Some(pe) = ctx.registry.get_property(property) else {
                return DataType::ERROR;
            };
            check_member_site(ctx, node, pe.flags, pe.is_static(), access, name, pe.span);
            if !pe.has_getter {
                node.mark_error();
                ctx.report(
                    Diagnostic::new(ErrorKind::InaccessibleTypeMember, node.span)
                        .with_arg(name)
                        .with_related(pe.span),
                );
            }
            node.set_place(Some(Place::Property {
                property,
                is_static: pe.is_static(),
                ty: pe.ty,
            }));
            pe.ty
        }
        // A method group used as a value; it only gains a concrete delegate
        // type through conversion at the use site.
        MemberRef::MethodGroup(_) => DataType::simple(primitives::DELEGATE),
    }
}

fn check_member_site(
    ctx: &AnalysisContext,
    node: &BoundExpr,
    flags: MemberFlags,
    is_static: bool,
    access: Access,
    name: &str,
    declared_at: ilex_core::Span,
) {
    if flags.contains(MemberFlags::INACCESSIBLE) {
        node.mark_error();
        ctx.report(
            Diagnostic::new(ErrorKind::InaccessibleTypeMember, node.span)
                .with_arg(name)
                .with_related(declared_at),
        );
    }
    if is_static && access == Access::Instance {
        node.mark_error();
        ctx.report(Diagnostic::new(ErrorKind::ObjectProhibited, node.span).with_arg(name));
    }
    if !is_static && access == Access::Static {
        node.mark_error();
        ctx.report(Diagnostic::new(ErrorKind::ObjectRequired, node.span).with_arg(name));
    }
}

/// Constant value of a type-qualified member: enum constants fold.
pub fn evaluate_static(ctx: &AnalysisContext, ty: TypeHash, name: &str) -> Option<ConstValue> {
    let entry = ctx.registry.get_type(ty)?;
    let e = entry.as_enum()?;
    e.members
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, Span, primitives};
    use ilex_registry::{
        ClassEntry, EnumEntry, FieldEntry, PropertyEntry, ScopeTree, SymbolRegistry,
    };

    use crate::expr::Expr;

    fn int32() -> DataType {
        DataType::simple(primitives::INT32)
    }

    #[test]
    fn locals_resolve_with_their_declared_type() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.declare_local(root, "count", int32());
        let node = Expr::name("count", Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(node.ty(&ctx), int32());
        assert!(matches!(node.place(&ctx), Some(Place::Local { .. })));
    }

    #[test]
    fn unknown_names_report_once() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let node = Expr::name("ghost", Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(node.ty(&ctx).is_error());
        assert!(node.ty(&ctx).is_error());
        let all = sink.diagnostics();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, ErrorKind::NameNotInContext);
    }

    #[test]
    fn field_access_through_receiver() {
        let mut registry = SymbolRegistry::with_primitives();
        let player = registry.register_type(ClassEntry::new("Player")).unwrap();
        registry
            .register_field(FieldEntry::new(player, "health", int32()))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.declare_local(root, "p", DataType::simple(player));
        let node = Expr::member(Expr::name("p", Span::point(1, 1)), "health", Span::new(1, 1, 8))
            .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(node.ty(&ctx), int32());
        assert!(matches!(node.place(&ctx), Some(Place::Field { .. })));
    }

    #[test]
    fn enum_members_fold_to_their_constant() {
        let mut registry = SymbolRegistry::with_primitives();
        let color = registry
            .register_type(
                EnumEntry::new("Color")
                    .with_member("Red", ConstValue::I32(0))
                    .with_member("Green", ConstValue::I32(1)),
            )
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let node = Expr::static_member(color, "Green", Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(node.ty(&ctx), DataType::simple(color));
        assert_eq!(node.value(&ctx), Some(ConstValue::I32(1)));
    }

    #[test]
    fn instance_member_through_type_qualifier_reports() {
        let mut registry = SymbolRegistry::with_primitives();
        let player = registry.register_type(ClassEntry::new("Player")).unwrap();
        registry
            .register_property(PropertyEntry::new(player, "Health", int32()))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let node =
            Expr::static_member(player, "Health", Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        // Type stays usable; the misuse is flagged as the node's own error.
        assert_eq!(node.ty(&ctx), int32());
        assert!(node.has_errors(&ctx));
        assert_eq!(sink.diagnostics()[0].kind, ErrorKind::ObjectRequired);
    }

    #[test]
    fn this_outside_instance_context_is_an_error() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let node = Expr::this(Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert!(node.ty(&ctx).is_error());
        assert_eq!(sink.diagnostics()[0].kind, ErrorKind::ObjectRequired);
    }

    #[test]
    fn implicit_this_reaches_enclosing_fields() {
        let mut registry = SymbolRegistry::with_primitives();
        let player = registry.register_type(ClassEntry::new("Player")).unwrap();
        registry
            .register_field(FieldEntry::new(player, "health", int32()))
            .unwrap();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        scopes.get_mut(root).this_type = Some(player);
        let node = Expr::name("health", Span::point(1, 1)).bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);
        assert_eq!(node.ty(&ctx), int32());
        assert!(sink.is_empty());
    }
}
