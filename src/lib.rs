//! ilex: an expression semantic-analysis and lowering engine.
//!
//! A front end parses source into [`Expr`] trees, a declaration phase fills
//! a [`SymbolRegistry`] and a [`ScopeTree`], and this engine does the rest:
//! binding, type resolution, conversion and overload selection, constant
//! folding, and projection into a canonical backend-agnostic form.
//!
//! ```
//! use ilex::prelude::*;
//!
//! let registry = SymbolRegistry::with_primitives();
//! let mut scopes = ScopeTree::new();
//! let root = scopes.root();
//!
//! let expr = Expr::binary(
//!     BinaryOp::Add,
//!     Expr::int(2, Span::point(1, 1)),
//!     Expr::int(3, Span::point(1, 5)),
//!     Span::new(1, 1, 5),
//! );
//! let bound = expr.bind(root, &mut scopes);
//!
//! let sink = CollectingSink::new();
//! let ctx = AnalysisContext::new(&registry, &scopes, &sink);
//! assert_eq!(bound.value(&ctx), Some(ConstValue::I32(5)));
//! ```

pub use ilex_core as core;
pub use ilex_registry as registry;
pub use ilex_sema as sema;

pub mod prelude {
    pub use ilex_core::{
        CollectingSink, ConstValue, DataType, Decimal, Diagnostic, DiagnosticSink, ErrorKind,
        PrimitiveKind, SemanticError, Span, TypeHash, primitives,
    };
    pub use ilex_registry::{
        ClassEntry, DelegateEntry, EnumEntry, FieldEntry, GenericInstanceEntry, InterfaceEntry,
        MemberFlags, MethodDef, NameResolution, Param, PropertyEntry, ScopeId, ScopeTree,
        SymbolRegistry, TyPattern, TypeEntry, op_names,
    };
    pub use ilex_sema::{
        AnalysisContext, BinaryOp, BoundExpr, BuiltinOperator, CallResolution, Callee,
        CanonicalExpr, CanonicalPlace, Conversion, ConversionKind, Expr, ExprKind, IncrementOp,
        LambdaParam, LogicalOp, OperatorResolution, Place, ResolvedOperator, UnaryOp,
    };
}
