//! Semantic analysis and lowering for expressions.
//!
//! This crate is the engine proper: it takes unbound expression trees,
//! binds them to a scope, resolves types, conversions and overloads against
//! the symbol registry, folds compile-time constants with exact primitive
//! semantics, and projects every analyzed node into a canonical
//! backend-agnostic form.
//!
//! The entry points are [`Expr::bind`] and the query methods on
//! [`BoundExpr`]: [`BoundExpr::ty`], [`BoundExpr::value`],
//! [`BoundExpr::has_errors`] and [`BoundExpr::project`]. All queries are
//! memoized per node and safe to issue from multiple threads; diagnostics
//! for a node are delivered to the host's sink exactly once, on first
//! resolution.

pub mod context;
pub mod conversion;
pub mod expr;
pub mod fold;
pub mod infer;
pub mod lower;
pub mod overload;

pub use context::AnalysisContext;
pub use conversion::{Conversion, ConversionKind};
pub use expr::{
    BinaryOp, BoundExpr, Callee, Expr, ExprKind, IncrementOp, LambdaParam, LogicalOp, Place,
    UnaryOp,
};
pub use lower::model::{CanonicalExpr, CanonicalPlace, CallSite, TempDef, TempId};
pub use overload::{BuiltinOperator, CallResolution, OperatorResolution, ResolvedOperator};
