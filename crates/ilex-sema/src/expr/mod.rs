//! The expression node model.
//!
//! Expressions exist in two states. An [`Expr`] is an unbound tree as a
//! front end produced it: plain data, cheap to build and to clone into a
//! different scope. [`Expr::bind`] attaches a tree to a scope, yielding a
//! [`BoundExpr`] whose queries - [`ty`](BoundExpr::ty),
//! [`value`](BoundExpr::value), [`has_errors`](BoundExpr::has_errors),
//! [`project`](BoundExpr::project) - resolve on demand and memoize their
//! answers. The two-state split makes "forgot to bind" unrepresentable
//! instead of a runtime error.
//!
//! Memo cells are `OnceLock`s, so concurrent first queries race safely and
//! the diagnostics a resolution emits are delivered exactly once.

pub mod assignment;
pub mod binary;
pub mod calls;
pub mod cast;
pub mod lambda;
pub mod literals;
pub mod member;
pub mod ternary;
pub mod unary;

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use ilex_core::{ConstValue, DataType, Span, TypeHash, primitives};
use ilex_registry::{ScopeId, ScopeTree, op_names};

use crate::context::AnalysisContext;
use crate::lower;
use crate::lower::model::CanonicalExpr;
use crate::overload::{CallResolution, OperatorResolution};

/// Binary operators subject to overload resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    /// The runtime operator-method name this operator resolves against.
    pub fn op_name(self) -> &'static str {
        match self {
            BinaryOp::Add => op_names::ADDITION,
            BinaryOp::Subtract => op_names::SUBTRACTION,
            BinaryOp::Multiply => op_names::MULTIPLY,
            BinaryOp::Divide => op_names::DIVISION,
            BinaryOp::Remainder => op_names::MODULUS,
            BinaryOp::BitAnd => op_names::BITWISE_AND,
            BinaryOp::BitOr => op_names::BITWISE_OR,
            BinaryOp::BitXor => op_names::EXCLUSIVE_OR,
            BinaryOp::LeftShift => op_names::LEFT_SHIFT,
            BinaryOp::RightShift => op_names::RIGHT_SHIFT,
            BinaryOp::Equal => op_names::EQUALITY,
            BinaryOp::NotEqual => op_names::INEQUALITY,
            BinaryOp::Less => op_names::LESS_THAN,
            BinaryOp::LessEqual => op_names::LESS_THAN_OR_EQUAL,
            BinaryOp::Greater => op_names::GREATER_THAN,
            BinaryOp::GreaterEqual => op_names::GREATER_THAN_OR_EQUAL,
        }
    }

    /// Whether the result type is `bool` regardless of operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    /// `==` or `!=`.
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    /// `<` `<=` `>` `>=`.
    pub fn is_relational(self) -> bool {
        self.is_comparison() && !self.is_equality()
    }

    /// Shift operators take an `int32` count on the right.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::LeftShift | BinaryOp::RightShift)
    }

    /// `&` `|` `^`.
    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }

    /// `+` `-` `*` `/` `%`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Remainder
        )
    }
}

/// Short-circuiting logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators subject to overload resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Negate,
    /// `!x`
    Not,
    /// `~x`
    Complement,
}

impl UnaryOp {
    /// The runtime operator-method name this operator resolves against.
    pub fn op_name(self) -> &'static str {
        match self {
            UnaryOp::Plus => op_names::UNARY_PLUS,
            UnaryOp::Negate => op_names::UNARY_NEGATION,
            UnaryOp::Not => op_names::LOGICAL_NOT,
            UnaryOp::Complement => op_names::ONES_COMPLEMENT,
        }
    }
}

/// Increment and decrement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl IncrementOp {
    /// Whether the expression yields the updated value.
    pub fn is_prefix(self) -> bool {
        matches!(self, IncrementOp::PreIncrement | IncrementOp::PreDecrement)
    }

    /// Whether the step adds one (as opposed to subtracting one).
    pub fn is_increment(self) -> bool {
        matches!(self, IncrementOp::PreIncrement | IncrementOp::PostIncrement)
    }
}

/// A lambda parameter: a name with an optional declared type. Unannotated
/// parameters are typed by the context the lambda is used in.
#[derive(Debug, Clone)]
pub struct LambdaParam {
    /// Parameter name.
    pub name: String,
    /// Declared type, if annotated.
    pub ty: Option<DataType>,
}

impl LambdaParam {
    /// An annotated parameter.
    pub fn typed(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }

    /// An unannotated parameter.
    pub fn inferred(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }
}

/// What a call expression invokes.
#[derive(Debug, Clone)]
pub enum Callee<E> {
    /// An unqualified name: a local delegate, or a method of the enclosing
    /// type.
    Name(String),
    /// A member of a receiver expression.
    Member {
        /// The receiver.
        receiver: E,
        /// Member name.
        name: String,
    },
    /// A static member of a named type.
    Static {
        /// The declaring type.
        ty: TypeHash,
        /// Member name.
        name: String,
    },
}

/// One expression node, generic over the child pointer so the unbound and
/// bound trees share a single shape.
#[derive(Debug, Clone)]
pub enum ExprKind<E> {
    /// A literal constant.
    Literal(ConstValue),
    /// A simple name.
    Name(String),
    /// The receiver of the enclosing instance method.
    This,
    /// A binary operator application.
    Binary {
        op: BinaryOp,
        /// Overflow-checked arithmetic context.
        checked: bool,
        left: E,
        right: E,
    },
    /// Short-circuiting `&&` / `||`.
    Logical { op: LogicalOp, left: E, right: E },
    /// Null-coalescing `a ?? b`.
    Coalesce { left: E, right: E },
    /// `cond ? a : b`.
    Conditional {
        condition: E,
        when_true: E,
        when_false: E,
    },
    /// A unary operator application.
    Unary {
        op: UnaryOp,
        checked: bool,
        operand: E,
    },
    /// `++x`, `--x`, `x++`, `x--`.
    Increment {
        op: IncrementOp,
        checked: bool,
        target: E,
    },
    /// Simple assignment.
    Assign { target: E, value: E },
    /// Compound assignment `target op= value`.
    CompoundAssign {
        op: BinaryOp,
        checked: bool,
        target: E,
        value: E,
    },
    /// Instance member access.
    Member { receiver: E, name: String },
    /// Static (type-qualified) member access; also reaches enum members.
    StaticMember { ty: TypeHash, name: String },
    /// Indexing: a pointer element or a user-declared indexer.
    Index { receiver: E, arguments: Vec<E> },
    /// A call.
    Call {
        callee: Callee<E>,
        /// Explicit generic type arguments, empty when inferred.
        type_args: Vec<DataType>,
        arguments: Vec<E>,
    },
    /// Object construction.
    New { ty: DataType, arguments: Vec<E> },
    /// An explicit cast.
    Cast {
        target: DataType,
        checked: bool,
        operand: E,
    },
    /// `&x`
    AddressOf { operand: E },
    /// `*p`
    Deref { operand: E },
    /// An anonymous function.
    Lambda { params: Vec<LambdaParam>, body: E },
    /// A node the front end already knows is broken; analyzes silently as
    /// the error type.
    Error,
}

/// An unbound expression tree.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Node kind and children.
    pub kind: ExprKind<Box<Expr>>,
    /// Source location.
    pub span: Span,
}

impl Expr {
    /// A node from raw parts.
    pub fn new(kind: ExprKind<Box<Expr>>, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn literal(value: ConstValue, span: Span) -> Self {
        Self::new(ExprKind::Literal(value), span)
    }

    pub fn int(value: i32, span: Span) -> Self {
        Self::literal(ConstValue::I32(value), span)
    }

    pub fn float(value: f64, span: Span) -> Self {
        Self::literal(ConstValue::F64(value), span)
    }

    pub fn boolean(value: bool, span: Span) -> Self {
        Self::literal(ConstValue::Bool(value), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::literal(ConstValue::Str(value.into()), span)
    }

    pub fn null(span: Span) -> Self {
        Self::literal(ConstValue::Null, span)
    }

    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Name(name.into()), span)
    }

    pub fn this(span: Span) -> Self {
        Self::new(ExprKind::This, span)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                checked: false,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn binary_checked(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                checked: true,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn logical(op: LogicalOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn coalesce(left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Coalesce {
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn conditional(condition: Expr, when_true: Expr, when_false: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
            span,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                checked: false,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn unary_checked(op: UnaryOp, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                checked: true,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn increment(op: IncrementOp, target: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Increment {
                op,
                checked: false,
                target: Box::new(target),
            },
            span,
        )
    }

    pub fn assign(target: Expr, value: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn compound_assign(op: BinaryOp, target: Expr, value: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::CompoundAssign {
                op,
                checked: false,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn member(receiver: Expr, name: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::Member {
                receiver: Box::new(receiver),
                name: name.into(),
            },
            span,
        )
    }

    pub fn static_member(ty: TypeHash, name: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::StaticMember {
                ty,
                name: name.into(),
            },
            span,
        )
    }

    pub fn index(receiver: Expr, arguments: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Index {
                receiver: Box::new(receiver),
                arguments: arguments.into_iter().map(Box::new).collect(),
            },
            span,
        )
    }

    pub fn call_named(name: impl Into<String>, arguments: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Callee::Name(name.into()),
                type_args: Vec::new(),
                arguments: arguments.into_iter().map(Box::new).collect(),
            },
            span,
        )
    }

    pub fn call_method(
        receiver: Expr,
        name: impl Into<String>,
        arguments: Vec<Expr>,
        span: Span,
    ) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Callee::Member {
                    receiver: Box::new(receiver),
                    name: name.into(),
                },
                type_args: Vec::new(),
                arguments: arguments.into_iter().map(Box::new).collect(),
            },
            span,
        )
    }

    pub fn call_static(
        ty: TypeHash,
        name: impl Into<String>,
        arguments: Vec<Expr>,
        span: Span,
    ) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Callee::Static {
                    ty,
                    name: name.into(),
                },
                type_args: Vec::new(),
                arguments: arguments.into_iter().map(Box::new).collect(),
            },
            span,
        )
    }

    /// Attach explicit generic type arguments to a call node.
    pub fn with_type_args(mut self, args: Vec<DataType>) -> Self {
        if let ExprKind::Call { type_args, .. } = &mut self.kind {
            *type_args = args;
        }
        self
    }

    pub fn construct(ty: DataType, arguments: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::New {
                ty,
                arguments: arguments.into_iter().map(Box::new).collect(),
            },
            span,
        )
    }

    pub fn cast(target: DataType, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Cast {
                target,
                checked: false,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn cast_checked(target: DataType, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Cast {
                target,
                checked: true,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn address_of(operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::AddressOf {
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn deref(operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Deref {
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn lambda(params: Vec<LambdaParam>, body: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        )
    }

    pub fn error(span: Span) -> Self {
        Self::new(ExprKind::Error, span)
    }

    /// Bind this tree into `scope`, consuming it. Binding allocates lambda
    /// body scopes in the tree; everything else is structural.
    pub fn bind(self, scope: ScopeId, scopes: &mut ScopeTree) -> BoundExpr {
        let Expr { kind, span } = self;
        let kind = match kind {
            ExprKind::Literal(v) => ExprKind::Literal(v),
            ExprKind::Name(n) => ExprKind::Name(n),
            ExprKind::This => ExprKind::This,
            ExprKind::Binary {
                op,
                checked,
                left,
                right,
            } => ExprKind::Binary {
                op,
                checked,
                left: Box::new(left.bind(scope, scopes)),
                right: Box::new(right.bind(scope, scopes)),
            },
            ExprKind::Logical { op, left, right } => ExprKind::Logical {
                op,
                left: Box::new(left.bind(scope, scopes)),
                right: Box::new(right.bind(scope, scopes)),
            },
            ExprKind::Coalesce { left, right } => ExprKind::Coalesce {
                left: Box::new(left.bind(scope, scopes)),
                right: Box::new(right.bind(scope, scopes)),
            },
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => ExprKind::Conditional {
                condition: Box::new(condition.bind(scope, scopes)),
                when_true: Box::new(when_true.bind(scope, scopes)),
                when_false: Box::new(when_false.bind(scope, scopes)),
            },
            ExprKind::Unary {
                op,
                checked,
                operand,
            } => ExprKind::Unary {
                op,
                checked,
                operand: Box::new(operand.bind(scope, scopes)),
            },
            ExprKind::Increment {
                op,
                checked,
                target,
            } => ExprKind::Increment {
                op,
                checked,
                target: Box::new(target.bind(scope, scopes)),
            },
            ExprKind::Assign { target, value } => ExprKind::Assign {
                target: Box::new(target.bind(scope, scopes)),
                value: Box::new(value.bind(scope, scopes)),
            },
            ExprKind::CompoundAssign {
                op,
                checked,
                target,
                value,
            } => ExprKind::CompoundAssign {
                op,
                checked,
                target: Box::new(target.bind(scope, scopes)),
                value: Box::new(value.bind(scope, scopes)),
            },
            ExprKind::Member { receiver, name } => ExprKind::Member {
                receiver: Box::new(receiver.bind(scope, scopes)),
                name,
            },
            ExprKind::StaticMember { ty, name } => ExprKind::StaticMember { ty, name },
            ExprKind::Index {
                receiver,
                arguments,
            } => ExprKind::Index {
                receiver: Box::new(receiver.bind(scope, scopes)),
                arguments: arguments
                    .into_iter()
                    .map(|a| Box::new(a.bind(scope, scopes)))
                    .collect(),
            },
            ExprKind::Call {
                callee,
                type_args,
                arguments,
            } => ExprKind::Call {
                callee: match callee {
                    Callee::Name(n) => Callee::Name(n),
                    Callee::Member { receiver, name } => Callee::Member {
                        receiver: Box::new(receiver.bind(scope, scopes)),
                        name,
                    },
                    Callee::Static { ty, name } => Callee::Static { ty, name },
                },
                type_args,
                arguments: arguments
                    .into_iter()
                    .map(|a| Box::new(a.bind(scope, scopes)))
                    .collect(),
            },
            ExprKind::New { ty, arguments } => ExprKind::New {
                ty,
                arguments: arguments
                    .into_iter()
                    .map(|a| Box::new(a.bind(scope, scopes)))
                    .collect(),
            },
            ExprKind::Cast {
                target,
                checked,
                operand,
            } => ExprKind::Cast {
                target,
                checked,
                operand: Box::new(operand.bind(scope, scopes)),
            },
            ExprKind::AddressOf { operand } => ExprKind::AddressOf {
                operand: Box::new(operand.bind(scope, scopes)),
            },
            ExprKind::Deref { operand } => ExprKind::Deref {
                operand: Box::new(operand.bind(scope, scopes)),
            },
            ExprKind::Lambda { params, body } => {
                // The body gets its own scope with the parameters declared
                // in it. Unannotated parameters carry a placeholder type
                // until usage pins them.
                let lambda_scope = scopes.child(scope);
                for p in &params {
                    let ty = p.ty.unwrap_or(DataType::simple(primitives::LAMBDA));
                    scopes.declare_param(lambda_scope, p.name.clone(), ty);
                }
                ExprKind::Lambda {
                    params,
                    body: Box::new(body.bind(lambda_scope, scopes)),
                }
            }
            ExprKind::Error => ExprKind::Error,
        };
        BoundExpr {
            kind,
            span,
            scope,
            memo: Memo::default(),
        }
    }
}

/// What an assignment target denotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// A local variable or parameter.
    Local {
        /// Declaring scope.
        scope: ScopeId,
        /// Slot index within that scope.
        index: u32,
        /// Variable name.
        name: String,
        /// Variable type.
        ty: DataType,
    },
    /// A field, through an instance receiver, an implicit `this`, or none
    /// when static.
    Field {
        field: TypeHash,
        is_static: bool,
        ty: DataType,
    },
    /// A property with a setter.
    Property {
        property: TypeHash,
        is_static: bool,
        ty: DataType,
    },
    /// An indexer with a setter; index arguments are the node's children.
    Indexer { property: TypeHash, ty: DataType },
    /// The target of a pointer dereference.
    PointerTarget { ty: DataType },
}

impl Place {
    /// The type of the stored value.
    pub fn ty(&self) -> DataType {
        match self {
            Place::Local { ty, .. }
            | Place::Field { ty, .. }
            | Place::Property { ty, .. }
            | Place::Indexer { ty, .. }
            | Place::PointerTarget { ty } => *ty,
        }
    }
}

#[derive(Debug, Default)]
struct Memo {
    ty: OnceLock<DataType>,
    value: OnceLock<Option<ConstValue>>,
    errors: OnceLock<bool>,
    own_error: AtomicBool,
    operator: OnceLock<Option<OperatorResolution>>,
    call: OnceLock<Option<CallResolution>>,
    place: OnceLock<Option<Place>>,
    lowered: OnceLock<CanonicalExpr>,
}

/// A bound expression node: an [`ExprKind`] plus its scope and memoized
/// resolution results.
#[derive(Debug)]
pub struct BoundExpr {
    /// Node kind and children.
    pub kind: ExprKind<Box<BoundExpr>>,
    /// Source location.
    pub span: Span,
    /// The scope this node resolves names against.
    pub scope: ScopeId,
    memo: Memo,
}

impl BoundExpr {
    /// The node's resolved type. Resolution failures report a diagnostic
    /// and yield the error sentinel; the query itself never fails.
    pub fn ty(&self, ctx: &AnalysisContext) -> DataType {
        *self.memo.ty.get_or_init(|| self.resolve_type(ctx))
    }

    /// The node's compile-time constant value, when it has one.
    pub fn value(&self, ctx: &AnalysisContext) -> Option<ConstValue> {
        self.memo
            .value
            .get_or_init(|| {
                if self.ty(ctx).is_error() {
                    return None;
                }
                self.evaluate(ctx)
            })
            .clone()
    }

    /// Whether this node or any node beneath it failed to resolve.
    pub fn has_errors(&self, ctx: &AnalysisContext) -> bool {
        *self.memo.errors.get_or_init(|| {
            let ty = self.ty(ctx);
            let _ = self.value(ctx);
            ty.is_error()
                || self.memo.own_error.load(Ordering::Relaxed)
                || self.children().iter().any(|c| c.has_errors(ctx))
        })
    }

    /// Project this node into its canonical lowered form.
    pub fn project(&self, ctx: &AnalysisContext) -> &CanonicalExpr {
        self.memo.lowered.get_or_init(|| lower::project(ctx, self))
    }

    /// The operator resolution cached by type resolution, for operator
    /// nodes that resolved.
    pub fn operator(&self, ctx: &AnalysisContext) -> Option<&OperatorResolution> {
        self.ty(ctx);
        self.memo.operator.get().and_then(Option::as_ref)
    }

    /// The call resolution cached by type resolution, for call-shaped nodes
    /// that resolved.
    pub fn call_resolution(&self, ctx: &AnalysisContext) -> Option<&CallResolution> {
        self.ty(ctx);
        self.memo.call.get().and_then(Option::as_ref)
    }

    /// The storage location cached by type resolution, for assignment,
    /// compound-assignment and increment nodes whose target resolved.
    pub fn place(&self, ctx: &AnalysisContext) -> Option<&Place> {
        self.ty(ctx);
        self.memo.place.get().and_then(Option::as_ref)
    }

    /// Flag a problem on this node that its result type does not show (a
    /// cast that keeps its declared type, a readonly-assignment target).
    pub(crate) fn mark_error(&self) {
        self.memo.own_error.store(true, Ordering::Relaxed);
    }

    pub(crate) fn set_operator(&self, resolution: Option<OperatorResolution>) {
        let _ = self.memo.operator.set(resolution);
    }

    pub(crate) fn set_call(&self, resolution: Option<CallResolution>) {
        let _ = self.memo.call.set(resolution);
    }

    pub(crate) fn set_place(&self, place: Option<Place>) {
        let _ = self.memo.place.set(place);
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&BoundExpr> {
        let mut out: Vec<&BoundExpr> = Vec::new();
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::This
            | ExprKind::StaticMember { .. }
            | ExprKind::Error => {}
            ExprKind::Binary { left, right, .. }
            | ExprKind::Logical { left, right, .. }
            | ExprKind::Coalesce { left, right } => {
                out.push(left);
                out.push(right);
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                out.push(condition);
                out.push(when_true);
                out.push(when_false);
            }
            ExprKind::Unary { operand, .. }
            | ExprKind::Cast { operand, .. }
            | ExprKind::AddressOf { operand }
            | ExprKind::Deref { operand } => out.push(operand),
            ExprKind::Increment { target, .. } => out.push(target),
            ExprKind::Assign { target, value }
            | ExprKind::CompoundAssign { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            ExprKind::Member { receiver, .. } => out.push(receiver),
            ExprKind::Index {
                receiver,
                arguments,
            } => {
                out.push(receiver);
                out.extend(arguments.iter().map(Box::as_ref));
            }
            ExprKind::Call {
                callee, arguments, ..
            } => {
                if let Callee::Member { receiver, .. } = callee {
                    out.push(receiver);
                }
                out.extend(arguments.iter().map(Box::as_ref));
            }
            ExprKind::New { arguments, .. } => out.extend(arguments.iter().map(Box::as_ref)),
            ExprKind::Lambda { body, .. } => out.push(body),
        }
        out
    }

    fn resolve_type(&self, ctx: &AnalysisContext) -> DataType {
        match &self.kind {
            ExprKind::Literal(v) => literals::type_of(v),
            ExprKind::Name(name) => member::resolve_name_type(ctx, self, name),
            ExprKind::This => member::resolve_this(ctx, self),
            ExprKind::Binary {
                op, left, right, ..
            } => binary::resolve(ctx, self, *op, left, right),
            ExprKind::Logical { op, left, right } => {
                binary::resolve_logical(ctx, self, *op, left, right)
            }
            ExprKind::Coalesce { left, right } => ternary::resolve_coalesce(ctx, self, left, right),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => ternary::resolve_conditional(ctx, self, condition, when_true, when_false),
            ExprKind::Unary { op, operand, .. } => unary::resolve(ctx, self, *op, operand),
            ExprKind::Increment { op, target, .. } => {
                assignment::resolve_increment(ctx, self, *op, target)
            }
            ExprKind::Assign { target, value } => assignment::resolve_assign(ctx, self, target, value),
            ExprKind::CompoundAssign {
                op, target, value, ..
            } => assignment::resolve_compound(ctx, self, *op, target, value),
            ExprKind::Member { receiver, name } => {
                member::resolve_member(ctx, self, receiver, name)
            }
            ExprKind::StaticMember { ty, name } => {
                member::resolve_static_member(ctx, self, *ty, name)
            }
            ExprKind::Index {
                receiver,
                arguments,
            } => calls::resolve_index(ctx, self, receiver, arguments),
            ExprKind::Call {
                callee,
                type_args,
                arguments,
            } => calls::resolve_call_expr(ctx, self, callee, type_args, arguments),
            ExprKind::New { ty, arguments } => calls::resolve_new(ctx, self, *ty, arguments),
            ExprKind::Cast { target, operand, .. } => cast::resolve(ctx, self, *target, operand),
            ExprKind::AddressOf { operand } => unary::resolve_address_of(ctx, self, operand),
            ExprKind::Deref { operand } => unary::resolve_deref(ctx, self, operand),
            ExprKind::Lambda { params, body } => lambda::resolve(ctx, params, body),
            ExprKind::Error => DataType::ERROR,
        }
    }

    fn evaluate(&self, ctx: &AnalysisContext) -> Option<ConstValue> {
        match &self.kind {
            ExprKind::Literal(v) => Some(v.clone()),
            ExprKind::Binary {
                op,
                checked,
                left,
                right,
            } => binary::evaluate(ctx, self, *op, *checked, left, right),
            ExprKind::Logical { op, left, right } => {
                binary::evaluate_logical(ctx, *op, left, right)
            }
            ExprKind::Coalesce { left, right } => ternary::evaluate_coalesce(ctx, left, right),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => ternary::evaluate_conditional(ctx, self, condition, when_true, when_false),
            ExprKind::Unary {
                op,
                checked,
                operand,
            } => unary::evaluate(ctx, self, *op, *checked, operand),
            ExprKind::Cast {
                target,
                checked,
                operand,
            } => cast::evaluate(ctx, self, *target, *checked, operand),
            ExprKind::StaticMember { ty, name } => member::evaluate_static(ctx, *ty, name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{CollectingSink, primitives};
    use ilex_registry::SymbolRegistry;

    #[test]
    fn bind_attaches_scope_to_every_node() {
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let e = Expr::binary(
            BinaryOp::Add,
            Expr::int(1, Span::new(1, 1, 1)),
            Expr::int(2, Span::new(1, 5, 1)),
            Span::new(1, 1, 5),
        );
        let bound = e.bind(root, &mut scopes);
        assert_eq!(bound.scope, root);
        for child in bound.children() {
            assert_eq!(child.scope, root);
        }
    }

    #[test]
    fn queries_are_stable_across_calls() {
        let registry = SymbolRegistry::with_primitives();
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let bound = Expr::binary(
            BinaryOp::Add,
            Expr::int(2, Span::point(1, 1)),
            Expr::int(3, Span::point(1, 5)),
            Span::new(1, 1, 5),
        )
        .bind(root, &mut scopes);
        let sink = CollectingSink::new();
        let ctx = AnalysisContext::new(&registry, &scopes, &sink);

        let first = bound.ty(&ctx);
        let second = bound.ty(&ctx);
        assert_eq!(first, second);
        assert_eq!(first, DataType::simple(primitives::INT32));
        assert_eq!(bound.value(&ctx), Some(ConstValue::I32(5)));
        assert_eq!(bound.value(&ctx), Some(ConstValue::I32(5)));
        assert!(!bound.has_errors(&ctx));
        assert!(sink.is_empty());
    }

    #[test]
    fn lambda_binding_creates_a_parameter_scope() {
        let mut scopes = ScopeTree::new();
        let root = scopes.root();
        let lambda = Expr::lambda(
            vec![LambdaParam::typed(
                "x",
                DataType::simple(primitives::INT32),
            )],
            Expr::name("x", Span::point(1, 10)),
            Span::new(1, 1, 12),
        );
        let bound = lambda.bind(root, &mut scopes);
        let ExprKind::Lambda { body, .. } = &bound.kind else {
            panic!("expected lambda");
        };
        assert_ne!(body.scope, root);
        assert!(matches!(
            scopes.resolve_name(body.scope, "x"),
            ilex_registry::NameResolution::Local(_, _)
        ));
    }
}
