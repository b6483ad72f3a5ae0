//! Diagnostics and the semantic error taxonomy.
//!
//! Semantic analysis never fails the compilation: every resolution function
//! is total, returning error sentinels on bad input, and reports each problem
//! exactly once as a structured [`Diagnostic`] delivered to a
//! [`DiagnosticSink`]. The sink is a collaborator owned by the host; it never
//! influences control flow back into the engine.
//!
//! [`SemanticError`] exists for host-facing APIs that want a `Result`: it
//! wraps the same taxonomy with `thiserror` display impls.

use thiserror::Error;

use crate::Span;

/// The semantic error taxonomy.
///
/// One variant per distinct user-visible problem kind. Kinds map closely to
/// what a diagnostics renderer would document as error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A simple name did not resolve in the current scope.
    NameNotInContext,
    /// An alias resolves through itself.
    CyclicAlias,
    /// Two or more overload candidates tied for best.
    AmbiguousCall,
    /// No candidate accepted the argument types.
    NoMatchingOverload,
    /// A binary operator has no applicable meaning for its operand types.
    BadBinaryOperation,
    /// A unary operator has no applicable meaning for its operand type.
    BadUnaryOperation,
    /// No implicit conversion exists between the two types.
    NoImplicitConversion,
    /// No conversion exists even with an explicit cast.
    NoExplicitConversion,
    /// The member exists but is not accessible from this site.
    InaccessibleTypeMember,
    /// A numeric literal does not fit its target type.
    ConstOutOfRange,
    /// The left side of an assignment does not denote a storage location.
    AssignmentLeftHandValueExpected,
    /// A readonly field was assigned outside its declaring constructor.
    ReadonlyFieldAssignment,
    /// A property used as an assignment target has no setter.
    PropertyHasNoSetter,
    /// An instance member was referenced without a receiver.
    ObjectRequired,
    /// A static member was referenced through a receiver.
    ObjectProhibited,
    /// Generic method type arguments could not be inferred.
    CantInferMethTypeArgs,
    /// Neither branch type of a conditional converts to the other.
    CannotInferTypeOfConditional,
    /// Neither operand type of `??` converts to the other.
    CannotInferTypeOfCoalescing,
    /// Pointer arithmetic on a non-pointer or void pointer.
    PointerExpected,
    /// Arithmetic on `void*` has no element size.
    UndefinedOperationOnVoidPointers,
    /// Address-of applied to a non-addressable expression.
    CannotTakeAddress,
    /// An argument count no candidate can accept.
    BadNumberOfArguments,
    /// Something that is not a method was called.
    CannotCallNonMethod,
}

impl ErrorKind {
    /// Short human-readable summary used when formatting diagnostics.
    pub fn summary(self) -> &'static str {
        match self {
            ErrorKind::NameNotInContext => "name does not exist in the current context",
            ErrorKind::CyclicAlias => "alias definition is cyclic",
            ErrorKind::AmbiguousCall => "the call is ambiguous between candidates",
            ErrorKind::NoMatchingOverload => "no overload matches the argument types",
            ErrorKind::BadBinaryOperation => "operator cannot be applied to these operand types",
            ErrorKind::BadUnaryOperation => "operator cannot be applied to this operand type",
            ErrorKind::NoImplicitConversion => "no implicit conversion exists",
            ErrorKind::NoExplicitConversion => "no conversion exists, even with an explicit cast",
            ErrorKind::InaccessibleTypeMember => "member is inaccessible from this context",
            ErrorKind::ConstOutOfRange => "constant value is out of range for the target type",
            ErrorKind::AssignmentLeftHandValueExpected => {
                "the left-hand side of an assignment must be a variable, field, property or indexer"
            }
            ErrorKind::ReadonlyFieldAssignment => {
                "a readonly field can only be assigned in a constructor of its declaring type"
            }
            ErrorKind::PropertyHasNoSetter => "property or indexer cannot be assigned: no setter",
            ErrorKind::ObjectRequired => "an object reference is required for the instance member",
            ErrorKind::ObjectProhibited => {
                "the static member cannot be accessed with an instance reference"
            }
            ErrorKind::CantInferMethTypeArgs => {
                "the type arguments of the method cannot be inferred from the usage"
            }
            ErrorKind::CannotInferTypeOfConditional => {
                "the type of the conditional expression cannot be determined"
            }
            ErrorKind::CannotInferTypeOfCoalescing => {
                "the type of the null-coalescing expression cannot be determined"
            }
            ErrorKind::PointerExpected => "pointer type expected",
            ErrorKind::UndefinedOperationOnVoidPointers => {
                "the operation is undefined on void pointers"
            }
            ErrorKind::CannotTakeAddress => "cannot take the address of this expression",
            ErrorKind::BadNumberOfArguments => "wrong number of arguments",
            ErrorKind::CannotCallNonMethod => "expression is not callable",
        }
    }
}

/// One structured diagnostic record: kind, primary location, related
/// locations, and message format arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where it went wrong.
    pub span: Span,
    /// Zero or more related locations (e.g. the competing candidates of an
    /// ambiguous call, or the original declaration site).
    pub related: Vec<Span>,
    /// Format arguments for the renderer (type names, member names, ...).
    pub args: Vec<String>,
}

impl Diagnostic {
    /// A diagnostic with no related spans or arguments.
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            related: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Attach a format argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Attach a related location.
    pub fn with_related(mut self, span: Span) -> Self {
        self.related.push(span);
        self
    }
}

/// Receiver of diagnostics. Implementations must tolerate reports in any
/// order and must not panic; the engine continues analysis after reporting.
pub trait DiagnosticSink {
    /// Deliver one diagnostic record.
    fn report(&self, diagnostic: Diagnostic);
}

/// A sink that collects diagnostics into a vector, for hosts and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    collected: std::sync::Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.collected.lock().expect("sink poisoned").clone()
    }

    /// Number of diagnostics reported so far.
    pub fn len(&self) -> usize {
        self.collected.lock().expect("sink poisoned").len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.collected.lock().expect("sink poisoned").push(diagnostic);
    }
}

/// Host-facing error wrapper for APIs that return `Result`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// A diagnostic-shaped failure surfaced through a `Result` API.
    #[error("at {span}: {}", kind.summary())]
    Diagnostic {
        /// The error kind.
        kind: ErrorKind,
        /// Where the error occurred.
        span: Span,
    },

    /// An internal invariant was violated; indicates an engine bug, not a
    /// user error.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}
