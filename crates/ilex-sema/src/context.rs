//! Shared analysis context threaded through every resolution query.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;

use ilex_core::{DataType, Diagnostic, DiagnosticSink, PrimitiveKind, TypeHash, primitives};
use ilex_registry::{ScopeId, ScopeTree, SymbolRegistry, TypeEntry};

use crate::lower::model::TempId;

/// Everything a resolution query needs, borrowed from the host for the
/// duration of analysis.
///
/// The context is immutable from the engine's point of view: all node-level
/// state lives in per-node memo cells, and the two mutable bits the engine
/// does need (temp numbering for lowering, pinned lambda parameter types)
/// sit behind their own synchronization so queries can run concurrently.
pub struct AnalysisContext<'a> {
    /// The symbol registry resolved against.
    pub registry: &'a SymbolRegistry,
    /// The scope tree the expressions were bound into.
    pub scopes: &'a ScopeTree,
    /// Where diagnostics go.
    pub sink: &'a dyn DiagnosticSink,
    next_temp: AtomicU32,
    lambda_params: Mutex<FxHashMap<(ScopeId, u32), DataType>>,
}

impl<'a> AnalysisContext<'a> {
    /// Build a context over the host's registry, scope tree and sink.
    pub fn new(
        registry: &'a SymbolRegistry,
        scopes: &'a ScopeTree,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            registry,
            scopes,
            sink,
            next_temp: AtomicU32::new(0),
            lambda_params: Mutex::new(FxHashMap::default()),
        }
    }

    /// Deliver one diagnostic to the host.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    /// Readable name of a type, for diagnostic arguments.
    pub fn type_name(&self, hash: TypeHash) -> String {
        self.registry.type_name(hash)
    }

    /// The primitive kind of a type, when it is a plain (non-nullable,
    /// non-reference) primitive.
    pub fn primitive_kind(&self, ty: DataType) -> Option<PrimitiveKind> {
        if ty.nullable || ty.by_ref {
            return None;
        }
        PrimitiveKind::of(ty.type_hash)
    }

    /// The underlying integer type of an enum, if `hash` names one.
    pub fn enum_underlying(&self, hash: TypeHash) -> Option<TypeHash> {
        self.registry
            .get_type(hash)
            .and_then(TypeEntry::as_enum)
            .map(|e| e.underlying)
    }

    /// Whether `hash` names a reference type (class, interface, string,
    /// object, delegate). Null converts to these without a wrapper.
    pub fn is_reference_type(&self, hash: TypeHash) -> bool {
        if hash == primitives::STRING || hash == primitives::OBJECT || hash == primitives::DELEGATE
        {
            return true;
        }
        matches!(
            self.registry.get_type(hash),
            Some(
                TypeEntry::Class(_)
                    | TypeEntry::Interface(_)
                    | TypeEntry::Delegate(_)
                    | TypeEntry::GenericInstance(_)
            )
        )
    }

    /// Allocate a fresh temporary for lowering. Identities are unique per
    /// context, so composed projections never collide.
    pub fn fresh_temp(&self) -> TempId {
        TempId(self.next_temp.fetch_add(1, Ordering::Relaxed))
    }

    /// Pin the type of an unannotated lambda parameter, identified by the
    /// lambda body's scope and the parameter slot. First pin wins; later
    /// hypotheses from competing overload candidates do not re-type a body
    /// that was already resolved.
    pub(crate) fn pin_lambda_param(&self, scope: ScopeId, index: u32, ty: DataType) {
        self.lambda_params
            .lock()
            .expect("lambda param table poisoned")
            .entry((scope, index))
            .or_insert(ty);
    }

    /// The pinned type of an unannotated lambda parameter, if any candidate
    /// has committed one.
    pub(crate) fn lambda_param_type(&self, scope: ScopeId, index: u32) -> Option<DataType> {
        self.lambda_params
            .lock()
            .expect("lambda param table poisoned")
            .get(&(scope, index))
            .copied()
    }
}
