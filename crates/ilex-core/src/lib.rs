//! Core data model shared by the ilex semantic engine.
//!
//! This crate holds the leaf-level vocabulary everything else builds on:
//! source spans, the diagnostic taxonomy, deterministic type identity,
//! complete type references, well-known platform primitives, and typed
//! compile-time constant values.

pub mod data_type;
pub mod error;
pub mod primitives;
pub mod span;
pub mod type_hash;
pub mod value;

pub use data_type::DataType;
pub use error::{CollectingSink, Diagnostic, DiagnosticSink, ErrorKind, SemanticError};
pub use primitives::PrimitiveKind;
pub use span::Span;
pub use type_hash::TypeHash;
pub use value::{ConstValue, Decimal};
