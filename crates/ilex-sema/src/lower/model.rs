//! The canonical lowered form.
//!
//! Projection rewrites an analyzed expression into a small, explicit
//! vocabulary: every implicit conversion becomes a [`CanonicalExpr::Convert`]
//! node, operators name the built-in form that carries them out or turn into
//! calls, short-circuiting and coalescing become conditionals over
//! temporaries, and pointer arithmetic is scaled to bytes. A backend walks
//! this tree without consulting the registry for semantics.

use ilex_core::{ConstValue, DataType, TypeHash};
use ilex_registry::ScopeId;

use crate::conversion::Conversion;
use crate::expr::{BinaryOp, UnaryOp};
use crate::overload::BuiltinOperator;

/// Identity of a lowering temporary, unique per analysis context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempId(pub u32);

/// One temporary definition inside a [`CanonicalExpr::Sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct TempDef {
    /// The temporary being defined.
    pub temp: TempId,
    /// Its value; evaluated once, in sequence order.
    pub value: CanonicalExpr,
}

/// A lowered call or construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    /// The resolved method, when overload resolution picked one. `None`
    /// for invocations through a delegate value.
    pub method: Option<TypeHash>,
    /// The receiver or delegate value; `None` for static methods and
    /// constructors.
    pub callee: Option<Box<CanonicalExpr>>,
    /// Arguments in parameter order, conversions applied, omitted defaults
    /// materialized.
    pub arguments: Vec<CanonicalExpr>,
    /// Index of the first argument that packs into the parameter array.
    pub packed_from: Option<usize>,
    /// Result type.
    pub ty: DataType,
}

/// A lowered storage location.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalPlace {
    /// A local variable or parameter slot.
    Local {
        scope: ScopeId,
        index: u32,
        ty: DataType,
    },
    /// A field; no receiver when static.
    Field {
        receiver: Option<Box<CanonicalExpr>>,
        field: TypeHash,
        ty: DataType,
    },
    /// A property; reads go through the getter, writes through the setter.
    Property {
        receiver: Option<Box<CanonicalExpr>>,
        property: TypeHash,
        ty: DataType,
    },
    /// An indexer with its index arguments.
    Indexer {
        receiver: Box<CanonicalExpr>,
        property: TypeHash,
        arguments: Vec<CanonicalExpr>,
        ty: DataType,
    },
    /// The storage a pointer points at.
    PointerTarget {
        pointer: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// A lowering temporary.
    Temp { temp: TempId, ty: DataType },
}

impl CanonicalPlace {
    /// The type of the stored value.
    pub fn ty(&self) -> DataType {
        match self {
            CanonicalPlace::Local { ty, .. }
            | CanonicalPlace::Field { ty, .. }
            | CanonicalPlace::Property { ty, .. }
            | CanonicalPlace::Indexer { ty, .. }
            | CanonicalPlace::PointerTarget { ty, .. }
            | CanonicalPlace::Temp { ty, .. } => *ty,
        }
    }
}

/// A lowered expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalExpr {
    /// A node that failed analysis; backends must not receive trees
    /// containing this once diagnostics were checked.
    Error,
    /// A compile-time constant.
    Constant { value: ConstValue, ty: DataType },
    /// Read a storage location.
    Read(CanonicalPlace),
    /// The enclosing instance receiver.
    This { ty: DataType },
    /// Apply a conversion.
    Convert {
        operand: Box<CanonicalExpr>,
        conversion: Conversion,
        ty: DataType,
    },
    /// A built-in binary operator at a concrete operand form.
    Binary {
        op: BinaryOp,
        operator: BuiltinOperator,
        checked: bool,
        lifted: bool,
        left: Box<CanonicalExpr>,
        right: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// A built-in unary operator.
    Unary {
        op: UnaryOp,
        operator: BuiltinOperator,
        checked: bool,
        lifted: bool,
        operand: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// A call (user-defined operators lower to this as well).
    Call(CallSite),
    /// A construction.
    New(CallSite),
    /// `condition ? when_true : when_false`, also the lowered form of the
    /// short-circuit and coalescing operators.
    Conditional {
        condition: Box<CanonicalExpr>,
        when_true: Box<CanonicalExpr>,
        when_false: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// Store into a place; the expression's value is the stored value.
    Assign {
        place: CanonicalPlace,
        value: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// Evaluate temporaries in order, then the result.
    Sequence {
        temps: Vec<TempDef>,
        result: Box<CanonicalExpr>,
    },
    /// Read a temporary defined by an enclosing sequence.
    ReadTemp { temp: TempId, ty: DataType },
    /// Address of a place.
    AddressOf { place: CanonicalPlace, ty: DataType },
    /// Pointer plus a byte offset (already scaled by the element size).
    PointerOffset {
        pointer: Box<CanonicalExpr>,
        offset: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// Whether a nullable (or reference) operand holds a value.
    HasValue { operand: Box<CanonicalExpr> },
    /// The payload of a nullable operand known to hold a value.
    GetValue {
        operand: Box<CanonicalExpr>,
        ty: DataType,
    },
    /// An anonymous function with its resolved parameter types.
    Lambda {
        params: Vec<DataType>,
        body: Box<CanonicalExpr>,
        ty: DataType,
    },
}

impl CanonicalExpr {
    /// The expression's type. [`CanonicalExpr::Error`] and sequences
    /// delegate to their payloads; `HasValue` is always `bool`.
    pub fn ty(&self) -> DataType {
        match self {
            CanonicalExpr::Error => DataType::ERROR,
            CanonicalExpr::Constant { ty, .. }
            | CanonicalExpr::This { ty }
            | CanonicalExpr::Convert { ty, .. }
            | CanonicalExpr::Binary { ty, .. }
            | CanonicalExpr::Unary { ty, .. }
            | CanonicalExpr::Conditional { ty, .. }
            | CanonicalExpr::Assign { ty, .. }
            | CanonicalExpr::ReadTemp { ty, .. }
            | CanonicalExpr::AddressOf { ty, .. }
            | CanonicalExpr::PointerOffset { ty, .. }
            | CanonicalExpr::GetValue { ty, .. }
            | CanonicalExpr::Lambda { ty, .. } => *ty,
            CanonicalExpr::Read(place) => place.ty(),
            CanonicalExpr::Call(site) | CanonicalExpr::New(site) => site.ty,
            CanonicalExpr::Sequence { result, .. } => result.ty(),
            CanonicalExpr::HasValue { .. } => DataType::BOOL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::primitives;

    #[test]
    fn sequence_type_is_the_result_type() {
        let int32 = DataType::simple(primitives::INT32);
        let seq = CanonicalExpr::Sequence {
            temps: vec![TempDef {
                temp: TempId(0),
                value: CanonicalExpr::Constant {
                    value: ConstValue::I32(1),
                    ty: int32,
                },
            }],
            result: Box::new(CanonicalExpr::ReadTemp {
                temp: TempId(0),
                ty: int32,
            }),
        };
        assert_eq!(seq.ty(), int32);
    }

    #[test]
    fn has_value_is_bool() {
        let probe = CanonicalExpr::HasValue {
            operand: Box::new(CanonicalExpr::Error),
        };
        assert_eq!(probe.ty(), DataType::BOOL);
    }
}
