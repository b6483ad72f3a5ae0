//! Literal typing.

use ilex_core::{ConstValue, DataType};

/// The type a literal constant carries on its own.
pub fn type_of(value: &ConstValue) -> DataType {
    match value {
        ConstValue::Str(_) => DataType::STRING,
        ConstValue::Null => DataType::NULL,
        other => match other.kind() {
            Some(kind) => DataType::simple(kind.type_hash()),
            None => DataType::ERROR,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilex_core::{Decimal, primitives};

    #[test]
    fn literals_carry_their_kind() {
        assert_eq!(
            type_of(&ConstValue::I32(1)),
            DataType::simple(primitives::INT32)
        );
        assert_eq!(
            type_of(&ConstValue::F64(1.0)),
            DataType::simple(primitives::FLOAT64)
        );
        assert_eq!(
            type_of(&ConstValue::Dec(Decimal::from_int(1))),
            DataType::simple(primitives::DECIMAL)
        );
        assert_eq!(type_of(&ConstValue::Bool(true)), DataType::BOOL);
        assert_eq!(type_of(&ConstValue::Str("x".into())), DataType::STRING);
        assert_eq!(type_of(&ConstValue::Null), DataType::NULL);
    }
}
