//! Literal values appearing in bindings and default parameter values.

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::data_type::DataType;

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Null,
    Bool(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Double(OrderedFloat<f64>),
    /// Decimal literals keep their source text; arithmetic on them is never folded.
    Decimal(Arc<str>),
    String(Arc<str>),
}

impl Constant {
    /// The natural type of the literal.
    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Null => DataType::Null,
            Constant::Bool(_) => DataType::bool(),
            Constant::Char(_) => DataType::char(),
            Constant::Int(_) => DataType::int32(),
            Constant::Long(_) => DataType::int64(),
            Constant::Double(_) => DataType::double(),
            Constant::Decimal(_) => DataType::decimal(),
            Constant::String(_) => DataType::string(),
        }
    }

    pub fn string(value: &str) -> Self {
        Constant::String(Arc::from(value))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(value) => write!(f, "{value}"),
            Constant::Char(value) => write!(f, "'{}'", value.escape_default()),
            Constant::Int(value) => write!(f, "{value}"),
            Constant::Long(value) => write!(f, "{value}L"),
            Constant::Double(value) => {
                let value = value.into_inner();
                if value.fract() == 0.0 && value.is_finite() {
                    write!(f, "{value:.1}")
                } else {
                    write!(f, "{value}")
                }
            }
            Constant::Decimal(text) => write!(f, "{text}M"),
            Constant::String(value) => write!(f, "\"{}\"", value.escape_default()),
        }
    }
}
