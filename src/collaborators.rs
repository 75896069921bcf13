//! Converters and bindings the command line attaches to parameters.

use crate::error::Error;
use paramatch_pattern::{Binding, Converter, EvaluationContext, OperationError, Value};
use std::str::FromStr;

/// Type a parameter is converted to with `--type NAME=TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Number,
    Bool,
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "number" => Ok(ValueType::Number),
            "bool" => Ok(ValueType::Bool),
            other => Err(Error::UnknownType(other.to_string())),
        }
    }
}

pub struct TypeConverter {
    parameter: String,
    value_type: ValueType,
}

impl TypeConverter {
    pub fn new(parameter: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            parameter: parameter.into(),
            value_type,
        }
    }

    fn error(&self, raw: &str, message: &str) -> OperationError {
        OperationError::Conversion {
            parameter: self.parameter.clone(),
            raw: raw.to_string(),
            message: message.to_string(),
        }
    }
}

impl Converter for TypeConverter {
    fn convert(&self, _context: &EvaluationContext, raw: &str) -> Result<Value, OperationError> {
        match self.value_type {
            ValueType::String => Ok(Value::String(raw.to_string())),
            ValueType::Number => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(self.error(raw, "not a number")),
            },
            ValueType::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(self.error(raw, "expected 'true' or 'false'")),
            },
        }
    }
}

/// Binds a parameter to a context attribute of the same name.
pub struct AttributeBinding {
    key: String,
}

impl AttributeBinding {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Binding for AttributeBinding {
    fn submit(&self, context: &mut EvaluationContext, value: Value) -> Result<(), OperationError> {
        context.put(self.key.clone(), value);
        Ok(())
    }

    fn retrieve(&self, context: &EvaluationContext) -> Option<Value> {
        context.get(&self.key).cloned()
    }
}
