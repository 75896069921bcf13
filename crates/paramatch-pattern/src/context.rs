//! Evaluation context, events and deferred operations.

use crate::error::OperationError;
use crate::registry::Parameter;
use crate::value::Value;
use std::collections::HashMap;

/// Something a pattern is evaluated against.
///
/// An event that is not of the kind a pattern applies to makes the
/// context-aware entry points answer "no match" instead of failing.
pub trait Event {
    fn is_applicable(&self, _context: &EvaluationContext) -> bool {
        true
    }

    /// The string offered for matching, if the event carries one.
    fn value(&self) -> Option<&str>;
}

impl Event for str {
    fn value(&self) -> Option<&str> {
        Some(self)
    }
}

impl Event for String {
    fn value(&self) -> Option<&str> {
        Some(self)
    }
}

/// A queued step that runs a parameter's collaborators.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Convert the raw capture and store the result in the context.
    Convert { parameter: Parameter, raw: String },
    /// Validate the converted value, then submit it to the binding.
    ValidateAndBind { parameter: Parameter, raw: String },
}

impl Operation {
    pub fn parameter(&self) -> &Parameter {
        match self {
            Operation::Convert { parameter, .. } | Operation::ValidateAndBind { parameter, .. } => {
                parameter
            }
        }
    }

    pub fn perform(&self, context: &mut EvaluationContext) -> Result<(), OperationError> {
        match self {
            Operation::Convert { parameter, raw } => {
                let value = convert(parameter, context, raw)?;
                context.store_converted(parameter.name(), raw, value);
                Ok(())
            }
            Operation::ValidateAndBind { parameter, raw } => {
                let value = match context.converted.get(parameter.name()) {
                    Some((from, value)) if from == raw => value.clone(),
                    _ => {
                        let value = convert(parameter, context, raw)?;
                        context.store_converted(parameter.name(), raw, value.clone());
                        value
                    }
                };

                if let Some(validator) = parameter.validator() {
                    if !validator.validate(context, &value) {
                        return Err(OperationError::Validation {
                            parameter: parameter.name().to_string(),
                            value: value.to_string(),
                        });
                    }
                }

                if let Some(binding) = parameter.binding() {
                    binding.submit(context, value)?;
                }
                Ok(())
            }
        }
    }
}

fn convert(
    parameter: &Parameter,
    context: &EvaluationContext,
    raw: &str,
) -> Result<Value, OperationError> {
    match parameter.converter() {
        Some(converter) => converter.convert(context, raw),
        None => Ok(Value::String(raw.to_string())),
    }
}

/// Caller-owned state for one evaluation.
#[derive(Debug, Default)]
pub struct EvaluationContext {
    pre_operations: Vec<Operation>,
    // converted value per parameter, with the raw capture it came from
    converted: HashMap<String, (String, Value)>,
    attributes: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pre_operation(&mut self, operation: Operation) {
        self.pre_operations.push(operation);
    }

    /// Queued operations in insertion order.
    pub fn pre_operations(&self) -> &[Operation] {
        &self.pre_operations
    }

    pub fn take_pre_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.pre_operations)
    }

    /// Performs and removes every queued operation, stopping at the first
    /// failure. Operations after the failing one are discarded.
    pub fn perform_pre_operations(&mut self) -> Result<(), OperationError> {
        for operation in self.take_pre_operations() {
            operation.perform(self)?;
        }
        Ok(())
    }

    pub fn converted_value(&self, parameter: &str) -> Option<&Value> {
        self.converted.get(parameter).map(|(_, value)| value)
    }

    /// Drops the converted value left by an earlier evaluation.
    pub(crate) fn clear_converted(&mut self, parameter: &str) {
        self.converted.remove(parameter);
    }

    fn store_converted(&mut self, parameter: &str, raw: &str, value: Value) {
        self.converted
            .insert(parameter.to_string(), (raw.to_string(), value));
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use std::sync::Arc;

    struct AttributeBinding(&'static str);

    impl Binding for AttributeBinding {
        fn submit(&self, context: &mut EvaluationContext, value: Value) -> Result<(), OperationError> {
            context.put(self.0, value);
            Ok(())
        }

        fn retrieve(&self, context: &EvaluationContext) -> Option<Value> {
            context.get(self.0).cloned()
        }
    }

    fn number(raw: &str) -> Result<Value, OperationError> {
        raw.parse::<f64>()
            .map(Value::Number)
            .map_err(|e| OperationError::Conversion {
                parameter: "id".to_string(),
                raw: raw.to_string(),
                message: e.to_string(),
            })
    }

    fn parameter() -> Parameter {
        let mut parameter = Parameter::new("id");
        parameter.set_converter(Arc::new(number));
        parameter.set_binding(Arc::new(AttributeBinding("person.id")));
        parameter
    }

    #[test]
    fn test_str_is_an_event() {
        assert!("abc".is_applicable(&EvaluationContext::new()));
        assert_eq!("abc".value(), Some("abc"));
        assert_eq!(String::from("x").value(), Some("x"));
    }

    #[test]
    fn test_convert_stores_value() {
        let mut context = EvaluationContext::new();
        let op = Operation::Convert {
            parameter: parameter(),
            raw: "12".to_string(),
        };
        op.perform(&mut context).unwrap();
        assert_eq!(context.converted_value("id"), Some(&Value::Number(12.0)));
        assert_eq!(context.get("person.id"), None);
    }

    #[test]
    fn test_validate_and_bind_converts_when_needed() {
        let mut context = EvaluationContext::new();
        let op = Operation::ValidateAndBind {
            parameter: parameter(),
            raw: "12".to_string(),
        };
        op.perform(&mut context).unwrap();
        assert_eq!(context.get("person.id"), Some(&Value::Number(12.0)));
    }

    #[test]
    fn test_validation_failure() {
        let mut parameter = parameter();
        parameter.set_validator(Arc::new(|v: &Value| v.as_number().map_or(false, |n| n > 100.0)));
        let mut context = EvaluationContext::new();
        context.add_pre_operation(Operation::Convert {
            parameter: parameter.clone(),
            raw: "12".to_string(),
        });
        context.add_pre_operation(Operation::ValidateAndBind {
            parameter,
            raw: "12".to_string(),
        });

        let err = context.perform_pre_operations().unwrap_err();
        assert!(matches!(err, OperationError::Validation { .. }));
        assert!(context.pre_operations().is_empty());
        assert_eq!(context.get("person.id"), None);
    }

    #[test]
    fn test_conversion_failure_stops_queue() {
        let mut context = EvaluationContext::new();
        context.add_pre_operation(Operation::Convert {
            parameter: parameter(),
            raw: "abc".to_string(),
        });
        context.add_pre_operation(Operation::ValidateAndBind {
            parameter: parameter(),
            raw: "abc".to_string(),
        });

        let err = context.perform_pre_operations().unwrap_err();
        assert!(matches!(err, OperationError::Conversion { .. }));
        assert_eq!(context.converted_value("id"), None);
    }

    #[test]
    fn test_validate_and_bind_ignores_value_from_other_capture() {
        let mut context = EvaluationContext::new();
        Operation::Convert {
            parameter: parameter(),
            raw: "1".to_string(),
        }
        .perform(&mut context)
        .unwrap();

        Operation::ValidateAndBind {
            parameter: parameter(),
            raw: "2".to_string(),
        }
        .perform(&mut context)
        .unwrap();
        assert_eq!(context.converted_value("id"), Some(&Value::Number(2.0)));
        assert_eq!(context.get("person.id"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_no_converter_passes_raw_string() {
        let mut context = EvaluationContext::new();
        let op = Operation::Convert {
            parameter: Parameter::new("seg"),
            raw: "path".to_string(),
        };
        op.perform(&mut context).unwrap();
        assert_eq!(context.converted_value("seg"), Some(&Value::from("path")));
    }
}
