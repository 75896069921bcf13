//! Collaborators a parameter hands its captured value to.
//!
//! None of these run at match time. [`PatternBuilder::evaluate`] only queues
//! [`Operation`]s that call them; the caller decides when to perform those.
//!
//! [`PatternBuilder::evaluate`]: crate::PatternBuilder::evaluate
//! [`Operation`]: crate::Operation

use crate::context::EvaluationContext;
use crate::error::OperationError;
use crate::value::Value;

/// Turns captured text into a typed [`Value`].
pub trait Converter: Send + Sync {
    fn convert(&self, context: &EvaluationContext, raw: &str) -> Result<Value, OperationError>;
}

/// Accepts or rejects a converted value.
pub trait Validator: Send + Sync {
    fn validate(&self, context: &EvaluationContext, value: &Value) -> bool;
}

/// The model location a parameter value is written to.
pub trait Binding: Send + Sync {
    fn submit(&self, context: &mut EvaluationContext, value: Value) -> Result<(), OperationError>;

    fn retrieve(&self, context: &EvaluationContext) -> Option<Value>;
}

impl<F> Converter for F
where
    F: Fn(&str) -> Result<Value, OperationError> + Send + Sync,
{
    fn convert(&self, _context: &EvaluationContext, raw: &str) -> Result<Value, OperationError> {
        self(raw)
    }
}

impl<F> Validator for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn validate(&self, _context: &EvaluationContext, value: &Value) -> bool {
        self(value)
    }
}
