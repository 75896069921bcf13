//! Parameterized string patterns with constraints and deferred binding.
//!
//! A template such as `/path/{id}/{other}` is compiled into a whole-string
//! regular expression. Each `{name}` placeholder captures one parameter,
//! restricted by its constraint (one path segment unless configured).
//!
//! Matching never converts, validates or binds anything. Evaluating a
//! [`PatternBuilder`] against an event queues [`Operation`]s on the
//! [`EvaluationContext`] that run the parameter's collaborators later.
//!
//! # Example
//!
//! ```
//! use paramatch_pattern::{EvaluationContext, OperationError, PatternBuilder, Value};
//! use std::sync::Arc;
//!
//! let number = |raw: &str| -> Result<Value, OperationError> {
//!     raw.parse().map(Value::Number).map_err(|_| OperationError::Conversion {
//!         parameter: "id".to_string(),
//!         raw: raw.to_string(),
//!         message: "not a number".to_string(),
//!     })
//! };
//!
//! let mut path = PatternBuilder::new("/path/{id}").unwrap();
//! path.where_param("id")
//!     .unwrap()
//!     .matches("[0-9]+")
//!     .unwrap()
//!     .converted_by(Arc::new(number));
//!
//! let mut context = EvaluationContext::new();
//! assert!(path.evaluate("/path/42", &mut context).unwrap());
//! assert_eq!(context.pre_operations().len(), 2);
//!
//! context.perform_pre_operations().unwrap();
//! assert_eq!(context.converted_value("id"), Some(&Value::Number(42.0)));
//! ```

mod binding;
mod builder;
mod context;
mod error;
mod matcher;
mod options;
mod parser;
mod registry;
mod template;
mod value;

pub use binding::{Binding, Converter, Validator};
pub use builder::{BuilderState, ParameterConfig, PatternBuilder};
pub use context::{EvaluationContext, Event, Operation};
pub use error::{OperationError, PatternError, Result};
pub use matcher::{Captures, CompiledPattern, ParameterizedPattern};
pub use options::{LiteralMode, PatternOptions, DEFAULT_CONSTRAINT};
pub use registry::{Constraint, Parameter, ParameterRegistry};
pub use template::{Segment, Template};
pub use value::Value;
