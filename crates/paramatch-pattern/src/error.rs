use thiserror::Error;

/// Errors raised while building, configuring or rendering a pattern.
///
/// A string that simply fails to match is never an error.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern '{template}' at offset {position}: {reason}")]
    InvalidPattern {
        template: String,
        position: usize,
        reason: String,
    },

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("unknown parameter '{name}' in pattern '{template}'")]
    UnknownParameter { name: String, template: String },

    #[error("invalid constraint for parameter '{name}'")]
    InvalidConstraint {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("no value supplied for parameter '{0}'")]
    MissingValue(String),

    #[error("value '{value}' does not satisfy the constraint '{constraint}' of parameter '{name}'")]
    ConstraintViolation {
        name: String,
        value: String,
        constraint: String,
    },

    #[error("failed to build pattern regex: {0}")]
    RegexBuild(#[from] regex::Error),
}

/// Errors raised while performing deferred operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("could not convert '{raw}' for parameter '{parameter}': {message}")]
    Conversion {
        parameter: String,
        raw: String,
        message: String,
    },

    #[error("value {value} of parameter '{parameter}' failed validation")]
    Validation { parameter: String, value: String },

    #[error("could not bind parameter '{parameter}': {message}")]
    Binding { parameter: String, message: String },

    #[error("type error: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, PatternError>;
