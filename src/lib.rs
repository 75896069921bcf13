pub mod cli;
pub mod collaborators;
pub mod error;
pub mod output;
pub mod runner;

pub use paramatch_pattern::{ParameterizedPattern, PatternBuilder, PatternError, Value};
