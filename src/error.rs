use paramatch_pattern::PatternError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read inputs from '{path}'")]
    ReadInputs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument '{0}' (expected NAME=VALUE)")]
    InvalidAssignment(String),

    #[error("Invalid type '{0}' (expected 'string', 'number' or 'bool')")]
    UnknownType(String),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

pub type Result<T> = std::result::Result<T, Error>;
