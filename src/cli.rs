use crate::error::{Error, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "paramatch",
    about = "Match strings against parameterized templates like /path/{id} and extract the named segments",
    version
)]
pub struct Cli {
    /// Template to match against (e.g., "/path/{id}/{other}")
    pub template: String,

    /// Strings to match
    pub inputs: Vec<String>,

    /// Constrain a parameter with a regular expression
    #[arg(short = 'w', long = "where", value_name = "NAME=REGEX")]
    pub constraints: Vec<String>,

    /// Convert a parameter to a type: string, number or bool
    #[arg(short = 't', long = "type", value_name = "NAME=TYPE")]
    pub types: Vec<String>,

    /// Treat literal template text as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Constraint used for parameters without --where
    #[arg(long, value_name = "REGEX")]
    pub default_constraint: Option<String>,

    /// Read inputs from a file, one per line ("-" for stdin)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Render the template with these values instead of matching
    #[arg(short, long, value_name = "NAME=VALUE")]
    pub render: Vec<String>,

    /// Evaluate inputs sequentially instead of in parallel
    #[arg(short, long)]
    pub sequential: bool,

    /// Print nothing; report through the exit status only
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log pattern compilation and matching to stderr (-vv for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Splits `NAME=VALUE` at the first `=`.
pub fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(Error::InvalidAssignment(arg.to_string())),
    }
}
