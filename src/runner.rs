use crate::cli::{split_assignment, Cli};
use crate::collaborators::{AttributeBinding, TypeConverter, ValueType};
use crate::error::{Error, Result};
use paramatch_pattern::{EvaluationContext, LiteralMode, PatternBuilder, PatternOptions, Value};
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Matched; parameter values in declaration order.
    Matched(Vec<(String, Value)>),
    NoMatch,
    /// Matched, but converting or binding a parameter failed.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct InputResult {
    pub input: String,
    pub outcome: Outcome,
}

impl InputResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Matched(_))
    }
}

#[derive(Debug)]
pub struct RunResult {
    pub results: Vec<InputResult>,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.results.iter().all(InputResult::passed)
    }

    pub fn matched(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }
}

/// Builds the pattern described by the command line, binding every parameter
/// to a context attribute of the same name.
pub fn build_pattern(cli: &Cli) -> Result<PatternBuilder> {
    let mode = if cli.regex {
        LiteralMode::Regex
    } else {
        LiteralMode::Escaped
    };
    let mut options = PatternOptions::new().literal_mode(mode);
    if let Some(constraint) = &cli.default_constraint {
        options = options.default_constraint(constraint)?;
    }

    let mut builder = PatternBuilder::with_options(&cli.template, options)?;

    for arg in &cli.constraints {
        let (name, constraint) = split_assignment(arg)?;
        builder.where_param(name)?.matches(constraint)?;
    }

    for arg in &cli.types {
        let (name, value_type) = split_assignment(arg)?;
        let value_type: ValueType = value_type.parse()?;
        builder
            .where_param(name)?
            .converted_by(Arc::new(TypeConverter::new(name, value_type)));
    }

    let names: Vec<String> = builder.parameters().names().map(str::to_string).collect();
    for name in &names {
        builder
            .where_param(name)?
            .binds_to(Arc::new(AttributeBinding::new(name.as_str())));
    }

    let matcher = builder.matcher()?;
    debug!(regex = matcher.regex(), "pattern ready");
    Ok(builder)
}

/// Renders the template from `--render NAME=VALUE` pairs.
pub fn render(builder: &PatternBuilder, assignments: &[String]) -> Result<String> {
    let values = assignments
        .iter()
        .map(|arg| split_assignment(arg))
        .collect::<Result<Vec<_>>>()?;
    Ok(builder.render(values)?)
}

/// Inputs from the command line followed by those read from `file`.
pub fn read_inputs(cli: &Cli) -> Result<Vec<String>> {
    let mut inputs = cli.inputs.clone();
    if let Some(path) = &cli.file {
        let content = read_file(path).map_err(|source| Error::ReadInputs {
            path: path.clone(),
            source,
        })?;
        inputs.extend(content.lines().map(str::to_string));
    }
    Ok(inputs)
}

fn read_file(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        std::fs::read_to_string(path)
    }
}

pub fn evaluate_input(builder: &PatternBuilder, input: &str) -> InputResult {
    let mut context = EvaluationContext::new();
    let outcome = match builder.evaluate(input, &mut context) {
        Ok(false) => Outcome::NoMatch,
        Ok(true) => match context.perform_pre_operations() {
            Ok(()) => Outcome::Matched(
                builder
                    .parameters()
                    .names()
                    .filter_map(|name| Some((name.to_string(), context.get(name)?.clone())))
                    .collect(),
            ),
            Err(e) => Outcome::Failed(e.to_string()),
        },
        Err(e) => Outcome::Failed(e.to_string()),
    };

    InputResult {
        input: input.to_string(),
        outcome,
    }
}

pub fn run(builder: &PatternBuilder, inputs: &[String], sequential: bool) -> RunResult {
    let start = Instant::now();

    let results: Vec<InputResult> = if sequential || inputs.len() == 1 {
        inputs
            .iter()
            .map(|input| evaluate_input(builder, input))
            .collect()
    } else {
        inputs
            .par_iter()
            .map(|input| evaluate_input(builder, input))
            .collect()
    };

    let elapsed = start.elapsed();
    info!(
        inputs = results.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "evaluated inputs"
    );

    RunResult { results, elapsed }
}
