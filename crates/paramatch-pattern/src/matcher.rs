//! Regex compilation and matching of parameterized patterns.

use crate::builder::PatternBuilder;
use crate::context::{EvaluationContext, Event};
use crate::error::{PatternError, Result};
use crate::options::{LiteralMode, PatternOptions};
use crate::registry::{Constraint, ParameterRegistry};
use crate::template::{Segment, Template};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parameter values captured from one matching input, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    entries: Vec<(usize, Arc<str>, String)>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, n, _)| n.as_ref() == name)
            .map(|(_, _, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(_, n, v)| (n.as_ref(), v.as_str()))
    }

    /// Pairs of declaration index and captured text.
    pub(crate) fn indexed(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(i, _, v)| (*i, v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Captures {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

const GROUP_PREFIX: &str = "__p";

/// One step of the agreement search over a template with repeated names.
#[derive(Debug)]
enum Piece {
    Text(String),
    Fragment(Regex),
    Slot { index: usize, constraint: Constraint },
}

/// Finds a split of the input where every occurrence of a repeated name
/// captures the same text. Only used when the regex's own split disagrees.
#[derive(Debug)]
struct AgreementSearch {
    pieces: Vec<Piece>,
}

impl AgreementSearch {
    fn build(
        template: &Template,
        registry: &ParameterRegistry,
        options: &PatternOptions,
    ) -> Result<Self> {
        let mut pieces = Vec::with_capacity(template.segments().len());
        for segment in template.segments() {
            let piece = match segment {
                Segment::Literal(text) => match template.mode() {
                    LiteralMode::Escaped => Piece::Text(text.clone()),
                    LiteralMode::Regex => {
                        let source = format!("(?s)^(?:{})$", escape_braces(text));
                        let fragment =
                            Regex::new(&source).map_err(|e| PatternError::InvalidPattern {
                                template: template.source().to_string(),
                                position: 0,
                                reason: format!(
                                    "literal '{}' must be a complete regex when names repeat: {}",
                                    text, e
                                ),
                            })?;
                        Piece::Fragment(fragment)
                    }
                },
                Segment::Placeholder(name) => {
                    let index = registry.index_of(name)?;
                    let constraint = registry
                        .get_index(index)
                        .map_or(options.fallback_constraint(), |p| options.constraint_for(p));
                    Piece::Slot {
                        index,
                        constraint: constraint.clone(),
                    }
                }
            };
            pieces.push(piece);
        }
        Ok(Self { pieces })
    }

    fn run<'t>(&self, input: &'t str, values: &mut [Option<&'t str>]) -> bool {
        self.step(input, 0, 0, values)
    }

    fn step<'t>(
        &self,
        input: &'t str,
        pos: usize,
        piece: usize,
        values: &mut [Option<&'t str>],
    ) -> bool {
        let Some(current) = self.pieces.get(piece) else {
            return pos == input.len();
        };
        let rest = &input[pos..];

        match current {
            Piece::Text(text) => {
                rest.starts_with(text.as_str())
                    && self.step(input, pos + text.len(), piece + 1, values)
            }
            Piece::Fragment(fragment) => ends(rest).any(|end| {
                fragment.is_match(&rest[..end]) && self.step(input, pos + end, piece + 1, values)
            }),
            Piece::Slot { index, constraint } => {
                if let Some(bound) = values[*index] {
                    return rest.starts_with(bound)
                        && self.step(input, pos + bound.len(), piece + 1, values);
                }
                for end in ends(rest) {
                    let candidate = &rest[..end];
                    if !constraint.is_satisfied_by(candidate) {
                        continue;
                    }
                    values[*index] = Some(candidate);
                    if self.step(input, pos + end, piece + 1, values) {
                        return true;
                    }
                    values[*index] = None;
                }
                false
            }
        }
    }
}

// Candidate end offsets, longest first.
fn ends(rest: &str) -> impl Iterator<Item = usize> + '_ {
    (0..=rest.len()).rev().filter(|&i| rest.is_char_boundary(i))
}

/// A template compiled against one revision of its parameter registry.
#[derive(Debug)]
pub struct CompiledPattern {
    regex: Regex,
    // (capture group index, parameter index) for every placeholder occurrence
    slots: Vec<(usize, usize)>,
    // present only when a parameter name repeats
    agreement: Option<AgreementSearch>,
    revision: u64,
}

impl CompiledPattern {
    pub fn build(
        template: &Template,
        registry: &ParameterRegistry,
        options: &PatternOptions,
    ) -> Result<Self> {
        let mut regex_str = String::new();
        let mut parameters = Vec::new();

        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => match template.mode() {
                    LiteralMode::Escaped => regex_str.push_str(&regex::escape(text)),
                    LiteralMode::Regex => regex_str.push_str(&escape_braces(text)),
                },
                Segment::Placeholder(name) => {
                    let index = registry.index_of(name)?;
                    let constraint = registry
                        .get_index(index)
                        .map_or(options.fallback_constraint(), |p| options.constraint_for(p));
                    regex_str.push_str(&format!(
                        "(?P<{}{}>{})",
                        GROUP_PREFIX,
                        parameters.len(),
                        constraint.as_str()
                    ));
                    parameters.push(index);
                }
            }
        }

        let regex = Regex::new(&format!("(?s)^(?:{})$", regex_str))?;

        let slots = regex
            .capture_names()
            .enumerate()
            .filter_map(|(group, name)| {
                let occurrence: usize = name?.strip_prefix(GROUP_PREFIX)?.parse().ok()?;
                Some((group, *parameters.get(occurrence)?))
            })
            .collect();

        let agreement = if parameters.len() > registry.len() {
            Some(AgreementSearch::build(template, registry, options)?)
        } else {
            None
        };

        debug!(
            template = template.source(),
            regex = regex.as_str(),
            revision = registry.revision(),
            "compiled pattern"
        );

        Ok(Self {
            regex,
            slots,
            agreement,
            revision: registry.revision(),
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn has_repeated_names(&self) -> bool {
        self.agreement.is_some()
    }

    /// Captures per parameter, or `None` when the input does not match or no
    /// split lets every occurrence of a repeated name capture the same text.
    fn captures(&self, registry: &ParameterRegistry, input: &str) -> Option<Captures> {
        let caps = self.regex.captures(input)?;
        let mut values: Vec<Option<&str>> = vec![None; registry.len()];
        let mut agreed = true;

        for &(group, index) in &self.slots {
            let Some(m) = caps.get(group) else {
                continue;
            };
            let value = m.as_str();
            if values[index].is_some_and(|previous| previous != value) {
                agreed = false;
                break;
            }
            values[index] = Some(value);
        }

        if !agreed {
            let search = self.agreement.as_ref()?;
            values.iter_mut().for_each(|v| *v = None);
            if !search.run(input, &mut values) {
                trace!(input, "no split where repeated parameters agree");
                return None;
            }
        }

        let entries = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let parameter = registry.get_index(index)?;
                Some((index, Arc::from(parameter.name()), value?.to_string()))
            })
            .collect();

        Some(Captures { entries })
    }
}

// In regex mode, escaped template braces still mean literal braces.
fn escape_braces(text: &str) -> String {
    text.replace('{', r"\{").replace('}', r"\}")
}

/// A compiled, immutable parameterized pattern.
///
/// # Example
///
/// ```
/// use paramatch_pattern::ParameterizedPattern;
///
/// let pattern = ParameterizedPattern::new("/application/{seg}").unwrap();
///
/// assert!(pattern.matches("/application/path"));
/// assert!(!pattern.matches("/application/path/deeper"));
///
/// let captures = pattern.parse("/application/path").unwrap();
/// assert_eq!(captures.get("seg"), Some("path"));
/// ```
#[derive(Debug, Clone)]
pub struct ParameterizedPattern {
    template: Arc<Template>,
    registry: Arc<ParameterRegistry>,
    options: PatternOptions,
    compiled: Arc<CompiledPattern>,
}

impl ParameterizedPattern {
    pub fn new(template: &str) -> Result<Self> {
        Self::with_options(template, PatternOptions::default())
    }

    pub fn with_options(template: &str, options: PatternOptions) -> Result<Self> {
        let parsed = Arc::new(Template::parse(template, options.mode())?);
        let registry = Arc::new(ParameterRegistry::new(
            parsed.source_arc(),
            parsed.names(),
        ));

        // Unbalanced regex syntax in regex-mode literals only shows up here.
        Self::from_parts(parsed, registry, options).map_err(|e| match e {
            PatternError::RegexBuild(source) => PatternError::InvalidPattern {
                template: template.to_string(),
                position: 0,
                reason: source.to_string(),
            },
            other => other,
        })
    }

    pub(crate) fn from_parts(
        template: Arc<Template>,
        registry: Arc<ParameterRegistry>,
        options: PatternOptions,
    ) -> Result<Self> {
        let compiled = Arc::new(CompiledPattern::build(&template, &registry, &options)?);
        Ok(Self {
            template,
            registry,
            options,
            compiled,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn parameters(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn options(&self) -> &PatternOptions {
        &self.options
    }

    /// The compiled regular expression.
    pub fn regex(&self) -> &str {
        self.compiled.as_str()
    }

    pub fn revision(&self) -> u64 {
        self.compiled.revision()
    }

    /// A builder over the same template and parameter configuration.
    pub fn builder(&self) -> PatternBuilder {
        PatternBuilder::from_pattern(self.clone())
    }

    /// True if the whole input matches.
    pub fn matches(&self, input: &str) -> bool {
        if self.literal_equals(input) {
            return true;
        }
        let matched = if self.compiled.has_repeated_names() {
            self.compiled.captures(&self.registry, input).is_some()
        } else {
            self.compiled.regex.is_match(input)
        };
        trace!(template = self.template.source(), input, matched, "match");
        matched
    }

    /// Parameter values captured from `input`, or `None` if it does not match.
    pub fn parse(&self, input: &str) -> Option<Captures> {
        if self.literal_equals(input) {
            return Some(Captures::default());
        }
        let captures = self.compiled.captures(&self.registry, input);
        trace!(
            template = self.template.source(),
            input,
            matched = captures.is_some(),
            "parse"
        );
        captures
    }

    /// Like [`matches`](Self::matches), for the value carried by `event`.
    ///
    /// Returns `Ok(false)` for events this pattern does not apply to and
    /// `IllegalArgument` for applicable events without a value.
    pub fn matches_in<E>(&self, event: &E, context: &EvaluationContext) -> Result<bool>
    where
        E: Event + ?Sized,
    {
        Ok(self.parse_in(event, context)?.is_some())
    }

    pub fn parse_in<E>(&self, event: &E, context: &EvaluationContext) -> Result<Option<Captures>>
    where
        E: Event + ?Sized,
    {
        match self.event_value(event, context)? {
            Some(value) => Ok(self.parse(value)),
            None => Ok(None),
        }
    }

    /// Renders the template with `values`, checking each against its
    /// parameter's constraint.
    pub fn render<I, K, V>(&self, values: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let values: HashMap<String, String> = values
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        for parameter in self.registry.iter() {
            let Some(value) = values.get(parameter.name()) else {
                continue;
            };
            let constraint = self.options.constraint_for(parameter);
            if !constraint.is_satisfied_by(value) {
                return Err(PatternError::ConstraintViolation {
                    name: parameter.name().to_string(),
                    value: value.clone(),
                    constraint: constraint.as_str().to_string(),
                });
            }
        }

        self.template.render(|name| values.get(name))
    }

    /// The value `event` offers, `None` if the event is not applicable.
    pub(crate) fn event_value<'e, E>(
        &self,
        event: &'e E,
        context: &EvaluationContext,
    ) -> Result<Option<&'e str>>
    where
        E: Event + ?Sized,
    {
        if !event.is_applicable(context) {
            debug!(template = self.template.source(), "event not applicable");
            return Ok(None);
        }
        event.value().map(Some).ok_or_else(|| {
            PatternError::IllegalArgument(format!(
                "event carries no value to match against '{}'",
                self.template.source()
            ))
        })
    }

    pub(crate) fn template_arc(&self) -> Arc<Template> {
        self.template.clone()
    }

    pub(crate) fn registry_arc(&self) -> Arc<ParameterRegistry> {
        self.registry.clone()
    }

    // Placeholder-free escaped templates compare directly, no regex needed.
    fn literal_equals(&self, input: &str) -> bool {
        self.template.mode() == LiteralMode::Escaped
            && self.template.literal_text() == Some(input)
    }
}
