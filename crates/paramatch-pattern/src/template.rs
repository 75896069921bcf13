use crate::error::{PatternError, Result};
use crate::options::LiteralMode;
use crate::parser;
use std::sync::Arc;

/// A piece of a template: literal text or a `{name}` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Placeholder(Arc<str>),
}

/// A parsed template. Immutable once built.
#[derive(Debug, Clone)]
pub struct Template {
    source: Arc<str>,
    segments: Vec<Segment>,
    names: Vec<Arc<str>>,
    mode: LiteralMode,
}

impl Template {
    pub fn parse(source: &str, mode: LiteralMode) -> Result<Self> {
        let segments = parser::parse_segments(source)?;

        let mut names: Vec<Arc<str>> = Vec::new();
        for segment in &segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        Ok(Self {
            source: source.into(),
            segments,
            names,
            mode,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn source_arc(&self) -> Arc<str> {
        self.source.clone()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct parameter names in declaration order.
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    pub fn mode(&self) -> LiteralMode {
        self.mode
    }

    pub fn has_placeholders(&self) -> bool {
        !self.names.is_empty()
    }

    /// The whole template as plain text when it has no placeholders.
    pub fn literal_text(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// Substitutes a value for every placeholder.
    ///
    /// Values are inserted as-is; nothing is checked against constraints here.
    pub fn render<F, S>(&self, mut lookup: F) -> Result<String>
    where
        F: FnMut(&str) -> Option<S>,
        S: AsRef<str>,
    {
        let mut result = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        lookup(&name[..]).ok_or_else(|| PatternError::MissingValue(name.to_string()))?;
                    result.push_str(value.as_ref());
                }
            }
        }
        Ok(result)
    }
}
