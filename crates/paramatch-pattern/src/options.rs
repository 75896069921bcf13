use crate::error::{PatternError, Result};
use crate::registry::{Constraint, Parameter};
use std::sync::LazyLock;

/// Constraint applied to parameters that were never constrained: one
/// non-empty path segment.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

static DEFAULT: LazyLock<Constraint> =
    LazyLock::new(|| Constraint::new(DEFAULT_CONSTRAINT).expect("valid default constraint"));

/// How literal template text is turned into regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralMode {
    /// Literal text matches itself only.
    #[default]
    Escaped,
    /// Literal text is a regex fragment, e.g. `/application/.*`.
    Regex,
}

#[derive(Debug, Clone)]
pub struct PatternOptions {
    literal_mode: LiteralMode,
    default_constraint: Constraint,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            literal_mode: LiteralMode::default(),
            default_constraint: DEFAULT.clone(),
        }
    }
}

impl PatternOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal_mode(mut self, mode: LiteralMode) -> Self {
        self.literal_mode = mode;
        self
    }

    pub fn default_constraint(mut self, pattern: &str) -> Result<Self> {
        self.default_constraint =
            Constraint::new(pattern).map_err(|source| PatternError::InvalidConstraint {
                name: "<default>".to_string(),
                source,
            })?;
        Ok(self)
    }

    pub fn mode(&self) -> LiteralMode {
        self.literal_mode
    }

    pub fn fallback_constraint(&self) -> &Constraint {
        &self.default_constraint
    }

    /// The constraint `parameter` is matched with.
    pub fn constraint_for<'a>(&'a self, parameter: &'a Parameter) -> &'a Constraint {
        parameter.constraint().unwrap_or(&self.default_constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PatternOptions::default();
        assert_eq!(options.mode(), LiteralMode::Escaped);
        assert_eq!(options.fallback_constraint().as_str(), DEFAULT_CONSTRAINT);
        assert!(options.fallback_constraint().is_satisfied_by("segment"));
        assert!(!options.fallback_constraint().is_satisfied_by("a/b"));
        assert!(!options.fallback_constraint().is_satisfied_by(""));
    }

    #[test]
    fn test_custom_default_constraint() {
        let options = PatternOptions::new()
            .literal_mode(LiteralMode::Regex)
            .default_constraint(".*")
            .unwrap();
        assert_eq!(options.mode(), LiteralMode::Regex);
        assert!(options.fallback_constraint().is_satisfied_by("a/b"));
    }

    #[test]
    fn test_invalid_default_constraint() {
        assert!(matches!(
            PatternOptions::new().default_constraint("("),
            Err(PatternError::InvalidConstraint { .. })
        ));
    }
}
