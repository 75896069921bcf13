//! Declared parameters of a template and their per-parameter configuration.

use crate::binding::{Binding, Converter, Validator};
use crate::error::{PatternError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A constraint sub-pattern together with its whole-string form, used to
/// check values independently of the surrounding template.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    anchored: Regex,
}

impl Constraint {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("(?s)^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_satisfied_by(&self, value: &str) -> bool {
        self.anchored.is_match(value)
    }
}

/// One named placeholder of a template.
#[derive(Clone)]
pub struct Parameter {
    name: Arc<str>,
    constraint: Option<Constraint>,
    converter: Option<Arc<dyn Converter>>,
    validator: Option<Arc<dyn Validator>>,
    binding: Option<Arc<dyn Binding>>,
}

impl Parameter {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            converter: None,
            validator: None,
            binding: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn converter(&self) -> Option<&Arc<dyn Converter>> {
        self.converter.as_ref()
    }

    pub fn validator(&self) -> Option<&Arc<dyn Validator>> {
        self.validator.as_ref()
    }

    pub fn binding(&self) -> Option<&Arc<dyn Binding>> {
        self.binding.as_ref()
    }

    /// True when a match should queue operations for this parameter.
    pub fn has_collaborators(&self) -> bool {
        self.converter.is_some() || self.validator.is_some() || self.binding.is_some()
    }

    pub(crate) fn set_constraint(&mut self, constraint: Constraint) {
        self.constraint = Some(constraint);
    }

    pub(crate) fn set_converter(&mut self, converter: Arc<dyn Converter>) {
        self.converter = Some(converter);
    }

    pub(crate) fn set_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validator = Some(validator);
    }

    pub(crate) fn set_binding(&mut self, binding: Arc<dyn Binding>) {
        self.binding = Some(binding);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("constraint", &self.constraint.as_ref().map(Constraint::as_str))
            .field("converter", &self.converter.is_some())
            .field("validator", &self.validator.is_some())
            .field("binding", &self.binding.is_some())
            .finish()
    }
}

/// Parameters of one template in declaration order.
///
/// Built once from the parsed template; configuration can only touch names
/// the template declares. Every change bumps [`revision`](Self::revision).
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    template: Arc<str>,
    parameters: Vec<Parameter>,
    revision: u64,
}

impl ParameterRegistry {
    pub(crate) fn new(template: Arc<str>, names: &[Arc<str>]) -> Self {
        Self {
            template,
            parameters: names.iter().cloned().map(Parameter::new).collect(),
            revision: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.position(name).map(|i| &self.parameters[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(Parameter::name)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Declaration index of `name`, or `UnknownParameter`.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| PatternError::UnknownParameter {
                name: name.to_string(),
                template: self.template.to_string(),
            })
    }

    /// Sets or replaces the constraint of `name`.
    pub fn constrain(&mut self, name: &str, pattern: &str) -> Result<()> {
        let index = self.index_of(name)?;
        self.constrain_at(index, pattern)
    }

    pub fn set_converter(&mut self, name: &str, converter: Arc<dyn Converter>) -> Result<()> {
        let index = self.index_of(name)?;
        self.update_at(index, |p| p.set_converter(converter));
        Ok(())
    }

    pub fn set_validator(&mut self, name: &str, validator: Arc<dyn Validator>) -> Result<()> {
        let index = self.index_of(name)?;
        self.update_at(index, |p| p.set_validator(validator));
        Ok(())
    }

    pub fn set_binding(&mut self, name: &str, binding: Arc<dyn Binding>) -> Result<()> {
        let index = self.index_of(name)?;
        self.update_at(index, |p| p.set_binding(binding));
        Ok(())
    }

    pub(crate) fn constrain_at(&mut self, index: usize, pattern: &str) -> Result<()> {
        let parameter = &self.parameters[index];
        if parameter.constraint().map(Constraint::as_str) == Some(pattern) {
            return Ok(());
        }
        let constraint =
            Constraint::new(pattern).map_err(|source| PatternError::InvalidConstraint {
                name: parameter.name().to_string(),
                source,
            })?;
        self.update_at(index, |p| p.set_constraint(constraint));
        Ok(())
    }

    pub(crate) fn update_at(&mut self, index: usize, update: impl FnOnce(&mut Parameter)) {
        update(&mut self.parameters[index]);
        self.revision += 1;
    }

    pub(crate) fn template(&self) -> &str {
        &self.template
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name() == name)
    }
}
