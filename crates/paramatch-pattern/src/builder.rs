//! Fluent configuration of a pattern and evaluation against events.

use crate::binding::{Binding, Converter, Validator};
use crate::context::{EvaluationContext, Event, Operation};
use crate::error::{PatternError, Result};
use crate::matcher::{CompiledPattern, ParameterizedPattern};
use crate::options::PatternOptions;
use crate::registry::ParameterRegistry;
use crate::template::Template;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No parameter has been configured yet.
    Unconstrained,
    /// Configuration changed since the last compile.
    Constraining,
    /// The published snapshot reflects the current configuration.
    Ready,
}

/// Builds up per-parameter configuration for a template and evaluates it.
///
/// Configuration takes `&mut self`; evaluation takes `&self` and may run from
/// many threads at once. The compiled form is an immutable snapshot that is
/// rebuilt at most once per configuration change and swapped in atomically.
///
/// # Example
///
/// ```
/// use paramatch_pattern::{EvaluationContext, PatternBuilder};
///
/// let mut path = PatternBuilder::new("/path/{id}/{other}").unwrap();
/// path.where_param("id").unwrap().matches("[0-9]+").unwrap();
///
/// let mut context = EvaluationContext::new();
/// assert!(path.evaluate("/path/42/x", &mut context).unwrap());
/// assert!(!path.evaluate("/path/abc/x", &mut context).unwrap());
/// ```
#[derive(Debug)]
pub struct PatternBuilder {
    template: Arc<Template>,
    registry: ParameterRegistry,
    options: PatternOptions,
    snapshot: ArcSwapOption<ParameterizedPattern>,
    compile_lock: Mutex<()>,
}

impl PatternBuilder {
    pub fn new(template: &str) -> Result<Self> {
        Self::with_options(template, PatternOptions::default())
    }

    pub fn with_options(template: &str, options: PatternOptions) -> Result<Self> {
        Ok(Self::from_pattern(ParameterizedPattern::with_options(
            template, options,
        )?))
    }

    pub(crate) fn from_pattern(pattern: ParameterizedPattern) -> Self {
        Self {
            template: pattern.template_arc(),
            registry: pattern.registry_arc().as_ref().clone(),
            options: pattern.options().clone(),
            snapshot: ArcSwapOption::from_pointee(pattern),
            compile_lock: Mutex::new(()),
        }
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

    pub fn state(&self) -> BuilderState {
        if self.registry.revision() == 0 {
            return BuilderState::Unconstrained;
        }
        match self.current(self.registry.revision()) {
            Some(_) => BuilderState::Ready,
            None => BuilderState::Constraining,
        }
    }

    /// Starts configuring `name`.
    pub fn where_param(&mut self, name: &str) -> Result<ParameterConfig<'_>> {
        let index = self.registry.index_of(name)?;
        Ok(ParameterConfig {
            builder: self,
            index,
        })
    }

    /// Restricts what `name` may match.
    pub fn constrain(mut self, name: &str, pattern: &str) -> Result<Self> {
        let index = self.registry.index_of(name)?;
        self.apply_constraint(index, pattern)?;
        Ok(self)
    }

    pub fn bind(mut self, name: &str, binding: Arc<dyn Binding>) -> Result<Self> {
        self.registry.set_binding(name, binding)?;
        Ok(self)
    }

    pub fn constrain_and_bind(
        self,
        name: &str,
        pattern: &str,
        binding: Arc<dyn Binding>,
    ) -> Result<Self> {
        self.constrain(name, pattern)?.bind(name, binding)
    }

    /// The compiled pattern for the current configuration.
    pub fn matcher(&self) -> Result<Arc<ParameterizedPattern>> {
        let revision = self.registry.revision();
        if let Some(current) = self.current(revision) {
            return Ok(current);
        }

        let _guard = self
            .compile_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = self.current(revision) {
            return Ok(current);
        }

        let pattern = Arc::new(ParameterizedPattern::from_parts(
            self.template.clone(),
            Arc::new(self.registry.clone()),
            self.options.clone(),
        )?);
        self.snapshot.store(Some(pattern.clone()));
        Ok(pattern)
    }

    /// Renders the template; see [`ParameterizedPattern::render`].
    pub fn render<I, K, V>(&self, values: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.matcher()?.render(values)
    }

    /// Matches the value carried by `event` and queues conversion,
    /// validation and binding for every captured parameter that has them.
    ///
    /// Nothing is converted, validated or bound here; the queued operations
    /// run when the caller performs them. A non-matching input queues nothing.
    pub fn evaluate<E>(&self, event: &E, context: &mut EvaluationContext) -> Result<bool>
    where
        E: Event + ?Sized,
    {
        let pattern = self.matcher()?;
        let Some(value) = pattern.event_value(event, context)? else {
            return Ok(false);
        };
        let Some(captures) = pattern.parse(value) else {
            return Ok(false);
        };

        for (index, raw) in captures.indexed() {
            let Some(parameter) = pattern.parameters().get_index(index) else {
                continue;
            };
            if !parameter.has_collaborators() {
                continue;
            }
            debug!(parameter = parameter.name(), raw, "queueing operations");
            context.clear_converted(parameter.name());
            context.add_pre_operation(Operation::Convert {
                parameter: parameter.clone(),
                raw: raw.to_string(),
            });
            context.add_pre_operation(Operation::ValidateAndBind {
                parameter: parameter.clone(),
                raw: raw.to_string(),
            });
        }

        Ok(true)
    }

    // A constraint that compiles alone can still break the combined regex,
    // e.g. through a clashing group name; reject it before it is stored.
    fn apply_constraint(&mut self, index: usize, pattern: &str) -> Result<()> {
        let mut candidate = self.registry.clone();
        candidate.constrain_at(index, pattern)?;
        if candidate.revision() != self.registry.revision() {
            CompiledPattern::build(&self.template, &candidate, &self.options).map_err(|e| {
                match e {
                    PatternError::RegexBuild(source) => PatternError::InvalidConstraint {
                        name: candidate
                            .get_index(index)
                            .map_or_else(String::new, |p| p.name().to_string()),
                        source,
                    },
                    other => other,
                }
            })?;
        }
        self.registry = candidate;
        Ok(())
    }

    fn current(&self, revision: u64) -> Option<Arc<ParameterizedPattern>> {
        self.snapshot
            .load_full()
            .filter(|pattern| pattern.revision() == revision)
    }
}

/// Configuration of one parameter, obtained from
/// [`PatternBuilder::where_param`].
pub struct ParameterConfig<'a> {
    builder: &'a mut PatternBuilder,
    index: usize,
}

impl<'a> ParameterConfig<'a> {
    pub fn matches(self, pattern: &str) -> Result<Self> {
        self.builder.apply_constraint(self.index, pattern)?;
        Ok(self)
    }

    pub fn converted_by(self, converter: Arc<dyn Converter>) -> Self {
        self.builder
            .registry
            .update_at(self.index, |p| p.set_converter(converter));
        self
    }

    pub fn validated_by(self, validator: Arc<dyn Validator>) -> Self {
        self.builder
            .registry
            .update_at(self.index, |p| p.set_validator(validator));
        self
    }

    pub fn binds_to(self, binding: Arc<dyn Binding>) -> Self {
        self.builder
            .registry
            .update_at(self.index, |p| p.set_binding(binding));
        self
    }

    /// Continues with another parameter of the same builder.
    pub fn where_param(self, name: &str) -> Result<ParameterConfig<'a>> {
        self.builder.where_param(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::value::Value;
    use std::thread;

    struct Model(&'static str);

    impl Binding for Model {
        fn submit(&self, context: &mut EvaluationContext, value: Value) -> std::result::Result<(), OperationError> {
            context.put(self.0, value);
            Ok(())
        }

        fn retrieve(&self, context: &EvaluationContext) -> Option<Value> {
            context.get(self.0).cloned()
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut builder = PatternBuilder::new("/path/{id}/{other}").unwrap();
        assert_eq!(builder.state(), BuilderState::Unconstrained);

        builder.where_param("id").unwrap().matches("[0-9]+").unwrap();
        assert_eq!(builder.state(), BuilderState::Constraining);

        builder.matcher().unwrap();
        assert_eq!(builder.state(), BuilderState::Ready);

        builder.where_param("other").unwrap().matches("[a-z]+").unwrap();
        assert_eq!(builder.state(), BuilderState::Constraining);
    }

    #[test]
    fn test_constraint_applies_after_recompile() {
        let mut builder = PatternBuilder::new("/path/{id}").unwrap();
        let mut context = EvaluationContext::new();
        assert!(builder.evaluate("/path/abc", &mut context).unwrap());

        builder.where_param("id").unwrap().matches("[0-9]+").unwrap();
        assert!(!builder.evaluate("/path/abc", &mut context).unwrap());
        assert!(builder.evaluate("/path/123", &mut context).unwrap());
    }

    #[test]
    fn test_where_unknown_parameter() {
        let mut builder = PatternBuilder::new("/path/{id}").unwrap();
        assert!(matches!(
            builder.where_param("nope"),
            Err(PatternError::UnknownParameter { .. })
        ));
        assert!(matches!(
            PatternBuilder::new("/path/{id}").unwrap().constrain("nope", ".*"),
            Err(PatternError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_reused_context_binds_latest_capture() {
        let builder = PatternBuilder::new("/path/{id}")
            .unwrap()
            .bind("id", Arc::new(Model("person.id")))
            .unwrap();
        let mut context = EvaluationContext::new();

        assert!(builder.evaluate("/path/first", &mut context).unwrap());
        context.perform_pre_operations().unwrap();
        assert_eq!(context.get("person.id"), Some(&Value::from("first")));

        assert!(builder.evaluate("/path/second", &mut context).unwrap());
        assert_eq!(context.converted_value("id"), None);
        let operations = context.take_pre_operations();
        operations[1].perform(&mut context).unwrap();
        assert_eq!(context.converted_value("id"), Some(&Value::from("second")));
        assert_eq!(context.get("person.id"), Some(&Value::from("second")));
    }

    #[test]
    fn test_constraint_clashing_with_combined_regex() {
        let mut builder = PatternBuilder::new("/{a}/{b}").unwrap();
        let err = builder
            .where_param("a")
            .unwrap()
            .matches("(?P<__p1>x)")
            .err()
            .unwrap();
        assert!(matches!(err, PatternError::InvalidConstraint { ref name, .. } if name == "a"));
        assert!(builder.parameters().get("a").unwrap().constraint().is_none());
        assert_eq!(builder.state(), BuilderState::Unconstrained);

        let builder = PatternBuilder::new("/{a}/{b}")
            .unwrap()
            .constrain("a", "(?P<n>x)")
            .unwrap();
        assert!(matches!(
            builder.constrain("b", "(?P<n>y)"),
            Err(PatternError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_chain_across_parameters() {
        let mut builder = PatternBuilder::new("/path/{id}/{other}").unwrap();
        builder
            .where_param("id")
            .unwrap()
            .matches("[0-9]+")
            .unwrap()
            .binds_to(Arc::new(Model("person.id")))
            .where_param("other")
            .unwrap()
            .binds_to(Arc::new(Model("profile.id")));

        let mut context = EvaluationContext::new();
        assert!(builder.evaluate("/path/42/me", &mut context).unwrap());
        assert_eq!(context.pre_operations().len(), 4);
        assert_eq!(context.pre_operations()[0].parameter().name(), "id");
        assert_eq!(context.pre_operations()[2].parameter().name(), "other");

        context.perform_pre_operations().unwrap();
        assert_eq!(context.get("person.id"), Some(&Value::from("42")));
        assert_eq!(context.get("profile.id"), Some(&Value::from("me")));
    }

    #[test]
    fn test_where_is_idempotent() {
        let builder = PatternBuilder::new("/path/{id}")
            .unwrap()
            .constrain("id", "[0-9]+")
            .unwrap()
            .constrain("id", "[a-z]+")
            .unwrap();
        assert_eq!(builder.parameters().len(), 1);
        let matcher = builder.matcher().unwrap();
        assert!(matcher.matches("/path/abc"));
        assert!(!matcher.matches("/path/123"));
    }

    #[test]
    fn test_unbound_parameters_queue_nothing() {
        let builder = PatternBuilder::new("/application/{seg}").unwrap();
        let mut context = EvaluationContext::new();
        assert!(builder.evaluate("/application/path", &mut context).unwrap());
        assert!(context.pre_operations().is_empty());
    }

    #[test]
    fn test_no_match_queues_nothing() {
        let builder = PatternBuilder::new("/application/{seg}")
            .unwrap()
            .bind("seg", Arc::new(Model("seg")))
            .unwrap();
        let mut context = EvaluationContext::new();
        assert!(!builder.evaluate("/other/path", &mut context).unwrap());
        assert!(context.pre_operations().is_empty());
    }

    #[test]
    fn test_constrain_and_bind() {
        let builder = PatternBuilder::new("/path/{id}")
            .unwrap()
            .constrain_and_bind("id", "[0-9]+", Arc::new(Model("id")))
            .unwrap();
        let mut context = EvaluationContext::new();
        assert!(!builder.evaluate("/path/x", &mut context).unwrap());
        assert!(builder.evaluate("/path/7", &mut context).unwrap());
        context.perform_pre_operations().unwrap();
        assert_eq!(context.get("id"), Some(&Value::from("7")));
    }

    #[test]
    fn test_builder_from_pattern_keeps_configuration() {
        let matcher = PatternBuilder::new("/path/{id}")
            .unwrap()
            .constrain("id", "[0-9]+")
            .unwrap()
            .matcher()
            .unwrap();
        let builder = matcher.builder();
        assert_eq!(builder.template().source(), "/path/{id}");
        assert_eq!(
            builder.parameters().get("id").unwrap().constraint().unwrap().as_str(),
            "[0-9]+"
        );
        assert_eq!(builder.state(), BuilderState::Ready);
    }

    #[test]
    fn test_render_uses_constraints() {
        let builder = PatternBuilder::new("/path/{id}")
            .unwrap()
            .constrain("id", "[0-9]+")
            .unwrap();
        assert_eq!(builder.render([("id", "12")]).unwrap(), "/path/12");
        assert!(matches!(
            builder.render([("id", "ab")]),
            Err(PatternError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn test_concurrent_recompile_publishes_one_snapshot() {
        let mut builder = PatternBuilder::new("/path/{id}").unwrap();
        builder.where_param("id").unwrap().matches("[0-9]+").unwrap();
        let builder = &builder;

        let snapshots: Vec<Arc<ParameterizedPattern>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || builder.matcher().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for snapshot in &snapshots {
            assert!(Arc::ptr_eq(snapshot, &snapshots[0]));
            assert!(snapshot.matches("/path/1"));
        }
        assert_eq!(builder.state(), BuilderState::Ready);
    }
}
