//! Factory owning the shared validation state.
//!
//! A [`ValidatorFactory`] owns the type registry, the metadata cache, the group sequence cache
//! and the evaluator registry. Validators obtained from it share all of that state, so metadata
//! is built once per type no matter how many validators use it.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use beanval::{TypeRegistry, ValidatorFactory};
//! use beanval::engine::ValueKind;
//!
//! let factory = ValidatorFactory::builder()
//!     .types(Arc::new(TypeRegistry::new()))
//!     .fail_fast(true)
//!     .evaluator_fn("Even", Some(ValueKind::Int), |_, value, _| {
//!         Ok(value.as_f64().is_some_and(|n| n % 2.0 == 0.0))
//!     })
//!     .build();
//!
//! let validator = factory.validator()?;
//! assert!(validator.config().fail_fast);
//!
//! factory.close();
//! assert!(factory.validator().is_err());
//! # Ok::<(), beanval::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;

use crate::{
    engine::{
        config::ExecutableTypes,
        evaluator::{ConstraintEvaluator, EvaluationContext, EvaluatorRegistry},
        validator::Validator,
        Value, ValueKind, ValidatorConfig,
    },
    groups::ValidationOrderGenerator,
    metadata::{
        bean::BeanMetadata,
        constraint::ConstraintDeclaration,
        manager::BeanMetadataManager,
        typesystem::{TypeName, TypeRegistry},
    },
    BoxError, Error, Result,
};

/// State shared by a factory and its validators.
pub(crate) struct FactoryState {
    pub(crate) types: Arc<TypeRegistry>,
    pub(crate) evaluators: EvaluatorRegistry,
    pub(crate) config: ValidatorConfig,
    pub(crate) manager: BeanMetadataManager,
    pub(crate) generator: Arc<ValidationOrderGenerator>,
}

/// Creates [`Validator`]s sharing one metadata cache.
pub struct ValidatorFactory {
    state: Arc<FactoryState>,
    closed: AtomicBool,
}

impl ValidatorFactory {
    /// Creates a factory over `types` with the built-in evaluators.
    #[must_use]
    pub fn new(types: Arc<TypeRegistry>, config: ValidatorConfig) -> Self {
        Self::with_evaluators(types, config, EvaluatorRegistry::with_builtins())
    }

    /// Starts a [`ValidatorFactoryBuilder`].
    #[must_use]
    pub fn builder() -> ValidatorFactoryBuilder {
        ValidatorFactoryBuilder::default()
    }

    fn with_evaluators(
        types: Arc<TypeRegistry>,
        config: ValidatorConfig,
        evaluators: EvaluatorRegistry,
    ) -> Self {
        let generator = Arc::new(ValidationOrderGenerator::new(types.clone()));
        let manager =
            BeanMetadataManager::new(types.clone(), generator.clone(), &config.method_validation);

        ValidatorFactory {
            state: Arc::new(FactoryState {
                types,
                evaluators,
                config,
                manager,
                generator,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns a validator sharing the state of this factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FactoryClosed`] after [`ValidatorFactory::close`].
    pub fn validator(&self) -> Result<Validator> {
        if self.is_closed() {
            return Err(Error::FactoryClosed);
        }
        Ok(Validator::new(self.state.clone()))
    }

    /// Closes the factory and drops all cached metadata.
    ///
    /// Validators obtained earlier keep working and rebuild metadata on demand.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.manager.clear();
        self.state.generator.clear();
        tracing::debug!("validator factory closed");
    }

    /// Returns `true` once [`ValidatorFactory::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Builds the metadata of every registered class in parallel.
    ///
    /// Returns the number of types processed. Configuration errors surface here instead of at
    /// the first validation call.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found, or [`Error::FactoryClosed`].
    pub fn warm_up(&self) -> Result<usize> {
        if self.is_closed() {
            return Err(Error::FactoryClosed);
        }

        let names: Vec<TypeName> = self
            .state
            .types
            .names()
            .into_iter()
            .filter(|name| {
                self.state
                    .types
                    .get(name)
                    .is_some_and(|descriptor| !descriptor.is_interface())
            })
            .collect();

        let built = names
            .par_iter()
            .map(|name| self.state.manager.bean_metadata(name).map(|_| ()))
            .collect::<Result<Vec<()>>>()?;

        tracing::debug!(types = built.len(), "bean metadata warmed up");
        Ok(built.len())
    }

    /// The aggregated metadata of `bean_type`.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that prevents building the metadata.
    pub fn bean_metadata(&self, bean_type: &TypeName) -> Result<Arc<BeanMetadata>> {
        self.state.manager.bean_metadata(bean_type)
    }

    /// Registers an evaluator, replacing any previous one for the same key.
    pub fn register_evaluator<E>(&self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: E)
    where
        E: ConstraintEvaluator + 'static,
    {
        self.state.evaluators.register(kind, value_kind, evaluator);
    }

    /// Registers a closure as evaluator.
    pub fn register_evaluator_fn<F>(&self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: F)
    where
        F: Fn(&ConstraintDeclaration, &Value, &EvaluationContext<'_>) -> std::result::Result<bool, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.state.evaluators.register_fn(kind, value_kind, evaluator);
    }

    /// The configuration handed to validators.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.state.config
    }

    /// The type registry validated against.
    #[must_use]
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.state.types
    }
}

/// Builder for [`ValidatorFactory`].
#[derive(Default)]
pub struct ValidatorFactoryBuilder {
    types: Option<Arc<TypeRegistry>>,
    config: ValidatorConfig,
    evaluators: Option<EvaluatorRegistry>,
}

impl ValidatorFactoryBuilder {
    /// Sets the type registry; an empty one is used otherwise.
    #[must_use]
    pub fn types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.types = Some(types);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets [`ValidatorConfig::fail_fast`].
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Sets [`ValidatorConfig::executable_types`].
    #[must_use]
    pub fn executable_types(mut self, types: ExecutableTypes) -> Self {
        self.config.executable_types = types;
        self
    }

    /// Adds an evaluator.
    #[must_use]
    pub fn evaluator<E>(mut self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: E) -> Self
    where
        E: ConstraintEvaluator + 'static,
    {
        self.registry().register(kind, value_kind, evaluator);
        self
    }

    /// Adds a closure as evaluator.
    #[must_use]
    pub fn evaluator_fn<F>(mut self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: F) -> Self
    where
        F: Fn(&ConstraintDeclaration, &Value, &EvaluationContext<'_>) -> std::result::Result<bool, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.registry().register_fn(kind, value_kind, evaluator);
        self
    }

    /// Creates the factory.
    #[must_use]
    pub fn build(self) -> ValidatorFactory {
        ValidatorFactory::with_evaluators(
            self.types.unwrap_or_default(),
            self.config,
            self.evaluators.unwrap_or_default(),
        )
    }

    fn registry(&mut self) -> &EvaluatorRegistry {
        self.evaluators.get_or_insert_with(EvaluatorRegistry::with_builtins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{element::ElementMetadata, typesystem::TypeBuilder};

    fn types() -> Arc<TypeRegistry> {
        let types = Arc::new(TypeRegistry::new());
        types
            .define(TypeBuilder::class("Car").field(
                "plate",
                ElementMetadata::new().constraint(ConstraintDeclaration::new("NotNull")),
            ))
            .unwrap();
        types.define(TypeBuilder::class("Truck").extends("Car")).unwrap();
        types.define(TypeBuilder::interface("Vehicle")).unwrap();
        types.define(TypeBuilder::group("Strict")).unwrap();
        types
    }

    #[test]
    fn test_close() {
        let factory = ValidatorFactory::new(types(), ValidatorConfig::default());
        let validator = factory.validator().unwrap();
        factory.bean_metadata(&TypeName::new("Car")).unwrap();
        assert!(!factory.state.manager.is_empty());

        factory.close();
        factory.close();
        assert!(factory.is_closed());
        assert!(factory.state.manager.is_empty());
        assert!(matches!(factory.validator(), Err(Error::FactoryClosed)));
        assert!(matches!(factory.warm_up(), Err(Error::FactoryClosed)));
        assert!(validator.bean_metadata(&TypeName::new("Car")).is_ok());
    }

    #[test]
    fn test_warm_up() {
        let factory = ValidatorFactory::new(types(), ValidatorConfig::default());
        assert_eq!(factory.warm_up().unwrap(), 2);
        assert!(factory.state.manager.cached(&TypeName::new("Car")).is_some());
        assert!(factory.state.manager.cached(&TypeName::new("Vehicle")).is_none());
    }

    #[test]
    fn test_builder() {
        let factory = ValidatorFactory::builder()
            .types(types())
            .executable_types(ExecutableTypes::ALL)
            .evaluator_fn("Plate", Some(ValueKind::Str), |_, _, _| Ok(true))
            .build();

        assert_eq!(factory.config().executable_types, ExecutableTypes::ALL);
        assert!(factory.state.evaluators.contains("Plate", Some(ValueKind::Str)));
        assert!(factory.state.evaluators.contains("NotNull", Some(ValueKind::Null)));
        assert_eq!(factory.types().len(), 5);
    }
}
