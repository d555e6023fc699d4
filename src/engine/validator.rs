//! The validation engine.
//!
//! # Architecture
//!
//! Every operation of [`Validator`] builds a [`ValidationOrder`] from the requested groups and
//! walks it against a bean, a property, or the parameters or return value of an executable:
//!
//! 1. Single groups are validated one after the other. For each group the constraints of the
//!    bean are evaluated first; cascaded properties are visited once all single groups are
//!    done.
//! 2. Sequences are validated position by position. Constraints and cascades of a position run
//!    together, and the sequence stops after the first position that added violations.
//!
//! The `Default` group is special: it walks the type hierarchy of the bean and validates, per
//! type, the constraints that type declares itself. A type that redefines its default group
//! sequence validates all of its constraints along that sequence instead and ends the walk,
//! since it covers the whole hierarchy. Interface constraints reachable through several types of
//! the hierarchy are validated once.
//!
//! Cascading applies the group conversion of the cascaded element and skips beans that have
//! already been validated for the same group on a related path, which terminates cycles.
//!
//! # Thread Safety
//!
//! [`Validator`] is [`Send`] and [`Sync`] and cheap to clone. All state of a validation call
//! lives in a per-call context, so validators can be used from many threads at once.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{
    engine::{
        builtin::default_message,
        context::{BeanContext, ValidationContext},
        evaluator::{EvaluationContext, EvaluatorRegistry},
        factory::FactoryState,
        interpolate,
        path::{PathPosition, PropertyPath},
        violation::ConstraintViolation,
        BeanRef, Value, ValidatorConfig,
    },
    groups::ValidationOrder,
    metadata::{
        bean::BeanMetadata,
        constraint::ConstraintDeclaration,
        element::{ContainerElementKind, ElementMetadata},
        executable::ExecutableMetadata,
        metaconstraint::{ConstraintLocation, MetaConstraint},
        typesystem::{ExecutableSignature, TypeName},
    },
    Error, Result,
};

/// Validates beans, properties, values and executables.
///
/// Obtained from [`crate::ValidatorFactory::validator`]. Passing an empty group list to any
/// operation validates the `Default` group.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use beanval::{DynamicBean, TypeName, TypeRegistry, ValidatorFactory};
/// use beanval::engine::ValidatorConfig;
/// use beanval::metadata::{
///     constraint::ConstraintDeclaration, element::ElementMetadata, typesystem::TypeBuilder,
/// };
///
/// let types = Arc::new(TypeRegistry::new());
/// types.define(TypeBuilder::class("Car").field(
///     "seats",
///     ElementMetadata::new().constraint(ConstraintDeclaration::new("Min").attribute("value", 2)),
/// ))?;
///
/// let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;
/// let car = DynamicBean::new("Car").with("seats", 1).handle();
///
/// let violations = validator.validate(&car, &[])?;
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].property_path().to_string(), "seats");
/// assert_eq!(violations[0].message(), "must be greater than or equal to 2");
/// # Ok::<(), beanval::Error>(())
/// ```
#[derive(Clone)]
pub struct Validator {
    state: Arc<FactoryState>,
}

impl Validator {
    pub(crate) fn new(state: Arc<FactoryState>) -> Self {
        Validator { state }
    }

    /// The configuration of the owning factory.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.state.config
    }

    /// The aggregated metadata of `bean_type`.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that prevents building the metadata.
    pub fn bean_metadata(&self, bean_type: &TypeName) -> Result<Arc<BeanMetadata>> {
        self.state.manager.bean_metadata(bean_type)
    }

    /// Validates `bean` and, through cascaded properties, the object graph it references.
    ///
    /// # Errors
    ///
    /// Configuration errors of the involved types and groups, and evaluator failures.
    pub fn validate(&self, bean: &BeanRef, groups: &[TypeName]) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(bean.bean_type())?;
        let order = self.validation_order(groups)?;

        let mut context =
            ValidationContext::new(Some(bean.clone()), bean.bean_type().clone(), &self.state.config);
        let root = BeanContext::new(Some(bean.clone()), metadata, PropertyPath::root());
        self.validate_in_context(&mut context, &root, &order)?;

        Ok(finish(context, "validate", groups))
    }

    /// Validates the constraints of one property of `bean`, without cascading.
    ///
    /// `property_path` may navigate through cascaded beans, e.g. `addresses[0].city`. A `null`
    /// value along the path yields no violations.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPropertyPath`] if the path cannot be parsed or does not end at a property
    /// - [`Error::UnknownProperty`] if a path element names a property the bean does not have
    pub fn validate_property(
        &self,
        bean: &BeanRef,
        property_path: &str,
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let path = PropertyPath::parse(property_path)?;
        let nodes = path.nodes();
        let Some((leaf, steps)) = nodes.split_last() else {
            return Err(invalid_path(property_path, "path is empty"));
        };
        let Some(property) = leaf.name() else {
            return Err(invalid_path(property_path, "path must end with a property name"));
        };

        let mut current = bean.clone();
        let mut current_path = PropertyPath::root();
        for (index, node) in steps.iter().enumerate() {
            let Some(name) = node.name() else {
                return Err(invalid_path(property_path, "unnamed path element"));
            };
            let metadata = self.bean_metadata(current.bean_type())?;
            if !metadata.has_property(name) {
                return Err(Error::UnknownProperty {
                    bean: current.bean_type().clone(),
                    property: name.to_string(),
                });
            }

            let mut value = current.property(name).unwrap_or_default();
            current_path = current_path.property(name);
            if let Some(position) = nodes[index + 1].position() {
                value = select(&value, position);
                current_path = current_path.element(Some(position.clone()));
            }

            match value.unwrapped() {
                Value::Bean(next) => current = next.clone(),
                _ => return Ok(Vec::new()),
            }
        }

        let metadata = self.bean_metadata(current.bean_type())?;
        if !metadata.has_property(property) {
            return Err(Error::UnknownProperty {
                bean: current.bean_type().clone(),
                property: property.to_string(),
            });
        }
        let order = self.validation_order(groups)?;

        let mut context =
            ValidationContext::new(Some(bean.clone()), bean.bean_type().clone(), &self.state.config);
        context.retain(&current);
        let target = BeanContext::new(Some(current), metadata, current_path)
            .restricted_to(property, None);
        self.validate_in_context(&mut context, &target, &order)?;

        Ok(finish(context, "validate_property", groups))
    }

    /// Validates `value` as if it were the value of `property` of a `bean_type` instance.
    ///
    /// Default group sequence providers of `bean_type` are called without an instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProperty`] if `bean_type` has no such property.
    pub fn validate_value(
        &self,
        bean_type: &TypeName,
        property: &str,
        value: &Value,
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(bean_type)?;
        if !metadata.has_property(property) {
            return Err(Error::UnknownProperty {
                bean: bean_type.clone(),
                property: property.to_string(),
            });
        }
        let order = self.validation_order(groups)?;

        let mut context = ValidationContext::new(None, bean_type.clone(), &self.state.config);
        let target = BeanContext::new(None, metadata, PropertyPath::root())
            .restricted_to(property, Some(value.clone()));
        self.validate_in_context(&mut context, &target, &order)?;

        Ok(finish(context, "validate_value", groups))
    }

    /// Validates the arguments of a method call on `object`.
    ///
    /// Methods without metadata and methods excluded by
    /// [`ValidatorConfig::executable_types`] yield no violations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterCountMismatch`] if `values` does not match the signature.
    pub fn validate_parameters(
        &self,
        object: &BeanRef,
        signature: &ExecutableSignature,
        values: &[Value],
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(object.bean_type())?;
        let Some(executable) = metadata.method(signature).cloned() else {
            return Ok(Vec::new());
        };

        let context =
            ValidationContext::new(Some(object.clone()), object.bean_type().clone(), &self.state.config)
                .with_parameters(values);
        let bean = BeanContext::new(Some(object.clone()), metadata, PropertyPath::root());
        self.parameters_in_context(context, &bean, &executable, values, groups)
    }

    /// Validates the value returned by a method call on `object`.
    ///
    /// # Errors
    ///
    /// Configuration errors of the involved types and groups, and evaluator failures.
    pub fn validate_return_value(
        &self,
        object: &BeanRef,
        signature: &ExecutableSignature,
        value: &Value,
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(object.bean_type())?;
        let Some(executable) = metadata.method(signature).cloned() else {
            return Ok(Vec::new());
        };

        let context =
            ValidationContext::new(Some(object.clone()), object.bean_type().clone(), &self.state.config)
                .with_return_value(value);
        let bean = BeanContext::new(Some(object.clone()), metadata, PropertyPath::root());
        self.return_value_in_context(context, &bean, &executable, value, groups)
    }

    /// Validates the arguments of a constructor call of `bean_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterCountMismatch`] if `values` does not match the signature.
    pub fn validate_constructor_parameters(
        &self,
        bean_type: &TypeName,
        signature: &ExecutableSignature,
        values: &[Value],
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(bean_type)?;
        let Some(constructor) = metadata.constructor(signature).cloned() else {
            return Ok(Vec::new());
        };

        let context = ValidationContext::new(None, bean_type.clone(), &self.state.config)
            .with_parameters(values);
        let bean = BeanContext::new(None, metadata, PropertyPath::root());
        self.parameters_in_context(context, &bean, &constructor, values, groups)
    }

    /// Validates the instance `created` by a constructor of `bean_type`.
    ///
    /// # Errors
    ///
    /// Configuration errors of the involved types and groups, and evaluator failures.
    pub fn validate_constructor_return_value(
        &self,
        bean_type: &TypeName,
        signature: &ExecutableSignature,
        created: &BeanRef,
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        let metadata = self.bean_metadata(bean_type)?;
        let Some(constructor) = metadata.constructor(signature).cloned() else {
            return Ok(Vec::new());
        };

        let value = Value::Bean(created.clone());
        let context =
            ValidationContext::new(Some(created.clone()), bean_type.clone(), &self.state.config)
                .with_return_value(&value);
        let bean = BeanContext::new(Some(created.clone()), metadata, PropertyPath::root());
        self.return_value_in_context(context, &bean, &constructor, &value, groups)
    }

    fn validation_order(&self, groups: &[TypeName]) -> Result<ValidationOrder> {
        if groups.is_empty() {
            self.state
                .generator
                .validation_order(&[TypeName::default_group()])
        } else {
            self.state.generator.validation_order(groups)
        }
    }

    fn validate_in_context(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        order: &ValidationOrder,
    ) -> Result<()> {
        if bean.metadata.is_default_group_sequence_redefined() {
            let default =
                context.default_order(bean.bean.as_ref(), &bean.metadata, &self.state.generator)?;
            order.assert_default_group_sequence_is_expandable(&default.sequence)?;
        }

        walk_order(
            context,
            order,
            |context, group| self.validate_constraints_for_group(context, bean, group),
            |context, group| {
                if bean.only.is_some() {
                    return Ok(());
                }
                self.validate_cascades(context, bean, group)
            },
        )
    }

    fn validate_constraints_for_group(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        group: &TypeName,
    ) -> Result<()> {
        if group.is_default_group() {
            return self.validate_default_group(context, bean);
        }

        for constraint in bean.metadata.meta_constraints() {
            self.validate_meta_constraint(context, bean, constraint, group)?;
            if context.should_fail_fast() {
                return Ok(());
            }
        }
        context.mark_processed(bean, group);
        Ok(())
    }

    fn validate_default_group(&self, context: &mut ValidationContext, bean: &BeanContext) -> Result<()> {
        let mut interfaces = ValidatedInterfaces::default();

        for hosting_type in bean.metadata.hierarchy() {
            let hosting = self.bean_metadata(hosting_type)?;
            let redefined = hosting.is_default_group_sequence_redefined();

            if redefined {
                let default =
                    context.default_order(bean.bean.as_ref(), &hosting, &self.state.generator)?;
                for sequence in default.order.sequences() {
                    for position in sequence.iter() {
                        let mut successful = true;
                        for member in position.iter() {
                            successful &= self.validate_default_group_element(
                                context,
                                bean,
                                &mut interfaces,
                                (hosting_type, hosting.meta_constraints()),
                                member.name(),
                            )?;
                            if context.should_fail_fast() {
                                return Ok(());
                            }
                            // a cascade reaching this bean in a member group it already ran
                            // is skipped, even though that group was not requested
                            context.mark_processed(bean, member.name());
                        }
                        if !successful {
                            break;
                        }
                    }
                }
            } else {
                self.validate_default_group_element(
                    context,
                    bean,
                    &mut interfaces,
                    (hosting_type, hosting.direct_meta_constraints()),
                    &TypeName::default_group(),
                )?;
                if context.should_fail_fast() {
                    return Ok(());
                }
            }

            context.mark_processed(bean, &TypeName::default_group());
            // the redefined sequence covered every constraint of the hierarchy
            if redefined {
                break;
            }
        }

        Ok(())
    }

    fn validate_default_group_element(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        interfaces: &mut ValidatedInterfaces,
        (hosting_type, constraints): (&TypeName, &[Arc<MetaConstraint>]),
        group: &TypeName,
    ) -> Result<bool> {
        let mut successful = true;
        for constraint in constraints {
            if !interfaces.admit(constraint, hosting_type) {
                continue;
            }
            let valid = self.validate_meta_constraint(context, bean, constraint, group)?;
            if context.should_fail_fast() {
                return Ok(false);
            }
            successful &= valid;
        }
        Ok(successful)
    }

    fn validate_meta_constraint(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        constraint: &Arc<MetaConstraint>,
        group: &TypeName,
    ) -> Result<bool> {
        if let Some(only) = &bean.only {
            if !matches!(constraint.location(), ConstraintLocation::Property(name) if name == only) {
                return Ok(true);
            }
        }

        let (value, path) = match constraint.location() {
            ConstraintLocation::Bean => (bean.as_value(), bean.path.clone()),
            ConstraintLocation::Property(name) => (bean.property(name), bean.path.property(name)),
            _ => return Ok(true),
        };
        self.validate_constraint(context, bean, constraint, group, &value, &path)
    }

    /// Evaluates `constraint` against `value`, per element for container element constraints.
    fn validate_constraint(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        constraint: &Arc<MetaConstraint>,
        group: &TypeName,
        value: &Value,
        path: &PropertyPath,
    ) -> Result<bool> {
        if !constraint.is_applicable(group) {
            return Ok(true);
        }
        let tracked = constraint.groups().len() > 1;
        if tracked && context.is_constraint_processed(bean, path, constraint) {
            return Ok(true);
        }

        let valid = match constraint.container() {
            None => self.evaluate(context, bean, constraint.declaration(), value, path)?,
            Some(kind) => {
                let mut valid = true;
                for (position, element) in container_values(kind, value) {
                    let element_path = path.element(position).property(&kind.to_string());
                    valid &=
                        self.evaluate(context, bean, constraint.declaration(), &element, &element_path)?;
                    if context.should_fail_fast() {
                        break;
                    }
                }
                valid
            }
        };

        if tracked {
            context.mark_constraint_processed(bean, path, constraint);
        }
        Ok(valid)
    }

    /// Reports a violation per failing declaration; returns `true` if nothing failed.
    fn evaluate(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        declaration: &Arc<ConstraintDeclaration>,
        value: &Value,
        path: &PropertyPath,
    ) -> Result<bool> {
        let root_bean_type = context.root_bean_type().clone();
        let leaf = bean.bean.as_ref();
        let evaluation = EvaluationContext::new(&root_bean_type, path, leaf);
        let failing = self.failing_declarations(declaration, value, &evaluation)?;

        for failed in &failing {
            let template = failed
                .message_template()
                .map_or_else(|| default_message(failed.kind()), str::to_string);
            let message = interpolate(&template, failed, value);
            context.report(failed, template, message, path, value, leaf);
        }
        Ok(failing.is_empty())
    }

    fn failing_declarations(
        &self,
        declaration: &Arc<ConstraintDeclaration>,
        value: &Value,
        evaluation: &EvaluationContext<'_>,
    ) -> Result<Vec<Arc<ConstraintDeclaration>>> {
        let effective = EvaluatorRegistry::effective_value(value);
        let mut failing = Vec::new();

        match self.state.evaluators.lookup(declaration.kind(), value) {
            Some(evaluator) => {
                let valid = evaluator
                    .is_valid(declaration, effective, evaluation)
                    .map_err(|source| Error::ConstraintEvaluation {
                        constraint: declaration.kind().to_string(),
                        path: evaluation.path().to_string(),
                        value: value.to_string(),
                        source,
                    })?;
                if !valid {
                    failing.push(declaration.clone());
                }
            }
            None if declaration.composing().is_empty() => {
                return Err(Error::NoEvaluator {
                    kind: declaration.kind().to_string(),
                    value_kind: effective.kind().to_string(),
                });
            }
            None => {}
        }

        for composing in declaration.composing() {
            let nested = self.failing_declarations(composing, value, evaluation)?;
            if nested.is_empty() {
                continue;
            }
            if declaration.is_report_as_single() {
                failing = vec![declaration.clone()];
                break;
            }
            failing.extend(nested);
        }

        Ok(failing)
    }

    fn validate_cascades(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        group: &TypeName,
    ) -> Result<()> {
        for name in bean.metadata.cascaded_properties() {
            let Some(property) = bean.metadata.property(name) else {
                continue;
            };
            let value = bean.property(name);
            self.cascade_element(context, &property.element, &value, &bean.path.property(name), group)?;
            if context.should_fail_fast() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn cascade_element(
        &self,
        context: &mut ValidationContext,
        element: &ElementMetadata,
        value: &Value,
        path: &PropertyPath,
        group: &TypeName,
    ) -> Result<()> {
        if element.is_cascading() {
            let converted = element.converted_group(group);
            self.cascade_value(context, value, path, group, &converted)?;
        }

        for container in element.container_elements().iter().filter(|c| c.cascading) {
            let converted = container.converted_group(group);
            for (position, item) in container_values(container.kind, value) {
                if let Some(target) = item.unwrapped().as_bean() {
                    self.cascade_bean(context, target, &path.element(position), group, &converted)?;
                }
            }
        }
        Ok(())
    }

    fn cascade_value(
        &self,
        context: &mut ValidationContext,
        value: &Value,
        path: &PropertyPath,
        original: &TypeName,
        converted: &TypeName,
    ) -> Result<()> {
        match value {
            Value::Bean(target) => self.cascade_bean(context, target, path, original, converted),
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Some(target) = item.unwrapped().as_bean() {
                        let item_path = path.element(Some(PathPosition::Index(index)));
                        self.cascade_bean(context, target, &item_path, original, converted)?;
                    }
                }
                Ok(())
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    if let Some(target) = item.unwrapped().as_bean() {
                        let item_path = path.element(Some(PathPosition::Key(key.clone())));
                        self.cascade_bean(context, target, &item_path, original, converted)?;
                    }
                }
                Ok(())
            }
            Value::Optional(Some(inner)) => {
                self.cascade_value(context, inner, path, original, converted)
            }
            _ => Ok(()),
        }
    }

    fn cascade_bean(
        &self,
        context: &mut ValidationContext,
        target: &BeanRef,
        path: &PropertyPath,
        original: &TypeName,
        converted: &TypeName,
    ) -> Result<()> {
        if context.should_fail_fast() || context.is_bean_already_validated(target, converted, path) {
            return Ok(());
        }

        let metadata = self.bean_metadata(target.bean_type())?;
        let order = self
            .state
            .generator
            .validation_order_for(converted, converted != original)?;
        if !context.enter_cascade(target) {
            return Ok(());
        }
        context.retain(target);

        let cascaded = BeanContext::new(Some(target.clone()), metadata, path.clone());
        let result = self.validate_in_context(context, &cascaded, &order);
        context.leave_cascade();
        result
    }

    fn parameters_in_context(
        &self,
        mut context: ValidationContext,
        bean: &BeanContext,
        executable: &ExecutableMetadata,
        values: &[Value],
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        if values.len() != executable.parameters().len() {
            return Err(Error::ParameterCountMismatch {
                executable: executable.signature().to_string(),
                expected: executable.parameters().len(),
                actual: values.len(),
            });
        }
        if !executable.is_validatable(self.state.config.executable_types) {
            return Ok(Vec::new());
        }

        let order = self.validation_order(groups)?;
        let path = PropertyPath::executable(executable.name());
        walk_order(
            &mut context,
            &order,
            |context, group| {
                if !group.is_default_group() {
                    return self.validate_parameters_for_group(context, bean, executable, values, &path, group);
                }
                let default =
                    context.default_order(bean.bean.as_ref(), &bean.metadata, &self.state.generator)?;
                walk_default_order(context, &default.order, |context, member| {
                    self.validate_parameters_for_group(context, bean, executable, values, &path, member)
                })
            },
            |context, group| {
                for (parameter, value) in executable.parameters().iter().zip(values) {
                    if !parameter.element.has_cascades() {
                        continue;
                    }
                    let parameter_path = path.parameter(&parameter.name);
                    self.cascade_element(context, &parameter.element, value, &parameter_path, group)?;
                    if context.should_fail_fast() {
                        break;
                    }
                }
                Ok(())
            },
        )?;

        Ok(finish(context, "validate_parameters", groups))
    }

    /// Parameter constraints of one group; cross-parameter constraints only run when every
    /// parameter passed.
    fn validate_parameters_for_group(
        &self,
        context: &mut ValidationContext,
        bean: &BeanContext,
        executable: &ExecutableMetadata,
        values: &[Value],
        path: &PropertyPath,
        group: &TypeName,
    ) -> Result<()> {
        let before = context.violation_count();
        for (parameter, value) in executable.parameters().iter().zip(values) {
            let parameter_path = path.parameter(&parameter.name);
            for constraint in &parameter.constraints {
                self.validate_constraint(context, bean, constraint, group, value, &parameter_path)?;
                if context.should_fail_fast() {
                    return Ok(());
                }
            }
        }
        if context.violation_count() > before {
            return Ok(());
        }

        let parameters = Value::List(values.to_vec());
        let cross_parameter_path = path.cross_parameter();
        for constraint in executable.cross_parameter_constraints() {
            self.validate_constraint(context, bean, constraint, group, &parameters, &cross_parameter_path)?;
            if context.should_fail_fast() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn return_value_in_context(
        &self,
        mut context: ValidationContext,
        bean: &BeanContext,
        executable: &ExecutableMetadata,
        value: &Value,
        groups: &[TypeName],
    ) -> Result<Vec<ConstraintViolation>> {
        if !executable.is_validatable(self.state.config.executable_types) {
            return Ok(Vec::new());
        }

        let order = self.validation_order(groups)?;
        let path = PropertyPath::executable(executable.name()).return_value();
        let validate_group = |context: &mut ValidationContext, group: &TypeName| -> Result<()> {
            for constraint in executable.return_value_constraints() {
                self.validate_constraint(context, bean, constraint, group, value, &path)?;
                if context.should_fail_fast() {
                    break;
                }
            }
            Ok(())
        };

        walk_order(
            &mut context,
            &order,
            |context, group| {
                if !group.is_default_group() {
                    return validate_group(context, group);
                }
                let default =
                    context.default_order(bean.bean.as_ref(), &bean.metadata, &self.state.generator)?;
                walk_default_order(context, &default.order, &validate_group)
            },
            |context, group| self.cascade_element(context, executable.return_value(), value, &path, group),
        )?;

        Ok(finish(context, "validate_return_value", groups))
    }
}

/// Remembers which type an interface constraint was validated for during one default walk.
#[derive(Default)]
struct ValidatedInterfaces {
    validated_for: FxHashMap<TypeName, TypeName>,
}

impl ValidatedInterfaces {
    /// Returns `false` for interface constraints already validated through another type.
    fn admit(&mut self, constraint: &MetaConstraint, hosting_type: &TypeName) -> bool {
        if !constraint.is_declared_on_interface() {
            return true;
        }
        match self.validated_for.get(constraint.declaring_type()) {
            Some(validated_for) if validated_for != hosting_type => false,
            Some(_) => true,
            None => {
                self.validated_for
                    .insert(constraint.declaring_type().clone(), hosting_type.clone());
                true
            }
        }
    }
}

/// Runs single groups (constraints, then cascades) followed by sequences, stopping a sequence
/// at the first position that added violations.
fn walk_order(
    context: &mut ValidationContext,
    order: &ValidationOrder,
    mut constraints: impl FnMut(&mut ValidationContext, &TypeName) -> Result<()>,
    mut cascades: impl FnMut(&mut ValidationContext, &TypeName) -> Result<()>,
) -> Result<()> {
    for group in order.groups() {
        constraints(context, group.name())?;
        if context.should_fail_fast() {
            return Ok(());
        }
    }

    for group in order.groups() {
        cascades(context, group.name())?;
        if context.should_fail_fast() {
            return Ok(());
        }
    }

    for sequence in order.sequences() {
        for position in sequence.iter() {
            let before = context.violation_count();
            for group in position.iter() {
                constraints(context, group.name())?;
                if context.should_fail_fast() {
                    return Ok(());
                }
                cascades(context, group.name())?;
                if context.should_fail_fast() {
                    return Ok(());
                }
            }
            if context.violation_count() > before {
                break;
            }
        }
    }

    Ok(())
}

/// Runs the members of a default group sequence, without cascading.
fn walk_default_order(
    context: &mut ValidationContext,
    order: &ValidationOrder,
    mut validate: impl FnMut(&mut ValidationContext, &TypeName) -> Result<()>,
) -> Result<()> {
    walk_order(context, order, &mut validate, |_, _| Ok(()))
}

/// Elements of `value` addressed by a container element constraint of `kind`.
fn container_values(kind: ContainerElementKind, value: &Value) -> Vec<(Option<PathPosition>, Value)> {
    match (kind, value) {
        (ContainerElementKind::ListElement, Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (Some(PathPosition::Index(index)), item.clone()))
            .collect(),
        (ContainerElementKind::MapKey, Value::Map(entries)) => entries
            .keys()
            .map(|key| (Some(PathPosition::Key(key.clone())), Value::Str(key.clone())))
            .collect(),
        (ContainerElementKind::MapValue, Value::Map(entries)) => entries
            .iter()
            .map(|(key, item)| (Some(PathPosition::Key(key.clone())), item.clone()))
            .collect(),
        (ContainerElementKind::OptionalValue, Value::Optional(inner)) => {
            vec![(None, inner.as_deref().cloned().unwrap_or_default())]
        }
        _ => Vec::new(),
    }
}

/// The element of `value` at `position`; null if there is none.
fn select(value: &Value, position: &PathPosition) -> Value {
    match (value.unwrapped(), position) {
        (Value::List(items), PathPosition::Index(index)) => {
            items.get(*index).cloned().unwrap_or_default()
        }
        (Value::Map(entries), PathPosition::Key(key)) => entries.get(key).cloned().unwrap_or_default(),
        (Value::Map(entries), PathPosition::Index(index)) => {
            entries.get(&index.to_string()).cloned().unwrap_or_default()
        }
        _ => Value::Null,
    }
}

fn invalid_path(path: &str, message: &str) -> Error {
    Error::InvalidPropertyPath {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn finish(context: ValidationContext, operation: &str, groups: &[TypeName]) -> Vec<ConstraintViolation> {
    let root_bean_type = context.root_bean_type().clone();
    let violations = context.into_violations();
    tracing::debug!(
        operation,
        root = %root_bean_type,
        groups = ?groups,
        violations = violations.len(),
        "validation finished"
    );
    violations
}
