//! Method configuration rules enforced while aggregating bean metadata.
//!
//! When a method is declared by several types of one hierarchy, the declarations have to agree
//! on how the method is constrained. Every pair of declarations sharing an
//! [`crate::metadata::typesystem::ExecutableSignature`] is checked against a fixed set of rules;
//! the first rule that fails aborts the metadata build with a configuration error.
//!
//! # Architecture
//!
//! Each rule implements [`MethodConfigurationRule`] and decides on an ordered pair
//! `(method, other)`. Pairs are checked in both directions and include the pair of a declaration
//! with itself, which lets single-declaration rules such as
//! [`VoidMethodsMustNotBeReturnValueConstrained`] share the same entry point.
//!
//! Two declarations are related as follows:
//!
//! - **override**: the declaring type of `method` is a strict subtype of the declaring type of
//!   `other`
//! - **parallel**: neither declaring type is assignable to the other, e.g. two unrelated
//!   interfaces implemented by the same class
//!
//! # Rules
//!
//! 1. [`OverridingMethodMustNotAlterParameterConstraints`] - overrides may not add parameter
//!    constraints, cascades or cross-parameter constraints
//! 2. [`ParallelMethodsMustNotDefineParameterConstraints`] - parallel declarations carrying
//!    parameter constraints must carry the same ones
//! 3. [`VoidMethodsMustNotBeReturnValueConstrained`] - void methods have no return value to
//!    constrain or cascade
//! 4. [`ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine`] - one cascade per return
//!    value along an override chain
//! 5. [`ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue`] - parallel
//!    declarations may not convert groups of a cascaded return value
//!
//! Rules 1, 2 and 4 can be switched off through [`MethodValidationConfig`].

use crate::{
    metadata::typesystem::{ExecutableDescriptor, TypeRegistry},
    Error, Result,
};

/// Relaxations of the method configuration rules.
///
/// The defaults enforce every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MethodValidationConfig {
    /// Allow overriding methods to alter parameter constraints
    pub allow_overriding_method_alter_parameter_constraint: bool,
    /// Allow a return value to be marked as cascaded more than once per hierarchy line
    pub allow_multiple_cascaded_validation_on_return_values: bool,
    /// Allow parallel methods to define differing parameter constraints
    pub allow_parallel_methods_define_parameter_constraints: bool,
}

impl MethodValidationConfig {
    /// Enforces every rule.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Relaxes every rule that can be relaxed.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            allow_overriding_method_alter_parameter_constraint: true,
            allow_multiple_cascaded_validation_on_return_values: true,
            allow_parallel_methods_define_parameter_constraints: true,
        }
    }
}

/// A rule deciding whether two declarations of the same method are compatible.
pub trait MethodConfigurationRule: Send + Sync {
    /// Name of the rule, used in log output.
    fn name(&self) -> &'static str;

    /// Checks the ordered pair `(method, other)`.
    ///
    /// # Errors
    ///
    /// Returns the configuration error describing the violated rule.
    fn apply(
        &self,
        method: &ExecutableDescriptor,
        other: &ExecutableDescriptor,
        types: &TypeRegistry,
    ) -> Result<()>;
}

/// Returns `true` if `method` is declared in a strict subtype of `other`'s declaring type.
fn is_defined_on_subtype(
    method: &ExecutableDescriptor,
    other: &ExecutableDescriptor,
    types: &TypeRegistry,
) -> Result<bool> {
    Ok(method.declaring_type != other.declaring_type
        && types.is_assignable(&other.declaring_type, &method.declaring_type)?)
}

/// Returns `true` if neither declaring type is assignable to the other.
fn is_defined_on_parallel_type(
    method: &ExecutableDescriptor,
    other: &ExecutableDescriptor,
    types: &TypeRegistry,
) -> Result<bool> {
    Ok(!types.is_assignable(&method.declaring_type, &other.declaring_type)?
        && !types.is_assignable(&other.declaring_type, &method.declaring_type)?)
}

/// Overrides may only keep or drop the parameter constraints of the overridden method.
pub struct OverridingMethodMustNotAlterParameterConstraints;

impl MethodConfigurationRule for OverridingMethodMustNotAlterParameterConstraints {
    fn name(&self) -> &'static str {
        "OverridingMethodMustNotAlterParameterConstraints"
    }

    fn apply(
        &self,
        method: &ExecutableDescriptor,
        other: &ExecutableDescriptor,
        types: &TypeRegistry,
    ) -> Result<()> {
        if is_defined_on_subtype(method, other, types)?
            && method.has_parameter_constraints()
            && !method.is_parameter_subset_of(other)
        {
            return Err(Error::IllegalParameterConstraintOverride {
                method: method.signature().to_string(),
                overriding: method.declaring_type.clone(),
                overridden: other.declaring_type.clone(),
            });
        }
        Ok(())
    }
}

/// Unrelated types declaring the same method must agree on its parameter constraints.
pub struct ParallelMethodsMustNotDefineParameterConstraints;

impl MethodConfigurationRule for ParallelMethodsMustNotDefineParameterConstraints {
    fn name(&self) -> &'static str {
        "ParallelMethodsMustNotDefineParameterConstraints"
    }

    fn apply(
        &self,
        method: &ExecutableDescriptor,
        other: &ExecutableDescriptor,
        types: &TypeRegistry,
    ) -> Result<()> {
        if is_defined_on_parallel_type(method, other, types)?
            && (method.has_parameter_constraints() || other.has_parameter_constraints())
            && !method.is_equally_parameter_constrained(other)
        {
            return Err(Error::ParallelParameterConstraints {
                method: method.signature().to_string(),
                first: method.declaring_type.clone(),
                second: other.declaring_type.clone(),
            });
        }
        Ok(())
    }
}

/// Void methods must not carry return value constraints or cascades.
pub struct VoidMethodsMustNotBeReturnValueConstrained;

impl MethodConfigurationRule for VoidMethodsMustNotBeReturnValueConstrained {
    fn name(&self) -> &'static str {
        "VoidMethodsMustNotBeReturnValueConstrained"
    }

    fn apply(
        &self,
        method: &ExecutableDescriptor,
        _other: &ExecutableDescriptor,
        _types: &TypeRegistry,
    ) -> Result<()> {
        if method.is_void() && method.return_value.is_constrained() {
            return Err(Error::VoidMethodConstrained {
                method: method.signature().to_string(),
                declaring: method.declaring_type.clone(),
            });
        }
        Ok(())
    }
}

/// A return value may be marked as cascaded by at most one declaration per hierarchy line.
pub struct ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine;

impl MethodConfigurationRule for ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine {
    fn name(&self) -> &'static str {
        "ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine"
    }

    fn apply(
        &self,
        method: &ExecutableDescriptor,
        other: &ExecutableDescriptor,
        types: &TypeRegistry,
    ) -> Result<()> {
        if method.return_value.is_cascading()
            && other.return_value.is_cascading()
            && (is_defined_on_subtype(method, other, types)?
                || is_defined_on_subtype(other, method, types)?)
        {
            return Err(Error::MultipleCascadedReturnValues {
                method: method.signature().to_string(),
                first: method.declaring_type.clone(),
                second: other.declaring_type.clone(),
            });
        }
        Ok(())
    }
}

/// Parallel declarations must not define group conversions for a cascaded return value.
pub struct ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue;

impl MethodConfigurationRule for ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue {
    fn name(&self) -> &'static str {
        "ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue"
    }

    fn apply(
        &self,
        method: &ExecutableDescriptor,
        other: &ExecutableDescriptor,
        types: &TypeRegistry,
    ) -> Result<()> {
        let converts = |d: &ExecutableDescriptor| {
            d.return_value.is_cascading() && !d.return_value.group_conversions().is_empty()
        };

        if (converts(method) || converts(other))
            && is_defined_on_parallel_type(method, other, types)?
        {
            return Err(Error::ParallelGroupConversion {
                method: method.signature().to_string(),
                first: method.declaring_type.clone(),
                second: other.declaring_type.clone(),
            });
        }
        Ok(())
    }
}

/// The rules active under `config`, in the order they are applied.
#[must_use]
pub fn rules_for(config: &MethodValidationConfig) -> Vec<Box<dyn MethodConfigurationRule>> {
    let mut rules: Vec<Box<dyn MethodConfigurationRule>> = Vec::with_capacity(5);

    if !config.allow_overriding_method_alter_parameter_constraint {
        rules.push(Box::new(OverridingMethodMustNotAlterParameterConstraints));
    }
    if !config.allow_parallel_methods_define_parameter_constraints {
        rules.push(Box::new(ParallelMethodsMustNotDefineParameterConstraints));
    }
    rules.push(Box::new(VoidMethodsMustNotBeReturnValueConstrained));
    if !config.allow_multiple_cascaded_validation_on_return_values {
        rules.push(Box::new(
            ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine,
        ));
    }
    rules.push(Box::new(
        ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue,
    ));

    rules
}

/// Applies `rules` to every ordered pair of `declarations`, including self pairs.
///
/// # Errors
///
/// Returns the error of the first failing rule.
pub(crate) fn check_declarations(
    declarations: &[&ExecutableDescriptor],
    rules: &[Box<dyn MethodConfigurationRule>],
    types: &TypeRegistry,
) -> Result<()> {
    for method in declarations {
        for other in declarations {
            for rule in rules {
                if let Err(error) = rule.apply(method, other, types) {
                    tracing::debug!(
                        rule = rule.name(),
                        method = %method.signature(),
                        declaring = %method.declaring_type,
                        other = %other.declaring_type,
                        "method configuration rule violated"
                    );
                    return Err(error);
                }
            }
        }
    }
    Ok(())
}
