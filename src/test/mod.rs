//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::{
    engine::{Validator, ValidatorConfig, ValidatorFactory},
    metadata::{constraint::ConstraintDeclaration, typesystem::TypeRegistry},
    Result,
};

/// A validator with default configuration over the types defined by `setup`.
pub fn factory(setup: impl FnOnce(&TypeRegistry) -> Result<()>) -> Validator {
    factory_with(ValidatorConfig::default(), setup)
}

pub fn factory_with(
    config: ValidatorConfig,
    setup: impl FnOnce(&TypeRegistry) -> Result<()>,
) -> Validator {
    let types = Arc::new(TypeRegistry::new());
    setup(&types).expect("test types must be valid");
    ValidatorFactory::new(types, config)
        .validator()
        .expect("fresh factory is open")
}

pub fn not_null() -> ConstraintDeclaration {
    ConstraintDeclaration::new("NotNull")
}

pub fn min(value: i64) -> ConstraintDeclaration {
    ConstraintDeclaration::new("Min").attribute("value", value)
}

pub fn size(min: i64, max: i64) -> ConstraintDeclaration {
    ConstraintDeclaration::new("Size")
        .attribute("min", min)
        .attribute("max", max)
}
