//! Validation of beans, properties, values and executables.
//!
//! The engine evaluates the aggregated metadata of [`crate::metadata`] against runtime values
//! along the plans produced by [`crate::groups`].
//!
//! # Key Components
//!
//! - [`ValidatorFactory`] - Owns the metadata cache and hands out validators
//! - [`Validator`] - The seven validation operations
//! - [`Value`] and [`Bean`] - The dynamic object model validated values are expressed in
//! - [`EvaluatorRegistry`] - Maps constraint kinds and value kinds to [`ConstraintEvaluator`]s
//! - [`ConstraintViolation`] - One failed constraint with its [`PropertyPath`]
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use beanval::{DynamicBean, TypeName, TypeRegistry, Value};
//! use beanval::engine::{ValidatorConfig, ValidatorFactory};
//! use beanval::metadata::{
//!     constraint::ConstraintDeclaration, element::ElementMetadata, typesystem::TypeBuilder,
//! };
//!
//! let types = Arc::new(TypeRegistry::new());
//! types.define(TypeBuilder::class("Address").field(
//!     "city",
//!     ElementMetadata::new().constraint(ConstraintDeclaration::new("NotNull")),
//! ))?;
//! types.define(TypeBuilder::class("Person").field("address", ElementMetadata::new().cascade()))?;
//!
//! let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;
//! let person = DynamicBean::new("Person")
//!     .with("address", DynamicBean::new("Address"))
//!     .handle();
//!
//! let violations = validator.validate(&person, &[])?;
//! assert_eq!(violations[0].property_path().to_string(), "address.city");
//!
//! let violations =
//!     validator.validate_value(&TypeName::new("Address"), "city", &Value::from("Paris"), &[])?;
//! assert!(violations.is_empty());
//! # Ok::<(), beanval::Error>(())
//! ```

mod builtin;
mod config;
mod context;
mod evaluator;
mod factory;
mod interpolate;
pub mod path;
mod validator;
mod value;
mod violation;

pub use builtin::default_message;
pub use config::{ExecutableTypes, ValidatorConfig};
pub use evaluator::{ConstraintEvaluator, EvaluationContext, EvaluatorRegistry};
pub use factory::{ValidatorFactory, ValidatorFactoryBuilder};
pub use interpolate::interpolate;
pub use path::{PathNode, PathPosition, PropertyPath};
pub use validator::Validator;
pub use value::{bean_id, Bean, BeanRef, DynamicBean, Value, ValueKind};
pub use violation::ConstraintViolation;
