//! Validation metadata and its aggregation across type hierarchies.
//!
//! This module turns the structural description of validated types into the merged,
//! override-consistent view the validation engine works on.
//!
//! # Key Components
//!
//! - [`typesystem`] - Type descriptors, builders and the [`typesystem::TypeRegistry`]
//! - [`constraint`] - Constraint declarations with attributes, groups and composition
//! - [`element`] - Constraints, cascading and group conversions of one element
//! - [`metaconstraint`] - Constraints bound to their evaluation location
//! - [`executable`] - Merged parameter and return value metadata of methods and constructors
//! - [`bean`] - The aggregated [`bean::BeanMetadata`] of one type
//! - [`rules`] - Legality rules for methods declared several times in a hierarchy
//! - [`manager`] - Lazily built, process-wide metadata cache
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use beanval::{TypeName, TypeRegistry, ValidationOrderGenerator};
//! use beanval::metadata::{
//!     constraint::ConstraintDeclaration,
//!     element::ElementMetadata,
//!     manager::BeanMetadataManager,
//!     rules::MethodValidationConfig,
//!     typesystem::TypeBuilder,
//! };
//!
//! let types = Arc::new(TypeRegistry::new());
//! types.define(TypeBuilder::class("Vehicle").field(
//!     "wheels",
//!     ElementMetadata::new().constraint(ConstraintDeclaration::new("Min").attribute("value", 2)),
//! ))?;
//! types.define(TypeBuilder::class("Car").extends("Vehicle").field(
//!     "plate",
//!     ElementMetadata::new().constraint(ConstraintDeclaration::new("NotNull")),
//! ))?;
//!
//! let generator = Arc::new(ValidationOrderGenerator::new(types.clone()));
//! let manager = BeanMetadataManager::new(types, generator, &MethodValidationConfig::default());
//!
//! let car = manager.bean_metadata(&TypeName::new("Car"))?;
//! assert_eq!(car.meta_constraints().len(), 2);
//! assert!(car.property("wheels").is_some());
//! # Ok::<(), beanval::Error>(())
//! ```

pub(crate) mod aggregator;
pub mod bean;
pub mod constraint;
pub mod element;
pub mod executable;
pub mod manager;
pub mod metaconstraint;
pub mod rules;
pub mod typesystem;
