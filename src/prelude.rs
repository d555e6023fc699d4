//! # beanval Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the beanval library. Import this module to get quick access to everything needed to
//! describe types and validate them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all beanval operations
pub use crate::Error;

/// The result type used throughout beanval
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Factory and validator
pub use crate::engine::{Validator, ValidatorFactory, ValidatorFactoryBuilder};

/// Validator configuration
pub use crate::engine::{ExecutableTypes, ValidatorConfig};

// ================================================================================================
// Type Model
// ================================================================================================

/// Type identities, descriptors and the registry
pub use crate::metadata::typesystem::{
    ExecutableBuilder, ExecutableSignature, TypeBuilder, TypeName, TypeRegistry,
};

/// Constraint declarations and element configuration
pub use crate::metadata::{
    constraint::{AttributeValue, ConstraintDeclaration},
    element::{ContainerElementKind, ContainerElementMetadata, ElementMetadata},
};

/// Aggregated metadata
pub use crate::metadata::bean::BeanMetadata;

// ================================================================================================
// Groups
// ================================================================================================

/// Group planning and per-instance default sequences
pub use crate::groups::{DefaultGroupSequenceProvider, ValidationOrder, ValidationOrderGenerator};

// ================================================================================================
// Values and Results
// ================================================================================================

/// The dynamic object model
pub use crate::engine::{Bean, BeanRef, DynamicBean, Value, ValueKind};

/// Violations and their locations
pub use crate::engine::{ConstraintViolation, PathPosition, PropertyPath};

/// Custom constraint evaluation
pub use crate::engine::{ConstraintEvaluator, EvaluationContext, EvaluatorRegistry};
