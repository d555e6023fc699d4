// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # beanval
//!
//! A Bean Validation provider for dynamically described object models.
//!
//! Types, their constraints and their cascading configuration are registered in a
//! [`TypeRegistry`]. From there `beanval` aggregates the constraints of every type across its
//! class hierarchy and interfaces, enforces the legality rules for overridden and parallel
//! methods, plans group and group sequence execution, and validates beans, single properties,
//! detached values, method and constructor parameters and return values.
//!
//! ## Features
//!
//! - **Hierarchy aware metadata** - Constraints are merged across superclasses and interfaces,
//!   method overrides are checked against the Liskov substitution rules
//! - **Groups and sequences** - Group inheritance, nested group sequences, redefined and
//!   per-instance default group sequences
//! - **Object graph validation** - Cascading through beans, lists, maps and optionals with group
//!   conversion and cycle detection
//! - **Executable validation** - Parameters, cross-parameter constraints and return values
//! - **Concurrent** - Metadata is built once per type and shared between threads
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use beanval::prelude::*;
//!
//! let types = Arc::new(TypeRegistry::new());
//! types.define(
//!     TypeBuilder::class("User")
//!         .field("name", ElementMetadata::new().constraint(ConstraintDeclaration::new("NotBlank")))
//!         .field(
//!             "age",
//!             ElementMetadata::new().constraint(ConstraintDeclaration::new("Min").attribute("value", 18)),
//!         ),
//! )?;
//!
//! let factory = ValidatorFactory::new(types, ValidatorConfig::default());
//! let validator = factory.validator()?;
//!
//! let user = DynamicBean::new("User").with("name", "Ada").with("age", 17).handle();
//! let violations = validator.validate(&user, &[])?;
//!
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations[0].to_string(), "age: must be greater than or equal to 18");
//! # Ok::<(), beanval::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Type model, constraint declarations and the aggregated [`metadata::bean::BeanMetadata`]
//! - [`groups`] - Groups, sequences and the [`ValidationOrderGenerator`]
//! - [`engine`] - The [`Validator`], evaluators, messages and violations
//!
//! Configuration problems such as illegal overrides or cyclic sequences are reported as
//! [`Error`] values the first time the affected type or group is used, or eagerly through
//! [`ValidatorFactory::warm_up`]. Constraint violations are ordinary results, never errors.
//!
//! ## Logging
//!
//! `beanval` emits [`tracing`] events. Metadata builds, violated method rules and the factory
//! lifecycle are logged at `debug`, invalid provider results at `warn`. Install any `tracing`
//! subscriber to see them.
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use beanval::prelude::*;
///
/// let types = std::sync::Arc::new(TypeRegistry::new());
/// let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;
/// # Ok::<(), beanval::Error>(())
/// ```
pub mod prelude;

pub mod engine;
pub mod groups;
pub mod metadata;

/// `beanval` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::{BoxError, Error};

pub use engine::{
    Bean, BeanRef, ConstraintViolation, DynamicBean, Validator, ValidatorFactory, Value,
};
pub use groups::{DefaultGroupSequenceProvider, ValidationOrderGenerator};
pub use metadata::typesystem::{TypeName, TypeRegistry};
