//! Validation groups, group sequences and validation order planning.
//!
//! Constraints are tagged with the groups under which they apply. A validation request names the
//! groups to validate; this module turns that request into a [`ValidationOrder`], the execution
//! plan consumed by the validation engine.
//!
//! # Architecture
//!
//! - [`Group`] - A group identity with an implicit flag; groups compare by identity only
//! - [`Sequence`] - A resolved, flattened group sequence with one position per member group
//! - [`GroupWithInheritance`] - One sequence position: a group plus all groups it extends
//! - [`ValidationOrder`] - Ordered, de-duplicated single groups and sequences of one request
//! - [`ValidationOrderGenerator`] - Expands requested groups, resolving and caching sequences
//! - [`DefaultGroupSequenceProvider`] - Computes a bean's default group sequence per instance
//!
//! Groups are interfaces registered in the [`crate::metadata::typesystem::TypeRegistry`]. An
//! interface carrying a `group_sequence` stands for that sequence; requesting it validates its
//! members in order, stopping after the first member that produced violations. Sequences may
//! list other sequences, which are inlined at their position. A sequence reaching itself is
//! rejected with [`crate::Error::CyclicSequence`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use beanval::{TypeName, TypeRegistry, ValidationOrderGenerator};
//! use beanval::metadata::typesystem::TypeBuilder;
//!
//! let types = Arc::new(TypeRegistry::new());
//! types.define(TypeBuilder::group("HighLevelCoherence"))?;
//! types.define(TypeBuilder::sequence(
//!     "Address.Complete",
//!     [TypeName::default_group(), TypeName::new("HighLevelCoherence")],
//! ))?;
//!
//! let order = ValidationOrderGenerator::new(types)
//!     .validation_order(&[TypeName::new("Address.Complete")])?;
//!
//! let sequence = &order.sequences()[0];
//! assert!(sequence.composing_groups()[0].is_default_group());
//! assert_eq!(sequence.composing_groups()[1].name().as_str(), "HighLevelCoherence");
//! # Ok::<(), beanval::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`ValidationOrderGenerator`] caches resolved sequences in a concurrent map and is shared by
//! all validators of a factory. [`ValidationOrder`] instances are built per call and never
//! shared.

mod generator;
mod group;
mod order;
mod provider;
mod sequence;

pub use generator::ValidationOrderGenerator;
pub use group::{Group, GroupWithInheritance};
pub use order::ValidationOrder;
pub use provider::DefaultGroupSequenceProvider;
pub use sequence::Sequence;
