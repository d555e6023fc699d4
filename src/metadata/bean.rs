//! Aggregated per-type validation metadata.
//!
//! A [`BeanMetadata`] is the merged view of one validated type: its own declarations and those
//! of every superclass and interface, with override legality already checked. It is built once
//! per type by [`crate::metadata::manager::BeanMetadataManager`] and immutable afterwards.
//!
//! # Default Group Sequence
//!
//! A class may replace the `Default` group by a sequence of groups, either statically or through
//! a [`DefaultGroupSequenceProvider`] consulted per validated instance. In both cases the bean
//! type itself has to appear in the sequence, where it stands for the constraints of the
//! `Default` group; [`valid_default_sequence`] performs that substitution and rejects malformed
//! sequences. Interfaces never redefine the default group sequence.

use std::{collections::BTreeMap, fmt, sync::Arc};

use rustc_hash::FxHashMap;

use crate::{
    engine::BeanRef,
    groups::{DefaultGroupSequenceProvider, ValidationOrder, ValidationOrderGenerator},
    metadata::{
        element::ElementMetadata,
        executable::ExecutableMetadata,
        metaconstraint::MetaConstraint,
        typesystem::{ExecutableSignature, TypeName},
    },
    Error, Result,
};

/// Merged metadata of one property.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    /// The property name
    pub name: String,
    /// Merged configuration of the field and getter declarations
    pub element: ElementMetadata,
    /// Constraints evaluated against the property, including container element constraints
    pub constraints: Vec<Arc<MetaConstraint>>,
}

impl PropertyMetadata {
    /// Returns `true` if the property value is validated recursively.
    #[must_use]
    pub fn is_cascading(&self) -> bool {
        self.element.has_cascades()
    }
}

/// How the `Default` group of a type is validated.
#[derive(Clone)]
pub enum DefaultGroupSequence {
    /// `Default` is not redefined
    Default,
    /// Statically redefined; the bean type is already replaced by `Default`
    Static {
        /// The valid sequence
        sequence: Vec<TypeName>,
        /// The precomputed validation order of the sequence
        order: ValidationOrder,
    },
    /// Computed per instance
    Provider(Arc<dyn DefaultGroupSequenceProvider>),
}

impl fmt::Debug for DefaultGroupSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultGroupSequence::Default => f.write_str("Default"),
            DefaultGroupSequence::Static { sequence, .. } => {
                f.debug_tuple("Static").field(sequence).finish()
            }
            DefaultGroupSequence::Provider(_) => f.write_str("Provider"),
        }
    }
}

/// The aggregated validation metadata of one type.
#[derive(Debug)]
pub struct BeanMetadata {
    pub(crate) bean_type: TypeName,
    pub(crate) is_interface: bool,
    pub(crate) hierarchy: Vec<TypeName>,
    pub(crate) properties: BTreeMap<String, PropertyMetadata>,
    pub(crate) cascaded_properties: Vec<String>,
    pub(crate) class_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) meta_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) direct_meta_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) methods: FxHashMap<ExecutableSignature, Arc<ExecutableMetadata>>,
    pub(crate) constructors: FxHashMap<ExecutableSignature, Arc<ExecutableMetadata>>,
    pub(crate) default_sequence: DefaultGroupSequence,
}

impl BeanMetadata {
    /// The described type.
    #[must_use]
    pub fn bean_type(&self) -> &TypeName {
        &self.bean_type
    }

    /// Returns `true` if the described type is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// The type followed by all its supertypes, see
    /// [`crate::metadata::typesystem::TypeRegistry::hierarchy`].
    #[must_use]
    pub fn hierarchy(&self) -> &[TypeName] {
        &self.hierarchy
    }

    /// All constrained or cascaded properties, ordered by name.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.properties.values()
    }

    /// A property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.get(name)
    }

    /// Returns `true` if a field or getter named `name` exists anywhere in the hierarchy.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Names of the properties validated recursively, in hierarchy order.
    #[must_use]
    pub fn cascaded_properties(&self) -> &[String] {
        &self.cascaded_properties
    }

    /// Class level constraints of the whole hierarchy.
    #[must_use]
    pub fn class_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.class_constraints
    }

    /// Every class level and property constraint of the whole hierarchy.
    #[must_use]
    pub fn meta_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.meta_constraints
    }

    /// Constraints declared by the type itself or by interfaces it implements directly.
    #[must_use]
    pub fn direct_meta_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.direct_meta_constraints
    }

    /// A method by signature.
    #[must_use]
    pub fn method(&self, signature: &ExecutableSignature) -> Option<&Arc<ExecutableMetadata>> {
        self.methods.get(signature)
    }

    /// All methods, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &Arc<ExecutableMetadata>> {
        self.methods.values()
    }

    /// A constructor by signature.
    #[must_use]
    pub fn constructor(
        &self,
        signature: &ExecutableSignature,
    ) -> Option<&Arc<ExecutableMetadata>> {
        self.constructors.get(signature)
    }

    /// All constructors, in no particular order.
    pub fn constructors(&self) -> impl Iterator<Item = &Arc<ExecutableMetadata>> {
        self.constructors.values()
    }

    /// Returns `true` if anything about the type is validated.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        !self.meta_constraints.is_empty()
            || !self.cascaded_properties.is_empty()
            || self.methods.values().any(|m| m.is_constrained())
            || self.constructors.values().any(|c| c.is_constrained())
    }

    /// Returns `true` if the `Default` group is replaced by a sequence.
    #[must_use]
    pub fn is_default_group_sequence_redefined(&self) -> bool {
        !matches!(self.default_sequence, DefaultGroupSequence::Default)
    }

    /// Returns `true` if the default group sequence is computed per instance.
    #[must_use]
    pub fn has_sequence_provider(&self) -> bool {
        matches!(self.default_sequence, DefaultGroupSequence::Provider(_))
    }

    /// The default group sequence for `bean`, with the bean type replaced by `Default`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`valid_default_sequence`] for malformed provider results.
    pub fn default_group_sequence(&self, bean: Option<&BeanRef>) -> Result<Vec<TypeName>> {
        match &self.default_sequence {
            DefaultGroupSequence::Default => Ok(vec![TypeName::default_group()]),
            DefaultGroupSequence::Static { sequence, .. } => Ok(sequence.clone()),
            DefaultGroupSequence::Provider(provider) => {
                let groups = provider.validation_groups(&self.bean_type, bean);
                valid_default_sequence(&self.bean_type, groups).inspect_err(|error| {
                    tracing::warn!(
                        bean = %self.bean_type,
                        code = error.code(),
                        "default group sequence provider returned an invalid sequence"
                    );
                })
            }
        }
    }

    /// The validation order of the default group sequence for `bean`.
    ///
    /// # Errors
    ///
    /// Returns provider result errors and sequence resolution errors.
    pub fn default_validation_order(
        &self,
        bean: Option<&BeanRef>,
        generator: &ValidationOrderGenerator,
    ) -> Result<ValidationOrder> {
        match &self.default_sequence {
            DefaultGroupSequence::Default => Ok(ValidationOrder::default_group()),
            DefaultGroupSequence::Static { order, .. } => Ok(order.clone()),
            DefaultGroupSequence::Provider(_) => {
                let sequence = self.default_group_sequence(bean)?;
                generator.default_validation_order(&self.bean_type, &sequence)
            }
        }
    }
}

/// Checks a redefined default group sequence of `bean_type` and replaces the bean type by
/// `Default`.
///
/// # Errors
///
/// - [`Error::BeanTypeMissingFromSequence`] if `groups` is `None` or lacks the bean type
/// - [`Error::EmptyGroupSequence`] if `groups` is empty
/// - [`Error::DefaultGroupInSequence`] if `groups` lists `Default`
pub fn valid_default_sequence(
    bean_type: &TypeName,
    groups: Option<Vec<TypeName>>,
) -> Result<Vec<TypeName>> {
    let Some(groups) = groups else {
        return Err(Error::BeanTypeMissingFromSequence {
            bean: bean_type.clone(),
        });
    };
    if groups.is_empty() {
        return Err(Error::EmptyGroupSequence {
            bean: bean_type.clone(),
        });
    }

    let mut contains_bean_type = false;
    let mut valid = Vec::with_capacity(groups.len());
    for group in groups {
        if group.is_default_group() {
            return Err(Error::DefaultGroupInSequence {
                bean: bean_type.clone(),
            });
        }
        if &group == bean_type {
            contains_bean_type = true;
            valid.push(TypeName::default_group());
        } else {
            valid.push(group);
        }
    }

    if !contains_bean_type {
        return Err(Error::BeanTypeMissingFromSequence {
            bean: bean_type.clone(),
        });
    }
    Ok(valid)
}
