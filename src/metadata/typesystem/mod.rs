//! Structural type model consumed by the metadata layer.
//!
//! Validation metadata is derived from an explicit, programmatic description of every validated
//! type instead of runtime reflection. Each type is described once by a [`TypeDescriptor`]
//! (its kind, superclass, implemented interfaces, fields, methods, constructors and the
//! constraints attached to them) and registered in a [`TypeRegistry`]. The registry answers the
//! structural questions the rest of the crate asks: which types make up the supertype graph of
//! a class, whether one type is a subtype of another, and whether an interface defines a group
//! sequence.
//!
//! # Key Components
//!
//! - [`TypeName`] - Cheap to clone type identity used as key everywhere
//! - [`TypeKind`] - Class or interface classification; only interfaces can act as groups
//! - [`TypeDescriptor`] - Immutable description of one type
//! - [`ExecutableDescriptor`] - Description of one method or constructor
//! - [`ExecutableSignature`] - Override identity of an executable (name plus erased parameters)
//! - [`TypeBuilder`] / [`ExecutableBuilder`] - Fluent construction of descriptors
//! - [`TypeRegistry`] - Concurrent store of all descriptors with hierarchy resolution
//!
//! # Examples
//!
//! ```rust
//! use beanval::metadata::typesystem::{TypeBuilder, TypeRegistry, TypeName};
//!
//! let registry = TypeRegistry::new();
//! registry.register(TypeBuilder::interface("Named").build()?);
//! registry.register(TypeBuilder::class("Animal").implements("Named").build()?);
//! registry.register(TypeBuilder::class("Dog").extends("Animal").build()?);
//!
//! let hierarchy = registry.hierarchy(&TypeName::new("Dog"))?;
//! assert_eq!(hierarchy, vec![
//!     TypeName::new("Dog"),
//!     TypeName::new("Animal"),
//!     TypeName::new("Named"),
//! ]);
//! # Ok::<(), beanval::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`TypeRegistry`] is backed by concurrent maps and can be shared across threads behind an
//! [`std::sync::Arc`]. Descriptors are immutable once registered.

mod builder;
mod descriptor;
mod registry;

pub use builder::{ExecutableBuilder, TypeBuilder};
pub use descriptor::{
    ExecutableDescriptor, ExecutableKind, ExecutableSignature, FieldDescriptor,
    ParameterDescriptor, TypeDescriptor,
};
pub use registry::TypeRegistry;

use std::{fmt, sync::Arc};

use strum::{Display, EnumIter};

/// Name of the synthetic `Default` group.
pub const DEFAULT_GROUP_NAME: &str = "beanval.groups.Default";

/// Identity of a type.
///
/// Two `TypeName`s are equal when their textual names are equal. The name is stored behind an
/// [`Arc`], so cloning is a reference count increment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Creates a new type name.
    pub fn new(name: impl AsRef<str>) -> Self {
        TypeName(Arc::from(name.as_ref()))
    }

    /// The identity of the synthetic `Default` group.
    #[must_use]
    pub fn default_group() -> Self {
        TypeName::new(DEFAULT_GROUP_NAME)
    }

    /// Returns `true` if this is the `Default` group.
    #[must_use]
    pub fn is_default_group(&self) -> bool {
        &*self.0 == DEFAULT_GROUP_NAME
    }

    /// The full name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without any leading namespace, e.g. `Car` for `com.acme.Car`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        let erased = self.0.split('<').next().unwrap_or(&self.0);
        erased.rsplit('.').next().unwrap_or(erased)
    }

    /// The name with generic arguments removed, e.g. `List` for `List<String>`.
    #[must_use]
    pub fn erased(&self) -> TypeName {
        match self.0.find('<') {
            Some(pos) => TypeName::new(self.0[..pos].trim()),
            None => self.clone(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default_group() {
            f.write_str("Default")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        TypeName::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        TypeName::new(value)
    }
}

impl From<&TypeName> for TypeName {
    fn from(value: &TypeName) -> Self {
        value.clone()
    }
}

/// Classification of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypeKind {
    /// A concrete or abstract class; has at most one superclass
    Class,
    /// An interface; may extend any number of interfaces and may act as a group
    Interface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_erasure() {
        let name = TypeName::new("java.util.List<com.acme.Item>");
        assert_eq!(name.erased(), TypeName::new("java.util.List"));
        assert_eq!(name.simple_name(), "List");
        assert_eq!(TypeName::new("Plain").erased(), TypeName::new("Plain"));
    }

    #[test]
    fn test_default_group_display() {
        let default = TypeName::default_group();
        assert!(default.is_default_group());
        assert_eq!(default.to_string(), "Default");
        assert!(!TypeName::new("Default").is_default_group());
    }
}
