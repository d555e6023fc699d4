use std::{fmt, sync::Arc};

use strum::{Display, EnumIter};

use crate::{
    groups::DefaultGroupSequenceProvider,
    metadata::{
        constraint::ConstraintDeclaration,
        element::ElementMetadata,
        typesystem::{TypeKind, TypeName},
    },
};

/// Override identity of an executable.
///
/// Two methods with the same name and the same erased parameter types are considered the same
/// logical member; a method in a subtype with an equal signature overrides the supertype's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutableSignature {
    name: String,
    parameter_types: Vec<TypeName>,
}

impl ExecutableSignature {
    /// Creates a signature, erasing generic arguments of all parameter types.
    pub fn new<T: Into<TypeName>>(
        name: impl Into<String>,
        parameter_types: impl IntoIterator<Item = T>,
    ) -> Self {
        ExecutableSignature {
            name: name.into(),
            parameter_types: parameter_types
                .into_iter()
                .map(|t| t.into().erased())
                .collect(),
        }
    }

    /// The executable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The erased parameter types.
    #[must_use]
    pub fn parameter_types(&self) -> &[TypeName] {
        &self.parameter_types
    }
}

impl fmt::Display for ExecutableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}

/// The kind of an executable, used to decide eligibility for executable validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ExecutableKind {
    /// A constructor
    Constructor,
    /// A method following the getter naming convention
    Getter,
    /// Any other method
    Method,
}

/// A field of a type together with its validation metadata.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field name, which is also the property name
    pub name: String,
    /// Constraints and cascading configuration of the field
    pub element: ElementMetadata,
}

/// A parameter of an executable.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    /// The parameter name used in property paths (`arg0` when unnamed)
    pub name: String,
    /// The declared parameter type
    pub type_name: TypeName,
    /// Constraints and cascading configuration of the parameter
    pub element: ElementMetadata,
}

/// A method or constructor of a type.
#[derive(Debug, Clone)]
pub struct ExecutableDescriptor {
    /// Method, getter or constructor
    pub kind: ExecutableKind,
    /// The simple name; constructors use the simple name of their type
    pub name: String,
    /// The type declaring this executable
    pub declaring_type: TypeName,
    /// The parameters in declaration order
    pub parameters: Vec<ParameterDescriptor>,
    /// The return type, `None` for void methods
    pub return_type: Option<TypeName>,
    /// Constraints and cascading configuration of the return value
    pub return_value: ElementMetadata,
    /// Constraints that validate the parameter array as a whole
    pub cross_parameter: Vec<Arc<ConstraintDeclaration>>,
    /// Private executables are never inherited
    pub private: bool,
    /// Static methods are ignored by the metadata layer
    pub is_static: bool,
}

impl ExecutableDescriptor {
    /// The override identity of this executable.
    #[must_use]
    pub fn signature(&self) -> ExecutableSignature {
        ExecutableSignature::new(
            self.name.clone(),
            self.parameters.iter().map(|p| p.type_name.clone()),
        )
    }

    /// Returns `true` for void methods. Constructors are never void.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.kind != ExecutableKind::Constructor && self.return_type.is_none()
    }

    /// For getters, the name of the property they expose: the `is` or `get` prefix is stripped
    /// and the rest decapitalized, so `getURL` exposes `URL` and `getter` exposes `ter`.
    #[must_use]
    pub fn property_name(&self) -> Option<String> {
        if self.kind != ExecutableKind::Getter {
            return None;
        }

        let stem = match self.name.strip_prefix("is") {
            Some(stem) if !stem.is_empty() && self.returns_bool() => stem,
            _ => self.name.strip_prefix("get")?,
        };
        let mut chars = stem.chars();
        let first = chars.next()?;
        if chars.clone().next().is_some_and(char::is_uppercase) && first.is_uppercase() {
            return Some(stem.to_string());
        }
        Some(first.to_lowercase().chain(chars).collect())
    }

    fn returns_bool(&self) -> bool {
        self.return_type
            .as_ref()
            .is_some_and(|t| matches!(t.as_str(), "bool" | "boolean"))
    }

    /// Returns `true` if any parameter is constrained, cascaded or converts groups, or if
    /// cross-parameter constraints are declared.
    #[must_use]
    pub fn has_parameter_constraints(&self) -> bool {
        !self.cross_parameter.is_empty()
            || self.parameters.iter().any(|p| p.element.is_constrained())
    }

    /// Returns `true` if both executables carry the same parameter configuration.
    #[must_use]
    pub fn is_equally_parameter_constrained(&self, other: &ExecutableDescriptor) -> bool {
        self.is_parameter_subset_of(other) && other.is_parameter_subset_of(self)
    }

    /// Returns `true` if every parameter constraint, cascade and group conversion of `self` is
    /// also declared by `other`.
    #[must_use]
    pub fn is_parameter_subset_of(&self, other: &ExecutableDescriptor) -> bool {
        if self.parameters.len() != other.parameters.len() {
            return false;
        }

        let cross_subset = self
            .cross_parameter
            .iter()
            .all(|c| other.cross_parameter.iter().any(|o| o == c));

        cross_subset
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(mine, theirs)| mine.element.is_subset_of(&theirs.element))
    }
}

/// Immutable description of one type.
///
/// Built through [`crate::metadata::typesystem::TypeBuilder`], which stamps the declaring type
/// and target onto every constraint.
#[derive(Clone)]
pub struct TypeDescriptor {
    /// The identity of the type
    pub name: TypeName,
    /// Class or interface
    pub kind: TypeKind,
    /// The superclass, if any; always `None` for interfaces
    pub superclass: Option<TypeName>,
    /// Implemented interfaces (classes) or extended interfaces (interfaces)
    pub interfaces: Vec<TypeName>,
    /// Declared fields
    pub fields: Vec<FieldDescriptor>,
    /// Declared methods, including getters
    pub methods: Vec<ExecutableDescriptor>,
    /// Declared constructors
    pub constructors: Vec<ExecutableDescriptor>,
    /// Class level constraints
    pub constraints: Vec<Arc<ConstraintDeclaration>>,
    /// For classes the redefined default group sequence, for interfaces the sequence the
    /// interface stands for
    pub group_sequence: Option<Vec<TypeName>>,
    /// Computes the default group sequence per validated instance
    pub sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl TypeDescriptor {
    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Returns `true` if this interface defines a group sequence.
    #[must_use]
    pub fn is_group_sequence(&self) -> bool {
        self.is_interface() && self.group_sequence.is_some()
    }

    /// All direct supertypes, the superclass first.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeName> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .field("constraints", &self.constraints.len())
            .field("group_sequence", &self.group_sequence)
            .field("sequence_provider", &self.sequence_provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::ExecutableBuilder;

    #[test]
    fn test_signature_display_and_erasure() {
        let sig = ExecutableSignature::new("save", ["List<Item>", "int"]);
        assert_eq!(sig.to_string(), "save(List, int)");
        assert_eq!(sig, ExecutableSignature::new("save", ["List<Order>", "int"]));
    }

    #[test]
    fn test_getter_property_names() {
        let getter = ExecutableBuilder::method("getFirstName")
            .returns("String", ElementMetadata::new())
            .build_for(&TypeName::new("Person"))
            .unwrap();
        assert_eq!(getter.kind, ExecutableKind::Getter);
        assert_eq!(getter.property_name().as_deref(), Some("firstName"));

        let flag = ExecutableBuilder::method("isActive")
            .returns("bool", ElementMetadata::new())
            .build_for(&TypeName::new("Person"))
            .unwrap();
        assert_eq!(flag.property_name().as_deref(), Some("active"));

        let method = |name: &str, returns: &str| {
            ExecutableBuilder::method(name)
                .returns(returns, ElementMetadata::new())
                .build_for(&TypeName::new("Person"))
                .unwrap()
        };

        let getter = method("getter", "String");
        assert_eq!(getter.kind, ExecutableKind::Getter);
        assert_eq!(getter.property_name().as_deref(), Some("ter"));

        assert_eq!(method("getURL", "String").property_name().as_deref(), Some("URL"));
        assert_eq!(method("getX", "int").property_name().as_deref(), Some("x"));
        assert_eq!(method("isolated", "bool").property_name().as_deref(), Some("olated"));

        // an `is` prefix only makes a getter for boolean results
        assert_eq!(method("issue", "String").kind, ExecutableKind::Method);
        assert_eq!(method("isGetter", "String").kind, ExecutableKind::Method);
        assert_eq!(method("get", "String").kind, ExecutableKind::Method);
        assert_eq!(method("get", "String").property_name(), None);
    }
}
