//! Meta constraints: constraints bound to a location in the object graph.

use std::{fmt, sync::Arc};

use strum::Display;

use crate::metadata::{
    constraint::ConstraintDeclaration, element::ContainerElementKind, typesystem::TypeName,
};

/// Where a meta-constraint reads its value from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintLocation {
    /// The bean itself (class level constraint)
    Bean,
    /// A field or getter backed property
    Property(String),
    /// An executable parameter
    Parameter(usize),
    /// All parameters of an executable
    CrossParameter,
    /// The return value of an executable
    ReturnValue,
}

impl fmt::Display for ConstraintLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintLocation::Bean => f.write_str("bean"),
            ConstraintLocation::Property(name) => write!(f, "property {name}"),
            ConstraintLocation::Parameter(index) => write!(f, "parameter {index}"),
            ConstraintLocation::CrossParameter => f.write_str("cross-parameter"),
            ConstraintLocation::ReturnValue => f.write_str("return value"),
        }
    }
}

/// Whether a constraint was declared by the bean type or one of its supertypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ConstraintOrigin {
    /// Declared by the bean type itself
    DefinedLocally,
    /// Inherited from a superclass or an interface
    DefinedInHierarchy,
}

/// A constraint declaration bound to the place it is evaluated at.
///
/// Meta-constraints are created once per bean type while aggregating metadata and compute the
/// effective group membership: the declared groups, plus the declaring type itself as an
/// implicit group when the constraint is part of `Default`. Requesting an interface as group
/// therefore validates the `Default` constraints that interface declares.
#[derive(Debug, Clone)]
pub struct MetaConstraint {
    id: usize,
    declaration: Arc<ConstraintDeclaration>,
    location: ConstraintLocation,
    container: Option<ContainerElementKind>,
    declaring_type: TypeName,
    declared_on_interface: bool,
    origin: ConstraintOrigin,
    groups: Vec<TypeName>,
}

impl MetaConstraint {
    pub(crate) fn new(
        id: usize,
        declaration: Arc<ConstraintDeclaration>,
        location: ConstraintLocation,
        container: Option<ContainerElementKind>,
        declaring_type: TypeName,
        declared_on_interface: bool,
        bean_type: &TypeName,
    ) -> Self {
        let mut groups = declaration.groups_slice().to_vec();
        if declaration.is_default_group_member() && !groups.contains(&declaring_type) {
            groups.push(declaring_type.clone());
        }
        let origin = if &declaring_type == bean_type {
            ConstraintOrigin::DefinedLocally
        } else {
            ConstraintOrigin::DefinedInHierarchy
        };

        MetaConstraint {
            id,
            declaration,
            location,
            container,
            declaring_type,
            declared_on_interface,
            origin,
            groups,
        }
    }

    /// Identity of the meta-constraint within its bean metadata.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The underlying declaration.
    #[must_use]
    pub fn declaration(&self) -> &Arc<ConstraintDeclaration> {
        &self.declaration
    }

    /// Where the validated value is read from.
    #[must_use]
    pub fn location(&self) -> &ConstraintLocation {
        &self.location
    }

    /// The container element kind for type argument constraints.
    #[must_use]
    pub fn container(&self) -> Option<ContainerElementKind> {
        self.container
    }

    /// The type declaring the constraint.
    #[must_use]
    pub fn declaring_type(&self) -> &TypeName {
        &self.declaring_type
    }

    /// Returns `true` if the declaring type is an interface.
    #[must_use]
    pub fn is_declared_on_interface(&self) -> bool {
        self.declared_on_interface
    }

    /// Declared locally or inherited.
    #[must_use]
    pub fn origin(&self) -> ConstraintOrigin {
        self.origin
    }

    /// The effective groups, including the implicit group of the declaring type.
    #[must_use]
    pub fn groups(&self) -> &[TypeName] {
        &self.groups
    }

    /// Returns `true` if the constraint is validated under `group`.
    #[must_use]
    pub fn is_applicable(&self, group: &TypeName) -> bool {
        self.groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_group() {
        let declaration = Arc::new(ConstraintDeclaration::new("NotNull"));
        let meta = MetaConstraint::new(
            0,
            declaration,
            ConstraintLocation::Property("name".into()),
            None,
            TypeName::new("Named"),
            true,
            &TypeName::new("Person"),
        );

        assert!(meta.is_applicable(&TypeName::default_group()));
        assert!(meta.is_applicable(&TypeName::new("Named")));
        assert!(!meta.is_applicable(&TypeName::new("Person")));
        assert_eq!(meta.origin(), ConstraintOrigin::DefinedInHierarchy);
    }

    #[test]
    fn test_no_implicit_group_outside_default() {
        let declaration = Arc::new(ConstraintDeclaration::new("NotNull").groups(["Strict"]));
        let meta = MetaConstraint::new(
            1,
            declaration,
            ConstraintLocation::Bean,
            None,
            TypeName::new("Person"),
            false,
            &TypeName::new("Person"),
        );

        assert_eq!(meta.groups(), &[TypeName::new("Strict")]);
        assert_eq!(meta.origin(), ConstraintOrigin::DefinedLocally);
    }
}
