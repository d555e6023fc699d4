use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::metadata::typesystem::TypeName;

/// A validation group.
///
/// Groups are compared by identity only; the `implicit` flag records whether the group was
/// requested explicitly or added while expanding another group (for example a super-group of a
/// requested group).
#[derive(Clone)]
pub struct Group {
    name: TypeName,
    implicit: bool,
}

impl Group {
    /// An explicitly requested group.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Group {
            name: name.into(),
            implicit: false,
        }
    }

    /// A group added by expansion.
    pub fn implicit(name: impl Into<TypeName>) -> Self {
        Group {
            name: name.into(),
            implicit: true,
        }
    }

    /// The `Default` group.
    #[must_use]
    pub fn default_group() -> Self {
        Group::new(TypeName::default_group())
    }

    /// The defining type of the group.
    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Returns `true` for the `Default` group.
    #[must_use]
    pub fn is_default_group(&self) -> bool {
        self.name.is_default_group()
    }

    /// Returns `true` if the group was added by expansion.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({})", self.name)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// One position of an expanded sequence: a group followed by all groups it inherits from.
///
/// All groups of a position are validated before the sequence decides whether to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWithInheritance {
    groups: Vec<Group>,
}

impl GroupWithInheritance {
    pub(crate) fn new(groups: Vec<Group>) -> Self {
        GroupWithInheritance { groups }
    }

    /// The groups of this position, the declared group first.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Iterates over the groups of this position.
    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }
}

impl<'a> IntoIterator for &'a GroupWithInheritance {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
