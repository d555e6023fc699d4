use std::fmt;

use crate::{
    groups::{Group, GroupWithInheritance},
    metadata::typesystem::{TypeName, TypeRegistry},
    Result,
};

/// A resolved group sequence.
///
/// The composing groups are the flattened members of the sequence: nested sequences have been
/// inlined and duplicates removed. Each composing group becomes one position of the sequence;
/// validation of the sequence stops after the first position that produced a violation.
#[derive(Clone, PartialEq, Eq)]
pub struct Sequence {
    name: TypeName,
    groups: Vec<Group>,
    positions: Vec<GroupWithInheritance>,
}

impl Sequence {
    /// Creates a sequence whose positions hold exactly one group each.
    pub(crate) fn new(name: TypeName, groups: Vec<Group>) -> Self {
        let positions = groups
            .iter()
            .map(|g| GroupWithInheritance::new(vec![g.clone()]))
            .collect();
        Sequence {
            name,
            groups,
            positions,
        }
    }

    /// A sequence consisting of the `Default` group only.
    #[must_use]
    pub fn default_sequence() -> Self {
        Self::new(TypeName::default_group(), vec![Group::default_group()])
    }

    /// Extends every position with the groups its group inherits from.
    ///
    /// Runs after the sequence has been checked for expandability, the inherited groups do not
    /// take part in that check.
    pub(crate) fn expand_inherited_groups(&mut self, types: &TypeRegistry) -> Result<()> {
        let mut positions = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut members = vec![group.clone()];
            if !group.is_default_group() {
                for inherited in types.super_interfaces(group.name())? {
                    let inherited = Group::implicit(inherited);
                    if !members.contains(&inherited) {
                        members.push(inherited);
                    }
                }
            }
            positions.push(GroupWithInheritance::new(members));
        }
        self.positions = positions;
        Ok(())
    }

    /// The type defining the sequence; for redefined default sequences the bean type.
    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// The flattened groups of the sequence.
    #[must_use]
    pub fn composing_groups(&self) -> &[Group] {
        &self.groups
    }

    /// The positions of the sequence, in validation order.
    #[must_use]
    pub fn positions(&self) -> &[GroupWithInheritance] {
        &self.positions
    }

    /// Iterates over the positions of the sequence.
    pub fn iter(&self) -> std::slice::Iter<'_, GroupWithInheritance> {
        self.positions.iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a GroupWithInheritance;
    type IntoIter = std::slice::Iter<'a, GroupWithInheritance>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({}: {:?})", self.name, self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;

    #[test]
    fn test_expand_inherited_groups() {
        let types = TypeRegistry::new();
        types.define(TypeBuilder::group("Base")).unwrap();
        types
            .define(TypeBuilder::group("Extended").implements("Base"))
            .unwrap();

        let mut sequence = Sequence::new(
            TypeName::new("Ordered"),
            vec![Group::default_group(), Group::new("Extended")],
        );
        sequence.expand_inherited_groups(&types).unwrap();

        assert_eq!(sequence.positions()[0].groups(), &[Group::default_group()]);
        let second: Vec<_> = sequence.positions()[1]
            .iter()
            .map(|g| g.name().as_str())
            .collect();
        assert_eq!(second, ["Extended", "Base"]);
        assert!(sequence.positions()[1].groups()[1].is_implicit());
        assert_eq!(sequence.composing_groups().len(), 2);
    }
}
