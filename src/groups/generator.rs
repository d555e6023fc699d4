use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    groups::{Group, Sequence, ValidationOrder},
    metadata::typesystem::{TypeName, TypeRegistry},
    Error, Result,
};

/// Expands requested groups into a [`ValidationOrder`].
///
/// Plain groups are inserted together with every group they inherit from. Group sequences are
/// resolved recursively: nested sequences are inlined at their position, cycles are rejected and
/// the resolved sequence is cached for the lifetime of the generator, since sequence definitions
/// are immutable.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use beanval::{TypeName, TypeRegistry, ValidationOrderGenerator};
/// use beanval::metadata::typesystem::TypeBuilder;
///
/// let types = Arc::new(TypeRegistry::new());
/// types.define(TypeBuilder::group("First"))?;
/// types.define(TypeBuilder::group("Last"))?;
///
/// let generator = ValidationOrderGenerator::new(types);
/// let order = generator.validation_order(&[
///     TypeName::new("First"),
///     TypeName::new("Last"),
///     TypeName::new("First"),
/// ])?;
///
/// let groups: Vec<_> = order.groups().iter().map(|g| g.name().as_str()).collect();
/// assert_eq!(groups, ["First", "Last"]);
/// # Ok::<(), beanval::Error>(())
/// ```
pub struct ValidationOrderGenerator {
    types: Arc<TypeRegistry>,
    resolved_sequences: DashMap<TypeName, Arc<Sequence>>,
}

impl ValidationOrderGenerator {
    /// Creates a generator resolving groups against `types`.
    #[must_use]
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        ValidationOrderGenerator {
            types,
            resolved_sequences: DashMap::new(),
        }
    }

    /// Builds the plan for the requested groups.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyGroups`] if `groups` is empty
    /// - [`Error::TypeNotFound`] if a group is not registered
    /// - [`Error::NotAGroup`] if a group is a class
    /// - [`Error::CyclicSequence`] / [`Error::UnexpandableGroupSequence`] for malformed sequences
    pub fn validation_order(&self, groups: &[TypeName]) -> Result<ValidationOrder> {
        if groups.is_empty() {
            return Err(Error::EmptyGroups);
        }

        if groups.iter().all(TypeName::is_default_group) {
            return Ok(ValidationOrder::default_group());
        }

        for group in groups {
            let descriptor = self.types.resolve(group)?;
            if !descriptor.is_interface() {
                return Err(Error::NotAGroup {
                    group: group.clone(),
                });
            }
        }

        let mut order = ValidationOrder::default();
        for group in groups {
            if group.is_default_group() {
                order.insert_group(Group::default_group());
            } else if let Some(members) = self.sequence_members(group) {
                self.insert_sequence(group, &members, true, &mut order)?;
            } else {
                order.insert_group(Group::new(group.clone()));
                self.insert_inherited_groups(group, &mut order)?;
            }
        }

        Ok(order)
    }

    /// Builds the plan for a single group reached while cascading.
    ///
    /// Only groups produced by a group conversion are expanded; otherwise the group is part of an
    /// order that has already been expanded and is validated as is.
    ///
    /// # Errors
    ///
    /// See [`ValidationOrderGenerator::validation_order`].
    pub fn validation_order_for(&self, group: &TypeName, expand: bool) -> Result<ValidationOrder> {
        if group.is_default_group() {
            return Ok(ValidationOrder::default_group());
        }

        if expand {
            return self.validation_order(std::slice::from_ref(group));
        }

        let mut order = ValidationOrder::default();
        order.insert_group(Group::new(group.clone()));
        Ok(order)
    }

    /// Builds the plan of a redefined default group sequence of `bean_type`.
    ///
    /// `default_sequence` must already have the bean type replaced by `Default`. The result is
    /// not cached because provider computed sequences differ per instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicSequence`] or [`Error::UnexpandableGroupSequence`] for malformed
    /// nested sequences and [`Error::TypeNotFound`] for unregistered groups.
    pub fn default_validation_order(
        &self,
        bean_type: &TypeName,
        default_sequence: &[TypeName],
    ) -> Result<ValidationOrder> {
        let mut order = ValidationOrder::default();
        self.insert_sequence(bean_type, default_sequence, false, &mut order)?;
        Ok(order)
    }

    /// Number of sequences resolved and cached so far.
    #[must_use]
    pub fn cached_sequences(&self) -> usize {
        self.resolved_sequences.len()
    }

    /// Drops all cached sequences.
    pub fn clear(&self) {
        self.resolved_sequences.clear();
    }

    fn sequence_members(&self, group: &TypeName) -> Option<Vec<TypeName>> {
        self.types
            .get(group)
            .filter(|d| d.is_group_sequence())
            .and_then(|d| d.group_sequence.clone())
    }

    fn insert_inherited_groups(&self, group: &TypeName, order: &mut ValidationOrder) -> Result<()> {
        for inherited in self.types.super_interfaces(group)? {
            order.insert_group(Group::implicit(inherited));
        }
        Ok(())
    }

    fn insert_sequence(
        &self,
        name: &TypeName,
        members: &[TypeName],
        cache: bool,
        order: &mut ValidationOrder,
    ) -> Result<()> {
        if cache {
            if let Some(sequence) = self.resolved_sequences.get(name) {
                tracing::trace!(sequence = %name, "group sequence cache hit");
                order.insert_sequence(sequence.value().clone());
                return Ok(());
            }
        }

        let mut path = Vec::new();
        let groups = self.resolve_sequence(name, members, &mut path)?;
        let mut sequence = Sequence::new(name.clone(), groups);
        sequence.expand_inherited_groups(&self.types)?;
        tracing::trace!(sequence = %name, groups = ?sequence.composing_groups(), "resolved group sequence");

        let mut sequence = Arc::new(sequence);
        if cache {
            sequence = self
                .resolved_sequences
                .entry(name.clone())
                .or_insert(sequence)
                .value()
                .clone();
        }
        order.insert_sequence(sequence);
        Ok(())
    }

    fn resolve_sequence(
        &self,
        name: &TypeName,
        members: &[TypeName],
        path: &mut Vec<TypeName>,
    ) -> Result<Vec<Group>> {
        if path.contains(name) {
            return Err(Error::CyclicSequence {
                sequence: name.clone(),
            });
        }
        path.push(name.clone());

        let mut resolved: Vec<Group> = Vec::new();
        for member in members {
            // Unknown members are rejected even if they would never be validated
            self.types.resolve(member)?;

            let groups = match self.sequence_members(member) {
                Some(nested) => self.resolve_sequence(member, &nested, path)?,
                None => vec![Group::new(member.clone())],
            };
            add_groups(name, &mut resolved, groups)?;
        }

        path.pop();
        Ok(resolved)
    }
}

fn add_groups(sequence: &TypeName, resolved: &mut Vec<Group>, groups: Vec<Group>) -> Result<()> {
    for group in groups {
        match resolved.iter().position(|g| *g == group) {
            Some(index) if index + 1 < resolved.len() => {
                return Err(Error::UnexpandableGroupSequence {
                    sequence: sequence.clone(),
                    group: group.name().clone(),
                });
            }
            Some(_) => {}
            None => resolved.push(group),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;

    fn generator(builders: Vec<TypeBuilder>) -> ValidationOrderGenerator {
        let types = Arc::new(TypeRegistry::new());
        for builder in builders {
            types.define(builder).unwrap();
        }
        ValidationOrderGenerator::new(types)
    }

    fn names(groups: &[Group]) -> Vec<&str> {
        groups.iter().map(|g| g.name().as_str()).collect()
    }

    #[test]
    fn test_empty_groups() {
        let generator = generator(vec![]);
        assert!(matches!(
            generator.validation_order(&[]),
            Err(Error::EmptyGroups)
        ));
    }

    #[test]
    fn test_default_shortcut() {
        let generator = generator(vec![]);
        let order = generator
            .validation_order(&[TypeName::default_group()])
            .unwrap();
        assert_eq!(order, ValidationOrder::default_group());
    }

    #[test]
    fn test_class_is_not_a_group() {
        let generator = generator(vec![TypeBuilder::class("Car")]);
        let result = generator.validation_order(&[TypeName::new("Car")]);
        assert!(matches!(result, Err(Error::NotAGroup { group }) if group.as_str() == "Car"));
    }

    #[test]
    fn test_unknown_group() {
        let generator = generator(vec![]);
        let result = generator.validation_order(&[TypeName::new("Nope")]);
        assert!(matches!(result, Err(Error::TypeNotFound(_))));
    }

    #[test]
    fn test_deduplication() {
        let generator = generator(vec![TypeBuilder::group("First"), TypeBuilder::group("Last")]);
        let first = TypeName::new("First");
        let last = TypeName::new("Last");

        let order = generator.validation_order(&[first.clone()]).unwrap();
        assert_eq!(order.groups().len(), 1);

        let order = generator
            .validation_order(&[first.clone(), first.clone()])
            .unwrap();
        assert_eq!(order.groups().len(), 1);

        let order = generator
            .validation_order(&[first.clone(), last, first])
            .unwrap();
        assert_eq!(names(order.groups()), ["First", "Last"]);
    }

    #[test]
    fn test_inherited_groups() {
        let generator = generator(vec![
            TypeBuilder::group("Base"),
            TypeBuilder::group("Middle").implements("Base"),
            TypeBuilder::group("Leaf").implements("Middle"),
        ]);

        let order = generator
            .validation_order(&[TypeName::new("Leaf")])
            .unwrap();
        assert_eq!(names(order.groups()), ["Leaf", "Middle", "Base"]);
        assert!(order.groups()[1].is_implicit());
    }

    #[test]
    fn test_default_and_custom_sequence() {
        let generator = generator(vec![
            TypeBuilder::group("HighLevelCoherence"),
            TypeBuilder::sequence(
                "Address.Complete",
                [TypeName::default_group(), TypeName::new("HighLevelCoherence")],
            ),
        ]);

        let order = generator
            .validation_order(&[TypeName::new("Address.Complete")])
            .unwrap();
        assert!(order.groups().is_empty());
        assert_eq!(order.sequences().len(), 1);

        let groups = order.sequences()[0].composing_groups();
        assert!(groups[0].is_default_group());
        assert_eq!(groups[1].name().as_str(), "HighLevelCoherence");
    }

    #[test]
    fn test_nested_sequences_are_flattened() {
        let generator = generator(vec![
            TypeBuilder::group("A"),
            TypeBuilder::group("B"),
            TypeBuilder::group("C"),
            TypeBuilder::group("D"),
            TypeBuilder::sequence("Basic", ["A", "B"]),
            TypeBuilder::sequence("Complex", ["C", "D"]),
            TypeBuilder::sequence("All", ["Basic", "Complex"]),
        ]);

        let order = generator.validation_order(&[TypeName::new("All")]).unwrap();
        assert_eq!(
            names(order.sequences()[0].composing_groups()),
            ["A", "B", "C", "D"]
        );
        assert_eq!(order.sequences()[0].positions().len(), 4);
        assert_eq!(generator.cached_sequences(), 1);

        // second expansion is served from the cache
        let again = generator.validation_order(&[TypeName::new("All")]).unwrap();
        assert!(Arc::ptr_eq(&order.sequences()[0], &again.sequences()[0]));
    }

    #[test]
    fn test_direct_cycle() {
        let generator = generator(vec![TypeBuilder::sequence("Loop", ["Loop"])]);
        let result = generator.validation_order(&[TypeName::new("Loop")]);
        assert!(matches!(result, Err(Error::CyclicSequence { .. })));
    }

    #[test]
    fn test_indirect_cycle() {
        let generator = generator(vec![
            TypeBuilder::group("G"),
            TypeBuilder::sequence("A", ["G", "B"]),
            TypeBuilder::sequence("B", ["C"]),
            TypeBuilder::sequence("C", ["A"]),
        ]);
        let result = generator.validation_order(&[TypeName::new("A")]);
        assert!(matches!(result, Err(Error::CyclicSequence { .. })));
        assert_eq!(generator.cached_sequences(), 0);
    }

    #[test]
    fn test_group_in_sequence_and_nested_sequence() {
        let generator = generator(vec![
            TypeBuilder::group("A"),
            TypeBuilder::group("B"),
            TypeBuilder::sequence("Inner", ["A", "B"]),
            TypeBuilder::sequence("Outer", ["A", "B", "Inner"]),
        ]);
        let result = generator.validation_order(&[TypeName::new("Outer")]);
        assert!(matches!(
            result,
            Err(Error::UnexpandableGroupSequence { .. })
        ));
    }

    #[test]
    fn test_trailing_duplicate_is_merged() {
        let generator = generator(vec![
            TypeBuilder::group("A"),
            TypeBuilder::group("B"),
            TypeBuilder::sequence("Inner", ["B"]),
            TypeBuilder::sequence("Outer", ["A", "B", "Inner"]),
        ]);
        let order = generator
            .validation_order(&[TypeName::new("Outer")])
            .unwrap();
        assert_eq!(names(order.sequences()[0].composing_groups()), ["A", "B"]);
    }

    #[test]
    fn test_default_validation_order_is_not_cached() {
        let generator = generator(vec![TypeBuilder::group("Extra")]);
        let order = generator
            .default_validation_order(
                &TypeName::new("Bean"),
                &[TypeName::default_group(), TypeName::new("Extra")],
            )
            .unwrap();
        assert_eq!(order.sequences()[0].name().as_str(), "Bean");
        assert_eq!(generator.cached_sequences(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn order_keeps_first_occurrence(picks in proptest::collection::vec(0usize..4, 1..16)) {
                let generator = generator(vec![
                    TypeBuilder::group("G0"),
                    TypeBuilder::group("G1"),
                    TypeBuilder::group("G2"),
                    TypeBuilder::group("G3"),
                ]);
                let requested: Vec<TypeName> =
                    picks.iter().map(|i| TypeName::new(format!("G{i}"))).collect();

                let order = generator.validation_order(&requested).unwrap();

                let mut expected: Vec<&TypeName> = Vec::new();
                for group in &requested {
                    if !expected.contains(&group) {
                        expected.push(group);
                    }
                }
                let actual: Vec<&TypeName> = order.groups().iter().map(Group::name).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
