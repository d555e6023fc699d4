//! Per-element validation metadata.
//!
//! An element is anything a value can be read from: a field, a getter, a parameter or a return
//! value. [`ElementMetadata`] carries the constraints declared on the element, whether the
//! element is cascaded (the associated object is validated recursively), the group conversions
//! applied when cascading, and the metadata of container elements such as the element type of a
//! list (`List<@NotNull String>`).

use std::sync::Arc;

use strum::{Display, EnumIter};

use crate::{
    metadata::{
        constraint::{ConstraintDeclaration, ConstraintTarget},
        typesystem::{TypeName, TypeRegistry},
    },
    Error, Result,
};

/// A `from -> to` group conversion applied to a cascaded element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupConversion {
    /// The group validated on the owner of the element
    pub from: TypeName,
    /// The group the cascaded value is validated with instead
    pub to: TypeName,
}

/// The type argument a container element constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ContainerElementKind {
    /// Elements of a list, set or array
    #[strum(to_string = "<list element>")]
    ListElement,
    /// Keys of a map
    #[strum(to_string = "<map key>")]
    MapKey,
    /// Values of a map
    #[strum(to_string = "<map value>")]
    MapValue,
    /// The content of an optional value
    #[strum(to_string = "<optional value>")]
    OptionalValue,
}

/// Metadata of one type argument of a container element.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerElementMetadata {
    /// Which type argument this metadata applies to
    pub kind: ContainerElementKind,
    /// Constraints evaluated once per contained element
    pub constraints: Vec<Arc<ConstraintDeclaration>>,
    /// Whether contained elements are validated recursively
    pub cascading: bool,
    /// Group conversions applied when cascading into contained elements
    pub group_conversions: Vec<GroupConversion>,
}

impl ContainerElementMetadata {
    /// Creates empty metadata for `kind`.
    #[must_use]
    pub fn new(kind: ContainerElementKind) -> Self {
        ContainerElementMetadata {
            kind,
            constraints: Vec::new(),
            cascading: false,
            group_conversions: Vec::new(),
        }
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Marks contained elements for cascaded validation.
    #[must_use]
    pub fn cascade(mut self) -> Self {
        self.cascading = true;
        self
    }

    /// Adds a group conversion.
    #[must_use]
    pub fn convert_group(mut self, from: impl Into<TypeName>, to: impl Into<TypeName>) -> Self {
        self.group_conversions.push(GroupConversion {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Translates `group` according to the configured conversions.
    #[must_use]
    pub fn converted_group(&self, group: &TypeName) -> TypeName {
        convert(&self.group_conversions, group)
    }

    fn is_constrained(&self) -> bool {
        !self.constraints.is_empty() || self.cascading || !self.group_conversions.is_empty()
    }
}

/// Constraints and cascading configuration of one element.
///
/// # Examples
///
/// ```rust
/// use beanval::metadata::{
///     constraint::ConstraintDeclaration,
///     element::{ContainerElementKind, ContainerElementMetadata, ElementMetadata},
///     typesystem::TypeName,
/// };
///
/// // @Valid @ConvertGroup(from = Default, to = Complete) List<@NotNull Address>
/// let addresses = ElementMetadata::new()
///     .cascade()
///     .convert_group(TypeName::default_group(), "Complete")
///     .container_element(
///         ContainerElementMetadata::new(ContainerElementKind::ListElement)
///             .constraint(ConstraintDeclaration::new("NotNull")),
///     );
///
/// assert!(addresses.is_cascading());
/// assert_eq!(
///     addresses.converted_group(&TypeName::default_group()),
///     TypeName::new("Complete")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementMetadata {
    constraints: Vec<Arc<ConstraintDeclaration>>,
    cascading: bool,
    group_conversions: Vec<GroupConversion>,
    container_elements: Vec<ContainerElementMetadata>,
}

impl ElementMetadata {
    /// Creates metadata without constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Marks the element for cascaded validation.
    #[must_use]
    pub fn cascade(mut self) -> Self {
        self.cascading = true;
        self
    }

    /// Adds a group conversion applied when cascading.
    #[must_use]
    pub fn convert_group(mut self, from: impl Into<TypeName>, to: impl Into<TypeName>) -> Self {
        self.group_conversions.push(GroupConversion {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Adds container element metadata. Metadata for an already present kind is merged.
    #[must_use]
    pub fn container_element(mut self, element: ContainerElementMetadata) -> Self {
        self.merge_container_element(element);
        self
    }

    /// The constraints declared on the element.
    #[must_use]
    pub fn constraints(&self) -> &[Arc<ConstraintDeclaration>] {
        &self.constraints
    }

    /// Returns `true` if the element is cascaded.
    #[must_use]
    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    /// The configured group conversions.
    #[must_use]
    pub fn group_conversions(&self) -> &[GroupConversion] {
        &self.group_conversions
    }

    /// The container element metadata.
    #[must_use]
    pub fn container_elements(&self) -> &[ContainerElementMetadata] {
        &self.container_elements
    }

    /// Translates `group` according to the configured conversions.
    #[must_use]
    pub fn converted_group(&self, group: &TypeName) -> TypeName {
        convert(&self.group_conversions, group)
    }

    /// Returns `true` if anything validation relevant is declared.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
            || self.cascading
            || !self.group_conversions.is_empty()
            || self
                .container_elements
                .iter()
                .any(ContainerElementMetadata::is_constrained)
    }

    /// Returns `true` if the element or any of its container elements cascades.
    #[must_use]
    pub fn has_cascades(&self) -> bool {
        self.cascading || self.container_elements.iter().any(|c| c.cascading)
    }

    /// Returns `true` if every constraint, cascade and conversion of `self` is also declared by
    /// `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &ElementMetadata) -> bool {
        let constraints = self
            .constraints
            .iter()
            .all(|c| other.constraints.iter().any(|o| o == c));
        let conversions = self
            .group_conversions
            .iter()
            .all(|c| other.group_conversions.contains(c));
        let containers = self.container_elements.iter().all(|mine| {
            if !mine.is_constrained() {
                return true;
            }
            other
                .container_elements
                .iter()
                .find(|theirs| theirs.kind == mine.kind)
                .is_some_and(|theirs| {
                    (!mine.cascading || theirs.cascading)
                        && mine
                            .constraints
                            .iter()
                            .all(|c| theirs.constraints.iter().any(|o| o == c))
                        && mine
                            .group_conversions
                            .iter()
                            .all(|c| theirs.group_conversions.contains(c))
                })
        });

        constraints && conversions && containers && (!self.cascading || other.cascading)
    }

    /// Merges `other` into `self`: constraints and conversions are united, cascading is set if
    /// either side cascades. `element` names the merged element in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGroupConversion`] if `other` converts a source group that `self`
    /// already converts to a different target. Nothing is merged in that case.
    pub fn merge(&mut self, other: &ElementMetadata, element: &str) -> Result<()> {
        check_merged_conversions(element, &self.group_conversions, &other.group_conversions)?;
        for container in &other.container_elements {
            if let Some(existing) = self
                .container_elements
                .iter()
                .find(|c| c.kind == container.kind)
            {
                check_merged_conversions(
                    &format!("{element}.{}", container.kind),
                    &existing.group_conversions,
                    &container.group_conversions,
                )?;
            }
        }

        for constraint in &other.constraints {
            if !self.constraints.iter().any(|c| c == constraint) {
                self.constraints.push(constraint.clone());
            }
        }
        for conversion in &other.group_conversions {
            if !self.group_conversions.contains(conversion) {
                self.group_conversions.push(conversion.clone());
            }
        }
        self.cascading |= other.cascading;
        for container in &other.container_elements {
            self.merge_container_element(container.clone());
        }
        Ok(())
    }

    fn merge_container_element(&mut self, element: ContainerElementMetadata) {
        match self
            .container_elements
            .iter_mut()
            .find(|c| c.kind == element.kind)
        {
            Some(existing) => {
                for constraint in element.constraints {
                    if !existing.constraints.iter().any(|c| *c == constraint) {
                        existing.constraints.push(constraint);
                    }
                }
                for conversion in element.group_conversions {
                    if !existing.group_conversions.contains(&conversion) {
                        existing.group_conversions.push(conversion);
                    }
                }
                existing.cascading |= element.cascading;
            }
            None => self.container_elements.push(element),
        }
    }

    /// Checks the group conversions of the element and its container elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGroupConversion`] if conversions are declared on a non cascaded
    /// element, if the same source group is converted twice, or if a source group is a group
    /// sequence.
    pub fn check_group_conversions(&self, element: &str, types: &TypeRegistry) -> Result<()> {
        check_conversions(element, self.cascading, &self.group_conversions, types)?;
        for container in &self.container_elements {
            check_conversions(
                &format!("{element}.{}", container.kind),
                container.cascading,
                &container.group_conversions,
                types,
            )?;
        }
        Ok(())
    }

    pub(crate) fn located(self, declaring_type: &TypeName, target: &ConstraintTarget) -> Self {
        let locate = |constraints: Vec<Arc<ConstraintDeclaration>>| {
            constraints
                .into_iter()
                .map(|c| Arc::unwrap_or_clone(c).located(declaring_type, target.clone()))
                .collect()
        };

        ElementMetadata {
            constraints: locate(self.constraints),
            cascading: self.cascading,
            group_conversions: self.group_conversions,
            container_elements: self
                .container_elements
                .into_iter()
                .map(|c| ContainerElementMetadata {
                    constraints: locate(c.constraints),
                    ..c
                })
                .collect(),
        }
    }
}

fn convert(conversions: &[GroupConversion], group: &TypeName) -> TypeName {
    conversions
        .iter()
        .find(|c| &c.from == group)
        .map_or_else(|| group.clone(), |c| c.to.clone())
}

/// Rejects conversions in `added` whose source group `existing` maps to another target.
fn check_merged_conversions(
    element: &str,
    existing: &[GroupConversion],
    added: &[GroupConversion],
) -> Result<()> {
    for conversion in added {
        if let Some(mapped) = existing
            .iter()
            .find(|c| c.from == conversion.from && c.to != conversion.to)
        {
            return Err(Error::InvalidGroupConversion {
                element: element.to_string(),
                message: format!(
                    "group '{}' is converted to both '{}' and '{}'",
                    conversion.from, mapped.to, conversion.to
                ),
            });
        }
    }
    Ok(())
}

fn check_conversions(
    element: &str,
    cascading: bool,
    conversions: &[GroupConversion],
    types: &TypeRegistry,
) -> Result<()> {
    if conversions.is_empty() {
        return Ok(());
    }

    if !cascading {
        return Err(Error::InvalidGroupConversion {
            element: element.to_string(),
            message: "group conversions require cascaded validation".to_string(),
        });
    }

    for (i, conversion) in conversions.iter().enumerate() {
        if conversions[..i].iter().any(|c| c.from == conversion.from) {
            return Err(Error::InvalidGroupConversion {
                element: element.to_string(),
                message: format!("group '{}' is converted more than once", conversion.from),
            });
        }
        if types
            .get(&conversion.from)
            .is_some_and(|d| d.is_group_sequence())
        {
            return Err(Error::InvalidGroupConversion {
                element: element.to_string(),
                message: format!(
                    "group sequence '{}' cannot be the source of a conversion",
                    conversion.from
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeBuilder;

    fn not_null() -> ConstraintDeclaration {
        ConstraintDeclaration::new("NotNull")
    }

    #[test]
    fn test_subset() {
        let narrow = ElementMetadata::new().constraint(not_null());
        let wide = ElementMetadata::new()
            .constraint(not_null())
            .constraint(ConstraintDeclaration::new("Size").attribute("max", 5));

        assert!(narrow.is_subset_of(&wide));
        assert!(!wide.is_subset_of(&narrow));
        assert!(ElementMetadata::new().is_subset_of(&narrow));
        assert!(!ElementMetadata::new().cascade().is_subset_of(&narrow));
    }

    #[test]
    fn test_container_subset() {
        let list = |c: ConstraintDeclaration| {
            ElementMetadata::new().container_element(
                ContainerElementMetadata::new(ContainerElementKind::ListElement).constraint(c),
            )
        };

        assert!(list(not_null()).is_subset_of(&list(not_null())));
        assert!(!list(not_null()).is_subset_of(&ElementMetadata::new()));
        assert!(!list(not_null()).is_subset_of(&list(ConstraintDeclaration::new("NotBlank"))));
    }

    #[test]
    fn test_merge_unites() {
        let mut left = ElementMetadata::new().constraint(not_null());
        let right = ElementMetadata::new()
            .constraint(not_null())
            .constraint(ConstraintDeclaration::new("NotBlank"))
            .cascade();

        left.merge(&right, "name").unwrap();
        assert_eq!(left.constraints().len(), 2);
        assert!(left.is_cascading());
    }

    #[test]
    fn test_merge_rejects_conflicting_conversions() {
        let default = TypeName::default_group();
        let mut item = ElementMetadata::new().cascade().convert_group(default.clone(), "A");

        let same = ElementMetadata::new().cascade().convert_group(default.clone(), "A");
        item.merge(&same, "item").unwrap();
        assert_eq!(item.group_conversions().len(), 1);

        let other = ElementMetadata::new().cascade().convert_group(default.clone(), "B");
        assert!(matches!(
            item.merge(&other, "item"),
            Err(Error::InvalidGroupConversion { ref element, .. }) if element == "item"
        ));
        assert_eq!(item.converted_group(&default), TypeName::new("A"));

        let list = |to: &str| {
            ElementMetadata::new().container_element(
                ContainerElementMetadata::new(ContainerElementKind::ListElement)
                    .cascade()
                    .convert_group(default.clone(), to),
            )
        };
        let mut lines = list("A");
        assert!(matches!(
            lines.merge(&list("B"), "lines"),
            Err(Error::InvalidGroupConversion { ref element, .. })
                if element == "lines.<list element>"
        ));
    }

    #[test]
    fn test_conversion_checks() {
        let types = TypeRegistry::new();
        types.register(TypeBuilder::group("Basic").build().unwrap());
        types.register(TypeBuilder::sequence("Ordered", ["Basic"]).build().unwrap());

        let uncascaded = ElementMetadata::new().convert_group("Basic", "Other");
        assert!(matches!(
            uncascaded.check_group_conversions("address", &types),
            Err(Error::InvalidGroupConversion { .. })
        ));

        let twice = ElementMetadata::new()
            .cascade()
            .convert_group("Basic", "A")
            .convert_group("Basic", "B");
        assert!(twice.check_group_conversions("address", &types).is_err());

        let from_sequence = ElementMetadata::new()
            .cascade()
            .convert_group("Ordered", "A");
        assert!(from_sequence.check_group_conversions("address", &types).is_err());

        let fine = ElementMetadata::new().cascade().convert_group("Basic", "A");
        assert!(fine.check_group_conversions("address", &types).is_ok());
        assert_eq!(fine.converted_group(&TypeName::new("Basic")), TypeName::new("A"));
        assert_eq!(fine.converted_group(&TypeName::new("Other")), TypeName::new("Other"));
    }
}
