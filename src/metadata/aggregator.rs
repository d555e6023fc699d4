//! Hierarchy aggregation of validation metadata.
//!
//! [`BeanMetadataBuilder`] turns the [`TypeDescriptor`]s of a type and all of its supertypes
//! into one [`BeanMetadata`].
//!
//! # Algorithm
//!
//! 1. Resolve the supertype graph with [`TypeRegistry::hierarchy`]; every type is visited once,
//!    also when it is reachable through several paths.
//! 2. Resolve the redefined default group sequence of the type itself. Sequences are not
//!    inherited.
//! 3. Collect class level constraints, then merge fields and getters into properties by name.
//! 4. Group all non static method declarations by [`ExecutableSignature`], skipping private
//!    methods of supertypes, and check every pair of declarations with the method configuration
//!    rules before merging them into one [`ExecutableMetadata`].
//! 5. Constructors are taken from the type itself only; they never override one another.
//!
//! Every constraint becomes a [`MetaConstraint`] with an identity unique within the resulting
//! metadata, which the validation engine uses to track processed constraints.

use std::{collections::BTreeMap, sync::Arc};

use rustc_hash::FxHashMap;

use crate::{
    groups::ValidationOrderGenerator,
    metadata::{
        bean::{valid_default_sequence, BeanMetadata, DefaultGroupSequence, PropertyMetadata},
        constraint::ConstraintDeclaration,
        element::{ContainerElementKind, ElementMetadata},
        executable::{ExecutableMetadata, ParameterMetadata},
        metaconstraint::{ConstraintLocation, MetaConstraint},
        rules::{check_declarations, MethodConfigurationRule},
        typesystem::{ExecutableDescriptor, ExecutableSignature, TypeDescriptor, TypeName, TypeRegistry},
    },
    Error, Result,
};

/// Builds the [`BeanMetadata`] of one type.
pub(crate) struct BeanMetadataBuilder<'a> {
    types: &'a TypeRegistry,
    generator: &'a ValidationOrderGenerator,
    rules: &'a [Box<dyn MethodConfigurationRule>],
    bean_type: TypeName,
    next_id: usize,
}

impl<'a> BeanMetadataBuilder<'a> {
    pub(crate) fn new(
        types: &'a TypeRegistry,
        generator: &'a ValidationOrderGenerator,
        rules: &'a [Box<dyn MethodConfigurationRule>],
        bean_type: TypeName,
    ) -> Self {
        BeanMetadataBuilder {
            types,
            generator,
            rules,
            bean_type,
            next_id: 0,
        }
    }

    pub(crate) fn build(mut self) -> Result<BeanMetadata> {
        let descriptor = self.types.resolve(&self.bean_type)?;
        let hierarchy = self.types.hierarchy(&self.bean_type)?;
        let descriptors = hierarchy
            .iter()
            .map(|name| self.types.resolve(name))
            .collect::<Result<Vec<_>>>()?;

        let default_sequence = self.default_sequence(&descriptor)?;

        let mut properties: BTreeMap<String, PropertyMetadata> = BTreeMap::new();
        let mut property_order: Vec<String> = Vec::new();
        let mut class_constraints = Vec::new();
        let mut meta_constraints = Vec::new();
        let mut signatures: Vec<ExecutableSignature> = Vec::new();
        let mut declarations: FxHashMap<ExecutableSignature, Vec<&ExecutableDescriptor>> =
            FxHashMap::default();

        for current in &descriptors {
            for constraint in &current.constraints {
                let meta =
                    self.meta_constraint(constraint, ConstraintLocation::Bean, None, current);
                class_constraints.push(meta.clone());
                meta_constraints.push(meta);
            }

            for field in &current.fields {
                field
                    .element
                    .check_group_conversions(&format!("{}.{}", current.name, field.name), self.types)?;
                let added =
                    self.add_property(&mut properties, &field.name, &field.element, current)?;
                if added {
                    property_order.push(field.name.clone());
                }
            }

            for method in &current.methods {
                if method.is_static || (method.private && current.name != self.bean_type) {
                    continue;
                }

                if let Some(property) = method.property_name() {
                    let added = self.add_property(
                        &mut properties,
                        &property,
                        &method.return_value,
                        current,
                    )?;
                    if added {
                        property_order.push(property);
                    }
                }

                let signature = method.signature();
                declarations
                    .entry(signature.clone())
                    .or_insert_with(|| {
                        signatures.push(signature);
                        Vec::new()
                    })
                    .push(method);
            }
        }

        for property in properties.values() {
            meta_constraints.extend(property.constraints.iter().cloned());
        }
        let cascaded_properties = property_order
            .into_iter()
            .filter(|name| properties.get(name).is_some_and(PropertyMetadata::is_cascading))
            .collect();

        let mut direct_types = vec![self.bean_type.clone()];
        direct_types.extend(self.types.directly_implemented_interfaces(&self.bean_type)?);
        let direct_meta_constraints = meta_constraints
            .iter()
            .filter(|m| direct_types.contains(m.declaring_type()))
            .cloned()
            .collect();

        let mut methods = FxHashMap::default();
        for signature in signatures {
            let Some(methods_of_signature) = declarations.get(&signature) else {
                continue;
            };
            check_declarations(methods_of_signature, self.rules, self.types)?;
            let merged = self.merge_executable(signature.clone(), methods_of_signature)?;
            methods.insert(signature, Arc::new(merged));
        }

        let mut constructors = FxHashMap::default();
        if !descriptor.is_interface() {
            for constructor in &descriptor.constructors {
                check_declarations(&[constructor], self.rules, self.types)?;
                let signature = constructor.signature();
                let merged = self.merge_executable(signature.clone(), &[constructor])?;
                constructors.insert(signature, Arc::new(merged));
            }
        }

        Ok(BeanMetadata {
            bean_type: self.bean_type,
            is_interface: descriptor.is_interface(),
            hierarchy,
            properties,
            cascaded_properties,
            class_constraints,
            meta_constraints,
            direct_meta_constraints,
            methods,
            constructors,
            default_sequence,
        })
    }

    fn default_sequence(&self, descriptor: &TypeDescriptor) -> Result<DefaultGroupSequence> {
        // an interface's sequence defines a group sequence, not a default group redefinition
        if descriptor.is_interface() {
            return Ok(DefaultGroupSequence::Default);
        }

        match (&descriptor.group_sequence, &descriptor.sequence_provider) {
            (Some(_), Some(_)) => Err(Error::SequenceAndProvider {
                bean: descriptor.name.clone(),
            }),
            (Some(sequence), None) => {
                let sequence = valid_default_sequence(&descriptor.name, Some(sequence.clone()))?;
                if sequence.len() == 1 {
                    return Ok(DefaultGroupSequence::Default);
                }
                let order = self
                    .generator
                    .default_validation_order(&descriptor.name, &sequence)?;
                Ok(DefaultGroupSequence::Static { sequence, order })
            }
            (None, Some(provider)) => {
                if let Some(bound) = provider.bound_type() {
                    if !self.types.is_assignable(&bound, &descriptor.name)? {
                        return Err(Error::ProviderTypeMismatch {
                            bean: descriptor.name.clone(),
                            provider_type: bound,
                        });
                    }
                }
                Ok(DefaultGroupSequence::Provider(provider.clone()))
            }
            (None, None) => Ok(DefaultGroupSequence::Default),
        }
    }

    /// Merges `element` into the property `name`; returns `true` if the property is new.
    ///
    /// A field and a getter of the same property, or redeclarations down the hierarchy, must not
    /// convert one group to different targets.
    fn add_property(
        &mut self,
        properties: &mut BTreeMap<String, PropertyMetadata>,
        name: &str,
        element: &ElementMetadata,
        declaring: &TypeDescriptor,
    ) -> Result<bool> {
        let constraints = self.element_constraints(
            element,
            &ConstraintLocation::Property(name.to_string()),
            &declaring.name,
            declaring.is_interface(),
        );

        match properties.get_mut(name) {
            Some(property) => {
                property
                    .element
                    .merge(element, &format!("{}.{}", declaring.name, name))?;
                property.constraints.extend(constraints);
                Ok(false)
            }
            None => {
                properties.insert(
                    name.to_string(),
                    PropertyMetadata {
                        name: name.to_string(),
                        element: element.clone(),
                        constraints,
                    },
                );
                Ok(true)
            }
        }
    }

    fn merge_executable(
        &mut self,
        signature: ExecutableSignature,
        declarations: &[&ExecutableDescriptor],
    ) -> Result<ExecutableMetadata> {
        let Some(first) = declarations.first() else {
            return Err(definition_error!("executable '{}' has no declaration", signature));
        };

        let mut parameters = Vec::with_capacity(first.parameters.len());
        for (index, parameter) in first.parameters.iter().enumerate() {
            let mut element = ElementMetadata::new();
            let mut constraints: Vec<Arc<MetaConstraint>> = Vec::new();

            for declaration in declarations {
                let Some(declared) = declaration.parameters.get(index) else {
                    continue;
                };
                declared.element.check_group_conversions(
                    &format!("{}.{}.{}", declaration.declaring_type, signature, declared.name),
                    self.types,
                )?;
                element.merge(
                    &declared.element,
                    &format!("{}.{}.{}", declaration.declaring_type, signature, declared.name),
                )?;
                let declared_constraints = self.element_constraints(
                    &declared.element,
                    &ConstraintLocation::Parameter(index),
                    &declaration.declaring_type,
                    self.is_interface(&declaration.declaring_type),
                );
                merge_unique(&mut constraints, declared_constraints);
            }

            parameters.push(ParameterMetadata {
                index,
                name: parameter.name.clone(),
                type_name: parameter.type_name.clone(),
                element,
                constraints,
            });
        }

        let mut return_value = ElementMetadata::new();
        let mut return_constraints = Vec::new();
        let mut cross_parameter = Vec::new();
        for declaration in declarations {
            declaration.return_value.check_group_conversions(
                &format!("{}.{}.<return value>", declaration.declaring_type, signature),
                self.types,
            )?;
            return_value.merge(
                &declaration.return_value,
                &format!("{}.{}.<return value>", declaration.declaring_type, signature),
            )?;

            let on_interface = self.is_interface(&declaration.declaring_type);
            let declared = self.element_constraints(
                &declaration.return_value,
                &ConstraintLocation::ReturnValue,
                &declaration.declaring_type,
                on_interface,
            );
            merge_unique(&mut return_constraints, declared);

            let declared = declaration
                .cross_parameter
                .iter()
                .map(|c| {
                    self.new_meta(
                        c,
                        ConstraintLocation::CrossParameter,
                        None,
                        &declaration.declaring_type,
                        on_interface,
                    )
                })
                .collect();
            merge_unique(&mut cross_parameter, declared);
        }

        Ok(ExecutableMetadata {
            signature,
            kind: first.kind,
            return_type: first.return_type.clone(),
            parameters,
            return_value,
            return_constraints,
            cross_parameter,
            declaring_types: declarations
                .iter()
                .map(|d| d.declaring_type.clone())
                .collect(),
        })
    }

    fn element_constraints(
        &mut self,
        element: &ElementMetadata,
        location: &ConstraintLocation,
        declaring_type: &TypeName,
        on_interface: bool,
    ) -> Vec<Arc<MetaConstraint>> {
        let mut constraints = Vec::new();
        for constraint in element.constraints() {
            constraints.push(self.new_meta(
                constraint,
                location.clone(),
                None,
                declaring_type,
                on_interface,
            ));
        }
        for container in element.container_elements() {
            for constraint in &container.constraints {
                constraints.push(self.new_meta(
                    constraint,
                    location.clone(),
                    Some(container.kind),
                    declaring_type,
                    on_interface,
                ));
            }
        }
        constraints
    }

    fn meta_constraint(
        &mut self,
        declaration: &Arc<ConstraintDeclaration>,
        location: ConstraintLocation,
        container: Option<ContainerElementKind>,
        declaring: &TypeDescriptor,
    ) -> Arc<MetaConstraint> {
        self.new_meta(
            declaration,
            location,
            container,
            &declaring.name,
            declaring.is_interface(),
        )
    }

    fn new_meta(
        &mut self,
        declaration: &Arc<ConstraintDeclaration>,
        location: ConstraintLocation,
        container: Option<ContainerElementKind>,
        declaring_type: &TypeName,
        on_interface: bool,
    ) -> Arc<MetaConstraint> {
        let id = self.next_id;
        self.next_id += 1;
        Arc::new(MetaConstraint::new(
            id,
            declaration.clone(),
            location,
            container,
            declaring_type.clone(),
            on_interface,
            &self.bean_type,
        ))
    }

    fn is_interface(&self, name: &TypeName) -> bool {
        self.types.get(name).is_some_and(|d| d.is_interface())
    }
}

/// Appends the constraints of `added` that are not already present with an equal declaration
/// on the same container element.
fn merge_unique(target: &mut Vec<Arc<MetaConstraint>>, added: Vec<Arc<MetaConstraint>>) {
    for constraint in added {
        let duplicate = target.iter().any(|existing| {
            existing.container() == constraint.container()
                && existing.declaration() == constraint.declaration()
        });
        if !duplicate {
            target.push(constraint);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::{
        element::ContainerElementMetadata,
        rules::{rules_for, MethodValidationConfig},
        typesystem::{ExecutableBuilder, TypeBuilder},
    };

    fn not_null() -> ConstraintDeclaration {
        ConstraintDeclaration::new("NotNull")
    }

    fn build(types: TypeRegistry, bean: &str) -> Result<BeanMetadata> {
        let types = Arc::new(types);
        let generator = ValidationOrderGenerator::new(types.clone());
        let rules = rules_for(&MethodValidationConfig::default());
        BeanMetadataBuilder::new(&types, &generator, &rules, TypeName::new(bean)).build()
    }

    #[test]
    fn test_properties_are_merged_across_hierarchy() {
        let types = TypeRegistry::new();
        types
            .define(TypeBuilder::interface("Named").getter(
                "name",
                "String",
                ElementMetadata::new().constraint(not_null()),
            ))
            .unwrap();
        types
            .define(
                TypeBuilder::class("Person")
                    .implements("Named")
                    .field(
                        "name",
                        ElementMetadata::new()
                            .constraint(ConstraintDeclaration::new("Size").attribute("max", 10)),
                    )
                    .field(
                        "nicknames",
                        ElementMetadata::new().container_element(
                            ContainerElementMetadata::new(ContainerElementKind::ListElement)
                                .constraint(ConstraintDeclaration::new("NotBlank")),
                        ),
                    ),
            )
            .unwrap();

        let meta = build(types, "Person").unwrap();
        let name = meta.property("name").unwrap();
        assert_eq!(name.constraints.len(), 2);
        assert_eq!(meta.meta_constraints().len(), 3);
        // the Named constraint is declared by an interface Person implements directly
        assert_eq!(meta.direct_meta_constraints().len(), 3);

        let nicknames = meta.property("nicknames").unwrap();
        assert_eq!(
            nicknames.constraints[0].container(),
            Some(ContainerElementKind::ListElement)
        );

        let ids: Vec<usize> = meta.meta_constraints().iter().map(|m| m.id()).collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_direct_constraints_exclude_superclass() {
        let types = TypeRegistry::new();
        types
            .define(TypeBuilder::class("Vehicle").field(
                "wheels",
                ElementMetadata::new().constraint(ConstraintDeclaration::new("Min").attribute("value", 2)),
            ))
            .unwrap();
        types
            .define(
                TypeBuilder::class("Car")
                    .extends("Vehicle")
                    .field("plate", ElementMetadata::new().constraint(not_null())),
            )
            .unwrap();

        let meta = build(types, "Car").unwrap();
        assert_eq!(meta.meta_constraints().len(), 2);
        assert_eq!(meta.direct_meta_constraints().len(), 1);
        assert_eq!(
            meta.direct_meta_constraints()[0].declaring_type().as_str(),
            "Car"
        );
    }

    #[test]
    fn test_private_supertype_methods_are_ignored() {
        let types = TypeRegistry::new();
        types
            .define(
                TypeBuilder::class("Base").method(
                    ExecutableBuilder::method("compute")
                        .parameter("x", "int", ElementMetadata::new())
                        .private(),
                ),
            )
            .unwrap();
        types
            .define(
                TypeBuilder::class("Derived").extends("Base").method(
                    ExecutableBuilder::method("compute").parameter(
                        "x",
                        "int",
                        ElementMetadata::new().constraint(not_null()),
                    ),
                ),
            )
            .unwrap();

        let meta = build(types, "Derived").unwrap();
        let method = meta
            .method(&ExecutableSignature::new("compute", ["int"]))
            .unwrap();
        assert_eq!(method.declaring_types(), &[TypeName::new("Derived")]);
    }

    #[test]
    fn test_return_value_constraints_are_united() {
        let types = TypeRegistry::new();
        types
            .define(TypeBuilder::interface("Repository").method(
                ExecutableBuilder::method("find").returns(
                    "Order",
                    ElementMetadata::new().constraint(not_null()),
                ),
            ))
            .unwrap();
        types
            .define(
                TypeBuilder::class("OrderRepository")
                    .implements("Repository")
                    .method(ExecutableBuilder::method("find").returns(
                        "Order",
                        ElementMetadata::new()
                            .constraint(not_null())
                            .constraint(ConstraintDeclaration::new("ValidOrder")),
                    )),
            )
            .unwrap();

        let meta = build(types, "OrderRepository").unwrap();
        let find = meta.method(&ExecutableSignature::new("find", Vec::<TypeName>::new())).unwrap();
        // NotNull is declared twice but evaluated once
        assert_eq!(find.return_value_constraints().len(), 2);
    }

    #[test]
    fn test_sequence_and_provider() {
        let types = TypeRegistry::new();
        types.define(TypeBuilder::group("Extra")).unwrap();
        let provider: Arc<dyn crate::groups::DefaultGroupSequenceProvider> =
            Arc::new(|ty: &TypeName, _: Option<&crate::engine::BeanRef>| Some(vec![ty.clone()]));
        types
            .define(
                TypeBuilder::class("Both")
                    .group_sequence(["Both", "Extra"])
                    .sequence_provider(provider),
            )
            .unwrap();

        assert!(matches!(
            build(types, "Both"),
            Err(Error::SequenceAndProvider { .. })
        ));
    }

    #[test]
    fn test_static_default_sequence() {
        let types = TypeRegistry::new();
        types.define(TypeBuilder::group("Extra")).unwrap();
        types
            .define(TypeBuilder::class("Ordered").group_sequence(["Ordered", "Extra"]))
            .unwrap();
        types
            .define(TypeBuilder::class("Plain").group_sequence(["Plain"]))
            .unwrap();
        types
            .define(TypeBuilder::class("Broken").group_sequence(["Extra"]))
            .unwrap();

        let types = Arc::new(types);
        let generator = ValidationOrderGenerator::new(types.clone());
        let rules = rules_for(&MethodValidationConfig::default());
        let build = |name: &str| {
            BeanMetadataBuilder::new(&types, &generator, &rules, TypeName::new(name)).build()
        };

        let ordered = build("Ordered").unwrap();
        assert!(ordered.is_default_group_sequence_redefined());
        assert_eq!(
            ordered.default_group_sequence(None).unwrap(),
            vec![TypeName::default_group(), TypeName::new("Extra")]
        );

        assert!(!build("Plain").unwrap().is_default_group_sequence_redefined());
        assert!(matches!(
            build("Broken"),
            Err(Error::BeanTypeMissingFromSequence { .. })
        ));
    }

    #[test]
    fn test_invalid_group_conversion() {
        let types = TypeRegistry::new();
        types
            .define(TypeBuilder::class("Order").field(
                "customer",
                ElementMetadata::new().convert_group(TypeName::default_group(), "Basic"),
            ))
            .unwrap();

        assert!(matches!(
            build(types, "Order"),
            Err(Error::InvalidGroupConversion { .. })
        ));
    }

    #[test]
    fn test_conflicting_conversions_across_hierarchy() {
        let types = TypeRegistry::new();
        types.define(TypeBuilder::group("A")).unwrap();
        types.define(TypeBuilder::group("B")).unwrap();
        types
            .define(TypeBuilder::class("Base").field(
                "item",
                ElementMetadata::new()
                    .cascade()
                    .convert_group(TypeName::default_group(), "A"),
            ))
            .unwrap();
        types
            .define(TypeBuilder::class("Sub").extends("Base").getter(
                "item",
                "Item",
                ElementMetadata::new()
                    .cascade()
                    .convert_group(TypeName::default_group(), "B"),
            ))
            .unwrap();
        types
            .define(TypeBuilder::class("Same").extends("Base").getter(
                "item",
                "Item",
                ElementMetadata::new()
                    .cascade()
                    .convert_group(TypeName::default_group(), "A"),
            ))
            .unwrap();

        let types = Arc::new(types);
        let generator = ValidationOrderGenerator::new(types.clone());
        let rules = rules_for(&MethodValidationConfig::default());
        let build = |name: &str| {
            BeanMetadataBuilder::new(&types, &generator, &rules, TypeName::new(name)).build()
        };

        match build("Sub") {
            Err(Error::InvalidGroupConversion { element, message }) => {
                assert_eq!(element, "Base.item");
                assert!(message.contains("converted to both"));
            }
            other => panic!("expected a conversion error, got {other:?}"),
        }

        let same = build("Same").unwrap();
        let item = same.property("item").unwrap();
        assert_eq!(item.element.group_conversions().len(), 1);
    }

    struct BoundProvider(&'static str);

    impl crate::groups::DefaultGroupSequenceProvider for BoundProvider {
        fn validation_groups(
            &self,
            bean_type: &TypeName,
            _: Option<&crate::engine::BeanRef>,
        ) -> Option<Vec<TypeName>> {
            Some(vec![bean_type.clone()])
        }

        fn bound_type(&self) -> Option<TypeName> {
            Some(TypeName::new(self.0))
        }
    }

    #[test]
    fn test_provider_bound_to_unrelated_type() {
        let types = TypeRegistry::new();
        types.define(TypeBuilder::class("Unrelated")).unwrap();
        types
            .define(
                TypeBuilder::class("Order").sequence_provider(Arc::new(BoundProvider("Unrelated"))),
            )
            .unwrap();
        types
            .define(
                TypeBuilder::class("Invoice").sequence_provider(Arc::new(BoundProvider("Invoice"))),
            )
            .unwrap();

        let types = Arc::new(types);
        let generator = ValidationOrderGenerator::new(types.clone());
        let rules = rules_for(&MethodValidationConfig::default());
        let build = |name: &str| {
            BeanMetadataBuilder::new(&types, &generator, &rules, TypeName::new(name)).build()
        };

        match build("Order") {
            Err(Error::ProviderTypeMismatch { bean, provider_type }) => {
                assert_eq!(bean, TypeName::new("Order"));
                assert_eq!(provider_type, TypeName::new("Unrelated"));
            }
            other => panic!("expected a provider type mismatch, got {other:?}"),
        }
        assert!(build("Invoice").unwrap().is_default_group_sequence_redefined());
    }

    #[test]
    fn test_constructors_come_from_the_type_itself() {
        let types = TypeRegistry::new();
        types
            .define(
                TypeBuilder::class("Base").constructor(
                    ExecutableBuilder::constructor().parameter("id", "String", ElementMetadata::new()),
                ),
            )
            .unwrap();
        types
            .define(TypeBuilder::class("Derived").extends("Base").constructor(
                ExecutableBuilder::constructor().parameter(
                    "id",
                    "String",
                    ElementMetadata::new().constraint(not_null()),
                ),
            ))
            .unwrap();

        let meta = build(types, "Derived").unwrap();
        assert_eq!(meta.constructors().count(), 1);
        let constructor = meta
            .constructor(&ExecutableSignature::new("Derived", ["String"]))
            .unwrap();
        assert_eq!(constructor.parameters()[0].constraints.len(), 1);
    }
}
