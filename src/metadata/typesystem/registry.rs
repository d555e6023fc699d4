//! Central registry of type descriptors.
//!
//! The [`TypeRegistry`] stores every [`TypeDescriptor`] known to a validator factory and
//! resolves the supertype graph of a type. Descriptors are kept in a [`DashMap`] keyed by
//! [`TypeName`]; an append-only [`boxcar::Vec`] remembers the registration order so that bulk
//! operations such as warming up the metadata cache are deterministic.
//!
//! # Hierarchy Order
//!
//! [`TypeRegistry::hierarchy`] returns the type itself, then its superclass chain, then every
//! interface reachable from any of those classes. Each type appears exactly once, even when an
//! interface is reachable through several paths (diamonds). Interfaces are collected depth first
//! in declaration order, starting from the most derived class.
//!
//! # Thread Safety
//!
//! All operations take `&self` and may be called concurrently. Re-registering a type replaces
//! its descriptor; metadata that has already been built from the old descriptor is not
//! affected.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashSet;

use crate::{
    metadata::typesystem::{TypeBuilder, TypeDescriptor, TypeKind, TypeName},
    Error, Result,
};

/// Concurrent store of type descriptors.
pub struct TypeRegistry {
    types: DashMap<TypeName, Arc<TypeDescriptor>>,
    order: boxcar::Vec<TypeName>,
}

impl TypeRegistry {
    /// Creates a registry containing only the `Default` group.
    #[must_use]
    pub fn new() -> Self {
        let registry = TypeRegistry {
            types: DashMap::new(),
            order: boxcar::Vec::new(),
        };

        registry.register(TypeDescriptor {
            name: TypeName::default_group(),
            kind: TypeKind::Interface,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            constraints: Vec::new(),
            group_sequence: None,
            sequence_provider: None,
        });
        registry
    }

    /// Registers a descriptor, replacing any previous descriptor of the same name.
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        let previous = self
            .types
            .insert(descriptor.name.clone(), descriptor.clone());
        if previous.is_none() {
            self.order.push(descriptor.name.clone());
        }
        descriptor
    }

    /// Builds and registers a descriptor.
    ///
    /// # Errors
    ///
    /// Returns the builder's error if the descriptor is inconsistent.
    pub fn define(&self, builder: TypeBuilder) -> Result<Arc<TypeDescriptor>> {
        Ok(self.register(builder.build()?))
    }

    /// Looks up a descriptor.
    #[must_use]
    pub fn get(&self, name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Looks up a descriptor that has to exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if `name` is not registered.
    pub fn resolve(&self, name: &TypeName) -> Result<Arc<TypeDescriptor>> {
        self.get(name)
            .ok_or_else(|| Error::TypeNotFound(name.clone()))
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types, including the `Default` group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing but the `Default` group is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// All registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<TypeName> {
        self.order.iter().map(|(_, name)| name.clone()).collect()
    }

    /// Returns `true` if `name` is an interface standing for a group sequence.
    #[must_use]
    pub fn is_group_sequence(&self, name: &TypeName) -> bool {
        self.get(name).is_some_and(|d| d.is_group_sequence())
    }

    /// The type itself followed by its superclass chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] for unregistered types and
    /// [`Error::CyclicTypeHierarchy`] if the superclass chain loops.
    pub fn class_hierarchy(&self, name: &TypeName) -> Result<Vec<TypeName>> {
        let mut chain = vec![name.clone()];
        let mut current = self.resolve(name)?;

        while let Some(superclass) = current.superclass.clone() {
            if chain.contains(&superclass) {
                return Err(Error::CyclicTypeHierarchy {
                    type_name: superclass,
                });
            }
            current = self.resolve(&superclass)?;
            chain.push(superclass);
        }

        Ok(chain)
    }

    /// The complete supertype graph of `name`, see the module documentation for the order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if a supertype is not registered and
    /// [`Error::CyclicTypeHierarchy`] if a type reaches itself.
    pub fn hierarchy(&self, name: &TypeName) -> Result<Vec<TypeName>> {
        self.check_acyclic(name)?;

        let classes = self.class_hierarchy(name)?;
        let mut visited: FxHashSet<TypeName> = classes.iter().cloned().collect();
        let mut hierarchy = classes.clone();

        for class in &classes {
            let descriptor = self.resolve(class)?;
            for interface in &descriptor.interfaces {
                self.collect_interfaces(interface, &mut visited, &mut hierarchy)?;
            }
        }

        Ok(hierarchy)
    }

    /// The interfaces implemented by `name` itself, including everything they extend, but
    /// excluding interfaces only reached through the superclass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if an interface is not registered.
    pub fn directly_implemented_interfaces(&self, name: &TypeName) -> Result<Vec<TypeName>> {
        let descriptor = self.resolve(name)?;
        let mut visited = FxHashSet::default();
        visited.insert(name.clone());
        let mut interfaces = Vec::new();

        for interface in &descriptor.interfaces {
            self.collect_interfaces(interface, &mut visited, &mut interfaces)?;
        }

        Ok(interfaces)
    }

    /// Every interface `name` extends, transitively, excluding `name` itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if an interface is not registered.
    pub fn super_interfaces(&self, name: &TypeName) -> Result<Vec<TypeName>> {
        self.directly_implemented_interfaces(name)
    }

    /// Returns `true` if a value of type `sub` can be assigned to `sup`, i.e. `sub` equals `sup`
    /// or has it among its supertypes.
    ///
    /// # Errors
    ///
    /// Propagates hierarchy resolution errors of `sub`.
    pub fn is_assignable(&self, sup: &TypeName, sub: &TypeName) -> Result<bool> {
        if sup == sub {
            return Ok(true);
        }
        Ok(self.hierarchy(sub)?.contains(sup))
    }

    fn collect_interfaces(
        &self,
        name: &TypeName,
        visited: &mut FxHashSet<TypeName>,
        out: &mut Vec<TypeName>,
    ) -> Result<()> {
        if !visited.insert(name.clone()) {
            return Ok(());
        }
        out.push(name.clone());

        let descriptor = self.resolve(name)?;
        for interface in &descriptor.interfaces {
            self.collect_interfaces(interface, visited, out)?;
        }
        Ok(())
    }

    fn check_acyclic(&self, name: &TypeName) -> Result<()> {
        let mut visited = FxHashSet::default();
        let mut visiting = FxHashSet::default();
        self.check_supertype_cycle(name, &mut visited, &mut visiting)
    }

    fn check_supertype_cycle(
        &self,
        name: &TypeName,
        visited: &mut FxHashSet<TypeName>,
        visiting: &mut FxHashSet<TypeName>,
    ) -> Result<()> {
        if visited.contains(name) {
            return Ok(());
        }

        if visiting.contains(name) {
            return Err(Error::CyclicTypeHierarchy {
                type_name: name.clone(),
            });
        }

        visiting.insert(name.clone());

        let descriptor = self.resolve(name)?;
        for supertype in descriptor.supertypes() {
            self.check_supertype_cycle(supertype, visited, visiting)?;
        }

        visiting.remove(name);
        visited.insert(name.clone());

        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.define(TypeBuilder::interface("Top")).unwrap();
        registry
            .define(TypeBuilder::interface("Left").implements("Top"))
            .unwrap();
        registry
            .define(TypeBuilder::interface("Right").implements("Top"))
            .unwrap();
        registry
            .define(TypeBuilder::class("Base").implements("Left"))
            .unwrap();
        registry
            .define(TypeBuilder::class("Derived").extends("Base").implements("Right"))
            .unwrap();
        registry
    }

    #[test]
    fn test_hierarchy_order_and_diamond() {
        let registry = registry();
        let hierarchy = registry.hierarchy(&TypeName::new("Derived")).unwrap();
        let names: Vec<_> = hierarchy.iter().map(TypeName::as_str).collect();
        assert_eq!(names, ["Derived", "Base", "Right", "Top", "Left"]);
    }

    #[test]
    fn test_direct_interfaces() {
        let registry = registry();
        let direct = registry
            .directly_implemented_interfaces(&TypeName::new("Derived"))
            .unwrap();
        assert_eq!(direct, vec![TypeName::new("Right"), TypeName::new("Top")]);
    }

    #[test]
    fn test_assignability() {
        let registry = registry();
        let derived = TypeName::new("Derived");
        assert!(registry.is_assignable(&TypeName::new("Left"), &derived).unwrap());
        assert!(registry.is_assignable(&derived, &derived).unwrap());
        assert!(!registry
            .is_assignable(&derived, &TypeName::new("Base"))
            .unwrap());
    }

    #[test]
    fn test_cycle_detection() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeBuilder::interface("A").implements("B"))
            .unwrap();
        registry
            .define(TypeBuilder::interface("B").implements("A"))
            .unwrap();

        let result = registry.hierarchy(&TypeName::new("A"));
        assert!(matches!(result, Err(Error::CyclicTypeHierarchy { .. })));
    }

    #[test]
    fn test_unknown_supertype() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeBuilder::class("Orphan").extends("Missing"))
            .unwrap();

        let result = registry.hierarchy(&TypeName::new("Orphan"));
        assert!(matches!(result, Err(Error::TypeNotFound(name)) if name.as_str() == "Missing"));
    }

    #[test]
    fn test_registration_order() {
        let registry = registry();
        let names = registry.names();
        assert!(names[0].is_default_group());
        assert_eq!(names.len(), 6);

        registry.define(TypeBuilder::interface("Top")).unwrap();
        assert_eq!(registry.names().len(), 6);
    }
}
