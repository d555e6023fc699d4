//! Process-wide cache of [`BeanMetadata`].
//!
//! Metadata is built lazily the first time a type is validated and kept for the lifetime of the
//! owning [`crate::engine::ValidatorFactory`]. Entries are never invalidated; only
//! [`BeanMetadataManager::clear`], called when the factory is closed, drops them.
//!
//! # Thread Safety
//!
//! The cache maps every type to its own cell guarded by a [`Mutex`]. The first caller for a type
//! builds the metadata while holding the cell lock, concurrent callers for the same type wait for
//! that build and receive the same [`Arc`]. Callers for other types are not blocked. A failed
//! build leaves the cell empty, so the error is reported again on the next request instead of
//! being cached.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::{
    groups::ValidationOrderGenerator,
    metadata::{
        aggregator::BeanMetadataBuilder,
        bean::BeanMetadata,
        rules::{rules_for, MethodConfigurationRule, MethodValidationConfig},
        typesystem::{TypeName, TypeRegistry},
    },
    Error, Result,
};

type MetadataCell = Arc<Mutex<Option<Arc<BeanMetadata>>>>;

/// Builds and caches [`BeanMetadata`] per type.
pub struct BeanMetadataManager {
    types: Arc<TypeRegistry>,
    generator: Arc<ValidationOrderGenerator>,
    rules: Vec<Box<dyn MethodConfigurationRule>>,
    cache: DashMap<TypeName, MetadataCell>,
}

impl BeanMetadataManager {
    /// Creates an empty cache enforcing the method rules selected by `config`.
    #[must_use]
    pub fn new(
        types: Arc<TypeRegistry>,
        generator: Arc<ValidationOrderGenerator>,
        config: &MethodValidationConfig,
    ) -> Self {
        BeanMetadataManager {
            types,
            generator,
            rules: rules_for(config),
            cache: DashMap::new(),
        }
    }

    /// Returns the metadata of `bean_type`, building it on first access.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that prevented the build, or [`Error::LockError`] if a
    /// previous build for the same type panicked.
    pub fn bean_metadata(&self, bean_type: &TypeName) -> Result<Arc<BeanMetadata>> {
        let cell = self
            .cache
            .entry(bean_type.clone())
            .or_default()
            .value()
            .clone();

        let mut slot = cell.lock().map_err(|_| Error::LockError)?;
        if let Some(metadata) = slot.as_ref() {
            return Ok(metadata.clone());
        }

        let metadata = Arc::new(
            BeanMetadataBuilder::new(
                &self.types,
                &self.generator,
                &self.rules,
                bean_type.clone(),
            )
            .build()?,
        );
        tracing::debug!(
            bean = %bean_type,
            hierarchy = metadata.hierarchy().len(),
            constraints = metadata.meta_constraints().len(),
            methods = metadata.methods().count(),
            redefined_default = metadata.is_default_group_sequence_redefined(),
            "built bean metadata"
        );

        *slot = Some(metadata.clone());
        Ok(metadata)
    }

    /// Returns the metadata of `bean_type` if it has been built already.
    #[must_use]
    pub fn cached(&self, bean_type: &TypeName) -> Option<Arc<BeanMetadata>> {
        let cell = self.cache.get(bean_type)?.value().clone();
        let slot = cell.lock().ok()?;
        slot.clone()
    }

    /// Number of types with built metadata.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().lock().is_ok_and(|slot| slot.is_some()))
            .count()
    }

    /// Returns `true` if no metadata has been built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all cached metadata.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// The type registry metadata is built from.
    #[must_use]
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }
}
