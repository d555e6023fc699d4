//! Per-call validation state.
//!
//! A [`ValidationContext`] lives for exactly one call of a [`crate::Validator`] operation. It
//! collects violations and remembers which beans, paths and constraints have already been
//! processed, which is what terminates cascaded validation of cyclic object graphs.
//!
//! Beans are identified by the address of their shared handle. Every visited handle is retained
//! until the call ends, so an address can not be reused by another bean while the call runs.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    engine::{
        bean_id, path::PropertyPath, violation::ConstraintViolation, BeanRef, ValidatorConfig,
        Value,
    },
    groups::{ValidationOrder, ValidationOrderGenerator},
    metadata::{
        bean::BeanMetadata, constraint::ConstraintDeclaration, metaconstraint::MetaConstraint,
        typesystem::TypeName,
    },
    Result,
};

/// Identity used to de-duplicate violations.
type ViolationKey = (String, String, String, usize);

/// The redefined default group sequence of one bean and its validation order.
pub(crate) struct DefaultOrder {
    pub(crate) sequence: Vec<TypeName>,
    pub(crate) order: ValidationOrder,
}

/// The bean currently validated, with its metadata and location.
#[derive(Clone)]
pub(crate) struct BeanContext {
    pub(crate) bean: Option<BeanRef>,
    pub(crate) metadata: Arc<BeanMetadata>,
    pub(crate) path: PropertyPath,
    /// Property value supplied by the caller instead of a bean
    pub(crate) fixed: Option<(String, Value)>,
    /// Restricts validation to the constraints of one property, without cascading
    pub(crate) only: Option<String>,
}

impl BeanContext {
    pub(crate) fn new(bean: Option<BeanRef>, metadata: Arc<BeanMetadata>, path: PropertyPath) -> Self {
        BeanContext {
            bean,
            metadata,
            path,
            fixed: None,
            only: None,
        }
    }

    /// Restricts validation to `property`, read from `value` when given.
    pub(crate) fn restricted_to(mut self, property: &str, value: Option<Value>) -> Self {
        self.only = Some(property.to_string());
        self.fixed = value.map(|value| (property.to_string(), value));
        self
    }

    pub(crate) fn id(&self) -> usize {
        self.bean.as_ref().map_or(0, bean_id)
    }

    /// The bean as value, for class level constraints.
    pub(crate) fn as_value(&self) -> Value {
        self.bean.clone().map_or(Value::Null, Value::Bean)
    }

    /// The current value of property `name`; unknown properties read as null.
    pub(crate) fn property(&self, name: &str) -> Value {
        if let Some((fixed, value)) = &self.fixed {
            if fixed == name {
                return value.clone();
            }
        }
        self.bean
            .as_ref()
            .and_then(|bean| bean.property(name))
            .unwrap_or_default()
    }
}

/// State of one validation call.
pub(crate) struct ValidationContext {
    root_bean: Option<BeanRef>,
    root_bean_type: TypeName,
    executable_parameters: Option<Vec<Value>>,
    executable_return_value: Option<Value>,
    fail_fast: bool,
    track_processed: bool,
    violations: Vec<ConstraintViolation>,
    seen: FxHashSet<ViolationKey>,
    processed_groups: FxHashSet<(usize, TypeName)>,
    processed_paths: FxHashMap<usize, Vec<PropertyPath>>,
    processed_constraints: FxHashSet<(usize, PropertyPath, usize)>,
    retained: Vec<BeanRef>,
    cascade_path: Vec<usize>,
    default_orders: FxHashMap<(usize, TypeName), Arc<DefaultOrder>>,
}

impl ValidationContext {
    pub(crate) fn new(
        root_bean: Option<BeanRef>,
        root_bean_type: TypeName,
        config: &ValidatorConfig,
    ) -> Self {
        let mut retained = Vec::new();
        let mut cascade_path = Vec::new();
        if let Some(root) = &root_bean {
            retained.push(root.clone());
            cascade_path.push(bean_id(root));
        }

        ValidationContext {
            root_bean,
            root_bean_type,
            executable_parameters: None,
            executable_return_value: None,
            fail_fast: config.fail_fast,
            track_processed: config.track_processed_beans,
            violations: Vec::new(),
            seen: FxHashSet::default(),
            processed_groups: FxHashSet::default(),
            processed_paths: FxHashMap::default(),
            processed_constraints: FxHashSet::default(),
            retained,
            cascade_path,
            default_orders: FxHashMap::default(),
        }
    }

    pub(crate) fn with_parameters(mut self, parameters: &[Value]) -> Self {
        self.executable_parameters = Some(parameters.to_vec());
        self
    }

    pub(crate) fn with_return_value(mut self, value: &Value) -> Self {
        self.executable_return_value = Some(value.clone());
        self
    }

    pub(crate) fn root_bean_type(&self) -> &TypeName {
        &self.root_bean_type
    }

    pub(crate) fn should_fail_fast(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    pub(crate) fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Records a violation unless an identical one has been reported already.
    pub(crate) fn report(
        &mut self,
        constraint: &Arc<ConstraintDeclaration>,
        message_template: String,
        message: String,
        path: &PropertyPath,
        value: &Value,
        leaf_bean: Option<&BeanRef>,
    ) {
        let key = (
            path.to_string(),
            message.clone(),
            constraint.to_string(),
            leaf_bean.map_or(0, bean_id),
        );
        if !self.seen.insert(key) {
            return;
        }

        self.violations.push(ConstraintViolation {
            message,
            message_template,
            property_path: path.clone(),
            constraint: constraint.clone(),
            invalid_value: value.clone(),
            root_bean: self.root_bean.clone(),
            root_bean_type: self.root_bean_type.clone(),
            leaf_bean: leaf_bean.cloned(),
            executable_parameters: self.executable_parameters.clone(),
            executable_return_value: self.executable_return_value.clone(),
        });
    }

    /// Keeps `bean` alive until the call ends.
    pub(crate) fn retain(&mut self, bean: &BeanRef) {
        self.retained.push(bean.clone());
    }

    /// Pushes `bean` onto the chain of beans being cascaded into. Returns `false`, leaving the
    /// chain untouched, if processed beans are not tracked and `bean` is already on the chain.
    ///
    /// Every successful call must be paired with [`Self::leave_cascade`].
    pub(crate) fn enter_cascade(&mut self, bean: &BeanRef) -> bool {
        let id = bean_id(bean);
        if !self.track_processed && self.cascade_path.contains(&id) {
            return false;
        }
        self.cascade_path.push(id);
        true
    }

    pub(crate) fn leave_cascade(&mut self) {
        self.cascade_path.pop();
    }

    /// Remembers that `bean` has been validated for `group` at its path.
    pub(crate) fn mark_processed(&mut self, bean: &BeanContext, group: &TypeName) {
        if !self.track_processed {
            return;
        }
        let id = bean.id();
        self.processed_groups.insert((id, group.clone()));
        let paths = self.processed_paths.entry(id).or_default();
        if !paths.contains(&bean.path) {
            paths.push(bean.path.clone());
        }
    }

    /// Returns `true` if `bean` has been validated for `group` at `path` or at a related path.
    pub(crate) fn is_bean_already_validated(
        &self,
        bean: &BeanRef,
        group: &TypeName,
        path: &PropertyPath,
    ) -> bool {
        if !self.track_processed {
            return false;
        }
        let id = bean_id(bean);
        if !self.processed_groups.contains(&(id, group.clone())) {
            return false;
        }
        self.processed_paths.get(&id).is_some_and(|paths| {
            paths.iter().any(|processed| {
                path.is_root()
                    || processed.is_root()
                    || path.is_sub_path_of(processed)
                    || processed.is_sub_path_of(path)
            })
        })
    }

    pub(crate) fn is_constraint_processed(
        &self,
        bean: &BeanContext,
        path: &PropertyPath,
        constraint: &Arc<MetaConstraint>,
    ) -> bool {
        self.processed_constraints
            .contains(&(bean.id(), path.clone(), constraint_id(constraint)))
    }

    pub(crate) fn mark_constraint_processed(
        &mut self,
        bean: &BeanContext,
        path: &PropertyPath,
        constraint: &Arc<MetaConstraint>,
    ) {
        self.processed_constraints
            .insert((bean.id(), path.clone(), constraint_id(constraint)));
    }

    /// The redefined default group sequence of `metadata` for `bean`, computed once per call.
    pub(crate) fn default_order(
        &mut self,
        bean: Option<&BeanRef>,
        metadata: &BeanMetadata,
        generator: &ValidationOrderGenerator,
    ) -> Result<Arc<DefaultOrder>> {
        let key = (bean.map_or(0, bean_id), metadata.bean_type().clone());
        if let Some(cached) = self.default_orders.get(&key) {
            return Ok(cached.clone());
        }

        let sequence = metadata.default_group_sequence(bean)?;
        let order = if metadata.has_sequence_provider() {
            generator.default_validation_order(metadata.bean_type(), &sequence)?
        } else {
            metadata.default_validation_order(bean, generator)?
        };

        let resolved = Arc::new(DefaultOrder { sequence, order });
        self.default_orders.insert(key, resolved.clone());
        Ok(resolved)
    }

    pub(crate) fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations
    }
}

/// [`MetaConstraint::id`] is only unique within one bean metadata; the allocation is unique
/// across all of them.
fn constraint_id(constraint: &Arc<MetaConstraint>) -> usize {
    Arc::as_ptr(constraint) as usize
}
