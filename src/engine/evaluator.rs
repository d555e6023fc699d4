//! Constraint evaluators and their registry.
//!
//! A [`ConstraintEvaluator`] decides whether one value satisfies one constraint declaration.
//! Evaluators are looked up by constraint kind and by the [`ValueKind`] of the validated value,
//! so a constraint like `Size` can be backed by different implementations for strings, lists
//! and maps. An evaluator registered without a value kind acts as the fallback for its
//! constraint kind.
//!
//! # Thread Safety
//!
//! [`EvaluatorRegistry`] is backed by a lock-free skip list and can be extended while validators
//! are in use. Evaluators themselves must be [`Send`] and [`Sync`]; they are shared by all
//! validators of a factory.
//!
//! # Examples
//!
//! ```rust
//! use beanval::engine::{EvaluatorRegistry, ValueKind};
//! use beanval::Value;
//!
//! let registry = EvaluatorRegistry::new();
//! registry.register_fn("Even", Some(ValueKind::Int), |_, value, _| {
//!     Ok(matches!(value, Value::Int(i) if i % 2 == 0))
//! });
//!
//! assert!(registry.contains("Even", Some(ValueKind::Int)));
//! assert!(registry.lookup("Even", &Value::Int(4)).is_some());
//! assert!(registry.lookup("Even", &Value::from("4")).is_none());
//! ```

use std::{fmt, sync::Arc};

use crossbeam_skiplist::SkipMap;

use crate::{
    engine::{path::PropertyPath, BeanRef, Value, ValueKind},
    metadata::{constraint::ConstraintDeclaration, typesystem::TypeName},
    BoxError,
};

static NULL_VALUE: Value = Value::Null;

/// Information about the validated value handed to evaluators.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    root_bean_type: &'a TypeName,
    path: &'a PropertyPath,
    leaf_bean: Option<&'a BeanRef>,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context for a value at `path`.
    #[must_use]
    pub fn new(
        root_bean_type: &'a TypeName,
        path: &'a PropertyPath,
        leaf_bean: Option<&'a BeanRef>,
    ) -> Self {
        EvaluationContext {
            root_bean_type,
            path,
            leaf_bean,
        }
    }

    /// Type of the bean the validation call started at.
    #[must_use]
    pub fn root_bean_type(&self) -> &TypeName {
        self.root_bean_type
    }

    /// Location of the validated value.
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        self.path
    }

    /// The bean hosting the validated value, if any.
    #[must_use]
    pub fn leaf_bean(&self) -> Option<&BeanRef> {
        self.leaf_bean
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("root_bean_type", self.root_bean_type)
            .field("path", &self.path.to_string())
            .finish_non_exhaustive()
    }
}

/// Decides whether a value satisfies a constraint.
///
/// Returning an error aborts the validation call; the error is reported as
/// [`crate::Error::ConstraintEvaluation`].
pub trait ConstraintEvaluator: Send + Sync {
    /// Human readable evaluator name, used in diagnostics.
    fn name(&self) -> &str {
        "custom"
    }

    /// Returns `true` if `value` satisfies `constraint`.
    ///
    /// # Errors
    ///
    /// Any error raised while inspecting the value.
    fn is_valid(
        &self,
        constraint: &ConstraintDeclaration,
        value: &Value,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError>;
}

/// Adapter turning a closure into a [`ConstraintEvaluator`].
struct FnEvaluator<F>(F);

impl<F> ConstraintEvaluator for FnEvaluator<F>
where
    F: Fn(&ConstraintDeclaration, &Value, &EvaluationContext<'_>) -> Result<bool, BoxError>
        + Send
        + Sync,
{
    fn is_valid(
        &self,
        constraint: &ConstraintDeclaration,
        value: &Value,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        (self.0)(constraint, value, context)
    }
}

type EvaluatorKey = (String, Option<ValueKind>);

/// Evaluators by constraint kind and value kind.
pub struct EvaluatorRegistry {
    evaluators: SkipMap<EvaluatorKey, Arc<dyn ConstraintEvaluator>>,
}

impl EvaluatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        EvaluatorRegistry {
            evaluators: SkipMap::new(),
        }
    }

    /// Creates a registry holding the built-in evaluators.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::engine::builtin::register_builtins(&registry);
        registry
    }

    /// Registers `evaluator` for `kind`, replacing a previous registration.
    ///
    /// `value_kind` restricts the evaluator to values of that kind; `None` registers the
    /// fallback used when no kind specific evaluator exists.
    pub fn register<E>(&self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: E)
    where
        E: ConstraintEvaluator + 'static,
    {
        self.evaluators
            .insert((kind.into(), value_kind), Arc::new(evaluator));
    }

    /// Registers a closure, see [`EvaluatorRegistry::register`].
    pub fn register_fn<F>(&self, kind: impl Into<String>, value_kind: Option<ValueKind>, evaluator: F)
    where
        F: Fn(&ConstraintDeclaration, &Value, &EvaluationContext<'_>) -> Result<bool, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.register(kind, value_kind, FnEvaluator(evaluator));
    }

    /// Returns `true` if an evaluator is registered for exactly this key.
    #[must_use]
    pub fn contains(&self, kind: &str, value_kind: Option<ValueKind>) -> bool {
        self.evaluators.contains_key(&(kind.to_string(), value_kind))
    }

    /// Finds the evaluator for `kind` and `value`.
    ///
    /// Present optional values are unwrapped and empty ones treated as null before the kind
    /// specific lookup; the fallback registration is used when that lookup fails.
    #[must_use]
    pub fn lookup(&self, kind: &str, value: &Value) -> Option<Arc<dyn ConstraintEvaluator>> {
        let value = Self::effective_value(value);
        self.evaluators
            .get(&(kind.to_string(), Some(value.kind())))
            .or_else(|| self.evaluators.get(&(kind.to_string(), None)))
            .map(|entry| entry.value().clone())
    }

    /// The value evaluators receive for `value`.
    #[must_use]
    pub fn effective_value(value: &Value) -> &Value {
        match value {
            Value::Optional(None) => &NULL_VALUE,
            other => other.unwrapped(),
        }
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
