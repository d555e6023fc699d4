use std::{fmt, sync::Arc};

use crate::{
    engine::{path::PropertyPath, BeanRef, Value},
    metadata::{constraint::ConstraintDeclaration, typesystem::TypeName},
};

/// A failed constraint.
///
/// Carries the interpolated message, the location of the invalid value relative to the root
/// bean, the violated declaration and the beans involved. For executable validation the
/// parameter values or the return value of the call are attached as well.
#[derive(Clone)]
pub struct ConstraintViolation {
    pub(crate) message: String,
    pub(crate) message_template: String,
    pub(crate) property_path: PropertyPath,
    pub(crate) constraint: Arc<ConstraintDeclaration>,
    pub(crate) invalid_value: Value,
    pub(crate) root_bean: Option<BeanRef>,
    pub(crate) root_bean_type: TypeName,
    pub(crate) leaf_bean: Option<BeanRef>,
    pub(crate) executable_parameters: Option<Vec<Value>>,
    pub(crate) executable_return_value: Option<Value>,
}

impl ConstraintViolation {
    /// The interpolated message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The template the message was interpolated from.
    #[must_use]
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    /// Location of the invalid value.
    #[must_use]
    pub fn property_path(&self) -> &PropertyPath {
        &self.property_path
    }

    /// The violated declaration.
    #[must_use]
    pub fn constraint(&self) -> &Arc<ConstraintDeclaration> {
        &self.constraint
    }

    /// The value that failed validation.
    #[must_use]
    pub fn invalid_value(&self) -> &Value {
        &self.invalid_value
    }

    /// The bean the validation call started at; `None` for `validate_value` and constructor
    /// parameter validation.
    #[must_use]
    pub fn root_bean(&self) -> Option<&BeanRef> {
        self.root_bean.as_ref()
    }

    /// The type the validation call started at.
    #[must_use]
    pub fn root_bean_type(&self) -> &TypeName {
        &self.root_bean_type
    }

    /// The bean hosting the invalid value.
    #[must_use]
    pub fn leaf_bean(&self) -> Option<&BeanRef> {
        self.leaf_bean.as_ref()
    }

    /// Parameter values of a validated executable call.
    #[must_use]
    pub fn executable_parameters(&self) -> Option<&[Value]> {
        self.executable_parameters.as_deref()
    }

    /// Return value of a validated executable call.
    #[must_use]
    pub fn executable_return_value(&self) -> Option<&Value> {
        self.executable_return_value.as_ref()
    }
}

impl fmt::Debug for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintViolation")
            .field("path", &self.property_path.to_string())
            .field("constraint", &self.constraint.to_string())
            .field("message", &self.message)
            .field("invalid_value", &self.invalid_value)
            .field("root_bean_type", &self.root_bean_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property_path.is_root() {
            write!(f, "{}: {}", self.root_bean_type.simple_name(), self.message)
        } else {
            write!(f, "{}: {}", self.property_path, self.message)
        }
    }
}
