//! Constraint declarations.
//!
//! A [`ConstraintDeclaration`] describes one applied constraint: which evaluator kind checks it,
//! under which groups it is validated, its attributes (`min`, `max`, `value`, ...) and, for
//! composed constraints, the declarations it is made of. Declarations are immutable once a
//! [`crate::metadata::typesystem::TypeBuilder`] has stamped the declaring type and the target
//! onto them, and are shared behind an [`Arc`].
//!
//! # Equality
//!
//! Two declarations are equal when they describe the same constraint, regardless of where they
//! were declared: kind, groups, payload, attributes, message, composing declarations and the
//! report-as-single flag are compared, the declaring type and target are not. This is the notion
//! of equality used by the override legality rules.

use std::{collections::BTreeMap, fmt, sync::Arc};

use strum::AsRefStr;

use crate::metadata::typesystem::TypeName;

/// The location a constraint has been declared on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, AsRefStr)]
pub enum ConstraintTarget {
    /// A field, by name
    Field(String),
    /// A getter, by method name
    Getter(String),
    /// A method parameter, by index
    Parameter(usize),
    /// A method return value
    ReturnValue,
    /// A constructor parameter, by index
    ConstructorParameter(usize),
    /// The instance created by a constructor
    ConstructorReturnValue,
    /// The parameter array of an executable
    CrossParameter,
    /// The type itself (class level constraint)
    Type,
}

impl fmt::Display for ConstraintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintTarget::Field(name) => write!(f, "field {name}"),
            ConstraintTarget::Getter(name) => write!(f, "getter {name}"),
            ConstraintTarget::Parameter(index) => write!(f, "parameter {index}"),
            ConstraintTarget::ReturnValue => f.write_str("return value"),
            ConstraintTarget::ConstructorParameter(index) => {
                write!(f, "constructor parameter {index}")
            }
            ConstraintTarget::ConstructorReturnValue => f.write_str("constructor return value"),
            ConstraintTarget::CrossParameter => f.write_str("cross-parameter"),
            ConstraintTarget::Type => f.write_str("type"),
        }
    }
}

/// An attribute value of a constraint declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Boolean attribute
    Bool(bool),
    /// Integer attribute
    Int(i64),
    /// Floating point attribute
    Float(f64),
    /// String attribute
    Str(String),
}

impl AttributeValue {
    /// The value as integer, converting floats by truncation.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            AttributeValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// The value as float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// The value as boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

/// One applied constraint.
///
/// # Examples
///
/// ```rust
/// use beanval::metadata::constraint::ConstraintDeclaration;
/// use beanval::metadata::typesystem::TypeName;
///
/// let length = ConstraintDeclaration::new("Length")
///     .attribute("min", 10)
///     .attribute("max", 20)
///     .groups(["StrongCheck"])
///     .message("length must be between {min} and {max}");
///
/// assert_eq!(length.kind(), "Length");
/// assert_eq!(length.groups_slice(), &[TypeName::new("StrongCheck")]);
/// assert_eq!(length.attribute_value("max").and_then(|v| v.as_i64()), Some(20));
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintDeclaration {
    kind: String,
    groups: Vec<TypeName>,
    payload: Vec<String>,
    attributes: BTreeMap<String, AttributeValue>,
    composing: Vec<Arc<ConstraintDeclaration>>,
    report_as_single: bool,
    message: Option<String>,
    target: Option<ConstraintTarget>,
    declaring_type: Option<TypeName>,
}

impl ConstraintDeclaration {
    /// Creates a declaration of the given kind in the `Default` group.
    pub fn new(kind: impl Into<String>) -> Self {
        ConstraintDeclaration {
            kind: kind.into(),
            groups: vec![TypeName::default_group()],
            payload: Vec::new(),
            attributes: BTreeMap::new(),
            composing: Vec::new(),
            report_as_single: false,
            message: None,
            target: None,
            declaring_type: None,
        }
    }

    /// Replaces the groups. An empty list means `Default`.
    #[must_use]
    pub fn groups<T: Into<TypeName>>(mut self, groups: impl IntoIterator<Item = T>) -> Self {
        let mut resolved: Vec<TypeName> = Vec::new();
        for group in groups {
            let group = group.into();
            if !resolved.contains(&group) {
                resolved.push(group);
            }
        }
        if resolved.is_empty() {
            resolved.push(TypeName::default_group());
        }
        self.groups = resolved;
        self
    }

    /// Adds a payload tag.
    #[must_use]
    pub fn payload(mut self, tag: impl Into<String>) -> Self {
        self.payload.push(tag.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Adds a composing constraint.
    #[must_use]
    pub fn composed_of(mut self, constraint: ConstraintDeclaration) -> Self {
        self.composing.push(Arc::new(constraint));
        self
    }

    /// Reports a single violation for this constraint when any composing constraint fails.
    #[must_use]
    pub fn report_as_single(mut self) -> Self {
        self.report_as_single = true;
        self
    }

    /// Sets the message template.
    #[must_use]
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub(crate) fn located(
        self,
        declaring_type: &TypeName,
        target: ConstraintTarget,
    ) -> Arc<ConstraintDeclaration> {
        let composing = self
            .composing
            .into_iter()
            .map(|c| Arc::unwrap_or_clone(c).located(declaring_type, target.clone()))
            .collect();
        Arc::new(ConstraintDeclaration {
            composing,
            target: Some(target),
            declaring_type: Some(declaring_type.clone()),
            ..self
        })
    }

    /// The constraint kind, used to look up the evaluator.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The groups this constraint is validated under; never empty.
    #[must_use]
    pub fn groups_slice(&self) -> &[TypeName] {
        &self.groups
    }

    /// Payload tags.
    #[must_use]
    pub fn payload_tags(&self) -> &[String] {
        &self.payload
    }

    /// All attributes.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// A single attribute.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// The composing constraints.
    #[must_use]
    pub fn composing(&self) -> &[Arc<ConstraintDeclaration>] {
        &self.composing
    }

    /// Returns `true` if composing failures are reported as one violation of this constraint.
    #[must_use]
    pub fn is_report_as_single(&self) -> bool {
        self.report_as_single
    }

    /// The explicit message template, if any.
    #[must_use]
    pub fn message_template(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Where the constraint has been declared.
    #[must_use]
    pub fn target(&self) -> Option<&ConstraintTarget> {
        self.target.as_ref()
    }

    /// The type that declared the constraint.
    #[must_use]
    pub fn declaring_type(&self) -> Option<&TypeName> {
        self.declaring_type.as_ref()
    }

    /// Returns `true` if the constraint belongs to `Default`.
    #[must_use]
    pub fn is_default_group_member(&self) -> bool {
        self.groups.iter().any(TypeName::is_default_group)
    }
}

impl PartialEq for ConstraintDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.report_as_single == other.report_as_single
            && self.message == other.message
            && self.attributes == other.attributes
            && self.payload == other.payload
            && self.groups.len() == other.groups.len()
            && self.groups.iter().all(|g| other.groups.contains(g))
            && self.composing == other.composing
    }
}

impl fmt::Display for ConstraintDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind)?;
        if !self.attributes.is_empty() {
            f.write_str("(")?;
            for (i, (name, value)) in self.attributes.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={value}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
