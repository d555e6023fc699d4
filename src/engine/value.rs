//! Runtime values and beans.
//!
//! Validated object graphs are presented to the engine through the [`Bean`] trait: a bean knows
//! its runtime type and hands out property values by name. Values are modelled by [`Value`], a
//! small dynamic value type covering scalars, containers and references to other beans.
//!
//! Bean identity is the identity of the shared handle ([`BeanRef`]), not structural equality.
//! Two handles to the same allocation are the same bean, which is what cycle detection during
//! cascaded validation relies on.

use std::{collections::BTreeMap, fmt, sync::Arc, sync::RwLock};

use strum::{Display, EnumIter};

use crate::metadata::typesystem::TypeName;

/// A validated object.
///
/// Implementations expose property values by name. Properties that are declared in the type
/// model but not provided by the bean read as [`Value::Null`].
pub trait Bean: Send + Sync {
    /// The runtime type of the bean, used to look up its metadata.
    fn bean_type(&self) -> &TypeName;

    /// The current value of `name`, `None` if the bean does not know the property.
    fn property(&self, name: &str) -> Option<Value>;
}

/// Shared handle to a bean. Handle identity is bean identity.
pub type BeanRef = Arc<dyn Bean>;

/// Identity of a bean within one validation call.
#[must_use]
pub fn bean_id(bean: &BeanRef) -> usize {
    Arc::as_ptr(bean).cast::<()>() as usize
}

/// The kind of a [`Value`], used to select constraint evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::Str`]
    Str,
    /// [`Value::List`]
    List,
    /// [`Value::Map`]
    Map,
    /// [`Value::Optional`]
    Optional,
    /// [`Value::Bean`]
    Bean,
}

/// A dynamically typed value read from a bean, a parameter or a return value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// List, set or array; elements are addressed by index
    List(Vec<Value>),
    /// Map with ordered string keys; values are addressed by key
    Map(BTreeMap<String, Value>),
    /// Optional wrapper
    Optional(Option<Box<Value>>),
    /// Reference to another bean
    Bean(BeanRef),
}

impl Value {
    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Optional(_) => ValueKind::Optional,
            Value::Bean(_) => ValueKind::Bean,
        }
    }

    /// Returns `true` for [`Value::Null`] and an empty [`Value::Optional`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Optional(None))
    }

    /// The referenced bean, if this is a bean value.
    #[must_use]
    pub fn as_bean(&self) -> Option<&BeanRef> {
        match self {
            Value::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    /// The string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean content, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as a floating point number, for integers and floats.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Number of contained elements for strings (characters), lists and maps.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Unwraps a present [`Value::Optional`]; other values are returned unchanged.
    #[must_use]
    pub fn unwrapped(&self) -> &Value {
        match self {
            Value::Optional(Some(inner)) => inner,
            other => other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Bean(a), Value::Bean(b)) => bean_id(a) == bean_id(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Value::Bean(bean) => write!(f, "Bean({}@{:#x})", bean.bean_type(), bean_id(bean)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Value::Optional(None) => f.write_str("Optional.empty"),
            Value::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Value::Bean(bean) => write!(f, "{}", bean.bean_type()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<BeanRef> for Value {
    fn from(value: BeanRef) -> Self {
        Value::Bean(value)
    }
}

impl From<Arc<DynamicBean>> for Value {
    fn from(value: Arc<DynamicBean>) -> Self {
        Value::Bean(value)
    }
}

/// A bean backed by a mutable property map.
///
/// Properties can be changed after the bean has been shared, which allows building cyclic
/// object graphs. Such graphs are reference cycles and are not freed automatically.
///
/// # Examples
///
/// ```rust
/// use beanval::{Bean, DynamicBean, Value};
///
/// let driver = DynamicBean::new("Driver").with("name", "Ada").with("age", 17);
/// let car = DynamicBean::new("Car").with("driver", driver.clone());
///
/// assert_eq!(driver.property("age"), Some(Value::Int(17)));
/// assert!(car.property("driver").is_some_and(|v| v.as_bean().is_some()));
/// ```
pub struct DynamicBean {
    bean_type: TypeName,
    properties: RwLock<BTreeMap<String, Value>>,
}

impl DynamicBean {
    /// Creates a bean of `bean_type` without properties.
    pub fn new(bean_type: impl Into<TypeName>) -> Arc<Self> {
        Arc::new(DynamicBean {
            bean_type: bean_type.into(),
            properties: RwLock::new(BTreeMap::new()),
        })
    }

    /// Sets a property and returns the bean, for chained construction.
    #[must_use]
    pub fn with(self: Arc<Self>, name: impl Into<String>, value: impl Into<Value>) -> Arc<Self> {
        self.set(name, value);
        self
    }

    /// Sets a property.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        write_lock!(self.properties).insert(name.into(), value.into());
    }

    /// Removes a property.
    pub fn remove(&self, name: &str) -> Option<Value> {
        write_lock!(self.properties).remove(name)
    }

    /// Returns this bean as a generic handle.
    #[must_use]
    pub fn handle(self: &Arc<Self>) -> BeanRef {
        self.clone()
    }
}

impl Bean for DynamicBean {
    fn bean_type(&self) -> &TypeName {
        &self.bean_type
    }

    fn property(&self, name: &str) -> Option<Value> {
        read_lock!(self.properties).get(name).cloned()
    }
}

impl fmt::Debug for DynamicBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBean")
            .field("bean_type", &self.bean_type)
            .field(
                "properties",
                &read_lock!(self.properties).keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_identity() {
        let a = DynamicBean::new("Node");
        let b = DynamicBean::new("Node");

        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a.clone()), Value::from(b));
        assert_eq!(bean_id(&a.handle()), bean_id(&a.handle()));
    }

    #[test]
    fn test_cyclic_graph() {
        let first = DynamicBean::new("Node");
        let second = DynamicBean::new("Node").with("next", first.clone());
        first.set("next", second.clone());

        let next = first.property("next").unwrap();
        assert_eq!(next, Value::from(second));
    }

    #[test]
    fn test_len_and_null() {
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::List(vec![Value::Null]).len(), Some(1));
        assert_eq!(Value::Int(3).len(), None);
        assert!(Value::Null.is_null());
        assert!(Value::Optional(None).is_null());
        assert!(!Value::Optional(Some(Box::new(Value::Null))).is_null());
    }

    #[test]
    fn test_display() {
        let list = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(list.to_string(), "[1, a]");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Optional(None).to_string(), "Optional.empty");
    }
}
