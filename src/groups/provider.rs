use crate::{engine::BeanRef, metadata::typesystem::TypeName};

/// Computes the default group sequence of a bean per validated instance.
///
/// A type registers a provider instead of a static group sequence when the groups to validate
/// depend on the state of the instance. The provider is invoked lazily during validation and its
/// result is cached for the duration of a single validation call only.
///
/// `bean` is `None` when no instance exists, e.g. for
/// [`crate::Validator::validate_value`] and constructor parameter validation. The result has to
/// contain `bean_type` itself, which stands for the `Default` group of that type, and must not
/// contain `Default`; returning `None` or an empty list is a configuration error.
///
/// The validator never calls a provider concurrently for the same validation call, but the
/// same provider instance is shared by all threads using a factory.
///
/// # Examples
///
/// ```rust
/// use beanval::{BeanRef, DefaultGroupSequenceProvider, TypeName, Value};
///
/// struct UserSequence;
///
/// impl DefaultGroupSequenceProvider for UserSequence {
///     fn validation_groups(
///         &self,
///         bean_type: &TypeName,
///         bean: Option<&BeanRef>,
///     ) -> Option<Vec<TypeName>> {
///         let admin = bean
///             .and_then(|b| b.property("admin"))
///             .is_some_and(|v| v == Value::Bool(true));
///
///         let mut groups = vec![bean_type.clone()];
///         if admin {
///             groups.push(TypeName::new("StrongCheck"));
///         }
///         Some(groups)
///     }
/// }
/// ```
pub trait DefaultGroupSequenceProvider: Send + Sync {
    /// Returns the default group sequence for `bean_type`, optionally inspecting `bean`.
    fn validation_groups(&self, bean_type: &TypeName, bean: Option<&BeanRef>)
        -> Option<Vec<TypeName>>;

    /// The type this provider is written for, `None` if it applies to any type.
    ///
    /// A provider bound to a type may only be registered on that type or its subtypes.
    fn bound_type(&self) -> Option<TypeName> {
        None
    }
}

impl<F> DefaultGroupSequenceProvider for F
where
    F: Fn(&TypeName, Option<&BeanRef>) -> Option<Vec<TypeName>> + Send + Sync,
{
    fn validation_groups(
        &self,
        bean_type: &TypeName,
        bean: Option<&BeanRef>,
    ) -> Option<Vec<TypeName>> {
        self(bean_type, bean)
    }
}
