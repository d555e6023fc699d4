//! Message template interpolation.
//!
//! Templates reference constraint attributes as `{name}` and the validated value as
//! `{validatedValue}`. Attributes missing from the declaration fall back to the built-in
//! defaults of the constraint kind. Placeholders that cannot be resolved are kept verbatim, and
//! `\{`, `\}` and `\\` produce the escaped character.

use crate::{
    engine::{builtin::default_attribute, Value},
    metadata::constraint::ConstraintDeclaration,
};

/// Resolves `template` for a violation of `constraint` by `value`.
///
/// # Examples
///
/// ```rust
/// use beanval::engine::interpolate;
/// use beanval::metadata::constraint::ConstraintDeclaration;
/// use beanval::Value;
///
/// let size = ConstraintDeclaration::new("Size").attribute("max", 3);
/// let message = interpolate(
///     "{validatedValue} must have between {min} and {max} characters, not {unknown}",
///     &size,
///     &Value::from("abcd"),
/// );
/// assert_eq!(message, "abcd must have between 0 and 3 characters, not {unknown}");
/// ```
#[must_use]
pub fn interpolate(template: &str, constraint: &ConstraintDeclaration, value: &Value) -> String {
    let mut message = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.clone().next() {
                Some(escaped @ ('{' | '}' | '\\')) => {
                    message.push(escaped);
                    chars.next();
                }
                _ => message.push('\\'),
            },
            '{' => {
                let rest = chars.as_str();
                match rest.find(['}', '{']) {
                    Some(end) if rest[end..].starts_with('}') => {
                        let name = &rest[..end];
                        match resolve(name, constraint, value) {
                            Some(resolved) => message.push_str(&resolved),
                            None => {
                                message.push('{');
                                message.push_str(name);
                                message.push('}');
                            }
                        }
                        chars = rest[end + 1..].chars();
                    }
                    _ => message.push('{'),
                }
            }
            other => message.push(other),
        }
    }

    message
}

fn resolve(name: &str, constraint: &ConstraintDeclaration, value: &Value) -> Option<String> {
    if name == "validatedValue" {
        return Some(value.to_string());
    }
    constraint
        .attribute_value(name)
        .cloned()
        .or_else(|| default_attribute(constraint.kind(), name))
        .map(|attribute| attribute.to_string())
}
