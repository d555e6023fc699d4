//! Built-in constraint evaluators and their default messages.
//!
//! | Kind | Value kinds | Attributes |
//! |------|-------------|------------|
//! | `NotNull`, `Null` | all | |
//! | `AssertTrue`, `AssertFalse` | bool | |
//! | `Min`, `Max` | int, float | `value` |
//! | `Positive`, `Negative` | int, float | |
//! | `Size` | string, list, map | `min` (0), `max` (`i32::MAX`) |
//! | `Length` | string | `min` (0), `max` (`i32::MAX`) |
//! | `NotEmpty` | string, list, map | |
//! | `NotBlank` | string | |
//!
//! Except for `NotNull`, `NotEmpty` and `NotBlank`, null values are valid.

use std::cmp::Ordering;

use crate::{
    engine::{
        evaluator::{ConstraintEvaluator, EvaluationContext, EvaluatorRegistry},
        Value, ValueKind,
    },
    metadata::constraint::{AttributeValue, ConstraintDeclaration},
    BoxError,
};

const NUMERIC: &[ValueKind] = &[ValueKind::Int, ValueKind::Float, ValueKind::Null];
const SIZED: &[ValueKind] = &[ValueKind::Str, ValueKind::List, ValueKind::Map, ValueKind::Null];
const TEXT: &[ValueKind] = &[ValueKind::Str, ValueKind::Null];
const BOOLEAN: &[ValueKind] = &[ValueKind::Bool, ValueKind::Null];

/// The message template used when a declaration does not set one.
#[must_use]
pub fn default_message(kind: &str) -> String {
    match kind {
        "NotNull" => "must not be null",
        "Null" => "must be null",
        "AssertTrue" => "must be true",
        "AssertFalse" => "must be false",
        "Min" => "must be greater than or equal to {value}",
        "Max" => "must be less than or equal to {value}",
        "Positive" => "must be greater than 0",
        "Negative" => "must be less than 0",
        "Size" => "size must be between {min} and {max}",
        "Length" => "length must be between {min} and {max}",
        "NotEmpty" => "must not be empty",
        "NotBlank" => "must not be blank",
        other => return format!("must satisfy {other}"),
    }
    .to_string()
}

/// The value of attribute `name` when the declaration does not set it.
#[must_use]
pub fn default_attribute(kind: &str, name: &str) -> Option<AttributeValue> {
    match (kind, name) {
        ("Size" | "Length", "min") => Some(AttributeValue::Int(0)),
        ("Size" | "Length", "max") => Some(AttributeValue::Int(i64::from(i32::MAX))),
        _ => None,
    }
}

/// Registers every built-in evaluator in `registry`.
pub(crate) fn register_builtins(registry: &EvaluatorRegistry) {
    for kind in [
        ValueKind::Null,
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Str,
        ValueKind::List,
        ValueKind::Map,
        ValueKind::Bean,
    ] {
        registry.register("NotNull", Some(kind), NullCheck { expect_null: false });
        registry.register("Null", Some(kind), NullCheck { expect_null: true });
    }

    for &kind in BOOLEAN {
        registry.register("AssertTrue", Some(kind), Assert { expected: true });
        registry.register("AssertFalse", Some(kind), Assert { expected: false });
    }

    for &kind in NUMERIC {
        registry.register("Min", Some(kind), Bound { minimum: true });
        registry.register("Max", Some(kind), Bound { minimum: false });
        registry.register("Positive", Some(kind), Sign { positive: true });
        registry.register("Negative", Some(kind), Sign { positive: false });
    }

    for &kind in SIZED {
        registry.register("Size", Some(kind), SizeRange);
        registry.register("NotEmpty", Some(kind), NotEmpty);
    }

    for &kind in TEXT {
        registry.register("Length", Some(kind), SizeRange);
        registry.register("NotBlank", Some(kind), NotBlank);
    }
}

fn int_attribute(constraint: &ConstraintDeclaration, name: &str) -> Result<i64, BoxError> {
    constraint
        .attribute_value(name)
        .cloned()
        .or_else(|| default_attribute(constraint.kind(), name))
        .and_then(|value| value.as_i64())
        .ok_or_else(|| format!("attribute '{name}' of {constraint} is not an integer").into())
}

struct NullCheck {
    expect_null: bool,
}

impl ConstraintEvaluator for NullCheck {
    fn name(&self) -> &str {
        if self.expect_null {
            "Null"
        } else {
            "NotNull"
        }
    }

    fn is_valid(
        &self,
        _: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        Ok(value.is_null() == self.expect_null)
    }
}

struct Assert {
    expected: bool,
}

impl ConstraintEvaluator for Assert {
    fn name(&self) -> &str {
        "Assert"
    }

    fn is_valid(
        &self,
        _: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        Ok(value.as_bool().is_none_or(|b| b == self.expected))
    }
}

struct Bound {
    minimum: bool,
}

impl ConstraintEvaluator for Bound {
    fn name(&self) -> &str {
        if self.minimum {
            "Min"
        } else {
            "Max"
        }
    }

    fn is_valid(
        &self,
        constraint: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        let ordering = match value {
            Value::Null => return Ok(true),
            Value::Int(actual) => actual.cmp(&int_attribute(constraint, "value")?),
            Value::Float(actual) => {
                let bound = constraint
                    .attribute_value("value")
                    .and_then(AttributeValue::as_f64)
                    .ok_or_else(|| format!("attribute 'value' of {constraint} is not a number"))?;
                match actual.partial_cmp(&bound) {
                    Some(ordering) => ordering,
                    None => return Ok(false),
                }
            }
            other => return Err(format!("{} cannot validate {}", self.name(), other.kind()).into()),
        };

        Ok(if self.minimum {
            ordering != Ordering::Less
        } else {
            ordering != Ordering::Greater
        })
    }
}

struct Sign {
    positive: bool,
}

impl ConstraintEvaluator for Sign {
    fn name(&self) -> &str {
        if self.positive {
            "Positive"
        } else {
            "Negative"
        }
    }

    fn is_valid(
        &self,
        _: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        if value.is_null() {
            return Ok(true);
        }
        let Some(number) = value.as_f64() else {
            return Err(format!("{} cannot validate {}", self.name(), value.kind()).into());
        };
        Ok(if self.positive {
            number > 0.0
        } else {
            number < 0.0
        })
    }
}

/// `Size` and `Length`; strings are measured in characters.
struct SizeRange;

impl ConstraintEvaluator for SizeRange {
    fn name(&self) -> &str {
        "Size"
    }

    fn is_valid(
        &self,
        constraint: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        let Some(length) = value.len() else {
            return Ok(value.is_null());
        };
        let min = int_attribute(constraint, "min")?;
        let max = int_attribute(constraint, "max")?;
        if min < 0 || max < min {
            return Err(format!("invalid bounds in {constraint}").into());
        }

        let length = i64::try_from(length)?;
        Ok((min..=max).contains(&length))
    }
}

struct NotEmpty;

impl ConstraintEvaluator for NotEmpty {
    fn name(&self) -> &str {
        "NotEmpty"
    }

    fn is_valid(
        &self,
        _: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        Ok(value.len().is_some_and(|len| len > 0))
    }
}

struct NotBlank;

impl ConstraintEvaluator for NotBlank {
    fn name(&self) -> &str {
        "NotBlank"
    }

    fn is_valid(
        &self,
        _: &ConstraintDeclaration,
        value: &Value,
        _: &EvaluationContext<'_>,
    ) -> Result<bool, BoxError> {
        Ok(value.as_str().is_some_and(|s| !s.trim().is_empty()))
    }
}
