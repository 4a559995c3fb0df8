//! Per-field permission conditions
//!
//! Rules describe conditions loosely ([`ConditionValue`]); the DSL turns them
//! into the closed [`PermissionCondition`] form once, when the grant is
//! made. Queries only ever see `PermissionCondition`.

use crate::error::{ProtectorError, Result};
use crate::restriction::insecure;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Predicate over a proposed field value
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Condition attached to a granted field
#[derive(Clone)]
pub enum PermissionCondition {
    /// Any value is accepted
    Unconditional,

    /// Only this exact value is accepted
    Equals(Value),

    /// Values within `start..=end` are accepted
    InRange {
        start: Value,
        end: Value,
    },

    /// Values the predicate accepts
    Predicate(Arc<PredicateFn>),
}

impl PermissionCondition {
    /// Shape of this condition
    pub fn kind(&self) -> ConditionKind {
        match self {
            PermissionCondition::Unconditional => ConditionKind::Unconditional,
            PermissionCondition::Equals(_) => ConditionKind::Equals,
            PermissionCondition::InRange { .. } => ConditionKind::InRange,
            PermissionCondition::Predicate(_) => ConditionKind::Predicate,
        }
    }

    /// Whether this condition accepts nothing but is always satisfied
    pub fn is_unconditional(&self) -> bool {
        matches!(self, PermissionCondition::Unconditional)
    }

    /// Check a proposed value against this condition
    ///
    /// Predicates run in insecure mode so that a predicate inspecting a
    /// restricted object does not trigger another evaluation.
    pub fn permits(&self, candidate: &Value) -> bool {
        match self {
            PermissionCondition::Unconditional => true,
            PermissionCondition::Equals(expected) => values_equal(candidate, expected),
            PermissionCondition::InRange { start, end } => {
                matches!(
                    compare_values(start, candidate),
                    Some(Ordering::Less | Ordering::Equal)
                ) && matches!(
                    compare_values(candidate, end),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
            PermissionCondition::Predicate(predicate) => {
                insecure::run_insecurely(|| predicate(candidate))
            }
        }
    }
}

impl fmt::Debug for PermissionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionCondition::Unconditional => write!(f, "Unconditional"),
            PermissionCondition::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            PermissionCondition::InRange { start, end } => f
                .debug_struct("InRange")
                .field("start", start)
                .field("end", end)
                .finish(),
            PermissionCondition::Predicate(_) => write!(f, "Predicate(<fn>)"),
        }
    }
}

/// Serializable shape of a [`PermissionCondition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Unconditional,
    Equals,
    InRange,
    Predicate,
}

/// Condition as written in a rule, before it is classified
#[derive(Clone)]
pub enum ConditionValue {
    /// A plain value; becomes [`PermissionCondition::Equals`]
    Value(Value),
    /// A two-ended inclusive range; becomes [`PermissionCondition::InRange`]
    Range(Value, Value),
    /// A callable; becomes [`PermissionCondition::Predicate`]
    Predicate(Arc<PredicateFn>),
}

impl ConditionValue {
    /// Condition accepting values the predicate accepts
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        ConditionValue::Predicate(Arc::new(predicate))
    }

    /// Inclusive range condition
    pub fn range(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        ConditionValue::Range(start.into(), end.into())
    }

    /// Classify into a [`PermissionCondition`]
    ///
    /// Ranges must have two numeric or two string endpoints with
    /// `start <= end`; anything else is rejected instead of silently
    /// denying every value.
    pub(crate) fn into_condition(self, field: &str) -> Result<PermissionCondition> {
        match self {
            ConditionValue::Value(value) => Ok(PermissionCondition::Equals(value)),
            ConditionValue::Predicate(predicate) => Ok(PermissionCondition::Predicate(predicate)),
            ConditionValue::Range(start, end) => match compare_values(&start, &end) {
                None => Err(invalid_range(
                    field,
                    format!(
                        "range endpoints must both be numbers or both be strings, got {} and {}",
                        kind_name(&start),
                        kind_name(&end)
                    ),
                )),
                Some(Ordering::Greater) => Err(invalid_range(
                    field,
                    format!("range start {} is greater than end {}", start, end),
                )),
                Some(_) => Ok(PermissionCondition::InRange { start, end }),
            },
        }
    }
}

impl fmt::Debug for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ConditionValue::Range(start, end) => {
                f.debug_tuple("Range").field(start).field(end).finish()
            }
            ConditionValue::Predicate(_) => write!(f, "Predicate(<fn>)"),
        }
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        ConditionValue::Value(value)
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Value(Value::from(value))
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Value(Value::from(value))
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        ConditionValue::Value(Value::from(value))
    }
}

macro_rules! condition_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(value: $ty) -> Self {
                    ConditionValue::Value(Value::from(value))
                }
            }

            impl From<RangeInclusive<$ty>> for ConditionValue {
                fn from(range: RangeInclusive<$ty>) -> Self {
                    let (start, end) = range.into_inner();
                    ConditionValue::Range(Value::from(start), Value::from(end))
                }
            }
        )*
    };
}

condition_from_number!(i32, i64, u32, u64, f64);

impl From<RangeInclusive<&str>> for ConditionValue {
    fn from(range: RangeInclusive<&str>) -> Self {
        let (start, end) = range.into_inner();
        ConditionValue::Range(Value::from(start), Value::from(end))
    }
}

/// Named field conditions passed to `can_with`
///
/// Insertion order is kept; a later entry for the same field wins.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    entries: Vec<(String, ConditionValue)>,
}

impl Conditions {
    /// Create an empty condition list
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach any condition shape to `field`
    pub fn field(mut self, field: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.entries.push((field.into(), value.into()));
        self
    }

    /// Accept only `value` for `field`
    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(field, ConditionValue::Value(value.into()))
    }

    /// Accept values of `field` within `start..=end`
    pub fn range(
        self,
        field: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.field(field, ConditionValue::range(start, end))
    }

    /// Accept values of `field` the predicate accepts
    pub fn predicate<F>(self, field: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.field(field, ConditionValue::predicate(predicate))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no condition was given
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, ConditionValue)> {
        self.entries
    }
}

/// Equality with numbers compared by value, so `1` equals `1.0`
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r) == Some(Ordering::Equal),
        _ => left == right,
    }
}

/// Ordering between two values of the same orderable kind
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    match (as_integer(left), as_integer(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn as_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn invalid_range(field: &str, reason: String) -> ProtectorError {
    ProtectorError::InvalidCondition {
        field: field.to_string(),
        reason,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(value: impl Into<ConditionValue>) -> PermissionCondition {
        value.into().into_condition("field").unwrap()
    }

    #[test]
    fn test_shapes_classify_once() {
        assert_eq!(classify("draft").kind(), ConditionKind::Equals);
        assert_eq!(classify(json!({"nested": true})).kind(), ConditionKind::Equals);
        assert_eq!(classify(1..=5).kind(), ConditionKind::InRange);
        assert_eq!(
            classify(ConditionValue::predicate(|v| v.is_string())).kind(),
            ConditionKind::Predicate
        );
    }

    #[test]
    fn test_equals_compares_numbers_by_value() {
        let condition = classify(1);
        assert!(condition.permits(&json!(1)));
        assert!(condition.permits(&json!(1.0)));
        assert!(!condition.permits(&json!(2)));
        assert!(!condition.permits(&json!("1")));
    }

    #[test]
    fn test_range_is_inclusive() {
        let condition = classify(2..=4);
        assert!(!condition.permits(&json!(1)));
        assert!(condition.permits(&json!(2)));
        assert!(condition.permits(&json!(3.5)));
        assert!(condition.permits(&json!(4)));
        assert!(!condition.permits(&json!(5)));
        assert!(!condition.permits(&json!("3")));
        assert!(!condition.permits(&Value::Null));
    }

    #[test]
    fn test_string_range() {
        let condition = classify("b"..="d");
        assert!(condition.permits(&json!("c")));
        assert!(!condition.permits(&json!("e")));
    }

    #[test]
    fn test_range_with_mismatched_endpoints_fails_fast() {
        let err = ConditionValue::range(1, "ten").into_condition("rating").unwrap_err();
        assert!(matches!(
            err,
            ProtectorError::InvalidCondition { ref field, .. } if field == "rating"
        ));

        // NaN has no JSON representation and turns into null
        assert!(ConditionValue::from(0.0..=f64::NAN).into_condition("score").is_err());
    }

    #[test]
    fn test_reversed_range_fails_fast() {
        let err = ConditionValue::from(5..=1).into_condition("rating").unwrap_err();
        assert!(matches!(
            err,
            ProtectorError::InvalidCondition { ref field, ref reason }
                if field == "rating" && reason.contains("greater than")
        ));
        assert!(ConditionValue::from("z"..="a").into_condition("title").is_err());

        // A single-value range is fine
        let condition = classify(3..=3);
        assert!(condition.permits(&json!(3)));
        assert!(!condition.permits(&json!(4)));
    }

    #[test]
    fn test_predicate_runs_insecurely() {
        let condition = classify(ConditionValue::predicate(|_| insecure::is_insecure()));
        assert!(!insecure::is_insecure());
        assert!(condition.permits(&json!(null)));
        assert!(!insecure::is_insecure());
    }

    #[test]
    fn test_conditions_builder_keeps_order() {
        let conditions = Conditions::new()
            .equals("status", "draft")
            .range("rating", 1, 5)
            .predicate("title", |v| v.as_str().is_some_and(|s| !s.is_empty()));

        let names: Vec<_> = conditions
            .into_entries()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["status", "rating", "title"]);
    }
}
