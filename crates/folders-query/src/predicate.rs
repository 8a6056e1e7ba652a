//! Predicates over loaded source rows.
//!
//! Rows are entity records with their navigation properties eagerly
//! loaded; member paths walk them by source member name.

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The member equals `value`.
    Eq { member: Vec<String>, value: Value },
    /// `low <= member <= high`; a missing bound drops that side only.
    Range {
        member: Vec<String>,
        low: Option<Value>,
        high: Option<Value>,
    },
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// At least one element of the `collection` member satisfies `inner`.
    Any {
        collection: Vec<String>,
        inner: Box<Predicate>,
    },
}

impl Predicate {
    pub fn eval(&self, row: &Value) -> bool {
        match self {
            Predicate::Eq { member, value } => {
                lookup(row, member).is_some_and(|found| compare_values(found, value) == Some(Ordering::Equal))
            }
            Predicate::Range { member, low, high } => lookup(row, member).is_some_and(|found| {
                let above = low.as_ref().map_or(true, |low| {
                    matches!(compare_values(found, low), Some(Ordering::Greater | Ordering::Equal))
                });
                let below = high.as_ref().map_or(true, |high| {
                    matches!(compare_values(found, high), Some(Ordering::Less | Ordering::Equal))
                });
                above && below
            }),
            Predicate::Or(items) => items.iter().any(|item| item.eval(row)),
            Predicate::Not(inner) => !inner.eval(row),
            Predicate::Any { collection, inner } => lookup(row, collection)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| inner.eval(item))),
        }
    }
}

/// The non-null value at `member`, if every step exists.
pub(crate) fn lookup<'a>(row: &'a Value, member: &[String]) -> Option<&'a Value> {
    member
        .iter()
        .try_fold(row, |value, step| value.get(step))
        .filter(|value| !value.is_null())
}

/// Orders two scalars of the same kind. Integers compare exactly, mixed
/// numbers through `f64`; values of different kinds are unordered.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(path: &str) -> Vec<String> {
        path.split('.').map(str::to_string).collect()
    }

    #[test]
    fn ranges_drop_missing_bounds() {
        let row = json!({"count": 5});
        let range = |low: Option<i64>, high: Option<i64>| Predicate::Range {
            member: member("count"),
            low: low.map(Value::from),
            high: high.map(Value::from),
        };
        assert!(range(Some(5), Some(5)).eval(&row));
        assert!(range(None, Some(5)).eval(&row));
        assert!(!range(Some(6), None).eval(&row));
        assert!(!range(None, Some(4)).eval(&row));
    }

    #[test]
    fn missing_members_never_match() {
        let eq = Predicate::Eq {
            member: member("owner.name"),
            value: json!("a"),
        };
        assert!(!eq.eval(&json!({"owner": null})));
        assert!(!eq.eval(&json!({})));
        assert!(eq.eval(&json!({"owner": {"name": "a"}})));
        assert!(Predicate::Not(Box::new(eq)).eval(&json!({})));
    }

    #[test]
    fn any_is_existential() {
        let any = Predicate::Any {
            collection: member("channels"),
            inner: Box::new(Predicate::Eq {
                member: member("id"),
                value: json!(5),
            }),
        };
        assert!(any.eval(&json!({"channels": [{"id": 1}, {"id": 5}]})));
        assert!(!any.eval(&json!({"channels": [{"id": 1}]})));
        assert!(!any.eval(&json!({"channels": []})));
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Some(Ordering::Equal));
        assert_eq!(compare_values(&json!(i64::MAX), &json!(i64::MAX - 1)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("2"), &json!(2)), None);
    }
}
