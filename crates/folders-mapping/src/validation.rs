//! Field-level business rules for edit DTOs.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub property: String,
    pub code: String,
    pub message: String,
}

impl FieldFailure {
    pub fn new(
        property: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A validator that could not run at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validator fault: {0}")]
pub struct ValidatorFault(pub String);

/// Validates a DTO-shaped JSON instance.
pub trait DtoValidator: Send + Sync + fmt::Debug {
    fn validate(&self, dto: &Value) -> Result<Vec<FieldFailure>, ValidatorFault>;
}

#[derive(Debug, Clone)]
pub enum Rule {
    /// Not `null` / absent.
    Required,
    /// Not `null`, not `""`, not `[]`.
    NotEmpty,
    MaxLength(usize),
    MinLength(usize),
    /// Inclusive numeric range.
    Range { min: f64, max: f64 },
    Pattern(Regex),
}

impl Rule {
    fn check(&self, field: &str, value: &Value) -> Option<FieldFailure> {
        match self {
            Rule::Required => value.is_null().then(|| {
                FieldFailure::new(field, "NotNullValidator", format!("'{field}' must not be empty."))
            }),
            Rule::NotEmpty => {
                let empty = match value {
                    Value::Null => true,
                    Value::String(s) => s.trim().is_empty(),
                    Value::Array(items) => items.is_empty(),
                    _ => false,
                };
                empty.then(|| {
                    FieldFailure::new(field, "NotEmptyValidator", format!("'{field}' must not be empty."))
                })
            }
            Rule::MaxLength(max) => {
                let len = value.as_str()?.chars().count();
                (len > *max).then(|| {
                    FieldFailure::new(
                        field,
                        "MaximumLengthValidator",
                        format!("The length of '{field}' must be {max} characters or fewer. You entered {len} characters."),
                    )
                })
            }
            Rule::MinLength(min) => {
                let len = value.as_str()?.chars().count();
                (len < *min).then(|| {
                    FieldFailure::new(
                        field,
                        "MinimumLengthValidator",
                        format!("The length of '{field}' must be at least {min} characters. You entered {len} characters."),
                    )
                })
            }
            Rule::Range { min, max } => {
                let n = value.as_f64()?;
                (n < *min || n > *max).then(|| {
                    FieldFailure::new(
                        field,
                        "InclusiveBetweenValidator",
                        format!("'{field}' must be between {min} and {max}. You entered {n}."),
                    )
                })
            }
            Rule::Pattern(re) => {
                let s = value.as_str()?;
                (!re.is_match(s)).then(|| {
                    FieldFailure::new(
                        field,
                        "RegularExpressionValidator",
                        format!("'{field}' is not in the correct format."),
                    )
                })
            }
        }
    }
}

/// A validator assembled from per-field [`Rule`]s.
///
/// ```
/// use folders_mapping::{DtoValidator, Rule, RuleValidator};
/// use serde_json::json;
///
/// let validator = RuleValidator::new()
///     .rule("name", Rule::NotEmpty)
///     .rule("name", Rule::MaxLength(4));
/// let failures = validator.validate(&json!({"name": "too long"})).unwrap();
/// assert_eq!(failures[0].code, "MaximumLengthValidator");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<(String, Rule)>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((field.into(), rule));
        self
    }

    pub fn pattern(self, field: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(pattern)?;
        Ok(self.rule(field, Rule::Pattern(re)))
    }
}

impl DtoValidator for RuleValidator {
    fn validate(&self, dto: &Value) -> Result<Vec<FieldFailure>, ValidatorFault> {
        let object = dto
            .as_object()
            .ok_or_else(|| ValidatorFault(format!("expected an object, got {dto}")))?;
        let failures = self
            .rules
            .iter()
            .filter_map(|(field, rule)| {
                let value = object.get(field).unwrap_or(&Value::Null);
                rule.check(field, value)
            })
            .collect();
        Ok(failures)
    }
}
