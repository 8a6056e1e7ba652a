//! `"<dotted-path>[!]:<value>[,<value>...]"` filter tokens.
//!
//! The first key segment's `Filterable` declaration picks the semantics:
//! `Equals` tests the resolved field, `ById` tests the foreign key behind a
//! reference, `Nested` compiles the rest of the token over the collection's
//! element DTO and matches when any element does.

use crate::error::CompileError;
use crate::member::{origin, KeyPath};
use crate::predicate::Predicate;
use crate::types::{ExpressionType, FilterExpression};
use folders_mapping::{CompareMethod, MappingAdapter, Relation, ScalarType};
use serde_json::Value;

/// Separator of excluding tokens.
const EXCLUDE: &str = "!:";

/// One value of a filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    Exact(&'a str),
    Range {
        low: Option<&'a str>,
        high: Option<&'a str>,
    },
}

/// The grammar of a filter token, before any name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterToken<'a> {
    pub key: &'a str,
    pub expression_type: ExpressionType,
    pub raw_value: &'a str,
}

impl<'a> FilterToken<'a> {
    /// Splits `token` at its first `!:`, which excludes. Tokens without
    /// one split at their first `:`.
    ///
    /// ```
    /// use folders_query::{ExpressionType, FilterToken};
    ///
    /// let token = FilterToken::parse("owner.id!:3,5").unwrap();
    /// assert_eq!(token.key, "owner.id");
    /// assert_eq!(token.expression_type, ExpressionType::Exclude);
    /// assert_eq!(token.raw_value, "3,5");
    /// assert!(FilterToken::parse("owner.id").is_err());
    /// ```
    pub fn parse(token: &'a str) -> Result<Self, CompileError> {
        let malformed = || CompileError::Malformed(token.to_string());
        let (key, expression_type, raw_value) = match token.split_once(EXCLUDE) {
            Some((key, raw_value)) => (key, ExpressionType::Exclude, raw_value),
            None => {
                let (key, raw_value) = token.split_once(':').ok_or_else(malformed)?;
                (key, ExpressionType::Include, raw_value)
            }
        };
        if key.is_empty() || raw_value.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            key,
            expression_type,
            raw_value,
        })
    }

    /// First segment of the key: the property whose declaration applies.
    pub fn property(&self) -> &'a str {
        property_of(self.key)
    }

    /// The comma separated values; `low..high` is a range with optional
    /// bounds.
    pub fn values(&self) -> Result<Vec<RawValue<'a>>, CompileError> {
        self.raw_value
            .split(',')
            .map(|part| match part.split_once("..") {
                Some((low, high)) => {
                    let bound = |text: &'a str| (!text.trim().is_empty()).then_some(text);
                    match (bound(low), bound(high)) {
                        (None, None) => Err(CompileError::InvalidValue {
                            value: part.to_string(),
                            expected: "range".to_string(),
                        }),
                        (low, high) => Ok(RawValue::Range { low, high }),
                    }
                }
                None if part.trim().is_empty() => Err(CompileError::InvalidValue {
                    value: part.to_string(),
                    expected: "value".to_string(),
                }),
                None => Ok(RawValue::Exact(part)),
            })
            .collect()
    }

    fn with_key(&self, key: &'a str) -> Self {
        Self { key, ..*self }
    }
}

/// Key of a raw filter token, whether or not the rest of it parses.
pub fn filter_key(token: &str) -> &str {
    match token.split_once(EXCLUDE).or_else(|| token.split_once(':')) {
        Some((key, _)) => key,
        None => token,
    }
}

pub(crate) fn property_of(key: &str) -> &str {
    KeyPath::segments(key).next().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct FilterCompiler {
    adapter: MappingAdapter,
}

impl FilterCompiler {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    pub fn compile(&self, token: &str, dto_type: &str) -> Result<FilterExpression, CompileError> {
        self.compile_token(&FilterToken::parse(token)?, dto_type)
    }

    /// The declared comparison of the token's first key segment.
    ///
    /// # Errors
    ///
    /// `UnknownProperty` when the DTO has no such property, `NotFilterable`
    /// when it carries no declaration.
    pub fn compare_method(&self, property: &str, dto_type: &str) -> Result<CompareMethod, CompileError> {
        let declared = self
            .adapter
            .catalog()
            .require(dto_type)?
            .get(property)
            .ok_or_else(|| CompileError::UnknownProperty {
                dto: dto_type.to_string(),
                property: property.to_string(),
            })?;
        match declared.filterable.map(|f| f.compare_method) {
            None | Some(CompareMethod::Undefined) => Err(CompileError::NotFilterable(property.to_string())),
            Some(method) => Ok(method),
        }
    }

    pub fn compile_token(&self, token: &FilterToken<'_>, dto_type: &str) -> Result<FilterExpression, CompileError> {
        let property = token.property();
        let compare_method = self.compare_method(property, dto_type)?;
        let entity_type = origin(&self.adapter, dto_type)?;

        let (end_point, predicate, inner) = match compare_method {
            CompareMethod::Equals => {
                let path = KeyPath::resolve(&self.adapter, dto_type, token.key)?;
                let scalar = path.scalar(token.key)?;
                let predicate = values_predicate(token, &path.end_point, scalar)?;
                (path.end_point, predicate, None)
            }
            CompareMethod::ById => {
                if token.key != property {
                    return Err(path_error(token.key, property, "an id filter takes no sub-path"));
                }
                let member = self.adapter.resolve(dto_type, property)?;
                let (scalar, end_point) = self.foreign_key(&entity_type, &member.source.path, token.key)?;
                let predicate = values_predicate(token, &end_point, scalar)?;
                (end_point, predicate, None)
            }
            CompareMethod::Nested => {
                let rest = token
                    .key
                    .strip_prefix(property)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .ok_or_else(|| path_error(token.key, property, "a nested filter needs an element property"))?;
                let member = self.adapter.resolve(dto_type, property)?;
                let element = member
                    .dto_type
                    .element()
                    .and_then(|element| element.as_named())
                    .ok_or_else(|| path_error(token.key, property, "not a collection"))?;
                let inner = self.compile_token(&token.with_key(rest), element)?;
                let predicate = Predicate::Any {
                    collection: member.source.path.clone(),
                    inner: Box::new(inner.predicate.clone()),
                };
                (member.source.path, predicate, Some(Box::new(inner)))
            }
            CompareMethod::Undefined => return Err(CompileError::NotFilterable(property.to_string())),
        };

        tracing::trace!(key = token.key, ?end_point, ?compare_method, "filter compiled");
        Ok(FilterExpression {
            key: token.key.to_string(),
            end_point,
            compare_method,
            raw_value: token.raw_value.to_string(),
            entity_type,
            inner,
            expression_type: token.expression_type,
            predicate,
        })
    }

    /// Redirects a reference member chain to the foreign-key column behind
    /// its last step.
    fn foreign_key(
        &self,
        entity: &str,
        path: &[String],
        key: &str,
    ) -> Result<(ScalarType, Vec<String>), CompileError> {
        let Some((last, walk)) = path.split_last() else {
            return Err(path_error(key, key, "no source member"));
        };
        let mut owner = entity.to_string();
        for step in walk {
            let property = self.adapter.entity_property(&owner, step)?;
            owner = property
                .ty
                .as_named()
                .ok_or_else(|| path_error(key, step, "crosses a collection"))?
                .to_string();
        }
        let reference = self.adapter.entity_property(&owner, last)?;
        let Some(Relation::Reference { foreign_key }) = &reference.relation else {
            return Err(path_error(key, last, "not a reference"));
        };
        let scalar = self
            .adapter
            .entity_property(&owner, foreign_key)?
            .ty
            .as_scalar()
            .ok_or_else(|| path_error(key, foreign_key, "foreign key is not a scalar"))?;
        let mut end_point = walk.to_vec();
        end_point.push(foreign_key.clone());
        Ok((scalar, end_point))
    }
}

/// An OR chain over the token's values, negated when excluding.
fn values_predicate(token: &FilterToken<'_>, member: &[String], scalar: ScalarType) -> Result<Predicate, CompileError> {
    let parse = |text: &str| -> Result<Value, CompileError> {
        scalar.parse_str(text).ok_or_else(|| CompileError::InvalidValue {
            value: text.to_string(),
            expected: scalar.to_string(),
        })
    };
    let mut tests = token
        .values()?
        .into_iter()
        .map(|value| match value {
            RawValue::Exact(text) => Ok(Predicate::Eq {
                member: member.to_vec(),
                value: parse(text)?,
            }),
            RawValue::Range { low, high } => Ok(Predicate::Range {
                member: member.to_vec(),
                low: low.map(parse).transpose()?,
                high: high.map(parse).transpose()?,
            }),
        })
        .collect::<Result<Vec<_>, CompileError>>()?;
    let matched = if tests.len() == 1 {
        tests.remove(0)
    } else {
        Predicate::Or(tests)
    };
    Ok(match token.expression_type {
        ExpressionType::Include => matched,
        ExpressionType::Exclude => Predicate::Not(Box::new(matched)),
    })
}

fn path_error(key: &str, segment: &str, reason: &str) -> CompileError {
    CompileError::Path {
        key: key.to_string(),
        segment: segment.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_needs_the_bang_right_before_the_colon() {
        let token = FilterToken::parse("name:!x").unwrap();
        assert_eq!(token.expression_type, ExpressionType::Include);
        assert_eq!(token.raw_value, "!x");

        let token = FilterToken::parse("a!:b:c").unwrap();
        assert_eq!((token.key, token.raw_value), ("a", "b:c"));
    }

    #[test]
    fn exclusion_marker_is_found_before_the_first_colon() {
        let token = FilterToken::parse("a:b!:c").unwrap();
        assert_eq!(token.key, "a:b");
        assert_eq!(token.expression_type, ExpressionType::Exclude);
        assert_eq!(token.raw_value, "c");
        assert_eq!(filter_key("a:b!:c"), "a:b");
        assert_eq!(filter_key("name:x"), "name");
        assert_eq!(filter_key("name"), "name");
    }

    #[test]
    fn malformed_tokens() {
        for token in ["", "id", ":3", "!:3", "id:", "id!:"] {
            assert!(matches!(FilterToken::parse(token), Err(CompileError::Malformed(_))), "{token}");
        }
    }

    #[test]
    fn values_and_ranges() {
        let token = FilterToken::parse("n:1,2..5,..9,3..").unwrap();
        assert_eq!(
            token.values().unwrap(),
            [
                RawValue::Exact("1"),
                RawValue::Range { low: Some("2"), high: Some("5") },
                RawValue::Range { low: None, high: Some("9") },
                RawValue::Range { low: Some("3"), high: None },
            ]
        );
        assert!(FilterToken::parse("n:..").unwrap().values().is_err());
        assert!(FilterToken::parse("n:1,,2").unwrap().values().is_err());
    }

    #[test]
    fn keys_of_raw_tokens() {
        assert_eq!(filter_key("channels.id!:4"), "channels.id");
        assert_eq!(filter_key("name:x"), "name");
        assert_eq!(filter_key("name"), "name");
        assert_eq!(property_of("channels.id"), "channels");
    }
}
