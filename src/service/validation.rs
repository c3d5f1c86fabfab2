//! Request validation from declarative field rules.
//!
//! Every rule is checked and every failure collected, so one 422 reports all bad fields.

use crate::error::{FieldError, ValidationErrors};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Uuid,
}

/// Constraints for one named input field.
#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub pattern: Option<&'static str>,
    pub allowed: Option<&'static [&'static str]>,
}

impl FieldRule {
    const fn of(name: &'static str, ty: FieldType) -> Self {
        FieldRule {
            name,
            ty,
            required: false,
            max_length: None,
            minimum: None,
            maximum: None,
            pattern: None,
            allowed: None,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::of(name, FieldType::String)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::of(name, FieldType::Integer)
    }

    pub const fn uuid(name: &'static str) -> Self {
        Self::of(name, FieldType::Uuid)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub const fn range(mut self, minimum: Option<i64>, maximum: Option<i64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub const fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }
}

/// A request body checked against `RULES` before it is deserialized.
pub trait Validate {
    const RULES: &'static [FieldRule];
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a JSON body against `rules`. Keys without a rule are rejected.
    pub fn validate_body(body: &Value, rules: &[FieldRule]) -> Result<(), ValidationErrors> {
        let Some(map) = body.as_object() else {
            return Err(ValidationErrors::single(FieldError::new(
                &["body"],
                "model_attributes_type",
                "Input should be a valid dictionary or object to extract fields from",
            )));
        };
        let mut errors = ValidationErrors::default();
        for key in map.keys() {
            if !rules.iter().any(|r| r.name == key) {
                errors.push(FieldError::new(&["body", key.as_str()], "extra_forbidden", "Extra inputs are not permitted"));
            }
        }
        check_all("body", map, rules, &mut errors);
        errors.into_result()
    }

    /// Coerce query-string values to the rule types and validate them.
    /// Parameters without a rule are ignored. Returns the typed values for deserialization.
    pub fn validate_query(
        params: &HashMap<String, String>,
        rules: &[FieldRule],
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut typed = Map::new();
        let mut coerced = Vec::with_capacity(rules.len());
        for rule in rules {
            match params.get(rule.name).map(|raw| coerce(raw, rule.ty)) {
                Some(Some(v)) => {
                    typed.insert(rule.name.to_string(), v);
                    coerced.push(*rule);
                }
                Some(None) => errors.push(type_error("query", rule, true)),
                None => coerced.push(*rule),
            }
        }
        check_all("query", &typed, &coerced, &mut errors);
        errors.into_result().map(|_| typed)
    }
}

fn coerce(raw: &str, ty: FieldType) -> Option<Value> {
    match ty {
        FieldType::String | FieldType::Uuid => Some(Value::String(raw.to_string())),
        FieldType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
    }
}

fn check_all(location: &str, input: &Map<String, Value>, rules: &[FieldRule], errors: &mut ValidationErrors) {
    for rule in rules {
        match input.get(rule.name) {
            None | Some(Value::Null) if rule.required => {
                errors.push(FieldError::new(&[location, rule.name], "missing", "Field required"));
            }
            None | Some(Value::Null) => {}
            Some(v) => {
                if let Err(e) = validate_field(location, v, rule) {
                    errors.push(e);
                }
            }
        }
    }
}

fn type_error(location: &str, rule: &FieldRule, from_string: bool) -> FieldError {
    let loc = [location, rule.name];
    match rule.ty {
        FieldType::Integer if from_string => FieldError::new(
            &loc,
            "int_parsing",
            "Input should be a valid integer, unable to parse string as an integer",
        ),
        FieldType::Integer => FieldError::new(&loc, "int_type", "Input should be a valid integer"),
        FieldType::String => FieldError::new(&loc, "string_type", "Input should be a valid string"),
        FieldType::Uuid if from_string => FieldError::new(&loc, "uuid_parsing", "Input should be a valid UUID"),
        FieldType::Uuid => FieldError::new(&loc, "uuid_type", "UUID input should be a string"),
    }
}

fn validate_field(location: &str, v: &Value, rule: &FieldRule) -> Result<(), FieldError> {
    let loc = [location, rule.name];
    match rule.ty {
        FieldType::String => {
            let s = v.as_str().ok_or_else(|| type_error(location, rule, false))?;
            if let Some(max) = rule.max_length {
                if s.chars().count() > max {
                    return Err(FieldError::new(
                        &loc,
                        "string_too_long",
                        format!("String should have at most {} characters", max),
                    ));
                }
            }
            if let Some(pattern) = rule.pattern {
                let re = Regex::new(pattern)
                    .map_err(|_| FieldError::new(&loc, "value_error", format!("invalid pattern for {}", rule.name)))?;
                if !re.is_match(s) {
                    return Err(FieldError::new(
                        &loc,
                        "string_pattern_mismatch",
                        format!("String should match pattern '{}'", pattern),
                    ));
                }
            }
            if let Some(allowed) = rule.allowed {
                if !allowed.contains(&s) {
                    return Err(FieldError::new(
                        &loc,
                        "literal_error",
                        format!("Input should be {}", describe_choices(allowed)),
                    ));
                }
            }
        }
        FieldType::Integer => {
            let n = v.as_i64().ok_or_else(|| type_error(location, rule, false))?;
            if let Some(min) = rule.minimum {
                if n < min {
                    return Err(FieldError::new(
                        &loc,
                        "greater_than_equal",
                        format!("Input should be greater than or equal to {}", min),
                    ));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    return Err(FieldError::new(
                        &loc,
                        "less_than_equal",
                        format!("Input should be less than or equal to {}", max),
                    ));
                }
            }
        }
        FieldType::Uuid => {
            let s = v.as_str().ok_or_else(|| type_error(location, rule, false))?;
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(type_error(location, rule, true));
            }
        }
    }
    Ok(())
}

/// `'a', 'b' or 'c'`
fn describe_choices(allowed: &[&str]) -> String {
    let quoted: Vec<String> = allowed.iter().map(|a| format!("'{}'", a)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &[FieldRule] = &[
        FieldRule::integer("skip").range(Some(0), None),
        FieldRule::integer("limit").range(Some(1), Some(100)),
    ];

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn query_values_are_coerced() {
        let typed = RequestValidator::validate_query(&params(&[("skip", "5"), ("limit", "10"), ("x", "y")]), PAGE).unwrap();
        assert_eq!(typed.get("skip"), Some(&json!(5)));
        assert_eq!(typed.get("limit"), Some(&json!(10)));
        assert!(typed.get("x").is_none());
    }

    #[test]
    fn query_bounds_are_reported_together() {
        let errs = RequestValidator::validate_query(&params(&[("skip", "-1"), ("limit", "101")]), PAGE).unwrap_err();
        assert_eq!(errs.0.len(), 2);
        assert_eq!(errs.0[0].kind, "greater_than_equal");
        assert_eq!(errs.0[0].loc, vec!["query", "skip"]);
        assert_eq!(errs.0[1].kind, "less_than_equal");
        assert_eq!(errs.0[1].msg, "Input should be less than or equal to 100");
    }

    #[test]
    fn unparseable_integer() {
        let errs = RequestValidator::validate_query(&params(&[("limit", "ten")]), PAGE).unwrap_err();
        assert_eq!(errs.0.len(), 1);
        assert_eq!(errs.0[0].kind, "int_parsing");
    }

    #[test]
    fn pattern_and_choices() {
        const RULES: &[FieldRule] = &[
            FieldRule::string("order").pattern("^(asc|desc)$"),
            FieldRule::string("sort_by").one_of(&["name", "title"]),
        ];
        let errs =
            RequestValidator::validate_query(&params(&[("order", "up"), ("sort_by", "password")]), RULES).unwrap_err();
        assert_eq!(errs.0[0].kind, "string_pattern_mismatch");
        assert_eq!(errs.0[1].kind, "literal_error");
        assert_eq!(errs.0[1].msg, "Input should be 'name' or 'title'");
    }

    #[test]
    fn body_rules() {
        const RULES: &[FieldRule] = &[
            FieldRule::integer("version").required().range(Some(1), None),
            FieldRule::string("name").max_length(3),
            FieldRule::uuid("id"),
        ];
        assert!(RequestValidator::validate_body(&json!({"version": 1, "name": "abc"}), RULES).is_ok());
        assert!(RequestValidator::validate_body(&json!({"version": 1, "name": null}), RULES).is_ok());

        let errs = RequestValidator::validate_body(&json!({"name": "abcd", "id": "nope", "extra": 1}), RULES).unwrap_err();
        let kinds: Vec<&str> = errs.0.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["extra_forbidden", "missing", "string_too_long", "uuid_parsing"]);
    }

    #[test]
    fn max_length_counts_characters() {
        const RULES: &[FieldRule] = &[FieldRule::string("name").max_length(2)];
        assert!(RequestValidator::validate_body(&json!({"name": "éé"}), RULES).is_ok());
    }

    #[test]
    fn body_must_be_object() {
        let errs = RequestValidator::validate_body(&json!([1, 2]), &[]).unwrap_err();
        assert_eq!(errs.0[0].loc, vec!["body"]);
    }

    #[test]
    fn wrong_json_type() {
        const RULES: &[FieldRule] = &[FieldRule::integer("version")];
        let errs = RequestValidator::validate_body(&json!({"version": "1"}), RULES).unwrap_err();
        assert_eq!(errs.0[0].kind, "int_type");
    }
}
