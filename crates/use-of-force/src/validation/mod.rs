//! Schema-driven validation of form answers.
//!
//! Validation walks a [`Schema`] alongside a JSON answer document and produces
//! one [`ValidationError`] per failing field, in schema field order. Each error
//! carries the user-facing message and an `href` anchor pointing at the
//! offending input, so a form can be re-rendered with an error summary.
//!
//! Two modes are supported:
//!
//! - **Full**: every rule applies. Used on "save and continue" and by the
//!   section status checker.
//! - **Partial**: missing answers and short lists are tolerated but anything
//!   that *was* answered must still be well formed. Used on "save and return".
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use serde_json::json;
//! use use_of_force::schema::Schema;
//! use use_of_force::validation::{process_input, ValidationContext};
//!
//! let schema = Schema::object([(
//!     "locationId",
//!     Schema::number().integer().required().message_all("Select the location of the incident"),
//! )]);
//!
//! let processed = process_input(&schema, &json!({"locationId": " "}), &ValidationContext::full(Utc::now()));
//! assert_eq!(processed.errors[0].text, "Select the location of the incident");
//! assert_eq!(processed.errors[0].href, "#locationId");
//! ```

pub mod patterns;

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::sanitiser;
use crate::schema::{values_equal, Bound, ErrorCode, Kind, Schema};

/// How strictly answers are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Every rule applies.
    #[default]
    Full,
    /// Missing answers are tolerated.
    Partial,
}

/// Inputs to validation that are not part of the answers themselves.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    /// Clock used for "not in the future" and "current year" rules.
    pub now: DateTime<Utc>,
    /// Strictness.
    pub mode: ValidationMode,
}

impl ValidationContext {
    /// A full validation context.
    #[must_use]
    pub fn full(now: DateTime<Utc>) -> Self {
        Self {
            now,
            mode: ValidationMode::Full,
        }
    }

    /// A partial validation context.
    #[must_use]
    pub fn partial(now: DateTime<Utc>) -> Self {
        Self {
            now,
            mode: ValidationMode::Partial,
        }
    }

    /// Whether missing answers are tolerated.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.mode == ValidationMode::Partial
    }
}

/// One step of a path into an answer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A single field error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Message shown to the user.
    pub text: String,
    /// Anchor of the offending input, e.g. `#witnesses[1][name]`.
    pub href: String,
    /// Path of the offending value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ValidationError {
    /// Create an error for the value at `path`.
    #[must_use]
    pub fn new(path: Vec<PathSegment>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href(&path),
            path,
        }
    }
}

/// Build the anchor for a path: the first segment bare, then each later
/// segment in brackets.
#[must_use]
pub fn href(path: &[PathSegment]) -> String {
    let mut anchor = String::from("#");
    for (i, segment) in path.iter().enumerate() {
        if i == 0 {
            anchor.push_str(&segment.to_string());
        } else {
            anchor.push('[');
            anchor.push_str(&segment.to_string());
            anchor.push(']');
        }
    }
    anchor
}

/// Sanitised answers together with any errors found in them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedInput {
    /// The sanitised payload.
    pub payload: Value,
    /// Field errors, in form order.
    pub errors: Vec<ValidationError>,
}

impl ProcessedInput {
    /// Whether no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return the payload, or a validation error carrying the field errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any field failed.
    pub fn into_result(self) -> Result<Value> {
        if self.errors.is_empty() {
            Ok(self.payload)
        } else {
            Err(Error::validation(self.errors))
        }
    }
}

/// Validate `value` against `schema`.
#[must_use]
pub fn validate(schema: &Schema, value: &Value, ctx: &ValidationContext) -> Vec<ValidationError> {
    let mut walker = Walker {
        ctx,
        path: Vec::new(),
        errors: Vec::new(),
    };
    walker.walk(schema, Some(value), None);

    let mut seen = HashSet::new();
    walker.errors.retain(|e| seen.insert(e.href.clone()));
    walker.errors
}

/// Check whether `value` satisfies `schema`.
#[must_use]
pub fn is_valid(schema: &Schema, value: &Value, ctx: &ValidationContext) -> bool {
    validate(schema, value, ctx).is_empty()
}

/// Sanitise raw user input and validate the result.
#[must_use]
pub fn process_input(schema: &Schema, input: &Value, ctx: &ValidationContext) -> ProcessedInput {
    let payload = sanitiser::sanitise(schema, input);
    let errors = validate(schema, &payload, ctx);
    trace!(errors = errors.len(), mode = ?ctx.mode, "Processed form input");
    ProcessedInput { payload, errors }
}

/// A rule failure before it is turned into a message.
struct Failure {
    code: ErrorCode,
    detail: String,
}

impl Failure {
    fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

type Check = std::result::Result<(), Failure>;

struct Walker<'a> {
    ctx: &'a ValidationContext,
    path: Vec<PathSegment>,
    errors: Vec<ValidationError>,
}

impl Walker<'_> {
    fn walk(&mut self, schema: &Schema, value: Option<&Value>, parent: Option<&Map<String, Value>>) {
        if let Some(cond) = schema.conditional() {
            if cond.holds(parent) {
                self.walk(&cond.then, value, parent);
            }
            return;
        }

        let value = match value {
            None | Some(Value::Null) => {
                if schema.is_required() && !self.ctx.is_partial() {
                    self.fail(schema, &Failure::new(ErrorCode::Required, "is required"));
                }
                return;
            }
            Some(v) => v,
        };

        if let Err(failure) = self.check(schema, value, parent) {
            self.fail(schema, &failure);
        }
    }

    fn check(&mut self, schema: &Schema, value: &Value, parent: Option<&Map<String, Value>>) -> Check {
        match schema.kind() {
            Kind::Any => Ok(()),
            Kind::String => self.check_string(schema, value, parent),
            Kind::Number => self.check_number(schema, value, parent),
            Kind::Boolean => {
                if value.is_boolean() {
                    check_allowed(schema, value)
                } else {
                    Err(type_failure(schema))
                }
            }
            Kind::Date => self.check_date(schema, value),
            Kind::Object(fields) => {
                let Some(obj) = value.as_object() else {
                    return Err(type_failure(schema));
                };
                for field in fields {
                    self.path.push(PathSegment::Key(field.name.clone()));
                    self.walk(&field.schema, obj.get(&field.name), Some(obj));
                    self.path.pop();
                }
                Ok(())
            }
            Kind::Array(item) => self.check_array(schema, item, value),
        }
    }

    fn check_string(&self, schema: &Schema, value: &Value, parent: Option<&Map<String, Value>>) -> Check {
        let Some(s) = value.as_str() else {
            return Err(type_failure(schema));
        };
        #[allow(clippy::cast_precision_loss)]
        let len = s.chars().count() as f64;
        if let Some(min) = self.resolve(schema.min_bound(), parent) {
            if len < min {
                return Err(Failure::new(
                    ErrorCode::Min,
                    format!("must be at least {min} characters long"),
                ));
            }
        }
        if let Some(max) = self.resolve(schema.max_bound(), parent) {
            if len > max {
                return Err(Failure::new(
                    ErrorCode::Max,
                    format!("must be at most {max} characters long"),
                ));
            }
        }
        if let Some(pattern) = schema.pattern_rule() {
            if !pattern.matches(s) {
                return Err(Failure::new(
                    ErrorCode::Pattern,
                    format!("fails to match the {} pattern", pattern.name),
                ));
            }
        }
        check_allowed(schema, value)
    }

    fn check_number(&self, schema: &Schema, value: &Value, parent: Option<&Map<String, Value>>) -> Check {
        let Some(n) = value.as_f64() else {
            return Err(type_failure(schema));
        };
        if schema.is_integer() && n.fract() != 0.0 {
            return Err(Failure::new(ErrorCode::Integer, "must be an integer"));
        }
        if let Some(min) = self.resolve(schema.min_bound(), parent) {
            if n < min {
                return Err(Failure::new(
                    ErrorCode::Min,
                    format!("must be greater than or equal to {min}"),
                ));
            }
        }
        if let Some(max) = self.resolve(schema.max_bound(), parent) {
            if n > max {
                return Err(Failure::new(
                    ErrorCode::Max,
                    format!("must be less than or equal to {max}"),
                ));
            }
        }
        check_allowed(schema, value)
    }

    fn check_date(&self, schema: &Schema, value: &Value) -> Check {
        let parsed = value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        let Some(date) = parsed else {
            return Err(type_failure(schema));
        };
        if schema.rejects_future() && date.with_timezone(&Utc) > self.ctx.now {
            return Err(Failure::new(ErrorCode::Future, "must not be in the future"));
        }
        Ok(())
    }

    fn check_array(&mut self, schema: &Schema, item: &Schema, value: &Value) -> Check {
        let Some(items) = value.as_array() else {
            return Err(type_failure(schema));
        };

        if let Some(min) = schema.min_items_rule() {
            if items.len() < min && !self.ctx.is_partial() {
                return Err(Failure::new(
                    ErrorCode::MinItems,
                    format!("must contain at least {min} items"),
                ));
            }
        }

        for (i, entry) in items.iter().enumerate() {
            self.path.push(PathSegment::Index(i));
            self.walk(item, Some(entry), None);
            self.path.pop();
        }

        if let Some(key) = schema.unique_key() {
            let mut seen = HashSet::new();
            for (i, entry) in items.iter().enumerate() {
                let Some(text) = entry.get(key).and_then(Value::as_str) else {
                    continue;
                };
                if !seen.insert(text.to_lowercase()) {
                    self.path.push(PathSegment::Index(i));
                    self.path.push(PathSegment::Key(key.to_string()));
                    self.fail(
                        schema,
                        &Failure::new(ErrorCode::Unique, format!("contains a duplicate value '{text}'")),
                    );
                    self.path.truncate(self.path.len() - 2);
                }
            }
        }

        Ok(())
    }

    fn resolve(&self, bound: Option<&Bound>, parent: Option<&Map<String, Value>>) -> Option<f64> {
        match bound? {
            Bound::Value(v) => Some(*v),
            Bound::Sibling(name) => parent.and_then(|p| p.get(name)).and_then(Value::as_f64),
            Bound::CurrentYear => Some(f64::from(self.ctx.now.year())),
        }
    }

    fn fail(&mut self, schema: &Schema, failure: &Failure) {
        let text = schema.message_for(failure.code).unwrap_or_else(|| {
            let label = schema
                .question()
                .map(str::to_string)
                .or_else(|| self.path.last().map(ToString::to_string))
                .unwrap_or_else(|| "value".to_string());
            format!("\"{label}\" {}", failure.detail)
        });
        self.errors.push(ValidationError::new(self.path.clone(), text));
    }
}

fn type_failure(schema: &Schema) -> Failure {
    Failure::new(ErrorCode::Base, format!("must be {}", schema.kind().type_name()))
}

fn check_allowed(schema: &Schema, value: &Value) -> Check {
    let allowed = schema.allowed();
    if allowed.is_empty() || allowed.iter().any(|a| values_equal(a, value)) {
        return Ok(());
    }
    let listed = allowed
        .iter()
        .map(|a| match a {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    Err(Failure::new(ErrorCode::Only, format!("must be one of [{listed}]")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Sanitiser;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn full() -> ValidationContext {
        ValidationContext::full(now())
    }

    fn witnesses_schema() -> Schema {
        Schema::object([(
            "witnesses",
            Schema::array(Schema::object([(
                "name",
                Schema::string()
                    .required()
                    .pattern(patterns::person_name())
                    .message(ErrorCode::Required, "Enter the name of the witness")
                    .message(ErrorCode::Pattern, "Names may only contain letters"),
            )]))
            .unique_by("name")
            .message(ErrorCode::Unique, "Witness names must be unique")
            .sanitiser(Sanitiser::RemoveEmptyObjects),
        )])
    }

    #[test]
    fn test_href_format() {
        let path = vec![
            PathSegment::Key("witnesses".to_string()),
            PathSegment::Index(1),
            PathSegment::Key("name".to_string()),
        ];
        assert_eq!(href(&path), "#witnesses[1][name]");
        assert_eq!(href(&[PathSegment::Key("a".to_string())]), "#a");
        assert_eq!(href(&[]), "#");
    }

    #[test]
    fn test_required_missing_in_full_mode() {
        let schema = Schema::object([("flag", Schema::boolean().required())]);
        let errors = validate(&schema, &json!({}), &full());

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "\"flag\" is required");
        assert_eq!(errors[0].href, "#flag");
    }

    #[test]
    fn test_required_tolerated_in_partial_mode() {
        let schema = Schema::object([("flag", Schema::boolean().required())]);
        let errors = validate(&schema, &json!({}), &ValidationContext::partial(now()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_partial_mode_still_checks_answers() {
        let schema = Schema::object([("flag", Schema::boolean().required())]);
        let errors = validate(&schema, &json!({"flag": "maybe"}), &ValidationContext::partial(now()));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "\"flag\" must be a boolean");
    }

    #[test]
    fn test_custom_message_used() {
        let schema = Schema::object([(
            "flag",
            Schema::boolean().required().message_all("Select yes if the flag was raised"),
        )]);
        let errors = validate(&schema, &json!({"flag": 3}), &full());
        assert_eq!(errors[0].text, "Select yes if the flag was raised");
    }

    #[test]
    fn test_allowed_values() {
        let schema = Schema::object([("cuffs", Schema::string().valid(["FIXED", "RATCHET"]))]);
        assert!(is_valid(&schema, &json!({"cuffs": "FIXED"}), &full()));

        let errors = validate(&schema, &json!({"cuffs": "ROPE"}), &full());
        assert_eq!(errors[0].text, "\"cuffs\" must be one of [FIXED, RATCHET]");
    }

    #[test]
    fn test_allowed_numbers_compare_numerically() {
        let schema = Schema::object([("officers", Schema::number().valid([1, 2]))]);
        assert!(is_valid(&schema, &json!({"officers": 2.0}), &full()));
        assert!(!is_valid(&schema, &json!({"officers": 3}), &full()));
    }

    #[test]
    fn test_integer_and_bounds() {
        let schema = Schema::object([("month", Schema::number().integer().min(0).max(11))]);
        assert!(is_valid(&schema, &json!({"month": 0}), &full()));
        assert!(!is_valid(&schema, &json!({"month": 1.5}), &full()));
        assert!(!is_valid(&schema, &json!({"month": -1}), &full()));
        assert!(!is_valid(&schema, &json!({"month": 12}), &full()));
    }

    #[test]
    fn test_sibling_bound() {
        let schema = Schema::object([
            ("trainingYear", Schema::number().integer()),
            (
                "startYear",
                Schema::number().integer().max(Bound::Sibling("trainingYear".to_string())),
            ),
        ]);
        assert!(is_valid(&schema, &json!({"trainingYear": 2020, "startYear": 2015}), &full()));
        assert!(!is_valid(&schema, &json!({"trainingYear": 2020, "startYear": 2021}), &full()));
        // Missing sibling means no bound.
        assert!(is_valid(&schema, &json!({"startYear": 2021}), &full()));
    }

    #[test]
    fn test_current_year_bound() {
        let schema = Schema::object([("year", Schema::number().max(Bound::CurrentYear))]);
        assert!(is_valid(&schema, &json!({"year": 2024}), &full()));
        assert!(!is_valid(&schema, &json!({"year": 2025}), &full()));
    }

    #[test]
    fn test_string_length_bounds() {
        let schema = Schema::object([("text", Schema::string().min(2).max(4))]);
        assert!(is_valid(&schema, &json!({"text": "abc"}), &full()));
        assert!(!is_valid(&schema, &json!({"text": "a"}), &full()));
        assert!(!is_valid(&schema, &json!({"text": "abcde"}), &full()));
    }

    #[test]
    fn test_date_rules() {
        let schema = Schema::object([("when", Schema::date().required().not_in_future())]);
        assert!(is_valid(&schema, &json!({"when": "2024-05-31T09:00:00+00:00"}), &full()));

        let errors = validate(&schema, &json!({"when": "2024-06-02T09:00:00+00:00"}), &full());
        assert_eq!(errors[0].text, "\"when\" must not be in the future");

        let errors = validate(&schema, &json!({"when": "yesterday"}), &full());
        assert_eq!(errors[0].text, "\"when\" must be a valid date");
    }

    #[test]
    fn test_conditional_only_applies_when_sibling_matches() {
        let schema = Schema::object([
            ("batonDrawn", Schema::boolean().required()),
            (
                "batonUsed",
                Schema::when(
                    "batonDrawn",
                    json!(true),
                    Schema::boolean().required().message_all("Select yes if a baton was used"),
                ),
            ),
        ]);

        assert!(is_valid(&schema, &json!({"batonDrawn": false}), &full()));
        // Otherwise branch accepts anything, including stale answers.
        assert!(is_valid(&schema, &json!({"batonDrawn": false, "batonUsed": "x"}), &full()));

        let errors = validate(&schema, &json!({"batonDrawn": true}), &full());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "Select yes if a baton was used");
        assert_eq!(errors[0].href, "#batonUsed");
    }

    #[test]
    fn test_nested_array_errors_have_indexed_hrefs() {
        let schema = witnesses_schema();
        let errors = validate(
            &schema,
            &json!({"witnesses": [{"name": "Jo Bloggs"}, {"name": "R2D2"}]}),
            &full(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "Names may only contain letters");
        assert_eq!(errors[0].href, "#witnesses[1][name]");
    }

    #[test]
    fn test_unique_by_ignores_case() {
        let schema = witnesses_schema();
        let errors = validate(
            &schema,
            &json!({"witnesses": [{"name": "Jo Bloggs"}, {"name": "JO BLOGGS"}]}),
            &full(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "Witness names must be unique");
        assert_eq!(errors[0].href, "#witnesses[1][name]");
    }

    #[test]
    fn test_min_items_full_and_partial() {
        let schema = Schema::object([(
            "cameras",
            Schema::array(Schema::string()).min_items(1),
        )]);
        let errors = validate(&schema, &json!({"cameras": []}), &full());
        assert_eq!(errors[0].text, "\"cameras\" must contain at least 1 items");
        assert!(validate(&schema, &json!({"cameras": []}), &ValidationContext::partial(now())).is_empty());
    }

    #[test]
    fn test_errors_follow_field_order() {
        let schema = Schema::object([
            ("first", Schema::string().required()),
            ("second", Schema::string().required()),
            ("third", Schema::string().required()),
        ]);
        let errors = validate(&schema, &json!({"second": "x"}), &full());
        let hrefs: Vec<&str> = errors.iter().map(|e| e.href.as_str()).collect();
        assert_eq!(hrefs, vec!["#first", "#third"]);
    }

    #[test]
    fn test_process_input_sanitises_before_validating() {
        let schema = Schema::object([("locationId", Schema::number().integer().required())]);
        let processed = process_input(&schema, &json!({"locationId": " 12 ", "extra": 1}), &full());

        assert!(processed.is_valid());
        assert_eq!(processed.payload, json!({"locationId": 12}));
    }

    #[test]
    fn test_into_result() {
        let schema = Schema::object([("name", Schema::string().required())]);
        let ok = process_input(&schema, &json!({"name": "x"}), &full()).into_result();
        assert_eq!(ok.unwrap(), json!({"name": "x"}));

        let err = process_input(&schema, &json!({}), &full()).into_result().unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(err.field_errors()[0].href, "#name");
    }

    #[test]
    fn test_validation_error_serialization() {
        let error = ValidationError::new(
            vec![PathSegment::Key("a".to_string()), PathSegment::Index(0)],
            "Bad",
        );
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, json!({"text": "Bad", "href": "#a[0]", "path": ["a", 0]}));
    }
}
