//! Declarative schemas for nested form payloads.
//!
//! A [`Schema`] describes the expected shape of a JSON answer document: the
//! type of each value, which answers are required, permitted values, bounds,
//! patterns, and conditional rules that only apply when a sibling answer has
//! a particular value. The same description drives both the
//! [sanitiser](crate::sanitiser) and [validation](crate::validation).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use use_of_force::schema::{ErrorCode, Schema};
//!
//! let schema = Schema::object([
//!     ("batonDrawn", Schema::boolean().required().message_all("Select yes if a baton was drawn")),
//!     (
//!         "batonUsed",
//!         Schema::when("batonDrawn", json!(true), Schema::boolean().required()),
//!     ),
//! ]);
//!
//! assert_eq!(schema.fields().len(), 2);
//! assert_eq!(
//!     schema.fields()[0].schema.message_for(ErrorCode::Required).as_deref(),
//!     Some("Select yes if a baton was drawn")
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::validation::patterns::Pattern;

/// The type of value a schema accepts.
#[derive(Debug, Clone)]
pub enum Kind {
    /// Anything, left untouched.
    Any,
    /// A string.
    String,
    /// A number.
    Number,
    /// A boolean.
    Boolean,
    /// A date-time, held as an RFC3339 string.
    Date,
    /// An object with known fields, in display order.
    Object(Vec<Field>),
    /// An array whose items all match one schema.
    Array(Box<Schema>),
}

impl Kind {
    /// Human-readable type name used in default messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Date => "a valid date",
            Self::Object(_) => "an object",
            Self::Array(_) => "an array",
        }
    }
}

/// A named field of an object schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Key of the field in the answer document.
    pub name: String,
    /// Schema for the field's value.
    pub schema: Schema,
}

/// The kind of rule a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    /// A required answer is missing.
    Required,
    /// The value has the wrong type.
    Base,
    /// The value is not one of the permitted values.
    Only,
    /// The number is not an integer.
    Integer,
    /// The value is below its lower bound.
    Min,
    /// The value is above its upper bound.
    Max,
    /// The string does not match the required pattern.
    Pattern,
    /// The array has too few items.
    MinItems,
    /// An array item repeats an earlier item.
    Unique,
    /// The date lies in the future.
    Future,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Required => "required",
            Self::Base => "base",
            Self::Only => "only",
            Self::Integer => "integer",
            Self::Min => "min",
            Self::Max => "max",
            Self::Pattern => "pattern",
            Self::MinItems => "min_items",
            Self::Unique => "unique",
            Self::Future => "future",
        };
        f.write_str(name)
    }
}

/// A numeric (or string length) bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// A fixed value.
    Value(f64),
    /// The value of a sibling field in the same object.
    Sibling(String),
    /// The calendar year of the validation clock.
    CurrentYear,
}

/// A rule that only applies when a sibling answer has a given value.
#[derive(Debug, Clone)]
pub struct Conditional {
    /// Name of the sibling field inspected.
    pub sibling: String,
    /// Value the sibling must hold for `then` to apply.
    pub is: Value,
    /// Schema applied when the condition holds.
    pub then: Box<Schema>,
}

impl Conditional {
    /// Check whether the condition holds for the given parent object.
    #[must_use]
    pub fn holds(&self, parent: Option<&serde_json::Map<String, Value>>) -> bool {
        parent
            .and_then(|p| p.get(&self.sibling))
            .is_some_and(|v| values_equal(v, &self.is))
    }
}

/// Compare two answers, treating numbers by value so `2` equals `2.0`.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Post-processing applied by the sanitiser after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitiser {
    /// Upper-case string values.
    UpperCase,
    /// Collapse runs of whitespace to a single space.
    CollapseWhitespace,
    /// Drop array items that are empty objects.
    RemoveEmptyObjects,
}

/// A schema node.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: Kind,
    required: bool,
    allowed: Vec<Value>,
    integer: bool,
    min: Option<Bound>,
    max: Option<Bound>,
    pattern: Option<Pattern>,
    min_items: Option<usize>,
    unique_by: Option<String>,
    not_in_future: bool,
    when: Option<Conditional>,
    messages: BTreeMap<ErrorCode, String>,
    fallback_message: Option<String>,
    sanitiser: Option<Sanitiser>,
    label: Option<String>,
}

impl Schema {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            required: false,
            allowed: Vec::new(),
            integer: false,
            min: None,
            max: None,
            pattern: None,
            min_items: None,
            unique_by: None,
            not_in_future: false,
            when: None,
            messages: BTreeMap::new(),
            fallback_message: None,
            sanitiser: None,
            label: None,
        }
    }

    /// A schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    /// A number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// A date-time schema.
    #[must_use]
    pub fn date() -> Self {
        Self::of(Kind::Date)
    }

    /// An object schema with fields in the given order.
    #[must_use]
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, schema)| Field {
                name: name.into(),
                schema,
            })
            .collect();
        Self::of(Kind::Object(fields))
    }

    /// An array schema whose items match `item`.
    #[must_use]
    pub fn array(item: Schema) -> Self {
        Self::of(Kind::Array(Box::new(item)))
    }

    /// A conditional schema: `then` applies when `sibling` equals `is`,
    /// otherwise any value is accepted.
    #[must_use]
    pub fn when(sibling: impl Into<String>, is: Value, then: Schema) -> Self {
        let mut schema = Self::any();
        schema.when = Some(Conditional {
            sibling: sibling.into(),
            is,
            then: Box::new(then),
        });
        schema
    }

    /// Mark the value as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the value to the given set.
    #[must_use]
    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Require a whole number.
    #[must_use]
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Set the lower bound (string length for strings).
    #[must_use]
    pub fn min(mut self, bound: impl Into<Bound>) -> Self {
        self.min = Some(bound.into());
        self
    }

    /// Set the upper bound (string length for strings).
    #[must_use]
    pub fn max(mut self, bound: impl Into<Bound>) -> Self {
        self.max = Some(bound.into());
        self
    }

    /// Require strings to match a pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Require at least `n` array items.
    #[must_use]
    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    /// Require array items to be unique by `key`, ignoring case.
    #[must_use]
    pub fn unique_by(mut self, key: impl Into<String>) -> Self {
        self.unique_by = Some(key.into());
        self
    }

    /// Reject dates after the validation clock.
    #[must_use]
    pub fn not_in_future(mut self) -> Self {
        self.not_in_future = true;
        self
    }

    /// Set the message for one error code.
    #[must_use]
    pub fn message(mut self, code: ErrorCode, text: impl Into<String>) -> Self {
        self.messages.insert(code, text.into());
        self
    }

    /// Set the message used for any error code without its own message.
    #[must_use]
    pub fn message_all(mut self, text: impl Into<String>) -> Self {
        self.fallback_message = Some(text.into());
        self
    }

    /// Attach a sanitiser hint.
    #[must_use]
    pub fn sanitiser(mut self, sanitiser: Sanitiser) -> Self {
        self.sanitiser = Some(sanitiser);
        self
    }

    /// Attach the question text for this field.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The value kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Whether an answer is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Permitted values; empty means unrestricted.
    #[must_use]
    pub fn allowed(&self) -> &[Value] {
        &self.allowed
    }

    /// Whether numbers must be whole.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    /// Lower bound.
    #[must_use]
    pub fn min_bound(&self) -> Option<&Bound> {
        self.min.as_ref()
    }

    /// Upper bound.
    #[must_use]
    pub fn max_bound(&self) -> Option<&Bound> {
        self.max.as_ref()
    }

    /// Required pattern.
    #[must_use]
    pub fn pattern_rule(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Minimum array length.
    #[must_use]
    pub fn min_items_rule(&self) -> Option<usize> {
        self.min_items
    }

    /// Uniqueness key for array items.
    #[must_use]
    pub fn unique_key(&self) -> Option<&str> {
        self.unique_by.as_deref()
    }

    /// Whether dates after the validation clock are rejected.
    #[must_use]
    pub fn rejects_future(&self) -> bool {
        self.not_in_future
    }

    /// Conditional rule, if this is a `when` schema.
    #[must_use]
    pub fn conditional(&self) -> Option<&Conditional> {
        self.when.as_ref()
    }

    /// Sanitiser hint.
    #[must_use]
    pub fn sanitiser_hint(&self) -> Option<Sanitiser> {
        self.sanitiser
    }

    /// The question text, looking through a conditional.
    #[must_use]
    pub fn question(&self) -> Option<&str> {
        self.label
            .as_deref()
            .or_else(|| self.when.as_ref().and_then(|w| w.then.question()))
    }

    /// The custom message for an error code, if one was configured.
    #[must_use]
    pub fn message_for(&self, code: ErrorCode) -> Option<String> {
        self.messages
            .get(&code)
            .or(self.fallback_message.as_ref())
            .cloned()
    }

    /// Fields of an object schema; empty for other kinds.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            Kind::Object(fields) => fields,
            _ => &[],
        }
    }

    /// Look up a field of an object schema by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields()
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.schema)
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Self::Value(f64::from(value))
    }
}
