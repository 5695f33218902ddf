//! Named regex patterns for free-text answers.
//!
//! These patterns restrict what may be typed into name, username and
//! reference fields of the report and statement forms.

use std::sync::{Arc, LazyLock};

use regex::Regex;

/// A compiled, named field pattern.
///
/// Cloning is cheap; the compiled regex is shared.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    /// Description of what this pattern accepts.
    pub description: &'static str,

    regex: Arc<Regex>,
}

impl Pattern {
    /// Create a new pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            name,
            description,
            regex: Arc::new(Regex::new(pattern).expect("Invalid regex pattern")),
        }
    }

    /// Check if the whole value matches this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

static PERSON_NAME: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        "person_name",
        "Letters, spaces, full stops, hyphens and apostrophes",
        r"^[a-zA-Z][a-zA-Z\s\-'.]{0,48}[a-zA-Z]$",
    )
});

static USERNAME: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        "username",
        "Letters, numbers and underscores",
        r"^[a-zA-Z0-9_]{2,50}$",
    )
});

static EVIDENCE_TAG: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        "evidence_tag",
        "Letters, numbers, hyphens and slashes",
        r"^[A-Z0-9][A-Z0-9\-/ ]{0,29}$",
    )
});

static CAMERA_NUMBER: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        "camera_number",
        "Letters, numbers and hyphens",
        r"^[A-Z0-9][A-Z0-9\-]{0,19}$",
    )
});

/// Names of people: letters, spaces, full stops, hyphens and apostrophes.
#[must_use]
pub fn person_name() -> Pattern {
    PERSON_NAME.clone()
}

/// Staff usernames as issued by the prison system.
#[must_use]
pub fn username() -> Pattern {
    USERNAME.clone()
}

/// Evidence bag tag references.
#[must_use]
pub fn evidence_tag() -> Pattern {
    EVIDENCE_TAG.clone()
}

/// Body-worn camera identifiers.
#[must_use]
pub fn camera_number() -> Pattern {
    CAMERA_NUMBER.clone()
}
