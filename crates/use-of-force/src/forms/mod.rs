//! Form configuration for reports and statements.
//!
//! A report is made of four [sections](SectionName), each answered on its own
//! page of the wizard and stored under its own key in the report's form
//! response document. Statements and statement amendments have a form each.
//!
//! The [`FieldConfig`]s of a section are derived from its schema. A field
//! declared with [`Schema::when`] depends on a sibling answer, and the update
//! builder drops it unless that answer matches.

mod incident;
mod statement;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::schema::{values_equal, Schema};

pub use incident::{
    BodyWornCamera, CctvRecording, HandcuffsType, PrisonerRelocation, RestraintPosition,
};

/// A section of the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionName {
    /// When, where and who.
    IncidentDetails,
    /// Techniques and equipment used.
    UseOfForceDetails,
    /// Where the prisoner went and who was hurt.
    RelocationAndInjuries,
    /// Bagged evidence, photographs and recordings.
    Evidence,
}

impl SectionName {
    /// All sections, in wizard order.
    pub const ALL: [SectionName; 4] = [
        Self::IncidentDetails,
        Self::UseOfForceDetails,
        Self::RelocationAndInjuries,
        Self::Evidence,
    ];

    /// Key of the section in the form response.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncidentDetails => "incidentDetails",
            Self::UseOfForceDetails => "useOfForceDetails",
            Self::RelocationAndInjuries => "relocationAndInjuries",
            Self::Evidence => "evidence",
        }
    }

    /// Page heading for the section.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::IncidentDetails => "Incident details",
            Self::UseOfForceDetails => "Use of force details",
            Self::RelocationAndInjuries => "Relocation and injuries",
            Self::Evidence => "Evidence",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::IncidentDetails => 0,
            Self::UseOfForceDetails => 1,
            Self::RelocationAndInjuries => 2,
            Self::Evidence => 3,
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = Error;

    /// Accepts the camelCase key or a kebab-case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(&normalised))
            .ok_or_else(|| Error::UnknownSection(s.to_string()))
    }
}

/// A field answer depends on a sibling answer holding a given value.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// The sibling field.
    pub field: String,
    /// The value the sibling must hold.
    pub predicate: Value,
}

impl Dependency {
    /// Check whether `answers` satisfy this dependency.
    #[must_use]
    pub fn is_satisfied(&self, answers: &Map<String, Value>) -> bool {
        answers
            .get(&self.field)
            .is_some_and(|v| values_equal(v, &self.predicate))
    }
}

/// Configuration of one question on a form page.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    /// Key of the answer.
    pub name: String,
    /// Question text shown to the user.
    pub question: String,
    /// Sibling answer this field depends on.
    pub dependent_on: Option<Dependency>,
}

/// A report section: its schema and derived field configuration.
#[derive(Debug)]
pub struct FormSection {
    /// The section.
    pub name: SectionName,
    schema: Schema,
    fields: Vec<FieldConfig>,
}

impl FormSection {
    fn new(name: SectionName, schema: Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|field| FieldConfig {
                name: field.name.clone(),
                question: field
                    .schema
                    .question()
                    .unwrap_or(&field.name)
                    .to_string(),
                dependent_on: field.schema.conditional().map(|cond| Dependency {
                    field: cond.sibling.clone(),
                    predicate: cond.is.clone(),
                }),
            })
            .collect();
        Self {
            name,
            schema,
            fields,
        }
    }

    /// The section schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field configuration, in display order.
    #[must_use]
    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }
}

static SECTIONS: LazyLock<Vec<FormSection>> = LazyLock::new(|| {
    SectionName::ALL
        .into_iter()
        .map(|name| FormSection::new(name, incident::section_schema(name)))
        .collect()
});

static STATEMENT: LazyLock<Schema> = LazyLock::new(statement::statement_schema);

static AMENDMENT: LazyLock<Schema> = LazyLock::new(statement::amendment_schema);

/// All report sections, in wizard order.
#[must_use]
pub fn sections() -> &'static [FormSection] {
    &SECTIONS
}

/// The configuration for one report section.
#[must_use]
pub fn section(name: SectionName) -> &'static FormSection {
    &SECTIONS[name.index()]
}

/// Schema of the statement form.
#[must_use]
pub fn statement_schema() -> &'static Schema {
    &STATEMENT
}

/// Schema of the statement amendment form.
#[must_use]
pub fn amendment_schema() -> &'static Schema {
    &AMENDMENT
}

/// Any form the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// A report section.
    Section(SectionName),
    /// A staff statement.
    Statement,
    /// An amendment to a submitted statement.
    Amendment,
}

impl Form {
    /// Schema of the form.
    #[must_use]
    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Section(name) => section(name).schema(),
            Self::Statement => statement_schema(),
            Self::Amendment => amendment_schema(),
        }
    }
}
