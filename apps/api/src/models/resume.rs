//! Canonical résumé record and the boundary decode from untrusted collaborator JSON.
//!
//! The decode step is the only place that looks at raw `serde_json::Value` shapes.
//! Everything downstream (validator, reconciler, renderer) works on the typed record.
//!
//! Invariants held by every `ResumeRecord` built here:
//! - text fields are `None` or a non-empty trimmed string
//! - line lists hold only non-empty trimmed lines, in source order
//! - `extension_fields` never holds a key from [`KNOWN_FIELDS`]

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::engine::normalize::{non_empty, split_to_lines, trim};

/// Top-level keys owned by the schema. Anything else is carried as an extension field.
pub const KNOWN_FIELDS: &[&str] = &[
    "name",
    "email",
    "phone",
    "mobile",
    "location",
    "linkedin",
    "website",
    "github",
    "contact_details",
    "experience",
    "education",
    "other_sections",
    "version",
];

/// Key under which the parsing collaborator reports its own uncertainty notes.
pub const PARSE_NOTES_KEY: &str = "_warnings";

/// Title given to a kept section that was saved without one.
pub const UNTITLED_SECTION: &str = "Untitled Section";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Parsed resume data is not in the expected format.")]
    NotAnObject,
}

// ────────────────────────────────────────────────────────────────────────────
// Record types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperienceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EducationEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    pub details: Vec<String>,
}

/// An entry of a structured "other" section (projects, volunteering, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub entries: Vec<SectionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub items: Vec<String>,
}

/// The two shapes an additional section can take, resolved once at decode time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OtherSection {
    Structured(StructuredSection),
    List(ListSection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Structured,
    List,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact_details: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub other_sections: Vec<OtherSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Unrecognised top-level keys, carried verbatim. Never read by the engine.
    #[serde(flatten)]
    pub(crate) extension_fields: Map<String, Value>,
}

/// A freshly decoded collaborator output, with the collaborator's notes split off.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub record: ResumeRecord,
    pub parse_notes: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Accessors
// ────────────────────────────────────────────────────────────────────────────

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

impl ExperienceEntry {
    pub fn title(&self) -> &str {
        text(&self.title)
    }

    pub fn company(&self) -> &str {
        text(&self.company)
    }

    /// Human-readable label used in messages: the title, else the company.
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.company.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.dates.is_none()
            && self.description.is_empty()
    }
}

impl EducationEntry {
    pub fn degree(&self) -> &str {
        text(&self.degree)
    }

    pub fn institution(&self) -> &str {
        text(&self.institution)
    }

    pub fn label(&self) -> Option<&str> {
        self.degree.as_deref().or(self.institution.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.degree.is_none()
            && self.institution.is_none()
            && self.dates.is_none()
            && self.details.is_empty()
    }
}

impl SectionEntry {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.organization.is_none()
            && self.dates.is_none()
            && self.description.is_empty()
    }
}

impl OtherSection {
    pub fn kind(&self) -> SectionKind {
        match self {
            OtherSection::Structured(_) => SectionKind::Structured,
            OtherSection::List(_) => SectionKind::List,
        }
    }

    pub fn section_title(&self) -> Option<&str> {
        match self {
            OtherSection::Structured(s) => s.section_title.as_deref(),
            OtherSection::List(s) => s.section_title.as_deref(),
        }
    }
}

impl ResumeRecord {
    pub fn name(&self) -> &str {
        text(&self.name)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Boundary decode
    // ────────────────────────────────────────────────────────────────────────

    /// Decodes an untrusted JSON value into a typed record.
    ///
    /// Only a non-object top level is rejected. Wrong-typed fields degrade to
    /// "absent" rather than failing, so the validator can report them as defects.
    pub fn decode(value: &Value) -> Result<Self, StructuralError> {
        let obj = value.as_object().ok_or(StructuralError::NotAnObject)?;

        let extension_fields = obj
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(ResumeRecord {
            name: text_field(obj, "name"),
            contact: ContactInfo {
                email: text_field(obj, "email"),
                phone: text_field(obj, "phone"),
                mobile: text_field(obj, "mobile"),
                location: text_field(obj, "location"),
                linkedin: text_field(obj, "linkedin"),
                website: text_field(obj, "website"),
                github: text_field(obj, "github"),
            },
            contact_details: lines_field(obj, "contact_details"),
            experience: array_field(obj, "experience")
                .map(|v| decode_experience(v.as_object()))
                .collect(),
            education: array_field(obj, "education")
                .map(|v| decode_education(v.as_object()))
                .collect(),
            other_sections: array_field(obj, "other_sections")
                .map(|v| decode_section(v.as_object()))
                .collect(),
            version: text_field(obj, "version"),
            extension_fields,
        })
    }

    /// Decodes parsing-collaborator output, consuming its `_warnings` notes so they
    /// never reach validation or the extension bag.
    pub fn decode_candidate(value: &Value) -> Result<Candidate, StructuralError> {
        let mut record = Self::decode(value)?;
        let parse_notes = record
            .extension_fields
            .remove(PARSE_NOTES_KEY)
            .map(|notes| lines_value(&notes))
            .unwrap_or_default();
        Ok(Candidate {
            record,
            parse_notes,
        })
    }

    /// Serializes to the canonical JSON shape handed to collaborators.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| non_empty(&trim(v)))
}

fn lines_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key).map(lines_value).unwrap_or_default()
}

/// Array of scalars or a single multi-line scalar. Numbers and booleans are
/// stringified; nulls and nested arrays or objects are skipped.
fn lines_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => split_to_lines(items.iter().filter(|v| is_scalar(v)).map(trim)),
        scalar if is_scalar(scalar) => split_to_lines([trim(scalar)]),
        _ => Vec::new(),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn decode_experience(obj: Option<&Map<String, Value>>) -> ExperienceEntry {
    let Some(obj) = obj else {
        return ExperienceEntry::default();
    };
    ExperienceEntry {
        title: text_field(obj, "title"),
        company: text_field(obj, "company"),
        dates: text_field(obj, "dates"),
        description: lines_field(obj, "description"),
    }
}

fn decode_education(obj: Option<&Map<String, Value>>) -> EducationEntry {
    let Some(obj) = obj else {
        return EducationEntry::default();
    };
    EducationEntry {
        degree: text_field(obj, "degree"),
        institution: text_field(obj, "institution"),
        dates: text_field(obj, "dates"),
        details: lines_field(obj, "details"),
    }
}

fn decode_section_entry(obj: Option<&Map<String, Value>>) -> SectionEntry {
    let Some(obj) = obj else {
        return SectionEntry::default();
    };
    SectionEntry {
        title: text_field(obj, "title"),
        organization: text_field(obj, "organization"),
        dates: text_field(obj, "dates"),
        description: lines_field(obj, "description"),
    }
}

/// `"list"` selects the list shape; any other or missing type is structured.
fn decode_section(obj: Option<&Map<String, Value>>) -> OtherSection {
    let Some(obj) = obj else {
        return OtherSection::Structured(StructuredSection::default());
    };
    let section_title = text_field(obj, "section_title");
    match obj.get("type").and_then(Value::as_str).map(str::trim) {
        Some("list") => OtherSection::List(ListSection {
            section_title,
            items: lines_field(obj, "items"),
        }),
        _ => OtherSection::Structured(StructuredSection {
            section_title,
            entries: array_field(obj, "entries")
                .map(|v| decode_section_entry(v.as_object()))
                .collect(),
        }),
    }
}
