//! Document sessions: one uploaded résumé, its derived state, and its lifecycle.
//!
//! A `Session` value is never edited in place. Every transition in `controller`
//! builds a new value and the store swaps it in only when the transition succeeds,
//! so a failed stage leaves the previous state untouched.
//!
//! All derived state (parse notes, parsed and edited records, validation report,
//! rendered output) lives in one `Derived` value. Resetting a session drops it
//! whole; there is no partial invalidation.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::engine::ValidationReport;
use crate::extraction::SourceDocument;
use crate::models::resume::ResumeRecord;

pub mod controller;
pub mod handlers;
pub mod store;

pub const DEFAULT_FILENAME_STEM: &str = "Resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No derived state. A source may or may not be attached.
    Empty,
    Extracted,
    ParsedCandidate,
    Validated,
    /// Validated with blocking errors; waiting for edits.
    Editing,
    Reconciled,
    /// Validated with zero errors.
    Renderable,
    Rendered,
}

impl Stage {
    /// Stages a session can rest in between requests.
    pub fn is_resting(self) -> bool {
        matches!(
            self,
            Stage::Empty | Stage::Editing | Stage::Renderable | Stage::Rendered
        )
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Bytes,
    pub filename: String,
    /// Degraded-path notices, e.g. an appendix that could not be merged.
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Derived {
    pub raw_text: String,
    pub parse_notes: Vec<String>,
    /// Baseline as produced by the parser.
    pub parsed: ResumeRecord,
    /// Working copy, replaced on every save.
    pub edited: ResumeRecord,
    pub report: ValidationReport,
    pub rendered: Option<RenderedDocument>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source: Option<SourceDocument>,
    /// Secondary document appended after the rendered résumé.
    pub appendix: Option<SourceDocument>,
    pub stage: Stage,
    pub derived: Option<Derived>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: None,
            appendix: None,
            stage: Stage::Empty,
            derived: None,
        }
    }

    pub fn can_render(&self) -> bool {
        self.derived
            .as_ref()
            .is_some_and(|d| d.report.is_renderable())
    }

    pub fn view(&self) -> SessionView {
        let derived = self.derived.as_ref();
        SessionView {
            id: self.id,
            created_at: self.created_at,
            stage: self.stage,
            source_filename: self.source.as_ref().map(|s| s.filename.clone()),
            appendix_filename: self.appendix.as_ref().map(|s| s.filename.clone()),
            raw_text: derived.map(|d| d.raw_text.clone()),
            parse_notes: derived.map(|d| d.parse_notes.clone()).unwrap_or_default(),
            parsed: derived.map(|d| d.parsed.to_value()),
            edited: derived.map(|d| d.edited.to_value()),
            report: derived.map(|d| d.report.clone()),
            can_render: self.can_render(),
            rendered: derived
                .and_then(|d| d.rendered.as_ref())
                .map(|r| RenderedView {
                    filename: r.filename.clone(),
                    bytes: r.bytes.len(),
                    notices: r.notices.clone(),
                }),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub stage: Stage,
    pub source_filename: Option<String>,
    pub appendix_filename: Option<String>,
    /// Extracted text exactly as it was handed to the parser.
    pub raw_text: Option<String>,
    pub parse_notes: Vec<String>,
    pub parsed: Option<Value>,
    pub edited: Option<Value>,
    pub report: Option<ValidationReport>,
    pub can_render: bool,
    pub rendered: Option<RenderedView>,
}

#[derive(Debug, Serialize)]
pub struct RenderedView {
    pub filename: String,
    pub bytes: usize,
    pub notices: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Download names
// ────────────────────────────────────────────────────────────────────────────

/// Candidate name reduced to alphanumerics, spaces and underscores, trailing
/// spaces trimmed, spaces turned into underscores. Falls back to `Resume`.
pub fn filename_stem(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let kept = kept.trim_end();
    let stem = if kept.is_empty() {
        DEFAULT_FILENAME_STEM
    } else {
        kept
    };
    stem.replace(' ', "_")
}

pub fn pdf_filename(record: &ResumeRecord) -> String {
    format!("Formatted_{}.pdf", filename_stem(record.name()))
}

pub fn json_filename(record: &ResumeRecord) -> String {
    format!("Formatted_{}.json", filename_stem(record.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_stem() {
        assert_eq!(filename_stem("Ada Lovelace"), "Ada_Lovelace");
        assert_eq!(filename_stem("Dr. Ada K. Lovelace, PhD  "), "Dr_Ada_K_Lovelace_PhD");
        assert_eq!(filename_stem("José_Ñúñez"), "José_Ñúñez");
        assert_eq!(filename_stem(""), "Resume");
        assert_eq!(filename_stem("!!!"), "Resume");
    }

    #[test]
    fn test_download_names_share_stem() {
        let record = ResumeRecord {
            name: Some("Ada Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(pdf_filename(&record), "Formatted_Ada_Lovelace.pdf");
        assert_eq!(json_filename(&record), "Formatted_Ada_Lovelace.json");
        assert_eq!(pdf_filename(&ResumeRecord::default()), "Formatted_Resume.pdf");
    }

    #[test]
    fn test_new_session_view() {
        let view = Session::new().view();
        assert_eq!(view.stage, Stage::Empty);
        assert!(!view.can_render);
        assert!(view.report.is_none());
        assert!(view.rendered.is_none());
    }
}
