//! Lifecycle transitions. Each one reads `&Session` and returns a new `Session`;
//! nothing here mutates a session that the store has already published.
//!
//! Empty → Extracted → ParsedCandidate → Validated → Editing/Renderable
//! Editing/Renderable → Reconciled → Validated → Editing/Renderable
//! Renderable → Rendered

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::engine::validation::validate_record;
use crate::engine::{reconcile, EditedFields, ValidationConfig, ValidationReport};
use crate::errors::AppError;
use crate::extraction::{DocumentFormat, ExtractionError, SourceDocument, TextExtractor};
use crate::models::resume::ResumeRecord;
use crate::parsing::ResumeParser;
use crate::render::DocumentRenderer;
use crate::session::{pdf_filename, Derived, RenderedDocument, Session, Stage};

pub const CONVERT_FAILED_NOTICE: &str =
    "Failed to convert candidate sheet. Proceeding with resume only.";
pub const MERGE_FAILED_NOTICE: &str =
    "Failed to merge candidate sheet. Proceeding with resume only.";
pub const UNSUPPORTED_APPENDIX_NOTICE: &str =
    "Unsupported candidate sheet format. Proceeding with resume only.";

fn enter(session: &Session, stage: Stage) {
    if stage.is_resting() {
        info!(session_id = %session.id, ?stage, "Session stage changed");
    } else {
        debug!(session_id = %session.id, ?stage, "Session stage");
    }
}

/// Resting stage after a validation pass: errors keep the session in editing.
fn validated_stage(report: &ValidationReport) -> Stage {
    if report.is_renderable() {
        Stage::Renderable
    } else {
        Stage::Editing
    }
}

fn require_derived(session: &Session) -> Result<&Derived, AppError> {
    session.derived.as_ref().ok_or_else(|| {
        AppError::Conflict("No parsed resume yet. Upload and process a resume first.".into())
    })
}

impl Session {
    /// Drops every piece of derived state at once.
    pub fn reset(&self) -> Session {
        let next = Session {
            stage: Stage::Empty,
            derived: None,
            ..self.clone()
        };
        enter(&next, Stage::Empty);
        next
    }

    /// Attaches an upload. A different signature resets the session; the same
    /// file uploaded again keeps the derived state.
    pub fn with_source(&self, document: SourceDocument) -> Session {
        let unchanged = self
            .source
            .as_ref()
            .is_some_and(|current| current.signature() == document.signature());
        if unchanged {
            return self.clone();
        }
        Session {
            source: Some(document),
            ..self.clone()
        }
        .reset()
    }

    pub fn without_source(&self) -> Session {
        Session {
            source: None,
            ..self.clone()
        }
        .reset()
    }

    /// Attaches or detaches the appendix. Any change discards the rendered output,
    /// since the final document depends on it.
    pub fn with_appendix(&self, appendix: Option<SourceDocument>) -> Result<Session, AppError> {
        if let Some(doc) = &appendix {
            doc.format()
                .ok_or(AppError::from(ExtractionError::UnsupportedFormat))?;
        }
        let unchanged = self.appendix.as_ref().map(SourceDocument::signature)
            == appendix.as_ref().map(SourceDocument::signature);
        if unchanged {
            return Ok(self.clone());
        }

        let mut next = Session {
            appendix,
            ..self.clone()
        };
        if let Some(derived) = next.derived.as_mut() {
            if derived.rendered.take().is_some() {
                next.stage = validated_stage(&derived.report);
                enter(&next, next.stage);
            }
        }
        Ok(next)
    }

    /// Extract → parse → decode → validate. A failure at any step leaves this
    /// session as it was.
    pub async fn process(
        &self,
        extractor: &dyn TextExtractor,
        parser: &dyn ResumeParser,
        config: &ValidationConfig,
    ) -> Result<Session, AppError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| AppError::Conflict("No resume uploaded.".into()))?;

        let raw_text = extractor.extract(source).await?;
        enter(self, Stage::Extracted);

        let raw = parser.parse(&raw_text).await?;
        let candidate = ResumeRecord::decode_candidate(&raw)?;
        enter(self, Stage::ParsedCandidate);

        let report = validate_record(&candidate.record, config);
        enter(self, Stage::Validated);
        info!(
            session_id = %self.id,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            parse_notes = candidate.parse_notes.len(),
            "Resume processed"
        );

        let next = Session {
            stage: validated_stage(&report),
            derived: Some(Derived {
                raw_text,
                parse_notes: candidate.parse_notes,
                parsed: candidate.record.clone(),
                edited: candidate.record,
                report,
                rendered: None,
            }),
            ..self.clone()
        };
        enter(&next, next.stage);
        Ok(next)
    }

    /// Reconciles edits into the working copy and re-validates. Saving discards
    /// any rendered output.
    pub fn apply_edits(
        &self,
        edits: &EditedFields,
        config: &ValidationConfig,
    ) -> Result<Session, AppError> {
        let derived = require_derived(self)?;

        let edited = reconcile(&derived.edited, edits);
        enter(self, Stage::Reconciled);
        let report = validate_record(&edited, config);
        enter(self, Stage::Validated);

        let next = Session {
            stage: validated_stage(&report),
            derived: Some(Derived {
                edited,
                report,
                rendered: None,
                ..derived.clone()
            }),
            ..self.clone()
        };
        enter(&next, next.stage);
        Ok(next)
    }

    /// Renders the working copy, appending the appendix when one is attached.
    /// Appendix conversion or merge failures degrade to the résumé alone with a
    /// notice; a failure to render the résumé itself is an error.
    pub async fn render(
        &self,
        renderer: &dyn DocumentRenderer,
        logo: Option<&Path>,
    ) -> Result<Session, AppError> {
        let derived = require_derived(self)?;
        if !derived.report.is_renderable() {
            return Err(AppError::Conflict(
                "Please address the validation errors before generating.".into(),
            ));
        }

        let primary = renderer.render(&derived.edited, logo).await?;
        let mut notices = Vec::new();
        let bytes = match &self.appendix {
            Some(appendix) => {
                append(renderer, primary, appendix, &mut notices).await
            }
            None => primary,
        };

        let rendered = RenderedDocument {
            bytes,
            filename: pdf_filename(&derived.edited),
            notices,
        };
        info!(
            session_id = %self.id,
            filename = %rendered.filename,
            bytes = rendered.bytes.len(),
            "Document rendered"
        );

        let next = Session {
            stage: Stage::Rendered,
            derived: Some(Derived {
                rendered: Some(rendered),
                ..derived.clone()
            }),
            ..self.clone()
        };
        enter(&next, Stage::Rendered);
        Ok(next)
    }
}

async fn append(
    renderer: &dyn DocumentRenderer,
    primary: Bytes,
    appendix: &SourceDocument,
    notices: &mut Vec<String>,
) -> Bytes {
    let appendix_pdf = match appendix.format() {
        Some(DocumentFormat::Pdf) => appendix.bytes.clone(),
        Some(DocumentFormat::Docx) => match renderer.convert_docx(appendix.bytes.clone()).await {
            Ok(pdf) => pdf,
            Err(e) => {
                warn!("Appendix conversion failed: {e}");
                notices.push(CONVERT_FAILED_NOTICE.to_string());
                return primary;
            }
        },
        None => {
            warn!(filename = %appendix.filename, "Appendix format not recognised");
            notices.push(UNSUPPORTED_APPENDIX_NOTICE.to_string());
            return primary;
        }
    };

    match renderer.merge(primary.clone(), appendix_pdf).await {
        Ok(merged) => merged,
        Err(e) => {
            warn!("Appendix merge failed: {e}");
            notices.push(MERGE_FAILED_NOTICE.to_string());
            primary
        }
    }
}
