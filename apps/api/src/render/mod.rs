//! Rendering collaborator: record → PDF, DOCX → PDF, and PDF merge.
//!
//! Default: `RenderServiceClient`, which renders HTML locally (minijinja) and hands
//! conversion to an HTTP document service exposing Chromium, LibreOffice and PDF
//! engine routes. `AppState` holds an `Arc<dyn DocumentRenderer>`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::resume::ResumeRecord;

pub mod template;

const HTML_ROUTE: &str = "/forms/chromium/convert/html";
const OFFICE_ROUTE: &str = "/forms/libreoffice/convert";
const MERGE_ROUTE: &str = "/forms/pdfengines/merge";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Render service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Render service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Could not read logo asset {path}: {source}")]
    Logo {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Renders the record. `logo` is an opaque asset handed through untouched.
    async fn render(&self, record: &ResumeRecord, logo: Option<&Path>) -> Result<Bytes, RenderError>;

    async fn convert_docx(&self, docx: Bytes) -> Result<Bytes, RenderError>;

    /// Appends every page of `appendix` after `primary`.
    async fn merge(&self, primary: Bytes, appendix: Bytes) -> Result<Bytes, RenderError>;
}

#[derive(Clone)]
pub struct RenderServiceClient {
    client: Client,
    base_url: String,
}

impl RenderServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RenderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn post(&self, route: &str, form: Form) -> Result<Bytes, RenderError> {
        let response = self
            .client
            .post(self.url(route))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RenderError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        debug!(route, bytes = body.len(), "Render service responded");
        Ok(body)
    }
}

fn file_part(bytes: Bytes, file_name: &str, mime: &str) -> Result<Part, RenderError> {
    Ok(Part::stream(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)?)
}

#[async_trait]
impl DocumentRenderer for RenderServiceClient {
    async fn render(&self, record: &ResumeRecord, logo: Option<&Path>) -> Result<Bytes, RenderError> {
        let logo_asset = match logo {
            Some(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| RenderError::Logo {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some((asset_name(path), Bytes::from(bytes)))
            }
            None => None,
        };

        let html = template::render_html(record, logo_asset.as_ref().map(|(name, _)| name.as_str()))?;
        let mut form = Form::new().part(
            "files",
            file_part(Bytes::from(html), "index.html", "text/html")?,
        );
        if let Some((name, bytes)) = logo_asset {
            form = form.part("files", file_part(bytes, &name, "application/octet-stream")?);
        }

        let pdf = self.post(HTML_ROUTE, form).await?;
        info!(bytes = pdf.len(), "Resume rendered");
        Ok(pdf)
    }

    async fn convert_docx(&self, docx: Bytes) -> Result<Bytes, RenderError> {
        let form = Form::new().part(
            "files",
            file_part(
                docx,
                "appendix.docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            )?,
        );
        self.post(OFFICE_ROUTE, form).await
    }

    async fn merge(&self, primary: Bytes, appendix: Bytes) -> Result<Bytes, RenderError> {
        // The service merges in file-name order.
        let form = Form::new()
            .part("files", file_part(primary, "1_resume.pdf", "application/pdf")?)
            .part("files", file_part(appendix, "2_appendix.pdf", "application/pdf")?);
        self.post(MERGE_ROUTE, form).await
    }
}

/// File name under which the logo is uploaded and referenced from the HTML.
fn asset_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            n.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
                .collect()
        })
        .unwrap_or_else(|| "logo".to_string())
}
