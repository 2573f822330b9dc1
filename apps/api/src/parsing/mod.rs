//! Parsing collaborator: turns extracted résumé text into a candidate JSON object.
//!
//! Default: `LlmResumeParser` (Claude via `LlmClient`). The output is untrusted:
//! the session controller decodes it through `ResumeRecord::decode_candidate`.
//!
//! `AppState` holds an `Arc<dyn ResumeParser>` so tests can swap in a stub.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::normalize::{repair_encoding, strip_bullet_marker};
use crate::llm_client::{LlmClient, LlmError};

pub mod prompts;

#[async_trait]
pub trait ResumeParser: Send + Sync {
    /// Returns the raw candidate. May be any JSON value; shape checks happen later.
    async fn parse(&self, resume_text: &str) -> Result<Value, LlmError>;
}

pub struct LlmResumeParser {
    llm: LlmClient,
}

impl LlmResumeParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeParser for LlmResumeParser {
    async fn parse(&self, resume_text: &str) -> Result<Value, LlmError> {
        let repaired = repair_encoding(resume_text);
        debug!(chars = repaired.chars().count(), "Parsing resume text");

        let prompt = prompts::build_parse_prompt(&repaired);
        let raw: Value = self.llm.call_json(&prompt, prompts::PARSE_SYSTEM).await?;

        info!("Resume parsed by LLM");
        Ok(clean_strings(raw))
    }
}

/// Strips surrounding whitespace and leading bullet markers from every string
/// value, recursively. Keys and non-string values are untouched.
pub fn clean_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_bullet_marker(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, clean_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_strings_strips_markers_everywhere() {
        let raw = json!({
            "name": "  Ada  ",
            "experience": [{"description": ["• Built the engine", "- → Shipped notes", 7]}],
            "- key": true
        });
        let cleaned = clean_strings(raw);
        assert_eq!(cleaned["name"], json!("Ada"));
        assert_eq!(
            cleaned["experience"][0]["description"],
            json!(["Built the engine", "Shipped notes", 7])
        );
        assert_eq!(cleaned["- key"], json!(true));
    }

    #[test]
    fn test_clean_strings_keeps_non_objects() {
        assert_eq!(clean_strings(json!(["- a", null])), json!(["a", null]));
    }
}
