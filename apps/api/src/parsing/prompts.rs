use crate::llm_client::prompts::FIDELITY_INSTRUCTION;

/// Version tag the model is asked to stamp on every parse.
pub const SCHEMA_VERSION: &str = "v2";

pub const PARSE_SYSTEM: &str = "You are an expert resume parser. \
    Produce a single JSON object that mirrors the resume content. \
    You MUST respond with valid JSON only, with no markdown fences or commentary.";

const SCHEMA: &str = r#"{
  "name": "<full name from resume header>",
  "email": "<primary email if present>",
  "phone": "<primary phone number if present>",
  "mobile": "<mobile number if listed separately>",
  "location": "<primary location or city if present>",
  "linkedin": "<primary LinkedIn URL if present>",
  "website": "<primary website or portfolio if present>",
  "github": "<GitHub URL if present>",
  "contact_details": ["<contact line>", ...],
  "experience": [
    {
      "title": "<exact job title>",
      "company": "<company name with location if present>",
      "dates": "<verbatim date range>",
      "description": ["<bullet point>", ...]
    }
  ],
  "education": [
    {
      "degree": "<degree name>",
      "institution": "<institution name with location if present>",
      "dates": "<verbatim dates>",
      "details": ["<detail>", ...]
    }
  ],
  "other_sections": [
    {
      "section_title": "<exact section heading>",
      "type": "structured",
      "entries": [
        {
          "title": "<role/project/activity>",
          "organization": "<organization if given>",
          "dates": "<verbatim dates>",
          "description": ["<bullet>", ...]
        }
      ]
    },
    {
      "section_title": "<exact section heading>",
      "type": "list",
      "items": ["<item>", ...]
    }
  ],
  "_warnings": ["<parsing uncertainty note>", ...],
  "version": "v2"
}"#;

/// Builds the extraction prompt around already-repaired résumé text.
pub fn build_parse_prompt(resume_text: &str) -> String {
    format!(
        r#"{FIDELITY_INSTRUCTION}

Normalize formatting only: remove pipes, duplicate spaces, leading bullets, and line
breaks that split sentences. Capture every section that delivers meaningful content.
Replace corrupted symbols with their intended ASCII equivalents.

SCHEMA
{SCHEMA}

INSTRUCTIONS
- Classify each additional section as "structured" if its items carry titles or roles; otherwise use "list".
- Combine organization and location inside the same string separated by a comma.
- Include every distinct contact line in "contact_details" in the order encountered near the top.
- Populate the dedicated contact fields when available; leave them out if not found.
- Merge multi-line bullets into single strings when they form one sentence or idea.
- Preserve the order of sections and entries as they appear. Keep acronyms and capitalization exactly.
- For overlapping roles at the same company, output separate entries.
- If the resume lacks a recognized section, omit the array entirely.
- If you detect parsing uncertainty (ambiguous tables, duplicate sections), list specific notes in "_warnings",
  referencing entries by position or by job title and company. Otherwise output "_warnings": [].
- Finish with "version": "{SCHEMA_VERSION}".

Resume text:
---
{resume_text}
---"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_schema() {
        let prompt = build_parse_prompt("Ada Lovelace\nAnalyst");
        assert!(prompt.contains("---\nAda Lovelace\nAnalyst\n---"));
        assert!(prompt.contains("\"other_sections\""));
        assert!(prompt.contains("\"_warnings\""));
        assert!(prompt.contains("\"version\": \"v2\""));
    }
}
