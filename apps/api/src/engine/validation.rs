//! Résumé validation: maps a candidate record to ordered errors and warnings.
//!
//! # Policy
//! - Errors block rendering: a record without a name or without experience is broken.
//! - Warnings never block; they are surfaced for review. Missing education is only a
//!   warning because complete résumés may leave it out.
//!
//! Rules are plain data: one table per scope, evaluated in table order, scope by
//! scope and entry by entry. Output order is therefore stable for a given record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::dedup::{find_duplicates, DEFAULT_MIN_MATCHING_FIELDS};
use crate::engine::normalize::has_problematic_characters;
use crate::models::resume::{
    EducationEntry, ExperienceEntry, ListSection, OtherSection, ResumeRecord, SectionEntry,
    StructuredSection,
};

/// Bullets shorter than this (in characters, after trimming) are flagged.
pub const DEFAULT_MIN_BULLET_CHARS: usize = 10;
pub const DEFAULT_MIN_NAME_CHARS: usize = 3;
/// All-caps names longer than this are flagged.
pub const DEFAULT_SHOUTY_NAME_CHARS: usize = 10;
pub const DEFAULT_MIN_LIST_ITEM_CHARS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Heuristic thresholds. Defaults match the tuned values; each can be overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_name_chars: usize,
    pub shouty_name_chars: usize,
    pub min_bullet_chars: usize,
    pub min_list_item_chars: usize,
    pub duplicate_min_matches: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_name_chars: DEFAULT_MIN_NAME_CHARS,
            shouty_name_chars: DEFAULT_SHOUTY_NAME_CHARS,
            min_bullet_chars: DEFAULT_MIN_BULLET_CHARS,
            min_list_item_chars: DEFAULT_MIN_LIST_ITEM_CHARS,
            duplicate_min_matches: DEFAULT_MIN_MATCHING_FIELDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Report for input that is not a record at all. No rules are evaluated.
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            warnings: Vec::new(),
        }
    }

    /// Warnings never block rendering.
    pub fn is_renderable(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Error => self.errors.push(message),
            Severity::Warning => self.warnings.push(message),
        }
    }
}

/// Where a rule is being evaluated. Positions are 1-based; `item` is the
/// bullet/entry/item position inside the subject, 0 when not applicable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Site<'a> {
    pub index: usize,
    pub item: usize,
    pub label: Option<&'a str>,
}

impl Site<'_> {
    /// `" (label)"` or nothing.
    fn tag(&self) -> String {
        self.label.map(|l| format!(" ({l})")).unwrap_or_default()
    }

    /// `Section 'Title'`, or `Section #n` for an untitled one.
    fn section(&self) -> String {
        match self.label {
            Some(title) => format!("Section '{title}'"),
            None => format!("Section #{}", self.index),
        }
    }
}

pub struct Rule<T: ?Sized> {
    pub code: &'static str,
    pub severity: Severity,
    pub check: fn(&T, &Site<'_>, &ValidationConfig) -> Option<String>,
}

/// A rule over the pairs of a list; one message per flagged pair.
pub struct PairRule<T> {
    pub code: &'static str,
    pub severity: Severity,
    pub check: fn(&[T], &ValidationConfig) -> Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub code: &'static str,
    pub severity: Severity,
}

// ────────────────────────────────────────────────────────────────────────────
// Rule tables
// ────────────────────────────────────────────────────────────────────────────

const NAME_RULES: &[Rule<str>] = &[
    Rule {
        code: "name.empty",
        severity: Severity::Error,
        check: |name, _, _| name.is_empty().then(|| "Candidate name is empty.".to_string()),
    },
    Rule {
        code: "name.too_short",
        severity: Severity::Warning,
        check: |name, _, cfg| {
            let len = name.chars().count();
            (len > 0 && len < cfg.min_name_chars)
                .then(|| "Name seems too short - is it complete?".to_string())
        },
    },
    Rule {
        code: "name.all_caps",
        severity: Severity::Warning,
        check: |name, _, cfg| {
            (is_all_caps(name) && name.chars().count() > cfg.shouty_name_chars)
                .then(|| "Name is in all caps - consider using proper case.".to_string())
        },
    },
];

const EXPERIENCE_LIST_RULES: &[Rule<[ExperienceEntry]>] = &[Rule {
    code: "experience.none",
    severity: Severity::Error,
    check: |entries, _, _| {
        entries
            .is_empty()
            .then(|| "No experience entries provided.".to_string())
    },
}];

const EXPERIENCE_RULES: &[Rule<ExperienceEntry>] = &[
    Rule {
        code: "experience.missing_title_and_company",
        severity: Severity::Error,
        check: |e, site, _| {
            (e.title.is_none() && e.company.is_none())
                .then(|| format!("Experience #{} is missing both title and company.", site.index))
        },
    },
    Rule {
        code: "experience.missing_title",
        severity: Severity::Warning,
        check: |e, site, _| {
            (e.title.is_none() && e.company.is_some())
                .then(|| format!("Experience #{}{} is missing job title.", site.index, site.tag()))
        },
    },
    Rule {
        code: "experience.missing_company",
        severity: Severity::Warning,
        check: |e, site, _| {
            (e.company.is_none() && e.title.is_some()).then(|| {
                format!("Experience #{}{} is missing company name.", site.index, site.tag())
            })
        },
    },
    Rule {
        code: "experience.missing_dates",
        severity: Severity::Warning,
        check: |e, site, _| {
            e.dates
                .is_none()
                .then(|| format!("Experience #{}{} is missing dates.", site.index, site.tag()))
        },
    },
    Rule {
        code: "experience.no_bullets",
        severity: Severity::Warning,
        check: |e, site, _| {
            e.description
                .is_empty()
                .then(|| format!("Experience #{}{} has no bullet points.", site.index, site.tag()))
        },
    },
];

const BULLET_RULES: &[Rule<str>] = &[
    Rule {
        code: "experience.bullet.too_short",
        severity: Severity::Warning,
        check: |bullet, site, cfg| {
            (bullet.trim().chars().count() < cfg.min_bullet_chars).then(|| {
                format!(
                    "Experience #{}{}, bullet {} is too short (less than {} characters).",
                    site.index,
                    site.tag(),
                    site.item,
                    cfg.min_bullet_chars
                )
            })
        },
    },
    Rule {
        code: "experience.bullet.problematic_characters",
        severity: Severity::Warning,
        check: |bullet, site, _| {
            has_problematic_characters(bullet).then(|| {
                format!(
                    "Experience #{}{}, bullet {} contains special characters that may not render properly.",
                    site.index,
                    site.tag(),
                    site.item
                )
            })
        },
    },
];

const EXPERIENCE_PAIR_RULES: &[PairRule<ExperienceEntry>] = &[PairRule {
    code: "experience.duplicate",
    severity: Severity::Warning,
    check: |entries, cfg| {
        find_duplicates(entries, cfg.duplicate_min_matches)
            .into_iter()
            .map(|pair| {
                format!(
                    "Experience #{} and #{} appear to be duplicates.",
                    pair.first + 1,
                    pair.second + 1
                )
            })
            .collect()
    },
}];

const EDUCATION_LIST_RULES: &[Rule<[EducationEntry]>] = &[Rule {
    code: "education.none",
    severity: Severity::Warning,
    check: |entries, _, _| {
        entries.is_empty().then(|| {
            "No education entries provided - consider adding your educational background."
                .to_string()
        })
    },
}];

fn education_blank(e: &EducationEntry) -> bool {
    e.degree.is_none() && e.institution.is_none() && e.dates.is_none()
}

const EDUCATION_RULES: &[Rule<EducationEntry>] = &[
    Rule {
        code: "education.empty",
        severity: Severity::Error,
        check: |e, site, _| {
            education_blank(e)
                .then(|| format!("Education entry #{} is completely empty.", site.index))
        },
    },
    Rule {
        code: "education.missing_degree",
        severity: Severity::Warning,
        check: |e, site, _| {
            (e.degree.is_none() && !education_blank(e)).then(|| {
                format!("Education #{}{} is missing degree/credential.", site.index, site.tag())
            })
        },
    },
    Rule {
        code: "education.missing_institution",
        severity: Severity::Warning,
        check: |e, site, _| {
            (e.institution.is_none() && !education_blank(e)).then(|| {
                format!("Education #{}{} is missing institution name.", site.index, site.tag())
            })
        },
    },
    Rule {
        code: "education.missing_dates",
        severity: Severity::Warning,
        check: |e, site, _| {
            (e.dates.is_none() && !education_blank(e))
                .then(|| format!("Education #{}{} is missing dates.", site.index, site.tag()))
        },
    },
];

const SECTION_RULES: &[Rule<OtherSection>] = &[Rule {
    code: "section.missing_title",
    severity: Severity::Warning,
    check: |s, site, _| {
        s.section_title()
            .is_none()
            .then(|| format!("Additional section #{} has no title.", site.index))
    },
}];

const STRUCTURED_SECTION_RULES: &[Rule<StructuredSection>] = &[Rule {
    code: "section.structured.no_entries",
    severity: Severity::Warning,
    check: |s, site, _| {
        s.entries
            .is_empty()
            .then(|| format!("{} has no entries.", site.section()))
    },
}];

const SECTION_ENTRY_RULES: &[Rule<SectionEntry>] = &[Rule {
    code: "section.structured.entry_empty",
    severity: Severity::Warning,
    check: |e, site, _| {
        (e.title.is_none() && e.organization.is_none() && e.description.is_empty())
            .then(|| format!("{}, entry #{} is empty.", site.section(), site.item))
    },
}];

const LIST_SECTION_RULES: &[Rule<ListSection>] = &[Rule {
    code: "section.list.no_items",
    severity: Severity::Warning,
    check: |s, site, _| {
        s.items
            .is_empty()
            .then(|| format!("{} has no items.", site.section()))
    },
}];

const LIST_ITEM_RULES: &[Rule<str>] = &[Rule {
    code: "section.list.item_too_short",
    severity: Severity::Warning,
    check: |item, site, cfg| {
        (item.trim().chars().count() < cfg.min_list_item_chars)
            .then(|| format!("{}, item #{} is too short.", site.section(), site.item))
    },
}];

/// Every rule with its severity, in evaluation order.
pub fn rule_catalog() -> Vec<RuleInfo> {
    fn info<T: ?Sized>(rules: &[Rule<T>]) -> impl Iterator<Item = RuleInfo> + '_ {
        rules.iter().map(|r| RuleInfo {
            code: r.code,
            severity: r.severity,
        })
    }

    info(NAME_RULES)
        .chain(info(EXPERIENCE_LIST_RULES))
        .chain(info(EXPERIENCE_RULES))
        .chain(info(BULLET_RULES))
        .chain(EXPERIENCE_PAIR_RULES.iter().map(|r| RuleInfo {
            code: r.code,
            severity: r.severity,
        }))
        .chain(info(EDUCATION_LIST_RULES))
        .chain(info(EDUCATION_RULES))
        .chain(info(SECTION_RULES))
        .chain(info(STRUCTURED_SECTION_RULES))
        .chain(info(SECTION_ENTRY_RULES))
        .chain(info(LIST_SECTION_RULES))
        .chain(info(LIST_ITEM_RULES))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

fn apply<T: ?Sized>(
    rules: &[Rule<T>],
    subject: &T,
    site: &Site<'_>,
    config: &ValidationConfig,
    report: &mut ValidationReport,
) {
    for rule in rules {
        if let Some(message) = (rule.check)(subject, site, config) {
            report.push(rule.severity, message);
        }
    }
}

/// Decodes then validates. A non-object yields a single structural error.
pub fn validate_with(candidate: &Value, config: &ValidationConfig) -> ValidationReport {
    match ResumeRecord::decode(candidate) {
        Ok(record) => validate_record(&record, config),
        Err(e) => ValidationReport::structural(e.to_string()),
    }
}

/// Runs every rule table over a typed record. Never mutates the record.
pub fn validate_record(record: &ResumeRecord, config: &ValidationConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let top = Site::default();

    apply(NAME_RULES, record.name(), &top, config, &mut report);

    apply(EXPERIENCE_LIST_RULES, record.experience.as_slice(), &top, config, &mut report);
    for (i, entry) in record.experience.iter().enumerate() {
        let site = Site {
            index: i + 1,
            item: 0,
            label: entry.label(),
        };
        apply(EXPERIENCE_RULES, entry, &site, config, &mut report);
        for (b, bullet) in entry.description.iter().enumerate() {
            let bullet_site = Site { item: b + 1, ..site };
            apply(BULLET_RULES, bullet.as_str(), &bullet_site, config, &mut report);
        }
    }
    for rule in EXPERIENCE_PAIR_RULES {
        for message in (rule.check)(&record.experience, config) {
            report.push(rule.severity, message);
        }
    }

    apply(EDUCATION_LIST_RULES, record.education.as_slice(), &top, config, &mut report);
    for (i, entry) in record.education.iter().enumerate() {
        let site = Site {
            index: i + 1,
            item: 0,
            label: entry.label(),
        };
        apply(EDUCATION_RULES, entry, &site, config, &mut report);
    }

    for (i, section) in record.other_sections.iter().enumerate() {
        let site = Site {
            index: i + 1,
            item: 0,
            label: section.section_title(),
        };
        apply(SECTION_RULES, section, &site, config, &mut report);
        match section {
            OtherSection::Structured(s) => {
                apply(STRUCTURED_SECTION_RULES, s, &site, config, &mut report);
                for (e, entry) in s.entries.iter().enumerate() {
                    let entry_site = Site { item: e + 1, ..site };
                    apply(SECTION_ENTRY_RULES, entry, &entry_site, config, &mut report);
                }
            }
            OtherSection::List(l) => {
                apply(LIST_SECTION_RULES, l, &site, config, &mut report);
                for (k, item) in l.items.iter().enumerate() {
                    let item_site = Site { item: k + 1, ..site };
                    apply(LIST_ITEM_RULES, item.as_str(), &item_site, config, &mut report);
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn validate(candidate: &Value) -> ValidationReport {
        validate_with(candidate, &ValidationConfig::default())
    }

    fn base() -> Value {
        json!({
            "name": "Ada Lovelace",
            "experience": [{
                "title": "Analyst",
                "company": "Engine Co",
                "dates": "1842 - 1843",
                "description": ["Wrote the first published algorithm"]
            }],
            "education": [{"degree": "Mathematics", "institution": "Private tutoring", "dates": "1830s"}]
        })
    }

    #[test]
    fn test_clean_record_has_no_findings() {
        let report = validate(&base());
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert!(report.is_renderable());
    }

    #[test]
    fn test_non_object_is_single_structural_error() {
        let report = validate(&json!([1, 2, 3]));
        assert_eq!(
            report.errors,
            vec!["Parsed resume data is not in the expected format."]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_name_and_experience() {
        let report = validate(&json!({"name": "", "experience": []}));
        assert_eq!(
            report.errors,
            vec!["Candidate name is empty.", "No experience entries provided."]
        );
        assert!(report.warnings.iter().any(|w| w.starts_with("No education entries provided")));
        assert!(!report.is_renderable());
    }

    #[test]
    fn test_name_warnings() {
        let mut v = base();
        v["name"] = json!("Al");
        assert_eq!(
            validate(&v).warnings,
            vec!["Name seems too short - is it complete?"]
        );
        v["name"] = json!("ADA KING LOVELACE");
        assert_eq!(
            validate(&v).warnings,
            vec!["Name is in all caps - consider using proper case."]
        );
        v["name"] = json!("ADA KING");
        assert!(validate(&v).warnings.is_empty());
    }

    #[test]
    fn test_single_sparse_experience_entry() {
        let mut v = base();
        v["experience"] = json!([{"title": "Engineer", "company": "", "dates": "", "description": ["Led team"]}]);
        let report = validate(&v);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec![
                "Experience #1 (Engineer) is missing company name.",
                "Experience #1 (Engineer) is missing dates.",
                "Experience #1 (Engineer), bullet 1 is too short (less than 10 characters).",
            ]
        );
    }

    #[test]
    fn test_missing_title_and_company_is_error() {
        let mut v = base();
        v["experience"] = json!([{"dates": "2020", "description": ["Did a great many things"]}]);
        let report = validate(&v);
        assert_eq!(
            report.errors,
            vec!["Experience #1 is missing both title and company."]
        );
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_missing_title_with_company_present() {
        let mut v = base();
        v["experience"][0]["title"] = json!("  ");
        let report = validate(&v);
        assert_eq!(
            report.warnings,
            vec!["Experience #1 (Engine Co) is missing job title."]
        );
    }

    #[test]
    fn test_problematic_bullet() {
        let mut v = base();
        v["experience"][0]["description"] = json!(["Shipped the â€ widget to customers"]);
        let report = validate(&v);
        assert_eq!(
            report.warnings,
            vec!["Experience #1 (Analyst), bullet 1 contains special characters that may not render properly."]
        );
    }

    #[test]
    fn test_duplicate_experiences_reference_both_positions() {
        let mut v = base();
        v["experience"] = json!([
            {"title": "Engineer", "company": "Acme", "dates": "2020", "description": ["Built the billing platform"]},
            {"title": "Designer", "company": "Initech", "dates": "2019", "description": ["Drew the company logo"]},
            {"title": " ENGINEER", "company": "acme ", "dates": "2018", "description": ["Built the billing platform"]},
        ]);
        let report = validate(&v);
        assert_eq!(
            report.warnings,
            vec!["Experience #1 and #3 appear to be duplicates."]
        );
    }

    #[test]
    fn test_duplicate_threshold_override() {
        let mut v = base();
        v["experience"] = json!([
            {"title": "Engineer", "company": "Acme", "dates": "2020", "description": ["Built the billing platform"]},
            {"title": "Manager", "company": "Acme", "dates": "2021", "description": ["Ran the billing platform"]},
        ]);
        assert!(validate(&v).warnings.is_empty());
        let loose = ValidationConfig {
            duplicate_min_matches: 1,
            ..Default::default()
        };
        assert_eq!(validate_with(&v, &loose).warnings.len(), 1);
    }

    #[test]
    fn test_every_duplicate_pair_is_reported_in_order() {
        let mut v = base();
        let job = json!({"title": "Engineer", "company": "Acme", "dates": "2020",
                         "description": ["Built the billing platform"]});
        v["experience"] = json!([job.clone(), job.clone(), job]);
        assert_eq!(
            validate(&v).warnings,
            vec![
                "Experience #1 and #2 appear to be duplicates.",
                "Experience #1 and #3 appear to be duplicates.",
                "Experience #2 and #3 appear to be duplicates.",
            ]
        );
    }

    #[test]
    fn test_missing_education_is_warning_only() {
        let mut v = base();
        v["education"] = json!([]);
        let report = validate(&v);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_education_entry_rules() {
        let mut v = base();
        v["education"] = json!([
            {"details": ["Only details"]},
            {"degree": "BSc"},
        ]);
        let report = validate(&v);
        assert_eq!(report.errors, vec!["Education entry #1 is completely empty."]);
        assert_eq!(
            report.warnings,
            vec![
                "Education #2 (BSc) is missing institution name.",
                "Education #2 (BSc) is missing dates.",
            ]
        );
    }

    #[test]
    fn test_list_section_short_item() {
        let mut v = base();
        v["other_sections"] = json!([
            {"section_title": "Certifications", "type": "list", "items": ["AB", "Certified Engineer"]}
        ]);
        assert_eq!(
            validate(&v).warnings,
            vec!["Section 'Certifications', item #1 is too short."]
        );
    }

    #[test]
    fn test_numeric_list_item_is_checked_not_dropped() {
        let mut v = base();
        v["other_sections"] = json!([
            {"section_title": "Skills", "type": "list", "items": [42, "Rust programming"]}
        ]);
        assert_eq!(
            validate(&v).warnings,
            vec!["Section 'Skills', item #1 is too short."]
        );
    }

    #[test]
    fn test_structured_section_rules() {
        let mut v = base();
        v["other_sections"] = json!([
            {"type": "structured", "entries": []},
            {"section_title": "Projects", "type": "structured",
             "entries": [{"dates": "2020"}, {"title": "Compiler"}]},
            {"section_title": "Skills", "type": "list", "items": []},
        ]);
        assert_eq!(
            validate(&v).warnings,
            vec![
                "Additional section #1 has no title.",
                "Section #1 has no entries.",
                "Section 'Projects', entry #1 is empty.",
                "Section 'Skills' has no items.",
            ]
        );
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let v = base();
        let record = ResumeRecord::decode(&v).unwrap();
        let before = record.clone();
        let _ = validate_record(&record, &ValidationConfig::default());
        assert_eq!(record, before);
    }

    #[test]
    fn test_catalog_exposes_severity_policy() {
        let catalog = rule_catalog();
        let severity = |code: &str| catalog.iter().find(|r| r.code == code).map(|r| r.severity);
        assert_eq!(severity("experience.none"), Some(Severity::Error));
        assert_eq!(severity("education.none"), Some(Severity::Warning));
        assert_eq!(severity("experience.duplicate"), Some(Severity::Warning));
        assert_eq!(catalog.len(), 22);
    }

    proptest! {
        #[test]
        fn prop_validation_is_deterministic(
            name in "[A-Za-z ]{0,15}",
            titles in prop::collection::vec("[A-Za-z]{0,6}", 0..4),
        ) {
            let experience: Vec<Value> = titles
                .iter()
                .map(|t| json!({"title": t, "company": "Acme", "description": [t]}))
                .collect();
            let v = json!({"name": name, "experience": experience});
            prop_assert_eq!(validate(&v), validate(&v));
        }
    }
}
