//! Edit reconciliation: merge a flat bag of user edits back into a record.
//!
//! Edits address the prior record positionally. For every field, `None` means
//! "not on the form, keep the prior value" and `Some(raw)` replaces it after
//! trimming (scalars) or line splitting (multiline blocks). A blank scalar makes
//! the field absent. Edits past the end of a prior list append new entries.
//!
//! `reconcile` is total: it never fails and never touches the prior record.

use serde::{Deserialize, Serialize};

use crate::engine::normalize::{non_empty, split_to_lines};
use crate::models::resume::{
    ContactInfo, EducationEntry, ExperienceEntry, ListSection, OtherSection, ResumeRecord,
    SectionEntry, SectionKind, StructuredSection, UNTITLED_SECTION,
};

// ────────────────────────────────────────────────────────────────────────────
// Editable surface
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditedFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    /// Multiline block, one detail per line.
    pub contact_details: Option<String>,
    pub version: Option<String>,
    pub experience: Vec<ExperienceEdit>,
    pub education: Vec<EducationEdit>,
    pub other_sections: Vec<SectionEdit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEdit {
    pub title: Option<String>,
    pub company: Option<String>,
    pub dates: Option<String>,
    pub description: Option<String>,
    pub remove: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEdit {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub dates: Option<String>,
    pub details: Option<String>,
    pub remove: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionEdit {
    pub section_title: Option<String>,
    /// `None` keeps the prior shape; new sections default to structured.
    #[serde(rename = "type")]
    pub kind: Option<SectionKind>,
    pub entries: Vec<SectionEntryEdit>,
    pub items: Option<String>,
    pub remove: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionEntryEdit {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub dates: Option<String>,
    pub description: Option<String>,
    pub remove: bool,
}

fn block(lines: &[String]) -> String {
    lines.join("\n")
}

impl EditedFields {
    /// The edit form prefilled from a record. Reconciling a clean record with its
    /// own form yields the record unchanged.
    pub fn from_record(record: &ResumeRecord) -> Self {
        let c = &record.contact;
        Self {
            name: record.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            mobile: c.mobile.clone(),
            location: c.location.clone(),
            linkedin: c.linkedin.clone(),
            website: c.website.clone(),
            github: c.github.clone(),
            contact_details: Some(block(&record.contact_details)),
            version: record.version.clone(),
            experience: record
                .experience
                .iter()
                .map(|e| ExperienceEdit {
                    title: e.title.clone(),
                    company: e.company.clone(),
                    dates: e.dates.clone(),
                    description: Some(block(&e.description)),
                    remove: false,
                })
                .collect(),
            education: record
                .education
                .iter()
                .map(|e| EducationEdit {
                    degree: e.degree.clone(),
                    institution: e.institution.clone(),
                    dates: e.dates.clone(),
                    details: Some(block(&e.details)),
                    remove: false,
                })
                .collect(),
            other_sections: record.other_sections.iter().map(section_form).collect(),
        }
    }
}

fn section_form(section: &OtherSection) -> SectionEdit {
    match section {
        OtherSection::Structured(s) => SectionEdit {
            section_title: s.section_title.clone(),
            kind: Some(SectionKind::Structured),
            entries: s
                .entries
                .iter()
                .map(|e| SectionEntryEdit {
                    title: e.title.clone(),
                    organization: e.organization.clone(),
                    dates: e.dates.clone(),
                    description: Some(block(&e.description)),
                    remove: false,
                })
                .collect(),
            items: None,
            remove: false,
        },
        OtherSection::List(l) => SectionEdit {
            section_title: l.section_title.clone(),
            kind: Some(SectionKind::List),
            entries: Vec::new(),
            items: Some(block(&l.items)),
            remove: false,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Merge
// ────────────────────────────────────────────────────────────────────────────

fn scalar(prior: &Option<String>, edit: &Option<String>) -> Option<String> {
    match edit {
        Some(raw) => non_empty(raw),
        None => prior.clone(),
    }
}

fn lines(prior: &[String], edit: &Option<String>) -> Vec<String> {
    match edit {
        Some(raw) => split_to_lines([raw]),
        None => prior.to_vec(),
    }
}

/// Walks prior entries and edits side by side. Removed and emptied entries are
/// dropped; survivors keep their original position.
fn merge_positional<P, E, F, K>(prior: &[P], edits: &[E], merge: F, keep: K) -> Vec<P>
where
    P: Clone + Default,
    F: Fn(&P, &E) -> Option<P>,
    K: Fn(&P) -> bool,
{
    let blank = P::default();
    (0..prior.len().max(edits.len()))
        .filter_map(|i| {
            let base = prior.get(i).unwrap_or(&blank);
            let merged = match edits.get(i) {
                Some(edit) => merge(base, edit)?,
                None => base.clone(),
            };
            keep(&merged).then_some(merged)
        })
        .collect()
}

fn merge_experience(prior: &ExperienceEntry, edit: &ExperienceEdit) -> Option<ExperienceEntry> {
    (!edit.remove).then(|| ExperienceEntry {
        title: scalar(&prior.title, &edit.title),
        company: scalar(&prior.company, &edit.company),
        dates: scalar(&prior.dates, &edit.dates),
        description: lines(&prior.description, &edit.description),
    })
}

fn merge_education(prior: &EducationEntry, edit: &EducationEdit) -> Option<EducationEntry> {
    (!edit.remove).then(|| EducationEntry {
        degree: scalar(&prior.degree, &edit.degree),
        institution: scalar(&prior.institution, &edit.institution),
        dates: scalar(&prior.dates, &edit.dates),
        details: lines(&prior.details, &edit.details),
    })
}

fn merge_section_entry(prior: &SectionEntry, edit: &SectionEntryEdit) -> Option<SectionEntry> {
    (!edit.remove).then(|| SectionEntry {
        title: scalar(&prior.title, &edit.title),
        organization: scalar(&prior.organization, &edit.organization),
        dates: scalar(&prior.dates, &edit.dates),
        description: lines(&prior.description, &edit.description),
    })
}

/// Placeholder for positional sections added past the end of the prior list.
#[derive(Clone)]
struct SectionSlot(OtherSection);

impl Default for SectionSlot {
    fn default() -> Self {
        SectionSlot(OtherSection::Structured(StructuredSection::default()))
    }
}

fn merge_section(prior: &SectionSlot, edit: &SectionEdit) -> Option<SectionSlot> {
    if edit.remove {
        return None;
    }
    let prior = &prior.0;
    let title = scalar(&prior.section_title().map(String::from), &edit.section_title);
    let section = match edit.kind.unwrap_or_else(|| prior.kind()) {
        SectionKind::Structured => {
            let prior_entries: &[SectionEntry] = match prior {
                OtherSection::Structured(s) => s.entries.as_slice(),
                OtherSection::List(_) => &[],
            };
            OtherSection::Structured(StructuredSection {
                section_title: title,
                entries: merge_positional(
                    prior_entries,
                    &edit.entries,
                    merge_section_entry,
                    |e| !e.is_empty(),
                ),
            })
        }
        SectionKind::List => {
            let prior_items: &[String] = match prior {
                OtherSection::List(l) => l.items.as_slice(),
                OtherSection::Structured(_) => &[],
            };
            OtherSection::List(ListSection {
                section_title: title,
                items: lines(prior_items, &edit.items),
            })
        }
    };
    Some(SectionSlot(section))
}

/// A kept section with content but no title is given [`UNTITLED_SECTION`].
fn finish_section(slot: SectionSlot) -> Option<OtherSection> {
    let has_content = match &slot.0 {
        OtherSection::Structured(s) => !s.entries.is_empty(),
        OtherSection::List(l) => !l.items.is_empty(),
    };
    let mut section = slot.0;
    if section.section_title().is_none() {
        if !has_content {
            return None;
        }
        let untitled = Some(UNTITLED_SECTION.to_string());
        match &mut section {
            OtherSection::Structured(s) => s.section_title = untitled,
            OtherSection::List(l) => l.section_title = untitled,
        }
    }
    Some(section)
}

/// Builds a new record from `prior` and the user's edits.
pub fn reconcile(prior: &ResumeRecord, edits: &EditedFields) -> ResumeRecord {
    let c = &prior.contact;
    let prior_sections: Vec<SectionSlot> =
        prior.other_sections.iter().cloned().map(SectionSlot).collect();

    ResumeRecord {
        name: scalar(&prior.name, &edits.name),
        contact: ContactInfo {
            email: scalar(&c.email, &edits.email),
            phone: scalar(&c.phone, &edits.phone),
            mobile: scalar(&c.mobile, &edits.mobile),
            location: scalar(&c.location, &edits.location),
            linkedin: scalar(&c.linkedin, &edits.linkedin),
            website: scalar(&c.website, &edits.website),
            github: scalar(&c.github, &edits.github),
        },
        contact_details: lines(&prior.contact_details, &edits.contact_details),
        experience: merge_positional(
            &prior.experience,
            &edits.experience,
            merge_experience,
            |e| !e.is_empty(),
        ),
        education: merge_positional(
            &prior.education,
            &edits.education,
            merge_education,
            |e| !e.is_empty(),
        ),
        other_sections: merge_positional(&prior_sections, &edits.other_sections, merge_section, |_| true)
            .into_iter()
            .filter_map(finish_section)
            .collect(),
        version: scalar(&prior.version, &edits.version),
        extension_fields: prior.extension_fields.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::validation::{validate_record, ValidationConfig};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn record() -> ResumeRecord {
        ResumeRecord::decode(&json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "contact_details": ["London"],
            "experience": [
                {"title": "Analyst", "company": "Engine Co", "dates": "1842", "description": ["Wrote notes on the engine"]},
                {"title": "Translator", "company": "Taylor", "dates": "1843", "description": ["Translated the memoir"]}
            ],
            "education": [{"degree": "Mathematics", "institution": "Tutoring", "dates": "1830s"}],
            "other_sections": [
                {"section_title": "Skills", "type": "list", "items": ["Analysis", "Poetry"]},
                {"section_title": "Projects", "type": "structured",
                 "entries": [{"title": "Note G", "description": ["First algorithm"]}]}
            ],
            "version": "v2",
            "summary": {"nested": [1, 2, 3]}
        }))
        .unwrap()
    }

    #[test]
    fn test_own_form_is_fixed_point() {
        let prior = record();
        let merged = reconcile(&prior, &EditedFields::from_record(&prior));
        assert_eq!(merged, prior);
    }

    #[test]
    fn test_empty_edits_keep_everything() {
        let prior = record();
        assert_eq!(reconcile(&prior, &EditedFields::default()), prior);
    }

    #[test]
    fn test_scalars_trimmed_and_blank_removed() {
        let prior = record();
        let edits = EditedFields {
            name: Some("  Augusta Ada King  ".into()),
            email: Some("   ".into()),
            version: Some("".into()),
            ..Default::default()
        };
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.name(), "Augusta Ada King");
        assert_eq!(merged.contact.email, None);
        assert_eq!(merged.version, None);
        let value = merged.to_value();
        assert!(value.get("email").is_none());
        assert!(value.get("version").is_none());
    }

    #[test]
    fn test_multiline_blocks_are_split() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.experience[0].description = Some("  first \n\n second\r\n".into());
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.experience[0].description, vec!["first", "second"]);
    }

    #[test]
    fn test_removed_entry_keeps_order_of_survivors() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.experience[0].remove = true;
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.experience.len(), 1);
        assert_eq!(merged.experience[0].title(), "Translator");
    }

    #[test]
    fn test_emptied_entry_is_dropped() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.experience[1] = ExperienceEdit {
            title: Some(" ".into()),
            company: Some("".into()),
            dates: Some("".into()),
            description: Some("\n \n".into()),
            remove: false,
        };
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.experience.len(), 1);
        assert_eq!(merged.experience[0].title(), "Analyst");
    }

    #[test]
    fn test_removing_only_education_is_not_an_error() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.education[0].remove = true;
        let merged = reconcile(&prior, &edits);
        assert!(merged.education.is_empty());

        let report = validate_record(&merged, &ValidationConfig::default());
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("No education entries provided")));
    }

    #[test]
    fn test_extra_edits_append_entries() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.education.push(EducationEdit {
            degree: Some("Logic".into()),
            ..Default::default()
        });
        edits.education.push(EducationEdit::default());
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.education.len(), 2);
        assert_eq!(merged.education[1].degree(), "Logic");
    }

    #[test]
    fn test_section_rules() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.other_sections[0].remove = true;
        edits.other_sections[1].section_title = Some(" ".into());
        edits.other_sections.push(SectionEdit {
            kind: Some(SectionKind::List),
            items: Some("".into()),
            ..Default::default()
        });
        let merged = reconcile(&prior, &edits);
        assert_eq!(merged.other_sections.len(), 1);
        assert_eq!(merged.other_sections[0].section_title(), Some(UNTITLED_SECTION));
        assert_eq!(merged.other_sections[0].kind(), SectionKind::Structured);
    }

    #[test]
    fn test_section_kind_change() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.other_sections[1].kind = Some(SectionKind::List);
        edits.other_sections[1].items = Some("Note G\nNote A".into());
        let merged = reconcile(&prior, &edits);
        match &merged.other_sections[1] {
            OtherSection::List(l) => assert_eq!(l.items, vec!["Note G", "Note A"]),
            other => panic!("expected list section, got {other:?}"),
        }
    }

    #[test]
    fn test_section_entry_removed() {
        let prior = record();
        let mut edits = EditedFields::from_record(&prior);
        edits.other_sections[1].entries[0].remove = true;
        let merged = reconcile(&prior, &edits);
        // Titled sections survive even when emptied.
        match &merged.other_sections[1] {
            OtherSection::Structured(s) => assert!(s.entries.is_empty()),
            other => panic!("expected structured section, got {other:?}"),
        }
    }

    #[test]
    fn test_prior_is_not_mutated() {
        let prior = record();
        let snapshot = prior.clone();
        let mut edits = EditedFields::from_record(&prior);
        edits.name = Some("Someone Else".into());
        edits.experience.clear();
        let _ = reconcile(&prior, &edits);
        assert_eq!(prior, snapshot);
    }

    #[test]
    fn test_edits_deserialize_from_partial_json() {
        let edits: EditedFields = serde_json::from_value(json!({
            "name": "Ada",
            "experience": [{"remove": true}],
            "other_sections": [{"type": "list", "items": "a\nb"}]
        }))
        .unwrap();
        assert_eq!(edits.name.as_deref(), Some("Ada"));
        assert!(edits.experience[0].remove);
        assert_eq!(edits.other_sections[0].kind, Some(SectionKind::List));
    }

    fn text() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[A-Za-z][A-Za-z ]{0,10}[a-z]".prop_map(String::from))
    }

    fn body() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[A-Za-z][a-z ]{0,12}[a-z]", 1..3)
    }

    fn experience() -> impl Strategy<Value = ExperienceEntry> {
        (text(), text(), text(), body()).prop_map(|(title, company, dates, description)| {
            ExperienceEntry {
                title,
                company,
                dates,
                description,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_clean_record_is_fixed_point(
            name in text(),
            email in text(),
            experience in prop::collection::vec(experience(), 0..4),
            items in body(),
        ) {
            let prior = ResumeRecord {
                name,
                contact: ContactInfo { email, ..Default::default() },
                experience,
                other_sections: vec![OtherSection::List(ListSection {
                    section_title: Some("Skills".into()),
                    items,
                })],
                ..Default::default()
            };
            let merged = reconcile(&prior, &EditedFields::from_record(&prior));
            prop_assert_eq!(merged, prior);
        }

        #[test]
        fn prop_extension_fields_survive_any_edit(
            key in "[a-z]{1,8}",
            payload in "[ -~]{0,20}",
            remove_all in any::<bool>(),
            new_name in "[ -~]{0,12}",
        ) {
            let mut input = serde_json::Map::new();
            input.insert(format!("x_{key}"), json!({"payload": payload.clone()}));
            input.insert("experience".into(), json!([{"title": "Engineer"}]));
            let prior = ResumeRecord::decode(&Value::Object(input)).unwrap();
            let edits = EditedFields {
                name: Some(new_name),
                experience: vec![ExperienceEdit { remove: remove_all, ..Default::default() }],
                ..Default::default()
            };
            let merged = reconcile(&prior, &edits);
            prop_assert_eq!(&merged.extension_fields, &prior.extension_fields);
        }
    }
}
