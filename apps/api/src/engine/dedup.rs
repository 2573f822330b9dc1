use crate::models::resume::{EducationEntry, ExperienceEntry};

/// Default number of signature positions that must agree before two entries are
/// reported as probable duplicates.
pub const DEFAULT_MIN_MATCHING_FIELDS: usize = 2;

/// `(title, company, degree, institution)`, lowercased and trimmed. Positions that do
/// not apply to an entry kind are empty.
pub type Signature = [String; 4];

/// Entries that can be compared by the duplicate detector.
pub trait Signed {
    fn signature(&self) -> Signature;
}

fn key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Signed for ExperienceEntry {
    fn signature(&self) -> Signature {
        [key(self.title()), key(self.company()), String::new(), String::new()]
    }
}

impl Signed for EducationEntry {
    fn signature(&self) -> Signature {
        [String::new(), String::new(), key(self.degree()), key(self.institution())]
    }
}

/// Positions that are non-empty on both sides and equal.
pub fn matching_fields(a: &Signature, b: &Signature) -> usize {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.is_empty() && !y.is_empty() && x == y)
        .count()
}

pub fn is_duplicate<T: Signed>(a: &T, b: &T, min_matches: usize) -> bool {
    matching_fields(&a.signature(), &b.signature()) >= min_matches.max(1)
}

/// A pair of probable duplicates, as 0-based positions with `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatePair {
    pub first: usize,
    pub second: usize,
}

/// Pairwise scan over a list, in `(first, second)` order.
pub fn find_duplicates<T: Signed>(entries: &[T], min_matches: usize) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            if is_duplicate(a, b, min_matches) {
                pairs.push(DuplicatePair { first: i, second: j });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn job(title: &str, company: &str, dates: &str) -> ExperienceEntry {
        ExperienceEntry {
            title: crate::engine::normalize::non_empty(title),
            company: crate::engine::normalize::non_empty(company),
            dates: crate::engine::normalize::non_empty(dates),
            description: vec![],
        }
    }

    #[test]
    fn test_same_role_different_dates_is_duplicate() {
        let a = job("Engineer", "Acme", "2020");
        let b = job(" engineer ", "ACME", "2021");
        assert!(is_duplicate(&a, &b, DEFAULT_MIN_MATCHING_FIELDS));
    }

    #[test]
    fn test_same_company_different_role_is_not_duplicate() {
        let a = job("Engineer", "Acme", "2020");
        let b = job("Manager", "Acme", "2020");
        assert!(!is_duplicate(&a, &b, DEFAULT_MIN_MATCHING_FIELDS));
    }

    #[test]
    fn test_empty_fields_never_match() {
        let a = job("", "", "2020");
        let b = job("", "", "2020");
        assert_eq!(matching_fields(&a.signature(), &b.signature()), 0);
    }

    #[test]
    fn test_education_signature_uses_degree_and_institution() {
        let a = EducationEntry {
            degree: Some("BSc".into()),
            institution: Some("MIT".into()),
            ..Default::default()
        };
        let b = EducationEntry {
            degree: Some("bsc".into()),
            institution: Some("mit".into()),
            dates: Some("2010".into()),
            ..Default::default()
        };
        assert!(is_duplicate(&a, &b, 2));
    }

    #[test]
    fn test_find_duplicates_reports_ordered_pairs() {
        let entries = vec![
            job("Engineer", "Acme", "2020"),
            job("Analyst", "Initech", "2019"),
            job("Engineer", "Acme", "2018"),
        ];
        assert_eq!(
            find_duplicates(&entries, 2),
            vec![DuplicatePair { first: 0, second: 2 }]
        );
    }

    #[test]
    fn test_threshold_is_configurable() {
        let entries = vec![job("Engineer", "Acme", ""), job("Manager", "Acme", "")];
        assert!(find_duplicates(&entries, 2).is_empty());
        assert_eq!(find_duplicates(&entries, 1).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_duplicate_is_symmetric(
            t1 in "(a|b|)", c1 in "(x|y|)", t2 in "(a|b|)", c2 in "(x|y|)",
        ) {
            let a = job(&t1, &c1, "");
            let b = job(&t2, &c2, "");
            prop_assert_eq!(is_duplicate(&a, &b, 2), is_duplicate(&b, &a, 2));
        }

        #[test]
        fn prop_never_pairs_entry_with_itself(titles in prop::collection::vec("(a|b)", 0..6)) {
            let entries: Vec<_> = titles.iter().map(|t| job(t, "Acme", "")).collect();
            for pair in find_duplicates(&entries, 2) {
                prop_assert!(pair.first < pair.second);
            }
        }
    }
}
