//! Per-record predicates: status, CPV category prefix, procuring-entity region.
//!
//! Matching is exact text, case-sensitive, with no whitespace or diacritic
//! normalization. A region such as `"Київська  область"` (double space) will
//! not match `"Київська область"`; the keyword list is what catches variants.

use crate::tender::TenderRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    pub required_status: String,
    /// Allowed CPV code prefixes, compared against the leading numeric segment.
    pub category_prefixes: Vec<String>,
    /// Region strings accepted on exact equality.
    pub regions: Vec<String>,
    /// Region substrings accepted anywhere in the region field.
    pub region_keywords: Vec<String>,
}

/// Why a record was rejected. Only used for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Status,
    Category,
    Region,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rejection::Status => "status",
            Rejection::Category => "category",
            Rejection::Region => "region",
        };
        f.write_str(s)
    }
}

impl FilterCriteria {
    pub fn accepts(&self, record: &TenderRecord) -> bool {
        self.evaluate(record).is_ok()
    }

    /// Check every predicate in order, reporting the first one that fails.
    pub fn evaluate(&self, record: &TenderRecord) -> Result<(), Rejection> {
        if record.status.as_deref() != Some(self.required_status.as_str()) {
            return Err(Rejection::Status);
        }
        if !record.cpv_codes().any(|code| self.category_allowed(code)) {
            return Err(Rejection::Category);
        }
        match record.region() {
            Some(region) if self.region_allowed(region) => Ok(()),
            _ => Err(Rejection::Region),
        }
    }

    pub fn category_allowed(&self, code: &str) -> bool {
        let segment = leading_segment(code);
        if segment.is_empty() {
            return false;
        }
        self.category_prefixes
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .any(|p| segment.starts_with(p))
    }

    /// Union of exact names and substring keywords.
    pub fn region_allowed(&self, region: &str) -> bool {
        if region.is_empty() {
            return false;
        }
        self.regions.iter().any(|r| r == region)
            || self
                .region_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .any(|k| region.contains(k.as_str()))
    }
}

/// Numeric head of a CPV code: `"15420000-1"` → `"15420000"`.
pub fn leading_segment(code: &str) -> &str {
    let end = code
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    &code[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tender::{Address, Classification, LineItem, ProcuringEntity};

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            required_status: "active.tendering".to_string(),
            category_prefixes: vec!["15420000".to_string(), "1533".to_string()],
            regions: vec!["Черкаська".to_string()],
            region_keywords: vec!["Київ".to_string()],
        }
    }

    fn record(status: &str, codes: &[&str], region: Option<&str>) -> TenderRecord {
        TenderRecord {
            id: "t1".to_string(),
            status: Some(status.to_string()),
            items: codes
                .iter()
                .map(|c| LineItem {
                    classification: Some(Classification {
                        id: Some(c.to_string()),
                        scheme: None,
                    }),
                })
                .collect(),
            procuring_entity: Some(ProcuringEntity {
                address: Some(Address {
                    region: region.map(str::to_string),
                    locality: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn leading_segment_stops_at_separator() {
        assert_eq!(leading_segment("15420000-1"), "15420000");
        assert_eq!(leading_segment("15420000"), "15420000");
        assert_eq!(leading_segment("-1"), "");
    }

    #[test]
    fn accepts_matching_record() {
        let r = record("active.tendering", &["15420000-1"], Some("Черкаська"));
        assert!(criteria().accepts(&r));
    }

    #[test]
    fn rejects_wrong_status() {
        for status in ["complete", "active.enquiries", "Active.Tendering", ""] {
            let r = record(status, &["15420000-1"], Some("Черкаська"));
            assert_eq!(criteria().evaluate(&r), Err(Rejection::Status), "{status}");
        }
        let mut r = record("active.tendering", &["15420000-1"], Some("Черкаська"));
        r.status = None;
        assert!(!criteria().accepts(&r));
    }

    #[test]
    fn category_needs_one_matching_code() {
        let c = criteria();
        let none = record("active.tendering", &["03000000-1", "44000000-0"], Some("Черкаська"));
        assert_eq!(c.evaluate(&none), Err(Rejection::Category));

        let one = record("active.tendering", &["03000000-1", "15330000-0"], Some("Черкаська"));
        assert!(c.accepts(&one));

        let empty = record("active.tendering", &[], Some("Черкаська"));
        assert_eq!(c.evaluate(&empty), Err(Rejection::Category));
    }

    #[test]
    fn region_exact_or_keyword() {
        let c = criteria();
        assert!(c.region_allowed("Черкаська"));
        assert!(c.region_allowed("м. Київ"));
        assert!(c.region_allowed("Київська область"));
        assert!(!c.region_allowed("Одеська"));
        // Exact list does not do substring matching.
        assert!(!c.region_allowed("Черкаська область"));
        // No normalization.
        assert!(!c.region_allowed(" Черкаська"));
        assert!(!c.region_allowed(""));
    }

    #[test]
    fn missing_region_rejects() {
        let r = record("active.tendering", &["15420000-1"], None);
        assert_eq!(criteria().evaluate(&r), Err(Rejection::Region));

        let mut r = record("active.tendering", &["15420000-1"], Some("Київ"));
        r.procuring_entity = None;
        assert_eq!(criteria().evaluate(&r), Err(Rejection::Region));
    }
}
