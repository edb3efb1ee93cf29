//! Narrow a record list by level, region and free-text search.
//!
//! A constraint set to `"all"` or left blank matches every record, which is
//! how the dashboard's select boxes express "no filter".

use std::collections::HashSet;

use crate::SchoolRecord;

const MATCH_ALL: &str = "all";

fn constraint(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MATCH_ALL) {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Conjunctive filter over [`SchoolRecord`]s.
///
/// # Examples
///
/// ```
/// use sekolah_core::{SchoolFilter, SchoolRecord};
///
/// let records = vec![
///     SchoolRecord { npsn: "1".into(), name: "SMA Negeri 3".into(), level: "SMA".into(), ..SchoolRecord::default() },
///     SchoolRecord { npsn: "2".into(), name: "SD Kanisius".into(), level: "SD".into(), ..SchoolRecord::default() },
/// ];
///
/// let filter = SchoolFilter::default().with_level("SMA").with_search("negeri");
/// let matched = filter.apply(&records);
/// assert_eq!(matched.len(), 1);
/// assert_eq!(matched[0].npsn, "1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolFilter {
    level: Option<String>,
    regency: Option<String>,
    district: Option<String>,
    search: Option<String>,
}

impl SchoolFilter {
    /// Keep records whose level equals `level` exactly.
    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = constraint(level);
        self
    }

    /// Keep records whose first address lies in `regency`.
    #[must_use]
    pub fn with_regency(mut self, regency: &str) -> Self {
        self.regency = constraint(regency);
        self
    }

    /// Keep records whose first address lies in `district`.
    #[must_use]
    pub fn with_district(mut self, district: &str) -> Self {
        self.district = constraint(district);
        self
    }

    /// Keep records whose name contains `term` (ignoring case) or whose NPSN
    /// contains it verbatim.
    #[must_use]
    pub fn with_search(mut self, term: &str) -> Self {
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.trim().to_owned())
        };
        self
    }

    /// Whether no constraint is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.regency.is_none()
            && self.district.is_none()
            && self.search.is_none()
    }

    /// Whether `record` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, record: &SchoolRecord) -> bool {
        let address = record.address();
        let regency = address.map_or("", |a| a.regency.as_str());
        let district = address.map_or("", |a| a.district.as_str());

        self.level.as_deref().is_none_or(|level| record.level == level)
            && self.regency.as_deref().is_none_or(|r| regency == r)
            && self.district.as_deref().is_none_or(|d| district == d)
            && self.search.as_deref().is_none_or(|term| {
                record.name.to_lowercase().contains(&term.to_lowercase())
                    || record.npsn.contains(term)
            })
    }

    /// Records matching the filter, in input order.
    #[must_use]
    pub fn apply(&self, records: &[SchoolRecord]) -> Vec<SchoolRecord> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

/// Distinct, non-empty regency names in first-seen order.
#[must_use]
pub fn unique_regencies(records: &[SchoolRecord]) -> Vec<String> {
    distinct(records.iter().filter_map(|r| r.address().map(|a| a.regency.as_str())))
}

/// Distinct, non-empty district names in first-seen order, optionally
/// restricted to one regency (`"all"` or blank means every regency).
#[must_use]
pub fn unique_districts(records: &[SchoolRecord], regency: Option<&str>) -> Vec<String> {
    let within = regency.and_then(constraint);
    distinct(
        records
            .iter()
            .filter_map(SchoolRecord::address)
            .filter(|a| within.as_deref().is_none_or(|r| a.regency == r))
            .map(|a| a.district.as_str()),
    )
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(str::to_owned)
        .collect()
}
