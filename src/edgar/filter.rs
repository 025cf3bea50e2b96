// src/edgar/filter.rs
use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::edgar::models::{FilingCollection, FilingRecord};

/// Annual and quarterly report form types.
pub const PERIODIC_FORMS: [&str; 2] = ["10-K", "10-Q"];

/// Inclusive date range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn since(start: NaiveDate) -> Self {
        Self::new(Some(start), None)
    }

    pub fn until(end: NaiveDate) -> Self {
        Self::new(None, Some(end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Conjunction of optional predicates over filings.
///
/// Each field left as `None` imposes no constraint. `xbrl_only: Some(false)`
/// is the same as `None`. `limit` keeps the first N matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub form_types: Option<BTreeSet<String>>,
    pub filing_date_range: Option<DateRange>,
    pub report_date_range: Option<DateRange>,
    pub xbrl_only: Option<bool>,
    pub limit: Option<usize>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to the given form types (trimmed, upper-cased).
    pub fn form_types<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forms = forms
            .into_iter()
            .map(|f| f.as_ref().trim().to_uppercase())
            .collect();
        self.form_types = Some(forms);
        self
    }

    pub fn filed(mut self, range: DateRange) -> Self {
        self.filing_date_range = Some(range);
        self
    }

    pub fn reported(mut self, range: DateRange) -> Self {
        self.report_date_range = Some(range);
        self
    }

    pub fn xbrl_only(mut self, xbrl_only: bool) -> Self {
        self.xbrl_only = Some(xbrl_only);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every present predicate holds for `record`.
    pub fn matches(&self, record: &FilingRecord) -> bool {
        if let Some(forms) = &self.form_types {
            if !forms.contains(record.form_type.as_str()) {
                return false;
            }
        }

        if let Some(range) = &self.filing_date_range {
            if !range.contains(record.filing_date) {
                return false;
            }
        }

        // A record without a report date cannot satisfy a report-date range.
        if let Some(range) = &self.report_date_range {
            match record.report_date {
                Some(reported) if range.contains(reported) => {}
                _ => return false,
            }
        }

        if self.xbrl_only == Some(true) && !record.is_xbrl {
            return false;
        }

        true
    }
}

/// Returns the records matching `criteria`, in their original order,
/// truncated to `criteria.limit` if set.
pub fn filter(collection: &FilingCollection, criteria: &FilterCriteria) -> FilingCollection {
    let matching = collection.iter().filter(|record| criteria.matches(record));

    match criteria.limit {
        Some(limit) => matching.take(limit).cloned().collect(),
        None => matching.cloned().collect(),
    }
}

/// Most recent 10-K or 10-Q in the collection.
pub fn latest_periodic(collection: &FilingCollection) -> Option<&FilingRecord> {
    collection
        .iter()
        .find(|record| PERIODIC_FORMS.contains(&record.form_type.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::testing::{date, record};

    /// Three filings in the order the registry returned them.
    fn three() -> FilingCollection {
        FilingCollection::new(vec![
            record("acc-1", "10-K", "2023-01-10", Some("2022-12-31"), true),
            record("acc-2", "10-Q", "2023-04-10", Some("2023-03-31"), true),
            record("acc-3", "10-Q", "2023-07-10", Some("2023-06-30"), false),
        ])
    }

    fn accessions(collection: &FilingCollection) -> Vec<&str> {
        collection.iter().map(|r| r.accession_number.as_str()).collect()
    }

    #[test]
    fn form_type_filter_preserves_order() {
        let result = filter(&three(), &FilterCriteria::new().form_types(["10-Q"]));
        assert_eq!(accessions(&result), ["acc-2", "acc-3"]);
        assert_eq!(result.get(0).unwrap().filing_date, date("2023-04-10"));
        assert_eq!(result.get(1).unwrap().filing_date, date("2023-07-10"));
    }

    #[test]
    fn only_requested_form_types_survive() {
        let result = filter(&three(), &FilterCriteria::new().form_types(["10-K"]));
        assert!(result.iter().all(|r| r.form_type == "10-K"));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn form_types_are_normalized() {
        let result = filter(&three(), &FilterCriteria::new().form_types([" 10-k "]));
        assert_eq!(accessions(&result), ["acc-1"]);
    }

    #[test]
    fn empty_criteria_is_identity() {
        let collection = three();
        assert_eq!(filter(&collection, &FilterCriteria::default()), collection);
    }

    #[test]
    fn date_ranges_are_inclusive() {
        let criteria = FilterCriteria::new()
            .filed(DateRange::between(date("2023-01-10"), date("2023-04-10")));
        assert_eq!(accessions(&filter(&three(), &criteria)), ["acc-1", "acc-2"]);

        let open_start = FilterCriteria::new().filed(DateRange::until(date("2023-04-10")));
        assert_eq!(accessions(&filter(&three(), &open_start)), ["acc-1", "acc-2"]);

        let open_end = FilterCriteria::new().filed(DateRange::since(date("2023-04-10")));
        assert_eq!(accessions(&filter(&three(), &open_end)), ["acc-2", "acc-3"]);
    }

    #[test]
    fn predicates_combine_with_and() {
        // Filing range selects acc-1 and acc-2; report range selects acc-3.
        let criteria = FilterCriteria::new()
            .filed(DateRange::between(date("2023-01-01"), date("2023-04-30")))
            .reported(DateRange::since(date("2023-06-01")));
        assert!(filter(&three(), &criteria).is_empty());

        let criteria = FilterCriteria::new()
            .form_types(["10-Q"])
            .filed(DateRange::since(date("2023-01-01")))
            .xbrl_only(true);
        assert_eq!(accessions(&filter(&three(), &criteria)), ["acc-2"]);
    }

    #[test]
    fn missing_report_date_fails_report_range() {
        let collection = FilingCollection::new(vec![
            record("acc-1", "8-K", "2023-05-01", None, false),
            record("acc-2", "10-Q", "2023-05-01", Some("2023-03-31"), true),
        ]);

        // Unbounded on both ends still requires a report date.
        let criteria = FilterCriteria::new().reported(DateRange::default());
        assert_eq!(accessions(&filter(&collection, &criteria)), ["acc-2"]);

        let criteria = FilterCriteria::new()
            .filed(DateRange::between(date("2023-05-01"), date("2023-05-01")))
            .reported(DateRange::until(date("2023-12-31")));
        assert_eq!(accessions(&filter(&collection, &criteria)), ["acc-2"]);
    }

    #[test]
    fn xbrl_only_false_imposes_nothing() {
        let result = filter(&three(), &FilterCriteria::new().xbrl_only(false));
        assert_eq!(result.len(), 3);
        let result = filter(&three(), &FilterCriteria::new().xbrl_only(true));
        assert_eq!(accessions(&result), ["acc-1", "acc-2"]);
    }

    #[test]
    fn limit_applies_after_filtering() {
        let collection = FilingCollection::new(
            (0..7)
                .map(|i| {
                    let form = if i % 3 == 0 { "8-K" } else { "10-Q" };
                    record(&format!("acc-{}", i), form, "2023-05-01", None, true)
                })
                .collect(),
        );
        let all = filter(&collection, &FilterCriteria::new().form_types(["10-Q"]));
        assert_eq!(all.len(), 4);

        let one = filter(&collection, &FilterCriteria::new().form_types(["10-Q"]).limit(1));
        assert_eq!(accessions(&one), ["acc-1"]);

        let none = filter(&collection, &FilterCriteria::new().limit(0));
        assert!(none.is_empty());
    }

    #[test]
    fn filter_is_pure() {
        let collection = three();
        let criteria = FilterCriteria::new().form_types(["10-Q"]).limit(1);
        assert_eq!(filter(&collection, &criteria), filter(&collection, &criteria));
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn latest_periodic_skips_other_forms() {
        let collection = FilingCollection::new(vec![
            record("acc-1", "8-K", "2023-08-01", None, false),
            record("acc-2", "10-Q", "2023-07-10", Some("2023-06-30"), true),
            record("acc-3", "10-K", "2023-01-10", Some("2022-12-31"), true),
        ]);
        assert_eq!(latest_periodic(&collection).unwrap().accession_number, "acc-2");
        assert!(latest_periodic(&FilingCollection::default()).is_none());
    }
}
