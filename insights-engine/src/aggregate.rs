//! Per-dimension category counting.

use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use insights_core::{
    AgeBucket, CategoryBucket, Dimension, ExtractedRecord, FullDatasetRow, PatientRecord,
    SummaryRow, NO_DATA,
};

pub const UNSPECIFIED_SYMPTOM: &str = "Unspecified Symptom";
pub const UNSPECIFIED_DIAGNOSIS: &str = "Unspecified Diagnosis";
pub const UNSPECIFIED_CATEGORY: &str = "Unspecified Category";
pub const UNSPECIFIED_ID: &str = "Unspecified ID";

const HRSN_PREFIXES: [&str; 2] = ["problem:", "z-code:"];

/// What a bucket's raw count measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counting {
    Occurrences,
    DistinctPatients,
}

/// Denominator used for percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denominator {
    /// Sum of all raw counts, i.e. every matched record.
    TotalCount,
    /// A fixed population size.
    Patients(usize),
}

#[derive(Debug, Default)]
struct TallyEntry {
    occurrences: usize,
    patients: IndexSet<String>,
    first_seen: Option<NaiveDate>,
    last_seen: Option<NaiveDate>,
}

/// Insertion-ordered counter; discovery order breaks count ties.
#[derive(Debug, Default)]
pub struct Tally {
    entries: IndexMap<String, TallyEntry>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register keys so they appear even with no observations.
    pub fn seed<'k>(&mut self, keys: impl IntoIterator<Item = &'k str>) {
        for key in keys {
            self.entries.entry(key.to_string()).or_default();
        }
    }

    pub fn observe(&mut self, key: &str, patient_id: &str, date: Option<NaiveDate>) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.occurrences += 1;
        if !entry.patients.contains(patient_id) {
            entry.patients.insert(patient_id.to_string());
        }
        if let Some(date) = date {
            entry.first_seen = Some(entry.first_seen.map_or(date, |seen| seen.min(date)));
            entry.last_seen = Some(entry.last_seen.map_or(date, |seen| seen.max(date)));
        }
    }

    /// Add a pre-counted amount with no patient detail.
    pub fn add_count(&mut self, key: &str, count: usize) {
        self.entries.entry(key.to_string()).or_default().occurrences += count;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows sorted by raw count descending; the sort is stable so ties keep
    /// discovery order.
    pub fn finish(self, counting: Counting, denominator: Denominator) -> Vec<FullDatasetRow> {
        let counted: Vec<(String, usize, TallyEntry)> = self
            .entries
            .into_iter()
            .map(|(key, entry)| {
                let raw = match counting {
                    Counting::Occurrences => entry.occurrences,
                    Counting::DistinctPatients => entry.patients.len(),
                };
                (key, raw, entry)
            })
            .collect();

        let denominator = match denominator {
            Denominator::TotalCount => counted.iter().map(|(_, raw, _)| raw).sum(),
            Denominator::Patients(total) => total,
        };

        let mut rows: Vec<FullDatasetRow> = counted
            .into_iter()
            .map(|(key, raw, entry)| FullDatasetRow {
                bucket: CategoryBucket::new(key, raw, denominator),
                patient_ids: entry.patients.into_iter().collect(),
                first_seen: entry.first_seen,
                last_seen: entry.last_seen,
            })
            .collect();
        rows.sort_by(|a, b| b.bucket.raw_count.cmp(&a.bucket.raw_count));
        rows
    }
}

/// Category key of a clinical row for a clinical dimension.
pub fn clinical_key(record: &ExtractedRecord, dimension: Dimension) -> &str {
    match dimension {
        Dimension::SymptomSegment => record.symptom_text().unwrap_or(UNSPECIFIED_SYMPTOM),
        Dimension::Diagnosis => record.diagnosis.as_deref().unwrap_or(UNSPECIFIED_DIAGNOSIS),
        Dimension::DiagnosticCategory => record
            .diagnostic_category
            .as_deref()
            .unwrap_or(UNSPECIFIED_CATEGORY),
        Dimension::SymptomId => record.symptom_id.as_deref().unwrap_or(UNSPECIFIED_ID),
        _ => NO_DATA,
    }
}

/// Count clinical rows (those not flagged as HRSN problems).
///
/// Symptom IDs are read as "share of patients affected" and so divide by
/// `patient_total`; the other clinical dimensions divide by matched rows.
pub fn clinical(
    records: &[&ExtractedRecord],
    dimension: Dimension,
    patient_total: usize,
) -> Vec<FullDatasetRow> {
    let mut tally = Tally::new();
    for record in records.iter().filter(|record| !record.problem) {
        tally.observe(
            clinical_key(record, dimension),
            &record.patient_id,
            record.date_of_service,
        );
    }
    log::debug!("{dimension}: {} categories from {} records", tally.len(), records.len());

    let denominator = match dimension {
        Dimension::SymptomId => Denominator::Patients(patient_total),
        _ => Denominator::TotalCount,
    };
    tally.finish(Counting::Occurrences, denominator)
}

/// One bucket per patient. Age ranges always report all eight fixed buckets.
pub fn demographic(patients: &[&PatientRecord], dimension: Dimension) -> Vec<FullDatasetRow> {
    let mut tally = Tally::new();
    if dimension == Dimension::AgeRange {
        tally.seed(AgeBucket::ALL.into_iter().map(AgeBucket::label));
    }
    for patient in patients {
        let key = patient.demographic(dimension).unwrap_or(NO_DATA);
        tally.observe(key, &patient.patient_id, None);
    }
    tally.finish(Counting::DistinctPatients, Denominator::Patients(patients.len()))
}

/// True for rows that describe a social need rather than a clinical symptom.
pub fn is_hrsn_row(record: &ExtractedRecord, keywords: &[String]) -> bool {
    if record.problem {
        return true;
    }
    record.symptom_text().is_some_and(|text| {
        let lower = text.to_lowercase();
        keywords
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase()))
    })
}

/// Symptom text with leading `Problem:` / `Z-Code:` markers removed.
pub fn hrsn_key(record: &ExtractedRecord) -> String {
    let mut text = record.symptom_text().unwrap_or(UNSPECIFIED_SYMPTOM).trim();
    'strip: loop {
        for prefix in HRSN_PREFIXES {
            let matches = text
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if matches {
                text = text[prefix.len()..].trim_start();
                continue 'strip;
            }
        }
        break;
    }
    if text.is_empty() {
        UNSPECIFIED_SYMPTOM.to_string()
    } else {
        text.to_string()
    }
}

/// HRSN indicators from raw rows, deduplicated per patient.
pub fn hrsn_from_records(
    records: &[&ExtractedRecord],
    keywords: &[String],
    patient_total: usize,
) -> Vec<FullDatasetRow> {
    let mut tally = Tally::new();
    for record in records.iter().filter(|record| is_hrsn_row(record, keywords)) {
        tally.observe(&hrsn_key(record), &record.patient_id, record.date_of_service);
    }
    log::debug!("hrsn_indicator: {} categories from raw records", tally.len());
    tally.finish(Counting::DistinctPatients, Denominator::Patients(patient_total))
}

/// Buckets from server summaries; duplicate ids are summed.
pub fn from_summary(rows: &[SummaryRow], denominator: Denominator) -> Vec<FullDatasetRow> {
    let mut tally = Tally::new();
    for row in rows {
        tally.add_count(&row.id, row.count);
    }
    tally.finish(Counting::Occurrences, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptom(patient: &str, segment: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            patient_id: patient.to_string(),
            symptom_segment: segment.map(str::to_string),
            ..ExtractedRecord::default()
        }
    }

    #[test]
    fn ties_keep_discovery_order() {
        let mut tally = Tally::new();
        tally.observe("b", "p1", None);
        tally.observe("a", "p1", None);
        tally.observe("c", "p1", None);
        tally.observe("c", "p2", None);
        let ids: Vec<_> = tally
            .finish(Counting::Occurrences, Denominator::TotalCount)
            .into_iter()
            .map(|row| row.bucket.id)
            .collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn observe_tracks_date_span() {
        let mut tally = Tally::new();
        let early = NaiveDate::from_ymd_opt(2024, 1, 2);
        let late = NaiveDate::from_ymd_opt(2024, 6, 30);
        tally.observe("x", "p1", late);
        tally.observe("x", "p1", None);
        tally.observe("x", "p2", early);
        let rows = tally.finish(Counting::DistinctPatients, Denominator::Patients(4));
        assert_eq!(rows[0].bucket.raw_count, 2);
        assert_eq!(rows[0].bucket.percentage, 50);
        assert_eq!(rows[0].first_seen, early);
        assert_eq!(rows[0].last_seen, late);
        assert_eq!(rows[0].patient_ids, ["p1", "p2"]);
    }

    #[test]
    fn wording_is_the_segment_fallback() {
        let mut record = symptom("p1", None);
        assert_eq!(clinical_key(&record, Dimension::SymptomSegment), UNSPECIFIED_SYMPTOM);
        record.symptom_wording = Some("can't sleep".into());
        assert_eq!(clinical_key(&record, Dimension::SymptomSegment), "can't sleep");
        assert_eq!(clinical_key(&record, Dimension::Diagnosis), UNSPECIFIED_DIAGNOSIS);
        assert_eq!(clinical_key(&record, Dimension::DiagnosticCategory), UNSPECIFIED_CATEGORY);
        assert_eq!(clinical_key(&record, Dimension::SymptomId), UNSPECIFIED_ID);
    }

    #[test]
    fn hrsn_prefixes_are_stripped() {
        assert_eq!(
            hrsn_key(&symptom("p", Some("Problem: Housing instability"))),
            "Housing instability"
        );
        assert_eq!(hrsn_key(&symptom("p", Some("z-code:Food insecurity"))), "Food insecurity");
        assert_eq!(hrsn_key(&symptom("p", Some("Problem: Z-Code: Transport"))), "Transport");
        assert_eq!(hrsn_key(&symptom("p", Some("Problem:"))), UNSPECIFIED_SYMPTOM);
    }

    #[test]
    fn keyword_rows_count_as_hrsn() {
        let keywords = vec!["housing".to_string(), "food".to_string()];
        assert!(is_hrsn_row(&symptom("p", Some("Lost HOUSING")), &keywords));
        assert!(!is_hrsn_row(&symptom("p", Some("Insomnia")), &keywords));

        let mut flagged = symptom("p", Some("Insomnia"));
        flagged.problem = true;
        assert!(is_hrsn_row(&flagged, &keywords));
    }

    #[test]
    fn symptom_ids_divide_by_patients() {
        let records = [
            ExtractedRecord {
                symptom_id: Some("S1".into()),
                ..symptom("p1", None)
            },
            ExtractedRecord {
                symptom_id: Some("S1".into()),
                ..symptom("p2", None)
            },
            ExtractedRecord {
                symptom_id: Some("S2".into()),
                ..symptom("p2", None)
            },
        ];
        let refs: Vec<_> = records.iter().collect();

        let rows = clinical(&refs, Dimension::SymptomId, 4);
        assert_eq!(rows[0].bucket.id, "S1");
        assert_eq!(rows[0].bucket.denominator, 4);
        assert_eq!(rows[0].bucket.percentage, 50);

        let segments = clinical(&refs, Dimension::SymptomSegment, 4);
        assert_eq!(segments[0].bucket.denominator, 3);
        assert_eq!(segments[0].bucket.percentage, 100);
    }
}
