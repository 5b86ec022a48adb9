//! Merges structured ("customer") and NLP-extracted HRSN evidence per factor.

use std::collections::HashSet;

use indexmap::IndexMap;
use insights_core::{
    percentage_of, DualSourceHrsn, ExtractedRecord, HrsnFactor, PatientRecord, Provenance,
    ReconcileSummary, ReconciledCategory,
};

fn factor_keywords(factor: HrsnFactor) -> &'static [&'static str] {
    match factor {
        HrsnFactor::Housing => &["housing", "homeless", "eviction", "shelter"],
        HrsnFactor::Food => &["food", "hunger", "meal"],
        HrsnFactor::Financial => &["financial", "economic", "income", "poverty", "money"],
        HrsnFactor::Transportation => &["transport"],
    }
}

const NEGATIVE_STATUSES: [&str; 14] = [
    "no",
    "none",
    "false",
    "secure",
    "stable",
    "adequate",
    "not at risk",
    "no risk",
    "low risk",
    "n/a",
    "na",
    "unknown",
    "no data available",
    "0",
];

/// Whether a structured status value reports a social need.
pub fn status_indicates_need(status: &str) -> bool {
    let lower = status.trim().to_lowercase();
    if lower.is_empty() || NEGATIVE_STATUSES.contains(&lower.as_str()) {
        return false;
    }
    if lower.starts_with("no ") || lower.starts_with("not ") {
        return false;
    }
    if lower.contains("secure") && !lower.contains("insecure") {
        return false;
    }
    if lower.contains("stable") && !lower.contains("unstable") {
        return false;
    }
    true
}

fn record_mentions(record: &ExtractedRecord, factor: HrsnFactor) -> bool {
    record.symptom_text().is_some_and(|text| {
        let lower = text.to_lowercase();
        factor_keywords(factor).iter().any(|kw| lower.contains(kw))
    })
}

/// Patients flagged by structured roster fields.
pub fn customer_patients(population: &[PatientRecord], factor: HrsnFactor) -> HashSet<&str> {
    population
        .iter()
        .filter(|patient| patient.hrsn_status(factor).is_some_and(status_indicates_need))
        .map(|patient| patient.patient_id.as_str())
        .collect()
}

/// Patients flagged by extracted rows, either by text or by a status copy.
pub fn extracted_patients(records: &[ExtractedRecord], factor: HrsnFactor) -> HashSet<&str> {
    records
        .iter()
        .filter(|record| {
            record_mentions(record, factor)
                || record.hrsn_status(factor).is_some_and(status_indicates_need)
        })
        .map(|record| record.patient_id.as_str())
        .collect()
}

/// One factor: affected patients are the union of both sources, never the sum.
pub fn reconcile_sources(
    customer: &HashSet<&str>,
    extracted: &HashSet<&str>,
    total_patients: usize,
) -> ReconciledCategory {
    let total_affected = customer.union(extracted).count();
    ReconciledCategory {
        customer_count: customer.len(),
        extracted_count: extracted.len(),
        total_affected,
        percentage: percentage_of(total_affected, total_patients),
        data_source: Provenance::from_presence(!customer.is_empty(), !extracted.is_empty()),
    }
}

/// Every factor with at least one affected patient, in factor order.
pub fn reconcile(population: &[PatientRecord], records: &[ExtractedRecord]) -> DualSourceHrsn {
    let total_patients = population.len();
    let mut categories = IndexMap::new();
    let mut summary = ReconcileSummary::default();
    let mut affected: HashSet<&str> = HashSet::new();

    for factor in HrsnFactor::ALL {
        let customer = customer_patients(population, factor);
        let extracted = extracted_patients(records, factor);
        let category = reconcile_sources(&customer, &extracted, total_patients);
        if category.total_affected == 0 {
            continue;
        }

        match category.data_source {
            Provenance::Customer => summary.customer_only += 1,
            Provenance::Extracted => summary.extracted_only += 1,
            Provenance::Both => summary.both += 1,
            Provenance::None => {}
        }
        affected.extend(customer.union(&extracted).copied());
        categories.insert(factor.label().to_string(), category);
    }

    summary.categories_reported = categories.len();
    summary.patients_affected = affected.len();
    log::debug!(
        "dual-source HRSN: {} categories, {} of {total_patients} patients affected",
        summary.categories_reported,
        summary.patients_affected
    );

    DualSourceHrsn {
        categories,
        total_patients,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_sources_are_not_double_counted() {
        let customer: HashSet<&str> = ["p1", "p2", "p3", "p4", "p5"].into_iter().collect();
        let extracted: HashSet<&str> = ["p4", "p5", "p6"].into_iter().collect();
        let category = reconcile_sources(&customer, &extracted, 10);
        assert_eq!(category.customer_count, 5);
        assert_eq!(category.extracted_count, 3);
        assert_eq!(category.total_affected, 6);
        assert_eq!(category.percentage, 60);
        assert_eq!(category.data_source, Provenance::Both);
    }

    #[test]
    fn need_detection() {
        assert!(status_indicates_need("Insecure"));
        assert!(status_indicates_need("Homeless"));
        assert!(status_indicates_need("yes"));
        assert!(status_indicates_need("Unstable"));
        assert!(!status_indicates_need("Secure"));
        assert!(!status_indicates_need("stable housing"));
        assert!(!status_indicates_need("No"));
        assert!(!status_indicates_need("not at risk"));
        assert!(!status_indicates_need("No Data Available"));
    }

    #[test]
    fn zero_factors_are_omitted() {
        let mut patient = PatientRecord::unknown("p1");
        patient.food_status = "Insecure".to_string();
        let record = ExtractedRecord {
            patient_id: "p2".to_string(),
            symptom_segment: Some("Problem: Transportation barrier".to_string()),
            problem: true,
            ..ExtractedRecord::default()
        };
        let population = vec![patient, PatientRecord::unknown("p2")];
        let result = reconcile(&population, &[record]);

        let keys: Vec<_> = result.categories.keys().map(String::as_str).collect();
        assert_eq!(keys, ["food", "transportation"]);
        assert_eq!(result.category("food").map(|c| c.data_source), Some(Provenance::Customer));
        assert_eq!(
            result.category("transportation").map(|c| c.data_source),
            Some(Provenance::Extracted)
        );
        assert_eq!(result.total_patients, 2);
        assert_eq!(result.summary.patients_affected, 2);
        assert_eq!(result.summary.customer_only, 1);
        assert_eq!(result.summary.extracted_only, 1);
    }
}
