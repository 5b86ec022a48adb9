//! Symptom-count risk tiers.

use std::collections::HashMap;

use insights_core::{CategoryBucket, ExtractedRecord, PatientRecord, RiskTier};

/// Clinical symptom rows per patient.
pub fn symptom_totals(records: &[ExtractedRecord]) -> HashMap<&str, usize> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|record| !record.problem) {
        *totals.entry(record.patient_id.as_str()).or_insert(0) += 1;
    }
    totals
}

/// Six buckets in tier order. Patients without symptom rows land in `No Risk`,
/// so the buckets always sum to the population size.
pub fn stratify(population: &[PatientRecord], records: &[ExtractedRecord]) -> Vec<CategoryBucket> {
    let totals = symptom_totals(records);
    let mut counts = [0usize; RiskTier::ALL.len()];
    for patient in population {
        let total = totals.get(patient.patient_id.as_str()).copied().unwrap_or(0);
        counts[RiskTier::for_symptom_count(total) as usize] += 1;
    }

    RiskTier::ALL
        .into_iter()
        .zip(counts)
        .map(|(tier, count)| CategoryBucket::new(tier.label(), count, population.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(patient: &str, count: usize) -> Vec<ExtractedRecord> {
        (0..count)
            .map(|_| ExtractedRecord {
                patient_id: patient.to_string(),
                ..ExtractedRecord::default()
            })
            .collect()
    }

    #[test]
    fn every_patient_lands_in_exactly_one_tier() {
        let population: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(PatientRecord::unknown)
            .collect();
        let mut records = rows("a", 9);
        records.extend(rows("b", 10));
        records.extend(rows("c", 100));
        let mut problem = rows("d", 3);
        problem.iter_mut().for_each(|record| record.problem = true);
        records.extend(problem);

        let buckets = stratify(&population, &records);
        let counts: Vec<_> = buckets.iter().map(|b| b.raw_count).collect();
        assert_eq!(counts, [1, 1, 1, 0, 0, 1]);
        assert!(buckets.iter().all(|b| b.denominator == 4));
        assert_eq!(buckets[0].id, "No Risk");
        assert_eq!(buckets[0].percentage, 25);
    }

    #[test]
    fn empty_population_still_has_six_tiers() {
        let buckets = stratify(&[], &[]);
        assert_eq!(buckets.len(), 6);
        assert!(buckets.iter().all(|b| b.raw_count == 0 && b.percentage == 0));
    }
}
