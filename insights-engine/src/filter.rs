//! HRSN / diagnosis filtering with the missing-factor backstop.

use insights_core::{
    ExtractedRecord, FilterCriteria, HrsnFactor, MissingFactorPolicy, PatientRecord,
};

/// Anything the filter engine can evaluate.
pub trait FilterSubject {
    fn hrsn_status(&self, factor: HrsnFactor) -> Option<&str>;
    fn diagnosis(&self) -> Option<&str>;
}

impl FilterSubject for PatientRecord {
    fn hrsn_status(&self, factor: HrsnFactor) -> Option<&str> {
        PatientRecord::hrsn_status(self, factor)
    }

    fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }
}

impl FilterSubject for ExtractedRecord {
    fn hrsn_status(&self, factor: HrsnFactor) -> Option<&str> {
        ExtractedRecord::hrsn_status(self, factor)
    }

    fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }
}

/// Items that passed, plus the factors whose constraint was assumed satisfied
/// because no item records them.
#[derive(Debug)]
pub struct FilterOutcome<'a, T> {
    pub items: Vec<&'a T>,
    pub assumed_factors: Vec<HrsnFactor>,
}

impl<'a, T> FilterOutcome<'a, T> {
    pub fn backstop_engaged(&self) -> bool {
        !self.assumed_factors.is_empty()
    }
}

/// AND-combine every active constraint. An empty criteria set is the identity.
///
/// When an HRSN constraint targets a factor that no item records, the
/// [`MissingFactorPolicy`] decides: `AssumeMatch` synthesises the filter's own
/// value for every item, `Strict` lets the constraint reject them.
pub fn apply_filters<'a, T: FilterSubject>(
    items: &'a [T],
    criteria: &FilterCriteria,
    policy: MissingFactorPolicy,
) -> FilterOutcome<'a, T> {
    if criteria.is_empty() {
        return FilterOutcome {
            items: items.iter().collect(),
            assumed_factors: Vec::new(),
        };
    }

    let mut assumed_factors = Vec::new();
    let mut constraints = Vec::new();
    for factor in HrsnFactor::ALL {
        let Some(wanted) = criteria.hrsn_constraint(factor) else {
            continue;
        };
        let recorded = items.iter().any(|item| item.hrsn_status(factor).is_some());
        if !recorded && !items.is_empty() && policy == MissingFactorPolicy::AssumeMatch {
            log::warn!(
                "no {} status recorded on {} items; treating filter \"{wanted}\" as satisfied",
                factor.label(),
                items.len()
            );
            assumed_factors.push(factor);
        }
        constraints.push((factor, wanted));
    }
    let diagnosis = criteria.diagnosis_constraint();

    let matched = items
        .iter()
        .filter(|item| {
            constraints.iter().all(|(factor, wanted)| {
                let status = if assumed_factors.contains(factor) {
                    Some(*wanted)
                } else {
                    item.hrsn_status(*factor)
                };
                status.is_some_and(|status| same_value(status, wanted))
            })
        })
        .filter(|item| {
            diagnosis.map_or(true, |wanted| {
                item.diagnosis().is_some_and(|value| same_value(value, wanted))
            })
        })
        .collect();

    FilterOutcome {
        items: matched,
        assumed_factors,
    }
}

fn same_value(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}
