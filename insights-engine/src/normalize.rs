//! Raw JSON records to canonical `PatientRecord` / `ExtractedRecord` values.
//!
//! Field names arrive in several spellings. Each canonical attribute owns an
//! ordered [`FieldRule`]: the snake_case name first, then the camelCase alias,
//! then any domain-specific aliases. Nothing here fails; unresolved values fall
//! back to [`NO_DATA`] or [`OTHER`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use insights_core::{
    AgeBucket, ExtractedRecord, PatientRecord, ServerAggregates, SummaryRow, NO_DATA, OTHER,
};
use serde_json::Value;

/// Ordered accessor list for one canonical attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

impl FieldRule {
    pub const fn new(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }

    /// Keys in resolution order.
    pub fn candidates(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.canonical).chain(self.aliases.iter().copied())
    }

    /// First candidate holding a usable value. Nulls and blank strings are skipped.
    pub fn resolve<'v>(&self, object: &'v Value) -> Option<&'v Value> {
        let map = object.as_object()?;
        self.candidates()
            .filter_map(|key| map.get(key))
            .find(|value| is_present(value))
    }

    /// Resolved value rendered as trimmed text.
    pub fn text(&self, object: &Value) -> Option<String> {
        self.resolve(object).and_then(scalar_text)
    }

    pub fn text_or_default(&self, object: &Value) -> String {
        self.text(object).unwrap_or_else(|| NO_DATA.to_string())
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub mod rules {
    use super::FieldRule;

    pub const PATIENTS: FieldRule =
        FieldRule::new("patients", &["patient_records", "patientRecords"]);
    pub const RECORDS: FieldRule = FieldRule::new(
        "records",
        &["extracted_records", "extractedRecords", "extracted", "symptoms"],
    );
    pub const SERVER_AGGREGATES: FieldRule =
        FieldRule::new("server_aggregates", &["serverAggregates", "aggregates"]);

    pub const ROSTER_PATIENT_ID: FieldRule =
        FieldRule::new("patient_id", &["patientId", "id", "mrn"]);
    pub const RECORD_PATIENT_ID: FieldRule =
        FieldRule::new("patient_id", &["patientId", "patient", "mrn"]);

    pub const AGE_RANGE: FieldRule =
        FieldRule::new("age_range", &["ageRange", "age", "age_group", "ageGroup"]);
    pub const GENDER: FieldRule = FieldRule::new("gender", &["sex"]);
    pub const RACE: FieldRule = FieldRule::new("race", &[]);
    pub const ETHNICITY: FieldRule = FieldRule::new("ethnicity", &[]);
    pub const ZIP_CODE: FieldRule =
        FieldRule::new("zip_code", &["zipCode", "zip", "postal_code", "postalCode"]);
    pub const EDUCATION: FieldRule =
        FieldRule::new("education_level", &["educationLevel", "education"]);
    pub const VETERAN_STATUS: FieldRule =
        FieldRule::new("veteran_status", &["veteranStatus", "veteran"]);
    pub const HOUSING_STATUS: FieldRule = FieldRule::new(
        "housing_status",
        &["housingStatus", "housing_insecurity", "housingInsecurity", "housing"],
    );
    pub const FOOD_STATUS: FieldRule = FieldRule::new(
        "food_status",
        &["foodStatus", "food_insecurity", "foodInsecurity", "food"],
    );
    pub const FINANCIAL_STATUS: FieldRule = FieldRule::new(
        "financial_status",
        &["financialStatus", "financial_strain", "financialStrain", "financial"],
    );
    pub const TRANSPORTATION_STATUS: FieldRule = FieldRule::new(
        "transportation_status",
        &[
            "transportationStatus",
            "access_to_transportation",
            "accessToTransportation",
            "transportation",
        ],
    );
    pub const DIAGNOSIS: FieldRule =
        FieldRule::new("diagnosis", &["primary_diagnosis", "primaryDiagnosis"]);

    pub const DATE_OF_SERVICE: FieldRule = FieldRule::new(
        "date_of_service",
        &["dateOfService", "service_date", "serviceDate", "date"],
    );
    pub const SYMPTOM_SEGMENT: FieldRule =
        FieldRule::new("symptom_segment", &["symptomSegment", "segment"]);
    pub const SYMPTOM_WORDING: FieldRule =
        FieldRule::new("symptom_wording", &["symptomWording", "wording", "symptom"]);
    pub const SYMPTOM_ID: FieldRule = FieldRule::new("symptom_id", &["symptomId", "symp_id"]);
    pub const DIAGNOSTIC_CATEGORY: FieldRule =
        FieldRule::new("diagnostic_category", &["diagnosticCategory", "category"]);
    pub const PROBLEM: FieldRule = FieldRule::new("problem", &["is_problem", "isProblem"]);

    pub const SUMMARY_ID: FieldRule = FieldRule::new("id", &["name", "label", "category"]);
    pub const SUMMARY_COUNT: FieldRule = FieldRule::new(
        "count",
        &["raw_count", "rawCount", "value", "patient_count", "patientCount"],
    );
}

/// Canonical roster entry. `index` names patients that carry no identifier.
pub fn normalize_patient(raw: &Value, index: usize) -> PatientRecord {
    let patient_id = rules::ROSTER_PATIENT_ID
        .text(raw)
        .unwrap_or_else(|| format!("unknown-patient-{index}"));

    PatientRecord {
        patient_id,
        age_range: classify_age(rules::AGE_RANGE.resolve(raw)),
        gender: normalize_gender(rules::GENDER.text(raw).as_deref()),
        race: normalize_race(rules::RACE.text(raw).as_deref()),
        ethnicity: rules::ETHNICITY.text_or_default(raw),
        zip_code: rules::ZIP_CODE.text_or_default(raw),
        education: rules::EDUCATION.text_or_default(raw),
        veteran_status: rules::VETERAN_STATUS.text_or_default(raw),
        housing_status: rules::HOUSING_STATUS.text_or_default(raw),
        food_status: rules::FOOD_STATUS.text_or_default(raw),
        financial_status: rules::FINANCIAL_STATUS.text_or_default(raw),
        transportation_status: rules::TRANSPORTATION_STATUS.text_or_default(raw),
        diagnosis: rules::DIAGNOSIS.text(raw),
    }
}

/// Canonical extracted observation. Anonymous rows get their own namespace so
/// they never merge with anonymous roster entries.
pub fn normalize_record(raw: &Value, index: usize) -> ExtractedRecord {
    let patient_id = rules::RECORD_PATIENT_ID
        .text(raw)
        .unwrap_or_else(|| format!("unknown-record-{index}"));

    ExtractedRecord {
        patient_id,
        date_of_service: rules::DATE_OF_SERVICE
            .text(raw)
            .as_deref()
            .and_then(parse_service_date),
        symptom_segment: rules::SYMPTOM_SEGMENT.text(raw),
        symptom_wording: rules::SYMPTOM_WORDING.text(raw),
        symptom_id: rules::SYMPTOM_ID.text(raw),
        diagnosis: rules::DIAGNOSIS.text(raw),
        diagnostic_category: rules::DIAGNOSTIC_CATEGORY.text(raw),
        problem: rules::PROBLEM.resolve(raw).is_some_and(is_problem_flag),
        housing_status: rules::HOUSING_STATUS.text(raw),
        food_status: rules::FOOD_STATUS.text(raw),
        financial_status: rules::FINANCIAL_STATUS.text(raw),
        transportation_status: rules::TRANSPORTATION_STATUS.text(raw),
    }
}

/// Server summaries keyed by `<dimension>_data` or its camelCase alias.
pub fn normalize_server_aggregates(raw: Option<&Value>) -> ServerAggregates {
    let Some(raw) = raw else {
        return ServerAggregates::default();
    };

    let rows = |rule: FieldRule| {
        rule.resolve(raw)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(normalize_summary_row).collect::<Vec<_>>())
    };

    ServerAggregates {
        symptom_segment_data: rows(FieldRule::new(
            "symptom_segment_data",
            &["symptomSegmentData"],
        )),
        diagnosis_data: rows(FieldRule::new("diagnosis_data", &["diagnosisData"])),
        diagnostic_category_data: rows(FieldRule::new(
            "diagnostic_category_data",
            &["diagnosticCategoryData"],
        )),
        symptom_id_data: rows(FieldRule::new(
            "symptom_id_data",
            &["symptomIDData", "symptomIdData"],
        )),
        hrsn_indicator_data: rows(FieldRule::new(
            "hrsn_indicator_data",
            &["hrsnIndicatorData", "HRSNIndicatorData"],
        )),
    }
}

fn normalize_summary_row(raw: &Value) -> SummaryRow {
    SummaryRow {
        id: rules::SUMMARY_ID
            .text(raw)
            .unwrap_or_else(|| "Unspecified".to_string()),
        count: rules::SUMMARY_COUNT
            .resolve(raw)
            .and_then(count_value)
            .unwrap_or(0),
    }
}

fn count_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(|n| n as usize)
            .or_else(|| whole_non_negative(number.as_f64()?)),
        Value::String(text) => whole_non_negative(text.trim().parse::<f64>().ok()?),
        _ => None,
    }
}

fn whole_non_negative(value: f64) -> Option<usize> {
    (value.is_finite() && value >= 0.0).then(|| value.floor() as usize)
}

/// Age bucket for a raw `age`/`age_range` value. Existing bucket labels pass
/// through; numbers are floored to whole years; anything else is `NoData`.
pub fn classify_age(value: Option<&Value>) -> AgeBucket {
    let years = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            if let Some(bucket) = AgeBucket::from_label(text) {
                return bucket;
            }
            text.trim().parse::<f64>().ok()
        }
        _ => None,
    };

    match years {
        Some(age) if age.is_finite() && age >= 0.0 => AgeBucket::for_age(age.floor() as u32),
        _ => AgeBucket::NoData,
    }
}

struct Vocabulary {
    canonical: &'static str,
    exact: &'static [&'static str],
    contains: &'static [&'static str],
}

// Order matters: "female" contains "male", "caucasian" contains "asian".
const GENDER_VOCABULARY: &[Vocabulary] = &[
    Vocabulary {
        canonical: "Non-Binary",
        exact: &["nb", "x"],
        contains: &["non-binary", "nonbinary", "non binary", "genderqueer"],
    },
    Vocabulary {
        canonical: "Female",
        exact: &["f"],
        contains: &["female", "woman", "girl"],
    },
    Vocabulary {
        canonical: "Male",
        exact: &["m"],
        contains: &["male", "man", "boy"],
    },
];

const RACE_VOCABULARY: &[Vocabulary] = &[
    Vocabulary {
        canonical: "Multiracial",
        exact: &[],
        contains: &["multiracial", "two or more", "multiple", "mixed"],
    },
    Vocabulary {
        canonical: "White",
        exact: &[],
        contains: &["white", "caucasian"],
    },
    Vocabulary {
        canonical: "Black or African American",
        exact: &[],
        contains: &["black", "african"],
    },
    Vocabulary {
        canonical: "Asian",
        exact: &[],
        contains: &["asian"],
    },
    Vocabulary {
        canonical: "Native Hawaiian or Pacific Islander",
        exact: &[],
        contains: &["hawaiian", "pacific islander"],
    },
    Vocabulary {
        canonical: "American Indian or Alaska Native",
        exact: &[],
        contains: &["american indian", "alaska", "native american", "indigenous"],
    },
];

const UNKNOWN_MARKERS: [&str; 6] = [
    "unknown",
    "not reported",
    "declined",
    "n/a",
    "none",
    "no data available",
];

fn match_vocabulary(value: Option<&str>, vocabulary: &[Vocabulary]) -> String {
    let Some(value) = value else {
        return NO_DATA.to_string();
    };
    let lower = value.trim().to_lowercase();
    if lower.is_empty() || UNKNOWN_MARKERS.contains(&lower.as_str()) {
        return NO_DATA.to_string();
    }

    vocabulary
        .iter()
        .find(|entry| {
            entry.exact.contains(&lower.as_str())
                || entry.contains.iter().any(|needle| lower.contains(needle))
        })
        .map(|entry| entry.canonical.to_string())
        .unwrap_or_else(|| OTHER.to_string())
}

pub fn normalize_gender(value: Option<&str>) -> String {
    match_vocabulary(value, GENDER_VOCABULARY)
}

pub fn normalize_race(value: Option<&str>) -> String {
    match_vocabulary(value, RACE_VOCABULARY)
}

fn is_problem_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() == Some(1.0),
        Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "problem" | "true" | "yes" | "1"
        ),
        _ => false,
    }
}

/// `YYYY-MM-DD`, `MM/DD/YYYY`, naive or RFC 3339 timestamps.
pub fn parse_service_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.date_naive())
                .ok()
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
                .ok()
        })
}
