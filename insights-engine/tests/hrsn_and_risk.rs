use std::fs;

use insights_core::{DataOrigin, Dimension, EngineConfig, Provenance};
use insights_engine::{
    load_dataset_str, load_dataset_value, AnalyticsEngine, CategoryQuery, FullDatasetQuery,
};
use serde_json::json;

fn load_fixture() -> AnalyticsEngine {
    let path = format!("{}/tests/data/clinic_dataset.json", env!("CARGO_MANIFEST_DIR"));
    let data = fs::read_to_string(path).expect("fixture dataset should be readable");
    load_dataset_str(&data, &EngineConfig::default()).expect("fixture dataset should parse")
}

#[test]
fn hrsn_indicators_are_deduplicated_per_patient() {
    let engine = load_fixture();
    let dataset = engine.category_data(Dimension::HrsnIndicator, &CategoryQuery::default());
    assert_eq!(dataset.origin(), DataOrigin::Real);

    let buckets = dataset.buckets();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].id, "Food insecurity");
    assert_eq!(buckets[0].raw_count, 1);
    assert_eq!(buckets[0].denominator, 5);
    assert_eq!(buckets[0].percentage, 20);
    assert_eq!(buckets[1].id, "Housing instability");

    // Three HRSN rows, but p2 reported food insecurity twice.
    assert_eq!(dataset.total_count(), 2);
}

#[test]
fn keyword_rows_without_problem_flag_feed_hrsn_indicators() {
    let engine = load_dataset_value(
        &json!({
            "records": [
                { "patient_id": "a", "symptom_segment": "Transportation barriers to care" },
                { "patient_id": "b", "symptom_segment": "Insomnia" }
            ]
        }),
        &EngineConfig::default(),
    );
    let dataset = engine.category_data(Dimension::HrsnIndicator, &CategoryQuery::default());
    assert!(!dataset.is_placeholder());
    assert_eq!(dataset.buckets()[0].id, "Transportation barriers to care");
    assert_eq!(dataset.buckets()[0].percentage, 50);
}

#[test]
fn server_hrsn_summary_wins_over_raw_records() {
    let engine = load_dataset_value(
        &json!({
            "patients": [{ "id": "a" }, { "id": "b" }, { "id": "c" }, { "id": "d" }],
            "records": [
                {
                    "patient_id": "a",
                    "symptom_segment": "Problem: Food insecurity",
                    "problem": true
                }
            ],
            "serverAggregates": { "hrsnIndicatorData": [{ "name": "Housing", "count": 2 }] }
        }),
        &EngineConfig::default(),
    );
    let buckets = engine
        .category_data(Dimension::HrsnIndicator, &CategoryQuery::default())
        .into_buckets();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].id, "Housing");
    assert_eq!(buckets[0].percentage, 50);
}

#[test]
fn empty_hrsn_input_serves_a_flagged_placeholder() {
    let engine = load_dataset_value(
        &json!({ "patients": [{ "id": "a" }] }),
        &EngineConfig::default(),
    );
    let dataset = engine.category_data(Dimension::HrsnIndicator, &CategoryQuery::default());
    assert!(dataset.is_placeholder());
    assert_eq!(dataset.buckets().len(), 5);

    let export = engine.full_dataset(Dimension::HrsnIndicator, &FullDatasetQuery::default());
    assert_eq!(export.origin, DataOrigin::Placeholder);

    let no_placeholders = EngineConfig {
        allow_placeholders: false,
        ..EngineConfig::default()
    };
    let strict = load_dataset_value(&json!({ "patients": [{ "id": "a" }] }), &no_placeholders);
    let dataset = strict.category_data(Dimension::HrsnIndicator, &CategoryQuery::default());
    assert!(!dataset.is_placeholder());
    assert!(dataset.is_empty());
}

#[test]
fn risk_tiers_cover_the_population_in_fixed_order() {
    let engine = load_fixture();
    let dataset = engine.risk_stratification();
    assert_eq!(dataset.origin(), DataOrigin::Real);

    let tiers: Vec<_> = dataset
        .buckets()
        .iter()
        .map(|b| (b.id.as_str(), b.raw_count, b.percentage))
        .collect();
    assert_eq!(
        tiers,
        [
            ("No Risk", 1, 20),
            ("Low", 4, 80),
            ("Low-Medium", 0, 0),
            ("Medium", 0, 0),
            ("Medium-High", 0, 0),
            ("High", 0, 0),
        ]
    );
}

#[test]
fn risk_without_any_patients_is_a_placeholder() {
    let engine = load_dataset_value(&json!({}), &EngineConfig::default());
    let dataset = engine.risk_stratification();
    assert!(dataset.is_placeholder());
    assert_eq!(dataset.buckets().len(), 6);

    let config = EngineConfig {
        allow_placeholders: false,
        ..EngineConfig::default()
    };
    let real = load_dataset_value(&json!({}), &config).risk_stratification();
    assert!(!real.is_placeholder());
    assert_eq!(real.buckets().len(), 6);
    assert_eq!(real.total_count(), 0);
}

#[test]
fn dual_source_reconciliation_on_fixture() {
    let engine = load_fixture();
    let result = engine.dual_source_hrsn();
    assert_eq!(result.total_patients, 5);

    let keys: Vec<_> = result.categories.keys().map(String::as_str).collect();
    assert_eq!(keys, ["housing", "food", "financial"]);

    let housing = result.category("housing").expect("housing reported");
    assert_eq!(housing.customer_count, 2);
    assert_eq!(housing.extracted_count, 1);
    assert_eq!(housing.total_affected, 2);
    assert_eq!(housing.percentage, 40);
    assert_eq!(housing.data_source, Provenance::Both);

    let food = result.category("food").expect("food reported");
    assert_eq!(food.total_affected, 1);
    assert_eq!(food.data_source, Provenance::Both);

    let financial = result.category("financial").expect("financial reported");
    assert_eq!(financial.data_source, Provenance::Customer);

    assert_eq!(result.summary.categories_reported, 3);
    assert_eq!(result.summary.both, 2);
    assert_eq!(result.summary.customer_only, 1);
    assert_eq!(result.summary.extracted_only, 0);
    assert_eq!(result.summary.patients_affected, 3);
}

#[test]
fn dual_source_overlap_is_counted_once() {
    let patients: Vec<_> = (1..=8)
        .map(|n| {
            if n <= 5 {
                json!({ "id": format!("p{n}"), "housing_status": "Insecure" })
            } else {
                json!({ "id": format!("p{n}") })
            }
        })
        .collect();
    // Extracted evidence for p4, p5 (already flagged) and p6.
    let records: Vec<_> = ["p4", "p5", "p6"]
        .into_iter()
        .map(|id| {
            json!({
                "patient_id": id,
                "symptom_segment": "Problem: Housing instability",
                "problem": "Problem"
            })
        })
        .collect();

    let engine = load_dataset_value(
        &json!({ "patients": patients, "records": records }),
        &EngineConfig::default(),
    );
    let result = engine.dual_source_hrsn();
    let housing = result.category("housing").expect("housing reported");
    assert_eq!(housing.customer_count, 5);
    assert_eq!(housing.extracted_count, 3);
    assert_eq!(housing.total_affected, 6);
    assert_eq!(housing.percentage, 75);
    assert_eq!(housing.data_source, Provenance::Both);
}

#[test]
fn anonymous_records_never_merge_with_anonymous_roster_patients() {
    let engine = load_dataset_value(
        &json!({
            "patients": [{ "housing_status": "Homeless" }, { "age": 40 }],
            "records": [{ "symptom_segment": "Problem: Housing instability", "problem": true }]
        }),
        &EngineConfig::default(),
    );
    let ids: Vec<_> = engine
        .population()
        .iter()
        .map(|patient| patient.patient_id.as_str())
        .collect();
    assert_eq!(
        ids,
        ["unknown-patient-0", "unknown-patient-1", "unknown-record-0"]
    );
    assert_eq!(engine.roster_size(), 2);

    let result = engine.dual_source_hrsn();
    assert_eq!(result.total_patients, 3);
    let housing = result.category("housing").expect("housing reported");
    assert_eq!(housing.customer_count, 1);
    assert_eq!(housing.extracted_count, 1);
    assert_eq!(housing.total_affected, 2);
    assert_eq!(housing.percentage, 67);
    assert_eq!(housing.data_source, Provenance::Both);

    assert_eq!(engine.risk_stratification().total_count(), 3);
}

#[test]
fn dual_source_chart_tags_each_bucket_with_its_sources() {
    let engine = load_fixture();
    let dataset = engine.dual_source_buckets();
    assert!(!dataset.is_placeholder());

    let tagged: Vec<_> = dataset
        .buckets()
        .iter()
        .map(|bucket| (bucket.id.as_str(), bucket.raw_count, bucket.provenance))
        .collect();
    assert_eq!(
        tagged,
        [
            ("housing", 2, Some(Provenance::Both)),
            ("food", 1, Some(Provenance::Both)),
            ("financial", 1, Some(Provenance::Customer)),
        ]
    );
    assert!(dataset.buckets().iter().all(|bucket| bucket.denominator == 5));

    let view = engine
        .chart_by_name("dual-source-hrsn", &CategoryQuery::default())
        .expect("known chart");
    assert_eq!(view.chart, "dual-source-hrsn");
    assert_eq!(view.points[0].value, 40);
    assert_eq!(view.points[0].provenance, Some(Provenance::Both));

    let clinical = engine.chart_by_name("symptom-segments", &CategoryQuery::default());
    let clinical = clinical.expect("known chart");
    assert!(clinical.points.iter().all(|point| point.provenance.is_none()));
}
