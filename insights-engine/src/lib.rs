//! Aggregation and categorization engine for population analytics charts.
//!
//! Raw JSON (patients, NLP-extracted records, optional server summaries) is
//! normalized once into an [`AnalyticsEngine`]; every chart request after that
//! is a pure, deterministic scan over the in-memory collections.

pub mod aggregate;
pub mod cache;
pub mod fallback;
pub mod filter;
pub mod normalize;
pub mod reconcile;
pub mod risk;
pub mod view;

use std::collections::HashSet;

use insights_core::{
    Chart, ChartView, DataOrigin, Dataset, Dimension, DimensionKind, DualSourceHrsn, EngineConfig,
    ExtractedRecord, FilterCriteria, FullDataset, FullDatasetRow, InsightsError, PatientRecord,
    ServerAggregates,
};
use serde_json::Value;

use crate::aggregate::Denominator;
use crate::filter::apply_filters;
use crate::normalize::{
    normalize_patient, normalize_record, normalize_server_aggregates, rules, FieldRule,
};

pub use crate::cache::AggregationCache;
pub use crate::view::{CategoryQuery, FullDatasetQuery};

/// Build an engine from a JSON document string.
pub fn load_dataset_str(
    json: &str,
    config: &EngineConfig,
) -> Result<AnalyticsEngine, InsightsError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| InsightsError::Parse(err.to_string()))?;
    Ok(load_dataset_value(&value, config))
}

/// Build an engine from `{ patients, records, serverAggregates }`.
///
/// Missing or malformed collections are treated as empty.
pub fn load_dataset_value(document: &Value, config: &EngineConfig) -> AnalyticsEngine {
    if !document.is_object() {
        log::warn!("dataset document is not a JSON object; treating it as empty");
    }

    let patients = collection(document, rules::PATIENTS)
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_patient(raw, index))
        .collect();
    let records = collection(document, rules::RECORDS)
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_record(raw, index))
        .collect();
    let server = normalize_server_aggregates(rules::SERVER_AGGREGATES.resolve(document));

    AnalyticsEngine::new(patients, records, server, config.clone())
}

fn collection(document: &Value, rule: FieldRule) -> &[Value] {
    match rule.resolve(document) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            log::warn!("`{}` is not an array; ignoring it", rule.canonical);
            &[]
        }
        None => &[],
    }
}

/// Normalized, immutable inputs plus the operations every chart is built from.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: EngineConfig,
    population: Vec<PatientRecord>,
    roster_size: usize,
    records: Vec<ExtractedRecord>,
    server: ServerAggregates,
}

/// Filtered view of the inputs for one request.
struct Scope<'a> {
    patients: Vec<&'a PatientRecord>,
    records: Vec<&'a ExtractedRecord>,
}

impl Scope<'_> {
    /// Distinct patients across both collections.
    fn patient_count(&self) -> usize {
        self.patients
            .iter()
            .map(|patient| patient.patient_id.as_str())
            .chain(self.records.iter().map(|record| record.patient_id.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

impl AnalyticsEngine {
    /// Roster duplicates are dropped (first wins). Patients referenced only by
    /// extracted records join the population with default attributes.
    pub fn new(
        patients: Vec<PatientRecord>,
        records: Vec<ExtractedRecord>,
        server: ServerAggregates,
        config: EngineConfig,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut population = Vec::with_capacity(patients.len());
        for patient in patients {
            if seen.insert(patient.patient_id.clone()) {
                population.push(patient);
            } else {
                log::warn!("duplicate patient id {} dropped", patient.patient_id);
            }
        }
        let roster_size = population.len();

        for record in &records {
            if seen.insert(record.patient_id.clone()) {
                population.push(PatientRecord::unknown(record.patient_id.clone()));
            }
        }

        log::debug!(
            "engine loaded: {roster_size} roster patients, {} population, {} records",
            population.len(),
            records.len()
        );

        Self {
            config,
            population,
            roster_size,
            records,
            server,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Roster patients followed by record-only patients.
    pub fn population(&self) -> &[PatientRecord] {
        &self.population
    }

    pub fn roster_size(&self) -> usize {
        self.roster_size
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    pub fn server_aggregates(&self) -> &ServerAggregates {
        &self.server
    }

    fn scope(&self, filters: &FilterCriteria) -> Scope<'_> {
        let policy = self.config.missing_factor_policy;
        Scope {
            patients: apply_filters(&self.population, filters, policy).items,
            records: apply_filters(&self.records, filters, policy).items,
        }
    }

    /// Buckets for `dimension`, truncated to the request's effective limit.
    pub fn category_data(&self, dimension: Dimension, query: &CategoryQuery) -> Dataset {
        let limit = self.config.effective_limit(query.limit);
        self.aggregate(dimension, &query.filters).truncated(limit)
    }

    /// Every bucket for `dimension`, optionally joined with contributing patients.
    pub fn full_dataset(&self, dimension: Dimension, query: &FullDatasetQuery) -> FullDataset {
        let (origin, mut rows) = self.aggregate_rows(dimension, &query.filters);
        if !query.include_patient_linkage {
            rows.iter_mut().for_each(|row| row.patient_ids.clear());
        }
        FullDataset {
            dimension,
            origin,
            rows,
        }
    }

    /// Six tiers in fixed order covering the whole population.
    ///
    /// An empty population with placeholders allowed yields the flagged
    /// illustrative distribution, whose counts sum to 100 rather than 0.
    pub fn risk_stratification(&self) -> Dataset {
        if self.population.is_empty() && self.config.allow_placeholders {
            return fallback::risk_tiers();
        }
        Dataset::Real(risk::stratify(&self.population, &self.records))
    }

    pub fn dual_source_hrsn(&self) -> DualSourceHrsn {
        reconcile::reconcile(&self.population, &self.records)
    }

    /// Reconciled factors as chartable buckets tagged with provenance.
    pub fn dual_source_buckets(&self) -> Dataset {
        Dataset::Real(self.dual_source_hrsn().buckets())
    }

    /// Assemble a named chart.
    pub fn chart(&self, chart: Chart, query: &CategoryQuery) -> ChartView {
        let dataset = match chart {
            Chart::Category(dimension) => self.category_data(dimension, query),
            Chart::RiskStratification => self.risk_stratification(),
            Chart::DualSourceHrsn => self.dual_source_buckets(),
        };
        view::assemble(chart, &dataset, query.display_mode)
    }

    pub fn chart_by_name(
        &self,
        name: &str,
        query: &CategoryQuery,
    ) -> Result<ChartView, InsightsError> {
        Ok(self.chart(name.parse()?, query))
    }

    fn aggregate(&self, dimension: Dimension, filters: &FilterCriteria) -> Dataset {
        let (origin, rows) = self.aggregate_rows(dimension, filters);
        let buckets = rows.into_iter().map(|row| row.bucket).collect();
        match origin {
            DataOrigin::Real => Dataset::Real(buckets),
            DataOrigin::Placeholder => Dataset::Placeholder(buckets),
        }
    }

    /// Untruncated rows and where they came from.
    fn aggregate_rows(
        &self,
        dimension: Dimension,
        filters: &FilterCriteria,
    ) -> (DataOrigin, Vec<FullDatasetRow>) {
        if filters.is_empty() {
            if let Some(rows) = self.server.rows_for(dimension) {
                log::debug!("{dimension}: using {} server summary rows", rows.len());
                let denominator = match dimension {
                    Dimension::SymptomId | Dimension::HrsnIndicator => {
                        Denominator::Patients(self.population.len())
                    }
                    _ => Denominator::TotalCount,
                };
                return (DataOrigin::Real, aggregate::from_summary(rows, denominator));
            }
        }

        let scope = self.scope(filters);
        match dimension.kind() {
            DimensionKind::Clinical => (
                DataOrigin::Real,
                aggregate::clinical(&scope.records, dimension, scope.patient_count()),
            ),
            DimensionKind::Demographic => (
                DataOrigin::Real,
                aggregate::demographic(&scope.patients, dimension),
            ),
            DimensionKind::Hrsn => {
                let rows = aggregate::hrsn_from_records(
                    &scope.records,
                    &self.config.hrsn_keywords,
                    scope.patient_count(),
                );
                if rows.is_empty() && self.config.allow_placeholders {
                    let placeholder = fallback::hrsn_indicators();
                    let rows = placeholder
                        .into_buckets()
                        .into_iter()
                        .map(|bucket| FullDatasetRow {
                            bucket,
                            patient_ids: Vec::new(),
                            first_seen: None,
                            last_seen: None,
                        })
                        .collect();
                    return (DataOrigin::Placeholder, rows);
                }
                (DataOrigin::Real, rows)
            }
        }
    }
}
