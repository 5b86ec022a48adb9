//! Core data model for the behavioral-health population analytics engine.
//!
//! Types here are plain, serde-serialisable values. Everything that turns raw
//! input into these values lives in `insights-engine`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default category for any attribute that could not be resolved.
pub const NO_DATA: &str = "No Data Available";

/// Default category for values outside a closed vocabulary.
pub const OTHER: &str = "Other";

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of buckets returned when a request carries no limit.
    pub default_limit: usize,
    /// Smallest accepted limit.
    pub min_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
    /// What HRSN filters do when the data carries no value for the filtered factor.
    pub missing_factor_policy: MissingFactorPolicy,
    /// Keywords that mark an extracted row as an HRSN observation.
    pub hrsn_keywords: Vec<String>,
    /// Serve illustrative placeholder distributions when no data exists.
    pub allow_placeholders: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            min_limit: 5,
            max_limit: 100,
            missing_factor_policy: MissingFactorPolicy::AssumeMatch,
            hrsn_keywords: ["housing", "food", "transport", "economic", "social"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            allow_placeholders: true,
        }
    }
}

impl EngineConfig {
    /// Resolve a requested limit into the accepted range.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        let max = self.max_limit.max(self.min_limit);
        requested
            .unwrap_or(self.default_limit)
            .clamp(self.min_limit, max)
    }
}

/// Behaviour of an active HRSN filter over data that never records that factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingFactorPolicy {
    /// Treat every item as already matching, turning the filter into a no-op.
    #[default]
    AssumeMatch,
    /// Apply the filter literally, even when that removes every item.
    Strict,
}

/// Fixed age partition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    #[serde(rename = "0-17")]
    UpTo17,
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    Over65,
    #[serde(rename = "No Data Available")]
    NoData,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 8] = [
        AgeBucket::UpTo17,
        AgeBucket::From18To24,
        AgeBucket::From25To34,
        AgeBucket::From35To44,
        AgeBucket::From45To54,
        AgeBucket::From55To64,
        AgeBucket::Over65,
        AgeBucket::NoData,
    ];

    /// Bucket for a whole-year age.
    pub fn for_age(age: u32) -> Self {
        match age {
            0..=17 => AgeBucket::UpTo17,
            18..=24 => AgeBucket::From18To24,
            25..=34 => AgeBucket::From25To34,
            35..=44 => AgeBucket::From35To44,
            45..=54 => AgeBucket::From45To54,
            55..=64 => AgeBucket::From55To64,
            _ => AgeBucket::Over65,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::UpTo17 => "0-17",
            AgeBucket::From18To24 => "18-24",
            AgeBucket::From25To34 => "25-34",
            AgeBucket::From35To44 => "35-44",
            AgeBucket::From45To54 => "45-54",
            AgeBucket::From55To64 => "55-64",
            AgeBucket::Over65 => "65+",
            AgeBucket::NoData => NO_DATA,
        }
    }

    /// Exact match against a bucket label, ignoring whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.label().replace(' ', "").eq_ignore_ascii_case(&compact))
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Symptom-count severity tiers, in output order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskTier {
    #[serde(rename = "No Risk")]
    NoRisk,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Low-Medium")]
    LowMedium,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    #[serde(rename = "High")]
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 6] = [
        RiskTier::NoRisk,
        RiskTier::Low,
        RiskTier::LowMedium,
        RiskTier::Medium,
        RiskTier::MediumHigh,
        RiskTier::High,
    ];

    pub fn for_symptom_count(count: usize) -> Self {
        match count {
            0 => RiskTier::NoRisk,
            1..=9 => RiskTier::Low,
            10..=19 => RiskTier::LowMedium,
            20..=49 => RiskTier::Medium,
            50..=99 => RiskTier::MediumHigh,
            _ => RiskTier::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::NoRisk => "No Risk",
            RiskTier::Low => "Low",
            RiskTier::LowMedium => "Low-Medium",
            RiskTier::Medium => "Medium",
            RiskTier::MediumHigh => "Medium-High",
            RiskTier::High => "High",
        }
    }
}

/// Social-need factors tracked per patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HrsnFactor {
    Housing,
    Food,
    Financial,
    Transportation,
}

impl HrsnFactor {
    pub const ALL: [HrsnFactor; 4] = [
        HrsnFactor::Housing,
        HrsnFactor::Food,
        HrsnFactor::Financial,
        HrsnFactor::Transportation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HrsnFactor::Housing => "housing",
            HrsnFactor::Food => "food",
            HrsnFactor::Financial => "financial",
            HrsnFactor::Transportation => "transportation",
        }
    }
}

/// Structured patient roster entry. Every demographic attribute is resolved;
/// unknown values hold [`NO_DATA`] or [`OTHER`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientRecord {
    pub patient_id: String,
    pub age_range: AgeBucket,
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
    pub zip_code: String,
    pub education: String,
    pub veteran_status: String,
    pub housing_status: String,
    pub food_status: String,
    pub financial_status: String,
    pub transportation_status: String,
    pub diagnosis: Option<String>,
}

impl PatientRecord {
    /// Patient with every attribute at its default.
    pub fn unknown(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            age_range: AgeBucket::NoData,
            gender: NO_DATA.to_string(),
            race: NO_DATA.to_string(),
            ethnicity: NO_DATA.to_string(),
            zip_code: NO_DATA.to_string(),
            education: NO_DATA.to_string(),
            veteran_status: NO_DATA.to_string(),
            housing_status: NO_DATA.to_string(),
            food_status: NO_DATA.to_string(),
            financial_status: NO_DATA.to_string(),
            transportation_status: NO_DATA.to_string(),
            diagnosis: None,
        }
    }

    /// Recorded status for a factor; `None` when only the default is present.
    pub fn hrsn_status(&self, factor: HrsnFactor) -> Option<&str> {
        let value = match factor {
            HrsnFactor::Housing => &self.housing_status,
            HrsnFactor::Food => &self.food_status,
            HrsnFactor::Financial => &self.financial_status,
            HrsnFactor::Transportation => &self.transportation_status,
        };
        (value != NO_DATA).then_some(value.as_str())
    }

    /// Category this patient falls into for a demographic dimension.
    pub fn demographic(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::AgeRange => self.age_range.label(),
            Dimension::Gender => &self.gender,
            Dimension::Race => &self.race,
            Dimension::Ethnicity => &self.ethnicity,
            Dimension::ZipCode => &self.zip_code,
            Dimension::Education => &self.education,
            Dimension::VeteranStatus => &self.veteran_status,
            Dimension::HousingStatus => &self.housing_status,
            Dimension::FoodStatus => &self.food_status,
            Dimension::FinancialStatus => &self.financial_status,
            Dimension::TransportationStatus => &self.transportation_status,
            _ => return None,
        };
        Some(value)
    }
}

/// One observation extracted from a clinical note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExtractedRecord {
    pub patient_id: String,
    pub date_of_service: Option<NaiveDate>,
    pub symptom_segment: Option<String>,
    pub symptom_wording: Option<String>,
    pub symptom_id: Option<String>,
    pub diagnosis: Option<String>,
    pub diagnostic_category: Option<String>,
    /// Marks HRSN "Problem" rows as opposed to clinical symptom rows.
    pub problem: bool,
    pub housing_status: Option<String>,
    pub food_status: Option<String>,
    pub financial_status: Option<String>,
    pub transportation_status: Option<String>,
}

impl ExtractedRecord {
    /// Segment text, falling back to the raw wording.
    pub fn symptom_text(&self) -> Option<&str> {
        self.symptom_segment
            .as_deref()
            .or(self.symptom_wording.as_deref())
    }

    pub fn hrsn_status(&self, factor: HrsnFactor) -> Option<&str> {
        match factor {
            HrsnFactor::Housing => self.housing_status.as_deref(),
            HrsnFactor::Food => self.food_status.as_deref(),
            HrsnFactor::Financial => self.financial_status.as_deref(),
            HrsnFactor::Transportation => self.transportation_status.as_deref(),
        }
    }
}

/// Broad family a dimension belongs to; decides its input and denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Clinical,
    Hrsn,
    Demographic,
}

/// One axis of categorisation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    SymptomSegment,
    Diagnosis,
    DiagnosticCategory,
    SymptomId,
    HrsnIndicator,
    AgeRange,
    Gender,
    Race,
    Ethnicity,
    ZipCode,
    Education,
    VeteranStatus,
    HousingStatus,
    FoodStatus,
    FinancialStatus,
    TransportationStatus,
}

impl Dimension {
    pub const ALL: [Dimension; 16] = [
        Dimension::SymptomSegment,
        Dimension::Diagnosis,
        Dimension::DiagnosticCategory,
        Dimension::SymptomId,
        Dimension::HrsnIndicator,
        Dimension::AgeRange,
        Dimension::Gender,
        Dimension::Race,
        Dimension::Ethnicity,
        Dimension::ZipCode,
        Dimension::Education,
        Dimension::VeteranStatus,
        Dimension::HousingStatus,
        Dimension::FoodStatus,
        Dimension::FinancialStatus,
        Dimension::TransportationStatus,
    ];

    pub fn kind(self) -> DimensionKind {
        match self {
            Dimension::SymptomSegment
            | Dimension::Diagnosis
            | Dimension::DiagnosticCategory
            | Dimension::SymptomId => DimensionKind::Clinical,
            Dimension::HrsnIndicator => DimensionKind::Hrsn,
            _ => DimensionKind::Demographic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::SymptomSegment => "symptom_segment",
            Dimension::Diagnosis => "diagnosis",
            Dimension::DiagnosticCategory => "diagnostic_category",
            Dimension::SymptomId => "symptom_id",
            Dimension::HrsnIndicator => "hrsn_indicator",
            Dimension::AgeRange => "age_range",
            Dimension::Gender => "gender",
            Dimension::Race => "race",
            Dimension::Ethnicity => "ethnicity",
            Dimension::ZipCode => "zip_code",
            Dimension::Education => "education",
            Dimension::VeteranStatus => "veteran_status",
            Dimension::HousingStatus => "housing_status",
            Dimension::FoodStatus => "food_status",
            Dimension::FinancialStatus => "financial_status",
            Dimension::TransportationStatus => "transportation_status",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = InsightsError;

    /// Accepts snake_case, kebab-case and camelCase spellings.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = snake_key(name);
        Dimension::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == key)
            .ok_or_else(|| InsightsError::UnknownDimension(name.to_string()))
    }
}

/// Named chart requested by the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Chart {
    Category(Dimension),
    RiskStratification,
    /// Reconciled HRSN factors with per-bucket provenance.
    DualSourceHrsn,
}

impl Chart {
    pub fn name(self) -> String {
        match self {
            Chart::Category(Dimension::SymptomSegment) => "symptom-segments".to_string(),
            Chart::Category(Dimension::Diagnosis) => "diagnoses".to_string(),
            Chart::Category(Dimension::DiagnosticCategory) => "diagnostic-categories".to_string(),
            Chart::Category(Dimension::SymptomId) => "symptom-ids".to_string(),
            Chart::Category(Dimension::HrsnIndicator) => "hrsn-indicators".to_string(),
            Chart::Category(other) => other.as_str().replace('_', "-"),
            Chart::RiskStratification => "risk-stratification".to_string(),
            Chart::DualSourceHrsn => "dual-source-hrsn".to_string(),
        }
    }
}

impl FromStr for Chart {
    type Err = InsightsError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = snake_key(name);
        let chart = match key.as_str() {
            "symptom_segments" => Chart::Category(Dimension::SymptomSegment),
            "diagnoses" => Chart::Category(Dimension::Diagnosis),
            "diagnostic_categories" => Chart::Category(Dimension::DiagnosticCategory),
            "symptom_ids" => Chart::Category(Dimension::SymptomId),
            "hrsn_indicators" => Chart::Category(Dimension::HrsnIndicator),
            "risk_stratification" | "risk" => Chart::RiskStratification,
            "dual_source_hrsn" | "dual_source" => Chart::DualSourceHrsn,
            _ => key
                .parse::<Dimension>()
                .map(Chart::Category)
                .map_err(|_| InsightsError::UnknownChart(name.to_string()))?,
        };
        Ok(chart)
    }
}

fn snake_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    for ch in name.trim().chars() {
        if ch.is_ascii_uppercase() {
            if !key.is_empty() && !key.ends_with('_') {
                key.push('_');
            }
            key.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' {
            key.push('_');
        } else {
            key.push(ch);
        }
    }
    key
}

/// Which figure a chart treats as its value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Count,
    #[default]
    Percentage,
}

impl FromStr for DisplayMode {
    type Err = InsightsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "count" | "counts" => Ok(DisplayMode::Count),
            "percentage" | "percent" | "%" => Ok(DisplayMode::Percentage),
            other => Err(InsightsError::Parse(format!("unknown display mode {other}"))),
        }
    }
}

/// Constraints applied before aggregation. `None` and `"all"` mean no constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub housing_status: Option<String>,
    pub food_status: Option<String>,
    pub financial_status: Option<String>,
    pub diagnosis: Option<String>,
}

impl FilterCriteria {
    pub fn with_housing(mut self, status: impl Into<String>) -> Self {
        self.housing_status = Some(status.into());
        self
    }

    pub fn with_food(mut self, status: impl Into<String>) -> Self {
        self.food_status = Some(status.into());
        self
    }

    pub fn with_financial(mut self, status: impl Into<String>) -> Self {
        self.financial_status = Some(status.into());
        self
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.diagnosis = Some(diagnosis.into());
        self
    }

    /// Active constraint on an HRSN factor. Transportation is never filtered.
    pub fn hrsn_constraint(&self, factor: HrsnFactor) -> Option<&str> {
        let value = match factor {
            HrsnFactor::Housing => self.housing_status.as_deref(),
            HrsnFactor::Food => self.food_status.as_deref(),
            HrsnFactor::Financial => self.financial_status.as_deref(),
            HrsnFactor::Transportation => None,
        };
        value.filter(|v| is_active(v))
    }

    pub fn diagnosis_constraint(&self) -> Option<&str> {
        self.diagnosis.as_deref().filter(|v| is_active(v))
    }

    pub fn has_hrsn_constraints(&self) -> bool {
        HrsnFactor::ALL
            .into_iter()
            .any(|factor| self.hrsn_constraint(factor).is_some())
    }

    /// True when no constraint is active.
    pub fn is_empty(&self) -> bool {
        !self.has_hrsn_constraints() && self.diagnosis_constraint().is_none()
    }
}

fn is_active(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("all")
}

/// Which source(s) supplied a count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Customer,
    Extracted,
    Both,
    #[default]
    None,
}

impl Provenance {
    pub fn from_presence(customer: bool, extracted: bool) -> Self {
        match (customer, extracted) {
            (true, true) => Provenance::Both,
            (true, false) => Provenance::Customer,
            (false, true) => Provenance::Extracted,
            (false, false) => Provenance::None,
        }
    }
}

/// `round(raw / denominator * 100)`, clamped to `[0, 100]`; zero for an empty denominator.
pub fn percentage_of(raw: usize, denominator: usize) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let pct = (raw as f64 / denominator as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Counted category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket {
    pub id: String,
    pub raw_count: usize,
    pub percentage: u32,
    pub denominator: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl CategoryBucket {
    pub fn new(id: impl Into<String>, raw_count: usize, denominator: usize) -> Self {
        Self {
            id: id.into(),
            raw_count,
            percentage: percentage_of(raw_count, denominator),
            denominator,
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// Whether a dataset reflects real input or a canned illustration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Real,
    Placeholder,
}

/// Buckets tagged with their origin so placeholders never pass as real output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "origin", content = "buckets", rename_all = "snake_case")]
pub enum Dataset {
    Real(Vec<CategoryBucket>),
    Placeholder(Vec<CategoryBucket>),
}

impl Dataset {
    pub fn origin(&self) -> DataOrigin {
        match self {
            Dataset::Real(_) => DataOrigin::Real,
            Dataset::Placeholder(_) => DataOrigin::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Dataset::Placeholder(_))
    }

    pub fn buckets(&self) -> &[CategoryBucket] {
        match self {
            Dataset::Real(buckets) | Dataset::Placeholder(buckets) => buckets,
        }
    }

    pub fn into_buckets(self) -> Vec<CategoryBucket> {
        match self {
            Dataset::Real(buckets) | Dataset::Placeholder(buckets) => buckets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets().is_empty()
    }

    /// Keep only the first `limit` buckets.
    pub fn truncated(self, limit: usize) -> Self {
        match self {
            Dataset::Real(mut buckets) => {
                buckets.truncate(limit);
                Dataset::Real(buckets)
            }
            Dataset::Placeholder(mut buckets) => {
                buckets.truncate(limit);
                Dataset::Placeholder(buckets)
            }
        }
    }

    /// Total of every bucket's raw count.
    pub fn total_count(&self) -> usize {
        self.buckets().iter().map(|bucket| bucket.raw_count).sum()
    }
}

/// One pre-aggregated row supplied by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub id: String,
    pub count: usize,
}

/// Optional server-side summaries, preferred over raw derivation when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ServerAggregates {
    pub symptom_segment_data: Option<Vec<SummaryRow>>,
    pub diagnosis_data: Option<Vec<SummaryRow>>,
    pub diagnostic_category_data: Option<Vec<SummaryRow>>,
    pub symptom_id_data: Option<Vec<SummaryRow>>,
    pub hrsn_indicator_data: Option<Vec<SummaryRow>>,
}

impl ServerAggregates {
    /// Non-empty server rows for a dimension.
    pub fn rows_for(&self, dimension: Dimension) -> Option<&[SummaryRow]> {
        let rows = match dimension {
            Dimension::SymptomSegment => self.symptom_segment_data.as_deref(),
            Dimension::Diagnosis => self.diagnosis_data.as_deref(),
            Dimension::DiagnosticCategory => self.diagnostic_category_data.as_deref(),
            Dimension::SymptomId => self.symptom_id_data.as_deref(),
            Dimension::HrsnIndicator => self.hrsn_indicator_data.as_deref(),
            _ => None,
        };
        rows.filter(|rows| !rows.is_empty())
    }
}

/// One rendered data point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub id: String,
    pub value: u64,
    pub raw_value: usize,
    pub percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Output contract for a named chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub chart: String,
    pub display_mode: DisplayMode,
    pub origin: DataOrigin,
    pub points: Vec<ChartPoint>,
}

/// A bucket in an unbounded export, optionally joined with its patients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FullDatasetRow {
    #[serde(flatten)]
    pub bucket: CategoryBucket,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patient_ids: Vec<String>,
    pub first_seen: Option<NaiveDate>,
    pub last_seen: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FullDataset {
    pub dimension: Dimension,
    pub origin: DataOrigin,
    pub rows: Vec<FullDatasetRow>,
}

/// Per-category result of merging structured and extracted HRSN evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledCategory {
    pub customer_count: usize,
    pub extracted_count: usize,
    pub total_affected: usize,
    pub percentage: u32,
    pub data_source: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub categories_reported: usize,
    pub customer_only: usize,
    pub extracted_only: usize,
    pub both: usize,
    /// Distinct patients affected by any reported category.
    pub patients_affected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DualSourceHrsn {
    /// Keyed by factor label, in factor order.
    pub categories: IndexMap<String, ReconciledCategory>,
    pub total_patients: usize,
    pub summary: ReconcileSummary,
}

impl DualSourceHrsn {
    pub fn category(&self, name: &str) -> Option<&ReconciledCategory> {
        self.categories.get(name)
    }

    /// One bucket per reported factor, counting affected patients over the
    /// population and tagged with the sources that flagged them.
    pub fn buckets(&self) -> Vec<CategoryBucket> {
        let mut buckets: Vec<CategoryBucket> = self
            .categories
            .iter()
            .map(|(name, category)| {
                CategoryBucket::new(name.as_str(), category.total_affected, self.total_patients)
                    .with_provenance(category.data_source)
            })
            .collect();
        buckets.sort_by(|a, b| b.raw_count.cmp(&a.raw_count));
        buckets
    }
}

/// Failures at the engine boundary. Data-shape anomalies are never errors.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("could not parse input: {0}")]
    Parse(String),
    #[error("unknown chart: {0}")]
    UnknownChart(String),
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),
}
