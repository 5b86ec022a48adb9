//! Request shapes and the `{id, value, rawValue, percentage}` output contract.

use insights_core::{
    CategoryBucket, Chart, ChartPoint, ChartView, Dataset, DisplayMode, FilterCriteria,
};
use serde::{Deserialize, Serialize};

/// Parameters of a bounded category request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryQuery {
    pub limit: Option<usize>,
    pub filters: FilterCriteria,
    pub display_mode: DisplayMode,
}

impl CategoryQuery {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filters(mut self, filters: FilterCriteria) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_display_mode(mut self, display_mode: DisplayMode) -> Self {
        self.display_mode = display_mode;
        self
    }
}

/// Parameters of an unbounded export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct FullDatasetQuery {
    pub filters: FilterCriteria,
    pub include_patient_linkage: bool,
}

/// Both figures are always carried; the mode only picks which one is `value`.
pub fn to_point(bucket: &CategoryBucket, mode: DisplayMode) -> ChartPoint {
    let value = match mode {
        DisplayMode::Count => bucket.raw_count as u64,
        DisplayMode::Percentage => u64::from(bucket.percentage),
    };
    ChartPoint {
        id: bucket.id.clone(),
        value,
        raw_value: bucket.raw_count,
        percentage: bucket.percentage,
        provenance: bucket.provenance,
    }
}

pub fn assemble(chart: Chart, dataset: &Dataset, mode: DisplayMode) -> ChartView {
    ChartView {
        chart: chart.name(),
        display_mode: mode,
        origin: dataset.origin(),
        points: dataset
            .buckets()
            .iter()
            .map(|bucket| to_point(bucket, mode))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{DataOrigin, Dimension};

    #[test]
    fn display_mode_only_changes_value() {
        let dataset = Dataset::Real(vec![CategoryBucket::new("Anxiety", 3, 12)]);
        let chart = Chart::Category(Dimension::SymptomSegment);

        let counts = assemble(chart, &dataset, DisplayMode::Count);
        let percents = assemble(chart, &dataset, DisplayMode::Percentage);

        assert_eq!(counts.points[0].value, 3);
        assert_eq!(percents.points[0].value, 25);
        for view in [&counts, &percents] {
            assert_eq!(view.points[0].raw_value, 3);
            assert_eq!(view.points[0].percentage, 25);
            assert_eq!(view.origin, DataOrigin::Real);
            assert_eq!(view.chart, "symptom-segments");
        }
    }

    #[test]
    fn query_deserializes_from_camel_case() {
        let query: CategoryQuery = serde_json::from_str(
            r#"{ "limit": 20, "displayMode": "count", "filters": { "housingStatus": "Insecure" } }"#,
        )
        .unwrap();
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.display_mode, DisplayMode::Count);
        assert_eq!(query.filters.housing_status.as_deref(), Some("Insecure"));
    }
}
