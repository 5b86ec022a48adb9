//! Caller-owned memoization of aggregation results.

use std::collections::HashMap;

use insights_core::{Chart, ChartView, Dataset, Dimension, FilterCriteria};

use crate::view::{assemble, CategoryQuery};
use crate::AnalyticsEngine;

/// Display mode is applied after lookup and is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub dimension: Dimension,
    pub filters: FilterCriteria,
    pub limit: usize,
}

/// Memoizes datasets per `(dimension, filters, limit)`. The engine itself stays
/// stateless; drop or [`clear`](AggregationCache::clear) the cache when the
/// underlying data changes.
#[derive(Debug, Default)]
pub struct AggregationCache {
    categories: HashMap<CacheKey, Dataset>,
    risk: Option<Dataset>,
    dual_source: Option<Dataset>,
}

impl AggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_data(
        &mut self,
        engine: &AnalyticsEngine,
        dimension: Dimension,
        query: &CategoryQuery,
    ) -> &Dataset {
        let key = CacheKey {
            dimension,
            filters: query.filters.clone(),
            limit: engine.config().effective_limit(query.limit),
        };
        self.categories
            .entry(key)
            .or_insert_with(|| engine.category_data(dimension, query))
    }

    pub fn risk_stratification(&mut self, engine: &AnalyticsEngine) -> &Dataset {
        self.risk.get_or_insert_with(|| engine.risk_stratification())
    }

    pub fn dual_source_buckets(&mut self, engine: &AnalyticsEngine) -> &Dataset {
        self.dual_source.get_or_insert_with(|| engine.dual_source_buckets())
    }

    pub fn chart(
        &mut self,
        engine: &AnalyticsEngine,
        chart: Chart,
        query: &CategoryQuery,
    ) -> ChartView {
        let dataset = match chart {
            Chart::Category(dimension) => self.category_data(engine, dimension, query),
            Chart::RiskStratification => self.risk_stratification(engine),
            Chart::DualSourceHrsn => self.dual_source_buckets(engine),
        };
        assemble(chart, dataset, query.display_mode)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
            + usize::from(self.risk.is_some())
            + usize::from(self.dual_source.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.categories.clear();
        self.risk = None;
        self.dual_source = None;
    }
}
