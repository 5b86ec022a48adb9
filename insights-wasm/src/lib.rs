//! Framework-neutral WASM <-> JavaScript bridge for the analytics engine.

use insights_core::{
    Chart, Dimension, DisplayMode, EngineConfig, FilterCriteria, InsightsError,
    MissingFactorPolicy,
};
use insights_engine::{AggregationCache, AnalyticsEngine, CategoryQuery, FullDatasetQuery};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Partial config from JS; absent fields keep their defaults.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsEngineConfig {
    #[serde(default)]
    default_limit: Option<usize>,
    #[serde(default)]
    min_limit: Option<usize>,
    #[serde(default)]
    max_limit: Option<usize>,
    #[serde(default)]
    strict_filters: Option<bool>,
    #[serde(default)]
    hrsn_keywords: Option<Vec<String>>,
    #[serde(default)]
    allow_placeholders: Option<bool>,
}

impl From<JsEngineConfig> for EngineConfig {
    fn from(cfg: JsEngineConfig) -> Self {
        let mut base = EngineConfig::default();
        if let Some(limit) = cfg.default_limit {
            base.default_limit = limit;
        }
        if let Some(limit) = cfg.min_limit {
            base.min_limit = limit;
        }
        if let Some(limit) = cfg.max_limit {
            base.max_limit = limit;
        }
        if let Some(strict) = cfg.strict_filters {
            base.missing_factor_policy = if strict {
                MissingFactorPolicy::Strict
            } else {
                MissingFactorPolicy::AssumeMatch
            };
        }
        if let Some(keywords) = cfg.hrsn_keywords {
            base.hrsn_keywords = keywords;
        }
        if let Some(allow) = cfg.allow_placeholders {
            base.allow_placeholders = allow;
        }
        base
    }
}

/// Request options shared by every chart call.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsChartOptions {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    filters: FilterCriteria,
    #[serde(default)]
    display_mode: Option<String>,
    #[serde(default)]
    include_patient_linkage: bool,
}

impl JsChartOptions {
    fn category_query(&self) -> Result<CategoryQuery, JsValue> {
        let display_mode = match &self.display_mode {
            Some(mode) => mode.parse::<DisplayMode>().map_err(js_error)?,
            None => DisplayMode::default(),
        };
        Ok(CategoryQuery {
            limit: self.limit,
            filters: self.filters.clone(),
            display_mode,
        })
    }

    fn full_dataset_query(&self) -> FullDatasetQuery {
        FullDatasetQuery {
            filters: self.filters.clone(),
            include_patient_linkage: self.include_patient_linkage,
        }
    }
}

/// Loaded dataset plus its result cache. One instance per dataset.
#[wasm_bindgen]
pub struct InsightsHandle {
    engine: AnalyticsEngine,
    cache: AggregationCache,
}

#[wasm_bindgen]
impl InsightsHandle {
    /// Accepts `{ patients, records, serverAggregates }` and an optional partial config.
    #[wasm_bindgen(constructor)]
    pub fn new(dataset: JsValue, config: Option<JsValue>) -> Result<InsightsHandle, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let document = from_value::<serde_json::Value>(dataset)
            .map_err(|err| JsValue::from_str(&format!("Could not read dataset JSON: {err}")))?;

        let cfg = match config {
            Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
                let cfg: JsEngineConfig = from_value(js_cfg)
                    .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
                EngineConfig::from(cfg)
            }
            _ => EngineConfig::default(),
        };

        Ok(InsightsHandle {
            engine: insights_engine::load_dataset_value(&document, &cfg),
            cache: AggregationCache::new(),
        })
    }

    #[wasm_bindgen(js_name = categoryData)]
    pub fn category_data(
        &mut self,
        dimension: &str,
        options: Option<JsValue>,
    ) -> Result<JsValue, JsValue> {
        let dimension = dimension.parse::<Dimension>().map_err(js_error)?;
        let query = read_options(options)?.category_query()?;
        serialize(self.cache.category_data(&self.engine, dimension, &query))
    }

    #[wasm_bindgen(js_name = fullDataset)]
    pub fn full_dataset(
        &self,
        dimension: &str,
        options: Option<JsValue>,
    ) -> Result<JsValue, JsValue> {
        let dimension = dimension.parse::<Dimension>().map_err(js_error)?;
        let query = read_options(options)?.full_dataset_query();
        serialize(&self.engine.full_dataset(dimension, &query))
    }

    #[wasm_bindgen(js_name = riskStratification)]
    pub fn risk_stratification(&mut self) -> Result<JsValue, JsValue> {
        serialize(self.cache.risk_stratification(&self.engine))
    }

    #[wasm_bindgen(js_name = dualSourceHrsn)]
    pub fn dual_source_hrsn(&self) -> Result<JsValue, JsValue> {
        serialize(&self.engine.dual_source_hrsn())
    }

    /// Chart points by name, e.g. `"symptom-segments"` or `"risk-stratification"`.
    pub fn chart(&mut self, name: &str, options: Option<JsValue>) -> Result<JsValue, JsValue> {
        let chart = name.parse::<Chart>().map_err(js_error)?;
        let query = read_options(options)?.category_query()?;
        serialize(&self.cache.chart(&self.engine, chart, &query))
    }

    /// Drop cached results.
    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn read_options(options: Option<JsValue>) -> Result<JsChartOptions, JsValue> {
    match options {
        Some(value) if !value.is_undefined() && !value.is_null() => from_value(value)
            .map_err(|err| JsValue::from_str(&format!("Could not read chart options: {err}"))),
        _ => Ok(JsChartOptions::default()),
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Could not serialize result: {err}")))
}

fn js_error(err: InsightsError) -> JsValue {
    JsValue::from_str(&format_insights_error(err))
}

fn format_insights_error(err: InsightsError) -> String {
    format!("Insights error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: JsEngineConfig =
            serde_json::from_str(r#"{ "defaultLimit": 20, "strictFilters": true }"#).unwrap();
        let cfg = EngineConfig::from(cfg);
        assert_eq!(cfg.default_limit, 20);
        assert_eq!(cfg.min_limit, 5);
        assert_eq!(cfg.max_limit, 100);
        assert_eq!(cfg.missing_factor_policy, MissingFactorPolicy::Strict);
        assert!(cfg.allow_placeholders);
    }

    #[test]
    fn chart_options_build_queries() {
        let options: JsChartOptions = serde_json::from_str(
            r#"{ "limit": 7, "displayMode": "count", "filters": { "housingStatus": "Insecure" } }"#,
        )
        .unwrap();
        let query = options.category_query().ok().unwrap();
        assert_eq!(query.limit, Some(7));
        assert_eq!(query.display_mode, DisplayMode::Count);
        assert_eq!(query.filters.housing_status.as_deref(), Some("Insecure"));
        assert!(!options.full_dataset_query().include_patient_linkage);
    }

    #[test]
    fn errors_are_prefixed() {
        let message = format_insights_error(InsightsError::UnknownChart("pie".into()));
        assert_eq!(message, "Insights error: unknown chart: pie");
    }
}
