use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use insights_core::{
    Chart, DataOrigin, Dimension, DisplayMode, EngineConfig, FilterCriteria, MissingFactorPolicy,
};
use insights_engine::{load_dataset_str, CategoryQuery};

#[derive(Parser, Debug)]
#[command(
    name = "insights-cli",
    about = "Print population analytics charts from a patient/records JSON dataset."
)]
struct Args {
    /// Path to the dataset JSON file.
    #[arg(short, long)]
    input: PathBuf,

    /// Chart to print, e.g. symptom-segments, age-range, risk-stratification.
    /// Repeat to print several; `all` prints every chart.
    #[arg(short, long, default_value = "all")]
    chart: Vec<String>,

    /// `count` or `percentage`.
    #[arg(short, long, default_value = "percentage")]
    mode: DisplayMode,

    /// Maximum buckets per chart.
    #[arg(short, long)]
    limit: Option<usize>,

    #[arg(long)]
    housing: Option<String>,

    #[arg(long)]
    food: Option<String>,

    #[arg(long)]
    financial: Option<String>,

    #[arg(long)]
    diagnosis: Option<String>,

    /// Apply HRSN filters literally even when the data never records the factor.
    #[arg(long)]
    strict_filters: bool,

    /// Also print the full dual-source HRSN reconciliation.
    #[arg(long)]
    dual_source: bool,

    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

/// Every dimension chart, then risk tiers and the dual-source view.
fn all_charts() -> Vec<Chart> {
    Dimension::ALL
        .into_iter()
        .map(Chart::Category)
        .chain([Chart::RiskStratification, Chart::DualSourceHrsn])
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;

    let config = EngineConfig {
        missing_factor_policy: if args.strict_filters {
            MissingFactorPolicy::Strict
        } else {
            MissingFactorPolicy::AssumeMatch
        },
        ..EngineConfig::default()
    };
    let engine = load_dataset_str(&data, &config)?;
    log::info!(
        "loaded {} patients ({} on roster) and {} records",
        engine.population().len(),
        engine.roster_size(),
        engine.records().len()
    );

    let query = CategoryQuery {
        limit: args.limit,
        filters: FilterCriteria {
            housing_status: args.housing.clone(),
            food_status: args.food.clone(),
            financial_status: args.financial.clone(),
            diagnosis: args.diagnosis.clone(),
        },
        display_mode: args.mode,
    };

    let charts = if args.chart.iter().any(|name| name == "all") {
        all_charts()
    } else {
        args.chart
            .iter()
            .map(|name| name.parse::<Chart>())
            .collect::<Result<Vec<_>, _>>()?
    };

    for chart in charts {
        let view = engine.chart(chart, &query);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            continue;
        }

        let marker = if view.origin == DataOrigin::Placeholder {
            " (placeholder)"
        } else {
            ""
        };
        println!("== {}{marker}", view.chart);
        for point in &view.points {
            match view.display_mode {
                DisplayMode::Count => println!("  {:<40} {:>6}", point.id, point.value),
                DisplayMode::Percentage => println!(
                    "  {:<40} {:>5}%  ({})",
                    point.id, point.value, point.raw_value
                ),
            }
        }
    }

    if args.dual_source {
        let hrsn = engine.dual_source_hrsn();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&hrsn)?);
        } else {
            println!("== dual-source HRSN ({} patients)", hrsn.total_patients);
            for (name, category) in &hrsn.categories {
                println!(
                    "  {:<16} customer {:>4}  extracted {:>4}  affected {:>4} ({}%)  {:?}",
                    name,
                    category.customer_count,
                    category.extracted_count,
                    category.total_affected,
                    category.percentage,
                    category.data_source
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_dimension_and_summary_chart() {
        let names: Vec<String> = all_charts().into_iter().map(Chart::name).collect();
        assert_eq!(names.len(), Dimension::ALL.len() + 2);
        let expected = [
            "education",
            "veteran-status",
            "transportation-status",
            "risk-stratification",
            "dual-source-hrsn",
        ];
        for name in expected {
            assert!(names.iter().any(|n| n == name), "missing {name}");
        }
        for name in &names {
            assert!(name.parse::<Chart>().is_ok(), "{name} does not parse back");
        }
    }
}
