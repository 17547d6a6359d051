//! Resolved run configuration.
//!
//! clap arguments are turned into these structs once, up front, so every
//! configuration error (bad date, unknown key or currency) surfaces with exit
//! code 2 before any request is sent.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{DashArgs, DownloadArgs, SourceArgs};
use crate::data::datasets::{all_currencies, build_plans, parse_currency_list, restrict_to_series};
use crate::data::{DatasetPlan, OutputPaths, SeriesRegistry};
use crate::domain::{parse_date_bound, BoundKind, DateRange, Measure};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub measure: Measure,
    pub fred_api_key: Option<String>,
    pub timeout: Duration,
    pub retries: u32,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub range: DateRange,
    pub plans: Vec<DatasetPlan>,
    pub overwrite: bool,
    pub preview: usize,
    pub verbose: bool,
    pub source: SourceConfig,
}

#[derive(Debug, Clone)]
pub struct DashConfig {
    pub range: DateRange,
    /// Canonical keys selected at startup.
    pub series: Vec<String>,
    pub export_path: PathBuf,
    pub source: SourceConfig,
}

pub fn source_config_from_args(args: &SourceArgs) -> Result<SourceConfig, AppError> {
    if args.timeout == 0 {
        return Err(AppError::config("--timeout must be at least 1 second"));
    }
    Ok(SourceConfig {
        measure: args.measure,
        fred_api_key: args
            .fred_api_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
        timeout: Duration::from_secs(args.timeout),
        retries: args.retries,
    })
}

pub fn download_config_from_args(args: &DownloadArgs) -> Result<DownloadConfig, AppError> {
    let source = source_config_from_args(&args.source)?;
    let range = parse_range(args.start.as_deref(), args.end.as_deref())?;

    let fx_currencies = match &args.fx_currencies {
        Some(raw) => parse_currency_list(raw)?,
        None => all_currencies(),
    };

    let outputs = OutputPaths {
        output_dir: args.output_dir.clone(),
        us_inflation: args.out_us_inflation.clone(),
        us_rates: args.out_us_rates.clone(),
        euribor: args.out_euribor.clone(),
        fx: args.out_fx.clone(),
        hicp_agg: args.out_hicp_agg.clone(),
        hicp_sector_country: args.out_hicp_sector_country.clone(),
        hicp_sector_sector: args.out_hicp_sector_sector.clone(),
    };

    let mut plans = build_plans(&args.run.datasets(), &outputs, &fx_currencies);
    if !args.series.is_empty() {
        let registry = SeriesRegistry::new(source.measure);
        plans = restrict_to_series(plans, &args.series, &registry)?;
    }

    Ok(DownloadConfig {
        range,
        plans,
        overwrite: !args.no_overwrite,
        preview: args.preview,
        verbose: args.verbose,
        source,
    })
}

pub fn dash_config_from_args(args: &DashArgs) -> Result<DashConfig, AppError> {
    let source = source_config_from_args(&args.source)?;
    let range = parse_range(Some(&args.start), args.end.as_deref())?;

    let registry = SeriesRegistry::new(source.measure);
    let mut series: Vec<String> = Vec::new();
    for key in &args.series {
        let canonical = registry.lookup(key)?.key;
        if !series.contains(&canonical) {
            series.push(canonical);
        }
    }

    Ok(DashConfig {
        range,
        series,
        export_path: args.export.clone(),
        source,
    })
}

/// Parse optional `--start` / `--end` bounds into a validated range.
pub fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, AppError> {
    let start = start
        .map(|s| parse_date_bound(s, BoundKind::Start))
        .transpose()
        .map_err(AppError::config)?;
    let end = end
        .map(|s| parse_date_bound(s, BoundKind::End))
        .transpose()
        .map_err(AppError::config)?;
    DateRange::new(start, end).map_err(AppError::config)
}
