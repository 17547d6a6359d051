//! Dataset catalogue: which series go into which output file.

use std::path::{Path, PathBuf};

use crate::data::registry::{fx_key, hicp_key, SeriesRegistry, CURRENCIES, EURO_AREA_CODES, SECTORS};
use crate::domain::{DatasetKind, DateRange};
use crate::error::AppError;

/// Months of extra history fetched so the YoY column starts populated.
pub const YOY_PERIODS: usize = 12;

/// One series inside a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub key: String,
    pub column: String,
    /// (sector label, geo) for HICP panel members.
    pub cell: Option<(String, String)>,
}

/// How a dataset's series become output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// `date` + one column per member.
    Wide { path: PathBuf },
    /// `date, cpi_index, cpi_yoy_pct` from the single CPI member.
    Inflation { path: PathBuf },
    /// Long HICP records pivoted two ways.
    HicpPanels { by_country: PathBuf, by_sector: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    pub kind: DatasetKind,
    pub members: Vec<Member>,
    pub layout: Layout,
    /// Decimals written per value.
    pub precision: usize,
}

impl DatasetPlan {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn outputs(&self) -> Vec<&Path> {
        match &self.layout {
            Layout::Wide { path } | Layout::Inflation { path } => vec![path.as_path()],
            Layout::HicpPanels { by_country, by_sector } => {
                vec![by_country.as_path(), by_sector.as_path()]
            }
        }
    }

    /// Window to request upstream for a run over `range`.
    pub fn fetch_range(&self, range: &DateRange) -> DateRange {
        match self.layout {
            Layout::Inflation { .. } => range.extend_back(YOY_PERIODS as u32),
            _ => *range,
        }
    }
}

/// Output locations; `None` means `<output_dir>/<default name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub output_dir: PathBuf,
    pub us_inflation: Option<PathBuf>,
    pub us_rates: Option<PathBuf>,
    pub euribor: Option<PathBuf>,
    pub fx: Option<PathBuf>,
    pub hicp_agg: Option<PathBuf>,
    pub hicp_sector_country: Option<PathBuf>,
    pub hicp_sector_sector: Option<PathBuf>,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::in_dir("data")
    }
}

impl OutputPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            us_inflation: None,
            us_rates: None,
            euribor: None,
            fx: None,
            hicp_agg: None,
            hicp_sector_country: None,
            hicp_sector_sector: None,
        }
    }

    fn resolve(&self, over: &Option<PathBuf>, default_name: &str) -> PathBuf {
        match over {
            Some(p) if p.is_absolute() || p.parent().is_some_and(|d| !d.as_os_str().is_empty()) => {
                p.clone()
            }
            Some(p) => self.output_dir.join(p),
            None => self.output_dir.join(default_name),
        }
    }
}

/// Build the plans for `kinds` (deduplicated, catalogue order kept).
pub fn build_plans(kinds: &[DatasetKind], outputs: &OutputPaths, fx_currencies: &[String]) -> Vec<DatasetPlan> {
    let mut seen = Vec::new();
    let mut plans = Vec::new();
    for kind in kinds {
        if seen.contains(kind) {
            continue;
        }
        seen.push(*kind);
        plans.push(plan_for(*kind, outputs, fx_currencies));
    }
    plans
}

fn plan_for(kind: DatasetKind, outputs: &OutputPaths, fx_currencies: &[String]) -> DatasetPlan {
    let plain = |key: &str| Member {
        key: key.to_string(),
        column: key.to_string(),
        cell: None,
    };

    match kind {
        DatasetKind::UsInflation => DatasetPlan {
            kind,
            members: vec![plain("us_cpi")],
            layout: Layout::Inflation {
                path: outputs.resolve(&outputs.us_inflation, "us_inflation.csv"),
            },
            precision: 6,
        },
        DatasetKind::UsRates => DatasetPlan {
            kind,
            members: ["fed_funds", "t_bill_3m", "t_bill_6m"].into_iter().map(plain).collect(),
            layout: Layout::Wide {
                path: outputs.resolve(&outputs.us_rates, "us_interest_rates.csv"),
            },
            precision: 6,
        },
        DatasetKind::Euribor => DatasetPlan {
            kind,
            members: ["euribor_3m", "euribor_6m", "euribor_12m"].into_iter().map(plain).collect(),
            layout: Layout::Wide {
                path: outputs.resolve(&outputs.euribor, "euribor_3m_6m_12m_ecb.csv"),
            },
            precision: 6,
        },
        DatasetKind::Fx => DatasetPlan {
            kind,
            members: fx_currencies
                .iter()
                .map(|cur| Member {
                    key: fx_key(cur),
                    column: cur.clone(),
                    cell: None,
                })
                .collect(),
            layout: Layout::Wide {
                path: outputs.resolve(&outputs.fx, "fx_daily_ecb.csv"),
            },
            precision: 6,
        },
        DatasetKind::HicpAgg => DatasetPlan {
            kind,
            members: EURO_AREA_CODES
                .iter()
                .map(|geo| Member {
                    key: hicp_key(geo, None),
                    column: geo.to_string(),
                    cell: None,
                })
                .collect(),
            layout: Layout::Wide {
                path: outputs.resolve(&outputs.hicp_agg, "hicp_all_items_by_country.csv"),
            },
            precision: 4,
        },
        DatasetKind::HicpSector => DatasetPlan {
            kind,
            members: SECTORS
                .iter()
                .flat_map(|(suffix, label, _)| {
                    EURO_AREA_CODES.iter().map(move |geo| Member {
                        key: hicp_key(geo, Some(suffix)),
                        column: format!("{label}/{geo}"),
                        cell: Some((label.to_string(), geo.to_string())),
                    })
                })
                .collect(),
            layout: Layout::HicpPanels {
                by_country: outputs
                    .resolve(&outputs.hicp_sector_country, "hicp_sectors_filterbyCountry.csv"),
                by_sector: outputs
                    .resolve(&outputs.hicp_sector_sector, "hicp_sectors_filterbySector.csv"),
            },
            precision: 4,
        },
    }
}

/// Parse `--fx-currencies` (comma separated, case-insensitive).
pub fn parse_currency_list(raw: &str) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let code = part.trim().to_ascii_uppercase();
        if code.is_empty() {
            continue;
        }
        if !CURRENCIES.contains(&code.as_str()) {
            return Err(AppError::config(format!(
                "Unknown currency '{code}'. Supported: {}",
                CURRENCIES.join(",")
            )));
        }
        if !out.contains(&code) {
            out.push(code);
        }
    }
    if out.is_empty() {
        return Err(AppError::config("--fx-currencies must list at least one currency"));
    }
    Ok(out)
}

pub fn all_currencies() -> Vec<String> {
    CURRENCIES.iter().map(|c| c.to_string()).collect()
}

/// Keep only the members named in `keys`.
///
/// Every key must resolve in the registry and belong to one of `plans`;
/// plans left without members are dropped.
pub fn restrict_to_series(
    plans: Vec<DatasetPlan>,
    keys: &[String],
    registry: &SeriesRegistry,
) -> Result<Vec<DatasetPlan>, AppError> {
    let mut wanted = Vec::with_capacity(keys.len());
    for key in keys {
        wanted.push(registry.lookup(key)?.key);
    }

    for key in &wanted {
        let selected = plans.iter().any(|p| p.members.iter().any(|m| &m.key == key));
        if !selected {
            return Err(AppError::config(format!(
                "Series '{key}' is not part of the selected --run group(s)"
            )));
        }
    }

    Ok(plans
        .into_iter()
        .filter_map(|mut plan| {
            plan.members.retain(|m| wanted.contains(&m.key));
            (!plan.members.is_empty()).then_some(plan)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunGroup;

    fn plans(group: RunGroup) -> Vec<DatasetPlan> {
        build_plans(&group.datasets(), &OutputPaths::in_dir("out"), &all_currencies())
    }

    #[test]
    fn every_member_resolves_in_the_registry() {
        let registry = SeriesRegistry::default();
        for plan in plans(RunGroup::All) {
            for m in &plan.members {
                registry
                    .lookup(&m.key)
                    .unwrap_or_else(|e| panic!("{}: {e}", plan.name()));
            }
        }
    }

    #[test]
    fn default_file_names_land_in_output_dir() {
        let all = plans(RunGroup::All);
        let files: Vec<_> = all.iter().flat_map(|p| p.outputs()).map(|p| p.to_path_buf()).collect();
        assert_eq!(
            files,
            [
                "us_inflation.csv",
                "us_interest_rates.csv",
                "euribor_3m_6m_12m_ecb.csv",
                "fx_daily_ecb.csv",
                "hicp_all_items_by_country.csv",
                "hicp_sectors_filterbyCountry.csv",
                "hicp_sectors_filterbySector.csv",
            ]
            .map(|f| Path::new("out").join(f))
        );
    }

    #[test]
    fn bare_override_joins_output_dir_but_paths_are_kept() {
        let mut outputs = OutputPaths::in_dir("out");
        outputs.euribor = Some("rates.csv".into());
        outputs.fx = Some(PathBuf::from("elsewhere").join("fx.csv"));
        let p = build_plans(&[DatasetKind::Euribor, DatasetKind::Fx], &outputs, &all_currencies());
        assert_eq!(p[0].outputs(), [Path::new("out").join("rates.csv")]);
        assert_eq!(p[1].outputs(), [PathBuf::from("elsewhere").join("fx.csv")]);
    }

    #[test]
    fn us_group_is_inflation_plus_rates() {
        let us = plans(RunGroup::Us);
        assert_eq!(us.len(), 2);
        assert_eq!(us[0].kind, DatasetKind::UsInflation);
        assert_eq!(us[1].members.len(), 3);
        assert_eq!(us[0].precision, 6);
    }

    #[test]
    fn inflation_fetches_a_year_more_history() {
        let plan = &plans(RunGroup::UsInflation)[0];
        let range = DateRange::new(chrono::NaiveDate::from_ymd_opt(2020, 1, 1), None).unwrap();
        assert_eq!(plan.fetch_range(&range).start, chrono::NaiveDate::from_ymd_opt(2019, 1, 1));
        let rates = &plans(RunGroup::UsRates)[0];
        assert_eq!(rates.fetch_range(&range), range);
    }

    #[test]
    fn hicp_sector_covers_every_sector_and_geo() {
        let plan = &plans(RunGroup::HicpSector)[0];
        assert_eq!(plan.members.len(), SECTORS.len() * EURO_AREA_CODES.len());
        assert_eq!(plan.precision, 4);
        assert_eq!(
            plan.members[0].cell,
            Some(("ALL_ITEMS".to_string(), "U2".to_string()))
        );
    }

    #[test]
    fn currency_list_is_validated() {
        assert_eq!(parse_currency_list("usd, GBP,usd").unwrap(), ["USD", "GBP"]);
        assert_eq!(parse_currency_list("XXX").unwrap_err().exit_code(), 2);
        assert!(parse_currency_list(" , ").is_err());
    }

    #[test]
    fn restrict_keeps_named_members_and_drops_empty_plans() {
        let registry = SeriesRegistry::default();
        let out = restrict_to_series(
            plans(RunGroup::All),
            &["EURIBOR".to_string(), "fx_usd".to_string()],
            &registry,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].members[0].key, "euribor_3m");
        assert_eq!(out[1].members[0].column, "USD");
    }

    #[test]
    fn restrict_rejects_unknown_or_unselected_keys() {
        let registry = SeriesRegistry::default();
        let err = restrict_to_series(plans(RunGroup::Fx), &["bogus".to_string()], &registry)
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = restrict_to_series(plans(RunGroup::Fx), &["fed_funds".to_string()], &registry)
            .unwrap_err();
        assert!(err.to_string().contains("fed_funds"));
    }
}
