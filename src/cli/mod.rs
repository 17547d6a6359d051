//! Command-line parsing for the macro series downloader.
//!
//! Parsing and dispatch stay separate from fetching and export code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Measure, RunGroup};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "econ",
    version,
    about = "Download US (FRED) and euro-area (ECB) macro series to CSV"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the selected datasets and write them as CSV (the default command).
    Download(DownloadArgs),
    /// Launch the interactive dashboard.
    Dash(DashArgs),
    /// Print every known series key.
    List(ListArgs),
}

/// Options shared by every command that touches the network.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// HICP measure: annual rate of change (ANR) or index level (INX).
    #[arg(long, value_enum, ignore_case = true, default_value_t = Measure::Anr)]
    pub measure: Measure,

    /// FRED API key; without one the public fredgraph.csv export is used.
    #[arg(long, env = "FRED_API_KEY", hide_env_values = true)]
    pub fred_api_key: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Extra attempts after a network failure (1 s apart) before falling back.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
}

#[derive(Debug, Args, Clone)]
pub struct DownloadArgs {
    /// Dataset group to download.
    #[arg(long, value_enum, default_value_t = RunGroup::All)]
    pub run: RunGroup,

    /// Start date (YYYY, YYYY-MM or YYYY-MM-DD); defaults to the full history.
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY, YYYY-MM or YYYY-MM-DD); defaults to the latest available.
    #[arg(long)]
    pub end: Option<String>,

    /// Directory for outputs without an explicit path.
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    #[arg(long, value_name = "CSV")]
    pub out_us_inflation: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_us_rates: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_euribor: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_fx: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_hicp_agg: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_hicp_sector_country: Option<PathBuf>,

    #[arg(long, value_name = "CSV")]
    pub out_hicp_sector_sector: Option<PathBuf>,

    /// Comma-separated currency codes for the FX dataset (default: all 20).
    #[arg(long, value_name = "LIST")]
    pub fx_currencies: Option<String>,

    /// Restrict the run to these series keys (see `econ list`).
    #[arg(long, value_name = "KEY", num_args = 1.., value_delimiter = ',')]
    pub series: Vec<String>,

    /// Keep existing output files; datasets whose files all exist are not fetched.
    #[arg(long)]
    pub no_overwrite: bool,

    /// Rows of each written file to print (0 disables the preview).
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    /// Debug-level logging on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DashArgs {
    /// Initial start date (YYYY, YYYY-MM or YYYY-MM-DD).
    #[arg(long, default_value = "2015-01")]
    pub start: String,

    /// Initial end date.
    #[arg(long)]
    pub end: Option<String>,

    /// Series shown at startup.
    #[arg(
        long,
        value_name = "KEY",
        num_args = 1..,
        value_delimiter = ',',
        default_values = ["us_cpi", "fed_funds", "euribor_3m"]
    )]
    pub series: Vec<String>,

    /// Where the `e` key writes the displayed table.
    #[arg(long, value_name = "CSV", default_value = "dashboard_export.csv")]
    pub export: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// HICP measure used for the listed codes.
    #[arg(long, value_enum, ignore_case = true, default_value_t = Measure::Anr)]
    pub measure: Measure,
}
