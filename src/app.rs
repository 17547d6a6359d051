//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - resolves the run configuration
//! - runs the download pipeline or the dashboard
//! - prints previews and the run summary

use clap::Parser;

use crate::cli::{Command, DashArgs, DownloadArgs, ListArgs};
use crate::config::{dash_config_from_args, download_config_from_args};
use crate::data::{Endpoints, FallbackStore, HttpFetcher, SeriesRegistry};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{Pipeline, DEFAULT_RETRY_PAUSE};

/// Entry point for the `econ` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry FRED_API_KEY; it must be loaded before clap reads env vars.
    let _ = dotenvy::dotenv();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Download(args) => handle_download(args),
        Command::Dash(args) => handle_dash(args),
        Command::List(args) => handle_list(args),
    }
}

fn handle_download(args: DownloadArgs) -> Result<(), AppError> {
    let config = download_config_from_args(&args)?;
    crate::logging::init(config.verbose);

    let registry = SeriesRegistry::new(config.source.measure);
    let fetcher = HttpFetcher::new(
        Endpoints::default(),
        config.source.fred_api_key.clone(),
        config.source.timeout,
    )?;
    println!(
        "{}",
        crate::report::format_run_header(&config.range, &registry, fetcher.has_fred_api_key())
    );

    let pipeline = Pipeline::new(registry, fetcher, FallbackStore::bundled())
        .with_retries(config.source.retries, DEFAULT_RETRY_PAUSE);
    let output = pipeline.run_download(&config.plans, &config.range, config.overwrite)?;

    for preview in &output.previews {
        println!("{}", crate::report::format_preview(preview, config.preview));
    }
    print!("{}", crate::report::format_run_summary(&output.report));

    Ok(())
}

fn handle_dash(args: DashArgs) -> Result<(), AppError> {
    let config = dash_config_from_args(&args)?;
    crate::logging::init_for_dashboard();
    crate::tui::run(config)
}

fn handle_list(args: ListArgs) -> Result<(), AppError> {
    print!("{}", crate::report::format_series_list(&SeriesRegistry::new(args.measure)));
    Ok(())
}

/// Rewrite argv so `econ` defaults to `econ download`.
///
/// Rules:
/// - `econ`                         -> `econ download`
/// - `econ --run fx ...`            -> `econ download --run fx ...`
/// - `econ --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("download".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "download" | "dash" | "list");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "download flags".
    if arg1.starts_with('-') {
        argv.insert(1, "download".to_string());
        return argv;
    }

    argv
}
