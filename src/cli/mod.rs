//! Command-line parsing for the growth forecaster.
//!
//! Argument parsing and command dispatch stay separate from the curve math and
//! the forecast loop; `app` turns these structs into a `ForecastConfig`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::limiter::DEFAULT_RATE_LIMIT;
use crate::domain::{Anchor, CurveKind, DEFAULT_SAFETY_HORIZON, FishType, PoolType};
use crate::math::DEFAULT_DAYS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "grow", version, about = "Fish growth backfill and autoregressive forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast daily weights until the target weight is reached.
    Forecast(ForecastArgs),
    /// Run up to 10 forecast requests from a `{"requests": [...]}` file.
    Batch(BatchArgs),
    /// Build a daily history between known weighings.
    Backfill(BackfillArgs),
    /// Evaluate one interpolation curve between two weights.
    Interpolate(InterpolateArgs),
}

/// Model and run limits shared by `forecast` and `batch`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Linear-readout model JSON.
    #[arg(long, env = "GROWTH_MODEL", value_name = "JSON")]
    pub model: PathBuf,

    /// Stop after this many forecast days.
    #[arg(long, env = "GROWTH_HORIZON", default_value_t = DEFAULT_SAFETY_HORIZON)]
    pub horizon: usize,

    /// Accept a horizon above the default safety bound.
    #[arg(long)]
    pub allow_long_horizon: bool,

    /// Requests per client per hour.
    #[arg(long, env = "GROWTH_RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Forecast request JSON (`target_weight`, `fish_type`, `sequence`).
    #[arg(long, value_name = "JSON", required_unless_present = "sequence_csv", conflicts_with = "sequence_csv")]
    pub request: Option<PathBuf>,

    /// Seed history CSV; use together with `--target-weight`.
    #[arg(long, value_name = "CSV", requires = "target_weight")]
    pub sequence_csv: Option<PathBuf>,

    /// Target weight (kg) for `--sequence-csv`.
    #[arg(long)]
    pub target_weight: Option<f64>,

    /// Species used for the target ceiling with `--sequence-csv`.
    #[arg(long, value_enum)]
    pub fish_type: Option<FishType>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Render an ASCII plot of history and forecast.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export predictions to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export the full response to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Batch JSON: `{"requests": [...]}`.
    #[arg(long, value_name = "JSON")]
    pub requests: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,

    /// Export the batch response to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BackfillArgs {
    /// Weight at stocking (kg); becomes every record's `start_weight`.
    #[arg(long)]
    pub initial_weight: f64,

    /// Weight (kg) measured on `--start-date`.
    #[arg(long)]
    pub start_weight: f64,

    /// Weight (kg) measured on `--end-date`.
    #[arg(long)]
    pub end_weight: f64,

    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    pub end_date: NaiveDate,

    /// Records above this weight are not emitted. Also the logistic asymptote.
    #[arg(long)]
    pub target_weight: f64,

    #[arg(long, value_enum)]
    pub fish_type: FishType,

    #[arg(long, value_enum, default_value_t = PoolType::Earthen)]
    pub pool_type: PoolType,

    #[arg(long)]
    pub week_age: u32,

    /// Extra interior weighing as `DATE=WEIGHT`; repeat for more.
    #[arg(long = "anchor", value_name = "DATE=WEIGHT", value_parser = parse_anchor)]
    pub anchors: Vec<Anchor>,

    /// Write the records to CSV (readable by `forecast --sequence-csv`).
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Render an ASCII plot of the backfilled weights.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct InterpolateArgs {
    /// Curve family (`linear`, `exponential` or `logistic`).
    #[arg(long, value_enum)]
    pub curve: CurveKind,

    /// Start weight.
    #[arg(long)]
    pub from: f64,

    /// End weight.
    #[arg(long)]
    pub to: f64,

    /// Number of steps; the output has `days + 1` values.
    #[arg(long, default_value_t = DEFAULT_DAYS)]
    pub days: usize,

    /// Logistic asymptote K.
    #[arg(long)]
    pub asymptote: Option<f64>,
}

/// Parse `2024-03-08=0.31`.
pub fn parse_anchor(s: &str) -> Result<Anchor, String> {
    let (date, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DATE=WEIGHT, got '{s}'"))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid anchor date '{date}': {e}"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|e| format!("invalid anchor weight '{weight}': {e}"))?;
    Ok(Anchor { date, weight })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_parse() {
        let a = parse_anchor("2024-03-08=0.31").unwrap();
        assert_eq!(a.date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(a.weight, 0.31);
        assert!(parse_anchor("2024-03-08").is_err());
        assert!(parse_anchor("03/08/2024=1").is_err());
    }

    #[test]
    fn backfill_args_with_repeated_anchors() {
        let cli = Cli::try_parse_from([
            "grow",
            "backfill",
            "--initial-weight",
            "0.05",
            "--start-weight",
            "0.2",
            "--end-weight",
            "0.5",
            "--start-date",
            "2024-03-01",
            "--end-date",
            "2024-03-15",
            "--target-weight",
            "1.0",
            "--fish-type",
            "nila-merah",
            "--week-age",
            "8",
            "--anchor",
            "2024-03-05=0.3",
            "--anchor",
            "2024-03-10=0.4",
        ])
        .unwrap();
        let Command::Backfill(args) = cli.command else {
            panic!("expected backfill");
        };
        assert_eq!(args.fish_type, FishType::NilaMerah);
        assert_eq!(args.pool_type, PoolType::Earthen);
        assert_eq!(args.anchors.len(), 2);
        assert!(!args.plot);
        assert_eq!((args.width, args.height), (80, 20));
    }

    #[test]
    fn forecast_needs_a_source() {
        assert!(Cli::try_parse_from(["grow", "forecast", "--model", "m.json"]).is_err());
        assert!(
            Cli::try_parse_from(["grow", "forecast", "--model", "m.json", "--sequence-csv", "s.csv"]).is_err()
        );
        let cli = Cli::try_parse_from([
            "grow",
            "forecast",
            "--model",
            "m.json",
            "--sequence-csv",
            "s.csv",
            "--target-weight",
            "1.2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Forecast(_)));
    }
}
