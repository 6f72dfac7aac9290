//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments into a `ForecastConfig`
//! - dispatches to the shared pipeline, backfill or curve math
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BackfillArgs, BatchArgs, Command, ForecastArgs, InterpolateArgs, RunArgs};
use crate::domain::{BackfillSpec, CurveKind, DEFAULT_SAFETY_HORIZON, ForecastConfig};
use crate::error::AppError;
use crate::forecast::ForecastOptions;

pub mod limiter;
pub mod pipeline;

use limiter::RateLimiter;
use pipeline::{ForecastService, LOCAL_CLIENT};

/// Entry point for the `grow` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Batch(args) => handle_batch(args),
        Command::Backfill(args) => handle_backfill(args),
        Command::Interpolate(args) => handle_interpolate(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GROWTH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config(&args.run);
    let config = ForecastConfig {
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export_csv.clone(),
        export_json: args.export_json.clone(),
        ..config
    };
    let service = build_service(&config)?;

    service.admit(LOCAL_CLIENT)?;
    let request = match (&args.request, &args.sequence_csv, args.target_weight) {
        (Some(path), _, _) => crate::io::load_request(path)?,
        (None, Some(path), Some(target)) => crate::io::request_from_csv(path, target, args.fish_type)?,
        _ => {
            return Err(AppError::validation(
                "provide --request, or --sequence-csv with --target-weight",
            ));
        }
    };

    let output = service.forecast_request(&request)?;
    let response = &output.response;

    println!("{}", crate::report::format_forecast_summary(response, output.run.state));
    println!("{}", crate::report::format_predictions(&response.predictions));

    if config.plot {
        let plot = crate::plot::render_forecast_plot(
            &output.run.seed_window,
            &response.predictions,
            Some(request.target_weight),
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_predictions_csv(path, &response.predictions)?;
        info!(path = %path.display(), "wrote predictions CSV");
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, response)?;
        info!(path = %path.display(), "wrote response JSON");
    }
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = ForecastConfig {
        export_json: args.export_json.clone(),
        ..forecast_config(&args.run)
    };
    let service = build_service(&config)?;

    let requests = crate::io::load_batch(&args.requests)?;
    let batch = service.batch(LOCAL_CLIENT, &requests)?;

    println!("{}", crate::report::format_batch(&batch));
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &batch)?;
        info!(path = %path.display(), "wrote batch JSON");
    }
    Ok(())
}

fn handle_backfill(args: BackfillArgs) -> Result<(), AppError> {
    let spec = BackfillSpec {
        initial_weight: args.initial_weight,
        start_weight: args.start_weight,
        end_weight: args.end_weight,
        start_date: args.start_date,
        end_date: args.end_date,
        target_weight: args.target_weight,
        fish_type: args.fish_type,
        pool_type: args.pool_type,
        week_age: args.week_age,
        anchors: args.anchors,
    };
    let backfill = crate::data::build_sequence(&spec)?;

    println!("{}", crate::report::format_backfill(&backfill));
    if args.plot {
        println!(
            "{}",
            crate::plot::render_series_plot(&backfill.records, args.width, args.height)
        );
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_records_csv(path, &backfill.records)?;
        info!(path = %path.display(), records = backfill.records.len(), "wrote backfill CSV");
    }
    Ok(())
}

fn handle_interpolate(args: InterpolateArgs) -> Result<(), AppError> {
    let values = match args.curve {
        CurveKind::Linear => crate::math::linear(args.from, args.to, args.days)?,
        CurveKind::Exponential => crate::math::exponential(args.from, args.to, args.days)?,
        CurveKind::Logistic => {
            let k = args
                .asymptote
                .ok_or_else(|| AppError::validation("--asymptote is required for the logistic curve"))?;
            crate::math::logistic(args.from, args.to, k, args.days)?
        }
        CurveKind::MonotonicSpline => {
            return Err(AppError::invalid_input(
                "the monotonic spline needs three or more anchors; use `grow backfill --anchor`",
            ));
        }
    };
    print!("{}", crate::report::format_curve(args.curve, &values));
    Ok(())
}

pub fn forecast_config(args: &RunArgs) -> ForecastConfig {
    ForecastConfig {
        model_path: args.model.clone(),
        safety_horizon: args.horizon,
        allow_long_horizon: args.allow_long_horizon,
        rate_limit: args.rate_limit,
        plot: false,
        plot_width: 80,
        plot_height: 20,
        export_csv: None,
        export_json: None,
    }
}

/// Horizon policy: lowering is always allowed, raising needs the override flag.
pub fn forecast_options(config: &ForecastConfig) -> Result<ForecastOptions, AppError> {
    if config.allow_long_horizon && config.safety_horizon > DEFAULT_SAFETY_HORIZON {
        Ok(ForecastOptions::with_horizon_override(config.safety_horizon))
    } else {
        ForecastOptions::with_horizon(config.safety_horizon)
    }
}

fn build_service(config: &ForecastConfig) -> Result<ForecastService, AppError> {
    let options = forecast_options(config)?;
    let loaded = crate::models::load_model(&config.model_path)?;
    let service = ForecastService::from_loaded(loaded, options, RateLimiter::new(config.rate_limit));
    let model_info = service.model_info();
    info!(
        model = %config.model_path.display(),
        model_type = %model_info.model_type,
        schema_version = model_info.schema_version,
        horizon = options.safety_horizon(),
        rate_limit = config.rate_limit,
        "loaded model"
    );
    Ok(service)
}
