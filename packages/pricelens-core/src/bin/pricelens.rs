//! Pricelens CLI - compute technical indicators over OHLCV CSV files.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use pricelens_core::{
    io, logging, ApiResponse, EngineConfig, Error, Indicator, IndicatorEngine, PriceTable, Result,
};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pricelens")]
#[command(about = "Technical indicators for daily OHLCV price tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators and save the augmented table
    Compute(ComputeArgs),
    /// Show the first rows of a table
    Preview {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,
        /// Number of rows to show
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },
    /// Write the Date/Close series consumed by an external forecaster
    ForecastInput {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// Configuration file (defaults to ~/.pricelens/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ComputeArgs {
    /// Input CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (defaults to <output-dir>/<input file name>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output folder (overrides the configured one)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (defaults to ~/.pricelens/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only compute these indicators (comma-separated: sma,ema,rsi,stochastic,macd,bollinger)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Include the first N rows of the result in the output
    #[arg(long)]
    preview: Option<usize>,

    #[command(flatten)]
    windows: WindowOverrides,
}

/// Per-parameter overrides applied on top of the configuration.
#[derive(Args, Default)]
struct WindowOverrides {
    /// SMA window
    #[arg(long)]
    sma_window: Option<usize>,
    /// EMA window
    #[arg(long)]
    ema_window: Option<usize>,
    /// RSI window
    #[arg(long)]
    rsi_window: Option<usize>,
    /// Stochastic %K window
    #[arg(long)]
    k_window: Option<usize>,
    /// Stochastic %D window
    #[arg(long)]
    d_window: Option<usize>,
    /// MACD short EMA window
    #[arg(long)]
    macd_short: Option<usize>,
    /// MACD long EMA window
    #[arg(long)]
    macd_long: Option<usize>,
    /// MACD signal window
    #[arg(long)]
    macd_signal: Option<usize>,
    /// Bollinger window
    #[arg(long)]
    bb_window: Option<usize>,
    /// Bollinger standard deviation multiplier
    #[arg(long)]
    bb_std: Option<f64>,
}

impl WindowOverrides {
    fn apply(&self, indicators: &mut [Indicator]) {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        for indicator in indicators {
            match indicator {
                Indicator::Sma { window } => set(window, self.sma_window),
                Indicator::Ema { window } => set(window, self.ema_window),
                Indicator::Rsi { window } => set(window, self.rsi_window),
                Indicator::Stochastic { k_window, d_window } => {
                    set(k_window, self.k_window);
                    set(d_window, self.d_window);
                }
                Indicator::Macd {
                    short_window,
                    long_window,
                    signal_window,
                } => {
                    set(short_window, self.macd_short);
                    set(long_window, self.macd_long);
                    set(signal_window, self.macd_signal);
                }
                Indicator::Bollinger { window, num_std } => {
                    set(window, self.bb_window);
                    set(num_std, self.bb_std);
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging();

    let result = match cli.command {
        Commands::Compute(args) => handle_compute(args),
        Commands::Preview { input, rows } => handle_preview(&input, rows),
        Commands::ForecastInput { input, output } => handle_forecast_input(&input, &output),
        Commands::Config { config } => handle_config(config.as_deref()),
    };

    let status = if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };
    println!("{}", render(result));
    status
}

fn render(result: Result<Value>) -> String {
    let response = match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ApiResponse::err(e.to_string())
        }
    };
    serde_json::to_string_pretty(&response)
        .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() }).to_string())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) if !path.exists() => Err(Error::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => EngineConfig::load_from_path(path),
        None => EngineConfig::load(),
    }
}

fn select(indicators: &mut Vec<Indicator>, only: &[String]) -> Result<()> {
    if only.is_empty() {
        return Ok(());
    }

    let known: Vec<&str> = Indicator::defaults().iter().map(|i| i.name()).collect();
    if let Some(unknown) = only.iter().find(|name| !known.contains(&name.as_str())) {
        return Err(Error::Config(format!(
            "unknown indicator: {}. Available: {}",
            unknown,
            known.join(", ")
        )));
    }

    indicators.retain(|i| only.iter().any(|name| name == i.name()));
    Ok(())
}

fn handle_compute(args: ComputeArgs) -> Result<Value> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    select(&mut config.indicators, &args.only)?;
    args.windows.apply(&mut config.indicators);
    config.validate()?;

    let table = io::read_csv(&args.input)?;
    let output = IndicatorEngine::from_config(&config).run(table)?;

    let path = match args.output {
        Some(path) => path,
        None => config.output_path_for(&args.input)?,
    };
    io::write_csv(&output.table, &path)?;

    let mut data = json!({
        "output": path.display().to_string(),
        "rows": output.table.len(),
        "indicators": config.indicators.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
        "columns": output.table.column_names().collect::<Vec<_>>(),
        "warnings": output.warnings,
    });
    if let Some(rows) = args.preview {
        data["preview"] = table_preview(&output.table.head(rows));
    }
    Ok(data)
}

fn handle_preview(input: &Path, rows: usize) -> Result<Value> {
    let table = io::read_csv(input)?;
    Ok(json!({
        "rows": table.len(),
        "preview": table_preview(&table.head(rows)),
    }))
}

fn handle_forecast_input(input: &Path, output: &Path) -> Result<Value> {
    let table = io::read_csv(input)?;
    let series = table.forecast_input()?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    pricelens_core::forecast::write_forecast_input(&series, BufWriter::new(File::create(output)?))?;

    Ok(json!({
        "output": output.display().to_string(),
        "rows": series.len(),
        "dropped": table.len() - series.len(),
    }))
}

fn handle_config(path: Option<&Path>) -> Result<Value> {
    let config = load_config(path)?;
    let source = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::default_path);
    Ok(json!({
        "source": source.display().to_string(),
        "config": serde_json::to_value(&config)?,
    }))
}

/// Column-oriented JSON view of a table: undefined cells become `null`.
fn table_preview(table: &PriceTable) -> Value {
    let columns: Vec<&str> = std::iter::once("Date").chain(table.column_names()).collect();
    let rows: Vec<Value> = table
        .dates()
        .iter()
        .enumerate()
        .map(|(row, date)| {
            let mut cells = vec![json!(date.format("%Y-%m-%d").to_string())];
            cells.extend(table.columns().iter().map(|c| json!(c.values[row])));
            Value::Array(cells)
        })
        .collect();

    json!({ "columns": columns, "rows": rows })
}
