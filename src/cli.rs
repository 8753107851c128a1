//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_sink::TracingSink;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_basket, configured_codes, BACKTEST_SECTION,
};
use crate::domain::driver::SeasonalStrategy;
use crate::domain::error::SeasonalError;
use crate::domain::indicator::wad::calculate_wad;
use crate::domain::metrics::{CodeResult, Metrics};
use crate::domain::strategy::SeasonalConfig;
use crate::domain::trade_window::TradeWindow;
use crate::domain::universe::{load_basket_data, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "seasontrader", about = "Seasonal WAD strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Restrict the run to these codes (comma-separated)
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print each symbol's trade window for a year
    Windows {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        year: i32,
    },
    /// Print the WAD series for one symbol
    Wad {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Show the stored data range for the configured symbols
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            codes,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, codes.as_deref())
            } else {
                run_backtest(&config, data_dir.as_deref(), codes.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Windows { config, year } => run_windows(&config, year),
        Command::Wad {
            config,
            code,
            data_dir,
        } => run_wad(&config, &code, data_dir.as_deref()),
        Command::Info { config, data_dir } => run_info(&config, data_dir.as_deref()),
    }
}

fn fail(err: &SeasonalError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SeasonalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })
}

/// Codes to run: the override list when given, otherwise the configured
/// basket. An override code must still have its own config section.
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, SeasonalError> {
    match code_override {
        Some(list) => Ok(parse_codes(list)?),
        None => configured_codes(config),
    }
}

/// `--data-dir` wins; otherwise `[backtest] data_dir`, resolved against the
/// config file's directory when relative.
pub fn resolve_data_dir(
    data_dir_override: Option<&Path>,
    config: &dyn ConfigPort,
    config_path: &Path,
) -> PathBuf {
    if let Some(dir) = data_dir_override {
        return dir.to_path_buf();
    }
    let configured = config
        .get_string(BACKTEST_SECTION, "data_dir")
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if configured.is_relative() {
        if let Some(parent) = config_path.parent() {
            return parent.join(configured);
        }
    }
    configured
}

fn load_basket(
    config: &dyn ConfigPort,
    code_override: Option<&str>,
) -> Result<(BacktestConfig, Vec<SeasonalConfig>), SeasonalError> {
    let bt_config = build_backtest_config(config)?;
    let codes = resolve_codes(code_override, config)?;
    let basket = build_basket(config, &codes)?;
    Ok((bt_config, basket))
}

fn run_backtest(
    config_path: &Path,
    data_dir_override: Option<&Path>,
    code_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (bt_config, basket) = match load_basket(&adapter, code_override) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };

    let data_dir = resolve_data_dir(data_dir_override, &adapter, config_path);
    eprintln!("Reading bars from {}", data_dir.display());
    let data_port = CsvAdapter::new(data_dir);

    match run_backtest_pipeline(&data_port, basket, &bt_config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

/// Load data, run the strategy and print the summary.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    basket: Vec<SeasonalConfig>,
    bt_config: &BacktestConfig,
) -> Result<BacktestResult, SeasonalError> {
    let codes: Vec<String> = basket.iter().map(|c| c.code.clone()).collect();
    eprintln!("Loading {} codes...", codes.len());
    let loaded = load_basket_data(
        data_port,
        &codes,
        bt_config.start_date,
        bt_config.end_date,
    )?;
    for cd in &loaded.data {
        eprintln!("  {}: {} bars", cd.code, cd.bar_count());
    }
    for skipped in &loaded.skipped {
        eprintln!("  warning: skipping {} ({:?})", skipped.code, skipped.reason);
    }

    // Skipped codes keep their slot and allocation share; they never see a bar.
    let mut strategy = SeasonalStrategy::new(basket);

    eprintln!(
        "Running backtest: {} codes, {} to {}",
        loaded.data.len(),
        bt_config.start_date,
        bt_config.end_date,
    );

    let mut sink = TracingSink;
    let result = backtest_engine::run_backtest(&loaded.data, &mut strategy, bt_config, &mut sink);

    let metrics = Metrics::compute(&result.portfolio);
    let code_results = CodeResult::compute_per_code(&result.portfolio.closed_trades);
    info!(
        total_return = metrics.total_return,
        max_drawdown = metrics.max_drawdown,
        trades = metrics.trades.total(),
        "run summary"
    );
    print_summary(&result, &metrics, &code_results);

    Ok(result)
}

fn print_summary(result: &BacktestResult, metrics: &Metrics, code_results: &[CodeResult]) {
    let trades = &metrics.trades;
    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Trading Days:     {}", result.days);
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("DD Duration:      {} days", metrics.max_drawdown_duration);
    eprintln!("Total Trades:     {}", trades.total());
    eprintln!("Win Rate:         {:.1}%", trades.win_rate() * 100.0);
    eprintln!("Profit Factor:    {:.2}", trades.profit_factor());
    eprintln!("Avg Win:          {:.2}", trades.avg_win());
    eprintln!("Avg Loss:         {:.2}", trades.avg_loss());
    eprintln!("Avg Holding:      {:.1} days", trades.avg_holding_days());
    eprintln!("Open Positions:   {}", result.portfolio.position_count());

    if !code_results.is_empty() {
        eprintln!("\n=== Per-Code Summary ===");
        for cr in code_results {
            let pnl = cr.stats.net_pnl();
            let pnl_sign = if pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {}${:.0}",
                cr.code,
                cr.stats.total(),
                cr.stats.win_rate() * 100.0,
                pnl_sign,
                pnl,
            );
        }
    }
}

/// Validate the config and the basket a real run would trade, without
/// touching any bar data.
pub fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (bt_config, basket) = match load_basket(&adapter, code_override) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");

    eprintln!("\nBacktest:");
    eprintln!("  period:  {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  capital: {:.2}", bt_config.initial_capital);
    eprintln!(
        "  allocation per entry: {:.2}%",
        100.0 / basket.len() as f64
    );

    eprintln!("\nBasket:");
    for symbol in &basket {
        eprintln!(
            "  {}: buy {} sell {} profit {:.2}",
            symbol.code, symbol.buy, symbol.sell, symbol.profit_threshold
        );
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match load_basket(&adapter, None) {
        Ok((_, basket)) => {
            let wrapping = basket.iter().filter(|c| c.wraps_year()).count();
            eprintln!(
                "{} symbols configured, {} holding across a year end",
                basket.len(),
                wrapping
            );
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_windows(config_path: &Path, year: i32) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let (_, basket) = match load_basket(&adapter, None) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };

    println!("code,buy_start,buy_date,buy_end,sell_date");
    for symbol in &basket {
        match TradeWindow::for_cycle(symbol, year) {
            Some(w) => println!(
                "{},{},{},{},{}",
                symbol.code, w.buy_start, w.buy_date, w.buy_end, w.sell_date
            ),
            None => eprintln!("warning: {} has no window in {}", symbol.code, year),
        }
    }
    ExitCode::SUCCESS
}

fn run_wad(config_path: &Path, code: &str, data_dir_override: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let code = code.trim().to_uppercase();
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir_override, &adapter, config_path));
    let bars = match data_port.fetch_ohlcv(&code, bt_config.start_date, bt_config.end_date) {
        Ok(bars) if bars.is_empty() => return fail(&SeasonalError::NoData { code }),
        Ok(bars) => bars,
        Err(e) => return fail(&e),
    };

    let series = calculate_wad(&bars);
    println!("date,close,wad");
    let closes = bars.iter().filter(|b| b.has_close());
    for (bar, point) in closes.zip(&series.values) {
        if point.valid {
            println!("{},{:.4},{:.4}", point.date, bar.close, point.value);
        }
    }
    if let Some(last) = series.last_valid() {
        eprintln!("{}: {} bars, last {} {:.4}", code, bars.len(), series.indicator_type, last);
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, data_dir_override: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let codes = match configured_codes(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(resolve_data_dir(data_dir_override, &adapter, config_path));
    let mut first_error = None;
    for code in &codes {
        match data_port.get_data_range(code) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", code, count, first, last)
            }
            Ok(None) => eprintln!("{}: no data found", code),
            Err(e) => {
                eprintln!("error reading {}: {}", code, e);
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => (&e).into(),
        None => ExitCode::SUCCESS,
    }
}
