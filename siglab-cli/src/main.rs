//! SigLab CLI: signal generation, history and simulation commands.
//!
//! Commands:
//! - `generate`: incremental signal run over `{data_dir}/{TICKER}.csv`
//! - `list`: most recent stored signals for a ticker
//! - `compare`: fixed vs adaptive threshold counts over one CSV
//! - `simulate`: write a seeded simulated bar CSV

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use siglab_core::data::parse_timestamp;
use siglab_core::{Emission, SignalEngine, SignalHistory, SignalType};
use siglab_runner::{
    compare_policies, csv_path, load_csv, run_batch, write_csv, BarSimulator, BatchReport,
    CsvDirSource, JsonlSignalStore, SiglabConfig, TickerOutcome,
};

#[derive(Parser)]
#[command(
    name = "siglab",
    about = "SigLab CLI: moving-average crossover signal engine"
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate signals for new bars and append them to the store.
    Generate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `{TICKER}.csv` bar files (overrides config).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Signal store root (overrides config).
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Emit fixed, adaptive or both signal types (overrides config).
        #[arg(long, value_parser = parse_emission)]
        emission: Option<Emission>,

        /// Print the batch report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Tickers to process (defaults to the config's list).
        tickers: Vec<String>,
    },
    /// Show the most recent stored signals for a ticker.
    List {
        #[arg(long)]
        ticker: String,

        /// ma_fixed or ma_dynamic.
        #[arg(long, default_value = "ma_dynamic", value_parser = parse_signal_type)]
        signal_type: SignalType,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Signal store root. Defaults to ./data/signals.
        #[arg(long, default_value = "data/signals")]
        store_dir: PathBuf,
    },
    /// Compare fixed and adaptive thresholds over one bar file.
    Compare {
        /// Bar CSV file.
        #[arg(long)]
        csv: PathBuf,

        #[arg(long)]
        ticker: String,

        /// Path to a TOML config file for engine parameters.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write simulated bars to a CSV file.
    Simulate {
        #[arg(long)]
        ticker: String,

        #[arg(long, default_value_t = 200)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 100.0)]
        base_price: f64,

        /// Per-bar move as a fraction of price, in [0, 1).
        #[arg(long, default_value_t = 0.01)]
        volatility: f64,

        /// First bar timestamp. Defaults to now minus `bars` intervals.
        #[arg(long)]
        start: Option<String>,

        /// Output CSV path. Defaults to ./data/bars/{TICKER}.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_emission(s: &str) -> Result<Emission, String> {
    match s {
        "fixed" => Ok(Emission::Fixed),
        "adaptive" => Ok(Emission::Adaptive),
        "both" => Ok(Emission::Both),
        other => Err(format!("unknown emission '{other}' (fixed, adaptive, both)")),
    }
}

fn parse_signal_type(s: &str) -> Result<SignalType, String> {
    SignalType::parse(s).ok_or_else(|| format!("unknown signal type '{s}' (ma_fixed, ma_dynamic)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Generate {
            config,
            data_dir,
            store_dir,
            emission,
            json,
            tickers,
        } => run_generate(config, data_dir, store_dir, emission, json, tickers),
        Commands::List {
            ticker,
            signal_type,
            limit,
            store_dir,
        } => run_list(&ticker, signal_type, limit, store_dir),
        Commands::Compare {
            csv,
            ticker,
            config,
        } => run_compare(csv, &ticker, config),
        Commands::Simulate {
            ticker,
            bars,
            seed,
            base_price,
            volatility,
            start,
            out,
        } => run_simulate(&ticker, bars, seed, base_price, volatility, start, out),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SiglabConfig> {
    match path {
        Some(p) => {
            let config = SiglabConfig::from_file(&p)
                .with_context(|| format!("loading config {}", p.display()))?;
            info!(path = %p.display(), fingerprint = %config.engine.fingerprint(), "config loaded");
            Ok(config)
        }
        None => Ok(SiglabConfig::default()),
    }
}

fn run_generate(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    emission: Option<Emission>,
    json: bool,
    tickers: Vec<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = data_dir {
        config.data.data_dir = dir;
    }
    if let Some(dir) = store_dir {
        config.data.store_dir = dir;
    }
    if let Some(e) = emission {
        config.engine.emission = e;
    }
    if !tickers.is_empty() {
        config.tickers = tickers;
    }

    let tickers = config.normalized_tickers();
    if tickers.is_empty() {
        bail!("no tickers given (pass them as arguments or set `tickers` in the config)");
    }

    let source = CsvDirSource::new(&config.data.data_dir);
    let report = run_batch(&config, &tickers, &source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("config {}", &report.config_fingerprint[..12]);
    for outcome in &report.tickers {
        match outcome {
            TickerOutcome::Ok(r) => {
                for st in &r.signal_types {
                    let status = if st.up_to_date {
                        "up to date".to_string()
                    } else {
                        format!(
                            "{} new (BUY {} / SELL {} / STAY {})",
                            st.new_signals, st.counts.buy, st.counts.sell, st.counts.stay
                        )
                    };
                    println!(
                        "{:<8} {:<10} {:>5} bars  {}  latest: {}",
                        r.ticker,
                        st.signal_type.as_str(),
                        r.bars,
                        status,
                        st.latest.as_deref().unwrap_or("-")
                    );
                }
                for w in &r.warnings {
                    println!("{:<8} warning: {w}", r.ticker);
                }
            }
            TickerOutcome::Failed(f) => println!("{:<8} FAILED: {}", f.ticker, f.error),
        }
    }
}

fn run_list(
    ticker: &str,
    signal_type: SignalType,
    limit: usize,
    store_dir: PathBuf,
) -> Result<()> {
    let store = JsonlSignalStore::new(store_dir);
    let ticker = ticker.trim().to_uppercase();
    let signals = store.recent(&ticker, signal_type, limit)?;
    if signals.is_empty() {
        println!("no {signal_type} signals stored for {ticker}");
        return Ok(());
    }
    for s in signals {
        println!(
            "{}  {:<4}  conf {:.4}  thr {:.4}  {}",
            s.timestamp.format("%Y-%m-%d %H:%M"),
            s.signal.as_str(),
            s.confidence,
            s.threshold_used,
            s.reasoning
        );
    }
    Ok(())
}

fn run_compare(csv: PathBuf, ticker: &str, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = SignalEngine::new(config.engine)?;
    let series = load_csv(&csv, &ticker.trim().to_uppercase())?;
    let cmp = compare_policies(&series, &engine);

    println!("{} ({} bars)", cmp.ticker, cmp.bars);
    println!(
        "  fixed     BUY {:>5}  SELL {:>5}  STAY {:>5}  mean threshold {:.4}",
        cmp.fixed.buy, cmp.fixed.sell, cmp.fixed.stay, cmp.mean_fixed_threshold
    );
    println!(
        "  adaptive  BUY {:>5}  SELL {:>5}  STAY {:>5}  mean threshold {:.4}",
        cmp.adaptive.buy, cmp.adaptive.sell, cmp.adaptive.stay, cmp.mean_adaptive_threshold
    );
    println!("  disagreements: {}", cmp.disagreements);
    Ok(())
}

fn run_simulate(
    ticker: &str,
    bars: usize,
    seed: u64,
    base_price: f64,
    volatility: f64,
    start: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let sim = BarSimulator {
        base_price,
        volatility,
        ..Default::default()
    };
    sim.validate()?;
    let start: NaiveDateTime = match start {
        Some(s) => parse_timestamp(&s).with_context(|| format!("invalid --start '{s}'"))?,
        None => sim
            .span(bars)
            .and_then(|span| Utc::now().naive_utc().checked_sub_signed(span))
            .with_context(|| format!("--bars {bars} is too many to end at the current time"))?,
    };

    let ticker = ticker.trim().to_uppercase();
    let out = match out {
        Some(path) => path,
        None => csv_path(Path::new("data/bars"), &ticker)?,
    };
    let generated = sim.generate(start, bars, seed)?;
    write_csv(&out, &generated).with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {} bars for {ticker} to {}", generated.len(), out.display());
    Ok(())
}
