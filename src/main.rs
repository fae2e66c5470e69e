//! INVEST — scheduled moving-average crossover bot
//!
//! Entry point. Runs exactly one cycle per invocation (an external
//! scheduler calls it every few hours): loads configuration, initialises
//! structured logging, loads the watch-list and pot, evaluates every coin,
//! and writes the pot back. Any failure before the cycle finishes aborts
//! with a non-zero exit status and leaves the pot file untouched.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, info_span, Instrument};

use invest::config::{self, AppConfig};
use invest::engine::{run_cycle, CycleConfig, CycleReport};
use invest::market::binance::BinanceClient;
use invest::market::MarketData;
use invest::storage::{self, TransactionLog};
use invest::types::InvestError;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = std::env::var("INVEST_CONFIG")
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_FILE.to_string());
    let cfg = AppConfig::load(&config_path)?;

    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("run", run_id = %run_id);
    let result = run(cfg).instrument(span.clone()).await;
    if let Err(err) = &result {
        let fatal = err
            .downcast_ref::<InvestError>()
            .map_or(true, InvestError::is_fatal);
        span.in_scope(|| error!(error = %format!("{err:#}"), fatal, "INVEST run aborted"));
    }
    result
}

async fn run(cfg: AppConfig) -> Result<()> {
    info!(
        watch_list = %cfg.files.watch_list.display(),
        pot = %cfg.files.pot.display(),
        base_currency = %cfg.exchange.base_currency,
        "INVEST starting"
    );

    let credentials = cfg.credentials().context("Exchange credentials missing")?;

    // -- Load state ------------------------------------------------------

    let coins = storage::load_coins(&cfg.files.watch_list)
        .context("Failed to load coin watch-list")?;
    let pot = storage::load_pot(coins, &cfg.files.pot)
        .context("Failed to load pot state")?;

    // -- Evaluate --------------------------------------------------------

    let market = BinanceClient::new(&cfg.exchange, credentials)?;
    let log = TransactionLog::new(&cfg.files.transactions);
    info!(source = market.name(), log = %log.path().display(), "Market source ready");

    let (pot, report) = run_cycle(&market, pot, &CycleConfig::from(&cfg), &log, Utc::now()).await;
    log_cycle_report(&report);

    // -- Persist ---------------------------------------------------------

    storage::save_pot(&pot, &cfg.files.pot).context("Failed to save pot state")?;
    info!(pot = %pot, "INVEST run complete");
    Ok(())
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    for tx in &report.transactions {
        info!(transaction = %tx, "Trade executed");
    }
    info!(
        evaluated = report.coins_evaluated,
        no_data = report.skipped_no_data,
        no_averages = report.skipped_no_averages,
        buys = report.buys,
        sells = report.sells,
        rejected = report.rejected,
        log_failures = report.log_failures,
        pot_before = %report.pot_before,
        pot_after = %report.pot_after,
        "Cycle complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("invest=info"));

    let json_logging = std::env::var("INVEST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
