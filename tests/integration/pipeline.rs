//! Full-pipeline scenarios: watch-list + pot file in, pot file and
//! transaction log out.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};

use invest::engine::{run_cycle, CycleConfig};
use invest::storage::{load_coins, load_pot, save_pot, TransactionLog};
use invest::types::{Holding, InvestError};

use crate::mock_market::MockMarket;

const SETTINGS: &str = "\
# Watched coins: Coin:<ticker>:<weighting>
Coin:BTC:0.5
Coin:ETH:0.3
Coin:DOGE:0.2
";

/// A scratch directory holding the three bot files.
struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(settings: &str, pot: &str) -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("invest_it_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.txt"), settings).unwrap();
        std::fs::write(dir.join("pot.txt"), pot).unwrap();
        Self { dir }
    }

    fn settings(&self) -> PathBuf {
        self.dir.join("settings.txt")
    }

    fn pot(&self) -> PathBuf {
        self.dir.join("pot.txt")
    }

    fn transactions(&self) -> PathBuf {
        self.dir.join("transactions.txt")
    }

    fn log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.transactions())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn cutoff(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 7, day, 12, 0, 0).unwrap()
}

/// The same steps the binary takes for one scheduled run.
async fn run_once(ws: &Workspace, market: &MockMarket, now: DateTime<Utc>) -> Result<(), InvestError> {
    let coins = load_coins(&ws.settings())?;
    let pot = load_pot(coins, &ws.pot())?;
    let log = TransactionLog::new(ws.transactions());
    let (pot, _report) = run_cycle(market, pot, &CycleConfig::default(), &log, now).await;
    save_pot(&pot, &ws.pot())
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_outage_for_one_coin_does_not_stop_the_run() {
    let ws = Workspace::new(
        SETTINGS,
        "Total:1000\nBTC:None:0:12:10:0\nETH:None:0:12:10:0\nDOGE:None:0:0.3:0.2:0\n",
    );
    // BTC crosses below (buy), ETH is unavailable, DOGE stays above (hold).
    let market = MockMarket::new()
        .with_closes("BTC", MockMarket::step(dec!(10), dec!(5)))
        .with_closes("DOGE", MockMarket::step(dec!(0.2), dec!(0.3)));

    run_once(&ws, &market, cutoff(27)).await.unwrap();

    let requested: Vec<_> = market.requests().into_iter().map(|(t, _)| t).collect();
    assert_eq!(requested, ["BTC", "ETH", "DOGE"]);

    let pot = load_pot(load_coins(&ws.settings()).unwrap(), &ws.pot()).unwrap();
    assert_eq!(pot.pot_total, dec!(1000));

    let btc = pot.coin("BTC").unwrap();
    assert_eq!(btc.holding, Holding::Active);
    assert_eq!(btc.purchase_price, dec!(5));
    assert_eq!(btc.coins_purchased, dec!(100));

    let eth = pot.coin("ETH").unwrap();
    assert_eq!(eth.ma7, Some(dec!(12)));
    assert_eq!(eth.ma21, Some(dec!(10)));
    assert!(!eth.is_active());

    let doge = pot.coin("DOGE").unwrap();
    assert_eq!(doge.ma7, Some(dec!(0.3)));
    assert!(!doge.is_active());

    assert_eq!(ws.log_lines(), ["2021/07/27 12:00:00 , BTC , buy , 5 , 100"]);
}

#[tokio::test]
async fn test_buy_then_sell_across_two_runs() {
    let ws = Workspace::new("Coin:BTC:0.5\n", "Total:1000\nBTC:None:0:12:10:0\n");

    let falling = MockMarket::new().with_closes("BTC", MockMarket::step(dec!(10), dec!(5)));
    run_once(&ws, &falling, cutoff(27)).await.unwrap();

    // Next run: short average climbs back above the long one.
    let rising = MockMarket::new().with_closes("BTC", MockMarket::step(dec!(5), dec!(8)));
    run_once(&ws, &rising, cutoff(28)).await.unwrap();

    let pot = load_pot(load_coins(&ws.settings()).unwrap(), &ws.pot()).unwrap();
    // P + (p2 * q - P * w) = 1000 + (8 * 100 - 500)
    assert_eq!(pot.pot_total, dec!(1300));
    let btc = pot.coin("BTC").unwrap();
    assert_eq!(btc.holding, Holding::Inactive);
    assert_eq!(btc.purchase_price, Decimal::ZERO);
    assert_eq!(btc.coins_purchased, Decimal::ZERO);
    assert_eq!(btc.ma7, Some(dec!(8)));

    assert_eq!(
        ws.log_lines(),
        [
            "2021/07/27 12:00:00 , BTC , buy , 5 , 100",
            "2021/07/28 12:00:00 , BTC , sell , 8 , 100",
        ]
    );
}

#[tokio::test]
async fn test_first_run_without_history_only_records_averages() {
    let ws = Workspace::new(SETTINGS, "### fresh pot\nTotal:500\n");
    let market = MockMarket::new()
        .with_closes("BTC", MockMarket::step(dec!(10), dec!(5)))
        .with_closes("ETH", MockMarket::step(dec!(10), dec!(15)))
        .with_closes("DOGE", vec![dec!(0.2); 30]);

    run_once(&ws, &market, cutoff(27)).await.unwrap();

    let text = read(&ws.pot());
    assert!(text.contains("Total:500\n"));
    assert!(text.contains("BTC:None:0:5:"));
    assert!(text.contains("ETH:None:0:15:"));
    assert!(text.contains("DOGE:None:0:0.2:0.2:0\n"));
    assert!(ws.log_lines().is_empty());
}

#[tokio::test]
async fn test_missing_watch_list_aborts_before_writing_pot() {
    let ws = Workspace::new(SETTINGS, "Total:1000\nBTC:None:0:12:10:0\n");
    std::fs::remove_file(ws.settings()).unwrap();
    let before = read(&ws.pot());

    let market = MockMarket::new().with_closes("BTC", MockMarket::step(dec!(10), dec!(5)));
    let err = run_once(&ws, &market, cutoff(27)).await.unwrap_err();

    assert!(matches!(err, InvestError::Io { .. }));
    assert!(err.is_fatal());
    assert!(market.requests().is_empty());
    assert_eq!(read(&ws.pot()), before);
}

#[tokio::test]
async fn test_malformed_pot_aborts_before_writing_pot() {
    let ws = Workspace::new(SETTINGS, "Total:1000\nBTC:Active:oops:1:2:3\n");
    let before = read(&ws.pot());

    let market = MockMarket::new();
    let err = run_once(&ws, &market, cutoff(27)).await.unwrap_err();

    assert!(matches!(err, InvestError::General { line: 2, .. }));
    assert_eq!(read(&ws.pot()), before);
}

#[tokio::test]
async fn test_persisted_pot_reloads_identically() {
    let ws = Workspace::new(
        SETTINGS,
        "Total:1000\nBTC:Active:20000:19000.5:18500.25:0.5\nETH:None:0:None:None:0\n",
    );

    let coins = load_coins(&ws.settings()).unwrap();
    let pot = load_pot(coins.clone(), &ws.pot()).unwrap();
    let btc = pot.coin("BTC").unwrap();
    assert_eq!(btc.holding, Holding::Active);
    assert_eq!(btc.purchase_price, dec!(20000));
    assert_eq!(btc.ma7, Some(dec!(19000.5)));
    assert_eq!(btc.ma21, Some(dec!(18500.25)));
    assert_eq!(btc.coins_purchased, dec!(0.5));

    save_pot(&pot, &ws.pot()).unwrap();
    let reloaded = load_pot(coins, &ws.pot()).unwrap();
    assert_eq!(reloaded, pot);
}

#[tokio::test]
async fn test_bars_are_requested_up_to_the_cutoff() {
    let ws = Workspace::new(SETTINGS, "Total:1000\n");
    let market = MockMarket::new().with_closes("BTC", vec![dec!(1); 21]);
    let now = cutoff(27);

    run_once(&ws, &market, now).await.unwrap();

    // Every coin is fetched with the run's own timestamp as the cutoff.
    assert_eq!(market.cutoffs(), [now, now, now]);
    assert_eq!(
        market.requests(),
        [
            ("BTC".to_string(), "USDT".to_string()),
            ("ETH".to_string(), "USDT".to_string()),
            ("DOGE".to_string(), "USDT".to_string()),
        ]
    );
}
