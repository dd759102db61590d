use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, MarketDataSource};
use engine::{ConsoleSink, DailySchedule, Runner, YahooClient};
use paper::ReplaySource;
use strategy::{dispersion_statistics, ScanConfig, Scanner, TEST_TICKERS};
use telegram_notify::TelegramSink;

/// Days of history used by `--stats`.
const STATS_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, Parser)]
#[command(
    name = "sma-scanner",
    about = "Flags tickers whose last close strays too far from its simple moving average"
)]
struct Args {
    /// Scan config file (TOML). Overrides SCANNER_CONFIG_PATH.
    #[arg(long)]
    config: Option<String>,

    /// Comma-separated tickers to scan instead of the configured list.
    #[arg(long, value_delimiter = ',')]
    tickers: Option<Vec<String>>,

    /// Scan only AAPL, MSFT and GOOGL and send no notifications.
    #[arg(long)]
    test: bool,

    /// Scan without sending notifications.
    #[arg(long)]
    no_notify: bool,

    /// Send a test notification and exit.
    #[arg(long)]
    test_notify: bool,

    /// Print historical dispersion statistics for one ticker and exit.
    #[arg(long, value_name = "TICKER")]
    stats: Option<String>,

    /// Read prices from a JSON file instead of the market data provider.
    #[arg(long, value_name = "FILE")]
    replay: Option<String>,

    /// Run as a weekday scheduler instead of scanning once.
    #[arg(long, conflicts_with = "once")]
    schedule: bool,

    /// Daily scan time (HH:MM, local). Overrides SCAN_TIME.
    #[arg(long, requires = "schedule")]
    time: Option<String>,

    /// With --schedule: also scan immediately on start.
    #[arg(long, requires = "schedule")]
    run_now: bool,

    /// Run one scheduled job: scan on weekdays, skip on weekends.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;
    let scan_cfg = load_scan_config(&args, &cfg)?;

    // ── Market data ───────────────────────────────────────────────────────────
    let source: Arc<dyn MarketDataSource> = match &args.replay {
        Some(path) => {
            info!(path = %path, "Replay mode: prices read from file");
            Arc::new(ReplaySource::from_json_file(path).context("failed to load replay file")?)
        }
        None => Arc::new(
            YahooClient::new(&cfg.data_provider_base_url, cfg.data_provider_timeout_secs)
                .context("failed to create market data client")?,
        ),
    };

    // ── Notifications ─────────────────────────────────────────────────────────
    let telegram = cfg
        .telegram_token
        .as_ref()
        .map(|token| Arc::new(TelegramSink::new(token.clone(), &cfg.telegram_chat_ids)));

    if args.test_notify {
        let Some(sink) = telegram else {
            anyhow::bail!("TELEGRAM_TOKEN and TELEGRAM_CHAT_IDS must be set to send a test notification");
        };
        sink.send_test_message().await.context("test notification failed")?;
        println!("Test notification sent successfully!");
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(ticker) = &args.stats {
        return print_statistics(source.as_ref(), ticker, scan_cfg.sma_period).await;
    }

    // ── Runner ────────────────────────────────────────────────────────────────
    let notify = !(args.test || args.no_notify);
    let scanner = Scanner::new(source, Arc::new(scan_cfg));
    let mut runner = Runner::new(scanner).with_sink(Arc::new(ConsoleSink));
    match telegram {
        Some(sink) if notify => runner = runner.with_sink(sink),
        Some(_) => info!("Notifications disabled for this run"),
        None if notify => warn!("TELEGRAM_TOKEN not set; results are printed only"),
        None => {}
    }

    if args.schedule {
        let at = match &args.time {
            Some(raw) => common::config::parse_scan_time(raw)?,
            None => cfg.scan_time,
        };
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        runner
            .run_scheduled(DailySchedule::new(at), args.run_now, shutdown)
            .await;
        return Ok(ExitCode::SUCCESS);
    }

    let summary = if args.once {
        match runner.run_market_day().await {
            Some(summary) => summary,
            None => return Ok(ExitCode::SUCCESS),
        }
    } else {
        tokio::select! {
            summary = runner.run_once() => summary,
            _ = tokio::signal::ctrl_c() => {
                info!("Scan interrupted by user");
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    Ok(if summary.tickers_analyzed() > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolve the scan file, apply CLI overrides and validate.
fn load_scan_config(args: &Args, cfg: &Config) -> anyhow::Result<ScanConfig> {
    let mut scan_cfg = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None if Path::new(&cfg.scanner_config_path).exists() => {
            ScanConfig::load(&cfg.scanner_config_path)?
        }
        None => {
            warn!(
                path = %cfg.scanner_config_path,
                "Scan config not found, using built-in defaults"
            );
            ScanConfig::default()
        }
    };

    if args.test {
        info!("Running in TEST MODE with {} tickers", TEST_TICKERS.len());
        scan_cfg = scan_cfg.with_tickers(&TEST_TICKERS);
    } else if let Some(tickers) = &args.tickers {
        info!(tickers = ?tickers, "Using custom tickers");
        scan_cfg = scan_cfg.with_tickers(tickers);
    }

    for warning in scan_cfg.validate()? {
        warn!("{warning}");
    }
    Ok(scan_cfg)
}

async fn print_statistics(
    source: &dyn MarketDataSource,
    ticker: &str,
    period: usize,
) -> anyhow::Result<ExitCode> {
    let ticker = ticker.trim().to_uppercase();
    let series = source
        .fetch_daily_closes(&ticker, STATS_LOOKBACK_DAYS)
        .await
        .with_context(|| format!("failed to fetch history for {ticker}"))?;

    let Some(stats) = dispersion_statistics(&series.closes(), period) else {
        warn!(ticker = %ticker, rows = series.len(), need = period, "Insufficient data");
        return Ok(ExitCode::FAILURE);
    };

    println!("SMA-{period} dispersion statistics for {ticker} (last {STATS_LOOKBACK_DAYS} days)");
    println!("{}", "-".repeat(60));
    println!("Mean Dispersion:    {:.2}%", stats.mean_pct);
    println!("Std Dispersion:     {:.2}%", stats.std_pct);
    println!("Max Dispersion:     {:.2}%", stats.max_pct);
    println!("Min Dispersion:     {:.2}%", stats.min_pct);
    println!("Current Dispersion: {:.2}%", stats.current_pct);
    println!("Days Above SMA:     {}", stats.days_above_sma);
    println!("Days Below SMA:     {}", stats.days_below_sma);
    println!("Total Days:         {}", stats.total_days);
    println!("\nPercentage Above SMA: {:.2}%", stats.pct_days_above());
    println!("Percentage Below SMA: {:.2}%", stats.pct_days_below());
    Ok(ExitCode::SUCCESS)
}
