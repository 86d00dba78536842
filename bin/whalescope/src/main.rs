//! Entrypoint.

use std::{sync::Arc, time::Duration};

use amp::{AmpClient, ErrorKind, QueryError, Threshold, TimeWindow, WhaleReader, WhaleStatsQuery};
use clap::{Parser, Subcommand};
use config::{AmpOpts, RefreshOpts, WhaleOpts};
use dashboard::{
    DashboardParams, LiveSource, RefreshHandle, Refresher, SyntheticSource, WhaleSource, refresh,
    render::render,
    synthetic::DEFAULT_TRANSFER_COUNT,
};
use dotenvy::dotenv;
use eyre::{Result, bail};
use primitives::format::{format_address, format_eth_amount};
use runtime::shutdown::{ShutdownSignal, run_until_shutdown};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

/// Clears the terminal and moves the cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Number of transactions fetched by `check`.
const SAMPLE_SIZE: u32 = 10;

/// Track large Ethereum transfers through an Amp SQL endpoint.
#[derive(Debug, Parser)]
#[clap(name = "whalescope", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Live dashboard refreshed from Amp
    Watch {
        #[clap(flatten)]
        amp: AmpOpts,
        #[clap(flatten)]
        whale: WhaleOpts,
        #[clap(flatten)]
        refresh: RefreshOpts,
        /// Render once and exit
        #[clap(long)]
        once: bool,
    },
    /// Check that Amp answers and has transaction data
    Check {
        #[clap(flatten)]
        amp: AmpOpts,
        #[clap(flatten)]
        whale: WhaleOpts,
    },
    /// Dashboard over synthetic transfers, no Amp server needed
    Demo {
        #[clap(flatten)]
        whale: WhaleOpts,
        /// Seconds between refreshes
        #[clap(long = "refresh-interval-secs", default_value = "10")]
        interval_secs: u64,
        /// Transfers generated per refresh
        #[clap(long, default_value_t = DEFAULT_TRANSFER_COUNT)]
        count: usize,
        /// Seed for reproducible data
        #[clap(long)]
        seed: Option<u64>,
        /// Render once and exit
        #[clap(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(custom_env_file) = std::env::var("ENV_FILE") {
        dotenvy::from_filename(custom_env_file)?;
    } else {
        // Try the default .env file, and ignore if it doesn't exist.
        dotenv().ok();
    }

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Command::Watch { amp, whale, refresh: refresh_opts, once } => {
            info!(url = %amp.url, dataset = %amp.dataset, "🐋 Whalescope watching");
            let source = Arc::new(LiveSource::new(reader(&amp)));
            show(source, DashboardParams::from(&whale), refresh_opts.interval(), once).await
        }
        Command::Check { amp, whale } => check(&reader(&amp), &whale).await,
        Command::Demo { whale, interval_secs, count, seed, once } => {
            let source = match seed {
                Some(seed) => SyntheticSource::with_seed(count, seed),
                None => SyntheticSource::new(count),
            };
            let interval = Duration::from_secs(interval_secs.max(1));
            show(Arc::new(source), DashboardParams::from(&whale), interval, once).await
        }
    }
}

fn reader(amp: &AmpOpts) -> WhaleReader {
    WhaleReader::new(AmpClient::new(amp.url.clone(), amp.query_timeout()), amp.dataset.clone())
}

/// Render the dashboard, once or on every refresh until interrupted.
async fn show<S: WhaleSource + 'static>(
    source: Arc<S>,
    params: DashboardParams,
    interval: Duration,
    once: bool,
) -> Result<()> {
    if once {
        let snapshot = refresh(source.as_ref(), &params.plan()?).await;
        println!("{}", render(&snapshot));
        if snapshot.has_failures() {
            bail!("dashboard refresh failed");
        }
        return Ok(());
    }

    let handle = Refresher::new(source, interval).start(params).await?;
    let stopped = run_until_shutdown(display(&handle), ShutdownSignal::new()?, || {
        info!("Shutting down dashboard");
    })
    .await;
    if stopped.is_none() {
        println!();
    }
    Ok(())
}

async fn display(handle: &RefreshHandle) {
    let mut snapshots = handle.subscribe();
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        println!("{CLEAR_SCREEN}{}", render(&snapshot));
        if snapshots.changed().await.is_err() {
            return;
        }
    }
}

/// Probe the endpoint, fetch a sample and count recent whale transfers.
async fn check(reader: &WhaleReader, whale: &WhaleOpts) -> Result<()> {
    println!("🐋 Whalescope connection check");
    println!("{}", "=".repeat(40));

    println!("\n1. Testing Amp server connection...");
    if let Err(e) = reader.probe().await {
        report(&e);
        if e.kind() == ErrorKind::Unreachable {
            println!("   Expected URL: {}", reader.client().url());
            println!("\n💡 Start the Amp server (ampd server --config amp.toml) and try again.");
        }
        bail!("Amp server is not available");
    }
    println!("✅ Amp server is running and responsive!");

    println!("\n2. Testing blockchain data access...");
    let sample = match reader.sample_transactions(SAMPLE_SIZE).await {
        Ok(sample) => sample,
        Err(e) => {
            report(&e);
            bail!("cannot read {}", reader.dataset());
        }
    };
    if sample.is_empty() {
        println!("⚠️  No transaction data found. Amp may still be syncing.");
        println!("   Verify the dataset name uses a version: '{}'", reader.dataset());
        bail!("no transactions in {}", reader.dataset());
    }
    println!("✅ Found {} recent transactions!", sample.len());
    for tx in sample.iter().take(5) {
        println!(
            "   block {:>10}  {:>14}  {}",
            tx.block_num,
            format_eth_amount(tx.eth_amount),
            format_address(&tx.from_address)
        );
    }

    println!("\n3. Checking for whale transfers...");
    let window = TimeWindow::Hours(24);
    let query = WhaleStatsQuery { min_value: Threshold::from_eth(whale.min_eth)?, window };
    match reader.whale_stats(&query).await {
        Ok(Some(stats)) if stats.whale_count > 0 => {
            println!("🐋 Found {} whale transfers in the {window}!", stats.whale_count);
            if let Some(largest) = stats.largest_transfer {
                println!("   Largest: {}", format_eth_amount(largest));
            }
            if let Some(avg) = stats.avg_transfer {
                println!("   Average: {}", format_eth_amount(avg));
            }
        }
        Ok(_) => println!(
            "📊 No transfers of at least {} in the {window}.",
            format_eth_amount(whale.min_eth)
        ),
        Err(e) => report(&e),
    }

    println!("\n🎉 Check complete! Run `whalescope watch` for the live dashboard.");
    Ok(())
}

fn report(err: &QueryError) {
    let kind = err.kind();
    println!("❌ {}: {err}", kind.title());
    println!("   {}", kind.hint());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert()
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::try_parse_from(["whalescope", "demo", "--seed", "7"]).unwrap();
        match cli.command {
            Command::Demo { interval_secs, count, seed, once, whale } => {
                assert_eq!(interval_secs, 10);
                assert_eq!(count, DEFAULT_TRANSFER_COUNT);
                assert_eq!(seed, Some(7));
                assert!(!once);
                assert_eq!(whale.min_eth, 50.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn watch_takes_amp_options() {
        let cli = Cli::try_parse_from([
            "whalescope",
            "watch",
            "--amp-url",
            "http://amp:1603",
            "--min-eth",
            "500",
            "--once",
        ])
        .unwrap();
        match cli.command {
            Command::Watch { amp, whale, once, .. } => {
                assert_eq!(amp.url.host_str(), Some("amp"));
                assert_eq!(whale.min_eth, 500.0);
                assert!(once);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
