//! Whalescope configuration
use std::time::Duration;

use amp::{Dataset, TimeWindow};
use clap::Parser;
use url::Url;

/// Default comma separated list of origins allowed to call the API.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Amp endpoint configuration options
#[derive(Debug, Clone, Parser)]
pub struct AmpOpts {
    /// Amp server URL
    #[clap(long = "amp-url", env = "AMP_URL", default_value = amp::DEFAULT_AMP_URL)]
    pub url: Url,
    /// Dataset holding the transactions table, `<network>/<dataset>@<version>`
    #[clap(long = "amp-dataset", env = "AMP_DATASET", default_value = amp::queries::DEFAULT_DATASET)]
    pub dataset: Dataset,
    /// Per query timeout in seconds
    #[clap(long = "amp-query-timeout-secs", env = "AMP_QUERY_TIMEOUT_SECS", default_value = "30")]
    pub query_timeout_secs: u64,
}

impl AmpOpts {
    /// Per query timeout.
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Whale query parameters
#[derive(Debug, Clone, Parser)]
pub struct WhaleOpts {
    /// Minimum ETH amount for a transfer to count as a whale transfer
    #[clap(long, env = "WHALE_MIN_ETH", default_value = "50")]
    pub min_eth: f64,
    /// How many hours back to look for whale transfers
    #[clap(
        long,
        env = "WHALE_WINDOW_HOURS",
        default_value = "6",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(TimeWindow::MAX_HOURS))
    )]
    pub window_hours: u32,
    /// Maximum number of transfers per refresh
    #[clap(long, env = "WHALE_TRANSFER_LIMIT", default_value = "200")]
    pub transfer_limit: u32,
    /// Maximum number of senders on the leaderboard
    #[clap(long, env = "WHALE_SENDER_LIMIT", default_value = "20")]
    pub sender_limit: u32,
    /// Minimum number of whale transfers for a sender to be ranked
    #[clap(long, env = "WHALE_MIN_SENDER_TRANSFERS", default_value = "2")]
    pub min_sender_transfers: u32,
}

/// Refresh scheduling options
#[derive(Debug, Clone, Parser)]
pub struct RefreshOpts {
    /// Seconds between automatic refreshes
    #[clap(long = "refresh-interval-secs", env = "REFRESH_INTERVAL_SECS", default_value = "30")]
    pub interval_secs: u64,
}

impl RefreshOpts {
    /// Interval between automatic refreshes, at least one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// API server configuration options
#[derive(Debug, Clone, Parser)]
pub struct ApiOpts {
    /// API server host
    #[clap(long = "api-host", env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// API server port
    #[clap(long = "api-port", env = "API_PORT", default_value = "3000")]
    pub port: u16,
    /// Origins allowed by CORS, comma separated
    #[clap(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,
}

/// CLI options for the API server
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Amp endpoint configuration
    #[clap(flatten)]
    pub amp: AmpOpts,

    /// Default whale query parameters
    #[clap(flatten)]
    pub whale: WhaleOpts,

    /// Background refresh configuration
    #[clap(flatten)]
    pub refresh: RefreshOpts,

    /// API server configuration
    #[clap(flatten)]
    pub api: ApiOpts,

    /// Serve synthetic demo data instead of querying Amp
    #[clap(long, env = "WHALE_DEMO")]
    pub demo: bool,
}
