//! API server binary

use std::{net::SocketAddr, sync::Arc};

use amp::{AmpClient, WhaleReader};
use api::ApiState;
use clap::Parser;
use config::Opts;
use dashboard::{DashboardParams, LiveSource, Refresher, SyntheticSource, WhaleSource};
use dotenvy::dotenv;
use runtime::shutdown::ShutdownSignal;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let source: Arc<dyn WhaleSource> = if opts.demo {
        info!("Serving synthetic demo data");
        Arc::new(SyntheticSource::default())
    } else {
        let client = AmpClient::new(opts.amp.url.clone(), opts.amp.query_timeout());
        let reader = WhaleReader::new(client, opts.amp.dataset.clone());
        match reader.probe().await {
            Ok(()) => info!(url = %opts.amp.url, dataset = %opts.amp.dataset, "Connected to Amp"),
            Err(e) => warn!(url = %opts.amp.url, error = %e, "Amp is not reachable yet"),
        }
        Arc::new(LiveSource::new(reader))
    };

    let defaults = DashboardParams::from(&opts.whale);
    let refresher =
        Refresher::new(Arc::clone(&source), opts.refresh.interval()).start(defaults.clone()).await?;
    let state = ApiState::new(source, defaults, Arc::new(refresher));

    let addr: SocketAddr = format!("{}:{}", opts.api.host, opts.api.port).parse()?;
    server::run(addr, state, opts.api.allowed_origins, ShutdownSignal::new()?).await
}
