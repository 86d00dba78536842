//! Where dashboard rows come from.

use amp::{QueryError, TransferRecord, WhaleAggregate, WhaleReader};
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::QueryPlan;

/// Kind of [`WhaleSource`] behind a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Queries against a running Amp server
    Live,
    /// Randomly generated demo data
    Synthetic,
}

impl SourceKind {
    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Live => "live Amp data",
            Self::Synthetic => "synthetic demo data",
        }
    }
}

/// Produces whale transfers and top senders for a [`QueryPlan`].
#[async_trait]
pub trait WhaleSource: Send + Sync + std::fmt::Debug {
    /// Kind of source.
    fn kind(&self) -> SourceKind;

    /// Transfers at or above the plan's threshold.
    async fn transfers(&self, plan: &QueryPlan) -> Result<Vec<TransferRecord>, QueryError>;

    /// Senders ranked by total value moved.
    async fn top_senders(&self, plan: &QueryPlan) -> Result<Vec<WhaleAggregate>, QueryError>;
}

/// [`WhaleSource`] backed by an Amp server.
#[derive(Debug, Clone)]
pub struct LiveSource {
    reader: WhaleReader,
}

impl LiveSource {
    /// Wrap a reader.
    pub const fn new(reader: WhaleReader) -> Self {
        Self { reader }
    }

    /// Underlying reader.
    pub const fn reader(&self) -> &WhaleReader {
        &self.reader
    }
}

#[async_trait]
impl WhaleSource for LiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }

    async fn transfers(&self, plan: &QueryPlan) -> Result<Vec<TransferRecord>, QueryError> {
        self.reader.recent_transfers(plan.transfers()).await
    }

    async fn top_senders(&self, plan: &QueryPlan) -> Result<Vec<WhaleAggregate>, QueryError> {
        self.reader.top_senders(plan.top_senders()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashboardParams;
    use amp::{AmpClient, Dataset, ErrorKind};
    use mockito::{Matcher, Server};
    use std::time::Duration;
    use url::Url;

    fn live(url: &str) -> LiveSource {
        let client = AmpClient::new(Url::parse(url).unwrap(), Duration::from_secs(5));
        LiveSource::new(WhaleReader::new(client, Dataset::default()))
    }

    #[tokio::test]
    async fn live_transfers_use_plan_window_and_gas_columns() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("INTERVAL '6 hours'".to_owned()),
                Matcher::Regex("AS gas_gwei".to_owned()),
                Matcher::Regex("LIMIT 200".to_owned()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"block_num":1,"timestamp":"2025-01-01T00:00:00Z","transaction_hash":"0x1","from_address":"0xA","to_address":"0xB","eth_amount":60.0,"gas_gwei":20.0,"gas_used":21000,"gas_fee_eth":0.00042}"#,
            )
            .create_async()
            .await;

        let plan = DashboardParams::default().plan().unwrap();
        let rows = live(&server.url()).transfers(&plan).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gas_gwei, Some(20.0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn live_top_senders_use_doubled_window() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Regex("INTERVAL '12 hours'".to_owned()))
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let plan = DashboardParams::default().plan().unwrap();
        let rows = live(&server.url()).top_senders(&plan).await.unwrap();
        assert!(rows.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn live_errors_are_passed_through() {
        let mut server = Server::new_async().await;
        let _mock =
            server.mock("POST", "/").with_status(503).with_body("down").create_async().await;

        let plan = DashboardParams::default().plan().unwrap();
        let err = live(&server.url()).transfers(&plan).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
    }
}
