//! Typed whale queries on top of [`AmpClient`].

use serde::de::DeserializeOwned;

use crate::{
    AmpClient, Dataset, PROBE_TIMEOUT, QueryError, TopSendersQuery, TransferRecord,
    TransfersQuery, WhaleAggregate, WhaleStats, WhaleStatsQuery,
    queries::{PROBE_SQL, sample_transactions},
};

/// Runs the whale templates against one dataset and decodes the rows.
#[derive(Clone, Debug)]
pub struct WhaleReader {
    client: AmpClient,
    dataset: Dataset,
}

impl WhaleReader {
    /// Create a reader for `dataset`.
    pub const fn new(client: AmpClient, dataset: Dataset) -> Self {
        Self { client, dataset }
    }

    /// Underlying client.
    pub const fn client(&self) -> &AmpClient {
        &self.client
    }

    /// Dataset the templates are rendered against.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    async fn fetch<R: DeserializeOwned>(&self, sql: &str) -> Result<Vec<R>, QueryError> {
        self.client.try_execute(sql).await?.decode()
    }

    /// Check that the endpoint answers a trivial query.
    pub async fn probe(&self) -> Result<(), QueryError> {
        self.client.try_execute_with_timeout(PROBE_SQL, PROBE_TIMEOUT).await.map(|_| ())
    }

    /// Transfers above the query threshold.
    pub async fn recent_transfers(
        &self,
        query: &TransfersQuery,
    ) -> Result<Vec<TransferRecord>, QueryError> {
        self.fetch(&query.to_sql(&self.dataset)).await
    }

    /// Senders ranked by total value moved.
    pub async fn top_senders(
        &self,
        query: &TopSendersQuery,
    ) -> Result<Vec<WhaleAggregate>, QueryError> {
        self.fetch(&query.to_sql(&self.dataset)).await
    }

    /// Count, maximum and average above the threshold. `None` if the server
    /// returned no row at all.
    pub async fn whale_stats(
        &self,
        query: &WhaleStatsQuery,
    ) -> Result<Option<WhaleStats>, QueryError> {
        Ok(self.fetch(&query.to_sql(&self.dataset)).await?.into_iter().next())
    }

    /// The latest `limit` transactions of any size.
    pub async fn sample_transactions(&self, limit: u32) -> Result<Vec<TransferRecord>, QueryError> {
        self.fetch(&sample_transactions(&self.dataset, limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Threshold, TimeWindow};
    use mockito::{Matcher, Server};
    use std::time::Duration;
    use url::Url;

    fn reader_for(url: &str) -> WhaleReader {
        let client = AmpClient::new(Url::parse(url).unwrap(), Duration::from_secs(5));
        WhaleReader::new(client, Dataset::default())
    }

    #[tokio::test]
    async fn recent_transfers_sends_template_and_decodes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Regex(
                r"CAST\(value AS DOUBLE\) >= 100000000000000000000".to_owned(),
            ))
            .with_status(200)
            .with_body(concat!(
                r#"{"block_num":2,"timestamp":"2025-01-01T00:00:10Z","transaction_hash":"0x2","from_address":"0xA","to_address":"0xB","eth_amount":150.0}"#,
                "\n",
                r#"{"block_num":1,"timestamp":"2025-01-01T00:00:00Z","transaction_hash":"0x1","from_address":"0xC","to_address":"0xD","eth_amount":100.0}"#,
                "\n"
            ))
            .create_async()
            .await;

        let query = TransfersQuery {
            window: TimeWindow::Hours(2),
            ..TransfersQuery::new(Threshold::from_eth(100.0).unwrap())
        };
        let rows = reader_for(&server.url()).recent_transfers(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].eth_amount, 100.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn top_senders_decodes_aggregates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::Regex("GROUP BY".to_owned()))
            .with_status(200)
            .with_body(
                r#"{"from_address":"0xA","transfer_count":4,"total_eth_sent":800.0,"avg_eth_per_transfer":200.0,"largest_transfer":350.0}"#,
            )
            .create_async()
            .await;

        let query = TopSendersQuery::new(Threshold::from_eth(50.0).unwrap());
        let rows = reader_for(&server.url()).top_senders(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transfer_count, 4);
        assert_eq!(rows[0].largest_transfer, 350.0);
    }

    #[tokio::test]
    async fn wrong_columns_are_schema_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"unexpected":"row"}"#)
            .create_async()
            .await;

        let query = TopSendersQuery::new(Threshold::from_eth(50.0).unwrap());
        let err = reader_for(&server.url()).top_senders(&query).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[tokio::test]
    async fn whale_stats_reads_single_row() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"whale_count":3,"largest_transfer":420.0,"avg_transfer":210.5}"#)
            .create_async()
            .await;

        let query = WhaleStatsQuery {
            min_value: Threshold::from_eth(50.0).unwrap(),
            window: TimeWindow::Hours(24),
        };
        let stats = reader_for(&server.url()).whale_stats(&query).await.unwrap().unwrap();
        assert_eq!(stats.whale_count, 3);
        assert_eq!(stats.avg_transfer, Some(210.5));
    }

    #[tokio::test]
    async fn probe_surfaces_server_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body("SELECT 1 AS test")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = reader_for(&server.url()).probe().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
    }

    #[tokio::test]
    async fn sample_transactions_may_be_empty() {
        let mut server = Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(200).with_body("\n").create_async().await;

        let rows = reader_for(&server.url()).sample_transactions(10).await.unwrap();
        assert!(rows.is_empty());
    }
}
