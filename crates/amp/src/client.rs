//! HTTP client for the Amp SQL endpoint.

use std::time::{Duration, Instant};

use derive_more::Debug;
use reqwest::{Client, header::CONTENT_TYPE};
use tracing::{debug, error, warn};
use url::Url;

use crate::{Diagnostic, QueryError, QueryResult};

/// Endpoint used when none is configured.
pub const DEFAULT_AMP_URL: &str = "http://localhost:1603";

/// Timeout for dashboard queries.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the cheap connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of body characters kept in a status error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Stateless client for the Amp SQL endpoint.
///
/// Every call is a fresh round trip: nothing is retried or cached.
#[derive(Clone, Debug)]
pub struct AmpClient {
    #[debug(skip)]
    http: Client,
    url: Url,
    timeout: Duration,
}

/// Result of [`AmpClient::execute`]: a table, empty on failure, plus the
/// failure if there was one.
#[derive(Debug)]
pub struct QueryOutcome {
    table: QueryResult,
    error: Option<QueryError>,
}

/// Classification of a [`QueryOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query returned this many rows.
    Rows(usize),
    /// Valid response without rows.
    Empty,
    /// Unreachable, timed out or non-success status.
    TransportFailure,
    /// Response body is not newline-delimited JSON objects.
    ParseFailure,
}

impl QueryOutcome {
    fn success(table: QueryResult) -> Self {
        Self { table, error: None }
    }

    fn failure(error: QueryError) -> Self {
        Self { table: QueryResult::empty(), error: Some(error) }
    }

    /// The table; empty when the query failed.
    pub const fn table(&self) -> &QueryResult {
        &self.table
    }

    /// The failure, if any.
    pub const fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Serializable form of the failure, if any.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.error.as_ref().map(Diagnostic::from)
    }

    /// Classify the outcome.
    pub fn status(&self) -> QueryStatus {
        match &self.error {
            Some(e) if e.is_transport() => QueryStatus::TransportFailure,
            Some(_) => QueryStatus::ParseFailure,
            None if self.table.is_empty() => QueryStatus::Empty,
            None => QueryStatus::Rows(self.table.len()),
        }
    }

    /// Turn the outcome back into a `Result`.
    pub fn into_result(self) -> Result<QueryResult, QueryError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.table),
        }
    }
}

impl AmpClient {
    /// Create a client for `url` with a default per-request timeout.
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self { http: Client::new(), url, timeout }
    }

    /// Endpoint this client posts to.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Default per-request timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `sql`, folding any failure into an empty table.
    ///
    /// The failure is logged and kept in the returned [`QueryOutcome`].
    pub async fn execute(&self, sql: &str) -> QueryOutcome {
        self.execute_with_timeout(sql, self.timeout).await
    }

    /// [`Self::execute`] with an explicit timeout.
    pub async fn execute_with_timeout(&self, sql: &str, timeout: Duration) -> QueryOutcome {
        match self.try_execute_with_timeout(sql, timeout).await {
            Ok(table) => QueryOutcome::success(table),
            Err(e) => QueryOutcome::failure(e),
        }
    }

    /// Execute `sql` and return failures as errors.
    pub async fn try_execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        self.try_execute_with_timeout(sql, self.timeout).await
    }

    /// [`Self::try_execute`] with an explicit timeout.
    pub async fn try_execute_with_timeout(
        &self,
        sql: &str,
        timeout: Duration,
    ) -> Result<QueryResult, QueryError> {
        let start = Instant::now();
        let result = self.send(sql, timeout).await;

        let duration_ms = start.elapsed().as_millis();
        match &result {
            Ok(table) => {
                debug!(query = %sql, duration_ms, rows = table.len(), "Amp query executed")
            }
            Err(e) if e.is_transport() => {
                warn!(query = %sql, duration_ms, error = %e, "Amp query failed")
            }
            Err(e) => error!(query = %sql, duration_ms, error = %e, "Amp response rejected"),
        }
        result
    }

    async fn send(&self, sql: &str, timeout: Duration) -> Result<QueryResult, QueryError> {
        let resp = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/plain")
            .timeout(timeout)
            .body(sql.to_owned())
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim().chars().take(BODY_SNIPPET_CHARS).collect();
            return Err(QueryError::Status { status, body });
        }

        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                QueryError::Timeout { url: self.url.clone(), timeout }
            } else {
                QueryError::Body(e)
            }
        })?;
        QueryResult::from_jsonl(&text)
    }

    fn transport_error(&self, err: reqwest::Error, timeout: Duration) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout { url: self.url.clone(), timeout }
        } else {
            QueryError::Unreachable { url: self.url.clone(), source: err }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(url: &str) -> AmpClient {
        AmpClient::new(Url::parse(url).unwrap(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn posts_sql_as_plain_text_and_parses_rows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "text/plain")
            .match_body(Matcher::Exact("SELECT 1 AS test".to_owned()))
            .with_status(200)
            .with_body("{\"test\":1}\n")
            .create_async()
            .await;

        let outcome = client_for(&server.url()).execute("SELECT 1 AS test").await;
        assert_eq!(outcome.status(), QueryStatus::Rows(1));
        assert_eq!(outcome.table().get(0, "test"), Some(&json!(1)));
        assert!(outcome.diagnostic().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn n_lines_give_n_rows() {
        let mut server = Server::new_async().await;
        let body = "{\"from_address\":\"0xA\",\"eth_amount\":120.5}\n\n\
                    {\"from_address\":\"0xB\",\"eth_amount\":75.0}\n\
                    {\"from_address\":\"0xC\",\"eth_amount\":1.0,\"extra\":true}\n";
        let _mock = server.mock("POST", "/").with_status(200).with_body(body).create_async().await;

        let table = client_for(&server.url()).try_execute("SELECT").await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[2].keys().collect::<Vec<_>>(), ["from_address", "eth_amount", "extra"]);
    }

    #[tokio::test]
    async fn empty_body_is_empty_not_error() {
        let mut server = Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(200).with_body("").create_async().await;

        let outcome = client_for(&server.url()).execute("SELECT").await;
        assert_eq!(outcome.status(), QueryStatus::Empty);
        assert!(outcome.error().is_none());
        assert!(outcome.into_result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_line_is_parse_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("{\"a\":1}\nnot json\n{\"a\":3}\n")
            .create_async()
            .await;

        let outcome = client_for(&server.url()).execute("SELECT").await;
        assert_eq!(outcome.status(), QueryStatus::ParseFailure);
        assert!(outcome.table().is_empty());
        assert!(matches!(outcome.error(), Some(QueryError::Parse { line: 2, .. })));
        assert_eq!(outcome.diagnostic().unwrap().kind, ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn error_status_is_transport_failure_with_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body("table not found: ethereum/eth_rpc")
            .create_async()
            .await;

        let outcome = client_for(&server.url()).execute("SELECT").await;
        assert_eq!(outcome.status(), QueryStatus::TransportFailure);
        let diag = outcome.diagnostic().unwrap();
        assert_eq!(diag.kind, ErrorKind::ServerError);
        assert!(diag.message.contains("table not found"));
    }

    #[tokio::test]
    async fn long_error_body_is_cut_to_snippet() {
        let mut server = Server::new_async().await;
        let body = format!("  {}{}\n", "a".repeat(BODY_SNIPPET_CHARS), "b".repeat(300));
        let _mock =
            server.mock("POST", "/").with_status(500).with_body(body).create_async().await;

        let err = client_for(&server.url()).try_execute("SELECT").await.unwrap_err();
        match &err {
            QueryError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body.chars().count(), BODY_SNIPPET_CHARS);
                assert!(body.chars().all(|c| c == 'a'));
            }
            other => panic!("unexpected error {other:?}"),
        }
        let diag = Diagnostic::from(&err);
        assert!(diag.message.contains(&"a".repeat(BODY_SNIPPET_CHARS)));
        assert!(!diag.message.contains('b'));
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client_for(&format!("http://{addr}")).execute("SELECT 1").await;
        assert_eq!(outcome.status(), QueryStatus::TransportFailure);
        assert!(outcome.table().is_empty());
        let diag = outcome.diagnostic().unwrap();
        assert_eq!(diag.kind, ErrorKind::Unreachable);
        assert_ne!(diag.kind, ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let holder = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = client_for(&format!("http://{addr}"));
        let err = client
            .try_execute_with_timeout("SELECT 1", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_transport());
        holder.abort();
    }
}
