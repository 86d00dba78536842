//! Demo data shaped like the live transfer query.

use std::sync::Mutex;

use amp::{QueryError, QueryResult, Row, TransferRecord, WhaleAggregate};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;
use tracing::debug;

use crate::{
    QueryPlan, SourceKind, WhaleSource,
    stats::aggregate_senders,
};

/// Number of transfers generated per refresh.
pub const DEFAULT_TRANSFER_COUNT: usize = 50;

/// Well known exchange hot wallets used as senders and recipients.
pub const EXCHANGE_ADDRESSES: [&str; 10] = [
    "0x47ac0Fb4F2D84898e4D9E7b4DaB3C24507a6D503",
    "0x8894E0a0c962CB723c1976a4421c95949bE2D4E3",
    "0x28C6c06298d514Db089934071355E5743bf21d60",
    "0x21a31Ee1afC51d94C2eFcCAa2092aD1028285549",
    "0xDFd5293D8e347dFe59E90eFd55b2956a1343963d",
    "0x56Eddb7aa87536c09CCc2793473599fD21A8b17F",
    "0x9696f59E4d72E237BE84fFD425DCaD154Bf96976",
    "0x503828976D22510aad0201ac7EC88293211D23Da",
    "0xA9D1e08C7793af67e9d92fe308d5697FB81d3E43",
    "0x6262998Ced04146fA42253a5C0AF90CA02dfd2A3",
];

const MIN_ETH: f64 = 50.0;
const MAX_ETH: f64 = 5000.0;
const SPAN_MINUTES: i64 = 120;
const BASE_BLOCK: u64 = 21_000_000;
const HEX: &[u8; 16] = b"0123456789abcdef";

/// Generate `count` transfers in the two hours before `now`, newest first.
///
/// Rows carry the same columns as the live transfer query with gas enabled.
pub fn generate_table<R: Rng>(rng: &mut R, count: usize, now: DateTime<Utc>) -> QueryResult {
    let base = now - Duration::minutes(SPAN_MINUTES);
    let mut rows: Vec<(DateTime<Utc>, Row)> = (0..count)
        .map(|_| {
            let timestamp = base + Duration::minutes(rng.gen_range(0..=SPAN_MINUTES));
            let from = rng.gen_range(0..EXCHANGE_ADDRESSES.len());
            let to = (from + rng.gen_range(1..EXCHANGE_ADDRESSES.len())) % EXCHANGE_ADDRESSES.len();
            let hash: String = (0..64).map(|_| HEX[rng.gen_range(0..HEX.len())] as char).collect();
            let gas_gwei: f64 = rng.gen_range(10.0..100.0);
            let gas_used: u64 = rng.gen_range(21_000..=500_000);

            let row: Row = [
                ("block_num", json!(BASE_BLOCK + rng.gen_range(0..=100_000))),
                ("timestamp", json!(timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))),
                ("transaction_hash", json!(format!("0x{hash}"))),
                ("from_address", json!(EXCHANGE_ADDRESSES[from])),
                ("to_address", json!(EXCHANGE_ADDRESSES[to])),
                ("eth_amount", json!(rng.gen_range(MIN_ETH..MAX_ETH))),
                ("gas_gwei", json!(gas_gwei)),
                ("gas_used", json!(gas_used)),
                ("gas_fee_eth", json!(gas_gwei * gas_used as f64 / 1e9)),
            ]
            .into_iter()
            .map(|(column, value)| (column.to_owned(), value))
            .collect();
            (timestamp, row)
        })
        .collect();

    rows.sort_by(|a, b| b.0.cmp(&a.0));
    QueryResult::from_rows(rows.into_iter().map(|(_, row)| row).collect())
}

/// [`WhaleSource`] that makes up transfers between exchange wallets.
#[derive(Debug)]
pub struct SyntheticSource {
    count: usize,
    rng: Mutex<StdRng>,
    last_batch: Mutex<Vec<TransferRecord>>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFER_COUNT)
    }
}

impl SyntheticSource {
    /// Source generating `count` transfers per refresh.
    pub fn new(count: usize) -> Self {
        Self::with_rng(count, StdRng::from_entropy())
    }

    /// Deterministic source for tests and reproducible demos.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self::with_rng(count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(count: usize, rng: StdRng) -> Self {
        Self { count, rng: Mutex::new(rng), last_batch: Mutex::new(Vec::new()) }
    }

    /// Every transfer of the latest generated table, before any threshold.
    pub fn last_batch(&self) -> Vec<TransferRecord> {
        self.last_batch.lock().expect("lock poisoned").clone()
    }

    /// Generate a fresh table and remember it as the latest batch.
    fn generate(&self) -> Result<QueryResult, QueryError> {
        let table = {
            let mut rng = self.rng.lock().expect("lock poisoned");
            generate_table(&mut *rng, self.count, Utc::now())
        };
        let batch: Vec<TransferRecord> = table.decode()?;
        *self.last_batch.lock().expect("lock poisoned") = batch;
        Ok(table)
    }
}

#[async_trait]
impl WhaleSource for SyntheticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Synthetic
    }

    async fn transfers(&self, plan: &QueryPlan) -> Result<Vec<TransferRecord>, QueryError> {
        let table = self.generate()?;
        let generated = table.len();

        let mut transfers: Vec<TransferRecord> =
            table.filter_at_least("eth_amount", plan.threshold().eth()).decode()?;
        if plan.params().largest_first {
            transfers.sort_by(|a, b| b.eth_amount.total_cmp(&a.eth_amount));
        }
        transfers.truncate(plan.params().transfer_limit as usize);
        debug!(generated, kept = transfers.len(), "synthetic transfers generated");
        Ok(transfers)
    }

    /// Ranks the latest batch, filtered at this plan's threshold.
    async fn top_senders(&self, plan: &QueryPlan) -> Result<Vec<WhaleAggregate>, QueryError> {
        if self.last_batch.lock().expect("lock poisoned").is_empty() {
            self.generate()?;
        }
        let min_eth = plan.threshold().eth();
        let mut batch = self.last_batch();
        batch.retain(|t| t.eth_amount >= min_eth);

        let params = plan.params();
        Ok(aggregate_senders(&batch, params.min_sender_transfers, params.sender_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashboardParams;

    #[test]
    fn generated_rows_match_live_schema() {
        let now = Utc::now();
        let table = generate_table(&mut StdRng::seed_from_u64(7), 25, now);
        assert_eq!(table.len(), 25);
        assert_eq!(
            table.columns(),
            [
                "block_num",
                "timestamp",
                "transaction_hash",
                "from_address",
                "to_address",
                "eth_amount",
                "gas_gwei",
                "gas_used",
                "gas_fee_eth"
            ]
        );

        let rows: Vec<TransferRecord> = table.decode().unwrap();
        let mut previous = now;
        for row in &rows {
            assert!((MIN_ETH..MAX_ETH).contains(&row.eth_amount));
            assert!((BASE_BLOCK..=BASE_BLOCK + 100_000).contains(&row.block_num));
            assert_ne!(row.from_address, row.to_address);
            assert!(EXCHANGE_ADDRESSES.contains(&row.from_address.as_str()));
            assert_eq!(row.transaction_hash.len(), 66);
            assert!((21_000..=500_000).contains(&row.gas_used.unwrap()));
            let gwei = row.gas_gwei.unwrap();
            assert!((10.0..100.0).contains(&gwei));

            let time = row.block_time().unwrap();
            assert!(time <= previous, "rows must be newest first");
            assert!(time >= now - Duration::minutes(SPAN_MINUTES + 1));
            previous = time;
        }
    }

    #[test]
    fn same_seed_same_rows() {
        let now = Utc::now();
        let a = generate_table(&mut StdRng::seed_from_u64(42), 10, now);
        let b = generate_table(&mut StdRng::seed_from_u64(42), 10, now);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn transfers_respect_threshold_and_limit() {
        let source = SyntheticSource::with_seed(200, 1);
        let params = DashboardParams { min_eth: 2500.0, transfer_limit: 30, ..Default::default() };
        let plan = params.plan().unwrap();

        let transfers = source.transfers(&plan).await.unwrap();
        assert!(!transfers.is_empty());
        assert!(transfers.len() <= 30);
        assert!(transfers.iter().all(|t| t.eth_amount >= 2500.0));

        let batch = source.last_batch();
        assert_eq!(batch.len(), 200);
        assert!(transfers.iter().all(|t| batch.contains(t)));
    }

    #[tokio::test]
    async fn threshold_above_range_gives_no_rows() {
        let source = SyntheticSource::with_seed(50, 3);
        let plan = DashboardParams { min_eth: 10_000.0, ..Default::default() }.plan().unwrap();
        assert!(source.transfers(&plan).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn largest_first_sorts_by_amount() {
        let source = SyntheticSource::with_seed(50, 5);
        let plan = DashboardParams { largest_first: true, ..Default::default() }.plan().unwrap();
        let transfers = source.transfers(&plan).await.unwrap();
        assert!(transfers.windows(2).all(|w| w[0].eth_amount >= w[1].eth_amount));
    }

    #[tokio::test]
    async fn top_senders_come_from_last_batch() {
        let source = SyntheticSource::with_seed(100, 9);
        let plan = DashboardParams::default().plan().unwrap();

        let transfers = source.transfers(&plan).await.unwrap();
        let senders = source.top_senders(&plan).await.unwrap();
        assert!(!senders.is_empty());
        let counted: u64 = senders.iter().map(|s| s.transfer_count).sum();
        assert!(counted as usize <= transfers.len());
        assert!(senders.windows(2).all(|w| w[0].total_eth_sent >= w[1].total_eth_sent));
        assert!(senders.iter().all(|s| s.transfer_count >= 2));
    }

    #[tokio::test]
    async fn top_senders_use_their_own_threshold() {
        let source = SyntheticSource::with_seed(200, 9);
        let low = DashboardParams::default().plan().unwrap();
        source.transfers(&low).await.unwrap();

        let high =
            DashboardParams { min_eth: 4000.0, min_sender_transfers: 1, ..Default::default() };
        let senders = source.top_senders(&high.plan().unwrap()).await.unwrap();
        let expected = source.last_batch().iter().filter(|t| t.eth_amount >= 4000.0).count();
        let counted: u64 = senders.iter().map(|s| s.transfer_count).sum();

        assert!(expected > 0);
        assert_eq!(counted as usize, expected);
        assert!(senders.iter().all(|s| s.largest_transfer >= 4000.0));
        assert!(senders.iter().all(|s| s.avg_eth_per_transfer >= 4000.0));
    }

    #[tokio::test]
    async fn top_senders_without_prior_transfers_generate_a_batch() {
        let source = SyntheticSource::with_seed(60, 4);
        let plan = DashboardParams { min_sender_transfers: 1, ..Default::default() };
        let senders = source.top_senders(&plan.plan().unwrap()).await.unwrap();
        assert_eq!(source.last_batch().len(), 60);
        assert!(!senders.is_empty());
    }
}
