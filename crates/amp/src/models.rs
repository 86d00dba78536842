use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A transfer returned by the transfer templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransferRecord {
    /// Block timestamp as sent by the server
    #[serde(default, alias = "block_timestamp", deserialize_with = "de_string_opt")]
    pub timestamp: Option<String>,
    /// Block number
    #[serde(alias = "block_number", deserialize_with = "de_u64")]
    pub block_num: u64,
    /// Transaction hash
    #[serde(alias = "tx_hash")]
    pub transaction_hash: String,
    /// Sender address
    pub from_address: String,
    /// Recipient address
    pub to_address: String,
    /// Value in ETH
    #[serde(deserialize_with = "de_f64")]
    pub eth_amount: f64,
    /// Gas price in gwei
    #[serde(default, deserialize_with = "de_f64_opt", skip_serializing_if = "Option::is_none")]
    pub gas_gwei: Option<f64>,
    /// Gas used
    #[serde(default, deserialize_with = "de_u64_opt", skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Fee paid in ETH
    #[serde(default, deserialize_with = "de_f64_opt", skip_serializing_if = "Option::is_none")]
    pub gas_fee_eth: Option<f64>,
}

impl TransferRecord {
    /// Parsed block time, if the server sent a recognizable timestamp.
    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Per-sender statistics returned by the top senders template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WhaleAggregate {
    /// Sender address
    pub from_address: String,
    /// Number of qualifying transfers
    #[serde(deserialize_with = "de_u64")]
    pub transfer_count: u64,
    /// Total ETH sent
    #[serde(deserialize_with = "de_f64")]
    pub total_eth_sent: f64,
    /// Average ETH per transfer
    #[serde(deserialize_with = "de_f64")]
    pub avg_eth_per_transfer: f64,
    /// Largest single transfer in ETH
    #[serde(deserialize_with = "de_f64")]
    pub largest_transfer: f64,
}

/// Summary row returned by the whale stats template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WhaleStats {
    /// Number of transfers above the threshold
    #[serde(deserialize_with = "de_u64")]
    pub whale_count: u64,
    /// Largest transfer in ETH, `None` without transfers
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub largest_transfer: Option<f64>,
    /// Average transfer in ETH, `None` without transfers
    #[serde(default, deserialize_with = "de_f64_opt")]
    pub avg_transfer: Option<f64>,
}

/// Parse the timestamp formats Amp is known to emit: RFC 3339, a space
/// separated UTC date time, or a unix timestamp in seconds or milliseconds.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let secs: i64 = raw.parse().ok()?;
    if secs > 10_000_000_000 {
        Utc.timestamp_millis_opt(secs).single()
    } else {
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// Scalars arrive either as JSON numbers or as strings, depending on the
/// column type on the server.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64().or_else(|| {
                n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)
            }),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Scalar::deserialize(d)?
        .as_f64()
        .ok_or_else(|| serde::de::Error::custom("expected a number or numeric string"))
}

fn de_f64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(s) => s
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a number or numeric string")),
    }
}

fn de_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Scalar::deserialize(d)?
        .as_u64()
        .ok_or_else(|| serde::de::Error::custom("expected an unsigned integer"))
}

fn de_u64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(s) => {
            s.as_u64().map(Some).ok_or_else(|| serde::de::Error::custom("expected an unsigned integer"))
        }
    }
}

fn de_string_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
}
