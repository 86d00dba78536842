use std::{fmt, str::FromStr};

use thiserror::Error;

/// Default dataset holding raw Ethereum transactions.
pub const DEFAULT_DATASET: &str = "ethereum/eth_rpc@latest";

/// Versioned dataset identifier: `<network>/<dataset>@<version>`.
///
/// Parts are restricted to ASCII alphanumerics, `_`, `-` and `.`, so the
/// identifier can be quoted into SQL as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dataset {
    network: String,
    name: String,
    version: String,
}

/// Invalid dataset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// No `/` between network and dataset.
    #[error("dataset `{0}` must look like <network>/<dataset>@<version>")]
    Malformed(String),
    /// One of the parts is empty.
    #[error("dataset `{0}` has an empty {1}")]
    EmptyPart(String, &'static str),
    /// A part contains a character outside the allowed set.
    #[error("dataset `{0}` contains invalid character `{1}`")]
    InvalidChar(String, char),
}

impl Dataset {
    /// Network part, e.g. `ethereum`.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Dataset name, e.g. `eth_rpc`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version, e.g. `latest`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Fully qualified reference to `table` in this dataset.
    pub fn table(&self, table: &str) -> String {
        format!("\"{self}\".{table}")
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            network: "ethereum".to_owned(),
            name: "eth_rpc".to_owned(),
            version: "latest".to_owned(),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.network, self.name, self.version)
    }
}

impl FromStr for Dataset {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, rest) =
            s.split_once('/').ok_or_else(|| DatasetError::Malformed(s.to_owned()))?;
        let (name, version) =
            rest.split_once('@').ok_or_else(|| DatasetError::Malformed(s.to_owned()))?;

        for (part, label) in [(network, "network"), (name, "dataset name"), (version, "version")] {
            if part.is_empty() {
                return Err(DatasetError::EmptyPart(s.to_owned(), label));
            }
            if let Some(c) =
                part.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
            {
                return Err(DatasetError::InvalidChar(s.to_owned(), c));
            }
        }

        Ok(Self { network: network.to_owned(), name: name.to_owned(), version: version.to_owned() })
    }
}
