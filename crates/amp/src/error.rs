use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

/// Errors produced while executing a query against Amp.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The endpoint could not be reached at all.
    #[error("cannot connect to Amp server at {url}: {source}")]
    Unreachable {
        /// Endpoint that was contacted
        url: Url,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },
    /// No response within the request timeout.
    #[error("request to Amp server at {url} timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Endpoint that was contacted
        url: Url,
        /// Bound that was exceeded
        timeout: Duration,
    },
    /// The endpoint answered with a non-success status.
    #[error("Amp server returned an error ({status}): {body}")]
    Status {
        /// HTTP status code
        status: StatusCode,
        /// Start of the response body
        body: String,
    },
    /// The status was fine but the body could not be read.
    #[error("failed to read Amp response body: {0}")]
    Body(#[source] reqwest::Error),
    /// A response line is not valid JSON.
    #[error("malformed JSON on line {line} of Amp response: {source}")]
    Parse {
        /// 1-based line number in the response body
        line: usize,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },
    /// A response line is valid JSON but not an object.
    #[error("line {line} of Amp response is not a JSON object")]
    NotAnObject {
        /// 1-based line number in the response body
        line: usize,
    },
    /// A row does not match the typed model it is decoded into.
    #[error("row {row} does not match the expected schema: {source}")]
    Schema {
        /// 0-based row index
        row: usize,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse classification of a [`QueryError`], used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Endpoint not reachable
    Unreachable,
    /// Request timed out
    Timeout,
    /// Endpoint reachable but returned an error
    ServerError,
    /// Response body is not newline-delimited JSON objects
    InvalidResponse,
    /// Rows do not match the expected columns
    Schema,
}

impl ErrorKind {
    /// Whether the failure happened before a usable response was received.
    pub const fn is_transport(self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout | Self::ServerError)
    }

    /// Short title shown to the user.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Unreachable => "Cannot connect to Amp server",
            Self::Timeout => "Amp server did not answer in time",
            Self::ServerError => "Amp server returned an error",
            Self::InvalidResponse => "Amp server sent an invalid response",
            Self::Schema => "Unexpected columns in Amp response",
        }
    }

    /// Actionable hint for the user.
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Unreachable => "Make sure your Amp server is running and the URL is correct.",
            Self::Timeout => "The query may be too expensive; try a shorter time window.",
            Self::ServerError => {
                "Check the dataset name (it needs an @version suffix) and the server logs."
            }
            Self::InvalidResponse | Self::Schema => {
                "The server answered but the data could not be read; check the Amp version."
            }
        }
    }
}

impl QueryError {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable { .. } => ErrorKind::Unreachable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Status { .. } | Self::Body(_) => ErrorKind::ServerError,
            Self::Parse { .. } | Self::NotAnObject { .. } => ErrorKind::InvalidResponse,
            Self::Schema { .. } => ErrorKind::Schema,
        }
    }

    /// Transport failure: unreachable, timed out or non-success status.
    pub const fn is_transport(&self) -> bool {
        self.kind().is_transport()
    }

    /// The response arrived but is not valid newline-delimited JSON.
    pub const fn is_parse(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidResponse)
    }
}

/// Serializable description of a failed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Diagnostic {
    /// Failure class
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
}

impl From<&QueryError> for Diagnostic {
    fn from(err: &QueryError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

impl From<QueryError> for Diagnostic {
    fn from(err: QueryError) -> Self {
        Self::from(&err)
    }
}
