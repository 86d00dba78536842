//! Data types for the Whalescope API.
//!
//! These structs define the JSON responses returned by the API server. They
//! are provided in a separate crate so that consumers can depend on them
//! without pulling in the rest of the server implementation.

#![allow(missing_docs)]

use amp::{Diagnostic, ErrorKind, TransferRecord, WhaleAggregate};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransfersResponse {
    pub min_eth: f64,
    pub hours: u32,
    pub transfers: Vec<TransferRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopSendersResponse {
    pub min_eth: f64,
    pub hours: u32,
    pub senders: Vec<WhaleAggregate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub status: String,
}

/// Problem details returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(
        r#type: impl Into<String>,
        title: impl Into<String>,
        status: StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// 400 for rejected query parameters.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new("invalid-params", "Bad Request", StatusCode::BAD_REQUEST, detail)
    }

    /// 502 for a failed Amp query.
    pub fn upstream(diagnostic: &Diagnostic) -> Self {
        let r#type = match diagnostic.kind {
            ErrorKind::Unreachable | ErrorKind::Timeout => "upstream-unreachable",
            ErrorKind::ServerError => "upstream-error",
            ErrorKind::InvalidResponse | ErrorKind::Schema => "upstream-invalid-response",
        };
        Self::new(
            r#type,
            diagnostic.kind.title(),
            StatusCode::BAD_GATEWAY,
            diagnostic.message.clone(),
        )
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_their_class() {
        let unreachable = ErrorResponse::upstream(&Diagnostic {
            kind: ErrorKind::Unreachable,
            message: "connection refused".to_owned(),
        });
        assert_eq!(unreachable.r#type, "upstream-unreachable");
        assert_eq!(unreachable.status_code(), StatusCode::BAD_GATEWAY);

        let invalid = ErrorResponse::upstream(&Diagnostic {
            kind: ErrorKind::InvalidResponse,
            message: "line 1 is not valid JSON".to_owned(),
        });
        assert_eq!(invalid.r#type, "upstream-invalid-response");
        assert_eq!(invalid.detail, "line 1 is not valid JSON");
    }

    #[test]
    fn serializes_type_field() {
        let json = serde_json::to_value(ErrorResponse::invalid_params("hours must be positive"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "invalid-params",
                "title": "Bad Request",
                "status": 400,
                "detail": "hours must be positive"
            })
        );
    }
}
