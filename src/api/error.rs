//! Error-kind to HTTP status mapping for the API surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{
    AdvisorError, BudgetError, CostError, DateRangeError, GatewayError, TaggingError,
};

/// JSON body returned by every failing route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
    /// Stable error kind tag.
    pub kind: &'static str,
}

/// Route-level error wrapper carrying the HTTP mapping.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            // Caller mistakes are 400s; a failed upstream creation is not.
            GatewayError::Budget(BudgetError::CreateFailed { .. }) => StatusCode::BAD_GATEWAY,
            GatewayError::Budget(_) | GatewayError::DateRange(_) => StatusCode::BAD_REQUEST,
            GatewayError::Cost(_) | GatewayError::Advisor(_) | GatewayError::Tagging(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            GatewayError::Config(_) => "config",
            GatewayError::Bootstrap(_) => "bootstrap",
            GatewayError::DateRange(_) => "date_range",
            GatewayError::Cost(_) => "cost",
            GatewayError::Advisor(_) => "advisor",
            GatewayError::Budget(_) => "budget",
            GatewayError::Tagging(_) => "tagging",
            GatewayError::Json(_) => "json",
            GatewayError::Io(_) => "io",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl From<DateRangeError> for ApiError {
    fn from(e: DateRangeError) -> Self {
        Self(e.into())
    }
}

impl From<CostError> for ApiError {
    fn from(e: CostError) -> Self {
        Self(e.into())
    }
}

impl From<AdvisorError> for ApiError {
    fn from(e: AdvisorError) -> Self {
        Self(e.into())
    }
}

impl From<BudgetError> for ApiError {
    fn from(e: BudgetError) -> Self {
        Self(e.into())
    }
}

impl From<TaggingError> for ApiError {
    fn from(e: TaggingError) -> Self {
        Self(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_map_to_bad_request() {
        let error = ApiError::from(BudgetError::MissingField { field: "accountId" });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.kind(), "budget");

        let error = ApiError::from(DateRangeError::InvalidMonth { month: 13 });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let error = ApiError::from(CostError::Upstream {
            operation: "get_cost_and_usage",
            reason: "throttled".to_string(),
        });
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);

        let error = ApiError::from(BudgetError::CreateFailed {
            reason: "denied".to_string(),
        });
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);

        let error = ApiError::from(AdvisorError::ListChecks {
            reason: "no subscription".to_string(),
        });
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
    }
}
