//! HTTP API handlers.
//!
//! Each handler is one upstream round trip (or a short fixed sequence)
//! behind a date-range computation; results go back as JSON untouched.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::aws::advisor::RecommendationReport;
use crate::aws::budgets::{BudgetCreated, BudgetRequest};
use crate::aws::cost::{
    CostReport, ForecastReport, RightsizingReport, DAILY_AMORTIZED, EC2_BY_RESOURCE,
    MONTHLY_AMORTIZED, RDS_BY_RESOURCE,
};
use crate::aws::tagging::ResourceInventory;
use crate::aws::AwsSession;
use crate::config::Config;
use crate::dates::{self, TRAILING_WINDOW_DAYS};
use crate::utils;

use super::error::{ApiError, ErrorBody};
use super::routes::ROUTES;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only capability handles, built once at startup.
    pub aws: Arc<AwsSession>,
    /// Language advisory checks are described in.
    pub advisor_language: Arc<str>,
}

impl AppState {
    /// Wrap the session for sharing across requests.
    pub fn new(aws: AwsSession, config: &Config) -> Self {
        Self {
            aws: Arc::new(aws),
            advisor_language: Arc::from(config.advisor_language.as_str()),
        }
    }
}

/// Connectivity probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectivityResponse {
    /// Always `success` when the process is serving.
    pub connectivity: &'static str,
    /// Hostname of the serving process.
    pub host: String,
}

const INDEX_TEXT: &str = "\
FinOps is the practice of bringing financial accountability to the variable \
spend model of cloud, enabling distributed teams to make business trade-offs \
between speed, cost, and quality.

Billing, budgeting, and advisory endpoints are listed at /site-map.
";

/// Informational landing text.
pub async fn index() -> &'static str {
    INDEX_TEXT
}

/// `[url, endpoint-name]` pairs for every browsable route.
pub async fn site_map() -> Json<Vec<(&'static str, &'static str)>> {
    Json(
        ROUTES
            .iter()
            .filter(|route| route.browsable())
            .map(|route| (route.path, route.name))
            .collect(),
    )
}

/// Connectivity probe.
#[utoipa::path(get, path = "/connectiontest",
    responses((status = 200, description = "Process is serving", body = ConnectivityResponse)))]
pub async fn connection_test() -> Json<ConnectivityResponse> {
    Json(ConnectivityResponse {
        connectivity: "success",
        host: utils::hostname(),
    })
}

/// Tagged-resource inventory for the session's region.
#[utoipa::path(get, path = "/getallawsresources",
    responses(
        (status = 200, description = "Tagged resources", body = ResourceInventory),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn all_resources(
    State(state): State<AppState>,
) -> Result<Json<ResourceInventory>, ApiError> {
    Ok(Json(state.aws.resource_inventory().await?))
}

/// Current-month amortized cost, one monthly bucket.
#[utoipa::path(get, path = "/getawscurrentmonthbill",
    responses(
        (status = 200, description = "Monthly amortized cost", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn current_month_bill(
    State(state): State<AppState>,
) -> Result<Json<CostReport>, ApiError> {
    let range = dates::current_month(dates::today())?;
    Ok(Json(state.aws.cost_and_usage(&MONTHLY_AMORTIZED, &range).await?))
}

/// Last-month amortized cost, one monthly bucket.
#[utoipa::path(get, path = "/getawslastmonthbill",
    responses(
        (status = 200, description = "Monthly amortized cost", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn last_month_bill(
    State(state): State<AppState>,
) -> Result<Json<CostReport>, ApiError> {
    let range = dates::previous_month(dates::today())?;
    Ok(Json(state.aws.cost_and_usage(&MONTHLY_AMORTIZED, &range).await?))
}

/// Daily amortized-cost series for the current month.
#[utoipa::path(get, path = "/getawsdailybillforcurmonth",
    responses(
        (status = 200, description = "Daily amortized cost", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn daily_bill_current_month(
    State(state): State<AppState>,
) -> Result<Json<CostReport>, ApiError> {
    let range = dates::current_month(dates::today())?;
    Ok(Json(state.aws.cost_and_usage(&DAILY_AMORTIZED, &range).await?))
}

/// Daily amortized-cost series for last month.
#[utoipa::path(get, path = "/getawsdailybillforlastmonth",
    responses(
        (status = 200, description = "Daily amortized cost", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn daily_bill_last_month(
    State(state): State<AppState>,
) -> Result<Json<CostReport>, ApiError> {
    let range = dates::previous_month(dates::today())?;
    Ok(Json(state.aws.cost_and_usage(&DAILY_AMORTIZED, &range).await?))
}

/// One-month-ahead amortized-cost forecast.
#[utoipa::path(get, path = "/getawsbillforecast",
    responses(
        (status = 200, description = "Cost forecast", body = ForecastReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn bill_forecast(
    State(state): State<AppState>,
) -> Result<Json<ForecastReport>, ApiError> {
    let range = dates::forecast_horizon(dates::today())?;
    Ok(Json(state.aws.cost_forecast(&range).await?))
}

/// Trigger a refresh of every advisory check.
#[utoipa::path(get, path = "/refreshawsrecommendations",
    responses(
        (status = 200, description = "Refresh sweep triggered", body = String),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn refresh_recommendations(
    State(state): State<AppState>,
) -> Result<&'static str, ApiError> {
    state
        .aws
        .refresh_advisory_checks(&state.advisor_language)
        .await?;
    Ok("Refreshed")
}

/// Category → actionable advisory findings.
#[utoipa::path(get, path = "/getawsrecommendations",
    responses(
        (status = 200, description = "Findings bucketed by category", body = RecommendationReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn recommendations(
    State(state): State<AppState>,
) -> Result<Json<RecommendationReport>, ApiError> {
    let (report, failures) = state
        .aws
        .advisory_recommendations(&state.advisor_language)
        .await?;

    if !failures.is_empty() {
        warn!(skipped = failures.len(), "Some advisory checks were skipped");
    }

    Ok(Json(report))
}

/// EC2 cross-instance-family rightsizing recommendation.
#[utoipa::path(get, path = "/getrightsizerecc",
    responses(
        (status = 200, description = "Rightsizing recommendation", body = RightsizingReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn rightsizing(
    State(state): State<AppState>,
) -> Result<Json<RightsizingReport>, ApiError> {
    Ok(Json(state.aws.rightsizing_recommendation().await?))
}

/// Daily EC2 cost by resource id for the trailing 14 days.
#[utoipa::path(get, path = "/getec2costs",
    responses(
        (status = 200, description = "Daily cost by resource", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn ec2_costs(State(state): State<AppState>) -> Result<Json<CostReport>, ApiError> {
    let range = dates::trailing_window(dates::today(), TRAILING_WINDOW_DAYS)?;
    Ok(Json(state.aws.cost_by_resource(&EC2_BY_RESOURCE, &range).await?))
}

/// Daily RDS cost by resource id for the trailing 14 days.
#[utoipa::path(get, path = "/getrdscosts",
    responses(
        (status = 200, description = "Daily cost by resource", body = CostReport),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn rds_costs(State(state): State<AppState>) -> Result<Json<CostReport>, ApiError> {
    let range = dates::trailing_window(dates::today(), TRAILING_WINDOW_DAYS)?;
    Ok(Json(state.aws.cost_by_resource(&RDS_BY_RESOURCE, &range).await?))
}

/// Create a budget with one email notification.
#[utoipa::path(post, path = "/create/budgetnotification",
    request_body = BudgetRequest,
    responses(
        (status = 200, description = "Budget created", body = BudgetCreated),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 502, description = "Upstream failure", body = ErrorBody)))]
pub async fn create_budget_notification(
    State(state): State<AppState>,
    Json(request): Json<BudgetRequest>,
) -> Result<Json<BudgetCreated>, ApiError> {
    let spec = request.validate()?;
    Ok(Json(state.aws.create_budget_notification(&spec).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connection_test_reports_success_and_host() {
        let Json(response) = connection_test().await;
        assert_eq!(response.connectivity, "success");
        assert!(!response.host.is_empty());
    }

    #[tokio::test]
    async fn site_map_lists_only_browsable_routes() {
        let Json(links) = site_map().await;

        assert!(links.iter().any(|(path, _)| *path == "/getawscurrentmonthbill"));
        assert!(links.iter().any(|(path, _)| *path == "/site-map"));
        // POST-only routes never show up.
        assert!(!links.iter().any(|(path, _)| *path == "/create/budgetnotification"));
    }
}
