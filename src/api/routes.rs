//! HTTP API route definitions.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::aws::advisor::CheckFinding;
use crate::aws::budgets::{BudgetCreated, BudgetRequest};
use crate::aws::cost::{
    Amount, CostBucket, CostGroup, CostReport, ForecastReport, ForecastWindow, InstanceSnapshot,
    Period, RightsizingEntry, RightsizingReport, RightsizingSummary, TargetOption,
};
use crate::aws::tagging::{ResourceInventory, TaggedResource};

use super::error::ErrorBody;
use super::handlers::{self, AppState, ConnectivityResponse};

/// One registered route; the source of truth for `/site-map`.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    /// HTTP method.
    pub method: &'static str,
    /// URL path.
    pub path: &'static str,
    /// Endpoint name.
    pub name: &'static str,
}

impl RouteEntry {
    /// GET routes without path parameters are navigable from a browser.
    pub fn browsable(&self) -> bool {
        self.method == "GET" && !self.path.contains(':') && !self.path.contains('{')
    }
}

/// Every registered route, in registration order.
pub const ROUTES: &[RouteEntry] = &[
    RouteEntry { method: "GET", path: "/", name: "index" },
    RouteEntry { method: "GET", path: "/site-map", name: "site_map" },
    RouteEntry { method: "GET", path: "/connectiontest", name: "connection_test" },
    RouteEntry { method: "GET", path: "/getallawsresources", name: "all_resources" },
    RouteEntry { method: "GET", path: "/getawscurrentmonthbill", name: "current_month_bill" },
    RouteEntry { method: "GET", path: "/getawslastmonthbill", name: "last_month_bill" },
    RouteEntry { method: "GET", path: "/getawsdailybillforcurmonth", name: "daily_bill_current_month" },
    RouteEntry { method: "GET", path: "/getawsdailybillforlastmonth", name: "daily_bill_last_month" },
    RouteEntry { method: "GET", path: "/getawsbillforecast", name: "bill_forecast" },
    RouteEntry { method: "GET", path: "/refreshawsrecommendations", name: "refresh_recommendations" },
    RouteEntry { method: "GET", path: "/getawsrecommendations", name: "recommendations" },
    RouteEntry { method: "GET", path: "/getrightsizerecc", name: "rightsizing" },
    RouteEntry { method: "GET", path: "/getec2costs", name: "ec2_costs" },
    RouteEntry { method: "GET", path: "/getrdscosts", name: "rds_costs" },
    RouteEntry { method: "POST", path: "/create/budgetnotification", name: "create_budget_notification" },
];

/// OpenAPI document for the gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "finops-gateway",
        description = "HTTP facade over AWS billing, budgeting, and advisory APIs"
    ),
    paths(
        handlers::connection_test,
        handlers::all_resources,
        handlers::current_month_bill,
        handlers::last_month_bill,
        handlers::daily_bill_current_month,
        handlers::daily_bill_last_month,
        handlers::bill_forecast,
        handlers::refresh_recommendations,
        handlers::recommendations,
        handlers::rightsizing,
        handlers::ec2_costs,
        handlers::rds_costs,
        handlers::create_budget_notification,
    ),
    components(schemas(
        ConnectivityResponse,
        ErrorBody,
        Amount,
        Period,
        CostBucket,
        CostGroup,
        CostReport,
        ForecastReport,
        ForecastWindow,
        RightsizingReport,
        RightsizingSummary,
        RightsizingEntry,
        InstanceSnapshot,
        TargetOption,
        ResourceInventory,
        TaggedResource,
        CheckFinding,
        BudgetRequest,
        BudgetCreated,
    ))
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/site-map", get(handlers::site_map))
        .route("/connectiontest", get(handlers::connection_test))
        .route("/getallawsresources", get(handlers::all_resources))
        .route("/getawscurrentmonthbill", get(handlers::current_month_bill))
        .route("/getawslastmonthbill", get(handlers::last_month_bill))
        .route("/getawsdailybillforcurmonth", get(handlers::daily_bill_current_month))
        .route("/getawsdailybillforlastmonth", get(handlers::daily_bill_last_month))
        .route("/getawsbillforecast", get(handlers::bill_forecast))
        .route("/refreshawsrecommendations", get(handlers::refresh_recommendations))
        .route("/getawsrecommendations", get(handlers::recommendations))
        .route("/getrightsizerecc", get(handlers::rightsizing))
        .route("/getec2costs", get(handlers::ec2_costs))
        .route("/getrdscosts", get(handlers::rds_costs))
        .route("/create/budgetnotification", post(handlers::create_budget_notification))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::aws::AwsSession;

    async fn test_state() -> AppState {
        let session =
            AwsSession::from_static_credentials("AKIATESTKEY", "testsecret", "us-east-1").await;
        AppState {
            aws: Arc::new(session),
            advisor_language: Arc::from("en"),
        }
    }

    #[tokio::test]
    async fn index_returns_ok() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn connectiontest_returns_ok() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/connectiontest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn site_map_lists_get_routes_only() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/site-map")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let links: Vec<(String, String)> = serde_json::from_slice(&bytes).unwrap();

        assert!(links.iter().any(|(path, _)| path == "/getawsbillforecast"));
        assert!(!links.iter().any(|(path, _)| path == "/create/budgetnotification"));
    }

    #[tokio::test]
    async fn budget_route_rejects_empty_body_fields() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create/budgetnotification")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn every_route_entry_has_a_name() {
        for route in ROUTES {
            assert!(!route.name.is_empty());
            assert!(route.path.starts_with('/'));
        }
    }
}
