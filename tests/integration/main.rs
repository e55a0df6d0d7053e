//! Integration tests for the gateway.
//!
//! Live tests require real AWS credentials plus the two Parameter Store
//! entries, and are opted into with FINOPS_LIVE_TESTS=1. Run with:
//! cargo test --test integration -- --ignored
//!
//! Note: these tests interact with real AWS billing APIs.

use finops_gateway::aws::AwsSession;
use finops_gateway::config::Config;
use finops_gateway::dates;

/// Get a live-test config from environment, or None to skip.
fn live_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    if std::env::var("FINOPS_LIVE_TESTS").is_err() {
        return None;
    }

    let config = Config::load().ok()?;
    config.validate().ok()?;
    Some(config)
}

/// Bootstrap resolves both parameters and constructs every handle.
#[tokio::test]
#[ignore = "requires AWS credentials and SSM parameters"]
async fn bootstrap_builds_all_handles() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: FINOPS_LIVE_TESTS not set");
            return;
        }
    };

    let result = AwsSession::bootstrap(&config).await;
    assert!(result.is_ok(), "Bootstrap failed: {:?}", result.err());

    let session = result.expect("bootstrap succeeded");
    assert_eq!(session.region(), config.aws_region);
    println!("Session region: {}", session.region());
}

/// The current-month query returns at least one bucket.
#[tokio::test]
#[ignore = "requires AWS credentials and SSM parameters"]
async fn current_month_cost_query_returns_buckets() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: FINOPS_LIVE_TESTS not set");
            return;
        }
    };

    let session = AwsSession::bootstrap(&config)
        .await
        .expect("bootstrap succeeded");
    let range = dates::current_month(dates::today()).expect("current month is valid");

    let report = session
        .cost_and_usage(&finops_gateway::aws::cost::MONTHLY_AMORTIZED, &range)
        .await
        .expect("cost query succeeded");

    println!("Buckets: {}", report.results_by_time.len());
    assert!(!report.results_by_time.is_empty());
    for bucket in &report.results_by_time {
        if let Some(total) = bucket.total.get("AmortizedCost") {
            println!("  {} {}", total.amount, total.unit);
        }
    }
}

/// The advisory aggregation never reports quiet checks and keys every
/// discovered category.
#[tokio::test]
#[ignore = "requires AWS credentials, SSM parameters, and a support plan"]
async fn advisory_aggregation_filters_quiet_checks() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: FINOPS_LIVE_TESTS not set");
            return;
        }
    };

    let session = AwsSession::bootstrap(&config)
        .await
        .expect("bootstrap succeeded");

    let (report, failures) = session
        .advisory_recommendations(&config.advisor_language)
        .await
        .expect("aggregation succeeded");

    println!(
        "Categories: {}, skipped checks: {}",
        report.len(),
        failures.len()
    );

    for (category, rows) in &report {
        println!("  {}: {} rows", category, rows.len());
        for row in rows {
            assert!(!row.name.is_empty());
            assert!(!row.status.is_empty());
            assert_ne!(row.status, "ok");
            assert_ne!(row.status, "not_available");
        }
    }
}

/// The tagged-resource inventory is fetchable.
#[tokio::test]
#[ignore = "requires AWS credentials and SSM parameters"]
async fn resource_inventory_is_fetchable() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: FINOPS_LIVE_TESTS not set");
            return;
        }
    };

    let session = AwsSession::bootstrap(&config)
        .await
        .expect("bootstrap succeeded");

    let inventory = session
        .resource_inventory()
        .await
        .expect("inventory fetch succeeded");

    println!("Resources: {}", inventory.resources.len());
    for resource in inventory.resources.iter().take(5) {
        println!("  {} ({} tags)", resource.resource_arn, resource.tags.len());
    }
}

/// Offline: a session built from static credentials drives the full router.
#[tokio::test]
async fn router_builds_from_static_session() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use finops_gateway::api::{create_router, AppState};
    use tower::ServiceExt;

    let session =
        AwsSession::from_static_credentials("AKIATESTKEY", "testsecret", "us-east-1").await;
    let config = Config {
        aws_region: "us-east-1".to_string(),
        ..test_defaults()
    };
    let app = create_router(AppState::new(session, &config));

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

fn test_defaults() -> Config {
    Config {
        access_key_param: "tenant1_access_key".to_string(),
        secret_key_param: "tenant1_secret_key".to_string(),
        aws_region: "ap-south-1".to_string(),
        advisor_language: "en".to_string(),
        port: 8080,
        rust_log: "info".to_string(),
        verbose: false,
        metrics_enabled: true,
        metrics_port: 9090,
    }
}
