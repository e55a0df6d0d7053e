//! AWS provider integration.
//!
//! This module handles:
//! - Credential bootstrap and the capability handles
//! - Cost Explorer queries
//! - Trusted Advisor aggregation
//! - Budget creation
//! - Tagged-resource inventory

pub mod advisor;
pub mod budgets;
pub mod cost;
pub mod session;
pub mod tagging;

pub use advisor::{extract_recommended_action, CheckFailure, CheckFinding, RecommendationReport};
pub use budgets::{BudgetCreated, BudgetRequest, BudgetSpec, BudgetTimeUnit};
pub use cost::{CostReport, ForecastReport, RightsizingReport};
pub use session::AwsSession;
pub use tagging::ResourceInventory;
