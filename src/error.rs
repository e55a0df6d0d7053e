//! Unified error types for the gateway.

use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Credential bootstrap error.
    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Calendar range computation error.
    #[error("date range error: {0}")]
    DateRange(#[from] DateRangeError),

    /// Cost Explorer query error.
    #[error("cost query error: {0}")]
    Cost(#[from] CostError),

    /// Trusted Advisor error.
    #[error("advisor error: {0}")]
    Advisor(#[from] AdvisorError),

    /// Budget request or creation error.
    #[error("budget error: {0}")]
    Budget(#[from] BudgetError),

    /// Resource tagging inventory error.
    #[error("tagging error: {0}")]
    Tagging(#[from] TaggingError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup credential-resolution errors. All of these are fatal: the process
/// cannot serve any endpoint without a fully constructed session.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Parameter Store lookup failed.
    #[error("failed to fetch parameter {name}: {reason}")]
    ParameterLookup {
        /// Name of the parameter that failed.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Parameter exists but carries no value.
    #[error("parameter {name} has no value")]
    ParameterEmpty {
        /// Name of the empty parameter.
        name: String,
    },
}

/// Calendar range computation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateRangeError {
    /// Month outside the 1..=12 domain.
    #[error("month {month} is outside 1..=12")]
    InvalidMonth {
        /// The rejected month number.
        month: u32,
    },

    /// Resulting date cannot be represented.
    #[error("date out of representable range")]
    OutOfRange,
}

/// Cost Explorer query errors.
#[derive(Error, Debug)]
pub enum CostError {
    /// Upstream call failed.
    #[error("{operation} failed: {reason}")]
    Upstream {
        /// Upstream operation name.
        operation: &'static str,
        /// Reason for failure.
        reason: String,
    },

    /// The query could not be assembled.
    #[error("invalid cost query: {reason}")]
    InvalidQuery {
        /// Reason the query was rejected.
        reason: String,
    },
}

/// Trusted Advisor errors.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// The initial check-list fetch failed; nothing can be aggregated.
    #[error("failed to list advisory checks: {reason}")]
    ListChecks {
        /// Reason for failure.
        reason: String,
    },

    /// Fetching one check's summary failed.
    #[error("failed to fetch summary for check {check_id}: {reason}")]
    Summary {
        /// The check whose summary failed.
        check_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// The summaries response did not contain the requested check.
    #[error("no summary returned for check {check_id}")]
    MissingSummary {
        /// The check without a summary.
        check_id: String,
    },
}

/// Budget request and creation errors.
#[derive(Error, Debug)]
pub enum BudgetError {
    /// A required body field is absent or blank.
    #[error("missing or empty field: {field}")]
    MissingField {
        /// The wire name of the missing field.
        field: &'static str,
    },

    /// Time unit outside the allowed domain.
    #[error("timeUnit {value:?} is not one of DAILY, MONTHLY, QUARTERLY, ANNUALLY")]
    InvalidTimeUnit {
        /// The rejected value.
        value: String,
    },

    /// A numeric field did not parse as a decimal.
    #[error("{field} is not a decimal amount: {value:?}")]
    InvalidAmount {
        /// The wire name of the field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The upstream request could not be assembled.
    #[error("invalid budget request: {reason}")]
    InvalidRequest {
        /// Reason the request was rejected.
        reason: String,
    },

    /// Upstream budget creation failed.
    #[error("budget creation failed: {reason}")]
    CreateFailed {
        /// Reason for failure.
        reason: String,
    },
}

/// Resource tagging inventory errors.
#[derive(Error, Debug)]
pub enum TaggingError {
    /// Upstream inventory fetch failed.
    #[error("resource inventory fetch failed: {reason}")]
    Upstream {
        /// Reason for failure.
        reason: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
