//! Trusted Advisor aggregation.
//!
//! The one handler with actual control flow: list every advisory check,
//! bucket them by category, and keep a finding row for each check whose
//! current status is actionable. A check that fails along the way is
//! recorded and skipped, never fatal for its siblings; only the initial
//! check-list fetch can fail the whole pass.

use std::collections::BTreeMap;
use std::time::Instant;

use aws_sdk_support::types::{
    TrustedAdvisorCheckDescription, TrustedAdvisorCheckSummary, TrustedAdvisorResourcesSummary,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::AdvisorError;
use crate::metrics::{
    inc_advisor_checks_skipped, inc_upstream_calls, inc_upstream_failures,
    record_upstream_latency,
};

use super::session::AwsSession;

/// Statuses that never produce a finding row.
const QUIET_STATUSES: [&str; 2] = ["ok", "not_available"];

static RECOMMENDED_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<b>Recommended Action</b>(.*?)<b>Additional Resources</b>")
        .expect("recommended-action pattern is valid")
});

/// One actionable advisory finding.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckFinding {
    /// Check name.
    pub name: String,
    /// Current check status.
    pub status: String,
    /// Resources the check examined.
    pub resources_processed: i64,
    /// Resources the check flagged.
    pub resources_flagged: i64,
    /// Resources suppressed from the check.
    pub resources_suppressed: i64,
    /// Resources the check ignored.
    pub resources_ignored: i64,
    /// Recommended-action text extracted from the check description.
    pub recommended_action: String,
}

/// Category name to finding rows. Every category discovered in the check
/// list is keyed, even when its bucket stays empty.
pub type RecommendationReport = BTreeMap<String, Vec<CheckFinding>>;

/// A check the aggregation pass had to skip.
#[derive(Debug, Clone)]
pub struct CheckFailure {
    /// Check id.
    pub check_id: String,
    /// Check name.
    pub name: String,
    /// Why the check was skipped.
    pub reason: String,
}

struct CheckOutcome {
    category: String,
    check_id: String,
    name: String,
    result: Result<Option<CheckFinding>, AdvisorError>,
}

/// Text between the `Recommended Action` and `Additional Resources` markers
/// of a check description, with line-break markup removed. Empty when the
/// markers are absent.
pub fn extract_recommended_action(description: &str) -> String {
    let Some(captures) = RECOMMENDED_ACTION.captures(description) else {
        return String::new();
    };
    let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    raw.replace("<br>", "")
        .replace("<br/>", "")
        .replace("<br />", "")
        .replace("\\n", "")
        .replace('\n', "")
        .trim()
        .to_string()
}

impl AwsSession {
    /// Build the category → findings report.
    #[instrument(skip(self))]
    pub async fn advisory_recommendations(
        &self,
        language: &str,
    ) -> Result<(RecommendationReport, Vec<CheckFailure>), AdvisorError> {
        let checks = self.list_advisory_checks(language).await?;

        let mut outcomes = Vec::with_capacity(checks.len());
        for check in &checks {
            let result = self.check_finding(check).await;
            outcomes.push(CheckOutcome {
                category: check.category().to_string(),
                check_id: check.id().to_string(),
                name: check.name().to_string(),
                result,
            });
        }

        Ok(fold_outcomes(outcomes))
    }

    /// Ask the platform to refresh every advisory check. Refresh results are
    /// not awaited; checks the platform refuses to refresh are skipped.
    #[instrument(skip(self))]
    pub async fn refresh_advisory_checks(&self, language: &str) -> Result<u64, AdvisorError> {
        let checks = self.list_advisory_checks(language).await?;

        let mut refreshed = 0u64;
        for check in &checks {
            inc_upstream_calls("refresh_trusted_advisor_check");
            match self
                .support
                .refresh_trusted_advisor_check()
                .check_id(check.id())
                .send()
                .await
            {
                Ok(_) => refreshed += 1,
                Err(e) => {
                    inc_upstream_failures("refresh_trusted_advisor_check");
                    warn!(check_id = check.id(), error = %e, "Check refresh rejected");
                }
            }
        }

        info!(refreshed, total = checks.len(), "Advisory refresh sweep complete");
        Ok(refreshed)
    }

    async fn list_advisory_checks(
        &self,
        language: &str,
    ) -> Result<Vec<TrustedAdvisorCheckDescription>, AdvisorError> {
        inc_upstream_calls("describe_trusted_advisor_checks");
        let start = Instant::now();

        let output = self
            .support
            .describe_trusted_advisor_checks()
            .language(language)
            .send()
            .await
            .map_err(|e| {
                inc_upstream_failures("describe_trusted_advisor_checks");
                AdvisorError::ListChecks {
                    reason: e.to_string(),
                }
            })?;
        record_upstream_latency(start, "describe_trusted_advisor_checks");

        Ok(output.checks().to_vec())
    }

    /// One check's finding, or `None` when its status is quiet.
    async fn check_finding(
        &self,
        check: &TrustedAdvisorCheckDescription,
    ) -> Result<Option<CheckFinding>, AdvisorError> {
        let summary = self.check_summary(check.id()).await?;
        Ok(finding(
            check.name(),
            check.description(),
            &summary,
        ))
    }

    async fn check_summary(
        &self,
        check_id: &str,
    ) -> Result<TrustedAdvisorCheckSummary, AdvisorError> {
        inc_upstream_calls("describe_trusted_advisor_check_summaries");
        let start = Instant::now();

        let output = self
            .support
            .describe_trusted_advisor_check_summaries()
            .check_ids(Some(check_id.to_string()))
            .send()
            .await
            .map_err(|e| {
                inc_upstream_failures("describe_trusted_advisor_check_summaries");
                AdvisorError::Summary {
                    check_id: check_id.to_string(),
                    reason: e.to_string(),
                }
            })?;
        record_upstream_latency(start, "describe_trusted_advisor_check_summaries");

        output
            .summaries()
            .first()
            .cloned()
            .ok_or_else(|| AdvisorError::MissingSummary {
                check_id: check_id.to_string(),
            })
    }
}

/// Build a finding row from a check and its summary, unless the status is
/// quiet.
fn finding(
    name: &str,
    description: &str,
    summary: &TrustedAdvisorCheckSummary,
) -> Option<CheckFinding> {
    let status = summary.status();
    if QUIET_STATUSES.contains(&status) {
        return None;
    }

    let resources = summary.resources_summary();
    Some(CheckFinding {
        name: name.to_string(),
        status: status.to_string(),
        resources_processed: resources?.resources_processed(),
        resources_flagged: resources?.resources_flagged(),
        resources_suppressed: resources?.resources_suppressed(),
        resources_ignored: resources?.resources_ignored(),
        recommended_action: extract_recommended_action(description),
    })
}

/// Fold per-check outcomes into the report plus the skipped-check list.
fn fold_outcomes(outcomes: Vec<CheckOutcome>) -> (RecommendationReport, Vec<CheckFailure>) {
    let mut report: RecommendationReport = outcomes
        .iter()
        .map(|o| (o.category.clone(), Vec::new()))
        .collect();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(Some(finding)) => {
                report.entry(outcome.category).or_default().push(finding);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    check_id = %outcome.check_id,
                    name = %outcome.name,
                    error = %e,
                    "Skipping advisory check"
                );
                inc_advisor_checks_skipped();
                failures.push(CheckFailure {
                    check_id: outcome.check_id,
                    name: outcome.name,
                    reason: e.to_string(),
                });
            }
        }
    }

    (report, failures)
}
