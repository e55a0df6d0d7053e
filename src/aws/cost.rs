//! Cost Explorer queries.
//!
//! Every reporting route is a declarative request template executed by one
//! of the generic call sites below; the upstream result is projected
//! field-for-field into a serializable report, never reshaped.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use aws_sdk_costexplorer::types::{
    CurrentInstance, DateInterval, Dimension, DimensionValues, Expression, ForecastResult,
    Granularity, Group, GroupDefinition, GroupDefinitionType, Metric, MetricValue,
    RecommendationTarget, ResultByTime, RightsizingRecommendation,
    RightsizingRecommendationConfiguration, RightsizingRecommendationSummary, TargetInstance,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::dates::DateRange;
use crate::error::CostError;
use crate::metrics::{inc_upstream_calls, inc_upstream_failures, record_upstream_latency};

use super::session::AwsSession;

// === Request Templates ===

/// Declarative shape of a cost-and-usage query.
#[derive(Debug, Clone)]
pub struct UsageQuery {
    /// Time bucketing of the result.
    pub granularity: Granularity,
    /// Metric names to request.
    pub metrics: &'static [&'static str],
}

/// Declarative shape of a per-resource cost query: daily buckets grouped by
/// resource id, filtered to one service.
#[derive(Debug, Clone)]
pub struct ResourceUsageQuery {
    /// SERVICE dimension value to filter on.
    pub service: &'static str,
    /// Metric names to request.
    pub metrics: &'static [&'static str],
}

/// Monthly amortized cost, one bucket per month.
pub const MONTHLY_AMORTIZED: UsageQuery = UsageQuery {
    granularity: Granularity::Monthly,
    metrics: &["AmortizedCost"],
};

/// Daily amortized cost series.
pub const DAILY_AMORTIZED: UsageQuery = UsageQuery {
    granularity: Granularity::Daily,
    metrics: &["AmortizedCost"],
};

const RESOURCE_METRICS: &[&str] = &["BlendedCost", "UnblendedCost", "UsageQuantity"];

/// Daily EC2 cost by resource id.
pub const EC2_BY_RESOURCE: ResourceUsageQuery = ResourceUsageQuery {
    service: "Amazon Elastic Compute Cloud - Compute",
    metrics: RESOURCE_METRICS,
};

/// Daily RDS cost by resource id.
pub const RDS_BY_RESOURCE: ResourceUsageQuery = ResourceUsageQuery {
    service: "RDS",
    metrics: RESOURCE_METRICS,
};

// === Report Shapes ===

/// One metric amount as reported upstream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Amount {
    /// Numeric value, kept as the upstream string.
    pub amount: String,
    /// Unit of measurement.
    pub unit: String,
}

/// A start/end pair in `YYYY-MM-DD` form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Period {
    /// Range start.
    pub start: String,
    /// Range end.
    pub end: String,
}

/// One time bucket of a cost-and-usage result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostBucket {
    /// Bucket boundaries.
    pub time_period: Option<Period>,
    /// Metric totals for the bucket.
    pub total: BTreeMap<String, Amount>,
    /// Per-group breakdown when the query grouped.
    pub groups: Vec<CostGroup>,
    /// Whether the bucket is an estimate.
    pub estimated: bool,
}

/// One group inside a cost bucket.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CostGroup {
    /// Group-by key values.
    pub keys: Vec<String>,
    /// Metric amounts for the group.
    pub metrics: BTreeMap<String, Amount>,
}

/// Cost-and-usage result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    /// Buckets in query order.
    pub results_by_time: Vec<CostBucket>,
}

/// Cost forecast result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    /// Forecast total over the whole horizon.
    pub total: Option<Amount>,
    /// Per-bucket forecast windows.
    pub forecast_results_by_time: Vec<ForecastWindow>,
}

/// One forecast bucket.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastWindow {
    /// Bucket boundaries.
    pub time_period: Option<Period>,
    /// Mean predicted value.
    pub mean_value: String,
    /// Lower bound of the prediction interval.
    pub prediction_interval_lower_bound: String,
    /// Upper bound of the prediction interval.
    pub prediction_interval_upper_bound: String,
}

/// Rightsizing recommendation result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RightsizingReport {
    /// Savings summary across all recommendations.
    pub summary: Option<RightsizingSummary>,
    /// Per-instance recommendations.
    pub recommendations: Vec<RightsizingEntry>,
}

/// Savings summary for a rightsizing result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RightsizingSummary {
    /// Number of recommendations.
    pub total_recommendation_count: String,
    /// Estimated total monthly savings.
    pub estimated_total_monthly_savings_amount: String,
    /// Savings currency code.
    pub savings_currency_code: String,
    /// Savings as a percentage of monthly cost.
    pub savings_percentage: String,
}

/// One rightsizing recommendation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RightsizingEntry {
    /// Account the instance belongs to.
    pub account_id: String,
    /// Recommended action kind (modify or terminate).
    pub rightsizing_type: Option<String>,
    /// Instance the recommendation applies to.
    pub current_instance: Option<InstanceSnapshot>,
    /// Candidate target instances, when modifying.
    pub target_instances: Vec<TargetOption>,
}

/// The instance a rightsizing recommendation applies to.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSnapshot {
    /// Resource id.
    pub resource_id: String,
    /// Instance name tag, when present.
    pub instance_name: String,
    /// Current monthly cost.
    pub monthly_cost: String,
    /// Cost currency code.
    pub currency_code: String,
}

/// One candidate target instance.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetOption {
    /// Estimated monthly cost after the change.
    pub estimated_monthly_cost: String,
    /// Estimated monthly savings from the change.
    pub estimated_monthly_savings: String,
    /// Savings currency code.
    pub currency_code: String,
    /// Whether upstream marks this option as the default.
    pub default_target_instance: bool,
}

// === Call Sites ===

impl AwsSession {
    /// Run one cost-and-usage query over the given range.
    #[instrument(skip(self, query), fields(granularity = ?query.granularity))]
    pub async fn cost_and_usage(
        &self,
        query: &UsageQuery,
        range: &DateRange,
    ) -> Result<CostReport, CostError> {
        inc_upstream_calls("get_cost_and_usage");
        let start = Instant::now();

        let mut call = self
            .cost
            .get_cost_and_usage()
            .time_period(date_interval(range)?)
            .granularity(query.granularity.clone());
        for metric in query.metrics {
            call = call.metrics(*metric);
        }

        let output = call.send().await.map_err(|e| {
            inc_upstream_failures("get_cost_and_usage");
            CostError::Upstream {
                operation: "get_cost_and_usage",
                reason: e.to_string(),
            }
        })?;
        record_upstream_latency(start, "get_cost_and_usage");

        Ok(CostReport {
            results_by_time: output.results_by_time().iter().map(cost_bucket).collect(),
        })
    }

    /// Run one per-resource cost query over the given range.
    #[instrument(skip(self, query), fields(service = query.service))]
    pub async fn cost_by_resource(
        &self,
        query: &ResourceUsageQuery,
        range: &DateRange,
    ) -> Result<CostReport, CostError> {
        inc_upstream_calls("get_cost_and_usage_with_resources");
        let start = Instant::now();

        let filter = Expression::builder()
            .dimensions(
                DimensionValues::builder()
                    .key(Dimension::Service)
                    .values(query.service)
                    .build(),
            )
            .build();
        let group_by = GroupDefinition::builder()
            .r#type(GroupDefinitionType::Dimension)
            .key("RESOURCE_ID")
            .build();

        let mut call = self
            .cost
            .get_cost_and_usage_with_resources()
            .time_period(date_interval(range)?)
            .granularity(Granularity::Daily)
            .filter(filter)
            .group_by(group_by);
        for metric in query.metrics {
            call = call.metrics(*metric);
        }

        let output = call.send().await.map_err(|e| {
            inc_upstream_failures("get_cost_and_usage_with_resources");
            CostError::Upstream {
                operation: "get_cost_and_usage_with_resources",
                reason: e.to_string(),
            }
        })?;
        record_upstream_latency(start, "get_cost_and_usage_with_resources");

        Ok(CostReport {
            results_by_time: output.results_by_time().iter().map(cost_bucket).collect(),
        })
    }

    /// Amortized-cost forecast over the given horizon, monthly granularity.
    #[instrument(skip(self))]
    pub async fn cost_forecast(&self, range: &DateRange) -> Result<ForecastReport, CostError> {
        inc_upstream_calls("get_cost_forecast");
        let start = Instant::now();

        let output = self
            .cost
            .get_cost_forecast()
            .time_period(date_interval(range)?)
            .granularity(Granularity::Monthly)
            .metric(Metric::AmortizedCost)
            .send()
            .await
            .map_err(|e| {
                inc_upstream_failures("get_cost_forecast");
                CostError::Upstream {
                    operation: "get_cost_forecast",
                    reason: e.to_string(),
                }
            })?;
        record_upstream_latency(start, "get_cost_forecast");

        Ok(ForecastReport {
            total: output.total().map(amount),
            forecast_results_by_time: output
                .forecast_results_by_time()
                .iter()
                .map(forecast_window)
                .collect(),
        })
    }

    /// EC2 cross-instance-family rightsizing recommendation.
    #[instrument(skip(self))]
    pub async fn rightsizing_recommendation(&self) -> Result<RightsizingReport, CostError> {
        inc_upstream_calls("get_rightsizing_recommendation");
        let start = Instant::now();

        let configuration = RightsizingRecommendationConfiguration::builder()
            .recommendation_target(RecommendationTarget::CrossInstanceFamily)
            .benefits_considered(true)
            .build()
            .map_err(|e| CostError::InvalidQuery {
                reason: e.to_string(),
            })?;

        let output = self
            .cost
            .get_rightsizing_recommendation()
            .configuration(configuration)
            .service("AmazonEC2")
            .send()
            .await
            .map_err(|e| {
                inc_upstream_failures("get_rightsizing_recommendation");
                CostError::Upstream {
                    operation: "get_rightsizing_recommendation",
                    reason: e.to_string(),
                }
            })?;
        record_upstream_latency(start, "get_rightsizing_recommendation");

        Ok(RightsizingReport {
            summary: output.summary().map(rightsizing_summary),
            recommendations: output
                .rightsizing_recommendations()
                .iter()
                .map(rightsizing_entry)
                .collect(),
        })
    }
}

// === Projections ===

fn date_interval(range: &DateRange) -> Result<DateInterval, CostError> {
    DateInterval::builder()
        .start(range.start_iso())
        .end(range.end_iso())
        .build()
        .map_err(|e| CostError::InvalidQuery {
            reason: e.to_string(),
        })
}

fn cost_bucket(result: &ResultByTime) -> CostBucket {
    CostBucket {
        time_period: result.time_period().map(period),
        total: result.total().map(metric_map).unwrap_or_default(),
        groups: result.groups().iter().map(cost_group).collect(),
        estimated: result.estimated(),
    }
}

fn cost_group(group: &Group) -> CostGroup {
    CostGroup {
        keys: group.keys().to_vec(),
        metrics: group.metrics().map(metric_map).unwrap_or_default(),
    }
}

fn period(interval: &DateInterval) -> Period {
    Period {
        start: interval.start().to_string(),
        end: interval.end().to_string(),
    }
}

fn amount(value: &MetricValue) -> Amount {
    Amount {
        amount: value.amount().unwrap_or_default().to_string(),
        unit: value.unit().unwrap_or_default().to_string(),
    }
}

fn metric_map(metrics: &HashMap<String, MetricValue>) -> BTreeMap<String, Amount> {
    metrics.iter().map(|(k, v)| (k.clone(), amount(v))).collect()
}

fn forecast_window(forecast: &ForecastResult) -> ForecastWindow {
    ForecastWindow {
        time_period: forecast.time_period().map(period),
        mean_value: forecast.mean_value().unwrap_or_default().to_string(),
        prediction_interval_lower_bound: forecast
            .prediction_interval_lower_bound()
            .unwrap_or_default()
            .to_string(),
        prediction_interval_upper_bound: forecast
            .prediction_interval_upper_bound()
            .unwrap_or_default()
            .to_string(),
    }
}

fn rightsizing_summary(summary: &RightsizingRecommendationSummary) -> RightsizingSummary {
    RightsizingSummary {
        total_recommendation_count: summary
            .total_recommendation_count()
            .unwrap_or_default()
            .to_string(),
        estimated_total_monthly_savings_amount: summary
            .estimated_total_monthly_savings_amount()
            .unwrap_or_default()
            .to_string(),
        savings_currency_code: summary.savings_currency_code().unwrap_or_default().to_string(),
        savings_percentage: summary.savings_percentage().unwrap_or_default().to_string(),
    }
}

fn rightsizing_entry(recommendation: &RightsizingRecommendation) -> RightsizingEntry {
    RightsizingEntry {
        account_id: recommendation.account_id().unwrap_or_default().to_string(),
        rightsizing_type: recommendation
            .rightsizing_type()
            .map(|t| t.as_str().to_string()),
        current_instance: recommendation.current_instance().map(instance_snapshot),
        target_instances: recommendation
            .modify_recommendation_detail()
            .map(|detail| detail.target_instances().iter().map(target_option).collect())
            .unwrap_or_default(),
    }
}

fn instance_snapshot(instance: &CurrentInstance) -> InstanceSnapshot {
    InstanceSnapshot {
        resource_id: instance.resource_id().unwrap_or_default().to_string(),
        instance_name: instance.instance_name().unwrap_or_default().to_string(),
        monthly_cost: instance.monthly_cost().unwrap_or_default().to_string(),
        currency_code: instance.currency_code().unwrap_or_default().to_string(),
    }
}

fn target_option(target: &TargetInstance) -> TargetOption {
    TargetOption {
        estimated_monthly_cost: target.estimated_monthly_cost().unwrap_or_default().to_string(),
        estimated_monthly_savings: target
            .estimated_monthly_savings()
            .unwrap_or_default()
            .to_string(),
        currency_code: target.currency_code().unwrap_or_default().to_string(),
        default_target_instance: target.default_target_instance(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_request_the_expected_metrics() {
        assert_eq!(MONTHLY_AMORTIZED.metrics, &["AmortizedCost"]);
        assert_eq!(DAILY_AMORTIZED.metrics, &["AmortizedCost"]);
        assert_eq!(MONTHLY_AMORTIZED.granularity, Granularity::Monthly);
        assert_eq!(DAILY_AMORTIZED.granularity, Granularity::Daily);
    }

    #[test]
    fn resource_templates_filter_the_named_service() {
        assert_eq!(
            EC2_BY_RESOURCE.service,
            "Amazon Elastic Compute Cloud - Compute"
        );
        assert_eq!(RDS_BY_RESOURCE.service, "RDS");
        for query in [&EC2_BY_RESOURCE, &RDS_BY_RESOURCE] {
            assert_eq!(
                query.metrics,
                &["BlendedCost", "UnblendedCost", "UsageQuantity"]
            );
        }
    }

    #[test]
    fn date_interval_uses_iso_boundaries() {
        let range = crate::dates::month_range(2022, 3).expect("valid month");
        let interval = date_interval(&range).expect("valid interval");
        assert_eq!(interval.start(), "2022-03-01");
        assert_eq!(interval.end(), "2022-03-31");
    }

    #[test]
    fn metric_values_project_to_amounts() {
        let value = MetricValue::builder().amount("12.34").unit("USD").build();
        let projected = amount(&value);
        assert_eq!(projected.amount, "12.34");
        assert_eq!(projected.unit, "USD");
    }

    #[test]
    fn buckets_without_totals_project_empty_maps() {
        let result = ResultByTime::builder().build();
        let bucket = cost_bucket(&result);
        assert!(bucket.total.is_empty());
        assert!(bucket.groups.is_empty());
        assert!(bucket.time_period.is_none());
    }
}
