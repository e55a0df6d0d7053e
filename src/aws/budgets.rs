//! Budget creation with a single email notification.

use std::str::FromStr;
use std::time::Instant;

use aws_sdk_budgets::error::BuildError;
use aws_sdk_budgets::types::{
    Budget, BudgetType, ComparisonOperator, CostTypes, Notification, NotificationState,
    NotificationType, NotificationWithSubscribers, Spend, Subscriber, SubscriptionType,
    ThresholdType, TimeUnit,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::BudgetError;
use crate::metrics::{inc_upstream_calls, inc_upstream_failures, record_upstream_latency};

use super::session::AwsSession;

/// Inbound budget request body. Every field is string-typed on the wire;
/// validation happens in [`BudgetRequest::validate`], not in serde.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    /// Account the budget belongs to.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Name for the budget.
    #[serde(default)]
    pub budget_name: Option<String>,

    /// Cost or usage amount associated with the budget threshold.
    #[serde(default)]
    pub limit_amt: Option<String>,

    /// Unit of measurement for the limit, such as dollars or GB.
    #[serde(default)]
    pub limit_unit: Option<String>,

    /// How often the budget resets: DAILY, MONTHLY, QUARTERLY, or ANNUALLY.
    #[serde(default)]
    pub time_unit: Option<String>,

    /// Notification threshold, always a percentage.
    #[serde(default)]
    pub threshold_percent: Option<String>,

    /// Email address budget notifications go to.
    #[serde(default)]
    pub email_to_notify: Option<String>,
}

/// Budget reset cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetTimeUnit {
    /// Resets daily.
    Daily,
    /// Resets monthly.
    Monthly,
    /// Resets quarterly.
    Quarterly,
    /// Resets annually.
    Annually,
}

/// A validated budget request, ready to go upstream.
#[derive(Debug, Clone)]
pub struct BudgetSpec {
    /// Account the budget belongs to.
    pub account_id: String,
    /// Name for the budget.
    pub budget_name: String,
    /// Limit amount.
    pub limit_amount: Decimal,
    /// Limit unit of measurement.
    pub limit_unit: String,
    /// Reset cadence.
    pub time_unit: BudgetTimeUnit,
    /// Notification threshold percentage.
    pub threshold_percent: Decimal,
    /// Notification recipient.
    pub notify_email: String,
}

/// Acknowledgement returned once the budget exists upstream.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCreated {
    /// Account the budget was created under.
    pub account_id: String,
    /// Name of the created budget.
    pub budget_name: String,
    /// Fixed status marker.
    pub status: &'static str,
}

impl BudgetRequest {
    /// Check presence and value domains before anything goes upstream.
    pub fn validate(self) -> Result<BudgetSpec, BudgetError> {
        let account_id = require(self.account_id, "accountId")?;
        let budget_name = require(self.budget_name, "budgetName")?;
        let limit_amt = require(self.limit_amt, "limitAmt")?;
        let limit_unit = require(self.limit_unit, "limitUnit")?;
        let time_unit = require(self.time_unit, "timeUnit")?;
        let threshold_percent = require(self.threshold_percent, "thresholdPercent")?;
        let notify_email = require(self.email_to_notify, "emailToNotify")?;

        let time_unit = BudgetTimeUnit::from_str(&time_unit)
            .map_err(|_| BudgetError::InvalidTimeUnit { value: time_unit })?;
        let limit_amount = parse_amount(&limit_amt, "limitAmt")?;
        let threshold_percent = parse_amount(&threshold_percent, "thresholdPercent")?;

        Ok(BudgetSpec {
            account_id,
            budget_name,
            limit_amount,
            limit_unit,
            time_unit,
            threshold_percent,
            notify_email,
        })
    }
}

fn require(value: Option<String>, field: &'static str) -> Result<String, BudgetError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BudgetError::MissingField { field }),
    }
}

fn parse_amount(value: &str, field: &'static str) -> Result<Decimal, BudgetError> {
    value.trim().parse().map_err(|_| BudgetError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

impl AwsSession {
    /// Create the budget and its email notification upstream.
    #[instrument(skip(self, spec), fields(budget_name = %spec.budget_name))]
    pub async fn create_budget_notification(
        &self,
        spec: &BudgetSpec,
    ) -> Result<BudgetCreated, BudgetError> {
        inc_upstream_calls("create_budget");
        let start = Instant::now();

        self.budgets
            .create_budget()
            .account_id(&spec.account_id)
            .budget(budget_definition(spec)?)
            .notifications_with_subscribers(notification_subscription(spec)?)
            .send()
            .await
            .map_err(|e| {
                inc_upstream_failures("create_budget");
                BudgetError::CreateFailed {
                    reason: e.to_string(),
                }
            })?;
        record_upstream_latency(start, "create_budget");

        Ok(BudgetCreated {
            account_id: spec.account_id.clone(),
            budget_name: spec.budget_name.clone(),
            status: "created",
        })
    }
}

/// Fixed cost-type configuration: tax, subscriptions, support, and discounts
/// all included, blended accounting.
fn cost_types() -> CostTypes {
    CostTypes::builder()
        .include_tax(true)
        .include_subscription(true)
        .use_blended(true)
        .include_other_subscription(true)
        .include_support(true)
        .include_discount(true)
        .build()
}

fn budget_definition(spec: &BudgetSpec) -> Result<Budget, BudgetError> {
    let limit = Spend::builder()
        .amount(spec.limit_amount.to_string())
        .unit(spec.limit_unit.clone())
        .build()
        .map_err(build_error)?;

    Budget::builder()
        .budget_name(spec.budget_name.clone())
        .budget_limit(limit)
        .cost_types(cost_types())
        .time_unit(TimeUnit::from(spec.time_unit.to_string().as_str()))
        .budget_type(BudgetType::Usage)
        .build()
        .map_err(build_error)
}

fn notification_subscription(
    spec: &BudgetSpec,
) -> Result<NotificationWithSubscribers, BudgetError> {
    let threshold = spec
        .threshold_percent
        .to_f64()
        .ok_or_else(|| BudgetError::InvalidAmount {
            field: "thresholdPercent",
            value: spec.threshold_percent.to_string(),
        })?;

    let notification = Notification::builder()
        .notification_type(NotificationType::Actual)
        .comparison_operator(ComparisonOperator::GreaterThan)
        .threshold(threshold)
        .threshold_type(ThresholdType::Percentage)
        .notification_state(NotificationState::Alarm)
        .build()
        .map_err(build_error)?;

    let subscriber = Subscriber::builder()
        .subscription_type(SubscriptionType::Email)
        .address(spec.notify_email.clone())
        .build()
        .map_err(build_error)?;

    NotificationWithSubscribers::builder()
        .notification(notification)
        .subscribers(subscriber)
        .build()
        .map_err(build_error)
}

fn build_error(e: BuildError) -> BudgetError {
    BudgetError::InvalidRequest {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn full_request() -> BudgetRequest {
        BudgetRequest {
            account_id: Some("123456789012".to_string()),
            budget_name: Some("team-budget".to_string()),
            limit_amt: Some("250".to_string()),
            limit_unit: Some("USD".to_string()),
            time_unit: Some("MONTHLY".to_string()),
            threshold_percent: Some("80".to_string()),
            email_to_notify: Some("finops@example.com".to_string()),
        }
    }

    fn full_spec() -> BudgetSpec {
        full_request().validate().expect("request is valid")
    }

    #[test]
    fn valid_request_passes_validation() {
        let spec = full_spec();
        assert_eq!(spec.account_id, "123456789012");
        assert_eq!(spec.time_unit, BudgetTimeUnit::Monthly);
        assert_eq!(spec.limit_amount, dec!(250));
        assert_eq!(spec.threshold_percent, dec!(80));
    }

    #[test]
    fn each_missing_field_is_named() {
        let cases: [(fn(&mut BudgetRequest), &str); 4] = [
            (|r| r.account_id = None, "accountId"),
            (|r| r.budget_name = Some("  ".to_string()), "budgetName"),
            (|r| r.limit_amt = None, "limitAmt"),
            (|r| r.email_to_notify = None, "emailToNotify"),
        ];

        for (mutate, field) in cases {
            let mut request = full_request();
            mutate(&mut request);
            match request.validate() {
                Err(BudgetError::MissingField { field: named }) => assert_eq!(named, field),
                other => panic!("expected MissingField for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn time_unit_outside_domain_is_rejected() {
        let mut request = full_request();
        request.time_unit = Some("WEEKLY".to_string());
        assert!(matches!(
            request.validate(),
            Err(BudgetError::InvalidTimeUnit { .. })
        ));
    }

    #[test]
    fn all_four_time_units_parse() {
        for (raw, unit) in [
            ("DAILY", BudgetTimeUnit::Daily),
            ("MONTHLY", BudgetTimeUnit::Monthly),
            ("QUARTERLY", BudgetTimeUnit::Quarterly),
            ("ANNUALLY", BudgetTimeUnit::Annually),
        ] {
            let mut request = full_request();
            request.time_unit = Some(raw.to_string());
            assert_eq!(request.validate().expect("valid").time_unit, unit);
        }
    }

    #[test]
    fn non_decimal_amounts_are_rejected() {
        let mut request = full_request();
        request.limit_amt = Some("lots".to_string());
        assert!(matches!(
            request.validate(),
            Err(BudgetError::InvalidAmount { field: "limitAmt", .. })
        ));

        let mut request = full_request();
        request.threshold_percent = Some("80%".to_string());
        assert!(matches!(
            request.validate(),
            Err(BudgetError::InvalidAmount { field: "thresholdPercent", .. })
        ));
    }

    #[test]
    fn notification_has_one_email_subscriber_above_threshold() {
        let bundle = notification_subscription(&full_spec()).expect("valid spec");

        let notification = bundle.notification().expect("notification set");
        assert_eq!(
            notification.comparison_operator(),
            &ComparisonOperator::GreaterThan
        );
        assert_eq!(notification.threshold(), 80.0);
        assert_eq!(
            notification.threshold_type(),
            Some(&ThresholdType::Percentage)
        );
        assert_eq!(notification.notification_type(), &NotificationType::Actual);

        let subscribers = bundle.subscribers();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].subscription_type(), &SubscriptionType::Email);
        assert_eq!(subscribers[0].address(), "finops@example.com");
    }

    #[test]
    fn budget_definition_uses_fixed_cost_types() {
        let budget = budget_definition(&full_spec()).expect("valid spec");

        assert_eq!(budget.budget_name(), "team-budget");
        assert_eq!(budget.time_unit(), &TimeUnit::Monthly);
        assert_eq!(budget.budget_type(), &BudgetType::Usage);

        let limit = budget.budget_limit().expect("limit set");
        assert_eq!(limit.amount(), "250");
        assert_eq!(limit.unit(), "USD");

        let cost_types = budget.cost_types().expect("cost types set");
        assert_eq!(cost_types.include_tax(), Some(true));
        assert_eq!(cost_types.include_subscription(), Some(true));
        assert_eq!(cost_types.use_blended(), Some(true));
        assert_eq!(cost_types.include_other_subscription(), Some(true));
        assert_eq!(cost_types.include_support(), Some(true));
        assert_eq!(cost_types.include_discount(), Some(true));
    }
}
