//! Credential bootstrap and the provider capability handles.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::BootstrapError;

/// Authenticated session scoped to one region, exposing one client per
/// upstream API group. Built once at startup; read-only afterwards, safe to
/// share across any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct AwsSession {
    /// Budgets handle.
    pub budgets: aws_sdk_budgets::Client,
    /// Cost Explorer handle.
    pub cost: aws_sdk_costexplorer::Client,
    /// Support / Trusted Advisor handle.
    pub support: aws_sdk_support::Client,
    /// Resource Groups Tagging handle.
    pub tagging: aws_sdk_resourcegroupstagging::Client,
    region: String,
}

impl AwsSession {
    /// Build the session from already-resolved static credentials.
    ///
    /// Pure construction, no network round trips; tests use this directly.
    pub async fn from_static_credentials(
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> Self {
        let credentials = Credentials::new(
            access_key.to_string(),
            secret_key.to_string(),
            None,
            None,
            "parameter-store",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self::from_sdk_config(&config, region)
    }

    /// Resolve both secrets from Parameter Store and build the session.
    ///
    /// Failure here is fatal: there is no partial-credential operating mode.
    #[instrument(skip(config))]
    pub async fn bootstrap(config: &Config) -> Result<Self, BootstrapError> {
        let base = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let ssm = aws_sdk_ssm::Client::new(&base);

        let (access_key, secret_key) = futures::future::try_join(
            fetch_parameter(&ssm, &config.access_key_param),
            fetch_parameter(&ssm, &config.secret_key_param),
        )
        .await?;

        info!(region = %config.aws_region, "Credentials resolved, building session");
        Ok(Self::from_static_credentials(&access_key, &secret_key, &config.aws_region).await)
    }

    fn from_sdk_config(config: &SdkConfig, region: &str) -> Self {
        Self {
            budgets: aws_sdk_budgets::Client::new(config),
            cost: aws_sdk_costexplorer::Client::new(config),
            support: aws_sdk_support::Client::new(config),
            tagging: aws_sdk_resourcegroupstagging::Client::new(config),
            region: region.to_string(),
        }
    }

    /// Region every capability handle is scoped to.
    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Fetch one decrypted parameter value by name.
async fn fetch_parameter(
    ssm: &aws_sdk_ssm::Client,
    name: &str,
) -> Result<String, BootstrapError> {
    let output = ssm
        .get_parameter()
        .name(name)
        .with_decryption(true)
        .send()
        .await
        .map_err(|e| BootstrapError::ParameterLookup {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    output
        .parameter()
        .and_then(|p| p.value())
        .map(str::to_string)
        .ok_or_else(|| BootstrapError::ParameterEmpty {
            name: name.to_string(),
        })
}
