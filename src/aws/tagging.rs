//! Tagged-resource inventory.

use std::collections::BTreeMap;
use std::time::Instant;

use aws_sdk_resourcegroupstagging::types::ResourceTagMapping;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::TaggingError;
use crate::metrics::{inc_upstream_calls, inc_upstream_failures, record_upstream_latency};

use super::session::AwsSession;

/// Inventory of tagged resources in the session's region.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInventory {
    /// Tagged resources as reported upstream.
    pub resources: Vec<TaggedResource>,
}

/// One tagged resource.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaggedResource {
    /// Resource ARN.
    pub resource_arn: String,
    /// Tag key/value pairs.
    pub tags: BTreeMap<String, String>,
}

impl AwsSession {
    /// Fetch the unfiltered tagged-resource inventory.
    #[instrument(skip(self))]
    pub async fn resource_inventory(&self) -> Result<ResourceInventory, TaggingError> {
        inc_upstream_calls("get_resources");
        let start = Instant::now();

        let output = self.tagging.get_resources().send().await.map_err(|e| {
            inc_upstream_failures("get_resources");
            TaggingError::Upstream {
                reason: e.to_string(),
            }
        })?;
        record_upstream_latency(start, "get_resources");

        Ok(ResourceInventory {
            resources: output
                .resource_tag_mapping_list()
                .iter()
                .map(tagged_resource)
                .collect(),
        })
    }
}

fn tagged_resource(mapping: &ResourceTagMapping) -> TaggedResource {
    TaggedResource {
        resource_arn: mapping.resource_arn().unwrap_or_default().to_string(),
        tags: mapping
            .tags()
            .iter()
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect(),
    }
}
