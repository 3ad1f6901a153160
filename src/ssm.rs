use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::types::{ParameterTier as SsmParameterTier, ParameterType, ResourceTypeForTagging, Tag};
use aws_sdk_ssm::Client as SsmClient;
use tracing::debug;

use crate::config::ParameterTier;
use crate::error::HandlerError;

/// A full overwrite of one parameter store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    pub name: String,
    pub value: String,
    pub description: String,
    pub data_type: String,
    pub tier: ParameterTier,
    /// Region holding the parameter; `None` uses the client's own region.
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTag {
    pub key: String,
    pub value: String,
}

impl ParameterTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        ParameterTag {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Writes `entry` with overwrite semantics and returns the new parameter version.
    async fn put_parameter(&self, entry: &ParameterEntry) -> Result<i64, HandlerError>;

    async fn add_tags(
        &self,
        region: Option<&str>,
        name: &str,
        tags: &[ParameterTag],
    ) -> Result<(), HandlerError>;
}

/// SSM Parameter Store backed by the AWS SDK.
///
/// Clients for regions other than the configured one are derived from the shared
/// [`SdkConfig`], so they reuse its credentials and HTTP client.
#[derive(Clone)]
pub struct SsmParameterStore {
    sdk_config: SdkConfig,
    client: SsmClient,
}

impl SsmParameterStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        SsmParameterStore {
            sdk_config: sdk_config.clone(),
            client: SsmClient::new(sdk_config),
        }
    }

    fn client_for(&self, region: Option<&str>) -> SsmClient {
        match region {
            Some(region) if self.sdk_config.region().map(|r| r.as_ref()) != Some(region) => {
                debug!(region, "using regional ssm client");
                let conf = aws_sdk_ssm::config::Builder::from(&self.sdk_config)
                    .region(Region::new(region.to_string()))
                    .build();
                SsmClient::from_conf(conf)
            }
            _ => self.client.clone(),
        }
    }
}

fn sdk_tier(tier: ParameterTier) -> SsmParameterTier {
    match tier {
        ParameterTier::Standard => SsmParameterTier::Standard,
        ParameterTier::Advanced => SsmParameterTier::Advanced,
        ParameterTier::IntelligentTiering => SsmParameterTier::IntelligentTiering,
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn put_parameter(&self, entry: &ParameterEntry) -> Result<i64, HandlerError> {
        let response = self
            .client_for(entry.region.as_deref())
            .put_parameter()
            .name(&entry.name)
            .description(&entry.description)
            .value(&entry.value)
            .r#type(ParameterType::String)
            .data_type(&entry.data_type)
            .tier(sdk_tier(entry.tier))
            .overwrite(true)
            .send()
            .await
            .map_err(|error| {
                HandlerError::ExternalService(format!(
                    "failed to put parameter {} - {}",
                    entry.name,
                    error.into_service_error()
                ))
            })?;

        debug!(name = %entry.name, version = response.version(), tier = ?response.tier(), "parameter updated");
        Ok(response.version())
    }

    async fn add_tags(
        &self,
        region: Option<&str>,
        name: &str,
        tags: &[ParameterTag],
    ) -> Result<(), HandlerError> {
        let tags = tags
            .iter()
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HandlerError::ExternalService(format!("invalid parameter tag - {}", e)))?;

        self.client_for(region)
            .add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(name)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|error| {
                HandlerError::ExternalService(format!(
                    "failed to tag parameter {} - {}",
                    name,
                    error.into_service_error()
                ))
            })?;

        Ok(())
    }
}
