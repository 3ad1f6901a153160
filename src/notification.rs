use serde::Deserialize;
use std::str::FromStr;

use crate::error::HandlerError;

/// Image Builder's completion notification, as carried in an SNS message body.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BuildMessage {
    pub arn: Option<String>,
    /// Recipe name.
    pub name: String,
    pub state: ImageState,
    pub source_pipeline_arn: Option<String>,
    #[serde(default)]
    pub output_resources: OutputResources,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ImageState {
    pub status: ImageStatus,
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    Pending,
    Creating,
    Building,
    Testing,
    Distributing,
    Integrating,
    Available,
    Failed,
    Deprecated,
    Deleted,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OutputResources {
    #[serde(default)]
    pub amis: Vec<ImageArtifact>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageArtifact {
    pub region: String,
    pub image: String,
    pub name: String,
    pub description: Option<String>,
    pub account_id: Option<String>,
}

impl FromStr for BuildMessage {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl BuildMessage {
    pub fn is_available(&self) -> bool {
        self.state.status == ImageStatus::Available
    }
}
