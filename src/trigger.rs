use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::HandlerError;
use crate::events::LifecycleEvent;
use crate::imagebuilder::PipelineOrchestrator;

pub const REASON_SKIPPED: &str = "skipped";
pub const REASON_TRIGGERED: &str = "triggered pipeline";
pub const REASON_NOT_FOUND: &str = "pipeline not found";
pub const REASON_FAILED: &str = "failed to trigger pipeline";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Acknowledgment returned to the custom resource provider. CloudFormation blocks
/// until it gets one, so every lifecycle event produces exactly one.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub request_id: Value,
    pub logical_resource_id: Value,
    pub physical_resource_id: String,
    pub stack_id: Value,
    pub status: ResponseStatus,
    pub reason: String,
}

impl CustomResourceResponse {
    fn new(event: &LifecycleEvent, config: &Config, status: ResponseStatus, reason: &str) -> Self {
        CustomResourceResponse {
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            physical_resource_id: config.physical_resource_id.clone(),
            stack_id: event.stack_id.clone(),
            status,
            reason: reason.to_string(),
        }
    }
}

pub async fn handle(
    orchestrator: &dyn PipelineOrchestrator,
    config: &Config,
    event: LifecycleEvent,
) -> CustomResourceResponse {
    info!(
        request_type = ?event.request_type,
        request_id = %event.request_id,
        logical_resource_id = %event.logical_resource_id,
        physical_resource_id = %event.physical_resource_id,
        "handling lifecycle event"
    );

    if !event.request_type.starts_pipeline() {
        info!(request_type = ?event.request_type, "nothing to trigger");
        return CustomResourceResponse::new(&event, config, ResponseStatus::Success, REASON_SKIPPED);
    }

    match trigger_pipeline(orchestrator, config, &event).await {
        Ok(()) => {
            CustomResourceResponse::new(&event, config, ResponseStatus::Success, REASON_TRIGGERED)
        }
        Err(HandlerError::NotFound(message)) => {
            // the pipeline may have been deleted out of band
            info!(%message, "pipeline not found - nothing to trigger");
            CustomResourceResponse::new(&event, config, ResponseStatus::Success, REASON_NOT_FOUND)
        }
        Err(e @ HandlerError::Configuration(_)) => {
            warn!(error = %e, "invalid lifecycle event");
            CustomResourceResponse::new(&event, config, ResponseStatus::Failed, &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "failed to trigger pipeline");
            CustomResourceResponse::new(&event, config, ResponseStatus::Failed, REASON_FAILED)
        }
    }
}

async fn trigger_pipeline(
    orchestrator: &dyn PipelineOrchestrator,
    config: &Config,
    event: &LifecycleEvent,
) -> Result<(), HandlerError> {
    let pipeline_arn = pipeline_arn(event, &config.pipeline_arn_property)?;
    info!(pipeline_arn, "triggering new pipeline");
    orchestrator
        .start_execution(pipeline_arn, event.request_id.as_str())
        .await?;
    Ok(())
}

fn pipeline_arn<'a>(event: &'a LifecycleEvent, property: &str) -> Result<&'a str, HandlerError> {
    match event.resource_properties.get(property) {
        Some(Value::String(arn)) if !arn.trim().is_empty() => Ok(arn.as_str()),
        Some(other) => Err(HandlerError::Configuration(format!(
            "resource property {} must be a non-empty string, got {}",
            property, other
        ))),
        None => Err(HandlerError::Configuration(format!(
            "missing resource property {}",
            property
        ))),
    }
}
