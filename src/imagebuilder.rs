use async_trait::async_trait;
use aws_sdk_imagebuilder::Client as ImageBuilderClient;
use tracing::{debug, info};

use crate::error::HandlerError;

/// Starts image pipeline executions.
#[async_trait]
pub trait PipelineOrchestrator: Send + Sync {
    /// Starts one execution of `pipeline_arn`, returning the ARN of the image build
    /// version it produced when the service reports one.
    ///
    /// `client_token` makes redelivered requests idempotent; when `None` the SDK
    /// generates a fresh token.
    async fn start_execution(
        &self,
        pipeline_arn: &str,
        client_token: Option<&str>,
    ) -> Result<Option<String>, HandlerError>;
}

#[async_trait]
impl PipelineOrchestrator for ImageBuilderClient {
    async fn start_execution(
        &self,
        pipeline_arn: &str,
        client_token: Option<&str>,
    ) -> Result<Option<String>, HandlerError> {
        debug!(pipeline_arn, ?client_token, "starting image pipeline execution");
        let response = self
            .start_image_pipeline_execution()
            .image_pipeline_arn(pipeline_arn)
            .set_client_token(client_token.map(str::to_string))
            .send()
            .await
            .map_err(|error| {
                let error = error.into_service_error();
                if error.is_resource_not_found_exception() {
                    HandlerError::NotFound(format!("{} - {}", pipeline_arn, error))
                } else {
                    HandlerError::ExternalService(format!(
                        "failed to start image pipeline execution - {}",
                        error
                    ))
                }
            })?;

        let image_build_version_arn = response.image_build_version_arn().map(str::to_string);
        info!(
            pipeline_arn,
            request_id = response.request_id(),
            image_build_version_arn = image_build_version_arn.as_deref(),
            "image pipeline execution started"
        );
        Ok(image_build_version_arn)
    }
}
