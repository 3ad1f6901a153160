use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::imagebuilder::PipelineOrchestrator;
use crate::ssm::ParameterStore;

pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod imagebuilder;
pub mod notification;
pub mod ssm;
pub mod sync;
pub mod trigger;

pub use clients::AwsClients;

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

/// What an invocation returns, depending on which event it handled.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum HandlerResponse {
    CustomResource(trigger::CustomResourceResponse),
    Sync(sync::SyncReport),
}

// lambda handler
pub async fn function_handler(
    orchestrator: &dyn PipelineOrchestrator,
    store: &dyn ParameterStore,
    config: &Config,
    evt: LambdaEvent<events::Combined>,
) -> Result<HandlerResponse, Error> {
    info!(request_id = %evt.context.request_id, "Handling lambda invocation");
    debug!("Handling event payload: {:?}", evt.payload);

    let response = match evt.payload {
        events::Combined::Lifecycle(lifecycle_event) => {
            info!("LIFECYCLE EVENT Detected");
            HandlerResponse::CustomResource(
                trigger::handle(orchestrator, config, lifecycle_event).await,
            )
        }
        events::Combined::Sns(sns_event) => {
            info!("SNS EVENT Detected");
            HandlerResponse::Sync(sync::handle(store, config, sns_event).await)
        }
    };

    debug!(?response, "invocation complete");
    Ok(response)
}
