use aws_config::SdkConfig;
use aws_sdk_imagebuilder::Client as ImageBuilderClient;

use crate::ssm::SsmParameterStore;

/// A type used to hold the AWS clients required to interact with AWS services
/// used by the lambda function.
#[derive(Clone)]
pub struct AwsClients {
    pub imagebuilder: ImageBuilderClient,
    pub ssm: SsmParameterStore,
}

impl AwsClients {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        AwsClients {
            imagebuilder: ImageBuilderClient::new(sdk_config),
            ssm: SsmParameterStore::new(sdk_config),
        }
    }
}
