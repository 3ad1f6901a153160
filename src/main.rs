use aws_config::BehaviorVersion;
use image_builder_lambda::config::Config;
use image_builder_lambda::events::Combined;
use image_builder_lambda::AwsClients;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    image_builder_lambda::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let aws_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let clients = AwsClients::new(&aws_config);
    let config = Config::load_from_env()?;
    info!(
        parameter_name = %config.parameter_name,
        parameter_tier = %config.parameter_tier,
        tag_parameter = config.tag_parameter,
        regional_writes = config.regional_writes,
        "configuration loaded"
    );

    run(service_fn(|request: LambdaEvent<Combined>| {
        image_builder_lambda::function_handler(
            &clients.imagebuilder,
            &clients.ssm,
            &config,
            request,
        )
    }))
    .await
}
