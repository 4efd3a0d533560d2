use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{config::HandlerConfig, handler::ResizeHandler, storage::connect};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let debug = HandlerConfig::debug_from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(if debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let cfg = HandlerConfig::from_env()?;
    let connection = connect(&cfg).await;
    let handler = ResizeHandler::new(cfg, connection);

    run(service_fn(|event| resize_s3(event, &handler))).await
}

async fn resize_s3(event: LambdaEvent<S3Event>, handler: &ResizeHandler) -> Result<(), Error> {
    let outcomes = handler.handle(&event.payload).await?;
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();

    // Failed records are already logged; the invocation itself still succeeds.
    tracing::info!(
        "processed {} record(s), {} failed",
        outcomes.len(),
        failed
    );

    Ok(())
}
