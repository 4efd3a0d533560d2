use lambda_runtime::Error;
use shared::{config::HandlerConfig, event::notification, handler::ResizeHandler, storage::connect};

/// Runs one invocation in-process against the stub storage, for a record
/// pointing at `bucket_name/object_key`.
#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .without_time()
        .init();

    let cfg = HandlerConfig {
        debug: true,
        ..HandlerConfig::from_env()?
    };

    let connection = connect(&cfg).await;
    let handler = ResizeHandler::new(cfg, connection);
    let event = notification(&[("bucket_name", "object_key")])?;

    for outcome in handler.handle(&event).await? {
        match outcome.result {
            Ok(destination) => tracing::info!(
                "{}/{} -> {}/{}",
                outcome.source.bucket,
                outcome.source.key,
                destination.bucket,
                destination.key
            ),
            Err(err) => tracing::warn!(
                "{}/{} failed: {}",
                outcome.source.bucket,
                outcome.source.key,
                err
            ),
        }
    }

    Ok(())
}
