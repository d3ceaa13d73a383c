use anyhow::Context;
use create_thumbnail::app::App;
use create_thumbnail::models::S3Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_thumbnail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    info!("Starting create-thumbnail");

    let app = App::new()
        .await
        .context("Failed to initialize application")?;
    info!("Ready with {} size profiles", app.profiles().len());

    let app = &app;
    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        app.handle(&event.payload).await;
        Ok::<(), Error>(())
    }))
    .await
}
