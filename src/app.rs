//! Application orchestration for turning one S3 upload into thumbnails.

use crate::dispatch::{Dispatch, Dispatcher, Job};
use crate::generator::VariantGenerator;
use crate::image::{ImageProcessor, ImageService};
use crate::models::{Config, Location, S3Event, SizeProfile};
use crate::publisher::Publisher;
use crate::storage::{with_timeout, ObjectStore, S3Store};
use crate::Result;
use std::sync::Arc;
use tracing::{error, info};

/// How a unit of work ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Published { destination: String, count: usize },
    Skipped { key: String },
}

/// Coordinates dispatch, download, variant generation and publishing.
pub struct App {
    store: Arc<dyn ObjectStore>,
    dispatcher: Dispatcher,
    generator: VariantGenerator,
    publisher: Publisher,
    config: Config,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub store: Arc<dyn ObjectStore>,
    pub image: Arc<dyn ImageService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: Config) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.bucket_suffix.clone()),
            generator: VariantGenerator::new(services.image).with_upscale(config.allow_upscale),
            publisher: Publisher::new(Arc::clone(&services.store), config.io_timeout),
            store: services.store,
            config,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;

        info!(
            "Configured {} size profiles: {}",
            config.profiles.len(),
            describe_profiles(&config.profiles)
        );
        if config.allow_upscale {
            info!("Upscaling enabled: sources smaller than a profile will be enlarged");
        }

        let store = Arc::new(S3Store::new(config.s3_endpoint_url.clone()).await?);
        let image = Arc::new(ImageProcessor::new());

        Ok(Self::with_services(AppServices { store, image }, config))
    }

    pub fn profiles(&self) -> &[SizeProfile] {
        &self.config.profiles
    }

    /// Handle one event end to end. Failures are logged, never propagated.
    pub async fn handle(&self, event: &S3Event) {
        match self.process(event).await {
            Ok(Outcome::Published { destination, count }) => {
                info!(
                    "Successfully resized and uploaded {} variants to {}",
                    count, destination
                );
            }
            Ok(Outcome::Skipped { key }) => {
                info!("Nothing to do for {}", key);
            }
            Err(e) => {
                // Context for failures after dispatch is logged in `run_job`.
                error!("Unable to process event: {}", e);
            }
        }
    }

    /// Run the pipeline, reporting the outcome or the first error.
    pub async fn process(&self, event: &S3Event) -> Result<Outcome> {
        info!("Reading options from event: {:?}", event);

        let job = match self.dispatcher.dispatch(event)? {
            Dispatch::Process(job) => job,
            Dispatch::Skip { key, extension } => {
                info!("Skipping {} with unsupported extension '{}'", key, extension);
                return Ok(Outcome::Skipped { key });
            }
        };

        self.run_job(&job).await.map_err(|e| {
            error!(
                source = %job.source,
                destination = %Location::new(&job.destination_bucket, &job.source.key),
                profile = e.profile().unwrap_or("-"),
                "Unable to resize {} and upload to {}: {}",
                job.source,
                job.destination_bucket,
                e
            );
            e
        })
    }

    async fn run_job(&self, job: &Job) -> Result<Outcome> {
        let Job {
            source,
            destination_bucket,
            image_type,
        } = job;

        let object = with_timeout(
            self.config.io_timeout,
            &format!("download of {}", source),
            self.store.get(&source.bucket, &source.key),
        )
        .await?;
        info!(
            "Downloaded {} ({} bytes, {})",
            source,
            object.body.len(),
            object.content_type
        );

        let variants = self
            .generator
            .generate(
                object.body,
                &object.content_type,
                *image_type,
                &self.config.profiles,
            )
            .await?;

        let report = self
            .publisher
            .publish(destination_bucket, &source.key, &variants)
            .await?;

        let count = report.count();
        Ok(Outcome::Published {
            destination: report.bucket,
            count,
        })
    }
}

fn describe_profiles(profiles: &[SizeProfile]) -> String {
    profiles
        .iter()
        .map(|p| format!("{}={}x{}", p.name, p.max_width, p.max_height))
        .collect::<Vec<_>>()
        .join(", ")
}
