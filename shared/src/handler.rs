use crate::config::HandlerConfig;
use crate::error::{EventError, FailureKind, ProcessError};
use crate::event::{object_refs, ObjectRef};
use crate::image::{destination_key, resize_cover};
use crate::scratch::ScratchFiles;
use crate::storage::{AcceptAnyAclResponse, AclPolicy, AclResponseCheck, Connection};
use std::path::Path;
use tracing::Instrument;

/// Where a resized image was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub bucket: String,
    pub key: String,
}

/// The result of processing one notification record.
#[derive(Debug)]
pub struct RecordOutcome {
    pub source: ObjectRef,
    pub result: Result<Destination, ProcessError>,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.result.as_ref().err().map(ProcessError::kind)
    }
}

pub struct ResizeHandler {
    config: HandlerConfig,
    connection: Connection,
    acl_check: Box<dyn AclResponseCheck>,
}

impl ResizeHandler {
    pub fn new(config: HandlerConfig, connection: Connection) -> Self {
        ResizeHandler {
            config,
            connection,
            acl_check: Box::new(AcceptAnyAclResponse),
        }
    }

    /// Replaces the check applied to every ACL response.
    pub fn with_acl_check(mut self, acl_check: impl AclResponseCheck + 'static) -> Self {
        self.acl_check = Box::new(acl_check);
        self
    }

    /// Resizes and publishes every object in `event`, one record at a time.
    ///
    /// A failing record never stops the ones after it, its error ends up in
    /// the returned outcome. Only a record missing its bucket or key fails the
    /// whole event.
    pub async fn handle(
        &self,
        event: &aws_lambda_events::event::s3::S3Event,
    ) -> Result<Vec<RecordOutcome>, EventError> {
        let mut outcomes = Vec::with_capacity(event.records.len());

        for object in object_refs(event) {
            let object = object?;
            tracing::debug!("Processing {:?}", object);

            outcomes.push(self.process_record(object).await);
        }

        Ok(outcomes)
    }

    pub async fn process_record(&self, object: ObjectRef) -> RecordOutcome {
        let span = tracing::info_span!("record", bucket = %object.bucket, key = %object.key);

        async move {
            match self.process(&object).await {
                Ok(destination) => {
                    tracing::info!("published {}/{}", destination.bucket, destination.key);
                    RecordOutcome {
                        source: object,
                        result: Ok(destination),
                    }
                }
                Err(err) => {
                    log_failure(&object.key, &err);
                    RecordOutcome {
                        source: object,
                        result: Err(err),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, object: &ObjectRef) -> Result<Destination, ProcessError> {
        // Dropping the scratch files removes them, however this returns.
        let scratch = ScratchFiles::new(&self.config.scratch_dir);

        let key = object.decoded_key()?;
        let destination = Destination {
            bucket: self.config.destination_bucket.clone(),
            key: destination_key(&self.config.destination_key_template, &key),
        };

        self.connection
            .client
            .download(&object.bucket, &key, scratch.source())
            .await
            .map_err(ProcessError::Transfer)?;

        resize_cover(scratch.source(), scratch.resized(), self.config.target_size)?;

        self.publish(scratch.resized(), &destination).await?;

        Ok(destination)
    }

    async fn publish(&self, path: &Path, destination: &Destination) -> Result<(), ProcessError> {
        self.connection
            .client
            .upload(path, &destination.bucket, &destination.key)
            .await
            .map_err(ProcessError::Transfer)?;

        let response = self
            .connection
            .resource
            .object_acl(&destination.bucket, &destination.key)
            .put(AclPolicy::PublicRead)
            .await
            .map_err(ProcessError::Transfer)?;

        self.acl_check
            .check(&destination.key, &response)
            .map_err(|reason| ProcessError::AclRejected {
                key: destination.key.clone(),
                reason,
            })
    }
}

fn log_failure(key: &str, err: &ProcessError) {
    match err.kind() {
        FailureKind::Size => tracing::error!("Failed to resize {}: {}", key, err),
        FailureKind::FileNotFound => tracing::error!(
            "Failed to resize {} - problem with storing file locally",
            key
        ),
        FailureKind::Other => tracing::error!("Failed to resize {}: {:?}", key, err),
    }
}
