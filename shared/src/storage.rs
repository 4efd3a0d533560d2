use crate::config::{get_s3_client, HandlerConfig};
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_smithy_http::body::SdkBody;
use lambda_runtime::Error;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;

/// Moves objects between the bucket and local files.
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error>;

    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> Result<(), Error>;
}

/// Mutates object access-control lists.
#[async_trait]
pub trait AclResource: Send + Sync {
    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        policy: AclPolicy,
    ) -> Result<AclResponse, Error>;
}

impl dyn AclResource {
    pub fn object_acl(&self, bucket: &str, key: &str) -> ObjectAcl<'_> {
        ObjectAcl {
            resource: self,
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

/// Handle on the ACL of one object.
pub struct ObjectAcl<'a> {
    resource: &'a dyn AclResource,
    bucket: String,
    key: String,
}

impl ObjectAcl<'_> {
    pub async fn put(&self, policy: AclPolicy) -> Result<AclResponse, Error> {
        self.resource
            .put_object_acl(&self.bucket, &self.key, policy)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclPolicy {
    PublicRead,
}

impl AclPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AclPolicy::PublicRead => "public-read",
        }
    }
}

impl From<AclPolicy> for s3::model::ObjectCannedAcl {
    fn from(policy: AclPolicy) -> Self {
        match policy {
            AclPolicy::PublicRead => s3::model::ObjectCannedAcl::PublicRead,
        }
    }
}

/// What the storage system answered to an ACL change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclResponse {
    pub request_charged: Option<String>,
}

/// Decides whether an ACL response counts as success.
pub trait AclResponseCheck: Send + Sync {
    fn check(&self, key: &str, response: &AclResponse) -> Result<(), String>;
}

/// Accepts every response; S3 reports failures as errors, not in the body.
#[derive(Debug, Default)]
pub struct AcceptAnyAclResponse;

impl AclResponseCheck for AcceptAnyAclResponse {
    fn check(&self, key: &str, response: &AclResponse) -> Result<(), String> {
        tracing::debug!("acl response for {}: {:?}", key, response);
        Ok(())
    }
}

/// The transfer client and ACL resource a handler works with.
#[derive(Clone)]
pub struct Connection {
    pub client: Arc<dyn TransferClient>,
    pub resource: Arc<dyn AclResource>,
}

impl Connection {
    pub fn new(client: Arc<dyn TransferClient>, resource: Arc<dyn AclResource>) -> Self {
        Connection { client, resource }
    }
}

/// S3 backed collaborators, or the local stubs when `cfg.debug` is set.
pub async fn connect(cfg: &HandlerConfig) -> Connection {
    if cfg.debug {
        tracing::debug!(
            "using stub storage, downloads copy {}",
            cfg.fixture_path.display()
        );
        return Connection::new(
            Arc::new(StubTransferClient::new(&cfg.fixture_path)),
            Arc::new(StubAclResource::default()),
        );
    }

    let s3 = get_s3_client().await;

    Connection::new(
        Arc::new(S3TransferClient::new(s3.clone())),
        Arc::new(S3AclResource::new(s3)),
    )
}

pub struct S3TransferClient {
    s3: s3::Client,
}

impl S3TransferClient {
    pub fn new(s3: s3::Client) -> Self {
        S3TransferClient { s3 }
    }
}

#[async_trait]
impl TransferClient for S3TransferClient {
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error> {
        tracing::debug!("Downloading file from s3 - {}/{}", bucket, key);

        let cmd_output = self.s3.get_object().bucket(bucket).key(key).send().await?;
        let original_img = cmd_output
            .body
            .collect()
            .await
            .map(|data| data.into_bytes())?;

        fs::write(path, &original_img).await?;

        Ok(())
    }

    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> Result<(), Error> {
        let resized_img = fs::read(path).await?;

        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(s3::types::ByteStream::new(SdkBody::from(resized_img)))
            .send()
            .await?;

        Ok(())
    }
}

pub struct S3AclResource {
    s3: s3::Client,
}

impl S3AclResource {
    pub fn new(s3: s3::Client) -> Self {
        S3AclResource { s3 }
    }
}

#[async_trait]
impl AclResource for S3AclResource {
    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        policy: AclPolicy,
    ) -> Result<AclResponse, Error> {
        let output = self
            .s3
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(policy.into())
            .send()
            .await?;

        Ok(AclResponse {
            request_charged: output.request_charged().map(|c| c.as_str().to_string()),
        })
    }
}

/// One object handed to [`StubTransferClient::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

/// Local stand-in for S3 transfers: downloads copy a fixture file, uploads
/// are captured in memory.
#[derive(Debug, Default)]
pub struct StubTransferClient {
    fixture: PathBuf,
    // `None` leaves the destination untouched, as a download that silently
    // produced nothing would.
    overrides: HashMap<String, Option<PathBuf>>,
    downloads: Mutex<Vec<(String, String)>>,
    uploads: Mutex<Vec<UploadedObject>>,
}

impl StubTransferClient {
    pub fn new(fixture: &Path) -> Self {
        StubTransferClient {
            fixture: fixture.to_path_buf(),
            ..Default::default()
        }
    }

    /// Serve `fixture` instead of the default for `key`.
    pub fn with_fixture(mut self, key: &str, fixture: &Path) -> Self {
        self.overrides
            .insert(key.to_string(), Some(fixture.to_path_buf()));
        self
    }

    /// Downloads of `key` succeed without writing anything.
    pub fn with_missing_object(mut self, key: &str) -> Self {
        self.overrides.insert(key.to_string(), None);
        self
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn uploads(&self) -> Vec<UploadedObject> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TransferClient for StubTransferClient {
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error> {
        tracing::debug!("Downloading file from s3 - {}/{}", bucket, key);

        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push((bucket.to_string(), key.to_string()));
        }

        let fixture = match self.overrides.get(key) {
            Some(Some(fixture)) => fixture,
            Some(None) => return Ok(()),
            None => &self.fixture,
        };
        fs::copy(fixture, path).await?;

        Ok(())
    }

    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> Result<(), Error> {
        let body = fs::read(path).await?;

        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(UploadedObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
            });
        }

        Ok(())
    }
}

/// Records ACL changes instead of applying them.
#[derive(Debug, Default)]
pub struct StubAclResource {
    puts: Mutex<Vec<(String, String, AclPolicy)>>,
}

impl StubAclResource {
    pub fn puts(&self) -> Vec<(String, String, AclPolicy)> {
        self.puts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AclResource for StubAclResource {
    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        policy: AclPolicy,
    ) -> Result<AclResponse, Error> {
        if let Ok(mut puts) = self.puts.lock() {
            puts.push((bucket.to_string(), key.to_string(), policy));
        }

        Ok(AclResponse::default())
    }
}
