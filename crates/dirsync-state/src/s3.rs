//! Snapshot repository backed by S3 object storage.
//!
//! One object per tenant; `PutObject` replaces the document atomically, so a
//! reader never observes a partial write.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use dirsync_core::error::{ProviderError, ProviderResult};
use dirsync_core::model::State;
use dirsync_core::traits::StateRepository;
use tracing::{debug, info};

use crate::codec;
use crate::error::{StateError, StateResult};

/// Snapshot store reading and writing one S3 object.
#[derive(Debug)]
pub struct S3StateRepository {
    client: aws_sdk_s3::Client,
    bucket: String,
    key: String,
}

impl S3StateRepository {
    /// Build a repository using ambient AWS credentials (environment, IAM
    /// role, or profile).
    pub async fn new(bucket: impl Into<String>, key: impl Into<String>) -> StateResult<Self> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() {
            return Err(StateError::Config("bucket name is empty".to_string()));
        }
        if key.is_empty() {
            return Err(StateError::Config("bucket key is empty".to_string()));
        }

        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = aws_sdk_s3::Client::new(&sdk_config);

        info!(bucket = %bucket, key = %key, "s3 state repository initialized");
        Ok(Self { client, bucket, key })
    }

    /// Build a repository over a pre-configured client.
    #[must_use]
    pub fn with_client(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    async fn load(&self) -> StateResult<Option<State>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    debug!(bucket = %self.bucket, key = %self.key, "no snapshot object yet");
                    return Ok(None);
                }
                return Err(StateError::Storage(format!(
                    "get s3://{}/{}: {service}",
                    self.bucket, self.key
                )));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StateError::Storage(format!("read snapshot body: {e}")))?
            .into_bytes();

        codec::decode(&bytes).map(Some)
    }

    async fn store(&self, state: &State) -> StateResult<()> {
        let body = codec::encode(state)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| {
                StateError::Storage(format!(
                    "put s3://{}/{}: {}",
                    self.bucket,
                    self.key,
                    err.into_service_error()
                ))
            })?;

        debug!(bucket = %self.bucket, key = %self.key, "snapshot object written");
        Ok(())
    }
}

fn port_error(operation: &'static str, source: StateError) -> ProviderError {
    ProviderError::Operation {
        operation,
        message: source.to_string(),
        source: Some(Box::new(source)),
    }
}

#[async_trait]
impl StateRepository for S3StateRepository {
    async fn get_state(&self) -> ProviderResult<Option<State>> {
        self.load().await.map_err(|e| port_error("get state", e))
    }

    async fn set_state(&self, state: &State) -> ProviderResult<()> {
        self.store(state).await.map_err(|e| port_error("set state", e))
    }
}
