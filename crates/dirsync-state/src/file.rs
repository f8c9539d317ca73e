//! Snapshot repository backed by a local JSON file.
//!
//! Writes go to a sibling temp file first and are moved into place with a
//! rename, so a crash mid-write never leaves a truncated snapshot behind.

use std::path::PathBuf;

use async_trait::async_trait;
use dirsync_core::error::{ProviderError, ProviderResult};
use dirsync_core::model::State;
use dirsync_core::traits::StateRepository;
use tracing::debug;

use crate::codec;
use crate::error::{StateError, StateResult};

/// Snapshot store reading and writing one local file.
#[derive(Debug)]
pub struct FileStateRepository {
    path: PathBuf,
}

impl FileStateRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> StateResult<Option<State>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        codec::decode(&bytes).map(Some)
    }

    async fn store(&self, state: &State) -> StateResult<()> {
        let body = codec::encode(state)?;

        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");

        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "snapshot file written");
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
impl StateRepository for FileStateRepository {
    async fn get_state(&self) -> ProviderResult<Option<State>> {
        self.load().await.map_err(|e| port_error("get state", e))
    }

    async fn set_state(&self, state: &State) -> ProviderResult<()> {
        self.store(state).await.map_err(|e| port_error("set state", e))
    }
}
