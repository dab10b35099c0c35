use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::batch::ItemId;
use crate::error::{ExportError, Result};

/// One rendered asset ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name, e.g. `extension_asset_k3x9q2_youtube.jpg`
    pub name: String,
    pub item_id: ItemId,
    pub format_id: &'static str,
    /// Encoded JPEG
    pub bytes: Vec<u8>,
}

/// Destination for exported artifacts
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Deliver one artifact. A failure only affects this artifact.
    async fn emit(&self, artifact: Artifact) -> Result<()>;
}

/// Writes each artifact as a file in a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create the directory if needed
    pub async fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn emit(&self, artifact: Artifact) -> Result<()> {
        let path = self.dir.join(&artifact.name);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .map_err(|e| ExportError::SinkFailed {
                name: artifact.name.clone(),
                reason: e.to_string(),
            })?;

        debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        Ok(())
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn names(&self) -> Vec<String> {
        self.artifacts.lock().await.iter().map(|a| a.name.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.artifacts.lock().await.len()
    }

    /// Take everything collected so far
    pub async fn take(&self) -> Vec<Artifact> {
        std::mem::take(&mut *self.artifacts.lock().await)
    }
}

#[async_trait]
impl ArtifactSink for CollectingSink {
    async fn emit(&self, artifact: Artifact) -> Result<()> {
        self.artifacts.lock().await.push(artifact);
        Ok(())
    }
}
