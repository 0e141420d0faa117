use crate::schema::{BundleField, BundleUpdate, ConfigurationBundle};
use async_trait::async_trait;
use ingest::{DocxReader, ParseError};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Config store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored {field} could not be read: {source}")]
    Artifact {
        field: BundleField,
        #[source]
        source: ParseError,
    },
}

/// Persistence for the configuration bundle
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Load every field; absent artifacts come back as empty strings
    async fn load(&self) -> Result<ConfigurationBundle, StoreError>;

    /// Replace the provided fields and return which ones were written
    async fn save(&self, update: BundleUpdate) -> Result<Vec<BundleField>, StoreError>;

    /// Report which artifacts are currently stored
    async fn status(&self) -> Result<Vec<(BundleField, bool)>, StoreError>;
}

/// Stores each bundle field as a fixed-name file inside one directory.
/// Writes go through a temp file in the same directory and are renamed into
/// place, so readers never observe a partially written artifact.
#[derive(Debug, Clone)]
pub struct FsBundleStore {
    dir: PathBuf,
}

impl FsBundleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, field: BundleField) -> PathBuf {
        self.dir.join(field.file_name())
    }

    async fn read_optional(&self, field: BundleField) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path_for(field)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn load_field(&self, field: BundleField) -> Result<String, StoreError> {
        let Some(bytes) = self.read_optional(field).await? else {
            debug!(field = %field, "Artifact absent, using empty text");
            return Ok(String::new());
        };

        if field.is_document() {
            DocxReader::read_bytes(&bytes).map_err(|source| StoreError::Artifact { field, source })
        } else {
            Ok(String::from_utf8_lossy(&bytes).trim().to_string())
        }
    }
}

#[async_trait]
impl BundleStore for FsBundleStore {
    async fn load(&self) -> Result<ConfigurationBundle, StoreError> {
        Ok(ConfigurationBundle {
            rubric: self.load_field(BundleField::Rubric).await?,
            example_submission: self.load_field(BundleField::ExampleSubmission).await?,
            example_evaluation: self.load_field(BundleField::ExampleEvaluation).await?,
            instruction: self.load_field(BundleField::Instruction).await?,
        })
    }

    async fn save(&self, update: BundleUpdate) -> Result<Vec<BundleField>, StoreError> {
        if update.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.dir.clone();
        let written = tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            std::fs::create_dir_all(&dir)?;

            let mut written = Vec::new();
            for (field, bytes) in update.entries() {
                write_atomic(&dir, field.file_name(), bytes)?;
                written.push(field);
            }
            Ok(written)
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

        info!(
            dir = %self.dir.display(),
            fields = ?written,
            "Configuration bundle updated"
        );
        Ok(written)
    }

    async fn status(&self) -> Result<Vec<(BundleField, bool)>, StoreError> {
        let mut status = Vec::with_capacity(BundleField::ALL.len());
        for field in BundleField::ALL {
            let present = tokio::fs::try_exists(self.path_for(field)).await?;
            status.push((field, present));
        }
        Ok(status)
    }
}

fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(file_name)).map_err(|e| e.error)?;
    Ok(())
}
