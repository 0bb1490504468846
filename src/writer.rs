use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::snapshot::Snapshot;

pub const OUTPUT_FILE_NAME: &str = "next.json";
pub const TEMP_FILE_NAME: &str = "next.json.tmp";

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Publishes snapshots to `<dir>/next.json`.
///
/// Every publish writes a sibling temp file and renames it over the target, so
/// readers only ever see a complete document.
#[derive(Clone, Debug)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotWriter { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE_NAME)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(TEMP_FILE_NAME)
    }

    /// Returns the number of bytes written
    pub async fn publish(&self, snapshot: &Snapshot) -> PublishResult<usize> {
        let data = serde_json::to_vec_pretty(snapshot)?;

        let tmp = self.temp_path();
        if let Err(source) = write_file(&tmp, &data).await {
            // a leftover temp file would be overwritten next time anyway
            if let Err(e) = fs::remove_file(&tmp).await {
                log::debug!("Could not remove {}: {}", tmp.display(), e);
            }
            return Err(PublishError::Write { path: tmp, source });
        }

        let path = self.path();
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| PublishError::Rename {
                from: tmp,
                to: path,
                source,
            })?;

        Ok(data.len())
    }
}

async fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

/// Reads the currently published snapshot, `None` if nothing has been published yet
pub async fn read_published(dir: impl AsRef<Path>) -> PublishResult<Option<Snapshot>> {
    let path = dir.as_ref().join(OUTPUT_FILE_NAME);
    let data = match fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PublishError::Read { path, source }),
    };

    Ok(Some(serde_json::from_slice(&data)?))
}
