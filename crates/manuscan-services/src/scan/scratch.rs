use super::PipelineError;
use futures::StreamExt;
use manuscan_storage::Storage;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Local copy of a stored object, removed when dropped.
///
/// Owned by a single pipeline invocation, so the copy disappears on every
/// exit path, including errors and panics.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
    len: u64,
}

impl ScratchFile {
    /// Stream `key` from storage into a new temporary file under `dir`.
    pub async fn download(
        storage: &dyn Storage,
        key: &str,
        dir: &Path,
    ) -> Result<Self, PipelineError> {
        let file = tempfile::Builder::new()
            .prefix("manuscan-scan-")
            .tempfile_in(dir)?;

        let mut stream = storage
            .download_stream(key)
            .await
            .map_err(|source| PipelineError::Download {
                path: key.to_string(),
                source,
            })?;

        let mut out = tokio::fs::File::from_std(file.as_file().try_clone()?);
        let mut len = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| PipelineError::Download {
                path: key.to_string(),
                source,
            })?;
            out.write_all(&chunk).await?;
            len += chunk.len() as u64;
        }
        out.flush().await?;
        out.sync_all().await?;

        tracing::debug!(key = %key, size_bytes = len, path = %file.path().display(), "Scratch copy written");

        Ok(Self { file, len })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size_bytes(&self) -> u64 {
        self.len
    }
}
