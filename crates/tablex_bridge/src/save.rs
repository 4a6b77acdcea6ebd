use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tablex_core::ExportError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::dispatcher::ExportArtifact;

/// Where a saved file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Final file name, after any de-duplication suffix.
    pub file_name: String,
    /// Human-readable location (a path for directory targets).
    pub location: String,
}

/// The host's file-save surface.
///
/// `save` takes ownership of the artifact; its bytes are released when the
/// returned future completes, which is also the completion signal for the
/// caller.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    async fn save(&self, artifact: ExportArtifact) -> Result<SaveOutcome, ExportError>;
}

// ---------------------------------------------------------------------------
// DirectoryTarget
// ---------------------------------------------------------------------------

/// Saves into a downloads directory, never overwriting: a clash on
/// `report.csv` becomes `report (1).csv`, `report (2).csv`, ...
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

/// Give up looking for a free name after this many attempts.
const MAX_NAME_ATTEMPTS: u32 = 1000;

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn create_unique(&self, file_name: &str) -> std::io::Result<(tokio::fs::File, PathBuf)> {
        let (stem, ext) = split_extension(file_name);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                file_name.to_string()
            } else {
                format!("{stem} ({attempt}){ext}")
            };
            let path = self.dir.join(&candidate);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, path)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next name", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for {file_name}"),
        ))
    }
}

#[async_trait]
impl SaveTarget for DirectoryTarget {
    async fn save(&self, artifact: ExportArtifact) -> Result<SaveOutcome, ExportError> {
        let result = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            let (file, path) = self.create_unique(&artifact.file_name).await?;
            write_or_discard(file, &path, &artifact.bytes).await?;
            Ok::<_, std::io::Error>(path)
        }
        .await;

        match result {
            Ok(path) => {
                info!(
                    "Saved {} ({}, {} bytes)",
                    path.display(),
                    artifact.mime_type,
                    artifact.bytes.len()
                );
                Ok(SaveOutcome {
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| artifact.file_name.clone()),
                    location: path.display().to_string(),
                })
            }
            Err(e) => {
                error!("Download failed for {}: {e}", artifact.file_name);
                Err(ExportError::Save(format!("{}: {e}", artifact.file_name)))
            }
        }
    }
}

/// Write `bytes` to a freshly claimed file. On failure the partial file is
/// removed so the name is free for the next attempt.
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(rm) = tokio::fs::remove_file(path).await {
            warn!("Could not remove partial file {}: {rm}", path.display());
        }
        return Err(e);
    }
    Ok(())
}

/// `"a.b.csv"` -> `("a.b", ".csv")`; names without a dot keep an empty
/// extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name.split_at(pos),
        _ => (file_name, ""),
    }
}

// ---------------------------------------------------------------------------
// MemoryTarget
// ---------------------------------------------------------------------------

/// Keeps saved artifacts in memory. Useful for embedding and tests.
#[derive(Default)]
pub struct MemoryTarget {
    saved: Mutex<Vec<ExportArtifact>>,
    fail_with: Option<String>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that declines every save with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub fn saved(&self) -> Vec<ExportArtifact> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl SaveTarget for MemoryTarget {
    async fn save(&self, artifact: ExportArtifact) -> Result<SaveOutcome, ExportError> {
        if let Some(reason) = &self.fail_with {
            return Err(ExportError::Save(reason.clone()));
        }
        let outcome = SaveOutcome {
            file_name: artifact.file_name.clone(),
            location: format!("memory:{}", artifact.file_name),
        };
        self.saved.lock().push(artifact);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    fn artifact(name: &str, body: &str) -> ExportArtifact {
        ExportArtifact {
            file_name: name.into(),
            mime_type: "text/csv",
            bytes: body.as_bytes().to_vec(),
            used_fallback: false,
        }
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.csv"), ("report", ".csv"));
        assert_eq!(split_extension("a.b.xlsx"), ("a.b", ".xlsx"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[tokio::test]
    async fn test_directory_target_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(tmp.path().join("downloads"));

        let outcome = target.save(artifact("report.csv", "a,b")).await.unwrap();
        assert_eq!(outcome.file_name, "report.csv");

        let written = std::fs::read_to_string(tmp.path().join("downloads/report.csv")).unwrap();
        assert_eq!(written, "a,b");
    }

    #[tokio::test]
    async fn test_directory_target_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(tmp.path());

        target.save(artifact("report.csv", "first")).await.unwrap();
        let second = target.save(artifact("report.csv", "second")).await.unwrap();
        let third = target.save(artifact("report.csv", "third")).await.unwrap();

        assert_eq!(second.file_name, "report (1).csv");
        assert_eq!(third.file_name, "report (2).csv");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("report.csv")).unwrap(),
            "first"
        );
    }

    /// Accepts the file but fails every write.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_removes_claimed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(tmp.path());
        let (_file, path) = target.create_unique("report.csv").await.unwrap();
        assert!(path.exists());

        let err = write_or_discard(FullDisk, &path, b"a,b").await.unwrap_err();
        assert_eq!(err.to_string(), "no space left on device");
        assert!(!path.exists());

        // The name is free again, so the retry does not become "report (1).csv".
        let outcome = target.save(artifact("report.csv", "a,b")).await.unwrap();
        assert_eq!(outcome.file_name, "report.csv");
    }

    #[tokio::test]
    async fn test_directory_target_failure_is_save_error() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();

        let target = DirectoryTarget::new(&blocker);
        let err = target.save(artifact("a.csv", "x")).await.unwrap_err();
        assert!(matches!(err, ExportError::Save(_)));
    }

    #[tokio::test]
    async fn test_memory_target() {
        let target = MemoryTarget::new();
        target.save(artifact("a.csv", "x")).await.unwrap();
        assert_eq!(target.saved().len(), 1);

        let failing = MemoryTarget::failing("user cancelled");
        let err = failing.save(artifact("a.csv", "x")).await.unwrap_err();
        assert_eq!(err.to_string(), "Save failed: user cancelled");
    }
}
